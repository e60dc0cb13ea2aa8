//! Selection-driven quick assists for resolved Java files.
//!
//! [`quick_assists`] maps a selection onto the tree, consults the diagnostics
//! at the location, runs every rule and returns the aggregated proposals.
//! Rules never touch the input tree; each proposal carries its own
//! [`TreeEdit`](rewrite::TreeEdit) or a deferred client command.
//!
//! ```ignore
//! let request = AssistRequest::new(&file, selection).with_diagnostics(&diagnostics);
//! for proposal in quick_assists(&request, &AssistConfig::default()) {
//!     println!("{} ({})", proposal.label, proposal.id);
//! }
//! ```

pub mod aggregate;
pub mod assist_context;
pub mod command;
pub mod config;
pub mod gate;
pub mod import_rewrite;
pub mod names;
pub mod proposal;
pub mod relevance;
pub mod rewrite;
pub mod selection;

mod handlers;

#[cfg(test)]
mod tests;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use vega_syntax::{Diagnostic, ResolvedFile, TextRange};

pub use crate::assist_context::AssistContext;
pub use crate::config::{AssistConfig, ConfigError, LoggingConfig};
pub use crate::gate::Gate;
pub use crate::handlers::method_ref_to_lambda::{method_ref_to_lambda_edit, LambdaBody};
pub use crate::proposal::{AssistId, AssistResolveStrategy, Proposal, ProposalAction};
pub use crate::rewrite::{RewriteError, TreeEdit};
pub use crate::selection::Selection;

/// A rule: inspects the context and adds zero or more proposals. `None`
/// means the rule does not apply here.
pub(crate) type Handler = fn(&mut AssistContext<'_>) -> Option<()>;

/// Rules offered even when the location has errors.
const ALWAYS: &[(&str, Handler)] = &[
    ("assign_param_to_field", handlers::assign_param_to_field::assign_param_to_field),
    ("assign_all_params_to_fields", handlers::assign_param_to_field::assign_all_params_to_fields),
];

/// Rules that only run when no blocking error touches the selection.
const GATED: &[(&str, Handler)] = &[
    ("extract", handlers::extract::extract),
    ("anonymous_to_lambda", handlers::anonymous_to_lambda::anonymous_to_lambda),
    ("lambda_to_anonymous", handlers::lambda_to_anonymous::lambda_to_anonymous),
    ("method_ref_to_lambda", handlers::method_ref_to_lambda::method_ref_to_lambda),
    ("var_to_resolved_type", handlers::var_type::var_to_resolved_type),
    ("resolved_type_to_var", handlers::var_type::resolved_type_to_var),
    ("catch_to_throws", handlers::catch_to_throws::catch_to_throws),
    ("add_static_import", handlers::static_import::add_static_import),
];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("request cancelled")]
pub struct Cancelled;

/// One quick-assist invocation.
#[derive(Clone, Copy, Debug)]
pub struct AssistRequest<'a> {
    pub file: &'a ResolvedFile,
    pub range: TextRange,
    pub diagnostics: &'a [Diagnostic],
    pub resolve: AssistResolveStrategy,
}

impl<'a> AssistRequest<'a> {
    pub fn new(file: &'a ResolvedFile, range: TextRange) -> Self {
        Self {
            file,
            range,
            diagnostics: &[],
            resolve: AssistResolveStrategy::All,
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: &'a [Diagnostic]) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn with_resolve(mut self, resolve: AssistResolveStrategy) -> Self {
        self.resolve = resolve;
        self
    }
}

pub fn quick_assists(request: &AssistRequest<'_>, config: &AssistConfig) -> Vec<Proposal> {
    // A token that is never cancelled cannot make the run fail.
    quick_assists_with_cancellation(request, config, &CancellationToken::new()).unwrap_or_default()
}

/// Like [`quick_assists`], checking `token` before each rule.
pub fn quick_assists_with_cancellation(
    request: &AssistRequest<'_>,
    config: &AssistConfig,
    token: &CancellationToken,
) -> Result<Vec<Proposal>, Cancelled> {
    let mut ctx = AssistContext::new(
        request.file,
        request.range,
        request.diagnostics,
        config,
        request.resolve,
    );
    let gated: &[(&str, Handler)] = if ctx.gate.passes {
        GATED
    } else {
        tracing::debug!(target: "vega.assists", "error-gated rules skipped");
        &[]
    };

    for (name, handler) in ALWAYS.iter().chain(gated) {
        if token.is_cancelled() {
            tracing::debug!(target: "vega.assists", rule = *name, "cancelled");
            return Err(Cancelled);
        }
        let before = ctx.proposal_count();
        let applied = handler(&mut ctx).is_some();
        tracing::debug!(
            target: "vega.assists",
            rule = *name,
            applied,
            proposals = ctx.proposal_count() - before,
            "rule evaluated"
        );
    }

    Ok(aggregate::aggregate(ctx.into_proposals()))
}

/// `true` if at least one rule applies, without building any edit.
pub fn has_assists(request: &AssistRequest<'_>, config: &AssistConfig) -> bool {
    let request = request.with_resolve(AssistResolveStrategy::None);
    !quick_assists(&request, config).is_empty()
}
