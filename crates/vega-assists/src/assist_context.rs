use lsp_types::Command;
use vega_syntax::{Diagnostic, NodeId, ResolvedFile, SemanticModel, SyntaxTree, TextRange};

use crate::config::AssistConfig;
use crate::gate::Gate;
use crate::proposal::{AssistId, AssistResolveStrategy, Proposal, ProposalAction};
use crate::rewrite::{RewriteBuilder, RewriteError};
use crate::selection::{normalized_node, Selection};

/// Everything a rule needs to look at, plus the proposals collected so far.
pub struct AssistContext<'a> {
    pub file: &'a ResolvedFile,
    pub selection: Selection,
    pub config: &'a AssistConfig,
    pub gate: Gate,
    resolve: AssistResolveStrategy,
    proposals: Vec<Proposal>,
}

impl<'a> AssistContext<'a> {
    pub fn new(
        file: &'a ResolvedFile,
        range: TextRange,
        diagnostics: &[Diagnostic],
        config: &'a AssistConfig,
        resolve: AssistResolveStrategy,
    ) -> Self {
        Self {
            file,
            selection: Selection::new(&file.tree, range),
            config,
            gate: Gate::evaluate(diagnostics, range, config),
            resolve,
            proposals: Vec::new(),
        }
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        &self.file.tree
    }

    pub fn model(&self) -> &'a SemanticModel {
        &self.file.model
    }

    pub fn covering(&self) -> NodeId {
        self.selection.covering
    }

    /// The covering node climbed out of names that spell a larger construct.
    pub fn anchor(&self) -> NodeId {
        normalized_node(self.tree(), self.selection.covering)
    }

    pub fn is_resolving(&self) -> bool {
        self.resolve == AssistResolveStrategy::All
    }

    /// Adds a proposal whose edit is built by `build`. In applicability-only
    /// mode `build` never runs. A failing `build` drops just this proposal.
    pub fn add(
        &mut self,
        id: AssistId,
        label: impl Into<String>,
        relevance: i32,
        build: impl FnOnce(&mut RewriteBuilder<'a>) -> Result<(), RewriteError>,
    ) {
        let label = label.into();
        let action = if self.is_resolving() {
            let file = self.file;
            let mut builder = RewriteBuilder::new(&file.tree);
            match build(&mut builder).and_then(|()| builder.finish()) {
                Ok(edit) => ProposalAction::Edit(edit),
                Err(err) => {
                    tracing::warn!(
                        target: "vega.assists",
                        assist = %id,
                        %label,
                        error = %err,
                        "dropping proposal: edit construction failed"
                    );
                    return;
                }
            }
        } else {
            ProposalAction::Unresolved
        };
        self.push(id, label, relevance, action);
    }

    /// Adds a proposal the client completes by running `command`.
    pub fn add_command(
        &mut self,
        id: AssistId,
        label: impl Into<String>,
        relevance: i32,
        command: Option<Command>,
    ) {
        let label = label.into();
        let action = match (self.is_resolving(), command) {
            (false, _) => ProposalAction::Unresolved,
            (true, Some(command)) => ProposalAction::Command(command),
            (true, None) => {
                tracing::warn!(
                    target: "vega.assists",
                    assist = %id,
                    %label,
                    "dropping proposal: command arguments failed to serialize"
                );
                return;
            }
        };
        self.push(id, label, relevance, action);
    }

    fn push(&mut self, id: AssistId, label: String, relevance: i32, action: ProposalAction) {
        self.proposals.push(Proposal {
            id,
            label,
            kind: id.kind(),
            relevance,
            action,
        });
    }

    pub fn proposal_count(&self) -> usize {
        self.proposals.len()
    }

    pub fn into_proposals(self) -> Vec<Proposal> {
        self.proposals
    }
}
