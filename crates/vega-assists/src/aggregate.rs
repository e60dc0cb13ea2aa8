//! Final ordering of the proposal list.

use std::cmp::Reverse;
use std::collections::HashSet;

use crate::proposal::{AssistId, Proposal};

/// Drops repeated `(id, label)` pairs, keeping the first, then orders quick
/// fixes first, refactorings by kind, higher relevance first, then label. The
/// sort is stable, so ties keep rule order.
pub fn aggregate(proposals: Vec<Proposal>) -> Vec<Proposal> {
    let mut seen: HashSet<(AssistId, String)> = HashSet::new();
    let mut out: Vec<Proposal> = proposals
        .into_iter()
        .filter(|p| seen.insert((p.id, p.label.clone())))
        .collect();
    out.sort_by(|a, b| {
        let key = |p: &Proposal| (!p.is_quick_fix(), p.kind.as_str().to_owned(), Reverse(p.relevance));
        key(a).cmp(&key(b)).then_with(|| a.label.cmp(&b.label))
    });
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::proposal::ProposalAction;

    fn proposal(id: AssistId, label: &str, relevance: i32) -> Proposal {
        Proposal {
            id,
            label: label.to_string(),
            kind: id.kind(),
            relevance,
            action: ProposalAction::Unresolved,
        }
    }

    fn labels(proposals: &[Proposal]) -> Vec<&str> {
        proposals.iter().map(|p| p.label.as_str()).collect()
    }

    #[test]
    fn quick_fixes_lead_and_relevance_breaks_kind_ties() {
        let out = aggregate(vec![
            proposal(AssistId::ExtractLocal, "local", 6),
            proposal(AssistId::ExtractLocalAll, "local all", 7),
            proposal(AssistId::AddStaticImport, "static", 1),
            proposal(AssistId::ExtractConstant, "constant", 10),
        ]);
        assert_eq!(labels(&out), vec!["static", "constant", "local all", "local"]);
    }

    #[test]
    fn duplicates_keep_the_first_occurrence() {
        let first = proposal(AssistId::RemoveCatch, "Remove catch clause", 5);
        let mut second = first.clone();
        second.relevance = 99;
        let out = aggregate(vec![first, second]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].relevance, 5);
    }

    #[test]
    fn same_label_from_different_rules_is_kept() {
        let out = aggregate(vec![
            proposal(AssistId::ConvertAnonymousToLambda, "Convert to lambda expression", 5),
            proposal(AssistId::ConvertMethodRefToLambda, "Convert to lambda expression", 5),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, AssistId::ConvertAnonymousToLambda);
    }
}
