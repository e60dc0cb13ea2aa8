use std::collections::HashSet;

use proptest::prelude::*;
use vega_assists::names::unique_parameter_names;
use vega_assists::selection::Selection;
use vega_syntax::{TextRange, TextSize};
use vega_test_utils::resolve;

const SOURCE: &str = r#"
class A {
    int total;
    int m(int a, String s) {
        int x = a + 1;
        if (x > total) {
            x = s.length() * 2;
        }
        return x;
    }
}
"#;

fn range(start: usize, len: usize) -> TextRange {
    let start = TextSize::from(start as u32);
    TextRange::at(start, TextSize::from(len as u32))
}

proptest! {
    #[test]
    fn covered_nodes_are_maximal_and_ordered(start in 0usize..SOURCE.len(), len in 1usize..40) {
        let file = resolve(SOURCE);
        let tree = &file.tree;
        let len = len.min(SOURCE.len() - start);
        prop_assume!(len > 0);
        let selection = Selection::new(tree, range(start, len));

        for node in &selection.covered {
            prop_assert!(selection.range.contains_range(tree.range(*node)));
            if let Some(parent) = tree.parent(*node) {
                prop_assert!(!selection.range.contains_range(tree.range(parent)));
            }
        }
        for pair in selection.covered.windows(2) {
            prop_assert!(tree.range(pair[0]).end() <= tree.range(pair[1]).start());
        }
    }

    #[test]
    fn empty_selections_cover_nothing(offset in 0usize..=SOURCE.len()) {
        let file = resolve(SOURCE);
        let selection = Selection::new(&file.tree, range(offset, 0));
        prop_assert!(selection.covered.is_empty());
    }

    #[test]
    fn parameter_names_are_distinct_and_free(
        originals in prop::collection::vec("[a-c]{1,2}", 0..5),
        visible in prop::collection::hash_set("[a-c]{1,2}[0-2]?", 0..6),
    ) {
        let chosen = unique_parameter_names(&originals, &visible);
        prop_assert_eq!(chosen.len(), originals.len());

        let distinct: HashSet<&String> = chosen.iter().collect();
        prop_assert_eq!(distinct.len(), chosen.len());
        for (original, name) in originals.iter().zip(&chosen) {
            prop_assert!(!visible.contains(name));
            prop_assert!(name.starts_with(original.as_str()));
            let unique_original = !visible.contains(original)
                && originals.iter().filter(|o| *o == original).count() == 1;
            if unique_original {
                prop_assert_eq!(name, original);
            }
        }
    }
}
