//! Column reduction.
//!
//! Symbol classes whose transition column is identical in every DFA state
//! cannot be told apart by the automaton, so they are folded into one column.
//! Columns that never lead anywhere fold into the reserved column 0. The
//! folding is recorded in a [`ClassMap`] (old class to new column) which the
//! scanner must apply to every input class before indexing a row.
//!
//! Rows are rebuilt at their final, fixed size through the map; nothing is
//! resized in place.

use crate::dfa::{DEAD, Dfa, longest_match_by};
use crate::nfa::SymbolClass;
use std::collections::HashMap;

/// Old symbol class to reduced column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassMap {
    map: Vec<usize>,
    columns: usize,
}

impl ClassMap {
    /// Maps every class to itself.
    pub fn identity(class_count: usize) -> Self {
        Self {
            map: (0..=class_count).collect(),
            columns: class_count + 1,
        }
    }

    /// Groups classes with identical columns in `dfa`, in class order.
    pub fn reduce(dfa: &Dfa) -> Self {
        let mut map = vec![0; dfa.class_count() + 1];
        let mut seen: HashMap<Vec<usize>, usize> = HashMap::new();
        let mut columns = 1;
        for (class, slot) in map.iter_mut().enumerate().skip(1) {
            let column: Vec<usize> = dfa.states().iter().map(|s| s.next(class)).collect();
            if column.iter().all(|&t| t == DEAD) {
                continue;
            }
            *slot = *seen.entry(column).or_insert_with(|| {
                columns += 1;
                columns - 1
            });
        }
        Self { map, columns }
    }

    /// Column for `class`; 0 for classes the map has never seen.
    pub fn column(&self, class: SymbolClass) -> usize {
        self.map.get(class).copied().unwrap_or(0)
    }

    /// Row length after reduction, column 0 included.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of classes mapped, class 0 included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.map
    }
}

/// Frozen DFA state over reduced columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DfaNode {
    pub index: usize,
    pub accepting: u32,
    pub row: Vec<usize>,
}

/// The DFA after column reduction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompactDfa {
    nodes: Vec<DfaNode>,
    class_map: ClassMap,
}

impl CompactDfa {
    /// Folds identical columns of `dfa`.
    pub fn reduce(dfa: &Dfa) -> Self {
        let compact = Self::remap(dfa, ClassMap::reduce(dfa));
        log::debug!(
            "dfa: columns reduced from {} to {}",
            dfa.row_len(),
            compact.class_map.columns()
        );
        compact
    }

    /// Freezes `dfa` without reduction.
    pub fn identity(dfa: &Dfa) -> Self {
        Self::remap(dfa, ClassMap::identity(dfa.class_count()))
    }

    fn remap(dfa: &Dfa, class_map: ClassMap) -> Self {
        let nodes = dfa
            .states()
            .iter()
            .map(|state| {
                let mut row = vec![DEAD; class_map.columns()];
                for (class, &target) in state.row().iter().enumerate().skip(1) {
                    let column = class_map.column(class);
                    if column != 0 {
                        row[column] = target;
                    }
                }
                DfaNode {
                    index: state.index(),
                    accepting: state.accepting(),
                    row,
                }
            })
            .collect();
        Self { nodes, class_map }
    }

    pub fn nodes(&self) -> &[DfaNode] {
        &self.nodes
    }

    pub fn class_map(&self) -> &ClassMap {
        &self.class_map
    }

    /// Same as [`Dfa::longest_match`], taking original symbol classes.
    pub fn longest_match(&self, classes: &[SymbolClass]) -> Option<(u32, usize)> {
        longest_match_by(
            classes,
            |s| self.nodes[s].accepting,
            |s, c| match self.class_map.column(c) {
                0 => DEAD,
                col => self.nodes[s].row[col],
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::NfaGraph;

    /// Identifier-ish language over 6 classes:
    /// 1,2 = letters (interchangeable), 3 = digit, 4 = 'x' keyword start,
    /// 5 = never used, 6 = letter duplicate.
    fn sample() -> Dfa {
        let mut nfa = NfaGraph::new(6);
        let s = nfa.add_state(0);
        let id = nfa.add_state(1);
        let kw = nfa.add_state(2);
        for c in [1, 2, 6] {
            nfa.add_edge(s, c, id).unwrap();
            nfa.add_edge(id, c, id).unwrap();
        }
        nfa.add_edge(id, 3, id).unwrap();
        nfa.add_edge(s, 4, kw).unwrap();
        Dfa::from_nfa(&nfa).unwrap()
    }

    #[test]
    fn identical_columns_fold_together() {
        let dfa = sample();
        let map = ClassMap::reduce(&dfa);
        assert_eq!(map.column(1), map.column(2));
        assert_eq!(map.column(1), map.column(6));
        assert_ne!(map.column(1), map.column(3));
        assert_ne!(map.column(3), map.column(4));
        assert_eq!(map.column(5), 0);
        // column 0 plus {1,2,6}, {3}, {4}
        assert_eq!(map.columns(), 4);
        assert_eq!(map.as_slice(), &[0, 1, 1, 2, 3, 0, 1]);
    }

    #[test]
    fn rows_have_reduced_length() {
        let dfa = sample();
        let compact = CompactDfa::reduce(&dfa);
        assert_eq!(compact.nodes().len(), dfa.len());
        for node in compact.nodes() {
            assert_eq!(node.row.len(), compact.class_map().columns());
            assert_eq!(node.row[0], DEAD);
        }
    }

    #[test]
    fn reduction_preserves_recognition() {
        let dfa = sample();
        let reduced = CompactDfa::reduce(&dfa);
        let plain = CompactDfa::identity(&dfa);
        let inputs: [&[SymbolClass]; 8] = [
            &[],
            &[1],
            &[2, 3, 6, 1],
            &[4],
            &[4, 1],
            &[3, 1],
            &[5],
            &[1, 1, 5, 1],
        ];
        for input in inputs {
            let expect = dfa.longest_match(input);
            assert_eq!(reduced.longest_match(input), expect, "{:?}", input);
            assert_eq!(plain.longest_match(input), expect, "{:?}", input);
        }
        assert_eq!(reduced.longest_match(&[2, 3, 6, 1]), Some((1, 4)));
        assert_eq!(reduced.longest_match(&[4, 1]), Some((2, 1)));
    }

    #[test]
    fn identity_keeps_every_column() {
        let dfa = sample();
        let plain = CompactDfa::identity(&dfa);
        assert_eq!(plain.class_map().columns(), dfa.row_len());
        for (node, state) in plain.nodes().iter().zip(dfa.states()) {
            assert_eq!(node.row, state.row());
            assert_eq!(node.accepting, state.accepting());
        }
    }
}
