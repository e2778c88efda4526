//! Subset construction.
//!
//! [`DfaBuilder`] turns any [`Nfa`] into a [`Dfa`] whose states are sets of
//! NFA states. The worklist starts from the epsilon closure of the NFA start
//! state; for every dequeued state and every class in `1..=class_count`, the
//! closed move is interned by its sorted member set, so equal sets always get
//! the same DFA state no matter which path found them.
//!
//! Layout of the result:
//!
//! * state 0 is the dead state (empty NFA set, all transitions 0);
//! * state 1 is the start state;
//! * every row has `class_count + 1` entries; column 0 is unused and 0;
//! * a transition value of 0 means "no transition".
//!
//! The accepting marker of a DFA state is the largest marker among its NFA
//! states, so marker 0 never wins against a nonzero one.

use crate::error::{Error, Result};
use crate::nfa::{MAX_CLASSES, Nfa, NfaStateSet, SymbolClass};
use indexmap::IndexSet;
use std::collections::VecDeque;

/// Index of the dead state.
pub const DEAD: usize = 0;
/// Index of the start state.
pub const START: usize = 1;

/// A deterministic state built from a set of NFA states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DfaState {
    index: usize,
    accepting: u32,
    nfa_states: NfaStateSet,
    row: Vec<usize>,
}

impl DfaState {
    pub fn index(&self) -> usize {
        self.index
    }

    /// Accepting marker; 0 for non-accepting states.
    pub fn accepting(&self) -> u32 {
        self.accepting
    }

    pub fn nfa_states(&self) -> &NfaStateSet {
        &self.nfa_states
    }

    /// Transition row indexed by symbol class.
    pub fn row(&self) -> &[usize] {
        &self.row
    }

    /// Successor on `class`, [`DEAD`] if there is none.
    pub fn next(&self, class: SymbolClass) -> usize {
        self.row.get(class).copied().unwrap_or(DEAD)
    }
}

/// Result of subset construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dfa {
    states: Vec<DfaState>,
    class_count: usize,
}

impl Dfa {
    /// Runs subset construction over `nfa`.
    pub fn from_nfa<N: Nfa + ?Sized>(nfa: &N) -> Result<Self> {
        DfaBuilder::new(nfa).build()
    }

    pub fn states(&self) -> &[DfaState] {
        &self.states
    }

    pub fn state(&self, index: usize) -> &DfaState {
        &self.states[index]
    }

    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Length of every transition row.
    pub fn row_len(&self) -> usize {
        self.class_count + 1
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Runs the automaton over `classes` from the start state and returns the
    /// marker and length of the longest accepted prefix.
    pub fn longest_match(&self, classes: &[SymbolClass]) -> Option<(u32, usize)> {
        longest_match_by(
            classes,
            |s| self.states[s].accepting,
            |s, c| self.states[s].next(c),
        )
    }
}

/// Drives a table-shaped automaton over a class sequence, remembering the
/// last accepting position.
pub(crate) fn longest_match_by<A, T>(
    classes: &[SymbolClass],
    accepting: A,
    next: T,
) -> Option<(u32, usize)>
where
    A: Fn(usize) -> u32,
    T: Fn(usize, SymbolClass) -> usize,
{
    let mut state = START;
    let mut best = match accepting(state) {
        0 => None,
        m => Some((m, 0)),
    };
    for (i, &class) in classes.iter().enumerate() {
        state = next(state, class);
        if state == DEAD {
            break;
        }
        match accepting(state) {
            0 => {}
            m => best = Some((m, i + 1)),
        }
    }
    best
}

/// Worklist-driven subset construction over an [`Nfa`].
pub struct DfaBuilder<'a, N: Nfa + ?Sized> {
    nfa: &'a N,
    sets: IndexSet<NfaStateSet>,
    accepting: Vec<u32>,
    rows: Vec<Vec<usize>>,
    queue: VecDeque<usize>,
}

impl<'a, N: Nfa + ?Sized> DfaBuilder<'a, N> {
    pub fn new(nfa: &'a N) -> Self {
        Self {
            nfa,
            sets: IndexSet::new(),
            accepting: Vec::new(),
            rows: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    /// Builds the automaton, failing fast if the NFA reports states or
    /// classes outside its own ranges.
    pub fn build(mut self) -> Result<Dfa> {
        let class_count = self.nfa.class_count();
        if class_count > MAX_CLASSES {
            return Err(Error::malformed(format_args!(
                "{} symbol classes exceed the supported {}",
                class_count, MAX_CLASSES
            )));
        }
        let start = self.nfa.start();
        if start >= self.nfa.state_count() {
            return Err(Error::malformed(format_args!(
                "start state {} outside 0..{}",
                start,
                self.nfa.state_count()
            )));
        }

        // Dead state first, so that "no transition" and "state 0" coincide.
        self.intern(NfaStateSet::new());
        let closed = self.nfa.epsilon_closure(&NfaStateSet::from([start]));
        self.check(&closed)?;
        self.intern(closed);

        while let Some(index) = self.queue.pop_front() {
            let set = self.sets[index].clone();
            let mut row = vec![DEAD; class_count + 1];
            for class in 1..=class_count {
                let moved = self.nfa.step(&set, class);
                if moved.is_empty() {
                    continue;
                }
                let closed = self.nfa.epsilon_closure(&moved);
                self.check(&closed)?;
                row[class] = self.intern(closed);
            }
            log::trace!(
                "dfa: state {} ({} nfa states, accepting {})",
                index,
                set.len(),
                self.accepting[index]
            );
            self.rows[index] = row;
        }

        let states: Vec<DfaState> = self
            .sets
            .into_iter()
            .zip(self.accepting)
            .zip(self.rows)
            .enumerate()
            .map(|(index, ((nfa_states, accepting), row))| DfaState {
                index,
                accepting,
                nfa_states,
                row,
            })
            .collect();

        log::debug!(
            "dfa: {} states over {} classes",
            states.len(),
            class_count
        );
        Ok(Dfa {
            states,
            class_count,
        })
    }

    fn check(&self, set: &NfaStateSet) -> Result<()> {
        match set.last() {
            Some(&s) if s >= self.nfa.state_count() => Err(Error::malformed(format_args!(
                "successor state {} outside 0..{}",
                s,
                self.nfa.state_count()
            ))),
            _ => Ok(()),
        }
    }

    fn intern(&mut self, set: NfaStateSet) -> usize {
        if let Some(index) = self.sets.get_index_of(&set) {
            return index;
        }
        let accepting = set
            .iter()
            .map(|&s| self.nfa.accepting(s))
            .max()
            .unwrap_or(0);
        let (index, _) = self.sets.insert_full(set);
        self.accepting.push(accepting);
        // The dead state is never expanded; its row stays all zero.
        self.rows.push(vec![DEAD; self.nfa.class_count() + 1]);
        if index != DEAD {
            self.queue.push_back(index);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nfa::NfaGraph;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// `ab | a+` over classes a=1, b=2, c=3; `ab` accepts with 2, `a+` with 1.
    fn sample() -> NfaGraph {
        let mut nfa = NfaGraph::new(3);
        let start = nfa.add_state(0);
        let ab0 = nfa.add_state(0);
        let ab1 = nfa.add_state(0);
        let ab2 = nfa.add_state(2);
        let ap0 = nfa.add_state(0);
        let ap1 = nfa.add_state(1);
        nfa.add_epsilon(start, ab0).unwrap();
        nfa.add_epsilon(start, ap0).unwrap();
        nfa.add_edge(ab0, 1, ab1).unwrap();
        nfa.add_edge(ab1, 2, ab2).unwrap();
        nfa.add_edge(ap0, 1, ap1).unwrap();
        nfa.add_edge(ap1, 1, ap1).unwrap();
        nfa
    }

    #[test]
    fn layout_has_dead_and_start_states() {
        init_logger();
        let dfa = Dfa::from_nfa(&sample()).unwrap();
        assert!(dfa.state(DEAD).nfa_states().is_empty());
        assert!(dfa.state(DEAD).row().iter().all(|&t| t == DEAD));
        assert_eq!(dfa.state(START).nfa_states(), &NfaStateSet::from([0, 1, 4]));
        // start, dead, {ab1, ap1}, {ap1}, {ab2}
        assert_eq!(dfa.len(), 5);
    }

    #[test]
    fn rows_share_one_length() {
        let dfa = Dfa::from_nfa(&sample()).unwrap();
        for state in dfa.states() {
            assert_eq!(state.row().len(), dfa.row_len());
            assert_eq!(state.row()[0], DEAD);
        }
    }

    #[test]
    fn accepting_marker_is_the_maximum() {
        let mut nfa = NfaGraph::new(1);
        let s = nfa.add_state(0);
        let a = nfa.add_state(0);
        let b = nfa.add_state(3);
        let c = nfa.add_state(5);
        nfa.add_edge(s, 1, a).unwrap();
        nfa.add_edge(s, 1, b).unwrap();
        nfa.add_edge(s, 1, c).unwrap();
        let dfa = Dfa::from_nfa(&nfa).unwrap();
        let target = dfa.state(START).next(1);
        assert_eq!(dfa.state(target).nfa_states(), &NfaStateSet::from([a, b, c]));
        assert_eq!(dfa.state(target).accepting(), 5);
        assert_eq!(dfa.state(START).accepting(), 0);
    }

    #[test]
    fn equal_sets_are_shared() {
        // Two different paths to {t}: via class 1 and via class 2.
        let mut nfa = NfaGraph::new(2);
        let s = nfa.add_state(0);
        let t = nfa.add_state(1);
        nfa.add_edge(s, 1, t).unwrap();
        nfa.add_edge(s, 2, t).unwrap();
        let dfa = Dfa::from_nfa(&nfa).unwrap();
        let start = dfa.state(START);
        assert_eq!(start.next(1), start.next(2));
        assert_eq!(dfa.len(), 3);
    }

    #[test]
    fn longest_match_prefers_longer_then_marker() {
        let dfa = Dfa::from_nfa(&sample()).unwrap();
        assert_eq!(dfa.longest_match(&[1, 2]), Some((2, 2)));
        assert_eq!(dfa.longest_match(&[1, 1, 1, 3]), Some((1, 3)));
        assert_eq!(dfa.longest_match(&[1]), Some((1, 1)));
        assert_eq!(dfa.longest_match(&[2]), None);
        assert_eq!(dfa.longest_match(&[]), None);
        // unknown classes behave like a missing transition
        assert_eq!(dfa.longest_match(&[1, 9]), Some((1, 1)));
    }

    #[test]
    fn construction_is_deterministic() {
        assert_eq!(
            Dfa::from_nfa(&sample()).unwrap(),
            Dfa::from_nfa(&sample()).unwrap()
        );
    }

    /// An NFA provider that breaks its own contract.
    struct Broken {
        start: usize,
        classes: usize,
        successor: usize,
    }

    impl Nfa for Broken {
        fn start(&self) -> usize {
            self.start
        }
        fn state_count(&self) -> usize {
            2
        }
        fn class_count(&self) -> usize {
            self.classes
        }
        fn accepting(&self, _state: usize) -> u32 {
            0
        }
        fn epsilon_closure(&self, states: &NfaStateSet) -> NfaStateSet {
            states.clone()
        }
        fn step(&self, _states: &NfaStateSet, _class: SymbolClass) -> NfaStateSet {
            NfaStateSet::from([self.successor])
        }
    }

    #[test]
    fn malformed_input_fails_fast() {
        let cases = [
            Broken { start: 5, classes: 1, successor: 0 },
            Broken { start: 0, classes: MAX_CLASSES + 1, successor: 0 },
            Broken { start: 0, classes: 1, successor: 7 },
        ];
        for nfa in &cases {
            assert!(matches!(
                Dfa::from_nfa(nfa),
                Err(Error::MalformedAutomaton { .. })
            ));
        }
    }
}
