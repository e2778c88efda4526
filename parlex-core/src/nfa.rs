//! Nondeterministic automaton input for subset construction.
//!
//! The core never builds an NFA itself. Anything that can answer the questions
//! of the [`Nfa`] trait (epsilon closure, move on a symbol class, accepting
//! priority per state) can be turned into a DFA. [`NfaGraph`] is a plain
//! adjacency-list implementation, and [`NfaGraph::from_thompson`] converts a
//! `regex-automata` Thompson NFA, using its byte classes as symbol classes.
//!
//! Symbol classes are numbered `1..=class_count`. Class `0` is reserved and
//! never carries a transition.

use crate::error::{Error, Result};
use regex_automata::nfa::thompson::{self, Transition};
use regex_automata::util::primitives::StateID;
use std::collections::BTreeSet;

/// Index of an input symbol class, `1..=class_count`.
pub type SymbolClass = usize;

/// A set of NFA state indices. Sorted, so equal sets hash equally.
pub type NfaStateSet = BTreeSet<usize>;

/// Largest number of symbol classes a transition row supports.
pub const MAX_CLASSES: usize = u16::MAX as usize;

/// The questions subset construction asks about its input automaton.
pub trait Nfa {
    /// Index of the initial state.
    fn start(&self) -> usize;

    /// States are indexed `0..state_count()`.
    fn state_count(&self) -> usize;

    /// Classes are numbered `1..=class_count()`.
    fn class_count(&self) -> usize;

    /// Accepting priority of `state`; 0 means non-accepting.
    fn accepting(&self, state: usize) -> u32;

    /// `states` plus everything reachable from them through epsilon edges.
    fn epsilon_closure(&self, states: &NfaStateSet) -> NfaStateSet;

    /// States reachable from any member of `states` over one `class` edge.
    /// The result is not closed.
    fn step(&self, states: &NfaStateSet, class: SymbolClass) -> NfaStateSet;

    /// Byte to symbol class mapping, when the automaton reads bytes.
    fn alphabet(&self) -> Option<&[SymbolClass]> {
        None
    }
}

/// Checks that `alphabet` maps all 256 bytes into `0..=class_count`.
pub(crate) fn check_alphabet(alphabet: &[SymbolClass], class_count: usize) -> Result<()> {
    if alphabet.len() != 256 {
        return Err(Error::malformed(format_args!(
            "alphabet has {} entries, expected 256",
            alphabet.len()
        )));
    }
    if let Some(&bad) = alphabet.iter().find(|&&c| c > class_count) {
        return Err(Error::malformed(format_args!(
            "alphabet maps to class {} outside 1..={}",
            bad, class_count
        )));
    }
    Ok(())
}

/// Adjacency-list NFA.
///
/// ```rust
/// # use parlex_core::NfaGraph;
/// // a+ accepting with priority 1
/// let mut nfa = NfaGraph::new(1);
/// let s0 = nfa.add_state(0);
/// let s1 = nfa.add_state(1);
/// nfa.add_edge(s0, 1, s1).unwrap();
/// nfa.add_edge(s1, 1, s1).unwrap();
/// assert!(nfa.add_edge(s0, 2, s1).is_err()); // class out of range
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NfaGraph {
    start: usize,
    class_count: usize,
    accepting: Vec<u32>,
    epsilon: Vec<Vec<usize>>,
    edges: Vec<Vec<(SymbolClass, usize)>>,
    alphabet: Option<Vec<SymbolClass>>,
}

impl NfaGraph {
    /// An empty automaton over `class_count` symbol classes. The start state
    /// is 0 until [`NfaGraph::set_start`] says otherwise.
    pub fn new(class_count: usize) -> Self {
        Self {
            class_count,
            ..Self::default()
        }
    }

    /// Adds a state and returns its index.
    pub fn add_state(&mut self, accepting: u32) -> usize {
        self.accepting.push(accepting);
        self.epsilon.push(Vec::new());
        self.edges.push(Vec::new());
        self.accepting.len() - 1
    }

    pub fn set_start(&mut self, state: usize) -> Result<()> {
        self.check_state(state)?;
        self.start = state;
        Ok(())
    }

    pub fn set_accepting(&mut self, state: usize, priority: u32) -> Result<()> {
        self.check_state(state)?;
        self.accepting[state] = priority;
        Ok(())
    }

    pub fn add_epsilon(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_state(from)?;
        self.check_state(to)?;
        self.epsilon[from].push(to);
        Ok(())
    }

    pub fn add_edge(&mut self, from: usize, class: SymbolClass, to: usize) -> Result<()> {
        self.check_state(from)?;
        self.check_state(to)?;
        if class == 0 || class > self.class_count {
            return Err(Error::malformed(format_args!(
                "symbol class {} outside 1..={}",
                class, self.class_count
            )));
        }
        if !self.edges[from].contains(&(class, to)) {
            self.edges[from].push((class, to));
        }
        Ok(())
    }

    /// Installs a 256-entry byte to class table.
    pub fn set_alphabet(&mut self, alphabet: Vec<SymbolClass>) -> Result<()> {
        check_alphabet(&alphabet, self.class_count)?;
        self.alphabet = Some(alphabet);
        Ok(())
    }

    /// Class of byte `b`, when an alphabet is installed.
    pub fn class_of(&self, b: u8) -> Option<SymbolClass> {
        self.alphabet.as_ref().map(|a| a[b as usize])
    }

    fn check_state(&self, state: usize) -> Result<()> {
        if state >= self.accepting.len() {
            return Err(Error::malformed(format_args!(
                "state {} outside 0..{}",
                state,
                self.accepting.len()
            )));
        }
        Ok(())
    }

    /// Converts a Thompson NFA into a graph over its byte classes.
    ///
    /// NFA states map one-to-one. Union, binary-union and capture states
    /// become epsilon edges; byte ranges become one edge per byte class they
    /// cover. A match state for pattern `p` of `n` accepts with priority
    /// `n - p`, so earlier patterns outrank later ones. Conversion starts at
    /// the anchored start state. Look-around assertions have no symbol-class
    /// equivalent and are rejected.
    pub fn from_thompson(nfa: &thompson::NFA) -> Result<Self> {
        let classes = nfa.byte_classes();
        let alphabet: Vec<SymbolClass> = (0..=255u8)
            .map(|b| classes.get(b) as usize + 1)
            .collect();
        let class_count = alphabet.iter().copied().max().unwrap_or(0);

        let mut graph = NfaGraph::new(class_count);
        for _ in nfa.states() {
            graph.add_state(0);
        }
        let n_patterns = nfa.pattern_len();

        for (id, state) in nfa.states().iter().enumerate() {
            match state {
                thompson::State::ByteRange { trans } => {
                    graph.add_range(id, trans, &alphabet)?;
                }
                thompson::State::Sparse(sparse) => {
                    for trans in sparse.transitions.iter() {
                        graph.add_range(id, trans, &alphabet)?;
                    }
                }
                thompson::State::Dense(dense) => {
                    for (b, next) in dense.transitions.iter().enumerate() {
                        if *next != StateID::ZERO {
                            graph.add_edge(id, alphabet[b], next.as_usize())?;
                        }
                    }
                }
                thompson::State::Look { .. } => {
                    return Err(Error::UnsupportedLook { state: id });
                }
                thompson::State::Union { alternates } => {
                    for alt in alternates.iter() {
                        graph.add_epsilon(id, alt.as_usize())?;
                    }
                }
                thompson::State::BinaryUnion { alt1, alt2 } => {
                    graph.add_epsilon(id, alt1.as_usize())?;
                    graph.add_epsilon(id, alt2.as_usize())?;
                }
                thompson::State::Capture { next, .. } => {
                    graph.add_epsilon(id, next.as_usize())?;
                }
                thompson::State::Fail => {}
                thompson::State::Match { pattern_id } => {
                    let priority = (n_patterns - pattern_id.as_usize()) as u32;
                    graph.set_accepting(id, priority)?;
                }
            }
        }

        graph.set_start(nfa.start_anchored().as_usize())?;
        graph.set_alphabet(alphabet)?;
        log::debug!(
            "nfa: {} states, {} byte classes, {} patterns",
            graph.state_count(),
            class_count,
            n_patterns
        );
        Ok(graph)
    }

    fn add_range(&mut self, from: usize, trans: &Transition, alphabet: &[SymbolClass]) -> Result<()> {
        let mut last = 0;
        for b in trans.start..=trans.end {
            let class = alphabet[b as usize];
            if class != last {
                self.add_edge(from, class, trans.next.as_usize())?;
                last = class;
            }
        }
        Ok(())
    }
}

impl Nfa for NfaGraph {
    fn start(&self) -> usize {
        self.start
    }

    fn state_count(&self) -> usize {
        self.accepting.len()
    }

    fn class_count(&self) -> usize {
        self.class_count
    }

    fn accepting(&self, state: usize) -> u32 {
        self.accepting.get(state).copied().unwrap_or(0)
    }

    fn epsilon_closure(&self, states: &NfaStateSet) -> NfaStateSet {
        let mut out = states.clone();
        let mut stack: Vec<usize> = states.iter().copied().collect();
        while let Some(s) = stack.pop() {
            for &t in self.epsilon.get(s).into_iter().flatten() {
                if out.insert(t) {
                    stack.push(t);
                }
            }
        }
        out
    }

    fn step(&self, states: &NfaStateSet, class: SymbolClass) -> NfaStateSet {
        states
            .iter()
            .filter_map(|&s| self.edges.get(s))
            .flatten()
            .filter(|(c, _)| *c == class)
            .map(|&(_, t)| t)
            .collect()
    }

    fn alphabet(&self) -> Option<&[SymbolClass]> {
        self.alphabet.as_deref()
    }
}
