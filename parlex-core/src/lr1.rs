//! Canonical LR(1) item sets.
//!
//! States are discovered with a FIFO worklist starting from the closure of
//! `$accept -> . Start, $end`. Each dequeued state is goto-expanded exactly
//! once: its items are grouped by the symbol after the dot, every group is
//! advanced and closed, and the resulting item set is interned. Item sets are
//! compared by value (the sorted items are hashed), so two derivation paths
//! that arrive at equal sets share one state. Nothing is merged: states that
//! differ only in lookaheads stay distinct.
//!
//! Shift/goto and reduce candidates for the action table are recorded while a
//! state is expanded, shifts first and then reduces in rule order.

use crate::action::Action;
use crate::grammar::{END, Grammar, RuleId};
use crate::symtab::SymbolId;
use indexmap::IndexSet;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

/// Index of a state in [`Lr1Automaton::states`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub usize);

impl StateId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<StateId> for usize {
    fn from(id: StateId) -> Self {
        id.0
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An LR(1) item: a rule, the dot position inside its right-hand side and
/// one terminal of lookahead.
///
/// Items compare structurally; two items with equal fields are the same item
/// no matter how they were derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Item {
    pub rule: RuleId,
    pub dot: usize,
    pub lookahead: SymbolId,
}

impl Item {
    pub fn new(rule: RuleId, dot: usize, lookahead: SymbolId) -> Self {
        Self {
            rule,
            dot,
            lookahead,
        }
    }

    /// Symbol right of the dot, `None` at the end of the rule.
    pub fn next_symbol(&self, grammar: &Grammar) -> Option<SymbolId> {
        grammar.rule(self.rule).rhs().get(self.dot).copied()
    }

    pub fn is_complete(&self, grammar: &Grammar) -> bool {
        self.dot >= grammar.rule(self.rule).len()
    }

    fn advance(self) -> Self {
        Self {
            dot: self.dot + 1,
            ..self
        }
    }
}

/// A set of items, kept sorted so that equal sets hash equally.
pub type ItemSet = BTreeSet<Item>;

/// Expands `items` in place to its LR(1) closure and returns how many items
/// were added.
///
/// For every item `A -> α . N β, a` with `N` a nonterminal, adds
/// `N -> . γ, x` for each rule of `N` and each `x` in FIRST(β a). Running it
/// again on a closed set adds nothing.
pub fn closure(grammar: &Grammar, items: &mut ItemSet) -> usize {
    let mut added = 0;
    let mut work: Vec<Item> = items.iter().copied().collect();
    while let Some(item) = work.pop() {
        let Some(sym) = item.next_symbol(grammar) else {
            continue;
        };
        if grammar.is_terminal(sym) {
            continue;
        }
        let lookaheads = grammar.find_first(item.rule, item.dot + 1, item.lookahead);
        for &rule in grammar.rules_for(sym) {
            for &la in &lookaheads {
                let new_item = Item::new(rule, 0, la);
                if items.insert(new_item) {
                    added += 1;
                    work.push(new_item);
                }
            }
        }
    }
    added
}

/// Kernel of the goto target: items with `sym` right of the dot, advanced by
/// one position. Empty if no item can move over `sym`.
pub fn goto_kernel(grammar: &Grammar, items: &ItemSet, sym: SymbolId) -> ItemSet {
    items
        .iter()
        .filter(|item| item.next_symbol(grammar) == Some(sym))
        .map(|item| item.advance())
        .collect()
}

/// A canonical LR(1) state. Frozen once the builder has expanded it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct State {
    index: StateId,
    items: ItemSet,
    incoming: Option<SymbolId>,
    transitions: BTreeMap<SymbolId, StateId>,
}

impl State {
    pub fn index(&self) -> StateId {
        self.index
    }

    /// The closed item set.
    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    /// Symbol the state was first reached on; `None` for the start state.
    pub fn incoming(&self) -> Option<SymbolId> {
        self.incoming
    }

    /// Goto edges, ordered by symbol id.
    pub fn transitions(&self) -> &BTreeMap<SymbolId, StateId> {
        &self.transitions
    }

    /// Items that did not come from closure: the dot is past the start, or
    /// the item is the augmented start item.
    pub fn kernel(&self) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .filter(|item| item.dot > 0 || item.rule == RuleId(0))
    }
}

/// Counters collected while building the state machine.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Lr1Stats {
    pub states: usize,
    pub expansions: usize,
    pub closures: usize,
    pub candidates: usize,
}

/// Action candidates per `(state, symbol)` cell, in addition order.
pub type Candidates = BTreeMap<(StateId, SymbolId), Vec<Action>>;

/// The canonical collection together with its action candidates.
#[derive(Clone, Debug)]
pub struct Lr1Automaton {
    states: Vec<State>,
    candidates: Candidates,
    stats: Lr1Stats,
}

impl Lr1Automaton {
    /// Builds the canonical collection for `grammar`.
    pub fn build(grammar: &Grammar) -> Self {
        Lr1Builder::new(grammar).run()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.0]
    }

    pub fn candidates(&self) -> &Candidates {
        &self.candidates
    }

    pub fn stats(&self) -> &Lr1Stats {
        &self.stats
    }
}

struct Pending {
    incoming: Option<SymbolId>,
    transitions: BTreeMap<SymbolId, StateId>,
}

struct Lr1Builder<'g> {
    grammar: &'g Grammar,
    sets: IndexSet<ItemSet>,
    pending: Vec<Pending>,
    queue: VecDeque<StateId>,
    candidates: Candidates,
    stats: Lr1Stats,
}

impl<'g> Lr1Builder<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        Self {
            grammar,
            sets: IndexSet::new(),
            pending: Vec::new(),
            queue: VecDeque::new(),
            candidates: Candidates::new(),
            stats: Lr1Stats::default(),
        }
    }

    fn run(mut self) -> Lr1Automaton {
        let start = ItemSet::from([Item::new(RuleId(0), 0, END)]);
        self.intern(start, None);

        while let Some(id) = self.queue.pop_front() {
            self.expand(id);
        }

        self.stats.states = self.sets.len();
        self.stats.candidates = self.candidates.values().map(Vec::len).sum();
        log::debug!("lr1: {:?}", self.stats);

        let states = self
            .sets
            .into_iter()
            .zip(self.pending)
            .enumerate()
            .map(|(i, (items, p))| State {
                index: StateId(i),
                items,
                incoming: p.incoming,
                transitions: p.transitions,
            })
            .collect();

        Lr1Automaton {
            states,
            candidates: self.candidates,
            stats: self.stats,
        }
    }

    /// Closes `kernel` and returns the id of the equal state, allocating and
    /// enqueueing a new one if none exists.
    fn intern(&mut self, mut kernel: ItemSet, incoming: Option<SymbolId>) -> StateId {
        closure(self.grammar, &mut kernel);
        self.stats.closures += 1;
        let (index, inserted) = self.sets.insert_full(kernel);
        if inserted {
            self.pending.push(Pending {
                incoming,
                transitions: BTreeMap::new(),
            });
            self.queue.push_back(StateId(index));
        }
        StateId(index)
    }

    fn expand(&mut self, id: StateId) {
        self.stats.expansions += 1;
        let items = self.sets[id.0].clone();

        let mut groups: BTreeMap<SymbolId, ItemSet> = BTreeMap::new();
        let mut reduces = Vec::new();
        for item in &items {
            match item.next_symbol(self.grammar) {
                Some(sym) => {
                    groups.entry(sym).or_default().insert(item.advance());
                }
                None => reduces.push((item.lookahead, item.rule)),
            }
        }

        for (sym, kernel) in groups {
            let target = self.intern(kernel, Some(sym));
            self.pending[id.0].transitions.insert(sym, target);
            self.candidates
                .entry((id, sym))
                .or_default()
                .push(Action::Shift(target));
        }

        // Items are sorted by rule first, so reduces arrive in rule order.
        for (la, rule) in reduces {
            let cell = self.candidates.entry((id, la)).or_default();
            let action = Action::Reduce(rule);
            if !cell.contains(&action) {
                cell.push(action);
            }
        }

        log::trace!(
            "lr1: expanded state {} ({} items, {} transitions)",
            id,
            items.len(),
            self.pending[id.0].transitions.len()
        );
    }
}
