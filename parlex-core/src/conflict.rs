//! Conflict declarations and diagnostics.
//!
//! A cell of the action table with more than one candidate is a conflict.
//! Grammar authors settle known conflicts with an ordered list of
//! [`ConflictDecl`]s; the first declaration whose state selector and
//! lookahead match the cell, and whose [`Choice`] names one of the
//! candidates, decides it. Anything left over becomes a [`Conflict`]
//! diagnostic and is tie-broken by taking the first candidate.

use crate::action::Action;
use crate::error::{Error, Result};
use crate::grammar::{Grammar, RuleId};
use crate::lr1::{State, StateId};
use crate::symtab::SymbolId;
use smartstring::alias::String;

/// Which states a declaration applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateSelector {
    /// Every state.
    Any,
    /// One state by id.
    State(StateId),
    /// States entered on the given symbol.
    Incoming(SymbolId),
}

impl StateSelector {
    pub fn matches(&self, state: &State) -> bool {
        match *self {
            StateSelector::Any => true,
            StateSelector::State(id) => state.index() == id,
            StateSelector::Incoming(sym) => state.incoming() == Some(sym),
        }
    }
}

/// The action a declaration prefers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Choice {
    /// Take the shift candidate.
    Shift,
    /// Take the reduce candidate for this rule.
    Reduce(RuleId),
}

impl Choice {
    fn pick(&self, candidates: &[Action]) -> Option<Action> {
        candidates.iter().copied().find(|action| match (self, action) {
            (Choice::Shift, Action::Shift(_)) => true,
            (Choice::Reduce(want), Action::Reduce(rule)) => want == rule,
            _ => false,
        })
    }
}

/// An author-supplied `(state selector, lookahead, choice)` resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConflictDecl {
    pub state: StateSelector,
    pub lookahead: SymbolId,
    pub choice: Choice,
}

impl ConflictDecl {
    pub fn new(state: StateSelector, lookahead: SymbolId, choice: Choice) -> Self {
        Self {
            state,
            lookahead,
            choice,
        }
    }

    /// Builds a declaration from a lookahead name, checking it against `grammar`.
    pub fn named(
        grammar: &Grammar,
        state: StateSelector,
        lookahead: &str,
        choice: Choice,
    ) -> Result<Self> {
        let lookahead = grammar
            .symbols()
            .lookup(lookahead)
            .filter(|&id| grammar.is_terminal(id))
            .ok_or_else(|| Error::UnknownSymbol {
                name: String::from(lookahead),
            })?;
        let decl = Self::new(state, lookahead, choice);
        decl.validate(grammar)?;
        Ok(decl)
    }

    pub(crate) fn validate(&self, grammar: &Grammar) -> Result<()> {
        if !grammar.is_terminal(self.lookahead) {
            return Err(Error::UnknownSymbol {
                name: String::from(&*grammar.symbols().name(self.lookahead)),
            });
        }
        match self.choice {
            Choice::Reduce(rule) if rule.0 >= grammar.rules().len() => {
                Err(Error::UnknownRule { rule: rule.0 })
            }
            _ => Ok(()),
        }
    }

    /// The candidate this declaration selects for the cell, if it applies.
    pub fn resolve(
        &self,
        state: &State,
        lookahead: SymbolId,
        candidates: &[Action],
    ) -> Option<Action> {
        if self.lookahead != lookahead || !self.state.matches(state) {
            return None;
        }
        self.choice.pick(candidates)
    }
}

/// An unresolved cell: reported, then tie-broken by the first candidate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    pub state: StateId,
    pub lookahead: SymbolId,
    pub incoming: Option<SymbolId>,
    pub candidates: Vec<Action>,
    pub chosen: Action,
}

impl Conflict {
    pub fn is_shift_reduce(&self) -> bool {
        self.candidates.iter().any(|a| matches!(a, Action::Shift(_)))
    }

    /// One-line diagnostic naming the state, lookahead, incoming symbol and
    /// every candidate.
    pub fn describe(&self, grammar: &Grammar) -> std::string::String {
        let symbols = grammar.symbols();
        let kind = if self.is_shift_reduce() {
            "shift/reduce"
        } else {
            "reduce/reduce"
        };
        let mut s = format!(
            "{} conflict in state {} on {:?}",
            kind,
            self.state,
            symbols.name(self.lookahead)
        );
        if let Some(sym) = self.incoming {
            s.push_str(&format!(" (entered on {:?})", symbols.name(sym)));
        }
        s.push(':');
        for action in &self.candidates {
            s.push_str(&format!(" [{}]", action.describe(grammar)));
        }
        s.push_str(&format!("; using {}", self.chosen.describe(grammar)));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::GrammarBuilder;
    use crate::lr1::Lr1Automaton;

    fn grammar() -> Grammar {
        let mut g = GrammarBuilder::new();
        g.rule("S", ["a"]);
        g.build().unwrap()
    }

    #[test]
    fn named_rejects_nonterminal_lookahead() {
        let g = grammar();
        let err = ConflictDecl::named(&g, StateSelector::Any, "S", Choice::Shift).unwrap_err();
        assert_eq!(err, Error::UnknownSymbol { name: "S".into() });
        let err = ConflictDecl::named(&g, StateSelector::Any, "zzz", Choice::Shift).unwrap_err();
        assert!(matches!(err, Error::UnknownSymbol { .. }));
    }

    #[test]
    fn named_rejects_unknown_rule() {
        let g = grammar();
        let err =
            ConflictDecl::named(&g, StateSelector::Any, "a", Choice::Reduce(RuleId(9))).unwrap_err();
        assert_eq!(err, Error::UnknownRule { rule: 9 });
    }

    #[test]
    fn choice_picks_matching_candidate() {
        let candidates = [Action::Shift(StateId(4)), Action::Reduce(RuleId(2))];
        assert_eq!(Choice::Shift.pick(&candidates), Some(Action::Shift(StateId(4))));
        assert_eq!(
            Choice::Reduce(RuleId(2)).pick(&candidates),
            Some(Action::Reduce(RuleId(2)))
        );
        assert_eq!(Choice::Reduce(RuleId(3)).pick(&candidates), None);
    }

    #[test]
    fn selectors() {
        let g = grammar();
        let lr = Lr1Automaton::build(&g);
        let a = g.symbols().lookup("a").unwrap();
        let s0 = lr.state(StateId(0));
        let after_a = lr.state(s0.transitions()[&a]);
        assert!(StateSelector::Any.matches(s0));
        assert!(StateSelector::State(StateId(0)).matches(s0));
        assert!(!StateSelector::Incoming(a).matches(s0));
        assert!(StateSelector::Incoming(a).matches(after_a));
    }
}
