//! Parse actions and the dense action/goto table.
//!
//! Every `(state, symbol)` cell holds one signed [`ActionCode`]:
//!
//! | code       | meaning                                           |
//! |------------|---------------------------------------------------|
//! | `n >= 0`   | shift to state `n` (terminal column) or goto `n` (nonterminal column) |
//! | `-1`       | no action: syntax error                           |
//! | `n <= -2`  | reduce by rule `-n - 2`; reducing rule 0 accepts  |
//!
//! [`ParserTables::build`] fills the table from the LR(1) candidates,
//! settling cells with several candidates through the declared
//! [`ConflictDecl`]s or, failing that, by the first candidate plus a
//! [`Conflict`] diagnostic.
//!
//! ```rust
//! # use parlex_core::{Action, ActionCode, RuleId, StateId};
//! assert_eq!(ActionCode::from(Action::Reduce(RuleId(4))).0, -6);
//! assert_eq!(ActionCode(-6).decode(), Action::Reduce(RuleId(4)));
//! assert_eq!(ActionCode::from(Action::Shift(StateId(7))).0, 7);
//! assert_eq!(ActionCode::ERROR.decode(), Action::Error);
//! ```

use crate::conflict::{Conflict, ConflictDecl};
use crate::error::{Error, Result};
use crate::grammar::{Grammar, RuleId};
use crate::lr1::{Lr1Automaton, StateId};
use crate::symtab::SymbolId;

/// A decoded parse action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// Shift (terminal) or goto (nonterminal) to a state.
    Shift(StateId),
    /// Reduce by a rule; rule 0 accepts.
    Reduce(RuleId),
    /// Syntax error.
    Error,
}

impl Action {
    pub fn is_accept(&self) -> bool {
        matches!(self, Action::Reduce(RuleId(0)))
    }

    /// Human-readable form used in diagnostics.
    pub fn describe(&self, grammar: &Grammar) -> String {
        match self {
            Action::Shift(state) => format!("shift to state {}", state),
            Action::Reduce(RuleId(0)) => "accept".to_string(),
            Action::Reduce(rule) => format!("reduce {}", grammar.rule_text(*rule)),
            Action::Error => "error".to_string(),
        }
    }
}

/// A single packed table cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionCode(pub i32);

impl ActionCode {
    pub const ERROR: ActionCode = ActionCode(-1);
    /// Largest encodable shift target.
    pub const MAX_STATE: usize = i32::MAX as usize;
    /// Largest encodable rule id: `-(r + 2)` must stay above `i32::MIN`.
    pub const MAX_RULE: usize = i32::MAX as usize - 1;

    /// Ids above [`ActionCode::MAX_STATE`] do not fit; [`ParserTables::build`]
    /// rejects such machines before encoding.
    #[inline]
    pub fn shift(state: StateId) -> Self {
        ActionCode(state.0 as i32)
    }

    /// Ids above [`ActionCode::MAX_RULE`] do not fit.
    #[inline]
    pub fn reduce(rule: RuleId) -> Self {
        ActionCode(-(rule.0 as i32) - 2)
    }

    #[inline]
    pub fn is_error(self) -> bool {
        self == Self::ERROR
    }

    pub fn decode(self) -> Action {
        match self.0 {
            n if n >= 0 => Action::Shift(StateId(n as usize)),
            -1 => Action::Error,
            n => Action::Reduce(RuleId((-i64::from(n) - 2) as usize)),
        }
    }
}

impl From<Action> for ActionCode {
    fn from(action: Action) -> Self {
        match action {
            Action::Shift(state) => ActionCode::shift(state),
            Action::Reduce(rule) => ActionCode::reduce(rule),
            Action::Error => ActionCode::ERROR,
        }
    }
}

/// Fails when a state or rule id of the machine cannot be an [`ActionCode`].
pub(crate) fn check_encodable(states: usize, rules: usize) -> Result<()> {
    if states > ActionCode::MAX_STATE + 1 {
        return Err(Error::ValueOutOfRange {
            value: (states - 1) as u64,
        });
    }
    if rules > ActionCode::MAX_RULE + 1 {
        return Err(Error::ValueOutOfRange {
            value: (rules - 1) as u64,
        });
    }
    Ok(())
}

/// Dense, row-major `states x symbols` table of action codes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionTable {
    rows: usize,
    columns: usize,
    cells: Vec<i32>,
}

impl ActionTable {
    /// A table with every cell set to [`ActionCode::ERROR`].
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![ActionCode::ERROR.0; rows * columns],
        }
    }

    /// Number of states.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of symbols.
    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    pub fn row(&self, state: StateId) -> &[i32] {
        let start = state.0 * self.columns;
        &self.cells[start..start + self.columns]
    }

    pub fn get(&self, state: StateId, sym: SymbolId) -> ActionCode {
        ActionCode(self.cells[state.0 * self.columns + sym.0])
    }

    pub fn set(&mut self, state: StateId, sym: SymbolId, code: ActionCode) {
        self.cells[state.0 * self.columns + sym.0] = code.0;
    }
}

/// Output of the parser-table pipeline.
#[derive(Clone, Debug)]
pub struct ParserTables {
    automaton: Lr1Automaton,
    table: ActionTable,
    conflicts: Vec<Conflict>,
    resolved: usize,
}

impl ParserTables {
    /// Builds the canonical LR(1) machine for `grammar` and collapses its
    /// candidates into one action per cell.
    ///
    /// Declarations are validated up front; a declaration naming an unknown
    /// terminal or rule fails the run. Unresolved conflicts do not.
    pub fn build(grammar: &Grammar, decls: &[ConflictDecl]) -> Result<Self> {
        for decl in decls {
            decl.validate(grammar)?;
        }

        let automaton = Lr1Automaton::build(grammar);
        check_encodable(automaton.states().len(), grammar.rules().len())?;
        let mut table = ActionTable::new(automaton.states().len(), grammar.symbols().len());
        let mut conflicts = Vec::new();
        let mut resolved = 0;

        for (&(state_id, sym), candidates) in automaton.candidates() {
            let action = match candidates.as_slice() {
                [] => continue,
                [only] => *only,
                [first, ..] => {
                    let state = automaton.state(state_id);
                    let declared = decls
                        .iter()
                        .find_map(|decl| decl.resolve(state, sym, candidates));
                    match declared {
                        Some(action) => {
                            log::debug!(
                                "state {} on {:?}: declared resolution {}",
                                state_id,
                                grammar.symbols().name(sym),
                                action.describe(grammar)
                            );
                            resolved += 1;
                            action
                        }
                        None => {
                            let conflict = Conflict {
                                state: state_id,
                                lookahead: sym,
                                incoming: state.incoming(),
                                candidates: candidates.clone(),
                                chosen: *first,
                            };
                            log::warn!("{}", conflict.describe(grammar));
                            conflicts.push(conflict);
                            *first
                        }
                    }
                }
            };
            table.set(state_id, sym, action.into());
        }

        log::debug!(
            "action table: {} x {}, {} conflicts ({} resolved by declaration)",
            table.rows(),
            table.columns(),
            conflicts.len(),
            resolved
        );

        Ok(Self {
            automaton,
            table,
            conflicts,
            resolved,
        })
    }

    pub fn automaton(&self) -> &Lr1Automaton {
        &self.automaton
    }

    pub fn table(&self) -> &ActionTable {
        &self.table
    }

    /// Conflicts left to the default tie-break.
    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    /// Number of conflicting cells settled by a declaration.
    pub fn resolved(&self) -> usize {
        self.resolved
    }
}
