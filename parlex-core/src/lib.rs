//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Table construction core for parser and scanner generators.
//!
//! `parlex-core` runs two independent pipelines:
//!  * **parser tables**: [`GrammarBuilder`] → [`Grammar`] (FIRST sets) →
//!    [`Lr1Automaton`] (canonical LR(1) item sets) → [`ParserTables`]
//!    (one [`ActionCode`] per cell, conflicts settled by [`ConflictDecl`]s
//!    or reported as [`Conflict`]s);
//!  * **scanner tables**: any [`Nfa`] → [`Dfa`] (subset construction) →
//!    [`CompactDfa`] (column reduction) → [`PackedTable`] (fixed-width bytes),
//!    wrapped up by [`build_scanner_tables`].
//!
//! Parsing grammar files and emitting code are left to front-ends such as
//! `parlex-tool`.
//!
//! ```rust
//! use parlex_core::{Action, GrammarBuilder, ParserTables, StateId, END};
//!
//! let mut g = GrammarBuilder::new();
//! g.rule("S", ["if", "E", "then", "S"]);
//! g.rule("S", ["if", "E", "then", "S", "else", "S"]);
//! g.rule("S", ["other"]);
//! g.rule("E", ["cond"]);
//! let grammar = g.build()?;
//!
//! let tables = ParserTables::build(&grammar, &[])?;
//! assert_eq!(tables.conflicts().len(), 1); // the dangling else
//! let other = grammar.symbols().lookup("other").unwrap();
//! assert!(matches!(tables.table().get(StateId(0), other).decode(), Action::Shift(_)));
//! assert!(tables.table().get(StateId(0), END).is_error());
//! # Ok::<(), parlex_core::Error>(())
//! ```

mod action;
mod compact;
mod conflict;
mod dfa;
mod error;
mod grammar;
mod lr1;
mod nfa;
mod pack;
pub mod report;
mod scanner;
mod symtab;

pub use crate::action::{Action, ActionCode, ActionTable, ParserTables};
pub use crate::compact::{ClassMap, CompactDfa, DfaNode};
pub use crate::conflict::{Choice, Conflict, ConflictDecl, StateSelector};
pub use crate::dfa::{DEAD, Dfa, DfaBuilder, DfaState, START};
pub use crate::error::{Error, Result};
pub use crate::grammar::{
    ACCEPT, ACCEPT_NAME, END, END_NAME, FirstSet, Grammar, GrammarBuilder, Rule, RuleId,
};
pub use crate::lr1::{
    Candidates, Item, ItemSet, Lr1Automaton, Lr1Stats, State, StateId, closure, goto_kernel,
};
pub use crate::nfa::{MAX_CLASSES, Nfa, NfaGraph, NfaStateSet, SymbolClass};
pub use crate::pack::{Compressor, IntWidth, PackedTable};
pub use crate::scanner::{ScannerOptions, ScannerStrategy, ScannerTables, build_scanner_tables};
pub use crate::symtab::{Symbol, SymbolId, SymbolTable};
