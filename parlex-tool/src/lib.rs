//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0
//! or (at your option) any later version (LGPL-3.0-or-later).
//!
//! Front-end loaders for `parlex-core`.
//!
//! `parlex-tool` reads the two source formats and hands the results to the
//! core table builders:
//!  * **`grammar`**: `.g` grammar files with `%start` and `%resolve`
//!    directives, producing a [`parlex_core::Grammar`] and its
//!    [`parlex_core::ConflictDecl`]s;
//!  * **`lexspec`**: lexer specs of `Label: regex` rules, compiled into a
//!    [`parlex_core::NfaGraph`].
//!
//! The `ptab` binary (feature `cli`) prints the resulting tables.

pub mod grammar;
pub mod lexspec;

pub use grammar::{GrammarSpec, load_grammar, parse_grammar};
pub use lexspec::{LexRule, LexSpec, load_lexspec, parse_lexspec};
