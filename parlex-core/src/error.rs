//! Error type for table construction.
//!
//! Only structural input violations are errors. LR conflicts without a
//! matching declaration are *not* errors: they are returned as
//! [`Conflict`](crate::Conflict) values next to the finished table and logged
//! at `warn` level, because inspecting an imperfect table is a normal part of
//! grammar authoring.
//!
//! # Examples
//!
//! ```rust
//! # use parlex_core::{Error, GrammarBuilder};
//! let err = GrammarBuilder::new().build().unwrap_err();
//! assert!(matches!(err, Error::EmptyGrammar));
//! assert!(err.to_string().contains("no rules"));
//! ```

use smartstring::alias::String;
use thiserror::Error;

/// Errors produced while building grammars, automata and tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The grammar has no rules, so there is nothing to augment.
    #[error("grammar has no rules")]
    EmptyGrammar,

    /// A symbol was interned as a nonterminal but never heads a rule.
    #[error("nonterminal {name:?} has no rules")]
    UndefinedNonterminal {
        /// Printable name of the offending symbol.
        name: String,
    },

    /// A reserved symbol (`$accept`, `$end`) was used where the grammar
    /// author may not place it.
    #[error("reserved symbol {name:?} cannot be {usage}")]
    ReservedSymbol {
        /// The reserved name.
        name: String,
        /// What the grammar tried to do with it.
        usage: &'static str,
    },

    /// A conflict declaration refers to a lookahead that is not a terminal.
    #[error("unknown terminal {name:?} in conflict declaration")]
    UnknownSymbol {
        /// Name as written in the declaration.
        name: String,
    },

    /// A conflict declaration refers to a rule that does not exist.
    #[error("unknown rule {rule} in conflict declaration")]
    UnknownRule {
        /// The rule id as written in the declaration.
        rule: usize,
    },

    /// The automaton provider broke its contract (state or class out of range).
    #[error("malformed automaton: {reason}")]
    MalformedAutomaton {
        /// Human-readable description of the violation.
        reason: String,
    },

    /// A Thompson NFA state uses a look-around assertion.
    #[error("look-around assertion in NFA state {state} cannot be expressed as a symbol class")]
    UnsupportedLook {
        /// Index of the offending NFA state.
        state: usize,
    },

    /// A value does not fit into four bytes.
    #[error("value {value} does not fit into a 4-byte table cell")]
    ValueOutOfRange {
        /// The value that failed to pack.
        value: u64,
    },
}

impl Error {
    /// Builds a [`Error::MalformedAutomaton`] from anything printable.
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Error::MalformedAutomaton {
            reason: String::from(reason.to_string().as_str()),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
