//! Line parser for `.g` grammar files, built with [`chumsky`].
//!
//! One non-empty line of tokens is one of:
//!
//! ```text
//! [label:] Lhs -> sym sym ...              rule (empty right-hand side allowed)
//! %start Lhs                               start symbol
//! %resolve lookahead shift|label [Sym]     conflict declaration
//! ```
//!
//! The optional trailing symbol of `%resolve` restricts the declaration to
//! states entered on that symbol.

use super::lexer::Token;
use chumsky::prelude::*;
use smartstring::alias::String;

/// A right-hand-side symbol as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Term(String),
    NonTerm(String),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Term(s) | Symbol::NonTerm(s) => s,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Symbol::Term(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub label: Option<String>,
    pub lhs: String,
    pub rhs: Vec<Symbol>,
}

/// One parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Production(Production),
    Start(String),
    Resolve {
        lookahead: String,
        choice: String,
        incoming: Option<Symbol>,
    },
}

pub fn parser<'a>() -> impl Parser<'a, &'a [Token], Line> {
    let symbol = select! {
        Token::Term(t) => Symbol::Term(t),
        Token::NonTerm(n) => Symbol::NonTerm(n),
    }
    .labelled("symbol");

    let term = select! { Token::Term(t) => t }.labelled("terminal");
    let left = select! { Token::NonTerm(n) => n }.labelled("left");
    let arrow = select! { Token::Arrow => () }.labelled("arrow");
    let label = select! { Token::Label(l) => l }.labelled("label");

    let production = label
        .or_not()
        .then(left.clone())
        .then_ignore(arrow)
        .then(symbol.clone().repeated().collect::<Vec<_>>())
        .map(|((label, lhs), rhs)| Line::Production(Production { label, lhs, rhs }));

    let start = select! { Token::Directive(d) if d.as_str() == "start" => () }
        .ignore_then(left)
        .map(Line::Start);

    let resolve = select! { Token::Directive(d) if d.as_str() == "resolve" => () }
        .ignore_then(term.clone())
        .then(term)
        .then(symbol.or_not())
        .map(|((lookahead, choice), incoming)| Line::Resolve {
            lookahead,
            choice,
            incoming,
        });

    production.or(start).or(resolve).then_ignore(end())
}
