//! Lexer for `.g` grammar files.
//!
//! Built on [`logos`]. Lowercase words are terminals, capitalized words are
//! nonterminals, a lowercase word followed by `:` labels a rule, and `%word`
//! starts a directive. Any single punctuation character is a terminal named
//! by the character itself, so `E -> E + T` reads naturally, and `$end`
//! names the end-of-input terminal. Whitespace and
//! `--` comments are skipped; line feeds are kept because a rule ends at the
//! end of its line.

use anyhow::{Result, anyhow};
use logos::Logos;
use smartstring::alias::String;

/// Tokens produced by the grammar lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A rule label, without the trailing colon (e.g. `ifElse`).
    Label(String),
    /// A nonterminal (e.g. `Expr`).
    NonTerm(String),
    /// A terminal (e.g. `num`, `+`).
    Term(String),
    /// The rule arrow `->`.
    Arrow,
    /// A directive name without the leading `%` (e.g. `start`).
    Directive(String),
    /// End of a source line.
    LineFeed,
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
enum LogosToken {
    #[regex(r"\n")]
    LineFeed,

    #[regex(r"--[^\n]*")]
    Comment,

    #[token("->")]
    Arrow,

    #[regex(r"%[a-z]+")]
    Directive,

    #[regex(r"[a-z][a-zA-Z0-9_]*:")]
    Label,

    #[regex(r"[a-z][a-zA-Z0-9_]*")]
    Atom,

    #[regex(r"[A-Z][a-zA-Z0-9_]*")]
    Var,

    #[token("$end")]
    End,

    #[regex(r###"[-~`!@#$%^&*+=|\\<>?/;\(\)\[\]{},\.'":]"###)]
    Sym,
}

/// Source-level lexer over one grammar file.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, LogosToken>,
    line: usize,
}

impl<'source> Lexer<'source> {
    pub fn new(input: &'source str) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            line: 1,
        }
    }

    /// 1-based line of the most recent token.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Next token, `None` at end of input.
    pub fn next_token(&mut self) -> Option<Result<Token>> {
        while let Some(kind) = self.inner.next() {
            let slice = self.inner.slice();
            return Some(match kind {
                Ok(LogosToken::Comment) => continue,
                Ok(LogosToken::LineFeed) => {
                    self.line += 1;
                    Ok(Token::LineFeed)
                }
                Ok(LogosToken::Arrow) => Ok(Token::Arrow),
                Ok(LogosToken::Directive) => Ok(Token::Directive(String::from(&slice[1..]))),
                Ok(LogosToken::Label) => {
                    Ok(Token::Label(String::from(&slice[..slice.len() - 1])))
                }
                Ok(LogosToken::Atom) | Ok(LogosToken::Sym) | Ok(LogosToken::End) => {
                    Ok(Token::Term(String::from(slice)))
                }
                Ok(LogosToken::Var) => Ok(Token::NonTerm(String::from(slice))),
                Err(()) => Err(anyhow!(
                    "line {}: unexpected character {:?}",
                    self.line,
                    slice
                )),
            });
        }
        None
    }

    /// Splits `input` into lines of tokens. Line `i` of the result is source
    /// line `i + 1`; comment-only and blank lines come back empty.
    pub fn tokenize_lines(input: &'source str) -> Result<Vec<Vec<Token>>> {
        let mut lex = Lexer::new(input);
        let mut lines = vec![Vec::new()];
        while let Some(tok) = lex.next_token() {
            match tok? {
                Token::LineFeed => lines.push(Vec::new()),
                tok => {
                    if let Some(line) = lines.last_mut() {
                        line.push(tok);
                    }
                }
            }
        }
        if lines.len() > 1 && lines.last().is_some_and(Vec::is_empty) {
            lines.pop();
        }
        Ok(lines)
    }
}
