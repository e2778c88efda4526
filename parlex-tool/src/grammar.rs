//! Loader for `.g` grammar files.
//!
//! A grammar file lists one rule per line, optionally labelled, plus `%start`
//! and `%resolve` directives:
//!
//! ```text
//! -- dangling else
//! %start Stmt
//! %resolve else shift Stmt
//! ifThen:     Stmt -> if Cond then Stmt
//! ifThenElse: Stmt -> if Cond then Stmt else Stmt
//!             Stmt -> other
//!             Cond -> cond
//! ```
//!
//! `%resolve <lookahead> shift` prefers the shift candidate; `%resolve
//! <lookahead> <label>` prefers reducing the rule with that label. Declarations
//! keep their file order, which is the order they are tried in.

mod lexer;
mod parser;

use anyhow::{Context, Result, anyhow, bail};
use chumsky::Parser;
use lexer::Lexer;
use parlex_core::{Choice, ConflictDecl, Grammar, GrammarBuilder, RuleId, StateSelector};
use parser::{Line, Symbol};
use smartstring::alias::String;
use std::collections::HashMap;
use std::path::Path;

/// A grammar together with its conflict declarations.
#[derive(Debug, Clone)]
pub struct GrammarSpec {
    pub grammar: Grammar,
    pub conflicts: Vec<ConflictDecl>,
}

struct PendingResolve {
    line_no: usize,
    lookahead: String,
    choice: String,
    incoming: Option<Symbol>,
}

/// Parses grammar source text.
pub fn parse_grammar(input: &str) -> Result<GrammarSpec> {
    let lines = Lexer::tokenize_lines(input)?;

    let mut builder = GrammarBuilder::new();
    let mut labels: HashMap<String, RuleId> = HashMap::new();
    let mut resolves = Vec::new();

    for (i, tokens) in lines.iter().enumerate() {
        let line_no = i + 1;
        if tokens.is_empty() {
            continue;
        }
        let line = parser::parser()
            .parse(tokens.as_slice())
            .into_result()
            .map_err(|_| anyhow!("line {}: syntax error", line_no))?;

        match line {
            Line::Production(p) => {
                for sym in &p.rhs {
                    builder.symbol(sym.name(), sym.is_terminal());
                }
                let rhs = p.rhs.iter().map(Symbol::name);
                match p.label {
                    Some(label) => {
                        let id = builder.labelled_rule(&label, &p.lhs, rhs);
                        if labels.insert(label.clone(), id).is_some() {
                            bail!("line {}: duplicate rule label {:?}", line_no, label);
                        }
                    }
                    None => {
                        builder.rule(&p.lhs, rhs);
                    }
                }
            }
            Line::Start(name) => {
                builder.start(&name);
            }
            Line::Resolve {
                lookahead,
                choice,
                incoming,
            } => resolves.push(PendingResolve {
                line_no,
                lookahead,
                choice,
                incoming,
            }),
        }
    }

    let grammar = builder.build()?;

    let conflicts = resolves
        .into_iter()
        .map(|r| {
            resolve_decl(&grammar, &labels, &r).with_context(|| format!("line {}", r.line_no))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!(
        "grammar: {} rules, {} symbols, {} conflict declarations",
        grammar.rules().len(),
        grammar.symbols().len(),
        conflicts.len()
    );
    Ok(GrammarSpec { grammar, conflicts })
}

fn resolve_decl(
    grammar: &Grammar,
    labels: &HashMap<String, RuleId>,
    r: &PendingResolve,
) -> Result<ConflictDecl> {
    let choice = match r.choice.as_str() {
        "shift" => Choice::Shift,
        label => Choice::Reduce(
            *labels
                .get(label)
                .ok_or_else(|| anyhow!("unknown rule label {:?}", label))?,
        ),
    };
    let selector = match &r.incoming {
        None => StateSelector::Any,
        Some(sym) => StateSelector::Incoming(
            grammar
                .symbols()
                .lookup(sym.name())
                .ok_or_else(|| anyhow!("unknown symbol {:?}", sym.name()))?,
        ),
    };
    Ok(ConflictDecl::named(grammar, selector, &r.lookahead, choice)?)
}

/// Reads and parses a grammar file.
pub fn load_grammar<P: AsRef<Path>>(path: P) -> Result<GrammarSpec> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read grammar {}", path.display()))?;
    parse_grammar(&input).with_context(|| format!("Failed to load grammar {}", path.display()))
}
