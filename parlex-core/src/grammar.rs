//! Grammar model: rules, the augmented start rule and FIRST sets.
//!
//! A [`GrammarBuilder`] collects rules in declaration order. [`GrammarBuilder::build`]
//! freezes them into a [`Grammar`], adding the synthetic rule 0
//! `$accept -> Start` and computing the FIRST set of every symbol.
//!
//! ```rust
//! # use parlex_core::{GrammarBuilder, END};
//! let mut g = GrammarBuilder::new();
//! g.rule("E", ["E", "plus", "T"]);
//! g.rule("E", ["T"]);
//! g.rule("T", ["num"]);
//! let grammar = g.build().unwrap();
//!
//! assert_eq!(grammar.rules().len(), 4); // rule 0 is `$accept -> E`
//! assert_eq!(grammar.rule_text(0.into()), "$accept -> E");
//! let e = grammar.symbols().lookup("E").unwrap();
//! let num = grammar.symbols().lookup("num").unwrap();
//! assert!(grammar.first(e).contains(num));
//! assert!(!grammar.first(e).contains(END));
//! ```

use crate::error::{Error, Result};
use crate::symtab::{SymbolId, SymbolTable};
use smartstring::alias::String;
use std::collections::BTreeSet;
use std::fmt;

/// Head of the augmented rule 0.
pub const ACCEPT: SymbolId = SymbolId(0);
/// End-of-input terminal; the lookahead of the augmented start item.
pub const END: SymbolId = SymbolId(1);

pub const ACCEPT_NAME: &str = "$accept";
pub const END_NAME: &str = "$end";

/// Index of a rule in [`Grammar::rules`]. Rule 0 is the augmented start rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(pub usize);

impl RuleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for RuleId {
    fn from(i: usize) -> Self {
        RuleId(i)
    }
}

impl From<RuleId> for usize {
    fn from(id: RuleId) -> Self {
        id.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A production `lhs -> rhs`. An empty `rhs` is an epsilon rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    id: RuleId,
    lhs: SymbolId,
    rhs: Vec<SymbolId>,
    label: Option<String>,
}

impl Rule {
    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn lhs(&self) -> SymbolId {
        self.lhs
    }

    pub fn rhs(&self) -> &[SymbolId] {
        &self.rhs
    }

    /// Optional author-supplied label, e.g. `expr1` in `expr1: E -> E plus T`.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn len(&self) -> usize {
        self.rhs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }
}

/// FIRST set of a symbol: the terminals that can begin one of its
/// derivations, plus whether it can derive the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirstSet {
    terminals: BTreeSet<SymbolId>,
    nullable: bool,
}

impl FirstSet {
    pub fn contains(&self, sym: SymbolId) -> bool {
        self.terminals.contains(&sym)
    }

    /// `true` if epsilon is in the set.
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn terminals(&self) -> &BTreeSet<SymbolId> {
        &self.terminals
    }
}

/// Collects symbols and rules before freezing them into a [`Grammar`].
#[derive(Debug)]
pub struct GrammarBuilder {
    symbols: SymbolTable,
    rules: Vec<Rule>,
    start: Option<String>,
    declared_nonterms: Vec<SymbolId>,
    reserved_misuse: Option<Error>,
}

impl Default for GrammarBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GrammarBuilder {
    /// Creates a builder with `$accept` and `$end` already interned as
    /// symbols 0 and 1.
    pub fn new() -> Self {
        let mut symbols = SymbolTable::new();
        let accept = symbols.create_or_get(ACCEPT_NAME, false);
        let end = symbols.create_or_get(END_NAME, true);
        debug_assert_eq!((accept, end), (ACCEPT, END));
        Self {
            symbols,
            rules: Vec::new(),
            start: None,
            declared_nonterms: Vec::new(),
            reserved_misuse: None,
        }
    }

    /// Remembers the first misuse of a reserved symbol; [`GrammarBuilder::build`]
    /// reports it.
    fn reserve(&mut self, name: &str, usage: &'static str) -> bool {
        if name != ACCEPT_NAME && name != END_NAME {
            return false;
        }
        if self.reserved_misuse.is_none() {
            self.reserved_misuse = Some(Error::ReservedSymbol {
                name: String::from(name),
                usage,
            });
        }
        true
    }

    /// Interns a symbol explicitly. Interning as a nonterminal obliges the
    /// grammar to define at least one rule for it.
    pub fn symbol(&mut self, name: &str, is_terminal: bool) -> SymbolId {
        if name == ACCEPT_NAME || (name == END_NAME && !is_terminal) {
            self.reserve(name, "declared by the grammar");
            return self.symbols.lookup(name).unwrap_or(ACCEPT);
        }
        let id = self.symbols.create_or_get(name, is_terminal);
        if !is_terminal && !self.declared_nonterms.contains(&id) {
            self.declared_nonterms.push(id);
        }
        id
    }

    /// Declares the start symbol. Unknown or terminal names fall back to the
    /// head of the first rule when the grammar is built.
    pub fn start(&mut self, name: &str) -> &mut Self {
        self.start = Some(String::from(name));
        self
    }

    /// Appends `lhs -> rhs`. Right-hand names not seen before are interned
    /// as terminals until they head a rule of their own.
    ///
    /// `$accept` and `$end` are reserved: heading a rule with either, or
    /// writing `$accept` on the right, makes [`GrammarBuilder::build`] fail.
    pub fn rule<I, S>(&mut self, lhs: &str, rhs: I) -> RuleId
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.push_rule(None, lhs, rhs)
    }

    /// Like [`GrammarBuilder::rule`], with a label carried into reports.
    pub fn labelled_rule<I, S>(&mut self, label: &str, lhs: &str, rhs: I) -> RuleId
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.push_rule(Some(String::from(label)), lhs, rhs)
    }

    fn push_rule<I, S>(&mut self, label: Option<String>, lhs: &str, rhs: I) -> RuleId
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lhs = if self.reserve(lhs, "the head of a rule") {
            self.symbols.lookup(lhs).unwrap_or(ACCEPT)
        } else {
            self.symbols.create_or_get(lhs, false)
        };
        let rhs = rhs
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                if name == ACCEPT_NAME {
                    self.reserve(name, "used in a right-hand side");
                }
                self.symbols.create_or_get(name, true)
            })
            .collect();
        // Slot 0 is reserved for the augmented rule.
        let id = RuleId(self.rules.len() + 1);
        self.rules.push(Rule {
            id,
            lhs,
            rhs,
            label,
        });
        id
    }

    /// Freezes the builder: augments the grammar, validates nonterminals and
    /// computes FIRST sets.
    pub fn build(self) -> Result<Grammar> {
        let Self {
            symbols,
            rules: user_rules,
            start,
            declared_nonterms,
            reserved_misuse,
        } = self;

        if let Some(err) = reserved_misuse {
            return Err(err);
        }
        let first_lhs = user_rules.first().ok_or(Error::EmptyGrammar)?.lhs;

        let start = match start.as_deref() {
            None => first_lhs,
            Some(name) => match symbols.lookup(name) {
                Some(id) if user_rules.iter().any(|r| r.lhs == id) => id,
                _ => {
                    log::warn!(
                        "start symbol {:?} heads no rule, falling back to {:?}",
                        name,
                        symbols[first_lhs].name()
                    );
                    first_lhs
                }
            },
        };

        let mut rules = Vec::with_capacity(user_rules.len() + 1);
        rules.push(Rule {
            id: RuleId(0),
            lhs: ACCEPT,
            rhs: vec![start],
            label: Some(String::from("start")),
        });
        rules.extend(user_rules);

        let mut by_lhs = vec![Vec::new(); symbols.len()];
        for rule in &rules {
            by_lhs[rule.lhs.0].push(rule.id);
        }

        for sym in symbols.nonterminals() {
            if by_lhs[sym.id().0].is_empty() {
                debug_assert!(declared_nonterms.contains(&sym.id()));
                return Err(Error::UndefinedNonterminal {
                    name: String::from(sym.name()),
                });
            }
        }

        let first = first_sets(&symbols, &rules);

        log::debug!(
            "grammar: {} symbols ({} terminals), {} rules, start {:?}",
            symbols.len(),
            symbols.terminals().count(),
            rules.len(),
            symbols[start].name()
        );

        Ok(Grammar {
            symbols,
            rules,
            by_lhs,
            first,
            start,
        })
    }
}

/// Frozen, augmented grammar with precomputed FIRST sets.
#[derive(Clone, Debug)]
pub struct Grammar {
    symbols: SymbolTable,
    rules: Vec<Rule>,
    by_lhs: Vec<Vec<RuleId>>,
    first: Vec<FirstSet>,
    start: SymbolId,
}

impl Grammar {
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    /// The user-level start symbol (the right-hand side of rule 0).
    pub fn start(&self) -> SymbolId {
        self.start
    }

    /// Rules headed by `lhs`, in declaration order.
    pub fn rules_for(&self, lhs: SymbolId) -> &[RuleId] {
        self.by_lhs.get(lhs.0).map_or(&[], |v| v.as_slice())
    }

    pub fn first(&self, sym: SymbolId) -> &FirstSet {
        &self.first[sym.0]
    }

    pub fn is_terminal(&self, sym: SymbolId) -> bool {
        self.symbols.is_terminal(sym)
    }

    /// Lookahead set for an item whose dot sits before `rule.rhs[position]`.
    ///
    /// Unions FIRST of `rhs[position..]` from left to right, stopping after
    /// the first symbol that cannot derive epsilon. If every remaining symbol
    /// is nullable (or `position` is already past the end), `lookahead` is
    /// added as well.
    pub fn find_first(
        &self,
        rule: RuleId,
        position: usize,
        lookahead: SymbolId,
    ) -> BTreeSet<SymbolId> {
        let mut out = BTreeSet::new();
        for &sym in self.rules[rule.0].rhs.iter().skip(position) {
            let first = &self.first[sym.0];
            out.extend(first.terminals.iter().copied());
            if !first.nullable {
                return out;
            }
        }
        out.insert(lookahead);
        out
    }

    /// Renders a rule as `Lhs -> a B c`.
    pub fn rule_text(&self, id: RuleId) -> std::string::String {
        let rule = &self.rules[id.0];
        let mut s = format!("{} ->", self.symbols.name(rule.lhs));
        if rule.rhs.is_empty() {
            s.push_str(" `empty'");
        }
        for &sym in &rule.rhs {
            s.push(' ');
            s.push_str(&self.symbols.name(sym));
        }
        s
    }
}

fn first_sets(symbols: &SymbolTable, rules: &[Rule]) -> Vec<FirstSet> {
    let mut first = vec![FirstSet::default(); symbols.len()];
    for t in symbols.terminals() {
        first[t.id().0].terminals.insert(t.id());
    }

    let mut changed = true;
    while changed {
        changed = false;
        for rule in rules {
            let lhs = rule.lhs.0;
            let mut all_nullable = true;
            for &sym in &rule.rhs {
                // Clone FIRST(sym) to avoid simultaneous borrow
                let first_sym = first[sym.0].terminals.clone();
                for f in first_sym {
                    if first[lhs].terminals.insert(f) {
                        changed = true;
                    }
                }
                if !first[sym.0].nullable {
                    all_nullable = false;
                    break;
                }
            }
            if all_nullable && !first[lhs].nullable {
                first[lhs].nullable = true;
                changed = true;
            }
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(g: &Grammar, names: &[&str]) -> BTreeSet<SymbolId> {
        names
            .iter()
            .map(|n| g.symbols().lookup(n).unwrap())
            .collect()
    }

    #[test]
    fn empty_grammar_is_an_error() {
        assert_eq!(GrammarBuilder::new().build().unwrap_err(), Error::EmptyGrammar);
    }

    #[test]
    fn augmented_rule_heads_the_grammar() {
        let mut g = GrammarBuilder::new();
        g.rule("S", ["a"]);
        let g = g.build().unwrap();
        let r0 = g.rule(RuleId(0));
        assert_eq!(r0.lhs(), ACCEPT);
        assert_eq!(r0.rhs(), &[g.start()]);
        assert_eq!(g.symbols().name(g.start()), "S");
        assert_eq!(g.rule_text(RuleId(1)), "S -> a");
    }

    #[test]
    fn missing_start_falls_back_to_first_rule() {
        let mut g = GrammarBuilder::new();
        g.start("Nope");
        g.rule("A", ["B"]);
        g.rule("B", ["b"]);
        let g = g.build().unwrap();
        assert_eq!(g.symbols().name(g.start()), "A");
    }

    #[test]
    fn declared_start_is_honoured() {
        let mut g = GrammarBuilder::new();
        g.rule("A", ["B"]);
        g.rule("B", ["b"]);
        g.start("B");
        let g = g.build().unwrap();
        assert_eq!(g.symbols().name(g.start()), "B");
    }

    #[test]
    fn forward_reference_becomes_nonterminal() {
        let mut g = GrammarBuilder::new();
        g.rule("S", ["X", "y"]);
        g.rule("X", ["x"]);
        let g = g.build().unwrap();
        let x = g.symbols().lookup("X").unwrap();
        assert!(!g.is_terminal(x));
        assert!(g.is_terminal(g.symbols().lookup("y").unwrap()));
    }

    #[test]
    fn explicit_nonterminal_without_rules_is_rejected() {
        let mut g = GrammarBuilder::new();
        g.symbol("Missing", false);
        g.rule("S", ["Missing"]);
        let err = g.build().unwrap_err();
        assert_eq!(err, Error::UndefinedNonterminal { name: "Missing".into() });
    }

    #[test]
    fn first_propagates_through_nullable_prefix() {
        // A -> B C, B -> (empty), C -> x
        let mut g = GrammarBuilder::new();
        let a = g.rule("A", ["B", "C"]);
        g.rule("B", Vec::<&str>::new());
        g.rule("C", ["x"]);
        let g = g.build().unwrap();

        assert!(g.first(g.symbols().lookup("B").unwrap()).is_nullable());
        assert_eq!(g.find_first(a, 0, END), ids(&g, &["x"]));
    }

    #[test]
    fn first_adds_lookahead_when_suffix_is_nullable() {
        // A -> B C, B -> (empty), C -> x | (empty)
        let mut g = GrammarBuilder::new();
        let a = g.rule("A", ["B", "C"]);
        g.rule("B", Vec::<&str>::new());
        g.rule("C", ["x"]);
        g.rule("C", Vec::<&str>::new());
        let g = g.build().unwrap();

        assert_eq!(g.find_first(a, 0, END), ids(&g, &["x", "$end"]));
        assert!(g.first(g.symbols().lookup("A").unwrap()).is_nullable());
    }

    #[test]
    fn find_first_past_end_yields_lookahead() {
        let mut g = GrammarBuilder::new();
        let s = g.rule("S", ["a"]);
        let g = g.build().unwrap();
        let a = g.symbols().lookup("a").unwrap();
        assert_eq!(g.find_first(s, 1, a), BTreeSet::from([a]));
        assert_eq!(g.find_first(s, 7, END), BTreeSet::from([END]));
    }

    #[test]
    fn find_first_stops_at_first_non_nullable() {
        // S -> a b : FIRST from position 0 is {a}, the lookahead is not added
        let mut g = GrammarBuilder::new();
        let s = g.rule("S", ["a", "b"]);
        let g = g.build().unwrap();
        assert_eq!(g.find_first(s, 0, END), ids(&g, &["a"]));
        assert_eq!(g.find_first(s, 1, END), ids(&g, &["b"]));
    }

    #[test]
    fn reserved_symbols_cannot_head_rules() {
        for reserved in [END_NAME, ACCEPT_NAME] {
            let mut g = GrammarBuilder::new();
            g.rule("S", ["a"]);
            g.rule(reserved, ["a"]);
            assert_eq!(
                g.build().unwrap_err(),
                Error::ReservedSymbol {
                    name: reserved.into(),
                    usage: "the head of a rule",
                }
            );
        }

        let mut g = GrammarBuilder::new();
        g.rule("S", [ACCEPT_NAME]);
        assert!(matches!(g.build(), Err(Error::ReservedSymbol { .. })));

        let mut g = GrammarBuilder::new();
        g.symbol(END_NAME, false);
        g.rule("S", ["a"]);
        assert!(matches!(g.build(), Err(Error::ReservedSymbol { .. })));
    }

    #[test]
    fn end_marker_stays_a_terminal_in_right_hand_sides() {
        let mut g = GrammarBuilder::new();
        g.rule("S", ["a", END_NAME]);
        let g = g.build().unwrap();
        assert!(g.is_terminal(END));
        assert_eq!(g.rule(RuleId(1)).rhs()[1], END);
    }

    #[test]
    fn empty_rule_text() {
        let mut g = GrammarBuilder::new();
        g.labelled_rule("none", "S", Vec::<&str>::new());
        let g = g.build().unwrap();
        assert_eq!(g.rule_text(RuleId(1)), "S -> `empty'");
        assert_eq!(g.rule(RuleId(1)).label(), Some("none"));
    }
}
