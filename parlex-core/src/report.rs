//! Plain-text dumps of the generated tables.
//!
//! Every line starts with a short key followed by comma-separated fields, so
//! dumps can be grepped and diffed between runs. A section begins with a
//! count line (`RS`, `CS`, `AT`, `XS`, `DS`) and a blank line.

use crate::action::ParserTables;
use crate::compact::CompactDfa;
use crate::conflict::Conflict;
use crate::grammar::Grammar;
use crate::lr1::Lr1Automaton;
use std::io::{self, Write};

/// Writes the rules of `grammar`.
///
/// # Output Format
/// ```text
/// RS,<number of rules>
///
/// R,<index>,<label>,<Lhs> -> <rhs symbols>
/// ```
pub fn write_rules<W: Write>(out: &mut W, grammar: &Grammar) -> io::Result<()> {
    writeln!(out, "RS,{}\n", grammar.rules().len())?;
    for rule in grammar.rules() {
        writeln!(
            out,
            "R,{},{},{}",
            rule.id(),
            rule.label().unwrap_or(""),
            grammar.rule_text(rule.id())
        )?;
    }
    Ok(())
}

/// Writes the FIRST set of every symbol, `` `empty' `` marking nullable ones.
pub fn write_first_sets<W: Write>(out: &mut W, grammar: &Grammar) -> io::Result<()> {
    let symbols = grammar.symbols();
    for sym in symbols.iter() {
        let first = grammar.first(sym.id());
        write!(out, "FIRST,{},{{", sym.name())?;
        if first.is_nullable() {
            write!(out, "`empty', ")?;
        }
        for &t in first.terminals() {
            write!(out, "{}, ", symbols.name(t))?;
        }
        writeln!(out, "}}")?;
    }
    Ok(())
}

/// Writes every LR(1) state: its incoming symbol, its items and its edges.
///
/// # Output Format
/// ```text
/// CS,<number of states>
///
/// CI,<state>,<incoming symbol or ->
/// C,<state>,<Lhs> -> <alpha> . <beta>, <lookahead>
/// CT,<state>,<symbol>,<target>
/// ```
pub fn write_states<W: Write>(
    out: &mut W,
    grammar: &Grammar,
    automaton: &Lr1Automaton,
) -> io::Result<()> {
    let symbols = grammar.symbols();
    writeln!(out, "CS,{}\n", automaton.states().len())?;
    for state in automaton.states() {
        let i = state.index();
        match state.incoming() {
            Some(sym) => writeln!(out, "CI,{},{}", i, symbols.name(sym))?,
            None => writeln!(out, "CI,{},-", i)?,
        }
        for item in state.items() {
            let rule = grammar.rule(item.rule);
            write!(out, "C,{},{} -> ", i, symbols.name(rule.lhs()))?;
            for (j, &sym) in rule.rhs().iter().enumerate() {
                if j == item.dot {
                    write!(out, ". ")?;
                }
                write!(out, "{} ", symbols.name(sym))?;
            }
            if item.dot == rule.len() {
                write!(out, ". ")?;
            }
            writeln!(out, ", {}", symbols.name(item.lookahead))?;
        }
        for (&sym, &target) in state.transitions() {
            writeln!(out, "CT,{},{},{}", i, symbols.name(sym), target)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes the action table, one line per state.
///
/// # Output Format
/// ```text
/// AT,<rows>,<columns>
///
/// AH,<symbol 0>,<symbol 1>,...
/// A,<state>,<code>,<code>,...
/// ```
pub fn write_action_table<W: Write>(
    out: &mut W,
    grammar: &Grammar,
    tables: &ParserTables,
) -> io::Result<()> {
    let table = tables.table();
    writeln!(out, "AT,{},{}\n", table.rows(), table.columns())?;
    write!(out, "AH")?;
    for sym in grammar.symbols().iter() {
        write!(out, ",{}", sym.name())?;
    }
    writeln!(out)?;
    for state in tables.automaton().states() {
        write!(out, "A,{}", state.index())?;
        for code in table.row(state.index()) {
            write!(out, ",{}", code)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Writes one line per unresolved conflict.
pub fn write_conflicts<W: Write>(
    out: &mut W,
    grammar: &Grammar,
    conflicts: &[Conflict],
) -> io::Result<()> {
    writeln!(out, "XS,{}\n", conflicts.len())?;
    for (i, conflict) in conflicts.iter().enumerate() {
        writeln!(out, "X,{},{}", i, conflict.describe(grammar))?;
    }
    Ok(())
}

/// Writes the class map and every node of a reduced DFA.
///
/// # Output Format
/// ```text
/// DS,<nodes>,<columns>
///
/// DM,<column of class 0>,<column of class 1>,...
/// D,<node>,<accepting>,<target>,<target>,...
/// ```
pub fn write_dfa<W: Write>(out: &mut W, dfa: &CompactDfa) -> io::Result<()> {
    let map = dfa.class_map();
    writeln!(out, "DS,{},{}\n", dfa.nodes().len(), map.columns())?;
    write!(out, "DM")?;
    for column in map.as_slice() {
        write!(out, ",{}", column)?;
    }
    writeln!(out)?;
    for node in dfa.nodes() {
        write!(out, "D,{},{}", node.index, node.accepting)?;
        for target in &node.row {
            write!(out, ",{}", target)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfa::Dfa;
    use crate::grammar::GrammarBuilder;
    use crate::nfa::NfaGraph;

    fn grammar() -> Grammar {
        let mut g = GrammarBuilder::new();
        g.labelled_rule("list", "L", ["L", "item"]);
        g.labelled_rule("empty", "L", Vec::<&str>::new());
        g.build().unwrap()
    }

    fn render<F: FnOnce(&mut Vec<u8>) -> io::Result<()>>(f: F) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn rules_and_first_sets() {
        let g = grammar();
        let text = render(|out| write_rules(out, &g));
        assert!(text.starts_with("RS,3\n\n"));
        assert!(text.contains("R,0,start,$accept -> L\n"));
        assert!(text.contains("R,1,list,L -> L item\n"));
        assert!(text.contains("R,2,empty,L -> `empty'\n"));

        let text = render(|out| write_first_sets(out, &g));
        assert!(text.contains("FIRST,L,{`empty', item, }\n"));
        assert!(text.contains("FIRST,item,{item, }\n"));
    }

    #[test]
    fn states_and_table() {
        let g = grammar();
        let tables = ParserTables::build(&g, &[]).unwrap();
        let text = render(|out| write_states(out, &g, tables.automaton()));
        assert!(text.starts_with(&format!("CS,{}\n\n", tables.automaton().states().len())));
        assert!(text.contains("CI,0,-\n"));
        assert!(text.contains("C,0,$accept -> . L , $end\n"));

        let text = render(|out| write_action_table(out, &g, &tables));
        assert!(text.contains("AH,$accept,$end,L,item\n"));
        let rows = text.lines().filter(|l| l.starts_with("A,")).count();
        assert_eq!(rows, tables.table().rows());

        let text = render(|out| write_conflicts(out, &g, tables.conflicts()));
        assert_eq!(text, "XS,0\n\n");
    }

    #[test]
    fn dfa_dump() {
        let mut nfa = NfaGraph::new(2);
        let s = nfa.add_state(0);
        let t = nfa.add_state(1);
        nfa.add_edge(s, 1, t).unwrap();
        nfa.add_edge(s, 2, t).unwrap();
        let compact = CompactDfa::reduce(&Dfa::from_nfa(&nfa).unwrap());
        let text = render(|out| write_dfa(out, &compact));
        assert_eq!(text, "DS,3,2\n\nDM,0,1,1\nD,0,0,0,0\nD,1,0,0,2\nD,2,1,0,0\n");
    }
}
