//! Command-line interface for inspecting generated tables.
//!
//! Reads a `.g` grammar and/or a lexer spec, builds the parser and scanner
//! tables with `parlex-core`, and prints a plain-text report of rules, FIRST
//! sets, LR(1) states, the action table, conflicts and the scanner DFA.

#[cfg(feature = "cli")]
mod real {
    use anyhow::{Result, bail};
    use clap::{Parser, ValueEnum};
    use parlex_core::{ParserTables, ScannerOptions, ScannerStrategy, build_scanner_tables, report};
    use parlex_tool::{grammar, lexspec};
    use std::io::Write;
    use std::path::PathBuf;

    #[derive(Clone, Copy, Debug, ValueEnum)]
    enum Strategy {
        Table,
        Switch,
    }

    impl From<Strategy> for ScannerStrategy {
        fn from(s: Strategy) -> Self {
            match s {
                Strategy::Table => ScannerStrategy::Table,
                Strategy::Switch => ScannerStrategy::Switch,
            }
        }
    }

    #[derive(Parser)]
    #[command(about = "Build LR(1) parser tables and scanner DFAs and print them")]
    struct Args {
        /// Path to the input grammar file.
        #[arg(short = 'g', long)]
        grammar: Option<PathBuf>,

        /// Path to the input lexer specification.
        #[arg(short = 'l', long)]
        lexer: Option<PathBuf>,

        /// Scanner emission strategy.
        #[arg(short = 's', long, value_enum, default_value_t = Strategy::Table)]
        strategy: Strategy,

        /// Keep every symbol-class column of the DFA.
        #[arg(long)]
        no_reduce: bool,

        /// Output file (stdout if omitted).
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Enable debug logging (off by default).
        #[arg(short = 'd', long)]
        debug: bool,
    }

    pub fn main() -> Result<()> {
        let args = Args::parse();
        if args.debug {
            env_logger::Builder::from_default_env()
                .filter_level(log::LevelFilter::Debug)
                .init();
        } else {
            env_logger::init();
        }

        if args.grammar.is_none() && args.lexer.is_none() {
            bail!("Nothing to do: pass --grammar and/or --lexer");
        }

        let mut out: Box<dyn Write> = match &args.output {
            Some(path) => Box::new(std::io::BufWriter::new(std::fs::File::create(path)?)),
            None => Box::new(std::io::stdout().lock()),
        };

        if let Some(path) = &args.grammar {
            let spec = grammar::load_grammar(path)?;
            let tables = ParserTables::build(&spec.grammar, &spec.conflicts)?;
            report::write_rules(&mut out, &spec.grammar)?;
            writeln!(out)?;
            report::write_first_sets(&mut out, &spec.grammar)?;
            writeln!(out)?;
            report::write_states(&mut out, &spec.grammar, tables.automaton())?;
            report::write_action_table(&mut out, &spec.grammar, &tables)?;
            writeln!(out)?;
            report::write_conflicts(&mut out, &spec.grammar, tables.conflicts())?;
            writeln!(out)?;
        }

        if let Some(path) = &args.lexer {
            let spec = lexspec::load_lexspec(path)?;
            let nfa = spec.to_nfa()?;
            let options = ScannerOptions {
                strategy: args.strategy.into(),
                reduce_columns: !args.no_reduce,
            };
            let tables = build_scanner_tables(&nfa, &options, None)?;
            lexspec::write_lex_rules(&mut out, &spec)?;
            writeln!(out)?;
            report::write_dfa(&mut out, tables.compact())?;
            if let Some(packed) = tables.packed() {
                writeln!(out)?;
                writeln!(
                    out,
                    "PK,{},{},{}",
                    packed.width().bytes(),
                    packed.stride(),
                    packed.len()
                )?;
                writeln!(out, "PX,{}", hex::encode(packed.bytes()))?;
            }
        }

        out.flush()?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("ptab disabled (compiled without `cli` feature)");
}
