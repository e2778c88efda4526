//! Loader for lexer specifications.
//!
//! A lexer spec is line oriented:
//!
//! ```text
//! -- comment
//! DIGIT = (?-u:[0-9])
//! Number: {{DIGIT}}+
//! Ident:  (?-u:[a-z][a-z0-9]*)
//! ```
//!
//! `NAME = regex` defines a variable and `Label: regex` a token rule;
//! `{{NAME}}` inside a regex expands to the variable, wrapped in a
//! non-capturing group. All rules are compiled together into one Thompson
//! NFA and converted to an [`NfaGraph`] in which rule `i` of `n` accepts with
//! priority `n - i`, so a rule listed earlier wins a tie against a later one.

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use parlex_core::NfaGraph;
use regex::{Captures, Regex};
use regex_automata::{
    nfa::thompson::{Config as ThomConfig, NFA},
    util::syntax,
};
use std::collections::{HashMap, HashSet};
use std::io::{self, Write};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexRule {
    pub label: String,
    pub regex: String, // after variable substitution
    pub line_no: usize,
}

#[derive(Debug, Default, Clone)]
pub struct LexSpec {
    pub vars: HashMap<String, String>, // expanded values
    pub rules: Vec<LexRule>,
}

static VAR_DEF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(.*)$"#).unwrap());

static LEX_RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^([A-Za-z_][A-Za-z0-9_]*)\s*:\s*(.+)$"#).unwrap());

static VAR_IN_REGEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}"#).unwrap());

impl LexSpec {
    /// Accepting priority of rule `index`.
    pub fn priority(&self, index: usize) -> u32 {
        (self.rules.len() - index) as u32
    }

    /// Rule that accepts with `priority`, if any.
    pub fn rule_for(&self, priority: u32) -> Option<&LexRule> {
        let priority = priority as usize;
        if priority == 0 || priority > self.rules.len() {
            return None;
        }
        self.rules.get(self.rules.len() - priority)
    }

    /// Compiles every rule into one NFA over byte classes.
    pub fn to_nfa(&self) -> Result<NfaGraph> {
        if self.rules.is_empty() {
            bail!("Lexer spec has no rules");
        }
        let conf = syntax::Config::new().utf8(false);
        let hirs = self
            .rules
            .iter()
            .map(|r| {
                syntax::parse_with(&r.regex, &conf).with_context(|| {
                    format!(
                        "Failed to parse regex {} for rule {:?} at line {}",
                        r.regex, r.label, r.line_no
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let nfa = NFA::compiler()
            .configure(ThomConfig::new().utf8(false))
            .build_many_from_hir(&hirs)?;
        Ok(NfaGraph::from_thompson(&nfa)?)
    }
}

/// Parses lexer spec text.
pub fn parse_lexspec(input: &str) -> Result<LexSpec> {
    let mut spec = LexSpec::default();
    let mut labels: HashSet<String> = HashSet::new();

    for (i, raw_line) in input.lines().enumerate() {
        let line_no = i + 1;
        let line = raw_line.trim();

        if line.is_empty() || line.starts_with("--") {
            continue;
        }

        if let Some(cap) = VAR_DEF_RE.captures(line) {
            let name = cap[1].to_string();
            let value = expand_vars(cap[2].trim(), &spec.vars)
                .with_context(|| format!("line {}", line_no))?;
            spec.vars.insert(name, value);
            continue;
        }

        if let Some(cap) = LEX_RULE_RE.captures(line) {
            let label = cap[1].to_string();
            if !labels.insert(label.clone()) {
                bail!("Duplicate rule {:?} at line ({})", label, line_no);
            }
            let regex = expand_vars(cap[2].trim(), &spec.vars)
                .with_context(|| format!("line {}", line_no))?;
            spec.rules.push(LexRule {
                label,
                regex,
                line_no,
            });
            continue;
        }

        bail!("Unrecognized line ({}): {:?}", line_no, line);
    }

    log::debug!(
        "lexspec: {} variables, {} rules",
        spec.vars.len(),
        spec.rules.len()
    );
    Ok(spec)
}

fn expand_vars(input: &str, vars: &HashMap<String, String>) -> Result<String> {
    let mut missing: HashSet<String> = HashSet::new();
    let out = VAR_IN_REGEX_RE
        .replace_all(input, |caps: &Captures| match vars.get(&caps[1]) {
            Some(val) => format!("(?:{})", val),
            None => {
                missing.insert(caps[1].to_string());
                caps[0].to_string()
            }
        })
        .into_owned();

    if !missing.is_empty() {
        let mut list = missing.into_iter().collect::<Vec<_>>();
        list.sort();
        bail!("Unknown variable(s): {}", list.join(", "));
    }
    Ok(out)
}

/// Reads and parses a lexer spec file.
pub fn load_lexspec<P: AsRef<Path>>(path: P) -> Result<LexSpec> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lexer spec {}", path.display()))?;
    parse_lexspec(&input).with_context(|| format!("Failed to load lexer spec {}", path.display()))
}

/// Writes one `L,<priority>,<label>,<regex>` line per rule.
pub fn write_lex_rules<W: Write>(out: &mut W, spec: &LexSpec) -> io::Result<()> {
    writeln!(out, "LS,{}\n", spec.rules.len())?;
    for (i, r) in spec.rules.iter().enumerate() {
        writeln!(out, "L,{},{},{}", spec.priority(i), r.label, r.regex)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlex_core::{ScannerOptions, ScannerStrategy, build_scanner_tables};

    const SPEC: &str = r#"
-- a tiny expression language
SPACE = (?-u:[ \t])
DIGIT = (?-u:[0-9])
NUMBER = {{DIGIT}}+

If: (?-u:if)
Ident: (?-u:[a-z][a-z0-9]*)
Number: {{NUMBER}}
Space: {{SPACE}}+
Plus: (?-u:\+)
"#;

    #[test]
    fn parses_vars_and_rules() {
        let spec = parse_lexspec(SPEC).unwrap();
        assert_eq!(spec.vars.len(), 3);
        assert_eq!(spec.vars["NUMBER"], "(?:(?-u:[0-9]))+");
        assert_eq!(spec.rules.len(), 5);
        let r = &spec.rules[2];
        assert_eq!(r.label, "Number");
        assert_eq!(r.regex, "(?:(?:(?-u:[0-9]))+)");
        assert_eq!(r.line_no, 9);
    }

    #[test]
    fn priorities_follow_rule_order() {
        let spec = parse_lexspec(SPEC).unwrap();
        assert_eq!(spec.priority(0), 5);
        assert_eq!(spec.rule_for(5).unwrap().label, "If");
        assert_eq!(spec.rule_for(1).unwrap().label, "Plus");
        assert!(spec.rule_for(0).is_none());
        assert!(spec.rule_for(6).is_none());
    }

    #[test]
    fn scans_through_the_core_pipeline() {
        let _ = env_logger::builder().is_test(true).try_init();
        let spec = parse_lexspec(SPEC).unwrap();
        let nfa = spec.to_nfa().unwrap();
        for strategy in [ScannerStrategy::Table, ScannerStrategy::Switch] {
            let options = ScannerOptions {
                strategy,
                ..ScannerOptions::default()
            };
            let tables = build_scanner_tables(&nfa, &options, None).unwrap();
            let label = |input: &[u8]| {
                tables
                    .scan_bytes(input)
                    .and_then(|(m, len)| spec.rule_for(m).map(|r| (r.label.as_str(), len)))
            };
            assert_eq!(label(b"if x"), Some(("If", 2)));
            assert_eq!(label(b"ifx"), Some(("Ident", 3)));
            assert_eq!(label(b"123+4"), Some(("Number", 3)));
            assert_eq!(label(b" \t+"), Some(("Space", 2)));
            assert_eq!(label(b"+"), Some(("Plus", 1)));
            assert_eq!(label(b"#"), None);
        }
    }

    #[test]
    fn unknown_variable_is_an_error() {
        let err = parse_lexspec("Tok: {{NOPE}}\n").unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown variable(s): NOPE"));
    }

    #[test]
    fn bad_lines_are_errors() {
        assert!(parse_lexspec("this is not a rule\n").is_err());
        assert!(parse_lexspec("A: a\nA: b\n").is_err());
    }

    #[test]
    fn bad_regex_names_the_rule() {
        let spec = parse_lexspec("Broken: (?-u:[a-\n").unwrap();
        let err = spec.to_nfa().unwrap_err();
        assert!(err.to_string().contains("\"Broken\""), "{}", err);
    }

    #[test]
    fn report_lines() {
        let spec = parse_lexspec(SPEC).unwrap();
        let mut buf = Vec::new();
        write_lex_rules(&mut buf, &spec).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("LS,5\n\n"));
        assert!(text.contains("L,5,If,(?-u:if)\n"));
    }
}
