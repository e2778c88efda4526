//! Symbol interning.
//!
//! Every grammar symbol gets a stable [`SymbolId`] in first-seen order. A
//! symbol remembers whether it is a terminal; that flag can only be
//! *downgraded*: once a name is used as the head of a rule it is a
//! nonterminal for good, and later requests to intern it as a terminal leave
//! it alone.
//!
//! ```rust
//! # use parlex_core::SymbolTable;
//! let mut st = SymbolTable::new();
//! let e = st.create_or_get("Expr", true); // first seen on a right-hand side
//! assert!(st[e].is_terminal());
//! assert_eq!(st.create_or_get("Expr", false), e); // now heads a rule
//! assert!(!st[e].is_terminal());
//! st.create_or_get("Expr", true);
//! assert!(!st[e].is_terminal()); // never upgraded back
//! ```

use indexmap::{IndexMap, map::Entry};
use smartstring::alias::String;
use std::fmt;
use std::ops::Index;

/// Dense index of a symbol inside its [`SymbolTable`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(pub usize);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<SymbolId> for usize {
    fn from(id: SymbolId) -> Self {
        id.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An interned grammar symbol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Symbol {
    id: SymbolId,
    name: String,
    terminal: bool,
}

impl Symbol {
    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }
}

/// Ordered symbol table keyed by name.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    tab: IndexMap<String, Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            tab: IndexMap::new(),
        }
    }

    /// Returns the symbol called `name`, allocating the next id if it is new.
    ///
    /// A known terminal passed with `is_terminal == false` becomes a
    /// nonterminal. A known nonterminal stays a nonterminal regardless of
    /// `is_terminal`.
    pub fn create_or_get(&mut self, name: &str, is_terminal: bool) -> SymbolId {
        let next = SymbolId(self.tab.len());
        match self.tab.entry(String::from(name)) {
            Entry::Occupied(mut o) => {
                let sym = o.get_mut();
                if sym.terminal && !is_terminal {
                    log::trace!("symbol {:?} downgraded to nonterminal", name);
                    sym.terminal = false;
                }
                sym.id
            }
            Entry::Vacant(v) => {
                v.insert(Symbol {
                    id: next,
                    name: String::from(name),
                    terminal: is_terminal,
                });
                next
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.tab.get(name).map(|s| s.id)
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.tab.get_index(id.0).map(|(_, s)| s)
    }

    /// Printable name, or `$<id>` for ids outside the table.
    pub fn name(&self, id: SymbolId) -> std::borrow::Cow<'_, str> {
        match self.get(id) {
            Some(sym) => std::borrow::Cow::Borrowed(sym.name()),
            None => std::borrow::Cow::Owned(format!("${}", id.0)),
        }
    }

    pub fn is_terminal(&self, id: SymbolId) -> bool {
        self.get(id).is_some_and(|s| s.terminal)
    }

    pub fn len(&self) -> usize {
        self.tab.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tab.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.tab.values()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Symbol> {
        self.iter().filter(|s| s.terminal)
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Symbol> {
        self.iter().filter(|s| !s.terminal)
    }
}

impl Index<SymbolId> for SymbolTable {
    type Output = Symbol;

    fn index(&self, id: SymbolId) -> &Symbol {
        &self.tab[id.0]
    }
}
