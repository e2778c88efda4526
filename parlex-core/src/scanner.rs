//! Scanner pipeline: NFA to DFA, optional column reduction, packing.

use crate::compact::CompactDfa;
use crate::dfa::Dfa;
use crate::error::Result;
use crate::nfa::{Nfa, SymbolClass, check_alphabet};
use crate::pack::{Compressor, PackedTable};

/// How the emitted scanner walks its automaton.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScannerStrategy {
    /// Table-driven: the DFA is packed into bytes.
    #[default]
    Table,
    /// Switch-driven: the emitter walks the nodes directly, nothing is packed.
    Switch,
}

/// Options for [`build_scanner_tables`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScannerOptions {
    pub strategy: ScannerStrategy,
    pub reduce_columns: bool,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            strategy: ScannerStrategy::Table,
            reduce_columns: true,
        }
    }
}

/// Everything the scanner emitter needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScannerTables {
    strategy: ScannerStrategy,
    dfa: Dfa,
    compact: CompactDfa,
    packed: Option<PackedTable>,
    alphabet: Option<Vec<SymbolClass>>,
}

impl ScannerTables {
    pub fn strategy(&self) -> ScannerStrategy {
        self.strategy
    }

    /// The automaton before column reduction.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    /// The frozen nodes the emitter consumes.
    pub fn compact(&self) -> &CompactDfa {
        &self.compact
    }

    /// Packed bytes; `None` for [`ScannerStrategy::Switch`].
    pub fn packed(&self) -> Option<&PackedTable> {
        self.packed.as_ref()
    }

    /// Byte to class mapping inherited from the NFA.
    pub fn alphabet(&self) -> Option<&[SymbolClass]> {
        self.alphabet.as_deref()
    }

    /// Longest accepted prefix of `input`.
    ///
    /// Bytes go through the alphabet when there is one; otherwise each byte
    /// value is taken as its own class.
    pub fn scan_bytes(&self, input: &[u8]) -> Option<(u32, usize)> {
        let classes: Vec<SymbolClass> = match &self.alphabet {
            Some(alphabet) => input.iter().map(|&b| alphabet[b as usize]).collect(),
            None => input.iter().map(|&b| b as SymbolClass).collect(),
        };
        self.compact.longest_match(&classes)
    }
}

/// Runs subset construction over `nfa`, then reduction and packing as
/// `options` ask.
pub fn build_scanner_tables<N: Nfa + ?Sized>(
    nfa: &N,
    options: &ScannerOptions,
    compressor: Option<&dyn Compressor>,
) -> Result<ScannerTables> {
    let alphabet = match nfa.alphabet() {
        Some(alphabet) => {
            check_alphabet(alphabet, nfa.class_count())?;
            Some(alphabet.to_vec())
        }
        None => None,
    };
    let dfa = Dfa::from_nfa(nfa)?;
    let compact = if options.reduce_columns {
        CompactDfa::reduce(&dfa)
    } else {
        CompactDfa::identity(&dfa)
    };
    let packed = match options.strategy {
        ScannerStrategy::Table => Some(PackedTable::pack_with(compact.nodes(), compressor)?),
        ScannerStrategy::Switch => None,
    };
    Ok(ScannerTables {
        strategy: options.strategy,
        dfa,
        compact,
        packed,
        alphabet,
    })
}
