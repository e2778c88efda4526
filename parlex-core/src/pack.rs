//! Fixed-width scanner table encoding.
//!
//! Each [`DfaNode`] is written as its accepting marker followed by its row,
//! every value little-endian in the narrowest width (1, 2, 3 or 4 bytes) that
//! holds the largest value in the table. The byte string can then be handed
//! to a caller-supplied [`Compressor`].
//!
//! ```rust
//! # use parlex_core::{DfaNode, IntWidth, PackedTable};
//! let nodes = vec![
//!     DfaNode { index: 0, accepting: 0, row: vec![0, 0] },
//!     DfaNode { index: 1, accepting: 300, row: vec![0, 1] },
//! ];
//! let packed = PackedTable::pack(&nodes).unwrap();
//! assert_eq!(packed.width(), IntWidth::Two);
//! assert_eq!(packed.len(), 6);
//! assert_eq!(packed.value(3), 300);
//! ```

use crate::compact::DfaNode;
use crate::error::{Error, Result};

/// Bytes per packed value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntWidth {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl IntWidth {
    /// Narrowest width that holds `value`.
    pub fn for_value(value: u64) -> Result<Self> {
        match value {
            0..=0xff => Ok(IntWidth::One),
            0x100..=0xffff => Ok(IntWidth::Two),
            0x1_0000..=0xff_ffff => Ok(IntWidth::Three),
            0x100_0000..=0xffff_ffff => Ok(IntWidth::Four),
            _ => Err(Error::ValueOutOfRange { value }),
        }
    }

    pub fn bytes(self) -> usize {
        self as usize
    }
}

/// Byte-array compression applied after packing.
pub trait Compressor {
    fn compress(&self, bytes: &[u8]) -> Vec<u8>;
}

/// A packed scanner table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedTable {
    width: IntWidth,
    stride: usize,
    bytes: Vec<u8>,
    compressed: Option<Vec<u8>>,
}

impl PackedTable {
    /// Packs `nodes` uncompressed.
    pub fn pack(nodes: &[DfaNode]) -> Result<Self> {
        Self::pack_with(nodes, None)
    }

    /// Packs `nodes` and, if a compressor is given, keeps its output as well.
    ///
    /// All rows must have the same length.
    pub fn pack_with(nodes: &[DfaNode], compressor: Option<&dyn Compressor>) -> Result<Self> {
        let row_len = nodes.first().map_or(0, |n| n.row.len());
        if let Some(node) = nodes.iter().find(|n| n.row.len() != row_len) {
            return Err(Error::malformed(format_args!(
                "row of node {} has {} entries, expected {}",
                node.index,
                node.row.len(),
                row_len
            )));
        }

        let values = || {
            nodes.iter().flat_map(|n| {
                std::iter::once(n.accepting as u64).chain(n.row.iter().map(|&t| t as u64))
            })
        };
        let max = values().max().unwrap_or(0);
        let width = IntWidth::for_value(max)?;

        let mut bytes = Vec::with_capacity(nodes.len() * (row_len + 1) * width.bytes());
        for v in values() {
            bytes.extend_from_slice(&v.to_le_bytes()[..width.bytes()]);
        }
        let compressed = compressor.map(|c| c.compress(&bytes));

        log::debug!(
            "pack: {} nodes x {} values, {}-byte cells, {} bytes{}",
            nodes.len(),
            row_len + 1,
            width.bytes(),
            bytes.len(),
            match &compressed {
                Some(c) => format!(" ({} compressed)", c.len()),
                None => std::string::String::new(),
            }
        );

        Ok(Self {
            width,
            stride: row_len + 1,
            bytes,
            compressed,
        })
    }

    pub fn width(&self) -> IntWidth {
        self.width
    }

    /// Values per node: the accepting marker plus the row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Uncompressed bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn compressed(&self) -> Option<&[u8]> {
        self.compressed.as_deref()
    }

    /// Number of packed values.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.width.bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the `i`-th value.
    pub fn value(&self, i: usize) -> u32 {
        let w = self.width.bytes();
        let mut buf = [0u8; 4];
        buf[..w].copy_from_slice(&self.bytes[i * w..(i + 1) * w]);
        u32::from_le_bytes(buf)
    }

    /// Accepting marker of node `node`.
    pub fn accepting(&self, node: usize) -> u32 {
        self.value(node * self.stride)
    }

    /// Transition of node `node` on reduced column `column`.
    pub fn next(&self, node: usize, column: usize) -> usize {
        self.value(node * self.stride + 1 + column) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(max: u32) -> Vec<DfaNode> {
        vec![
            DfaNode {
                index: 0,
                accepting: 0,
                row: vec![0, 0, 0],
            },
            DfaNode {
                index: 1,
                accepting: max,
                row: vec![0, 1, 0],
            },
        ]
    }

    #[test]
    fn width_boundaries() {
        assert_eq!(IntWidth::for_value(0).unwrap(), IntWidth::One);
        assert_eq!(IntWidth::for_value(255).unwrap(), IntWidth::One);
        assert_eq!(IntWidth::for_value(256).unwrap(), IntWidth::Two);
        assert_eq!(IntWidth::for_value(65_535).unwrap(), IntWidth::Two);
        assert_eq!(IntWidth::for_value(65_536).unwrap(), IntWidth::Three);
        assert_eq!(IntWidth::for_value(0xff_ffff).unwrap(), IntWidth::Three);
        assert_eq!(IntWidth::for_value(0x100_0000).unwrap(), IntWidth::Four);
        assert_eq!(IntWidth::for_value(u32::MAX as u64).unwrap(), IntWidth::Four);
        assert_eq!(
            IntWidth::for_value(1 << 32),
            Err(Error::ValueOutOfRange { value: 1 << 32 })
        );
    }

    #[test]
    fn width_follows_largest_value() {
        for (max, width) in [
            (7, IntWidth::One),
            (1_000, IntWidth::Two),
            (100_000, IntWidth::Three),
            (20_000_000, IntWidth::Four),
        ] {
            let packed = PackedTable::pack(&nodes(max)).unwrap();
            assert_eq!(packed.width(), width);
            assert_eq!(packed.bytes().len(), 8 * width.bytes());
            assert_eq!(packed.accepting(1), max);
            assert_eq!(packed.next(1, 1), 1);
            assert_eq!(packed.next(1, 2), 0);
        }
    }

    #[test]
    fn little_endian_layout() {
        let packed = PackedTable::pack(&nodes(0x0102)).unwrap();
        // node 1 starts at value 4
        assert_eq!(&packed.bytes()[8..10], &[0x02, 0x01]);
        assert_eq!(packed.value(4), 0x0102);
        assert_eq!(packed.stride(), 4);
        assert_eq!(packed.len(), 8);
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let mut n = nodes(1);
        n[1].row.push(0);
        assert!(matches!(
            PackedTable::pack(&n),
            Err(Error::MalformedAutomaton { .. })
        ));
    }

    struct Reverse;

    impl Compressor for Reverse {
        fn compress(&self, bytes: &[u8]) -> Vec<u8> {
            bytes.iter().rev().copied().collect()
        }
    }

    #[test]
    fn compressor_output_is_kept_alongside() {
        let packed = PackedTable::pack_with(&nodes(3), Some(&Reverse as &dyn Compressor)).unwrap();
        let mut expect = packed.bytes().to_vec();
        expect.reverse();
        assert_eq!(packed.compressed(), Some(expect.as_slice()));
        assert_eq!(PackedTable::pack(&nodes(3)).unwrap().compressed(), None);
    }

    #[test]
    fn empty_table() {
        let packed = PackedTable::pack(&[]).unwrap();
        assert!(packed.is_empty());
        assert_eq!(packed.width(), IntWidth::One);
    }
}
