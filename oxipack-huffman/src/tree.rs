//! Huffman tree construction, serialization and bit-by-bit decoding.
//!
//! The tree is stored as an arena of [`Node`]s. Leaves are created in symbol
//! order and every merged parent is appended after them, so a node's index
//! doubles as its insertion sequence number. Ties between equal weights are
//! broken by that number, which makes the resulting code fully deterministic.

use oxipack_core::bitstream::{BitReader, BitWriter};
use oxipack_core::error::{PackError, Result};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// End-of-stream sentinel symbol.
pub const END_OF_STREAM: u16 = 256;

/// First symbol number used for merged byte pairs.
pub const FIRST_PAIR_SYMBOL: u16 = 257;

/// Width of a leaf symbol in the serialized tree.
pub const SYMBOL_BITS: u8 = 9;

/// Largest alphabet a serialized tree can describe.
pub const MAX_ALPHABET_SIZE: usize = 1 << SYMBOL_BITS;

/// Longest code the encoder will emit.
pub const MAX_CODE_LENGTH: u8 = 64;

/// Symbol occurrence counts, indexed by symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: Vec<u64>,
}

impl FrequencyTable {
    /// Create an all-zero table for `alphabet_size` symbols.
    pub fn new(alphabet_size: usize) -> Self {
        Self {
            counts: vec![0; alphabet_size.min(MAX_ALPHABET_SIZE)],
        }
    }

    /// Count every symbol of `symbols` plus one end-of-stream marker.
    pub fn from_symbols(symbols: &[u16], alphabet_size: usize) -> Self {
        let mut table = Self::new(alphabet_size);
        for &symbol in symbols {
            table.add(symbol);
        }
        table.add(END_OF_STREAM);
        table
    }

    /// Add a symbol occurrence.
    pub fn add(&mut self, symbol: u16) {
        self.add_count(symbol, 1);
    }

    /// Add multiple occurrences of a symbol.
    pub fn add_count(&mut self, symbol: u16, count: u64) {
        if let Some(slot) = self.counts.get_mut(symbol as usize) {
            *slot += count;
        }
    }

    /// Count for one symbol.
    pub fn get(&self, symbol: u16) -> u64 {
        self.counts.get(symbol as usize).copied().unwrap_or(0)
    }

    /// Alphabet size this table covers.
    pub fn alphabet_size(&self) -> usize {
        self.counts.len()
    }

    /// `(symbol, count)` for every symbol that occurs, in symbol order.
    pub fn nonzero(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(symbol, &count)| (symbol as u16, count))
    }
}

/// A node of the Huffman tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    /// A symbol.
    Leaf {
        /// Symbol value.
        symbol: u16,
        /// Frequency the leaf was built from (0 for deserialized trees).
        weight: u64,
    },
    /// A merge of two subtrees; `left` is reached by bit 0.
    Internal {
        /// Child on bit 0.
        left: usize,
        /// Child on bit 1.
        right: usize,
        /// Sum of the children's weights.
        weight: u64,
    },
}

impl Node {
    /// Weight of this node.
    pub fn weight(&self) -> u64 {
        match self {
            Self::Leaf { weight, .. } | Self::Internal { weight, .. } => *weight,
        }
    }
}

/// A Huffman tree over a symbol alphabet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: usize,
}

/// Build a Huffman tree from symbol frequencies.
///
/// Zero-frequency symbols get no leaf. A single occurring symbol produces a
/// one-leaf tree whose code is a single `0` bit.
pub fn build_tree(frequencies: &FrequencyTable) -> Result<HuffmanTree> {
    let mut nodes = Vec::new();
    let mut heap = BinaryHeap::new();

    for (symbol, weight) in frequencies.nonzero() {
        heap.push(Reverse((weight, nodes.len())));
        nodes.push(Node::Leaf { symbol, weight });
    }

    if heap.is_empty() {
        return Err(PackError::encoding_failure(
            "cannot build a Huffman tree from an empty frequency table",
        ));
    }

    while heap.len() > 1 {
        let (Some(Reverse((w1, left))), Some(Reverse((w2, right)))) = (heap.pop(), heap.pop())
        else {
            break;
        };
        let weight = w1 + w2;
        heap.push(Reverse((weight, nodes.len())));
        nodes.push(Node::Internal {
            left,
            right,
            weight,
        });
    }

    let root = match heap.pop() {
        Some(Reverse((_, root))) => root,
        None => return Err(PackError::encoding_failure("Huffman heap drained")),
    };

    Ok(HuffmanTree { nodes, root })
}

impl HuffmanTree {
    /// Root node.
    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    /// Node by arena index.
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Arena index of the root.
    pub fn root_index(&self) -> usize {
        self.root
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::Leaf { .. }))
            .count()
    }

    /// `(symbol, bits, length)` for every leaf, by depth-first traversal
    /// (left = 0, right = 1).
    pub fn codes(&self) -> Result<Vec<(u16, u64, u8)>> {
        if let Node::Leaf { symbol, .. } = self.nodes[self.root] {
            return Ok(vec![(symbol, 0, 1)]);
        }

        let mut codes = Vec::with_capacity(self.leaf_count());
        let mut stack = vec![(self.root, 0u64, 0u8)];

        while let Some((index, bits, length)) = stack.pop() {
            match self.nodes[index] {
                Node::Leaf { symbol, .. } => codes.push((symbol, bits, length)),
                Node::Internal { left, right, .. } => {
                    if length >= MAX_CODE_LENGTH {
                        return Err(PackError::encoding_failure(format!(
                            "Huffman code longer than {MAX_CODE_LENGTH} bits"
                        )));
                    }
                    stack.push((right, (bits << 1) | 1, length + 1));
                    stack.push((left, bits << 1, length + 1));
                }
            }
        }

        Ok(codes)
    }

    /// Serialize the tree shape in pre-order: `0` for an internal node,
    /// `1` followed by the symbol for a leaf.
    pub fn write_to(&self, writer: &mut BitWriter) {
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            match self.nodes[index] {
                Node::Leaf { symbol, .. } => {
                    writer.write_bit(true);
                    writer.write_bits(u32::from(symbol), SYMBOL_BITS);
                }
                Node::Internal { left, right, .. } => {
                    writer.write_bit(false);
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
    }

    /// Read a tree written by [`HuffmanTree::write_to`].
    ///
    /// Every leaf symbol must be below `alphabet_size` and appear once.
    pub fn read_from(reader: &mut BitReader<'_>, alphabet_size: usize) -> Result<Self> {
        let alphabet_size = alphabet_size.min(MAX_ALPHABET_SIZE);
        let max_nodes = 2 * alphabet_size;
        let mut seen = vec![false; alphabet_size];

        // (left, right) children for internal nodes still being filled.
        let mut slots: Vec<(Option<usize>, Option<usize>)> = Vec::new();
        let mut nodes: Vec<Option<Node>> = Vec::new();
        let mut pending: Vec<usize> = Vec::new();

        loop {
            let offset = reader.bit_position();
            if nodes.len() >= max_nodes {
                return Err(PackError::corrupt_stream(offset, "Huffman tree too large"));
            }

            let is_leaf = reader
                .read_bit()
                .map_err(|e| e.into_stream_error(offset))?;
            let index = nodes.len();

            if is_leaf {
                let symbol = reader
                    .read_bits(SYMBOL_BITS)
                    .map_err(|e| e.into_stream_error(offset))? as u16;
                let slot = seen.get_mut(symbol as usize).ok_or_else(|| {
                    PackError::corrupt_stream(offset, format!("symbol {symbol} out of range"))
                })?;
                if *slot {
                    return Err(PackError::corrupt_stream(
                        offset,
                        format!("duplicate symbol {symbol} in Huffman tree"),
                    ));
                }
                *slot = true;
                nodes.push(Some(Node::Leaf { symbol, weight: 0 }));
            } else {
                nodes.push(None);
            }
            slots.push((None, None));

            if let Some(&parent) = pending.last() {
                let (left, right) = &mut slots[parent];
                if left.is_none() {
                    *left = Some(index);
                } else {
                    *right = Some(index);
                    pending.pop();
                }
            }

            if !is_leaf {
                pending.push(index);
            }

            if pending.is_empty() {
                break;
            }
        }

        let nodes = nodes
            .into_iter()
            .zip(slots)
            .map(|(node, slot)| match (node, slot) {
                (Some(leaf), _) => leaf,
                (None, (Some(left), Some(right))) => Node::Internal {
                    left,
                    right,
                    weight: 0,
                },
                // The loop above only exits once every internal node has both children.
                (None, _) => Node::Internal {
                    left: 0,
                    right: 0,
                    weight: 0,
                },
            })
            .collect();

        Ok(Self { nodes, root: 0 })
    }

    /// Decode one symbol by walking from the root, one bit per edge.
    pub fn decode_symbol(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        let start = reader.bit_position();
        let mut index = self.root;

        if let Node::Leaf { symbol, .. } = self.nodes[index] {
            let bit = reader.read_bit().map_err(|e| e.into_stream_error(start))?;
            if bit {
                return Err(PackError::corrupt_stream(
                    start,
                    "invalid code for single-symbol tree",
                ));
            }
            return Ok(symbol);
        }

        loop {
            match self.nodes[index] {
                Node::Leaf { symbol, .. } => return Ok(symbol),
                Node::Internal { left, right, .. } => {
                    let bit = reader.read_bit().map_err(|_| {
                        PackError::corrupt_stream(start, "code does not reach a leaf")
                    })?;
                    index = if bit { right } else { left };
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn byte_table(data: &[u8]) -> FrequencyTable {
        let symbols: Vec<u16> = data.iter().map(|&b| u16::from(b)).collect();
        FrequencyTable::from_symbols(&symbols, 257)
    }

    fn code_len(codes: &[(u16, u64, u8)], symbol: u16) -> u8 {
        codes
            .iter()
            .find(|(s, _, _)| *s == symbol)
            .map(|(_, _, len)| *len)
            .unwrap()
    }

    #[test]
    fn test_frequency_table() {
        let table = byte_table(b"aab");
        assert_eq!(table.get(u16::from(b'a')), 2);
        assert_eq!(table.get(u16::from(b'b')), 1);
        assert_eq!(table.get(END_OF_STREAM), 1);
        assert_eq!(table.nonzero().count(), 3);
    }

    #[test]
    fn test_empty_table_fails() {
        let err = build_tree(&FrequencyTable::new(257)).unwrap_err();
        assert_eq!(err.kind(), oxipack_core::ErrorKind::EncodingFailure);
    }

    #[test]
    fn test_frequency_order() {
        let tree = build_tree(&byte_table(b"aaaabbbcc")).unwrap();
        let codes = tree.codes().unwrap();

        let a = code_len(&codes, u16::from(b'a'));
        let b = code_len(&codes, u16::from(b'b'));
        let c = code_len(&codes, u16::from(b'c'));
        assert_eq!((a, b, c), (1, 2, 3));
        assert_eq!(code_len(&codes, END_OF_STREAM), 3);
        assert_eq!(tree.root().weight(), 10);
    }

    #[test]
    fn test_deterministic_ties() {
        let t1 = build_tree(&byte_table(b"abcdabcd")).unwrap();
        let t2 = build_tree(&byte_table(b"abcdabcd")).unwrap();
        assert_eq!(t1, t2);
        assert_eq!(t1.codes().unwrap(), t2.codes().unwrap());
    }

    #[test]
    fn test_prefix_free() {
        let tree = build_tree(&byte_table(b"the quick brown fox jumps over the lazy dog")).unwrap();
        let codes = tree.codes().unwrap();
        for (i, &(_, bits_a, len_a)) in codes.iter().enumerate() {
            for &(_, bits_b, len_b) in codes.iter().skip(i + 1) {
                let shorter = len_a.min(len_b);
                let prefix_a = bits_a >> (len_a - shorter);
                let prefix_b = bits_b >> (len_b - shorter);
                assert_ne!(prefix_a, prefix_b, "codes share a prefix");
            }
        }
    }

    #[test]
    fn test_single_symbol_tree() {
        let mut table = FrequencyTable::new(257);
        table.add(END_OF_STREAM);
        let tree = build_tree(&table).unwrap();
        assert_eq!(tree.codes().unwrap(), vec![(END_OF_STREAM, 0, 1)]);

        let data = [0b0000_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(tree.decode_symbol(&mut reader).unwrap(), END_OF_STREAM);
    }

    #[test]
    fn test_serialize_roundtrip() {
        let tree = build_tree(&byte_table(b"mississippi river")).unwrap();
        let mut writer = BitWriter::new();
        tree.write_to(&mut writer);
        let bytes = writer.flush();

        let mut reader = BitReader::new(&bytes);
        let restored = HuffmanTree::read_from(&mut reader, 257).unwrap();

        let mut original = tree.codes().unwrap();
        let mut decoded = restored.codes().unwrap();
        original.sort_unstable();
        decoded.sort_unstable();
        assert_eq!(original, decoded);
    }

    #[test]
    fn test_read_rejects_truncated() {
        // Internal node, then nothing.
        let data = [0b0000_0000];
        let mut reader = BitReader::new(&data);
        let err = HuffmanTree::read_from(&mut reader, 257).unwrap_err();
        assert_eq!(err.kind(), oxipack_core::ErrorKind::CorruptStream);
    }

    #[test]
    fn test_read_rejects_out_of_range_symbol() {
        let mut writer = BitWriter::new();
        writer.write_bit(true);
        writer.write_bits(300, SYMBOL_BITS);
        let bytes = writer.flush();
        let mut reader = BitReader::new(&bytes);
        assert!(HuffmanTree::read_from(&mut reader, 257).is_err());
    }

    #[test]
    fn test_decode_runs_out() {
        let tree = build_tree(&byte_table(b"aaaabbbcc")).unwrap();
        // A multi-level tree needs at least one bit per symbol.
        let data: [u8; 0] = [];
        let mut reader = BitReader::new(&data);
        let err = tree.decode_symbol(&mut reader).unwrap_err();
        assert_eq!(err.kind(), oxipack_core::ErrorKind::CorruptStream);
    }
}
