//! Frequent byte-pair merging.
//!
//! At high levels the encoder may extend the byte alphabet with the most
//! frequent two-byte pairs. Each chosen pair gets its own symbol starting at
//! [`FIRST_PAIR_SYMBOL`], and the input is tokenized greedily left to right.

use crate::tree::{END_OF_STREAM, FIRST_PAIR_SYMBOL};
use std::collections::HashMap;

/// Most pairs a single alphabet may add.
pub const MAX_PAIRS: usize = 64;

/// A pair must occur at least this often to be considered.
pub const MIN_PAIR_COUNT: u32 = 4;

/// Lowest level at which the encoder tries pair merging.
pub const PAIR_MERGE_LEVEL: u8 = 7;

/// Extra symbols for frequent byte pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PairAlphabet {
    pairs: Vec<[u8; 2]>,
    lookup: HashMap<[u8; 2], u16>,
}

impl PairAlphabet {
    /// Build an alphabet from an explicit pair list. Pairs past
    /// [`MAX_PAIRS`] and repeated pairs are ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = [u8; 2]>) -> Self {
        let mut alphabet = Self::default();
        for pair in pairs {
            if alphabet.pairs.len() == MAX_PAIRS {
                break;
            }
            if alphabet.lookup.contains_key(&pair) {
                continue;
            }
            let symbol = FIRST_PAIR_SYMBOL + alphabet.pairs.len() as u16;
            alphabet.lookup.insert(pair, symbol);
            alphabet.pairs.push(pair);
        }
        alphabet
    }

    /// Pick the most frequent pairs of `data`.
    ///
    /// Overlapping occurrences are counted. Ties go to the numerically
    /// smaller pair so the choice is deterministic.
    pub fn select(data: &[u8]) -> Self {
        if data.len() < 2 {
            return Self::default();
        }

        let mut counts = vec![0u32; 1 << 16];
        for window in data.windows(2) {
            let key = (usize::from(window[0]) << 8) | usize::from(window[1]);
            counts[key] = counts[key].saturating_add(1);
        }

        let mut candidates: Vec<(u32, usize)> = counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count >= MIN_PAIR_COUNT)
            .map(|(key, &count)| (count, key))
            .collect();
        candidates.sort_unstable_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        candidates.truncate(MAX_PAIRS);

        Self::from_pairs(
            candidates
                .into_iter()
                .map(|(_, key)| [(key >> 8) as u8, key as u8]),
        )
    }

    /// Chosen pairs, in symbol order.
    pub fn pairs(&self) -> &[[u8; 2]] {
        &self.pairs
    }

    /// Number of pair symbols.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pairs were chosen.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Bytes, end-of-stream and pair symbols together.
    pub fn alphabet_size(&self) -> usize {
        usize::from(END_OF_STREAM) + 1 + self.pairs.len()
    }

    /// Turn bytes into symbols, preferring a pair whenever the next two
    /// bytes form one.
    pub fn tokenize(&self, data: &[u8]) -> Vec<u16> {
        if self.pairs.is_empty() {
            return data.iter().map(|&b| u16::from(b)).collect();
        }

        let mut symbols = Vec::with_capacity(data.len());
        let mut i = 0;
        while i < data.len() {
            let pair = data
                .get(i..i + 2)
                .and_then(|w| self.lookup.get(&[w[0], w[1]]).copied());
            match pair {
                Some(symbol) => {
                    symbols.push(symbol);
                    i += 2;
                }
                None => {
                    symbols.push(u16::from(data[i]));
                    i += 1;
                }
            }
        }
        symbols
    }

    /// The bytes a pair symbol stands for.
    pub fn expand(&self, symbol: u16) -> Option<[u8; 2]> {
        let index = symbol.checked_sub(FIRST_PAIR_SYMBOL)?;
        self.pairs.get(usize::from(index)).copied()
    }
}
