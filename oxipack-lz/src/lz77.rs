//! LZ77 matching for the stream codec.
//!
//! The matcher keeps a hash table of 3-byte prefixes and a chain of earlier
//! positions with the same hash. For each position it walks at most
//! `max_chain` candidates inside the sliding window and either:
//! - Emits a literal byte if no match of 3+ bytes is found
//! - Emits a (length, distance) pair for the longest match found
//!
//! The whole input is in memory, so positions are absolute and the window is
//! enforced by distance rather than by a copy buffer.

use oxipack_core::error::Result;
use oxipack_core::traits::CompressionLevel;

/// Minimum match length.
pub const MIN_MATCH: usize = 3;

/// Maximum match length.
pub const MAX_MATCH: usize = 258;

/// Largest window any level uses (32 KiB).
pub const MAX_WINDOW_SIZE: usize = 32 * 1024;

pub use oxipack_core::traits::PROGRESS_INTERVAL;

/// Size of the hash table (power of 2).
const HASH_SIZE: usize = 1 << 15;

/// Hash mask.
const HASH_MASK: usize = HASH_SIZE - 1;

/// Empty hash slot.
const NIL: usize = usize::MAX;

/// A token produced by LZ77 compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lz77Token {
    /// A literal byte.
    Literal(u8),
    /// A back-reference to previously seen data.
    Match {
        /// Number of bytes to copy (3-258).
        length: u16,
        /// Distance back into the window (1-32768).
        distance: u16,
    },
}

/// Search parameters derived from a compression level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherParams {
    /// Sliding window size in bytes (power of 2).
    pub window_size: usize,
    /// Most hash chain candidates examined per position.
    pub max_chain: usize,
    /// Defer a match by one byte when the next position matches longer.
    pub lazy: bool,
}

impl MatcherParams {
    /// Parameters for a level.
    ///
    /// - Level 1-3: 4 KiB window
    /// - Level 4-6: 16 KiB window
    /// - Level 7-9: 32 KiB window
    pub fn for_level(level: CompressionLevel) -> Self {
        let window_size = match level.level() {
            1..=3 => 4 * 1024,
            4..=6 => 16 * 1024,
            _ => MAX_WINDOW_SIZE,
        };
        let (max_chain, lazy) = match level.level() {
            1 => (4, false),
            2 => (8, false),
            3 => (16, false),
            4 => (32, false),
            5 => (64, true),
            6 => (128, true),
            7 => (256, true),
            8 => (1024, true),
            _ => (4096, true),
        };
        Self {
            window_size,
            max_chain,
            lazy,
        }
    }
}

/// LZ77 encoder.
#[derive(Debug)]
pub struct Lz77Encoder {
    params: MatcherParams,
    /// Most recent position for each hash.
    head: Vec<usize>,
    /// Previous position with the same hash, indexed by `pos % window_size`.
    prev: Vec<usize>,
}

impl Lz77Encoder {
    /// Create an encoder for the given level.
    pub fn new(level: CompressionLevel) -> Self {
        Self::with_params(MatcherParams::for_level(level))
    }

    /// Create an encoder with explicit parameters.
    pub fn with_params(params: MatcherParams) -> Self {
        let window_size = params.window_size.next_power_of_two().min(MAX_WINDOW_SIZE);
        let params = MatcherParams {
            window_size,
            ..params
        };
        Self {
            params,
            head: vec![NIL; HASH_SIZE],
            prev: vec![NIL; window_size],
        }
    }

    /// Parameters in use.
    pub fn params(&self) -> MatcherParams {
        self.params
    }

    /// Reset the encoder state.
    pub fn reset(&mut self) {
        self.head.fill(NIL);
        self.prev.fill(NIL);
    }

    /// Compute hash for 3 bytes.
    #[inline(always)]
    fn hash(b0: u8, b1: u8, b2: u8) -> usize {
        let h = ((b0 as usize).wrapping_mul(506832829))
            ^ ((b1 as usize).wrapping_mul(2654435761) << 8)
            ^ ((b2 as usize).wrapping_mul(374761393) << 16);
        (h ^ (h >> 15)) & HASH_MASK
    }

    /// Record `pos` in the hash chains.
    fn insert(&mut self, data: &[u8], pos: usize) {
        if pos + MIN_MATCH <= data.len() {
            let h = Self::hash(data[pos], data[pos + 1], data[pos + 2]);
            self.prev[pos & (self.params.window_size - 1)] = self.head[h];
            self.head[h] = pos;
        }
    }

    /// Longest match for `pos` as `(length, distance)`.
    fn find_match(&self, data: &[u8], pos: usize) -> Option<(usize, usize)> {
        if pos + MIN_MATCH > data.len() {
            return None;
        }

        let max_len = (data.len() - pos).min(MAX_MATCH);
        let h = Self::hash(data[pos], data[pos + 1], data[pos + 2]);
        let mut candidate = self.head[h];
        let mut best_len = MIN_MATCH - 1;
        let mut best_dist = 0;
        let mut chain = 0;

        while candidate != NIL && candidate < pos && chain < self.params.max_chain {
            let dist = pos - candidate;
            if dist > self.params.window_size {
                break;
            }

            // Check the byte that would extend the best match first
            if data[candidate + best_len] == data[pos + best_len] {
                let len = data[candidate..]
                    .iter()
                    .zip(&data[pos..pos + max_len])
                    .take_while(|(a, b)| a == b)
                    .count();

                if len > best_len {
                    best_len = len;
                    best_dist = dist;
                    if len >= max_len {
                        break;
                    }
                }
            }

            let next = self.prev[candidate & (self.params.window_size - 1)];
            if next == NIL || next >= candidate {
                break;
            }
            candidate = next;
            chain += 1;
        }

        (best_len >= MIN_MATCH).then_some((best_len, best_dist))
    }

    /// Compress `data` to tokens.
    ///
    /// `progress` receives the number of input bytes consumed so far, every
    /// [`PROGRESS_INTERVAL`] bytes and once at the end. An error returned by
    /// `progress` aborts compression and is passed through.
    pub fn compress(
        &mut self,
        data: &[u8],
        progress: &mut dyn FnMut(u64) -> Result<()>,
    ) -> Result<Vec<Lz77Token>> {
        self.reset();
        let mut tokens = Vec::with_capacity(data.len() / 2 + 1);
        let mut pos = 0;
        let mut next_report = PROGRESS_INTERVAL;

        while pos < data.len() {
            if pos >= next_report {
                progress(pos as u64)?;
                next_report = pos + PROGRESS_INTERVAL;
            }

            let Some((length, distance)) = self.find_match(data, pos) else {
                tokens.push(Lz77Token::Literal(data[pos]));
                self.insert(data, pos);
                pos += 1;
                continue;
            };

            self.insert(data, pos);

            if self.params.lazy && pos + 1 < data.len() {
                if let Some((next_len, _)) = self.find_match(data, pos + 1) {
                    if next_len > length + 1 {
                        // Better to emit literal and use next match
                        tokens.push(Lz77Token::Literal(data[pos]));
                        pos += 1;
                        continue;
                    }
                }
            }

            tokens.push(Lz77Token::Match {
                length: length as u16,
                distance: distance as u16,
            });
            for i in 1..length {
                self.insert(data, pos + i);
            }
            pos += length;
        }

        progress(data.len() as u64)?;
        Ok(tokens)
    }

    /// Compress all data at once (convenience method).
    pub fn compress_all(data: &[u8], level: CompressionLevel) -> Vec<Lz77Token> {
        let mut encoder = Self::new(level);
        // The no-op callback never fails.
        encoder.compress(data, &mut |_| Ok(())).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_core::{ErrorKind, PackError};

    fn expand(tokens: &[Lz77Token]) -> Vec<u8> {
        let mut out: Vec<u8> = Vec::new();
        for token in tokens {
            match *token {
                Lz77Token::Literal(b) => out.push(b),
                Lz77Token::Match { length, distance } => {
                    let start = out.len() - distance as usize;
                    for i in 0..length as usize {
                        out.push(out[start + i]);
                    }
                }
            }
        }
        out
    }

    #[test]
    fn test_literals_only() {
        let input = b"abcdefgh";
        let tokens = Lz77Encoder::compress_all(input, CompressionLevel::DEFAULT);

        // All should be literals (no repeats)
        assert!(tokens.iter().all(|t| matches!(t, Lz77Token::Literal(_))));
        assert_eq!(tokens.len(), 8);
    }

    #[test]
    fn test_simple_match() {
        let input = b"abcabcabc";
        let tokens = Lz77Encoder::compress_all(input, CompressionLevel::DEFAULT);
        assert_eq!(
            tokens,
            vec![
                Lz77Token::Literal(b'a'),
                Lz77Token::Literal(b'b'),
                Lz77Token::Literal(b'c'),
                Lz77Token::Match {
                    length: 6,
                    distance: 3
                },
            ]
        );
    }

    #[test]
    fn test_overlapping_run() {
        let input = vec![b'z'; 100];
        let tokens = Lz77Encoder::compress_all(&input, CompressionLevel::FAST);
        assert_eq!(tokens[0], Lz77Token::Literal(b'z'));
        assert_eq!(
            tokens[1],
            Lz77Token::Match {
                length: 99,
                distance: 1
            }
        );
        assert_eq!(expand(&tokens), input);
    }

    #[test]
    fn test_window_limits_distance() {
        // Same 64-byte block repeated 5000 bytes apart
        let block: Vec<u8> = (0..64u8).map(|b| b.wrapping_mul(37)).collect();
        let mut input = block.clone();
        input.extend((0..5000u32).map(|i| (i % 251) as u8 ^ 0x5A));
        input.extend_from_slice(&block);

        for (level, window) in [(1u8, 4096usize), (5, 16384), (9, 32768)] {
            let tokens = Lz77Encoder::compress_all(&input, CompressionLevel::new(level));
            for token in &tokens {
                if let Lz77Token::Match { distance, .. } = token {
                    assert!(*distance as usize <= window);
                }
            }
            assert_eq!(expand(&tokens), input);
        }
    }

    #[test]
    fn test_level_params() {
        let fast = MatcherParams::for_level(CompressionLevel::FAST);
        let best = MatcherParams::for_level(CompressionLevel::BEST);
        assert_eq!(fast.window_size, 4096);
        assert_eq!(best.window_size, MAX_WINDOW_SIZE);
        assert!(fast.max_chain < best.max_chain);
        assert!(!fast.lazy && best.lazy);
    }

    #[test]
    fn test_progress_and_abort() {
        let input = vec![7u8; PROGRESS_INTERVAL * 3];
        let mut reports = Vec::new();
        let mut encoder = Lz77Encoder::new(CompressionLevel::FAST);
        encoder
            .compress(&input, &mut |done| {
                reports.push(done);
                Ok(())
            })
            .unwrap();
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports.last().copied(), Some(input.len() as u64));

        let err = encoder
            .compress(&input, &mut |_| Err(PackError::Cancelled))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
