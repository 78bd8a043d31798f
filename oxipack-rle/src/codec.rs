//! Escape-marker run-length encoding.
//!
//! Bytes other than the escape marker pass through unchanged unless they
//! start a run. Every token begins with the escape marker:
//!
//! | Token                    | Meaning                                  |
//! |--------------------------|------------------------------------------|
//! | `ESC 0 value`            | one literal `value` (used for `ESC`)     |
//! | `ESC 1 a b n`            | the two-byte pattern `ab` repeated `n` times |
//! | `ESC count value`        | `count` (3-255) copies of `value`        |
//!
//! Tag `2` is never produced and is rejected on decode.

use oxipack_core::entry::CodecTag;
use oxipack_core::error::{PackError, Result};
use oxipack_core::traits::{CompressionLevel, EncodedBlock, EntryCodec, PROGRESS_INTERVAL};

/// Shortest run emitted as a run token.
pub const MIN_RUN: usize = 3;

/// Longest run a single token can carry.
pub const MAX_RUN: usize = 255;

/// Fewest pattern repetitions worth a pattern token.
pub const MIN_PATTERN_REPEATS: usize = 3;

/// Lowest level that looks for two-byte patterns.
pub const PATTERN_LEVEL: u8 = 6;

const TAG_LITERAL: u8 = 0;
const TAG_PATTERN: u8 = 1;
const TAG_RESERVED: u8 = 2;

/// Pick the least frequent byte value, lowest value on ties.
pub fn choose_escape(data: &[u8]) -> u8 {
    let mut counts = [0u64; 256];
    for &b in data {
        counts[usize::from(b)] += 1;
    }
    counts
        .iter()
        .enumerate()
        .min_by_key(|&(value, &count)| (count, value))
        .map(|(value, _)| value as u8)
        .unwrap_or(0)
}

fn is_printable(b: u8) -> bool {
    (0x20..=0x7E).contains(&b)
}

/// Length of the run of `data[i]` starting at `i`, capped at [`MAX_RUN`].
fn run_length(data: &[u8], i: usize) -> usize {
    let byte = data[i];
    data[i..]
        .iter()
        .take(MAX_RUN)
        .take_while(|&&b| b == byte)
        .count()
}

/// Repetitions of the pair `data[i..i + 2]` starting at `i`, capped at 255.
fn pattern_repeats(data: &[u8], i: usize) -> usize {
    let (Some(&a), Some(&b)) = (data.get(i), data.get(i + 1)) else {
        return 0;
    };
    if a == b || !is_printable(a) || !is_printable(b) {
        return 0;
    }
    data[i..]
        .chunks_exact(2)
        .take(MAX_RUN)
        .take_while(|w| w[0] == a && w[1] == b)
        .count()
}

/// Run-length encode `data` with the given escape marker.
pub fn encode_with_escape(data: &[u8], escape: u8, level: CompressionLevel) -> Vec<u8> {
    // the no-op callback never fails
    encode_with_escape_progress(data, escape, level, &mut |_| Ok(())).unwrap_or_default()
}

/// [`encode_with_escape`], reporting input bytes scanned so far.
///
/// `progress` is called about every [`PROGRESS_INTERVAL`] bytes and once
/// more with `data.len()`; an error it returns aborts the scan.
pub fn encode_with_escape_progress(
    data: &[u8],
    escape: u8,
    level: CompressionLevel,
    progress: &mut dyn FnMut(u64) -> Result<()>,
) -> Result<Vec<u8>> {
    let patterns = level.level() >= PATTERN_LEVEL;
    let mut out = Vec::with_capacity(data.len() + data.len() / 16);
    let mut i = 0;
    let mut next_report = PROGRESS_INTERVAL;

    while i < data.len() {
        if i >= next_report {
            progress(i as u64)?;
            next_report = i + PROGRESS_INTERVAL;
        }

        let byte = data[i];
        let run = run_length(data, i);

        if run >= MIN_RUN {
            out.extend_from_slice(&[escape, run as u8, byte]);
            i += run;
            continue;
        }

        if patterns {
            let repeats = pattern_repeats(data, i);
            if repeats >= MIN_PATTERN_REPEATS {
                out.extend_from_slice(&[escape, TAG_PATTERN, byte, data[i + 1], repeats as u8]);
                i += repeats * 2;
                continue;
            }
        }

        // Only the escape byte needs a literal token; any other byte is
        // copied as is.
        if byte == escape {
            out.extend_from_slice(&[escape, TAG_LITERAL, byte]);
        } else {
            out.push(byte);
        }
        i += 1;
    }

    progress(data.len() as u64)?;
    Ok(out)
}

/// Decode bytes produced by [`encode_with_escape`].
pub fn decode_with_escape(data: &[u8], escape: u8) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != escape {
            out.push(byte);
            i += 1;
            continue;
        }

        let offset = i as u64;
        let truncated = || PackError::corrupt_stream(offset, "truncated run-length token");
        let tag = *data.get(i + 1).ok_or_else(truncated)?;

        match tag {
            TAG_LITERAL => {
                out.push(*data.get(i + 2).ok_or_else(truncated)?);
                i += 3;
            }
            TAG_PATTERN => {
                let token = data.get(i + 2..i + 5).ok_or_else(truncated)?;
                let (a, b, repeats) = (token[0], token[1], token[2]);
                for _ in 0..repeats {
                    out.extend_from_slice(&[a, b]);
                }
                i += 5;
            }
            TAG_RESERVED => {
                return Err(PackError::corrupt_stream(
                    offset,
                    format!("unrecognized run-length tag {tag}"),
                ));
            }
            count => {
                let value = *data.get(i + 2).ok_or_else(truncated)?;
                out.resize(out.len() + usize::from(count), value);
                i += 3;
            }
        }
    }

    Ok(out)
}

/// Encode `data`, choosing the escape marker from its byte histogram.
///
/// Returns the escape marker and the encoded bytes.
pub fn encode(data: &[u8], level: CompressionLevel) -> (u8, Vec<u8>) {
    let escape = choose_escape(data);
    (escape, encode_with_escape(data, escape, level))
}

/// [`EntryCodec`] for per-file run-length encoding.
///
/// The block metadata is the single escape byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct RleCodec;

impl EntryCodec for RleCodec {
    fn tag(&self) -> CodecTag {
        CodecTag::Rle
    }

    fn encode_with_progress(
        &self,
        data: &[u8],
        level: CompressionLevel,
        progress: &mut dyn FnMut(u64) -> Result<()>,
    ) -> Result<EncodedBlock> {
        let escape = choose_escape(data);
        let data = encode_with_escape_progress(data, escape, level, progress)?;
        Ok(EncodedBlock {
            meta: vec![escape],
            data,
        })
    }

    fn decode(&self, block: &EncodedBlock) -> Result<Vec<u8>> {
        match block.meta.as_slice() {
            [escape] => decode_with_escape(&block.data, *escape),
            other => Err(PackError::corrupt_stream(
                0,
                format!("run-length metadata must be 1 byte, got {}", other.len()),
            )),
        }
    }
}
