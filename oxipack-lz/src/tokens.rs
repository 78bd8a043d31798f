//! Byte serialization of LZ77 tokens.
//!
//! Tokens are grouped in eights behind a flag byte. Bit `i` of the flag byte
//! (least significant first) describes token `i` of the group:
//!
//! - `0`: literal, one byte
//! - `1`: match, `length - 3` as one byte then `distance - 1` as a
//!   little-endian `u16`

use crate::lz77::{Lz77Token, MAX_MATCH, MIN_MATCH};
use oxipack_core::error::{PackError, Result};

/// Serialize tokens.
pub fn serialize_tokens(tokens: &[Lz77Token]) -> Vec<u8> {
    let mut out = Vec::with_capacity(tokens.len() + tokens.len() / 8 + 1);

    for group in tokens.chunks(8) {
        let flag_index = out.len();
        out.push(0);
        let mut flags = 0u8;

        for (i, token) in group.iter().enumerate() {
            match *token {
                Lz77Token::Literal(b) => out.push(b),
                Lz77Token::Match { length, distance } => {
                    flags |= 1 << i;
                    out.push((length as usize - MIN_MATCH) as u8);
                    out.extend_from_slice(&(distance - 1).to_le_bytes());
                }
            }
        }

        out[flag_index] = flags;
    }

    out
}

/// Replay serialized tokens into the bytes they describe.
///
/// Matches are copied one byte at a time so a distance shorter than the
/// length repeats the bytes being produced. Output is never allowed to grow
/// past `expected_len`.
pub fn replay_tokens(serialized: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let bound = serialized.len().saturating_mul(MAX_MATCH);
    let mut out: Vec<u8> = Vec::with_capacity(expected_len.min(bound));
    let mut pos = 0;

    while pos < serialized.len() {
        let flags = serialized[pos];
        pos += 1;

        for i in 0..8 {
            if pos >= serialized.len() {
                break;
            }
            let offset = pos as u64;

            if flags & (1 << i) == 0 {
                if out.len() >= expected_len {
                    return Err(PackError::corrupt_stream(offset, "stream longer than declared"));
                }
                out.push(serialized[pos]);
                pos += 1;
                continue;
            }

            let token = serialized
                .get(pos..pos + 3)
                .ok_or_else(|| PackError::corrupt_stream(offset, "truncated match token"))?;
            let length = usize::from(token[0]) + MIN_MATCH;
            let distance = usize::from(u16::from_le_bytes([token[1], token[2]])) + 1;
            pos += 3;

            if distance > out.len() {
                return Err(PackError::corrupt_stream(
                    offset,
                    format!("match distance {distance} exceeds {} bytes of output", out.len()),
                ));
            }
            if out.len() + length > expected_len {
                return Err(PackError::corrupt_stream(offset, "stream longer than declared"));
            }

            let start = out.len() - distance;
            for j in 0..length {
                let byte = out[start + j];
                out.push(byte);
            }
        }
    }

    Ok(out)
}
