//! Huffman encoder and decoder.
//!
//! An encoded entry is a code table plus a bit stream. The table is stored
//! as metadata:
//!
//! ```text
//! [pairCount:u8][pair bytes: 2 * pairCount][tree shape, pre-order, zero padded]
//! ```
//!
//! The bit stream is every symbol's code followed by the end-of-stream code,
//! zero padded to a whole byte.

use crate::pairs::{MAX_PAIRS, PAIR_MERGE_LEVEL, PairAlphabet};
use crate::tree::{END_OF_STREAM, FrequencyTable, HuffmanTree, build_tree};
use oxipack_core::bitstream::{BitReader, BitWriter};
use oxipack_core::entry::CodecTag;
use oxipack_core::error::{PackError, Result};
use oxipack_core::traits::{CompressionLevel, EncodedBlock, EntryCodec, PROGRESS_INTERVAL};

/// A prefix code: `length` low bits of `bits`, written MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    /// Code bits, right aligned.
    pub bits: u64,
    /// Number of bits.
    pub length: u8,
}

/// Symbol-to-code mapping together with the tree it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    tree: HuffmanTree,
    codes: Vec<Option<Code>>,
    pairs: PairAlphabet,
}

impl CodeTable {
    /// Derive codes from a tree.
    pub fn from_tree(tree: HuffmanTree, pairs: PairAlphabet) -> Result<Self> {
        let mut codes = vec![None; pairs.alphabet_size()];
        for (symbol, bits, length) in tree.codes()? {
            let slot = codes.get_mut(usize::from(symbol)).ok_or_else(|| {
                PackError::encoding_failure(format!("symbol {symbol} outside alphabet"))
            })?;
            *slot = Some(Code { bits, length });
        }
        Ok(Self { tree, codes, pairs })
    }

    /// Code for a symbol, if it occurs.
    pub fn get(&self, symbol: u16) -> Option<Code> {
        self.codes.get(usize::from(symbol)).copied().flatten()
    }

    /// The tree the codes were derived from.
    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    /// Pair symbols in use.
    pub fn pairs(&self) -> &PairAlphabet {
        &self.pairs
    }

    /// Number of symbols with a code.
    pub fn len(&self) -> usize {
        self.codes.iter().filter(|c| c.is_some()).count()
    }

    /// Whether no symbol has a code.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(symbol, code)` pairs in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.map(|c| (symbol as u16, c)))
    }

    /// Serialize the table.
    pub fn to_meta(&self) -> Vec<u8> {
        let mut writer = BitWriter::new();
        writer.write_bits(self.pairs.len() as u32, 8);
        for pair in self.pairs.pairs() {
            writer.write_bytes(pair);
        }
        self.tree.write_to(&mut writer);
        writer.flush()
    }

    /// Parse a table written by [`CodeTable::to_meta`].
    pub fn from_meta(meta: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(meta);

        let pair_count = usize::from(reader.read_u8().map_err(|e| e.into_stream_error(0))?);
        if pair_count > MAX_PAIRS {
            return Err(PackError::corrupt_stream(
                0,
                format!("pair count {pair_count} exceeds {MAX_PAIRS}"),
            ));
        }

        let mut pairs = Vec::with_capacity(pair_count);
        for _ in 0..pair_count {
            let offset = reader.bit_position();
            let a = reader.read_u8().map_err(|e| e.into_stream_error(offset))?;
            let b = reader.read_u8().map_err(|e| e.into_stream_error(offset))?;
            pairs.push([a, b]);
        }
        let pairs = PairAlphabet::from_pairs(pairs);
        if pairs.len() != pair_count {
            return Err(PackError::corrupt_stream(0, "duplicate pair in code table"));
        }

        let tree = HuffmanTree::read_from(&mut reader, pairs.alphabet_size())?;
        if !reader.remaining_is_padding() {
            return Err(PackError::corrupt_stream(
                reader.bit_position(),
                "trailing data after code table",
            ));
        }

        let table = Self::from_tree(tree, pairs)?;
        if table.get(END_OF_STREAM).is_none() {
            return Err(PackError::corrupt_stream(0, "code table has no end-of-stream symbol"));
        }
        Ok(table)
    }
}

/// A Huffman-encoded entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanEncoded {
    /// Code table used to produce `bits`.
    pub table: CodeTable,
    /// Encoded symbols, end-of-stream code last.
    pub bits: Vec<u8>,
}

impl HuffmanEncoded {
    /// Metadata and bits as a block.
    pub fn to_block(&self) -> EncodedBlock {
        EncodedBlock {
            meta: self.table.to_meta(),
            data: self.bits.clone(),
        }
    }

    /// Parse the code table out of a block.
    pub fn from_block(block: &EncodedBlock) -> Result<Self> {
        Ok(Self {
            table: CodeTable::from_meta(&block.meta)?,
            bits: block.data.clone(),
        })
    }

    /// Serialized size, table included.
    pub fn encoded_len(&self) -> usize {
        self.table.to_meta().len() + self.bits.len()
    }
}

/// Encode with an explicit pair alphabet (empty for plain bytes).
///
/// `progress` receives input bytes coded so far, about every
/// [`PROGRESS_INTERVAL`] bytes and once more with `data.len()`.
pub fn encode_with_pairs(
    data: &[u8],
    pairs: PairAlphabet,
    progress: &mut dyn FnMut(u64) -> Result<()>,
) -> Result<HuffmanEncoded> {
    let symbols = pairs.tokenize(data);
    let frequencies = FrequencyTable::from_symbols(&symbols, pairs.alphabet_size());
    let table = CodeTable::from_tree(build_tree(&frequencies)?, pairs)?;

    let mut writer = BitWriter::with_capacity(data.len() / 2 + 1);
    let mut consumed = 0usize;
    let mut next_report = PROGRESS_INTERVAL;
    for &symbol in symbols.iter().chain(std::iter::once(&END_OF_STREAM)) {
        let code = table
            .get(symbol)
            .ok_or_else(|| PackError::encoding_failure(format!("no code for symbol {symbol}")))?;
        writer.write_code(code.bits, code.length);

        consumed += match symbol {
            END_OF_STREAM => 0,
            s if s < END_OF_STREAM => 1,
            _ => 2,
        };
        if consumed >= next_report {
            progress(consumed as u64)?;
            next_report = consumed + PROGRESS_INTERVAL;
        }
    }
    progress(data.len() as u64)?;

    Ok(HuffmanEncoded {
        table,
        bits: writer.flush(),
    })
}

/// Huffman-encode `data`.
///
/// From level 7 up the encoder also tries a pair-merged alphabet and keeps
/// it only when the result, table included, is strictly smaller.
pub fn encode(data: &[u8], level: CompressionLevel) -> Result<HuffmanEncoded> {
    encode_with_progress(data, level, &mut |_| Ok(()))
}

/// [`encode`], reporting input bytes coded so far.
///
/// When a pair-merged alphabet is tried each pass counts for half the input.
pub fn encode_with_progress(
    data: &[u8],
    level: CompressionLevel,
    progress: &mut dyn FnMut(u64) -> Result<()>,
) -> Result<HuffmanEncoded> {
    let pairs = if level.level() >= PAIR_MERGE_LEVEL {
        PairAlphabet::select(data)
    } else {
        PairAlphabet::default()
    };
    if pairs.is_empty() {
        return encode_with_pairs(data, pairs, progress);
    }

    let half = data.len() as u64 / 2;
    let plain = encode_with_pairs(data, PairAlphabet::default(), &mut |done| progress(done / 2))?;
    let merged = encode_with_pairs(data, pairs, &mut |done| progress(half + done / 2))?;
    progress(data.len() as u64)?;

    if merged.encoded_len() < plain.encoded_len() {
        Ok(merged)
    } else {
        Ok(plain)
    }
}

/// Decode `bits` with `table` until the end-of-stream symbol.
///
/// Running out of bits before end-of-stream, or finding anything but zero
/// padding after it, is a [`PackError::CorruptStream`].
pub fn decode(table: &CodeTable, bits: &[u8]) -> Result<Vec<u8>> {
    let tree = table.tree();
    let mut reader = BitReader::new(bits);
    let mut output = Vec::with_capacity(bits.len() * 2);

    loop {
        let offset = reader.bit_position();
        let symbol = tree.decode_symbol(&mut reader)?;
        if symbol == END_OF_STREAM {
            break;
        }
        if symbol < END_OF_STREAM {
            output.push(symbol as u8);
        } else {
            let pair = table.pairs().expand(symbol).ok_or_else(|| {
                PackError::corrupt_stream(offset, format!("unknown pair symbol {symbol}"))
            })?;
            output.extend_from_slice(&pair);
        }
    }

    if !reader.remaining_is_padding() {
        return Err(PackError::corrupt_stream(
            reader.bit_position(),
            "data after end-of-stream symbol",
        ));
    }

    Ok(output)
}

/// [`EntryCodec`] for per-file Huffman coding.
#[derive(Debug, Clone, Copy, Default)]
pub struct HuffmanCodec;

impl EntryCodec for HuffmanCodec {
    fn tag(&self) -> CodecTag {
        CodecTag::Huffman
    }

    fn encode_with_progress(
        &self,
        data: &[u8],
        level: CompressionLevel,
        progress: &mut dyn FnMut(u64) -> Result<()>,
    ) -> Result<EncodedBlock> {
        Ok(encode_with_progress(data, level, progress)?.to_block())
    }

    fn decode(&self, block: &EncodedBlock) -> Result<Vec<u8>> {
        let encoded = HuffmanEncoded::from_block(block)?;
        decode(&encoded.table, &encoded.bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_core::ErrorKind;

    #[test]
    fn test_roundtrip_text() {
        let data = b"Hello, World! Hello, Huffman!";
        let encoded = encode(data, CompressionLevel::DEFAULT).unwrap();
        assert_eq!(decode(&encoded.table, &encoded.bits).unwrap(), data);
    }

    #[test]
    fn test_empty_input() {
        let encoded = encode(b"", CompressionLevel::DEFAULT).unwrap();
        assert_eq!(encoded.table.len(), 1);
        assert_eq!(encoded.bits, vec![0x00]);
        assert!(decode(&encoded.table, &encoded.bits).unwrap().is_empty());
    }

    #[test]
    fn test_single_distinct_byte() {
        let data = vec![b'z'; 100];
        let encoded = encode(&data, CompressionLevel::DEFAULT).unwrap();
        assert_eq!(decode(&encoded.table, &encoded.bits).unwrap(), data);
        // 101 symbols, at most 2 bits each
        assert!(encoded.bits.len() <= 26);
    }

    #[test]
    fn test_meta_roundtrip() {
        let encoded = encode(b"abracadabra", CompressionLevel::DEFAULT).unwrap();
        let meta = encoded.table.to_meta();
        let table = CodeTable::from_meta(&meta).unwrap();
        assert_eq!(
            table.iter().collect::<Vec<_>>(),
            encoded.table.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_missing_eos_is_corrupt() {
        let encoded = encode(b"aaaabbbcc", CompressionLevel::DEFAULT).unwrap();
        let a = encoded.table.get(u16::from(b'a')).unwrap();
        assert_eq!(a.length, 1);

        // Eight 'a' codes and no end-of-stream
        let err = decode(&encoded.table, &[0x00]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream);
    }

    #[test]
    fn test_garbage_after_eos() {
        let encoded = encode(b"aaaabbbcc", CompressionLevel::DEFAULT).unwrap();
        let mut bits = encoded.bits.clone();
        bits.push(0xFF);
        let err = decode(&encoded.table, &bits).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream);
    }

    #[test]
    fn test_pair_merge_kept_when_smaller() {
        let data = b"th".repeat(2000);
        let high = encode(&data, CompressionLevel::BEST).unwrap();
        let low = encode(&data, CompressionLevel::DEFAULT).unwrap();

        assert!(!high.table.pairs().is_empty());
        assert!(high.encoded_len() < low.encoded_len());
        assert_eq!(decode(&high.table, &high.bits).unwrap(), data);
    }

    #[test]
    fn test_pair_merge_not_used_below_level() {
        let data = b"th".repeat(200);
        let encoded = encode(&data, CompressionLevel::new(6)).unwrap();
        assert!(encoded.table.pairs().is_empty());
    }

    #[test]
    fn test_entry_codec() {
        let codec = HuffmanCodec;
        let data = b"entry codec roundtrip".repeat(10);
        let block = codec.encode(&data, CompressionLevel::BEST).unwrap();
        assert_eq!(codec.tag(), CodecTag::Huffman);
        assert_eq!(codec.decode(&block).unwrap(), data);
    }

    #[test]
    fn test_progress_reported_within_one_input() {
        let data: Vec<u8> = (0..PROGRESS_INTERVAL * 4).map(|i| (i % 17) as u8).collect();
        let mut seen = Vec::new();
        let encoded = encode_with_progress(&data, CompressionLevel::DEFAULT, &mut |done| {
            seen.push(done);
            Ok(())
        })
        .unwrap();

        assert!(seen.len() >= 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().any(|&done| done > 0 && done < data.len() as u64));
        assert_eq!(seen.last(), Some(&(data.len() as u64)));
        assert_eq!(decode(&encoded.table, &encoded.bits).unwrap(), data);
    }

    #[test]
    fn test_progress_with_pair_merge_stays_ordered() {
        let data = b"th".repeat(PROGRESS_INTERVAL);
        let mut seen = Vec::new();
        encode_with_progress(&data, CompressionLevel::BEST, &mut |done| {
            seen.push(done);
            Ok(())
        })
        .unwrap();

        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seen.last(), Some(&(data.len() as u64)));
    }

    #[test]
    fn test_progress_error_aborts() {
        let data = vec![3u8; PROGRESS_INTERVAL * 2];
        let mut calls = 0;
        let err = encode_with_progress(&data, CompressionLevel::FAST, &mut |_| {
            calls += 1;
            Err(PackError::Cancelled)
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_truncated_meta() {
        let err = CodeTable::from_meta(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream);

        let err = CodeTable::from_meta(&[3, b'a']).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream);
    }
}
