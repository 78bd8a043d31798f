//! Edge case tests for Huffman coding.

use oxipack_core::{CompressionLevel, EncodedBlock, EntryCodec, ErrorKind};
use oxipack_huffman::{HuffmanCodec, decode, encode};

fn roundtrip(data: &[u8], level: u8) -> Vec<u8> {
    let encoded = encode(data, CompressionLevel::new(level)).unwrap();
    decode(&encoded.table, &encoded.bits).unwrap()
}

#[test]
fn test_all_byte_values() {
    let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    assert_eq!(roundtrip(&data, 5), data);
    assert_eq!(roundtrip(&data, 9), data);
}

#[test]
fn test_skewed_distribution_compresses() {
    let mut data = vec![b'e'; 9000];
    data.extend(std::iter::repeat_n(b'q', 500));
    data.extend(std::iter::repeat_n(b'z', 500));

    let encoded = encode(&data, CompressionLevel::DEFAULT).unwrap();
    assert!(encoded.encoded_len() < data.len() / 4);
    assert_eq!(decode(&encoded.table, &encoded.bits).unwrap(), data);
}

#[test]
fn test_deterministic_output() {
    let data = b"deterministic output for equal weights: abcdefgh";
    let a = encode(data, CompressionLevel::BEST).unwrap();
    let b = encode(data, CompressionLevel::BEST).unwrap();
    assert_eq!(a.to_block(), b.to_block());
}

#[test]
fn test_text_at_every_level() {
    let data = b"It was the best of times, it was the worst of times. ".repeat(40);
    for level in 1..=9 {
        assert_eq!(roundtrip(&data, level), data, "level {level}");
    }
}

#[test]
fn test_codec_rejects_bad_meta() {
    let codec = HuffmanCodec;
    let block = EncodedBlock {
        meta: vec![0xFF, 0x00],
        data: vec![0x00],
    };
    let err = codec.decode(&block).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}

#[test]
fn test_codec_truncated_bits() {
    let codec = HuffmanCodec;
    let data = b"a longer message that needs several bytes of codes".to_vec();
    let mut block = codec.encode(&data, CompressionLevel::DEFAULT).unwrap();
    block.data.truncate(block.data.len() / 2);
    let err = codec.decode(&block).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptStream);
}
