//! Edge case tests for the stream codec.

use oxipack_core::{CompressionLevel, ErrorKind};
use oxipack_lz::{compress, decompress};

fn roundtrip(input: &[u8], level: u8) -> Vec<u8> {
    let frame = compress(input, CompressionLevel::new(level)).unwrap();
    decompress(&frame).unwrap()
}

#[test]
fn test_single_byte() {
    assert_eq!(roundtrip(b"A", 6), b"A");
}

#[test]
fn test_all_zeros() {
    let input = vec![0u8; 1000];
    let frame = compress(&input, CompressionLevel::new(6)).unwrap();
    assert_eq!(decompress(&frame).unwrap(), input);
    // All zeros should compress very well
    assert!(frame.len() < input.len() / 10);
}

#[test]
fn test_max_match_length() {
    let input = vec![42u8; 258 * 10];
    assert_eq!(roundtrip(&input, 9), input);
}

#[test]
fn test_alternating_pattern() {
    let input: Vec<u8> = (0..2000).map(|i| if i % 2 == 0 { 0xAA } else { 0x55 }).collect();
    for level in 1..=9 {
        assert_eq!(roundtrip(&input, level), input, "level {level}");
    }
}

#[test]
fn test_pseudo_random_bounded_expansion() {
    let mut seed: u64 = 0x1234_5678_9ABC_DEF0;
    let input: Vec<u8> = (0..20_000)
        .map(|_| {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
            (seed >> 32) as u8
        })
        .collect();

    for level in [1, 5, 9] {
        let frame = compress(&input, CompressionLevel::new(level)).unwrap();
        assert!(frame.len() < input.len() * 2, "level {level}");
        assert_eq!(decompress(&frame).unwrap(), input);
    }
}

#[test]
fn test_repeated_text_compresses() {
    let text = b"The quick brown fox jumps over the lazy dog. \
                 Pack my box with five dozen liquor jugs. "
        .repeat(200);
    for level in [1, 9] {
        let frame = compress(&text, CompressionLevel::new(level)).unwrap();
        assert!(frame.len() < text.len() / 5, "level {level}");
        assert_eq!(decompress(&frame).unwrap(), text);
    }
}

#[test]
fn test_truncated_frame_is_corrupt() {
    let input = b"some data that will be truncated in transit".repeat(20);
    let frame = compress(&input, CompressionLevel::DEFAULT).unwrap();
    for cut in [5, 12, frame.len() / 2, frame.len() - 1] {
        let err = decompress(&frame[..cut]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CorruptStream, "cut at {cut}");
    }
}
