//! Archive round-trip and corruption tests across every algorithm.

use oxipack_archive::{ContainerReader, list_entries, pack, unpack};
use oxipack_core::{Algorithm, CompressionLevel, ContainerLayout, ErrorKind, InputFile};

fn sample_files() -> Vec<InputFile> {
    vec![
        InputFile::new("readme.txt", b"OxiPack sample readme\n".repeat(30)),
        InputFile::new("empty.bin", Vec::new()),
        InputFile::new("zeros.bin", vec![0u8; 5000]),
        InputFile::new("ramp.bin", (0..=255u8).cycle().take(3000).collect::<Vec<_>>()),
    ]
}

#[test]
fn test_every_algorithm_and_level() {
    let files = sample_files();
    for algorithm in Algorithm::ALL {
        for level in [1u8, 5, 9] {
            let data = pack(algorithm, &files, CompressionLevel::new(level)).unwrap();
            let restored = unpack(algorithm, &data).unwrap();
            assert_eq!(restored, files, "{algorithm} level {level}");
        }
    }
}

#[test]
fn test_rar_hello_world() {
    let files = vec![
        InputFile::new("x", b"hello".to_vec()),
        InputFile::new("y", b"world".to_vec()),
    ];
    let data = pack(Algorithm::Rar, &files, CompressionLevel::DEFAULT).unwrap();

    // Directory entry count
    assert_eq!(&data[..4], &[2, 0, 0, 0]);

    let restored = unpack(Algorithm::Rar, &data).unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!((restored[0].name(), restored[0].bytes()), ("x", &b"hello"[..]));
    assert_eq!((restored[1].name(), restored[1].bytes()), ("y", &b"world"[..]));
}

#[test]
fn test_tar_and_tgz_share_layout() {
    let files = sample_files();
    let tar = pack(Algorithm::Tar, &files, CompressionLevel::DEFAULT).unwrap();
    let tgz = pack(Algorithm::Tgz, &files, CompressionLevel::DEFAULT).unwrap();
    assert_eq!(tar, tgz);
}

#[test]
fn test_solid_benefits_from_similar_files() {
    let files: Vec<InputFile> = (0..40)
        .map(|i| {
            InputFile::new(
                format!("record{i}.json"),
                format!("{{\"id\": {i}, \"status\": \"active\", \"owner\": \"operations\"}}")
                    .into_bytes(),
            )
        })
        .collect();
    let raw: usize = files.iter().map(|f| f.bytes().len()).sum();

    let rar = pack(Algorithm::Rar, &files, CompressionLevel::BEST).unwrap();
    let huffman = pack(Algorithm::Huffman, &files, CompressionLevel::BEST).unwrap();
    assert!(rar.len() < huffman.len());
    assert!(rar.len() < raw);
}

#[test]
fn test_list_container_entries() {
    let files = sample_files();
    let data = pack(Algorithm::Tgz, &files, CompressionLevel::DEFAULT).unwrap();
    let entries = list_entries(Algorithm::Tgz, &data).unwrap();

    let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["readme.txt", "empty.bin", "zeros.bin", "ramp.bin"]);
    let sizes: Vec<_> = entries.iter().map(|e| e.original_size).collect();
    assert_eq!(sizes, [660, 0, 5000, 3000]);
}

#[test]
fn test_directory_entry_larger_than_payload() {
    let files = vec![
        InputFile::new("x", b"hello".to_vec()),
        InputFile::new("y", b"world".to_vec()),
    ];
    let mut data = pack(Algorithm::Rar, &files, CompressionLevel::DEFAULT).unwrap();

    // Second entry's originalSize: count(4) + "x" record(7) + name "y"(3)
    data[14] = 200;
    let err = unpack(Algorithm::Rar, &data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CorruptArchive);
    assert!(ContainerReader::new(ContainerLayout::Solid, &data).is_err());
}

#[test]
fn test_truncated_archives() {
    let files = sample_files();
    for algorithm in Algorithm::ALL {
        let data = pack(algorithm, &files, CompressionLevel::DEFAULT).unwrap();
        for cut in [0, 3, data.len() / 2, data.len() - 1] {
            let err = unpack(algorithm, &data[..cut]).unwrap_err();
            assert!(
                matches!(err.kind(), ErrorKind::CorruptArchive | ErrorKind::CorruptStream),
                "{algorithm} cut {cut}: {err}"
            );
        }
    }
}

#[test]
fn test_wrong_algorithm_is_an_error_not_a_panic() {
    let files = sample_files();
    let data = pack(Algorithm::Huffman, &files, CompressionLevel::DEFAULT).unwrap();
    for algorithm in [Algorithm::Rle, Algorithm::Tar, Algorithm::Rar] {
        let _ = unpack(algorithm, &data);
    }
}
