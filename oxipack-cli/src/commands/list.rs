//! List command implementation.

use super::detect_algorithm;
use crate::utils::{matches_filters, print_entries};
use oxipack_archive::list_entries;
use oxipack_core::{Algorithm, ArchiveEntry};
use serde::Serialize;
use std::path::Path;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
struct EntryJson<'a> {
    name: &'a str,
    size: u64,
    stored_size: u64,
    ratio: f64,
    codec: &'a str,
}

impl<'a> EntryJson<'a> {
    fn from_entry(entry: &'a ArchiveEntry) -> Self {
        Self {
            name: &entry.name,
            size: entry.original_size,
            stored_size: entry.stored_size,
            ratio: entry.compression_ratio(),
            codec: entry.codec.name(),
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize)]
struct ArchiveListJson<'a> {
    archive: String,
    algorithm: Algorithm,
    entries: Vec<EntryJson<'a>>,
}

/// Options for listing archive contents.
pub struct ListOptions<'a> {
    pub archive: &'a Path,
    pub algorithm: Option<Algorithm>,
    pub verbose: bool,
    pub json: bool,
    pub include: &'a [String],
    pub exclude: &'a [String],
}

pub fn cmd_list(options: &ListOptions) -> Result<(), Box<dyn std::error::Error>> {
    let algorithm = detect_algorithm(options.archive, options.algorithm)?;
    let data = std::fs::read(options.archive)
        .map_err(|e| format!("{}: {e}", options.archive.display()))?;

    let entries: Vec<ArchiveEntry> = list_entries(algorithm, &data)?
        .into_iter()
        .filter(|e| matches_filters(&e.name, options.include, options.exclude))
        .collect();

    if options.json {
        let listing = ArchiveListJson {
            archive: options.archive.display().to_string(),
            algorithm,
            entries: entries.iter().map(EntryJson::from_entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("Archive: {} ({})", options.archive.display(), algorithm);
    println!();
    print_entries(&entries, options.verbose);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_archive::pack;
    use oxipack_core::{CompressionLevel, InputFile};

    #[test]
    fn test_list_per_entry_and_container() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            InputFile::new("a.txt", b"aaaabbbcc".to_vec()),
            InputFile::new("b.txt", b"hello".to_vec()),
        ];
        for (name, algorithm) in [("x.huf", Algorithm::Huffman), ("x.tgz", Algorithm::Tgz)] {
            let path = dir.path().join(name);
            std::fs::write(&path, pack(algorithm, &files, CompressionLevel::DEFAULT).unwrap())
                .unwrap();
            for json in [false, true] {
                cmd_list(&ListOptions {
                    archive: &path,
                    algorithm: None,
                    verbose: true,
                    json,
                    include: &[],
                    exclude: &[],
                })
                .unwrap();
            }
        }
    }

    #[test]
    fn test_list_corrupt_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.rar");
        std::fs::write(&path, [9u8, 0, 0, 0, 1]).unwrap();
        let result = cmd_list(&ListOptions {
            archive: &path,
            algorithm: None,
            verbose: false,
            json: false,
            include: &[],
            exclude: &[],
        });
        assert!(result.is_err());
    }
}
