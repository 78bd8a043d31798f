//! Extract command implementation.

use super::detect_algorithm;
use crate::utils::matches_filters;
use indicatif::{ProgressBar, ProgressStyle};
use oxipack_archive::unpack;
use oxipack_core::{Algorithm, ArchiveEntry, CodecTag};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options for extracting an archive.
pub struct ExtractOptions<'a> {
    pub archive: &'a Path,
    pub output: &'a Path,
    pub algorithm: Option<Algorithm>,
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub progress: bool,
    pub verbose: bool,
}

pub fn cmd_extract(options: &ExtractOptions) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let algorithm = detect_algorithm(options.archive, options.algorithm)?;
    let data = std::fs::read(options.archive)
        .map_err(|e| format!("{}: {e}", options.archive.display()))?;
    let files = unpack(algorithm, &data)?;

    let selected: Vec<_> = files
        .into_iter()
        .filter(|f| matches_filters(f.name(), options.include, options.exclude))
        .collect();

    // Reject the whole archive before writing anything
    for file in &selected {
        ArchiveEntry::new(file.name(), file.size(), CodecTag::Stored).validate_path()?;
    }

    std::fs::create_dir_all(options.output)?;

    let pb = if options.progress {
        let pb = ProgressBar::new(selected.len() as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
        {
            pb.set_style(style);
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut written = Vec::with_capacity(selected.len());
    for file in &selected {
        let path = options.output.join(file.name());
        pb.set_message(file.name().to_string());
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, file.bytes())?;
        if options.verbose {
            pb.println(format!("  {} ({} bytes)", file.name(), file.size()));
        }
        debug!(path = %path.display(), "extracted");
        written.push(path);
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "Extracted {} of {} entries to {}",
        written.len(),
        selected.len(),
        options.output.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxipack_archive::pack;
    use oxipack_core::{CompressionLevel, InputFile};

    fn write_archive(dir: &Path, name: &str, algorithm: Algorithm, files: &[InputFile]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, pack(algorithm, files, CompressionLevel::DEFAULT).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_extract_with_filters() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            InputFile::new("keep.txt", b"keep me".to_vec()),
            InputFile::new("skip.log", b"not me".to_vec()),
        ];
        let archive = write_archive(dir.path(), "bundle.tar", Algorithm::Tar, &files);
        let out = dir.path().join("out");
        let include = vec!["*.txt".to_string()];

        let written = cmd_extract(&ExtractOptions {
            archive: &archive,
            output: &out,
            algorithm: None,
            include: &include,
            exclude: &[],
            progress: false,
            verbose: false,
        })
        .unwrap();

        assert_eq!(written, vec![out.join("keep.txt")]);
        assert_eq!(std::fs::read(out.join("keep.txt")).unwrap(), b"keep me");
        assert!(!out.join("skip.log").exists());
    }

    #[test]
    fn test_extract_nested_names() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            InputFile::new("docs/guide/readme.txt", b"nested".to_vec()),
            InputFile::new("top.txt", b"flat".to_vec()),
        ];
        let archive = write_archive(dir.path(), "tree.huf", Algorithm::Huffman, &files);
        let out = dir.path().join("out");

        let written = cmd_extract(&ExtractOptions {
            archive: &archive,
            output: &out,
            algorithm: None,
            include: &[],
            exclude: &[],
            progress: false,
            verbose: false,
        })
        .unwrap();

        assert_eq!(written.len(), 2);
        let nested = out.join("docs").join("guide").join("readme.txt");
        assert_eq!(std::fs::read(nested).unwrap(), b"nested");
        assert_eq!(std::fs::read(out.join("top.txt")).unwrap(), b"flat");
    }

    #[test]
    fn test_extract_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![InputFile::new("../escape.txt", b"nope".to_vec())];
        let archive = write_archive(dir.path(), "bad.rar", Algorithm::Rar, &files);
        let out = dir.path().join("out");

        let result = cmd_extract(&ExtractOptions {
            archive: &archive,
            output: &out,
            algorithm: None,
            include: &[],
            exclude: &[],
            progress: false,
            verbose: false,
        });
        assert!(result.is_err());
        assert!(!dir.path().join("escape.txt").exists());
    }
}
