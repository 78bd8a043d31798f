//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use oxipack_core::ArchiveEntry;
use oxipack_server::ServerConfig;
use std::path::Path;

/// Create a byte progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Load a JSON config file, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
            Ok(ServerConfig::from_json(&text)?)
        }
        None => Ok(ServerConfig::default()),
    }
}

/// Check if a name matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern: &String| Pattern::new(pattern).is_ok_and(|p| p.matches(name));

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Print entries, as a table when verbose.
pub fn print_entries(entries: &[ArchiveEntry], verbose: bool) {
    if !verbose {
        for entry in entries {
            println!("{}", entry.name);
        }
        return;
    }

    println!(
        "{:>10} {:>10} {:>6} {:>8}  Name",
        "Size", "Stored", "Ratio", "Codec",
    );
    println!("{}", "-".repeat(60));

    let mut total_size = 0u64;
    let mut total_stored = 0u64;

    for entry in entries {
        let ratio = if entry.original_size > 0 {
            format!("{:.1}%", entry.compression_ratio() * 100.0)
        } else {
            "-".to_string()
        };

        println!(
            "{:>10} {:>10} {:>6} {:>8}  {}",
            entry.original_size, entry.stored_size, ratio, entry.codec, entry.name
        );

        total_size += entry.original_size;
        total_stored += entry.stored_size;
    }

    println!("{}", "-".repeat(60));
    let total_ratio = if total_size > 0 {
        total_stored as f64 / total_size as f64 * 100.0
    } else {
        0.0
    };
    println!(
        "{:>10} {:>10} {:>5.1}%          {} files",
        total_size,
        total_stored,
        total_ratio,
        entries.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters() {
        let include = vec!["*.txt".to_string()];
        let exclude = vec!["secret*".to_string()];
        assert!(matches_filters("notes.txt", &include, &exclude));
        assert!(!matches_filters("notes.bin", &include, &exclude));
        assert!(!matches_filters("secret.txt", &include, &exclude));
        assert!(matches_filters("anything", &[], &[]));
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oxipack.json");
        std::fs::write(&path, r#"{"bind": "0.0.0.0:9000", "engine": {"store_capacity": 8}}"#)
            .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.engine.store_capacity, 8);

        assert_eq!(load_config(None).unwrap(), ServerConfig::default());
        assert!(load_config(Some(&dir.path().join("missing.json"))).is_err());
    }
}
