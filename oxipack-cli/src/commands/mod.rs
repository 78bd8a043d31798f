//! Command implementations for OxiPack CLI.

pub mod create;
pub mod extract;
pub mod list;
pub mod serve;

pub use create::{CreateOptions, cmd_create};
pub use extract::{ExtractOptions, cmd_extract};
pub use list::{ListOptions, cmd_list};
pub use serve::cmd_serve;

use oxipack_core::Algorithm;
use std::path::Path;

/// Algorithm for an existing archive: the explicit choice, else its extension.
pub fn detect_algorithm(
    archive: &Path,
    explicit: Option<Algorithm>,
) -> Result<Algorithm, Box<dyn std::error::Error>> {
    if let Some(algorithm) = explicit {
        return Ok(algorithm);
    }
    archive
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(Algorithm::from_file_name)
        .ok_or_else(|| {
            format!(
                "cannot detect algorithm of {}; use --algorithm",
                archive.display()
            )
            .into()
        })
}
