//! Create command implementation.

use crate::utils::create_progress_bar;
use indicatif::ProgressBar;
use oxipack_core::{Algorithm, CompressionLevel, InputFile, sanitize_name};
use oxipack_engine::{
    CancelToken, CompressionRequest, Engine, EngineConfig, ProgressEvent, RequestObserver,
    RequestState,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options for creating an archive.
pub struct CreateOptions<'a> {
    pub output: &'a Path,
    pub files: &'a [PathBuf],
    pub algorithm: Option<Algorithm>,
    pub level: u8,
    pub progress: bool,
    pub verbose: bool,
}

struct BarObserver(ProgressBar);

impl RequestObserver for BarObserver {
    fn on_progress(&self, event: ProgressEvent) {
        self.0.set_position(event.bytes_done);
    }

    fn on_state(&self, state: RequestState) {
        self.0.set_message(state.name());
    }
}

fn read_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>, Box<dyn std::error::Error>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        if path.is_dir() {
            return Err(format!("{} is a directory; pass files individually", path.display()).into());
        }
        let raw_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("{} has no usable file name", path.display()))?;
        let bytes = std::fs::read(path).map_err(|e| format!("{}: {e}", path.display()))?;
        files.push(InputFile::new(sanitize_name(raw_name)?, bytes));
    }
    Ok(files)
}

/// Resolve the algorithm and the path to write.
///
/// An existing directory as output receives the engine's suggested name.
fn resolve_output(
    output: &Path,
    algorithm: Option<Algorithm>,
) -> Result<(Algorithm, Option<PathBuf>), Box<dyn std::error::Error>> {
    if output.is_dir() {
        return Ok((algorithm.unwrap_or(Algorithm::Huffman), None));
    }
    let from_name = output
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(Algorithm::from_file_name);
    let algorithm = algorithm
        .or(from_name)
        .ok_or("cannot infer algorithm from output name; use --algorithm")?;
    Ok((algorithm, Some(output.to_path_buf())))
}

pub fn cmd_create(
    options: &CreateOptions,
    engine_config: EngineConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if options.files.is_empty() {
        return Err("no input files given".into());
    }

    let (algorithm, target) = resolve_output(options.output, options.algorithm)?;
    let files = read_inputs(options.files)?;
    let level = CompressionLevel::new(options.level);
    let request = CompressionRequest::new(files, algorithm, level);
    let total = request.total_bytes();

    let engine = Engine::new(engine_config)?;
    let bar = create_progress_bar(total, options.progress);
    let observer = BarObserver(bar.clone());
    let archive_id = Engine::new_archive_id();

    let result = engine.compress_as(archive_id, request, &observer, &CancelToken::new());
    bar.finish_and_clear();
    let result = result?;

    let archive = engine.retrieve(&result.archive_id)?;
    let path = target.unwrap_or_else(|| options.output.join(&archive.filename));
    std::fs::write(&path, &archive.bytes)?;
    debug!(path = %path.display(), bytes = archive.bytes.len(), "archive written");

    if options.verbose {
        let ratio = if total > 0 {
            result.byte_size as f64 / total as f64 * 100.0
        } else {
            0.0
        };
        println!(
            "Created {} ({} files, {} -> {} bytes, {:.1}%, {} level {})",
            path.display(),
            options.files.len(),
            total,
            result.byte_size,
            ratio,
            algorithm,
            level
        );
    } else {
        println!("{}", path.display());
    }
    Ok(())
}
