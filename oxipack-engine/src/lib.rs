//! # OxiPack Engine
//!
//! Request orchestration for OxiPack.
//!
//! A [`CompressionRequest`] moves through
//! `Pending -> Analyzing -> Encoding -> Finalizing -> Complete` (or
//! `Failed`). Per-entry algorithms encode files in parallel on a rayon
//! pool; container algorithms make one sequential pass. Finished archives
//! wait in a bounded [`ResultStore`] until retrieved once.
//!
//! ## Example
//!
//! ```rust
//! use oxipack_core::{Algorithm, CompressionLevel, InputFile};
//! use oxipack_engine::{CancelToken, CompressionRequest, Engine, EngineConfig, NoProgress};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! let request = CompressionRequest::new(
//!     vec![InputFile::new("notes.txt", b"hello hello hello".to_vec())],
//!     Algorithm::Huffman,
//!     CompressionLevel::DEFAULT,
//! );
//! let result = engine.compress(request, &NoProgress, &CancelToken::new()).unwrap();
//! assert!(result.filename.starts_with("huffman_compressed_"));
//!
//! let archive = engine.retrieve(&result.archive_id).unwrap();
//! assert_eq!(archive.bytes.len() as u64, result.byte_size);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod state;
pub mod store;

pub use config::EngineConfig;
pub use orchestrator::{CancelToken, Engine};
pub use progress::{NoProgress, ProgressEvent, ProgressTracker, RequestObserver};
pub use request::CompressionRequest;
pub use state::{RequestState, StateMachine};
pub use store::{CompressionResult, ResultStore, StoredArchive};
