//! Error types for the pdf2md-compare library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`CompareError`] — **Fatal**: an adapter run cannot proceed at all
//!   (input directory missing, output directory cannot be created, adapter
//!   not installed). Returned as `Err(CompareError)` from the batch and
//!   dispatch entry points.
//!
//! * [`FileError`] — **Non-fatal**: a single PDF failed (tool crashed,
//!   malformed input, no markdown produced) but the rest of the batch is
//!   fine. Stored inside [`crate::output::ConversionResult`] so the batch
//!   keeps going and the caller can report every failure at the end.

use crate::adapter::AdapterId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2md-compare library.
///
/// Per-file failures use [`FileError`] and are stored in
/// [`crate::output::ConversionResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum CompareError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The input directory does not exist.
    #[error("Input directory '{path}' does not exist.")]
    InputDirNotFound { path: PathBuf },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create the output directory.
    #[error("Failed to create output directory '{path}': {source}")]
    OutputDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Adapter errors ────────────────────────────────────────────────────
    /// The adapter's external tool is not installed or not configured.
    #[error("Adapter '{adapter}' is not available: {reason}")]
    AdapterUnavailable { adapter: AdapterId, reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single input file.
///
/// The batch driver logs it, records it in the file's
/// [`crate::output::ConversionResult`] and moves on to the next file.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FileError {
    /// The input file does not exist.
    #[error("File not found: {path:?}")]
    NotFound { path: PathBuf },

    /// The file exists but does not start with the `%PDF` magic bytes.
    #[error("File is not a valid PDF: {path:?}")]
    NotAPdf { path: PathBuf },

    /// Reading the input or preparing the scratch area failed.
    #[error("I/O error on {path:?}: {detail}")]
    Io { path: PathBuf, detail: String },

    /// The external tool could not be started at all.
    #[error("Failed to launch '{program}': {detail}")]
    ToolLaunch { program: String, detail: String },

    /// The external tool ran but exited unsuccessfully.
    #[error("{tool} exited with {}: {stderr}", exit_label(.code))]
    ToolFailed {
        tool: AdapterId,
        code: Option<i32>,
        stderr: String,
    },

    /// The tool succeeded but the expected markdown file never appeared.
    #[error("{tool} produced no markdown (expected {expected:?})")]
    OutputMissing { tool: AdapterId, expected: PathBuf },

    /// The markdown produced by the tool is not valid UTF-8.
    #[error("{tool} produced non-UTF-8 markdown in {path:?}")]
    InvalidOutput { tool: AdapterId, path: PathBuf },

    /// Writing the final markdown or copying assets failed.
    #[error("Failed to write {path:?}: {detail}")]
    WriteFailed { path: PathBuf, detail: String },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (killed by signal)".to_string(),
    }
}
