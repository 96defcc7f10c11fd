//! Configuration types for a comparison run.
//!
//! Batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. Per-adapter knobs (tool locations, languages,
//! model weights) live in [`crate::adapter::AdapterSettings`] so the batch
//! driver never needs to know which external library it is talking to.

use crate::adapter::AdapterId;
use crate::error::CompareError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Default input directory, relative to the working directory.
pub const DEFAULT_INPUT_DIR: &str = "data/raw";

/// Default output directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "data/processed";

/// Configuration for one comparison run.
///
/// # Example
/// ```rust
/// use pdf2md_compare::{AdapterId, AdapterSelection, BatchConfig};
///
/// let config = BatchConfig::builder()
///     .input_dir("papers")
///     .output_dir("out")
///     .selection(AdapterSelection::Only(AdapterId::Docling))
///     .build()
///     .unwrap();
/// assert_eq!(config.selection.ids(), vec![AdapterId::Docling]);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Directory scanned for `*.pdf` inputs. Default: `data/raw`.
    pub input_dir: PathBuf,

    /// Directory receiving `{stem}_{adapter}.md` files. Default: `data/processed`.
    ///
    /// Created before the first write if it does not exist.
    pub output_dir: PathBuf,

    /// Which adapters run. Default: [`AdapterSelection::All`].
    pub selection: AdapterSelection,

    /// Convert only this file name (looked up inside `input_dir`) instead
    /// of the whole directory.
    pub file: Option<String>,

    /// Processing order of discovered files. Default: [`FileOrder::Sorted`].
    pub order: FileOrder,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            selection: AdapterSelection::default(),
            file: None,
            order: FileOrder::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("input_dir", &self.input_dir)
            .field("output_dir", &self.output_dir)
            .field("selection", &self.selection)
            .field("file", &self.file)
            .field("order", &self.order)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for `BatchConfig`.
    pub fn builder() -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn selection(mut self, selection: AdapterSelection) -> Self {
        self.config.selection = selection;
        self
    }

    pub fn file(mut self, name: impl Into<String>) -> Self {
        self.config.file = Some(name.into());
        self
    }

    pub fn order(mut self, order: FileOrder) -> Self {
        self.config.order = order;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, CompareError> {
        let c = &self.config;
        if c.input_dir.as_os_str().is_empty() {
            return Err(CompareError::InvalidConfig(
                "input directory must not be empty".into(),
            ));
        }
        if c.output_dir.as_os_str().is_empty() {
            return Err(CompareError::InvalidConfig(
                "output directory must not be empty".into(),
            ));
        }
        if let Some(ref name) = c.file {
            if name.trim().is_empty() {
                return Err(CompareError::InvalidConfig(
                    "file name must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Which adapters a run invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AdapterSelection {
    /// Every known adapter, in [`AdapterId::ALL`] order. (default)
    #[default]
    All,
    /// A single named adapter.
    Only(AdapterId),
}

impl AdapterSelection {
    /// The adapters to run, in run order.
    pub fn ids(&self) -> Vec<AdapterId> {
        match self {
            AdapterSelection::All => AdapterId::ALL.to_vec(),
            AdapterSelection::Only(id) => vec![*id],
        }
    }
}

/// Order in which discovered PDFs are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FileOrder {
    /// Sorted by file name, so repeated runs visit files identically. (default)
    #[default]
    Sorted,
    /// Whatever order the directory listing yields.
    Filesystem,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_data_layout() {
        let c = BatchConfig::default();
        assert_eq!(c.input_dir, PathBuf::from("data/raw"));
        assert_eq!(c.output_dir, PathBuf::from("data/processed"));
        assert_eq!(c.selection, AdapterSelection::All);
        assert_eq!(c.order, FileOrder::Sorted);
        assert!(c.file.is_none());
    }

    #[test]
    fn all_selection_runs_every_adapter_in_order() {
        assert_eq!(
            AdapterSelection::All.ids(),
            vec![AdapterId::MinerU, AdapterId::Docling, AdapterId::PdfExtract]
        );
    }

    #[test]
    fn empty_file_name_rejected() {
        let err = BatchConfig::builder().file("  ").build().unwrap_err();
        assert!(matches!(err, CompareError::InvalidConfig(_)));
    }

    #[test]
    fn empty_output_dir_rejected() {
        let err = BatchConfig::builder().output_dir("").build().unwrap_err();
        assert!(err.to_string().contains("output directory"));
    }

    #[test]
    fn debug_hides_callback() {
        use crate::progress::NoopProgressCallback;
        use std::sync::Arc;

        let c = BatchConfig::builder()
            .progress_callback(Arc::new(NoopProgressCallback))
            .build()
            .unwrap();
        let dbg = format!("{c:?}");
        assert!(dbg.contains("<dyn BatchProgressCallback>"), "got: {dbg}");
    }
}
