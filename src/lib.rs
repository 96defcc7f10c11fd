//! # pdf2md-compare
//!
//! Run several PDF-to-Markdown converters over the same batch of PDFs and
//! collect their outputs side by side for comparison.
//!
//! No parsing, layout analysis or OCR happens here. Each converter is an
//! external tool driven as a child process:
//!
//! | Adapter       | Tool                                    | Output                  |
//! |---------------|-----------------------------------------|-------------------------|
//! | `mineru`      | `mineru` (pipeline backend)             | `{stem}_mineru.md` + `images/` |
//! | `docling`     | `docling --to md`                       | `{stem}_docling.md`     |
//! | `pdf-extract` | PDF-Extract-Kit `scripts/run_task.py`   | `{stem}_pdf_extract.md` |
//!
//! ## Flow
//!
//! ```text
//! registry ──▶ dispatch ──▶ batch driver ──▶ adapter ──▶ external tool
//! (probe tools) (per adapter) (per *.pdf)     (argv/env)   (scratch dir)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2md_compare::{run, AdapterRegistry, AdapterSettings, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = AdapterRegistry::probe(AdapterSettings::default()).await;
//!     let config = BatchConfig::builder()
//!         .input_dir("data/raw")
//!         .output_dir("data/processed")
//!         .build()?;
//!     let report = run(&config, &registry).await?;
//!     eprintln!("{} converted, {} failed", report.total_succeeded(), report.total_failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md-compare` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod adapter;
pub mod batch;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod output;
pub mod progress;
pub mod registry;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use adapter::{
    Adapter, AdapterId, AdapterSettings, ConvertedDocument, Converter, DoclingConfig,
    MinerUConfig, ModelSource, OutputNaming, PdfExtractConfig, PdfExtractTasks, ToolCommand,
};
pub use batch::{convert_file, discover_pdfs, run_batch, run_single};
pub use config::{AdapterSelection, BatchConfig, BatchConfigBuilder, FileOrder};
pub use dispatch::{run, run_sync};
pub use error::{CompareError, FileError};
pub use output::{BatchReport, ConversionJob, ConversionResult, RunReport, SkippedAdapter};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use registry::{AdapterEntry, AdapterRegistry, Availability};
