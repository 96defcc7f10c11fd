//! Jobs and results exchanged between the batch driver and its callers.

use crate::adapter::AdapterId;
use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One file handed to one adapter.
///
/// Created by the batch driver for each input and consumed once. The
/// `scratch_dir` is a private, empty directory the external tool may fill
/// freely; it is removed when the job finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub adapter: AdapterId,
    pub scratch_dir: PathBuf,
}

impl ConversionJob {
    /// File name of the input without its extension.
    pub fn stem(&self) -> String {
        file_stem(&self.input)
    }

    /// File name of the input, for log lines.
    pub fn file_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string())
    }
}

/// Lossy file stem, `"document"` when the path has none.
pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Outcome of converting one file with one adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    /// The PDF that was converted.
    pub input: PathBuf,
    /// Adapter that handled it.
    pub adapter: AdapterId,
    /// Markdown written on success.
    pub output: Option<PathBuf>,
    /// Wall-clock time spent on this file, including the external tool.
    pub elapsed_ms: u64,
    /// Why the file failed, if it did.
    pub error: Option<FileError>,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.output.is_some()
    }
}

/// Every file one adapter attempted during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub adapter: AdapterId,
    pub input_dir: PathBuf,
    pub results: Vec<ConversionResult>,
    pub total_duration_ms: u64,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// The batch found nothing to convert.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// An adapter the dispatcher did not run, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedAdapter {
    pub adapter: AdapterId,
    pub reason: String,
}

/// Everything a run did, adapter by adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub batches: Vec<BatchReport>,
    pub skipped: Vec<SkippedAdapter>,
}

impl RunReport {
    pub fn total_succeeded(&self) -> usize {
        self.batches.iter().map(BatchReport::succeeded).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.batches.iter().map(BatchReport::failed).sum()
    }

    /// Report for one adapter, if it ran.
    pub fn batch(&self, adapter: AdapterId) -> Option<&BatchReport> {
        self.batches.iter().find(|b| b.adapter == adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(ok: bool) -> ConversionResult {
        ConversionResult {
            input: PathBuf::from("a.pdf"),
            adapter: AdapterId::Docling,
            output: ok.then(|| PathBuf::from("a_docling.md")),
            elapsed_ms: 10,
            error: (!ok).then(|| FileError::NotFound {
                path: PathBuf::from("a.pdf"),
            }),
        }
    }

    #[test]
    fn job_stem_and_name() {
        let job = ConversionJob {
            input: PathBuf::from("data/raw/report.final.pdf"),
            output_dir: PathBuf::from("out"),
            adapter: AdapterId::Docling,
            scratch_dir: PathBuf::from("/tmp/x"),
        };
        assert_eq!(job.stem(), "report.final");
        assert_eq!(job.file_name(), "report.final.pdf");
    }

    #[test]
    fn batch_counts() {
        let report = BatchReport {
            adapter: AdapterId::Docling,
            input_dir: PathBuf::from("in"),
            results: vec![result(true), result(false), result(true)],
            total_duration_ms: 30,
        };
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_empty());
    }

    #[test]
    fn run_report_totals_and_lookup() {
        let run = RunReport {
            batches: vec![BatchReport {
                adapter: AdapterId::Docling,
                input_dir: PathBuf::from("in"),
                results: vec![result(true), result(false)],
                total_duration_ms: 5,
            }],
            skipped: vec![SkippedAdapter {
                adapter: AdapterId::MinerU,
                reason: "not installed".into(),
            }],
        };
        assert_eq!(run.total_succeeded(), 1);
        assert_eq!(run.total_failed(), 1);
        assert!(run.batch(AdapterId::Docling).is_some());
        assert!(run.batch(AdapterId::MinerU).is_none());

        let json = serde_json::to_string(&run).unwrap();
        assert!(json.contains("\"mineru\""), "got: {json}");
    }
}
