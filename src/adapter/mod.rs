//! Adapters: one per external PDF-to-Markdown library.
//!
//! Each adapter only marshals a [`ConversionJob`] into the command line its
//! tool expects and pulls the resulting markdown back out. Writing the final
//! `{stem}_{suffix}.md` file, copying images and isolating failures is the
//! batch driver's job ([`crate::batch`]), so all three share one contract.
//!
//! ```text
//! ConversionJob ──▶ adapter ──▶ external tool (scratch dir) ──▶ ConvertedDocument
//!                   docling      docling --to md
//!                   mineru       mineru -b pipeline
//!                   pdf-extract  python scripts/run_task.py --config …
//! ```

pub mod docling;
pub mod mineru;
pub mod pdf_extract;
pub mod process;

pub use docling::{DoclingAdapter, DoclingConfig};
pub use mineru::{MinerUAdapter, MinerUConfig, ModelSource};
pub use pdf_extract::{
    FormulaDetectionConfig, FormulaRecognitionConfig, LayoutDetectionConfig, OcrConfig,
    OutputNaming, PdfExtractAdapter, PdfExtractConfig, PdfExtractTasks,
};
pub use process::ToolCommand;

use crate::error::FileError;
use crate::output::ConversionJob;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Identifies one of the three wrapped libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AdapterId {
    #[serde(rename = "mineru")]
    MinerU,
    #[serde(rename = "docling")]
    Docling,
    #[serde(rename = "pdf-extract")]
    PdfExtract,
}

impl AdapterId {
    /// Every adapter, in the order a full run visits them.
    pub const ALL: [AdapterId; 3] = [AdapterId::MinerU, AdapterId::Docling, AdapterId::PdfExtract];

    /// Identifier used on the command line and in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterId::MinerU => "mineru",
            AdapterId::Docling => "docling",
            AdapterId::PdfExtract => "pdf-extract",
        }
    }

    /// Suffix appended to the input stem: `report.pdf` → `report_{suffix}.md`.
    pub fn suffix(&self) -> &'static str {
        match self {
            AdapterId::MinerU => "mineru",
            AdapterId::Docling => "docling",
            AdapterId::PdfExtract => "pdf_extract",
        }
    }

    /// Display name of the wrapped library.
    pub fn label(&self) -> &'static str {
        match self {
            AdapterId::MinerU => "MinerU",
            AdapterId::Docling => "Docling",
            AdapterId::PdfExtract => "PDF-Extract-Kit",
        }
    }

    /// `{stem}_{suffix}.md`
    pub fn markdown_file_name(&self, stem: &str) -> String {
        format!("{stem}_{}.md", self.suffix())
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mineru" => Ok(AdapterId::MinerU),
            "docling" => Ok(AdapterId::Docling),
            "pdf-extract" | "pdf_extract" | "pdf-extract-kit" => Ok(AdapterId::PdfExtract),
            other => Err(format!(
                "unknown adapter '{other}' (expected mineru, docling or pdf-extract)"
            )),
        }
    }
}

/// Markdown produced by an external tool for one job, still inside the
/// job's scratch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    pub markdown: String,
    /// Directory of images referenced by `markdown` as `images/…`.
    pub images_dir: Option<PathBuf>,
}

/// Single-file conversion contract shared by every adapter.
///
/// Implementations run their tool against `job.input`, may write anything
/// under `job.scratch_dir`, and return the markdown. They never write to
/// `job.output_dir` themselves.
pub trait Converter: Send + Sync {
    fn id(&self) -> AdapterId;

    /// Final file name for a document with the given stem.
    fn output_file_name(&self, stem: &str) -> String {
        self.id().markdown_file_name(stem)
    }

    fn convert(
        &self,
        job: &ConversionJob,
    ) -> impl Future<Output = Result<ConvertedDocument, FileError>> + Send;
}

/// Tool configuration for all adapters, built once per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdapterSettings {
    pub docling: DoclingConfig,
    pub mineru: MinerUConfig,
    pub pdf_extract: PdfExtractConfig,
}

/// A constructed adapter, as handed out by [`crate::registry::AdapterRegistry`].
#[derive(Debug, Clone)]
pub enum Adapter {
    Docling(DoclingAdapter),
    MinerU(MinerUAdapter),
    PdfExtract(PdfExtractAdapter),
}

impl Adapter {
    /// Construct the adapter for `id` from the run's settings.
    pub fn new(id: AdapterId, settings: &AdapterSettings) -> Self {
        match id {
            AdapterId::Docling => Adapter::Docling(DoclingAdapter::new(settings.docling.clone())),
            AdapterId::MinerU => Adapter::MinerU(MinerUAdapter::new(settings.mineru.clone())),
            AdapterId::PdfExtract => {
                Adapter::PdfExtract(PdfExtractAdapter::new(settings.pdf_extract.clone()))
            }
        }
    }
}

impl Converter for Adapter {
    fn id(&self) -> AdapterId {
        match self {
            Adapter::Docling(a) => a.id(),
            Adapter::MinerU(a) => a.id(),
            Adapter::PdfExtract(a) => a.id(),
        }
    }

    fn output_file_name(&self, stem: &str) -> String {
        match self {
            Adapter::Docling(a) => a.output_file_name(stem),
            Adapter::MinerU(a) => a.output_file_name(stem),
            Adapter::PdfExtract(a) => a.output_file_name(stem),
        }
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConvertedDocument, FileError> {
        match self {
            Adapter::Docling(a) => a.convert(job).await,
            Adapter::MinerU(a) => a.convert(job).await,
            Adapter::PdfExtract(a) => a.convert(job).await,
        }
    }
}

// ── Shared helpers ───────────────────────────────────────────────────────

/// Find `file_name` anywhere below `root`, breadth first.
///
/// Tools nest their output differently (`<stem>/auto/<stem>.md` for MinerU,
/// flat for Docling), so adapters search instead of hard-coding layouts.
pub(crate) async fn locate_file(root: &Path, file_name: &str) -> Option<PathBuf> {
    let mut queue = std::collections::VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = queue.pop_front() {
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            continue;
        };
        let mut subdirs = Vec::new();
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            match entry.file_type().await {
                Ok(ft) if ft.is_dir() => subdirs.push(path),
                Ok(ft) if ft.is_file() && entry.file_name() == file_name => return Some(path),
                _ => {}
            }
        }
        subdirs.sort();
        queue.extend(subdirs);
    }
    None
}

/// Locate `{stem}.md` under the job's scratch dir and read it.
pub(crate) async fn read_tool_markdown(
    tool: AdapterId,
    job: &ConversionJob,
) -> Result<(String, PathBuf), FileError> {
    let file_name = format!("{}.md", job.stem());
    let path = locate_file(&job.scratch_dir, &file_name)
        .await
        .ok_or_else(|| FileError::OutputMissing {
            tool,
            expected: job.scratch_dir.join(&file_name),
        })?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| FileError::Io {
        path: path.clone(),
        detail: e.to_string(),
    })?;
    let markdown =
        String::from_utf8(bytes).map_err(|_| FileError::InvalidOutput {
            tool,
            path: path.clone(),
        })?;

    debug!("[{}] read {} bytes from {}", tool, markdown.len(), path.display());
    Ok((markdown, path))
}

/// `images/` beside the markdown file, if the tool wrote one.
pub(crate) async fn sibling_images_dir(markdown_path: &Path) -> Option<PathBuf> {
    let dir = markdown_path.parent()?.join("images");
    match tokio::fs::metadata(&dir).await {
        Ok(meta) if meta.is_dir() => Some(dir),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn adapter_id_round_trips_through_str() {
        for id in AdapterId::ALL {
            assert_eq!(id.as_str().parse::<AdapterId>().unwrap(), id);
        }
        assert_eq!("PDF_EXTRACT".parse::<AdapterId>().unwrap(), AdapterId::PdfExtract);
        assert!("marker".parse::<AdapterId>().is_err());
    }

    #[test]
    fn markdown_names_use_suffix() {
        assert_eq!(AdapterId::Docling.markdown_file_name("report"), "report_docling.md");
        assert_eq!(AdapterId::MinerU.markdown_file_name("report"), "report_mineru.md");
        assert_eq!(
            AdapterId::PdfExtract.markdown_file_name("report"),
            "report_pdf_extract.md"
        );
    }

    #[test]
    fn serde_uses_cli_names() {
        let json = serde_json::to_string(&AdapterId::PdfExtract).unwrap();
        assert_eq!(json, "\"pdf-extract\"");
        let back: AdapterId = serde_json::from_str("\"mineru\"").unwrap();
        assert_eq!(back, AdapterId::MinerU);
    }

    #[tokio::test]
    async fn locate_file_finds_nested_markdown() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("paper").join("auto");
        std::fs::create_dir_all(nested.join("images")).unwrap();
        std::fs::write(nested.join("paper.md"), "# Paper\n").unwrap();
        std::fs::write(tmp.path().join("paper.json"), "{}").unwrap();

        let found = locate_file(tmp.path(), "paper.md").await.unwrap();
        assert_eq!(found, nested.join("paper.md"));
        assert_eq!(
            sibling_images_dir(&found).await,
            Some(nested.join("images"))
        );
        assert!(locate_file(tmp.path(), "other.md").await.is_none());
    }

    #[tokio::test]
    async fn read_tool_markdown_reports_missing_output() {
        let tmp = TempDir::new().unwrap();
        let job = ConversionJob {
            input: PathBuf::from("in/report.pdf"),
            output_dir: PathBuf::from("out"),
            adapter: AdapterId::Docling,
            scratch_dir: tmp.path().to_path_buf(),
        };
        let err = read_tool_markdown(AdapterId::Docling, &job).await.unwrap_err();
        assert!(matches!(err, FileError::OutputMissing { .. }), "got: {err:?}");
    }
}
