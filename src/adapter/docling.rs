//! Docling adapter: `docling <pdf> --to md --output <dir>`.

use crate::adapter::process::{run_tool, ToolCommand};
use crate::adapter::{read_tool_markdown, AdapterId, ConvertedDocument, Converter};
use crate::error::FileError;
use crate::output::ConversionJob;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoclingConfig {
    /// Default: `docling` on PATH.
    pub command: ToolCommand,
    /// Appended after the standard arguments, e.g. `["--no-ocr"]`.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for DoclingConfig {
    fn default() -> Self {
        Self {
            command: ToolCommand::new("docling"),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DoclingAdapter {
    config: DoclingConfig,
}

impl DoclingAdapter {
    pub fn new(config: DoclingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DoclingConfig {
        &self.config
    }
}

impl Converter for DoclingAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::Docling
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConvertedDocument, FileError> {
        let mut cmd = self.config.command.command();
        cmd.arg(&job.input)
            .args(["--to", "md", "--output"])
            .arg(&job.scratch_dir)
            .args(&self.config.extra_args);

        run_tool(AdapterId::Docling, cmd).await?;

        let (markdown, _) = read_tool_markdown(AdapterId::Docling, job).await?;
        if markdown.trim().is_empty() {
            warn!("[docling] {} produced empty markdown", job.file_name());
        }

        Ok(ConvertedDocument {
            markdown,
            images_dir: None,
        })
    }
}
