//! MinerU adapter: runs the `mineru` pipeline backend on one PDF.
//!
//! MinerU reads two environment variables at start-up: the path of its
//! tools-config JSON and where to fetch model weights from. Both are part of
//! [`MinerUConfig`] and are set on the child process only, so one run can
//! point MinerU at a local model cache without leaking that choice into
//! anything else the process spawns.

use crate::adapter::process::{run_tool, ToolCommand};
use crate::adapter::{
    read_tool_markdown, sibling_images_dir, AdapterId, ConvertedDocument, Converter,
};
use crate::error::FileError;
use crate::output::ConversionJob;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable MinerU reads for its tools-config JSON.
pub const TOOLS_CONFIG_ENV: &str = "MINERU_TOOLS_CONFIG_JSON";

/// Environment variable MinerU reads for its model source.
pub const MODEL_SOURCE_ENV: &str = "MINERU_MODEL_SOURCE";

/// Where MinerU loads model weights from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSource {
    /// MinerU's own default (downloads from HuggingFace).
    #[default]
    Huggingface,
    Modelscope,
    /// Weights already present under the paths in the tools-config JSON.
    Local,
}

impl ModelSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSource::Huggingface => "huggingface",
            ModelSource::Modelscope => "modelscope",
            ModelSource::Local => "local",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinerUConfig {
    /// Default: `mineru` on PATH.
    pub command: ToolCommand,
    /// OCR language hint. Default: `ch`.
    pub lang: String,
    /// Inference device, e.g. `cpu`, `cuda`, `mps`. Default: `cpu`.
    pub device: String,
    /// Default: `pipeline`.
    pub backend: String,
    /// `auto`, `txt` or `ocr`. Default: `auto`.
    pub parse_method: String,
    pub formula_enable: bool,
    pub table_enable: bool,
    /// Passed to the child as `MINERU_TOOLS_CONFIG_JSON`.
    pub tools_config_json: Option<PathBuf>,
    /// Passed to the child as `MINERU_MODEL_SOURCE` when not the default.
    pub model_source: ModelSource,
}

impl Default for MinerUConfig {
    fn default() -> Self {
        Self {
            command: ToolCommand::new("mineru"),
            lang: "ch".to_string(),
            device: "cpu".to_string(),
            backend: "pipeline".to_string(),
            parse_method: "auto".to_string(),
            formula_enable: true,
            table_enable: true,
            tools_config_json: None,
            model_source: ModelSource::default(),
        }
    }
}

impl MinerUConfig {
    /// Defaults, plus local-model detection under `root`.
    ///
    /// If `root/mineru.json` exists it becomes the tools config. If
    /// `root/models` also exists and is non-empty, models are loaded
    /// locally; otherwise a warning suggests downloading them.
    pub fn from_project_root(root: &Path) -> Self {
        let mut config = Self::default();
        let config_file = root.join("mineru.json");
        if !config_file.is_file() {
            return config;
        }
        config.tools_config_json = Some(config_file);

        let models_dir = root.join("models");
        let has_models = std::fs::read_dir(&models_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
        if has_models {
            config.model_source = ModelSource::Local;
        } else {
            warn!(
                "MinerU models directory empty or not found at {}; models will be fetched remotely",
                models_dir.display()
            );
        }
        config
    }

    /// Child-process environment overrides.
    pub fn child_env(&self) -> Vec<(&'static str, String)> {
        let mut env = Vec::new();
        if let Some(ref path) = self.tools_config_json {
            env.push((TOOLS_CONFIG_ENV, path.display().to_string()));
        }
        if self.model_source != ModelSource::default() {
            env.push((MODEL_SOURCE_ENV, self.model_source.as_str().to_string()));
        }
        env
    }
}

#[derive(Debug, Clone)]
pub struct MinerUAdapter {
    config: MinerUConfig,
}

impl MinerUAdapter {
    pub fn new(config: MinerUConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MinerUConfig {
        &self.config
    }
}

impl Converter for MinerUAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::MinerU
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConvertedDocument, FileError> {
        let c = &self.config;
        let mut cmd = c.command.command();
        cmd.arg("-p")
            .arg(&job.input)
            .arg("-o")
            .arg(&job.scratch_dir)
            .args(["-m", c.parse_method.as_str()])
            .args(["-b", c.backend.as_str()])
            .args(["-l", c.lang.as_str()])
            .args(["-d", c.device.as_str()])
            .args(["-f", bool_flag(c.formula_enable)])
            .args(["-t", bool_flag(c.table_enable)]);
        for (key, value) in c.child_env() {
            cmd.env(key, value);
        }

        run_tool(AdapterId::MinerU, cmd).await?;

        let (markdown, md_path) = read_tool_markdown(AdapterId::MinerU, job).await?;
        let images_dir = sibling_images_dir(&md_path).await;
        if let Some(ref dir) = images_dir {
            info!("[mineru] images for {} in {}", job.file_name(), dir.display());
        }

        Ok(ConvertedDocument {
            markdown,
            images_dir,
        })
    }
}

fn bool_flag(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_follow_pipeline_backend() {
        let c = MinerUConfig::default();
        assert_eq!(c.lang, "ch");
        assert_eq!(c.device, "cpu");
        assert_eq!(c.backend, "pipeline");
        assert_eq!(c.parse_method, "auto");
        assert!(c.formula_enable && c.table_enable);
        assert!(c.child_env().is_empty());
    }

    #[test]
    fn project_root_without_config_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(MinerUConfig::from_project_root(tmp.path()), MinerUConfig::default());
    }

    #[test]
    fn project_root_with_config_but_no_models() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("mineru.json"), "{}").unwrap();
        std::fs::create_dir(tmp.path().join("models")).unwrap();

        let c = MinerUConfig::from_project_root(tmp.path());
        assert_eq!(c.tools_config_json, Some(tmp.path().join("mineru.json")));
        assert_eq!(c.model_source, ModelSource::Huggingface);
        assert_eq!(c.child_env().len(), 1);
    }

    #[test]
    fn project_root_with_models_uses_local_source() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("mineru.json"), "{}").unwrap();
        std::fs::create_dir_all(tmp.path().join("models/Layout")).unwrap();

        let c = MinerUConfig::from_project_root(tmp.path());
        assert_eq!(c.model_source, ModelSource::Local);
        let env = c.child_env();
        assert!(env.contains(&(MODEL_SOURCE_ENV, "local".to_string())));
        assert!(env.iter().any(|(k, _)| *k == TOOLS_CONFIG_ENV));
    }
}
