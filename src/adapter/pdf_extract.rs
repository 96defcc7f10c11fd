//! PDF-Extract-Kit adapter.
//!
//! The kit is driven by a task file naming one model per sub-task (layout
//! detection, formula detection, formula recognition, OCR) together with its
//! thresholds and weight paths. That file is generated per job from the
//! typed [`PdfExtractTasks`] and handed to the kit's `scripts/run_task.py`.
//! JSON is valid YAML, so the runner's YAML loader reads it unchanged.

use crate::adapter::process::{run_tool, ToolCommand};
use crate::adapter::{
    read_tool_markdown, sibling_images_dir, AdapterId, ConvertedDocument, Converter,
};
use crate::error::FileError;
use crate::output::ConversionJob;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runner script, relative to the kit root.
pub const RUNNER_SCRIPT: &str = "scripts/run_task.py";

/// Task file written into each job's scratch directory.
const TASK_FILE_NAME: &str = "pdf2markdown.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutDetectionConfig {
    pub model: String,
    pub img_size: u32,
    pub conf_thres: f64,
    pub iou_thres: f64,
    /// Relative paths resolve against [`PdfExtractConfig::models_root`].
    pub model_path: PathBuf,
}

impl Default for LayoutDetectionConfig {
    fn default() -> Self {
        Self {
            model: "layout_detection_yolo".into(),
            img_size: 1024,
            conf_thres: 0.25,
            iou_thres: 0.45,
            model_path: PathBuf::from("Layout/YOLO/doclayout_yolo_ft.pt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaDetectionConfig {
    pub model: String,
    pub img_size: u32,
    pub conf_thres: f64,
    pub iou_thres: f64,
    pub batch_size: u32,
    pub model_path: PathBuf,
}

impl Default for FormulaDetectionConfig {
    fn default() -> Self {
        Self {
            model: "formula_detection_yolo".into(),
            img_size: 1280,
            conf_thres: 0.25,
            iou_thres: 0.45,
            batch_size: 1,
            model_path: PathBuf::from("MFD/YOLO/yolo_v8_ft.pt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRecognitionConfig {
    pub model: String,
    pub batch_size: u32,
    /// Relative paths resolve against [`PdfExtractConfig::kit_root`].
    pub cfg_path: PathBuf,
    pub model_path: PathBuf,
}

impl Default for FormulaRecognitionConfig {
    fn default() -> Self {
        Self {
            model: "formula_recognition_unimernet".into(),
            batch_size: 128,
            cfg_path: PathBuf::from("pdf_extract_kit/configs/unimernet.yaml"),
            model_path: PathBuf::from("MFR/unimernet_tiny"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    pub model: String,
    pub lang: String,
    pub show_log: bool,
    pub det_model_dir: PathBuf,
    pub rec_model_dir: PathBuf,
    pub det_db_box_thresh: f64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            model: "ocr_ppocr".into(),
            lang: "ch".into(),
            show_log: true,
            det_model_dir: PathBuf::from("OCR/PaddleOCR/det/ch_PP-OCRv4_det"),
            rec_model_dir: PathBuf::from("OCR/PaddleOCR/rec/ch_PP-OCRv4_rec"),
            det_db_box_thresh: 0.3,
        }
    }
}

/// One record per sub-task. `None` leaves the task out of the task file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfExtractTasks {
    pub layout_detection: Option<LayoutDetectionConfig>,
    pub formula_detection: Option<FormulaDetectionConfig>,
    pub formula_recognition: Option<FormulaRecognitionConfig>,
    pub ocr: Option<OcrConfig>,
}

impl Default for PdfExtractTasks {
    fn default() -> Self {
        Self {
            layout_detection: Some(LayoutDetectionConfig::default()),
            formula_detection: Some(FormulaDetectionConfig::default()),
            formula_recognition: Some(FormulaRecognitionConfig::default()),
            ocr: Some(OcrConfig::default()),
        }
    }
}

/// What the final markdown file is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputNaming {
    /// `{stem}_pdf_extract.md`, consistent with the other adapters. (default)
    #[default]
    Suffixed,
    /// `{stem}.md`, the kit's own name.
    Native,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfExtractConfig {
    /// Default: `python3` on PATH.
    pub python: ToolCommand,
    /// Checkout of PDF-Extract-Kit. Default: `src/PDF-Extract-Kit-main`.
    pub kit_root: PathBuf,
    /// Root of downloaded weights. Default: `models/models`.
    pub models_root: PathBuf,
    pub tasks: PdfExtractTasks,
    pub visualize: bool,
    pub merge2markdown: bool,
    pub naming: OutputNaming,
}

impl Default for PdfExtractConfig {
    fn default() -> Self {
        Self {
            python: ToolCommand::new("python3"),
            kit_root: PathBuf::from("src/PDF-Extract-Kit-main"),
            models_root: PathBuf::from("models/models"),
            tasks: PdfExtractTasks::default(),
            visualize: false,
            merge2markdown: true,
            naming: OutputNaming::default(),
        }
    }
}

impl PdfExtractConfig {
    pub fn runner_script(&self) -> PathBuf {
        self.kit_root.join(RUNNER_SCRIPT)
    }

    /// Copy with `kit_root` and `models_root` made absolute, since the
    /// runner executes with the kit root as its working directory.
    pub fn resolved(&self) -> std::io::Result<PdfExtractConfig> {
        Ok(PdfExtractConfig {
            kit_root: std::path::absolute(&self.kit_root)?,
            models_root: std::path::absolute(&self.models_root)?,
            ..self.clone()
        })
    }

    /// The task document for one input, with every weight path resolved.
    pub fn task_document(&self, input: &Path, outputs: &Path) -> Value {
        let models = |p: &Path| self.models_root.join(p).display().to_string();
        let kit = |p: &Path| self.kit_root.join(p).display().to_string();

        let mut tasks = serde_json::Map::new();
        if let Some(ref t) = self.tasks.layout_detection {
            tasks.insert(
                "layout_detection".into(),
                json!({
                    "model": t.model,
                    "model_config": {
                        "img_size": t.img_size,
                        "conf_thres": t.conf_thres,
                        "iou_thres": t.iou_thres,
                        "model_path": models(&t.model_path),
                    }
                }),
            );
        }
        if let Some(ref t) = self.tasks.formula_detection {
            tasks.insert(
                "formula_detection".into(),
                json!({
                    "model": t.model,
                    "model_config": {
                        "img_size": t.img_size,
                        "conf_thres": t.conf_thres,
                        "iou_thres": t.iou_thres,
                        "batch_size": t.batch_size,
                        "model_path": models(&t.model_path),
                    }
                }),
            );
        }
        if let Some(ref t) = self.tasks.formula_recognition {
            tasks.insert(
                "formula_recognition".into(),
                json!({
                    "model": t.model,
                    "model_config": {
                        "batch_size": t.batch_size,
                        "cfg_path": kit(&t.cfg_path),
                        "model_path": models(&t.model_path),
                    }
                }),
            );
        }
        if let Some(ref t) = self.tasks.ocr {
            tasks.insert(
                "ocr".into(),
                json!({
                    "model": t.model,
                    "model_config": {
                        "lang": t.lang,
                        "show_log": t.show_log,
                        "det_model_dir": models(&t.det_model_dir),
                        "rec_model_dir": models(&t.rec_model_dir),
                        "det_db_box_thresh": t.det_db_box_thresh,
                    }
                }),
            );
        }

        json!({
            "inputs": input.display().to_string(),
            "outputs": outputs.display().to_string(),
            "visualize": self.visualize,
            "merge2markdown": self.merge2markdown,
            "tasks": Value::Object(tasks),
        })
    }
}

#[derive(Debug, Clone)]
pub struct PdfExtractAdapter {
    config: PdfExtractConfig,
}

impl PdfExtractAdapter {
    pub fn new(config: PdfExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PdfExtractConfig {
        &self.config
    }
}

impl Converter for PdfExtractAdapter {
    fn id(&self) -> AdapterId {
        AdapterId::PdfExtract
    }

    fn output_file_name(&self, stem: &str) -> String {
        match self.config.naming {
            OutputNaming::Suffixed => AdapterId::PdfExtract.markdown_file_name(stem),
            OutputNaming::Native => format!("{stem}.md"),
        }
    }

    async fn convert(&self, job: &ConversionJob) -> Result<ConvertedDocument, FileError> {
        // The task file lives beside, not inside, the directory the kit writes to.
        let task_path = job.scratch_dir.join(TASK_FILE_NAME);
        let outputs = job.scratch_dir.join("outputs");
        tokio::fs::create_dir_all(&outputs)
            .await
            .map_err(|e| FileError::Io {
                path: outputs.clone(),
                detail: e.to_string(),
            })?;

        let config = self.config.resolved().map_err(|e| FileError::Io {
            path: self.config.kit_root.clone(),
            detail: e.to_string(),
        })?;
        let document = config.task_document(&job.input, &outputs);
        let body = serde_json::to_vec_pretty(&document).map_err(|e| FileError::Io {
            path: task_path.clone(),
            detail: e.to_string(),
        })?;
        tokio::fs::write(&task_path, body)
            .await
            .map_err(|e| FileError::Io {
                path: task_path.clone(),
                detail: e.to_string(),
            })?;
        debug!("[pdf-extract] task file at {}", task_path.display());

        let mut cmd = config.python.command();
        cmd.arg(config.runner_script())
            .arg("--config")
            .arg(&task_path)
            .current_dir(&config.kit_root)
            .env("PYTHONPATH", &config.kit_root);

        run_tool(AdapterId::PdfExtract, cmd).await?;

        let (markdown, md_path) = read_tool_markdown(AdapterId::PdfExtract, job).await?;
        let images_dir = sibling_images_dir(&md_path).await;

        Ok(ConvertedDocument {
            markdown,
            images_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_document_resolves_paths() {
        let config = PdfExtractConfig {
            kit_root: PathBuf::from("/kit"),
            models_root: PathBuf::from("/weights"),
            ..Default::default()
        };
        let doc = config.task_document(Path::new("/in/a.pdf"), Path::new("/scratch/out"));

        assert_eq!(doc["inputs"], "/in/a.pdf");
        assert_eq!(doc["outputs"], "/scratch/out");
        assert_eq!(doc["visualize"], false);
        assert_eq!(doc["merge2markdown"], true);

        let layout = &doc["tasks"]["layout_detection"];
        assert_eq!(layout["model"], "layout_detection_yolo");
        assert_eq!(layout["model_config"]["img_size"], 1024);
        assert_eq!(
            layout["model_config"]["model_path"],
            "/weights/Layout/YOLO/doclayout_yolo_ft.pt"
        );

        let mfr = &doc["tasks"]["formula_recognition"]["model_config"];
        assert_eq!(mfr["batch_size"], 128);
        assert_eq!(mfr["cfg_path"], "/kit/pdf_extract_kit/configs/unimernet.yaml");

        let ocr = &doc["tasks"]["ocr"]["model_config"];
        assert_eq!(ocr["lang"], "ch");
        assert_eq!(ocr["det_db_box_thresh"], 0.3);
    }

    #[test]
    fn disabled_tasks_are_omitted() {
        let mut config = PdfExtractConfig::default();
        config.tasks.formula_detection = None;
        config.tasks.formula_recognition = None;
        let doc = config.task_document(Path::new("a.pdf"), Path::new("out"));
        let tasks = doc["tasks"].as_object().unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.contains_key("layout_detection"));
        assert!(tasks.contains_key("ocr"));
    }

    #[test]
    fn absolute_weight_paths_are_kept() {
        let mut config = PdfExtractConfig::default();
        config.tasks.formula_detection = Some(FormulaDetectionConfig {
            model_path: PathBuf::from("/opt/mfd.pt"),
            ..Default::default()
        });
        let doc = config.task_document(Path::new("a.pdf"), Path::new("out"));
        assert_eq!(
            doc["tasks"]["formula_detection"]["model_config"]["model_path"],
            "/opt/mfd.pt"
        );
    }

    #[test]
    fn naming_policy() {
        let suffixed = PdfExtractAdapter::new(PdfExtractConfig::default());
        assert_eq!(suffixed.output_file_name("report"), "report_pdf_extract.md");

        let native = PdfExtractAdapter::new(PdfExtractConfig {
            naming: OutputNaming::Native,
            ..Default::default()
        });
        assert_eq!(native.output_file_name("report"), "report.md");
    }

    #[test]
    fn resolved_paths_are_absolute() {
        let config = PdfExtractConfig::default().resolved().unwrap();
        assert!(config.kit_root.is_absolute());
        assert!(config.models_root.is_absolute());
        assert!(config.runner_script().ends_with("scripts/run_task.py"));
    }

    #[test]
    fn runner_script_under_kit_root() {
        let config = PdfExtractConfig::default();
        assert_eq!(
            config.runner_script(),
            PathBuf::from("src/PDF-Extract-Kit-main/scripts/run_task.py")
        );
    }
}
