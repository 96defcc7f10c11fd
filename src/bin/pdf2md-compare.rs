//! CLI binary for pdf2md-compare.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`
//! and `AdapterSettings`, runs the selected converters and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2md_compare::adapter::{MinerUConfig, OutputNaming};
use pdf2md_compare::{
    run, AdapterId, AdapterRegistry, AdapterSelection, AdapterSettings, BatchConfig,
    BatchProgressCallback, CompareError, FileOrder, ProgressCallback, RunReport, ToolCommand,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a fresh bar per adapter batch plus a log
/// line per file.
struct CliProgressCallback {
    bar: Mutex<ProgressBar>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            bar: Mutex::new(ProgressBar::hidden()),
        })
    }

    fn bar(&self) -> ProgressBar {
        // ProgressBar is an Arc handle; cloning shares the same bar.
        self.bar.lock().unwrap().clone()
    }

    fn file_label(input: &Path) -> String {
        input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string())
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, adapter: AdapterId, total: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);
        bar.set_prefix(adapter.label());
        bar.enable_steady_tick(Duration::from_millis(80));
        bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("{}: {total} PDF files", adapter.label()))
        ));
        *self.bar.lock().unwrap() = bar;
    }

    fn on_file_start(&self, _adapter: AdapterId, _index: usize, _total: usize, input: &Path) {
        self.bar().set_message(Self::file_label(input));
    }

    fn on_file_complete(&self, _adapter: AdapterId, input: &Path, output: &Path) {
        let bar = self.bar();
        bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            Self::file_label(input),
            dim(&format!("→ {}", output.display())),
        ));
        bar.inc(1);
    }

    fn on_file_error(&self, _adapter: AdapterId, input: &Path, error: &str) {
        // Tool stderr can run to dozens of lines; keep the first.
        let first = error.lines().next().unwrap_or(error);
        let msg = if first.chars().count() > 80 {
            format!("{}\u{2026}", first.chars().take(79).collect::<String>())
        } else {
            first.to_string()
        };

        let bar = self.bar();
        bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            Self::file_label(input),
            red(&msg),
        ));
        bar.inc(1);
    }

    fn on_batch_complete(&self, adapter: AdapterId, total: usize, success_count: usize) {
        self.bar().finish_and_clear();
        let failed = total.saturating_sub(success_count);
        if total == 0 {
            eprintln!("{} {}: no PDF files found", cyan("⚠"), adapter.label());
        } else if failed == 0 {
            eprintln!(
                "{} {}: {} files converted",
                green("✔"),
                adapter.label(),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}: {}/{} files converted  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                adapter.label(),
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run every installed converter over data/raw → data/processed
  pdf2md-compare

  # Only Docling, custom directories
  pdf2md-compare --mode docling --input papers --output out

  # One file from the input directory
  pdf2md-compare --file Sample.pdf

  # MinerU on GPU with English OCR
  pdf2md-compare --mode mineru --device cuda --lang en

  # JSON report for scripting
  pdf2md-compare --json > report.json

OUTPUT LAYOUT:
  {output}/{stem}_mineru.md        MinerU markdown
  {output}/{stem}_docling.md       Docling markdown
  {output}/{stem}_pdf_extract.md   PDF-Extract-Kit markdown ({stem}.md with --pdf-extract-naming native)
  {output}/images/                 images referenced by the markdown

MINERU LOCAL MODELS:
  If {project-root}/mineru.json exists it is passed to MinerU as
  MINERU_TOOLS_CONFIG_JSON. If {project-root}/models is also non-empty,
  MINERU_MODEL_SOURCE=local is set. Both apply to the MinerU process only.
"#;

/// Compare PDF-to-Markdown converters over a directory of PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-compare",
    version,
    about = "PDF to Markdown converter comparison tool",
    long_about = "Run MinerU, Docling and PDF-Extract-Kit over the same PDFs and write each \
converter's Markdown side by side, named {stem}_{converter}.md.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Converter to run.
    #[arg(long, env = "PDF2MD_COMPARE_MODE", value_enum, default_value = "all")]
    mode: ModeArg,

    /// Input directory containing PDFs.
    #[arg(long, env = "PDF2MD_COMPARE_INPUT", default_value = "data/raw")]
    input: PathBuf,

    /// Output directory for Markdown files.
    #[arg(long, env = "PDF2MD_COMPARE_OUTPUT", default_value = "data/processed")]
    output: PathBuf,

    /// Convert only this file name from the input directory.
    #[arg(long, env = "PDF2MD_COMPARE_FILE")]
    file: Option<String>,

    /// Process files in directory-listing order instead of sorted by name.
    #[arg(long)]
    unsorted: bool,

    /// Docling executable.
    #[arg(long, env = "PDF2MD_COMPARE_DOCLING", default_value = "docling")]
    docling_bin: PathBuf,

    /// MinerU executable.
    #[arg(long, env = "PDF2MD_COMPARE_MINERU", default_value = "mineru")]
    mineru_bin: PathBuf,

    /// Directory searched for mineru.json and models/.
    #[arg(long, env = "PDF2MD_COMPARE_PROJECT_ROOT", default_value = ".")]
    project_root: PathBuf,

    /// MinerU OCR language.
    #[arg(long, env = "PDF2MD_COMPARE_LANG", default_value = "ch")]
    lang: String,

    /// MinerU inference device (cpu, cuda, mps, …).
    #[arg(long, env = "PDF2MD_COMPARE_DEVICE", default_value = "cpu")]
    device: String,

    /// Disable MinerU formula recognition.
    #[arg(long)]
    no_formula: bool,

    /// Disable MinerU table recognition.
    #[arg(long)]
    no_table: bool,

    /// Python interpreter for PDF-Extract-Kit.
    #[arg(long, env = "PDF2MD_COMPARE_PYTHON", default_value = "python3")]
    python: PathBuf,

    /// PDF-Extract-Kit checkout.
    #[arg(long, env = "PDF2MD_COMPARE_KIT_ROOT", default_value = "src/PDF-Extract-Kit-main")]
    kit_root: PathBuf,

    /// Root of PDF-Extract-Kit model weights.
    #[arg(long, env = "PDF2MD_COMPARE_MODELS_ROOT", default_value = "models/models")]
    models_root: PathBuf,

    /// PDF-Extract-Kit output name: suffixed ({stem}_pdf_extract.md) or native ({stem}.md).
    #[arg(long, value_enum, default_value = "suffixed")]
    pdf_extract_naming: NamingArg,

    /// Print the run report as JSON on stdout.
    #[arg(long, env = "PDF2MD_COMPARE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDF2MD_COMPARE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2MD_COMPARE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDF2MD_COMPARE_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    All,
    Mineru,
    Docling,
    PdfExtract,
}

impl From<ModeArg> for AdapterSelection {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::All => AdapterSelection::All,
            ModeArg::Mineru => AdapterSelection::Only(AdapterId::MinerU),
            ModeArg::Docling => AdapterSelection::Only(AdapterId::Docling),
            ModeArg::PdfExtract => AdapterSelection::Only(AdapterId::PdfExtract),
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum NamingArg {
    Suffixed,
    Native,
}

impl From<NamingArg> for OutputNaming {
    fn from(v: NamingArg) -> Self {
        match v {
            NamingArg::Suffixed => OutputNaming::Suffixed,
            NamingArg::Native => OutputNaming::Native,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the progress bar active, per-file INFO lines would fight the bar
    // for the terminal; the bar already reports them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;
    let settings = build_settings(&cli);

    // ── Probe tools ──────────────────────────────────────────────────────
    let registry = AdapterRegistry::probe(settings).await;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = match run(&config, &registry).await {
        Ok(report) => report,
        Err(CompareError::InputDirNotFound { path }) => {
            // Not a hard failure: report and exit normally.
            eprintln!(
                "{} Error: Input directory '{}' does not exist.",
                red("✘"),
                path.display()
            );
            return Ok(());
        }
        Err(e) => return Err(e).context("Conversion run failed"),
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&report);
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder()
        .input_dir(&cli.input)
        .output_dir(&cli.output)
        .selection(cli.mode.into())
        .order(if cli.unsorted {
            FileOrder::Filesystem
        } else {
            FileOrder::Sorted
        });

    if let Some(ref name) = cli.file {
        builder = builder.file(name.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Map CLI args to per-adapter tool settings.
fn build_settings(cli: &Cli) -> AdapterSettings {
    let mut settings = AdapterSettings::default();

    settings.docling.command = ToolCommand::new(&cli.docling_bin);

    settings.mineru = MinerUConfig {
        command: ToolCommand::new(&cli.mineru_bin),
        lang: cli.lang.clone(),
        device: cli.device.clone(),
        formula_enable: !cli.no_formula,
        table_enable: !cli.no_table,
        ..MinerUConfig::from_project_root(&cli.project_root)
    };

    settings.pdf_extract.python = ToolCommand::new(&cli.python);
    settings.pdf_extract.kit_root = cli.kit_root.clone();
    settings.pdf_extract.models_root = cli.models_root.clone();
    settings.pdf_extract.naming = cli.pdf_extract_naming.into();

    settings
}

fn print_summary(report: &RunReport) {
    for skipped in &report.skipped {
        eprintln!(
            "{} Skipped {}: {}",
            cyan("⚠"),
            skipped.adapter.label(),
            dim(&skipped.reason)
        );
    }
    for batch in &report.batches {
        eprintln!(
            "{}  {:<16} {}/{} files  {}ms",
            if batch.failed() == 0 { green("✔") } else { cyan("⚠") },
            batch.adapter.label(),
            batch.succeeded(),
            batch.results.len(),
            batch.total_duration_ms,
        );
        for result in batch.results.iter().filter(|r| !r.is_success()) {
            if let Some(ref e) = result.error {
                eprintln!("     {} {}", red("✗"), dim(&e.to_string()));
            }
        }
    }
    eprintln!("--- Task Completed ---");
}
