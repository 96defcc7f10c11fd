//! Batch conversion driver.
//!
//! Enumerates `*.pdf` files in the input directory and hands each one to a
//! single adapter, one file at a time. A failing file is logged, recorded in
//! its [`ConversionResult`] and skipped; it never aborts the batch. There are
//! no retries and no cleanup of partial artefacts: anything copied into the
//! output directory before a failure stays there.
//!
//! ```text
//! discover_pdfs ──▶ for each file:
//!                     validate (%PDF) ──▶ adapter.convert (scratch dir)
//!                       ──▶ write {stem}_{suffix}.md (tmp + rename)
//!                       ──▶ copy images/ into output_dir/images/
//! ```

use crate::adapter::Converter;
use crate::config::{BatchConfig, FileOrder};
use crate::error::{CompareError, FileError};
use crate::output::{BatchReport, ConversionJob, ConversionResult};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, warn};

/// Extension matched by discovery. Case-sensitive, like a `*.pdf` glob.
pub const PDF_EXTENSION: &str = "pdf";

/// List the `*.pdf` files directly inside `dir`.
///
/// Sub-directories and other extensions are ignored. A missing directory
/// yields an empty list.
pub async fn discover_pdfs(dir: &Path, order: FileOrder) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot read {}: {}", dir.display(), e);
            return files;
        }
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && path.extension().is_some_and(|ext| ext == PDF_EXTENSION) {
            files.push(path);
        }
    }

    if order == FileOrder::Sorted {
        files.sort();
    }
    files
}

/// Convert every PDF in `config.input_dir` with `converter`.
///
/// A missing input directory or an empty one is logged and yields an empty
/// report; neither is an error. Only failure to create the output directory
/// is fatal.
pub async fn run_batch<C: Converter>(
    converter: &C,
    config: &BatchConfig,
) -> Result<BatchReport, CompareError> {
    let adapter = converter.id();
    let started = Instant::now();

    ensure_output_dir(&config.output_dir).await?;

    let files = if tokio::fs::metadata(&config.input_dir).await.is_ok() {
        discover_pdfs(&config.input_dir, config.order).await
    } else {
        warn!(
            "[{}] Input directory {} does not exist; nothing to convert",
            adapter,
            config.input_dir.display()
        );
        Vec::new()
    };

    if files.is_empty() {
        info!(
            "[{}] No PDF files found in {}",
            adapter,
            config.input_dir.display()
        );
    } else {
        info!(
            "[{}] Found {} PDF files in {}",
            adapter,
            files.len(),
            config.input_dir.display()
        );
    }

    let results = convert_files(converter, &files, config).await;

    Ok(BatchReport {
        adapter,
        input_dir: config.input_dir.clone(),
        results,
        total_duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Convert one named file from `config.input_dir`.
///
/// A missing file is logged and recorded as [`FileError::NotFound`].
pub async fn run_single<C: Converter>(
    converter: &C,
    config: &BatchConfig,
    file_name: &str,
) -> Result<BatchReport, CompareError> {
    let started = Instant::now();
    ensure_output_dir(&config.output_dir).await?;

    let path = config.input_dir.join(file_name);
    let results = convert_files(converter, std::slice::from_ref(&path), config).await;

    Ok(BatchReport {
        adapter: converter.id(),
        input_dir: config.input_dir.clone(),
        results,
        total_duration_ms: started.elapsed().as_millis() as u64,
    })
}

async fn convert_files<C: Converter>(
    converter: &C,
    files: &[PathBuf],
    config: &BatchConfig,
) -> Vec<ConversionResult> {
    let adapter = converter.id();
    let total = files.len();

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(adapter, total);
    }

    let mut results = Vec::with_capacity(total);
    for (i, file) in files.iter().enumerate() {
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_start(adapter, i + 1, total, file);
        }

        let result = convert_file(converter, file, &config.output_dir).await;

        if let Some(ref cb) = config.progress_callback {
            match (&result.output, &result.error) {
                (Some(out), None) => cb.on_file_complete(adapter, file, out),
                (_, Some(e)) => cb.on_file_error(adapter, file, &e.to_string()),
                (None, None) => {}
            }
        }
        results.push(result);
    }

    if let Some(ref cb) = config.progress_callback {
        let ok = results.iter().filter(|r| r.is_success()).count();
        cb.on_batch_complete(adapter, total, ok);
    }
    results
}

/// Convert a single file, never failing: errors land in the result.
pub async fn convert_file<C: Converter>(
    converter: &C,
    input: &Path,
    output_dir: &Path,
) -> ConversionResult {
    let adapter = converter.id();
    let started = Instant::now();
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());

    let outcome = match validate_input(input).await {
        Ok(()) => {
            info!("[{}] Processing: {}...", adapter, name);
            convert_validated(converter, input, output_dir).await
        }
        Err(e) => Err(e),
    };
    let elapsed = started.elapsed();

    match outcome {
        Ok(output) => {
            info!(
                "[{}] Successfully converted: {} -> {}",
                adapter,
                name,
                output.display()
            );
            info!("[{}] Time taken: {:.2}s", adapter, elapsed.as_secs_f64());
            ConversionResult {
                input: input.to_path_buf(),
                adapter,
                output: Some(output),
                elapsed_ms: elapsed.as_millis() as u64,
                error: None,
            }
        }
        Err(e) => {
            error!("[{}] Error processing {}: {}", adapter, name, e);
            ConversionResult {
                input: input.to_path_buf(),
                adapter,
                output: None,
                elapsed_ms: elapsed.as_millis() as u64,
                error: Some(e),
            }
        }
    }
}

async fn convert_validated<C: Converter>(
    converter: &C,
    input: &Path,
    output_dir: &Path,
) -> Result<PathBuf, FileError> {
    let io_err = |path: &Path, e: std::io::Error| FileError::Io {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    // Scratch lives inside the output dir so the final rename stays on one
    // filesystem. Removed when `scratch` drops.
    let scratch = tempfile::Builder::new()
        .prefix(".pdf2md-")
        .tempdir_in(output_dir)
        .map_err(|e| io_err(output_dir, e))?;

    let job = ConversionJob {
        input: std::path::absolute(input).map_err(|e| io_err(input, e))?,
        output_dir: output_dir.to_path_buf(),
        adapter: converter.id(),
        scratch_dir: std::path::absolute(scratch.path()).map_err(|e| io_err(scratch.path(), e))?,
    };

    let document = converter.convert(&job).await?;

    if let Some(ref images) = document.images_dir {
        let target = output_dir.join("images");
        let copied = copy_dir_contents(images, &target).await?;
        debug!("[{}] copied {} image files to {}", job.adapter, copied, target.display());
    }

    let output = output_dir.join(converter.output_file_name(&job.stem()));
    write_markdown(&output, &document.markdown).await?;
    Ok(output)
}

/// The file must exist and start with `%PDF`.
async fn validate_input(path: &Path) -> Result<(), FileError> {
    let mut file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FileError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(FileError::Io {
                path: path.to_path_buf(),
                detail: e.to_string(),
            });
        }
    };

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic).await {
        Ok(_) if &magic == b"%PDF" => Ok(()),
        _ => Err(FileError::NotAPdf {
            path: path.to_path_buf(),
        }),
    }
}

async fn ensure_output_dir(dir: &Path) -> Result<(), CompareError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| CompareError::OutputDirFailed {
            path: dir.to_path_buf(),
            source,
        })
}

/// Write via a temp file + rename so a crash never leaves a truncated `.md`.
async fn write_markdown(path: &Path, markdown: &str) -> Result<(), FileError> {
    let write_err = |e: std::io::Error| FileError::WriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)
}

/// Recursively copy the files under `src` into `dst`, overwriting.
/// Returns the number of files copied.
async fn copy_dir_contents(src: &Path, dst: &Path) -> Result<usize, FileError> {
    let write_err = |path: &Path, e: std::io::Error| FileError::WriteFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    };

    let mut copied = 0;
    let mut stack = vec![(src.to_path_buf(), dst.to_path_buf())];
    while let Some((from, to)) = stack.pop() {
        tokio::fs::create_dir_all(&to)
            .await
            .map_err(|e| write_err(&to, e))?;
        let mut entries = tokio::fs::read_dir(&from)
            .await
            .map_err(|e| write_err(&from, e))?;
        while let Some(entry) = entries.next_entry().await.map_err(|e| write_err(&from, e))? {
            let target = to.join(entry.file_name());
            let file_type = entry.file_type().await.map_err(|e| write_err(&entry.path(), e))?;
            if file_type.is_dir() {
                stack.push((entry.path(), target));
            } else if file_type.is_file() {
                tokio::fs::copy(entry.path(), &target)
                    .await
                    .map_err(|e| write_err(&target, e))?;
                copied += 1;
            }
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn discover_filters_extension_and_dirs() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.pdf", "a.pdf", "notes.txt", "scan.PDF", "pdf"] {
            std::fs::write(tmp.path().join(name), "%PDF-1.4").unwrap();
        }
        std::fs::create_dir(tmp.path().join("nested.pdf")).unwrap();

        let files = discover_pdfs(tmp.path(), FileOrder::Sorted).await;
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn discover_missing_dir_is_empty() {
        let files = discover_pdfs(Path::new("/no/such/dir/anywhere"), FileOrder::Sorted).await;
        assert!(files.is_empty());
    }

    #[tokio::test]
    async fn validate_rejects_non_pdf() {
        let tmp = TempDir::new().unwrap();
        let fake = tmp.path().join("fake.pdf");
        std::fs::write(&fake, "hello world").unwrap();
        let short = tmp.path().join("short.pdf");
        std::fs::write(&short, "%P").unwrap();

        assert!(matches!(
            validate_input(&fake).await,
            Err(FileError::NotAPdf { .. })
        ));
        assert!(matches!(
            validate_input(&short).await,
            Err(FileError::NotAPdf { .. })
        ));
        assert!(matches!(
            validate_input(&tmp.path().join("missing.pdf")).await,
            Err(FileError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn write_markdown_replaces_atomically() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("doc_docling.md");
        write_markdown(&out, "first").await.unwrap();
        write_markdown(&out, "second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "second");
        assert!(!tmp.path().join("doc_docling.md.tmp").exists());
    }

    #[tokio::test]
    async fn copy_dir_contents_recurses() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::create_dir(src.path().join("sub")).unwrap();
        std::fs::write(src.path().join("a.jpg"), b"a").unwrap();
        std::fs::write(src.path().join("sub/b.jpg"), b"b").unwrap();

        let target = dst.path().join("images");
        let n = copy_dir_contents(src.path(), &target).await.unwrap();
        assert_eq!(n, 2);
        assert!(target.join("a.jpg").exists());
        assert!(target.join("sub/b.jpg").exists());
    }
}
