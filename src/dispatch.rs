//! Run-level entry points: pick adapters, run each batch, collect a report.
//!
//! Adapters are independent siblings. One that is unavailable is skipped
//! with a log line and the others still run; a fatal error inside one
//! adapter's batch (its output directory cannot be created) ends the run.

use crate::adapter::AdapterId;
use crate::batch::{run_batch, run_single};
use crate::config::BatchConfig;
use crate::error::CompareError;
use crate::output::{RunReport, SkippedAdapter};
use crate::registry::{AdapterRegistry, Availability};
use tracing::{info, warn};

/// Run every selected adapter over the configured input.
///
/// # Errors
/// - [`CompareError::InputDirNotFound`] before any adapter runs
/// - [`CompareError::OutputDirFailed`] if the output directory cannot be created
pub async fn run(config: &BatchConfig, registry: &AdapterRegistry) -> Result<RunReport, CompareError> {
    if tokio::fs::metadata(&config.input_dir).await.is_err() {
        return Err(CompareError::InputDirNotFound {
            path: config.input_dir.clone(),
        });
    }

    info!("--- Starting Conversion Task ---");
    info!("Input: {}", config.input_dir.display());
    info!("Output: {}", config.output_dir.display());
    info!(
        "Mode: {}",
        config
            .selection
            .ids()
            .iter()
            .map(AdapterId::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut report = RunReport::default();
    for id in config.selection.ids() {
        if let Availability::Unavailable { reason } = registry.availability(id) {
            warn!(">>> Skipping {} (not installed/configured): {}", id.label(), reason);
            report.skipped.push(SkippedAdapter { adapter: id, reason });
            continue;
        }

        let adapter = registry.build(id)?;
        info!(">>> Running {} converter...", id.label());
        let batch = match config.file {
            Some(ref name) => run_single(&adapter, config, name).await?,
            None => run_batch(&adapter, config).await?,
        };
        report.batches.push(batch);
    }

    info!(
        "--- Task Completed: {} converted, {} failed ---",
        report.total_succeeded(),
        report.total_failed()
    );
    Ok(report)
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(config: &BatchConfig, registry: &AdapterRegistry) -> Result<RunReport, CompareError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CompareError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(config, registry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterSettings;
    use crate::config::AdapterSelection;
    use crate::registry::AdapterEntry;
    use tempfile::TempDir;

    fn all_unavailable() -> AdapterRegistry {
        AdapterRegistry::from_entries(
            AdapterSettings::default(),
            AdapterId::ALL
                .iter()
                .map(|&id| {
                    AdapterEntry::new(
                        id,
                        Availability::Unavailable {
                            reason: "not installed".into(),
                        },
                    )
                })
                .collect(),
        )
    }

    #[tokio::test]
    async fn missing_input_dir_is_reported_before_anything_runs() {
        let out = TempDir::new().unwrap();
        let config = BatchConfig::builder()
            .input_dir("/no/such/input/dir")
            .output_dir(out.path().join("processed"))
            .build()
            .unwrap();

        let err = run(&config, &all_unavailable()).await.unwrap_err();
        assert!(matches!(err, CompareError::InputDirNotFound { .. }));
        assert!(!out.path().join("processed").exists());
    }

    #[tokio::test]
    async fn unavailable_adapters_are_skipped() {
        let input = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let config = BatchConfig::builder()
            .input_dir(input.path())
            .output_dir(out.path())
            .selection(AdapterSelection::All)
            .build()
            .unwrap();

        let report = run(&config, &all_unavailable()).await.unwrap();
        assert!(report.batches.is_empty());
        let skipped: Vec<_> = report.skipped.iter().map(|s| s.adapter).collect();
        assert_eq!(skipped, AdapterId::ALL.to_vec());
    }

    #[test]
    fn run_sync_wraps_run() {
        let input = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let config = BatchConfig::builder()
            .input_dir(input.path())
            .output_dir(out.path())
            .selection(AdapterSelection::Only(AdapterId::Docling))
            .build()
            .unwrap();

        let report = run_sync(&config, &all_unavailable()).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].adapter, AdapterId::Docling);
    }
}
