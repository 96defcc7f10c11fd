//! Capability registry: which adapters this machine can actually run.
//!
//! Each entry pairs an [`AdapterId`] with an availability flag (and the
//! reason when unavailable) plus the constructor that builds the adapter
//! from [`AdapterSettings`]. The dispatcher consults the registry instead of
//! discovering missing tools halfway through a batch.

use crate::adapter::{Adapter, AdapterId, AdapterSettings};
use crate::error::CompareError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Whether an adapter's external tool can be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    Available,
    Unavailable { reason: String },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Builds an adapter from the run's settings.
pub type AdapterConstructor = fn(&AdapterSettings) -> Adapter;

/// One registered adapter.
#[derive(Debug, Clone)]
pub struct AdapterEntry {
    pub id: AdapterId,
    pub availability: Availability,
    pub constructor: AdapterConstructor,
}

impl AdapterEntry {
    /// Entry using the standard constructor for `id`.
    pub fn new(id: AdapterId, availability: Availability) -> Self {
        Self {
            id,
            availability,
            constructor: standard_constructor(id),
        }
    }
}

fn standard_constructor(id: AdapterId) -> AdapterConstructor {
    match id {
        AdapterId::Docling => build_docling,
        AdapterId::MinerU => build_mineru,
        AdapterId::PdfExtract => build_pdf_extract,
    }
}

fn build_docling(settings: &AdapterSettings) -> Adapter {
    Adapter::new(AdapterId::Docling, settings)
}

fn build_mineru(settings: &AdapterSettings) -> Adapter {
    Adapter::new(AdapterId::MinerU, settings)
}

fn build_pdf_extract(settings: &AdapterSettings) -> Adapter {
    Adapter::new(AdapterId::PdfExtract, settings)
}

#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    settings: AdapterSettings,
    entries: Vec<AdapterEntry>,
}

impl AdapterRegistry {
    /// Probe every adapter's tool once and record the outcome.
    ///
    /// Docling and MinerU must answer `--version`. PDF-Extract-Kit needs a
    /// working Python interpreter and the runner script in the kit root.
    pub async fn probe(settings: AdapterSettings) -> Self {
        let mut entries = Vec::with_capacity(AdapterId::ALL.len());
        for id in AdapterId::ALL {
            let availability = match probe_adapter(id, &settings).await {
                Ok(()) => {
                    debug!("[{}] available", id);
                    Availability::Available
                }
                Err(reason) => {
                    warn!("{} converter not available: {}", id.label(), reason);
                    Availability::Unavailable { reason }
                }
            };
            entries.push(AdapterEntry::new(id, availability));
        }
        Self { settings, entries }
    }

    /// Registry from pre-decided entries, without probing.
    pub fn from_entries(settings: AdapterSettings, entries: Vec<AdapterEntry>) -> Self {
        Self { settings, entries }
    }

    pub fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    pub fn entries(&self) -> &[AdapterEntry] {
        &self.entries
    }

    pub fn availability(&self, id: AdapterId) -> Availability {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.availability.clone())
            .unwrap_or_else(|| Availability::Unavailable {
                reason: "not registered".to_string(),
            })
    }

    /// Construct the adapter for `id`, if it is available.
    pub fn build(&self, id: AdapterId) -> Result<Adapter, CompareError> {
        let entry = self.entries.iter().find(|e| e.id == id).ok_or_else(|| {
            CompareError::AdapterUnavailable {
                adapter: id,
                reason: "not registered".to_string(),
            }
        })?;
        match entry.availability {
            Availability::Available => Ok((entry.constructor)(&self.settings)),
            Availability::Unavailable { ref reason } => Err(CompareError::AdapterUnavailable {
                adapter: id,
                reason: reason.clone(),
            }),
        }
    }
}

async fn probe_adapter(id: AdapterId, settings: &AdapterSettings) -> Result<(), String> {
    match id {
        AdapterId::Docling => settings.docling.command.probe(["--version"]).await,
        AdapterId::MinerU => settings.mineru.command.probe(["--version"]).await,
        AdapterId::PdfExtract => {
            let script = settings.pdf_extract.runner_script();
            if tokio::fs::metadata(&script).await.is_err() {
                return Err(format!(
                    "runner script {} not found; check the kit root",
                    script.display()
                ));
            }
            settings.pdf_extract.python.probe(["--version"]).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{Converter, ToolCommand};

    fn unavailable(reason: &str) -> Availability {
        Availability::Unavailable {
            reason: reason.to_string(),
        }
    }

    #[test]
    fn build_available_adapter() {
        let registry = AdapterRegistry::from_entries(
            AdapterSettings::default(),
            vec![AdapterEntry::new(AdapterId::Docling, Availability::Available)],
        );
        let adapter = registry.build(AdapterId::Docling).unwrap();
        assert_eq!(adapter.id(), AdapterId::Docling);
    }

    #[test]
    fn build_unavailable_adapter_fails_with_reason() {
        let registry = AdapterRegistry::from_entries(
            AdapterSettings::default(),
            vec![AdapterEntry::new(AdapterId::MinerU, unavailable("no mineru"))],
        );
        match registry.build(AdapterId::MinerU) {
            Err(CompareError::AdapterUnavailable { adapter, reason }) => {
                assert_eq!(adapter, AdapterId::MinerU);
                assert_eq!(reason, "no mineru");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(registry.build(AdapterId::Docling).is_err());
        assert!(!registry.availability(AdapterId::Docling).is_available());
    }

    #[test]
    fn constructors_match_their_id() {
        let settings = AdapterSettings::default();
        for id in AdapterId::ALL {
            let entry = AdapterEntry::new(id, Availability::Available);
            assert_eq!((entry.constructor)(&settings).id(), id);
        }
    }

    #[tokio::test]
    async fn probe_marks_missing_tools_unavailable() {
        let mut settings = AdapterSettings::default();
        settings.docling.command = ToolCommand::new("no-such-docling-binary");
        settings.mineru.command = ToolCommand::new("no-such-mineru-binary");
        settings.pdf_extract.kit_root = "/no/such/kit".into();

        let registry = AdapterRegistry::probe(settings).await;
        assert_eq!(registry.entries().len(), 3);
        for id in AdapterId::ALL {
            assert!(!registry.availability(id).is_available(), "{id} should be unavailable");
        }
    }
}
