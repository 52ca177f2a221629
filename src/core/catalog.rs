//! Catalog client contract and the in-crate implementations.
//!
//! The real workshop client lives outside this crate. Everything here talks to
//! it through [`CatalogClient`], which answers "what are the direct
//! dependencies and display metadata of these ids".

use crate::core::registry::Registry;
use crate::models::error::SError;
use crate::models::mod_dto::CatalogEntry;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Looks up every id in `ids`.
    ///
    /// Unknown ids are left out of the result rather than reported as errors.
    /// The result is keyed by id; callers must not rely on any ordering.
    /// An `Err` means the whole request failed in transport.
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, CatalogEntry>, SError>;

    /// Whether one request may carry more than one id.
    fn supports_bulk(&self) -> bool {
        true
    }

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}

/// Catalog backed by a map. Transport failures can be injected per id, and
/// every request is recorded so callers can check what was asked for.
#[derive(Default)]
pub struct MemoryCatalog {
    entries: HashMap<String, CatalogEntry>,
    failing: Mutex<HashMap<String, usize>>,
    bulk: bool,
    requests: Mutex<Vec<Vec<String>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            bulk: true,
            ..Default::default()
        }
    }

    pub fn with_entry(mut self, id: impl Into<String>, entry: CatalogEntry) -> Self {
        self.entries.insert(id.into(), entry);
        self
    }

    /// Shorthand for an entry named after its id with the given dependencies.
    pub fn with_mod(self, id: &str, deps: &[&str]) -> Self {
        self.with_entry(id, CatalogEntry::new(id).with_dependencies(deps.iter().copied()))
    }

    /// Any request containing `id` fails in transport, forever.
    pub fn failing(self, id: impl Into<String>) -> Self {
        self.failing_times(id, usize::MAX)
    }

    /// Any request containing `id` fails in transport for the next `times` requests.
    pub fn failing_times(self, id: impl Into<String>, times: usize) -> Self {
        self.failing.lock().insert(id.into(), times);
        self
    }

    /// Serve one id per request.
    pub fn single_id_only(mut self) -> Self {
        self.bulk = false;
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<Vec<String>> {
        self.requests.lock().clone()
    }

    /// How many times `id` was sent to the catalog.
    pub fn times_requested(&self, id: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .flatten()
            .filter(|requested| requested.as_str() == id)
            .count()
    }
}

#[async_trait]
impl CatalogClient for MemoryCatalog {
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, CatalogEntry>, SError> {
        self.requests.lock().push(ids.to_vec());

        {
            let mut failing = self.failing.lock();
            if let Some(id) = ids.iter().find(|id| failing.get(id.as_str()).is_some_and(|n| *n > 0)) {
                if let Some(remaining) = failing.get_mut(id.as_str()) {
                    *remaining = remaining.saturating_sub(1);
                }
                return Err(SError::CatalogLookupFailed(format!("{} unreachable", id)));
            }
        }

        Ok(ids
            .iter()
            .filter_map(|id| self.entries.get(id).map(|e| (id.clone(), e.clone())))
            .collect())
    }

    fn supports_bulk(&self) -> bool {
        self.bulk
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Offline catalog answering from what is already on disk or in the
/// collection. Used when the workshop cannot be reached.
pub struct InstalledCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl InstalledCatalog {
    pub fn from_registry(registry: &Registry) -> Self {
        let mut entries = HashMap::new();
        let known: HashSet<&String> = registry
            .installed
            .ids()
            .iter()
            .chain(registry.collection.ids())
            .collect();

        for id in known {
            let record = registry
                .installed
                .get(id)
                .or_else(|| registry.collection.get(id));
            if let Some(record) = record {
                entries.insert(
                    id.clone(),
                    CatalogEntry {
                        name: record.display_name().to_string(),
                        dependency_ids: registry.dependencies_of(id).to_vec(),
                        version: Some(record.version.clone()).filter(|v| !v.is_empty()),
                        size_bytes: record.size_bytes,
                    },
                );
            }
        }

        Self { entries }
    }
}

#[async_trait]
impl CatalogClient for InstalledCatalog {
    async fn lookup(&self, ids: &[String]) -> Result<HashMap<String, CatalogEntry>, SError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.entries.get(id).map(|e| (id.clone(), e.clone())))
            .collect())
    }

    fn name(&self) -> &str {
        "installed"
    }
}
