// src/core/resolver.rs

//! Transitive dependency resolution against the catalog.
//!
//! Breadth-first, one catalog round per level. Every id is looked up at most
//! once per pass (retries after transport failures aside), which is also what
//! makes cycles harmless: an id seen before is simply not queued again.

use crate::config::{EngineSettings, DEFAULT_CATALOG_BATCH_SIZE};
use crate::core::catalog::CatalogClient;
use crate::models::closure::ResolvedClosure;
use crate::models::error::SError;
use crate::models::mod_dto::{CatalogEntry, ModRecord};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolverOptions {
    pub batch_size: usize,
    /// Extra attempts for a request that failed in transport.
    pub retries: u32,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_CATALOG_BATCH_SIZE,
            retries: 1,
        }
    }
}

impl From<&EngineSettings> for ResolverOptions {
    fn from(settings: &EngineSettings) -> Self {
        Self {
            batch_size: settings.batch_size(),
            retries: settings.catalog_retries,
        }
    }
}

#[derive(Debug)]
enum Lookup {
    Found(CatalogEntry),
    Unknown,
    Failed(SError),
}

/// Resolves with default options. See [`resolve_with`].
pub async fn resolve<C>(seeds: &[String], catalog: &C) -> ResolvedClosure
where
    C: CatalogClient + ?Sized,
{
    resolve_with(seeds, catalog, ResolverOptions::default()).await
}

/// Computes the transitive closure of `seeds`.
///
/// Never fails as a whole: ids the catalog does not know, or could not be
/// reached for, get a placeholder record (id as name, no dependencies) and
/// are listed in [`ResolvedClosure::unknown`] / [`ResolvedClosure::failed`].
pub async fn resolve_with<C>(seeds: &[String], catalog: &C, options: ResolverOptions) -> ResolvedClosure
where
    C: CatalogClient + ?Sized,
{
    let mut closure = ResolvedClosure::default();
    let mut visited: HashSet<String> = HashSet::new();
    let mut level: Vec<String> = seeds
        .iter()
        .map(|s| s.trim())
        .filter(|s| {
            if s.is_empty() {
                warn!("Skipping empty seed id");
            }
            !s.is_empty()
        })
        .map(str::to_string)
        .collect();
    let mut depth = 0usize;

    while !level.is_empty() {
        // Marking on issue keeps duplicates inside one level out of the request.
        let batch: Vec<String> = level
            .into_iter()
            .filter(|id| visited.insert(id.clone()))
            .collect();
        if batch.is_empty() {
            break;
        }

        debug!(depth, count = batch.len(), "Resolving dependency level");
        let mut answers = fetch_level(catalog, &batch, options).await;
        let mut next = Vec::new();

        for id in &batch {
            let record = match answers.remove(id) {
                Some(Lookup::Found(entry)) => entry.to_record(id),
                Some(Lookup::Failed(e)) => {
                    warn!("Could not resolve {id}: {e}");
                    closure.failed.insert(id.clone());
                    placeholder(id)
                }
                Some(Lookup::Unknown) | None => {
                    debug!("Catalog has no entry for {id}");
                    closure.unknown.insert(id.clone());
                    placeholder(id)
                }
            };

            next.extend(
                record
                    .dependency_ids
                    .iter()
                    .filter(|dep| !visited.contains(dep.as_str()))
                    .cloned(),
            );
            closure.insert(record);
        }

        level = next;
        depth += 1;
    }

    info!(
        resolved = closure.len(),
        failed = closure.failed.len(),
        unknown = closure.unknown.len(),
        catalog = catalog.name(),
        "Dependency resolution finished"
    );
    closure
}

fn placeholder(id: &str) -> ModRecord {
    ModRecord::new(id).with_name(id)
}

/// Looks up one level, batch by batch. A batch that keeps failing is split
/// into single-id requests so one bad id cannot take its siblings down.
async fn fetch_level<C>(catalog: &C, ids: &[String], options: ResolverOptions) -> HashMap<String, Lookup>
where
    C: CatalogClient + ?Sized,
{
    let chunk_size = if catalog.supports_bulk() {
        options.batch_size.max(1)
    } else {
        1
    };
    let mut out = HashMap::with_capacity(ids.len());

    for chunk in ids.chunks(chunk_size) {
        match lookup_with_retry(catalog, chunk, options.retries).await {
            Ok(found) => absorb(&mut out, chunk, found),
            Err(e) if chunk.len() > 1 => {
                warn!("Batch of {} ids failed ({e}), retrying one by one", chunk.len());
                for id in chunk {
                    let single = std::slice::from_ref(id);
                    match lookup_with_retry(catalog, single, 0).await {
                        Ok(found) => absorb(&mut out, single, found),
                        Err(e) => {
                            out.insert(id.clone(), Lookup::Failed(e));
                        }
                    }
                }
            }
            Err(e) => {
                out.insert(chunk[0].clone(), Lookup::Failed(e));
            }
        }
    }

    out
}

/// Re-keys a response by id; the catalog may answer in any order.
fn absorb(out: &mut HashMap<String, Lookup>, requested: &[String], mut found: HashMap<String, CatalogEntry>) {
    for id in requested {
        let outcome = match found.remove(id) {
            Some(entry) => Lookup::Found(entry),
            None => Lookup::Unknown,
        };
        out.insert(id.clone(), outcome);
    }
    if !found.is_empty() {
        debug!("Ignoring {} unrequested catalog entries", found.len());
    }
}

async fn lookup_with_retry<C>(
    catalog: &C,
    ids: &[String],
    retries: u32,
) -> Result<HashMap<String, CatalogEntry>, SError>
where
    C: CatalogClient + ?Sized,
{
    let mut attempt = 0;
    loop {
        match catalog.lookup(ids).await {
            Ok(found) => return Ok(found),
            Err(e) if e.is_retryable() && attempt < retries => {
                attempt += 1;
                debug!("Catalog lookup failed ({e}), attempt {attempt} of {retries}");
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::MemoryCatalog;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn levels_are_requested_in_order() {
        let catalog = MemoryCatalog::new()
            .with_mod("A", &["B", "C"])
            .with_mod("B", &["D"])
            .with_mod("C", &["D"])
            .with_mod("D", &[]);

        let closure = resolve(&ids(&["A"]), &catalog).await;

        assert_eq!(closure.order, ids(&["A", "B", "C", "D"]));
        assert_eq!(
            catalog.requests(),
            vec![ids(&["A"]), ids(&["B", "C"]), ids(&["D"])]
        );
    }

    #[tokio::test]
    async fn batches_respect_batch_size() {
        let catalog = MemoryCatalog::new()
            .with_mod("R", &["1", "2", "3", "4", "5"])
            .with_mod("1", &[])
            .with_mod("2", &[])
            .with_mod("3", &[])
            .with_mod("4", &[])
            .with_mod("5", &[]);

        let options = ResolverOptions { batch_size: 2, retries: 0 };
        let closure = resolve_with(&ids(&["R"]), &catalog, options).await;

        assert_eq!(closure.len(), 6);
        assert_eq!(catalog.request_count(), 4);
    }

    #[tokio::test]
    async fn duplicate_seeds_are_requested_once() {
        let catalog = MemoryCatalog::new().with_mod("A", &[]);
        resolve(&ids(&["A", "A", " A "]), &catalog).await;
        assert_eq!(catalog.times_requested("A"), 1);
    }

    #[tokio::test]
    async fn transient_failure_is_retried() {
        let catalog = MemoryCatalog::new().with_mod("A", &[]).failing_times("A", 1);
        let closure = resolve(&ids(&["A"]), &catalog).await;

        assert!(closure.is_complete());
        assert!(!closure.is_unresolved("A"));
    }

    #[tokio::test]
    async fn failing_id_does_not_sink_its_batch() {
        let catalog = MemoryCatalog::new()
            .with_mod("A", &["B", "C"])
            .with_mod("B", &[])
            .with_mod("C", &["E"])
            .with_mod("E", &[])
            .failing("B");

        let closure = resolve(&ids(&["A"]), &catalog).await;

        assert_eq!(closure.failed.iter().cloned().collect::<Vec<_>>(), ids(&["B"]));
        assert!(closure.contains("E"), "siblings of a failed id are still resolved");
        assert_eq!(closure.get("B").unwrap().display_name(), "B");
        assert!(closure.get("B").unwrap().dependency_ids.is_empty());
    }

    #[tokio::test]
    async fn single_id_catalogs_get_one_id_per_request() {
        let catalog = MemoryCatalog::new()
            .with_mod("A", &["B", "C"])
            .with_mod("B", &[])
            .with_mod("C", &[])
            .single_id_only();

        resolve(&ids(&["A"]), &catalog).await;

        assert!(catalog.requests().iter().all(|r| r.len() == 1));
        assert_eq!(catalog.request_count(), 3);
    }
}
