// src/core/reconciler.rs

//! Folding the three sources together without losing user edits.
//!
//! Every function here takes a snapshot and returns a new value. Nothing is
//! written back; the caller persists the result and swaps it in.

use crate::core::registry::{name_for, Registry};
use crate::models::closure::ResolvedClosure;
use crate::models::collection::{DependencyRollup, PinDrift, SyncOutcome};
use crate::models::error::SError;
use crate::models::mod_dto::{ModRecord, ModStatus};
use semver::Version;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use tracing::{debug, info};

pub fn status(id: &str, registry: &Registry) -> ModStatus {
    registry.status(id)
}

/// Enabled ids missing from the collection, in load order.
pub fn missing_from_collection(registry: &Registry) -> Vec<String> {
    registry
        .enabled
        .ids()
        .iter()
        .filter(|id| !registry.collection.contains(id))
        .cloned()
        .collect()
}

/// Adds every enabled mod that is not yet collected, along with its
/// dependency closure.
///
/// When nothing is missing this returns straight away without calling
/// `resolve_fn`. Entries already in the collection are never touched, so
/// categories and pinned versions survive.
pub async fn sync_enabled_into_collection<F, Fut>(registry: &Registry, resolve_fn: F) -> SyncOutcome
where
    F: FnOnce(Vec<String>) -> Fut,
    Fut: Future<Output = ResolvedClosure>,
{
    let missing = missing_from_collection(registry);
    if missing.is_empty() {
        debug!("Collection already holds every enabled mod");
        return SyncOutcome {
            added: Vec::new(),
            collection: registry.collection.to_vec(),
            unresolved: Vec::new(),
        };
    }

    info!("Syncing {} enabled mods into the collection", missing.len());
    let closure = resolve_fn(missing.clone()).await;
    merge_closure(registry, &missing, &closure)
}

/// "Add to collection" for a single mod and everything it pulls in.
pub fn add_with_dependencies(registry: &Registry, root_id: &str, closure: &ResolvedClosure) -> SyncOutcome {
    merge_closure(registry, &[root_id.to_string()], closure)
}

/// Union of the collection with `seeds` and everything they reach in
/// `closure`, keyed by id. Seeds come first in the given order, then
/// dependencies in discovery order. Closure entries the seeds do not reach
/// are left out.
pub fn merge_closure(registry: &Registry, seeds: &[String], closure: &ResolvedClosure) -> SyncOutcome {
    let seeds: Vec<&str> = seeds.iter().map(|s| s.trim()).filter(|s| !s.is_empty()).collect();
    let reachable = closure.reachable_from(seeds.iter().copied());

    let mut collection = registry.collection.to_vec();
    let mut present: HashSet<String> = registry.collection.ids().iter().cloned().collect();
    let mut added = Vec::new();
    let mut unresolved = Vec::new();

    let discovered = closure.order.iter().map(String::as_str).filter(|id| reachable.contains(*id));
    for id in seeds.iter().copied().chain(discovered) {
        if !present.insert(id.to_string()) {
            continue;
        }
        if closure.is_unresolved(id) {
            unresolved.push(id.to_string());
        }
        let record = fresh_record(id, registry, closure);
        collection.push(record.clone());
        added.push(record);
    }

    debug!(added = added.len(), total = collection.len(), "Collection merged");
    SyncOutcome {
        added,
        collection,
        unresolved,
    }
}

/// A new collection entry for `id`. It tracks latest unless the server config
/// already pins a version for it.
fn fresh_record(id: &str, registry: &Registry, closure: &ResolvedClosure) -> ModRecord {
    let resolved = closure.get(id).filter(|_| !closure.is_unresolved(id));

    let dependency_ids = match resolved {
        Some(record) => record.dependency_ids.clone(),
        None => registry.dependencies_of(id).to_vec(),
    };
    let name = match resolved {
        Some(record) => record.display_name().to_string(),
        None => name_for(id, registry),
    };

    ModRecord {
        id: id.to_string(),
        name: Some(name),
        version: registry
            .enabled
            .get(id)
            .map(|r| r.version.clone())
            .unwrap_or_default(),
        dependency_ids,
        size_bytes: registry
            .installed_size(id)
            .or_else(|| resolved.and_then(|r| r.size_bytes)),
        category: None,
    }
}

/// Pinned becomes unpinned (track latest); unpinned becomes pinned to
/// `current_version`.
pub fn toggle_pin(current_version: &str, is_pinned: bool) -> String {
    if is_pinned {
        String::new()
    } else {
        current_version.to_string()
    }
}

/// Applies [`toggle_pin`] to one collection entry.
pub fn toggle_pin_in(collection: &[ModRecord], id: &str, current_version: &str) -> Result<Vec<ModRecord>, SError> {
    update_entry(collection, id, |record| {
        record.version = toggle_pin(current_version, record.is_pinned());
    })
}

/// Sets the category of an existing entry; a blank category clears it.
pub fn set_category(id: &str, category: &str, collection: &[ModRecord]) -> Result<Vec<ModRecord>, SError> {
    let category = category.trim();
    update_entry(collection, id, |record| {
        record.category = (!category.is_empty()).then(|| category.to_string());
    })
}

pub fn remove_from_collection(collection: &[ModRecord], id: &str) -> Result<Vec<ModRecord>, SError> {
    if !collection.iter().any(|r| r.id == id) {
        return Err(SError::NotFound(id.to_string()));
    }
    Ok(collection.iter().filter(|r| r.id != id).cloned().collect())
}

/// Appends a collected mod to the end of the load order. The new server entry
/// is unpinned. Already-enabled mods leave the order as it is.
pub fn enable_from_collection(registry: &Registry, id: &str) -> Result<Vec<ModRecord>, SError> {
    let entry = registry
        .collection
        .get(id)
        .ok_or_else(|| SError::NotFound(id.to_string()))?;

    let mut enabled = registry.enabled.to_vec();
    if !registry.enabled.contains(id) {
        enabled.push(ModRecord {
            id: entry.id.clone(),
            name: Some(entry.display_name().to_string()),
            ..Default::default()
        });
    }
    Ok(enabled)
}

fn update_entry<F>(collection: &[ModRecord], id: &str, edit: F) -> Result<Vec<ModRecord>, SError>
where
    F: FnOnce(&mut ModRecord),
{
    let mut out = collection.to_vec();
    let record = out
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| SError::NotFound(id.to_string()))?;
    edit(record);
    Ok(out)
}

/// Direct and transitive dependency counts of `id` within `closure`.
pub fn dependency_rollup(id: &str, closure: &ResolvedClosure) -> DependencyRollup {
    let direct: HashSet<&String> = closure.dependencies_of(id).iter().filter(|d| d.as_str() != id).collect();
    let mut reachable = closure.reachable_from([id]);
    reachable.remove(id);

    DependencyRollup {
        direct: direct.len(),
        transitive: reachable.len(),
    }
}

/// Number of distinct direct dependencies of every collection entry.
pub fn dependency_counts(collection: &[ModRecord]) -> BTreeMap<String, usize> {
    collection
        .iter()
        .map(|r| {
            let distinct: HashSet<&String> = r.dependency_ids.iter().collect();
            (r.id.clone(), distinct.len())
        })
        .collect()
}

/// Pinned entries whose pin differs from the catalog's current release.
pub fn pin_drift(collection: &[ModRecord], closure: &ResolvedClosure) -> Vec<PinDrift> {
    collection
        .iter()
        .filter(|r| r.is_pinned())
        .filter_map(|r| {
            let latest = closure
                .get(&r.id)
                .filter(|_| !closure.is_unresolved(&r.id))
                .map(|c| c.version.as_str())
                .filter(|v| !v.is_empty())?;
            (latest != r.version).then(|| PinDrift {
                id: r.id.clone(),
                pinned: r.version.clone(),
                latest: latest.to_string(),
                newer_available: is_newer(latest, &r.version),
            })
        })
        .collect()
}

/// Semver ordering when both sides parse, plain inequality otherwise.
fn is_newer(latest: &str, pinned: &str) -> bool {
    let parse = |v: &str| Version::parse(v.trim().trim_start_matches('v'));
    match (parse(latest), parse(pinned)) {
        (Ok(l), Ok(p)) => l > p,
        _ => latest != pinned,
    }
}
