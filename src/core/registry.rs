// src/core/registry.rs
use crate::models::mod_dto::{ModRecord, ModStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Records from one source, looked up by id and kept in source order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordIndex {
    order: Vec<String>,
    by_id: HashMap<String, ModRecord>,
}

impl RecordIndex {
    /// First occurrence of an id wins, both for the record and its position.
    /// Ids are trimmed; records with a blank id are dropped.
    pub fn from_records<I: IntoIterator<Item = ModRecord>>(records: I) -> Self {
        let mut index = Self::default();
        for mut record in records {
            let trimmed = record.id.trim();
            if trimmed.is_empty() {
                warn!("Ignoring record without an id");
                continue;
            }
            if trimmed.len() != record.id.len() {
                record.id = trimmed.to_string();
            }
            if index.by_id.contains_key(&record.id) {
                debug!("Ignoring duplicate record for {}", record.id);
                continue;
            }
            index.order.push(record.id.clone());
            index.by_id.insert(record.id.clone(), record);
        }
        index
    }

    pub fn get(&self, id: &str) -> Option<&ModRecord> {
        self.by_id.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModRecord> {
        self.order.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn to_vec(&self) -> Vec<ModRecord> {
        self.iter().cloned().collect()
    }
}

/// Snapshot of the three sources of truth. Rebuilt on every refresh; the
/// engine never edits it in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Registry {
    pub installed: RecordIndex,
    /// Load order matters here.
    pub enabled: RecordIndex,
    pub collection: RecordIndex,
}

/// Indexes the three snapshots by id.
///
/// Server config entries carry no dependency data of their own, so enabled
/// records take their dependencies and size from the matching installed
/// record and are left empty otherwise.
pub fn build_registry(
    installed: Vec<ModRecord>,
    enabled: Vec<ModRecord>,
    collection: Vec<ModRecord>,
) -> Registry {
    let installed = RecordIndex::from_records(installed);

    let enabled = RecordIndex::from_records(enabled.into_iter().map(|mut record| {
        match installed.get(&record.id) {
            Some(on_disk) => {
                record.dependency_ids = on_disk.dependency_ids.clone();
                record.size_bytes = record.size_bytes.or(on_disk.size_bytes);
            }
            None => record.dependency_ids.clear(),
        }
        record
    }));

    let registry = Registry {
        installed,
        enabled,
        collection: RecordIndex::from_records(collection),
    };

    debug!(
        installed = registry.installed.len(),
        enabled = registry.enabled.len(),
        collection = registry.collection.len(),
        "Registry built"
    );
    registry
}

/// Display name for `id`: disk first, then server config, then collection,
/// then the id itself. Records without a usable name are skipped.
pub fn name_for(id: &str, registry: &Registry) -> String {
    [&registry.installed, &registry.enabled, &registry.collection]
        .into_iter()
        .filter_map(|source| source.get(id))
        .find_map(|record| record.name.as_deref().filter(|n| !n.trim().is_empty()))
        .unwrap_or(id)
        .to_string()
}

impl Registry {
    pub fn status(&self, id: &str) -> ModStatus {
        ModStatus {
            installed: self.installed.contains(id),
            enabled: self.enabled.contains(id),
        }
    }

    /// Known direct dependencies: disk first, then collection.
    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.installed
            .get(id)
            .filter(|r| !r.dependency_ids.is_empty())
            .or_else(|| self.collection.get(id))
            .map(|r| r.dependency_ids.as_slice())
            .unwrap_or_default()
    }

    pub fn installed_size(&self, id: &str) -> Option<u64> {
        self.installed.get(id).and_then(|r| r.size_bytes)
    }

    /// The same snapshot with a new collection swapped in.
    pub fn with_collection(&self, collection: Vec<ModRecord>) -> Registry {
        Registry {
            installed: self.installed.clone(),
            enabled: self.enabled.clone(),
            collection: RecordIndex::from_records(collection),
        }
    }

    /// The same snapshot with a new enabled load order swapped in.
    pub fn with_enabled(&self, enabled: Vec<ModRecord>) -> Registry {
        build_registry(self.installed.to_vec(), enabled, self.collection.to_vec())
    }
}

/// Registry handle shared with the UI layer. Readers get a cloned snapshot;
/// writers replace the whole value at once.
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Registry>>,
}

impl SharedRegistry {
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    pub fn snapshot(&self) -> Registry {
        self.inner.read().clone()
    }

    pub fn replace(&self, registry: Registry) {
        *self.inner.write() = registry;
    }

    /// Swaps in a new collection, keeping whatever installed and enabled
    /// snapshots are current.
    pub fn replace_collection(&self, collection: Vec<ModRecord>) {
        let mut registry = self.inner.write();
        *registry = registry.with_collection(collection);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: &str, name: &str) -> ModRecord {
        ModRecord::new(id).with_name(name)
    }

    #[test]
    fn name_lookup_prefers_disk_then_config_then_collection() {
        let registry = build_registry(
            vec![rec("A", "A (disk)")],
            vec![rec("A", "A (config)"), rec("B", "B (config)")],
            vec![rec("A", "A (list)"), rec("B", "B (list)"), rec("C", "C (list)")],
        );

        assert_eq!(name_for("A", &registry), "A (disk)");
        assert_eq!(name_for("B", &registry), "B (config)");
        assert_eq!(name_for("C", &registry), "C (list)");
        assert_eq!(name_for("D", &registry), "D");
    }

    #[test]
    fn nameless_records_fall_through() {
        let registry = build_registry(vec![ModRecord::new("A")], vec![], vec![rec("A", "Alpha")]);
        assert_eq!(name_for("A", &registry), "Alpha");
    }

    #[test]
    fn enabled_records_only_get_dependencies_from_disk() {
        let registry = build_registry(
            vec![ModRecord::new("A").with_dependencies(["B"]).with_size(10)],
            vec![
                ModRecord::new("A"),
                ModRecord::new("Z").with_dependencies(["Q"]),
            ],
            vec![],
        );

        assert_eq!(registry.enabled.get("A").unwrap().dependency_ids, vec!["B"]);
        assert_eq!(registry.enabled.get("A").unwrap().size_bytes, Some(10));
        assert!(registry.enabled.get("Z").unwrap().dependency_ids.is_empty());
    }

    #[test]
    fn duplicate_enabled_ids_keep_first_load_position() {
        let registry = build_registry(
            vec![],
            vec![rec("A", "first"), rec("B", "b"), rec("A", "second")],
            vec![],
        );
        assert_eq!(registry.enabled.ids(), ["A".to_string(), "B".to_string()]);
        assert_eq!(registry.enabled.get("A").unwrap().display_name(), "first");
    }

    #[test]
    fn padded_ids_match_their_trimmed_form() {
        let registry = build_registry(
            vec![],
            vec![ModRecord::new("A "), ModRecord::new(" "), ModRecord::new("A")],
            vec![ModRecord::new(" A")],
        );
        assert_eq!(registry.enabled.ids(), ["A".to_string()]);
        assert!(registry.collection.contains("A"));
    }

    #[test]
    fn membership_is_independent_per_source() {
        let registry = build_registry(vec![ModRecord::new("X")], vec![ModRecord::new("Y")], vec![]);
        assert_eq!(registry.status("X"), ModStatus { installed: true, enabled: false });
        assert_eq!(registry.status("Y"), ModStatus { installed: false, enabled: true });
        assert_eq!(registry.status("Z"), ModStatus::default());
    }

    #[test]
    fn shared_registry_swaps_whole_snapshots() {
        let shared = SharedRegistry::new(Registry::default());
        let before = shared.snapshot();
        shared.replace(before.with_collection(vec![ModRecord::new("A")]));

        assert!(before.collection.is_empty());
        assert!(shared.snapshot().collection.contains("A"));
    }
}
