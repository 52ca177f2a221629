use crate::config::EngineSettings;
use crate::core::catalog::CatalogClient;
use crate::core::collection_store::CollectionStore;
use crate::core::reconciler;
use crate::core::registry::{build_registry, Registry, SharedRegistry};
use crate::core::resolver::{resolve_with, ResolverOptions};
use crate::core::tree_builder::build_tree_bounded;
use crate::models::closure::ResolvedClosure;
use crate::models::collection::SyncOutcome;
use crate::models::error::SError;
use crate::models::mod_dto::ModRecord;
use crate::models::tree::TreeNode;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// Ties the catalog, the collection store and the shared registry together.
///
/// Catalog lookups run without holding anything. Every change to the
/// collection is then applied to the registry as it is at that moment, under
/// `writes`, persisted, and only then swapped in. A failed save leaves the
/// registry as it was, and two operations never overwrite each other's edits.
pub struct CollectionService<C: CatalogClient, S: CollectionStore> {
    catalog: C,
    store: S,
    settings: EngineSettings,
    registry: SharedRegistry,
    /// Held from reading the current collection until the new one is swapped in.
    writes: Mutex<()>,
}

impl<C: CatalogClient, S: CollectionStore> CollectionService<C, S> {
    pub fn new(catalog: C, store: S, settings: EngineSettings) -> Self {
        Self {
            catalog,
            store,
            settings,
            registry: SharedRegistry::default(),
            writes: Mutex::new(()),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> Registry {
        self.registry.snapshot()
    }

    pub fn shared_registry(&self) -> SharedRegistry {
        self.registry.clone()
    }

    /// Rebuilds the registry from fresh disk and server snapshots plus the
    /// stored collection. A collection that does not exist yet starts empty.
    #[instrument(skip(self, installed, enabled))]
    pub async fn refresh(
        &self,
        installed: Vec<ModRecord>,
        enabled: Vec<ModRecord>,
        collection_id: &str,
    ) -> Result<Registry, SError> {
        let _writes = self.writes.lock().await;
        let collection = match self.store.load_collection(collection_id).await {
            Ok(items) => items,
            Err(SError::NotFound(_)) => {
                info!("Collection {collection_id} not stored yet, starting empty");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let registry = build_registry(installed, enabled, collection);
        self.registry.replace(registry.clone());
        Ok(registry)
    }

    pub async fn resolve(&self, seeds: &[String]) -> ResolvedClosure {
        resolve_with(seeds, &self.catalog, ResolverOptions::from(&self.settings)).await
    }

    pub fn dependency_tree(&self, root_id: &str, closure: &ResolvedClosure) -> TreeNode {
        build_tree_bounded(
            root_id,
            closure,
            Some(self.settings.max_depth()),
            self.settings.max_nodes(),
        )
    }

    /// Pulls every enabled mod (and its dependencies) into the collection.
    /// Nothing is resolved or written when the collection is already complete.
    #[instrument(skip(self))]
    pub async fn sync_and_save(&self, collection_id: &str) -> Result<SyncOutcome, SError> {
        let missing = reconciler::missing_from_collection(&self.registry.snapshot());
        if missing.is_empty() {
            debug!("Collection already holds every enabled mod");
            return Ok(SyncOutcome {
                collection: self.registry.snapshot().collection.to_vec(),
                ..Default::default()
            });
        }

        let closure = self.resolve(&missing).await;

        let _writes = self.writes.lock().await;
        let current = self.registry.snapshot();
        let outcome = reconciler::merge_closure(&current, &missing, &closure);
        if outcome.is_noop() {
            return Ok(outcome);
        }
        if !outcome.unresolved.is_empty() {
            warn!("{} mods could not be resolved: {:?}", outcome.unresolved.len(), outcome.unresolved);
        }

        self.commit(collection_id, outcome.collection.clone()).await?;
        info!("Added {} mods to collection {collection_id}", outcome.added.len());
        Ok(outcome)
    }

    /// Adds one mod and its dependency closure.
    #[instrument(skip(self))]
    pub async fn add_and_save(&self, collection_id: &str, root_id: &str) -> Result<SyncOutcome, SError> {
        let closure = self.resolve(&[root_id.to_string()]).await;

        let _writes = self.writes.lock().await;
        let current = self.registry.snapshot();
        let outcome = reconciler::add_with_dependencies(&current, root_id, &closure);
        if !outcome.is_noop() {
            self.commit(collection_id, outcome.collection.clone()).await?;
        }
        Ok(outcome)
    }

    pub async fn set_category_and_save(
        &self,
        collection_id: &str,
        id: &str,
        category: &str,
    ) -> Result<Vec<ModRecord>, SError> {
        self.edit_and_save(collection_id, |items| reconciler::set_category(id, category, items))
            .await
    }

    pub async fn toggle_pin_and_save(
        &self,
        collection_id: &str,
        id: &str,
        current_version: &str,
    ) -> Result<Vec<ModRecord>, SError> {
        self.edit_and_save(collection_id, |items| reconciler::toggle_pin_in(items, id, current_version))
            .await
    }

    pub async fn remove_and_save(&self, collection_id: &str, id: &str) -> Result<Vec<ModRecord>, SError> {
        self.edit_and_save(collection_id, |items| reconciler::remove_from_collection(items, id))
            .await
    }

    async fn edit_and_save<F>(&self, collection_id: &str, edit: F) -> Result<Vec<ModRecord>, SError>
    where
        F: FnOnce(&[ModRecord]) -> Result<Vec<ModRecord>, SError>,
    {
        let _writes = self.writes.lock().await;
        let collection = edit(&self.registry.snapshot().collection.to_vec())?;
        self.commit(collection_id, collection.clone()).await?;
        Ok(collection)
    }

    /// Caller holds `writes`.
    async fn commit(&self, collection_id: &str, collection: Vec<ModRecord>) -> Result<(), SError> {
        self.store.save_collection(collection_id, &collection).await?;
        self.registry.replace_collection(collection);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::MemoryCatalog;
    use crate::core::collection_store::{JsonCollectionStore, MemoryCollectionStore};

    fn service(store: MemoryCollectionStore) -> CollectionService<MemoryCatalog, MemoryCollectionStore> {
        let catalog = MemoryCatalog::new().with_mod("A", &["B"]).with_mod("B", &[]);
        CollectionService::new(catalog, store, EngineSettings::default())
    }

    #[tokio::test]
    async fn failed_save_leaves_registry_untouched() {
        let svc = service(MemoryCollectionStore::new());
        svc.refresh(vec![], vec![ModRecord::new("A")], "c1").await.unwrap();

        svc.store().conflict_on_next_save();
        let err = svc.sync_and_save("c1").await.unwrap_err();
        assert_eq!(err, SError::PersistenceConflict("c1".into()));
        assert!(svc.registry().collection.is_empty());

        let outcome = svc.sync_and_save("c1").await.unwrap();
        assert_eq!(outcome.added.len(), 2);
        assert_eq!(svc.registry().collection.ids(), ["A", "B"]);
        assert_eq!(svc.store().save_count(), 1);
    }

    #[tokio::test]
    async fn complete_collection_is_not_written() {
        let store = MemoryCollectionStore::new().with_collection("c1", vec![ModRecord::new("A")]);
        let svc = service(store);
        svc.refresh(vec![], vec![ModRecord::new("A")], "c1").await.unwrap();

        let outcome = svc.sync_and_save("c1").await.unwrap();
        assert!(outcome.is_noop());
        assert_eq!(svc.store().save_count(), 0);
        assert_eq!(svc.catalog().request_count(), 0);
    }

    #[tokio::test]
    async fn category_edit_is_persisted() {
        let store = MemoryCollectionStore::new().with_collection("c1", vec![ModRecord::new("A")]);
        let svc = service(store);
        svc.refresh(vec![], vec![], "c1").await.unwrap();

        svc.set_category_and_save("c1", "A", "Maps").await.unwrap();
        assert_eq!(svc.store().items("c1").unwrap()[0].category.as_deref(), Some("Maps"));
        assert_eq!(svc.registry().collection.get("A").unwrap().category.as_deref(), Some("Maps"));
    }

    /// Catalog that hands control back to the runtime before answering.
    struct SlowCatalog(MemoryCatalog);

    #[async_trait::async_trait]
    impl CatalogClient for SlowCatalog {
        async fn lookup(
            &self,
            ids: &[String],
        ) -> Result<std::collections::HashMap<String, crate::models::mod_dto::CatalogEntry>, SError> {
            for _ in 0..50 {
                tokio::task::yield_now().await;
            }
            self.0.lookup(ids).await
        }

        fn name(&self) -> &str {
            "slow"
        }
    }

    #[tokio::test]
    async fn category_edit_during_sync_survives() {
        let tmp = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(tmp.path().join("collections.json")).unwrap();
        let store = JsonCollectionStore::new(&path);
        let cid = store.create_collection("Server").await.unwrap().id;
        store.save_collection(&cid, &[ModRecord::new("B")]).await.unwrap();

        let catalog = SlowCatalog(MemoryCatalog::new().with_mod("A", &[]).with_mod("B", &[]));
        let svc = CollectionService::new(catalog, store, EngineSettings::default());
        svc.refresh(vec![], vec![ModRecord::new("A"), ModRecord::new("B")], &cid)
            .await
            .unwrap();

        let (synced, edited) = tokio::join!(
            svc.sync_and_save(&cid),
            svc.set_category_and_save(&cid, "B", "Maps")
        );
        assert_eq!(synced.unwrap().added.len(), 1);
        edited.unwrap();

        let stored = svc.store().load_collection(&cid).await.unwrap();
        assert_eq!(stored.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), ["B", "A"]);
        assert_eq!(stored[0].category.as_deref(), Some("Maps"));
        assert_eq!(svc.registry().collection.get("B").unwrap().category.as_deref(), Some("Maps"));
    }

    #[tokio::test]
    async fn commit_swaps_only_the_collection() {
        let svc = service(MemoryCollectionStore::new().with_collection("c1", vec![ModRecord::new("A")]));
        svc.refresh(vec![], vec![], "c1").await.unwrap();
        svc.refresh(vec![ModRecord::new("A").with_size(7)], vec![], "c1").await.unwrap();

        svc.set_category_and_save("c1", "A", "Maps").await.unwrap();
        assert_eq!(svc.registry().installed_size("A"), Some(7));
    }
}
