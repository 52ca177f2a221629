// src/core/collection_store.rs
use crate::models::collection::Collection;
use crate::models::error::SError;
use crate::models::mod_dto::ModRecord;
use crate::utils::json::Json;
use crate::utils::time::get_unix_timestamp;
use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where collections are persisted. Saves replace the whole item list.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn load_collection(&self, collection_id: &str) -> Result<Vec<ModRecord>, SError>;

    /// Fails with [`SError::PersistenceConflict`] when the stored collection
    /// changed since this store last loaded or saved it.
    async fn save_collection(&self, collection_id: &str, items: &[ModRecord]) -> Result<(), SError>;
}

struct StoreInner {
    path: Utf8PathBuf,
    /// Revision of each collection as of our last load or save.
    seen: Mutex<HashMap<String, u64>>,
    /// Serializes read-modify-write cycles on the file.
    io: Mutex<()>,
}

/// All collections in one `collections.json` file.
#[derive(Clone)]
pub struct JsonCollectionStore {
    inner: Arc<StoreInner>,
}

impl JsonCollectionStore {
    pub fn new(path: &Utf8Path) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                path: path.to_owned(),
                seen: Mutex::new(HashMap::new()),
                io: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.inner.path
    }

    pub async fn list_collections(&self) -> Result<Vec<Collection>, SError> {
        self.blocking(|inner| {
            let _io = inner.io.lock();
            let all = inner.read_all()?;
            inner.observe(&all);
            Ok(all)
        })
        .await
    }

    pub async fn create_collection(&self, name: &str) -> Result<Collection, SError> {
        let name = name.trim().to_string();
        self.blocking(move |inner| {
            let _io = inner.io.lock();
            let mut all = inner.read_all()?;
            let now = get_unix_timestamp();
            let collection = Collection {
                id: uuid::Uuid::new_v4().to_string(),
                name: if name.is_empty() { "My Collection".into() } else { name },
                items: Vec::new(),
                created_at: now,
                updated_at: now,
                revision: 1,
            };
            all.push(collection.clone());
            Json::write(&inner.path, &all)?;
            inner.seen.lock().insert(collection.id.clone(), collection.revision);
            info!("Created collection {} ({})", collection.name, collection.id);
            Ok(collection)
        })
        .await
    }

    pub async fn delete_collection(&self, collection_id: &str) -> Result<(), SError> {
        let id = collection_id.to_string();
        self.blocking(move |inner| {
            let _io = inner.io.lock();
            let mut all = inner.read_all()?;
            let before = all.len();
            all.retain(|c| c.id != id);
            if all.len() == before {
                return Err(SError::NotFound(id));
            }
            Json::write(&inner.path, &all)?;
            inner.seen.lock().remove(&id);
            info!("Deleted collection {id}");
            Ok(())
        })
        .await
    }

    /// Runs file work off the async executor.
    async fn blocking<F, R>(&self, f: F) -> Result<R, SError>
    where
        F: FnOnce(&StoreInner) -> Result<R, SError> + Send + 'static,
        R: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(inner.as_ref())).await?
    }
}

impl StoreInner {
    fn read_all(&self) -> Result<Vec<Collection>, SError> {
        Json::read_or_default(&self.path)
    }

    fn observe(&self, all: &[Collection]) {
        let mut seen = self.seen.lock();
        for c in all {
            seen.insert(c.id.clone(), c.revision);
        }
    }
}

#[async_trait]
impl CollectionStore for JsonCollectionStore {
    async fn load_collection(&self, collection_id: &str) -> Result<Vec<ModRecord>, SError> {
        let id = collection_id.to_string();
        self.blocking(move |inner| {
            let _io = inner.io.lock();
            let collection = inner
                .read_all()?
                .into_iter()
                .find(|c| c.id == id)
                .ok_or_else(|| SError::NotFound(id.clone()))?;
            inner.seen.lock().insert(id, collection.revision);
            Ok(collection.items)
        })
        .await
    }

    async fn save_collection(&self, collection_id: &str, items: &[ModRecord]) -> Result<(), SError> {
        let id = collection_id.to_string();
        let items = items.to_vec();
        self.blocking(move |inner| {
            let _io = inner.io.lock();
            let mut all = inner.read_all()?;
            let now = get_unix_timestamp();
            let last_seen = inner.seen.lock().get(&id).copied();

            let revision = match all.iter_mut().find(|c| c.id == id) {
                Some(stored) => {
                    if let Some(seen) = last_seen {
                        if stored.revision != seen {
                            warn!(
                                "Rejecting save of {id}: stored revision {} but we last saw {seen}",
                                stored.revision
                            );
                            return Err(SError::PersistenceConflict(id));
                        }
                    }
                    stored.items = items;
                    stored.updated_at = now;
                    stored.revision += 1;
                    stored.revision
                }
                None => {
                    all.push(Collection {
                        id: id.clone(),
                        name: id.clone(),
                        items,
                        created_at: now,
                        updated_at: now,
                        revision: 1,
                    });
                    1
                }
            };

            Json::write(&inner.path, &all)?;
            inner.seen.lock().insert(id.clone(), revision);
            debug!("Saved collection {id} at revision {revision}");
            Ok(())
        })
        .await
    }
}

/// Store kept in memory, for tests and previews.
#[derive(Default)]
pub struct MemoryCollectionStore {
    collections: Mutex<HashMap<String, Vec<ModRecord>>>,
    saves: Mutex<usize>,
    conflict_next_save: Mutex<bool>,
}

impl MemoryCollectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(self, collection_id: &str, items: Vec<ModRecord>) -> Self {
        self.collections.lock().insert(collection_id.to_string(), items);
        self
    }

    /// The next save fails with a conflict, as if someone else wrote first.
    pub fn conflict_on_next_save(&self) {
        *self.conflict_next_save.lock() = true;
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }

    pub fn items(&self, collection_id: &str) -> Option<Vec<ModRecord>> {
        self.collections.lock().get(collection_id).cloned()
    }
}

#[async_trait]
impl CollectionStore for MemoryCollectionStore {
    async fn load_collection(&self, collection_id: &str) -> Result<Vec<ModRecord>, SError> {
        self.items(collection_id)
            .ok_or_else(|| SError::NotFound(collection_id.to_string()))
    }

    async fn save_collection(&self, collection_id: &str, items: &[ModRecord]) -> Result<(), SError> {
        if std::mem::take(&mut *self.conflict_next_save.lock()) {
            return Err(SError::PersistenceConflict(collection_id.to_string()));
        }
        self.collections
            .lock()
            .insert(collection_id.to_string(), items.to_vec());
        *self.saves.lock() += 1;
        Ok(())
    }
}
