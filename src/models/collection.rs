use crate::models::mod_dto::ModRecord;
use serde::{Deserialize, Serialize};

/// A user-defined, persisted group of mods.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ModRecord>,
    pub created_at: u64,
    pub updated_at: u64,
    #[serde(default)]
    pub revision: u64,
}

/// Result of folding new mods into a collection.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct SyncOutcome {
    pub added: Vec<ModRecord>,
    /// The full collection after the merge, in collection order.
    pub collection: Vec<ModRecord>,
    /// Ids whose dependency data could not be fetched.
    pub unresolved: Vec<String>,
}

impl SyncOutcome {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct DependencyRollup {
    pub direct: usize,
    pub transitive: usize,
}

/// A pinned collection entry whose pin differs from the catalog's release.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PinDrift {
    pub id: String,
    pub pinned: String,
    pub latest: String,
    /// True when the catalog release is newer by semver ordering.
    pub newer_available: bool,
}
