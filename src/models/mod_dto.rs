use serde::{Deserialize, Serialize};

/// A mod as seen by one of the three sources (disk, server config, collection).
///
/// Every field except `id` may be missing depending on where the record came
/// from: the server config knows ids and names only, the disk scan knows
/// dependencies and sizes, the collection carries user edits.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ModRecord {
    #[serde(rename = "modId", alias = "id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Empty means unpinned (track latest).
    #[serde(default)]
    pub version: String,
    #[serde(default, alias = "deps", alias = "dependencies")]
    pub dependency_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ModRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_dependencies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_size(mut self, bytes: u64) -> Self {
        self.size_bytes = Some(bytes);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Name for display, falling back to the id until the record is enriched.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
    }

    pub fn is_pinned(&self) -> bool {
        !self.version.is_empty()
    }

    /// Category tag, empty when unset.
    pub fn category_tag(&self) -> &str {
        self.category.as_deref().unwrap_or("")
    }
}

/// What the catalog knows about one mod.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub dependency_ids: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_dependencies<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependency_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_size(mut self, bytes: u64) -> Self {
        self.size_bytes = Some(bytes);
        self
    }

    /// Converts the catalog view into a record for `id`. The version here is
    /// the catalog's current release, not a user pin.
    pub fn to_record(&self, id: &str) -> ModRecord {
        ModRecord {
            id: id.to_string(),
            name: Some(self.name.clone()).filter(|n| !n.is_empty()),
            version: self.version.clone().unwrap_or_default(),
            dependency_ids: self.dependency_ids.clone(),
            size_bytes: self.size_bytes,
            category: None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ModStatus {
    pub installed: bool,
    pub enabled: bool,
}
