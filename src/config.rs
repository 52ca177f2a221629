use crate::models::error::SError;
use crate::models::paths::DataPathRules;
use camino::Utf8PathBuf;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

const APP_NAME: &str = "mod_collector";

pub const DEFAULT_MAX_TREE_DEPTH: usize = 50;
pub const DEFAULT_MAX_TREE_NODES: usize = 10_000;
pub const DEFAULT_CATALOG_BATCH_SIZE: usize = 100;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineSettings {
    pub version: u8,
    /// Hard cap on dependency tree depth.
    pub max_tree_depth: usize,
    /// Nodes a dependency tree may grow to before expansion stops.
    pub max_tree_nodes: usize,
    /// Most ids sent to the catalog in one request.
    pub catalog_batch_size: usize,
    /// Extra attempts for a batch that failed in transport.
    pub catalog_retries: u32,
    pub data_dir: Utf8PathBuf,
    pub log_filter: String,
    pub log_to_file: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let base_dir = ProjectDirs::from("com", "martes", APP_NAME)
            .map(|dirs| dirs.data_dir().to_path_buf())
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|exe_path| exe_path.parent().map(|p| p.to_path_buf()))
            })
            .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
            .unwrap_or_else(|| Utf8PathBuf::from("."));

        Self {
            version: 0,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            max_tree_nodes: DEFAULT_MAX_TREE_NODES,
            catalog_batch_size: DEFAULT_CATALOG_BATCH_SIZE,
            catalog_retries: 1,
            data_dir: base_dir,
            log_filter: "info".into(),
            log_to_file: false,
        }
    }
}

impl EngineSettings {
    pub fn load() -> Result<EngineSettings, SError> {
        Ok(confy::load(APP_NAME, None)?)
    }

    /// Loads settings, falling back to defaults when the file is unreadable.
    pub fn load_or_default() -> EngineSettings {
        Self::load().unwrap_or_else(|e| {
            warn!("Falling back to default settings: {e}");
            EngineSettings::default()
        })
    }

    pub fn save(&self) -> Result<(), SError> {
        Ok(confy::store(APP_NAME, None, self)?)
    }

    pub fn batch_size(&self) -> usize {
        self.catalog_batch_size.max(1)
    }

    pub fn max_depth(&self) -> usize {
        self.max_tree_depth.max(1)
    }

    pub fn max_nodes(&self) -> usize {
        self.max_tree_nodes.max(1)
    }

    pub fn data_paths(&self) -> DataPathRules {
        DataPathRules::new(&self.data_dir)
    }
}
