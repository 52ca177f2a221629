use crate::models::error::SError;
use crate::models::mod_dto::ModRecord;
use crate::models::paths::ADDON_PROJECT_FILE;
use crate::utils::id::ModId;
use camino::Utf8Path;
use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Deserialize, Debug, Default)]
struct Project {
    #[serde(rename = "Property", default)]
    properties: Vec<Property>,
    #[serde(rename = "Dependencies", default)]
    dependencies: Option<Dependencies>,
}

#[derive(Deserialize, Debug)]
struct Property {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@value", default)]
    value: String,
}

#[derive(Deserialize, Debug, Default)]
struct Dependencies {
    #[serde(rename = "Dependency", default)]
    items: Vec<Dependency>,
}

#[derive(Deserialize, Debug)]
struct Dependency {
    #[serde(rename = "@value")]
    value: String,
}

impl Project {
    fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Lists the addons installed under `root`, one record per project file.
///
/// Project files that fail to parse are skipped with a warning so one broken
/// addon does not hide the rest.
pub fn scan_addons(root: &Utf8Path) -> Result<Vec<ModRecord>, SError> {
    if !root.is_dir() {
        return Err(SError::IOError(format!("addon directory not found: {root}")));
    }

    let mut mods = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file()
            || !entry
                .file_name()
                .to_string_lossy()
                .eq_ignore_ascii_case(ADDON_PROJECT_FILE)
        {
            continue;
        }

        let Some(path) = Utf8Path::from_path(entry.path()) else {
            warn!("Skipping non UTF-8 path {:?}", entry.path());
            continue;
        };

        match read_addon(path) {
            Ok(Some(record)) => {
                debug!("Found addon {} at {path}", record.id);
                mods.push(record);
            }
            Ok(None) => warn!("Could not determine an id for {path}"),
            Err(e) => warn!("Skipping {path}: {e}"),
        }
    }

    Ok(mods)
}

/// Parses one project file. `Ok(None)` when no id can be derived.
pub fn read_addon(project_file: &Utf8Path) -> Result<Option<ModRecord>, SError> {
    let text = std::fs::read_to_string(project_file)?;
    let project: Project = quick_xml::de::from_str(&text)?;
    let folder = project_file.parent().unwrap_or(project_file);

    let id = folder
        .file_name()
        .and_then(ModId::from_folder_name)
        .or_else(|| project.property("GUID").and_then(|g| ModId::normalize(g).ok()));
    let Some(id) = id else {
        return Ok(None);
    };

    let dependency_ids = project
        .dependencies
        .iter()
        .flat_map(|d| d.items.iter())
        .filter_map(|d| ModId::normalize(&d.value).ok())
        .collect::<Vec<_>>();

    let mut record = ModRecord::new(id)
        .with_dependencies(dependency_ids)
        .with_size(folder_size(folder));
    if let Some(name) = project.property("ProjectName") {
        record = record.with_name(name);
    }
    if let Some(version) = project.property("ProjectVersion") {
        record = record.with_version(version);
    }
    Ok(Some(record))
}

fn folder_size(folder: &Utf8Path) -> u64 {
    WalkDir::new(folder)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}
