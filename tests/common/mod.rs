#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use mod_collector_lib::core::catalog::MemoryCatalog;
use mod_collector_lib::models::mod_dto::{CatalogEntry, ModRecord};
use std::fs;
use tempfile::TempDir;

/// Temp directory with an `addons` folder and a data folder for stores.
pub fn setup_test_env() -> (TempDir, Utf8PathBuf, Utf8PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();

    let addons = root.join("addons");
    let data = root.join("data");
    fs::create_dir_all(&addons).unwrap();
    fs::create_dir_all(&data).unwrap();

    (tmp, addons, data)
}

/// Writes `<addons>/<folder>/addon.gproj` plus a payload file.
pub fn write_addon(addons: &Utf8Path, folder: &str, name: &str, version: &str, deps: &[&str]) -> Utf8PathBuf {
    let dir = addons.join(folder);
    fs::create_dir_all(&dir).unwrap();

    let deps_xml: String = deps
        .iter()
        .map(|d| format!("    <Dependency value=\"{{{d}}}\"/>\n"))
        .collect();
    let project = format!(
        "<?xml version=\"1.0\"?>\n<Project>\n  <Property name=\"ProjectName\" value=\"{name}\"/>\n  <Property name=\"ProjectVersion\" value=\"{version}\"/>\n  <Dependencies>\n{deps_xml}  </Dependencies>\n</Project>\n"
    );
    fs::write(dir.join("addon.gproj"), project).unwrap();
    fs::write(dir.join("data.pak"), vec![0u8; 1024]).unwrap();
    dir
}

/// A -> {B, C}, B -> D, C -> D, D -> A (a diamond closed into a cycle).
pub fn diamond_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_entry("A", CatalogEntry::new("Alpha").with_dependencies(["B", "C"]).with_version("1.2.0"))
        .with_entry("B", CatalogEntry::new("Bravo").with_dependencies(["D"]))
        .with_entry("C", CatalogEntry::new("Charlie").with_dependencies(["D"]))
        .with_entry("D", CatalogEntry::new("Delta").with_dependencies(["A"]).with_size(2048))
}

pub fn seeds(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|s| s.to_string()).collect()
}

pub fn ids(records: &[ModRecord]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}
