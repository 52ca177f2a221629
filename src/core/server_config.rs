//! Reads the enabled-mod load order out of a server config document.

use crate::models::error::SError;
use crate::models::mod_dto::ModRecord;
use crate::utils::id::ModId;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ConfigMod {
    #[serde(default)]
    mod_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Enabled mods in load order, from `game.mods` or the legacy top-level
/// `mods`. Server entries never carry dependency data.
pub fn enabled_from_config(config: &Value) -> Result<Vec<ModRecord>, SError> {
    let list = config
        .get("game")
        .and_then(|g| g.get("mods"))
        .filter(|m| m.is_array())
        .or_else(|| config.get("mods").filter(|m| m.is_array()));

    let Some(list) = list else {
        return Ok(Vec::new());
    };

    let entries: Vec<ConfigMod> = serde_json::from_value(list.clone())?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let raw = entry.mod_id.or(entry.id).unwrap_or_default();
            let id = match ModId::normalize(&raw) {
                Ok(id) => id,
                Err(e) => {
                    warn!("Ignoring server config entry: {e}");
                    return None;
                }
            };
            let mut record = ModRecord::new(id).with_version(entry.version.unwrap_or_default());
            record.name = entry.name.filter(|n| !n.trim().is_empty());
            Some(record)
        })
        .collect())
}

pub fn enabled_from_config_str(text: &str) -> Result<Vec<ModRecord>, SError> {
    let value: Value = serde_json::from_str(text)?;
    enabled_from_config(&value)
}
