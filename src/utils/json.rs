use crate::models::error::SError;
use camino::Utf8Path;

pub struct Json;

impl Json {
    /// Pretty-prints `data` to `path`, creating the parent directory. The file
    /// is written to a sibling temp file first and renamed into place.
    pub fn write<T: serde::Serialize>(path: &Utf8Path, data: &T) -> Result<(), SError> {
        if let Some(parent) = path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(data)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn read<T: serde::de::DeserializeOwned>(path: &Utf8Path) -> Result<T, SError> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str::<T>(&s)?)
    }

    /// Like [`Json::read`], but a missing file yields `T::default()`.
    pub fn read_or_default<T>(path: &Utf8Path) -> Result<T, SError>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if !path.exists() {
            return Ok(T::default());
        }
        Self::read(path)
    }
}
