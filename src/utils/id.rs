use crate::models::error::SError;

const MIN_GUID_LEN: usize = 8;

fn is_guid(s: &str) -> bool {
    s.len() >= MIN_GUID_LEN && s.chars().all(|c| c.is_ascii_hexdigit())
}

pub struct ModId;

impl ModId {
    /// Trims whitespace and one pair of surrounding braces. Case is kept:
    /// ids are case-sensitive.
    pub fn normalize(raw: &str) -> Result<String, SError> {
        let trimmed = raw.trim();
        let inner = trimmed
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(trimmed)
            .trim();

        if inner.is_empty() {
            return Err(SError::InvalidId(raw.to_string()));
        }
        Ok(inner.to_string())
    }

    /// `"MyMod_595F2BF2F4E"` -> `"595F2BF2F4E"`. Only accepts a hex GUID suffix.
    pub fn from_folder_name(folder: &str) -> Option<String> {
        let (_, tail) = folder.rsplit_once('_')?;
        is_guid(tail).then(|| tail.to_string())
    }

    /// Extracts the id from a workshop slug or URL such as
    /// `https://host/workshop/61C769418AA32E81-WorthyIslands`.
    pub fn from_workshop_slug(slug: &str) -> Result<String, SError> {
        let last = slug
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let id = last.split('-').next().unwrap_or_default();
        Self::normalize(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_braces_and_whitespace_only() {
        assert_eq!(ModId::normalize(" {5965550F24A0C152} ").unwrap(), "5965550F24A0C152");
        assert_eq!(ModId::normalize("abcDEF").unwrap(), "abcDEF");
        assert!(matches!(ModId::normalize("  {} "), Err(SError::InvalidId(_))));
    }

    #[test]
    fn folder_name_needs_guid_suffix() {
        assert_eq!(
            ModId::from_folder_name("WorthyIslands_61C769418AA32E81").as_deref(),
            Some("61C769418AA32E81")
        );
        assert_eq!(ModId::from_folder_name("My_Mod"), None);
        assert_eq!(ModId::from_folder_name("NoUnderscore"), None);
    }

    #[test]
    fn workshop_slug_and_url() {
        assert_eq!(
            ModId::from_workshop_slug("https://reforger.armaplatform.com/workshop/61C769418AA32E81-COE2").unwrap(),
            "61C769418AA32E81"
        );
        assert_eq!(ModId::from_workshop_slug("61C769418AA32E81").unwrap(), "61C769418AA32E81");
        assert!(ModId::from_workshop_slug("https://host/workshop/-Orphan").is_err());
    }
}
