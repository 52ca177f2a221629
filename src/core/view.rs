use crate::core::registry::Registry;
use crate::models::mod_dto::ModRecord;
use crate::models::view::{CategoryFilter, SortKey, SortOrder};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Filters and sorts collection items for display.
///
/// The ascending comparator is total (ties fall back to name, then id), and
/// descending is the ascending result reversed, so the two are exact mirrors.
pub fn view(
    items: &[ModRecord],
    registry: &Registry,
    filter: &CategoryFilter,
    key: SortKey,
    order: SortOrder,
) -> Vec<ModRecord> {
    let mut out: Vec<ModRecord> = items
        .iter()
        .filter(|r| filter.accepts(r.category_tag()))
        .cloned()
        .collect();

    out.sort_by(|a, b| compare(a, b, key, registry));
    if order == SortOrder::Desc {
        out.reverse();
    }
    out
}

/// Every category in use, sorted, without duplicates or blanks.
pub fn categories(items: &[ModRecord]) -> Vec<String> {
    let mut found: Vec<String> = items
        .iter()
        .map(|r| r.category_tag().trim())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect();
    found.sort_by(|a, b| compare_names(a, b));
    found.dedup();
    found
}

fn compare(a: &ModRecord, b: &ModRecord, key: SortKey, registry: &Registry) -> Ordering {
    let primary = match key {
        SortKey::Name => Ordering::Equal,
        SortKey::Size => size_of(a, registry).cmp(&size_of(b, registry)),
        SortKey::Category => a.category_tag().cmp(b.category_tag()),
    };

    primary
        .then_with(|| compare_names(a.display_name(), b.display_name()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Installed size, 0 when the mod is not on disk.
fn size_of(record: &ModRecord, registry: &Registry) -> u64 {
    registry.installed_size(&record.id).unwrap_or(0)
}

/// Accent- and case-folded text first, so `école` sorts with the e's. Then
/// plain lowercase, then raw text, which keeps the order total.
fn compare_names(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Compatibility decomposition with combining marks dropped, lowercased.
fn fold(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
