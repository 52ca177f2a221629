use crate::models::mod_dto::ModRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// `from` directly requires `to`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

impl DependencyEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Every id transitively reachable from a seed set, plus the edges found on
/// the way. Built once per resolution and never persisted as-is.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedClosure {
    /// Ids in breadth-first discovery order.
    pub order: Vec<String>,
    pub records: HashMap<String, ModRecord>,
    pub edges: Vec<DependencyEdge>,
    /// Ids the catalog could not be reached for. They hold placeholders.
    pub failed: BTreeSet<String>,
    /// Ids the catalog answered for without an entry. They hold placeholders.
    pub unknown: BTreeSet<String>,
}

impl ResolvedClosure {
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ModRecord> {
        self.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Records in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ModRecord> {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn dependencies_of(&self, id: &str) -> &[String] {
        self.records
            .get(id)
            .map(|r| r.dependency_ids.as_slice())
            .unwrap_or_default()
    }

    /// True when no id failed at the transport level.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// True when `id` is a placeholder rather than real catalog data.
    pub fn is_unresolved(&self, id: &str) -> bool {
        self.failed.contains(id) || self.unknown.contains(id)
    }

    /// Ids reachable from `seeds` by following recorded edges, seeds included
    /// when present in the closure.
    pub fn reachable_from<'a, I>(&self, seeds: I) -> HashSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&str> = seeds.into_iter().filter(|id| self.contains(id)).collect();

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id.to_string()) {
                continue;
            }
            for dep in self.dependencies_of(id) {
                if self.contains(dep) && !seen.contains(dep.as_str()) {
                    queue.push_back(dep.as_str());
                }
            }
        }

        seen
    }

    pub(crate) fn insert(&mut self, record: ModRecord) {
        for dep in &record.dependency_ids {
            self.edges.push(DependencyEdge::new(&record.id, dep));
        }
        if !self.records.contains_key(&record.id) {
            self.order.push(record.id.clone());
        }
        self.records.insert(record.id.clone(), record);
    }
}
