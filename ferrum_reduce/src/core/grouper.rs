use crate::api::record::KeyValue;
use std::collections::btree_map::{self, BTreeMap};

/// Values grouped by key for a single reduce task.
///
/// Keys iterate in ascending order so that the same inputs always produce the
/// same output bytes. Values keep the order in which they were inserted.
#[derive(Debug, Default)]
pub struct GroupedTable {
    groups: BTreeMap<String, Vec<String>>,
    records: u64,
}

impl GroupedTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kv: KeyValue) {
        self.groups.entry(kv.key).or_default().push(kv.value);
        self.records += 1;
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn record_count(&self) -> u64 {
        self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

impl Extend<KeyValue> for GroupedTable {
    fn extend<T: IntoIterator<Item = KeyValue>>(&mut self, iter: T) {
        for kv in iter {
            self.insert(kv);
        }
    }
}

impl FromIterator<KeyValue> for GroupedTable {
    fn from_iter<T: IntoIterator<Item = KeyValue>>(iter: T) -> Self {
        let mut table = GroupedTable::new();
        table.extend(iter);
        table
    }
}

impl IntoIterator for GroupedTable {
    type Item = (String, Vec<String>);
    type IntoIter = btree_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.into_iter()
    }
}
