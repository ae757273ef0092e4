use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Count of clients per category label.
///
/// Keys keep first-insertion order so chart legends are stable between
/// refreshes of the same network.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tally(IndexMap<String, u32>);

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to `key`, inserting it at zero first if absent.
    pub fn increment(&mut self, key: &str) {
        match self.0.get_mut(key) {
            Some(count) => *count = count.saturating_add(1),
            None => {
                self.0.insert(key.to_owned(), 1);
            }
        }
    }

    /// Count for `key`, zero when the key was never seen.
    pub fn get(&self, key: &str) -> u32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    /// Sum over all keys.
    pub fn total(&self) -> u64 {
        self.0.values().map(|&n| u64::from(n)).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }
}
