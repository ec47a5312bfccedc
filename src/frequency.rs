// WHY: single mapping type for both the self-built line table and the external token table
// Keys are kept in first-seen order so report ties resolve deterministically

use std::collections::HashMap;

/// Insertion-ordered mapping from a text key to a non-negative occurrence count
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `key`, registering it on first sight
    pub fn increment(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&slot) => self.entries[slot].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    /// Set the count for `key`. A repeated key overwrites the count but keeps its
    /// original position.
    pub fn insert(&mut self, key: impl Into<String>, count: u64) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&slot) => self.entries[slot].1 = count,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, count));
            }
        }
    }

    /// Exact-match lookup, no normalization of the key
    pub fn get(&self, key: &str) -> Option<u64> {
        self.index.get(key).map(|&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(key, count)| (key.as_str(), *count))
    }

    /// Entries ordered for the frequency report: count descending, ties in
    /// first-seen order
    pub fn sorted_by_count(&self) -> Vec<(&str, u64)> {
        let mut sorted: Vec<_> = self.iter().collect();
        // WHY: sort_by_key is stable, which is what keeps tied entries in first-seen order
        sorted.sort_by_key(|&(_, count)| std::cmp::Reverse(count));
        sorted
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for (key, count) in iter {
            table.insert(key, count);
        }
        table
    }
}

/// Count how often each distinct line occurs in `lines`
pub fn count_lines<S: AsRef<str>>(lines: &[S]) -> FrequencyTable {
    let mut table = FrequencyTable::new();
    for line in lines {
        table.increment(line.as_ref());
    }
    table
}
