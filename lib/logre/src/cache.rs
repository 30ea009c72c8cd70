use logre_driver::Solutions;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

/// Number of answers kept by a bundle before the oldest ones are evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Answers of read queries, keyed by query text.
///
/// Query texts embed every argument of the operation that produced them, so the text is enough to
/// identify a cached answer within one bundle. At most `capacity` answers are kept, the oldest
/// insertion is evicted first.
#[derive(Debug)]
pub(crate) struct QueryCache {
    capacity: usize,
    entries: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    answers: HashMap<String, Solutions>,
    /// Keys in insertion order.
    order: VecDeque<String>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl QueryCache {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::default(),
        }
    }

    pub fn get(&self, query: &str) -> Option<Solutions> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .answers
            .get(query)
            .cloned()
    }

    pub fn insert(&self, query: String, solutions: Solutions) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.answers.insert(query.clone(), solutions).is_some() {
            return;
        }
        entries.order.push_back(query);
        while entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.answers.remove(&oldest);
            }
        }
    }

    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.answers.clear();
        entries.order.clear();
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .answers
            .len()
    }
}
