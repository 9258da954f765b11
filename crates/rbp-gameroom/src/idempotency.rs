use std::collections::HashMap;
use std::collections::VecDeque;

/// Bounded per-user cache of recent `request_id` outcomes (spec.md §4.2
/// "SB maintains a per-user bounded LRU of recent request ids with their
/// outcomes"). Complements (does not replace) the Game Engine's own
/// `Table.requests` map: the engine's map is keyed per-table and lives for
/// the table's lifetime, which is the source of truth for "was this action
/// already applied"; this cache exists so a duplicate can be recognized and
/// answered without re-acquiring the table lock, and so a chatty or
/// reconnecting client can never grow Session Bridge memory without bound.
pub struct RequestCache<V> {
    capacity: usize,
    entries: HashMap<String, V>,
    order: VecDeque<String>,
}

impl<V: Clone> RequestCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self { capacity, entries: HashMap::new(), order: VecDeque::new() }
    }
    pub fn get(&self, request_id: &str) -> Option<V> {
        self.entries.get(request_id).cloned()
    }
    pub fn insert(&mut self, request_id: String, outcome: V) {
        if !self.entries.contains_key(&request_id) {
            self.order.push_back(request_id.clone());
            while self.order.len() > self.capacity {
                if let Some(oldest) = self.order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
        }
        self.entries.insert(request_id, outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut cache = RequestCache::new(2);
        cache.insert("a".to_string(), 1);
        cache.insert("b".to_string(), 2);
        cache.insert("c".to_string(), 3);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), Some(2));
        assert_eq!(cache.get("c"), Some(3));
    }

    #[test]
    fn replaying_a_known_id_returns_its_outcome() {
        let mut cache = RequestCache::new(4);
        cache.insert("x".to_string(), 42);
        assert_eq!(cache.get("x"), Some(42));
    }
}
