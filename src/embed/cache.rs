use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use super::Embedding;

pub const DEFAULT_KEY_CHARS: usize = 100;

/// Process-lifetime embedding memo, keyed by model and a text prefix.
///
/// Only the first `key_chars` characters of the text take part in the key,
/// so two texts sharing that prefix share a vector: whichever was stored
/// first. Entries are never evicted or replaced.
pub struct EmbeddingCache {
    entries: RwLock<HashMap<String, Embedding>>,
    key_chars: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl Default for EmbeddingCache {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_CHARS)
    }
}

impl EmbeddingCache {
    pub fn new(key_chars: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            key_chars,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// `"{model}:{prefix}"`, prefix measured in chars so multibyte text never splits.
    pub fn key(&self, model: &str, text: &str) -> String {
        let prefix = match text.char_indices().nth(self.key_chars) {
            Some((end, _)) => &text[..end],
            None => text,
        };
        format!("{model}:{prefix}")
    }

    pub fn get(&self, model: &str, text: &str) -> Option<Embedding> {
        let key = self.key(model, text);
        let found = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(&key)
            .cloned();
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Store `embedding` unless the key is already present, and return
    /// whatever is cached afterwards.
    pub fn insert(&self, model: &str, text: &str, embedding: Embedding) -> Embedding {
        let key = self.key(model, text);
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.entry(key).or_insert(embedding).clone()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key_chars(&self) -> usize {
        self.key_chars
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_uses_model_and_full_short_text() {
        let cache = EmbeddingCache::default();
        assert_eq!(cache.key("m", "hello"), "m:hello");
    }

    #[test]
    fn key_truncates_to_prefix() {
        let cache = EmbeddingCache::default();
        let text = format!("{}XYZ", "A".repeat(100));
        assert_eq!(cache.key("m", &text), format!("m:{}", "A".repeat(100)));
    }

    #[test]
    fn key_counts_chars_not_bytes() {
        let cache = EmbeddingCache::new(3);
        assert_eq!(cache.key("m", "벡터데이터베이스"), "m:벡터데");
    }

    #[test]
    fn miss_then_hit() {
        let cache = EmbeddingCache::default();
        assert!(cache.get("m", "a").is_none());
        cache.insert("m", "a", vec![1.0, 2.0]);
        assert_eq!(cache.get("m", "a"), Some(vec![1.0, 2.0]));

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn models_are_namespaced() {
        let cache = EmbeddingCache::default();
        cache.insert("small", "a", vec![1.0]);
        assert!(cache.get("large", "a").is_none());
    }

    #[test]
    fn first_insert_wins() {
        let cache = EmbeddingCache::default();
        let first = cache.insert("m", "a", vec![1.0]);
        let second = cache.insert("m", "a", vec![9.0]);
        assert_eq!(first, vec![1.0]);
        assert_eq!(second, vec![1.0]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn shared_prefix_collides() {
        let cache = EmbeddingCache::default();
        let prefix = "A".repeat(100);
        cache.insert("m", &format!("{prefix}XYZ"), vec![0.5]);
        assert_eq!(cache.get("m", &format!("{prefix}ABC")), Some(vec![0.5]));
    }

    #[test]
    fn racing_inserts_agree_on_one_vector() {
        let cache = EmbeddingCache::default();
        let results: Vec<Embedding> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let cache = &cache;
                    s.spawn(move || cache.insert("m", "same", vec![i as f32; 4]))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let stored = cache.get("m", "same").unwrap();
        assert_eq!(stored.len(), 4);
        assert!(stored.iter().all(|x| *x == stored[0]));
        assert!(results.iter().all(|r| *r == stored));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn builtin_documents_key_on_whole_characters() {
        let cache = EmbeddingCache::default();
        for doc in crate::corpus::Corpus::builtin().documents() {
            let text = doc.composite_text();
            let key = cache.key("m", &text);
            let prefix = key.strip_prefix("m:").unwrap();
            assert_eq!(prefix.chars().count(), text.chars().count().min(100));
            assert!(text.starts_with(prefix));
        }
    }
}
