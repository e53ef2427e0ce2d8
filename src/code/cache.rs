//! Bounded cache from raw-code hash to lowered instruction stream.
//!
//! Mirrors the structure of [`crate::hash_cache::HashCache`]: an intrusive
//! slab-backed LRU guarded by a single mutex, with the (expensive)
//! conversion work done outside the lock.

use super::converter::{convert, MAX_CACHED_LOWERED_LEN};
use crate::error::ConfigError;
use crate::instruction::Instruction;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const MIN_CAPACITY: usize = 2;

type Key = [u8; 32];
type Lowered = Arc<Vec<Instruction>>;

struct Entry {
    key: Key,
    value: Lowered,
    prev: Option<usize>,
    next: Option<usize>,
}

struct Lru {
    slab: Vec<Entry>,
    free: Vec<usize>,
    index: HashMap<Key, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,
}

impl Lru {
    fn new(capacity: usize) -> Self {
        Self {
            slab: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            capacity: capacity.max(MIN_CAPACITY),
        }
    }

    fn unlink(&mut self, i: usize) {
        let (prev, next) = (self.slab[i].prev, self.slab[i].next);
        match prev {
            Some(p) => self.slab[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slab[n].prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, i: usize) {
        self.slab[i].prev = None;
        self.slab[i].next = self.head;
        if let Some(h) = self.head {
            self.slab[h].prev = Some(i);
        }
        self.head = Some(i);
        if self.tail.is_none() {
            self.tail = Some(i);
        }
    }

    fn touch(&mut self, i: usize) {
        if self.head == Some(i) {
            return;
        }
        self.unlink(i);
        self.push_front(i);
    }

    fn get(&mut self, key: &Key) -> Option<Lowered> {
        let i = *self.index.get(key)?;
        self.touch(i);
        Some(self.slab[i].value.clone())
    }

    fn insert(&mut self, key: Key, value: Lowered) {
        if let Some(&i) = self.index.get(&key) {
            self.slab[i].value = value;
            self.touch(i);
            return;
        }

        if self.index.len() >= self.capacity {
            if let Some(tail) = self.tail {
                self.unlink(tail);
                let evicted = self.slab[tail].key;
                self.index.remove(&evicted);
                self.free.push(tail);
            }
        }

        let entry = Entry {
            key,
            value,
            prev: None,
            next: None,
        };
        let i = match self.free.pop() {
            Some(i) => {
                self.slab[i] = entry;
                i
            }
            None => {
                self.slab.push(entry);
                self.slab.len() - 1
            }
        };
        self.index.insert(key, i);
        self.push_front(i);
    }
}

/// Options controlling whether a particular conversion is eligible for the
/// shared cache at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConversionOptions {
    /// `CREATE`/`CREATE2` init code: unique per deployment, never cached.
    pub is_init_code: bool,
    /// Caller opt-out, regardless of code shape.
    pub no_cache: bool,
    pub with_super_instructions: bool,
}

/// Converts raw EVM bytecode into its lowered form, caching the result by
/// content hash up to a configured byte budget.
pub struct ConversionCache {
    lru: Mutex<Lru>,
}

impl ConversionCache {
    /// `bytes_per_word` is `size_of::<Instruction>()`; a configured budget
    /// smaller than that cannot hold even a single-instruction entry.
    pub fn with_byte_budget(budget_bytes: usize) -> Result<Self, ConfigError> {
        let word_bytes = std::mem::size_of::<Instruction>();
        if budget_bytes < word_bytes {
            return Err(ConfigError::CacheBudgetTooSmall {
                given: budget_bytes,
                minimum: word_bytes,
            });
        }
        let capacity = (budget_bytes / word_bytes).max(MIN_CAPACITY);
        Ok(Self {
            lru: Mutex::new(Lru::new(capacity)),
        })
    }

    /// Look up or compute the lowered form of `raw`. Results exceeding
    /// [`MAX_CACHED_LOWERED_LEN`] words are still returned but never admitted
    /// into the cache.
    pub fn get_or_convert(
        &self,
        raw: &[u8],
        raw_hash: Option<[u8; 32]>,
        opts: ConversionOptions,
    ) -> Lowered {
        let key = match (opts.no_cache, opts.is_init_code, raw_hash) {
            (false, false, Some(h)) => Some(h),
            _ => None,
        };

        if let Some(key) = key {
            if let Some(hit) = self.lru.lock().get(&key) {
                return hit;
            }
        }

        let lowered = Arc::new(convert(raw, opts.with_super_instructions));

        if let Some(key) = key {
            if lowered.len() <= MAX_CACHED_LOWERED_LEN {
                self.lru.lock().insert(key, lowered.clone());
            }
        }

        lowered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(tag: u8) -> [u8; 32] {
        let mut h = [0u8; 32];
        h[0] = tag;
        h
    }

    #[test]
    fn budget_below_one_word_is_rejected() {
        assert!(ConversionCache::with_byte_budget(0).is_err());
        assert!(ConversionCache::with_byte_budget(3).is_err());
    }

    #[test]
    fn budget_of_one_word_is_accepted() {
        assert!(ConversionCache::with_byte_budget(4).is_ok());
    }

    #[test]
    fn repeated_lookup_returns_the_same_allocation() {
        let cache = ConversionCache::with_byte_budget(4096).unwrap();
        let raw = [0x60, 0x01, 0x60, 0x02, 0x01];
        let opts = ConversionOptions::default();
        let a = cache.get_or_convert(&raw, Some(hash(1)), opts);
        let b = cache.get_or_convert(&raw, Some(hash(1)), opts);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn init_code_is_never_cached() {
        let cache = ConversionCache::with_byte_budget(4096).unwrap();
        let raw = [0x00];
        let opts = ConversionOptions {
            is_init_code: true,
            ..Default::default()
        };
        let a = cache.get_or_convert(&raw, Some(hash(2)), opts);
        let b = cache.get_or_convert(&raw, Some(hash(2)), opts);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn no_cache_opt_out_is_honored() {
        let cache = ConversionCache::with_byte_budget(4096).unwrap();
        let raw = [0x00];
        let opts = ConversionOptions {
            no_cache: true,
            ..Default::default()
        };
        let a = cache.get_or_convert(&raw, Some(hash(3)), opts);
        let b = cache.get_or_convert(&raw, Some(hash(3)), opts);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn missing_hash_disables_caching() {
        let cache = ConversionCache::with_byte_budget(4096).unwrap();
        let raw = [0x00];
        let opts = ConversionOptions::default();
        let a = cache.get_or_convert(&raw, None, opts);
        let b = cache.get_or_convert(&raw, None, opts);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn eviction_respects_capacity() {
        // 4 bytes per word, budget for exactly 2 entries of 1 word each.
        let cache = ConversionCache::with_byte_budget(8).unwrap();
        let raw = [0x00]; // STOP, one lowered word
        cache.get_or_convert(&raw, Some(hash(1)), ConversionOptions::default());
        cache.get_or_convert(&raw, Some(hash(2)), ConversionOptions::default());
        cache.get_or_convert(&raw, Some(hash(3)), ConversionOptions::default());
        let lru = cache.lru.lock();
        assert_eq!(lru.index.len(), 2);
        assert!(!lru.index.contains_key(&hash(1)));
    }
}
