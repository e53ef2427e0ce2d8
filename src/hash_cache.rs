//! Bounded, thread-safe LRU cache mapping 32- or 64-byte inputs to their
//! Keccak-256 digest. Inputs of any other length bypass the cache entirely.

use parking_lot::Mutex;
use sha3::{Digest, Keccak256};
use std::collections::HashMap;

const MIN_CAPACITY: usize = 2;

type Key = Vec<u8>;

struct Entry {
    key: Key,
    digest: [u8; 32],
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

    fn get(&mut self, key: &[u8]) -> Option<[u8; 32]> {
        let i = *self.index.get(key)?;
        self.touch(i);
        Some(self.slab[i].digest)
    }

    /// Insert `key -> digest`, evicting the tail if over capacity. A
    /// concurrent insert of the same key (lock was released to hash) is a
    /// no-op other than bumping recency.
    fn insert(&mut self, key: Key, digest: [u8; 32]) {
        if let Some(&i) = self.index.get(&key) {
            self.touch(i);
            return;
        }

        if self.index.len() >= self.capacity {
            if let Some(tail) = self.tail {
                self.unlink(tail);
                let evicted = self.slab[tail].key.clone();
                self.index.remove(&evicted);
                self.free.push(tail);
            }
        }

        let entry = Entry {
            key: key.clone(),
            digest,
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

/// Keccak-256 cache specialized for the two fixed key widths the interpreter
/// actually hashes: single words (32 bytes) and word pairs (64 bytes, the
/// `keccak256(a || b)` pattern used for mapping-slot addressing).
pub struct HashCache {
    cache32: Mutex<Lru>,
    cache64: Mutex<Lru>,
}

impl HashCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache32: Mutex::new(Lru::new(capacity)),
            cache64: Mutex::new(Lru::new(capacity)),
        }
    }

    /// Keccak-256 of `input`, cached when `input` is exactly 32 or 64 bytes long.
    pub fn hash(&self, input: &[u8]) -> [u8; 32] {
        let lru = match input.len() {
            32 => &self.cache32,
            64 => &self.cache64,
            _ => return keccak256(input),
        };

        if let Some(digest) = lru.lock().get(input) {
            return digest;
        }

        let digest = keccak256(input);

        let mut guard = lru.lock();
        guard.insert(input.to_vec(), digest);
        digest
    }
}

impl Default for HashCache {
    fn default() -> Self {
        Self::new(1024)
    }
}

fn keccak256(input: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(input);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}
