//! The hot-address table: the dynamically growing set of pool vault
//! addresses every worker filters transactions against.
//!
//! Address stability across growth is free in Rust where it cost the
//! reference implementation a hand-rolled arena: a `Vec<String>`'s own
//! buffer may move on reallocation, but each `String`'s heap allocation does
//! not, so a `&str` borrowed from an existing entry stays valid even as the
//! vector grows. The lock below guards the set/map/storage triple, not the
//! lifetime of any slice handed out of it.

use std::sync::RwLock;

use tracing::info;
use xxhash_rust::xxh3::xxh3_64_with_seed;
use std::collections::{HashMap, HashSet};

use crate::error::{CoreError, CoreResult};

/// 64-bit hash of an address. Computed with a zero seed so the same address
/// bytes always hash identically whether they come from the seed file, a
/// pool-event message, or a candidate scanned out of a transaction.
#[inline]
pub fn hash_address(addr: &[u8]) -> u64 {
    xxh3_64_with_seed(addr, 0)
}

struct Inner {
    storage: Vec<String>,
    pool_hashes: HashSet<u64>,
    hash_to_addr: HashMap<u64, usize>,
}

/// Reader-writer synchronized, append-only hot-address table.
///
/// Seeded once at startup, then grown for the lifetime of the process by the
/// pool-event subscriber. Never shrinks.
pub struct HotAddressTable {
    inner: RwLock<Inner>,
}

impl Default for HotAddressTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HotAddressTable {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                storage: Vec::new(),
                pool_hashes: HashSet::new(),
                hash_to_addr: HashMap::new(),
            }),
        }
    }

    /// Load newline-separated addresses from `path`. Blank lines are
    /// ignored. Called once before any worker starts; a missing or
    /// unreadable file is startup-fatal for the caller.
    pub fn seed_from_file(path: &std::path::Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Seed(format!("{}: {e}", path.display())))?;

        let table = Self::new();
        {
            let mut inner = table.inner.write().expect("hot-address lock poisoned");
            for line in text.lines() {
                let addr = line.trim();
                if addr.is_empty() {
                    continue;
                }
                insert_locked(&mut inner, addr);
            }
        }
        Ok(table)
    }

    /// Add a pool's two vault addresses under a single write-exclusive lock.
    /// Both are visible to every subsequent read once this returns.
    pub fn add_pool(&self, base_vault: &str, quote_vault: &str) {
        let mut inner = self.inner.write().expect("hot-address lock poisoned");
        insert_locked(&mut inner, base_vault);
        insert_locked(&mut inner, quote_vault);
        drop(inner);
        info!(base = base_vault, quote = quote_vault, "added base/quote vault to hot-address table");
    }

    pub fn contains(&self, hash: u64) -> bool {
        let inner = self.inner.read().expect("hot-address lock poisoned");
        inner.pool_hashes.contains(&hash)
    }

    /// Look up the canonical stored address for `hash`, if present.
    ///
    /// Returns an owned `Arc`-free copy-on-read `String`... no: returns a
    /// clone, since handing out a borrow tied to the internal lock guard
    /// would keep the read lock held for the caller's whole scan. Workers
    /// that resolve many addresses per transaction should call this once
    /// per hit and hold onto the returned canonical string.
    pub fn lookup(&self, hash: u64) -> Option<String> {
        let inner = self.inner.read().expect("hot-address lock poisoned");
        inner
            .hash_to_addr
            .get(&hash)
            .map(|&idx| inner.storage[idx].clone())
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("hot-address lock poisoned").storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn insert_locked(inner: &mut Inner, addr: &str) {
    let hash = hash_address(addr.as_bytes());
    inner.storage.push(addr.to_string());
    let idx = inner.storage.len() - 1;
    inner.pool_hashes.insert(hash);
    inner.hash_to_addr.insert(hash, idx);
}
