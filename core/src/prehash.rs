use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
    sync::Mutex,
};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    counters::AuditCounters,
    digest::HexDigester,
    error::{AuditError, AuditResult},
};

/// The number of lock-striped shards, one per value of the first digest byte.
const SHARD_COUNT: usize = 256;

/// A lock-striped digest -> plaintext map with atomic insert-if-absent.
///
/// The shard is selected from the first byte of the digest, which is evenly
/// distributed, so concurrent writers on different digests rarely contend for
/// the same lock. Writers on the same digest contend, and exactly one wins.
pub struct ShardedDigestMap {
    shards: Vec<Mutex<HashMap<String, String>>>,
}

impl ShardedDigestMap {
    pub fn new() -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| Mutex::new(HashMap::new())).collect(),
        }
    }

    /// Inserts `(digest, word)` only if no entry exists for that digest yet.
    /// Returns true for the single writer that wins the slot.
    pub fn insert_if_absent(&self, digest: String, word: String) -> bool {
        let shard = &self.shards[Self::shard_index(&digest)];
        let mut map = shard.lock().unwrap();

        match map.entry(digest) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(word);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().unwrap().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the shards into a read-only dictionary.
    ///
    /// Taking `self` by value is the phase barrier: once a
    /// [`PrehashedDictionary`] exists, no writer can be alive anymore.
    pub fn into_frozen(self, source_word_count: u64) -> PrehashedDictionary {
        let mut entries = HashMap::new();

        for shard in self.shards {
            entries.extend(shard.into_inner().unwrap());
        }

        PrehashedDictionary {
            entries,
            source_word_count,
        }
    }

    fn shard_index(digest: &str) -> usize {
        // the first two hex characters encode the first digest byte
        digest
            .get(..2)
            .and_then(|prefix| u8::from_str_radix(prefix, 16).ok())
            .unwrap_or(0) as usize
    }
}

impl Default for ShardedDigestMap {
    fn default() -> Self {
        Self::new()
    }
}

/// The frozen digest -> plaintext index built during phase 1.
///
/// Immutable by construction, which is what makes the lock-free concurrent
/// reads of phase 2 safe. For any digest present, the mapped plaintext is
/// some word of the source list hashing to it; when several words share a
/// digest, which one is retained depends on the insertion race (file order
/// on a one-thread pool).
#[derive(Serialize, Deserialize)]
pub struct PrehashedDictionary {
    entries: HashMap<String, String>,
    source_word_count: u64,
}

impl PrehashedDictionary {
    pub fn get(&self, digest: &str) -> Option<&str> {
        self.entries.get(digest).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if this dictionary was built from a word list of the
    /// given length. Used to detect stale prehash caches.
    pub fn is_fresh(&self, source_word_count: u64) -> bool {
        self.source_word_count == source_word_count
    }

    /// Stores this dictionary to the given path.
    pub fn store(&self, path: &Path) -> AuditResult<()> {
        let file = File::options()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let buf_writer = BufWriter::with_capacity(1024 * 1024 * 16, file);
        bincode::serialize_into(buf_writer, self).map_err(|_| AuditError::Serialize)?;

        Ok(())
    }

    pub fn load(path: &Path) -> AuditResult<Self> {
        let file = File::open(path)?;
        let buf_reader = BufReader::with_capacity(1024 * 1024 * 16, file);
        let dictionary =
            bincode::deserialize_from(buf_reader).map_err(|_| AuditError::Deserialize)?;

        Ok(dictionary)
    }
}

/// Builds the prehash index over the word list (phase 1).
///
/// Every word is digested exactly once on the calling rayon pool, with one
/// reusable hashing context per worker. `hashes_computed` is bumped once per
/// word whether or not its insert wins. The function only returns once every
/// word has been processed, so the returned dictionary is complete.
pub fn build_index(words: &[String], counters: &AuditCounters) -> PrehashedDictionary {
    let map = ShardedDigestMap::new();

    words.par_iter().for_each_init(HexDigester::new, |digester, word| {
        let digest = digester.digest_hex(word);
        map.insert_if_absent(digest, word.clone());
        counters.add_hash_computed();
    });

    debug!(
        words = words.len(),
        unique_digests = map.len(),
        "prehash index built"
    );

    map.into_frozen(words.len() as u64)
}
