//! Process-local counter store.
//!
//! Sharded `Mutex<HashMap>` counters for single-instance deployments and
//! tests. Expired buckets are pruned opportunistically on write, so the map
//! never grows past the set of identities active in the current windows plus
//! whatever accumulated since the last prune.

use super::{CounterStore, StoreError};
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

const SHARD_COUNT: usize = 16;

/// Prune a shard once it holds this many buckets.
const PRUNE_THRESHOLD: usize = 4096;

#[derive(Debug)]
struct Bucket {
    count: u64,
    expires_at: i64,
}

#[derive(Debug, Default)]
pub struct LocalCounterStore {
    shards: Vec<Mutex<HashMap<String, Bucket>>>,
}

impl LocalCounterStore {
    #[must_use]
    pub fn new() -> Self {
        let shards = (0..SHARD_COUNT)
            .map(|_| Mutex::new(HashMap::new()))
            .collect();
        LocalCounterStore { shards }
    }

    fn shard(&self, key: &str) -> Option<&Mutex<HashMap<String, Bucket>>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        #[allow(clippy::cast_possible_truncation)]
        let index = (hasher.finish() as usize) % SHARD_COUNT;
        self.shards.get(index)
    }
}

#[async_trait]
impl CounterStore for LocalCounterStore {
    async fn increment(&self, key: &str, ttl_seconds: i64) -> Result<u64, StoreError> {
        let now = chrono::Utc::now().timestamp();

        let Some(shard) = self.shard(key) else {
            return Err(StoreError::Backend("shard lookup failed".to_string()));
        };
        let mut map = match shard.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if map.len() >= PRUNE_THRESHOLD {
            map.retain(|_, bucket| bucket.expires_at > now);
        }

        let bucket = map.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            expires_at: now + ttl_seconds,
        });

        // A bucket left over from an expired window restarts from zero.
        if bucket.expires_at <= now {
            bucket.count = 0;
            bucket.expires_at = now + ttl_seconds;
        }

        bucket.count += 1;
        Ok(bucket.count)
    }
}
