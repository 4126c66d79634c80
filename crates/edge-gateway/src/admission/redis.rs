//! Shared Redis counter store.
//!
//! Window counters in Redis make the ceilings global across gateway
//! replicas. Each increment pipelines `INCR` + `EXPIRE` atomically and runs
//! under a short deadline so a slow Redis degrades admission control instead
//! of stalling the request path.

use super::{CounterStore, StoreError};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisCounterStore {
    connection: MultiplexedConnection,
    call_timeout: Duration,
}

impl RedisCounterStore {
    /// Connect to Redis. Startup fails if the initial connection cannot be
    /// established; transient failures after that surface per call.
    ///
    /// # Errors
    ///
    /// Returns the underlying connection error.
    pub async fn connect(url: &str, call_timeout: Duration) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_tokio_connection().await?;
        Ok(RedisCounterStore {
            connection,
            call_timeout,
        })
    }
}

impl std::fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, ttl_seconds: i64) -> Result<u64, StoreError> {
        let mut connection = self.connection.clone();

        let call = async move {
            let (count,): (u64,) = redis::pipe()
                .atomic()
                .incr(key, 1u64)
                .expire(key, ttl_seconds)
                .ignore()
                .query_async(&mut connection)
                .await?;
            Ok::<u64, redis::RedisError>(count)
        };

        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(Ok(count)) => Ok(count),
            Ok(Err(e)) => Err(StoreError::Backend(e.to_string())),
            Err(_) => Err(StoreError::Timeout),
        }
    }
}
