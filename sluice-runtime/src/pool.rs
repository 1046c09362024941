//! Bounded, keyed pool of remote clients.
//!
//! Borrowed clients are bounded per key and across keys by semaphore
//! permits. Returned clients are cached per key up to `max_idle_per_key`;
//! cached clients idle for longer than `min_evictable_idle` are closed the
//! next time their key is acquired or released. Waiting for a slot and
//! connecting a fresh client never take longer than `max_block_wait`
//! together; closing evicted clients happens before that clock starts.

use crate::client::{ClientFactory, ConnectConfig, RemoteClient};
use crate::error::{ElementError, ElementResult, RemoteError};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Pool bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PoolConfig {
    pub max_idle_per_key: usize,
    pub max_total_per_key: usize,
    /// Borrowed clients across all keys.
    pub max_total: usize,
    pub max_block_wait_ms: u64,
    pub min_evictable_idle_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle_per_key: 10,
            max_total_per_key: 20,
            max_total: 100,
            max_block_wait_ms: 5_000,
            min_evictable_idle_ms: 10_000,
        }
    }
}

impl PoolConfig {
    pub fn max_block_wait(&self) -> Duration {
        Duration::from_millis(self.max_block_wait_ms)
    }

    pub fn min_evictable_idle(&self) -> Duration {
        Duration::from_millis(self.min_evictable_idle_ms)
    }
}

struct IdleClient<C> {
    client: C,
    since: Instant,
}

struct KeyState<C> {
    permits: Arc<Semaphore>,
    idle: VecDeque<IdleClient<C>>,
}

/// A client borrowed from a [`ClientPool`]. Hand it back with
/// [`ClientPool::release`]; dropping it frees its slot but discards the
/// connection.
pub struct PooledClient<C> {
    key: String,
    client: C,
    _key_permit: OwnedSemaphorePermit,
    _total_permit: OwnedSemaphorePermit,
}

impl<C> PooledClient<C> {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<C> Deref for PooledClient<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.client
    }
}

impl<C> DerefMut for PooledClient<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.client
    }
}

pub struct ClientPool<F: ClientFactory> {
    factory: Arc<F>,
    connect: ConnectConfig,
    config: PoolConfig,
    total: Arc<Semaphore>,
    keys: Mutex<HashMap<String, KeyState<F::Client>>>,
    closed: AtomicBool,
}

impl<F: ClientFactory> ClientPool<F> {
    pub fn new(factory: Arc<F>, connect: ConnectConfig, config: PoolConfig) -> Self {
        Self {
            factory,
            connect,
            total: Arc::new(Semaphore::new(permits(config.max_total))),
            config,
            keys: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of cached clients for `key`.
    pub fn idle_count(&self, key: &str) -> usize {
        self.lock_keys().get(key).map_or(0, |s| s.idle.len())
    }

    fn lock_keys(&self) -> MutexGuard<'_, HashMap<String, KeyState<F::Client>>> {
        self.keys.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Borrows a client for `key`, reusing a cached one when available.
    pub async fn acquire(&self, key: &str) -> ElementResult<PooledClient<F::Client>> {
        if self.is_closed() {
            return Err(ElementError::PoolClosed);
        }
        let stale = self.take_stale(key);
        close_all(key, stale).await;

        let wait = self.config.max_block_wait();
        match tokio::time::timeout(wait, self.checkout(key)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(key = %key, waited_ms = self.config.max_block_wait_ms, "Client acquisition timed out");
                Err(ElementError::AcquireTimeout {
                    key: key.to_string(),
                    waited_ms: self.config.max_block_wait_ms,
                })
            }
        }
    }

    async fn checkout(&self, key: &str) -> ElementResult<PooledClient<F::Client>> {
        let key_permits = {
            let mut keys = self.lock_keys();
            let state = keys.entry(key.to_string()).or_insert_with(|| KeyState {
                permits: Arc::new(Semaphore::new(permits(self.config.max_total_per_key))),
                idle: VecDeque::new(),
            });
            Arc::clone(&state.permits)
        };
        let key_permit = key_permits
            .acquire_owned()
            .await
            .map_err(|_| ElementError::PoolClosed)?;
        let total_permit = Arc::clone(&self.total)
            .acquire_owned()
            .await
            .map_err(|_| ElementError::PoolClosed)?;

        // Nothing awaits between taking a cached client and returning it.
        let max_idle = self.config.min_evictable_idle();
        let cached = self.lock_keys().get_mut(key).and_then(|state| {
            let fresh = state
                .idle
                .back()
                .is_some_and(|newest| newest.since.elapsed() < max_idle);
            if fresh {
                state.idle.pop_back().map(|idle| idle.client)
            } else {
                None
            }
        });

        let client = match cached {
            Some(client) => {
                debug!(key = %key, "Reusing idle client");
                client
            }
            None => {
                debug!(key = %key, uri = %self.connect.uri, "Opening client");
                self.factory
                    .connect(&self.connect)
                    .await
                    .map_err(|source| ElementError::Connect {
                        key: key.to_string(),
                        source,
                    })?
            }
        };
        Ok(PooledClient {
            key: key.to_string(),
            client,
            _key_permit: key_permit,
            _total_permit: total_permit,
        })
    }

    fn take_stale(&self, key: &str) -> Vec<F::Client> {
        self.lock_keys()
            .get_mut(key)
            .map_or_else(Vec::new, |state| self.evict_stale(&mut state.idle))
    }

    fn evict_stale(&self, idle: &mut VecDeque<IdleClient<F::Client>>) -> Vec<F::Client> {
        let max_idle = self.config.min_evictable_idle();
        let now = Instant::now();
        let mut stale = Vec::new();
        let mut fresh = VecDeque::with_capacity(idle.len());
        for entry in idle.drain(..) {
            if now.duration_since(entry.since) >= max_idle {
                stale.push(entry.client);
            } else {
                fresh.push_back(entry);
            }
        }
        *idle = fresh;
        stale
    }

    /// Returns a borrowed client. The client is cached when the key has
    /// room, otherwise closed; once the pool is closed it is always closed.
    pub async fn release(&self, pooled: PooledClient<F::Client>) -> Result<(), RemoteError> {
        let PooledClient {
            key,
            client,
            _key_permit,
            _total_permit,
        } = pooled;
        if self.is_closed() {
            let mut client = client;
            return client.close().await;
        }

        let (overflow, stale) = {
            let mut keys = self.lock_keys();
            match keys.get_mut(&key) {
                Some(state) => {
                    let stale = self.evict_stale(&mut state.idle);
                    if state.idle.len() < self.config.max_idle_per_key {
                        state.idle.push_back(IdleClient {
                            client,
                            since: Instant::now(),
                        });
                        (None, stale)
                    } else {
                        (Some(client), stale)
                    }
                }
                None => (Some(client), Vec::new()),
            }
        };
        drop(_key_permit);
        drop(_total_permit);
        close_all(&key, stale).await;
        match overflow {
            Some(mut client) => {
                debug!(key = %key, "Idle cache full; closing client");
                client.close().await
            }
            None => Ok(()),
        }
    }

    /// Closes the pool and every cached client. Waiting and later
    /// acquisitions fail with [`ElementError::PoolClosed`]. Idempotent.
    pub async fn close(&self) -> Result<(), RemoteError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.total.close();
        let idle: Vec<(String, F::Client)> = {
            let mut keys = self.lock_keys();
            keys.iter_mut()
                .flat_map(|(key, state)| {
                    state.permits.close();
                    state
                        .idle
                        .drain(..)
                        .map(|entry| (key.clone(), entry.client))
                        .collect::<Vec<_>>()
                })
                .collect()
        };
        let mut first_error = None;
        for (key, mut client) in idle {
            if let Err(e) = client.close().await {
                warn!(key = %key, error = %e, "Failed to close idle client");
                first_error.get_or_insert(e);
            }
        }
        debug!("Client pool closed");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Semaphore size for a configured bound, capped at what tokio supports.
fn permits(bound: usize) -> usize {
    bound.min(Semaphore::MAX_PERMITS)
}

async fn close_all<C: RemoteClient>(key: &str, clients: Vec<C>) {
    for mut client in clients {
        debug!(key = %key, "Evicting stale idle client");
        if let Err(e) = client.close().await {
            warn!(key = %key, error = %e, "Failed to close evicted client");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_bounds_are_capped() {
        assert_eq!(permits(usize::MAX), Semaphore::MAX_PERMITS);
        assert_eq!(permits(7), 7);
    }

    #[test]
    fn default_bounds() {
        let config = PoolConfig::default();
        assert_eq!(config.max_idle_per_key, 10);
        assert_eq!(config.max_total_per_key, 20);
        assert_eq!(config.max_total, 100);
        assert_eq!(config.max_block_wait(), Duration::from_secs(5));
        assert_eq!(config.min_evictable_idle(), Duration::from_secs(10));
    }
}
