//! Get-or-load cache with in-flight de-duplication.
//!
//! Owned by whoever needs it (the API state, a session), never a process
//! global. Concurrent callers of [`LoadCache::get_or_load`] share one
//! loader run. Invalidation bumps a generation counter that subscribers
//! observe through a `watch` channel.

use std::future::Future;

use tokio::sync::{watch, Mutex, RwLock};

pub struct LoadCache<T> {
    value: RwLock<Option<T>>,
    /// Held for the duration of a load so only one loader runs at a time.
    inflight: Mutex<()>,
    subscribers: watch::Sender<u64>,
}

impl<T: Clone> Default for LoadCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> LoadCache<T> {
    pub fn new() -> Self {
        let (subscribers, _) = watch::channel(0);
        Self {
            value: RwLock::new(None),
            inflight: Mutex::new(()),
            subscribers,
        }
    }

    /// Return the cached value, or run `loader` once and cache its result.
    ///
    /// Errors are returned to the caller and nothing is cached. A load that
    /// finishes after an [`invalidate`](Self::invalidate) is returned but
    /// not stored.
    pub async fn get_or_load<F, Fut, E>(&self, loader: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.value.read().await.clone() {
            return Ok(value);
        }

        let _guard = self.inflight.lock().await;
        // Another caller may have finished loading while we waited.
        if let Some(value) = self.value.read().await.clone() {
            return Ok(value);
        }

        let generation = self.generation();
        let loaded = loader().await?;
        if self.generation() == generation {
            *self.value.write().await = Some(loaded.clone());
        }
        Ok(loaded)
    }

    /// Cached value without loading.
    pub async fn peek(&self) -> Option<T> {
        self.value.read().await.clone()
    }

    /// Drop the cached value and notify subscribers.
    pub async fn invalidate(&self) {
        *self.value.write().await = None;
        self.subscribers.send_modify(|generation| *generation += 1);
    }

    /// Receive the generation counter, bumped on every invalidation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.subscribers.subscribe()
    }

    pub fn generation(&self) -> u64 {
        *self.subscribers.borrow()
    }
}
