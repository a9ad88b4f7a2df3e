//! Signal source capability and the caching wrapper.

use crate::snapshot::SignalSnapshot;
use aegis_types::Timestamp;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("signal source unavailable: {0}")]
    Unavailable(String),

    #[error("signal fetch timed out")]
    Timeout,
}

/// Produces congestion snapshots. Implementations own their transport,
/// timeout, and retry policy; the call must not be made under any engine
/// lock.
pub trait SignalSource: Send + Sync {
    fn fetch(&self) -> Result<SignalSnapshot, SignalError>;
}

/// A fixed snapshot, used by tests and offline nodes.
#[derive(Clone, Debug)]
pub struct StaticSource(pub SignalSnapshot);

impl SignalSource for StaticSource {
    fn fetch(&self) -> Result<SignalSnapshot, SignalError> {
        Ok(self.0.clone())
    }
}

/// Wraps a source with a TTL cache and the mandated fallback chain:
/// fresh cache hit -> live fetch -> stale cache -> zero pressure.
pub struct CachedSource {
    inner: Box<dyn SignalSource>,
    ttl_secs: u64,
    last_good: Mutex<Option<SignalSnapshot>>,
}

impl CachedSource {
    pub fn new(inner: Box<dyn SignalSource>, ttl_secs: u64) -> Self {
        Self {
            inner,
            ttl_secs,
            last_good: Mutex::new(None),
        }
    }

    /// Get a snapshot for a block being built at `now`. Never fails: fetch
    /// errors degrade to the cached snapshot, then to zero pressure.
    pub fn snapshot(&self, now: Timestamp) -> SignalSnapshot {
        {
            let cache = self.last_good.lock().expect("signal cache poisoned");
            if let Some(snap) = cache.as_ref() {
                if snap.is_fresh(now, self.ttl_secs) {
                    return snap.clone();
                }
            }
        }

        match self.inner.fetch() {
            Ok(mut snap) => {
                // Stamp the capture time if the source left it unset.
                if snap.captured_at == Timestamp::EPOCH {
                    snap.captured_at = now;
                }
                *self.last_good.lock().expect("signal cache poisoned") = Some(snap.clone());
                snap
            }
            Err(err) => {
                let cache = self.last_good.lock().expect("signal cache poisoned");
                match cache.as_ref() {
                    Some(stale) => {
                        tracing::debug!(%err, "signal fetch failed, using stale snapshot");
                        stale.clone()
                    }
                    None => {
                        tracing::warn!(%err, "signal fetch failed with empty cache, using zero pressure");
                        SignalSnapshot::zero(now)
                    }
                }
            }
        }
    }
}
