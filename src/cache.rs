use std::sync::Arc;

use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// CachedProvider – single-slot memoization of an expensive load
// ---------------------------------------------------------------------------

/// Memoizes the result of an expensive producer, keyed by provenance (source
/// path, training parameters, …).
///
/// A single slot mirrors the "one dataset per session" usage: a `get` with
/// the cached key returns the stored value without re-invoking the producer,
/// a `get` with a different key replaces the entry.  The slot lock is held
/// across production, so overlapping calls for the same key resolve to one
/// producer invocation whose result every caller shares.  There is no
/// invalidation API beyond changing the key; the entry lives for the process
/// lifetime.
pub struct CachedProvider<K, V> {
    slot: Mutex<Option<(K, Arc<V>)>>,
}

impl<K: PartialEq, V> CachedProvider<K, V> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Fetch the value for `key`, invoking `producer` only on a miss.
    ///
    /// A failed production leaves the previous entry (if any) intact, so a
    /// later call with the old key still hits the cache.
    pub fn get<E>(
        &self,
        key: K,
        producer: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        let mut slot = self.slot.lock();
        if let Some((cached_key, value)) = slot.as_ref() {
            if *cached_key == key {
                return Ok(Arc::clone(value));
            }
        }
        let value = Arc::new(producer()?);
        *slot = Some((key, Arc::clone(&value)));
        Ok(value)
    }

    /// Key of the currently cached entry, if any.
    pub fn cached_key(&self) -> Option<K>
    where
        K: Clone,
    {
        self.slot.lock().as_ref().map(|(k, _)| k.clone())
    }
}

impl<K: PartialEq, V> Default for CachedProvider<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
