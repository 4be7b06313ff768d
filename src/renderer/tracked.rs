//! Resource identity wrapper

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_RESOURCE_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_RESOURCE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Wraps a GPU resource with a unique ID.
///
/// Views, samplers and buffers handed across pass boundaries carry an
/// identity so bind-group caches can key on *which* resource is bound
/// without comparing GPU handles. Cloning preserves the ID: a clone is the
/// same logical resource.
#[derive(Debug, Clone)]
pub struct Tracked<T> {
    inner: T,
    id: u64,
}

impl<T> Tracked<T> {
    /// Wraps a resource and assigns a fresh ID.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            id: next_id(),
        }
    }

    /// Unique ID, usable as a cache key.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Unwraps the inner resource.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Tracked<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
