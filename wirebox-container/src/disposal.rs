//! Disposal tracker.
//!
//! Remembers every value the container owns that exposes a [`Release`]
//! hook, and releases them in reverse registration order on teardown.
//!
//! [`Release`]: crate::shape::Release

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{error, trace};

use crate::error::{BoxError, ReleaseFailure};
use crate::key::DependencyKey;
use crate::shape::Component;

type ReleaseFn = Box<dyn FnOnce() -> Result<(), BoxError> + Send>;

struct ReleaseRecord {
    key: DependencyKey,
    /// Data address of the recorded value. The record keeps the value
    /// alive, so the address stays unique while it is recorded.
    addr: usize,
    release: ReleaseFn,
}

/// Ordered record of owned releasable values.
#[derive(Default)]
pub struct DisposalTracker {
    records: Mutex<Vec<ReleaseRecord>>,
}

impl DisposalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value` if it exposes a release hook and is not recorded
    /// yet. Returns whether it was recorded.
    pub fn track<T: Component>(&self, value: &Arc<T>) -> bool {
        if value.as_release().is_none() {
            return false;
        }

        let key = DependencyKey::of::<T>();
        let addr = Arc::as_ptr(value) as *const () as usize;
        let mut records = self.records.lock();
        if records.iter().any(|record| record.addr == addr) {
            trace!(key = %key, "Value already tracked");
            return false;
        }

        let value = Arc::clone(value);
        records.push(ReleaseRecord {
            key,
            addr,
            release: Box::new(move || match value.as_release() {
                Some(hook) => hook.release(),
                None => Ok(()),
            }),
        });
        trace!(key = %key, "Tracking releasable value");
        true
    }

    /// Releases every recorded value, last recorded first.
    ///
    /// Every hook runs even if earlier ones fail. Failures are logged and
    /// returned in release order. The record is empty afterwards.
    pub fn release_all(&self) -> Vec<ReleaseFailure> {
        let records = std::mem::take(&mut *self.records.lock());
        let mut failures = Vec::new();

        for record in records.into_iter().rev() {
            if let Err(source) = (record.release)() {
                error!(key = %record.key, error = %source, "Release hook failed");
                failures.push(ReleaseFailure {
                    key: record.key,
                    source,
                });
            }
        }

        failures
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl std::fmt::Debug for DisposalTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposalTracker")
            .field("tracked", &self.len())
            .finish()
    }
}
