//! In-flight request tracking.
//!
//! The tracker records which (operation, account) pairs currently have an
//! outstanding remote call. It is the single serialization point that keeps
//! the scheduler from issuing duplicate concurrent fetches: a key with an
//! empty or absent entry has nothing outstanding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use boardsync_common::{AccountId, RequestId};

use crate::operation::{OperationType, TrackingKey};

/// Registry of outstanding remote requests keyed by (operation, account).
///
/// Every method takes the lock for the duration of a single map update and
/// never across an await point, so operations on different keys cannot
/// interfere and operations on the same key serialize.
#[derive(Debug, Default)]
pub struct InFlightTracker {
    open: Mutex<HashMap<TrackingKey, Vec<RequestId>>>,
}

impl InFlightTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TrackingKey, Vec<RequestId>>> {
        // The map is always left consistent, so a poisoned lock is still usable.
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of outstanding requests for the key.
    pub fn open_request_count(&self, operation: OperationType, account: &AccountId) -> usize {
        let key = TrackingKey::new(operation, account.clone());
        self.lock().get(&key).map_or(0, Vec::len)
    }

    /// True if any request for the key is outstanding.
    pub fn has_open_request(&self, operation: OperationType, account: &AccountId) -> bool {
        self.open_request_count(operation, account) != 0
    }

    /// Record that a request has been opened.
    ///
    /// A fresh id is generated when `request_id` is `None`. Re-registering an
    /// id that is already tracked moves it to the end instead of adding a
    /// second copy.
    pub fn track_open(
        &self,
        operation: OperationType,
        account: &AccountId,
        request_id: Option<RequestId>,
    ) -> RequestId {
        let request_id = request_id.unwrap_or_default();
        let key = TrackingKey::new(operation, account.clone());
        let mut open = self.lock();
        let ids = open.entry(key).or_default();
        ids.retain(|id| *id != request_id);
        ids.push(request_id);
        request_id
    }

    /// Record that a request has been closed.
    ///
    /// Closing an id that is not tracked is a no-op.
    pub fn track_close(
        &self,
        operation: OperationType,
        account: &AccountId,
        request_id: RequestId,
    ) -> RequestId {
        let key = TrackingKey::new(operation, account.clone());
        let mut open = self.lock();
        if let Some(ids) = open.get_mut(&key) {
            ids.retain(|id| *id != request_id);
            if ids.is_empty() {
                open.remove(&key);
            }
        }
        request_id
    }

    /// Atomically open a request for the key if none is outstanding.
    ///
    /// Returns `None` when the key already has an open request. The returned
    /// guard closes the request when dropped.
    pub fn try_open(
        self: &Arc<Self>,
        operation: OperationType,
        account: &AccountId,
    ) -> Option<InFlightGuard> {
        let key = TrackingKey::new(operation, account.clone());
        let request_id = RequestId::new();
        {
            let mut open = self.lock();
            let ids = open.entry(key.clone()).or_default();
            if !ids.is_empty() {
                return None;
            }
            ids.push(request_id);
        }
        debug!("Opened request {} for {}", request_id, key);
        Some(InFlightGuard {
            tracker: Arc::clone(self),
            key,
            request_id,
            closed: false,
        })
    }

    /// Keys that currently have at least one outstanding request.
    pub fn open_keys(&self) -> Vec<TrackingKey> {
        self.lock()
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// True if nothing is outstanding for any key.
    pub fn is_idle(&self) -> bool {
        self.lock().values().all(Vec::is_empty)
    }
}

/// An open request slot that is closed exactly once.
///
/// The slot is released by [`InFlightGuard::close`] or, failing that, when
/// the guard is dropped (including when the owning task is cancelled).
#[derive(Debug)]
pub struct InFlightGuard {
    tracker: Arc<InFlightTracker>,
    key: TrackingKey,
    request_id: RequestId,
    closed: bool,
}

impl InFlightGuard {
    pub fn key(&self) -> &TrackingKey {
        &self.key
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Close the request now.
    pub fn close(mut self) -> RequestId {
        self.release();
        self.request_id
    }

    fn release(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.tracker
            .track_close(self.key.operation, &self.key.account, self.request_id);
        debug!("Closed request {} for {}", self.request_id, self.key);
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.release();
    }
}
