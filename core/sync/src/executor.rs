//! Single fetch-and-apply cycles for one account and operation type.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use boardsync_common::AccountId;

use crate::config::MAX_EVENT_CAPACITY;
use crate::operation::{OperationType, TrackingKey};
use crate::registry::AccountRegistry;
use crate::remote::RemoteService;
use crate::sink::{AccountUpdate, ServiceKind, StateSink, SyncEvent, SyncOutcome};
use crate::tracker::InFlightTracker;

/// Runs sync operations against the remote service.
///
/// The executor owns the in-flight tracker, so at most one fetch per
/// (operation, account) is outstanding no matter how many callers ask.
/// Requests for a key that is already in flight are dropped, not queued.
pub struct SyncExecutor {
    tracker: Arc<InFlightTracker>,
    registry: Arc<dyn AccountRegistry>,
    remote: Arc<dyn RemoteService>,
    sink: Arc<dyn StateSink>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncExecutor {
    /// Create a new executor.
    ///
    /// `event_capacity` bounds how many unread events a slow observer may
    /// lag behind before it starts missing them. It is clamped to
    /// `1..=MAX_EVENT_CAPACITY`.
    pub fn new(
        registry: Arc<dyn AccountRegistry>,
        remote: Arc<dyn RemoteService>,
        sink: Arc<dyn StateSink>,
        event_capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self {
            tracker: Arc::new(InFlightTracker::new()),
            registry,
            remote,
            sink,
            events,
        }
    }

    /// Get a reference to the in-flight tracker.
    pub fn tracker(&self) -> &Arc<InFlightTracker> {
        &self.tracker
    }

    /// Get a reference to the account registry.
    pub fn registry(&self) -> &Arc<dyn AccountRegistry> {
        &self.registry
    }

    /// Subscribe to state-changed events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Perform one sync of `operation` for `account_id`.
    ///
    /// Never fails: duplicates and vanished accounts are reported as
    /// outcomes, and fetch errors are logged and returned as
    /// [`SyncOutcome::Failed`].
    pub async fn run(&self, operation: OperationType, account_id: &AccountId) -> SyncOutcome {
        if self.tracker.has_open_request(operation, account_id) {
            debug!("Skipping {} sync for {}: request in flight", operation, account_id);
            return SyncOutcome::Suppressed;
        }

        let Some(account) = self.registry.account(account_id) else {
            debug!("Skipping {} sync for {}: account not found", operation, account_id);
            return SyncOutcome::AccountMissing;
        };

        // Another task may have opened the slot since the check above.
        let Some(guard) = self.tracker.try_open(operation, account_id) else {
            debug!("Skipping {} sync for {}: request in flight", operation, account_id);
            return SyncOutcome::Suppressed;
        };
        let key = guard.key().clone();

        let result = match operation {
            OperationType::Profile => self
                .remote
                .fetch_profile(&account.credentials)
                .await
                .map(|profile| AccountUpdate::Profile {
                    account: account.id.clone(),
                    profile,
                }),
            OperationType::Notification => self
                .remote
                .fetch_unread_notifications(&account.credentials)
                .await
                .map(|notifications| AccountUpdate::Notifications {
                    account: account.id.clone(),
                    service: ServiceKind::Default,
                    notifications: notifications.unwrap_or_default(),
                }),
        };
        guard.close();

        let outcome = match result {
            Ok(update) => {
                self.sink.apply(update);
                debug!("Applied {} sync", key);
                SyncOutcome::Applied
            }
            Err(e) => {
                error!("Sync {} failed: {}", key, e);
                SyncOutcome::Failed(e.to_string())
            }
        };

        self.notify(key, outcome.clone());
        outcome
    }

    /// Run a sync on its own task.
    ///
    /// The returned handle may be dropped; the sync still runs to completion.
    pub fn spawn(
        self: &Arc<Self>,
        operation: OperationType,
        account_id: AccountId,
    ) -> JoinHandle<SyncOutcome> {
        let executor = Arc::clone(self);
        tokio::spawn(async move { executor.run(operation, &account_id).await })
    }

    /// Run a sync on its own task after `wait` has elapsed.
    pub fn spawn_after(
        self: &Arc<Self>,
        operation: OperationType,
        account_id: AccountId,
        wait: Duration,
    ) -> JoinHandle<SyncOutcome> {
        let executor = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            executor.run(operation, &account_id).await
        })
    }

    fn notify(&self, key: TrackingKey, outcome: SyncOutcome) {
        // No subscribers is fine.
        let _ = self.events.send(SyncEvent::StateChanged {
            key,
            outcome,
            at: Utc::now(),
        });
    }
}
