//! Poll scheduling - repeating profile and notification sync timers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use boardsync_common::{AccountId, AccountKind, Result};

use crate::config::{PollConfig, PollIntervals};
use crate::executor::SyncExecutor;
use crate::operation::OperationType;
use crate::registry::AccountRegistry;
use crate::remote::RemoteService;
use crate::sink::{StateSink, SyncEvent, SyncOutcome};

/// Whether the repeating timers are installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Stopped,
    Running,
}

#[derive(Default)]
struct Pollers {
    profile: Option<JoinHandle<()>>,
    notification: Option<JoinHandle<()>>,
    intervals: Option<PollIntervals>,
}

impl Pollers {
    fn cancel(&mut self) {
        if let Some(handle) = self.profile.take() {
            handle.abort();
        }
        if let Some(handle) = self.notification.take() {
            handle.abort();
        }
        self.intervals = None;
    }
}

/// Scheduler for periodic account syncs.
///
/// Owns one repeating timer per operation type. Each tick enumerates the
/// registry and spawns an independent sync per account; the executor drops
/// any that are already in flight. Timer methods spawn onto the current
/// Tokio runtime and must be called from within one.
pub struct PollScheduler {
    executor: Arc<SyncExecutor>,
    account_kind: AccountKind,
    pollers: Mutex<Pollers>,
}

impl PollScheduler {
    /// Create a stopped scheduler that polls accounts of `account_kind`.
    pub fn new(executor: Arc<SyncExecutor>, account_kind: AccountKind) -> Self {
        Self {
            executor,
            account_kind,
            pollers: Mutex::new(Pollers::default()),
        }
    }

    /// Build the executor and scheduler from a configuration.
    pub fn from_config(
        registry: Arc<dyn AccountRegistry>,
        remote: Arc<dyn RemoteService>,
        sink: Arc<dyn StateSink>,
        config: &PollConfig,
    ) -> Result<Self> {
        config.validate()?;
        let executor = SyncExecutor::new(registry, remote, sink, config.event_capacity);
        Ok(Self::new(Arc::new(executor), config.account_kind.clone()))
    }

    fn lock(&self) -> MutexGuard<'_, Pollers> {
        self.pollers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the executor that runs individual syncs.
    pub fn executor(&self) -> &Arc<SyncExecutor> {
        &self.executor
    }

    /// Subscribe to state-changed events.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.executor.subscribe()
    }

    /// Current scheduler state.
    pub fn state(&self) -> PollState {
        if self.lock().intervals.is_some() {
            PollState::Running
        } else {
            PollState::Stopped
        }
    }

    /// Intervals of the running timers, if any.
    pub fn intervals(&self) -> Option<PollIntervals> {
        self.lock().intervals
    }

    /// Start (or restart) both repeating timers.
    ///
    /// Any timers from a previous start are cancelled first. One sync pass
    /// per operation type runs immediately rather than waiting for the
    /// first tick.
    ///
    /// # Errors
    /// - Returns error if either interval is zero; the scheduler is left as it was
    pub fn start(&self, intervals: PollIntervals) -> Result<()> {
        intervals.validate()?;

        {
            let mut pollers = self.lock();
            pollers.cancel();
            pollers.profile = Some(self.spawn_poller(OperationType::Profile, intervals.profile));
            pollers.notification =
                Some(self.spawn_poller(OperationType::Notification, intervals.notification));
            pollers.intervals = Some(intervals);
        }

        info!(
            "Poll scheduler started (profiles every {:?}, notifications every {:?})",
            intervals.profile, intervals.notification
        );

        self.sync_all(OperationType::Profile);
        self.sync_all(OperationType::Notification);
        Ok(())
    }

    /// Cancel both repeating timers.
    ///
    /// Syncs that are already in flight are not cancelled; they complete and
    /// notify observers as usual.
    pub fn stop(&self) {
        let mut pollers = self.lock();
        if pollers.intervals.is_none() {
            return;
        }
        pollers.cancel();
        info!("Poll scheduler stopped");
    }

    /// Spawn a sync of `operation` for every account of the polled kind.
    ///
    /// Each account syncs on its own task; one failing does not affect the
    /// others. The handles may be dropped.
    pub fn sync_all(&self, operation: OperationType) -> Vec<JoinHandle<SyncOutcome>> {
        sync_all_accounts(&self.executor, &self.account_kind, operation)
    }

    pub fn sync_all_profiles(&self) -> Vec<JoinHandle<SyncOutcome>> {
        self.sync_all(OperationType::Profile)
    }

    pub fn sync_all_notifications(&self) -> Vec<JoinHandle<SyncOutcome>> {
        self.sync_all(OperationType::Notification)
    }

    pub fn sync_profile(&self, account_id: AccountId) -> JoinHandle<SyncOutcome> {
        self.executor.spawn(OperationType::Profile, account_id)
    }

    pub fn sync_notifications(&self, account_id: AccountId) -> JoinHandle<SyncOutcome> {
        self.executor.spawn(OperationType::Notification, account_id)
    }

    /// Re-check one account's notifications after `wait`.
    ///
    /// Not tied to the repeating timers: stopping the scheduler does not
    /// cancel it.
    pub fn sync_notifications_after(
        &self,
        account_id: AccountId,
        wait: Duration,
    ) -> JoinHandle<SyncOutcome> {
        debug!("Scheduling notification sync for {} in {:?}", account_id, wait);
        self.executor
            .spawn_after(OperationType::Notification, account_id, wait)
    }

    fn spawn_poller(&self, operation: OperationType, period: Duration) -> JoinHandle<()> {
        let executor = Arc::clone(&self.executor);
        let kind = self.account_kind.clone();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; start() already ran that pass.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                debug!("Triggering periodic {} sync", operation);
                sync_all_accounts(&executor, &kind, operation);
            }
        })
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.lock().cancel();
    }
}

fn sync_all_accounts(
    executor: &Arc<SyncExecutor>,
    kind: &AccountKind,
    operation: OperationType,
) -> Vec<JoinHandle<SyncOutcome>> {
    let accounts = executor.registry().accounts_of_kind(kind);
    debug!("Syncing {} for {} {} accounts", operation, accounts.len(), kind);
    accounts
        .into_iter()
        .map(|account| executor.spawn(operation, account.id))
        .collect()
}
