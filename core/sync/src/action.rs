//! Action surface of the scheduler.
//!
//! Callers that don't hold the scheduler directly send [`SyncAction`]s over a
//! channel; an [`ActionLoop`] task applies them in order.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use boardsync_common::{AccountId, Error, Result};

use crate::config::PollIntervals;
use crate::scheduler::PollScheduler;

/// Something the scheduler can be asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    StartPolling(PollIntervals),
    StopPolling,
    SyncAllProfiles,
    SyncProfile(AccountId),
    SyncAllNotifications,
    SyncNotifications(AccountId),
    SyncNotificationsAfter { account: AccountId, wait: Duration },
    /// Stop polling and end the action loop.
    Shutdown,
}

impl PollScheduler {
    /// Apply one action.
    ///
    /// Sync actions are fire-and-forget; only a rejected start reports an
    /// error.
    pub fn dispatch(&self, action: SyncAction) -> Result<()> {
        debug!("Dispatching {:?}", action);
        match action {
            SyncAction::StartPolling(intervals) => self.start(intervals)?,
            SyncAction::StopPolling | SyncAction::Shutdown => self.stop(),
            SyncAction::SyncAllProfiles => {
                self.sync_all_profiles();
            }
            SyncAction::SyncProfile(account) => {
                self.sync_profile(account);
            }
            SyncAction::SyncAllNotifications => {
                self.sync_all_notifications();
            }
            SyncAction::SyncNotifications(account) => {
                self.sync_notifications(account);
            }
            SyncAction::SyncNotificationsAfter { account, wait } => {
                self.sync_notifications_after(account, wait);
            }
        }
        Ok(())
    }
}

/// Create a bounded action channel.
pub fn action_channel(capacity: usize) -> (ActionSender, ActionLoop) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (ActionSender { tx }, ActionLoop { rx })
}

/// Sending half of the action channel.
#[derive(Debug, Clone)]
pub struct ActionSender {
    tx: mpsc::Sender<SyncAction>,
}

impl ActionSender {
    /// Queue an action, waiting for channel capacity.
    pub async fn send(&self, action: SyncAction) -> Result<()> {
        self.tx
            .send(action)
            .await
            .map_err(|_| Error::Closed("Action loop not running".to_string()))
    }

    /// Queue an action without waiting.
    pub fn try_send(&self, action: SyncAction) -> Result<()> {
        self.tx
            .try_send(action)
            .map_err(|e| Error::Closed(format!("Failed to queue action: {}", e)))
    }

    /// Ask the action loop to stop polling and exit.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(SyncAction::Shutdown).await
    }
}

/// Receiving half of the action channel.
pub struct ActionLoop {
    rx: mpsc::Receiver<SyncAction>,
}

impl ActionLoop {
    /// Apply actions until shutdown or until every sender is dropped.
    ///
    /// This should be spawned in a tokio task.
    pub async fn run(mut self, scheduler: Arc<PollScheduler>) {
        info!("Action loop started");
        while let Some(action) = self.rx.recv().await {
            let shutdown = action == SyncAction::Shutdown;
            if let Err(e) = scheduler.dispatch(action) {
                warn!("Action rejected: {}", e);
            }
            if shutdown {
                break;
            }
        }
        scheduler.stop();
        info!("Action loop stopped");
    }
}
