//! Result delivery: applying fetched data and notifying observers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boardsync_common::AccountId;

use crate::operation::{OperationType, TrackingKey};
use crate::remote::{Notification, Profile};

/// Service within an account that notification data is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Default,
}

/// Fetched data to merge into the externally owned account cache.
#[derive(Debug, Clone, PartialEq)]
pub enum AccountUpdate {
    /// Replace the account's profile fields.
    Profile { account: AccountId, profile: Profile },
    /// Replace the unread notifications of one service.
    Notifications {
        account: AccountId,
        service: ServiceKind,
        notifications: Vec<Notification>,
    },
}

impl AccountUpdate {
    pub fn account(&self) -> &AccountId {
        match self {
            AccountUpdate::Profile { account, .. } => account,
            AccountUpdate::Notifications { account, .. } => account,
        }
    }

    pub fn operation(&self) -> OperationType {
        match self {
            AccountUpdate::Profile { .. } => OperationType::Profile,
            AccountUpdate::Notifications { .. } => OperationType::Notification,
        }
    }
}

/// Destination for fetched data.
///
/// The scheduler does not own storage; it hands each successful result to
/// the sink and moves on.
pub trait StateSink: Send + Sync {
    fn apply(&self, update: AccountUpdate);
}

/// How a single sync attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Another request for the same key was still outstanding.
    Suppressed,
    /// The account was no longer in the registry.
    AccountMissing,
    /// The fetch succeeded and the result was handed to the sink.
    Applied,
    /// The fetch failed; nothing was applied.
    Failed(String),
}

impl SyncOutcome {
    /// True if a remote call was issued.
    pub fn fetched(&self) -> bool {
        matches!(self, SyncOutcome::Applied | SyncOutcome::Failed(_))
    }
}

/// Broadcast to observers whenever a fetch completes, successfully or not.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    StateChanged {
        key: TrackingKey,
        outcome: SyncOutcome,
        at: DateTime<Utc>,
    },
}
