//! Operation types and the keys the in-flight tracker is indexed by.

use serde::{Deserialize, Serialize};
use std::fmt;

use boardsync_common::AccountId;

/// Kind of remote fetch the scheduler performs for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    /// Account profile (username, email, avatar).
    Profile,
    /// Unread notifications.
    Notification,
}

impl OperationType {
    /// All operation types, in polling order.
    pub const ALL: [OperationType; 2] = [OperationType::Profile, OperationType::Notification];
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationType::Profile => write!(f, "profile"),
            OperationType::Notification => write!(f, "notification"),
        }
    }
}

/// One logical in-flight slot: an operation type for a single account.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingKey {
    pub operation: OperationType,
    pub account: AccountId,
}

impl TrackingKey {
    pub fn new(operation: OperationType, account: AccountId) -> Self {
        Self { operation, account }
    }
}

impl fmt::Display for TrackingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.operation, self.account)
    }
}
