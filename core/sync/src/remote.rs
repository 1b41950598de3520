//! Remote service abstraction.
//!
//! The scheduler does not build requests itself; it calls into a
//! [`RemoteService`] implementation that knows how to reach the API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boardsync_common::{Credentials, Result};

/// Profile information for an account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub initials: Option<String>,
    /// Where the avatar comes from (e.g. "upload", "gravatar").
    #[serde(default)]
    pub avatar_source: Option<String>,
    #[serde(default)]
    pub avatar_hash: Option<String>,
}

/// A single unread notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: DateTime<Utc>,
    #[serde(default = "default_unread")]
    pub unread: bool,
    /// Service-specific payload, passed through untouched.
    #[serde(default)]
    pub data: serde_json::Value,
}

fn default_unread() -> bool {
    true
}

/// Remote operations the scheduler needs.
///
/// Implementations must handle their own transport concerns. Errors are
/// reported back to the scheduler, which logs them and waits for the next
/// scheduled tick rather than retrying.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Fetch the profile of the account the credentials belong to.
    async fn fetch_profile(&self, credentials: &Credentials) -> Result<Profile>;

    /// Fetch the account's unread notifications.
    ///
    /// `None` from the API is treated as an empty list.
    async fn fetch_unread_notifications(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Vec<Notification>>>;
}
