//! Test doubles shared by the executor and scheduler tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use boardsync_common::{Account, AccountId, AccountKind, Credentials, Error, Result};

use crate::executor::SyncExecutor;
use crate::registry::MemoryRegistry;
use crate::remote::{Notification, Profile, RemoteService};
use crate::sink::{AccountUpdate, StateSink};

pub(crate) fn trello_account(id: &str) -> Account {
    Account::new(
        AccountId::new(id).unwrap(),
        AccountKind::Trello,
        Credentials::new("app-key", format!("token-{}", id)),
    )
}

pub(crate) fn account_id(id: &str) -> AccountId {
    AccountId::new(id).unwrap()
}

/// Remote that counts calls and can be told to fail or to take a while.
#[derive(Default)]
pub(crate) struct ScriptedRemote {
    profile_calls: AtomicUsize,
    notification_calls: AtomicUsize,
    fail_profile: AtomicBool,
    fail_notifications: AtomicBool,
    missing_notifications: AtomicBool,
    failing_tokens: Mutex<Vec<String>>,
    latency: Duration,
}

impl ScriptedRemote {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub(crate) fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn notification_calls(&self) -> usize {
        self.notification_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.profile_calls() + self.notification_calls()
    }

    pub(crate) fn fail_profile(&self, fail: bool) {
        self.fail_profile.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn return_no_notifications(&self, missing: bool) {
        self.missing_notifications.store(missing, Ordering::SeqCst);
    }

    /// Make every fetch for one account fail.
    pub(crate) fn fail_account(&self, id: &str) {
        self.failing_tokens
            .lock()
            .unwrap()
            .push(trello_account(id).credentials.token.expose().to_string());
    }

    fn account_fails(&self, credentials: &Credentials) -> bool {
        self.failing_tokens
            .lock()
            .unwrap()
            .iter()
            .any(|token| token == credentials.token.expose())
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl RemoteService for ScriptedRemote {
    async fn fetch_profile(&self, credentials: &Credentials) -> Result<Profile> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if self.fail_profile.load(Ordering::SeqCst) || self.account_fails(credentials) {
            return Err(Error::Network("connection reset".to_string()));
        }
        Ok(Profile {
            username: "a".to_string(),
            email: Some("a@example.com".to_string()),
            ..Profile::default()
        })
    }

    async fn fetch_unread_notifications(
        &self,
        credentials: &Credentials,
    ) -> Result<Option<Vec<Notification>>> {
        self.notification_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        if self.fail_notifications.load(Ordering::SeqCst) || self.account_fails(credentials) {
            return Err(Error::Remote {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        if self.missing_notifications.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(vec![Notification {
            id: "n1".to_string(),
            kind: "mentionedOnCard".to_string(),
            date: chrono::Utc::now(),
            unread: true,
            data: serde_json::Value::Null,
        }]))
    }
}

/// Sink that records every update it receives.
#[derive(Default)]
pub(crate) struct RecordingSink {
    updates: Mutex<Vec<AccountUpdate>>,
}

impl RecordingSink {
    pub(crate) fn updates(&self) -> Vec<AccountUpdate> {
        self.updates.lock().unwrap().clone()
    }
}

impl StateSink for RecordingSink {
    fn apply(&self, update: AccountUpdate) {
        self.updates.lock().unwrap().push(update);
    }
}

pub(crate) struct Harness {
    pub executor: Arc<SyncExecutor>,
    pub registry: Arc<MemoryRegistry>,
    pub remote: Arc<ScriptedRemote>,
    pub sink: Arc<RecordingSink>,
}

pub(crate) fn harness(accounts: &[&str], remote: ScriptedRemote) -> Harness {
    let registry = Arc::new(MemoryRegistry::with_accounts(
        accounts.iter().map(|id| trello_account(id)),
    ));
    let remote = Arc::new(remote);
    let sink = Arc::new(RecordingSink::default());
    let executor = Arc::new(SyncExecutor::new(
        registry.clone(),
        remote.clone(),
        sink.clone(),
        64,
    ));
    Harness {
        executor,
        registry,
        remote,
        sink,
    }
}

/// Let spawned tasks run until the runtime is idle.
///
/// Relies on a paused clock: the short sleep only completes once every
/// ready task has been polled.
pub(crate) async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
