//! Account registry abstraction and an in-memory implementation.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use boardsync_common::{Account, AccountId, AccountKind};

/// Source of the accounts the scheduler polls.
///
/// The registry is owned elsewhere; the scheduler only reads from it and
/// tolerates accounts disappearing between scheduling and execution.
pub trait AccountRegistry: Send + Sync {
    /// All accounts of the given kind.
    fn accounts_of_kind(&self, kind: &AccountKind) -> Vec<Account>;

    /// Look up a single account.
    fn account(&self, id: &AccountId) -> Option<Account>;
}

/// In-memory account registry.
///
/// Accounts are kept ordered by id so enumeration is deterministic.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    accounts: RwLock<BTreeMap<AccountId, Account>>,
}

impl MemoryRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with accounts.
    pub fn with_accounts(accounts: impl IntoIterator<Item = Account>) -> Self {
        let registry = Self::new();
        for account in accounts {
            registry.insert(account);
        }
        registry
    }

    /// Add or replace an account. Returns the previous entry, if any.
    pub fn insert(&self, account: Account) -> Option<Account> {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account.id.clone(), account)
    }

    /// Remove an account.
    pub fn remove(&self, id: &AccountId) -> Option<Account> {
        self.accounts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    pub fn len(&self) -> usize {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AccountRegistry for MemoryRegistry {
    fn accounts_of_kind(&self, kind: &AccountKind) -> Vec<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|account| &account.kind == kind)
            .cloned()
            .collect()
    }

    fn account(&self, id: &AccountId) -> Option<Account> {
        self.accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}
