//! Common utilities and types shared across boardsync modules.
//!
//! This module provides the account model and error type that the sync
//! scheduler and its collaborators agree on.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Account, AccountId, AccountKind, AuthToken, Credentials, RequestId};
