//! boardsync scheduler
//!
//! This module keeps cached account data fresh against a remote service:
//! - Repeating profile and notification poll timers
//! - At most one in-flight fetch per (operation, account)
//! - Fetch results handed to an external state sink
//! - State-changed events for observers
//! - A channel-driven action surface

pub mod action;
pub mod config;
pub mod executor;
pub mod operation;
pub mod registry;
pub mod remote;
pub mod scheduler;
pub mod sink;
pub mod tracker;

#[cfg(test)]
mod testing;

// Re-export main types
pub use action::{action_channel, ActionLoop, ActionSender, SyncAction};
pub use config::{
    PollConfig, PollIntervals, DEFAULT_NOTIFICATION_INTERVAL, DEFAULT_PROFILE_INTERVAL,
    MAX_EVENT_CAPACITY, MIN_INTERVAL,
};
pub use executor::SyncExecutor;
pub use operation::{OperationType, TrackingKey};
pub use registry::{AccountRegistry, MemoryRegistry};
pub use remote::{Notification, Profile, RemoteService};
pub use scheduler::{PollScheduler, PollState};
pub use sink::{AccountUpdate, ServiceKind, StateSink, SyncEvent, SyncOutcome};
pub use tracker::{InFlightGuard, InFlightTracker};
