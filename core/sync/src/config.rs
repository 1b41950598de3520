//! Poll scheduler configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use boardsync_common::{AccountKind, Error, Result};

/// Default period between profile syncs.
pub const DEFAULT_PROFILE_INTERVAL: Duration = Duration::from_secs(60 * 60);
/// Default period between notification syncs.
pub const DEFAULT_NOTIFICATION_INTERVAL: Duration = Duration::from_secs(2 * 60);
/// Shortest accepted timer period; intervals are stored in whole milliseconds.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);
/// Largest accepted state-changed channel capacity.
pub const MAX_EVENT_CAPACITY: usize = 1 << 16;

/// Periods for the two repeating sync timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollIntervals {
    /// Time between profile sync passes.
    #[serde(rename = "profile_interval_ms", with = "duration_ms")]
    pub profile: Duration,
    /// Time between notification sync passes.
    #[serde(rename = "notification_interval_ms", with = "duration_ms")]
    pub notification: Duration,
}

impl PollIntervals {
    pub fn new(profile: Duration, notification: Duration) -> Self {
        Self {
            profile,
            notification,
        }
    }

    /// Check that both periods are usable as timer periods.
    ///
    /// # Errors
    /// - Returns error if either period is shorter than [`MIN_INTERVAL`]
    pub fn validate(&self) -> Result<()> {
        if self.profile < MIN_INTERVAL {
            return Err(Error::InvalidInput(
                "Profile interval must be at least 1ms".to_string(),
            ));
        }
        if self.notification < MIN_INTERVAL {
            return Err(Error::InvalidInput(
                "Notification interval must be at least 1ms".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self::new(DEFAULT_PROFILE_INTERVAL, DEFAULT_NOTIFICATION_INTERVAL)
    }
}

/// Configuration for the poll scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Timer periods.
    #[serde(flatten)]
    pub intervals: PollIntervals,
    /// Which accounts a sync-all pass enumerates.
    pub account_kind: AccountKind,
    /// Buffer size of the state-changed broadcast channel.
    pub event_capacity: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            intervals: PollIntervals::default(),
            account_kind: AccountKind::Trello,
            event_capacity: 64,
        }
    }
}

impl PollConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Check that the configuration can drive a scheduler.
    pub fn validate(&self) -> Result<()> {
        self.intervals.validate()?;
        if self.event_capacity == 0 || self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(Error::InvalidInput(format!(
                "Event capacity must be between 1 and {}",
                MAX_EVENT_CAPACITY
            )));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.intervals.profile, DEFAULT_PROFILE_INTERVAL);
        assert_eq!(config.intervals.notification, DEFAULT_NOTIFICATION_INTERVAL);
        assert_eq!(config.account_kind, AccountKind::Trello);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = PollConfig::from_json(r#"{"notification_interval_ms": 30000}"#).unwrap();
        assert_eq!(config.intervals.notification, Duration::from_secs(30));
        assert_eq!(config.intervals.profile, DEFAULT_PROFILE_INTERVAL);
        assert_eq!(config.event_capacity, 64);
    }

    #[test]
    fn test_json_roundtrip_uses_millis() {
        let config = PollConfig {
            intervals: PollIntervals::new(Duration::from_secs(600), Duration::from_millis(1500)),
            ..PollConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["profile_interval_ms"], 600_000);
        assert_eq!(json["notification_interval_ms"], 1500);
        assert_eq!(json["account_kind"], "trello");
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = PollConfig::from_json(r#"{"profile_interval_ms": 0}"#);
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let intervals = PollIntervals::new(Duration::from_secs(1), Duration::ZERO);
        assert!(intervals.validate().is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = PollConfig::from_json(r#"{"event_capacity": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_huge_capacity_rejected() {
        let result = PollConfig::from_json(r#"{"event_capacity": 18446744073709551615}"#);
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let over = PollConfig {
            event_capacity: MAX_EVENT_CAPACITY + 1,
            ..PollConfig::default()
        };
        assert!(over.validate().is_err());

        let at_limit = PollConfig {
            event_capacity: MAX_EVENT_CAPACITY,
            ..PollConfig::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_sub_millisecond_interval_rejected() {
        let intervals = PollIntervals::new(Duration::from_micros(500), Duration::from_secs(1));
        assert!(matches!(intervals.validate(), Err(Error::InvalidInput(_))));

        let shortest = PollIntervals::new(MIN_INTERVAL, MIN_INTERVAL);
        assert!(shortest.validate().is_ok());
        let json = serde_json::to_value(PollConfig {
            intervals: shortest,
            ..PollConfig::default()
        })
        .unwrap();
        let parsed = PollConfig::from_json(&json.to_string()).unwrap();
        assert_eq!(parsed.intervals, shortest);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"profile_interval_ms": 5000, "event_capacity": 8}}"#).unwrap();

        let config = PollConfig::from_file(file.path()).unwrap();
        assert_eq!(config.intervals.profile, Duration::from_secs(5));
        assert_eq!(config.event_capacity, 8);
    }

    #[test]
    fn test_from_missing_file() {
        let result = PollConfig::from_file("/nonexistent/boardsync.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
