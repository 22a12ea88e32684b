// ── Device domain types ──

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Backend-assigned device identifier. Unique and immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(pub i64);

impl DeviceId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for DeviceId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A registered device, as last reported by the backend.
///
/// Read-only on the client: `last_seen` in particular is only ever
/// written by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub ip: String,
    pub last_seen: Option<DateTime<Utc>>,
}

impl Device {
    /// Human label for `last_seen` relative to `now`.
    ///
    /// `Never`, `Just now`, `N min ago`, `N hr ago`, `N day(s) ago`.
    pub fn last_seen_label(&self, now: DateTime<Utc>) -> String {
        let Some(seen) = self.last_seen else {
            return "Never".to_owned();
        };

        let minutes = (now - seen).num_minutes();
        if minutes < 1 {
            return "Just now".to_owned();
        }
        if minutes < 60 {
            return format!("{minutes} min ago");
        }
        let hours = minutes / 60;
        if hours < 24 {
            return format!("{hours} hr ago");
        }
        let days = hours / 24;
        if days > 1 {
            format!("{days} days ago")
        } else {
            format!("{days} day ago")
        }
    }

    pub fn has_been_seen(&self) -> bool {
        self.last_seen.is_some()
    }
}
