// ── Runtime controller configuration ──
//
// Tuning handed in by the embedder. Core never reads config files; the
// `ssedge-config` crate builds one of these from disk and environment.

use std::time::Duration;

use crate::model::MetricsAccess;

/// Cadence of recurring metrics fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub(crate) const NOTIFICATION_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Time between recurring metrics fetches. Must be non-zero.
    pub poll_interval: Duration,
    /// SSH settings for metrics on devices whose own settings are unknown
    /// (anything not added during this session).
    pub metrics_defaults: MetricsAccess,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            metrics_defaults: MetricsAccess::default(),
        }
    }
}
