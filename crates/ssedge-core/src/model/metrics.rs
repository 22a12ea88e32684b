// ── Live metrics snapshot ──

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One immutable health reading from a device. Replaced wholesale on
/// every successful poll; never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub cpu_usage: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
    pub memory_percent: f64,
    pub disk_used_gb: f64,
    pub disk_total_gb: f64,
    pub disk_percent: f64,
    pub uptime_seconds: u64,
    /// Backend format: `"1m,5m,15m"`.
    pub load_average: String,
    /// Epoch seconds at which the backend took the sample.
    pub timestamp: i64,
}

impl MetricsSnapshot {
    pub fn uptime(&self) -> Duration {
        Duration::from_secs(self.uptime_seconds)
    }

    /// Compact uptime such as `3d 4h 12m`, or `42s` under a minute.
    pub fn uptime_label(&self) -> String {
        let secs = self.uptime_seconds;
        if secs < 60 {
            return format!("{secs}s");
        }
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3_600;
        let minutes = (secs % 3_600) / 60;

        let mut parts = Vec::with_capacity(3);
        if days > 0 {
            parts.push(format!("{days}d"));
        }
        if days > 0 || hours > 0 {
            parts.push(format!("{hours}h"));
        }
        parts.push(format!("{minutes}m"));
        parts.join(" ")
    }

    /// The 1, 5 and 15 minute load averages, if the string is well formed.
    pub fn load_averages(&self) -> Option<[f64; 3]> {
        let mut values = self
            .load_average
            .split(',')
            .map(|v| v.trim().parse::<f64>());
        let one = values.next()?.ok()?;
        let five = values.next()?.ok()?;
        let fifteen = values.next()?.ok()?;
        if values.next().is_some() {
            return None;
        }
        Some([one, five, fifteen])
    }
}
