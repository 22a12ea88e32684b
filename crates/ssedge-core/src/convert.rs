// ── Backend record conversion ──
//
// Translates `ssedge-api` wire records into domain types and domain
// settings into command arguments.

use chrono::{DateTime, Utc};

use ssedge_api::{
    AddDeviceArgs, AddDeviceWithConfigArgs, DeviceMetricsArgs, DeviceRecord, MetricsRecord,
};

use crate::model::{
    ConnectionConfig, Device, DeviceId, MetricsAccess, MetricsSnapshot, SimpleAdd,
};

impl From<DeviceRecord> for Device {
    fn from(record: DeviceRecord) -> Self {
        Self {
            id: DeviceId(record.id),
            name: record.name,
            ip: record.ip,
            // A zero timestamp is how the registry spells "never".
            last_seen: record
                .last_seen
                .filter(|ms| *ms != 0)
                .and_then(DateTime::<Utc>::from_timestamp_millis),
        }
    }
}

impl From<MetricsRecord> for MetricsSnapshot {
    fn from(r: MetricsRecord) -> Self {
        Self {
            cpu_usage: r.cpu_usage,
            memory_used_mb: r.memory_used_mb,
            memory_total_mb: r.memory_total_mb,
            memory_percent: r.memory_percent,
            disk_used_gb: r.disk_used_gb,
            disk_total_gb: r.disk_total_gb,
            disk_percent: r.disk_percent,
            uptime_seconds: r.uptime_seconds,
            load_average: r.load_average,
            timestamp: r.timestamp,
        }
    }
}

impl From<&SimpleAdd> for AddDeviceArgs {
    fn from(add: &SimpleAdd) -> Self {
        Self {
            hostname: add.hostname.clone(),
            ip: add.ip.clone(),
        }
    }
}

impl From<&ConnectionConfig> for AddDeviceWithConfigArgs {
    fn from(c: &ConnectionConfig) -> Self {
        Self {
            hostname: c.hostname.clone(),
            ip: c.ip.clone(),
            username: c.username.clone(),
            port: c.port,
            strict_host_key_checking: c.strict_host_key_checking,
            connect_timeout: c.connect_timeout,
        }
    }
}

impl MetricsAccess {
    pub(crate) fn to_args(&self, ip: &str) -> DeviceMetricsArgs {
        DeviceMetricsArgs {
            ip: ip.to_owned(),
            username: self.username.clone(),
            port: self.port,
            strict_host_key_checking: self.strict_host_key_checking,
            connect_timeout: self.connect_timeout_secs,
        }
    }
}
