// ── Backend response records ──
//
// Raw shapes returned by the backend. `ssedge-core` converts these into
// domain types; nothing here is interpreted beyond decoding.

use serde::{Deserialize, Serialize};

/// One entry of the `get_devices` response.
///
/// `last_seen` is epoch milliseconds, or `null` for a device the backend
/// has never reached after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub id: i64,
    pub name: String,
    pub ip: String,
    #[serde(default)]
    pub last_seen: Option<i64>,
}

/// `get_device_metrics` response: one point-in-time health sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub cpu_usage: f64,
    pub memory_used_mb: f64,
    pub memory_total_mb: f64,
    pub memory_percent: f64,
    pub disk_used_gb: f64,
    pub disk_total_gb: f64,
    pub disk_percent: f64,
    pub uptime_seconds: u64,
    pub load_average: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_record_accepts_missing_last_seen() {
        let record: DeviceRecord =
            serde_json::from_value(json!({ "id": 4, "name": "edge", "ip": "10.1.1.1" }))
                .expect("valid record");
        assert_eq!(record.last_seen, None);
    }

    #[test]
    fn metrics_record_decodes_backend_payload() {
        let record: MetricsRecord = serde_json::from_value(json!({
            "cpu_usage": 12.5,
            "memory_used_mb": 512.0,
            "memory_total_mb": 2048.0,
            "memory_percent": 25.0,
            "disk_used_gb": 10.0,
            "disk_total_gb": 40.0,
            "disk_percent": 25.0,
            "uptime_seconds": 3600,
            "load_average": "0.10,0.20,0.30",
            "timestamp": 1_700_000_000
        }))
        .expect("valid metrics");
        assert_eq!(record.uptime_seconds, 3600);
        assert_eq!(record.load_average, "0.10,0.20,0.30");
    }
}
