// ── Backend command names and argument payloads ──
//
// Argument keys are camelCase on the wire; optional values are sent as
// explicit `null` so the backend applies its own defaults.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Every command this client issues to the backend.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BackendCommand {
    GetDevices,
    ConnectAndAddDevice,
    ConnectAndAddDeviceWithConfig,
    DeleteDevice,
    GetDeviceMetrics,
    GetLogPath,
}

impl BackendCommand {
    /// Wire name of the command (e.g. `"get_devices"`).
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// `connect_and_add_device`: connect with backend defaults, then register.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDeviceArgs {
    pub hostname: String,
    pub ip: String,
}

/// `connect_and_add_device_with_config`: connect with explicit SSH options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDeviceWithConfigArgs {
    pub hostname: String,
    pub ip: String,
    pub username: Option<String>,
    pub port: Option<u16>,
    pub strict_host_key_checking: bool,
    pub connect_timeout: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteDeviceArgs {
    pub id: i64,
}

/// `get_device_metrics`: one SSH round trip sampling system health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetricsArgs {
    pub ip: String,
    pub username: String,
    pub port: Option<u16>,
    pub strict_host_key_checking: bool,
    pub connect_timeout: Option<u64>,
}
