// ── Add-device form state ──

use serde::{Deserialize, Serialize};

pub const DEFAULT_USERNAME: &str = "";
pub const DEFAULT_PORT: &str = "22";
pub const DEFAULT_STRICT_HOST_KEY_CHECKING: bool = true;
pub const DEFAULT_CONNECT_TIMEOUT: &str = "30";

/// Raw, unvalidated add-form input. Numeric fields are kept as the text
/// the user typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDraft {
    pub name: String,
    pub ip: String,
    pub username: String,
    pub port: String,
    pub strict_host_key_checking: bool,
    pub connect_timeout: String,
}

impl Default for DeviceDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            ip: String::new(),
            username: DEFAULT_USERNAME.to_owned(),
            port: DEFAULT_PORT.to_owned(),
            strict_host_key_checking: DEFAULT_STRICT_HOST_KEY_CHECKING,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT.to_owned(),
        }
    }
}

impl DeviceDraft {
    /// Draft with a name and address and every SSH option at its default.
    pub fn new(name: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            ..Self::default()
        }
    }

    /// `true` when every SSH option is textually identical to its default.
    ///
    /// Exact comparison: `"022"` is not the default port.
    pub fn uses_default_ssh_options(&self) -> bool {
        self.username == DEFAULT_USERNAME
            && self.port == DEFAULT_PORT
            && self.strict_host_key_checking == DEFAULT_STRICT_HOST_KEY_CHECKING
            && self.connect_timeout == DEFAULT_CONNECT_TIMEOUT
    }

    /// Put every SSH option back to its default, keeping name and address.
    pub fn reset_ssh_options(&mut self) {
        let defaults = Self::default();
        self.username = defaults.username;
        self.port = defaults.port;
        self.strict_host_key_checking = defaults.strict_host_key_checking;
        self.connect_timeout = defaults.connect_timeout;
    }
}
