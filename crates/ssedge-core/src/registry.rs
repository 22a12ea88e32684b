// ── Device registry client ──
//
// Typed wrapper over the registry commands. Each call site decides how a
// transport failure reads to the user; nothing is retried and nothing is
// inserted optimistically.

use serde_json::Value;
use tracing::debug;

use ssedge_api::{AddDeviceArgs, AddDeviceWithConfigArgs, BackendClient, Invoke};

use crate::error::CoreError;
use crate::model::{ConnectionConfig, Device, DeviceId, ResolvedAdd, SimpleAdd};

pub struct DeviceRegistry<I> {
    client: BackendClient<I>,
}

impl<I> Clone for DeviceRegistry<I> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<I: Invoke> DeviceRegistry<I> {
    pub fn new(client: BackendClient<I>) -> Self {
        Self { client }
    }

    /// Every registered device, in backend order.
    pub async fn list(&self) -> Result<Vec<Device>, CoreError> {
        let records = self.client.get_devices().await?;
        debug!(count = records.len(), "registry listed");
        Ok(records.into_iter().map(Device::from).collect())
    }

    /// Register with backend-chosen SSH options.
    pub async fn add_simple(&self, hostname: &str, ip: &str) -> Result<Value, CoreError> {
        let args = AddDeviceArgs::from(&SimpleAdd {
            hostname: hostname.to_owned(),
            ip: ip.to_owned(),
        });
        self.client
            .connect_and_add_device(&args)
            .await
            .map_err(CoreError::from_add)
    }

    pub async fn add_advanced(&self, config: &ConnectionConfig) -> Result<Value, CoreError> {
        self.client
            .connect_and_add_device_with_config(&AddDeviceWithConfigArgs::from(config))
            .await
            .map_err(CoreError::from_add)
    }

    /// Dispatch a resolved draft to the matching add command.
    pub async fn add(&self, resolved: &ResolvedAdd) -> Result<Value, CoreError> {
        match resolved {
            ResolvedAdd::Simple(s) => self.add_simple(&s.hostname, &s.ip).await,
            ResolvedAdd::Advanced(c) => self.add_advanced(c).await,
        }
    }

    /// Delete a device. A backend that reports the id as unknown yields
    /// [`CoreError::NotFound`].
    pub async fn remove(&self, id: DeviceId) -> Result<(), CoreError> {
        self.client
            .delete_device(id.get())
            .await
            .map_err(|err| match err {
                ssedge_api::Error::Command { ref message, .. }
                    if message.to_ascii_lowercase().contains("not found") =>
                {
                    CoreError::NotFound { id }
                }
                other => CoreError::from(other),
            })
    }
}
