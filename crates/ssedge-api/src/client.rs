// Backend command client
//
// Wraps an `Invoke` transport with typed argument encoding and result
// decoding. One inherent method per backend command.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::command::{
    AddDeviceArgs, AddDeviceWithConfigArgs, BackendCommand, DeleteDeviceArgs, DeviceMetricsArgs,
};
use crate::error::Error;
use crate::models::{DeviceRecord, MetricsRecord};
use crate::transport::Invoke;

/// Typed client for the backend command surface.
///
/// Cheaply cloneable; clones share the transport and the cached log path.
pub struct BackendClient<I> {
    invoker: Arc<I>,
    log_path: Arc<OnceCell<String>>,
}

impl<I> Clone for BackendClient<I> {
    fn clone(&self) -> Self {
        Self {
            invoker: Arc::clone(&self.invoker),
            log_path: Arc::clone(&self.log_path),
        }
    }
}

impl<I: Invoke> BackendClient<I> {
    pub fn new(invoker: I) -> Self {
        Self::from_shared(Arc::new(invoker))
    }

    /// Build a client over a transport that is also used elsewhere.
    pub fn from_shared(invoker: Arc<I>) -> Self {
        Self {
            invoker,
            log_path: Arc::new(OnceCell::new()),
        }
    }

    /// The underlying transport.
    pub fn invoker(&self) -> &Arc<I> {
        &self.invoker
    }

    // ── Registry ─────────────────────────────────────────────────────

    /// `get_devices`: the full registry, in backend order.
    pub async fn get_devices(&self) -> Result<Vec<DeviceRecord>, Error> {
        debug!("listing devices");
        self.call(BackendCommand::GetDevices, Value::Null).await
    }

    /// `connect_and_add_device`: returns the backend's opaque confirmation.
    pub async fn connect_and_add_device(&self, args: &AddDeviceArgs) -> Result<Value, Error> {
        debug!(hostname = %args.hostname, ip = %args.ip, "adding device");
        let args = encode(BackendCommand::ConnectAndAddDevice, args)?;
        self.call(BackendCommand::ConnectAndAddDevice, args).await
    }

    /// `connect_and_add_device_with_config`: returns the opaque confirmation.
    pub async fn connect_and_add_device_with_config(
        &self,
        args: &AddDeviceWithConfigArgs,
    ) -> Result<Value, Error> {
        debug!(
            hostname = %args.hostname,
            ip = %args.ip,
            port = ?args.port,
            strict = args.strict_host_key_checking,
            "adding device with explicit ssh options"
        );
        let args = encode(BackendCommand::ConnectAndAddDeviceWithConfig, args)?;
        self.call(BackendCommand::ConnectAndAddDeviceWithConfig, args)
            .await
    }

    /// `delete_device`
    pub async fn delete_device(&self, id: i64) -> Result<(), Error> {
        debug!(id, "deleting device");
        let args = encode(BackendCommand::DeleteDevice, &DeleteDeviceArgs { id })?;
        let _: Value = self.call(BackendCommand::DeleteDevice, args).await?;
        Ok(())
    }

    // ── Metrics ──────────────────────────────────────────────────────

    /// `get_device_metrics`: one health sample from the remote host.
    pub async fn get_device_metrics(
        &self,
        args: &DeviceMetricsArgs,
    ) -> Result<MetricsRecord, Error> {
        trace!(ip = %args.ip, "fetching device metrics");
        let args = encode(BackendCommand::GetDeviceMetrics, args)?;
        self.call(BackendCommand::GetDeviceMetrics, args).await
    }

    // ── Logging ──────────────────────────────────────────────────────

    /// `get_log_path`: asked once, then served from cache.
    ///
    /// A failed lookup is not cached, so the next call asks again.
    pub async fn log_path(&self) -> Result<String, Error> {
        self.log_path
            .get_or_try_init(|| async {
                debug!("resolving backend log path");
                self.call::<String>(BackendCommand::GetLogPath, Value::Null)
                    .await
            })
            .await
            .cloned()
    }

    // ── Transport mechanics ──────────────────────────────────────────

    async fn call<T: DeserializeOwned>(
        &self,
        command: BackendCommand,
        args: Value,
    ) -> Result<T, Error> {
        let raw = self
            .invoker
            .invoke(command, args)
            .await
            .map_err(|e| Error::from_invoke(command, e))?;
        serde_json::from_value(raw).map_err(|e| Error::Deserialization {
            command,
            message: e.to_string(),
        })
    }
}

fn encode<A: Serialize>(command: BackendCommand, args: &A) -> Result<Value, Error> {
    serde_json::to_value(args).map_err(|e| Error::Serialization {
        command,
        message: e.to_string(),
    })
}
