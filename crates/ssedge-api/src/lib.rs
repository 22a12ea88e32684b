// ssedge-api: typed command surface for the ssedge device backend
//
// The backend process owns SSH connectivity, the device registry, and
// metrics sampling. This crate only knows the command names, their
// argument shapes, and how to decode their results. The transport that
// actually carries a command is supplied by the embedder via [`Invoke`].

pub mod client;
pub mod command;
pub mod error;
pub mod models;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::BackendClient;
pub use command::{
    AddDeviceArgs, AddDeviceWithConfigArgs, BackendCommand, DeleteDeviceArgs, DeviceMetricsArgs,
};
pub use error::Error;
pub use models::{DeviceRecord, MetricsRecord};
pub use transport::{Invoke, InvokeError};
