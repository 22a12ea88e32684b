// ── Domain model ──

pub mod connection;
pub mod device;
pub mod draft;
pub mod metrics;

pub use connection::{AddVariant, ConnectionConfig, MetricsAccess, ResolvedAdd, SimpleAdd};
pub use device::{Device, DeviceId};
pub use draft::DeviceDraft;
pub use metrics::MetricsSnapshot;
