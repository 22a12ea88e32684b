//! Device lifecycle and live-metrics controller for the ssedge client.
//!
//! Sits between `ssedge-api` (the backend command surface) and whatever
//! renders the device page:
//!
//! - **[`DeviceListController`]** — Holds the displayed device set, the
//!   add-device form, and the active metrics poller, and turns user intents
//!   (refresh, add, delete, open/close metrics) into backend calls. State is
//!   published through `tokio::sync::watch` channels; failures that need the
//!   user's attention go out as [`Notification`]s.
//!
//! - **[`resolve`]** — Pure mapping from a [`DeviceDraft`] to one of the two
//!   add commands. Drafts whose SSH options all equal their defaults use the
//!   simple command; anything else uses the advanced one.
//!
//! - **[`DeviceRegistry`]** — List, add, and delete against the backend
//!   registry, with each call site translating transport failures into the
//!   matching [`CoreError`] kind.
//!
//! - **[`MetricsPoller`]** — One cancellable fetch loop per open metrics
//!   panel. Results from a stopped session are never applied.
//!
//! Logging of user activity goes through an injected [`ActivityLog`];
//! [`TracingActivityLog`] forwards it to `tracing`.

pub mod activity;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod model;
pub mod poller;
pub mod registry;
pub mod resolver;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use activity::{
    ActivityLog, LogLevel, Notification, NotificationLevel, Presentation, TracingActivityLog,
};
pub use config::{ControllerConfig, DEFAULT_POLL_INTERVAL};
pub use controller::{AddForm, DeviceListController, Mutation, ViewState};
pub use error::CoreError;
pub use poller::{MetricsPoller, PollerState};
pub use registry::DeviceRegistry;
pub use resolver::resolve;
pub use stream::EntityStream;

pub use model::{
    AddVariant, ConnectionConfig, Device, DeviceDraft, DeviceId, MetricsAccess, MetricsSnapshot,
    ResolvedAdd, SimpleAdd,
};
