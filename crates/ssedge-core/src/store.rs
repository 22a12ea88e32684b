// ── Displayed device set ──
//
// The last successfully listed registry, replaced wholesale on each
// refresh. A failed refresh never touches it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{Device, DeviceId};
use crate::stream::EntityStream;

pub(crate) struct DeviceStore {
    devices: watch::Sender<Arc<Vec<Arc<Device>>>>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl DeviceStore {
    pub(crate) fn new() -> Self {
        let (devices, _) = watch::channel(Arc::new(Vec::new()));
        let (last_refresh, _) = watch::channel(None);
        Self {
            devices,
            last_refresh,
        }
    }

    /// Swap in a freshly listed set, keeping backend order.
    pub(crate) fn replace(&self, devices: Vec<Device>) {
        let snapshot: Vec<Arc<Device>> = devices.into_iter().map(Arc::new).collect();
        self.devices.send_replace(Arc::new(snapshot));
        self.last_refresh.send_replace(Some(Utc::now()));
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.borrow().clone()
    }

    pub(crate) fn get(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.devices.borrow().iter().find(|d| d.id == id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.devices.borrow().len()
    }

    pub(crate) fn subscribe(&self) -> EntityStream<Device> {
        EntityStream::new(self.devices.subscribe())
    }

    pub(crate) fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }
}
