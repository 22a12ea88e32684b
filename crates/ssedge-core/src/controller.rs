// ── Device list controller ──
//
// Turns user intents (refresh, add, delete, open/close metrics) into
// registry calls and poller lifecycle changes, and publishes the result
// as watch-channel state for the presentation layer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use strum::Display;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, info, warn};

use ssedge_api::{BackendClient, Invoke};

use crate::activity::{ActivityLog, Notification, NotificationLevel, Notifier};
use crate::config::{ControllerConfig, NOTIFICATION_CHANNEL_SIZE};
use crate::error::CoreError;
use crate::model::{Device, DeviceDraft, DeviceId, MetricsAccess, MetricsSnapshot};
use crate::poller::{MetricsPoller, PollerState};
use crate::registry::DeviceRegistry;
use crate::resolver;
use crate::store::DeviceStore;
use crate::stream::EntityStream;

// ── Form and mutation state ──────────────────────────────────────

/// Add-device form as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddForm {
    pub open: bool,
    pub draft: DeviceDraft,
}

/// Registry mutation currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Mutation {
    #[strum(serialize = "add device")]
    Add,
    #[strum(serialize = "delete device")]
    Delete,
}

/// Everything a view needs to render the device page.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub devices: Arc<Vec<Arc<Device>>>,
    pub loading: bool,
    pub mutation: Option<Mutation>,
    pub form: AddForm,
    pub metrics_device: Option<Arc<Device>>,
    pub metrics: Option<Arc<MetricsSnapshot>>,
    pub poller_state: PollerState,
}

// ── DeviceListController ─────────────────────────────────────────

/// Orchestrates the device page.
///
/// Cheaply cloneable; clones share one device set, one form, and one
/// metrics poller. The controller is the only mutator of all three.
pub struct DeviceListController<I> {
    inner: Arc<ControllerInner<I>>,
}

impl<I> Clone for DeviceListController<I> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<I> {
    config: ControllerConfig,
    registry: DeviceRegistry<I>,
    store: DeviceStore,
    poller: MetricsPoller<I>,
    form: watch::Sender<AddForm>,
    loading: watch::Sender<bool>,
    mutation: watch::Sender<Option<Mutation>>,
    /// Held for the whole of a `get_devices` round trip.
    refresh_gate: Mutex<RefreshOutcome>,
    refreshes_issued: AtomicU64,
    refreshes_completed: AtomicU64,
    /// SSH settings learned from successful adds.
    access: StdMutex<HashMap<AccessKey, MetricsAccess>>,
    notifier: Notifier,
    log: Arc<dyn ActivityLog>,
}

/// Hostname and address together; several registered devices may share
/// one address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AccessKey {
    hostname: String,
    ip: String,
}

impl AccessKey {
    fn new(hostname: &str, ip: &str) -> Self {
        Self {
            hostname: hostname.to_owned(),
            ip: ip.to_owned(),
        }
    }

    fn of(device: &Device) -> Self {
        Self::new(&device.name, &device.ip)
    }
}

#[derive(Debug, Default)]
struct RefreshOutcome {
    last: Option<Result<(), CoreError>>,
}

/// Releases the mutation slot when the mutation ends, however it ends.
struct MutationGuard<'a> {
    slot: &'a watch::Sender<Option<Mutation>>,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.slot.send_replace(None);
    }
}

impl<I: Invoke> DeviceListController<I> {
    pub fn new(
        client: BackendClient<I>,
        config: ControllerConfig,
        log: Arc<dyn ActivityLog>,
    ) -> Self {
        let notifier = Notifier::new(NOTIFICATION_CHANNEL_SIZE);
        let poller = MetricsPoller::new(
            client.clone(),
            config.poll_interval,
            notifier.clone(),
            Arc::clone(&log),
        );
        let (form, _) = watch::channel(AddForm::default());
        let (loading, _) = watch::channel(false);
        let (mutation, _) = watch::channel(None);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                registry: DeviceRegistry::new(client),
                store: DeviceStore::new(),
                poller,
                form,
                loading,
                mutation,
                refresh_gate: Mutex::new(RefreshOutcome::default()),
                refreshes_issued: AtomicU64::new(0),
                refreshes_completed: AtomicU64::new(0),
                access: StdMutex::new(HashMap::new()),
                notifier,
                log,
            }),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    /// Initial load, as performed when the device page is first shown.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.refresh().await
    }

    // ── Refresh ──────────────────────────────────────────────────

    /// Reload the device set from the backend.
    ///
    /// A call made while another refresh is in flight waits for it and
    /// shares its outcome instead of issuing a second `get_devices`. On
    /// failure the previously displayed devices are kept.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let seen = self.inner.refreshes_completed.load(Ordering::Acquire);
        let mut gate = self.inner.refresh_gate.lock().await;
        if self.inner.refreshes_completed.load(Ordering::Acquire) > seen {
            if let Some(outcome) = gate.last.clone() {
                debug!("refresh coalesced onto the one in flight");
                return outcome;
            }
        }
        self.run_refresh(&mut gate).await
    }

    /// Refresh that must observe state written before the call, such as
    /// the result of an add or delete. Waits out a refresh already in
    /// flight, then issues exactly one more unless a newer one already
    /// ran in the meantime.
    async fn refresh_after_mutation(&self) -> Result<(), CoreError> {
        let issued = self.inner.refreshes_issued.load(Ordering::Acquire);
        let mut gate = self.inner.refresh_gate.lock().await;
        if self.inner.refreshes_issued.load(Ordering::Acquire) > issued {
            if let Some(outcome) = gate.last.clone() {
                return outcome;
            }
        }
        self.run_refresh(&mut gate).await
    }

    async fn run_refresh(&self, gate: &mut RefreshOutcome) -> Result<(), CoreError> {
        let inner = &self.inner;
        inner.refreshes_issued.fetch_add(1, Ordering::AcqRel);
        inner.loading.send_replace(true);
        inner.log.info("Fetching devices from backend");

        let result = inner.registry.list().await;
        let outcome = match result {
            Ok(devices) => {
                inner
                    .log
                    .info(&format!("Successfully fetched {} devices", devices.len()));
                inner.store.replace(devices);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "device refresh failed, keeping previous list");
                inner.log.error(&format!("Failed to fetch devices: {e}"));
                inner
                    .notifier
                    .send(Notification::toast(NotificationLevel::Error, e.clone()));
                Err(e)
            }
        };

        gate.last = Some(outcome.clone());
        inner.refreshes_completed.fetch_add(1, Ordering::AcqRel);
        inner.loading.send_replace(false);
        outcome
    }

    // ── Add ──────────────────────────────────────────────────────

    /// Submit whatever is currently in the add form.
    pub async fn submit_form(&self) -> Result<(), CoreError> {
        let draft = self.inner.form.borrow().draft.clone();
        self.submit_add(draft).await
    }

    /// Validate and register a new device.
    ///
    /// Validation failures never reach the backend. While the add is in
    /// flight every other mutation is refused with [`CoreError::Busy`].
    /// On success the form is cleared and closed and the device set is
    /// reloaded; on failure the draft stays in the form for correction.
    pub async fn submit_add(&self, draft: DeviceDraft) -> Result<(), CoreError> {
        let inner = &self.inner;
        let guard = self.begin_mutation(Mutation::Add)?;
        let resolved = resolver::resolve(&draft);
        inner.form.send_modify(|form| form.draft = draft);

        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(error = %e, "add-device draft rejected");
                inner.notifier.send(Notification::alert(e.clone()));
                return Err(e);
            }
        };

        inner.log.info(&format!(
            "Connecting and adding device: {} ({})",
            resolved.hostname(),
            resolved.ip()
        ));
        debug!(variant = %resolved.variant(), "submitting add-device");

        match inner.registry.add(&resolved).await {
            Ok(confirmation) => {
                inner.log.info(&format!(
                    "Device connected and added successfully: {confirmation}"
                ));
                let access = MetricsAccess::from_connection(
                    &resolved.effective_connection(),
                    &inner.config.metrics_defaults,
                );
                self.lock_access()
                    .insert(AccessKey::new(resolved.hostname(), resolved.ip()), access);
                inner.form.send_replace(AddForm::default());
                inner
                    .notifier
                    .send(Notification::success(format!("Added {}", resolved.hostname())));
            }
            Err(e) => {
                inner
                    .log
                    .error(&format!("Failed to connect and add device: {e}"));
                inner.notifier.send(Notification::alert(e.clone()));
                return Err(e);
            }
        }

        drop(guard);
        // A failed reload is already reported; the add itself succeeded.
        let _ = self.refresh_after_mutation().await;
        Ok(())
    }

    // ── Delete ───────────────────────────────────────────────────

    /// Delete a device, stopping its metrics session first if it is the
    /// one being polled.
    pub async fn delete(&self, id: DeviceId) -> Result<(), CoreError> {
        let inner = &self.inner;
        let guard = self.begin_mutation(Mutation::Delete)?;

        let Some(device) = inner.store.get(id) else {
            let err = CoreError::NotFound { id };
            inner.notifier.send(Notification::alert(err.clone()));
            return Err(err);
        };

        if inner.poller.is_polling(id) {
            debug!(device_id = %id, "stopping metrics for device being deleted");
            self.close_metrics();
        }

        inner.log.info(&format!("Deleting device: {id}"));
        if let Err(e) = inner.registry.remove(id).await {
            inner.log.error(&format!("Failed to delete device: {e}"));
            inner.notifier.send(Notification::alert(e.clone()));
            return Err(e);
        }

        inner.log.info(&format!("Device deleted successfully: {id}"));
        // The panel may have been reopened on this device while the
        // backend call was in flight.
        if inner.poller.is_polling(id) {
            self.close_metrics();
        }
        self.lock_access().remove(&AccessKey::of(&device));
        inner
            .notifier
            .send(Notification::success(format!("Deleted {}", device.name)));

        drop(guard);
        let _ = self.refresh_after_mutation().await;
        Ok(())
    }

    // ── Metrics ──────────────────────────────────────────────────

    /// Show the live metrics panel for `device`, replacing any panel
    /// already open. Must be called from within a tokio runtime.
    pub fn open_metrics(&self, device: &Device) {
        let access = self.metrics_access(device);
        info!(device_id = %device.id, name = %device.name, "opening metrics panel");
        self.inner
            .log
            .info(&format!("Opening metrics for device: {}", device.name));
        self.inner.poller.start(Arc::new(device.clone()), &access);
    }

    /// SSH settings used to poll `device`: the ones it was added with in
    /// this session, else the configured defaults.
    pub fn metrics_access(&self, device: &Device) -> MetricsAccess {
        self.lock_access()
            .get(&AccessKey::of(device))
            .cloned()
            .unwrap_or_else(|| self.inner.config.metrics_defaults.clone())
    }

    fn lock_access(&self) -> std::sync::MutexGuard<'_, HashMap<AccessKey, MetricsAccess>> {
        self.inner
            .access
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<I> DeviceListController<I> {
    /// Close the metrics panel. No-op when none is open.
    pub fn close_metrics(&self) {
        if let Some(device) = self.inner.poller.target() {
            self.inner
                .log
                .info(&format!("Closing metrics for device: {}", device.name));
        }
        self.inner.poller.stop();
    }

    // ── Add form ─────────────────────────────────────────────────

    pub fn open_add_form(&self) -> Result<(), CoreError> {
        self.ensure_not_adding("open the add form")?;
        self.inner.form.send_if_modified(|form| {
            let was_open = form.open;
            form.open = true;
            !was_open
        });
        Ok(())
    }

    /// Flip the form open or closed. The draft survives a close.
    pub fn toggle_add_form(&self) -> Result<(), CoreError> {
        self.ensure_not_adding("toggle the add form")?;
        self.inner.form.send_modify(|form| form.open = !form.open);
        Ok(())
    }

    /// Apply an edit to the draft.
    pub fn edit_draft(&self, edit: impl FnOnce(&mut DeviceDraft)) -> Result<(), CoreError> {
        self.ensure_not_adding("edit the draft")?;
        self.inner.form.send_modify(|form| edit(&mut form.draft));
        Ok(())
    }

    /// Discard the draft and close the form.
    pub fn cancel_add(&self) -> Result<(), CoreError> {
        self.ensure_not_adding("cancel")?;
        self.inner.form.send_replace(AddForm::default());
        Ok(())
    }

    fn ensure_not_adding(&self, operation: &str) -> Result<(), CoreError> {
        if *self.inner.mutation.borrow() == Some(Mutation::Add) {
            return Err(CoreError::Busy {
                operation: operation.to_owned(),
            });
        }
        Ok(())
    }

    /// Claim the single mutation slot, or fail with `Busy` if taken.
    fn begin_mutation(&self, kind: Mutation) -> Result<MutationGuard<'_>, CoreError> {
        let claimed = self.inner.mutation.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(kind);
            true
        });
        if !claimed {
            debug!(%kind, "mutation refused, another is in flight");
            return Err(CoreError::Busy {
                operation: kind.to_string(),
            });
        }
        Ok(MutationGuard {
            slot: &self.inner.mutation,
        })
    }

    // ── State accessors ──────────────────────────────────────────

    /// The displayed device set, in backend order.
    pub fn devices(&self) -> Arc<Vec<Arc<Device>>> {
        self.inner.store.snapshot()
    }

    pub fn device(&self, id: DeviceId) -> Option<Arc<Device>> {
        self.inner.store.get(id)
    }

    pub fn device_count(&self) -> usize {
        self.inner.store.len()
    }

    /// When the displayed set was last replaced by a successful refresh.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.inner.store.last_refresh()
    }

    pub fn devices_stream(&self) -> EntityStream<Device> {
        self.inner.store.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        *self.inner.loading.borrow()
    }

    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    pub fn mutation_in_progress(&self) -> Option<Mutation> {
        *self.inner.mutation.borrow()
    }

    pub fn subscribe_mutation(&self) -> watch::Receiver<Option<Mutation>> {
        self.inner.mutation.subscribe()
    }

    /// Whether the refresh action should be enabled.
    pub fn can_refresh(&self) -> bool {
        !self.is_loading() && self.mutation_in_progress().is_none()
    }

    /// Whether add and delete actions should be enabled.
    pub fn can_mutate(&self) -> bool {
        self.mutation_in_progress().is_none()
    }

    /// A copy of the add form; the live draft stays with the controller.
    pub fn form(&self) -> AddForm {
        self.inner.form.borrow().clone()
    }

    pub fn subscribe_form(&self) -> watch::Receiver<AddForm> {
        self.inner.form.subscribe()
    }

    /// Device whose metrics panel is shown.
    pub fn metrics_device(&self) -> Option<Arc<Device>> {
        self.inner.poller.target()
    }

    pub fn metrics(&self) -> Option<Arc<MetricsSnapshot>> {
        self.inner.poller.snapshot()
    }

    pub fn subscribe_metrics(&self) -> watch::Receiver<Option<Arc<MetricsSnapshot>>> {
        self.inner.poller.subscribe_snapshot()
    }

    pub fn poller_state(&self) -> PollerState {
        self.inner.poller.state()
    }

    pub fn subscribe_poller_state(&self) -> watch::Receiver<PollerState> {
        self.inner.poller.subscribe_state()
    }

    pub fn subscribe_notifications(&self) -> broadcast::Receiver<Arc<Notification>> {
        self.inner.notifier.subscribe()
    }

    /// One consistent-enough read of everything the page renders.
    pub fn view(&self) -> ViewState {
        ViewState {
            devices: self.devices(),
            loading: self.is_loading(),
            mutation: self.mutation_in_progress(),
            form: self.form(),
            metrics_device: self.metrics_device(),
            metrics: self.metrics(),
            poller_state: self.poller_state(),
        }
    }
}
