// ── Live metrics poller ──
//
// One poll session per open metrics panel. A session performs one
// immediate fetch, then fetches on a fixed period until stopped. Every
// fetch runs in its own task so a slow backend never delays the clock,
// and every result is checked against the session generation before it
// is applied. Stopping bumps the generation, so results still in flight
// from an older session are dropped on arrival.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use ssedge_api::{BackendClient, DeviceMetricsArgs, Invoke, MetricsRecord};

use crate::activity::{ActivityLog, Notification, NotificationLevel, Notifier};
use crate::config::DEFAULT_POLL_INTERVAL;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, MetricsAccess, MetricsSnapshot};

// ── PollerState ──────────────────────────────────────────────────

/// Lifecycle of the poller. Failures never leave `Streaming`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PollerState {
    Idle,
    /// First fetch of the session in flight.
    Connecting,
    Streaming,
}

// ── Shared state ─────────────────────────────────────────────────

struct PollSession {
    device: Arc<Device>,
    cancel: CancellationToken,
    ticker: JoinHandle<()>,
}

#[derive(Default)]
struct SessionSlot {
    /// Bumped on every start and stop; a fetch only lands if its
    /// generation is still current.
    generation: u64,
    active: Option<PollSession>,
}

struct PollShared {
    slot: Mutex<SessionSlot>,
    state: watch::Sender<PollerState>,
    snapshot: watch::Sender<Option<Arc<MetricsSnapshot>>>,
    target: watch::Sender<Option<Arc<Device>>>,
    notifier: Notifier,
    log: Arc<dyn ActivityLog>,
}

impl PollShared {
    fn lock(&self) -> MutexGuard<'_, SessionSlot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: u64) -> bool {
        let slot = self.lock();
        slot.generation == generation && slot.active.is_some()
    }

    /// Cancel the active session, if any, without publishing `Idle`.
    fn teardown(slot: &mut SessionSlot) -> Option<Arc<Device>> {
        let session = slot.active.take()?;
        slot.generation += 1;
        session.cancel.cancel();
        session.ticker.abort();
        Some(session.device)
    }

    fn stop(&self) {
        let mut slot = self.lock();
        let Some(device) = Self::teardown(&mut slot) else {
            return;
        };
        self.snapshot.send_replace(None);
        self.target.send_replace(None);
        self.state.send_replace(PollerState::Idle);
        debug!(device_id = %device.id, "metrics polling stopped");
    }

    fn enter_streaming(&self, generation: u64) -> bool {
        let slot = self.lock();
        if slot.generation != generation || slot.active.is_none() {
            return false;
        }
        self.state.send_replace(PollerState::Streaming);
        true
    }

    fn apply(
        &self,
        generation: u64,
        device_id: DeviceId,
        result: Result<MetricsRecord, ssedge_api::Error>,
    ) {
        let slot = self.lock();
        if slot.generation != generation || slot.active.is_none() {
            trace!(%device_id, generation, "discarding metrics from a stopped session");
            return;
        }
        match result {
            Ok(record) => {
                self.snapshot
                    .send_replace(Some(Arc::new(MetricsSnapshot::from(record))));
            }
            Err(e) => {
                let err = CoreError::from_metrics(&e);
                warn!(%device_id, error = %e, "metrics fetch failed");
                self.log.error(&format!("Failed to fetch metrics: {}", e.detail()));
                self.notifier
                    .send(Notification::toast(NotificationLevel::Warning, err));
            }
        }
    }
}

// ── MetricsPoller ────────────────────────────────────────────────

/// Periodic metrics fetcher for at most one device at a time.
///
/// Owned by the controller. Dropping the poller stops its session.
pub struct MetricsPoller<I> {
    shared: Arc<PollShared>,
    client: BackendClient<I>,
    period: Duration,
}

impl<I: Invoke> MetricsPoller<I> {
    pub(crate) fn new(
        client: BackendClient<I>,
        period: Duration,
        notifier: Notifier,
        log: Arc<dyn ActivityLog>,
    ) -> Self {
        let period = if period.is_zero() {
            warn!(
                fallback = ?DEFAULT_POLL_INTERVAL,
                "zero metrics poll interval, using the default"
            );
            DEFAULT_POLL_INTERVAL
        } else {
            period
        };
        let (state, _) = watch::channel(PollerState::Idle);
        let (snapshot, _) = watch::channel(None);
        let (target, _) = watch::channel(None);
        Self {
            shared: Arc::new(PollShared {
                slot: Mutex::new(SessionSlot::default()),
                state,
                snapshot,
                target,
                notifier,
                log,
            }),
            client,
            period,
        }
    }

    /// Begin polling `device`, replacing any active session.
    ///
    /// Returns immediately; the first fetch is already spawned. Must be
    /// called from within a tokio runtime.
    pub fn start(&self, device: Arc<Device>, access: &MetricsAccess) {
        let mut slot = self.shared.lock();
        if let Some(previous) = PollShared::teardown(&mut slot) {
            debug!(device_id = %previous.id, "replacing metrics session");
        }
        slot.generation += 1;

        let cancel = CancellationToken::new();
        let ctx = SessionCtx {
            generation: slot.generation,
            device_id: device.id,
            args: Arc::new(access.to_args(&device.ip)),
            client: self.client.clone(),
            shared: Arc::clone(&self.shared),
            cancel: cancel.clone(),
            period: self.period,
        };

        self.shared.snapshot.send_replace(None);
        self.shared.target.send_replace(Some(Arc::clone(&device)));
        self.shared.state.send_replace(PollerState::Connecting);
        debug!(
            device_id = %device.id,
            ip = %device.ip,
            period = ?self.period,
            "metrics polling started"
        );

        let ticker = tokio::spawn(run_session(ctx));
        slot.active = Some(PollSession {
            device,
            cancel,
            ticker,
        });
    }
}

impl<I> MetricsPoller<I> {
    /// Stop polling. Synchronous: once this returns no further fetch is
    /// issued, results still in flight are discarded and the snapshot is
    /// cleared. No-op when idle.
    pub fn stop(&self) {
        self.shared.stop();
    }

    pub fn state(&self) -> PollerState {
        *self.shared.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<PollerState> {
        self.shared.state.subscribe()
    }

    /// The most recently completed successful fetch of this session.
    pub fn snapshot(&self) -> Option<Arc<MetricsSnapshot>> {
        self.shared.snapshot.borrow().clone()
    }

    pub fn subscribe_snapshot(&self) -> watch::Receiver<Option<Arc<MetricsSnapshot>>> {
        self.shared.snapshot.subscribe()
    }

    /// The device being polled.
    pub fn target(&self) -> Option<Arc<Device>> {
        self.shared.target.borrow().clone()
    }

    pub fn subscribe_target(&self) -> watch::Receiver<Option<Arc<Device>>> {
        self.shared.target.subscribe()
    }

    pub fn is_polling(&self, id: DeviceId) -> bool {
        self.shared
            .target
            .borrow()
            .as_ref()
            .is_some_and(|d| d.id == id)
    }
}

impl<I> Drop for MetricsPoller<I> {
    fn drop(&mut self) {
        self.shared.stop();
    }
}

// ── Session task ─────────────────────────────────────────────────

struct SessionCtx<I> {
    generation: u64,
    device_id: DeviceId,
    args: Arc<DeviceMetricsArgs>,
    client: BackendClient<I>,
    shared: Arc<PollShared>,
    cancel: CancellationToken,
    period: Duration,
}

impl<I> Clone for SessionCtx<I> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            device_id: self.device_id,
            args: Arc::clone(&self.args),
            client: self.client.clone(),
            shared: Arc::clone(&self.shared),
            cancel: self.cancel.clone(),
            period: self.period,
        }
    }
}

async fn run_session<I: Invoke>(ctx: SessionCtx<I>) {
    let first = tokio::spawn(fetch_once(ctx.clone()));
    tokio::select! {
        biased;
        () = ctx.cancel.cancelled() => return,
        _ = first => {}
    }

    if !ctx.shared.enter_streaming(ctx.generation) {
        return;
    }

    let mut interval = tokio::time::interval_at(Instant::now() + ctx.period, ctx.period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = ctx.cancel.cancelled() => break,
            _ = interval.tick() => {
                // Not awaited: a fetch slower than the period overlaps the next.
                tokio::spawn(fetch_once(ctx.clone()));
            }
        }
    }
}

async fn fetch_once<I: Invoke>(ctx: SessionCtx<I>) {
    if !ctx.shared.is_current(ctx.generation) {
        return;
    }
    let result = ctx.client.get_device_metrics(&ctx.args).await;
    ctx.shared.apply(ctx.generation, ctx.device_id, result);
}
