// End-to-end behaviour of the device page against a scripted backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use ssedge_api::testing::ScriptedBackend;
use ssedge_api::{BackendClient, BackendCommand, InvokeError};
use ssedge_core::{
    AddVariant, ControllerConfig, CoreError, DeviceDraft, DeviceId, DeviceListController,
    PollerState, Presentation, ResolvedAdd, TracingActivityLog, resolve,
};

const PERIOD: Duration = Duration::from_millis(500);

fn setup() -> (DeviceListController<ScriptedBackend>, Arc<ScriptedBackend>) {
    let backend = Arc::new(ScriptedBackend::new());
    let ctrl = DeviceListController::new(
        BackendClient::from_shared(Arc::clone(&backend)),
        ControllerConfig::default(),
        Arc::new(TracingActivityLog),
    );
    (ctrl, backend)
}

fn registry(ids: &[i64]) -> Value {
    Value::Array(
        ids.iter()
            .map(|id| {
                json!({
                    "id": id,
                    "name": format!("srv{id}"),
                    "ip": format!("10.0.0.{id}"),
                    "last_seen": null,
                })
            })
            .collect(),
    )
}

fn metrics(cpu: f64) -> Value {
    json!({
        "cpu_usage": cpu,
        "memory_used_mb": 256.0,
        "memory_total_mb": 1024.0,
        "memory_percent": 25.0,
        "disk_used_gb": 5.0,
        "disk_total_gb": 50.0,
        "disk_percent": 10.0,
        "uptime_seconds": 7200,
        "load_average": "0.50,0.40,0.30",
        "timestamp": 1_700_000_100,
    })
}

async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn fetches(backend: &ScriptedBackend) -> usize {
    backend.call_count(BackendCommand::GetDeviceMetrics)
}

#[test]
fn default_draft_resolves_to_simple_payload() {
    let resolved = resolve(&DeviceDraft::new("srv1", "10.0.0.5")).unwrap();
    assert_eq!(
        serde_json::to_value(&resolved).unwrap(),
        json!({
            "variant": "simple",
            "payload": { "hostname": "srv1", "ip": "10.0.0.5" }
        })
    );
}

#[test]
fn custom_port_resolves_to_advanced_payload() {
    let mut draft = DeviceDraft::new("srv2", "10.0.0.6");
    draft.port = "2222".into();

    let resolved = resolve(&draft).unwrap();
    assert_eq!(resolved.variant(), AddVariant::Advanced);
    let ResolvedAdd::Advanced(config) = resolved else {
        panic!("expected advanced variant");
    };
    assert_eq!(config.port, Some(2222));
    assert_eq!(config.username, None);
}

#[tokio::test(start_paused = true)]
async fn failing_first_fetch_keeps_streaming() {
    let (ctrl, backend) = setup();
    backend.push_ok(BackendCommand::GetDevices, registry(&[1]));
    backend.push(
        BackendCommand::GetDeviceMetrics,
        Err(InvokeError::rejected("Connection timed out")),
    );
    backend.set_fallback(BackendCommand::GetDeviceMetrics, Ok(metrics(42.0)));
    ctrl.start().await.unwrap();
    let mut notes = ctrl.subscribe_notifications();

    ctrl.open_metrics(&ctrl.device(DeviceId(1)).unwrap());
    settle().await;
    assert_eq!(ctrl.poller_state(), PollerState::Streaming);
    assert_eq!(ctrl.metrics(), None);

    let note = notes.recv().await.unwrap();
    assert_eq!(note.presentation, Presentation::Toast);
    assert!(matches!(
        note.error,
        Some(CoreError::MetricsFetchFailed { .. })
    ));

    tokio::time::advance(PERIOD).await;
    settle().await;
    assert_eq!(fetches(&backend), 2);
    assert_eq!(ctrl.metrics().map(|m| m.cpu_usage), Some(42.0));
}

#[tokio::test(start_paused = true)]
async fn any_open_close_sequence_leaves_at_most_one_schedule() {
    let (ctrl, backend) = setup();
    backend.push_ok(BackendCommand::GetDevices, registry(&[1, 2, 3]));
    backend.set_fallback(BackendCommand::GetDeviceMetrics, Ok(metrics(1.0)));
    ctrl.start().await.unwrap();

    let a = ctrl.device(DeviceId(1)).unwrap();
    let b = ctrl.device(DeviceId(2)).unwrap();

    // (open?, device) steps; `false` means close.
    let steps = [
        (true, &a),
        (true, &a),
        (false, &a),
        (false, &a),
        (true, &b),
        (true, &a),
        (false, &a),
        (true, &b),
        (true, &b),
    ];
    for (open, device) in steps {
        if open {
            ctrl.open_metrics(device);
        } else {
            ctrl.close_metrics();
        }
        settle().await;
    }

    let before = fetches(&backend);
    for _ in 0..5 {
        tokio::time::advance(PERIOD).await;
        settle().await;
    }
    assert_eq!(fetches(&backend) - before, 5);

    ctrl.close_metrics();
    let before = fetches(&backend);
    for _ in 0..5 {
        tokio::time::advance(PERIOD).await;
        settle().await;
    }
    assert_eq!(fetches(&backend), before);
}

#[tokio::test(start_paused = true)]
async fn close_during_fetch_discards_result() {
    let (ctrl, backend) = setup();
    backend.push_ok(BackendCommand::GetDevices, registry(&[1]));
    backend.push_delayed(
        BackendCommand::GetDeviceMetrics,
        Ok(metrics(77.0)),
        Duration::from_millis(300),
    );
    ctrl.start().await.unwrap();

    ctrl.open_metrics(&ctrl.device(DeviceId(1)).unwrap());
    settle().await;
    ctrl.close_metrics();

    tokio::time::advance(Duration::from_secs(1)).await;
    settle().await;
    assert_eq!(ctrl.metrics(), None);
    assert_eq!(ctrl.poller_state(), PollerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn concurrent_refresh_issues_one_request() {
    let (ctrl, backend) = setup();
    backend.push_delayed(
        BackendCommand::GetDevices,
        Ok(registry(&[1, 2])),
        Duration::from_millis(50),
    );

    let other = ctrl.clone();
    let (first, second) = tokio::join!(ctrl.refresh(), other.refresh());
    first.unwrap();
    second.unwrap();
    assert_eq!(backend.call_count(BackendCommand::GetDevices), 1);
    assert_eq!(ctrl.devices().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn deleting_polled_device_leaves_poller_idle() {
    let (ctrl, backend) = setup();
    backend.push_ok(BackendCommand::GetDevices, registry(&[1]));
    backend.set_fallback(BackendCommand::GetDeviceMetrics, Ok(metrics(5.0)));
    backend.push_ok(BackendCommand::DeleteDevice, Value::Null);
    backend.push_ok(BackendCommand::GetDevices, registry(&[]));
    ctrl.start().await.unwrap();

    ctrl.open_metrics(&ctrl.device(DeviceId(1)).unwrap());
    settle().await;
    ctrl.delete(DeviceId(1)).await.unwrap();

    assert_eq!(ctrl.poller_state(), PollerState::Idle);
    assert!(ctrl.devices().is_empty());
}

#[tokio::test]
async fn add_failure_then_corrected_resubmit() {
    let (ctrl, backend) = setup();
    backend.push(
        BackendCommand::ConnectAndAddDevice,
        Err(InvokeError::rejected("Host unreachable")),
    );
    backend.push_ok(BackendCommand::ConnectAndAddDevice, json!({ "ok": true }));
    backend.push_ok(BackendCommand::GetDevices, registry(&[7]));

    ctrl.open_add_form().unwrap();
    ctrl.edit_draft(|d| {
        d.name = "srv7".into();
        d.ip = "10.0.0.70".into();
    })
    .unwrap();
    assert!(matches!(
        ctrl.submit_form().await,
        Err(CoreError::ConnectionFailed { .. })
    ));
    assert!(ctrl.form().open);

    ctrl.edit_draft(|d| d.ip = "10.0.0.7".into()).unwrap();
    ctrl.submit_form().await.unwrap();

    assert!(!ctrl.form().open);
    assert_eq!(ctrl.devices().len(), 1);
    assert_eq!(
        backend.calls()[1].args,
        json!({ "hostname": "srv7", "ip": "10.0.0.7" })
    );
}
