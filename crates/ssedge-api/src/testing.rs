// ── Scripted backend for tests ──
//
// Replays queued responses per command, optionally after a delay, and
// records every call. Delays use `tokio::time::sleep`, so tests running
// with a paused clock control exactly when responses land.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use serde_json::Value;

use crate::command::BackendCommand;
use crate::transport::{Invoke, InvokeError};

/// A recorded command invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub command: BackendCommand,
    pub args: Value,
}

#[derive(Debug, Clone)]
struct Reply {
    result: Result<Value, InvokeError>,
    delay: Duration,
}

#[derive(Debug, Default)]
struct Script {
    queued: HashMap<BackendCommand, VecDeque<Reply>>,
    fallback: HashMap<BackendCommand, Reply>,
    calls: Vec<RecordedCall>,
    in_flight: HashMap<BackendCommand, usize>,
    peak_in_flight: HashMap<BackendCommand, usize>,
}

/// In-memory [`Invoke`] implementation driven by a script.
///
/// Queued replies are consumed in order; once a command's queue is empty
/// its fallback reply (if any) is used for every further call. A command
/// with neither is rejected with a descriptive message.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a one-shot reply.
    pub fn push(&self, command: BackendCommand, result: Result<Value, InvokeError>) {
        self.push_delayed(command, result, Duration::ZERO);
    }

    /// Queue a one-shot successful reply.
    pub fn push_ok(&self, command: BackendCommand, value: Value) {
        self.push(command, Ok(value));
    }

    /// Queue a one-shot reply that resolves after `delay`.
    pub fn push_delayed(
        &self,
        command: BackendCommand,
        result: Result<Value, InvokeError>,
        delay: Duration,
    ) {
        self.lock()
            .queued
            .entry(command)
            .or_default()
            .push_back(Reply { result, delay });
    }

    /// Reply used whenever the command's queue is empty.
    pub fn set_fallback(&self, command: BackendCommand, result: Result<Value, InvokeError>) {
        self.set_fallback_delayed(command, result, Duration::ZERO);
    }

    pub fn set_fallback_delayed(
        &self,
        command: BackendCommand,
        result: Result<Value, InvokeError>,
        delay: Duration,
    ) {
        self.lock()
            .fallback
            .insert(command, Reply { result, delay });
    }

    /// Every call received so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, command: BackendCommand) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.command == command)
            .count()
    }

    /// Calls of `command` currently awaiting their reply.
    pub fn in_flight(&self, command: BackendCommand) -> usize {
        self.lock().in_flight.get(&command).copied().unwrap_or(0)
    }

    /// Highest number of simultaneously pending calls of `command`.
    pub fn peak_in_flight(&self, command: BackendCommand) -> usize {
        self.lock()
            .peak_in_flight
            .get(&command)
            .copied()
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().expect("script lock poisoned")
    }

    fn begin(&self, command: BackendCommand, args: Value) -> Reply {
        let mut guard = self.lock();
        let script = &mut *guard;
        script.calls.push(RecordedCall { command, args });

        let queued = script
            .queued
            .get_mut(&command)
            .and_then(VecDeque::pop_front);
        let reply = queued
            .or_else(|| script.fallback.get(&command).cloned())
            .unwrap_or_else(|| Reply {
                result: Err(InvokeError::rejected(format!(
                    "no scripted reply for {command}"
                ))),
                delay: Duration::ZERO,
            });

        let pending = script.in_flight.entry(command).or_insert(0);
        *pending += 1;
        let now = *pending;
        let peak = script.peak_in_flight.entry(command).or_insert(0);
        *peak = (*peak).max(now);
        reply
    }

    fn finish(&self, command: BackendCommand) {
        if let Some(pending) = self.lock().in_flight.get_mut(&command) {
            *pending = pending.saturating_sub(1);
        }
    }
}

impl Invoke for ScriptedBackend {
    fn invoke(
        &self,
        command: BackendCommand,
        args: Value,
    ) -> impl Future<Output = Result<Value, InvokeError>> + Send {
        let reply = self.begin(command, args);
        async move {
            if !reply.delay.is_zero() {
                tokio::time::sleep(reply.delay).await;
            }
            self.finish(command);
            reply.result
        }
    }
}
