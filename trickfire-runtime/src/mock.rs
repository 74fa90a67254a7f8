use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use tokio::sync::Notify;

use crate::{
    core::DriveValues,
    device::{Drivebase, HardwareIo},
    strategy::{DriveStrategy, StrategyKind, StrategyState},
    transport::Transport,
};

/// Ordered log of events shared between test doubles.
///
/// The log also tracks how many recording strategies are running at once.
#[derive(Clone, Default)]
pub(crate) struct EventLog {
    events: Arc<Mutex<Vec<String>>>,
    running: Arc<AtomicUsize>,
    violations: Arc<AtomicUsize>,
}

impl EventLog {
    pub(crate) fn push(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Number of times a strategy started while another one was running.
    pub(crate) fn violations(&self) -> usize {
        self.violations.load(Ordering::SeqCst)
    }

    pub(crate) fn contains(&self, event: &str) -> bool {
        self.events.lock().unwrap().iter().any(|e| e == event)
    }
}

/// Wait until the condition holds, for at most one second.
pub(crate) async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not met in time");
}

/// Strategy which records its lifecycle calls.
pub(crate) struct RecordingStrategy {
    name: &'static str,
    kind: StrategyKind,
    log: EventLog,
    running: AtomicBool,
    fail_start: Arc<AtomicBool>,
    fail_stop: bool,
    stop_gate: Option<Arc<Notify>>,
    parameters: Mutex<Option<DriveValues>>,
}

impl RecordingStrategy {
    pub(crate) fn new(name: &'static str, kind: StrategyKind, log: &EventLog) -> Self {
        Self {
            name,
            kind,
            log: log.clone(),
            running: AtomicBool::new(false),
            fail_start: Arc::new(AtomicBool::new(false)),
            fail_stop: false,
            stop_gate: None,
            parameters: Mutex::new(None),
        }
    }

    pub(crate) fn fail_start(self) -> Self {
        self.fail_start.store(true, Ordering::SeqCst);
        self
    }

    /// Flag to toggle start failures after construction.
    pub(crate) fn fail_start_flag(&self) -> Arc<AtomicBool> {
        self.fail_start.clone()
    }

    /// Stop succeeds in halting the strategy but reports a fault.
    pub(crate) fn fail_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    /// Stop blocks until the gate is notified.
    pub(crate) fn stop_gate(mut self, gate: Arc<Notify>) -> Self {
        self.stop_gate = Some(gate);
        self
    }
}

#[async_trait::async_trait]
impl DriveStrategy for RecordingStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> StrategyKind {
        self.kind
    }

    fn state(&self) -> StrategyState {
        if self.running.load(Ordering::SeqCst) {
            StrategyState::Running
        } else {
            StrategyState::Stopped
        }
    }

    async fn start(&self) -> crate::Result {
        if self.running.load(Ordering::SeqCst) {
            return Err(crate::Error::AlreadyRunning(self.name));
        }

        if self.fail_start.load(Ordering::SeqCst) {
            return Err(crate::Error::Strategy {
                name: self.name,
                reason: "start failed".to_owned(),
            });
        }

        if self.log.running.fetch_add(1, Ordering::SeqCst) != 0 {
            self.log.violations.fetch_add(1, Ordering::SeqCst);
        }

        self.log.push(format!("start:{}", self.name));
        self.running.store(true, Ordering::SeqCst);

        // Widen the window for interleaving transitions.
        tokio::task::yield_now().await;

        Ok(())
    }

    async fn stop(&self) -> crate::Result {
        if !self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(gate) = &self.stop_gate {
            self.log.push(format!("stopping:{}", self.name));
            gate.notified().await;
        }

        tokio::task::yield_now().await;

        self.running.store(false, Ordering::SeqCst);
        self.log.push(format!("stop:{}", self.name));
        self.log.running.fetch_sub(1, Ordering::SeqCst);

        if self.fail_stop {
            Err(crate::Error::Strategy {
                name: self.name,
                reason: "stop failed".to_owned(),
            })
        } else {
            Ok(())
        }
    }

    fn set_parameters(&self, values: DriveValues) -> crate::Result {
        if self.kind != StrategyKind::Manual {
            return Err(crate::Error::Unsupported(self.name));
        }

        *self.parameters.lock().unwrap() = Some(values);

        Ok(())
    }

    fn parameters(&self) -> Option<DriveValues> {
        *self.parameters.lock().unwrap()
    }
}

/// Drivebase which records all actuations.
#[derive(Default)]
pub(crate) struct RecordingDrivebase {
    values: Mutex<Vec<DriveValues>>,
}

impl RecordingDrivebase {
    pub(crate) fn values(&self) -> Vec<DriveValues> {
        self.values.lock().unwrap().clone()
    }
}

impl Drivebase for RecordingDrivebase {
    fn actuate(&self, values: DriveValues) {
        self.values.lock().unwrap().push(values);
    }
}

/// Hardware which records its lifecycle in the event log.
pub(crate) struct MockHardware {
    log: EventLog,
    fail_start: bool,
    drivebase: RecordingDrivebase,
}

impl MockHardware {
    pub(crate) fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            fail_start: false,
            drivebase: RecordingDrivebase::default(),
        }
    }

    pub(crate) fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub(crate) fn values(&self) -> Vec<DriveValues> {
        self.drivebase.values()
    }
}

#[async_trait::async_trait]
impl HardwareIo for MockHardware {
    fn name(&self) -> String {
        "Mock hardware".to_owned()
    }

    async fn start(&self) -> crate::Result {
        if self.fail_start {
            return Err(crate::Error::Hardware("device not found".to_owned()));
        }

        self.log.push("hardware:start");

        Ok(())
    }

    async fn stop(&self) -> crate::Result {
        self.log.push("hardware:stop");

        Ok(())
    }
}

impl Drivebase for MockHardware {
    fn actuate(&self, values: DriveValues) {
        self.drivebase.actuate(values);
    }
}

/// How the mock transport behaves once all queued frames are delivered.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Drained {
    /// Report the connection as closed.
    Close,
    /// Fail with a transport fault.
    Fault,
    /// Keep the connection open without delivering frames.
    Hold,
}

/// Transport which delivers queued frames.
pub(crate) struct MockTransport {
    log: EventLog,
    frames: VecDeque<Vec<u8>>,
    drained: Drained,
    connected: bool,
}

impl MockTransport {
    pub(crate) fn new(log: &EventLog, frames: Vec<Vec<u8>>, drained: Drained) -> Self {
        Self {
            log: log.clone(),
            frames: frames.into(),
            drained,
            connected: false,
        }
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn connect(&mut self) -> crate::Result {
        self.log.push("transport:connect");
        self.connected = true;

        Ok(())
    }

    async fn recv(&mut self) -> crate::Result<Option<Vec<u8>>> {
        if let Some(frame) = self.frames.pop_front() {
            return Ok(Some(frame));
        }

        match self.drained {
            Drained::Close => Ok(None),
            Drained::Fault => Err(crate::Error::Transport(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ))),
            Drained::Hold => std::future::pending().await,
        }
    }

    async fn disconnect(&mut self) -> crate::Result {
        self.log.push("transport:disconnect");
        self.connected = false;

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}
