use std::{
    ops::ControlFlow,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use tokio::{
    sync::{oneshot, Mutex},
    task::JoinHandle,
};

use super::StrategyState;

struct Worker {
    /// Taken once the task was signalled to halt.
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

/// Periodic actuation task of a strategy.
///
/// The slot holds at most one actuation task. The task calls the tick
/// function on every interval until the slot is halted or the tick function
/// breaks.
pub(super) struct ActuationSlot {
    worker: Mutex<Option<Worker>>,
    running: AtomicBool,
}

impl ActuationSlot {
    pub(super) fn new() -> Self {
        Self {
            worker: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub(super) fn state(&self) -> StrategyState {
        if self.running.load(Ordering::SeqCst) {
            StrategyState::Running
        } else {
            StrategyState::Stopped
        }
    }

    /// Spawn the actuation task.
    ///
    /// The tick function receives the time elapsed since the previous tick.
    pub(super) async fn spawn<F>(
        &self,
        name: &'static str,
        interval: Duration,
        mut tick: F,
    ) -> crate::Result
    where
        F: FnMut(Duration) -> ControlFlow<()> + Send + 'static,
    {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return Err(crate::Error::AlreadyRunning(name));
        }

        let (shutdown, mut shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            let mut last_tick = Instant::now();

            loop {
                tokio::select! {
                    biased;

                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let delta = last_tick.elapsed();
                        last_tick = Instant::now();

                        if tick(delta).is_break() {
                            log::debug!("Actuation of {} completed", name);
                            break;
                        }
                    }
                }
            }
        });

        *worker = Some(Worker {
            shutdown: Some(shutdown),
            handle,
        });
        self.running.store(true, Ordering::SeqCst);

        Ok(())
    }

    /// Halt the actuation task and wait for it to finish.
    ///
    /// Returns whether a task was running. The worker stays in the slot until
    /// the task has finished. If this future is dropped before then, the
    /// next call resumes waiting on the same task.
    pub(super) async fn halt(&self, name: &'static str) -> crate::Result<bool> {
        let mut worker = self.worker.lock().await;

        let Some(Worker { shutdown, handle }) = worker.as_mut() else {
            return Ok(false);
        };

        // The task may have completed on its own.
        if let Some(shutdown) = shutdown.take() {
            shutdown.send(()).ok();
        }

        let result = handle.await;

        worker.take();
        self.running.store(false, Ordering::SeqCst);

        match result {
            Err(e) if e.is_panic() => Err(crate::Error::Strategy {
                name,
                reason: "actuation task panicked".to_owned(),
            }),
            _ => Ok(true),
        }
    }
}
