use std::time::Instant;

use tokio::sync::{mpsc, Mutex};

use crate::strategy::{StrategyHandle, StrategyKind, StrategyRegistry, StrategyState};

/// Request from a background producer.
///
/// Producers which do not own a reference to the arbiter, such as a
/// completed routine or a vision pipeline, send requests over a channel. The
/// requests are applied in order by [`DriveArbiter::process_requests`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterRequest {
    /// Switch to the strategy of this kind.
    Switch(StrategyKind),
    /// Return control to the default strategy if this kind is still active.
    Release(StrategyKind),
    /// Return control to the default strategy.
    ResumeDefault,
}

impl std::fmt::Display for ArbiterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArbiterRequest::Switch(kind) => write!(f, "switch to {}", kind),
            ArbiterRequest::Release(kind) => write!(f, "release {}", kind),
            ArbiterRequest::ResumeDefault => write!(f, "resume default"),
        }
    }
}

#[derive(Default)]
struct ArbiterState {
    active: Option<StrategyHandle>,
    /// Set by `stop_all`. No strategy is started once halted.
    halted: bool,
}

/// Drive arbiter.
///
/// The arbiter owns the single active drive strategy. Every transition runs
/// to completion while holding the arbiter lock: the active strategy is
/// stopped and awaited, the active handle is swapped and only then the next
/// strategy is started. Concurrent callers queue up on the lock, so at most
/// one strategy actuates the drivebase at any time.
pub struct DriveArbiter {
    state: Mutex<ArbiterState>,
    default: StrategyHandle,
    force_restart_default: bool,
}

impl DriveArbiter {
    /// Construct a new arbiter with the default strategy.
    ///
    /// No strategy is active until the first switch.
    pub fn new(default: StrategyHandle) -> Self {
        Self {
            state: Mutex::new(ArbiterState::default()),
            default,
            force_restart_default: false,
        }
    }

    /// Restart the default strategy on every resume, even if it is active.
    pub fn with_force_restart_default(mut self, force: bool) -> Self {
        self.force_restart_default = force;
        self
    }

    /// Make the strategy the active strategy.
    ///
    /// Switching to the active strategy while it is running does nothing.
    /// Strategy faults are returned after the active handle was updated.
    pub async fn switch_to(&self, strategy: &StrategyHandle) -> crate::Result {
        let mut state = self.state.lock().await;

        if state.halted {
            log::debug!("Arbiter halted, ignoring switch to {}", strategy.name());
            return Ok(());
        }

        let is_active = state.active.as_ref() == Some(strategy);
        if is_active && strategy.state() == StrategyState::Running {
            log::trace!("{} is already active", strategy.name());
            return Ok(());
        }

        Self::transition(&mut state, strategy).await
    }

    /// Return control to the default strategy.
    pub async fn resume_default(&self) -> crate::Result {
        if !self.force_restart_default {
            return self.switch_to(&self.default).await;
        }

        let mut state = self.state.lock().await;

        if state.halted {
            return Ok(());
        }

        Self::transition(&mut state, &self.default).await
    }

    /// Return control to the default strategy if the strategy is active.
    ///
    /// A strategy which completes on its own releases control through this
    /// method. If another strategy was selected in the meantime the release
    /// is stale and ignored.
    pub async fn release(&self, strategy: &StrategyHandle) -> crate::Result {
        let mut state = self.state.lock().await;

        if state.halted {
            return Ok(());
        }

        if state.active.as_ref() != Some(strategy) || strategy == &self.default {
            log::debug!("Ignoring release of inactive {}", strategy.name());
            return Ok(());
        }

        log::info!("{} released control", strategy.name());

        Self::transition(&mut state, &self.default).await
    }

    /// Stop the active strategy.
    ///
    /// After this call the arbiter ignores all further switches.
    pub async fn stop_all(&self) -> crate::Result {
        let mut state = self.state.lock().await;

        state.halted = true;

        match &state.active {
            Some(strategy) => {
                log::debug!("Stopping {}", strategy.name());
                strategy.stop().await
            }
            None => Ok(()),
        }
    }

    /// The active strategy.
    pub async fn active(&self) -> Option<StrategyHandle> {
        self.state.lock().await.active.clone()
    }

    /// Kind of the active strategy.
    pub async fn active_kind(&self) -> Option<StrategyKind> {
        self.state.lock().await.active.as_ref().map(|s| s.kind())
    }

    /// Apply requests from background producers until the channel closes.
    pub async fn process_requests(
        &self,
        registry: &StrategyRegistry,
        mut requests: mpsc::Receiver<ArbiterRequest>,
    ) {
        while let Some(request) = requests.recv().await {
            log::debug!("Arbiter request: {}", request);

            let result = match request {
                ArbiterRequest::Switch(kind) => match registry.get(kind) {
                    Some(strategy) => self.switch_to(strategy).await,
                    None => {
                        log::warn!("Strategy {} is not available", kind);
                        continue;
                    }
                },
                ArbiterRequest::Release(kind) => match registry.get(kind) {
                    Some(strategy) => self.release(strategy).await,
                    None => continue,
                },
                ArbiterRequest::ResumeDefault => self.resume_default().await,
            };

            if let Err(e) = result {
                log::error!("Failed to apply '{}': {}", request, e);
            }
        }

        log::debug!("Arbiter request channel closed");
    }

    /// Stop the active strategy, swap the handle and start the next strategy.
    ///
    /// The first fault is returned. A stop fault does not prevent the next
    /// strategy from starting.
    async fn transition(state: &mut ArbiterState, next: &StrategyHandle) -> crate::Result {
        let transition_start = Instant::now();

        let mut result = Ok(());

        if let Some(current) = &state.active {
            log::debug!("Stopping {}", current.name());

            if let Err(e) = current.stop().await {
                log::warn!("{} did not stop cleanly", current.name());
                result = Err(e);
            }
        }

        state.active = Some(next.clone());

        log::info!("Active strategy: {}", next.name());

        if let Err(e) = next.start().await {
            if result.is_ok() {
                result = Err(e);
            }
        }

        let transition_time = transition_start.elapsed();
        if transition_time > crate::consts::TRANSITION_DELAY_THRESHOLD {
            log::warn!(
                "Transition to {} took {:?}, drivebase was idle",
                next.name(),
                transition_time
            );
        }

        result
    }
}
