use std::{ops::ControlFlow, sync::Arc, time::Duration};

use tokio::sync::{mpsc, watch};

use crate::{
    arbiter::ArbiterRequest,
    core::{DriveValues, Target},
    device::Drivebase,
    VisionConfig,
};

use super::{worker::ActuationSlot, DriveStrategy, StrategyKind, StrategyState};

/// Bearing error at which the robot no longer moves forward.
const MAX_APPROACH_BEARING: f64 = std::f64::consts::FRAC_PI_4;

/// Compute the drive values towards a target.
///
/// The robot turns towards the target proportionally to the bearing and
/// approaches the target until it is within the approach distance. Forward
/// motion is reduced while the robot is not facing the target. Without a
/// target the robot rotates in place to search for one.
pub fn steer(config: &VisionConfig, target: Option<Target>) -> DriveValues {
    match target {
        Some(target) => {
            let rotation = config.gain * target.bearing;

            let alignment = (1.0 - target.bearing.abs() / MAX_APPROACH_BEARING).max(0.0);
            let forward = (target.distance - config.approach_distance).max(0.0) * alignment;

            DriveValues::new(forward, rotation).clamped()
        }
        None => DriveValues::new(0.0, config.search_rotation).clamped(),
    }
}

/// Progress of the pursuit of a target.
///
/// The pursuit ends once the target was held within the approach distance
/// for the hold time, or when no target was seen for the lost timeout.
#[derive(Debug, Clone)]
pub struct Pursuit {
    config: VisionConfig,
    arrived_for: Duration,
    lost_for: Duration,
}

impl Pursuit {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            arrived_for: Duration::ZERO,
            lost_for: Duration::ZERO,
        }
    }

    /// Advance the pursuit with the latest target.
    ///
    /// Returns the drive values towards the target or `None` once the
    /// pursuit has ended.
    pub fn advance(&mut self, target: Option<Target>, delta: Duration) -> Option<DriveValues> {
        match &target {
            Some(target) => {
                self.lost_for = Duration::ZERO;

                if target.distance <= self.config.approach_distance {
                    self.arrived_for += delta;
                } else {
                    self.arrived_for = Duration::ZERO;
                }

                if self.arrived_for >= self.config.hold() {
                    log::info!("Target reached");
                    return None;
                }
            }
            None => {
                self.arrived_for = Duration::ZERO;
                self.lost_for += delta;

                if self.lost_for >= self.config.lost_timeout() {
                    log::info!("No target in sight for {:?}", self.lost_for);
                    return None;
                }
            }
        }

        Some(steer(&self.config, target))
    }
}

/// Vision guided driving.
///
/// Targets are published by an external vision pipeline. The strategy only
/// reads the latest published target on every tick. When the pursuit ends
/// the drivebase is put in neutral and control is released back to the
/// default strategy.
pub struct VisionDrive {
    config: VisionConfig,
    targets: watch::Receiver<Option<Target>>,
    drivebase: Arc<dyn Drivebase>,
    interval: Duration,
    requests: mpsc::Sender<ArbiterRequest>,
    slot: ActuationSlot,
}

impl VisionDrive {
    const NAME: &'static str = "ArUco drive";

    pub fn new(
        config: VisionConfig,
        targets: watch::Receiver<Option<Target>>,
        drivebase: Arc<dyn Drivebase>,
        interval: Duration,
        requests: mpsc::Sender<ArbiterRequest>,
    ) -> Self {
        Self {
            config,
            targets,
            drivebase,
            interval,
            requests,
            slot: ActuationSlot::new(),
        }
    }
}

#[async_trait::async_trait]
impl DriveStrategy for VisionDrive {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Vision
    }

    fn state(&self) -> StrategyState {
        self.slot.state()
    }

    async fn start(&self) -> crate::Result {
        let mut pursuit = Pursuit::new(self.config.clone());
        let targets = self.targets.clone();
        let drivebase = self.drivebase.clone();
        let requests = self.requests.clone();

        self.slot
            .spawn(Self::NAME, self.interval, move |delta| {
                let target = *targets.borrow();

                if let Some(target) = &target {
                    log::trace!("Tracking target: {}", target);
                }

                match pursuit.advance(target, delta) {
                    Some(values) => {
                        drivebase.actuate(values);
                        ControlFlow::Continue(())
                    }
                    None => {
                        drivebase.actuate(DriveValues::NEUTRAL);

                        if let Err(e) =
                            requests.try_send(ArbiterRequest::Release(StrategyKind::Vision))
                        {
                            log::error!("Failed to release control: {}", e);
                        }

                        ControlFlow::Break(())
                    }
                }
            })
            .await
    }

    async fn stop(&self) -> crate::Result {
        let was_running = self.slot.halt(Self::NAME).await;

        if !matches!(was_running, Ok(false)) {
            self.drivebase.actuate(DriveValues::NEUTRAL);
        }

        was_running.map(|_| ())
    }
}
