use std::{ops::ControlFlow, sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::{arbiter::ArbiterRequest, core::DriveValues, device::Drivebase};

use super::{worker::ActuationSlot, DriveStrategy, StrategyKind, StrategyState};

/// Routine step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Drive values held during the step.
    pub values: DriveValues,
    /// Step duration.
    pub duration: Duration,
}

impl Step {
    pub fn new(forward: f64, rotation: f64, duration: Duration) -> Self {
        Self {
            values: DriveValues::new(forward, rotation),
            duration,
        }
    }
}

/// Position within a routine.
///
/// The routine is advanced by the time elapsed since the previous tick.
/// Steps shorter than a tick are skipped entirely.
#[derive(Debug, Clone)]
pub struct Routine {
    steps: Arc<[Step]>,
    index: usize,
    elapsed: Duration,
}

impl Routine {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            index: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance the routine.
    ///
    /// Returns the drive values for the current step or `None` once the
    /// routine has completed.
    pub fn advance(&mut self, delta: Duration) -> Option<DriveValues> {
        self.elapsed += delta;

        while let Some(step) = self.steps.get(self.index) {
            if self.elapsed < step.duration {
                return Some(step.values);
            }

            self.elapsed -= step.duration;
            self.index += 1;

            log::debug!("Routine step {}/{} done", self.index, self.steps.len());
        }

        None
    }

    /// Total routine duration.
    pub fn duration(&self) -> Duration {
        self.steps.iter().map(|step| step.duration).sum()
    }
}

/// Scripted autonomous routine.
///
/// Every start runs the routine from the first step. On completion the
/// drivebase is put in neutral and control is released back to the default
/// strategy.
pub struct ScriptedDrive {
    routine: Routine,
    drivebase: Arc<dyn Drivebase>,
    interval: Duration,
    requests: mpsc::Sender<ArbiterRequest>,
    slot: ActuationSlot,
}

impl ScriptedDrive {
    const NAME: &'static str = "Auto drive";

    pub fn new(
        routine: Routine,
        drivebase: Arc<dyn Drivebase>,
        interval: Duration,
        requests: mpsc::Sender<ArbiterRequest>,
    ) -> Self {
        Self {
            routine,
            drivebase,
            interval,
            requests,
            slot: ActuationSlot::new(),
        }
    }
}

#[async_trait::async_trait]
impl DriveStrategy for ScriptedDrive {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Scripted
    }

    fn state(&self) -> StrategyState {
        self.slot.state()
    }

    async fn start(&self) -> crate::Result {
        let mut routine = self.routine.clone();
        let drivebase = self.drivebase.clone();
        let requests = self.requests.clone();

        log::debug!(
            "Routine of {} steps, {:?} in total",
            routine.steps.len(),
            routine.duration()
        );

        self.slot
            .spawn(Self::NAME, self.interval, move |delta| {
                match routine.advance(delta) {
                    Some(values) => {
                        drivebase.actuate(values);
                        ControlFlow::Continue(())
                    }
                    None => {
                        drivebase.actuate(DriveValues::NEUTRAL);

                        log::info!("Routine completed");

                        if let Err(e) =
                            requests.try_send(ArbiterRequest::Release(StrategyKind::Scripted))
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

#[cfg(test)]
mod tests {
    use crate::mock::RecordingDrivebase;

    use super::*;

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_routine_advance() {
        let mut routine = Routine::new(vec![
            Step::new(1.0, 0.0, ms(100)),
            Step::new(0.0, 0.5, ms(50)),
        ]);

        assert_eq!(routine.duration(), ms(150));

        assert_eq!(routine.advance(ms(0)), Some(DriveValues::new(1.0, 0.0)));
        assert_eq!(routine.advance(ms(99)), Some(DriveValues::new(1.0, 0.0)));
        assert_eq!(routine.advance(ms(1)), Some(DriveValues::new(0.0, 0.5)));
        assert_eq!(routine.advance(ms(49)), Some(DriveValues::new(0.0, 0.5)));
        assert_eq!(routine.advance(ms(1)), None);
        assert_eq!(routine.advance(ms(10)), None);
    }

    #[test]
    fn test_routine_skips_short_steps() {
        let mut routine = Routine::new(vec![
            Step::new(1.0, 0.0, ms(5)),
            Step::new(-1.0, 0.0, ms(5)),
            Step::new(0.0, 1.0, ms(100)),
        ]);

        assert_eq!(routine.advance(ms(20)), Some(DriveValues::new(0.0, 1.0)));
    }

    #[test]
    fn test_empty_routine() {
        let mut routine = Routine::new(Vec::new());

        assert_eq!(routine.advance(ms(0)), None);
    }

    #[tokio::test]
    async fn test_completion_releases_control() {
        let drivebase = Arc::new(RecordingDrivebase::default());
        let (tx, mut rx) = mpsc::channel(4);

        let strategy = ScriptedDrive::new(
            Routine::new(vec![Step::new(0.5, 0.0, ms(10))]),
            drivebase.clone(),
            ms(2),
            tx,
        );

        strategy.start().await.unwrap();

        let request = tokio::time::timeout(ms(500), rx.recv()).await.unwrap();
        assert_eq!(request, Some(ArbiterRequest::Release(StrategyKind::Scripted)));

        let values = drivebase.values();
        assert_eq!(values.first(), Some(&DriveValues::new(0.5, 0.0)));
        assert_eq!(values.last(), Some(&DriveValues::NEUTRAL));

        assert_eq!(strategy.state(), StrategyState::Running);
        strategy.stop().await.unwrap();
        assert_eq!(strategy.state(), StrategyState::Stopped);
    }

    #[tokio::test]
    async fn test_restart_runs_routine_from_start() {
        let drivebase = Arc::new(RecordingDrivebase::default());
        let (tx, _rx) = mpsc::channel(4);

        let strategy = ScriptedDrive::new(
            Routine::new(vec![
                Step::new(0.5, 0.0, ms(1_000)),
                Step::new(0.0, 0.5, ms(1_000)),
            ]),
            drivebase.clone(),
            ms(2),
            tx,
        );

        strategy.start().await.unwrap();
        strategy.stop().await.unwrap();
        strategy.start().await.unwrap();
        strategy.stop().await.unwrap();

        assert!(drivebase
            .values()
            .iter()
            .all(|values| *values == DriveValues::new(0.5, 0.0) || values.is_neutral()));
    }

    #[test]
    fn test_rejects_parameters() {
        let (tx, _rx) = mpsc::channel(1);
        let strategy = ScriptedDrive::new(
            Routine::new(Vec::new()),
            Arc::new(RecordingDrivebase::default()),
            ms(10),
            tx,
        );

        assert!(matches!(
            strategy.set_parameters(DriveValues::new(1.0, 1.0)),
            Err(crate::Error::Unsupported(_))
        ));
        assert_eq!(strategy.parameters(), None);
    }
}
