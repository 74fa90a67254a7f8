use std::{
    ops::ControlFlow,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::{core::DriveValues, device::Drivebase};

use super::{worker::ActuationSlot, DriveStrategy, StrategyKind, StrategyState};

/// Manual teleoperation.
///
/// The operator sends drive parameter packets. The latest values are held as
/// targets and written to the drivebase on every tick while the strategy is
/// running. Targets are updated while stopped as well, so they are fresh when
/// manual control resumes.
pub struct ManualDrive {
    targets: Arc<Mutex<DriveValues>>,
    drivebase: Arc<dyn Drivebase>,
    interval: Duration,
    slot: ActuationSlot,
}

impl ManualDrive {
    const NAME: &'static str = "Standard drive";

    pub fn new(drivebase: Arc<dyn Drivebase>, interval: Duration) -> Self {
        Self {
            targets: Arc::new(Mutex::new(DriveValues::NEUTRAL)),
            drivebase,
            interval,
            slot: ActuationSlot::new(),
        }
    }

    fn targets(&self) -> DriveValues {
        *self.targets.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait::async_trait]
impl DriveStrategy for ManualDrive {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn kind(&self) -> StrategyKind {
        StrategyKind::Manual
    }

    fn state(&self) -> StrategyState {
        self.slot.state()
    }

    async fn start(&self) -> crate::Result {
        let targets = self.targets.clone();
        let drivebase = self.drivebase.clone();

        self.slot
            .spawn(Self::NAME, self.interval, move |_| {
                let values = *targets.lock().unwrap_or_else(|e| e.into_inner());
                drivebase.actuate(values.clamped());

                ControlFlow::Continue(())
            })
            .await
    }

    async fn stop(&self) -> crate::Result {
        let was_running = self.slot.halt(Self::NAME).await;

        // Leave the drivebase in neutral, even if the task failed.
        if !matches!(was_running, Ok(false)) {
            self.drivebase.actuate(DriveValues::NEUTRAL);
        }

        was_running.map(|_| ())
    }

    fn set_parameters(&self, values: DriveValues) -> crate::Result {
        log::trace!("{} targets: {}", Self::NAME, values);

        *self.targets.lock().unwrap_or_else(|e| e.into_inner()) = values;

        Ok(())
    }

    fn parameters(&self) -> Option<DriveValues> {
        Some(self.targets())
    }
}
