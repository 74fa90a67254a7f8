use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::core::DriveValues;

use super::{Drivebase, HardwareIo};

/// Simulated drivebase.
///
/// The simulated hardware accepts every actuation without any motor
/// attached. It is used when the runtime is run away from the robot.
#[derive(Default)]
pub struct SimulatedIo {
    started: AtomicBool,
    actuation_count: AtomicU64,
}

impl SimulatedIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of actuations accepted since start.
    pub fn actuation_count(&self) -> u64 {
        self.actuation_count.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl HardwareIo for SimulatedIo {
    fn name(&self) -> String {
        "Simulated drivebase".to_owned()
    }

    async fn start(&self) -> crate::Result {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(crate::Error::Hardware(format!(
                "{} is already started",
                self.name()
            )));
        }

        log::debug!("{} started", self.name());

        Ok(())
    }

    async fn stop(&self) -> crate::Result {
        if self.started.swap(false, Ordering::SeqCst) {
            log::debug!(
                "{} stopped after {} actuations",
                self.name(),
                self.actuation_count()
            );
        }

        Ok(())
    }
}

impl Drivebase for SimulatedIo {
    fn actuate(&self, values: DriveValues) {
        if !self.started.load(Ordering::SeqCst) {
            log::warn!("Actuation while hardware is stopped: {}", values);
            return;
        }

        self.actuation_count.fetch_add(1, Ordering::Relaxed);

        log::trace!("Actuate drivebase: {}", values.clamped());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_actuation_requires_start() {
        let io = SimulatedIo::new();

        io.actuate(DriveValues::new(0.5, 0.0));
        assert_eq!(io.actuation_count(), 0);

        io.start().await.unwrap();
        io.actuate(DriveValues::new(0.5, 0.0));
        assert_eq!(io.actuation_count(), 1);

        io.stop().await.unwrap();
        io.actuate(DriveValues::new(0.5, 0.0));
        assert_eq!(io.actuation_count(), 1);
    }

    #[tokio::test]
    async fn test_double_start() {
        let io = SimulatedIo::new();

        io.start().await.unwrap();

        assert!(matches!(io.start().await, Err(crate::Error::Hardware(_))));
    }
}
