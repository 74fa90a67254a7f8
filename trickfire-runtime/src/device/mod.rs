mod sim;

pub use sim::SimulatedIo;

use crate::core::DriveValues;

/// Hardware I/O subsystem.
///
/// The hardware I/O subsystem owns the motor and sensor access of the robot.
/// It must be started before any strategy is allowed to actuate and is the
/// last subsystem to be stopped.
#[async_trait::async_trait]
pub trait HardwareIo: Send + Sync {
    /// Return the device name.
    fn name(&self) -> String;

    /// Start the hardware I/O subsystem.
    ///
    /// An error is fatal, the runtime must not accept control packets
    /// without functioning hardware.
    async fn start(&self) -> crate::Result;

    /// Stop the hardware I/O subsystem.
    async fn stop(&self) -> crate::Result;
}

/// Drivebase write interface.
///
/// The drivebase is shared by all strategies. It is never driven by two
/// strategies at once, the arbiter guarantees that only the active strategy
/// is running.
pub trait Drivebase: Send + Sync {
    /// Issue actuate command.
    fn actuate(&self, values: DriveValues);
}
