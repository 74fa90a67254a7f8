use std::sync::Arc;

use crate::core::DriveValues;

pub use self::manual::ManualDrive;
pub use self::registry::StrategyRegistry;
pub use self::scripted::{Routine, ScriptedDrive, Step};
pub use self::vision::{Pursuit, VisionDrive};

mod manual;
mod registry;
mod scripted;
mod vision;
mod worker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde_derive::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Manual teleoperation.
    Manual,
    /// Scripted autonomous routine.
    Scripted,
    /// Vision guided driving.
    Vision,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Manual => write!(f, "manual"),
            StrategyKind::Scripted => write!(f, "scripted"),
            StrategyKind::Vision => write!(f, "vision"),
        }
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(StrategyKind::Manual),
            "scripted" => Ok(StrategyKind::Scripted),
            "vision" => Ok(StrategyKind::Vision),
            _ => Err(crate::Error::Config(format!("unknown strategy: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyState {
    Stopped,
    Running,
}

impl std::fmt::Display for StrategyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyState::Stopped => write!(f, "stopped"),
            StrategyState::Running => write!(f, "running"),
        }
    }
}

/// Drive strategy capability.
///
/// A drive strategy is a unit of control logic which, while running,
/// periodically actuates the drivebase. Only the arbiter decides which
/// strategy is running.
#[async_trait::async_trait]
pub trait DriveStrategy: Send + Sync {
    /// Strategy name for logging and telemetry.
    fn name(&self) -> &'static str;

    /// Strategy kind.
    fn kind(&self) -> StrategyKind;

    /// Current lifecycle state.
    fn state(&self) -> StrategyState;

    /// Start the strategy.
    ///
    /// Starting a running strategy is an error and leaves the strategy
    /// untouched.
    async fn start(&self) -> crate::Result;

    /// Stop the strategy.
    ///
    /// When this method returns the strategy no longer actuates the
    /// drivebase, even if an error is returned. Stopping a stopped strategy
    /// does nothing.
    async fn stop(&self) -> crate::Result;

    /// Update the target values of an interactive strategy.
    ///
    /// Strategies which are not interactive reject the update.
    fn set_parameters(&self, _values: DriveValues) -> crate::Result {
        Err(crate::Error::Unsupported(self.name()))
    }

    /// Target values held by an interactive strategy.
    fn parameters(&self) -> Option<DriveValues> {
        None
    }
}

/// Opaque strategy handle.
///
/// Handles are compared by identity, two handles are equal if they refer to
/// the same strategy instance.
#[derive(Clone)]
pub struct StrategyHandle(Arc<dyn DriveStrategy>);

impl StrategyHandle {
    pub fn new<S: DriveStrategy + 'static>(strategy: S) -> Self {
        Self(Arc::new(strategy))
    }
}

impl std::ops::Deref for StrategyHandle {
    type Target = dyn DriveStrategy;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for StrategyHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for StrategyHandle {}

impl std::fmt::Debug for StrategyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyHandle")
            .field("name", &self.name())
            .field("state", &self.state())
            .finish()
    }
}

impl std::fmt::Display for StrategyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.state())
    }
}
