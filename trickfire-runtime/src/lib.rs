// Copyright (C) 2024 Laixer Equipment B.V.
// All rights reserved.
//
// This software may be modified and distributed under the terms
// of the included license.  See the LICENSE file for details.

/// The `trickfire-runtime` library provides the robot side of the remote
/// control system.
///
/// Inbound packets are decoded by the `PacketDispatcher` and routed either to
/// the manual drive strategy or to the `DriveArbiter`. The arbiter owns the
/// single active `DriveStrategy` and guarantees that the previous strategy is
/// fully stopped before the next one is started. The `LifecycleController`
/// ties the hardware I/O, the network transport and the arbiter together in a
/// strict startup and shutdown order.
pub mod arbiter;
pub mod core;
pub mod device;
pub mod dispatcher;
pub mod lifecycle;
pub mod protocol;
pub mod strategy;
pub mod telemetry;
pub mod transport;

mod config;

#[cfg(test)]
pub(crate) mod mock;

pub use self::config::*;

pub mod runtime;
pub use self::runtime::Error;
pub use self::runtime::Result;

/// TrickFire runtime module containing various constants.
pub mod consts {
    use std::time::Duration;

    /// TrickFire runtime version.
    ///
    /// # Example
    ///
    /// ```
    /// use trickfire::consts::VERSION;
    ///
    /// println!("TrickFire runtime version: {}", VERSION);
    /// ```
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Default network port of the control station.
    ///
    /// # Example
    ///
    /// ```
    /// use trickfire::consts::DEFAULT_NETWORK_PORT;
    ///
    /// println!("Default network port: {}", DEFAULT_NETWORK_PORT);
    /// ```
    pub const DEFAULT_NETWORK_PORT: u16 = 25_565;

    /// Default interval between two actuation ticks of a running strategy.
    pub const DEFAULT_ACTUATION_INTERVAL: Duration = Duration::from_millis(20);

    /// Strategy transitions slower than this threshold are reported.
    ///
    /// A transition is the full stop, swap and start sequence of the arbiter.
    /// No strategy is allowed to actuate during the transition, so a slow
    /// transition means the drivebase was left idle for that long.
    pub const TRANSITION_DELAY_THRESHOLD: Duration = Duration::from_millis(100);

    /// Queue size for arbiter requests from background producers.
    pub const QUEUE_SIZE_REQUEST: usize = 16;
}
