use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{core::DriveValues, device::Drivebase};

/// Current drive command for display.
///
/// The telemetry holds the last values written to the drivebase. The values
/// are read-only for consumers; only the `TelemetryTap` writes them.
#[derive(Debug, Clone, Default)]
pub struct Telemetry {
    drive: Arc<AtomicU64>,
    rotation: Arc<AtomicU64>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current drive command.
    #[inline]
    pub fn drive(&self) -> f64 {
        f64::from_bits(self.drive.load(Ordering::Relaxed))
    }

    /// Current rotation command.
    #[inline]
    pub fn rotation(&self) -> f64 {
        f64::from_bits(self.rotation.load(Ordering::Relaxed))
    }

    fn record(&self, values: DriveValues) {
        self.drive.store(values.forward.to_bits(), Ordering::Relaxed);
        self.rotation
            .store(values.rotation.to_bits(), Ordering::Relaxed);
    }
}

/// Drivebase which records every actuation into the telemetry.
pub struct TelemetryTap {
    inner: Arc<dyn Drivebase>,
    telemetry: Telemetry,
}

impl TelemetryTap {
    pub fn new(inner: Arc<dyn Drivebase>, telemetry: Telemetry) -> Self {
        Self { inner, telemetry }
    }
}

impl Drivebase for TelemetryTap {
    fn actuate(&self, values: DriveValues) {
        let values = values.clamped();

        self.telemetry.record(values);
        self.inner.actuate(values);
    }
}

/// Width of one half of an axis bar.
const AXIS_BAR_HALF_WIDTH: usize = 16;

/// Render a value as a centered axis bar.
///
/// The bar grows to the right of the center for positive values and to the
/// left for negative values.
pub fn render_axis_bar(value: f64, half_width: usize) -> String {
    let value = if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    };

    let filled = ((value.abs() * half_width as f64).round() as usize).min(half_width);
    let empty = half_width - filled;

    let (left, right) = if value < 0.0 {
        (
            format!("{}{}", " ".repeat(empty), "#".repeat(filled)),
            " ".repeat(half_width),
        )
    } else {
        (
            " ".repeat(half_width),
            format!("{}{}", "#".repeat(filled), " ".repeat(empty)),
        )
    };

    format!("[{}|{}]", left, right)
}

/// Render the telemetry line.
pub fn render(telemetry: &Telemetry) -> String {
    use ansi_term::Colour::Green;

    format!(
        "{} {} {:>5.2}  {} {} {:>5.2}",
        Green.bold().paint("Rot."),
        Green.paint(render_axis_bar(telemetry.rotation(), AXIS_BAR_HALF_WIDTH)),
        telemetry.rotation(),
        Green.bold().paint("Drv."),
        Green.paint(render_axis_bar(telemetry.drive(), AXIS_BAR_HALF_WIDTH)),
        telemetry.drive(),
    )
}

/// Telemetry display loop.
///
/// The display only reads the telemetry. This method runs forever and is
/// expected to be cancelled by the caller.
pub async fn display(telemetry: Telemetry, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        println!("{}", render(&telemetry));
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::RecordingDrivebase;

    use super::*;

    #[test]
    fn test_render_axis_bar() {
        assert_eq!(render_axis_bar(0.0, 2), "[  |  ]");
        assert_eq!(render_axis_bar(0.5, 4), "[    |##  ]");
        assert_eq!(render_axis_bar(-1.0, 4), "[####|    ]");
    }

    #[test]
    fn test_render_axis_bar_out_of_range() {
        assert_eq!(render_axis_bar(3.0, 2), "[  |##]");
        assert_eq!(render_axis_bar(f64::NAN, 2), "[  |  ]");
    }

    #[test]
    fn test_tap_records_clamped_values() {
        let telemetry = Telemetry::new();
        let drivebase = Arc::new(RecordingDrivebase::default());
        let tap = TelemetryTap::new(drivebase.clone(), telemetry.clone());

        tap.actuate(DriveValues::new(1.5, -0.25));

        assert_eq!(telemetry.drive(), 1.0);
        assert_eq!(telemetry.rotation(), -0.25);
        assert_eq!(drivebase.values(), vec![DriveValues::new(1.0, -0.25)]);
    }
}
