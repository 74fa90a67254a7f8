/// Visual target relative to the robot.
///
/// Targets are produced by an external vision pipeline, for example a marker
/// detector on the camera feed.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Target {
    /// Horizontal angle to the target in radians. Positive is to the right.
    pub bearing: f64,
    /// Distance to the target in meters.
    pub distance: f64,
}

impl Target {
    /// Construct a new target
    pub fn new(bearing: f64, distance: f64) -> Self {
        Self { bearing, distance }
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bearing: {:.1}° Distance: {:.2}m",
            self.bearing.to_degrees(),
            self.distance
        )
    }
}
