/// Drivebase command.
///
/// Both values are normalized. The forward value moves the drivebase
/// forwards (positive) or backwards (negative). The rotation value turns the
/// drivebase clockwise (positive) or counter-clockwise (negative).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveValues {
    /// Forward magnitude.
    pub forward: f64,
    /// Rotation magnitude.
    pub rotation: f64,
}

impl DriveValues {
    pub const MAX: f64 = 1.0;
    pub const MIN: f64 = -1.0;

    /// Values that do not move the drivebase.
    pub const NEUTRAL: Self = Self {
        forward: 0.0,
        rotation: 0.0,
    };

    pub fn new(forward: f64, rotation: f64) -> Self {
        Self { forward, rotation }
    }

    /// Bound both values to the normalized range.
    ///
    /// A value which is not a number is interpreted as 0.
    pub fn clamped(&self) -> Self {
        fn bound(value: f64) -> f64 {
            if value.is_nan() {
                0.0
            } else {
                value.clamp(DriveValues::MIN, DriveValues::MAX)
            }
        }

        Self {
            forward: bound(self.forward),
            rotation: bound(self.rotation),
        }
    }

    #[inline]
    pub fn is_neutral(&self) -> bool {
        self.forward == 0.0 && self.rotation == 0.0
    }
}

impl std::fmt::Display for DriveValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Forward: {:.2} Rotation: {:.2}",
            self.forward, self.rotation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped() {
        let values = DriveValues::new(1.7, -3.0).clamped();

        assert_eq!(values, DriveValues::new(1.0, -1.0));
    }

    #[test]
    fn test_clamped_nan() {
        let values = DriveValues::new(f64::NAN, 0.25).clamped();

        assert_eq!(values, DriveValues::new(0.0, 0.25));
    }

    #[test]
    fn test_neutral() {
        assert!(DriveValues::NEUTRAL.is_neutral());
        assert!(DriveValues::default().is_neutral());
        assert!(!DriveValues::new(0.0, 0.1).is_neutral());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DriveValues::new(0.5, -0.25).to_string(),
            "Forward: 0.50 Rotation: -0.25"
        );
    }
}
