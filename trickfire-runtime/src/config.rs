use std::{path::Path, time::Duration};

use crate::strategy::{Step, StrategyKind};

/// Drive configuration.
#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq)]
pub struct DriveConfig {
    /// Actuation tick interval in milliseconds.
    #[serde(default = "DriveConfig::default_interval")]
    pub interval: u64,
    /// Strategy selected by the autonomous mode packet.
    #[serde(default = "DriveConfig::default_auto_strategy")]
    pub auto_strategy: StrategyKind,
    /// Restart the manual strategy on every resume, even if already active.
    #[serde(default)]
    pub force_restart_default: bool,
}

impl DriveConfig {
    const INTERVAL_MIN: u64 = 5;
    const INTERVAL_MAX: u64 = 1_000;

    fn default_interval() -> u64 {
        crate::consts::DEFAULT_ACTUATION_INTERVAL.as_millis() as u64
    }

    fn default_auto_strategy() -> StrategyKind {
        StrategyKind::Scripted
    }

    /// Actuation tick interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval.clamp(Self::INTERVAL_MIN, Self::INTERVAL_MAX))
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            interval: Self::default_interval(),
            auto_strategy: Self::default_auto_strategy(),
            force_restart_default: false,
        }
    }
}

#[derive(Clone, Copy, Debug, serde_derive::Deserialize, PartialEq)]
pub struct StepConfig {
    #[serde(default)]
    pub forward: f64,
    #[serde(default)]
    pub rotation: f64,
    /// Step duration in milliseconds.
    pub duration: u64,
}

/// Scripted routine configuration.
#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq)]
pub struct RoutineConfig {
    #[serde(default = "RoutineConfig::default_steps")]
    pub steps: Vec<StepConfig>,
}

impl RoutineConfig {
    fn default_steps() -> Vec<StepConfig> {
        vec![
            StepConfig {
                forward: 1.0,
                rotation: 0.0,
                duration: 2_000,
            },
            StepConfig {
                forward: 0.0,
                rotation: 1.0,
                duration: 1_000,
            },
        ]
    }

    /// Routine steps.
    pub fn steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .map(|step| {
                Step::new(
                    step.forward,
                    step.rotation,
                    Duration::from_millis(step.duration),
                )
            })
            .collect()
    }
}

impl Default for RoutineConfig {
    fn default() -> Self {
        Self {
            steps: Self::default_steps(),
        }
    }
}

/// Vision guided driving configuration.
#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq)]
pub struct VisionConfig {
    /// Enable the vision strategy.
    #[serde(default)]
    pub enabled: bool,
    /// Rotation per radian of bearing error.
    #[serde(default = "VisionConfig::default_gain")]
    pub gain: f64,
    /// Distance to the target at which the robot stops approaching.
    #[serde(default = "VisionConfig::default_approach_distance")]
    pub approach_distance: f64,
    /// Rotation while no target is in sight.
    #[serde(default = "VisionConfig::default_search_rotation")]
    pub search_rotation: f64,
    /// Time in milliseconds the target must be held within the approach
    /// distance before control is released.
    #[serde(default = "VisionConfig::default_hold")]
    pub hold: u64,
    /// Time in milliseconds without a target before control is released.
    #[serde(default = "VisionConfig::default_lost_timeout")]
    pub lost_timeout: u64,
}

impl VisionConfig {
    fn default_gain() -> f64 {
        1.5
    }

    fn default_approach_distance() -> f64 {
        0.5
    }

    fn default_search_rotation() -> f64 {
        0.25
    }

    fn default_hold() -> u64 {
        1_000
    }

    fn default_lost_timeout() -> u64 {
        10_000
    }

    /// Time the target must be held within the approach distance.
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold)
    }

    /// Time without a target before the pursuit is abandoned.
    pub fn lost_timeout(&self) -> Duration {
        Duration::from_millis(self.lost_timeout)
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gain: Self::default_gain(),
            approach_distance: Self::default_approach_distance(),
            search_rotation: Self::default_search_rotation(),
            hold: Self::default_hold(),
            lost_timeout: Self::default_lost_timeout(),
        }
    }
}

/// Telemetry display configuration.
#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Enable the telemetry display.
    #[serde(default)]
    pub enabled: bool,
    /// Display refresh interval in milliseconds.
    #[serde(default = "TelemetryConfig::default_interval")]
    pub interval: u64,
}

impl TelemetryConfig {
    fn default_interval() -> u64 {
        100
    }

    /// Display refresh interval.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval.max(1))
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Self::default_interval(),
        }
    }
}

/// TrickFire client configuration.
#[derive(Clone, Debug, serde_derive::Deserialize, PartialEq)]
pub struct Config {
    /// Control station address.
    #[serde(default = "Config::default_connect")]
    pub connect: String,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub routine: RoutineConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    fn default_connect() -> String {
        format!("127.0.0.1:{}", crate::consts::DEFAULT_NETWORK_PORT)
    }

    /// Read the configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No configuration at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => Err(crate::Error::Config(format!("{}: {}", path.display(), e)))?,
        };

        let config: Self = contents.parse()?;

        log::debug!("Configuration read from {}", path.display());

        Ok(config)
    }

    /// Check the configuration for values which cannot be used.
    pub fn validate(&self) -> crate::Result {
        if self.connect.is_empty() {
            Err(crate::Error::Config("connect address is empty".to_owned()))?
        }

        if self.drive.auto_strategy == StrategyKind::Manual {
            Err(crate::Error::Config(
                "manual drive cannot be the autonomous strategy".to_owned(),
            ))?
        }

        for step in &self.routine.steps {
            if !step.forward.is_finite() || !step.rotation.is_finite() {
                Err(crate::Error::Config("routine step is not finite".to_owned()))?
            }
        }

        if self.vision.approach_distance < 0.0 {
            Err(crate::Error::Config(
                "approach distance cannot be negative".to_owned(),
            ))?
        }

        Ok(())
    }

    /// Control station address with the default port if none was given.
    pub fn address(&self) -> String {
        if self.connect.contains(':') {
            self.connect.clone()
        } else {
            format!("{}:{}", self.connect, crate::consts::DEFAULT_NETWORK_PORT)
        }
    }
}

impl std::str::FromStr for Config {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(s).map_err(|e| crate::Error::Config(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connect: Self::default_connect(),
            drive: DriveConfig::default(),
            routine: RoutineConfig::default(),
            vision: VisionConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Connect: {}; Autonomous: {}; Vision: {}; Telemetry: {}",
            self.address(),
            self.drive.auto_strategy,
            if self.vision.enabled { "on" } else { "off" },
            if self.telemetry.enabled { "on" } else { "off" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config: Config = "".parse().unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.address(), "127.0.0.1:25565");
        assert_eq!(config.drive.interval(), Duration::from_millis(20));
        assert_eq!(config.routine.steps().len(), 2);
    }

    #[test]
    fn test_full_config() {
        let config: Config = r#"
            connect = "10.0.0.2"

            [drive]
            interval = 2
            auto_strategy = "vision"
            force_restart_default = true

            [[routine.steps]]
            forward = 0.5
            duration = 1500

            [vision]
            enabled = true
            gain = 2.0
            lost_timeout = 5000

            [telemetry]
            enabled = true
        "#
        .parse()
        .unwrap();

        assert_eq!(config.address(), "10.0.0.2:25565");
        assert_eq!(config.drive.interval(), Duration::from_millis(5));
        assert_eq!(config.drive.auto_strategy, StrategyKind::Vision);
        assert!(config.drive.force_restart_default);
        assert_eq!(
            config.routine.steps(),
            vec![Step::new(0.5, 0.0, Duration::from_millis(1_500))]
        );
        assert!(config.vision.enabled);
        assert_eq!(config.vision.gain, 2.0);
        assert_eq!(config.vision.approach_distance, 0.5);
        assert_eq!(config.vision.hold(), Duration::from_secs(1));
        assert_eq!(config.vision.lost_timeout(), Duration::from_secs(5));
        assert!(config.telemetry.enabled);
        assert_eq!(config.telemetry.interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_manual_auto_strategy() {
        let result = r#"
            [drive]
            auto_strategy = "manual"
        "#
        .parse::<Config>();

        assert!(matches!(result, Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_malformed_config() {
        assert!(matches!(
            "connect = 42".parse::<Config>(),
            Err(crate::Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let config = Config::from_file("/nonexistent/trickfire.conf").unwrap();

        assert_eq!(config, Config::default());
    }
}
