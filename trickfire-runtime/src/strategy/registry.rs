use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{arbiter::ArbiterRequest, core::Target, device::Drivebase, Config};

use super::{
    ManualDrive, Routine, ScriptedDrive, StrategyHandle, StrategyKind, VisionDrive,
};

/// Strategy registry.
///
/// The registry holds one instance of every strategy variant available in
/// this process. The set of strategies never changes after construction.
pub struct StrategyRegistry {
    manual: StrategyHandle,
    scripted: StrategyHandle,
    vision: Option<StrategyHandle>,
    autonomous: StrategyHandle,
}

impl StrategyRegistry {
    /// Construct a registry with the manual and the scripted strategy.
    ///
    /// The scripted strategy is the designated autonomous strategy until
    /// another one is designated.
    pub fn new(manual: StrategyHandle, scripted: StrategyHandle) -> Self {
        Self {
            manual,
            autonomous: scripted.clone(),
            scripted,
            vision: None,
        }
    }

    /// Register the vision strategy.
    pub fn with_vision(mut self, vision: StrategyHandle) -> Self {
        self.vision = Some(vision);
        self
    }

    /// Designate the strategy selected by the autonomous mode packet.
    ///
    /// Falls back to the scripted strategy if the requested strategy is not
    /// available or is the manual strategy.
    pub fn designate_autonomous(mut self, kind: StrategyKind) -> Self {
        self.autonomous = match kind {
            StrategyKind::Manual => {
                log::warn!("Manual drive cannot be the autonomous strategy");
                self.scripted.clone()
            }
            _ => match self.get(kind) {
                Some(strategy) => strategy.clone(),
                None => {
                    log::warn!("Strategy {} is not available, using scripted", kind);
                    self.scripted.clone()
                }
            },
        };
        self
    }

    /// Construct the registry from configuration.
    pub fn from_config(
        config: &Config,
        drivebase: Arc<dyn Drivebase>,
        requests: mpsc::Sender<ArbiterRequest>,
        targets: watch::Receiver<Option<Target>>,
    ) -> Self {
        let interval = config.drive.interval();

        let manual = StrategyHandle::new(ManualDrive::new(drivebase.clone(), interval));
        let scripted = StrategyHandle::new(ScriptedDrive::new(
            Routine::new(config.routine.steps()),
            drivebase.clone(),
            interval,
            requests.clone(),
        ));

        let mut registry = Self::new(manual, scripted);

        if config.vision.enabled {
            log::debug!("Vision guided driving is enabled");

            registry = registry.with_vision(StrategyHandle::new(VisionDrive::new(
                config.vision.clone(),
                targets,
                drivebase,
                interval,
                requests,
            )));
        }

        registry.designate_autonomous(config.drive.auto_strategy)
    }

    /// The manual strategy, which is the default strategy.
    #[inline]
    pub fn manual(&self) -> &StrategyHandle {
        &self.manual
    }

    /// The strategy selected by the autonomous mode packet.
    #[inline]
    pub fn autonomous(&self) -> &StrategyHandle {
        &self.autonomous
    }

    /// Retrieve strategy by kind.
    pub fn get(&self, kind: StrategyKind) -> Option<&StrategyHandle> {
        match kind {
            StrategyKind::Manual => Some(&self.manual),
            StrategyKind::Scripted => Some(&self.scripted),
            StrategyKind::Vision => self.vision.as_ref(),
        }
    }

    /// Iterate over all strategies.
    pub fn iter(&self) -> impl Iterator<Item = &StrategyHandle> {
        [Some(&self.manual), Some(&self.scripted), self.vision.as_ref()]
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use crate::mock::{EventLog, RecordingDrivebase, RecordingStrategy};

    use super::*;

    fn registry(log: &EventLog) -> StrategyRegistry {
        StrategyRegistry::new(
            StrategyHandle::new(RecordingStrategy::new("manual", StrategyKind::Manual, log)),
            StrategyHandle::new(RecordingStrategy::new("auto", StrategyKind::Scripted, log)),
        )
    }

    #[test]
    fn test_designate_vision() {
        let log = EventLog::default();
        let vision =
            StrategyHandle::new(RecordingStrategy::new("vision", StrategyKind::Vision, &log));

        let registry = registry(&log)
            .with_vision(vision.clone())
            .designate_autonomous(StrategyKind::Vision);

        assert_eq!(registry.autonomous(), &vision);
        assert_eq!(registry.iter().count(), 3);
    }

    #[test]
    fn test_designate_unavailable_falls_back() {
        let log = EventLog::default();

        let registry = registry(&log).designate_autonomous(StrategyKind::Vision);

        assert_eq!(registry.autonomous().kind(), StrategyKind::Scripted);
        assert!(registry.get(StrategyKind::Vision).is_none());
        assert_eq!(registry.iter().count(), 2);
    }

    #[test]
    fn test_designate_manual_falls_back() {
        let log = EventLog::default();

        let registry = registry(&log).designate_autonomous(StrategyKind::Manual);

        assert_eq!(registry.autonomous().kind(), StrategyKind::Scripted);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.vision.enabled = true;
        config.drive.auto_strategy = StrategyKind::Vision;

        let (tx, _rx) = mpsc::channel(1);
        let (_targets_tx, targets_rx) = watch::channel(None);

        let registry = StrategyRegistry::from_config(
            &config,
            Arc::new(RecordingDrivebase::default()),
            tx,
            targets_rx,
        );

        assert_eq!(registry.manual().kind(), StrategyKind::Manual);
        assert_eq!(registry.autonomous().kind(), StrategyKind::Vision);
        assert!(registry
            .iter()
            .all(|strategy| strategy.state() == crate::strategy::StrategyState::Stopped));
    }
}
