use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::{
    arbiter::{ArbiterRequest, DriveArbiter},
    core::Target,
    device::{Drivebase, HardwareIo},
    dispatcher::PacketDispatcher,
    runtime::RuntimeContext,
    strategy::StrategyRegistry,
    telemetry::{Telemetry, TelemetryTap},
    transport::Transport,
    Config,
};

/// Lifecycle controller.
///
/// The controller starts the hardware I/O, connects the transport and hands
/// control to the manual strategy. It then dispatches inbound packets until
/// the connection closes, the transport fails or a shutdown is requested.
/// Shutdown runs in reverse order of startup, after the active strategy has
/// been stopped.
pub struct LifecycleController<H, T> {
    config: Config,
    hardware: Arc<H>,
    transport: T,
    ctx: RuntimeContext,
    telemetry: Telemetry,
    registry: Option<StrategyRegistry>,
    requests: mpsc::Sender<ArbiterRequest>,
    request_queue: Option<mpsc::Receiver<ArbiterRequest>>,
    targets: (
        Arc<watch::Sender<Option<Target>>>,
        watch::Receiver<Option<Target>>,
    ),
}

impl<H, T> LifecycleController<H, T>
where
    H: HardwareIo + Drivebase + 'static,
    T: Transport,
{
    pub fn new(config: Config, hardware: Arc<H>, transport: T) -> Self {
        let (requests, request_queue) = mpsc::channel(crate::consts::QUEUE_SIZE_REQUEST);
        let (targets_tx, targets_rx) = watch::channel(None);

        Self {
            config,
            hardware,
            transport,
            ctx: RuntimeContext::new(),
            telemetry: Telemetry::new(),
            registry: None,
            requests,
            request_queue: Some(request_queue),
            targets: (Arc::new(targets_tx), targets_rx),
        }
    }

    /// Use this registry instead of the registry built from configuration.
    pub fn with_registry(mut self, registry: StrategyRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Runtime context.
    #[inline]
    pub fn context(&self) -> &RuntimeContext {
        &self.ctx
    }

    /// Telemetry of the drivebase.
    pub fn telemetry(&self) -> Telemetry {
        self.telemetry.clone()
    }

    /// Channel for arbiter requests from background producers.
    pub fn request_sender(&self) -> mpsc::Sender<ArbiterRequest> {
        self.requests.clone()
    }

    /// Channel on which the vision pipeline publishes targets.
    pub fn vision_sender(&self) -> Arc<watch::Sender<Option<Target>>> {
        self.targets.0.clone()
    }

    fn build_registry(&self) -> StrategyRegistry {
        let drivebase: Arc<dyn Drivebase> = Arc::new(TelemetryTap::new(
            self.hardware.clone(),
            self.telemetry.clone(),
        ));

        StrategyRegistry::from_config(
            &self.config,
            drivebase,
            self.requests.clone(),
            self.targets.1.clone(),
        )
    }

    /// Dispatch inbound packets until the connection ends or shutdown is
    /// requested.
    ///
    /// Only the receive is raced against the shutdown signal. A received
    /// packet is always dispatched to completion.
    async fn receive(&mut self, dispatcher: &PacketDispatcher) -> crate::Result {
        loop {
            let payload = tokio::select! {
                payload = self.transport.recv() => payload?,
                _ = self.ctx.shutdown.1.recv() => {
                    log::info!("Shutdown requested");
                    return Ok(());
                }
            };

            match payload {
                Some(payload) => dispatcher.dispatch_frame(&payload).await,
                None => {
                    log::info!("Connection closed by control station");
                    return Ok(());
                }
            }
        }
    }

    /// Run the client until the connection ends or shutdown is requested.
    ///
    /// Hardware and connection faults during startup are returned. A
    /// transport fault while running triggers an orderly shutdown and is
    /// returned afterwards.
    pub async fn run(mut self) -> crate::Result {
        log::debug!("Starting {}", self.hardware.name());

        self.hardware.start().await?;

        log::info!("{} started", self.hardware.name());

        if let Err(e) = self.transport.connect().await {
            log::error!("Failed to connect: {}", e);

            if let Err(e) = self.hardware.stop().await {
                log::error!("Failed to stop {}: {}", self.hardware.name(), e);
            }

            return Err(e);
        }

        let registry = match self.registry.take() {
            Some(registry) => registry,
            None => self.build_registry(),
        };

        for strategy in registry.iter() {
            log::debug!("Registered strategy: {} ({})", strategy.name(), strategy.kind());
        }

        let registry = Arc::new(registry);
        let arbiter = Arc::new(
            DriveArbiter::new(registry.manual().clone())
                .with_force_restart_default(self.config.drive.force_restart_default),
        );

        if let Err(e) = arbiter.switch_to(registry.manual()).await {
            log::error!("Failed to start {}: {}", registry.manual().name(), e);
        }

        let mut tasks = Vec::new();

        if let Some(requests) = self.request_queue.take() {
            let arbiter = arbiter.clone();
            let registry = registry.clone();

            tasks.push(tokio::spawn(async move {
                arbiter.process_requests(&registry, requests).await
            }));
        }

        if self.config.telemetry.enabled {
            log::debug!("Telemetry display enabled");

            tasks.push(tokio::spawn(crate::telemetry::display(
                self.telemetry.clone(),
                self.config.telemetry.interval(),
            )));
        }

        let dispatcher = PacketDispatcher::new(arbiter.clone(), registry.clone());

        let result = self.receive(&dispatcher).await;

        if let Err(e) = &result {
            log::error!("Transport fault: {}", e);
        }

        log::debug!("Shutting down");

        if let Err(e) = arbiter.stop_all().await {
            log::error!("Failed to stop strategy: {}", e);
        }

        for task in &tasks {
            task.abort();
        }

        for task in tasks {
            task.await.ok();
        }

        if let Err(e) = self.transport.disconnect().await {
            log::error!("Failed to disconnect: {}", e);
        }

        if let Err(e) = self.hardware.stop().await {
            log::error!("Failed to stop {}: {}", self.hardware.name(), e);
        }

        log::info!("Shutdown complete");

        result
    }
}
