mod error;

pub use self::error::Error;

pub type Result<T = ()> = std::result::Result<T, error::Error>;

pub struct RuntimeContext {
    /// Runtime event bus.
    pub(crate) shutdown: (
        tokio::sync::broadcast::Sender<()>,
        tokio::sync::broadcast::Receiver<()>,
    ),
}

impl RuntimeContext {
    pub fn new() -> Self {
        Self {
            shutdown: tokio::sync::broadcast::channel(1),
        }
    }

    /// Listen for shutdown signal.
    pub fn shutdown_signal(&self) -> tokio::sync::broadcast::Receiver<()> {
        self.shutdown.0.subscribe()
    }

    /// Handle to request a runtime shutdown from elsewhere.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(self.shutdown.0.clone())
    }

    /// Request runtime shutdown.
    ///
    /// This method will *not* wait until the runtime has shutdown.
    pub fn shutdown(&self) {
        self.shutdown_handle().shutdown();
    }

    /// Shutdown the runtime on termination signal.
    pub fn enable_term_shutdown(&self) {
        log::debug!("Enable signals shutdown");

        let handle = self.shutdown_handle();

        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for termination signal: {}", e);
                return;
            }

            log::info!("Termination requested");

            handle.shutdown();
        });
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct ShutdownHandle(tokio::sync::broadcast::Sender<()>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        // The context always holds a receiver, sending can only fail once
        // the runtime is gone.
        self.0.send(()).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shutdown_before_subscribe_is_kept() {
        let mut ctx = RuntimeContext::new();

        ctx.shutdown();

        assert!(ctx.shutdown.1.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_shutdown_handle() {
        let ctx = RuntimeContext::new();
        let mut signal = ctx.shutdown_signal();

        ctx.shutdown_handle().shutdown();

        assert!(signal.recv().await.is_ok());
    }
}
