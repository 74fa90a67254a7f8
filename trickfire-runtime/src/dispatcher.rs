use std::sync::Arc;

use crate::{arbiter::DriveArbiter, protocol::Packet, strategy::StrategyRegistry};

/// Packet dispatcher.
///
/// Routes decoded packets to the manual strategy or the arbiter. Dispatch
/// never fails, faults are logged and the packet is dropped.
pub struct PacketDispatcher {
    arbiter: Arc<DriveArbiter>,
    registry: Arc<StrategyRegistry>,
}

impl PacketDispatcher {
    pub fn new(arbiter: Arc<DriveArbiter>, registry: Arc<StrategyRegistry>) -> Self {
        Self { arbiter, registry }
    }

    fn decode(payload: &[u8]) -> crate::Result<Packet> {
        Ok(Packet::try_from(payload)?)
    }

    /// Decode and dispatch a frame payload.
    ///
    /// Payloads which cannot be decoded are dropped.
    pub async fn dispatch_frame(&self, payload: &[u8]) {
        match Self::decode(payload) {
            Ok(packet) => self.dispatch(packet).await,
            Err(e) => log::warn!("Protocol error: {}", e),
        }
    }

    /// Dispatch a packet.
    pub async fn dispatch(&self, packet: Packet) {
        match packet {
            Packet::Drive(values) => {
                log::trace!("Received drive packet");

                let manual = self.registry.manual();
                if let Err(e) = manual.set_parameters(values) {
                    log::error!("Failed to update {}: {}", manual.name(), e);
                }
            }
            Packet::AutoSelect => {
                log::trace!("Received auto 1 packet");

                let autonomous = self.registry.autonomous();
                if let Err(e) = self.arbiter.switch_to(autonomous).await {
                    log::error!("Failed to switch to {}: {}", autonomous.name(), e);
                }
            }
            Packet::Unknown(message) => {
                log::debug!("Received unknown packet (type {})", message);
            }
        }
    }
}
