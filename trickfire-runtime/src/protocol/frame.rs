use bytes::{Buf, BufMut, BytesMut};

use crate::core::DriveValues;

use super::{AUTO_PACKET_1, DRIVE_PACKET};

pub enum FrameError {
    FrameTooSmall,
    Truncated {
        message: i32,
        expected: usize,
        got: usize,
    },
    ExcessivePayloadLength(usize),
}

impl std::error::Error for FrameError {}

impl std::fmt::Debug for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::FrameTooSmall => write!(f, "FrameTooSmall"),
            Self::Truncated {
                message,
                expected,
                got,
            } => write!(f, "Truncated({}, {}, {})", message, expected, got),
            Self::ExcessivePayloadLength(len) => write!(f, "ExcessivePayloadLength({})", len),
        }
    }
}

impl std::fmt::Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::FrameTooSmall => write!(f, "frame too small"),
            Self::Truncated {
                message,
                expected,
                got,
            } => write!(
                f,
                "truncated payload for type {}: expected {} bytes, got {}",
                message, expected, got
            ),
            Self::ExcessivePayloadLength(len) => write!(f, "excessive payload length: {}", len),
        }
    }
}

/// Inbound control packet.
///
/// Every packet starts with a discriminant. The payload following the
/// discriminant depends on its value. Discriminants which are not known to
/// this runtime are valid packets without payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Packet {
    /// Drive parameter update for manual control.
    Drive(DriveValues),
    /// Autonomous mode select.
    AutoSelect,
    /// Unrecognized discriminant.
    Unknown(i32),
}

impl Packet {
    const DRIVE_PAYLOAD_SIZE: usize = 2 * std::mem::size_of::<f64>();

    /// Packet discriminant.
    pub fn message(&self) -> i32 {
        match self {
            Self::Drive(_) => DRIVE_PACKET,
            Self::AutoSelect => AUTO_PACKET_1,
            Self::Unknown(message) => *message,
        }
    }

    /// Convert packet to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf =
            BytesMut::with_capacity(std::mem::size_of::<i32>() + Self::DRIVE_PAYLOAD_SIZE);

        buf.put_i32(self.message());

        if let Self::Drive(values) = self {
            buf.put_f64(values.forward);
            buf.put_f64(values.rotation);
        }

        buf.to_vec()
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = FrameError;

    fn try_from(mut buffer: &[u8]) -> std::result::Result<Self, Self::Error> {
        if buffer.len() < std::mem::size_of::<i32>() {
            Err(FrameError::FrameTooSmall)?
        }

        let message = buffer.get_i32();

        match message {
            DRIVE_PACKET => {
                if buffer.remaining() < Self::DRIVE_PAYLOAD_SIZE {
                    Err(FrameError::Truncated {
                        message,
                        expected: Self::DRIVE_PAYLOAD_SIZE,
                        got: buffer.remaining(),
                    })?
                }

                let forward = buffer.get_f64();
                let rotation = buffer.get_f64();

                Ok(Self::Drive(DriveValues::new(forward, rotation)))
            }
            AUTO_PACKET_1 => Ok(Self::AutoSelect),
            _ => Ok(Self::Unknown(message)),
        }
    }
}

impl std::fmt::Display for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Drive(values) => write!(f, "Drive: {}", values),
            Self::AutoSelect => write!(f, "Auto select"),
            Self::Unknown(message) => write!(f, "Unknown (type {})", message),
        }
    }
}
