use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

mod frame;

pub use self::frame::{FrameError, Packet};

/// Drive parameter update discriminant.
///
/// The discriminant is followed by two 64-bit floating point values, the
/// forward and the rotation magnitude.
pub const DRIVE_PACKET: i32 = 1;

/// Autonomous mode select discriminant.
///
/// This discriminant carries no payload.
pub const AUTO_PACKET_1: i32 = 2;

/// The size of the length prefix in front of every frame.
const LENGTH_PREFIX_SIZE: usize = std::mem::size_of::<u32>();

/// The maximum payload size.
///
/// Any frame announcing a larger payload is rejected. The stream cannot be
/// trusted after such a frame, so the connection must be closed.
const MAX_PAYLOAD_SIZE: usize = 1_024;

/// Framed packet stream.
///
/// Each frame is a big-endian length prefix followed by the payload.
pub struct Stream<T> {
    inner: T,
}

impl<T> Stream<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    #[inline]
    pub fn inner_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

impl<T: AsyncWrite + Unpin> Stream<T> {
    pub async fn send_frame(&mut self, payload: &[u8]) -> std::io::Result<()> {
        if payload.len() > MAX_PAYLOAD_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                FrameError::ExcessivePayloadLength(payload.len()),
            ));
        }

        let mut buffer = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
        buffer.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buffer.extend_from_slice(payload);

        self.inner.write_all(&buffer).await
    }

    #[inline]
    pub async fn send_packet(&mut self, packet: &Packet) -> std::io::Result<()> {
        self.send_frame(&packet.to_bytes()).await
    }
}

impl<T: AsyncRead + Unpin> Stream<T> {
    /// Read the next frame payload.
    ///
    /// Returns `None` if the peer closed the stream on a frame boundary.
    pub async fn read_frame(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let payload_length = match self.inner.read_u32().await {
            Ok(length) => length as usize,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e),
        };

        if payload_length > MAX_PAYLOAD_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                FrameError::ExcessivePayloadLength(payload_length),
            ));
        }

        let mut payload = vec![0u8; payload_length];
        self.inner.read_exact(&mut payload).await?;

        Ok(Some(payload))
    }
}
