use std::time::Duration;

use tokio::net::TcpStream;

use crate::protocol::Stream;

/// Network transport towards the control station.
///
/// The transport delivers complete frame payloads. It knows nothing about
/// packet semantics.
#[async_trait::async_trait]
pub trait Transport: Send {
    /// Establish the connection.
    async fn connect(&mut self) -> crate::Result;

    /// Receive the next frame payload.
    ///
    /// Returns `None` once the peer has closed the connection.
    async fn recv(&mut self) -> crate::Result<Option<Vec<u8>>>;

    /// Close the connection.
    async fn disconnect(&mut self) -> crate::Result;

    /// Whether the transport is connected.
    fn is_connected(&self) -> bool;
}

/// TCP transport.
pub struct TcpTransport {
    address: String,
    stream: Option<Stream<TcpStream>>,
}

impl TcpTransport {
    pub fn new(address: impl ToString) -> Self {
        Self {
            address: address.to_string(),
            stream: None,
        }
    }
}

#[async_trait::async_trait]
impl Transport for TcpTransport {
    async fn connect(&mut self) -> crate::Result {
        log::debug!("Connecting to {}", self.address);

        let stream = TcpStream::connect(&self.address).await?;

        let sock_ref = socket2::SockRef::from(&stream);

        let mut keep_alive = socket2::TcpKeepalive::new();
        keep_alive = keep_alive.with_time(Duration::from_secs(2));
        keep_alive = keep_alive.with_interval(Duration::from_secs(2));

        sock_ref.set_tcp_keepalive(&keep_alive)?;
        sock_ref.set_nodelay(true)?;

        log::info!("Connected to {}", self.address);

        self.stream = Some(Stream::new(stream));

        Ok(())
    }

    async fn recv(&mut self) -> crate::Result<Option<Vec<u8>>> {
        match &mut self.stream {
            Some(stream) => {
                let frame = stream.read_frame().await?;

                if frame.is_none() {
                    log::debug!("Connection closed by {}", self.address);
                    self.stream = None;
                }

                Ok(frame)
            }
            None => Ok(None),
        }
    }

    async fn disconnect(&mut self) -> crate::Result {
        if let Some(mut stream) = self.stream.take() {
            use tokio::io::AsyncWriteExt;

            stream.inner_mut().shutdown().await?;

            log::debug!("Disconnected from {}", self.address);
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
