use std::{error, fmt, io};

use crate::protocol::FrameError;

#[derive(Debug)]
pub enum Error {
    /// Strategy was started while it was already running.
    AlreadyRunning(&'static str),
    /// Operation is not supported by the strategy.
    Unsupported(&'static str),
    /// Strategy failed to start or stop.
    Strategy {
        name: &'static str,
        reason: String,
    },
    /// Hardware I/O fault.
    Hardware(String),
    /// Network transport fault.
    Transport(io::Error),
    /// Malformed packet.
    Frame(FrameError),
    /// Invalid configuration.
    Config(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::AlreadyRunning(name) => write!(f, "strategy '{}' is already running", name),
            Error::Unsupported(name) => {
                write!(f, "operation not supported by strategy '{}'", name)
            }
            Error::Strategy { name, reason } => write!(f, "strategy '{}': {}", name, reason),
            Error::Hardware(reason) => write!(f, "hardware: {}", reason),
            Error::Transport(e) => write!(f, "transport: {}", e),
            Error::Frame(e) => write!(f, "frame: {}", e),
            Error::Config(reason) => write!(f, "config: {}", reason),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Transport(e) => Some(e),
            Error::Frame(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Transport(e)
    }
}

impl From<FrameError> for Error {
    fn from(e: FrameError) -> Self {
        Error::Frame(e)
    }
}
