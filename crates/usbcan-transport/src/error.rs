use std::time::Duration;

/// Errors that can occur on a byte channel.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// An I/O error occurred on the underlying stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The channel was closed before the requested bytes arrived.
    #[error("channel closed")]
    ChannelClosed,

    /// No bytes arrived within the configured read timeout.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),

    /// No port matched the device selector.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The host failed to enumerate serial ports.
    #[error("failed to enumerate ports: {0}")]
    Enumerate(String),

    /// The serial port could not be opened.
    #[error("failed to open {port}: {message}")]
    Open { port: String, message: String },
}

pub type Result<T> = std::result::Result<T, TransportError>;
