use std::time::Duration;

use usbcan_codec::CodecError;
use usbcan_transport::TransportError;

/// Errors that can occur during frame encoding, decoding, and transport.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The CAN ID does not fit in 11 bits.
    #[error("CAN ID {0:#x} exceeds 11 bits (max 0x7ff)")]
    InvalidId(u16),

    /// The DLC index is outside the 16-entry DLC table.
    #[error("DLC index {0} is outside the DLC table (0-15)")]
    InvalidDlcIndex(u8),

    /// The payload length disagrees with the declared DLC index.
    #[error("payload is {actual} bytes but DLC index {dlc_index} requires {expected}")]
    FrameSizeMismatch {
        dlc_index: u8,
        expected: usize,
        actual: usize,
    },

    /// The payload exceeds the largest DLC size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// The read timeout elapsed after the header was consumed. The payload
    /// bytes still in flight will be misread as headers, so the link has to
    /// be reopened.
    #[error("timed out after {timeout:?} inside frame {id:#05x} (DLC index {dlc_index}); stream is out of sync")]
    IncompleteFrame {
        id: u16,
        dlc_index: u8,
        timeout: Duration,
    },

    /// The byte channel failed.
    #[error("frame transport error: {0}")]
    Transport(#[from] TransportError),

    /// Typed values could not be packed or unpacked.
    #[error("frame payload error: {0}")]
    Codec(#[from] CodecError),

    /// An I/O error from an async stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
