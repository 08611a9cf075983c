use std::fmt;
use std::io;

use usbcan_codec::{CodecError, LayoutError};
use usbcan_frame::FrameError;
use usbcan_transport::TransportError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(USAGE, message)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::BrokenPipe => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Io(source) => io_error(context, source),
        TransportError::Timeout(_) => CliError::new(TIMEOUT, format!("{context}: {err}")),
        TransportError::ChannelClosed => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn codec_error(context: &str, err: CodecError) -> CliError {
    CliError::new(DATA_INVALID, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Transport(err) => transport_error(context, err),
        FrameError::Codec(err) => codec_error(context, err),
        FrameError::Io(source) => io_error(context, source),
        FrameError::IncompleteFrame { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn layout_error(context: &str, err: LayoutError) -> CliError {
    match err {
        LayoutError::LoadFailed(_) => CliError::new(FAILURE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn transport_errors_map_to_codes() {
        assert_eq!(
            transport_error("x", TransportError::Timeout(Duration::from_millis(5))).code,
            TIMEOUT
        );
        assert_eq!(
            transport_error("x", TransportError::DeviceNotFound("usb-can".into())).code,
            TRANSPORT_ERROR
        );
        assert_eq!(
            transport_error("x", TransportError::ChannelClosed).code,
            FAILURE
        );
        assert_eq!(
            transport_error(
                "x",
                TransportError::Io(io::Error::from(io::ErrorKind::PermissionDenied))
            )
            .code,
            PERMISSION_DENIED
        );
    }

    #[test]
    fn frame_errors_unwrap_sources() {
        let err = frame_error(
            "receive failed",
            FrameError::Transport(TransportError::Timeout(Duration::from_secs(1))),
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("receive failed: "));

        assert_eq!(frame_error("x", FrameError::InvalidDlcIndex(16)).code, DATA_INVALID);
        assert_eq!(
            frame_error(
                "x",
                FrameError::IncompleteFrame {
                    id: 5,
                    dlc_index: 1,
                    timeout: Duration::from_millis(20),
                }
            )
            .code,
            TIMEOUT
        );
        assert_eq!(
            frame_error(
                "x",
                FrameError::Codec(CodecError::CountMismatch {
                    types: 1,
                    values: 2
                })
            )
            .code,
            DATA_INVALID
        );
    }

    #[test]
    fn layout_load_failure_is_generic_failure() {
        assert_eq!(
            layout_error("x", LayoutError::LoadFailed("missing".into())).code,
            FAILURE
        );
        assert_eq!(layout_error("x", LayoutError::NoLayout(3)).code, DATA_INVALID);
    }
}
