use bytes::{Bytes, BytesMut};
use tracing::{trace, warn};
use usbcan_transport::{ByteChannel, TransportError};

use crate::codec::{decode_header, Frame, FrameConfig, HEADER_SIZE};
use crate::dlc::dlc_size;
use crate::error::{FrameError, Result};

/// Reads complete frames from a byte channel.
///
/// Each frame takes two exact reads: the header, then the payload the header
/// announces. Callers always get complete frames.
pub struct FrameReader<C> {
    inner: C,
    config: FrameConfig,
}

impl<C: ByteChannel> FrameReader<C> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            config: FrameConfig::default(),
        }
    }

    /// Create a frame reader and apply the read timeout from `config`.
    pub fn with_config(mut inner: C, config: FrameConfig) -> Result<Self> {
        inner.set_read_timeout(config.read_timeout)?;
        Ok(Self { inner, config })
    }

    /// Read the next complete frame (blocking).
    pub fn read_frame(&mut self) -> Result<Frame> {
        read_frame_from(&mut self.inner)
    }

    /// Borrow the underlying channel.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the underlying channel.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Consume the reader and return the inner channel.
    pub fn into_inner(self) -> C {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

pub(crate) fn read_frame_from<C: ByteChannel + ?Sized>(channel: &mut C) -> Result<Frame> {
    let mut header = [0u8; HEADER_SIZE];
    channel.read_exact(&mut header)?;

    let raw = u16::from_le_bytes(header);
    let (id, dlc_index) = decode_header(raw)
        .inspect_err(|err| warn!(header = raw, %err, "rejected frame header"))?;
    let len = dlc_size(dlc_index).unwrap_or(0);

    let data = if len == 0 {
        Bytes::new()
    } else {
        let mut payload = BytesMut::zeroed(len);
        channel.read_exact(&mut payload).map_err(|err| match err {
            TransportError::Timeout(timeout) => {
                warn!(id, dlc_index, ?timeout, "timed out inside frame");
                FrameError::IncompleteFrame {
                    id,
                    dlc_index,
                    timeout,
                }
            }
            other => FrameError::Transport(other),
        })?;
        payload.freeze()
    };

    trace!(id, dlc_index, len, "frame received");
    Ok(Frame {
        id,
        dlc_index,
        data,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use bytes::BytesMut;
    use usbcan_transport::{IoChannel, MemoryChannel};

    use super::*;
    use crate::codec::encode_frame;
    use crate::writer::FrameWriter;

    fn reader_over(bytes: Vec<u8>) -> FrameReader<IoChannel<Cursor<Vec<u8>>>> {
        FrameReader::new(IoChannel::new(Cursor::new(bytes)))
    }

    #[test]
    fn read_single_frame() {
        let mut wire = BytesMut::new();
        encode_frame(13, &[1, 2, 3, 6, 10], 5, &mut wire).unwrap();

        let mut reader = reader_over(wire.to_vec());
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.id, 13);
        assert_eq!(frame.dlc_index, 5);
        assert_eq!(frame.data.as_ref(), &[1, 2, 3, 6, 10]);
    }

    #[test]
    fn read_multiple_frames() {
        let mut wire = BytesMut::new();
        encode_frame(1, b"one", 3, &mut wire).unwrap();
        encode_frame(2, &[], 0, &mut wire).unwrap();
        encode_frame(3, &[0x55; 64], 15, &mut wire).unwrap();

        let mut reader = reader_over(wire.to_vec());

        let f1 = reader.read_frame().unwrap();
        let f2 = reader.read_frame().unwrap();
        let f3 = reader.read_frame().unwrap();

        assert_eq!((f1.id, f1.data.as_ref()), (1, b"one".as_ref()));
        assert_eq!((f2.id, f2.data.len()), (2, 0));
        assert_eq!((f3.id, f3.data.as_ref()), (3, &[0x55; 64][..]));
    }

    #[test]
    fn closed_before_header() {
        let mut reader = reader_over(Vec::new());
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ChannelClosed)
        ));
    }

    #[test]
    fn closed_mid_payload() {
        let mut wire = BytesMut::new();
        encode_frame(4, &[9; 8], 8, &mut wire).unwrap();
        wire.truncate(HEADER_SIZE + 3);

        let mut reader = reader_over(wire.to_vec());
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::ChannelClosed)
        ));
    }

    #[test]
    fn reserved_bit_in_stream_is_invalid_dlc() {
        let mut reader = reader_over(vec![0x01, 0x80, 0xAA]);
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(err, FrameError::InvalidDlcIndex(16)));
    }

    #[test]
    fn roundtrip_over_memory_pair() {
        let (left, right) = MemoryChannel::pair();
        let mut writer = FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.send(0x7FF, &[1, 2, 3, 4], 4).unwrap();
        let frame = reader.read_frame().unwrap();

        assert_eq!(frame.id, 0x7FF);
        assert_eq!(frame.data.as_ref(), &[1, 2, 3, 4]);
    }

    #[test]
    fn concurrent_reader_writer_threads() {
        let (left, right) = MemoryChannel::pair();
        let mut writer = FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        let reader_thread = std::thread::spawn(move || {
            for expected in 0..64u16 {
                let frame = reader.read_frame().unwrap();
                assert_eq!(frame.id, expected);
                assert_eq!(frame.dlc_index, 2);
                assert_eq!(frame.data.as_ref(), &expected.to_le_bytes());
            }
        });

        for i in 0..64u16 {
            writer.send(i, &i.to_le_bytes(), 2).unwrap();
        }

        reader_thread.join().unwrap();
    }

    #[test]
    fn config_timeout_applies_to_channel() {
        let (_left, right) = MemoryChannel::pair();
        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(20)),
        };
        let mut reader = FrameReader::with_config(right, config).unwrap();
        assert_eq!(
            reader.config().read_timeout,
            Some(Duration::from_millis(20))
        );

        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Transport(TransportError::Timeout(_))
        ));
    }

    #[test]
    fn timeout_after_header_is_incomplete_frame() {
        let (mut left, right) = MemoryChannel::pair();
        left.write_all(&[0x05, 0x08]).unwrap();

        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(20)),
        };
        let mut reader = FrameReader::with_config(right, config).unwrap();
        let err = reader.read_frame().unwrap_err();
        assert!(matches!(
            err,
            FrameError::IncompleteFrame {
                id: 5,
                dlc_index: 1,
                ..
            }
        ));
    }

    #[test]
    fn timeout_inside_header_keeps_the_byte() {
        let (mut left, right) = MemoryChannel::pair();
        left.write_all(&[0x05]).unwrap();

        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(20)),
        };
        let mut reader = FrameReader::with_config(right, config).unwrap();
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::Transport(TransportError::Timeout(_)))
        ));

        left.write_all(&[0x08, 0xAA]).unwrap();
        let frame = reader.read_frame().unwrap();
        assert_eq!((frame.id, frame.data.as_ref()), (5, &[0xAA][..]));
    }

    #[test]
    fn accessors_and_into_inner() {
        let mut reader = FrameReader::new(MemoryChannel::loopback());

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }
}
