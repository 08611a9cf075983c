use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::dlc::{dlc_index_for_len, dlc_size, MAX_DATA_LEN};
use crate::error::{FrameError, Result};

/// Frame header: one little-endian u16.
pub const HEADER_SIZE: usize = 2;

/// Highest standard (11-bit) CAN identifier.
pub const MAX_CAN_ID: u16 = 0x07FF;

const DLC_SHIFT: u32 = 11;

/// A CAN frame as carried over the adapter link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// 11-bit CAN identifier.
    pub id: u16,
    /// Index into [`DLC_SIZES`](crate::DLC_SIZES).
    pub dlc_index: u8,
    /// Exactly `DLC_SIZES[dlc_index]` bytes.
    pub data: Bytes,
}

impl Frame {
    /// Create a frame, checking the ID range and that `data` matches the DLC size.
    pub fn new(id: u16, dlc_index: u8, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        validate(id, dlc_index, data.len())?;
        Ok(Self {
            id,
            dlc_index,
            data,
        })
    }

    /// Create a frame from an arbitrary payload, zero-padding it up to the
    /// smallest DLC size that fits.
    pub fn padded(id: u16, payload: &[u8]) -> Result<Self> {
        let dlc_index = dlc_index_for_len(payload.len()).ok_or(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_DATA_LEN,
        })?;
        let size = dlc_size(dlc_index).unwrap_or(MAX_DATA_LEN);

        let mut data = BytesMut::with_capacity(size);
        data.put_slice(payload);
        data.resize(size, 0);
        Self::new(id, dlc_index, data.freeze())
    }

    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.data.len()
    }

    /// Split into `(id, data, dlc_index)`.
    pub fn into_parts(self) -> (u16, Bytes, u8) {
        (self.id, self.data, self.dlc_index)
    }
}

pub(crate) fn validate(id: u16, dlc_index: u8, len: usize) -> Result<()> {
    if id > MAX_CAN_ID {
        return Err(FrameError::InvalidId(id));
    }
    let expected = dlc_size(dlc_index).ok_or(FrameError::InvalidDlcIndex(dlc_index))?;
    if len != expected {
        return Err(FrameError::FrameSizeMismatch {
            dlc_index,
            expected,
            actual: len,
        });
    }
    Ok(())
}

/// Pack an ID and DLC index into a header word. Bit 15 is always zero.
pub fn encode_header(id: u16, dlc_index: u8) -> Result<u16> {
    if id > MAX_CAN_ID {
        return Err(FrameError::InvalidId(id));
    }
    if dlc_size(dlc_index).is_none() {
        return Err(FrameError::InvalidDlcIndex(dlc_index));
    }
    Ok((u16::from(dlc_index) << DLC_SHIFT) | id)
}

/// Split a header word into `(id, dlc_index)`.
///
/// The DLC field is read as everything above bit 10, so a header with the
/// reserved bit 15 set yields an index past the table and is rejected.
pub fn decode_header(header: u16) -> Result<(u16, u8)> {
    let id = header & MAX_CAN_ID;
    let dlc_index = (header >> DLC_SHIFT) as u8;
    if dlc_size(dlc_index).is_none() {
        return Err(FrameError::InvalidDlcIndex(dlc_index));
    }
    Ok((id, dlc_index))
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────────────────────────┬──────────────────────────┐
/// │ Header (2B LE)                 │ Payload                  │
/// │ bit 15: 0                      │ DLC_SIZES[dlc_index]     │
/// │ bits 11-14: DLC index          │ bytes                    │
/// │ bits 0-10: CAN ID              │                          │
/// └────────────────────────────────┴──────────────────────────┘
/// ```
pub fn encode_frame(id: u16, data: &[u8], dlc_index: u8, dst: &mut BytesMut) -> Result<()> {
    validate(id, dlc_index, data.len())?;
    let header = encode_header(id, dlc_index)?;

    dst.reserve(HEADER_SIZE + data.len());
    dst.put_u16_le(header);
    dst.put_slice(data);
    Ok(())
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut) -> Result<Option<Frame>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let header = u16::from_le_bytes([src[0], src[1]]);
    let (id, dlc_index) = decode_header(header)?;
    let payload_len = dlc_size(dlc_index).unwrap_or(0);

    if src.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let data = src.split_to(payload_len).freeze();

    Ok(Some(Frame {
        id,
        dlc_index,
        data,
    }))
}

/// Configuration for frame transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameConfig {
    /// Read timeout applied to the channel. `None` blocks until bytes arrive.
    pub read_timeout: Option<Duration>,
}
