use bytes::BytesMut;
use tracing::trace;
use usbcan_transport::ByteChannel;

use crate::codec::{encode_frame, Frame, HEADER_SIZE};
use crate::dlc::MAX_DATA_LEN;
use crate::error::Result;

/// Writes complete frames to a byte channel.
pub struct FrameWriter<C> {
    inner: C,
    buf: BytesMut,
}

impl<C: ByteChannel> FrameWriter<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(HEADER_SIZE + MAX_DATA_LEN),
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send(frame.id, frame.data.as_ref(), frame.dlc_index)
    }

    /// Validate, encode and send one frame.
    pub fn send(&mut self, id: u16, data: &[u8], dlc_index: u8) -> Result<()> {
        write_frame_to(&mut self.inner, &mut self.buf, id, data, dlc_index)
    }

    /// Borrow the underlying channel.
    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    /// Mutably borrow the underlying channel.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    /// Consume the writer and return the inner channel.
    pub fn into_inner(self) -> C {
        self.inner
    }
}

// Header and payload go out in one write so a failed send never leaves a
// bare header on the link.
pub(crate) fn write_frame_to<C: ByteChannel + ?Sized>(
    channel: &mut C,
    buf: &mut BytesMut,
    id: u16,
    data: &[u8],
    dlc_index: u8,
) -> Result<()> {
    buf.clear();
    encode_frame(id, data, dlc_index, buf)?;
    channel.write_all(&buf[..])?;
    trace!(id, dlc_index, len = data.len(), "frame sent");
    Ok(())
}
