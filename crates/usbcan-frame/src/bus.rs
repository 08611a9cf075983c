use bytes::BytesMut;
use tracing::debug;
use usbcan_codec::{pack_into, unpack, DataType, TypedValue};
use usbcan_transport::ByteChannel;

use crate::codec::{Frame, FrameConfig, HEADER_SIZE};
use crate::dlc::{dlc_index_for_len, dlc_size, MAX_DATA_LEN};
use crate::error::{FrameError, Result};
use crate::reader::read_frame_from;
use crate::writer::write_frame_to;

/// A CAN bus endpoint over one exclusively owned byte channel.
///
/// Sends and receives on the same channel; `&mut self` on every operation
/// keeps header and payload of a frame contiguous on the link.
///
/// ```
/// use usbcan_frame::CanBus;
/// use usbcan_transport::MemoryChannel;
///
/// let mut bus = CanBus::new(MemoryChannel::loopback());
/// bus.send_frame(13, &[1, 2, 3, 6, 10], 5).unwrap();
///
/// let frame = bus.receive_frame().unwrap();
/// assert_eq!((frame.id, frame.dlc_index), (13, 5));
/// ```
pub struct CanBus<C> {
    channel: C,
    buf: BytesMut,
    config: FrameConfig,
}

impl<C: ByteChannel> CanBus<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            buf: BytesMut::with_capacity(HEADER_SIZE + MAX_DATA_LEN),
            config: FrameConfig::default(),
        }
    }

    /// Create a bus and apply the read timeout from `config` to the channel.
    pub fn with_config(mut channel: C, config: FrameConfig) -> Result<Self> {
        channel.set_read_timeout(config.read_timeout)?;
        Ok(Self {
            channel,
            buf: BytesMut::with_capacity(HEADER_SIZE + MAX_DATA_LEN),
            config,
        })
    }

    /// Transmit one frame.
    ///
    /// `data` must be exactly `DLC_SIZES[dlc_index]` bytes. Nothing is written
    /// when validation fails.
    pub fn send_frame(&mut self, id: u16, data: &[u8], dlc_index: u8) -> Result<()> {
        write_frame_to(&mut self.channel, &mut self.buf, id, data, dlc_index)
    }

    /// Transmit an already-validated frame.
    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.send_frame(frame.id, frame.data.as_ref(), frame.dlc_index)
    }

    /// Block until one complete frame has arrived.
    pub fn receive_frame(&mut self) -> Result<Frame> {
        read_frame_from(&mut self.channel)
    }

    /// Pack `values` as `types`, pad to the smallest DLC size that fits and
    /// transmit. Returns the DLC index used.
    pub fn send_values(
        &mut self,
        id: u16,
        types: &[DataType],
        values: &[TypedValue],
    ) -> Result<u8> {
        let mut payload = BytesMut::with_capacity(MAX_DATA_LEN);
        pack_into(types, values, &mut payload)?;

        let dlc_index = dlc_index_for_len(payload.len()).ok_or(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_DATA_LEN,
        })?;
        payload.resize(dlc_size(dlc_index).unwrap_or(MAX_DATA_LEN), 0);

        debug!(id, dlc_index, packed = values.len(), "sending typed frame");
        self.send_frame(id, &payload, dlc_index)?;
        Ok(dlc_index)
    }

    /// Receive one frame and unpack its payload as `types`.
    ///
    /// Padding past the last declared type is ignored.
    pub fn receive_values(&mut self, types: &[DataType]) -> Result<(Frame, Vec<TypedValue>)> {
        let frame = self.receive_frame()?;
        let values = unpack(types, &frame.data)?;
        Ok((frame, values))
    }

    /// Borrow the underlying channel.
    pub fn get_ref(&self) -> &C {
        &self.channel
    }

    /// Mutably borrow the underlying channel.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Release the channel. Dropping the bus releases it too.
    pub fn into_inner(self) -> C {
        self.channel
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
