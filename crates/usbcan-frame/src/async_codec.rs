//! `tokio_util` codec for the frame format, for use with `Framed`,
//! `FramedRead` and `FramedWrite` over async serial or socket streams.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame};
use crate::error::FrameError;

/// Stateless codec: every header fully determines the frame length.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanFrameCodec;

impl CanFrameCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for CanFrameCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        decode_frame(src)
    }
}

impl Encoder<Frame> for CanFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(frame.id, &frame.data, frame.dlc_index, dst)
    }
}

impl Encoder<&Frame> for CanFrameCodec {
    type Error = FrameError;

    fn encode(&mut self, frame: &Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(frame.id, &frame.data, frame.dlc_index, dst)
    }
}
