//! CAN frame transport over a byte channel.
//!
//! Every frame on the wire is:
//! - A 2-byte little-endian header: 11-bit CAN ID in bits 0-10, DLC index in bits 11-14
//! - A payload of exactly `DLC_SIZES[dlc_index]` bytes
//!
//! There is no magic, checksum, or trailer. Payload length comes only from the
//! DLC table, so indices 9-15 carry 12 to 64 bytes (CAN FD lengths).

pub mod bus;
pub mod codec;
pub mod dlc;
pub mod error;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use bus::CanBus;
pub use codec::{
    decode_frame, decode_header, encode_frame, encode_header, Frame, FrameConfig, HEADER_SIZE,
    MAX_CAN_ID,
};
pub use dlc::{dlc_index_for_len, dlc_size, DLC_SIZES, MAX_DATA_LEN, MAX_DLC_INDEX};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::CanFrameCodec;
