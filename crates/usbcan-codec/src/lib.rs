//! Typed payload codec for CAN frame data.
//!
//! Packs ordered sequences of primitive values into the exact little-endian
//! byte layout the adapter firmware uses, and unpacks them again:
//! - Fixed-width integers (8/16/32/64 bit, signed and unsigned)
//! - A 3-byte unsigned integer ([`DataType::UInt24`])
//! - IEEE 754 binary32 and binary64 floats
//!
//! Layouts describing which types a given CAN ID carries can be loaded from
//! JSON into a [`LayoutRegistry`].

pub mod config;
pub mod error;
pub mod layout;
pub mod pack;
pub mod registry;
pub mod types;

pub use config::LayoutConfig;
pub use error::{CodecError, LayoutError, Result};
pub use layout::Layout;
pub use pack::{pack, pack_into, packed_len, unpack};
pub use registry::LayoutRegistry;
pub use types::{DataType, TypedValue, UINT24_MAX};
