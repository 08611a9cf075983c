//! Host-side bridge to USB CAN adapters.
//!
//! usbcan turns typed values into CAN frame payloads and moves those frames
//! over the adapter's serial link.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte channels, serial device discovery (serial behind the `serial` feature)
//! - [`codec`]: typed payload codec and per-ID payload layouts
//! - [`frame`]: 2-byte header + DLC-sized payload framing, `CanBus`
//!
//! ```
//! use usbcan::codec::{DataType, TypedValue};
//! use usbcan::frame::CanBus;
//! use usbcan::transport::MemoryChannel;
//!
//! let mut bus = CanBus::new(MemoryChannel::loopback());
//! let types = [DataType::Float, DataType::Float];
//! bus.send_values(20, &types, &[TypedValue::Float(3.5), TypedValue::Float(-1.0)])
//!     .unwrap();
//!
//! let (frame, values) = bus.receive_values(&types).unwrap();
//! assert_eq!(frame.id, 20);
//! assert_eq!(values[0], TypedValue::Float(3.5));
//! ```

/// Re-export transport types.
pub mod transport {
    pub use usbcan_transport::*;
}

/// Re-export typed codec types.
pub mod codec {
    pub use usbcan_codec::*;
}

/// Re-export frame types.
pub mod frame {
    pub use usbcan_frame::*;
}
