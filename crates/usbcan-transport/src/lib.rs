//! Byte channel abstraction for USB CAN adapters.
//!
//! Provides a unified interface over the byte streams a CAN adapter is reached through:
//! - Serial ports (behind the `serial` feature)
//! - Any `Read + Write` stream via [`IoChannel`]
//! - In-memory pipes for tests and demos ([`MemoryChannel`])
//!
//! This is the lowest layer of usbcan. Framing builds on top of the
//! [`ByteChannel`] trait provided here.

pub mod discovery;
pub mod error;
pub mod memory;
pub mod traits;

#[cfg(feature = "serial")]
pub mod serial;

pub use discovery::{DeviceSelector, MatchBy, PortInfo, PortLister, DEFAULT_DEVICE};
pub use error::{Result, TransportError};
pub use memory::MemoryChannel;
pub use traits::{ByteChannel, IoChannel};

#[cfg(feature = "serial")]
pub use serial::{discover_serial, open_serial, SerialChannel, SerialConfig, SerialPortLister};
