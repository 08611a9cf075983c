//! Send one typed frame to the first attached adapter and print replies.
//!
//! Run with:
//!   cargo run -p usbcan --example transmit -- [DEVICE_DESCRIPTION]

use std::time::Duration;

use usbcan::codec::{DataType, TypedValue};
use usbcan::frame::{CanBus, FrameError};
use usbcan::transport::{discover_serial, DeviceSelector, SerialConfig, TransportError};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let selector = match std::env::args().nth(1) {
        Some(description) => DeviceSelector::by_description(description),
        None => DeviceSelector::default(),
    };
    let config = SerialConfig {
        read_timeout: Some(Duration::from_secs(2)),
        ..SerialConfig::default()
    };

    let mut bus = CanBus::new(discover_serial(&selector, &config)?);
    eprintln!("opened adapter matching {selector}");

    bus.send_frame(13, &[1, 2, 3, 6, 10], 5)?;
    bus.send_values(
        20,
        &[DataType::Float, DataType::Float],
        &[TypedValue::Float(2.5), TypedValue::Float(6.44422)],
    )?;

    loop {
        match bus.receive_frame() {
            Ok(frame) => println!("{:#05x} {:02x?}", frame.id, frame.data.as_ref()),
            Err(FrameError::Transport(TransportError::Timeout(_))) => break,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
