//! Typed frames over an in-memory link, no hardware needed.
//!
//! Run with:
//!   cargo run -p usbcan --example loopback

use std::thread;

use usbcan::codec::{DataType, LayoutRegistry, TypedValue};
use usbcan::frame::CanBus;
use usbcan::transport::MemoryChannel;

const SENSOR_ID: u16 = 0x001;
const SETPOINT_ID: u16 = 0x014;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = LayoutRegistry::from_json_str(
        r#"{
            "layouts": {
                "0x001": ["u16", "u24", "u24", "u24", "u24", "u24", "u24",
                          "i16", "i16", "i16", "i16", "i16", "i16"],
                "0x014": ["f32", "f32"]
            }
        }"#,
    )?;

    let (host, device) = MemoryChannel::pair();

    // Stand-in for the adapter: echo every frame back.
    let echo = thread::spawn(move || -> usbcan::frame::Result<()> {
        let mut bus = CanBus::new(device);
        for _ in 0..2 {
            let frame = bus.receive_frame()?;
            bus.write_frame(&frame)?;
        }
        Ok(())
    });

    let mut bus = CanBus::new(host);

    let sensor = registry.layout(SENSOR_ID).ok_or("missing sensor layout")?;
    let mut reading = vec![TypedValue::UInt16(40_960)];
    reading.extend((1..=6).map(|i| TypedValue::UInt24(i * 100_000)));
    reading.extend((1..=6).map(|i| TypedValue::Int16(-(i as i16) * 1000)));
    let dlc = bus.send_values(SENSOR_ID, sensor.types(), &reading)?;
    eprintln!("sent sensor frame with DLC index {dlc}");

    bus.send_values(
        SETPOINT_ID,
        &[DataType::Float, DataType::Float],
        &[TypedValue::Float(2.5), TypedValue::Float(6.44422)],
    )?;

    for _ in 0..2 {
        let frame = bus.receive_frame()?;
        let values = registry.decode(frame.id, &frame.data)?.unwrap_or_default();
        println!("{:#05x} [{}] {values:?}", frame.id, frame.data.len());
    }

    echo.join().map_err(|_| "echo thread panicked")??;
    Ok(())
}
