use tracing::info;
use usbcan_frame::{CanBus, Frame};

use crate::cmd::{parse_hex, SendArgs};
use crate::exit::{codec_error, frame_error, CliResult, SUCCESS};

/// What goes into the frame, resolved from the command line.
#[derive(Debug)]
enum Payload {
    Frame(Frame),
    Typed {
        types: usbcan_codec::Layout,
        values: Vec<usbcan_codec::TypedValue>,
    },
}

pub fn run(args: SendArgs) -> CliResult<i32> {
    // Validate everything before touching the device.
    let payload = resolve_payload(&args)?;

    let channel = args.device.open()?;
    let mut bus = CanBus::new(channel);

    match payload {
        Payload::Frame(frame) => {
            bus.write_frame(&frame)
                .map_err(|err| frame_error("send failed", err))?;
            info!(id = frame.id, dlc_index = frame.dlc_index, "frame sent");
        }
        Payload::Typed { types, values } => {
            let dlc_index = bus
                .send_values(args.id, types.types(), &values)
                .map_err(|err| frame_error("send failed", err))?;
            info!(id = args.id, dlc_index, layout = %types, "typed frame sent");
        }
    }

    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Payload> {
    if let Some(types) = &args.types {
        let values = types
            .parse_values(&args.values)
            .map_err(|err| codec_error("invalid values", err))?;
        return Ok(Payload::Typed {
            types: types.clone(),
            values,
        });
    }

    let data = parse_hex(args.data.as_deref().unwrap_or_default())?;
    let frame = match args.dlc {
        Some(dlc_index) => Frame::new(args.id, dlc_index, data),
        None => Frame::padded(args.id, &data),
    }
    .map_err(|err| frame_error("invalid frame", err))?;
    Ok(Payload::Frame(frame))
}
