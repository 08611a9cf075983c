use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};
use usbcan_codec::{LayoutError, LayoutRegistry};
use usbcan_frame::{CanBus, Frame, FrameConfig, FrameError};
use usbcan_transport::{ByteChannel, TransportError};

use crate::cmd::ListenArgs;
use crate::exit::{frame_error, layout_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_frame, OutputFormat};

/// How often an idle listener wakes to check for Ctrl-C.
const IDLE_TICK: Duration = Duration::from_millis(250);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let registry = match &args.layouts {
        Some(path) => LayoutRegistry::from_file(path)
            .map_err(|err| layout_error("failed to load layouts", err))?,
        None => LayoutRegistry::new(),
    };

    let config = args.device.serial_config()?;
    let channel = args.device.open()?;
    let mut bus = CanBus::with_config(
        channel,
        FrameConfig {
            read_timeout: Some(config.read_timeout.unwrap_or(IDLE_TICK)),
        },
    )
    .map_err(|err| frame_error("configure failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    info!(layouts = registry.ids().len(), "listening");
    let idle_ok = config.read_timeout.is_none();
    listen_loop(&mut bus, &registry, &args, idle_ok, &running, |frame, values| {
        print_frame(frame, values, format)
    })
}

/// Receive until `count` frames were printed, Ctrl-C, or a fatal error.
///
/// With `idle_ok`, a timeout before any header byte arrived is an idle tick.
/// A timeout inside a frame is always fatal.
fn listen_loop<C, F>(
    bus: &mut CanBus<C>,
    registry: &LayoutRegistry,
    args: &ListenArgs,
    idle_ok: bool,
    running: &AtomicBool,
    mut emit: F,
) -> CliResult<i32>
where
    C: ByteChannel,
    F: FnMut(&Frame, Option<&[usbcan_codec::TypedValue]>),
{
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let frame = match bus.receive_frame() {
            Ok(frame) => frame,
            Err(FrameError::Transport(TransportError::Timeout(_))) if idle_ok => continue,
            Err(err) => return Err(frame_error("receive failed", err)),
        };

        if let Some(ids) = &args.ids {
            if !ids.contains(&frame.id) {
                debug!(id = frame.id, "filtered");
                continue;
            }
        }

        let values = match registry.decode(frame.id, &frame.data) {
            Ok(values) => values,
            Err(LayoutError::Codec(err)) => {
                warn!(id = frame.id, %err, "payload does not match layout");
                None
            }
            Err(err) => return Err(layout_error("decode failed", err)),
        };

        emit(&frame, values.as_deref());
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[cfg(test)]
mod tests {
    use usbcan_codec::{DataType, TypedValue};
    use usbcan_transport::MemoryChannel;

    use super::*;
    use crate::cmd::{DeviceArgs, MatchArg};
    use crate::exit::{FAILURE, TIMEOUT};

    fn args(count: Option<usize>, ids: Option<Vec<u16>>) -> ListenArgs {
        ListenArgs {
            ids,
            count,
            layouts: None,
            device: DeviceArgs {
                device: "usb-can".into(),
                match_by: MatchArg::Description,
                index: 0,
                baud: 115_200,
                read_timeout: None,
            },
        }
    }

    fn collect(
        bus: &mut CanBus<MemoryChannel>,
        registry: &LayoutRegistry,
        args: &ListenArgs,
        idle_ok: bool,
    ) -> (CliResult<i32>, Vec<(u16, Option<Vec<TypedValue>>)>) {
        let running = AtomicBool::new(true);
        let mut seen = Vec::new();
        let result = listen_loop(bus, registry, args, idle_ok, &running, |frame, values| {
            seen.push((frame.id, values.map(<[TypedValue]>::to_vec)));
        });
        (result, seen)
    }

    #[test]
    fn stops_after_count() {
        let mut bus = CanBus::new(MemoryChannel::loopback());
        for id in 1..=3 {
            bus.send_frame(id, &[0], 1).unwrap();
        }

        let registry = LayoutRegistry::new();
        let (result, seen) = collect(&mut bus, &registry, &args(Some(2), None), false);
        assert_eq!(result.unwrap(), SUCCESS);
        assert_eq!(seen, vec![(1, None), (2, None)]);
    }

    #[test]
    fn filters_by_id_and_decodes_layouts() {
        let mut bus = CanBus::new(MemoryChannel::loopback());
        bus.send_frame(7, &[0xFF], 1).unwrap();
        bus.send_values(20, &[DataType::Int16], &[TypedValue::Int16(-2)])
            .unwrap();

        let registry = LayoutRegistry::from_embedded(&[(20, &[DataType::Int16][..])]).unwrap();
        let listen = args(Some(1), Some(vec![20]));
        let (result, seen) = collect(&mut bus, &registry, &listen, false);

        assert_eq!(result.unwrap(), SUCCESS);
        assert_eq!(seen, vec![(20, Some(vec![TypedValue::Int16(-2)]))]);
    }

    #[test]
    fn mismatched_layout_prints_raw() {
        let mut bus = CanBus::new(MemoryChannel::loopback());
        bus.send_frame(20, &[1], 1).unwrap();

        let registry = LayoutRegistry::from_embedded(&[(20, &[DataType::UInt32][..])]).unwrap();
        let (result, seen) = collect(&mut bus, &registry, &args(Some(1), None), false);

        assert_eq!(result.unwrap(), SUCCESS);
        assert_eq!(seen, vec![(20, None)]);
    }

    #[test]
    fn closed_channel_is_failure() {
        let (left, right) = MemoryChannel::pair();
        drop(left);

        let mut bus = CanBus::new(right);
        let (result, _) = collect(&mut bus, &LayoutRegistry::new(), &args(None, None), true);
        assert_eq!(result.unwrap_err().code, FAILURE);
    }

    #[test]
    fn idle_timeout_inside_frame_is_fatal() {
        let (mut left, right) = MemoryChannel::pair();
        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(20)),
        };
        let mut bus = CanBus::with_config(right, config).unwrap();

        // Header for ID 5 / DLC 1; the payload byte never arrives.
        left.write_all(&[0x05, 0x08]).unwrap();

        let listen = args(Some(1), None);
        let (result, seen) = collect(&mut bus, &LayoutRegistry::new(), &listen, true);
        assert_eq!(result.unwrap_err().code, TIMEOUT);
        assert!(seen.is_empty());
    }

    #[test]
    fn idle_tick_inside_header_keeps_framing() {
        let (mut left, right) = MemoryChannel::pair();
        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(20)),
        };
        let mut bus = CanBus::with_config(right, config).unwrap();

        left.write_all(&[0x05]).unwrap();
        let late = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(80));
            left.write_all(&[0x08, 0xAA, 0x06, 0x00]).unwrap();
            left
        });

        let listen = args(Some(2), None);
        let (result, seen) = collect(&mut bus, &LayoutRegistry::new(), &listen, true);
        let _left = late.join().unwrap();

        assert_eq!(result.unwrap(), SUCCESS);
        assert_eq!(seen, vec![(5, None), (6, None)]);
    }

    #[test]
    fn explicit_timeout_is_fatal() {
        let (_left, right) = MemoryChannel::pair();
        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(10)),
        };
        let mut bus = CanBus::with_config(right, config).unwrap();

        let (result, _) = collect(&mut bus, &LayoutRegistry::new(), &args(None, None), false);
        assert_eq!(result.unwrap_err().code, TIMEOUT);
    }
}
