use usbcan_transport::{PortInfo, PortLister, SerialPortLister};

use crate::cmd::PortsArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_ports, OutputFormat};

pub fn run(args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let ports = mark_selected(&SerialPortLister, &args)?;
    print_ports(&ports, format);
    Ok(SUCCESS)
}

/// List ports, flagging the one the device flags would open.
fn mark_selected(lister: &dyn PortLister, args: &PortsArgs) -> CliResult<Vec<(PortInfo, bool)>> {
    let selector = args.device.selector();
    let ports = lister
        .list_ports()
        .map_err(|err| transport_error("port enumeration failed", err))?;

    let chosen = ports
        .iter()
        .filter(|port| selector.matches(port))
        .nth(selector.index)
        .map(|port| port.name.clone());

    Ok(ports
        .into_iter()
        .map(|port| {
            let selected = chosen.as_deref() == Some(port.name.as_str());
            (port, selected)
        })
        .collect())
}
