use std::fmt::Write as _;
use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use usbcan_codec::{DataType, TypedValue};
use usbcan_frame::{dlc::is_classic, Frame};
use usbcan_transport::PortInfo;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    id: u16,
    dlc_index: u8,
    len: usize,
    fd: bool,
    data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<&'a [TypedValue]>,
    timestamp: String,
}

pub fn print_frame(frame: &Frame, values: Option<&[TypedValue]>, format: OutputFormat) {
    let data = format_hex(frame.data.as_ref());
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                id: frame.id,
                dlc_index: frame.dlc_index,
                len: frame.data.len(),
                fd: !is_classic(frame.dlc_index),
                data,
                values,
                timestamp: now_unix_millis(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["ID", "DLC", "LEN", "DATA", "VALUES"]);
            table.add_row(vec![
                format!("{:#05x}", frame.id),
                frame.dlc_index.to_string(),
                frame.data.len().to_string(),
                data,
                values.map(join_values).unwrap_or_default(),
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut line = format!(
                "{:03x} [{}] {}",
                frame.id,
                frame.data.len(),
                if data.is_empty() { "-" } else { data.as_str() }
            );
            if let Some(values) = values {
                let _ = write!(line, "  => {}", join_values(values));
            }
            println!("{line}");
        }
    }
}

#[derive(Serialize)]
struct PackedOutput<'a> {
    types: Vec<DataType>,
    values: &'a [TypedValue],
    len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    dlc_index: Option<u8>,
    data: String,
}

pub fn print_packed(
    types: &[DataType],
    values: &[TypedValue],
    bytes: &[u8],
    dlc_index: Option<u8>,
    format: OutputFormat,
) {
    let data = format_hex(bytes);
    match format {
        OutputFormat::Json => print_json(&PackedOutput {
            types: types.to_vec(),
            values,
            len: bytes.len(),
            dlc_index,
            data,
        }),
        OutputFormat::Table => {
            let mut table = new_table(vec!["LEN", "DLC", "DATA"]);
            table.add_row(vec![
                bytes.len().to_string(),
                dlc_index.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
                data,
            ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{data}"),
    }
}

#[derive(Serialize)]
struct FieldOutput {
    index: usize,
    #[serde(rename = "type")]
    ty: DataType,
    value: TypedValue,
}

pub fn print_values(types: &[DataType], values: &[TypedValue], format: OutputFormat) {
    let fields: Vec<FieldOutput> = types
        .iter()
        .zip(values)
        .enumerate()
        .map(|(index, (&ty, &value))| FieldOutput { index, ty, value })
        .collect();

    match format {
        OutputFormat::Json => print_json(&fields),
        OutputFormat::Table => {
            let mut table = new_table(vec!["#", "TYPE", "VALUE"]);
            for field in &fields {
                table.add_row(vec![
                    field.index.to_string(),
                    field.ty.to_string(),
                    field.value.to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", join_values(values)),
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    description: Option<&'a str>,
    selected: bool,
}

pub fn print_ports(ports: &[(PortInfo, bool)], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports
                .iter()
                .map(|(port, selected)| PortOutput {
                    name: &port.name,
                    description: port.description.as_deref(),
                    selected: *selected,
                })
                .collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table(vec!["PORT", "DESCRIPTION", "SELECTED"]);
            for (port, selected) in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.description.clone().unwrap_or_default(),
                    if *selected { "*".into() } else { String::new() },
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (port, selected) in ports {
                println!(
                    "{} {}  {}",
                    if *selected { "*" } else { " " },
                    port.name,
                    port.description.as_deref().unwrap_or("-")
                );
            }
        }
    }
}

/// Lowercase hex, bytes separated by single spaces.
pub fn format_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn join_values(values: &[TypedValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn now_unix_millis() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_space_separated() {
        assert_eq!(format_hex(&[0x0d, 0x28, 0xff]), "0d 28 ff");
        assert_eq!(format_hex(&[]), "");
    }

    #[test]
    fn values_join_with_commas() {
        let values = [TypedValue::UInt8(1), TypedValue::Int16(-2), TypedValue::Float(0.5)];
        assert_eq!(join_values(&values), "1, -2, 0.5");
    }

    #[test]
    fn frame_json_skips_missing_values() {
        let frame = Frame::new(13, 1, vec![7]).unwrap();
        let out = FrameOutput {
            id: frame.id,
            dlc_index: frame.dlc_index,
            len: 1,
            fd: false,
            data: format_hex(&frame.data),
            values: None,
            timestamp: "0".into(),
        };
        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["id"], 13);
        assert_eq!(json["data"], "07");
        assert!(json.get("values").is_none());
    }
}
