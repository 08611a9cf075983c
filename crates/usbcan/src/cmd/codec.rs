use usbcan_frame::{dlc_index_for_len, dlc_size, MAX_DATA_LEN};

use crate::cmd::{parse_hex, PackArgs, UnpackArgs};
use crate::exit::{codec_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_packed, print_values, OutputFormat};

pub fn pack(args: PackArgs, format: OutputFormat) -> CliResult<i32> {
    let values = args
        .types
        .parse_values(&args.values)
        .map_err(|err| codec_error("invalid values", err))?;
    let packed = args
        .types
        .pack(&values)
        .map_err(|err| codec_error("pack failed", err))?;

    let (bytes, dlc_index) = if args.pad {
        let (padded, dlc_index) = pad_to_dlc(&packed)?;
        (padded, Some(dlc_index))
    } else {
        (packed.to_vec(), None)
    };

    print_packed(args.types.types(), &values, &bytes, dlc_index, format);
    Ok(SUCCESS)
}

pub fn unpack(args: UnpackArgs, format: OutputFormat) -> CliResult<i32> {
    let data = parse_hex(&args.hex)?;
    let values = args
        .types
        .unpack(&data)
        .map_err(|err| codec_error("unpack failed", err))?;

    print_values(args.types.types(), &values, format);
    Ok(SUCCESS)
}

fn pad_to_dlc(packed: &[u8]) -> CliResult<(Vec<u8>, u8)> {
    let dlc_index = dlc_index_for_len(packed.len()).ok_or_else(|| {
        CliError::new(
            DATA_INVALID,
            format!(
                "packed payload is {} bytes, larger than a frame ({MAX_DATA_LEN})",
                packed.len()
            ),
        )
    })?;

    let mut padded = packed.to_vec();
    padded.resize(dlc_size(dlc_index).unwrap_or(MAX_DATA_LEN), 0);
    Ok((padded, dlc_index))
}
