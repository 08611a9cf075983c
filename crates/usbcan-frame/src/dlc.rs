//! DLC index to payload length table.
//!
//! Indices 0-8 map to their own value. Indices 9-15 use the CAN FD lengths
//! 12, 16, 20, 24, 32, 48 and 64, so the length is never simply the index.

/// Payload bytes for each DLC index.
pub const DLC_SIZES: [usize; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 12, 16, 20, 24, 32, 48, 64];

/// Highest valid DLC index.
pub const MAX_DLC_INDEX: u8 = 15;

/// Largest payload a frame can carry.
pub const MAX_DATA_LEN: usize = 64;

/// Payload length for a DLC index, or `None` past the table.
pub fn dlc_size(dlc_index: u8) -> Option<usize> {
    DLC_SIZES.get(usize::from(dlc_index)).copied()
}

/// Smallest DLC index whose payload holds `len` bytes.
pub fn dlc_index_for_len(len: usize) -> Option<u8> {
    DLC_SIZES
        .iter()
        .position(|&size| size >= len)
        .and_then(|index| u8::try_from(index).ok())
}

/// Returns true if the DLC index is valid on a classic (non-FD) CAN bus.
pub fn is_classic(dlc_index: u8) -> bool {
    dlc_index <= 8
}
