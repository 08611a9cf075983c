use crate::types::DataType;

/// Errors that can occur while packing or unpacking typed values.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A value cannot be represented in its declared type.
    #[error("value {value} at position {index} does not fit {ty}")]
    Encoding {
        index: usize,
        ty: DataType,
        value: String,
    },

    /// The buffer ran out before every declared type was decoded.
    #[error("buffer truncated at position {index}: {ty} needs {needed} bytes, {remaining} remaining")]
    TruncatedBuffer {
        index: usize,
        ty: DataType,
        needed: usize,
        remaining: usize,
    },

    /// The number of values does not match the number of types.
    #[error("{types} types but {values} values")]
    CountMismatch { types: usize, values: usize },

    /// A type name was not recognized.
    #[error("unknown data type: {0:?}")]
    UnknownType(String),

    /// Text could not be parsed as a value of the given type.
    #[error("invalid {ty} value: {input:?}")]
    InvalidValue { ty: DataType, input: String },
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while loading or applying payload layouts.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    /// The layout file could not be loaded.
    #[error("failed to load layouts: {0}")]
    LoadFailed(String),

    /// The layout document is not valid JSON or has the wrong shape.
    #[error("layout document is not valid: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A layout key is not a standard 11-bit CAN ID.
    #[error("invalid CAN ID in layout document: {0:?}")]
    InvalidId(String),

    /// No layout registered for the given CAN ID.
    #[error("no layout registered for CAN ID {0:#05x}")]
    NoLayout(u16),

    /// The payload did not match its layout.
    #[error(transparent)]
    Codec(#[from] CodecError),
}
