use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

/// Largest value a [`DataType::UInt24`] can hold.
pub const UINT24_MAX: u32 = (1 << 24) - 1;

/// Primitive wire type of one value inside a frame payload.
///
/// Every type is encoded little-endian at a fixed width; see [`DataType::byte_len`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Empty,
    UInt8,
    Int8,
    UInt16,
    Int16,
    UInt32,
    Int32,
    UInt64,
    Int64,
    /// IEEE 754 binary32.
    Float,
    /// IEEE 754 binary64.
    Double,
    /// Unsigned 24-bit integer, three bytes little-endian.
    UInt24,
}

impl DataType {
    /// Every type, in wire tag order.
    pub const ALL: [DataType; 12] = [
        DataType::Empty,
        DataType::UInt8,
        DataType::Int8,
        DataType::UInt16,
        DataType::Int16,
        DataType::UInt32,
        DataType::Int32,
        DataType::UInt64,
        DataType::Int64,
        DataType::Float,
        DataType::Double,
        DataType::UInt24,
    ];

    /// Encoded size in bytes.
    pub const fn byte_len(self) -> usize {
        match self {
            DataType::Empty => 0,
            DataType::UInt8 | DataType::Int8 => 1,
            DataType::UInt16 | DataType::Int16 => 2,
            DataType::UInt24 => 3,
            DataType::UInt32 | DataType::Int32 | DataType::Float => 4,
            DataType::UInt64 | DataType::Int64 | DataType::Double => 8,
        }
    }

    /// Short name used in layout files and on the command line.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Empty => "empty",
            DataType::UInt8 => "u8",
            DataType::Int8 => "i8",
            DataType::UInt16 => "u16",
            DataType::Int16 => "i16",
            DataType::UInt32 => "u32",
            DataType::Int32 => "i32",
            DataType::UInt64 => "u64",
            DataType::Int64 => "i64",
            DataType::Float => "f32",
            DataType::Double => "f64",
            DataType::UInt24 => "u24",
        }
    }

    /// True for the two floating point types.
    pub const fn is_float(self) -> bool {
        matches!(self, DataType::Float | DataType::Double)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "empty" | "none" => DataType::Empty,
            "u8" | "uint8" => DataType::UInt8,
            "i8" | "int8" => DataType::Int8,
            "u16" | "uint16" => DataType::UInt16,
            "i16" | "int16" => DataType::Int16,
            "u24" | "uint24" => DataType::UInt24,
            "u32" | "uint32" => DataType::UInt32,
            "i32" | "int32" => DataType::Int32,
            "u64" | "uint64" => DataType::UInt64,
            "i64" | "int64" => DataType::Int64,
            "f32" | "float" => DataType::Float,
            "f64" | "double" => DataType::Double,
            _ => return Err(CodecError::UnknownType(s.to_string())),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for DataType {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.name().to_string()
    }
}

/// A decoded value; the active variant names its [`DataType`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Empty,
    UInt8(u8),
    Int8(i8),
    UInt16(u16),
    Int16(i16),
    UInt32(u32),
    Int32(i32),
    UInt64(u64),
    Int64(i64),
    Float(f32),
    Double(f64),
    /// Holds `0..=UINT24_MAX` when decoded; larger values fail to pack.
    UInt24(u32),
}

impl TypedValue {
    /// The wire type this value carries.
    pub const fn data_type(&self) -> DataType {
        match self {
            TypedValue::Empty => DataType::Empty,
            TypedValue::UInt8(_) => DataType::UInt8,
            TypedValue::Int8(_) => DataType::Int8,
            TypedValue::UInt16(_) => DataType::UInt16,
            TypedValue::Int16(_) => DataType::Int16,
            TypedValue::UInt32(_) => DataType::UInt32,
            TypedValue::Int32(_) => DataType::Int32,
            TypedValue::UInt64(_) => DataType::UInt64,
            TypedValue::Int64(_) => DataType::Int64,
            TypedValue::Float(_) => DataType::Float,
            TypedValue::Double(_) => DataType::Double,
            TypedValue::UInt24(_) => DataType::UInt24,
        }
    }

    /// The value as a wide integer, for integer variants.
    pub fn as_integer(&self) -> Option<i128> {
        match *self {
            TypedValue::UInt8(v) => Some(v.into()),
            TypedValue::Int8(v) => Some(v.into()),
            TypedValue::UInt16(v) => Some(v.into()),
            TypedValue::Int16(v) => Some(v.into()),
            TypedValue::UInt32(v) | TypedValue::UInt24(v) => Some(v.into()),
            TypedValue::Int32(v) => Some(v.into()),
            TypedValue::UInt64(v) => Some(v.into()),
            TypedValue::Int64(v) => Some(v.into()),
            TypedValue::Empty | TypedValue::Float(_) | TypedValue::Double(_) => None,
        }
    }

    /// The value as `f64`, for every numeric variant.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            TypedValue::Float(v) => Some(v.into()),
            TypedValue::Double(v) => Some(v),
            TypedValue::Empty => None,
            _ => self.as_integer().map(|v| v as f64),
        }
    }

    /// Parse text as a value of type `ty`.
    ///
    /// Integers accept decimal or `0x`-prefixed hex and must fit the type.
    pub fn parse(ty: DataType, input: &str) -> Result<Self> {
        let text = input.trim();
        let invalid = || CodecError::InvalidValue {
            ty,
            input: input.to_string(),
        };

        if ty == DataType::Empty {
            return if text.is_empty() || text.eq_ignore_ascii_case("empty") {
                Ok(TypedValue::Empty)
            } else {
                Err(invalid())
            };
        }

        if ty.is_float() {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            return TypedValue::Double(value)
                .convert_to(ty)
                .ok_or_else(invalid);
        }

        let value = parse_integer(text).ok_or_else(invalid)?;
        integer_into(ty, value).ok_or_else(invalid)
    }

    /// Convert to `ty`, checking that the value fits.
    ///
    /// Integers convert to any integer type they fit in and to either float
    /// type. Floats convert between float widths but never to integers.
    /// Returns `None` when the value cannot be represented.
    pub fn convert_to(self, ty: DataType) -> Option<TypedValue> {
        if let Some(value) = self.as_integer() {
            return integer_into(ty, value);
        }

        match (ty, self) {
            (DataType::Empty, TypedValue::Empty) => Some(TypedValue::Empty),
            (DataType::Float, TypedValue::Float(v)) => Some(TypedValue::Float(v)),
            (DataType::Float, TypedValue::Double(v)) => {
                if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                    None
                } else {
                    Some(TypedValue::Float(v as f32))
                }
            }
            (DataType::Double, TypedValue::Float(v)) => Some(TypedValue::Double(v.into())),
            (DataType::Double, TypedValue::Double(v)) => Some(TypedValue::Double(v)),
            _ => None,
        }
    }
}

fn integer_into(ty: DataType, value: i128) -> Option<TypedValue> {
    match ty {
        DataType::Empty => None,
        DataType::UInt8 => u8::try_from(value).ok().map(TypedValue::UInt8),
        DataType::Int8 => i8::try_from(value).ok().map(TypedValue::Int8),
        DataType::UInt16 => u16::try_from(value).ok().map(TypedValue::UInt16),
        DataType::Int16 => i16::try_from(value).ok().map(TypedValue::Int16),
        DataType::UInt24 => u32::try_from(value)
            .ok()
            .filter(|v| *v <= UINT24_MAX)
            .map(TypedValue::UInt24),
        DataType::UInt32 => u32::try_from(value).ok().map(TypedValue::UInt32),
        DataType::Int32 => i32::try_from(value).ok().map(TypedValue::Int32),
        DataType::UInt64 => u64::try_from(value).ok().map(TypedValue::UInt64),
        DataType::Int64 => i64::try_from(value).ok().map(TypedValue::Int64),
        DataType::Float => Some(TypedValue::Float(value as f32)),
        DataType::Double => Some(TypedValue::Double(value as f64)),
    }
}

fn parse_integer(text: &str) -> Option<i128> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    // The std parsers take their own sign; only the one stripped above is allowed.
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) if hex.starts_with(|c: char| c.is_ascii_hexdigit()) => {
            i128::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if digits.starts_with(|c: char| c.is_ascii_digit()) => digits.parse::<i128>().ok()?,
        None => return None,
    };
    Some(if negative { -magnitude } else { magnitude })
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Empty => f.write_str("empty"),
            TypedValue::UInt8(v) => write!(f, "{v}"),
            TypedValue::Int8(v) => write!(f, "{v}"),
            TypedValue::UInt16(v) => write!(f, "{v}"),
            TypedValue::Int16(v) => write!(f, "{v}"),
            TypedValue::UInt32(v) | TypedValue::UInt24(v) => write!(f, "{v}"),
            TypedValue::Int32(v) => write!(f, "{v}"),
            TypedValue::UInt64(v) => write!(f, "{v}"),
            TypedValue::Int64(v) => write!(f, "{v}"),
            TypedValue::Float(v) => write!(f, "{v}"),
            TypedValue::Double(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for TypedValue {
                fn from(value: $ty) -> Self {
                    TypedValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_primitive! {
    u8 => UInt8,
    i8 => Int8,
    u16 => UInt16,
    i16 => Int16,
    u32 => UInt32,
    i32 => Int32,
    u64 => UInt64,
    i64 => Int64,
    f32 => Float,
    f64 => Double,
}
