use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::pack::{pack, packed_len, unpack};
use crate::types::{DataType, TypedValue};

/// The ordered value types carried by one kind of frame.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    types: Vec<DataType>,
}

impl Layout {
    pub fn new(types: impl Into<Vec<DataType>>) -> Self {
        Self {
            types: types.into(),
        }
    }

    pub fn types(&self) -> &[DataType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Encoded payload size before any DLC padding.
    pub fn packed_len(&self) -> usize {
        packed_len(&self.types)
    }

    pub fn pack(&self, values: &[TypedValue]) -> Result<Bytes> {
        pack(&self.types, values)
    }

    pub fn unpack(&self, data: &[u8]) -> Result<Vec<TypedValue>> {
        unpack(&self.types, data)
    }

    /// Parse one text value per type, e.g. from command-line arguments.
    pub fn parse_values<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<TypedValue>> {
        if inputs.len() != self.types.len() {
            return Err(CodecError::CountMismatch {
                types: self.types.len(),
                values: inputs.len(),
            });
        }
        self.types
            .iter()
            .zip(inputs)
            .map(|(&ty, input)| TypedValue::parse(ty, input.as_ref()))
            .collect()
    }
}

/// Comma-separated type names, e.g. `"u16,u24,f32"`.
impl FromStr for Layout {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        s.split(',')
            .map(str::parse::<DataType>)
            .collect::<Result<Vec<DataType>>>()
            .map(Self::new)
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ty) in self.types.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{ty}")?;
        }
        Ok(())
    }
}

impl From<Vec<DataType>> for Layout {
    fn from(types: Vec<DataType>) -> Self {
        Self::new(types)
    }
}
