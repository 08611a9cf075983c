use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::types::{DataType, TypedValue};

/// Total encoded size of `types`.
pub fn packed_len(types: &[DataType]) -> usize {
    types.iter().map(|ty| ty.byte_len()).sum()
}

/// Pack `values` as `types`, in order, into a new buffer.
///
/// Every value is range-checked against its declared type; see
/// [`TypedValue::convert_to`] for which conversions are allowed.
pub fn pack(types: &[DataType], values: &[TypedValue]) -> Result<Bytes> {
    let mut dst = BytesMut::with_capacity(packed_len(types));
    pack_into(types, values, &mut dst)?;
    Ok(dst.freeze())
}

/// Pack `values` as `types`, appending to `dst`.
///
/// On error `dst` is left as it was.
pub fn pack_into(types: &[DataType], values: &[TypedValue], dst: &mut BytesMut) -> Result<()> {
    if types.len() != values.len() {
        return Err(CodecError::CountMismatch {
            types: types.len(),
            values: values.len(),
        });
    }

    let start = dst.len();
    dst.reserve(packed_len(types));

    for (index, (&ty, &value)) in types.iter().zip(values).enumerate() {
        let Some(converted) = value.convert_to(ty) else {
            dst.truncate(start);
            return Err(CodecError::Encoding {
                index,
                ty,
                value: value.to_string(),
            });
        };
        put_value(dst, converted);
    }

    Ok(())
}

/// Unpack one value per entry of `types` from the front of `data`.
///
/// Bytes past the last declared type are ignored.
pub fn unpack(types: &[DataType], data: &[u8]) -> Result<Vec<TypedValue>> {
    let mut src = data;
    let mut values = Vec::with_capacity(types.len());

    for (index, &ty) in types.iter().enumerate() {
        let needed = ty.byte_len();
        if src.remaining() < needed {
            return Err(CodecError::TruncatedBuffer {
                index,
                ty,
                needed,
                remaining: src.remaining(),
            });
        }
        values.push(get_value(&mut src, ty));
    }

    Ok(values)
}

fn put_value(dst: &mut BytesMut, value: TypedValue) {
    match value {
        TypedValue::Empty => {}
        TypedValue::UInt8(v) => dst.put_u8(v),
        TypedValue::Int8(v) => dst.put_i8(v),
        TypedValue::UInt16(v) => dst.put_u16_le(v),
        TypedValue::Int16(v) => dst.put_i16_le(v),
        TypedValue::UInt24(v) => dst.put_uint_le(u64::from(v), 3),
        TypedValue::UInt32(v) => dst.put_u32_le(v),
        TypedValue::Int32(v) => dst.put_i32_le(v),
        TypedValue::UInt64(v) => dst.put_u64_le(v),
        TypedValue::Int64(v) => dst.put_i64_le(v),
        TypedValue::Float(v) => dst.put_f32_le(v),
        TypedValue::Double(v) => dst.put_f64_le(v),
    }
}

// Caller guarantees `src` holds at least `ty.byte_len()` bytes.
fn get_value(src: &mut &[u8], ty: DataType) -> TypedValue {
    match ty {
        DataType::Empty => TypedValue::Empty,
        DataType::UInt8 => TypedValue::UInt8(src.get_u8()),
        DataType::Int8 => TypedValue::Int8(src.get_i8()),
        DataType::UInt16 => TypedValue::UInt16(src.get_u16_le()),
        DataType::Int16 => TypedValue::Int16(src.get_i16_le()),
        DataType::UInt24 => TypedValue::UInt24(src.get_uint_le(3) as u32),
        DataType::UInt32 => TypedValue::UInt32(src.get_u32_le()),
        DataType::Int32 => TypedValue::Int32(src.get_i32_le()),
        DataType::UInt64 => TypedValue::UInt64(src.get_u64_le()),
        DataType::Int64 => TypedValue::Int64(src.get_i64_le()),
        DataType::Float => TypedValue::Float(src.get_f32_le()),
        DataType::Double => TypedValue::Double(src.get_f64_le()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::UINT24_MAX;

    #[test]
    fn uint24_is_three_bytes_little_endian() {
        let bytes = pack(&[DataType::UInt24], &[TypedValue::UInt24(0x123456)]).unwrap();
        assert_eq!(bytes.as_ref(), &[0x56, 0x34, 0x12]);
    }

    #[test]
    fn float_is_binary32_little_endian() {
        let bytes = pack(&[DataType::Float], &[TypedValue::Float(1.0)]).unwrap();
        assert_eq!(bytes.as_ref(), &[0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn double_is_binary64_little_endian() {
        let bytes = pack(&[DataType::Double], &[TypedValue::Double(1.0)]).unwrap();
        assert_eq!(bytes.as_ref(), &[0, 0, 0, 0, 0, 0, 0xF0, 0x3F]);
    }

    #[test]
    fn signed_values_use_twos_complement() {
        let bytes = pack(
            &[DataType::Int8, DataType::Int16, DataType::Int32],
            &[
                TypedValue::Int8(-1),
                TypedValue::Int16(-2),
                TypedValue::Int32(-3),
            ],
        )
        .unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0xFF, 0xFE, 0xFF, 0xFD, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn empty_contributes_no_bytes() {
        let bytes = pack(
            &[DataType::UInt8, DataType::Empty, DataType::UInt8],
            &[TypedValue::UInt8(1), TypedValue::Empty, TypedValue::UInt8(2)],
        )
        .unwrap();
        assert_eq!(bytes.as_ref(), &[1, 2]);
    }

    #[test]
    fn roundtrip_every_type() {
        let types = DataType::ALL;
        let values = [
            TypedValue::Empty,
            TypedValue::UInt8(u8::MAX),
            TypedValue::Int8(i8::MIN),
            TypedValue::UInt16(0xBEEF),
            TypedValue::Int16(-12_345),
            TypedValue::UInt32(0xDEAD_BEEF),
            TypedValue::Int32(i32::MIN),
            TypedValue::UInt64(u64::MAX),
            TypedValue::Int64(-9_876_543_210),
            TypedValue::Float(-3.5),
            TypedValue::Double(6.44422),
            TypedValue::UInt24(UINT24_MAX),
        ];

        let bytes = pack(&types, &values).unwrap();
        assert_eq!(bytes.len(), packed_len(&types));
        assert_eq!(bytes.len(), 45);
        assert_eq!(unpack(&types, &bytes).unwrap(), values.to_vec());
    }

    #[test]
    fn sensor_frame_layout_fills_32_bytes() {
        let mut types = vec![DataType::UInt16];
        types.extend([DataType::UInt24; 6]);
        types.extend([DataType::Int16; 6]);

        let mut values = vec![TypedValue::UInt16(40_960)];
        values.extend((1..=6).map(|i| TypedValue::UInt24(i * 100_000)));
        values.extend((1..=6).map(|i| TypedValue::Int16(-(i as i16) * 1000)));

        let bytes = pack(&types, &values).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(unpack(&types, &bytes).unwrap(), values);
    }

    #[test]
    fn pack_is_deterministic() {
        let types = [DataType::Float, DataType::Float];
        let values = [TypedValue::Float(2.5), TypedValue::Float(6.44422)];
        let first = pack(&types, &values).unwrap();
        let second = pack(&types, &values).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn uint24_overflow_is_encoding_error() {
        let err = pack(&[DataType::UInt24], &[TypedValue::UInt24(0x100_0000)]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::Encoding {
                index: 0,
                ty: DataType::UInt24,
                ..
            }
        ));
    }

    #[test]
    fn integers_are_range_checked_uniformly() {
        assert!(pack(&[DataType::UInt8], &[TypedValue::UInt16(256)]).is_err());
        assert!(pack(&[DataType::Int8], &[TypedValue::Int32(-129)]).is_err());
        assert!(pack(&[DataType::UInt32], &[TypedValue::Int64(-1)]).is_err());

        let ok = pack(&[DataType::Int16], &[TypedValue::Int64(-300)]).unwrap();
        assert_eq!(ok.as_ref(), &(-300i16).to_le_bytes());
    }

    #[test]
    fn float_value_for_integer_type_is_rejected() {
        let err = pack(&[DataType::UInt32], &[TypedValue::Float(1.0)]).unwrap_err();
        assert!(matches!(err, CodecError::Encoding { .. }));
    }

    #[test]
    fn count_mismatch_is_rejected() {
        let err = pack(&[DataType::UInt8, DataType::UInt8], &[TypedValue::UInt8(1)]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::CountMismatch {
                types: 2,
                values: 1
            }
        ));
    }

    #[test]
    fn failed_pack_into_leaves_buffer_untouched() {
        let mut dst = BytesMut::from(&[0xAA][..]);
        let err = pack_into(
            &[DataType::UInt8, DataType::UInt24],
            &[TypedValue::UInt8(1), TypedValue::UInt32(u32::MAX)],
            &mut dst,
        );
        assert!(err.is_err());
        assert_eq!(dst.as_ref(), &[0xAA]);
    }

    #[test]
    fn truncated_buffer_reports_position() {
        let err = unpack(&[DataType::UInt32], &[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedBuffer {
                index: 0,
                ty: DataType::UInt32,
                needed: 4,
                remaining: 2,
            }
        ));
    }

    #[test]
    fn truncation_detected_mid_sequence() {
        let err = unpack(&[DataType::UInt16, DataType::UInt24], &[1, 0, 2, 3]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::TruncatedBuffer {
                index: 1,
                remaining: 2,
                ..
            }
        ));
    }

    #[test]
    fn trailing_padding_is_ignored() {
        let values = unpack(&[DataType::UInt16], &[0x34, 0x12, 0, 0, 0, 0]).unwrap();
        assert_eq!(values, vec![TypedValue::UInt16(0x1234)]);
    }

    #[test]
    fn uint24_decodes_unsigned() {
        let values = unpack(&[DataType::UInt24], &[0xFF, 0xFF, 0xFF]).unwrap();
        assert_eq!(values, vec![TypedValue::UInt24(UINT24_MAX)]);
    }
}
