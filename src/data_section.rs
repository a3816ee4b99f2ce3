//! Data section decoding for MaxMind DB files
//!
//! Decodes the self-describing value encoding used both for records in the
//! data section and for the metadata trailer.
//!
//! # Supported Types
//!
//! - **Pointer** (1): resolved in place to the value it references
//! - **String** (2): UTF-8 text data
//! - **Double** (3): 64-bit floating point (IEEE 754)
//! - **Bytes** (4): Raw byte arrays
//! - **Uint16** (5) / **Uint32** (6): unsigned integers
//! - **Map** (7): Key-value pairs (string keys, on-disk order kept)
//! - **Int32** (8): Signed 32-bit integers
//! - **Uint64** (9) / **Uint128** (10): unsigned integers
//! - **Array** (11): Ordered lists of values
//! - **Data cache container** (12) and **end marker** (13): never valid as values
//! - **Bool** (14): value lives in the size field
//! - **Float** (15): 32-bit floating point (IEEE 754)
//!
//! # Format
//!
//! A control byte carries the type in its top 3 bits and a size in its low 5
//! bits. Type 0 means "extended": the following byte holds `type - 7`.
//! Sizes 29, 30 and 31 pull 1, 2 or 3 more bytes and add 29, 285 or 65821.
//!
//! See: https://maxmind.github.io/MaxMind-DB/

use crate::error::{GeoDbError, Result};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// Maximum nesting of maps, arrays and pointers before a record is rejected
pub const MAX_DEPTH: usize = 256;

const TYPE_EXTENDED: u8 = 0;
const TYPE_POINTER: u8 = 1;
const TYPE_STRING: u8 = 2;
const TYPE_DOUBLE: u8 = 3;
const TYPE_BYTES: u8 = 4;
const TYPE_UINT16: u8 = 5;
const TYPE_UINT32: u8 = 6;
const TYPE_MAP: u8 = 7;
const TYPE_INT32: u8 = 8;
const TYPE_UINT64: u8 = 9;
const TYPE_UINT128: u8 = 10;
const TYPE_ARRAY: u8 = 11;
const TYPE_CONTAINER: u8 = 12;
const TYPE_END_MARKER: u8 = 13;
const TYPE_BOOL: u8 = 14;
const TYPE_FLOAT: u8 = 15;

/// A decoded value from the data section
///
/// Pointers never appear here: the decoder replaces each pointer with the
/// value it references.
#[derive(Debug, Clone, PartialEq)]
pub enum DataValue {
    /// UTF-8 string
    String(String),
    /// IEEE 754 double precision float
    Double(f64),
    /// Raw byte array
    Bytes(Vec<u8>),
    /// Unsigned 16-bit integer
    Uint16(u16),
    /// Unsigned 32-bit integer
    Uint32(u32),
    /// Key-value map in on-disk order
    Map(Vec<(String, DataValue)>),
    /// Signed 32-bit integer
    Int32(i32),
    /// Unsigned 64-bit integer
    Uint64(u64),
    /// Unsigned 128-bit integer
    Uint128(u128),
    /// Array of values
    Array(Vec<DataValue>),
    /// Boolean value
    Bool(bool),
    /// IEEE 754 single precision float
    Float(f32),
}

impl DataValue {
    /// Look up a key in a map value. Returns `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&DataValue> {
        match self {
            DataValue::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Follow a sequence of map keys, e.g. `["country", "names", "en"]`
    pub fn get_path(&self, path: &[&str]) -> Option<&DataValue> {
        path.iter().try_fold(self, |value, key| value.get(key))
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Any unsigned (or non-negative signed) integer that fits in a u64
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            DataValue::Uint16(n) => Some(*n as u64),
            DataValue::Uint32(n) => Some(*n as u64),
            DataValue::Uint64(n) => Some(*n),
            DataValue::Uint128(n) => u64::try_from(*n).ok(),
            DataValue::Int32(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// Any numeric value widened to f64
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Double(d) => Some(*d),
            DataValue::Float(f) => Some(*f as f64),
            DataValue::Int32(n) => Some(*n as f64),
            other => other.as_u64().map(|n| n as f64),
        }
    }

    /// Short type name for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::String(_) => "string",
            DataValue::Double(_) => "double",
            DataValue::Bytes(_) => "bytes",
            DataValue::Uint16(_) => "uint16",
            DataValue::Uint32(_) => "uint32",
            DataValue::Map(_) => "map",
            DataValue::Int32(_) => "int32",
            DataValue::Uint64(_) => "uint64",
            DataValue::Uint128(_) => "uint128",
            DataValue::Array(_) => "array",
            DataValue::Bool(_) => "boolean",
            DataValue::Float(_) => "float",
        }
    }
}

impl Serialize for DataValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            DataValue::String(s) => serializer.serialize_str(s),
            DataValue::Double(d) => serializer.serialize_f64(*d),
            DataValue::Bytes(b) => {
                let mut seq = serializer.serialize_seq(Some(b.len()))?;
                for byte in b {
                    seq.serialize_element(byte)?;
                }
                seq.end()
            }
            DataValue::Uint16(n) => serializer.serialize_u16(*n),
            DataValue::Uint32(n) => serializer.serialize_u32(*n),
            DataValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            DataValue::Int32(n) => serializer.serialize_i32(*n),
            DataValue::Uint64(n) => serializer.serialize_u64(*n),
            DataValue::Uint128(n) => serializer.serialize_u128(*n),
            DataValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DataValue::Bool(b) => serializer.serialize_bool(*b),
            DataValue::Float(f) => serializer.serialize_f32(*f),
        }
    }
}

/// Data section decoder
///
/// Decodes values from an encoded section. Offsets passed to [`decode`] and
/// pointer targets are both relative to the start of `buffer`.
///
/// [`decode`]: DataDecoder::decode
pub struct DataDecoder<'a> {
    buffer: &'a [u8],
}

impl<'a> DataDecoder<'a> {
    /// Create a decoder for a data section (or metadata section)
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// Decode a value at the given offset
    pub fn decode(&self, offset: usize) -> Result<DataValue> {
        let mut cursor = offset;
        self.decode_at(&mut cursor, 0)
    }

    fn decode_at(&self, cursor: &mut usize, depth: usize) -> Result<DataValue> {
        if depth > MAX_DEPTH {
            return Err(GeoDbError::CorruptRecord(format!(
                "Nesting exceeds {} levels",
                MAX_DEPTH
            )));
        }

        let ctrl = self.read_byte(cursor)?;
        if ctrl >> 5 == TYPE_POINTER {
            let target = self.decode_pointer(cursor, ctrl)?;
            return self.decode_pointee(target, depth + 1);
        }

        let type_id = self.read_type(cursor, ctrl)?;
        self.decode_body(cursor, type_id, ctrl & 0x1F, depth)
    }

    /// Decode the value a pointer references. The format never stores a
    /// pointer to a pointer; refusing one also stops self-referencing chains.
    fn decode_pointee(&self, target: usize, depth: usize) -> Result<DataValue> {
        let mut cursor = target;
        let ctrl = self.read_byte(&mut cursor)?;
        if ctrl >> 5 == TYPE_POINTER {
            return Err(GeoDbError::CorruptRecord(format!(
                "Pointer at offset {} references another pointer",
                target
            )));
        }
        let type_id = self.read_type(&mut cursor, ctrl)?;
        self.decode_body(&mut cursor, type_id, ctrl & 0x1F, depth)
    }

    fn read_type(&self, cursor: &mut usize, ctrl: u8) -> Result<u8> {
        let type_id = ctrl >> 5;
        if type_id != TYPE_EXTENDED {
            return Ok(type_id);
        }

        let ext = self.read_byte(cursor)?;
        let type_id = ext as u16 + 7;
        if ext == 0 || type_id > TYPE_FLOAT as u16 {
            return Err(GeoDbError::CorruptRecord(format!(
                "Invalid extended type byte {}",
                ext
            )));
        }
        Ok(type_id as u8)
    }

    fn decode_body(
        &self,
        cursor: &mut usize,
        type_id: u8,
        size_bits: u8,
        depth: usize,
    ) -> Result<DataValue> {
        let size = self.decode_size(cursor, size_bits)?;

        match type_id {
            TYPE_STRING => {
                let bytes = self.take(cursor, size)?;
                let s = std::str::from_utf8(bytes)
                    .map_err(|_| GeoDbError::CorruptRecord("Invalid UTF-8 in string".into()))?;
                Ok(DataValue::String(s.to_string()))
            }
            TYPE_DOUBLE => {
                let bytes = self.take_exact::<8>(cursor, size, "double")?;
                Ok(DataValue::Double(f64::from_be_bytes(bytes)))
            }
            TYPE_BYTES => Ok(DataValue::Bytes(self.take(cursor, size)?.to_vec())),
            TYPE_UINT16 => Ok(DataValue::Uint16(self.read_uint(cursor, size, 2, "uint16")? as u16)),
            TYPE_UINT32 => Ok(DataValue::Uint32(self.read_uint(cursor, size, 4, "uint32")? as u32)),
            TYPE_MAP => self.decode_map(cursor, size, depth),
            // Narrow int32 payloads are not sign-extended
            TYPE_INT32 => Ok(DataValue::Int32(self.read_uint(cursor, size, 4, "int32")? as u32 as i32)),
            TYPE_UINT64 => Ok(DataValue::Uint64(self.read_uint(cursor, size, 8, "uint64")? as u64)),
            TYPE_UINT128 => Ok(DataValue::Uint128(self.read_uint(cursor, size, 16, "uint128")?)),
            TYPE_ARRAY => self.decode_array(cursor, size, depth),
            TYPE_CONTAINER | TYPE_END_MARKER => Err(GeoDbError::CorruptRecord(format!(
                "Type {} is not a value",
                type_id
            ))),
            TYPE_BOOL => match size {
                0 => Ok(DataValue::Bool(false)),
                1 => Ok(DataValue::Bool(true)),
                n => Err(GeoDbError::CorruptRecord(format!("Invalid boolean size {}", n))),
            },
            TYPE_FLOAT => {
                let bytes = self.take_exact::<4>(cursor, size, "float")?;
                Ok(DataValue::Float(f32::from_be_bytes(bytes)))
            }
            _ => Err(GeoDbError::CorruptRecord(format!("Unknown type {}", type_id))),
        }
    }

    /// Pointer payload layout, with SS = bits 3-4 and VVV = bits 0-2 of the
    /// control byte:
    /// - SS=0: 11 bits, VVV + 1 byte
    /// - SS=1: 19 bits, VVV + 2 bytes, plus 2048
    /// - SS=2: 27 bits, VVV + 3 bytes, plus 526336
    /// - SS=3: 32 bits from 4 bytes, VVV ignored
    fn decode_pointer(&self, cursor: &mut usize, ctrl: u8) -> Result<usize> {
        let size_class = (ctrl >> 3) & 0x3;
        let vvv = (ctrl & 0x7) as usize;

        let offset = match size_class {
            0 => {
                let b = self.take(cursor, 1)?;
                (vvv << 8) | b[0] as usize
            }
            1 => {
                let b = self.take(cursor, 2)?;
                ((vvv << 16) | (b[0] as usize) << 8 | b[1] as usize) + 2048
            }
            2 => {
                let b = self.take(cursor, 3)?;
                ((vvv << 24) | (b[0] as usize) << 16 | (b[1] as usize) << 8 | b[2] as usize)
                    + 526_336
            }
            _ => {
                let b = self.take(cursor, 4)?;
                u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize
            }
        };

        Ok(offset)
    }

    fn decode_map(&self, cursor: &mut usize, count: usize, depth: usize) -> Result<DataValue> {
        // Every entry costs at least two bytes, so a bogus count cannot
        // force a large allocation up front
        let mut entries = Vec::with_capacity(count.min(self.remaining(*cursor) / 2));

        for _ in 0..count {
            let key = match self.decode_at(cursor, depth + 1)? {
                DataValue::String(s) => s,
                other => {
                    return Err(GeoDbError::CorruptRecord(format!(
                        "Map key must be a string, found {}",
                        other.type_name()
                    )))
                }
            };
            let value = self.decode_at(cursor, depth + 1)?;
            entries.push((key, value));
        }

        Ok(DataValue::Map(entries))
    }

    fn decode_array(&self, cursor: &mut usize, count: usize, depth: usize) -> Result<DataValue> {
        let mut items = Vec::with_capacity(count.min(self.remaining(*cursor)));

        for _ in 0..count {
            items.push(self.decode_at(cursor, depth + 1)?);
        }

        Ok(DataValue::Array(items))
    }

    fn decode_size(&self, cursor: &mut usize, size_bits: u8) -> Result<usize> {
        match size_bits {
            0..=28 => Ok(size_bits as usize),
            29 => {
                let b = self.take(cursor, 1)?;
                Ok(29 + b[0] as usize)
            }
            30 => {
                let b = self.take(cursor, 2)?;
                Ok(285 + u16::from_be_bytes([b[0], b[1]]) as usize)
            }
            _ => {
                let b = self.take(cursor, 3)?;
                Ok(65_821 + ((b[0] as usize) << 16 | (b[1] as usize) << 8 | b[2] as usize))
            }
        }
    }

    /// Big-endian unsigned integer of `size` bytes, at most `max` bytes wide
    fn read_uint(&self, cursor: &mut usize, size: usize, max: usize, name: &str) -> Result<u128> {
        if size > max {
            return Err(GeoDbError::CorruptRecord(format!(
                "Invalid {} size {} (max {})",
                name, size, max
            )));
        }
        let bytes = self.take(cursor, size)?;
        Ok(bytes.iter().fold(0u128, |acc, &b| (acc << 8) | b as u128))
    }

    fn take_exact<const N: usize>(
        &self,
        cursor: &mut usize,
        size: usize,
        name: &str,
    ) -> Result<[u8; N]> {
        if size != N {
            return Err(GeoDbError::CorruptRecord(format!(
                "Invalid {} size {} (expected {})",
                name, size, N
            )));
        }
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(cursor, N)?);
        Ok(out)
    }

    fn read_byte(&self, cursor: &mut usize) -> Result<u8> {
        Ok(self.take(cursor, 1)?[0])
    }

    fn take(&self, cursor: &mut usize, len: usize) -> Result<&'a [u8]> {
        let end = cursor
            .checked_add(len)
            .filter(|&end| end <= self.buffer.len())
            .ok_or_else(|| {
                GeoDbError::CorruptRecord(format!(
                    "Read of {} bytes at offset {} exceeds section size {}",
                    len,
                    cursor,
                    self.buffer.len()
                ))
            })?;
        let bytes = &self.buffer[*cursor..end];
        *cursor = end;
        Ok(bytes)
    }

    fn remaining(&self, cursor: usize) -> usize {
        self.buffer.len().saturating_sub(cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Result<DataValue> {
        DataDecoder::new(bytes).decode(0)
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(
            decode(&[0x43, b'f', b'o', b'o']).unwrap(),
            DataValue::String("foo".into())
        );
        assert_eq!(decode(&[0xA2, 0x30, 0x39]).unwrap(), DataValue::Uint16(12345));
        assert_eq!(
            decode(&[0xC4, 0xDE, 0xAD, 0xBE, 0xEF]).unwrap(),
            DataValue::Uint32(0xDEADBEEF)
        );
        assert_eq!(
            decode(&[0x04, 0x01, 0xFF, 0xFF, 0xFF, 0xD6]).unwrap(),
            DataValue::Int32(-42)
        );
        assert_eq!(decode(&[0x01, 0x07]).unwrap(), DataValue::Bool(true));
        assert_eq!(decode(&[0x00, 0x07]).unwrap(), DataValue::Bool(false));

        let mut double = vec![0x68];
        double.extend_from_slice(&(-97.0f64).to_be_bytes());
        assert_eq!(decode(&double).unwrap(), DataValue::Double(-97.0));

        let mut float = vec![0x04, 0x08];
        float.extend_from_slice(&1.5f32.to_be_bytes());
        assert_eq!(decode(&float).unwrap(), DataValue::Float(1.5));
    }

    #[test]
    fn test_zero_length_numbers_are_zero() {
        assert_eq!(decode(&[0xA0]).unwrap(), DataValue::Uint16(0));
        assert_eq!(decode(&[0xC0]).unwrap(), DataValue::Uint32(0));
        assert_eq!(decode(&[0x00, 0x02]).unwrap(), DataValue::Uint64(0));
        assert_eq!(decode(&[0x00, 0x03]).unwrap(), DataValue::Uint128(0));
        assert_eq!(decode(&[0x00, 0x01]).unwrap(), DataValue::Int32(0));
    }

    #[test]
    fn test_short_int32_not_sign_extended() {
        assert_eq!(decode(&[0x01, 0x01, 0xFF]).unwrap(), DataValue::Int32(255));
    }

    #[test]
    fn test_oversized_numbers_rejected() {
        assert!(matches!(
            decode(&[0xA3, 0, 0, 0]),
            Err(GeoDbError::CorruptRecord(_))
        ));
        assert!(matches!(
            decode(&[0x09, 0x02, 0, 0, 0, 0, 0, 0, 0, 0, 0]),
            Err(GeoDbError::CorruptRecord(_))
        ));
        // double must be exactly 8 bytes
        assert!(matches!(
            decode(&[0x64, 0, 0, 0, 0]),
            Err(GeoDbError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_map_preserves_order() {
        // {"b": 1, "a": 2}
        let bytes = [0xE2, 0x41, b'b', 0xA1, 0x01, 0x41, b'a', 0xA1, 0x02];
        let value = decode(&bytes).unwrap();
        assert_eq!(
            value,
            DataValue::Map(vec![
                ("b".into(), DataValue::Uint16(1)),
                ("a".into(), DataValue::Uint16(2)),
            ])
        );
        assert_eq!(value.get("a"), Some(&DataValue::Uint16(2)));
        assert_eq!(value.get("missing"), None);
    }

    #[test]
    fn test_array_of_mixed_values() {
        // [ "x", true ]
        let bytes = [0x02, 0x04, 0x41, b'x', 0x01, 0x07];
        assert_eq!(
            decode(&bytes).unwrap(),
            DataValue::Array(vec![DataValue::String("x".into()), DataValue::Bool(true)])
        );
    }

    #[test]
    fn test_pointer_resolves_to_target() {
        // offset 0: "en"; offset 3: map {"lang": ptr(0)}
        let bytes = [
            0x42, b'e', b'n', 0xE1, 0x44, b'l', b'a', b'n', b'g', 0x20, 0x00,
        ];
        let value = DataDecoder::new(&bytes).decode(3).unwrap();
        assert_eq!(value.get("lang").and_then(DataValue::as_str), Some("en"));
    }

    #[test]
    fn test_pointer_size_classes() {
        let cases: [(&[u8], usize); 4] = [
            (&[0x27, 0xFF], 0x7FF),
            (&[0x28, 0x00, 0x00], 2048),
            (&[0x30, 0x00, 0x00, 0x00], 526_336),
            (&[0x38, 0x00, 0x01, 0x00, 0x00], 0x10000),
        ];
        for (bytes, expected) in cases {
            let decoder = DataDecoder::new(bytes);
            let mut cursor = 1;
            assert_eq!(decoder.decode_pointer(&mut cursor, bytes[0]).unwrap(), expected);
            assert_eq!(cursor, bytes.len());
        }
    }

    #[test]
    fn test_pointer_to_pointer_rejected() {
        // offset 0 points at itself
        let bytes = [0x20, 0x00];
        assert!(matches!(decode(&bytes), Err(GeoDbError::CorruptRecord(_))));
    }

    #[test]
    fn test_self_referencing_map_hits_depth_limit() {
        // map of one entry whose value points back at the map itself
        let bytes = [0xE1, 0x41, b'k', 0x20, 0x00];
        assert!(matches!(decode(&bytes), Err(GeoDbError::CorruptRecord(_))));
    }

    #[test]
    fn test_deep_nesting_rejected() {
        // MAX_DEPTH + 2 nested single-element arrays
        let mut bytes = Vec::new();
        for _ in 0..MAX_DEPTH + 2 {
            bytes.extend_from_slice(&[0x01, 0x04]);
        }
        bytes.push(0xA0);
        assert!(matches!(decode(&bytes), Err(GeoDbError::CorruptRecord(_))));
    }

    #[test]
    fn test_truncated_input_rejected() {
        assert!(decode(&[]).is_err());
        assert!(decode(&[0x45, b'a']).is_err());
        assert!(decode(&[0x5D]).is_err());
        assert!(decode(&[0x00]).is_err());
    }

    #[test]
    fn test_container_and_end_marker_rejected() {
        assert!(matches!(decode(&[0x00, 0x05]), Err(GeoDbError::CorruptRecord(_))));
        assert!(matches!(decode(&[0x00, 0x06]), Err(GeoDbError::CorruptRecord(_))));
        assert!(matches!(decode(&[0x00, 0x09]), Err(GeoDbError::CorruptRecord(_))));
    }

    #[test]
    fn test_serialize_to_json() {
        let value = DataValue::Map(vec![
            ("iso_code".into(), DataValue::String("US".into())),
            ("geoname_id".into(), DataValue::Uint32(6252001)),
        ]);
        assert_eq!(
            serde_json::to_string(&value).unwrap(),
            r#"{"iso_code":"US","geoname_id":6252001}"#
        );
    }
}
