//! Typed Values
//!
//! Every key in EmberKV holds exactly one [`Value`]. The value is a closed
//! sum type, so the set of data types the store understands is fixed at
//! compile time and every command can name the one variant it operates on.
//!
//! ## Variants
//!
//! ```text
//! ┌──────────┬───────────────────────────┬──────────────────────────┐
//! │ Kind     │ Representation            │ Created by               │
//! ├──────────┼───────────────────────────┼──────────────────────────┤
//! │ String   │ BytesMut (growable bytes) │ SET, APPEND              │
//! │ List     │ VecDeque<Bytes>           │ LPUSH                    │
//! │ Hash     │ HashMap<Bytes, Bytes>     │ HSET                     │
//! │ Set      │ HashSet<Bytes>            │ SADD                     │
//! │ Bitmap   │ Vec<u8> (MSB-first bits)  │ SETBIT                   │
//! └──────────┴───────────────────────────┴──────────────────────────┘
//! ```
//!
//! A bitmap is *not* a string here: a key created by SETBIT rejects APPEND
//! and GET with a WRONGTYPE error, and vice versa.

use bytes::{Bytes, BytesMut};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// The data-type tag of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    List,
    Hash,
    Set,
    Bitmap,
}

impl ValueKind {
    /// Name reported by the TYPE command.
    ///
    /// Bitmaps report `string` for client compatibility even though they are
    /// a separate variant for type checks.
    pub fn type_name(self) -> &'static str {
        match self {
            ValueKind::String | ValueKind::Bitmap => "string",
            ValueKind::List => "list",
            ValueKind::Hash => "hash",
            ValueKind::Set => "set",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Hash => "hash",
            ValueKind::Set => "set",
            ValueKind::Bitmap => "bitmap",
        };
        f.write_str(name)
    }
}

/// A typed payload stored under a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Raw byte string. Never parsed or normalized.
    String(BytesMut),
    /// Ordered list, head at the front.
    List(VecDeque<Bytes>),
    /// Field → value mapping.
    Hash(HashMap<Bytes, Bytes>),
    /// Unordered set of unique members.
    Set(HashSet<Bytes>),
    /// Bit-addressable byte array.
    Bitmap(Vec<u8>),
}

impl Value {
    /// Creates a string value from anything byte-like.
    pub fn string(data: impl AsRef<[u8]>) -> Self {
        Value::String(BytesMut::from(data.as_ref()))
    }

    /// Returns the variant tag.
    #[inline]
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Hash(_) => ValueKind::Hash,
            Value::Set(_) => ValueKind::Set,
            Value::Bitmap(_) => ValueKind::Bitmap,
        }
    }

    /// Creates an empty value of the given kind.
    pub fn empty(kind: ValueKind) -> Self {
        match kind {
            ValueKind::String => Value::String(BytesMut::new()),
            ValueKind::List => Value::List(VecDeque::new()),
            ValueKind::Hash => Value::Hash(HashMap::new()),
            ValueKind::Set => Value::Set(HashSet::new()),
            ValueKind::Bitmap => Value::Bitmap(Vec::new()),
        }
    }

    pub fn as_string(&self) -> Option<&BytesMut> {
        match self {
            Value::String(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_string_mut(&mut self) -> Option<&mut BytesMut> {
        match self {
            Value::String(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut VecDeque<Bytes>> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_hash_mut(&mut self) -> Option<&mut HashMap<Bytes, Bytes>> {
        match self {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    pub fn as_set_mut(&mut self) -> Option<&mut HashSet<Bytes>> {
        match self {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    pub fn as_bitmap(&self) -> Option<&[u8]> {
        match self {
            Value::Bitmap(bits) => Some(bits),
            _ => None,
        }
    }

    pub fn as_bitmap_mut(&mut self) -> Option<&mut Vec<u8>> {
        match self {
            Value::Bitmap(bits) => Some(bits),
            _ => None,
        }
    }
}

/// Reads one bit from a bitmap. Bits past the end read as 0.
///
/// Bit 0 is the most significant bit of byte 0.
pub fn get_bit(bits: &[u8], offset: usize) -> u8 {
    let byte = offset / 8;
    let shift = 7 - (offset % 8);
    bits.get(byte).map(|b| (b >> shift) & 1).unwrap_or(0)
}

/// Writes one bit, growing the bitmap with zero bytes as needed.
///
/// Returns the bit's previous value.
pub fn set_bit(bits: &mut Vec<u8>, offset: usize, on: bool) -> u8 {
    let byte = offset / 8;
    let shift = 7 - (offset % 8);
    if bits.len() <= byte {
        bits.resize(byte + 1, 0);
    }
    let old = (bits[byte] >> shift) & 1;
    if on {
        bits[byte] |= 1 << shift;
    } else {
        bits[byte] &= !(1 << shift);
    }
    old
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(Value::string("x").kind(), ValueKind::String);
        assert_eq!(Value::empty(ValueKind::List).kind(), ValueKind::List);
        assert_eq!(Value::empty(ValueKind::Hash).kind(), ValueKind::Hash);
        assert_eq!(Value::empty(ValueKind::Set).kind(), ValueKind::Set);
        assert_eq!(Value::empty(ValueKind::Bitmap).kind(), ValueKind::Bitmap);
    }

    #[test]
    fn test_accessors_reject_other_variants() {
        let mut value = Value::empty(ValueKind::Bitmap);
        assert!(value.as_string().is_none());
        assert!(value.as_string_mut().is_none());
        assert!(value.as_list_mut().is_none());
        assert!(value.as_bitmap_mut().is_some());
    }

    #[test]
    fn test_type_names() {
        assert_eq!(ValueKind::String.type_name(), "string");
        assert_eq!(ValueKind::Bitmap.type_name(), "string");
        assert_eq!(ValueKind::List.type_name(), "list");
        assert_eq!(ValueKind::Bitmap.to_string(), "bitmap");
    }

    #[test]
    fn test_set_bit_grows_and_reports_old() {
        let mut bits = Vec::new();
        assert_eq!(set_bit(&mut bits, 9, true), 0);
        assert_eq!(bits, vec![0x00, 0x40]);
        assert_eq!(set_bit(&mut bits, 9, true), 1);
        assert_eq!(set_bit(&mut bits, 9, false), 1);
        assert_eq!(bits, vec![0x00, 0x00]);
    }

    #[test]
    fn test_get_bit_msb_first() {
        let bits = [0b1000_0001u8];
        assert_eq!(get_bit(&bits, 0), 1);
        assert_eq!(get_bit(&bits, 1), 0);
        assert_eq!(get_bit(&bits, 7), 1);
        assert_eq!(get_bit(&bits, 100), 0);
    }
}
