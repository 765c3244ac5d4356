//! RR type bitmaps
//!
//! NSEC, NSEC3 and CSYNC carry the set of types present at a name as a list of windows (RFC 4034
//! Section 4.1.2): a window number, a bitmap length (1 to 32) and the bitmap, where bit `i`
//! (most significant bit first) of a window `w` stands for type `w * 256 + i`. The older NXT record
//! uses a single flat bitmap for types 0 to 127 with no window header (RFC 2535).

use std::collections::BTreeSet;
use std::iter::FromIterator;

use serde::{Serialize, Serializer};

use crate::cursor::ByteCursor;
use crate::errors::{Error, Note};
use crate::layers::dns::types::type_mnemonic;

/// An ordered set of RR types.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TypeBitmap(BTreeSet<u16>);

impl TypeBitmap {
    pub fn contains(&self, t: u16) -> bool {
        self.0.contains(&t)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = u16> + '_ {
        self.0.iter().copied()
    }
}

impl From<BTreeSet<u16>> for TypeBitmap {
    fn from(set: BTreeSet<u16>) -> Self {
        Self(set)
    }
}

impl FromIterator<u16> for TypeBitmap {
    fn from_iter<I: IntoIterator<Item = u16>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for TypeBitmap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter().map(|t| type_mnemonic(*t)))
    }
}

fn collect_bits(types: &mut BTreeSet<u16>, base: u16, bitmap: &[u8]) {
    for (i, byte) in bitmap.iter().enumerate() {
        for bit in 0..8 {
            if byte & (0x80 >> bit) != 0 {
                types.insert(base + (i * 8 + bit) as u16);
            }
        }
    }
}

/// Decode the windowed bitmap in `len` bytes starting at `offset`.
///
/// A window length outside 1 to 32 ends the walk with a note in `notes`, keeping the types
/// collected so far.
pub fn decode_type_bitmap(
    cursor: &ByteCursor,
    offset: usize,
    len: usize,
    notes: &mut Vec<Note>,
) -> Result<TypeBitmap, Error> {
    let mut types = BTreeSet::new();
    let mut offset = offset;
    let mut remaining = len;

    while remaining > 0 {
        if remaining < 2 {
            return Err(Error::TooShort {
                required: 2,
                available: remaining,
                data: hex::encode(cursor.read_bytes(offset, remaining)?),
            });
        }
        let window = cursor.read_u8(offset)?;
        let bitmap_len = cursor.read_u8(offset + 1)? as usize;
        offset += 2;
        remaining -= 2;

        if !(1..=32).contains(&bitmap_len) {
            notes.push(Note::MalformedField(format!(
                "type bitmap window {}: length {}",
                window, bitmap_len
            )));
            break;
        }
        if bitmap_len > remaining {
            return Err(Error::TooShort {
                required: bitmap_len,
                available: remaining,
                data: hex::encode(cursor.read_bytes(offset, remaining)?),
            });
        }

        let bitmap = cursor.read_bytes(offset, bitmap_len)?;
        collect_bits(&mut types, (window as u16) << 8, bitmap);
        offset += bitmap_len;
        remaining -= bitmap_len;
    }

    Ok(TypeBitmap(types))
}

/// Decode the flat bitmap of NXT records: `len` bytes, implicit window 0.
pub fn decode_flat_type_bitmap(
    cursor: &ByteCursor,
    offset: usize,
    len: usize,
) -> Result<TypeBitmap, Error> {
    let mut types = BTreeSet::new();
    collect_bits(&mut types, 0, cursor.read_bytes(offset, len)?);

    Ok(TypeBitmap(types))
}

/// Encode `types` in the windowed form. Windows without any type are left out and each bitmap is
/// as short as its highest type allows.
pub fn encode_type_bitmap(types: &TypeBitmap) -> Vec<u8> {
    let mut out = vec![];
    let mut window: Option<(u8, [u8; 32], usize)> = None;

    let flush = |out: &mut Vec<u8>, window: &Option<(u8, [u8; 32], usize)>| {
        if let Some((number, bitmap, len)) = window {
            out.push(*number);
            out.push(*len as u8);
            out.extend_from_slice(&bitmap[..*len]);
        }
    };

    for t in types.types() {
        let number = (t >> 8) as u8;
        let low = (t & 0xff) as usize;
        match window {
            Some((current, _, _)) if current == number => {}
            _ => {
                flush(&mut out, &window);
                window = Some((number, [0_u8; 32], 0));
            }
        }
        if let Some((_, ref mut bitmap, ref mut len)) = window {
            bitmap[low / 8] |= 0x80 >> (low % 8);
            *len = (*len).max(low / 8 + 1);
        }
    }
    flush(&mut out, &window);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windowed_round_trip() {
        let types: TypeBitmap = [1_u16, 2, 15, 257, 32769].iter().copied().collect();
        let encoded = encode_type_bitmap(&types);
        assert_eq!(hex::encode(&encoded), "00026001010140800140");

        let cursor = ByteCursor::new(&encoded);
        let decoded = decode_type_bitmap(&cursor, 0, encoded.len(), &mut vec![]).unwrap();
        assert_eq!(decoded, types);
    }

    #[test]
    fn rfc4034_example() {
        // host.example.com. NSEC: A MX RRSIG NSEC TYPE1234
        let bytes = hex::decode(
            "0006400100000003041b000000000000000000000000000000000000000000000000000020",
        )
        .unwrap();
        let cursor = ByteCursor::new(&bytes);
        let decoded = decode_type_bitmap(&cursor, 0, bytes.len(), &mut vec![]).unwrap();
        let types: Vec<u16> = decoded.types().collect();
        assert_eq!(types, vec![1, 15, 46, 47, 1234]);
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            serde_json::json!(["A", "MX", "RRSIG", "NSEC", "TYPE1234"])
        );
    }

    #[test]
    fn empty_is_valid() {
        let cursor = ByteCursor::new(&[]);
        assert!(decode_type_bitmap(&cursor, 0, 0, &mut vec![]).unwrap().is_empty());
        assert!(encode_type_bitmap(&TypeBitmap::default()).is_empty());
    }

    #[test]
    fn bad_window_length_stops_the_walk() {
        let mut notes = vec![];
        let bytes = [0x00, 0x01, 0x40, 0x01, 0x00, 0x40];
        let cursor = ByteCursor::new(&bytes);
        let decoded = decode_type_bitmap(&cursor, 0, bytes.len(), &mut notes).unwrap();
        assert_eq!(decoded.types().collect::<Vec<_>>(), vec![1]);
        assert_eq!(
            notes,
            vec![Note::MalformedField(
                "type bitmap window 1: length 0".to_string()
            )]
        );

        let mut notes = vec![];
        let bytes = [0x00, 0x21];
        let cursor = ByteCursor::new(&bytes);
        assert!(decode_type_bitmap(&cursor, 0, 2, &mut notes)
            .unwrap()
            .is_empty());
        assert_eq!(notes.len(), 1);
    }

    #[test]
    fn truncated_window() {
        let bytes = [0x00, 0x04, 0x40, 0x01];
        let cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            decode_type_bitmap(&cursor, 0, 4, &mut vec![]),
            Err(Error::TooShort { .. })
        ));

        let bytes = [0x00];
        let cursor = ByteCursor::new(&bytes);
        assert!(matches!(
            decode_type_bitmap(&cursor, 0, 1, &mut vec![]),
            Err(Error::TooShort { .. })
        ));
    }

    #[test]
    fn flat_bitmap() {
        // NXT: A, SOA, NXT
        let bytes = hex::decode("42000002").unwrap();
        let cursor = ByteCursor::new(&bytes);
        let decoded = decode_flat_type_bitmap(&cursor, 0, bytes.len()).unwrap();
        let types: Vec<u16> = decoded.types().collect();
        assert_eq!(types, vec![1, 6, 30]);
    }
}
