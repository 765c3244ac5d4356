//! MPL Control Message (RFC 7731 Section 11.2)

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layers::dns::rdata::RecordReader;

/// Width in octets of the seed identifier for each value of the S field.
fn seed_id_length(s: u8) -> usize {
    match s {
        0 => 0,
        1 => 2,
        2 => 8,
        _ => 16,
    }
}

/// Sequence numbers of the buffered messages named by `bitmask`.
///
/// Bit `i`, counting from the most significant bit of the first octet, stands for
/// `min_seqno + i` in sequence number space.
pub fn buffered_sequence_numbers(min_seqno: u8, bitmask: &[u8]) -> Vec<u8> {
    let mut seqnos = vec![];
    for (i, octet) in bitmask.iter().enumerate() {
        for bit in 0..8 {
            if octet & (0x80 >> bit) != 0 {
                seqnos.push(min_seqno.wrapping_add((i * 8 + bit) as u8));
            }
        }
    }

    seqnos
}

#[derive(Debug, Serialize)]
pub struct SeedInfo {
    min_seqno: u8,
    bm_len: u8,
    seed_id_length: u8,
    #[serde(skip_serializing_if = "String::is_empty")]
    seed_id: String,
    #[serde(serialize_with = "hex::serde::serialize")]
    bitmask: Vec<u8>,
    buffered: Vec<u8>,
}

impl SeedInfo {
    pub fn buffered(&self) -> &[u8] {
        &self.buffered
    }

    fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let min_seqno = reader.read_u8()?;
        let len_s = reader.read_u8()?;
        let bm_len = len_s >> 2;
        let id_len = seed_id_length(len_s & 0x03);

        let seed_id = hex::encode(reader.read_bytes(id_len)?);
        let bitmask = reader.read_bytes(bm_len as usize)?;

        Ok(Self {
            min_seqno,
            bm_len,
            seed_id_length: id_len as u8,
            seed_id,
            buffered: buffered_sequence_numbers(min_seqno, bitmask),
            bitmask: bitmask.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct MPLControl {
    seeds: Vec<SeedInfo>,
}

impl MPLControl {
    pub fn seeds(&self) -> &[SeedInfo] {
        &self.seeds
    }

    /// A seed entry running past the message is noted and ends the walk.
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let mut seeds = vec![];

        while !reader.is_empty() {
            if reader.remaining() < 2 {
                reader.note(Note::MalformedField(
                    "truncated MPL seed info".to_string(),
                ));
                reader.skip(reader.remaining())?;
                break;
            }

            let needed = match reader.peek_rest()? {
                [_, len_s, ..] => 2 + seed_id_length(len_s & 0x03) + (len_s >> 2) as usize,
                _ => 2,
            };
            if needed > reader.remaining() {
                reader.note(Note::MalformedField(format!(
                    "MPL seed info needs {} bytes, {} left",
                    needed,
                    reader.remaining()
                )));
                reader.skip(reader.remaining())?;
                break;
            }

            seeds.push(SeedInfo::from_reader(reader)?);
        }

        Ok(Self { seeds })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::layer::Layer;
    use crate::layers::icmpv6::ICMPv6;
    use crate::registry::Registry;

    fn decode(bytes: &str) -> serde_json::Value {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(bytes).unwrap();

        let mut icmpv6 = ICMPv6::default();
        let (_, consumed) = icmpv6.decode_bytes(&registry, &bytes).unwrap();
        assert_eq!(consumed, bytes.len());

        serde_json::to_value(&icmpv6).unwrap()
    }

    #[test]
    fn bitmask_wraps_sequence_space() {
        assert_eq!(buffered_sequence_numbers(10, &[0xa0]), vec![10, 12]);
        assert_eq!(buffered_sequence_numbers(254, &[0xe0]), vec![254, 255, 0]);
        assert_eq!(buffered_sequence_numbers(0, &[0x00, 0x01]), vec![15]);
        assert!(buffered_sequence_numbers(7, &[]).is_empty());
    }

    #[test]
    fn seed_info_entries() {
        let value = decode(concat!(
            "9f000000",
            // min 254, bm_len 1, S 1, seed 0x0001, bitmask 1110 0000
            "fe05",
            "0001",
            "e0",
            // min 3, bm_len 0, S 0
            "0300",
        ));
        let seeds = value["seeds"].as_array().unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(
            seeds[0],
            json!({
                "min_seqno": 254,
                "bm_len": 1,
                "seed_id_length": 2,
                "seed_id": "0001",
                "bitmask": "e0",
                "buffered": [254, 255, 0],
            })
        );
        assert_eq!(seeds[1]["seed_id_length"], json!(0));
        assert_eq!(seeds[1]["buffered"], json!([]));
    }

    #[test]
    fn truncated_seed_info_is_noted() {
        let value = decode(concat!("9f000000", "0107", "20010db8"));
        assert!(value["seeds"].as_array().unwrap().is_empty());
        assert_eq!(value["notes"][0]["kind"], json!("malformed_field"));
    }
}
