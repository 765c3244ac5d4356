//! SCTP Layer
//!
//! User messages of DATA chunks are handed to the dissector registered for their payload protocol
//! identifier or, failing that, for one of the ports.

use serde::{Serialize, Serializer};

use crate::cursor::ByteCursor;
use crate::errors::Error;
use crate::layer::Layer;
use crate::packet::{decode_chain, serialize_layers};
use crate::registry::Registry;

/// SCTP Protocol Number
pub const IPPROTO_SCTP: u8 = 132_u8;

pub const SCTP_COMMON_HEADER_LENGTH: usize = 12;

pub const SCTP_CHUNK_DATA: u8 = 0;

// Register ourselves With IPv4 and IPv6
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.ipv4_protocols.register(IPPROTO_SCTP, SCTP::creator)?;
    registry.ipv6_next_headers.register(IPPROTO_SCTP, SCTP::creator)?;

    Ok(())
}

#[derive(Debug)]
enum ChunkPayload {
    UnProcessed(Vec<u8>),
    Processed {
        layers: Vec<Box<dyn Layer + Send>>,
        error: Option<String>,
    },
}

impl Serialize for ChunkPayload {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ChunkPayload::UnProcessed(data) => hex::serde::serialize(data, serializer),
            ChunkPayload::Processed { layers, error } => match error {
                None => serialize_layers(layers, serializer),
                Some(error) => {
                    use serde::ser::SerializeMap;

                    let mut map = serializer.serialize_map(Some(layers.len() + 1))?;
                    for layer in layers {
                        map.serialize_entry(layer.short_name(), layer)?;
                    }
                    map.serialize_entry("error", error)?;
                    map.end()
                }
            },
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct DataChunkHeader {
    tsn: u32,
    stream_id: u16,
    stream_seq: u16,
    ppid: u32,
}

#[derive(Debug, Serialize)]
struct SCTPChunk {
    chunk_type: u8,
    chunk_flags: u8,
    chunk_len: u16,
    #[serde(flatten)]
    data: Option<DataChunkHeader>,
    payload: ChunkPayload,
}

#[derive(Debug, Default, Serialize)]
pub struct SCTP {
    src_port: u16,
    dst_port: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
    verification_tag: u32,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
    checksum: u32,
    chunks: Vec<SCTPChunk>,
}

impl SCTP {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<SCTP>::default()
    }

    fn data_chunk_payload(
        &self,
        registry: &Registry,
        header: &DataChunkHeader,
        user_data: &[u8],
    ) -> ChunkPayload {
        let layer = registry
            .sctp_ppids
            .create(header.ppid)
            .or_else(|| registry.sctp_ports.create(self.dst_port))
            .or_else(|| registry.sctp_ports.create(self.src_port));

        match layer {
            None => ChunkPayload::UnProcessed(user_data.into()),
            Some(layer) => {
                let chain = decode_chain(registry, layer, user_data);
                ChunkPayload::Processed {
                    layers: chain.layers,
                    error: chain.error.map(|e| e.to_string()),
                }
            }
        }
    }
}

impl Layer for SCTP {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        self.src_port = cursor.read_u16(0)?;
        self.dst_port = cursor.read_u16(2)?;
        self.verification_tag = cursor.read_u32(4)?;
        self.checksum = cursor.read_u32(8)?;

        let mut start = SCTP_COMMON_HEADER_LENGTH;
        while cursor.remaining(start) >= 4 {
            let chunk_type = cursor.read_u8(start)?;
            let chunk_flags = cursor.read_u8(start + 1)?;
            let chunk_len = cursor.read_u16(start + 2)?;
            if (chunk_len as usize) < 4 {
                return Err(Error::ParseError(format!(
                    "SCTP chunk length {} is less than 4",
                    chunk_len
                )));
            }
            let value = cursor.read_bytes(start + 4, chunk_len as usize - 4)?;

            let (data, payload) = if chunk_type == SCTP_CHUNK_DATA {
                let value = ByteCursor::new(value);
                let header = DataChunkHeader {
                    tsn: value.read_u32(0)?,
                    stream_id: value.read_u16(4)?,
                    stream_seq: value.read_u16(6)?,
                    ppid: value.read_u32(8)?,
                };
                let user_data = value.read_bytes(12, value.remaining(12))?;
                let payload = self.data_chunk_payload(registry, &header, user_data);
                (Some(header), payload)
            } else {
                (None, ChunkPayload::UnProcessed(value.into()))
            };

            self.chunks.push(SCTPChunk {
                chunk_type,
                chunk_flags,
                chunk_len,
                data,
                payload,
            });

            // Chunks are padded to 4 bytes, the last one may not be.
            start = (start + (chunk_len as usize + 3) / 4 * 4).min(bytes.len());
        }

        Ok((None, bytes.len()))
    }

    fn name(&self) -> &'static str {
        "SCTP"
    }

    fn short_name(&self) -> &'static str {
        "sctp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::packet::Packet;
    use crate::types::ENCAP_TYPE_ETH;

    #[test]
    fn test_basic_sctp_decode() {
        let registry = Registry::with_defaults().unwrap();
        let array = hex::decode(
"00005096523a0026cb39f4c00800450000a8da490000fa844bf6585206860aad300d189f0b5add68d33d0f7373ab030000100629beaa0000fa000000000000030028d42b4897000000050000000301000202000000180012000800000a43000600080000045600030028d42b4898000000060000000301000202000000180012000800000a42000600080000045600030028d42b4899000000070000000301000202000000180012000800000fa20006000800000456");
        assert!(array.is_ok());

        let array = array.unwrap();
        let p = Packet::from_bytes(&registry, &array, ENCAP_TYPE_ETH);
        assert!(p.is_ok(), "{:?}", p.err());

        let p = p.unwrap();
        assert!(p.layers.len() == 3, "{:#?}", p);

        let sctp = serde_json::to_value(&p.layers[2]).unwrap();
        let chunks = sctp["chunks"].as_array().unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0]["chunk_type"], serde_json::json!(3));
        assert_eq!(chunks[1]["ppid"], serde_json::json!(3));
    }

    #[test]
    fn zero_length_chunk_fails() {
        let registry = Registry::new();
        let bytes = hex::decode("0b5a0b5a000000000000000000000000").unwrap();

        let mut sctp = SCTP::default();
        assert!(matches!(
            sctp.decode_bytes(&registry, &bytes),
            Err(Error::ParseError(_))
        ));
    }
}
