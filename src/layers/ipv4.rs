//! IPv4 Layer

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::Error;
use crate::layer::Layer;
use crate::registry::Registry;
use crate::types::{IPv4Address, ETHERTYPE_IP};

/// Basic Length of the IPv4 Header when no options are present
pub const IPV4_BASE_HEADER_LENGTH: usize = 20_usize;

// Register ourselves to well-known Layer 2
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.ethertypes.register(ETHERTYPE_IP, IPv4::creator)
}

#[derive(Debug, Default, Serialize)]
pub struct IPv4 {
    version: u8,
    hdr_len: u8,
    tos: u8,
    len: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    id: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    frag_offset: u16,
    ttl: u8,
    proto: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    src_addr: IPv4Address,
    dst_addr: IPv4Address,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    options: Vec<u8>,
}

impl IPv4 {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<IPv4>::default()
    }

    pub fn proto(&self) -> u8 {
        self.proto
    }
}

impl Layer for IPv4 {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        let first = cursor.read_u8(0)?;
        self.version = first >> 4;
        self.hdr_len = first & 0x0f;

        // Length is in 4 octets
        let header_length = self.hdr_len as usize * 4;
        if header_length < IPV4_BASE_HEADER_LENGTH {
            return Err(Error::ParseError(format!(
                "IPv4 header length {} is less than {}",
                header_length, IPV4_BASE_HEADER_LENGTH
            )));
        }
        let _ = cursor.read_bytes(0, header_length)?;

        self.tos = cursor.read_u8(1)?;
        self.len = cursor.read_u16(2)?;
        self.id = cursor.read_u16(4)?;
        let flags_offset = cursor.read_u16(6)?;
        self.flags = (flags_offset >> 13) as u8;
        self.frag_offset = flags_offset & 0x1fff;
        self.ttl = cursor.read_u8(8)?;
        self.proto = cursor.read_u8(9)?;
        self.checksum = cursor.read_u16(10)?;
        self.src_addr = cursor.read_array::<4>(12)?.into();
        self.dst_addr = cursor.read_array::<4>(16)?.into();
        self.options = cursor
            .read_bytes(
                IPV4_BASE_HEADER_LENGTH,
                header_length - IPV4_BASE_HEADER_LENGTH,
            )?
            .into();

        // Only the first fragment carries the transport header.
        if self.frag_offset != 0 {
            return Ok((None, header_length));
        }

        Ok((registry.ipv4_protocols.create(self.proto), header_length))
    }

    fn name(&self) -> &'static str {
        "IPv4"
    }

    fn short_name(&self) -> &'static str {
        "ip"
    }
}
