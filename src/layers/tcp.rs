//! TCP Layer

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::Error;
use crate::layer::Layer;
use crate::registry::Registry;

/// TCP header length
pub const TCP_BASE_HDR_LEN: usize = 20_usize;
/// IANA Assigned protocol number for TCP
pub const IPPROTO_TCP: u8 = 6_u8;

// Register ourselves With IPv4 and IPv6
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.ipv4_protocols.register(IPPROTO_TCP, TCP::creator)?;
    registry.ipv6_next_headers.register(IPPROTO_TCP, TCP::creator)?;

    Ok(())
}

#[derive(Debug, Default, Serialize)]
pub struct TCP {
    src_port: u16,
    dst_port: u16,
    seq_no: u32,
    ack_no: u32,
    data_offset: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    flags: u16,
    window_size: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    urgent_ptr: u16,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    options: Vec<u8>,
}

impl TCP {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<TCP>::default()
    }
}

impl Layer for TCP {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        self.src_port = cursor.read_u16(0)?;
        self.dst_port = cursor.read_u16(2)?;
        self.seq_no = cursor.read_u32(4)?;
        self.ack_no = cursor.read_u32(8)?;
        let offset_flags = cursor.read_u16(12)?;
        self.data_offset = (offset_flags >> 12) as u8;
        self.flags = offset_flags & 0x01ff;
        self.window_size = cursor.read_u16(14)?;
        self.checksum = cursor.read_u16(16)?;
        self.urgent_ptr = cursor.read_u16(18)?;

        let header_length = self.data_offset as usize * 4;
        if header_length < TCP_BASE_HDR_LEN {
            return Err(Error::ParseError(format!(
                "TCP data offset {} is less than 5",
                self.data_offset
            )));
        }
        self.options = cursor
            .read_bytes(TCP_BASE_HDR_LEN, header_length - TCP_BASE_HDR_LEN)?
            .into();

        // Nothing to hand over in a bare ACK.
        if cursor.remaining(header_length) == 0 {
            return Ok((None, header_length));
        }

        let app = registry
            .tcp_ports
            .create(self.dst_port)
            .or_else(|| registry.tcp_ports.create(self.src_port));

        Ok((app, header_length))
    }

    fn name(&self) -> &'static str {
        "TCP"
    }

    fn short_name(&self) -> &'static str {
        "tcp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_and_payload() {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(concat!(
            "c35000350000000100000000",
            "6018ffff00000000",
            "020405b4",
            "001d",
        ))
        .unwrap();

        let mut tcp = TCP::default();
        let (next, consumed) = tcp.decode_bytes(&registry, &bytes).unwrap();
        assert_eq!(consumed, 24);
        assert_eq!(next.unwrap().short_name(), "dns_tcp");

        let value = serde_json::to_value(&tcp).unwrap();
        assert_eq!(value.get("flags"), Some(&serde_json::json!("0x0018")));
        assert_eq!(value.get("options"), Some(&serde_json::json!("020405b4")));
    }

    #[test]
    fn bare_ack_has_no_payload() {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode("c3500035000000010000000050100fff00000000").unwrap();

        let mut tcp = TCP::default();
        let (next, consumed) = tcp.decode_bytes(&registry, &bytes).unwrap();
        assert!(next.is_none());
        assert_eq!(consumed, 20);
    }
}
