//! UDP Layer

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::Error;
use crate::layer::Layer;
use crate::registry::Registry;

/// UDP header length
pub const UDP_HDR_LEN: usize = 8_usize;
/// IANA Assigned protocol number for UDP
pub const IPPROTO_UDP: u8 = 17_u8;

// Register UDP with Protocol Handler in IPv4 and IPv6
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.ipv4_protocols.register(IPPROTO_UDP, UDP::creator)?;
    registry.ipv6_next_headers.register(IPPROTO_UDP, UDP::creator)?;

    Ok(())
}

/// Structure representing the UDP Header.
#[derive(Debug, Default, Serialize)]
pub struct UDP {
    src_port: u16,
    dst_port: u16,
    length: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
}

impl UDP {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<UDP>::default()
    }
}

impl Layer for UDP {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        self.src_port = cursor.read_u16(0)?;
        self.dst_port = cursor.read_u16(2)?;
        self.length = cursor.read_u16(4)?;
        self.checksum = cursor.read_u16(6)?;

        let app = registry
            .udp_ports
            .create(self.dst_port)
            .or_else(|| registry.udp_ports.create(self.src_port));

        Ok((app, UDP_HDR_LEN))
    }

    fn name(&self) -> &'static str {
        "UDP"
    }

    fn short_name(&self) -> &'static str {
        "udp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dst_port_is_preferred() {
        let registry = Registry::with_defaults().unwrap();

        // 53 -> 921
        let bytes = hex::decode("0035039900200000").unwrap();
        let mut udp = UDP::default();
        let (next, consumed) = udp.decode_bytes(&registry, &bytes).unwrap();
        assert_eq!(consumed, UDP_HDR_LEN);
        assert_eq!(next.unwrap().short_name(), "lwres");

        // 40000 -> 53
        let bytes = hex::decode("9c40003500200000").unwrap();
        let mut udp = UDP::default();
        let (next, _) = udp.decode_bytes(&registry, &bytes).unwrap();
        assert_eq!(next.unwrap().short_name(), "dns");

        let bytes = hex::decode("9c409c4100200000").unwrap();
        let mut udp = UDP::default();
        let (next, _) = udp.decode_bytes(&registry, &bytes).unwrap();
        assert!(next.is_none());
    }
}
