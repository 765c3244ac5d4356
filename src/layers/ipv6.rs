//! IPv6 Layer
//!
//! The fixed header is followed by any number of extension headers (RFC 8200 Section 4). The
//! Hop-by-Hop, Routing, Fragment and Destination Options headers are walked here and the upper
//! layer protocol is looked up by the last Next Header value.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::Error;
use crate::layer::Layer;
use crate::registry::Registry;
use crate::types::{IPv6Address, ETHERTYPE_IP6};

pub const IPV6_BASE_HDR_LEN: usize = 40_usize;

pub const IPPROTO_HOPOPTS: u8 = 0;
pub const IPPROTO_ROUTING: u8 = 43;
pub const IPPROTO_FRAGMENT: u8 = 44;
pub const IPPROTO_NONE: u8 = 59;
pub const IPPROTO_DSTOPTS: u8 = 60;

/// Register ourselves to well-known Layer 2, and by name for protocols that embed an IPv6 packet.
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.ethertypes.register(ETHERTYPE_IP6, IPv6::creator)?;
    registry.named.register("ipv6", IPv6::creator)?;

    Ok(())
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IPv6ExtensionHeader {
    HopByHop {
        next_header: u8,
        #[serde(serialize_with = "hex::serde::serialize")]
        options: Vec<u8>,
    },
    Routing {
        next_header: u8,
        routing_type: u8,
        segments_left: u8,
        #[serde(serialize_with = "hex::serde::serialize")]
        data: Vec<u8>,
    },
    Fragment {
        next_header: u8,
        offset: u16,
        more_fragments: bool,
        #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
        identification: u32,
    },
    DestinationOptions {
        next_header: u8,
        #[serde(serialize_with = "hex::serde::serialize")]
        options: Vec<u8>,
    },
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct IPv6 {
    version: u8,
    traffic_class: u8,
    flow_label: u32,
    payload_len: u16,
    next_hdr: u8,
    hop_limit: u8,
    src_addr: IPv6Address,
    dst_addr: IPv6Address,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    extension_headers: Vec<IPv6ExtensionHeader>,
}

impl IPv6 {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<IPv6>::default()
    }

    pub fn src_addr(&self) -> IPv6Address {
        self.src_addr
    }

    pub fn dst_addr(&self) -> IPv6Address {
        self.dst_addr
    }

    // Options headers (Hop-by-Hop, Destination) and Routing share the length encoding: 8 octet
    // units, not counting the first 8.
    fn extension_length(cursor: &ByteCursor, offset: usize) -> Result<usize, Error> {
        Ok((cursor.read_u8(offset + 1)? as usize + 1) * 8)
    }

    /// Walk the extension headers from `offset`. Returns the upper layer protocol, where it
    /// starts and whether it can be decoded (it can not in a non-first fragment).
    fn extension_headers_from_cursor(
        &mut self,
        cursor: &ByteCursor,
        offset: usize,
    ) -> Result<(u8, usize, bool), Error> {
        let mut next_header = self.next_hdr;
        let mut offset = offset;
        let mut decodable = true;

        loop {
            let header = match next_header {
                IPPROTO_HOPOPTS | IPPROTO_DSTOPTS => {
                    let length = Self::extension_length(cursor, offset)?;
                    let options = cursor.read_bytes(offset + 2, length - 2)?.into();
                    let this = next_header;
                    next_header = cursor.read_u8(offset)?;
                    offset += length;
                    if this == IPPROTO_HOPOPTS {
                        IPv6ExtensionHeader::HopByHop {
                            next_header,
                            options,
                        }
                    } else {
                        IPv6ExtensionHeader::DestinationOptions {
                            next_header,
                            options,
                        }
                    }
                }
                IPPROTO_ROUTING => {
                    let length = Self::extension_length(cursor, offset)?;
                    next_header = cursor.read_u8(offset)?;
                    let header = IPv6ExtensionHeader::Routing {
                        next_header,
                        routing_type: cursor.read_u8(offset + 2)?,
                        segments_left: cursor.read_u8(offset + 3)?,
                        data: cursor.read_bytes(offset + 4, length - 4)?.into(),
                    };
                    offset += length;
                    header
                }
                IPPROTO_FRAGMENT => {
                    next_header = cursor.read_u8(offset)?;
                    let offset_flags = cursor.read_u16(offset + 2)?;
                    let fragment_offset = offset_flags >> 3;
                    decodable &= fragment_offset == 0;
                    let header = IPv6ExtensionHeader::Fragment {
                        next_header,
                        offset: fragment_offset,
                        more_fragments: offset_flags & 0x0001 != 0,
                        identification: cursor.read_u32(offset + 4)?,
                    };
                    offset += 8;
                    header
                }
                _ => break,
            };
            self.extension_headers.push(header);
        }

        Ok((next_header, offset, decodable))
    }
}

impl Layer for IPv6 {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);
        let _ = cursor.read_bytes(0, IPV6_BASE_HDR_LEN)?;

        let first = cursor.read_u32(0)?;
        self.version = (first >> 28) as u8;
        self.traffic_class = (first >> 20) as u8;
        self.flow_label = first & 0x000f_ffff;
        self.payload_len = cursor.read_u16(4)?;
        self.next_hdr = cursor.read_u8(6)?;
        self.hop_limit = cursor.read_u8(7)?;
        self.src_addr = cursor.read_array::<16>(8)?.into();
        self.dst_addr = cursor.read_array::<16>(24)?.into();

        let (upper, decoded, decodable) =
            self.extension_headers_from_cursor(&cursor, IPV6_BASE_HDR_LEN)?;

        if !decodable || upper == IPPROTO_NONE {
            return Ok((None, decoded));
        }

        Ok((registry.ipv6_next_headers.create(upper), decoded))
    }

    fn name(&self) -> &'static str {
        "IPv6"
    }

    fn short_name(&self) -> &'static str {
        "ip6"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_base_header() {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode("600000000020064020010470e5bfdead49572174e82c48872607f8b0400c0c03000000000000001af9c7001903a088300000000080022000da4700000204058c0103030801010402").unwrap();

        let mut ipv6 = IPv6::default();
        let (next, consumed) = ipv6.decode_bytes(&registry, &bytes).unwrap();
        assert_eq!(consumed, IPV6_BASE_HDR_LEN);
        assert_eq!(next.unwrap().short_name(), "tcp");

        let value = serde_json::to_value(&ipv6).unwrap();
        assert_eq!(
            value.get("src_addr"),
            Some(&serde_json::json!("2001:470:e5bf:dead:4957:2174:e82c:4887"))
        );
        assert!(value.get("extension_headers").is_none());
    }

    #[test]
    fn hop_by_hop_then_icmpv6() {
        let registry = Registry::with_defaults().unwrap();
        // MLDv2 report: Hop-by-Hop header with a Router Alert option.
        let bytes = hex::decode(concat!(
            "6000000000240001fe800000000000000000000000000001ff020000000000000000000000000016",
            "3a000502000001008f00",
        ))
        .unwrap();

        let mut ipv6 = IPv6::default();
        let (next, consumed) = ipv6.decode_bytes(&registry, &bytes).unwrap();
        assert_eq!(consumed, 48);
        assert_eq!(next.unwrap().short_name(), "icmpv6");
        assert_eq!(
            serde_json::to_value(&ipv6).unwrap()["extension_headers"],
            serde_json::json!([{"type": "hop_by_hop", "next_header": 58, "options": "050200000100"}])
        );
    }

    #[test]
    fn later_fragments_are_not_dispatched() {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(concat!(
            "6000000000102c40fe800000000000000000000000000001fe800000000000000000000000000002",
            "11000009deadbeef0035003500080000",
        ))
        .unwrap();

        let mut ipv6 = IPv6::default();
        let (next, consumed) = ipv6.decode_bytes(&registry, &bytes).unwrap();
        assert!(next.is_none());
        assert_eq!(consumed, 48);
        assert_eq!(
            serde_json::to_value(&ipv6).unwrap()["extension_headers"][0],
            serde_json::json!({
                "type": "fragment",
                "next_header": 17,
                "offset": 1,
                "more_fragments": true,
                "identification": "0xdeadbeef",
            })
        );
    }

    #[test]
    fn truncated_extension_header() {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(concat!(
            "6000000000080040fe800000000000000000000000000001fe800000000000000000000000000002",
            "3a01000000",
        ))
        .unwrap();

        let mut ipv6 = IPv6::default();
        assert!(ipv6.decode_bytes(&registry, &bytes).is_err());
    }
}
