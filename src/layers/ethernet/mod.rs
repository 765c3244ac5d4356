//! Ethernet Layer

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::Error;
use crate::layer::Layer;
use crate::registry::Registry;
use crate::types::{EtherType, MACAddress, ENCAP_TYPE_ETH};

pub const ETH_HEADER_LENGTH: usize = 14_usize;

pub const ETHERTYPE_VLAN: EtherType = 0x8100;

// Register our Encap Types with the Registry.
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.encap_types.register(ENCAP_TYPE_ETH, Ethernet::creator)
}

/// Structure representing the Ethernet Header of a Packet.
///
/// A single 802.1Q tag is decoded if present, the EtherType is then the one following the tag.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Ethernet {
    dst_mac: MACAddress,
    src_mac: MACAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    vlan_id: Option<u16>,
    #[serde(serialize_with = "crate::types::hex::serialize_upper_hex_u16")]
    ethertype: EtherType,
}

impl Ethernet {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<Ethernet>::default()
    }

    pub fn ethertype(&self) -> EtherType {
        self.ethertype
    }
}

impl Layer for Ethernet {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        self.dst_mac = cursor.read_array::<6>(0)?.into();
        self.src_mac = cursor.read_array::<6>(6)?.into();
        self.ethertype = cursor.read_u16(12)?;

        let mut decoded = ETH_HEADER_LENGTH;
        if self.ethertype == ETHERTYPE_VLAN {
            self.vlan_id = Some(cursor.read_u16(decoded)? & 0x0fff);
            self.ethertype = cursor.read_u16(decoded + 2)?;
            decoded += 4;
        }

        Ok((registry.ethertypes.create(self.ethertype), decoded))
    }

    fn name(&self) -> &'static str {
        "Ethernet"
    }

    fn short_name(&self) -> &'static str {
        "eth"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_fails() {
        let registry = Registry::new();
        let mut eth = Ethernet::default();

        assert!(matches!(
            eth.decode_bytes(&registry, &[0; 13]),
            Err(Error::TooShort { .. })
        ));
    }

    #[test]
    fn vlan_tag() {
        let registry = Registry::with_defaults().unwrap();
        let frame = hex::decode("ffffffffffff0050568a0fe98100006486dd").unwrap();

        let mut eth = Ethernet::default();
        let (next, consumed) = eth.decode_bytes(&registry, &frame).unwrap();
        assert_eq!(consumed, 18);
        assert_eq!(next.unwrap().short_name(), "ip6");
        assert_eq!(
            serde_json::to_value(&eth).unwrap(),
            serde_json::json!({
                "dst_mac": "ff:ff:ff:ff:ff:ff",
                "src_mac": "00:50:56:8a:0f:e9",
                "vlan_id": 100,
                "ethertype": "0x86DD",
            })
        );
    }
}
