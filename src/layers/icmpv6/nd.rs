//! Neighbor Discovery and related messages
//!
//! Router and Neighbor Discovery (RFC 4861), Inverse ND (RFC 3122), Mobile IPv6 home agent and
//! prefix discovery (RFC 6275), SEND certification path (RFC 3971), Multicast Router Discovery
//! (RFC 4286) and 6LoWPAN duplicate address detection (RFC 6775).

use serde::Serialize;

use crate::errors::Error;
use crate::layers::dns::rdata::RecordReader;
use crate::layers::icmpv6::options::{nd_options_from_reader, router_preference, NDOption};
use crate::layers::icmpv6::{
    ICMPV6_CERTIFICATION_PATH_ADVERTISEMENT, ICMPV6_HOME_AGENT_DISCOVERY_REPLY,
    ICMPV6_MOBILE_PREFIX_ADVERTISEMENT, ICMPV6_MRD_ADVERTISEMENT,
};
use crate::registry::Registry;
use crate::types::{EUI64Address, IPv6Address};

#[derive(Debug, Default, Serialize)]
pub struct RouterSolicitation {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<NDOption>,
}

impl RouterSolicitation {
    pub(crate) fn from_reader(registry: &Registry, reader: &mut RecordReader) -> Result<Self, Error> {
        reader.skip(4)?;

        Ok(Self {
            options: nd_options_from_reader(registry, reader)?,
        })
    }
}

#[derive(Debug, Default, Serialize, Copy, Clone)]
pub struct RouterAdvFlags {
    managed_address_config: bool,
    other_config: bool,
    home_agent: bool,
    preference: &'static str,
    proxy: bool,
}

impl From<u8> for RouterAdvFlags {
    fn from(flags: u8) -> Self {
        Self {
            managed_address_config: flags & 0x80 != 0,
            other_config: flags & 0x40 != 0,
            home_agent: flags & 0x20 != 0,
            preference: router_preference((flags >> 3) & 0x03),
            proxy: flags & 0x04 != 0,
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RouterAdvertisement {
    cur_hop_limit: u8,
    flags: RouterAdvFlags,
    router_lifetime: u16,
    reachable_time: u32,
    retrans_timer: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<NDOption>,
}

impl RouterAdvertisement {
    pub fn options(&self) -> &[NDOption] {
        &self.options
    }

    pub(crate) fn from_reader(registry: &Registry, reader: &mut RecordReader) -> Result<Self, Error> {
        Ok(Self {
            cur_hop_limit: reader.read_u8()?,
            flags: reader.read_u8()?.into(),
            router_lifetime: reader.read_u16()?,
            reachable_time: reader.read_u32()?,
            retrans_timer: reader.read_u32()?,
            options: nd_options_from_reader(registry, reader)?,
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct NeighborSolicitation {
    target_address: IPv6Address,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<NDOption>,
}

impl NeighborSolicitation {
    pub(crate) fn from_reader(registry: &Registry, reader: &mut RecordReader) -> Result<Self, Error> {
        reader.skip(4)?;

        Ok(Self {
            target_address: reader.read_array::<16>()?.into(),
            options: nd_options_from_reader(registry, reader)?,
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct NeighborAdvFlags {
    from_router: bool,
    solicited: bool,
    override_flag: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct NeighborAdvertisement {
    flags: NeighborAdvFlags,
    target_address: IPv6Address,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<NDOption>,
}

impl NeighborAdvertisement {
    pub(crate) fn from_reader(registry: &Registry, reader: &mut RecordReader) -> Result<Self, Error> {
        let flags = reader.read_u32()?;

        Ok(Self {
            flags: NeighborAdvFlags {
                from_router: flags & 0x8000_0000 != 0,
                solicited: flags & 0x4000_0000 != 0,
                override_flag: flags & 0x2000_0000 != 0,
            },
            target_address: reader.read_array::<16>()?.into(),
            options: nd_options_from_reader(registry, reader)?,
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Redirect {
    target_address: IPv6Address,
    destination_address: IPv6Address,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<NDOption>,
}

impl Redirect {
    pub(crate) fn from_reader(registry: &Registry, reader: &mut RecordReader) -> Result<Self, Error> {
        reader.skip(4)?;

        Ok(Self {
            target_address: reader.read_array::<16>()?.into(),
            destination_address: reader.read_array::<16>()?.into(),
            options: nd_options_from_reader(registry, reader)?,
        })
    }
}

/// Inverse Neighbor Discovery Solicitation and Advertisement share their layout.
#[derive(Debug, Default, Serialize)]
pub struct InverseND {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<NDOption>,
}

impl InverseND {
    pub(crate) fn from_reader(registry: &Registry, reader: &mut RecordReader) -> Result<Self, Error> {
        reader.skip(4)?;

        Ok(Self {
            options: nd_options_from_reader(registry, reader)?,
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct HomeAgentDiscovery {
    identifier: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    home_agent_addresses: Vec<IPv6Address>,
}

impl HomeAgentDiscovery {
    pub(crate) fn from_reader(reader: &mut RecordReader, icmp_type: u8) -> Result<Self, Error> {
        let identifier = reader.read_u16()?;
        reader.skip(2)?;

        let mut home_agent_addresses = vec![];
        if icmp_type == ICMPV6_HOME_AGENT_DISCOVERY_REPLY {
            while !reader.is_empty() {
                home_agent_addresses.push(reader.read_array::<16>()?.into());
            }
        }

        Ok(Self {
            identifier,
            home_agent_addresses,
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct MobilePrefix {
    identifier: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    managed_address_config: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    other_config: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<NDOption>,
}

impl MobilePrefix {
    pub(crate) fn from_reader(
        registry: &Registry,
        reader: &mut RecordReader,
        icmp_type: u8,
    ) -> Result<Self, Error> {
        let identifier = reader.read_u16()?;
        let flags = reader.read_u16()?;

        if icmp_type != ICMPV6_MOBILE_PREFIX_ADVERTISEMENT {
            return Ok(Self {
                identifier,
                ..Default::default()
            });
        }

        Ok(Self {
            identifier,
            managed_address_config: Some(flags & 0x8000 != 0),
            other_config: Some(flags & 0x4000 != 0),
            options: nd_options_from_reader(registry, reader)?,
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct CertificationPath {
    identifier: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    all_components: Option<u16>,
    component: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<NDOption>,
}

impl CertificationPath {
    pub(crate) fn from_reader(
        registry: &Registry,
        reader: &mut RecordReader,
        icmp_type: u8,
    ) -> Result<Self, Error> {
        let identifier = reader.read_u16()?;
        let (all_components, component) = if icmp_type == ICMPV6_CERTIFICATION_PATH_ADVERTISEMENT
        {
            let all_components = reader.read_u16()?;
            let component = reader.read_u16()?;
            reader.skip(2)?;
            (Some(all_components), component)
        } else {
            (None, reader.read_u16()?)
        };

        Ok(Self {
            identifier,
            all_components,
            component,
            options: nd_options_from_reader(registry, reader)?,
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct MulticastRouterDiscovery {
    #[serde(skip_serializing_if = "Option::is_none")]
    advertisement_interval: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_interval: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    robustness_variable: Option<u16>,
}

impl MulticastRouterDiscovery {
    pub(crate) fn from_reader(
        reader: &mut RecordReader,
        icmp_type: u8,
        code: u8,
    ) -> Result<Self, Error> {
        if icmp_type != ICMPV6_MRD_ADVERTISEMENT {
            return Ok(Self::default());
        }

        // The advertisement interval travels in the code field.
        Ok(Self {
            advertisement_interval: Some(code),
            query_interval: Some(reader.read_u16()?),
            robustness_variable: Some(reader.read_u16()?),
        })
    }
}

/// Duplicate Address Request and Confirmation (RFC 6775 Section 4.4).
#[derive(Debug, Serialize)]
pub struct DuplicateAddress {
    status: u8,
    registration_lifetime: u16,
    eui64: EUI64Address,
    registered_address: IPv6Address,
}

impl DuplicateAddress {
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let status = reader.read_u8()?;
        reader.skip(1)?;

        Ok(Self {
            status,
            registration_lifetime: reader.read_u16()?,
            eui64: reader.read_array::<8>()?.into(),
            registered_address: reader.read_array::<16>()?.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

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
    fn router_advertisement_flags_and_options() {
        let value = decode(concat!(
            "86000000",
            "40c8070800000000",
            "00000000",
            "0101000c29fc2c3b",
        ));
        assert_eq!(value["cur_hop_limit"], json!(64));
        assert_eq!(
            value["flags"],
            json!({
                "managed_address_config": true,
                "other_config": true,
                "home_agent": false,
                "preference": "High",
                "proxy": false,
            })
        );
        assert_eq!(value["router_lifetime"], json!(1800));
        assert_eq!(value["options"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn neighbor_advertisement_flags() {
        let value = decode(concat!(
            "88000000",
            "e0000000",
            "fe80000000000000020c29fffefc2c3b",
        ));
        assert_eq!(
            value["flags"],
            json!({"from_router": true, "solicited": true, "override_flag": true})
        );
        assert_eq!(value["target_address"], json!("fe80::20c:29ff:fefc:2c3b"));
        assert!(value.get("options").is_none());
    }

    #[test]
    fn home_agent_discovery_reply() {
        let value = decode(concat!(
            "91000000",
            "abcd0000",
            "20010db8000000000000000000000001",
        ));
        assert_eq!(value["identifier"], json!(0xabcd));
        assert_eq!(value["home_agent_addresses"], json!(["2001:db8::1"]));
    }

    #[test]
    fn multicast_router_advertisement() {
        let value = decode("97140000007d0002");
        assert_eq!(value["advertisement_interval"], json!(20));
        assert_eq!(value["query_interval"], json!(125));
        assert_eq!(value["robustness_variable"], json!(2));
    }

    #[test]
    fn duplicate_address_request() {
        let value = decode(concat!(
            "9d000000",
            "00000e10",
            "0011223344556677",
            "20010db8000000000000000000000001",
        ));
        assert_eq!(value["registration_lifetime"], json!(3600));
        assert_eq!(value["eui64"], json!("00:11:22:33:44:55:66:77"));
        assert_eq!(value["registered_address"], json!("2001:db8::1"));
    }
}
