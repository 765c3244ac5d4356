//! Neighbor Discovery options
//!
//! ND messages (RFC 4861 Section 4.6) are followed by options, each a type octet and a length in
//! units of 8 octets that includes the two header octets. Every option value is decoded within
//! its declared length.

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layers::dns::name::DNSName;
use crate::layers::dns::rdata::RecordReader;
use crate::layers::icmpv6::{decode_invoking_packet, InvokingPacket};
use crate::registry::Registry;
use crate::types::{EUI64Address, IPv6Address, MACAddress};

pub const ND_OPT_SOURCE_LINK_LAYER_ADDRESS: u8 = 1;
pub const ND_OPT_TARGET_LINK_LAYER_ADDRESS: u8 = 2;
pub const ND_OPT_PREFIX_INFORMATION: u8 = 3;
pub const ND_OPT_REDIRECTED_HEADER: u8 = 4;
pub const ND_OPT_MTU: u8 = 5;
pub const ND_OPT_ADVERTISEMENT_INTERVAL: u8 = 7;
pub const ND_OPT_HOME_AGENT_INFORMATION: u8 = 8;
pub const ND_OPT_SOURCE_ADDRESS_LIST: u8 = 9;
pub const ND_OPT_TARGET_ADDRESS_LIST: u8 = 10;
pub const ND_OPT_TIMESTAMP: u8 = 13;
pub const ND_OPT_NONCE: u8 = 14;
pub const ND_OPT_IP_ADDRESS_PREFIX: u8 = 17;
pub const ND_OPT_ROUTE_INFORMATION: u8 = 24;
pub const ND_OPT_RDNSS: u8 = 25;
pub const ND_OPT_RA_FLAGS_EXTENSION: u8 = 26;
pub const ND_OPT_DNSSL: u8 = 31;
pub const ND_OPT_ADDRESS_REGISTRATION: u8 = 33;
pub const ND_OPT_6LOWPAN_CONTEXT: u8 = 34;
pub const ND_OPT_AUTHORITATIVE_BORDER_ROUTER: u8 = 35;
pub const ND_OPT_CAPTIVE_PORTAL: u8 = 37;
pub const ND_OPT_PREF64: u8 = 38;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LinkLayerAddress {
    Ethernet(MACAddress),
    Eui64(EUI64Address),
    #[serde(serialize_with = "hex::serde::serialize")]
    Other(Vec<u8>),
}

#[derive(Debug, Default, Serialize)]
pub struct PrefixInformation {
    prefix_length: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    on_link: bool,
    autonomous: bool,
    router_address: bool,
    dhcpv6_pd_preferred: bool,
    valid_lifetime: u32,
    preferred_lifetime: u32,
    prefix: IPv6Address,
}

impl PrefixInformation {
    /// Also the layout of the RPL Prefix Information option.
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let prefix_length = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let valid_lifetime = reader.read_u32()?;
        let preferred_lifetime = reader.read_u32()?;
        reader.skip(4)?;

        Ok(Self {
            prefix_length,
            flags,
            on_link: flags & 0x80 != 0,
            autonomous: flags & 0x40 != 0,
            router_address: flags & 0x20 != 0,
            dhcpv6_pd_preferred: flags & 0x10 != 0,
            valid_lifetime,
            preferred_lifetime,
            prefix: reader.read_array::<16>()?.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct HomeAgentInformation {
    preference: u16,
    lifetime: u16,
}

#[derive(Debug, Serialize)]
pub struct Timestamp {
    seconds: u64,
    fraction: u16,
}

#[derive(Debug, Serialize)]
pub struct IPAddressPrefix {
    option_code: u8,
    prefix_length: u8,
    address: IPv6Address,
}

/// Route Information, also carried by RPL DIOs.
#[derive(Debug, Serialize)]
pub struct RouteInformation {
    prefix_length: u8,
    preference: &'static str,
    route_lifetime: u32,
    prefix: IPv6Address,
}

impl RouteInformation {
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let prefix_length = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let route_lifetime = reader.read_u32()?;
        let prefix = IPv6Address::from_prefix(reader.read_rest()?);

        Ok(Self {
            prefix_length,
            preference: router_preference((flags >> 3) & 0x03),
            route_lifetime,
            prefix,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct RecursiveDNSServer {
    lifetime: u32,
    servers: Vec<IPv6Address>,
}

#[derive(Debug, Serialize)]
pub struct DNSSearchList {
    lifetime: u32,
    domains: Vec<DNSName>,
}

#[derive(Debug, Serialize)]
pub struct AddressRegistration {
    status: u8,
    registration_lifetime: u16,
    eui64: EUI64Address,
}

#[derive(Debug, Serialize)]
pub struct SixLowpanContext {
    context_length: u8,
    compression: bool,
    context_id: u8,
    valid_lifetime: u16,
    prefix: IPv6Address,
}

#[derive(Debug, Serialize)]
pub struct AuthoritativeBorderRouter {
    version: u32,
    valid_lifetime: u16,
    address: IPv6Address,
}

#[derive(Debug, Serialize)]
pub struct Pref64 {
    lifetime: u16,
    prefix_length: u8,
    prefix: IPv6Address,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NDOptionValue {
    SourceLinkLayerAddress(LinkLayerAddress),
    TargetLinkLayerAddress(LinkLayerAddress),
    PrefixInformation(PrefixInformation),
    RedirectedHeader(InvokingPacket),
    Mtu(u32),
    AdvertisementInterval(u32),
    HomeAgentInformation(HomeAgentInformation),
    SourceAddressList(Vec<IPv6Address>),
    TargetAddressList(Vec<IPv6Address>),
    Timestamp(Timestamp),
    #[serde(serialize_with = "hex::serde::serialize")]
    Nonce(Vec<u8>),
    IpAddressPrefix(IPAddressPrefix),
    RouteInformation(RouteInformation),
    RecursiveDnsServer(RecursiveDNSServer),
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u64")]
    RaFlagsExtension(u64),
    DnsSearchList(DNSSearchList),
    AddressRegistration(AddressRegistration),
    SixLowpanContext(SixLowpanContext),
    AuthoritativeBorderRouter(AuthoritativeBorderRouter),
    CaptivePortal(String),
    Pref64(Pref64),
    /// An option with a length of zero. No option can follow it.
    Invalid,
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct NDOption {
    #[serde(rename = "type")]
    option_type: u8,
    length: u8,
    value: NDOptionValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl NDOption {
    pub fn option_type(&self) -> u8 {
        self.option_type
    }

    pub fn value(&self) -> &NDOptionValue {
        &self.value
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

/// Default Router Preference and Route Preference (RFC 4191 Section 2.1).
pub(crate) fn router_preference(prf: u8) -> &'static str {
    match prf {
        0 => "Medium",
        1 => "High",
        2 => "Reserved",
        _ => "Low",
    }
}

/// Names packed back to back (DNSSL, Node Information). Zero octets after the last name are
/// padding.
pub(crate) fn names_until_padding(reader: &mut RecordReader) -> Result<Vec<DNSName>, Error> {
    let mut names = vec![];

    while let Some(first) = reader.peek_u8() {
        if first == 0 {
            let padding = reader.read_rest()?;
            if padding.iter().any(|b| *b != 0) {
                reader.note(Note::MalformedField(
                    "non-zero padding after the last name".to_string(),
                ));
            }
            break;
        }
        names.push(reader.read_name()?);
    }

    Ok(names)
}

fn addresses_from_reader(reader: &mut RecordReader) -> Result<Vec<IPv6Address>, Error> {
    let mut addresses = vec![];
    while reader.remaining() >= 16 {
        addresses.push(reader.read_array::<16>()?.into());
    }

    Ok(addresses)
}

fn link_layer_address(reader: &mut RecordReader, length: u8) -> Result<LinkLayerAddress, Error> {
    Ok(match length {
        1 => LinkLayerAddress::Ethernet(reader.read_array::<6>()?.into()),
        2 => LinkLayerAddress::Eui64(reader.read_array::<8>()?.into()),
        _ => LinkLayerAddress::Other(reader.read_rest()?.into()),
    })
}

fn pref64_prefix_length(plc: u8) -> Option<u8> {
    match plc {
        0 => Some(96),
        1 => Some(64),
        2 => Some(56),
        3 => Some(48),
        4 => Some(40),
        5 => Some(32),
        _ => None,
    }
}

fn option_value(
    registry: &Registry,
    reader: &mut RecordReader,
    option_type: u8,
    length: u8,
) -> Result<NDOptionValue, Error> {
    let value = match option_type {
        ND_OPT_SOURCE_LINK_LAYER_ADDRESS => {
            NDOptionValue::SourceLinkLayerAddress(link_layer_address(reader, length)?)
        }
        ND_OPT_TARGET_LINK_LAYER_ADDRESS => {
            NDOptionValue::TargetLinkLayerAddress(link_layer_address(reader, length)?)
        }
        ND_OPT_PREFIX_INFORMATION => {
            NDOptionValue::PrefixInformation(PrefixInformation::from_reader(reader)?)
        }
        ND_OPT_REDIRECTED_HEADER => {
            reader.skip(6)?;
            let mut notes = vec![];
            let packet = decode_invoking_packet(registry, reader.read_rest()?, &mut notes);
            for note in notes {
                reader.note(note);
            }
            NDOptionValue::RedirectedHeader(packet)
        }
        ND_OPT_MTU => {
            reader.skip(2)?;
            NDOptionValue::Mtu(reader.read_u32()?)
        }
        ND_OPT_ADVERTISEMENT_INTERVAL => {
            reader.skip(2)?;
            NDOptionValue::AdvertisementInterval(reader.read_u32()?)
        }
        ND_OPT_HOME_AGENT_INFORMATION => {
            reader.skip(2)?;
            NDOptionValue::HomeAgentInformation(HomeAgentInformation {
                preference: reader.read_u16()?,
                lifetime: reader.read_u16()?,
            })
        }
        ND_OPT_SOURCE_ADDRESS_LIST => {
            reader.skip(6)?;
            NDOptionValue::SourceAddressList(addresses_from_reader(reader)?)
        }
        ND_OPT_TARGET_ADDRESS_LIST => {
            reader.skip(6)?;
            NDOptionValue::TargetAddressList(addresses_from_reader(reader)?)
        }
        ND_OPT_TIMESTAMP => {
            reader.skip(6)?;
            let timestamp = reader.read_u64()?;
            NDOptionValue::Timestamp(Timestamp {
                seconds: timestamp >> 16,
                fraction: timestamp as u16,
            })
        }
        ND_OPT_NONCE => NDOptionValue::Nonce(reader.read_rest()?.into()),
        ND_OPT_IP_ADDRESS_PREFIX => {
            let option_code = reader.read_u8()?;
            let prefix_length = reader.read_u8()?;
            reader.skip(4)?;
            NDOptionValue::IpAddressPrefix(IPAddressPrefix {
                option_code,
                prefix_length,
                address: reader.read_array::<16>()?.into(),
            })
        }
        ND_OPT_ROUTE_INFORMATION => {
            NDOptionValue::RouteInformation(RouteInformation::from_reader(reader)?)
        }
        ND_OPT_RDNSS => {
            reader.skip(2)?;
            NDOptionValue::RecursiveDnsServer(RecursiveDNSServer {
                lifetime: reader.read_u32()?,
                servers: addresses_from_reader(reader)?,
            })
        }
        ND_OPT_RA_FLAGS_EXTENSION => NDOptionValue::RaFlagsExtension(reader.read_u48()?),
        ND_OPT_DNSSL => {
            reader.skip(2)?;
            NDOptionValue::DnsSearchList(DNSSearchList {
                lifetime: reader.read_u32()?,
                domains: names_until_padding(reader)?,
            })
        }
        ND_OPT_ADDRESS_REGISTRATION => {
            let status = reader.read_u8()?;
            reader.skip(3)?;
            NDOptionValue::AddressRegistration(AddressRegistration {
                status,
                registration_lifetime: reader.read_u16()?,
                eui64: reader.read_array::<8>()?.into(),
            })
        }
        ND_OPT_6LOWPAN_CONTEXT => {
            let context_length = reader.read_u8()?;
            let flags = reader.read_u8()?;
            reader.skip(2)?;
            NDOptionValue::SixLowpanContext(SixLowpanContext {
                context_length,
                compression: flags & 0x10 != 0,
                context_id: flags & 0x0f,
                valid_lifetime: reader.read_u16()?,
                prefix: IPv6Address::from_prefix(reader.read_rest()?),
            })
        }
        ND_OPT_AUTHORITATIVE_BORDER_ROUTER => {
            let low = reader.read_u16()? as u32;
            let high = reader.read_u16()? as u32;
            NDOptionValue::AuthoritativeBorderRouter(AuthoritativeBorderRouter {
                version: high << 16 | low,
                valid_lifetime: reader.read_u16()?,
                address: reader.read_array::<16>()?.into(),
            })
        }
        ND_OPT_CAPTIVE_PORTAL => {
            let uri = reader.read_rest()?;
            let end = uri.iter().position(|b| *b == 0).unwrap_or(uri.len());
            NDOptionValue::CaptivePortal(String::from_utf8_lossy(&uri[..end]).into_owned())
        }
        ND_OPT_PREF64 => {
            let scaled_lifetime_plc = reader.read_u16()?;
            let plc = (scaled_lifetime_plc & 0x0007) as u8;
            let prefix_length = match pref64_prefix_length(plc) {
                Some(len) => len,
                None => {
                    reader.note(Note::MalformedField(format!(
                        "PREF64 prefix length code {}",
                        plc
                    )));
                    0
                }
            };
            NDOptionValue::Pref64(Pref64 {
                lifetime: scaled_lifetime_plc & 0xfff8,
                prefix_length,
                prefix: IPv6Address::from_prefix(&reader.read_array::<12>()?),
            })
        }
        _ => {
            log_debug!("ND option type {} not implemented", option_type);
            reader.note(Note::UnknownType(format!("ND option type {}", option_type)));
            NDOptionValue::Unknown(reader.read_rest()?.into())
        }
    };

    Ok(value)
}

/// Decode the options filling the rest of `reader`.
///
/// An option claiming more bytes than are left is fatal to the message. An option with a length
/// of zero can not be skipped: it is kept with a note and ends the walk.
pub fn nd_options_from_reader(
    registry: &Registry,
    reader: &mut RecordReader,
) -> Result<Vec<NDOption>, Error> {
    let mut options = vec![];

    while !reader.is_empty() {
        let option_type = reader.read_u8()?;
        let length = reader.read_u8()?;

        if length == 0 {
            options.push(NDOption {
                option_type,
                length,
                value: NDOptionValue::Invalid,
                notes: vec![Note::MalformedField(
                    "option length is zero".to_string(),
                )],
            });
            reader.skip(reader.remaining())?;
            break;
        }

        let mut body = reader.sub_reader(length as usize * 8 - 2)?;
        let value = option_value(registry, &mut body, option_type, length)?;
        options.push(NDOption {
            option_type,
            length,
            value,
            notes: body.into_notes(),
        });
    }

    Ok(options)
}
