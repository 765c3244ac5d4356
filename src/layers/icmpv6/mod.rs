//! ICMPv6 Layer
//!
//! The four byte header (type, code, checksum) is followed by a message body whose layout is
//! selected by the type. Error messages carry as much of the invoking packet as fits, which is
//! handed back to the IPv6 dissector. Neighbor Discovery and RPL messages end with options that
//! are decoded within their declared lengths.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::{Error, Note};
use crate::layer::Layer;
use crate::layers::dns::rdata::RecordReader;
use crate::packet::decode_chain;
use crate::registry::Registry;
use crate::transactions::{Direction, TransactionKey, TransactionProtocol};

pub mod echo;
pub mod mld;
pub mod mpl;
pub mod nd;
pub mod nodeinfo;
pub mod options;
pub mod renumbering;
pub mod rpl;

/// IANA Assigned protocol number for ICMPv6
pub const IPPROTO_ICMPV6: u8 = 58_u8;
/// ICMPv6 header length
pub const ICMPV6_HEADER_LENGTH: usize = 4_usize;

pub const ICMPV6_DESTINATION_UNREACHABLE: u8 = 1;
pub const ICMPV6_PACKET_TOO_BIG: u8 = 2;
pub const ICMPV6_TIME_EXCEEDED: u8 = 3;
pub const ICMPV6_PARAMETER_PROBLEM: u8 = 4;
pub const ICMPV6_ECHO_REQUEST: u8 = 128;
pub const ICMPV6_ECHO_REPLY: u8 = 129;
pub const ICMPV6_MLD_QUERY: u8 = 130;
pub const ICMPV6_MLD_REPORT: u8 = 131;
pub const ICMPV6_MLD_DONE: u8 = 132;
pub const ICMPV6_ROUTER_SOLICITATION: u8 = 133;
pub const ICMPV6_ROUTER_ADVERTISEMENT: u8 = 134;
pub const ICMPV6_NEIGHBOR_SOLICITATION: u8 = 135;
pub const ICMPV6_NEIGHBOR_ADVERTISEMENT: u8 = 136;
pub const ICMPV6_REDIRECT: u8 = 137;
pub const ICMPV6_ROUTER_RENUMBERING: u8 = 138;
pub const ICMPV6_NODE_INFORMATION_QUERY: u8 = 139;
pub const ICMPV6_NODE_INFORMATION_REPLY: u8 = 140;
pub const ICMPV6_INVERSE_ND_SOLICITATION: u8 = 141;
pub const ICMPV6_INVERSE_ND_ADVERTISEMENT: u8 = 142;
pub const ICMPV6_MLDV2_REPORT: u8 = 143;
pub const ICMPV6_HOME_AGENT_DISCOVERY_REQUEST: u8 = 144;
pub const ICMPV6_HOME_AGENT_DISCOVERY_REPLY: u8 = 145;
pub const ICMPV6_MOBILE_PREFIX_SOLICITATION: u8 = 146;
pub const ICMPV6_MOBILE_PREFIX_ADVERTISEMENT: u8 = 147;
pub const ICMPV6_CERTIFICATION_PATH_SOLICITATION: u8 = 148;
pub const ICMPV6_CERTIFICATION_PATH_ADVERTISEMENT: u8 = 149;
pub const ICMPV6_MRD_ADVERTISEMENT: u8 = 151;
pub const ICMPV6_MRD_SOLICITATION: u8 = 152;
pub const ICMPV6_MRD_TERMINATION: u8 = 153;
pub const ICMPV6_RPL_CONTROL: u8 = 155;
pub const ICMPV6_DUPLICATE_ADDRESS_REQUEST: u8 = 157;
pub const ICMPV6_DUPLICATE_ADDRESS_CONFIRMATION: u8 = 158;
pub const ICMPV6_MPL_CONTROL: u8 = 159;
pub const ICMPV6_EXTENDED_ECHO_REQUEST: u8 = 160;
pub const ICMPV6_EXTENDED_ECHO_REPLY: u8 = 161;

// Register ICMPv6 with Protocol Handler in IPv6
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry
        .ipv6_next_headers
        .register(IPPROTO_ICMPV6, ICMPv6::creator)
}

pub fn type_name(icmp_type: u8) -> &'static str {
    match icmp_type {
        ICMPV6_DESTINATION_UNREACHABLE => "Destination Unreachable",
        ICMPV6_PACKET_TOO_BIG => "Packet Too Big",
        ICMPV6_TIME_EXCEEDED => "Time Exceeded",
        ICMPV6_PARAMETER_PROBLEM => "Parameter Problem",
        ICMPV6_ECHO_REQUEST => "Echo (ping) request",
        ICMPV6_ECHO_REPLY => "Echo (ping) reply",
        ICMPV6_MLD_QUERY => "Multicast Listener Query",
        ICMPV6_MLD_REPORT => "Multicast Listener Report",
        ICMPV6_MLD_DONE => "Multicast Listener Done",
        ICMPV6_ROUTER_SOLICITATION => "Router Solicitation",
        ICMPV6_ROUTER_ADVERTISEMENT => "Router Advertisement",
        ICMPV6_NEIGHBOR_SOLICITATION => "Neighbor Solicitation",
        ICMPV6_NEIGHBOR_ADVERTISEMENT => "Neighbor Advertisement",
        ICMPV6_REDIRECT => "Redirect",
        ICMPV6_ROUTER_RENUMBERING => "Router Renumbering",
        ICMPV6_NODE_INFORMATION_QUERY => "Node Information Query",
        ICMPV6_NODE_INFORMATION_REPLY => "Node Information Reply",
        ICMPV6_INVERSE_ND_SOLICITATION => "Inverse Neighbor Discovery Solicitation",
        ICMPV6_INVERSE_ND_ADVERTISEMENT => "Inverse Neighbor Discovery Advertisement",
        ICMPV6_MLDV2_REPORT => "Multicast Listener Report Message v2",
        ICMPV6_HOME_AGENT_DISCOVERY_REQUEST => "Home Agent Address Discovery Request",
        ICMPV6_HOME_AGENT_DISCOVERY_REPLY => "Home Agent Address Discovery Reply",
        ICMPV6_MOBILE_PREFIX_SOLICITATION => "Mobile Prefix Solicitation",
        ICMPV6_MOBILE_PREFIX_ADVERTISEMENT => "Mobile Prefix Advertisement",
        ICMPV6_CERTIFICATION_PATH_SOLICITATION => "Certification Path Solicitation",
        ICMPV6_CERTIFICATION_PATH_ADVERTISEMENT => "Certification Path Advertisement",
        ICMPV6_MRD_ADVERTISEMENT => "Multicast Router Advertisement",
        ICMPV6_MRD_SOLICITATION => "Multicast Router Solicitation",
        ICMPV6_MRD_TERMINATION => "Multicast Router Termination",
        ICMPV6_RPL_CONTROL => "RPL Control",
        ICMPV6_DUPLICATE_ADDRESS_REQUEST => "Duplicate Address Request",
        ICMPV6_DUPLICATE_ADDRESS_CONFIRMATION => "Duplicate Address Confirmation",
        ICMPV6_MPL_CONTROL => "MPL Control",
        ICMPV6_EXTENDED_ECHO_REQUEST => "Extended Echo Request",
        ICMPV6_EXTENDED_ECHO_REPLY => "Extended Echo Reply",
        _ => "Unknown",
    }
}

/// The part of a packet quoted in an error message or a Redirected Header option.
#[derive(Debug, Default, Serialize)]
pub struct InvokingPacket {
    #[serde(serialize_with = "crate::packet::serialize_layers")]
    layers: Vec<Box<dyn Layer + Send>>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    unprocessed: Vec<u8>,
}

impl InvokingPacket {
    pub fn layers(&self) -> &[Box<dyn Layer + Send>] {
        &self.layers
    }

    pub fn unprocessed(&self) -> &[u8] {
        &self.unprocessed
    }
}

/// Decode a quoted IPv6 packet with whatever is registered as `"ipv6"`.
///
/// The quote is usually truncated, so failing to decode it is not an error of the enclosing
/// message: a note is added to `notes` and the undecoded bytes are kept.
pub(crate) fn decode_invoking_packet(
    registry: &Registry,
    bytes: &[u8],
    notes: &mut Vec<Note>,
) -> InvokingPacket {
    let first = match registry.named.create("ipv6") {
        Some(first) => first,
        None => {
            notes.push(Note::UnknownType(
                "no dissector for the invoking packet".to_string(),
            ));
            return InvokingPacket {
                layers: vec![],
                unprocessed: bytes.into(),
            };
        }
    };

    let chain = decode_chain(registry, first, bytes);
    if let Some(e) = chain.error {
        log_debug!("invoking packet: {}", e);
        notes.push(Note::MalformedField(format!("invoking packet: {}", e)));
    }

    InvokingPacket {
        layers: chain.layers,
        unprocessed: bytes[chain.consumed..].into(),
    }
}

/// Destination Unreachable, Packet Too Big, Time Exceeded and Parameter Problem.
#[derive(Debug, Default, Serialize)]
pub struct ICMPv6Error {
    /// Length of the invoking packet in 8 octet units (RFC 4884), 0 if there are no extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mtu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pointer: Option<u32>,
    invoking_packet: InvokingPacket,
    #[serde(skip_serializing_if = "Option::is_none")]
    extensions: Option<echo::ExtensionStructure>,
}

impl ICMPv6Error {
    pub fn invoking_packet(&self) -> &InvokingPacket {
        &self.invoking_packet
    }

    fn from_reader(
        registry: &Registry,
        reader: &mut RecordReader,
        icmp_type: u8,
    ) -> Result<Self, Error> {
        let mut error = ICMPv6Error::default();

        match icmp_type {
            ICMPV6_PACKET_TOO_BIG => error.mtu = Some(reader.read_u32()?),
            ICMPV6_PARAMETER_PROBLEM => error.pointer = Some(reader.read_u32()?),
            _ => {
                let length = reader.read_u8()?;
                reader.skip(3)?;
                error.length = Some(length);
            }
        }

        let quoted = match error.length {
            Some(length) if length > 0 => {
                let length = length as usize * 8;
                if length > reader.remaining() {
                    reader.note(Note::MalformedField(format!(
                        "invoking packet length {} exceeds the message",
                        length
                    )));
                    reader.read_rest()?
                } else {
                    reader.read_bytes(length)?
                }
            }
            _ => reader.read_rest()?,
        };

        let mut notes = vec![];
        error.invoking_packet = decode_invoking_packet(registry, quoted, &mut notes);
        for note in notes {
            reader.note(note);
        }

        if !reader.is_empty() {
            error.extensions = Some(echo::ExtensionStructure::from_reader(reader)?);
        }

        Ok(error)
    }
}

/// A message of a type without a decoder.
#[derive(Debug, Default, Serialize)]
pub struct ICMPv6Unknown {
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    data: Vec<u8>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ICMPv6Message {
    Error(ICMPv6Error),
    Echo(echo::Echo),
    ExtendedEchoRequest(echo::ExtendedEchoRequest),
    ExtendedEchoReply(echo::ExtendedEchoReply),
    MLDQuery(mld::MLDQuery),
    MLDv1(mld::MLDv1),
    MLDv2Report(mld::MLDv2Report),
    RouterSolicitation(nd::RouterSolicitation),
    RouterAdvertisement(nd::RouterAdvertisement),
    NeighborSolicitation(nd::NeighborSolicitation),
    NeighborAdvertisement(nd::NeighborAdvertisement),
    Redirect(nd::Redirect),
    InverseND(nd::InverseND),
    HomeAgentDiscovery(nd::HomeAgentDiscovery),
    MobilePrefix(nd::MobilePrefix),
    CertificationPath(nd::CertificationPath),
    MulticastRouterDiscovery(nd::MulticastRouterDiscovery),
    DuplicateAddress(nd::DuplicateAddress),
    RouterRenumbering(renumbering::RouterRenumbering),
    NodeInformation(nodeinfo::NodeInformation),
    Rpl(rpl::RPLMessage),
    Mpl(mpl::MPLControl),
    Unknown(ICMPv6Unknown),
}

impl Default for ICMPv6Message {
    fn default() -> Self {
        ICMPv6Message::Unknown(ICMPv6Unknown::default())
    }
}

/// Structure representing the ICMPv6 Header
#[derive(Default, Debug, Serialize)]
pub struct ICMPv6 {
    #[serde(rename = "type")]
    icmp_type: u8,
    code: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    #[serde(flatten)]
    message: ICMPv6Message,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl ICMPv6 {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<ICMPv6>::default()
    }

    pub fn icmp_type(&self) -> u8 {
        self.icmp_type
    }

    pub fn code(&self) -> u8 {
        self.code
    }

    pub fn message(&self) -> &ICMPv6Message {
        &self.message
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    fn message_from_reader(
        &self,
        registry: &Registry,
        reader: &mut RecordReader,
    ) -> Result<ICMPv6Message, Error> {
        let message = match self.icmp_type {
            ICMPV6_DESTINATION_UNREACHABLE
            | ICMPV6_PACKET_TOO_BIG
            | ICMPV6_TIME_EXCEEDED
            | ICMPV6_PARAMETER_PROBLEM => {
                ICMPv6Message::Error(ICMPv6Error::from_reader(registry, reader, self.icmp_type)?)
            }
            ICMPV6_ECHO_REQUEST | ICMPV6_ECHO_REPLY => {
                ICMPv6Message::Echo(echo::Echo::from_reader(reader)?)
            }
            ICMPV6_EXTENDED_ECHO_REQUEST => {
                ICMPv6Message::ExtendedEchoRequest(echo::ExtendedEchoRequest::from_reader(reader)?)
            }
            ICMPV6_EXTENDED_ECHO_REPLY => {
                ICMPv6Message::ExtendedEchoReply(echo::ExtendedEchoReply::from_reader(reader)?)
            }
            ICMPV6_MLD_QUERY => ICMPv6Message::MLDQuery(mld::MLDQuery::from_reader(reader)?),
            ICMPV6_MLD_REPORT | ICMPV6_MLD_DONE => {
                ICMPv6Message::MLDv1(mld::MLDv1::from_reader(reader)?)
            }
            ICMPV6_MLDV2_REPORT => {
                ICMPv6Message::MLDv2Report(mld::MLDv2Report::from_reader(reader)?)
            }
            ICMPV6_ROUTER_SOLICITATION => ICMPv6Message::RouterSolicitation(
                nd::RouterSolicitation::from_reader(registry, reader)?,
            ),
            ICMPV6_ROUTER_ADVERTISEMENT => ICMPv6Message::RouterAdvertisement(
                nd::RouterAdvertisement::from_reader(registry, reader)?,
            ),
            ICMPV6_NEIGHBOR_SOLICITATION => ICMPv6Message::NeighborSolicitation(
                nd::NeighborSolicitation::from_reader(registry, reader)?,
            ),
            ICMPV6_NEIGHBOR_ADVERTISEMENT => ICMPv6Message::NeighborAdvertisement(
                nd::NeighborAdvertisement::from_reader(registry, reader)?,
            ),
            ICMPV6_REDIRECT => ICMPv6Message::Redirect(nd::Redirect::from_reader(registry, reader)?),
            ICMPV6_INVERSE_ND_SOLICITATION | ICMPV6_INVERSE_ND_ADVERTISEMENT => {
                ICMPv6Message::InverseND(nd::InverseND::from_reader(registry, reader)?)
            }
            ICMPV6_HOME_AGENT_DISCOVERY_REQUEST | ICMPV6_HOME_AGENT_DISCOVERY_REPLY => {
                ICMPv6Message::HomeAgentDiscovery(nd::HomeAgentDiscovery::from_reader(
                    reader,
                    self.icmp_type,
                )?)
            }
            ICMPV6_MOBILE_PREFIX_SOLICITATION | ICMPV6_MOBILE_PREFIX_ADVERTISEMENT => {
                ICMPv6Message::MobilePrefix(nd::MobilePrefix::from_reader(
                    registry,
                    reader,
                    self.icmp_type,
                )?)
            }
            ICMPV6_CERTIFICATION_PATH_SOLICITATION | ICMPV6_CERTIFICATION_PATH_ADVERTISEMENT => {
                ICMPv6Message::CertificationPath(nd::CertificationPath::from_reader(
                    registry,
                    reader,
                    self.icmp_type,
                )?)
            }
            ICMPV6_MRD_ADVERTISEMENT | ICMPV6_MRD_SOLICITATION | ICMPV6_MRD_TERMINATION => {
                ICMPv6Message::MulticastRouterDiscovery(
                    nd::MulticastRouterDiscovery::from_reader(reader, self.icmp_type, self.code)?,
                )
            }
            ICMPV6_DUPLICATE_ADDRESS_REQUEST | ICMPV6_DUPLICATE_ADDRESS_CONFIRMATION => {
                ICMPv6Message::DuplicateAddress(nd::DuplicateAddress::from_reader(reader)?)
            }
            ICMPV6_ROUTER_RENUMBERING => ICMPv6Message::RouterRenumbering(
                renumbering::RouterRenumbering::from_reader(reader, self.code)?,
            ),
            ICMPV6_NODE_INFORMATION_QUERY | ICMPV6_NODE_INFORMATION_REPLY => {
                ICMPv6Message::NodeInformation(nodeinfo::NodeInformation::from_reader(
                    reader,
                    self.icmp_type,
                    self.code,
                )?)
            }
            ICMPV6_RPL_CONTROL => {
                ICMPv6Message::Rpl(rpl::RPLMessage::from_reader(registry, reader, self.code)?)
            }
            ICMPV6_MPL_CONTROL => ICMPv6Message::Mpl(mpl::MPLControl::from_reader(reader)?),
            _ => {
                log_debug!("ICMPv6 type {} not implemented", self.icmp_type);
                reader.note(Note::UnknownType(format!("ICMPv6 type {}", self.icmp_type)));
                ICMPv6Message::Unknown(ICMPv6Unknown {
                    data: reader.read_rest()?.into(),
                })
            }
        };

        Ok(message)
    }
}

impl Layer for ICMPv6 {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        self.icmp_type = cursor.read_u8(0)?;
        self.code = cursor.read_u8(1)?;
        self.checksum = cursor.read_u16(2)?;

        let mut reader = RecordReader::new(
            cursor,
            ICMPV6_HEADER_LENGTH,
            cursor.remaining(ICMPV6_HEADER_LENGTH),
            0,
        );
        self.message = self.message_from_reader(registry, &mut reader)?;
        let decoded = reader.offset();
        self.notes = reader.into_notes();

        Ok((None, decoded))
    }

    fn name(&self) -> &'static str {
        "ICMPv6"
    }

    fn short_name(&self) -> &'static str {
        "icmpv6"
    }

    fn transaction(&self) -> Option<(TransactionKey, Direction)> {
        let echo = match self.message {
            ICMPv6Message::Echo(ref echo) => echo,
            _ => return None,
        };
        let direction = if self.icmp_type == ICMPV6_ECHO_REQUEST {
            Direction::Request
        } else {
            Direction::Response
        };

        Some((
            TransactionKey {
                protocol: TransactionProtocol::Icmpv6Echo,
                id: echo.identifier() as u32,
                discriminator: echo.sequence_number() as u32,
            },
            direction,
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::packet::Packet;
    use crate::transactions::TransactionTracker;
    use crate::types::ENCAP_TYPE_ETH;

    fn decode(bytes: &str) -> (ICMPv6, serde_json::Value) {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(bytes).unwrap();

        let mut icmpv6 = ICMPv6::default();
        let (next, consumed) = icmpv6.decode_bytes(&registry, &bytes).unwrap();
        assert!(next.is_none());
        assert_eq!(consumed, bytes.len());

        let value = serde_json::to_value(&icmpv6).unwrap();
        (icmpv6, value)
    }

    #[test]
    fn icmpv6_echo_request_packet() {
        let registry = Registry::with_defaults().unwrap();
        let packet = hex::decode(concat!(
            "0050568a22800050568a0fe986dd6000000000403a40200105000100000000000000000000212001",
            "05000100000000000000000000258000c92a0e2000011ccc534f000000001e030f00000000001011",
            "12131415161718191a1b1c1d1e1f202122232425262728292a2b2c2d2e2f3031323334353637",
        ))
        .unwrap();

        let p = Packet::from_bytes(&registry, &packet, ENCAP_TYPE_ETH);
        assert!(p.is_ok());
        let p = p.unwrap();
        assert!(p.layers.len() == 3, "{:#?}", p);

        let icmpv6_packet = serde_json::to_value(&p.layers[2]).unwrap();
        assert_eq!(icmpv6_packet.get("type"), Some(&json!(128)));
        assert_eq!(icmpv6_packet.get("code"), Some(&json!(0)));
        assert_eq!(icmpv6_packet.get("checksum"), Some(&json!("0xc92a")));
        assert_eq!(icmpv6_packet.get("identifier"), Some(&json!(3616)));
        assert_eq!(icmpv6_packet.get("sequence_number"), Some(&json!(1)));
    }

    #[test]
    fn echo_transactions() {
        let tracker = TransactionTracker::new();

        let (request, _) = decode("8000c92a0e2000010102");
        let (reply, _) = decode("8100c82a0e2000010102");
        let (other, _) = decode("8100c82a0e2000020102");

        let (key, direction) = request.transaction().unwrap();
        assert_eq!(direction, Direction::Request);
        assert_eq!(key.protocol, TransactionProtocol::Icmpv6Echo);
        assert_eq!(key.id, 3616);

        tracker.observe(key, direction, 7);
        let (reply_key, direction) = reply.transaction().unwrap();
        tracker.observe(reply_key, direction, 9);
        assert_eq!(tracker.matched(&key), Some((7, 9)));

        let (other_key, _) = other.transaction().unwrap();
        assert_ne!(other_key, key);
    }

    #[test]
    fn parse_icmpv6_redirect_packet() {
        let registry = Registry::with_defaults().unwrap();
        let packet = hex::decode(concat!(
            "000c29231687000c2925cfa186dd6e00000000a03afffe80000000000000020c29fffe25cfa12001",
            "0db8000100009977f39e80cb4ea68900c07e00000000fe80000000000000020c29fffefc2c3b2001",
            "0db80002000000000000000000010201000c29fc2c3b040e0000000000006008b92f00403a3f2001",
            "0db8000100009977f39e80cb4ea620010db80002000000000000000000018000e7431d850001726b",
            "f85c000000009121080000000000101112131415161718191a1b1c1d1e1f20212223242526272829",
            "2a2b2c2d2e2f3031323334353637",
        ))
        .unwrap();

        let p = Packet::from_bytes(&registry, &packet, ENCAP_TYPE_ETH).unwrap();
        let icmpv6_packet = serde_json::to_value(&p.layers[2]).unwrap();
        assert_eq!(icmpv6_packet.get("type"), Some(&json!(137)));
        assert_eq!(icmpv6_packet.get("code"), Some(&json!(0)));
        assert_eq!(icmpv6_packet.get("checksum"), Some(&json!("0xc07e")));
        assert_eq!(
            icmpv6_packet.get("target_address"),
            Some(&json!("fe80::20c:29ff:fefc:2c3b"))
        );
        assert_eq!(
            icmpv6_packet.get("destination_address"),
            Some(&json!("2001:db8:2::1"))
        );

        let options = icmpv6_packet["options"].as_array().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(
            options[0]["value"]["target_link_layer_address"],
            json!("00:0c:29:fc:2c:3b")
        );
        let redirected = &options[1]["value"]["redirected_header"]["layers"];
        assert_eq!(redirected["ip6"]["dst_addr"], json!("2001:db8:2::1"));
        assert_eq!(redirected["icmpv6"]["type"], json!(128));
        assert_eq!(redirected["icmpv6"]["identifier"], json!(7557));
    }

    #[test]
    fn parse_icmpv6_neighbor_solicitation_packet() {
        let registry = Registry::with_defaults().unwrap();
        let packet = hex::decode(concat!(
            "3333ff0000250050568a0fe986dd6000000000203aff200105000100000000000000000000",
            "21ff0200000000000000000001ff0000258700c66e0000000020010500010000000000000000",
            "00002501010050568a0fe9",
        ))
        .unwrap();

        let p = Packet::from_bytes(&registry, &packet, ENCAP_TYPE_ETH).unwrap();
        let icmpv6_packet = serde_json::to_value(&p.layers[2]).unwrap();
        assert_eq!(icmpv6_packet.get("type"), Some(&json!(135)));
        assert_eq!(icmpv6_packet.get("checksum"), Some(&json!("0xc66e")));
        assert_eq!(
            icmpv6_packet.get("target_address"),
            Some(&json!("2001:500:100::25"))
        );
        assert_eq!(
            icmpv6_packet["options"][0]["value"]["source_link_layer_address"],
            json!("00:50:56:8a:0f:e9")
        );
    }

    #[test]
    fn parse_unsupported_icmp_type() {
        let (icmpv6, value) = decode(concat!(
            "100029db00000000",
            "20010500010000000000000000000025",
        ));
        assert_eq!(value.get("type"), Some(&json!(16)));
        assert_eq!(value.get("checksum"), Some(&json!("0x29db")));
        assert_eq!(
            value.get("data"),
            Some(&json!("0000000020010500010000000000000000000025"))
        );
        assert!(matches!(icmpv6.notes()[0], Note::UnknownType(_)));
        assert!(icmpv6.transaction().is_none());
    }

    #[test]
    fn destination_unreachable_quotes_the_invoking_packet() {
        let (icmpv6, value) = decode(concat!(
            "0104a1b200000000",
            // IPv6 header and the first bytes of a UDP datagram to port 53.
            "6000000000201140fe800000000000000000000000000001fe800000000000000000000000000002",
            "c3500035002000001234",
        ));
        assert_eq!(value["length"], json!(0));
        let quoted = &value["invoking_packet"]["layers"];
        assert_eq!(quoted["ip6"]["next_hdr"], json!(17));
        assert_eq!(quoted["udp"]["dst_port"], json!(53));
        assert_eq!(value["invoking_packet"]["unprocessed"], json!("1234"));

        // Two bytes of DNS are not a message.
        assert!(matches!(icmpv6.notes()[0], Note::MalformedField(_)));
    }

    #[test]
    fn packet_too_big_and_parameter_problem() {
        let (_, value) = decode(concat!(
            "02000000000005dc",
            "6000000000003b40fe800000000000000000000000000001fe800000000000000000000000000002",
        ));
        assert_eq!(value["mtu"], json!(1500));
        assert!(value.get("length").is_none());
        assert_eq!(value["invoking_packet"]["layers"]["ip6"]["next_hdr"], json!(59));

        let (_, value) = decode(concat!(
            "0401000000000028",
            "6000000000003b40fe800000000000000000000000000001fe800000000000000000000000000002",
        ));
        assert_eq!(value["pointer"], json!(40));
    }

    #[test]
    fn truncated_header_fails() {
        let registry = Registry::with_defaults().unwrap();
        let mut icmpv6 = ICMPv6::default();
        assert!(icmpv6.decode_bytes(&registry, &[0x80, 0x00]).is_err());
    }
}
