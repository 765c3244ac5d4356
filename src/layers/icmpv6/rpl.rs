//! RPL Control Messages (RFC 6550, RFC 6997, RFC 9009)
//!
//! The code selects the base object. Codes with the high bit set are the secure variants: a
//! security section precedes the base, and for the encrypting levels everything after it is
//! ciphertext and is kept as is. Options follow the base; unlike ND options their length is in
//! octets and excludes the type and length octets, and Pad1 has no length octet at all.

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layers::dns::rdata::RecordReader;
use crate::layers::icmpv6::options::{PrefixInformation, RouteInformation};
use crate::registry::Registry;
use crate::types::IPv6Address;

pub const RPL_DIS: u8 = 0x00;
pub const RPL_DIO: u8 = 0x01;
pub const RPL_DAO: u8 = 0x02;
pub const RPL_DAO_ACK: u8 = 0x03;
pub const RPL_P2P_DRO: u8 = 0x04;
pub const RPL_P2P_DRO_ACK: u8 = 0x05;
pub const RPL_DCO: u8 = 0x07;
pub const RPL_DCO_ACK: u8 = 0x08;
pub const RPL_CONSISTENCY_CHECK: u8 = 0x8a;
pub const RPL_SECURE: u8 = 0x80;

pub const RPL_OPT_PAD1: u8 = 0x00;
pub const RPL_OPT_PADN: u8 = 0x01;
pub const RPL_OPT_METRIC_CONTAINER: u8 = 0x02;
pub const RPL_OPT_ROUTE_INFORMATION: u8 = 0x03;
pub const RPL_OPT_DODAG_CONFIGURATION: u8 = 0x04;
pub const RPL_OPT_TARGET: u8 = 0x05;
pub const RPL_OPT_TRANSIT_INFORMATION: u8 = 0x06;
pub const RPL_OPT_SOLICITED_INFORMATION: u8 = 0x07;
pub const RPL_OPT_PREFIX_INFORMATION: u8 = 0x08;
pub const RPL_OPT_TARGET_DESCRIPTOR: u8 = 0x09;
pub const RPL_OPT_P2P_ROUTE_DISCOVERY: u8 = 0x0a;

pub const METRIC_NODE_STATE_AND_ATTRIBUTE: u8 = 1;
pub const METRIC_NODE_ENERGY: u8 = 2;
pub const METRIC_HOP_COUNT: u8 = 3;
pub const METRIC_THROUGHPUT: u8 = 4;
pub const METRIC_LATENCY: u8 = 5;
pub const METRIC_LINK_QUALITY_LEVEL: u8 = 6;
pub const METRIC_ETX: u8 = 7;
pub const METRIC_LINK_COLOR: u8 = 8;

pub fn code_name(code: u8) -> &'static str {
    match code {
        RPL_DIS => "DODAG Information Solicitation",
        RPL_DIO => "DODAG Information Object",
        RPL_DAO => "Destination Advertisement Object",
        RPL_DAO_ACK => "Destination Advertisement Object Acknowledgment",
        RPL_P2P_DRO => "P2P Discovery Reply Object",
        RPL_P2P_DRO_ACK => "P2P Discovery Reply Object Acknowledgement",
        RPL_DCO => "Destination Cleanup Object",
        RPL_DCO_ACK => "Destination Cleanup Object Acknowledgement",
        0x80 => "Secure DODAG Information Solicitation",
        0x81 => "Secure DODAG Information Object",
        0x82 => "Secure Destination Advertisement Object",
        0x83 => "Secure Destination Advertisement Object Acknowledgment",
        0x84 => "Secure P2P Discovery Reply Object",
        0x85 => "Secure P2P Discovery Reply Object Acknowledgement",
        0x87 => "Secure Destination Cleanup Object",
        0x88 => "Secure Destination Cleanup Object Acknowledgement",
        RPL_CONSISTENCY_CHECK => "Consistency Check",
        _ => "Unknown",
    }
}

#[derive(Debug, Serialize)]
pub struct RPLSecurity {
    timestamp: bool,
    algorithm: u8,
    key_identifier_mode: u8,
    security_level: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    counter: u32,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_key_source"
    )]
    key_source: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_index: Option<u8>,
}

fn serialize_key_source<S>(value: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(source) => crate::types::hex::serialize_lower_hex_u64(source, serializer),
        None => serializer.serialize_none(),
    }
}

impl RPLSecurity {
    fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let timestamp = reader.read_u8()? & 0x80 != 0;
        let algorithm = reader.read_u8()?;
        let kim_lvl = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let counter = reader.read_u32()?;

        let key_identifier_mode = kim_lvl >> 6;
        let security_level = kim_lvl & 0x07;
        let (has_source, has_index) = match key_identifier_mode {
            0 => (false, true),
            1 => (false, false),
            2 => (true, true),
            _ => {
                let encrypted = security_level & 0x01 != 0;
                (encrypted, encrypted)
            }
        };
        let key_source = if has_source {
            Some(reader.read_u64()?)
        } else {
            None
        };
        let key_index = if has_index {
            Some(reader.read_u8()?)
        } else {
            None
        };

        Ok(Self {
            timestamp,
            algorithm,
            key_identifier_mode,
            security_level,
            flags,
            counter,
            key_source,
            key_index,
        })
    }

    /// Levels 1 and 3 encrypt the message.
    fn is_encrypted(&self) -> bool {
        self.security_level & 0x01 != 0
    }

    fn mic_length(&self) -> usize {
        if self.security_level < 2 {
            4
        } else {
            8
        }
    }
}

fn optional_dodag_id(reader: &mut RecordReader, present: bool) -> Result<Option<IPv6Address>, Error> {
    if present {
        Ok(Some(reader.read_array::<16>()?.into()))
    } else {
        Ok(None)
    }
}

#[derive(Debug, Serialize)]
pub struct DIS {
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
}

#[derive(Debug, Serialize)]
pub struct DIO {
    instance_id: u8,
    version: u8,
    rank: u16,
    grounded: bool,
    mode_of_operation: u8,
    dodag_preference: u8,
    dtsn: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    dodag_id: IPv6Address,
}

#[derive(Debug, Serialize)]
pub struct DAO {
    instance_id: u8,
    ack_requested: bool,
    sequence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    dodag_id: Option<IPv6Address>,
}

/// DAO-ACK and DCO-ACK.
#[derive(Debug, Serialize)]
pub struct Acknowledgement {
    instance_id: u8,
    sequence: u8,
    status: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    dodag_id: Option<IPv6Address>,
}

#[derive(Debug, Serialize)]
pub struct DCO {
    instance_id: u8,
    ack_requested: bool,
    status: u8,
    sequence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    dodag_id: Option<IPv6Address>,
}

#[derive(Debug, Serialize)]
pub struct P2PDRO {
    instance_id: u8,
    version: u8,
    stop: bool,
    ack_required: bool,
    sequence: u8,
    dodag_id: IPv6Address,
}

#[derive(Debug, Serialize)]
pub struct P2PDROAck {
    instance_id: u8,
    version: u8,
    sequence: u8,
    dodag_id: IPv6Address,
}

#[derive(Debug, Serialize)]
pub struct ConsistencyCheck {
    instance_id: u8,
    response: bool,
    nonce: u16,
    dodag_id: IPv6Address,
    destination_counter: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RPLBase {
    Dis(DIS),
    Dio(DIO),
    Dao(DAO),
    DaoAck(Acknowledgement),
    P2pDro(P2PDRO),
    P2pDroAck(P2PDROAck),
    Dco(DCO),
    DcoAck(Acknowledgement),
    ConsistencyCheck(ConsistencyCheck),
}

impl RPLBase {
    /// `code` without the secure bit, except for the Consistency Check which is always secure.
    fn from_reader(reader: &mut RecordReader, code: u8) -> Result<Option<Self>, Error> {
        let base = match code {
            RPL_DIS => {
                let flags = reader.read_u8()?;
                reader.skip(1)?;
                RPLBase::Dis(DIS { flags })
            }
            RPL_DIO => {
                let instance_id = reader.read_u8()?;
                let version = reader.read_u8()?;
                let rank = reader.read_u16()?;
                let g_mop_prf = reader.read_u8()?;
                let dtsn = reader.read_u8()?;
                let flags = reader.read_u8()?;
                reader.skip(1)?;
                RPLBase::Dio(DIO {
                    instance_id,
                    version,
                    rank,
                    grounded: g_mop_prf & 0x80 != 0,
                    mode_of_operation: (g_mop_prf >> 3) & 0x07,
                    dodag_preference: g_mop_prf & 0x07,
                    dtsn,
                    flags,
                    dodag_id: reader.read_array::<16>()?.into(),
                })
            }
            RPL_DAO => {
                let instance_id = reader.read_u8()?;
                let flags = reader.read_u8()?;
                reader.skip(1)?;
                let sequence = reader.read_u8()?;
                RPLBase::Dao(DAO {
                    instance_id,
                    ack_requested: flags & 0x80 != 0,
                    sequence,
                    dodag_id: optional_dodag_id(reader, flags & 0x40 != 0)?,
                })
            }
            RPL_DAO_ACK | RPL_DCO_ACK => {
                let instance_id = reader.read_u8()?;
                let flags = reader.read_u8()?;
                let sequence = reader.read_u8()?;
                let status = reader.read_u8()?;
                let ack = Acknowledgement {
                    instance_id,
                    sequence,
                    status,
                    dodag_id: optional_dodag_id(reader, flags & 0x80 != 0)?,
                };
                if code == RPL_DAO_ACK {
                    RPLBase::DaoAck(ack)
                } else {
                    RPLBase::DcoAck(ack)
                }
            }
            RPL_DCO => {
                let instance_id = reader.read_u8()?;
                let flags = reader.read_u8()?;
                let status = reader.read_u8()?;
                let sequence = reader.read_u8()?;
                RPLBase::Dco(DCO {
                    instance_id,
                    ack_requested: flags & 0x80 != 0,
                    status,
                    sequence,
                    dodag_id: optional_dodag_id(reader, flags & 0x40 != 0)?,
                })
            }
            RPL_P2P_DRO => {
                let instance_id = reader.read_u8()?;
                let version = reader.read_u8()?;
                let flags = reader.read_u16()?;
                RPLBase::P2pDro(P2PDRO {
                    instance_id,
                    version,
                    stop: flags & 0x8000 != 0,
                    ack_required: flags & 0x4000 != 0,
                    sequence: ((flags >> 12) & 0x03) as u8,
                    dodag_id: reader.read_array::<16>()?.into(),
                })
            }
            RPL_P2P_DRO_ACK => {
                let instance_id = reader.read_u8()?;
                let version = reader.read_u8()?;
                let sequence = (reader.read_u16()? >> 14) as u8;
                RPLBase::P2pDroAck(P2PDROAck {
                    instance_id,
                    version,
                    sequence,
                    dodag_id: reader.read_array::<16>()?.into(),
                })
            }
            RPL_CONSISTENCY_CHECK => {
                let instance_id = reader.read_u8()?;
                let flags = reader.read_u8()?;
                RPLBase::ConsistencyCheck(ConsistencyCheck {
                    instance_id,
                    response: flags & 0x80 != 0,
                    nonce: reader.read_u16()?,
                    dodag_id: reader.read_array::<16>()?.into(),
                    destination_counter: reader.read_u32()?,
                })
            }
            _ => return Ok(None),
        };

        Ok(Some(base))
    }
}

#[derive(Debug, Serialize)]
pub struct MetricFlags {
    recorded: bool,
    constraint: bool,
    optional: bool,
    reliability: bool,
    aggregation: u8,
    precedence: u8,
}

impl From<u16> for MetricFlags {
    fn from(flags: u16) -> Self {
        Self {
            recorded: flags & 0x0400 != 0,
            constraint: flags & 0x0200 != 0,
            optional: flags & 0x0100 != 0,
            reliability: flags & 0x0080 != 0,
            aggregation: ((flags >> 4) & 0x07) as u8,
            precedence: (flags & 0x0f) as u8,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NodeEnergy {
    included: bool,
    node_type: u8,
    estimation: bool,
    energy: u8,
}

#[derive(Debug, Serialize)]
pub struct LinkQuality {
    value: u8,
    counter: u8,
}

#[derive(Debug, Serialize)]
pub struct LinkColor {
    color: u16,
    counter: u8,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricValue {
    NodeStateAndAttribute {
        aggregator: bool,
        overloaded: bool,
        #[serde(
            skip_serializing_if = "Vec::is_empty",
            serialize_with = "hex::serde::serialize"
        )]
        tlvs: Vec<u8>,
    },
    NodeEnergy(Vec<NodeEnergy>),
    HopCount(Vec<u8>),
    Throughput(Vec<u32>),
    Latency(Vec<u32>),
    LinkQualityLevel(Vec<LinkQuality>),
    Etx(Vec<u16>),
    LinkColor(Vec<LinkColor>),
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct MetricObject {
    #[serde(rename = "type")]
    metric_type: u8,
    flags: MetricFlags,
    length: u8,
    value: MetricValue,
}

/// Fixed width entries filling the rest of `reader`, a partial entry is noted and skipped.
fn entries<T>(
    reader: &mut RecordReader,
    width: usize,
    mut entry: impl FnMut(&mut RecordReader) -> Result<T, Error>,
) -> Result<Vec<T>, Error> {
    let mut out = vec![];
    while reader.remaining() >= width {
        out.push(entry(reader)?);
    }
    if !reader.is_empty() {
        reader.note(Note::MalformedField(format!(
            "{} trailing bytes in metric object",
            reader.remaining()
        )));
        reader.skip(reader.remaining())?;
    }

    Ok(out)
}

fn metric_value(reader: &mut RecordReader, metric_type: u8) -> Result<MetricValue, Error> {
    let value = match metric_type {
        METRIC_NODE_STATE_AND_ATTRIBUTE => {
            reader.skip(1)?;
            let flags = reader.read_u8()?;
            MetricValue::NodeStateAndAttribute {
                aggregator: flags & 0x02 != 0,
                overloaded: flags & 0x01 != 0,
                tlvs: reader.read_rest()?.into(),
            }
        }
        METRIC_NODE_ENERGY => MetricValue::NodeEnergy(entries(reader, 2, |r| {
            let flags = r.read_u8()?;
            Ok(NodeEnergy {
                included: flags & 0x08 != 0,
                node_type: (flags >> 1) & 0x03,
                estimation: flags & 0x01 != 0,
                energy: r.read_u8()?,
            })
        })?),
        METRIC_HOP_COUNT => MetricValue::HopCount(entries(reader, 2, |r| {
            r.skip(1)?;
            r.read_u8()
        })?),
        METRIC_THROUGHPUT => MetricValue::Throughput(entries(reader, 4, |r| r.read_u32())?),
        METRIC_LATENCY => MetricValue::Latency(entries(reader, 4, |r| r.read_u32())?),
        METRIC_LINK_QUALITY_LEVEL => {
            reader.skip(1)?;
            MetricValue::LinkQualityLevel(entries(reader, 1, |r| {
                let lql = r.read_u8()?;
                Ok(LinkQuality {
                    value: lql >> 5,
                    counter: lql & 0x1f,
                })
            })?)
        }
        METRIC_ETX => MetricValue::Etx(entries(reader, 2, |r| r.read_u16())?),
        METRIC_LINK_COLOR => {
            reader.skip(1)?;
            MetricValue::LinkColor(entries(reader, 2, |r| {
                let lc = r.read_u16()?;
                Ok(LinkColor {
                    color: lc >> 6,
                    counter: (lc & 0x3f) as u8,
                })
            })?)
        }
        _ => {
            reader.note(Note::UnknownType(format!("routing metric type {}", metric_type)));
            MetricValue::Unknown(reader.read_rest()?.into())
        }
    };

    Ok(value)
}

fn metric_container(reader: &mut RecordReader) -> Result<Vec<MetricObject>, Error> {
    let mut objects = vec![];

    while !reader.is_empty() {
        let metric_type = reader.read_u8()?;
        let flags = reader.read_u16()?;
        let length = reader.read_u8()?;

        let mut body = reader.sub_reader(length as usize)?;
        let value = metric_value(&mut body, metric_type)?;
        for note in body.into_notes() {
            reader.note(note);
        }

        objects.push(MetricObject {
            metric_type,
            flags: flags.into(),
            length,
            value,
        });
    }

    Ok(objects)
}

#[derive(Debug, Serialize)]
pub struct DODAGConfiguration {
    authentication: bool,
    path_control_size: u8,
    dio_interval_doublings: u8,
    dio_interval_min: u8,
    dio_redundancy_constant: u8,
    max_rank_increase: u16,
    min_hop_rank_increase: u16,
    objective_code_point: u16,
    default_lifetime: u8,
    lifetime_unit: u16,
}

#[derive(Debug, Serialize)]
pub struct RPLTarget {
    prefix_length: u8,
    target: IPv6Address,
}

#[derive(Debug, Serialize)]
pub struct TransitInformation {
    external: bool,
    path_control: u8,
    path_sequence: u8,
    path_lifetime: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_address: Option<IPv6Address>,
}

#[derive(Debug, Serialize)]
pub struct SolicitedInformation {
    instance_id: u8,
    version_predicate: bool,
    instance_id_predicate: bool,
    dodag_id_predicate: bool,
    dodag_id: IPv6Address,
    version: u8,
}

/// P2P Route Discovery option (RFC 6997 Section 7). Addresses are carried with their first
/// `compression` octets elided and are shown as the remaining octets.
#[derive(Debug, Serialize)]
pub struct P2PRouteDiscovery {
    reply: bool,
    hop_by_hop: bool,
    routes: u8,
    compression: u8,
    lifetime: u16,
    max_rank_nh: u8,
    target: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    addresses: Vec<String>,
}

fn p2p_lifetime(l: u8) -> u16 {
    match l {
        0 => 1,
        1 => 4,
        2 => 16,
        _ => 64,
    }
}

impl P2PRouteDiscovery {
    fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let first = reader.read_u8()?;
        let second = reader.read_u8()?;
        let compression = first & 0x0f;
        let width = 16 - compression as usize;

        let target = hex::encode(reader.read_bytes(width)?);
        let mut addresses = vec![];
        while reader.remaining() >= width && width > 0 {
            addresses.push(hex::encode(reader.read_bytes(width)?));
        }
        if !reader.is_empty() {
            reader.note(Note::MalformedField(
                "partial address in the P2P route discovery option".to_string(),
            ));
            reader.skip(reader.remaining())?;
        }

        Ok(Self {
            reply: first & 0x80 != 0,
            hop_by_hop: first & 0x40 != 0,
            routes: (first >> 4) & 0x03,
            compression,
            lifetime: p2p_lifetime(second >> 6),
            max_rank_nh: second & 0x3f,
            target,
            addresses,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RPLOptionValue {
    Pad1,
    PadN(u8),
    DagMetricContainer(Vec<MetricObject>),
    RouteInformation(RouteInformation),
    DodagConfiguration(DODAGConfiguration),
    RplTarget(RPLTarget),
    TransitInformation(TransitInformation),
    SolicitedInformation(SolicitedInformation),
    PrefixInformation(PrefixInformation),
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
    TargetDescriptor(u32),
    P2pRouteDiscovery(P2PRouteDiscovery),
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct RPLOption {
    #[serde(rename = "type")]
    option_type: u8,
    length: u8,
    value: RPLOptionValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl RPLOption {
    pub fn option_type(&self) -> u8 {
        self.option_type
    }

    pub fn value(&self) -> &RPLOptionValue {
        &self.value
    }
}

fn option_value(reader: &mut RecordReader, option_type: u8) -> Result<RPLOptionValue, Error> {
    let value = match option_type {
        RPL_OPT_PADN => {
            let n = reader.remaining() as u8;
            reader.skip(reader.remaining())?;
            RPLOptionValue::PadN(n)
        }
        RPL_OPT_METRIC_CONTAINER => RPLOptionValue::DagMetricContainer(metric_container(reader)?),
        RPL_OPT_ROUTE_INFORMATION => {
            RPLOptionValue::RouteInformation(RouteInformation::from_reader(reader)?)
        }
        RPL_OPT_DODAG_CONFIGURATION => {
            let flags = reader.read_u8()?;
            let dio_interval_doublings = reader.read_u8()?;
            let dio_interval_min = reader.read_u8()?;
            let dio_redundancy_constant = reader.read_u8()?;
            let max_rank_increase = reader.read_u16()?;
            let min_hop_rank_increase = reader.read_u16()?;
            let objective_code_point = reader.read_u16()?;
            reader.skip(1)?;
            RPLOptionValue::DodagConfiguration(DODAGConfiguration {
                authentication: flags & 0x08 != 0,
                path_control_size: flags & 0x07,
                dio_interval_doublings,
                dio_interval_min,
                dio_redundancy_constant,
                max_rank_increase,
                min_hop_rank_increase,
                objective_code_point,
                default_lifetime: reader.read_u8()?,
                lifetime_unit: reader.read_u16()?,
            })
        }
        RPL_OPT_TARGET => {
            reader.skip(1)?;
            RPLOptionValue::RplTarget(RPLTarget {
                prefix_length: reader.read_u8()?,
                target: IPv6Address::from_prefix(reader.read_rest()?),
            })
        }
        RPL_OPT_TRANSIT_INFORMATION => {
            let flags = reader.read_u8()?;
            let path_control = reader.read_u8()?;
            let path_sequence = reader.read_u8()?;
            let path_lifetime = reader.read_u8()?;
            let parent_address = if reader.remaining() >= 16 {
                Some(reader.read_array::<16>()?.into())
            } else {
                None
            };
            RPLOptionValue::TransitInformation(TransitInformation {
                external: flags & 0x80 != 0,
                path_control,
                path_sequence,
                path_lifetime,
                parent_address,
            })
        }
        RPL_OPT_SOLICITED_INFORMATION => {
            let instance_id = reader.read_u8()?;
            let flags = reader.read_u8()?;
            RPLOptionValue::SolicitedInformation(SolicitedInformation {
                instance_id,
                version_predicate: flags & 0x80 != 0,
                instance_id_predicate: flags & 0x40 != 0,
                dodag_id_predicate: flags & 0x20 != 0,
                dodag_id: reader.read_array::<16>()?.into(),
                version: reader.read_u8()?,
            })
        }
        RPL_OPT_PREFIX_INFORMATION => {
            RPLOptionValue::PrefixInformation(PrefixInformation::from_reader(reader)?)
        }
        RPL_OPT_TARGET_DESCRIPTOR => RPLOptionValue::TargetDescriptor(reader.read_u32()?),
        RPL_OPT_P2P_ROUTE_DISCOVERY => {
            RPLOptionValue::P2pRouteDiscovery(P2PRouteDiscovery::from_reader(reader)?)
        }
        _ => {
            log_debug!("RPL option type {} not implemented", option_type);
            reader.note(Note::UnknownType(format!("RPL option type {}", option_type)));
            RPLOptionValue::Unknown(reader.read_rest()?.into())
        }
    };

    Ok(value)
}

/// Decode the RPL options filling the rest of `reader`.
pub fn rpl_options_from_reader(reader: &mut RecordReader) -> Result<Vec<RPLOption>, Error> {
    let mut options = vec![];

    while !reader.is_empty() {
        let option_type = reader.read_u8()?;
        if option_type == RPL_OPT_PAD1 {
            options.push(RPLOption {
                option_type,
                length: 0,
                value: RPLOptionValue::Pad1,
                notes: vec![],
            });
            continue;
        }

        let length = reader.read_u8()?;
        let mut body = reader.sub_reader(length as usize)?;
        let value = option_value(&mut body, option_type)?;
        options.push(RPLOption {
            option_type,
            length,
            value,
            notes: body.into_notes(),
        });
    }

    Ok(options)
}

#[derive(Debug, Serialize)]
pub struct RPLMessage {
    code_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    security: Option<RPLSecurity>,
    #[serde(flatten)]
    base: Option<RPLBase>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<RPLOption>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    encrypted: Vec<u8>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    mic: Vec<u8>,
}

impl RPLMessage {
    pub fn base(&self) -> Option<&RPLBase> {
        self.base.as_ref()
    }

    pub fn options(&self) -> &[RPLOption] {
        &self.options
    }

    pub(crate) fn from_reader(
        _registry: &Registry,
        reader: &mut RecordReader,
        code: u8,
    ) -> Result<Self, Error> {
        let mut message = RPLMessage {
            code_name: code_name(code),
            security: None,
            base: None,
            options: vec![],
            encrypted: vec![],
            mic: vec![],
        };

        let secure = code & RPL_SECURE != 0;
        let base_code = if code == RPL_CONSISTENCY_CHECK {
            code
        } else {
            code & !RPL_SECURE
        };

        if !secure {
            return message.with_base(reader, base_code);
        }

        let security = RPLSecurity::from_reader(reader)?;
        if security.is_encrypted() {
            message.encrypted = reader.read_rest()?.into();
            message.security = Some(security);
            return Ok(message);
        }

        let mic_length = security.mic_length();
        message.security = Some(security);
        if reader.remaining() < mic_length {
            reader.note(Note::MalformedField(
                "message too short for its integrity check".to_string(),
            ));
            return message.with_base(reader, base_code);
        }

        let mut payload = reader.sub_reader(reader.remaining() - mic_length)?;
        let mut message = message.with_base(&mut payload, base_code)?;
        for note in payload.into_notes() {
            reader.note(note);
        }
        message.mic = reader.read_rest()?.into();

        Ok(message)
    }

    fn with_base(mut self, reader: &mut RecordReader, code: u8) -> Result<Self, Error> {
        match RPLBase::from_reader(reader, code)? {
            Some(base) => {
                self.base = Some(base);
                self.options = rpl_options_from_reader(reader)?;
            }
            None => {
                reader.note(Note::UnknownType(format!("RPL code {:#04x}", code)));
                self.encrypted = reader.read_rest()?.into();
            }
        }

        Ok(self)
    }
}
