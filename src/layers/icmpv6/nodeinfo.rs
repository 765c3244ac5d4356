//! ICMPv6 Node Information Queries (RFC 4620)

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layers::dns::name::DNSName;
use crate::layers::dns::rdata::RecordReader;
use crate::layers::icmpv6::options::names_until_padding;
use crate::layers::icmpv6::ICMPV6_NODE_INFORMATION_QUERY;
use crate::types::{IPv4Address, IPv6Address};

pub const NI_QTYPE_NOOP: u16 = 0;
pub const NI_QTYPE_NODE_NAME: u16 = 2;
pub const NI_QTYPE_NODE_ADDRESSES: u16 = 3;
pub const NI_QTYPE_IPV4_ADDRESSES: u16 = 4;

pub const NI_SUBJECT_IPV6: u8 = 0;
pub const NI_SUBJECT_NAME: u8 = 1;
pub const NI_SUBJECT_IPV4: u8 = 2;

pub const NI_REPLY_SUCCESS: u8 = 0;

fn qtype_name(qtype: u16) -> &'static str {
    match qtype {
        NI_QTYPE_NOOP => "NOOP",
        1 => "Unused",
        NI_QTYPE_NODE_NAME => "Node Name",
        NI_QTYPE_NODE_ADDRESSES => "Node Addresses",
        NI_QTYPE_IPV4_ADDRESSES => "IPv4 Addresses",
        _ => "Unknown",
    }
}

/// Flags of the Node Addresses and IPv4 Addresses qtypes.
#[derive(Debug, Serialize)]
pub struct NodeInformationFlags {
    global: bool,
    site_local: bool,
    link_local: bool,
    compatible: bool,
    all: bool,
    truncated: bool,
}

impl From<u16> for NodeInformationFlags {
    fn from(flags: u16) -> Self {
        Self {
            global: flags & 0x0020 != 0,
            site_local: flags & 0x0010 != 0,
            link_local: flags & 0x0008 != 0,
            compatible: flags & 0x0004 != 0,
            all: flags & 0x0002 != 0,
            truncated: flags & 0x0001 != 0,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Ipv6(IPv6Address),
    Name(DNSName),
    Ipv4(IPv4Address),
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct AddressWithTTL<A> {
    ttl: u32,
    address: A,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyData {
    NodeName { ttl: u32, names: Vec<DNSName> },
    NodeAddresses(Vec<AddressWithTTL<IPv6Address>>),
    Ipv4Addresses(Vec<AddressWithTTL<IPv4Address>>),
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct NodeInformation {
    qtype: u16,
    qtype_name: &'static str,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    flags: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_flags: Option<NodeInformationFlags>,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u64")]
    nonce: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject: Option<Subject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplyData>,
}

fn checked_ttl(reader: &mut RecordReader) -> Result<u32, Error> {
    let ttl = reader.read_u32()?;
    if ttl & 0x8000_0000 != 0 {
        reader.note(Note::MalformedField(format!(
            "TTL {} is negative",
            ttl as i32
        )));
    }

    Ok(ttl)
}

fn subject_from_reader(reader: &mut RecordReader, code: u8) -> Result<Subject, Error> {
    let subject = match code {
        NI_SUBJECT_IPV6 => Subject::Ipv6(reader.read_array::<16>()?.into()),
        NI_SUBJECT_IPV4 => Subject::Ipv4(reader.read_array::<4>()?.into()),
        NI_SUBJECT_NAME => {
            reader.rebase();
            let name = reader.read_name()?;
            // A single label name is terminated by an extra zero octet.
            let rest = reader.read_rest()?;
            if rest.iter().any(|b| *b != 0) {
                reader.note(Note::MalformedField(
                    "trailing bytes after the subject name".to_string(),
                ));
            }
            Subject::Name(name)
        }
        _ => {
            reader.note(Note::UnknownType(format!("NI query code {}", code)));
            Subject::Unknown(reader.read_rest()?.into())
        }
    };

    Ok(subject)
}

fn reply_from_reader(reader: &mut RecordReader, qtype: u16) -> Result<ReplyData, Error> {
    let reply = match qtype {
        NI_QTYPE_NODE_NAME => {
            let ttl = checked_ttl(reader)?;
            reader.rebase();
            ReplyData::NodeName {
                ttl,
                names: names_until_padding(reader)?,
            }
        }
        NI_QTYPE_NODE_ADDRESSES => {
            let mut addresses = vec![];
            while !reader.is_empty() {
                addresses.push(AddressWithTTL {
                    ttl: checked_ttl(reader)?,
                    address: reader.read_array::<16>()?.into(),
                });
            }
            ReplyData::NodeAddresses(addresses)
        }
        NI_QTYPE_IPV4_ADDRESSES => {
            let mut addresses = vec![];
            while !reader.is_empty() {
                addresses.push(AddressWithTTL {
                    ttl: checked_ttl(reader)?,
                    address: reader.read_array::<4>()?.into(),
                });
            }
            ReplyData::Ipv4Addresses(addresses)
        }
        _ => {
            reader.note(Note::UnknownType(format!("NI qtype {}", qtype)));
            ReplyData::Unknown(reader.read_rest()?.into())
        }
    };

    Ok(reply)
}

impl NodeInformation {
    pub(crate) fn from_reader(
        reader: &mut RecordReader,
        icmp_type: u8,
        code: u8,
    ) -> Result<Self, Error> {
        let qtype = reader.read_u16()?;
        let flags = reader.read_u16()?;
        let nonce = reader.read_u64()?;

        let address_flags = match qtype {
            NI_QTYPE_NODE_ADDRESSES | NI_QTYPE_IPV4_ADDRESSES => Some(flags.into()),
            _ => None,
        };

        let mut info = Self {
            qtype,
            qtype_name: qtype_name(qtype),
            flags,
            address_flags,
            nonce,
            subject: None,
            reply: None,
        };

        if reader.is_empty() {
            return Ok(info);
        }

        if icmp_type == ICMPV6_NODE_INFORMATION_QUERY {
            info.subject = Some(subject_from_reader(reader, code)?);
        } else if code == NI_REPLY_SUCCESS && qtype != NI_QTYPE_NOOP {
            info.reply = Some(reply_from_reader(reader, qtype)?);
        } else {
            reader.note(Note::MalformedField(format!(
                "unexpected data in NI reply with code {}",
                code
            )));
            info.reply = Some(ReplyData::Unknown(reader.read_rest()?.into()));
        }

        Ok(info)
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
    fn node_name_query_by_address() {
        let value = decode(concat!(
            "8b000000",
            "00020000",
            "0102030405060708",
            "fe800000000000000000000000000001",
        ));
        assert_eq!(value["qtype_name"], json!("Node Name"));
        assert_eq!(value["nonce"], json!("0x0102030405060708"));
        assert_eq!(value["subject"], json!({"ipv6": "fe80::1"}));
        assert!(value.get("address_flags").is_none());
    }

    #[test]
    fn node_name_query_by_single_label_name() {
        let value = decode(concat!(
            "8b010000",
            "00020000",
            "0102030405060708",
            "04686f73740000",
        ));
        assert_eq!(value["subject"], json!({"name": "host"}));
    }

    #[test]
    fn node_name_reply() {
        let value = decode(concat!(
            "8c000000",
            "00020000",
            "0102030405060708",
            "0000003c",
            "04686f7374076578616d706c6500",
            "0000",
        ));
        assert_eq!(
            value["reply"],
            json!({"node_name": {"ttl": 60, "names": ["host.example"]}})
        );
    }

    #[test]
    fn node_addresses_reply() {
        let value = decode(concat!(
            "8c000000",
            "0003003e",
            "0102030405060708",
            "80000000",
            "20010db8000000000000000000000001",
        ));
        assert_eq!(value["address_flags"]["global"], json!(true));
        assert_eq!(value["address_flags"]["all"], json!(true));
        assert_eq!(value["address_flags"]["truncated"], json!(false));
        assert_eq!(
            value["reply"]["node_addresses"],
            json!([{"ttl": 2147483648u32, "address": "2001:db8::1"}])
        );
        assert_eq!(value["notes"][0]["kind"], json!("malformed_field"));
    }

    #[test]
    fn refused_reply_with_data() {
        let value = decode(concat!("8c010000", "00020000", "0102030405060708", "abcd"));
        assert_eq!(value["reply"], json!({"unknown": "abcd"}));
    }
}
