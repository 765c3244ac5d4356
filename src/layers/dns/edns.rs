//! EDNS(0) OPT pseudo-record (RFC 6891)
//!
//! The OPT record reuses the CLASS field for the requestor's UDP payload size and the TTL field
//! for the extended RCODE, the EDNS version and the DO flag. Its RDATA is a list of
//! `{code, length, value}` options.

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layers::dns::name::DNSName;
use crate::layers::dns::rdata::RecordReader;
use crate::types::{IPv4Address, IPv6Address};

pub const EDNS_NSID: u16 = 3;
pub const EDNS_DAU: u16 = 5;
pub const EDNS_DHU: u16 = 6;
pub const EDNS_N3U: u16 = 7;
pub const EDNS_CLIENT_SUBNET: u16 = 8;
pub const EDNS_EXPIRE: u16 = 9;
pub const EDNS_COOKIE: u16 = 10;
pub const EDNS_TCP_KEEPALIVE: u16 = 11;
pub const EDNS_PADDING: u16 = 12;
pub const EDNS_CHAIN: u16 = 13;
pub const EDNS_KEY_TAG: u16 = 14;
pub const EDNS_EXTENDED_ERROR: u16 = 15;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ClientSubnetAddress {
    IPv4(IPv4Address),
    IPv6(IPv6Address),
    #[serde(serialize_with = "hex::serde::serialize")]
    Raw(Vec<u8>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EDNSOptionValue {
    #[serde(serialize_with = "hex::serde::serialize")]
    Nsid(Vec<u8>),
    /// DAU, DHU and N3U: lists of algorithm numbers.
    Algorithms(Vec<u8>),
    ClientSubnet {
        family: u16,
        source_prefix_len: u8,
        scope_prefix_len: u8,
        address: ClientSubnetAddress,
    },
    Expire(Option<u32>),
    Cookie {
        #[serde(serialize_with = "hex::serde::serialize")]
        client: Vec<u8>,
        #[serde(
            skip_serializing_if = "Vec::is_empty",
            serialize_with = "hex::serde::serialize"
        )]
        server: Vec<u8>,
    },
    /// Idle timeout in units of 100 milliseconds, absent in queries.
    TcpKeepalive(Option<u16>),
    Padding(usize),
    Chain(DNSName),
    KeyTags(Vec<u16>),
    ExtendedError {
        info_code: u16,
        info: &'static str,
        #[serde(skip_serializing_if = "String::is_empty")]
        extra_text: String,
    },
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct EDNSOption {
    code: u16,
    length: u16,
    value: EDNSOptionValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct EDNSOpt {
    udp_payload_size: u16,
    extended_rcode: u8,
    version: u8,
    dnssec_ok: bool,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    z: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    options: Vec<EDNSOption>,
}

impl EDNSOpt {
    pub fn udp_payload_size(&self) -> u16 {
        self.udp_payload_size
    }

    /// Upper 8 bits of the 12 bit extended RCODE.
    pub fn extended_rcode(&self) -> u8 {
        self.extended_rcode
    }

    pub fn options(&self) -> &[EDNSOption] {
        &self.options
    }
}

impl EDNSOption {
    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn value(&self) -> &EDNSOptionValue {
        &self.value
    }
}

fn extended_error_info(code: u16) -> &'static str {
    match code {
        0 => "Other Error",
        1 => "Unsupported DNSKEY Algorithm",
        2 => "Unsupported DS Digest Type",
        3 => "Stale Answer",
        4 => "Forged Answer",
        5 => "DNSSEC Indeterminate",
        6 => "DNSSEC Bogus",
        7 => "Signature Expired",
        8 => "Signature Not Yet Valid",
        9 => "DNSKEY Missing",
        10 => "RRSIGs Missing",
        11 => "No Zone Key Bit Set",
        12 => "NSEC Missing",
        13 => "Cached Error",
        14 => "Not Ready",
        15 => "Blocked",
        16 => "Censored",
        17 => "Filtered",
        18 => "Prohibited",
        19 => "Stale NXDomain Answer",
        20 => "Not Authoritative",
        21 => "Not Supported",
        22 => "No Reachable Authority",
        23 => "Network Error",
        24 => "Invalid Data",
        _ => "Unknown",
    }
}

fn client_subnet_from_reader(reader: &mut RecordReader) -> Result<EDNSOptionValue, Error> {
    let family = reader.read_u16()?;
    let source_prefix_len = reader.read_u8()?;
    let scope_prefix_len = reader.read_u8()?;
    let address = reader.read_rest()?;

    let expected = (source_prefix_len as usize + 7) / 8;
    if address.len() != expected {
        reader.note(Note::MalformedField(format!(
            "client subnet address is {} bytes, source prefix length {} needs {}",
            address.len(),
            source_prefix_len,
            expected
        )));
    }

    let address = match family {
        1 if address.len() <= 4 => ClientSubnetAddress::IPv4(IPv4Address::from_prefix(address)),
        2 if address.len() <= 16 => ClientSubnetAddress::IPv6(IPv6Address::from_prefix(address)),
        _ => {
            reader.note(Note::MalformedField(format!(
                "client subnet family {} with {} address bytes",
                family,
                address.len()
            )));
            ClientSubnetAddress::Raw(address.into())
        }
    };

    Ok(EDNSOptionValue::ClientSubnet {
        family,
        source_prefix_len,
        scope_prefix_len,
        address,
    })
}

fn option_value_from_reader(
    reader: &mut RecordReader,
    code: u16,
) -> Result<EDNSOptionValue, Error> {
    let len = reader.remaining();

    let value = match code {
        EDNS_NSID => EDNSOptionValue::Nsid(reader.read_rest()?.into()),
        EDNS_DAU | EDNS_DHU | EDNS_N3U => EDNSOptionValue::Algorithms(reader.read_rest()?.into()),
        EDNS_CLIENT_SUBNET => client_subnet_from_reader(reader)?,
        EDNS_EXPIRE if len == 0 => EDNSOptionValue::Expire(None),
        EDNS_EXPIRE if len == 4 => EDNSOptionValue::Expire(Some(reader.read_u32()?)),
        EDNS_COOKIE if len == 8 || (16..=40).contains(&len) => EDNSOptionValue::Cookie {
            client: reader.read_bytes(8)?.into(),
            server: reader.read_rest()?.into(),
        },
        EDNS_TCP_KEEPALIVE if len == 0 => EDNSOptionValue::TcpKeepalive(None),
        EDNS_TCP_KEEPALIVE if len == 2 => EDNSOptionValue::TcpKeepalive(Some(reader.read_u16()?)),
        EDNS_PADDING => {
            reader.read_rest()?;
            EDNSOptionValue::Padding(len)
        }
        EDNS_CHAIN => EDNSOptionValue::Chain(reader.read_name()?),
        EDNS_KEY_TAG if len % 2 == 0 => {
            let mut tags = vec![];
            while !reader.is_empty() {
                tags.push(reader.read_u16()?);
            }
            EDNSOptionValue::KeyTags(tags)
        }
        EDNS_EXTENDED_ERROR => {
            let info_code = reader.read_u16()?;
            EDNSOptionValue::ExtendedError {
                info_code,
                info: extended_error_info(info_code),
                extra_text: String::from_utf8_lossy(reader.read_rest()?).into_owned(),
            }
        }
        EDNS_EXPIRE | EDNS_COOKIE | EDNS_TCP_KEEPALIVE | EDNS_KEY_TAG => {
            reader.note(Note::MalformedField(format!(
                "EDNS option {} with length {}",
                code, len
            )));
            EDNSOptionValue::Unknown(reader.read_rest()?.into())
        }
        _ => {
            reader.note(Note::UnknownType(format!("EDNS option {}", code)));
            EDNSOptionValue::Unknown(reader.read_rest()?.into())
        }
    };

    if !reader.is_empty() {
        reader.note(Note::MalformedField(format!(
            "{} trailing bytes in EDNS option {}",
            reader.remaining(),
            code
        )));
        reader.read_rest()?;
    }

    Ok(value)
}

/// Decode an OPT record, given the CLASS and TTL fields of its header.
pub fn decode_opt(reader: &mut RecordReader, class: u16, ttl: u32) -> Result<EDNSOpt, Error> {
    let mut options = vec![];
    while !reader.is_empty() {
        let code = reader.read_u16()?;
        let length = reader.read_u16()?;
        let mut option_reader = reader.sub_reader(length as usize)?;
        let value = option_value_from_reader(&mut option_reader, code)?;

        options.push(EDNSOption {
            code,
            length,
            value,
            notes: option_reader.into_notes(),
        });
    }

    Ok(EDNSOpt {
        udp_payload_size: class,
        extended_rcode: (ttl >> 24) as u8,
        version: (ttl >> 16) as u8,
        dnssec_ok: ttl & 0x8000 != 0,
        z: (ttl & 0x7fff) as u16,
        options,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::cursor::ByteCursor;

    fn decode(class: u16, ttl: u32, rdata: &str) -> serde_json::Value {
        let bytes = hex::decode(rdata).unwrap();
        let cursor = ByteCursor::new(&bytes);
        let mut reader = RecordReader::new(cursor, 0, bytes.len(), 0);
        let opt = decode_opt(&mut reader, class, ttl).unwrap();
        assert!(reader.is_empty());

        serde_json::to_value(&opt).unwrap()
    }

    #[test]
    fn opt_header_fields() {
        let opt = decode(4096, 0x0000_8000, "");
        assert_eq!(
            opt,
            json!({
                "udp_payload_size": 4096,
                "extended_rcode": 0,
                "version": 0,
                "dnssec_ok": true,
                "z": "0x0000"
            })
        );
    }

    #[test]
    fn cookie_and_keepalive() {
        let opt = decode(
            1232,
            0,
            "000a00080102030405060708000b0000000b000200c8",
        );
        assert_eq!(
            opt["options"],
            json!([
                {"code": 10, "length": 8, "value": {"cookie": {"client": "0102030405060708"}}},
                {"code": 11, "length": 0, "value": {"tcp_keepalive": null}},
                {"code": 11, "length": 2, "value": {"tcp_keepalive": 200}}
            ])
        );
    }

    #[test]
    fn bad_cookie_length() {
        let opt = decode(1232, 0, "000a0003010203");
        assert_eq!(opt["options"][0]["value"], json!({"unknown": "010203"}));
        assert_eq!(opt["options"][0]["notes"][0]["kind"], json!("malformed_field"));
    }

    #[test]
    fn client_subnet() {
        let opt = decode(512, 0, "0008000700011800c00002");
        assert_eq!(
            opt["options"][0]["value"],
            json!({"client_subnet": {
                "family": 1,
                "source_prefix_len": 24,
                "scope_prefix_len": 0,
                "address": "192.0.2.0"
            }})
        );

        // /56 with 8 address bytes
        let opt = decode(512, 0, "0008000c000238002001db8000000000");
        assert_eq!(
            opt["options"][0]["value"]["client_subnet"]["address"],
            json!("2001:db80::")
        );
        assert_eq!(
            opt["options"][0]["notes"].as_array().map(|n| n.len()),
            Some(1)
        );
    }

    #[test]
    fn extended_error_and_padding() {
        let text = hex::encode("no keys");
        let opt = decode(
            1232,
            0,
            &format!("000f0009 0009{}000c0004 00000000", text).replace(' ', ""),
        );
        assert_eq!(
            opt["options"][0]["value"],
            json!({"extended_error": {"info_code": 9, "info": "DNSKEY Missing", "extra_text": "no keys"}})
        );
        assert_eq!(opt["options"][1]["value"], json!({"padding": 4}));
    }

    #[test]
    fn option_past_rdata_fails() {
        let bytes = hex::decode("000a0010010203").unwrap();
        let cursor = ByteCursor::new(&bytes);
        let mut reader = RecordReader::new(cursor, 0, bytes.len(), 0);
        assert!(decode_opt(&mut reader, 512, 0).is_err());
    }

    #[test]
    fn unknown_option() {
        let opt = decode(512, 0, "fde90002abcd");
        assert_eq!(opt["options"][0]["value"], json!({"unknown": "abcd"}));
        assert_eq!(opt["options"][0]["notes"][0]["kind"], json!("unknown_type"));
    }
}
