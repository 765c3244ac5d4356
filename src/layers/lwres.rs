//! Handling of the BIND lightweight resolver protocol (LWRES)
//!
//! Every packet starts with a 28 byte header followed by the opcode specific request or
//! response structure. Strings are a 16 bit length, the bytes and a terminating NUL that the
//! length does not count. The RDATA returned by GETRDATABYNAME is decoded with the DNS record
//! decoders, names inside it resolve against the start of each RDATA.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::{Error, Note};
use crate::layer::Layer;
use crate::layers::dns::name::DNSName;
use crate::layers::dns::rdata::{decode_rdata, DNSRecordData, RecordReader};
use crate::registry::Registry;
use crate::types::{IPv4Address, IPv6Address};

pub const LWRES_PORT: u16 = 921;

pub const LWRES_OPCODE_NOOP: u32 = 0x0000_0000;
pub const LWRES_OPCODE_GETADDRSBYNAME: u32 = 0x0001_0001;
pub const LWRES_OPCODE_GETNAMEBYADDR: u32 = 0x0001_0002;
pub const LWRES_OPCODE_GETRDATABYNAME: u32 = 0x0001_0003;

const LWRES_HEADER_LENGTH: usize = 28;
const LWRES_FLAG_RESPONSE: u16 = 0x0001;

// Register ourselves with parent
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.udp_ports.register(LWRES_PORT, LWRES::creator)
}

fn opcode_name(opcode: u32) -> &'static str {
    match opcode {
        LWRES_OPCODE_NOOP => "NOOP",
        LWRES_OPCODE_GETADDRSBYNAME => "GETADDRSBYNAME",
        LWRES_OPCODE_GETNAMEBYADDR => "GETNAMEBYADDR",
        LWRES_OPCODE_GETRDATABYNAME => "GETRDATABYNAME",
        _ => "Unknown",
    }
}

fn result_name(result: u32) -> &'static str {
    match result {
        0 => "SUCCESS",
        1 => "NOMEMORY",
        2 => "TIMEOUT",
        3 => "NOTFOUND",
        4 => "UNEXPECTEDEND",
        5 => "FAILURE",
        6 => "IOERROR",
        7 => "NOTIMPLEMENTED",
        8 => "UNEXPECTED",
        9 => "TRAILINGDATA",
        10 => "INCOMPLETE",
        11 => "RETRY",
        12 => "TYPENOTFOUND",
        13 => "TOOLARGE",
        _ => "Unknown",
    }
}

fn lwres_string(reader: &mut RecordReader) -> Result<String, Error> {
    let len = reader.read_u16()? as usize;
    let value = String::from_utf8_lossy(reader.read_bytes(len)?).into_owned();
    if reader.read_u8()? != 0 {
        reader.note(Note::MalformedField(format!(
            "string \"{}\" is not NUL terminated",
            value
        )));
    }

    Ok(value)
}

#[derive(Debug, Serialize)]
pub struct LWRESAddress {
    family: u32,
    length: u16,
    address: String,
}

impl LWRESAddress {
    fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let family = reader.read_u32()?;
        let length = reader.read_u16()?;
        let address = match length {
            4 => IPv4Address::from(reader.read_array::<4>()?).to_string(),
            16 => IPv6Address::from(reader.read_array::<16>()?).to_string(),
            _ => hex::encode(reader.read_bytes(length as usize)?),
        };

        Ok(Self {
            family,
            length,
            address,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LWRESRecord {
    rdlength: u16,
    rdata: DNSRecordData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LWRESBody {
    Noop {
        #[serde(serialize_with = "hex::serde::serialize")]
        data: Vec<u8>,
    },
    GetAddrsByNameRequest {
        #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
        flags: u32,
        #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
        address_types: u32,
        name: String,
    },
    GetAddrsByNameResponse {
        #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
        flags: u32,
        real_name: String,
        aliases: Vec<String>,
        addresses: Vec<LWRESAddress>,
    },
    GetNameByAddrRequest {
        #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
        flags: u32,
        address: LWRESAddress,
    },
    GetNameByAddrResponse {
        #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
        flags: u32,
        real_name: String,
        aliases: Vec<String>,
    },
    GetRdataByNameRequest {
        #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
        flags: u32,
        class: u16,
        #[serde(rename = "type")]
        type_: u16,
        name: String,
    },
    GetRdataByNameResponse {
        #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
        flags: u32,
        class: u16,
        #[serde(rename = "type")]
        type_: u16,
        ttl: u32,
        real_name: String,
        rdatas: Vec<LWRESRecord>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        signatures: Vec<String>,
    },
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Default, Serialize)]
pub struct LWRES {
    length: u32,
    version: u16,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    flags: u16,
    serial: u32,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u32")]
    opcode: u32,
    opcode_name: &'static str,
    result: u32,
    result_name: &'static str,
    recv_length: u32,
    auth_type: u16,
    auth_length: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<LWRESBody>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl LWRES {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<LWRES>::default()
    }

    pub fn is_response(&self) -> bool {
        self.flags & LWRES_FLAG_RESPONSE != 0
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }

    pub fn body(&self) -> Option<&LWRESBody> {
        self.body.as_ref()
    }

    fn rdata_from_reader(
        reader: &mut RecordReader,
        class: u16,
        type_: u16,
        ttl: u32,
    ) -> Result<LWRESRecord, Error> {
        let rdlength = reader.read_u16()?;
        let mut window = reader.sub_reader(rdlength as usize)?;
        window.rebase();

        let rdata = decode_rdata(&mut window, type_, class, ttl)?;
        if !window.is_empty() {
            window.note(Note::MalformedField(format!(
                "{} bytes of RDATA left undecoded",
                window.remaining()
            )));
            window.skip(window.remaining())?;
        }
        for note in window.into_notes() {
            reader.note(note);
        }

        Ok(LWRESRecord { rdlength, rdata })
    }

    fn body_from_reader(&self, reader: &mut RecordReader) -> Result<LWRESBody, Error> {
        let response = self.is_response();
        let body = match self.opcode {
            LWRES_OPCODE_NOOP => {
                let len = reader.read_u16()? as usize;
                LWRESBody::Noop {
                    data: reader.read_bytes(len)?.into(),
                }
            }
            LWRES_OPCODE_GETADDRSBYNAME if !response => LWRESBody::GetAddrsByNameRequest {
                flags: reader.read_u32()?,
                address_types: reader.read_u32()?,
                name: lwres_string(reader)?,
            },
            LWRES_OPCODE_GETADDRSBYNAME => {
                let flags = reader.read_u32()?;
                let naliases = reader.read_u16()?;
                let naddrs = reader.read_u16()?;
                let real_name = lwres_string(reader)?;
                let mut aliases = vec![];
                for _ in 0..naliases {
                    aliases.push(lwres_string(reader)?);
                }
                let mut addresses = vec![];
                for _ in 0..naddrs {
                    addresses.push(LWRESAddress::from_reader(reader)?);
                }
                LWRESBody::GetAddrsByNameResponse {
                    flags,
                    real_name,
                    aliases,
                    addresses,
                }
            }
            LWRES_OPCODE_GETNAMEBYADDR if !response => LWRESBody::GetNameByAddrRequest {
                flags: reader.read_u32()?,
                address: LWRESAddress::from_reader(reader)?,
            },
            LWRES_OPCODE_GETNAMEBYADDR => {
                let flags = reader.read_u32()?;
                let naliases = reader.read_u16()?;
                let real_name = lwres_string(reader)?;
                let mut aliases = vec![];
                for _ in 0..naliases {
                    aliases.push(lwres_string(reader)?);
                }
                LWRESBody::GetNameByAddrResponse {
                    flags,
                    real_name,
                    aliases,
                }
            }
            LWRES_OPCODE_GETRDATABYNAME if !response => LWRESBody::GetRdataByNameRequest {
                flags: reader.read_u32()?,
                class: reader.read_u16()?,
                type_: reader.read_u16()?,
                name: lwres_string(reader)?,
            },
            LWRES_OPCODE_GETRDATABYNAME => {
                let flags = reader.read_u32()?;
                let class = reader.read_u16()?;
                let type_ = reader.read_u16()?;
                let ttl = reader.read_u32()?;
                let nrdatas = reader.read_u16()?;
                let nsigs = reader.read_u16()?;
                let real_name = lwres_string(reader)?;

                let mut rdatas = vec![];
                for _ in 0..nrdatas {
                    rdatas.push(Self::rdata_from_reader(reader, class, type_, ttl)?);
                }
                let mut signatures = vec![];
                for _ in 0..nsigs {
                    let len = reader.read_u16()? as usize;
                    signatures.push(hex::encode(reader.read_bytes(len)?));
                }
                LWRESBody::GetRdataByNameResponse {
                    flags,
                    class,
                    type_,
                    ttl,
                    real_name,
                    rdatas,
                    signatures,
                }
            }
            _ => {
                log_debug!("LWRES opcode {:#010x} not implemented", self.opcode);
                reader.note(Note::UnknownType(format!("LWRES opcode {:#010x}", self.opcode)));
                LWRESBody::Unknown(reader.read_rest()?.into())
            }
        };

        Ok(body)
    }
}

impl Layer for LWRES {
    fn decode_bytes(
        &mut self,
        _registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        self.length = cursor.read_u32(0)?;
        self.version = cursor.read_u16(4)?;
        self.flags = cursor.read_u16(6)?;
        self.serial = cursor.read_u32(8)?;
        self.opcode = cursor.read_u32(12)?;
        self.opcode_name = opcode_name(self.opcode);
        self.result = cursor.read_u32(16)?;
        self.result_name = result_name(self.result);
        self.recv_length = cursor.read_u32(20)?;
        self.auth_type = cursor.read_u16(24)?;
        self.auth_length = cursor.read_u16(26)?;

        let mut len = cursor.remaining(LWRES_HEADER_LENGTH);
        if self.length as usize != bytes.len() {
            self.notes.push(Note::MalformedField(format!(
                "packet length {} does not match the {} bytes received",
                self.length,
                bytes.len()
            )));
            if (self.length as usize) >= LWRES_HEADER_LENGTH {
                len = len.min(self.length as usize - LWRES_HEADER_LENGTH);
            }
        }

        // A failed request carries no body.
        if len == 0 {
            return Ok((None, LWRES_HEADER_LENGTH));
        }

        let mut reader = RecordReader::new(cursor, LWRES_HEADER_LENGTH, len, LWRES_HEADER_LENGTH);
        self.body = Some(self.body_from_reader(&mut reader)?);
        let decoded = reader.offset();
        self.notes.extend(reader.into_notes());

        Ok((None, decoded))
    }

    fn name(&self) -> &'static str {
        "LWRES"
    }

    fn short_name(&self) -> &'static str {
        "lwres"
    }
}

/// Names a GETRDATABYNAME response resolved to, for records whose data is a name.
pub fn rdata_names(lwres: &LWRES) -> Vec<&DNSName> {
    match lwres.body {
        Some(LWRESBody::GetRdataByNameResponse { ref rdatas, .. }) => rdatas
            .iter()
            .filter_map(|record| match record.rdata {
                DNSRecordData::NS(ref name)
                | DNSRecordData::CNAME(ref name)
                | DNSRecordData::PTR(ref name) => Some(name),
                DNSRecordData::MX(ref mx) => Some(mx.name()),
                _ => None,
            })
            .collect(),
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::packet::Packet;
    use crate::types::ENCAP_TYPE_ETH;

    fn decode(bytes: &str) -> (LWRES, serde_json::Value) {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(bytes).unwrap();

        let mut lwres = LWRES::default();
        let (next, consumed) = lwres.decode_bytes(&registry, &bytes).unwrap();
        assert!(next.is_none());
        assert_eq!(consumed, bytes.len());

        let value = serde_json::to_value(&lwres).unwrap();
        (lwres, value)
    }

    #[test]
    fn getaddrsbyname_request() {
        let (lwres, value) = decode(concat!(
            "00000032",
            "0000",
            "0000",
            "00000001",
            "00010001",
            "00000000",
            "00001000",
            "0000",
            "0000",
            "00000000",
            "00000003",
            "000b",
            "6578616d706c652e636f6d00",
        ));
        assert!(!lwres.is_response());
        assert_eq!(value["opcode_name"], json!("GETADDRSBYNAME"));
        assert_eq!(
            value["body"],
            json!({"get_addrs_by_name_request": {
                "flags": "0x00000000",
                "address_types": "0x00000003",
                "name": "example.com",
            }})
        );
    }

    #[test]
    fn getaddrsbyname_response() {
        let (_, value) = decode(concat!(
            "0000003c",
            "0000",
            "0001",
            "00000001",
            "00010001",
            "00000000",
            "00001000",
            "0000",
            "0000",
            "00000000",
            "0000",
            "0001",
            "000b",
            "6578616d706c652e636f6d00",
            "00000001",
            "0004",
            "c0000201",
        ));
        let body = &value["body"]["get_addrs_by_name_response"];
        assert_eq!(body["real_name"], json!("example.com"));
        assert_eq!(
            body["addresses"],
            json!([{"family": 1, "length": 4, "address": "192.0.2.1"}])
        );
    }

    #[test]
    fn getrdatabyname_response_uses_record_decoders() {
        let (lwres, value) = decode(concat!(
            "00000050",
            "0000",
            "0001",
            "00000002",
            "00010003",
            "00000000",
            "00001000",
            "0000",
            "0000",
            "00000000",
            "0001",
            "000f",
            "00000e10",
            "0001",
            "0000",
            "000b",
            "6578616d706c652e636f6d00",
            // MX 10 mail.example.com
            "0014",
            "000a",
            "046d61696c076578616d706c6503636f6d00",
        ));
        let body = &value["body"]["get_rdata_by_name_response"];
        assert_eq!(body["type"], json!(15));
        assert_eq!(body["ttl"], json!(3600));
        assert_eq!(body["rdatas"][0]["rdlength"], json!(20));

        let names: Vec<String> = rdata_names(&lwres).iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["mail.example.com".to_string()]);
    }

    #[test]
    fn unknown_opcode_is_noted() {
        let (_, value) = decode(concat!(
            "0000001e",
            "0000",
            "0000",
            "00000003",
            "00020001",
            "00000000",
            "00000000",
            "0000",
            "0000",
            "abcd",
        ));
        assert_eq!(value["opcode_name"], json!("Unknown"));
        assert_eq!(value["body"], json!({"unknown": "abcd"}));
        assert_eq!(value["notes"][0]["kind"], json!("unknown_type"));
    }

    #[test]
    fn truncated_body_fails() {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(concat!(
            "00000032",
            "0000",
            "0000",
            "00000001",
            "00010001",
            "00000000",
            "00001000",
            "0000",
            "0000",
            "00000000",
        ))
        .unwrap();

        let mut lwres = LWRES::default();
        assert!(lwres.decode_bytes(&registry, &bytes).is_err());
    }

    #[test]
    fn lwres_over_udp() {
        let frame = concat!(
            "00000000000100000000000208004500",
            "004e000040004011f69bc0000201c000",
            "0202",
            "e9c20399003a0000",
            "00000032",
            "0000",
            "0000",
            "00000001",
            "00010001",
            "00000000",
            "00001000",
            "0000",
            "0000",
            "00000000",
            "00000003",
            "000b",
            "6578616d706c652e636f6d00",
        );
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(frame).unwrap();
        let packet = Packet::from_bytes(&registry, &bytes, ENCAP_TYPE_ETH).unwrap();

        let names: Vec<&str> = packet.layers.iter().map(|l| l.short_name()).collect();
        assert_eq!(names, vec!["eth", "ip", "udp", "lwres"]);
    }
}
