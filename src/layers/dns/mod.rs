//! Handling of DNS layer
//!
//! A DNS message is a 12 byte header followed by four count-prefixed sections: questions,
//! answers, authority and additional records (RFC 1035 Section 4). Names are decoded with
//! [`name::get_dns_name`] against the start of the message, RDATA with [`rdata::decode_rdata`].
//!
//! The same decoder serves multicast DNS (RFC 6762) and LLMNR (RFC 4795), which reuse the message
//! format with a few header and class bits reinterpreted. DNS over TCP frames every message with
//! a two byte length (RFC 1035 Section 4.2.2) and is handled by [`DNSOverTCP`].

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::{Error, Note};
use crate::layer::Layer;
use crate::registry::Registry;
use crate::transactions::{Direction, TransactionKey, TransactionProtocol};

pub mod bitmap;
pub mod dnssec;
pub mod edns;
pub mod name;
pub mod rdata;
pub mod types;

use name::{get_dns_name, DNSName};
use rdata::{decode_rdata, DNSRecordData, RecordReader};
use types::{opcode_name, rcode_name, T_OPT};

pub const DNS_PORT: u16 = 53;
pub const MDNS_PORT: u16 = 5353;
pub const LLMNR_PORT: u16 = 5355;

const DNS_HEADER_LENGTH: usize = 12;

// Top bit of the class: "unicast response" in mDNS questions, "cache flush" in mDNS records.
const MDNS_CLASS_FLAG: u16 = 0x8000;

// Register ourselves with parent
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.udp_ports.register(DNS_PORT, DNS::creator)?;
    registry.udp_ports.register(MDNS_PORT, DNS::creator_mdns)?;
    registry.udp_ports.register(LLMNR_PORT, DNS::creator_llmnr)?;
    registry.tcp_ports.register(DNS_PORT, DNSOverTCP::creator)?;

    Ok(())
}

/// Which protocol the message was carried as.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DNSFlavor {
    #[default]
    Unicast,
    Multicast,
    Llmnr,
}

impl DNSFlavor {
    fn code(self) -> u32 {
        match self {
            DNSFlavor::Unicast => 0,
            DNSFlavor::Multicast => 1,
            DNSFlavor::Llmnr => 2,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct DNSUnicastFlags {
    qr: bool,
    opcode: u8,
    aa: bool,
    tc: bool,
    rd: bool,
    ra: bool,
    z: bool,
    ad: bool,
    cd: bool,
    rcode: u8,
}

impl From<u16> for DNSUnicastFlags {
    fn from(flags: u16) -> Self {
        Self {
            qr: flags & 0x8000 != 0,
            opcode: ((flags >> 11) & 0x0f) as u8,
            aa: flags & 0x0400 != 0,
            tc: flags & 0x0200 != 0,
            rd: flags & 0x0100 != 0,
            ra: flags & 0x0080 != 0,
            z: flags & 0x0040 != 0,
            ad: flags & 0x0020 != 0,
            cd: flags & 0x0010 != 0,
            rcode: (flags & 0x000f) as u8,
        }
    }
}

/// LLMNR header flags (RFC 4795 Section 2.1.1).
#[derive(Debug, Default, Clone, Serialize)]
pub struct DNSLLMNRFlags {
    qr: bool,
    opcode: u8,
    c: bool,
    tc: bool,
    t: bool,
    z: u8,
    rcode: u8,
}

impl From<u16> for DNSLLMNRFlags {
    fn from(flags: u16) -> Self {
        Self {
            qr: flags & 0x8000 != 0,
            opcode: ((flags >> 11) & 0x0f) as u8,
            c: flags & 0x0400 != 0,
            tc: flags & 0x0200 != 0,
            t: flags & 0x0100 != 0,
            z: ((flags >> 4) & 0x0f) as u8,
            rcode: (flags & 0x000f) as u8,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DNSFlags {
    Unicast(DNSUnicastFlags),
    Llmnr(DNSLLMNRFlags),
}

impl Default for DNSFlags {
    fn default() -> Self {
        DNSFlags::Unicast(DNSUnicastFlags::default())
    }
}

#[derive(Debug, Serialize)]
pub struct DNSQRecord {
    name: DNSName,
    #[serde(rename = "type")]
    type_: u16,
    class: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    unicast_response: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl DNSQRecord {
    pub fn name(&self) -> &DNSName {
        &self.name
    }

    pub fn qtype(&self) -> u16 {
        self.type_
    }

    /// The class with the mDNS "unicast response" bit masked off.
    pub fn class(&self) -> u16 {
        match self.unicast_response {
            Some(_) => self.class & !MDNS_CLASS_FLAG,
            None => self.class,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DNSResRecord {
    name: DNSName,
    #[serde(rename = "type")]
    type_: u16,
    class: u16,
    ttl: u32,
    rdlength: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_flush: Option<bool>,
    rdata: DNSRecordData,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl DNSResRecord {
    pub fn name(&self) -> &DNSName {
        &self.name
    }

    pub fn rtype(&self) -> u16 {
        self.type_
    }

    /// The class with the mDNS "cache flush" bit masked off. For OPT records this is the
    /// requestor's UDP payload size and is never masked.
    pub fn class(&self) -> u16 {
        match self.cache_flush {
            Some(_) => self.class & !MDNS_CLASS_FLAG,
            None => self.class,
        }
    }

    pub fn ttl(&self) -> u32 {
        self.ttl
    }

    pub fn rdata(&self) -> &DNSRecordData {
        &self.rdata
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

#[derive(Debug, Default, Serialize)]
pub struct DNS {
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    id: u16,
    flavor: DNSFlavor,
    #[serde(
        rename = "flags",
        serialize_with = "crate::types::hex::serialize_lower_hex_u16"
    )]
    raw_flags: u16,
    #[serde(flatten)]
    flags: DNSFlags,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
    questions: Vec<DNSQRecord>,
    answers: Vec<DNSResRecord>,
    authority: Vec<DNSResRecord>,
    additional: Vec<DNSResRecord>,
}

impl DNS {
    pub fn new(flavor: DNSFlavor) -> Self {
        Self {
            flavor,
            ..Default::default()
        }
    }

    pub fn creator() -> Box<dyn Layer + Send> {
        Box::new(DNS::new(DNSFlavor::Unicast))
    }

    pub fn creator_mdns() -> Box<dyn Layer + Send> {
        Box::new(DNS::new(DNSFlavor::Multicast))
    }

    pub fn creator_llmnr() -> Box<dyn Layer + Send> {
        Box::new(DNS::new(DNSFlavor::Llmnr))
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn flavor(&self) -> DNSFlavor {
        self.flavor
    }

    pub fn is_response(&self) -> bool {
        self.raw_flags & 0x8000 != 0
    }

    pub fn opcode(&self) -> u8 {
        ((self.raw_flags >> 11) & 0x0f) as u8
    }

    pub fn opcode_name(&self) -> &'static str {
        opcode_name(self.opcode())
    }

    /// The response code, extended by the upper bits carried in an OPT record if there is one.
    pub fn rcode(&self) -> u16 {
        let rcode = self.raw_flags & 0x000f;
        match self.opt() {
            Some(opt) => (opt.extended_rcode() as u16) << 4 | rcode,
            None => rcode,
        }
    }

    pub fn rcode_name(&self) -> &'static str {
        rcode_name(self.rcode())
    }

    pub fn qdcount(&self) -> u16 {
        self.qdcount
    }

    pub fn questions(&self) -> &[DNSQRecord] {
        &self.questions
    }

    pub fn answers(&self) -> &[DNSResRecord] {
        &self.answers
    }

    pub fn authority(&self) -> &[DNSResRecord] {
        &self.authority
    }

    pub fn additional(&self) -> &[DNSResRecord] {
        &self.additional
    }

    /// The EDNS pseudo record of the additional section.
    pub fn opt(&self) -> Option<&edns::EDNSOpt> {
        self.additional.iter().find_map(|rr| match rr.rdata {
            DNSRecordData::OPT(ref opt) => Some(opt),
            _ => None,
        })
    }

    /// Key correlating a query with its response.
    pub fn transaction_key(&self) -> TransactionKey {
        TransactionKey {
            protocol: TransactionProtocol::Dns,
            id: self.id as u32,
            discriminator: self.flavor.code(),
        }
    }

    fn question_from_cursor(
        &self,
        cursor: &ByteCursor,
        offset: usize,
    ) -> Result<(DNSQRecord, usize), Error> {
        let (name, consumed) = get_dns_name(cursor, offset, None, 0)?;
        let type_ = cursor.read_u16(offset + consumed)?;
        let class = cursor.read_u16(offset + consumed + 2)?;

        let unicast_response = match self.flavor {
            DNSFlavor::Multicast => Some(class & MDNS_CLASS_FLAG != 0),
            _ => None,
        };

        let notes = name.note().into_iter().collect();

        Ok((
            DNSQRecord {
                name,
                type_,
                class,
                unicast_response,
                notes,
            },
            consumed + 4,
        ))
    }

    fn resrecord_from_cursor(
        &self,
        cursor: &ByteCursor,
        offset: usize,
    ) -> Result<(DNSResRecord, usize), Error> {
        let (name, consumed) = get_dns_name(cursor, offset, None, 0)?;
        let mut i = offset + consumed;

        let type_ = cursor.read_u16(i)?;
        let class = cursor.read_u16(i + 2)?;
        let ttl = cursor.read_u32(i + 4)?;
        let rdlength = cursor.read_u16(i + 8)?;
        i += 10;

        // The whole RDATA has to be inside the message, whether or not we understand it.
        let _ = cursor.read_bytes(i, rdlength as usize)?;

        let mut notes: Vec<Note> = name.note().into_iter().collect();

        let mut reader = RecordReader::new(*cursor, i, rdlength as usize, 0);
        let rdata = decode_rdata(&mut reader, type_, class, ttl)?;
        notes.extend(reader.into_notes());

        if type_ != T_OPT && ttl & 0x8000_0000 != 0 {
            notes.push(Note::MalformedField(format!(
                "TTL {} is negative",
                ttl as i32
            )));
        }

        let cache_flush = match self.flavor {
            DNSFlavor::Multicast if type_ != T_OPT => Some(class & MDNS_CLASS_FLAG != 0),
            _ => None,
        };

        Ok((
            DNSResRecord {
                name,
                type_,
                class,
                ttl,
                rdlength,
                cache_flush,
                rdata,
                notes,
            },
            consumed + 10 + rdlength as usize,
        ))
    }

    fn section_from_cursor(
        &self,
        cursor: &ByteCursor,
        offset: usize,
        count: u16,
    ) -> Result<(Vec<DNSResRecord>, usize), Error> {
        let mut records = Vec::with_capacity(count as usize);
        let mut i = offset;
        for _ in 0..count {
            let (record, consumed) = self.resrecord_from_cursor(cursor, i)?;
            i += consumed;
            records.push(record);
        }

        Ok((records, i - offset))
    }

    fn records_from_cursor(&mut self, cursor: &ByteCursor, offset: usize) -> Result<usize, Error> {
        let mut i = offset;

        for _ in 0..self.qdcount {
            let (question, consumed) = self.question_from_cursor(cursor, i)?;
            i += consumed;
            self.questions.push(question);
        }

        let (answers, consumed) = self.section_from_cursor(cursor, i, self.ancount)?;
        self.answers = answers;
        i += consumed;

        let (authority, consumed) = self.section_from_cursor(cursor, i, self.nscount)?;
        self.authority = authority;
        i += consumed;

        let (additional, consumed) = self.section_from_cursor(cursor, i, self.arcount)?;
        self.additional = additional;
        i += consumed;

        Ok(i - offset)
    }
}

impl Layer for DNS {
    fn decode_bytes(
        &mut self,
        _registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        self.id = cursor.read_u16(0)?;
        self.raw_flags = cursor.read_u16(2)?;
        self.flags = match self.flavor {
            DNSFlavor::Llmnr => DNSFlags::Llmnr(self.raw_flags.into()),
            _ => DNSFlags::Unicast(self.raw_flags.into()),
        };
        self.qdcount = cursor.read_u16(4)?;
        self.ancount = cursor.read_u16(6)?;
        self.nscount = cursor.read_u16(8)?;
        self.arcount = cursor.read_u16(10)?;

        let decoded = DNS_HEADER_LENGTH + self.records_from_cursor(&cursor, DNS_HEADER_LENGTH)?;

        Ok((None, decoded))
    }

    fn name(&self) -> &'static str {
        "DNS"
    }

    fn short_name(&self) -> &'static str {
        "dns"
    }

    fn transaction(&self) -> Option<(TransactionKey, Direction)> {
        let direction = if self.is_response() {
            Direction::Response
        } else {
            Direction::Request
        };

        Some((self.transaction_key(), direction))
    }
}

/// One length prefixed message of a TCP stream.
#[derive(Debug, Serialize)]
pub struct DNSOverTCPMessage {
    length: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<DNS>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl DNSOverTCPMessage {
    pub fn message(&self) -> Option<&DNS> {
        self.message.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// DNS messages carried over TCP.
///
/// Each message is decoded on its own: a malformed message is kept along with its error and the
/// messages following it are still decoded.
#[derive(Debug, Default, Serialize)]
pub struct DNSOverTCP {
    messages: Vec<DNSOverTCPMessage>,
}

impl DNSOverTCP {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<DNSOverTCP>::default()
    }

    pub fn messages(&self) -> &[DNSOverTCPMessage] {
        &self.messages
    }
}

impl Layer for DNSOverTCP {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let cursor = ByteCursor::new(bytes);

        // At least the first length has to be there.
        let _ = cursor.read_u16(0)?;

        let mut offset = 0;
        while cursor.remaining(offset) >= 2 {
            let length = cursor.read_u16(offset)?;
            offset += 2;

            let (message, error) = match cursor.read_bytes(offset, length as usize) {
                Ok(message_bytes) => {
                    let mut dns = DNS::new(DNSFlavor::Unicast);
                    match dns.decode_bytes(registry, message_bytes) {
                        Ok(_) => (Some(dns), None),
                        Err(e) => {
                            log_debug!("DNS over TCP: message at {}: {}", offset - 2, e);
                            (Some(dns), Some(e.to_string()))
                        }
                    }
                }
                Err(e) => (None, Some(e.to_string())),
            };

            offset = (offset + length as usize).min(bytes.len());
            self.messages.push(DNSOverTCPMessage {
                length,
                message,
                error,
            });
        }

        Ok((None, offset))
    }

    fn name(&self) -> &'static str {
        "DNS over TCP"
    }

    fn short_name(&self) -> &'static str {
        "dns_tcp"
    }

    fn transaction(&self) -> Option<(TransactionKey, Direction)> {
        self.messages
            .iter()
            .find_map(|m| m.message.as_ref())
            .and_then(|dns| dns.transaction())
    }
}
