//! Resource record data
//!
//! [`decode_rdata`] picks the decoder for an RR type and runs it over a [`RecordReader`] scoped to
//! the record's RDLENGTH. Every read through the reader counts down the remaining length, reading
//! past it is a malformed record. Types without a decoder are kept as raw bytes.

use serde::Serialize;

use crate::cursor::ByteCursor;
use crate::errors::{Error, Note};
use crate::layers::dns::bitmap::{decode_flat_type_bitmap, decode_type_bitmap, TypeBitmap};
use crate::layers::dns::dnssec::{
    algorithm_name, base32hex, compute_key_tag, digest_name, DNSKeyFlags,
};
use crate::layers::dns::edns::{decode_opt, EDNSOpt};
use crate::layers::dns::name::{get_dns_name, DNSName};
use crate::layers::dns::types::*;
use crate::types::{EUI64Address, IPv4Address, IPv6Address, MACAddress};

/// Reads the fields of one length delimited record.
#[derive(Debug)]
pub struct RecordReader<'a> {
    cursor: ByteCursor<'a>,
    offset: usize,
    remaining: usize,
    message_base: usize,
    notes: Vec<Note>,
}

impl<'a> RecordReader<'a> {
    pub fn new(cursor: ByteCursor<'a>, offset: usize, len: usize, message_base: usize) -> Self {
        Self {
            cursor,
            offset,
            remaining: len,
            message_base,
            notes: vec![],
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    pub fn note(&mut self, note: Note) {
        self.notes.push(note);
    }

    pub fn into_notes(self) -> Vec<Note> {
        self.notes
    }

    /// Resolve compression pointers of names read from here on against the current offset.
    pub fn rebase(&mut self) {
        self.message_base = self.offset;
    }

    fn take(&mut self, n: usize) -> Result<usize, Error> {
        if n > self.remaining {
            return Err(Error::TooShort {
                required: n,
                available: self.remaining,
                data: hex::encode(
                    self.cursor
                        .read_bytes(self.offset, self.remaining)
                        .unwrap_or_default(),
                ),
            });
        }
        let at = self.offset;
        self.offset += n;
        self.remaining -= n;

        Ok(at)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), Error> {
        self.take(n).map(|_| ())
    }

    pub fn peek_u8(&self) -> Option<u8> {
        if self.remaining == 0 {
            return None;
        }
        self.cursor.read_u8(self.offset).ok()
    }

    pub fn read_u8(&mut self) -> Result<u8, Error> {
        let at = self.take(1)?;
        self.cursor.read_u8(at)
    }

    pub fn read_u16(&mut self) -> Result<u16, Error> {
        let at = self.take(2)?;
        self.cursor.read_u16(at)
    }

    pub fn read_u32(&mut self) -> Result<u32, Error> {
        let at = self.take(4)?;
        self.cursor.read_u32(at)
    }

    pub fn read_u48(&mut self) -> Result<u64, Error> {
        let at = self.take(6)?;
        self.cursor.read_u48(at)
    }

    pub fn read_u64(&mut self) -> Result<u64, Error> {
        let at = self.take(8)?;
        self.cursor.read_u64(at)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let at = self.take(N)?;
        self.cursor.read_array(at)
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let at = self.take(n)?;
        self.cursor.read_bytes(at, n)
    }

    /// All the bytes left in the record.
    pub fn read_rest(&mut self) -> Result<&'a [u8], Error> {
        self.read_bytes(self.remaining)
    }

    /// The bytes left in the record, without consuming them.
    pub fn peek_rest(&self) -> Result<&'a [u8], Error> {
        self.cursor.read_bytes(self.offset, self.remaining)
    }

    /// A name, bounded by the record. Compression pointers resolve against the message base.
    pub fn read_name(&mut self) -> Result<DNSName, Error> {
        let (name, consumed) = get_dns_name(
            &self.cursor,
            self.offset,
            Some(self.remaining),
            self.message_base,
        )?;
        self.take(consumed)?;
        if let Some(note) = name.note() {
            self.notes.push(note);
        }

        Ok(name)
    }

    /// A `<character-string>`: one length octet and that many bytes.
    pub fn read_character_string(&mut self) -> Result<String, Error> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;

        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// A reader over the next `n` bytes, which are consumed from this reader.
    pub fn sub_reader(&mut self, n: usize) -> Result<RecordReader<'a>, Error> {
        let at = self.take(n)?;
        Ok(RecordReader::new(self.cursor, at, n, self.message_base))
    }
}

#[derive(Debug, Serialize)]
pub struct DNSSOA {
    mname: DNSName,
    rname: DNSName,
    serial: u32,
    refresh: u32,
    retry: u32,
    expire: u32,
    minimum: u32,
}

#[derive(Debug, Serialize)]
pub struct DNSWKS {
    address: IPv4Address,
    protocol: u8,
    ports: Vec<u16>,
}

#[derive(Debug, Serialize)]
pub struct DNSHINFO {
    cpu: String,
    os: String,
}

#[derive(Debug, Serialize)]
pub struct DNSMINFO {
    rmailbx: DNSName,
    emailbx: DNSName,
}

/// Records made of a 16 bit preference and a host name (MX, RT, KX, AFSDB).
#[derive(Debug, Serialize)]
pub struct DNSPreferenceName {
    preference: u16,
    name: DNSName,
}

impl DNSPreferenceName {
    pub fn preference(&self) -> u16 {
        self.preference
    }

    pub fn name(&self) -> &DNSName {
        &self.name
    }
}

#[derive(Debug, Serialize)]
pub struct DNSRP {
    mailbox: DNSName,
    txt_domain: DNSName,
}

#[derive(Debug, Serialize)]
pub struct DNSISDN {
    address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    subaddress: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DNSSIG {
    type_covered: String,
    algorithm: u8,
    algorithm_name: &'static str,
    labels: u8,
    original_ttl: u32,
    signature_expiration: u32,
    signature_inception: u32,
    key_tag: u16,
    signer_name: DNSName,
    #[serde(serialize_with = "hex::serde::serialize")]
    signature: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSKEY {
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    flags: u16,
    key_flags: DNSKeyFlags,
    no_key: bool,
    protocol: u8,
    algorithm: u8,
    algorithm_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_tag: Option<u16>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    public_key: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSPX {
    preference: u16,
    map822: DNSName,
    mapx400: DNSName,
}

#[derive(Debug, Serialize)]
pub struct DNSGPOS {
    longitude: String,
    latitude: String,
    altitude: String,
}

#[derive(Debug, Serialize)]
pub struct DNSLOC {
    version: u8,
    size: String,
    horizontal_precision: String,
    vertical_precision: String,
    latitude: String,
    longitude: String,
    altitude: String,
}

#[derive(Debug, Serialize)]
pub struct DNSNXT {
    next_domain_name: DNSName,
    types: TypeBitmap,
}

#[derive(Debug, Serialize)]
pub struct DNSSRV {
    priority: u16,
    weight: u16,
    port: u16,
    target: DNSName,
}

#[derive(Debug, Serialize)]
pub struct DNSNAPTR {
    order: u16,
    preference: u16,
    flags: String,
    service: String,
    regexp: String,
    replacement: DNSName,
}

#[derive(Debug, Serialize)]
pub struct DNSCERT {
    cert_type: u16,
    key_tag: u16,
    algorithm: u8,
    #[serde(serialize_with = "hex::serde::serialize")]
    certificate: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSA6 {
    prefix_len: u8,
    address_suffix: IPv6Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix_name: Option<DNSName>,
}

#[derive(Debug, Serialize)]
pub struct DNSAPLItem {
    family: u16,
    prefix: u8,
    negation: bool,
    address: String,
}

/// DS, CDS and DLV.
#[derive(Debug, Serialize)]
pub struct DNSDS {
    key_tag: u16,
    algorithm: u8,
    algorithm_name: &'static str,
    digest_type: u8,
    digest_name: &'static str,
    #[serde(serialize_with = "hex::serde::serialize")]
    digest: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSSSHFP {
    algorithm: u8,
    fingerprint_type: u8,
    #[serde(serialize_with = "hex::serde::serialize")]
    fingerprint: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub enum IPSecKeyGateway {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "ipv4")]
    IPv4(IPv4Address),
    #[serde(rename = "ipv6")]
    IPv6(IPv6Address),
    #[serde(rename = "name")]
    Name(DNSName),
}

#[derive(Debug, Serialize)]
pub struct DNSIPSECKEY {
    precedence: u8,
    gateway_type: u8,
    algorithm: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    gateway: Option<IPSecKeyGateway>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    public_key: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSNSEC {
    next_domain_name: DNSName,
    types: TypeBitmap,
}

#[derive(Debug, Serialize)]
pub struct DNSNSEC3 {
    hash_algorithm: u8,
    opt_out: bool,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    iterations: u16,
    #[serde(serialize_with = "hex::serde::serialize")]
    salt: Vec<u8>,
    next_hashed_owner: String,
    types: TypeBitmap,
}

#[derive(Debug, Serialize)]
pub struct DNSNSEC3PARAM {
    hash_algorithm: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    iterations: u16,
    #[serde(serialize_with = "hex::serde::serialize")]
    salt: Vec<u8>,
}

/// TLSA and SMIMEA.
#[derive(Debug, Serialize)]
pub struct DNSTLSA {
    usage: u8,
    selector: u8,
    matching_type: u8,
    #[serde(serialize_with = "hex::serde::serialize")]
    data: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSHIP {
    pk_algorithm: u8,
    #[serde(serialize_with = "hex::serde::serialize")]
    hit: Vec<u8>,
    #[serde(serialize_with = "hex::serde::serialize")]
    public_key: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rendezvous_servers: Vec<DNSName>,
}

#[derive(Debug, Serialize)]
pub struct DNSCSYNC {
    serial: u32,
    immediate: bool,
    soa_minimum: bool,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    flags: u16,
    types: TypeBitmap,
}

#[derive(Debug, Serialize)]
pub struct DNSZONEMD {
    serial: u32,
    scheme: u8,
    hash_algorithm: u8,
    #[serde(serialize_with = "hex::serde::serialize")]
    digest: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSTKEY {
    algorithm: DNSName,
    inception: u32,
    expiration: u32,
    mode: u16,
    error: u16,
    #[serde(serialize_with = "hex::serde::serialize")]
    key: Vec<u8>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    other: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSTSIG {
    algorithm: DNSName,
    time_signed: u64,
    fudge: u16,
    #[serde(serialize_with = "hex::serde::serialize")]
    mac: Vec<u8>,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    original_id: u16,
    error: u16,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    other: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct DNSURI {
    priority: u16,
    weight: u16,
    target: String,
}

#[derive(Debug, Serialize)]
pub struct CAAParameter {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CAAValue {
    Issue {
        #[serde(skip_serializing_if = "Option::is_none")]
        issuer: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        parameters: Vec<CAAParameter>,
    },
    Iodef(String),
    Raw(String),
}

#[derive(Debug, Serialize)]
pub struct DNSCAA {
    issuer_critical: bool,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flags: u8,
    tag: String,
    value: CAAValue,
}

#[derive(Debug, Serialize)]
pub struct DNSWINS {
    local_flag: u32,
    lookup_timeout: u32,
    cache_timeout: u32,
    servers: Vec<IPv4Address>,
}

#[derive(Debug, Serialize)]
pub struct DNSWINSR {
    local_flag: u32,
    lookup_timeout: u32,
    cache_timeout: u32,
    name_result_domain: DNSName,
}

#[derive(Debug, Serialize)]
pub enum DNSRecordData {
    Empty,
    A(IPv4Address),
    NS(DNSName),
    MD(DNSName),
    MF(DNSName),
    CNAME(DNSName),
    SOA(DNSSOA),
    MB(DNSName),
    MG(DNSName),
    MR(DNSName),
    #[serde(serialize_with = "hex::serde::serialize")]
    NULL(Vec<u8>),
    WKS(DNSWKS),
    PTR(DNSName),
    HINFO(DNSHINFO),
    MINFO(DNSMINFO),
    MX(DNSPreferenceName),
    TXT(Vec<String>),
    RP(DNSRP),
    AFSDB(DNSPreferenceName),
    X25(String),
    ISDN(DNSISDN),
    RT(DNSPreferenceName),
    #[serde(serialize_with = "hex::serde::serialize")]
    NSAP(Vec<u8>),
    #[serde(rename = "NSAP-PTR")]
    NSAPPTR(DNSName),
    SIG(DNSSIG),
    KEY(DNSKEY),
    PX(DNSPX),
    GPOS(DNSGPOS),
    AAAA(IPv6Address),
    LOC(DNSLOC),
    NXT(DNSNXT),
    SRV(DNSSRV),
    NAPTR(DNSNAPTR),
    KX(DNSPreferenceName),
    CERT(DNSCERT),
    A6(DNSA6),
    DNAME(DNSName),
    OPT(EDNSOpt),
    APL(Vec<DNSAPLItem>),
    DS(DNSDS),
    SSHFP(DNSSSHFP),
    IPSECKEY(DNSIPSECKEY),
    RRSIG(DNSSIG),
    NSEC(DNSNSEC),
    DNSKEY(DNSKEY),
    #[serde(serialize_with = "hex::serde::serialize")]
    DHCID(Vec<u8>),
    NSEC3(DNSNSEC3),
    NSEC3PARAM(DNSNSEC3PARAM),
    TLSA(DNSTLSA),
    SMIMEA(DNSTLSA),
    HIP(DNSHIP),
    CDS(DNSDS),
    CDNSKEY(DNSKEY),
    #[serde(serialize_with = "hex::serde::serialize")]
    OPENPGPKEY(Vec<u8>),
    CSYNC(DNSCSYNC),
    ZONEMD(DNSZONEMD),
    SPF(Vec<String>),
    EUI48(MACAddress),
    EUI64(EUI64Address),
    TKEY(DNSTKEY),
    TSIG(DNSTSIG),
    URI(DNSURI),
    CAA(DNSCAA),
    DLV(DNSDS),
    WINS(DNSWINS),
    #[serde(rename = "WINS-R")]
    WINSR(DNSWINSR),
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

/// Decode the RDATA of a record of type `rtype`.
///
/// `class` and `ttl` are only looked at for OPT, whose header fields carry EDNS parameters.
/// Findings that do not stop decoding are returned along with the data.
pub fn decode_rdata(
    reader: &mut RecordReader,
    rtype: u16,
    class: u16,
    ttl: u32,
) -> Result<DNSRecordData, Error> {
    if reader.is_empty() && rtype != T_OPT {
        return Ok(DNSRecordData::Empty);
    }

    let data = match rtype {
        T_A => DNSRecordData::A(reader.read_array::<4>()?.into()),
        T_NS => DNSRecordData::NS(reader.read_name()?),
        T_MD => DNSRecordData::MD(reader.read_name()?),
        T_MF => DNSRecordData::MF(reader.read_name()?),
        T_CNAME => DNSRecordData::CNAME(reader.read_name()?),
        T_SOA => DNSRecordData::SOA(DNSSOA {
            mname: reader.read_name()?,
            rname: reader.read_name()?,
            serial: reader.read_u32()?,
            refresh: reader.read_u32()?,
            retry: reader.read_u32()?,
            expire: reader.read_u32()?,
            minimum: reader.read_u32()?,
        }),
        T_MB => DNSRecordData::MB(reader.read_name()?),
        T_MG => DNSRecordData::MG(reader.read_name()?),
        T_MR => DNSRecordData::MR(reader.read_name()?),
        T_NULL => DNSRecordData::NULL(reader.read_rest()?.into()),
        T_WKS => DNSRecordData::WKS(wks_from_reader(reader)?),
        T_PTR => DNSRecordData::PTR(reader.read_name()?),
        T_HINFO => DNSRecordData::HINFO(DNSHINFO {
            cpu: reader.read_character_string()?,
            os: reader.read_character_string()?,
        }),
        T_MINFO => DNSRecordData::MINFO(DNSMINFO {
            rmailbx: reader.read_name()?,
            emailbx: reader.read_name()?,
        }),
        T_MX => DNSRecordData::MX(preference_name_from_reader(reader)?),
        T_TXT => DNSRecordData::TXT(character_strings_from_reader(reader)?),
        T_RP => DNSRecordData::RP(DNSRP {
            mailbox: reader.read_name()?,
            txt_domain: reader.read_name()?,
        }),
        T_AFSDB => DNSRecordData::AFSDB(preference_name_from_reader(reader)?),
        T_X25 => DNSRecordData::X25(reader.read_character_string()?),
        T_ISDN => {
            let address = reader.read_character_string()?;
            let subaddress = if reader.remaining() > 1 {
                Some(reader.read_character_string()?)
            } else {
                None
            };
            DNSRecordData::ISDN(DNSISDN {
                address,
                subaddress,
            })
        }
        T_RT => DNSRecordData::RT(preference_name_from_reader(reader)?),
        T_NSAP => DNSRecordData::NSAP(reader.read_rest()?.into()),
        T_NSAP_PTR => DNSRecordData::NSAPPTR(reader.read_name()?),
        T_SIG => DNSRecordData::SIG(sig_from_reader(reader)?),
        T_KEY => DNSRecordData::KEY(key_from_reader(reader)?),
        T_PX => DNSRecordData::PX(DNSPX {
            preference: reader.read_u16()?,
            map822: reader.read_name()?,
            mapx400: reader.read_name()?,
        }),
        T_GPOS => DNSRecordData::GPOS(DNSGPOS {
            longitude: reader.read_character_string()?,
            latitude: reader.read_character_string()?,
            altitude: reader.read_character_string()?,
        }),
        T_AAAA => DNSRecordData::AAAA(reader.read_array::<16>()?.into()),
        T_LOC => loc_from_reader(reader)?,
        T_NXT => {
            let next_domain_name = reader.read_name()?;
            let len = reader.remaining();
            let types = decode_flat_type_bitmap(&reader.cursor, reader.offset(), len)?;
            reader.take(len)?;
            DNSRecordData::NXT(DNSNXT {
                next_domain_name,
                types,
            })
        }
        T_SRV => DNSRecordData::SRV(DNSSRV {
            priority: reader.read_u16()?,
            weight: reader.read_u16()?,
            port: reader.read_u16()?,
            target: reader.read_name()?,
        }),
        T_NAPTR => DNSRecordData::NAPTR(DNSNAPTR {
            order: reader.read_u16()?,
            preference: reader.read_u16()?,
            flags: reader.read_character_string()?,
            service: reader.read_character_string()?,
            regexp: reader.read_character_string()?,
            replacement: reader.read_name()?,
        }),
        T_KX => DNSRecordData::KX(preference_name_from_reader(reader)?),
        T_CERT => DNSRecordData::CERT(DNSCERT {
            cert_type: reader.read_u16()?,
            key_tag: reader.read_u16()?,
            algorithm: reader.read_u8()?,
            certificate: reader.read_rest()?.into(),
        }),
        T_A6 => a6_from_reader(reader)?,
        T_DNAME => DNSRecordData::DNAME(reader.read_name()?),
        T_OPT => DNSRecordData::OPT(decode_opt(reader, class, ttl)?),
        T_APL => DNSRecordData::APL(apl_from_reader(reader)?),
        T_DS => DNSRecordData::DS(ds_from_reader(reader)?),
        T_SSHFP => DNSRecordData::SSHFP(DNSSSHFP {
            algorithm: reader.read_u8()?,
            fingerprint_type: reader.read_u8()?,
            fingerprint: reader.read_rest()?.into(),
        }),
        T_IPSECKEY => DNSRecordData::IPSECKEY(ipseckey_from_reader(reader)?),
        T_RRSIG => DNSRecordData::RRSIG(sig_from_reader(reader)?),
        T_NSEC => {
            let next_domain_name = reader.read_name()?;
            let types = type_bitmap_from_reader(reader)?;
            DNSRecordData::NSEC(DNSNSEC {
                next_domain_name,
                types,
            })
        }
        T_DNSKEY => DNSRecordData::DNSKEY(key_from_reader(reader)?),
        T_DHCID => DNSRecordData::DHCID(reader.read_rest()?.into()),
        T_NSEC3 => DNSRecordData::NSEC3(nsec3_from_reader(reader)?),
        T_NSEC3PARAM => {
            let hash_algorithm = reader.read_u8()?;
            let flags = reader.read_u8()?;
            let iterations = reader.read_u16()?;
            let salt_len = reader.read_u8()? as usize;
            DNSRecordData::NSEC3PARAM(DNSNSEC3PARAM {
                hash_algorithm,
                flags,
                iterations,
                salt: reader.read_bytes(salt_len)?.into(),
            })
        }
        T_TLSA => DNSRecordData::TLSA(tlsa_from_reader(reader)?),
        T_SMIMEA => DNSRecordData::SMIMEA(tlsa_from_reader(reader)?),
        T_HIP => DNSRecordData::HIP(hip_from_reader(reader)?),
        T_CDS => DNSRecordData::CDS(ds_from_reader(reader)?),
        T_CDNSKEY => DNSRecordData::CDNSKEY(key_from_reader(reader)?),
        T_OPENPGPKEY => DNSRecordData::OPENPGPKEY(reader.read_rest()?.into()),
        T_CSYNC => {
            let serial = reader.read_u32()?;
            let flags = reader.read_u16()?;
            let types = type_bitmap_from_reader(reader)?;
            DNSRecordData::CSYNC(DNSCSYNC {
                serial,
                immediate: flags & 0x0001 != 0,
                soa_minimum: flags & 0x0002 != 0,
                flags,
                types,
            })
        }
        T_ZONEMD => DNSRecordData::ZONEMD(DNSZONEMD {
            serial: reader.read_u32()?,
            scheme: reader.read_u8()?,
            hash_algorithm: reader.read_u8()?,
            digest: reader.read_rest()?.into(),
        }),
        T_SPF => DNSRecordData::SPF(character_strings_from_reader(reader)?),
        T_EUI48 => DNSRecordData::EUI48(reader.read_array::<6>()?.into()),
        T_EUI64 => DNSRecordData::EUI64(reader.read_array::<8>()?.into()),
        T_TKEY => DNSRecordData::TKEY(tkey_from_reader(reader)?),
        T_TSIG => DNSRecordData::TSIG(tsig_from_reader(reader)?),
        T_URI => {
            let priority = reader.read_u16()?;
            let weight = reader.read_u16()?;
            let target = String::from_utf8_lossy(reader.read_rest()?).into_owned();
            DNSRecordData::URI(DNSURI {
                priority,
                weight,
                target,
            })
        }
        T_CAA => DNSRecordData::CAA(caa_from_reader(reader)?),
        T_DLV => DNSRecordData::DLV(ds_from_reader(reader)?),
        T_WINS => {
            let local_flag = reader.read_u32()?;
            let lookup_timeout = reader.read_u32()?;
            let cache_timeout = reader.read_u32()?;
            let count = reader.read_u32()?;
            let mut servers = vec![];
            for _ in 0..count {
                servers.push(reader.read_array::<4>()?.into());
            }
            DNSRecordData::WINS(DNSWINS {
                local_flag,
                lookup_timeout,
                cache_timeout,
                servers,
            })
        }
        T_WINS_R => DNSRecordData::WINSR(DNSWINSR {
            local_flag: reader.read_u32()?,
            lookup_timeout: reader.read_u32()?,
            cache_timeout: reader.read_u32()?,
            name_result_domain: reader.read_name()?,
        }),
        _ => {
            log_debug!("DNS RR type {} not implemented", rtype);
            reader.note(Note::UnknownType(format!("RR type {}", type_mnemonic(rtype))));
            DNSRecordData::Unknown(reader.read_rest()?.into())
        }
    };

    if !reader.is_empty() {
        let trailing = reader.remaining();
        reader.note(Note::MalformedField(format!(
            "{} trailing bytes in {} RDATA",
            trailing,
            type_mnemonic(rtype)
        )));
        reader.take(trailing)?;
    }

    Ok(data)
}

fn preference_name_from_reader(reader: &mut RecordReader) -> Result<DNSPreferenceName, Error> {
    Ok(DNSPreferenceName {
        preference: reader.read_u16()?,
        name: reader.read_name()?,
    })
}

fn character_strings_from_reader(reader: &mut RecordReader) -> Result<Vec<String>, Error> {
    let mut strings = vec![];
    while !reader.is_empty() {
        strings.push(reader.read_character_string()?);
    }

    Ok(strings)
}

fn type_bitmap_from_reader(reader: &mut RecordReader) -> Result<TypeBitmap, Error> {
    let len = reader.remaining();
    let offset = reader.offset();
    let types = decode_type_bitmap(&reader.cursor, offset, len, &mut reader.notes)?;
    reader.take(len)?;

    Ok(types)
}

fn wks_from_reader(reader: &mut RecordReader) -> Result<DNSWKS, Error> {
    let address = reader.read_array::<4>()?.into();
    let protocol = reader.read_u8()?;
    let bitmap = reader.read_rest()?;

    let mut ports = vec![];
    for (i, byte) in bitmap.iter().enumerate() {
        for bit in 0..8 {
            if byte & (0x80 >> bit) != 0 {
                ports.push((i * 8 + bit) as u16);
            }
        }
    }

    Ok(DNSWKS {
        address,
        protocol,
        ports,
    })
}

fn sig_from_reader(reader: &mut RecordReader) -> Result<DNSSIG, Error> {
    let type_covered = type_mnemonic(reader.read_u16()?);
    let algorithm = reader.read_u8()?;

    Ok(DNSSIG {
        type_covered,
        algorithm,
        algorithm_name: algorithm_name(algorithm),
        labels: reader.read_u8()?,
        original_ttl: reader.read_u32()?,
        signature_expiration: reader.read_u32()?,
        signature_inception: reader.read_u32()?,
        key_tag: reader.read_u16()?,
        signer_name: reader.read_name()?,
        signature: reader.read_rest()?.into(),
    })
}

// KEY, DNSKEY and CDNSKEY share the layout. Both of the top flag bits set means the record
// asserts there is no key.
fn key_from_reader(reader: &mut RecordReader) -> Result<DNSKEY, Error> {
    let rdata = reader.peek_rest()?;
    let flags = reader.read_u16()?;
    let protocol = reader.read_u8()?;
    let algorithm = reader.read_u8()?;

    let no_key = flags & 0xC000 == 0xC000;
    let (key_tag, public_key) = if no_key {
        (None, vec![])
    } else {
        (
            compute_key_tag(rdata, algorithm),
            reader.read_rest()?.to_vec(),
        )
    };

    Ok(DNSKEY {
        flags,
        key_flags: flags.into(),
        no_key,
        protocol,
        algorithm,
        algorithm_name: algorithm_name(algorithm),
        key_tag,
        public_key,
    })
}

fn ds_from_reader(reader: &mut RecordReader) -> Result<DNSDS, Error> {
    let key_tag = reader.read_u16()?;
    let algorithm = reader.read_u8()?;
    let digest_type = reader.read_u8()?;

    Ok(DNSDS {
        key_tag,
        algorithm,
        algorithm_name: algorithm_name(algorithm),
        digest_type,
        digest_name: digest_name(digest_type),
        digest: reader.read_rest()?.into(),
    })
}

fn tlsa_from_reader(reader: &mut RecordReader) -> Result<DNSTLSA, Error> {
    Ok(DNSTLSA {
        usage: reader.read_u8()?,
        selector: reader.read_u8()?,
        matching_type: reader.read_u8()?,
        data: reader.read_rest()?.into(),
    })
}

// RFC 1876 size and precision: mantissa in the high nibble, power of ten in the low one, in
// centimeters.
fn loc_size(value: u8) -> String {
    let mantissa = (value >> 4) as u64;
    let exponent = (value & 0x0f) as u32;
    let centimeters = mantissa * 10_u64.pow(exponent);

    format!("{:.2}m", centimeters as f64 / 100.0)
}

fn loc_angle(value: u32, positive: char, negative: char) -> String {
    let thousandths = value as i64 - (1_i64 << 31);
    let hemisphere = if thousandths < 0 { negative } else { positive };
    let abs = thousandths.abs();

    format!(
        "{} {} {}.{:03} {}",
        abs / 3_600_000,
        (abs / 60_000) % 60,
        (abs / 1000) % 60,
        abs % 1000,
        hemisphere
    )
}

fn loc_from_reader(reader: &mut RecordReader) -> Result<DNSRecordData, Error> {
    let version = reader.read_u8()?;
    if version != 0 {
        reader.note(Note::MalformedField(format!("LOC version {}", version)));
        return Ok(DNSRecordData::Unknown(reader.read_rest()?.into()));
    }

    let size = loc_size(reader.read_u8()?);
    let horizontal_precision = loc_size(reader.read_u8()?);
    let vertical_precision = loc_size(reader.read_u8()?);
    let latitude = loc_angle(reader.read_u32()?, 'N', 'S');
    let longitude = loc_angle(reader.read_u32()?, 'E', 'W');
    let altitude = reader.read_u32()? as i64 - 10_000_000;

    Ok(DNSRecordData::LOC(DNSLOC {
        version,
        size,
        horizontal_precision,
        vertical_precision,
        latitude,
        longitude,
        altitude: format!("{:.2}m", altitude as f64 / 100.0),
    }))
}

fn a6_from_reader(reader: &mut RecordReader) -> Result<DNSRecordData, Error> {
    let prefix_len = reader.read_u8()?;
    if prefix_len > 128 {
        reader.note(Note::MalformedField(format!("A6 prefix length {}", prefix_len)));
        return Ok(DNSRecordData::Unknown(reader.read_rest()?.into()));
    }

    let suffix_len = (128 - prefix_len as usize + 7) / 8;
    let mut suffix = [0_u8; 16];
    suffix[16 - suffix_len..].copy_from_slice(reader.read_bytes(suffix_len)?);

    let prefix_name = if prefix_len > 0 {
        Some(reader.read_name()?)
    } else {
        None
    };

    Ok(DNSRecordData::A6(DNSA6 {
        prefix_len,
        address_suffix: suffix.into(),
        prefix_name,
    }))
}

fn apl_from_reader(reader: &mut RecordReader) -> Result<Vec<DNSAPLItem>, Error> {
    let mut items = vec![];
    while !reader.is_empty() {
        let family = reader.read_u16()?;
        let prefix = reader.read_u8()?;
        let n_afdlength = reader.read_u8()?;
        let afd = reader.read_bytes((n_afdlength & 0x7f) as usize)?;

        let address = match family {
            1 if afd.len() <= 4 => IPv4Address::from_prefix(afd).to_string(),
            2 if afd.len() <= 16 => IPv6Address::from_prefix(afd).to_string(),
            _ => hex::encode(afd),
        };
        items.push(DNSAPLItem {
            family,
            prefix,
            negation: n_afdlength & 0x80 != 0,
            address,
        });
    }

    Ok(items)
}

fn ipseckey_from_reader(reader: &mut RecordReader) -> Result<DNSIPSECKEY, Error> {
    let precedence = reader.read_u8()?;
    let gateway_type = reader.read_u8()?;
    let algorithm = reader.read_u8()?;

    let gateway = match gateway_type {
        0 => Some(IPSecKeyGateway::None),
        1 => Some(IPSecKeyGateway::IPv4(reader.read_array::<4>()?.into())),
        2 => Some(IPSecKeyGateway::IPv6(reader.read_array::<16>()?.into())),
        3 => Some(IPSecKeyGateway::Name(reader.read_name()?)),
        _ => {
            reader.note(Note::MalformedField(format!(
                "IPSECKEY gateway type {}",
                gateway_type
            )));
            None
        }
    };

    Ok(DNSIPSECKEY {
        precedence,
        gateway_type,
        algorithm,
        gateway,
        public_key: reader.read_rest()?.into(),
    })
}

fn nsec3_from_reader(reader: &mut RecordReader) -> Result<DNSNSEC3, Error> {
    let hash_algorithm = reader.read_u8()?;
    let flags = reader.read_u8()?;
    let iterations = reader.read_u16()?;
    let salt_len = reader.read_u8()? as usize;
    let salt = reader.read_bytes(salt_len)?.into();
    let hash_len = reader.read_u8()? as usize;
    let next_hashed_owner = base32hex(reader.read_bytes(hash_len)?);
    let types = type_bitmap_from_reader(reader)?;

    Ok(DNSNSEC3 {
        hash_algorithm,
        opt_out: flags & 0x01 != 0,
        flags,
        iterations,
        salt,
        next_hashed_owner,
        types,
    })
}

fn hip_from_reader(reader: &mut RecordReader) -> Result<DNSHIP, Error> {
    let hit_len = reader.read_u8()? as usize;
    let pk_algorithm = reader.read_u8()?;
    let pk_len = reader.read_u16()? as usize;
    let hit = reader.read_bytes(hit_len)?.into();
    let public_key = reader.read_bytes(pk_len)?.into();

    let mut rendezvous_servers = vec![];
    while !reader.is_empty() {
        rendezvous_servers.push(reader.read_name()?);
    }

    Ok(DNSHIP {
        pk_algorithm,
        hit,
        public_key,
        rendezvous_servers,
    })
}

fn tkey_from_reader(reader: &mut RecordReader) -> Result<DNSTKEY, Error> {
    let algorithm = reader.read_name()?;
    let inception = reader.read_u32()?;
    let expiration = reader.read_u32()?;
    let mode = reader.read_u16()?;
    let error = reader.read_u16()?;
    let key_len = reader.read_u16()? as usize;
    let key = reader.read_bytes(key_len)?.into();
    let other_len = reader.read_u16()? as usize;
    let other = reader.read_bytes(other_len)?.into();

    Ok(DNSTKEY {
        algorithm,
        inception,
        expiration,
        mode,
        error,
        key,
        other,
    })
}

fn tsig_from_reader(reader: &mut RecordReader) -> Result<DNSTSIG, Error> {
    let algorithm = reader.read_name()?;
    let time_signed = reader.read_u48()?;
    let fudge = reader.read_u16()?;
    let mac_len = reader.read_u16()? as usize;
    let mac = reader.read_bytes(mac_len)?.into();
    let original_id = reader.read_u16()?;
    let error = reader.read_u16()?;
    let other_len = reader.read_u16()? as usize;
    let other = reader.read_bytes(other_len)?.into();

    Ok(DNSTSIG {
        algorithm,
        time_signed,
        fudge,
        mac,
        original_id,
        error,
        other,
    })
}

fn caa_issue_value(value: &str) -> CAAValue {
    let mut parts = value.split(';');
    let issuer = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let parameters = parts
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|p| match p.split_once('=') {
            Some((key, value)) => CAAParameter {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            },
            None => CAAParameter {
                key: p.to_string(),
                value: String::new(),
            },
        })
        .collect();

    CAAValue::Issue { issuer, parameters }
}

fn caa_from_reader(reader: &mut RecordReader) -> Result<DNSCAA, Error> {
    let flags = reader.read_u8()?;
    let tag_len = reader.read_u8()? as usize;
    let tag = String::from_utf8_lossy(reader.read_bytes(tag_len)?).into_owned();
    let value = String::from_utf8_lossy(reader.read_rest()?).into_owned();

    let value = if tag.eq_ignore_ascii_case("issue") || tag.eq_ignore_ascii_case("issuewild") {
        caa_issue_value(&value)
    } else if tag.eq_ignore_ascii_case("iodef") {
        CAAValue::Iodef(value)
    } else {
        CAAValue::Raw(value)
    };

    Ok(DNSCAA {
        issuer_critical: flags & 0x80 != 0,
        flags,
        tag,
        value,
    })
}
