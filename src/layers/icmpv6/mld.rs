//! Multicast Listener Discovery (RFC 2710, RFC 3810)

use serde::Serialize;

use crate::errors::Error;
use crate::layers::dns::rdata::RecordReader;
use crate::types::IPv6Address;

/// Maximum Response Code of an MLDv2 query in milliseconds (RFC 3810 Section 5.1.3).
pub fn max_response_delay(code: u16) -> u32 {
    if code < 0x8000 {
        return code as u32;
    }
    let mant = (code & 0x0fff) as u32;
    let exp = ((code >> 12) & 0x07) as u32;

    (mant | 0x1000) << (exp + 3)
}

/// Querier's Query Interval Code in seconds (RFC 3810 Section 5.1.9).
pub fn query_interval(qqic: u8) -> u32 {
    if qqic < 0x80 {
        return qqic as u32;
    }
    let mant = (qqic & 0x0f) as u32;
    let exp = ((qqic >> 4) & 0x07) as u32;

    (mant | 0x10) << (exp + 3)
}

#[derive(Debug, Serialize)]
pub struct MLDQuery {
    version: u8,
    max_response_delay: u32,
    multicast_address: IPv6Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    suppress_router_processing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    robustness_variable: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_interval: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<IPv6Address>,
}

impl MLDQuery {
    /// An MLDv1 query ends after the multicast address, anything longer is an MLDv2 query.
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let code = reader.read_u16()?;
        reader.skip(2)?;
        let multicast_address = reader.read_array::<16>()?.into();

        if reader.is_empty() {
            return Ok(Self {
                version: 1,
                max_response_delay: code as u32,
                multicast_address,
                suppress_router_processing: None,
                robustness_variable: None,
                query_interval: None,
                sources: vec![],
            });
        }

        let flags = reader.read_u8()?;
        let qqic = reader.read_u8()?;
        let count = reader.read_u16()?;
        let mut sources = vec![];
        for _ in 0..count {
            sources.push(reader.read_array::<16>()?.into());
        }

        Ok(Self {
            version: 2,
            max_response_delay: max_response_delay(code),
            multicast_address,
            suppress_router_processing: Some(flags & 0x08 != 0),
            robustness_variable: Some(flags & 0x07),
            query_interval: Some(query_interval(qqic)),
            sources,
        })
    }
}

/// MLDv1 Report and Done.
#[derive(Debug, Serialize)]
pub struct MLDv1 {
    max_response_delay: u16,
    multicast_address: IPv6Address,
}

impl MLDv1 {
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let max_response_delay = reader.read_u16()?;
        reader.skip(2)?;

        Ok(Self {
            max_response_delay,
            multicast_address: reader.read_array::<16>()?.into(),
        })
    }
}

fn record_type_name(record_type: u8) -> &'static str {
    match record_type {
        1 => "MODE_IS_INCLUDE",
        2 => "MODE_IS_EXCLUDE",
        3 => "CHANGE_TO_INCLUDE_MODE",
        4 => "CHANGE_TO_EXCLUDE_MODE",
        5 => "ALLOW_NEW_SOURCES",
        6 => "BLOCK_OLD_SOURCES",
        _ => "Unknown",
    }
}

#[derive(Debug, Serialize)]
pub struct MulticastAddressRecord {
    record_type: u8,
    record_type_name: &'static str,
    multicast_address: IPv6Address,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sources: Vec<IPv6Address>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    auxiliary_data: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct MLDv2Report {
    records: Vec<MulticastAddressRecord>,
}

impl MLDv2Report {
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        reader.skip(2)?;
        let count = reader.read_u16()?;

        let mut records = vec![];
        for _ in 0..count {
            let record_type = reader.read_u8()?;
            let aux_len = reader.read_u8()? as usize;
            let sources_count = reader.read_u16()?;
            let multicast_address = reader.read_array::<16>()?.into();

            let mut sources = vec![];
            for _ in 0..sources_count {
                sources.push(reader.read_array::<16>()?.into());
            }

            records.push(MulticastAddressRecord {
                record_type,
                record_type_name: record_type_name(record_type),
                multicast_address,
                sources,
                auxiliary_data: reader.read_bytes(aux_len * 4)?.into(),
            });
        }

        Ok(Self { records })
    }
}
