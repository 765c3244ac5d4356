//! Router Renumbering (RFC 2894)

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layers::dns::rdata::RecordReader;
use crate::types::IPv6Address;

pub const RR_COMMAND: u8 = 0;
pub const RR_RESULT: u8 = 1;
pub const RR_SEQUENCE_NUMBER_RESET: u8 = 255;

const MATCH_PREFIX_UNITS: u8 = 3;
const USE_PREFIX_UNITS: u8 = 4;
const MATCH_RESULT_LENGTH: usize = 24;

fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        1 => "ADD",
        2 => "CHANGE",
        3 => "SET-GLOBAL",
        _ => "Unknown",
    }
}

#[derive(Debug, Serialize)]
pub struct RenumberingFlags {
    test_command: bool,
    result_requested: bool,
    all_interfaces: bool,
    site_specific: bool,
    processed_previously: bool,
}

impl From<u8> for RenumberingFlags {
    fn from(flags: u8) -> Self {
        Self {
            test_command: flags & 0x80 != 0,
            result_requested: flags & 0x40 != 0,
            all_interfaces: flags & 0x20 != 0,
            site_specific: flags & 0x10 != 0,
            processed_previously: flags & 0x08 != 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsePrefix {
    use_length: u8,
    keep_length: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    flag_mask: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u8")]
    ra_flags: u8,
    valid_lifetime: u32,
    preferred_lifetime: u32,
    decrement_valid: bool,
    decrement_preferred: bool,
    use_prefix: IPv6Address,
}

impl UsePrefix {
    fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let use_length = reader.read_u8()?;
        let keep_length = reader.read_u8()?;
        let flag_mask = reader.read_u8()?;
        let ra_flags = reader.read_u8()?;
        let valid_lifetime = reader.read_u32()?;
        let preferred_lifetime = reader.read_u32()?;
        let flags = reader.read_u32()?;

        Ok(Self {
            use_length,
            keep_length,
            flag_mask,
            ra_flags,
            valid_lifetime,
            preferred_lifetime,
            decrement_valid: flags & 0x8000_0000 != 0,
            decrement_preferred: flags & 0x4000_0000 != 0,
            use_prefix: reader.read_array::<16>()?.into(),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PrefixControlOperation {
    opcode: u8,
    opcode_name: &'static str,
    op_length: u8,
    ordinal: u8,
    match_length: u8,
    min_length: u8,
    max_length: u8,
    match_prefix: IPv6Address,
    use_prefixes: Vec<UsePrefix>,
}

#[derive(Debug, Serialize)]
pub struct MatchResult {
    prefix_out_of_bounds: bool,
    forbidden: bool,
    ordinal: u8,
    matched_length: u8,
    interface_index: u32,
    matched_prefix: IPv6Address,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenumberingBody {
    Command(Vec<PrefixControlOperation>),
    Result(Vec<MatchResult>),
    SequenceNumberReset,
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct RouterRenumbering {
    sequence_number: u32,
    segment_number: u8,
    flags: RenumberingFlags,
    max_delay: u16,
    body: RenumberingBody,
}

fn commands_from_reader(reader: &mut RecordReader) -> Result<Vec<PrefixControlOperation>, Error> {
    let mut operations = vec![];

    while !reader.is_empty() {
        let opcode = reader.read_u8()?;
        let op_length = reader.read_u8()?;
        if op_length < MATCH_PREFIX_UNITS {
            reader.note(Note::MalformedField(format!(
                "prefix control operation length {} is shorter than its match prefix",
                op_length
            )));
            reader.skip(reader.remaining())?;
            break;
        }

        let use_units = op_length - MATCH_PREFIX_UNITS;
        if use_units % USE_PREFIX_UNITS != 0 {
            reader.note(Note::MalformedField(format!(
                "prefix control operation length {} leaves a partial use prefix",
                op_length
            )));
        }

        let mut body = reader.sub_reader(op_length as usize * 8 - 2)?;
        let ordinal = body.read_u8()?;
        let match_length = body.read_u8()?;
        let min_length = body.read_u8()?;
        let max_length = body.read_u8()?;
        body.skip(2)?;
        let match_prefix = body.read_array::<16>()?.into();

        let mut use_prefixes = vec![];
        for _ in 0..use_units / USE_PREFIX_UNITS {
            use_prefixes.push(UsePrefix::from_reader(&mut body)?);
        }
        body.skip(body.remaining())?;

        operations.push(PrefixControlOperation {
            opcode,
            opcode_name: opcode_name(opcode),
            op_length,
            ordinal,
            match_length,
            min_length,
            max_length,
            match_prefix,
            use_prefixes,
        });
    }

    Ok(operations)
}

fn results_from_reader(reader: &mut RecordReader) -> Result<Vec<MatchResult>, Error> {
    let mut results = vec![];

    while reader.remaining() >= MATCH_RESULT_LENGTH {
        let flags = reader.read_u16()?;
        let ordinal = reader.read_u8()?;
        let matched_length = reader.read_u8()?;
        results.push(MatchResult {
            prefix_out_of_bounds: flags & 0x0002 != 0,
            forbidden: flags & 0x0001 != 0,
            ordinal,
            matched_length,
            interface_index: reader.read_u32()?,
            matched_prefix: reader.read_array::<16>()?.into(),
        });
    }
    if !reader.is_empty() {
        reader.note(Note::MalformedField(format!(
            "{} trailing bytes after the match results",
            reader.remaining()
        )));
        reader.skip(reader.remaining())?;
    }

    Ok(results)
}

impl RouterRenumbering {
    pub(crate) fn from_reader(reader: &mut RecordReader, code: u8) -> Result<Self, Error> {
        let sequence_number = reader.read_u32()?;
        let segment_number = reader.read_u8()?;
        let flags = reader.read_u8()?.into();
        let max_delay = reader.read_u16()?;
        reader.skip(4)?;

        let body = match code {
            RR_COMMAND => RenumberingBody::Command(commands_from_reader(reader)?),
            RR_RESULT => RenumberingBody::Result(results_from_reader(reader)?),
            RR_SEQUENCE_NUMBER_RESET => RenumberingBody::SequenceNumberReset,
            _ => {
                reader.note(Note::UnknownType(format!("router renumbering code {}", code)));
                RenumberingBody::Unknown(reader.read_rest()?.into())
            }
        };

        Ok(Self {
            sequence_number,
            segment_number,
            flags,
            max_delay,
            body,
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
    fn command_with_use_prefix() {
        let value = decode(concat!(
            "8a000000",
            "00000001",
            "00",
            "c0",
            "03e8",
            "00000000",
            // PCO: CHANGE, 7 units, ordinal 1, match /32, lengths 48..64
            "0107",
            "01203040",
            "0000",
            "20010db8000000000000000000000000",
            // Use-Prefix
            "4000e0c0",
            "00278d00",
            "00093a80",
            "80000000",
            "20010db8000100000000000000000000",
        ));
        assert_eq!(value["sequence_number"], json!(1));
        assert_eq!(value["flags"]["test_command"], json!(true));
        assert_eq!(value["flags"]["result_requested"], json!(true));
        assert_eq!(value["max_delay"], json!(1000));

        let pco = &value["body"]["command"][0];
        assert_eq!(pco["opcode_name"], json!("CHANGE"));
        assert_eq!(pco["match_prefix"], json!("2001:db8::"));
        assert_eq!(
            pco["use_prefixes"][0],
            json!({
                "use_length": 64,
                "keep_length": 0,
                "flag_mask": "0xe0",
                "ra_flags": "0xc0",
                "valid_lifetime": 2592000,
                "preferred_lifetime": 604800,
                "decrement_valid": true,
                "decrement_preferred": false,
                "use_prefix": "2001:db8:1::",
            })
        );
    }

    #[test]
    fn result_message() {
        let value = decode(concat!(
            "8a010000",
            "00000002",
            "00",
            "00",
            "0000",
            "00000000",
            "0002",
            "0140",
            "00000003",
            "20010db8000100000000000000000000",
        ));
        assert_eq!(
            value["body"]["result"][0],
            json!({
                "prefix_out_of_bounds": true,
                "forbidden": false,
                "ordinal": 1,
                "matched_length": 64,
                "interface_index": 3,
                "matched_prefix": "2001:db8:1::",
            })
        );
    }

    #[test]
    fn sequence_number_reset() {
        let value = decode(concat!("8aff0000", "00000000", "00", "00", "0000", "00000000"));
        assert_eq!(value["body"], json!("sequence_number_reset"));
    }

    #[test]
    fn short_operation_length_is_noted() {
        let value = decode(concat!(
            "8a000000",
            "00000001",
            "00",
            "00",
            "0000",
            "00000000",
            "0102",
            "0000",
        ));
        assert!(value["body"]["command"].as_array().unwrap().is_empty());
        assert_eq!(value["notes"][0]["kind"], json!("malformed_field"));
    }
}
