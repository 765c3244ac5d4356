//! Echo, Extended Echo (RFC 8335) and the ICMP extension structure (RFC 4884)

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layers::dns::rdata::RecordReader;
use crate::types::{IPv4Address, IPv6Address};

/// Class number of the Interface Identification Object.
pub const EXTENSION_CLASS_INTERFACE_IDENTIFICATION: u8 = 3;

const EXTENSION_HEADER_LENGTH: usize = 4;

#[derive(Default, Debug, Serialize)]
pub struct Echo {
    identifier: u16,
    sequence_number: u16,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    data: Vec<u8>,
}

impl Echo {
    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn sequence_number(&self) -> u16 {
        self.sequence_number
    }

    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        Ok(Self {
            identifier: reader.read_u16()?,
            sequence_number: reader.read_u16()?,
            data: reader.read_rest()?.into(),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceIdentification {
    Name(String),
    Index(u32),
    Address { afi: u16, address: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtensionObjectValue {
    InterfaceIdentification(InterfaceIdentification),
    #[serde(serialize_with = "hex::serde::serialize")]
    Unknown(Vec<u8>),
}

#[derive(Debug, Serialize)]
pub struct ExtensionObject {
    length: u16,
    class_num: u8,
    c_type: u8,
    value: ExtensionObjectValue,
}

#[derive(Debug, Serialize)]
pub struct ExtensionStructure {
    version: u8,
    #[serde(serialize_with = "crate::types::hex::serialize_lower_hex_u16")]
    checksum: u16,
    objects: Vec<ExtensionObject>,
}

fn interface_identification(
    reader: &mut RecordReader,
    c_type: u8,
) -> Result<ExtensionObjectValue, Error> {
    let value = match c_type {
        1 => {
            let name = reader.read_rest()?;
            let end = name.iter().position(|b| *b == 0).unwrap_or(name.len());
            InterfaceIdentification::Name(String::from_utf8_lossy(&name[..end]).into_owned())
        }
        2 => InterfaceIdentification::Index(reader.read_u32()?),
        3 => {
            let afi = reader.read_u16()?;
            let length = reader.read_u8()?;
            reader.skip(1)?;
            let address = match (afi, length) {
                (1, 4) => IPv4Address::from(reader.read_array::<4>()?).to_string(),
                (2, 16) => IPv6Address::from(reader.read_array::<16>()?).to_string(),
                _ => hex::encode(reader.read_bytes(length as usize)?),
            };
            InterfaceIdentification::Address { afi, address }
        }
        _ => {
            reader.note(Note::UnknownType(format!(
                "interface identification C-Type {}",
                c_type
            )));
            return Ok(ExtensionObjectValue::Unknown(reader.read_rest()?.into()));
        }
    };

    Ok(ExtensionObjectValue::InterfaceIdentification(value))
}

impl ExtensionStructure {
    /// Decode the extension structure filling the rest of `reader`.
    ///
    /// An object whose length does not cover its own header ends the walk with a note.
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let version = reader.read_u8()? >> 4;
        reader.skip(1)?;
        let checksum = reader.read_u16()?;

        let mut objects = vec![];
        while reader.remaining() >= EXTENSION_HEADER_LENGTH {
            let length = reader.read_u16()?;
            let class_num = reader.read_u8()?;
            let c_type = reader.read_u8()?;
            if (length as usize) < EXTENSION_HEADER_LENGTH {
                reader.note(Note::MalformedField(format!(
                    "extension object length {} is less than 4",
                    length
                )));
                reader.skip(reader.remaining())?;
                break;
            }

            let mut body = reader.sub_reader(length as usize - EXTENSION_HEADER_LENGTH)?;
            let value = if class_num == EXTENSION_CLASS_INTERFACE_IDENTIFICATION {
                interface_identification(&mut body, c_type)?
            } else {
                body.note(Note::UnknownType(format!("extension class {}", class_num)));
                ExtensionObjectValue::Unknown(body.read_rest()?.into())
            };
            for note in body.into_notes() {
                reader.note(note);
            }

            objects.push(ExtensionObject {
                length,
                class_num,
                c_type,
                value,
            });
        }

        if !reader.is_empty() {
            reader.note(Note::MalformedField(
                "trailing bytes after the extension objects".to_string(),
            ));
            reader.skip(reader.remaining())?;
        }

        Ok(Self {
            version,
            checksum,
            objects,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ExtendedEchoRequest {
    identifier: u16,
    sequence_number: u8,
    local: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    extensions: Option<ExtensionStructure>,
}

impl ExtendedEchoRequest {
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let identifier = reader.read_u16()?;
        let sequence_number = reader.read_u8()?;
        let local = reader.read_u8()? & 0x01 != 0;
        let extensions = if reader.is_empty() {
            None
        } else {
            Some(ExtensionStructure::from_reader(reader)?)
        };

        Ok(Self {
            identifier,
            sequence_number,
            local,
            extensions,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ExtendedEchoReply {
    identifier: u16,
    sequence_number: u8,
    state: u8,
    state_name: &'static str,
    active: bool,
    ipv4: bool,
    ipv6: bool,
}

fn neighbor_state_name(state: u8) -> &'static str {
    match state {
        1 => "Incomplete",
        2 => "Reachable",
        3 => "Stale",
        4 => "Delay",
        5 => "Probe",
        6 => "Failed",
        _ => "Reserved",
    }
}

impl ExtendedEchoReply {
    pub(crate) fn from_reader(reader: &mut RecordReader) -> Result<Self, Error> {
        let identifier = reader.read_u16()?;
        let sequence_number = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let state = flags >> 5;

        Ok(Self {
            identifier,
            sequence_number,
            state,
            state_name: neighbor_state_name(state),
            active: flags & 0x04 != 0,
            ipv4: flags & 0x02 != 0,
            ipv6: flags & 0x01 != 0,
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
    fn extended_echo_request_by_name() {
        let value = decode(concat!(
            "a0000000",
            "12340100",
            // Extension header, Interface Identification by name "eth0".
            "20000000",
            "00080301",
            "65746830",
        ));
        assert_eq!(value["identifier"], json!(0x1234));
        assert_eq!(value["sequence_number"], json!(1));
        assert_eq!(value["local"], json!(false));
        assert_eq!(value["extensions"]["version"], json!(2));
        assert_eq!(
            value["extensions"]["objects"][0]["value"],
            json!({"interface_identification": {"name": "eth0"}})
        );
    }

    #[test]
    fn extended_echo_request_by_address() {
        let value = decode(concat!(
            "a0000000",
            "12340201",
            "20000000",
            "000c0303",
            "00010400c0000201",
        ));
        assert_eq!(value["local"], json!(true));
        assert_eq!(
            value["extensions"]["objects"][0]["value"]["interface_identification"],
            json!({"address": {"afi": 1, "address": "192.0.2.1"}})
        );
    }

    #[test]
    fn extended_echo_reply() {
        let value = decode("a100000012340146");
        assert_eq!(value["state"], json!(2));
        assert_eq!(value["state_name"], json!("Reachable"));
        assert_eq!(value["active"], json!(true));
        assert_eq!(value["ipv4"], json!(true));
        assert_eq!(value["ipv6"], json!(false));
    }

    #[test]
    fn short_extension_object_is_noted() {
        let value = decode(concat!("a0000000", "12340100", "20000000", "00020301"));
        assert!(value["extensions"]["objects"].as_array().unwrap().is_empty());
        assert_eq!(value["notes"][0]["kind"], json!("malformed_field"));
    }
}
