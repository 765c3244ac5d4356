//! Aligned PER (ITU-T X.691) decoding primitives
//!
//! Just enough of the aligned variant of the Packed Encoding Rules to walk the envelope shared by
//! the 3GPP application protocols: a CHOICE of initiating / successful / unsuccessful message, a
//! procedure code, a criticality, an open type carrying the message, and inside it a
//! `ProtocolIE-Container` of (id, criticality, open type) triples. Every IE value is an open type,
//! so an IE that can not be decoded never prevents decoding the IEs after it.

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layer::Layer;
use crate::packet::{decode_chain, serialize_layers};
use crate::registry::Registry;

/// Reads PER fields bit by bit from a byte slice.
#[derive(Debug, Clone)]
pub struct PerReader<'a> {
    bytes: &'a [u8],
    bit: usize,
}

impl<'a> PerReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, bit: 0 }
    }

    pub fn bit_offset(&self) -> usize {
        self.bit
    }

    /// Octets consumed so far, counting a partially read octet.
    pub fn byte_offset(&self) -> usize {
        (self.bit + 7) / 8
    }

    pub fn remaining_bits(&self) -> usize {
        self.bytes.len() * 8 - self.bit
    }

    pub fn is_empty(&self) -> bool {
        self.remaining_bits() == 0
    }

    fn check(&self, bits: usize) -> Result<(), Error> {
        if bits > self.remaining_bits() {
            return Err(Error::TooShort {
                required: (self.bit + bits + 7) / 8,
                available: self.bytes.len(),
                data: hex::encode(&self.bytes[self.bit / 8..]),
            });
        }

        Ok(())
    }

    /// Skip to the next octet boundary.
    pub fn align(&mut self) {
        self.bit = (self.bit + 7) & !7;
    }

    pub fn read_bit(&mut self) -> Result<bool, Error> {
        self.check(1)?;
        let octet = self.bytes[self.bit / 8];
        let set = octet & (0x80 >> (self.bit % 8)) != 0;
        self.bit += 1;

        Ok(set)
    }

    /// Up to 64 bits, most significant first.
    pub fn read_bits(&mut self, n: usize) -> Result<u64, Error> {
        if n > 64 {
            return Err(Error::ParseError(format!("{} bit field", n)));
        }
        self.check(n)?;

        let mut value = 0_u64;
        for _ in 0..n {
            value = value << 1 | self.read_bit()? as u64;
        }

        Ok(value)
    }

    /// `n` octets starting at the next octet boundary.
    pub fn read_octets(&mut self, n: usize) -> Result<&'a [u8], Error> {
        self.align();
        self.check(n * 8)?;
        let start = self.bit / 8;
        self.bit += n * 8;

        Ok(&self.bytes[start..start + n])
    }

    /// X.691 11.5.7: a whole number in `lb..=ub`.
    pub fn read_constrained_whole_number(&mut self, lb: u64, ub: u64) -> Result<u64, Error> {
        if ub < lb {
            return Err(Error::ParseError(format!("empty range {}..{}", lb, ub)));
        }
        let span = ub - lb;

        let offset = match span {
            0 => 0,
            1..=254 => self.read_bits(bits_for_span(span))?,
            255 => {
                self.align();
                self.read_bits(8)?
            }
            256..=65535 => {
                self.align();
                self.read_bits(16)?
            }
            _ => {
                let max_octets = (bits_for_span(span) as u64 + 7) / 8;
                let octets = self.read_constrained_whole_number(1, max_octets)? as usize;
                self.align();
                self.read_bits(octets * 8)?
            }
        };

        lb.checked_add(offset)
            .filter(|value| *value <= ub)
            .ok_or_else(|| Error::ParseError(format!("{} out of range {}..{}", offset, lb, ub)))
    }

    /// X.691 11.9.3.6: an unconstrained length determinant. Fragmented lengths are not
    /// supported.
    pub fn read_length_determinant(&mut self) -> Result<usize, Error> {
        self.align();
        let first = self.read_bits(8)? as usize;

        match first >> 6 {
            0 | 1 => Ok(first),
            2 => Ok((first & 0x3f) << 8 | self.read_bits(8)? as usize),
            _ => Err(Error::ParseError(
                "fragmented length determinant".to_string(),
            )),
        }
    }

    /// X.691 11.6: a normally small non-negative whole number.
    pub fn read_normally_small(&mut self) -> Result<u64, Error> {
        if !self.read_bit()? {
            return self.read_bits(6);
        }

        let octets = self.read_length_determinant()?;
        self.align();
        self.read_bits(octets * 8)
    }

    /// X.691 11.2: the contents of an open type.
    pub fn read_open_type(&mut self) -> Result<&'a [u8], Error> {
        let len = self.read_length_determinant()?;
        self.read_octets(len)
    }

    /// An INTEGER (lb..ub) with or without an extension marker. A value outside the root is
    /// encoded as an unconstrained integer.
    pub fn read_integer(&mut self, lb: u64, ub: u64, extensible: bool) -> Result<u64, Error> {
        if extensible && self.read_bit()? {
            let octets = self.read_length_determinant()?;
            let bytes = self.read_octets(octets)?;
            if octets > 8 || bytes.first().map_or(false, |b| b & 0x80 != 0) {
                return Err(Error::ParseError(format!(
                    "integer {} out of supported range",
                    hex::encode(bytes)
                )));
            }
            return Ok(bytes.iter().fold(0, |acc, b| acc << 8 | *b as u64));
        }

        self.read_constrained_whole_number(lb, ub)
    }

    /// An ENUMERATED with `root_count` root values. Returns the index and whether it is an
    /// extension value, whose index counts from the first extension.
    pub fn read_enumerated(
        &mut self,
        root_count: u64,
        extensible: bool,
    ) -> Result<(u64, bool), Error> {
        if extensible && self.read_bit()? {
            return Ok((self.read_normally_small()?, true));
        }

        Ok((self.read_constrained_whole_number(0, root_count - 1)?, false))
    }

    /// The index of a CHOICE alternative, see [`read_enumerated`][`Self::read_enumerated`].
    pub fn read_choice_index(
        &mut self,
        root_count: u64,
        extensible: bool,
    ) -> Result<(u64, bool), Error> {
        self.read_enumerated(root_count, extensible)
    }

    /// The preamble of a SEQUENCE: the extension bit, if any, then one presence bit per
    /// optional root component.
    pub fn read_sequence_preamble(
        &mut self,
        extensible: bool,
        optional_count: usize,
    ) -> Result<(bool, Vec<bool>), Error> {
        let extended = extensible && self.read_bit()?;
        let mut present = Vec::with_capacity(optional_count);
        for _ in 0..optional_count {
            present.push(self.read_bit()?);
        }

        Ok((extended, present))
    }

    /// An OCTET STRING (SIZE(lb..ub)); `ub` of `None` means no upper bound.
    pub fn read_octet_string(
        &mut self,
        lb: usize,
        ub: Option<usize>,
        extensible: bool,
    ) -> Result<Vec<u8>, Error> {
        if extensible && self.read_bit()? {
            let len = self.read_length_determinant()?;
            return Ok(self.read_octets(len)?.into());
        }

        match ub {
            Some(ub) if ub == lb && ub <= 2 => {
                let mut out = Vec::with_capacity(ub);
                for _ in 0..ub {
                    out.push(self.read_bits(8)? as u8);
                }
                Ok(out)
            }
            Some(ub) if ub == lb && ub < 65536 => Ok(self.read_octets(ub)?.into()),
            Some(ub) if ub < 65536 => {
                let len = self.read_constrained_whole_number(lb as u64, ub as u64)? as usize;
                Ok(self.read_octets(len)?.into())
            }
            _ => {
                let len = self.read_length_determinant()?;
                Ok(self.read_octets(len)?.into())
            }
        }
    }

    /// A fixed size BIT STRING of up to 64 bits.
    pub fn read_fixed_bit_string(&mut self, size: usize) -> Result<u64, Error> {
        if size > 16 {
            self.align();
        }
        self.read_bits(size)
    }

    /// A PrintableString or VisibleString; the aligned variant spends a full octet per
    /// character, so the layout is that of an OCTET STRING of the same size.
    pub fn read_printable_string(
        &mut self,
        lb: usize,
        ub: Option<usize>,
        extensible: bool,
    ) -> Result<String, Error> {
        let bytes = self.read_octet_string(lb, ub, extensible)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

fn bits_for_span(span: u64) -> usize {
    (64 - span.leading_zeros()) as usize
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    #[default]
    Reject,
    Ignore,
    Notify,
}

impl Criticality {
    pub fn from_reader(reader: &mut PerReader) -> Result<Self, Error> {
        let (index, _) = reader.read_enumerated(3, false)?;
        Ok(match index {
            0 => Criticality::Reject,
            1 => Criticality::Ignore,
            _ => Criticality::Notify,
        })
    }
}

/// Alternative of the top level PDU CHOICE.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PduKind {
    #[default]
    InitiatingMessage,
    SuccessfulOutcome,
    UnsuccessfulOutcome,
}

impl PduKind {
    /// Returns `None` for an alternative added by a later version of the protocol.
    pub fn from_reader(reader: &mut PerReader) -> Result<Option<Self>, Error> {
        let kind = match reader.read_choice_index(3, true)? {
            (0, false) => Some(PduKind::InitiatingMessage),
            (1, false) => Some(PduKind::SuccessfulOutcome),
            (2, false) => Some(PduKind::UnsuccessfulOutcome),
            _ => None,
        };

        Ok(kind)
    }
}

/// One field of a ProtocolIE-Container, value still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolIEField<'a> {
    pub id: u16,
    pub criticality: Criticality,
    pub value: &'a [u8],
}

/// `ProtocolIE-Container ::= SEQUENCE (SIZE (0..max_ies)) OF ProtocolIE-Field`
pub fn read_protocol_ie_container<'a>(
    reader: &mut PerReader<'a>,
    max_ies: u64,
) -> Result<Vec<ProtocolIEField<'a>>, Error> {
    let count = reader.read_constrained_whole_number(0, max_ies)?;

    let mut fields = vec![];
    for _ in 0..count {
        let id = reader.read_constrained_whole_number(0, 65535)? as u16;
        let criticality = Criticality::from_reader(reader)?;
        let value = reader.read_open_type()?;
        fields.push(ProtocolIEField {
            id,
            criticality,
            value,
        });
    }

    Ok(fields)
}

/// An IE value handed to another dissector.
#[derive(Debug, Serialize)]
pub struct Delegated {
    protocol: &'static str,
    #[serde(serialize_with = "serialize_layers")]
    layers: Vec<Box<dyn Layer + Send>>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    unprocessed: Vec<u8>,
}

impl Delegated {
    pub fn layers(&self) -> &[Box<dyn Layer + Send>] {
        &self.layers
    }
}

/// Decoded value of a protocol IE.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IEValue {
    Integer(u64),
    Enumerated {
        value: u64,
        name: &'static str,
    },
    Text(String),
    Cause {
        group: &'static str,
        value: u64,
        name: &'static str,
    },
    CellGlobalId {
        plmn: String,
        cell_identity: String,
    },
    Delegated(Delegated),
    #[serde(serialize_with = "hex::serde::serialize")]
    Opaque(Vec<u8>),
}

/// A decoded protocol IE.
#[derive(Debug, Serialize)]
pub struct ProtocolIE {
    id: u16,
    name: &'static str,
    criticality: Criticality,
    value: IEValue,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl ProtocolIE {
    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn value(&self) -> &IEValue {
        &self.value
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

/// Decode every field of a container with `decode`.
///
/// `decode` returns `Ok(None)` for an IE id it does not know, which is kept opaque with an
/// `UnknownType` note. A value that fails to decode is kept opaque with a `MalformedField` note.
pub fn decode_protocol_ies<F>(
    fields: &[ProtocolIEField],
    name: fn(u16) -> &'static str,
    mut decode: F,
) -> Vec<ProtocolIE>
where
    F: FnMut(u16, &[u8], &mut Vec<Note>) -> Result<Option<IEValue>, Error>,
{
    fields
        .iter()
        .map(|field| {
            let mut notes = vec![];
            let value = match decode(field.id, field.value, &mut notes) {
                Ok(Some(value)) => value,
                Ok(None) => {
                    log_debug!("protocol IE {} not implemented", field.id);
                    notes.push(Note::UnknownType(format!("protocol IE {}", field.id)));
                    IEValue::Opaque(field.value.into())
                }
                Err(e) => {
                    notes.push(Note::MalformedField(format!(
                        "protocol IE {}: {}",
                        field.id, e
                    )));
                    IEValue::Opaque(field.value.into())
                }
            };

            ProtocolIE {
                id: field.id,
                name: name(field.id),
                criticality: field.criticality,
                value,
                notes,
            }
        })
        .collect()
}

/// Hand `bytes` to the dissector registered as `protocol`, opaque with a note if there is none.
pub fn delegate(
    registry: &Registry,
    protocol: &'static str,
    bytes: &[u8],
    notes: &mut Vec<Note>,
) -> IEValue {
    let first = match registry.named.create(protocol) {
        Some(first) => first,
        None => {
            notes.push(Note::UnknownType(format!(
                "no dissector registered for {}",
                protocol
            )));
            return IEValue::Opaque(bytes.into());
        }
    };

    let chain = decode_chain(registry, first, bytes);
    if let Some(e) = chain.error {
        notes.push(Note::MalformedField(format!("{}: {}", protocol, e)));
    }

    IEValue::Delegated(Delegated {
        protocol,
        layers: chain.layers,
        unprocessed: bytes[chain.consumed..].into(),
    })
}

/// A `Cause` alternative: its name and the names of its root values.
pub type CauseGroup = (&'static str, &'static [&'static str]);

/// `Cause ::= CHOICE { <groups>..., choice-extension }`, each group an extensible ENUMERATED.
pub fn read_cause(reader: &mut PerReader, groups: &[CauseGroup]) -> Result<IEValue, Error> {
    let (index, _) = reader.read_choice_index(groups.len() as u64 + 1, false)?;
    let (group, names) = match groups.get(index as usize) {
        Some(group) => *group,
        None => {
            return Ok(IEValue::Cause {
                group: "choice-extension",
                value: 0,
                name: "unknown",
            })
        }
    };

    let (value, extended) = reader.read_enumerated(names.len() as u64, true)?;
    let name = match names.get(value as usize) {
        Some(&name) if !extended => name,
        _ => "extension",
    };

    Ok(IEValue::Cause { group, value, name })
}

/// An ENUMERATED whose root values are `names`.
pub fn read_named_enumerated(
    reader: &mut PerReader,
    names: &'static [&'static str],
    extensible: bool,
) -> Result<IEValue, Error> {
    let (value, extended) = reader.read_enumerated(names.len() as u64, extensible)?;
    let name = match names.get(value as usize) {
        Some(&name) if !extended => name,
        _ => "extension",
    };

    Ok(IEValue::Enumerated { value, name })
}

/// `PLMN-Identity`: three octets of BCD digits, MCC then MNC, an MNC of two digits padded
/// with `f`.
pub fn plmn_identity(octets: &[u8]) -> Result<String, Error> {
    if octets.len() != 3 {
        return Err(Error::ParseError(format!(
            "PLMN identity {}",
            hex::encode(octets)
        )));
    }

    let digits = [
        octets[0] & 0x0f,
        octets[0] >> 4,
        octets[1] & 0x0f,
        octets[2] & 0x0f,
        octets[2] >> 4,
        octets[1] >> 4,
    ];

    let mut out = String::with_capacity(7);
    for (i, &digit) in digits.iter().enumerate() {
        if i == 3 {
            out.push('-');
        }
        match digit {
            0..=9 => out.push((b'0' + digit) as char),
            0x0f if i == 5 => {}
            _ => {
                return Err(Error::ParseError(format!(
                    "PLMN identity {}",
                    hex::encode(octets)
                )))
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constrained_whole_numbers() {
        // 2 bits, then 3 bits, unaligned.
        let mut reader = PerReader::new(&[0b1010_0000]);
        assert_eq!(reader.read_constrained_whole_number(0, 3).unwrap(), 2);
        assert_eq!(reader.read_constrained_whole_number(1, 5).unwrap(), 5);
        assert_eq!(reader.bit_offset(), 5);

        // Range 256 is one aligned octet.
        let mut reader = PerReader::new(&[0x80, 0x2a]);
        assert!(reader.read_bit().unwrap());
        assert_eq!(reader.read_constrained_whole_number(0, 255).unwrap(), 42);

        // Range 65536 is two aligned octets.
        let mut reader = PerReader::new(&[0x01, 0x00]);
        assert_eq!(reader.read_constrained_whole_number(0, 65535).unwrap(), 256);

        // Larger ranges carry their octet count: 2 bits (0..4 octets), aligned value.
        let mut reader = PerReader::new(&[0x40, 0x12, 0x34]);
        assert_eq!(
            reader.read_constrained_whole_number(0, 4_294_967_295).unwrap(),
            0x1234
        );
        assert_eq!(reader.byte_offset(), 3);

        let mut reader = PerReader::new(&[0x00]);
        assert_eq!(reader.read_constrained_whole_number(7, 7).unwrap(), 7);
        assert_eq!(reader.bit_offset(), 0);
    }

    #[test]
    fn out_of_range_value_fails() {
        // 3 bits hold 7, the range is 1..=5.
        let mut reader = PerReader::new(&[0xe0]);
        assert!(matches!(
            reader.read_constrained_whole_number(1, 5),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn length_determinants() {
        let mut reader = PerReader::new(&[0x05]);
        assert_eq!(reader.read_length_determinant().unwrap(), 5);

        let mut reader = PerReader::new(&[0x81, 0x00]);
        assert_eq!(reader.read_length_determinant().unwrap(), 256);

        let mut reader = PerReader::new(&[0xc1]);
        assert!(reader.read_length_determinant().is_err());
    }

    #[test]
    fn open_type_past_end_fails() {
        let mut reader = PerReader::new(&[0x04, 0xaa, 0xbb]);
        assert!(matches!(
            reader.read_open_type(),
            Err(Error::TooShort {
                required: 5,
                available: 3,
                ..
            })
        ));
    }

    #[test]
    fn enumerated_and_normally_small() {
        // Extension bit clear, index 2 of 3 in 2 bits.
        let mut reader = PerReader::new(&[0b0100_0000]);
        assert_eq!(reader.read_enumerated(3, true).unwrap(), (2, false));

        // Extension bit set, normally small 5.
        let mut reader = PerReader::new(&[0b1000_0101]);
        assert_eq!(reader.read_enumerated(6, true).unwrap(), (5, true));
    }

    #[test]
    fn extensible_integer() {
        // TransactionID ::= INTEGER (0..255, ...)
        let mut reader = PerReader::new(&[0x00, 0x05]);
        assert_eq!(reader.read_integer(0, 255, true).unwrap(), 5);

        // Value outside the root: extension bit, length 2, value.
        let mut reader = PerReader::new(&[0x80, 0x02, 0x01, 0x00]);
        assert_eq!(reader.read_integer(0, 255, true).unwrap(), 256);
    }

    #[test]
    fn printable_string() {
        // PrintableString (SIZE(1..150, ...)): extension bit, 8 bit length - 1, aligned text.
        let mut reader = PerReader::new(&[0x02, 0x80, b'g', b'N', b'B', b'-', b'D', b'U']);
        assert_eq!(
            reader.read_printable_string(1, Some(150), true).unwrap(),
            "gNB-DU"
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn short_fixed_octet_string_is_not_aligned() {
        let mut reader = PerReader::new(&[0x81, 0x23, 0x00]);
        assert!(reader.read_bit().unwrap());
        assert_eq!(
            reader.read_octet_string(2, Some(2), false).unwrap(),
            vec![0x02, 0x46]
        );
    }

    #[test]
    fn protocol_ie_container() {
        let bytes = hex::decode("0002004e00020005002a4002000a").unwrap();
        let mut reader = PerReader::new(&bytes);
        let fields = read_protocol_ie_container(&mut reader, 65535).unwrap();

        assert_eq!(
            fields,
            vec![
                ProtocolIEField {
                    id: 78,
                    criticality: Criticality::Reject,
                    value: &[0x00, 0x05],
                },
                ProtocolIEField {
                    id: 42,
                    criticality: Criticality::Ignore,
                    value: &[0x00, 0x0a],
                },
            ]
        );
        assert!(reader.is_empty());
    }

    #[test]
    fn plmn_identities() {
        assert_eq!(plmn_identity(&[0x00, 0xf1, 0x10]).unwrap(), "001-01");
        assert_eq!(plmn_identity(&[0x13, 0x00, 0x14]).unwrap(), "310-410");
        assert!(plmn_identity(&[0x00, 0xf1]).is_err());
    }
}
