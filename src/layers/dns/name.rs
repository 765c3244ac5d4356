//! Domain name expansion
//!
//! Names are a sequence of length prefixed labels, terminated by a zero octet, where the tail of
//! the name may be replaced by a compression pointer to an earlier occurence (RFC 1035 Section
//! 4.1.4). Legacy bit-string labels (RFC 2673) are decoded too.

use core::fmt;

use serde::{Serialize, Serializer};

use crate::cursor::ByteCursor;
use crate::errors::{Error, Note};

pub(crate) const ROOT_NAME: &str = "<Root>";
pub(crate) const LOOP_NAME: &str = "<Name contains a pointer that loops>";
pub(crate) const UNKNOWN_EXTENDED_LABEL_NAME: &str = "<Unknown extended label>";

const LABEL_TYPE_MASK: u8 = 0xC0;
const LABEL_TYPE_NORMAL: u8 = 0x00;
const LABEL_TYPE_EXTENDED: u8 = 0x40;
const LABEL_TYPE_RESERVED: u8 = 0x80;
const EXTENDED_LABEL_BITSTRING: u8 = 0x41;

/// A single label of a name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// Label bytes as on the wire. Not necessarily printable.
    Normal(Vec<u8>),
    /// RFC 2673 bit-string label.
    Bitstring { bit_count: u8, bits: Vec<u8> },
}

/// Why a name could not be fully expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degenerate {
    PointerLoop,
    UnknownExtendedLabel,
}

/// A decoded domain name.
///
/// Rendered in presentation form (`.` separated, with `.`, `\` and non-printable bytes escaped),
/// `<Root>` for the root name and a placeholder if the name could not be expanded.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct DNSName {
    labels: Vec<Label>,
    degenerate: Option<Degenerate>,
}

impl DNSName {
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty() && self.degenerate.is_none()
    }

    pub fn is_degenerate(&self) -> bool {
        self.degenerate.is_some()
    }

    pub fn degenerate(&self) -> Option<Degenerate> {
        self.degenerate
    }

    /// Number of labels, 0 for the root. A placeholder name counts as one label.
    pub fn label_count(&self) -> usize {
        if self.is_degenerate() {
            1
        } else {
            self.labels.len()
        }
    }

    /// The note a caller should attach to the field holding this name, if any.
    pub fn note(&self) -> Option<Note> {
        match self.degenerate {
            Some(Degenerate::PointerLoop) => Some(Note::CompressionLoop),
            Some(Degenerate::UnknownExtendedLabel) => Some(Note::MalformedField(
                UNKNOWN_EXTENDED_LABEL_NAME.to_string(),
            )),
            None => None,
        }
    }
}

fn escape_label(out: &mut String, label: &[u8]) {
    for b in label {
        match b {
            b'.' | b'\\' => {
                out.push('\\');
                out.push(*b as char);
            }
            0x20..=0x7e => out.push(*b as char),
            _ => out.push_str(&format!("\\{:03}", b)),
        }
    }
}

impl fmt::Display for DNSName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.degenerate {
            Some(Degenerate::PointerLoop) => return write!(f, "{}", LOOP_NAME),
            Some(Degenerate::UnknownExtendedLabel) => {
                return write!(f, "{}", UNKNOWN_EXTENDED_LABEL_NAME)
            }
            None => {}
        }
        if self.labels.is_empty() {
            return write!(f, "{}", ROOT_NAME);
        }

        let mut out = String::new();
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match label {
                Label::Normal(bytes) => escape_label(&mut out, bytes),
                Label::Bitstring { bit_count, bits } => {
                    out.push_str(&format!("\\[x{}/{}]", hex::encode(bits), bit_count))
                }
            }
        }
        write!(f, "{}", out)
    }
}

impl fmt::Debug for DNSName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for DNSName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Expand the name starting at `offset`.
///
/// `message_base` is the offset compression pointers are relative to. `max_len`, when set (and
/// non-zero), bounds the number of bytes the encoded name may occupy from `offset`. Returns the
/// name and the number of bytes the caller has to skip, which for a compressed name is the
/// length up to and including the first pointer.
///
/// A pointer chain that visits more bytes than the message holds, or an unknown extended label
/// type, yields a placeholder name rather than an error.
pub fn get_dns_name(
    cursor: &ByteCursor,
    offset: usize,
    max_len: Option<usize>,
    message_base: usize,
) -> Result<(DNSName, usize), Error> {
    let start = offset;
    let max_len = max_len.filter(|m| *m > 0);
    let exceeded = |at: usize| match max_len {
        Some(max) => (at as isize - start as isize) > max as isize - 1,
        None => false,
    };

    let mut offset = offset;
    let mut chars_processed = 0_usize;
    let mut consumed: Option<usize> = None;
    let mut name = DNSName::default();

    loop {
        if exceeded(offset) {
            break;
        }

        let c = cursor.read_u8(offset)?;
        offset += 1;
        chars_processed += 1;

        if c == 0 {
            break;
        }

        match c & LABEL_TYPE_MASK {
            LABEL_TYPE_NORMAL => {
                let mut label = Vec::with_capacity(c as usize);
                for _ in 0..c {
                    if exceeded(offset) {
                        return Err(Error::ParseError(format!(
                            "DNS name at {} longer than {} bytes",
                            start,
                            max_len.unwrap_or_default()
                        )));
                    }
                    label.push(cursor.read_u8(offset)?);
                    offset += 1;
                    chars_processed += 1;
                }
                name.labels.push(Label::Normal(label));
            }
            LABEL_TYPE_EXTENDED => {
                if c != EXTENDED_LABEL_BITSTRING {
                    name.degenerate = Some(Degenerate::UnknownExtendedLabel);
                    break;
                }
                let bit_count = cursor.read_u8(offset)?;
                offset += 1;
                chars_processed += 1;

                let label_len = (bit_count as usize).saturating_sub(1) / 8 + 1;
                let bits = cursor.read_bytes(offset, label_len)?.to_vec();
                offset += label_len;
                chars_processed += label_len;
                name.labels.push(Label::Bitstring { bit_count, bits });
            }
            LABEL_TYPE_RESERVED => {
                return Err(Error::ParseError(format!(
                    "DNS name at {}: reserved label type {:#04x}",
                    start, c
                )));
            }
            _ => {
                let low = cursor.read_u8(offset)?;
                offset += 1;
                chars_processed += 1;

                let pointer = ((c & !LABEL_TYPE_MASK) as usize) << 8 | low as usize;
                let target = message_base + pointer;
                if consumed.is_none() {
                    consumed = Some(offset - start);
                }

                if chars_processed >= cursor.remaining(message_base) {
                    log_warn!("DNS name at {} contains a pointer that loops", start);
                    name.degenerate = Some(Degenerate::PointerLoop);
                    break;
                }
                offset = target;
            }
        }
    }

    let consumed = consumed.unwrap_or_else(|| offset - start);

    Ok((name, consumed))
}
