//! DNSSEC helpers: key tags, algorithm tables, key flags and the base32hex alphabet of NSEC3.

use serde::Serialize;

/// RFC 4034 Appendix B key tag of a KEY/DNSKEY RDATA (flags, protocol, algorithm and key).
///
/// Returns `None` if the RDATA is shorter than its fixed 4 byte part.
pub fn compute_key_tag(rdata: &[u8], algorithm: u8) -> Option<u16> {
    if rdata.len() < 4 {
        return None;
    }

    // RSA/MD5 keys use bits 8..24 of the modulus (the 3rd and 2nd last octets).
    if algorithm == 1 {
        let len = rdata.len();
        return Some((rdata[len - 3] as u16) << 8 | rdata[len - 2] as u16);
    }

    let mut ac: u32 = 0;
    for (i, b) in rdata.iter().enumerate() {
        ac += if i & 1 == 1 {
            *b as u32
        } else {
            (*b as u32) << 8
        };
    }
    ac += (ac >> 16) & 0xffff;

    Some((ac & 0xffff) as u16)
}

pub fn algorithm_name(algorithm: u8) -> &'static str {
    match algorithm {
        0 => "Delete DS",
        1 => "RSA/MD5",
        2 => "Diffie-Hellman",
        3 => "DSA/SHA1",
        5 => "RSA/SHA1",
        6 => "DSA-NSEC3-SHA1",
        7 => "RSASHA1-NSEC3-SHA1",
        8 => "RSA/SHA-256",
        10 => "RSA/SHA-512",
        12 => "GOST R 34.10-2001",
        13 => "ECDSA Curve P-256 with SHA-256",
        14 => "ECDSA Curve P-384 with SHA-384",
        15 => "Ed25519",
        16 => "Ed448",
        252 => "Indirect",
        253 => "Private DNS",
        254 => "Private OID",
        _ => "Unknown",
    }
}

pub fn digest_name(digest_type: u8) -> &'static str {
    match digest_type {
        1 => "SHA-1",
        2 => "SHA-256",
        3 => "GOST R 34.11-94",
        4 => "SHA-384",
        _ => "Unknown",
    }
}

/// Flags of a DNSKEY (RFC 4034, RFC 5011).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DNSKeyFlags {
    zone_key: bool,
    revoked: bool,
    secure_entry_point: bool,
}

impl From<u16> for DNSKeyFlags {
    fn from(flags: u16) -> Self {
        Self {
            zone_key: flags & 0x0100 != 0,
            revoked: flags & 0x0080 != 0,
            secure_entry_point: flags & 0x0001 != 0,
        }
    }
}

const BASE32HEX: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

/// Unpadded base32hex (RFC 4648 Section 7) as used for NSEC3 hashed owner names.
pub fn base32hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() * 8 + 4) / 5);
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for b in bytes {
        buffer = buffer << 8 | *b as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32HEX[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32HEX[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }

    out
}
