//! DNS type, class, opcode and rcode mnemonics.

pub const T_A: u16 = 1;
pub const T_NS: u16 = 2;
pub const T_MD: u16 = 3;
pub const T_MF: u16 = 4;
pub const T_CNAME: u16 = 5;
pub const T_SOA: u16 = 6;
pub const T_MB: u16 = 7;
pub const T_MG: u16 = 8;
pub const T_MR: u16 = 9;
pub const T_NULL: u16 = 10;
pub const T_WKS: u16 = 11;
pub const T_PTR: u16 = 12;
pub const T_HINFO: u16 = 13;
pub const T_MINFO: u16 = 14;
pub const T_MX: u16 = 15;
pub const T_TXT: u16 = 16;
pub const T_RP: u16 = 17;
pub const T_AFSDB: u16 = 18;
pub const T_X25: u16 = 19;
pub const T_ISDN: u16 = 20;
pub const T_RT: u16 = 21;
pub const T_NSAP: u16 = 22;
pub const T_NSAP_PTR: u16 = 23;
pub const T_SIG: u16 = 24;
pub const T_KEY: u16 = 25;
pub const T_PX: u16 = 26;
pub const T_GPOS: u16 = 27;
pub const T_AAAA: u16 = 28;
pub const T_LOC: u16 = 29;
pub const T_NXT: u16 = 30;
pub const T_SRV: u16 = 33;
pub const T_NAPTR: u16 = 35;
pub const T_KX: u16 = 36;
pub const T_CERT: u16 = 37;
pub const T_A6: u16 = 38;
pub const T_DNAME: u16 = 39;
pub const T_OPT: u16 = 41;
pub const T_APL: u16 = 42;
pub const T_DS: u16 = 43;
pub const T_SSHFP: u16 = 44;
pub const T_IPSECKEY: u16 = 45;
pub const T_RRSIG: u16 = 46;
pub const T_NSEC: u16 = 47;
pub const T_DNSKEY: u16 = 48;
pub const T_DHCID: u16 = 49;
pub const T_NSEC3: u16 = 50;
pub const T_NSEC3PARAM: u16 = 51;
pub const T_TLSA: u16 = 52;
pub const T_SMIMEA: u16 = 53;
pub const T_HIP: u16 = 55;
pub const T_CDS: u16 = 59;
pub const T_CDNSKEY: u16 = 60;
pub const T_OPENPGPKEY: u16 = 61;
pub const T_CSYNC: u16 = 62;
pub const T_ZONEMD: u16 = 63;
pub const T_SPF: u16 = 99;
pub const T_EUI48: u16 = 108;
pub const T_EUI64: u16 = 109;
pub const T_TKEY: u16 = 249;
pub const T_TSIG: u16 = 250;
pub const T_IXFR: u16 = 251;
pub const T_AXFR: u16 = 252;
pub const T_ANY: u16 = 255;
pub const T_URI: u16 = 256;
pub const T_CAA: u16 = 257;
pub const T_DLV: u16 = 32769;
pub const T_WINS: u16 = 65281;
pub const T_WINS_R: u16 = 65282;

pub const C_IN: u16 = 1;

/// Mnemonic of an RR type, `None` if not known.
pub fn type_name(t: u16) -> Option<&'static str> {
    let name = match t {
        T_A => "A",
        T_NS => "NS",
        T_MD => "MD",
        T_MF => "MF",
        T_CNAME => "CNAME",
        T_SOA => "SOA",
        T_MB => "MB",
        T_MG => "MG",
        T_MR => "MR",
        T_NULL => "NULL",
        T_WKS => "WKS",
        T_PTR => "PTR",
        T_HINFO => "HINFO",
        T_MINFO => "MINFO",
        T_MX => "MX",
        T_TXT => "TXT",
        T_RP => "RP",
        T_AFSDB => "AFSDB",
        T_X25 => "X25",
        T_ISDN => "ISDN",
        T_RT => "RT",
        T_NSAP => "NSAP",
        T_NSAP_PTR => "NSAP-PTR",
        T_SIG => "SIG",
        T_KEY => "KEY",
        T_PX => "PX",
        T_GPOS => "GPOS",
        T_AAAA => "AAAA",
        T_LOC => "LOC",
        T_NXT => "NXT",
        31 => "EID",
        32 => "NIMLOC",
        T_SRV => "SRV",
        34 => "ATMA",
        T_NAPTR => "NAPTR",
        T_KX => "KX",
        T_CERT => "CERT",
        T_A6 => "A6",
        T_DNAME => "DNAME",
        40 => "SINK",
        T_OPT => "OPT",
        T_APL => "APL",
        T_DS => "DS",
        T_SSHFP => "SSHFP",
        T_IPSECKEY => "IPSECKEY",
        T_RRSIG => "RRSIG",
        T_NSEC => "NSEC",
        T_DNSKEY => "DNSKEY",
        T_DHCID => "DHCID",
        T_NSEC3 => "NSEC3",
        T_NSEC3PARAM => "NSEC3PARAM",
        T_TLSA => "TLSA",
        T_SMIMEA => "SMIMEA",
        T_HIP => "HIP",
        56 => "NINFO",
        57 => "RKEY",
        58 => "TALINK",
        T_CDS => "CDS",
        T_CDNSKEY => "CDNSKEY",
        T_OPENPGPKEY => "OPENPGPKEY",
        T_CSYNC => "CSYNC",
        T_ZONEMD => "ZONEMD",
        64 => "SVCB",
        65 => "HTTPS",
        T_SPF => "SPF",
        100 => "UINFO",
        101 => "UID",
        102 => "GID",
        103 => "UNSPEC",
        104 => "NID",
        105 => "L32",
        106 => "L64",
        107 => "LP",
        T_EUI48 => "EUI48",
        T_EUI64 => "EUI64",
        T_TKEY => "TKEY",
        T_TSIG => "TSIG",
        T_IXFR => "IXFR",
        T_AXFR => "AXFR",
        253 => "MAILB",
        254 => "MAILA",
        T_ANY => "ANY",
        T_URI => "URI",
        T_CAA => "CAA",
        258 => "AVC",
        259 => "DOA",
        260 => "AMTRELAY",
        32768 => "TA",
        T_DLV => "DLV",
        T_WINS => "WINS",
        T_WINS_R => "WINS-R",
        _ => return None,
    };
    Some(name)
}

/// Type mnemonic, or the RFC 3597 `TYPE<n>` form for unknown types.
pub fn type_mnemonic(t: u16) -> String {
    match type_name(t) {
        Some(name) => name.to_string(),
        None => format!("TYPE{}", t),
    }
}

pub fn class_name(class: u16) -> Option<&'static str> {
    let name = match class {
        C_IN => "IN",
        3 => "CH",
        4 => "HS",
        254 => "NONE",
        255 => "ANY",
        _ => return None,
    };
    Some(name)
}

pub fn opcode_name(opcode: u8) -> &'static str {
    match opcode {
        0 => "Standard query",
        1 => "Inverse query",
        2 => "Server status request",
        4 => "Zone change notification",
        5 => "Dynamic update",
        6 => "DNS Stateful operations (DSO)",
        _ => "Unknown operation",
    }
}

/// Response code names, including the extended codes of EDNS and TSIG.
pub fn rcode_name(rcode: u16) -> &'static str {
    match rcode {
        0 => "No error",
        1 => "Format error",
        2 => "Server failure",
        3 => "No such name",
        4 => "Not implemented",
        5 => "Refused",
        6 => "Name exists",
        7 => "RRset exists",
        8 => "RRset does not exist",
        9 => "Not authoritative",
        10 => "Name out of zone",
        11 => "DSO-Type not implemented",
        16 => "Bad OPT version or TSIG signature failure",
        17 => "Key not recognized",
        18 => "Signature out of time window",
        19 => "Bad TKEY mode",
        20 => "Duplicate key name",
        21 => "Algorithm not supported",
        22 => "Bad truncation",
        23 => "Bad/missing server cookie",
        _ => "Unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mnemonics() {
        assert_eq!(type_mnemonic(T_AAAA), "AAAA");
        assert_eq!(type_mnemonic(T_DLV), "DLV");
        assert_eq!(type_mnemonic(62000), "TYPE62000");
        assert_eq!(class_name(C_IN), Some("IN"));
        assert_eq!(class_name(2), None);
        assert_eq!(opcode_name(0), "Standard query");
        assert_eq!(rcode_name(3), "No such name");
    }
}
