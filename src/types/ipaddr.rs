//! Definition of IP Address Types
//!
//! This module defines types for IPv4 and IPv6 which are simply based on the u8 arrays. Text
//! rendering follows `std::net` (RFC 5952 for IPv6).

use core::convert::TryFrom;
use core::fmt;

use std::net::{Ipv4Addr, Ipv6Addr};

use serde::{Serialize, Serializer};

use crate::errors::Error as CrateError;

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IPv4Address([u8; 4]);

impl IPv4Address {
    /// Build an address from a (possibly truncated) prefix, zero filling the missing octets.
    pub fn from_prefix(prefix: &[u8]) -> Self {
        let mut ip = Self::default();
        let len = prefix.len().min(4);
        ip.0[..len].copy_from_slice(&prefix[..len]);
        ip
    }

    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 4]> for IPv4Address {
    fn from(value: [u8; 4]) -> Self {
        Self(value)
    }
}

impl TryFrom<&'_ [u8]> for IPv4Address {
    type Error = CrateError;

    fn try_from(slice: &'_ [u8]) -> Result<Self, Self::Error> {
        if slice.len() != 4 {
            Err(CrateError::ParseError(format!(
                "IPv4Address: {}",
                hex::encode(slice)
            )))
        } else {
            Ok(Self::from_prefix(slice))
        }
    }
}

impl fmt::Display for IPv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Ipv4Addr::from(self.0), f)
    }
}

impl fmt::Debug for IPv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for IPv4Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[derive(Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IPv6Address([u8; 16]);

impl IPv6Address {
    /// Build an address from a (possibly truncated) prefix, zero filling the missing octets.
    pub fn from_prefix(prefix: &[u8]) -> Self {
        let mut ip = Self::default();
        let len = prefix.len().min(16);
        ip.0[..len].copy_from_slice(&prefix[..len]);
        ip
    }

    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 16]> for IPv6Address {
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

impl TryFrom<&'_ [u8]> for IPv6Address {
    type Error = CrateError;

    fn try_from(slice: &'_ [u8]) -> Result<Self, Self::Error> {
        if slice.len() != 16 {
            Err(CrateError::ParseError(format!(
                "IPv6Address: {}",
                hex::encode(slice)
            )))
        } else {
            Ok(Self::from_prefix(slice))
        }
    }
}

impl TryFrom<&'_ [u16]> for IPv6Address {
    type Error = CrateError;

    fn try_from(slice: &'_ [u16]) -> Result<Self, Self::Error> {
        if slice.len() != 8 {
            Err(CrateError::ParseError(format!(
                "IPv6Address: {} segments",
                slice.len()
            )))
        } else {
            let mut ip = IPv6Address::default();
            for (i, segment) in slice.iter().enumerate() {
                ip.0[2 * i..2 * i + 2].copy_from_slice(&segment.to_be_bytes());
            }
            Ok(ip)
        }
    }
}

impl fmt::Display for IPv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Ipv6Addr::from(self.0), f)
    }
}

impl fmt::Debug for IPv6Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for IPv6Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {

    use core::convert::TryInto;

    use super::*;

    #[test]
    fn ipv6_addr_tests() {
        let test_cases = [
            "fe80::1",
            "::",
            "::1",
            "64:ff9b::",
            "2a03:2880:f12f:183:face:b00c:0:25de",
            "1:0:1:0:1:0:1:0",
            "2404:6800:4003:c04::1b",
        ];

        for input in test_cases {
            let ipv6: Result<IPv6Address, _> =
                input.parse::<Ipv6Addr>().unwrap().segments()[..].try_into();
            assert!(ipv6.is_ok(), "{}", input);
            assert_eq!(input, format!("{}", ipv6.unwrap()));
        }
    }

    #[test]
    fn prefixes_are_zero_filled() {
        assert_eq!(
            IPv6Address::from_prefix(&[0x20, 0x01, 0x0d, 0xb8]).to_string(),
            "2001:db8::"
        );
        assert_eq!(IPv4Address::from_prefix(&[192, 168]).to_string(), "192.168.0.0");
    }

    #[test]
    fn wrong_length_fails() {
        let ipv4: Result<IPv4Address, _> = [1_u8, 2, 3][..].try_into();
        assert_eq!(
            ipv4,
            Err(CrateError::ParseError("IPv4Address: 010203".to_string()))
        );
        let ipv6: Result<IPv6Address, _> = [0_u8; 4][..].try_into();
        assert!(ipv6.is_err());
    }
}
