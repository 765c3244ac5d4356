//! Link Layer Address Types
//!
//! [`MACAddress`] is a 48 bit IEEE address as an array of `[u8; 6]`, [`EUI64Address`] the 64 bit
//! form used by 6LoWPAN registrations and the DNS `EUI64` record.

use core::convert::TryFrom;
use core::fmt;

use serde::{Serialize, Serializer};

use crate::errors::Error as CrateError;

#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct MACAddress([u8; 6]);

impl MACAddress {
    /// Returns a slice containing the entire inner array.
    pub const fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for MACAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl From<[u8; 6]> for MACAddress {
    fn from(value: [u8; 6]) -> Self {
        Self(value)
    }
}

impl TryFrom<&'_ [u8]> for MACAddress {
    type Error = CrateError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        if slice.len() != 6 {
            Err(CrateError::ParseError(format!(
                "MacAddress: {}",
                hex::encode(slice)
            )))
        } else {
            let mut m = MACAddress::default();
            m.0.copy_from_slice(slice);
            Ok(m)
        }
    }
}

impl fmt::Display for MACAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl fmt::Debug for MACAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct EUI64Address([u8; 8]);

impl From<[u8; 8]> for EUI64Address {
    fn from(value: [u8; 8]) -> Self {
        Self(value)
    }
}

impl fmt::Display for EUI64Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|b| format!("{:02x}", b)).collect();
        write!(f, "{}", parts.join(":"))
    }
}

impl fmt::Debug for EUI64Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for EUI64Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error as CrateError;
    use core::convert::TryInto;

    #[test]
    fn byte_array_too_small_fail() {
        let mac_address: Result<MACAddress, _> = [00u8, 01u8, 02u8][..].try_into();
        assert_eq!(
            mac_address.err(),
            Some(CrateError::ParseError("MacAddress: 000102".to_string()))
        );
    }

    #[test]
    fn display_forms() {
        let mac: MACAddress = [0x00, 0x50, 0x56, 0x8a, 0x0f, 0xe9].into();
        assert_eq!(mac.to_string(), "00:50:56:8a:0f:e9");

        let eui: EUI64Address = [0x02, 0x00, 0x5e, 0x10, 0x00, 0x00, 0x00, 0x01].into();
        assert_eq!(eui.to_string(), "02:00:5e:10:00:00:00:01");
    }
}
