//! Serializers that render integers as Hex
//!
//! When displaying certain data (identifiers, flags, checksums) it's more useful to display that
//! data as Hex as opposed to normal integer display. The functions in this module are meant to be
//! used with `#[serde(serialize_with = "...")]`.

macro_rules! generate_serialize_hex_fns {
    (($fn:ident, $format:literal, $trait:path)) => {
        pub fn $fn<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: serde::Serializer,
            T: $trait,
        {
            serializer.serialize_str(format!($format, value).as_str())
        }
    };

    ($($tt:tt,)*) => {
        $(
            generate_serialize_hex_fns!($tt);
        )+
    };
}

// Generate functions that can be used to Serialize a value to Hex
generate_serialize_hex_fns! {
    (serialize_lower_hex_u8, "0x{:02x}", core::fmt::LowerHex),
    (serialize_lower_hex_u16, "0x{:04x}", core::fmt::LowerHex),
    (serialize_lower_hex_u32, "0x{:08x}", core::fmt::LowerHex),
    (serialize_lower_hex_u64, "0x{:016x}", core::fmt::LowerHex),
    (serialize_upper_hex_u16, "0x{:04X}", core::fmt::UpperHex),
}
