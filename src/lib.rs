//! Lancet: dissectors for DNS, ICMPv6, LWRES, F1AP and NRPPa messages.
//!
//! A Basic unit in lancet is a [`Packet`], a struct representing a Packet captured (and
//! dissected) from the wire.
//!
//! A packet is a collection of [`Layer`]s. Each `Layer` is a struct implementing the `Layer`
//! trait. Which layer follows which is decided by the dissector tables of a [`Registry`], built
//! once and then shared by every decode:
//!
//! ```rust
//! let registry = lancet::Registry::with_defaults().unwrap();
//!
//! let bytes = hex::decode(concat!(
//!     "002219b67e22000f35bb0b4008004500",
//!     "003989c4000038112f3d6dc2a0045fd3",
//!     "5c0ee1a600350025a597",
//!     "123401000001000000000000076578616d706c6503636f6d0000010001",
//! ))
//! .unwrap();
//!
//! let packet = lancet::Packet::from_bytes(&registry, &bytes, lancet::ENCAP_TYPE_ETH).unwrap();
//! assert_eq!(packet.layers[3].short_name(), "dns");
//! ```

#[macro_use]
mod cfg_macros;

pub mod cursor;

pub mod errors;
pub use errors::{Error, Note};

pub mod layer;
pub use layer::Layer;

pub mod layers;

pub mod packet;
pub use packet::Packet;

pub mod per;

pub mod registry;
pub use registry::Registry;

pub mod transactions;

pub mod types;
pub use types::{EncapType, ENCAP_TYPE_ETH};

use std::sync::OnceLock;

static DEFAULT_REGISTRY: OnceLock<Result<Registry, Error>> = OnceLock::new();

/// The registry with all of this crate's dissectors, built on first use.
pub fn default_registry() -> Result<&'static Registry, Error> {
    DEFAULT_REGISTRY
        .get_or_init(Registry::with_defaults)
        .as_ref()
        .map_err(Clone::clone)
}

/// Dissect a hex encoded packet and render it as JSON.
pub fn dissect_hex(encap: EncapType, packet: &str) -> Result<String, Error> {
    let registry = default_registry()?;
    let bytes = hex::decode(packet.trim())
        .map_err(|e| Error::ParseError(format!("hex input: {}", e)))?;

    let packet = Packet::from_bytes(registry, &bytes, encap)?;
    serde_json::to_string(&packet).map_err(|e| Error::ParseError(format!("json output: {}", e)))
}

cfg_wasm! {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    pub fn dissect_packet(encap_type: EncapType, packet: String) -> Result<String, JsValue> {
        dissect_hex(encap_type, &packet).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

cfg_python! {
    use pyo3::prelude::*;

    /// Dissect a hex encoded Ethernet frame and return it as JSON.
    #[pyfunction]
    #[pyo3(name = "dissect_packet")]
    fn py_dissect_packet(packet: String) -> PyResult<String> {
        dissect_hex(ENCAP_TYPE_ETH, &packet)
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    #[pymodule]
    fn lancet(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(py_dissect_packet, m)?)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    wasm_tests! {
        #[test]
        fn dissect_hex_renders_json() {
            let json = dissect_hex(
                ENCAP_TYPE_ETH,
                concat!(
                    "002219b67e22000f35bb0b4008004500",
                    "003989c4000038112f3d6dc2a0045fd3",
                    "5c0ee1a600350025a597",
                    "123401000001000000000000076578616d706c6503636f6d0000010001",
                ),
            )
            .unwrap();

            let value: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(
                value["layers"]["dns"]["questions"][0]["name"],
                serde_json::json!("example.com")
            );
        }

        #[test]
        fn dissect_hex_rejects_bad_hex() {
            assert!(matches!(
                dissect_hex(ENCAP_TYPE_ETH, "0x12"),
                Err(Error::ParseError(_))
            ));
        }
    }
}
