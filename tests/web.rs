//! Test suite for the Web and headless browsers.

#![cfg(all(target_arch = "wasm32", feature = "wasm"))]

extern crate wasm_bindgen_test;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn simple_dissect_test() {
    // ICMPv6 echo request, fe80::1 > ff02::1
    let bytestream = concat!(
        "333300000001000c29a1b2c386dd",
        "6000000000103aff",
        "fe800000000000000000000000000001",
        "ff020000000000000000000000000001",
        "80005c19",
        "12340001",
        "6162636465666768",
    );
    let encap_type = lancet::ENCAP_TYPE_ETH;

    match lancet::dissect_packet(encap_type, bytestream.to_string()) {
        Ok(result) => {
            assert!(result.contains("\"icmpv6\""), "{}", result);
        }
        Err(err) => {
            panic!("Dissect packet failed: {:?}", err);
        }
    }
}
