use serde_json::json;

use lancet::transactions::{Direction, TransactionTracker};
use lancet::{Packet, Registry, ENCAP_TYPE_ETH};

fn packet(registry: &Registry, frame: &[&str]) -> Packet {
    let bytes = hex::decode(frame.concat()).unwrap();
    Packet::from_bytes(registry, &bytes, ENCAP_TYPE_ETH).unwrap()
}

#[test]
fn f1ap_over_sctp() {
    let registry = Registry::with_defaults().unwrap();

    let p = packet(
        &registry,
        &[
            "000c29a1b2c3000c29d4e5f60800",
            "4500005000010000408400000a0000010a000002",
            // SCTP, one DATA chunk with PPID 62
            "964896480000000000000000",
            "0003002f00000001000000000000003e",
            // F1SetupRequest, padded to 4 bytes
            "0001001b000003004e00020005002a0002000a002d40080280674e422d4455",
            "00",
        ],
    );
    assert!(p.error.is_none(), "{:?}", p.error);
    assert_eq!(p.layers.len(), 3);
    assert!(p.unprocessed.is_empty());

    let value = serde_json::to_value(&p).unwrap();
    let f1ap = &value["layers"]["sctp"]["chunks"][0]["payload"]["f1ap"];
    assert_eq!(f1ap["procedure_name"], json!("F1Setup"));
    assert_eq!(f1ap["ies"][2]["value"], json!({"text": "gNB-DU"}));
}

#[test]
fn icmpv6_echo_transaction() {
    let registry = Registry::with_defaults().unwrap();
    let tracker = TransactionTracker::new();

    let request = packet(
        &registry,
        &[
            "333300000001000c29a1b2c386dd",
            "6000000000103aff",
            "fe800000000000000000000000000002",
            "fe800000000000000000000000000001",
            "80000000",
            "12340001",
            "6162636465666768",
        ],
    )
    .with_frame(7);
    let response = packet(
        &registry,
        &[
            "000c29a1b2c3000c29d4e5f686dd",
            "6000000000103a40",
            "fe800000000000000000000000000001",
            "fe800000000000000000000000000002",
            "81000000",
            "12340001",
            "6162636465666768",
        ],
    )
    .with_frame(9);

    assert_eq!(request.layers[2].short_name(), "icmpv6");
    let (key, direction) = response.layers[2].transaction().unwrap();
    assert_eq!(direction, Direction::Response);

    // The response alone is not a match.
    response.track_transactions(&tracker);
    assert_eq!(tracker.matched(&key), None);

    request.track_transactions(&tracker);
    assert_eq!(tracker.matched(&key), Some((7, 9)));

    let value = serde_json::to_value(&request).unwrap();
    assert_eq!(value["layers"]["icmpv6"]["identifier"], json!(4660));
}

#[test]
fn dns_query_over_udp() {
    let registry = Registry::with_defaults().unwrap();

    let p = packet(
        &registry,
        &[
            "002219b67e22000f35bb0b4008004500",
            "003989c4000038112f3d6dc2a0045fd3",
            "5c0ee1a600350025a597",
            "123401000001000000000000076578616d706c6503636f6d0000010001",
        ],
    );
    assert_eq!(p.layers[3].short_name(), "dns");

    let value = serde_json::to_value(&p).unwrap();
    assert_eq!(value["meta"]["len"], json!(71));
    assert_eq!(
        value["layers"]["dns"]["questions"][0]["name"],
        json!("example.com")
    );
}

#[test]
fn unknown_encapsulation_is_unprocessed() {
    let json = lancet::dissect_hex(228, "deadbeef").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["unprocessed"], json!("deadbeef"));
    assert_eq!(value["layers"], json!({}));
}
