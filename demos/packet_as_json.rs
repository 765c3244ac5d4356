//! A simple example demonstrating how to dump a packet as a Json
//!

fn main() {
    let registry = lancet::Registry::with_defaults().unwrap();

    // DNS response with a compressed owner name.
    let dns_packet = hex::decode(concat!(
        "000f35bb0b40002219b67e2208004500",
        "004989c4000038112f3d5fd35c0e6dc2",
        "a0040035e1a600350000",
        "123481800001000100000000",
        "076578616d706c6503636f6d0000010001",
        "c00c000100010000012c00045db8d822",
    ))
    .unwrap();
    let p = lancet::Packet::from_bytes(&registry, &dns_packet, lancet::ENCAP_TYPE_ETH);

    println!("{}", serde_json::to_string_pretty(&p.unwrap()).unwrap());
}
