use criterion::{criterion_group, criterion_main, Criterion};

use lancet::Packet;
use lancet::Registry;
use lancet::ENCAP_TYPE_ETH;

pub fn dns_query_from_bytes(c: &mut Criterion) {
    let registry = Registry::with_defaults().unwrap();
    let bytes = hex::decode(concat!(
        "002219b67e22000f35bb0b4008004500",
        "004489c4000038112f3d6dc2a0045fd3",
        "5c0ee1a600350030a597f61800100001",
        "0000000000010870696373",
        "6c69666502727500000100010000291000000080000000",
    ))
    .unwrap();

    c.bench_function("Parse_DNS_Query_EDNS", |b| {
        b.iter(|| Packet::from_bytes(&registry, &bytes, ENCAP_TYPE_ETH))
    });
}

pub fn dns_response_from_bytes(c: &mut Criterion) {
    let registry = Registry::with_defaults().unwrap();

    // example.com A, two answers with compressed owner names
    let bytes = hex::decode(concat!(
        "000f35bb0b40002219b67e2208004500",
        "005989c4000038112f3d5fd35c0e6dc2",
        "a0040035e1a600450000",
        "123481800001000200000000",
        "076578616d706c6503636f6d0000010001",
        "c00c000100010000012c00045db8d822",
        "c00c000100010000012c00045db8d823",
    ))
    .unwrap();

    c.bench_function("Parse_DNS_Response_Compressed", |b| {
        b.iter(|| Packet::from_bytes(&registry, &bytes, ENCAP_TYPE_ETH))
    });
}

criterion_group!(dns, dns_query_from_bytes, dns_response_from_bytes);
criterion_main!(dns);
