//! Lancet Layers
//!
//! The transport glue (Ethernet, IPv4, IPv6, UDP, TCP, SCTP) carries a captured frame to the
//! message dissectors (DNS, ICMPv6, LWRES, F1AP, NRPPa).

pub mod dns;
pub mod ethernet;
pub mod f1ap;
pub mod icmpv6;
pub mod ipv4;
pub mod ipv6;
pub mod lwres;
pub mod nrppa;
pub mod sctp;
pub mod tcp;
pub mod udp;

include!(concat!(env!("OUT_DIR"), "/register_defaults.rs"));
