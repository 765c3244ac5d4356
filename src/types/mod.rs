//! All types that we are supporting

use crate::layer::Layer;

mod macaddr;
pub use macaddr::*;

mod ipaddr;
pub use ipaddr::*;

pub mod hex;

/// Creator function type
pub type LayerCreatorFn = fn() -> Box<dyn Layer + Send>;

/// Packet Encapsulation Type
///
/// This value is same as those supported by [libpcap][libpcap]
///
/// [libpcap]: https://www.tcpdump.org/
pub type EncapType = u8;

pub static ENCAP_TYPE_ETH: EncapType = 1_u8;

/// EtherType carried in an Ethernet header.
pub type EtherType = u16;

pub const ETHERTYPE_IP: EtherType = 0x0800;
pub const ETHERTYPE_IP6: EtherType = 0x86dd;
