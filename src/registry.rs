//! Dissector tables
//!
//! Each layer picks its payload's dissector by looking up some field of its own header (an
//! EtherType, a port, an SCTP payload protocol identifier...) in a [`DissectorTable`]. All the
//! tables live in a [`Registry`], which is populated once by
//! [`register_defaults`][`crate::layers::register_defaults`] (and any additional registrations an
//! application wants to make) and afterwards is only read. The registry is handed to every
//! [`Layer::decode_bytes`] call, so any number of packets may be decoded concurrently against the
//! same registry.

use core::fmt::{Debug, Display};
use core::hash::Hash;

use std::collections::HashMap;

use crate::errors::Error;
use crate::layer::Layer;
use crate::types::{EncapType, EtherType, LayerCreatorFn};

/// A map from a key to the creator function of the dissector for that key.
#[derive(Debug)]
pub struct DissectorTable<K> {
    name: &'static str,
    map: HashMap<K, LayerCreatorFn>,
}

impl<K> DissectorTable<K>
where
    K: Eq + Hash + Copy + Display,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            map: HashMap::new(),
        }
    }

    /// Register `creator` for `key`. A key can only be registered once.
    pub fn register(&mut self, key: K, creator: LayerCreatorFn) -> Result<(), Error> {
        if self.map.contains_key(&key) {
            return Err(Error::RegisterError(format!("{}: {}", self.name, key)));
        }
        self.map.insert(key, creator);

        Ok(())
    }

    pub fn get(&self, key: K) -> Option<LayerCreatorFn> {
        self.map.get(&key).copied()
    }

    /// Create a fresh dissector for `key` if one is registered.
    pub fn create(&self, key: K) -> Option<Box<dyn Layer + Send>> {
        self.get(key).map(|creator| creator())
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// All dissector tables used while decoding a packet.
#[derive(Debug)]
pub struct Registry {
    pub encap_types: DissectorTable<EncapType>,
    pub ethertypes: DissectorTable<EtherType>,
    pub ipv4_protocols: DissectorTable<u8>,
    pub ipv6_next_headers: DissectorTable<u8>,
    pub udp_ports: DissectorTable<u16>,
    pub tcp_ports: DissectorTable<u16>,
    pub sctp_ppids: DissectorTable<u32>,
    pub sctp_ports: DissectorTable<u16>,
    /// Dissectors reachable by name only, for sub-fields that embed another protocol.
    pub named: DissectorTable<&'static str>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// An empty registry. Nothing gets dissected past the first layer until dissectors are
    /// registered.
    pub fn new() -> Self {
        Self {
            encap_types: DissectorTable::new("encap_type"),
            ethertypes: DissectorTable::new("ether_type"),
            ipv4_protocols: DissectorTable::new("ip.proto"),
            ipv6_next_headers: DissectorTable::new("ipv6.nxt"),
            udp_ports: DissectorTable::new("udp.port"),
            tcp_ports: DissectorTable::new("tcp.port"),
            sctp_ppids: DissectorTable::new("sctp.ppi"),
            sctp_ports: DissectorTable::new("sctp.port"),
            named: DissectorTable::new("name"),
        }
    }

    /// A registry with all the dissectors of this crate registered.
    pub fn with_defaults() -> Result<Self, Error> {
        let mut registry = Self::new();
        crate::layers::register_defaults(&mut registry)?;

        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::dns::DNS;

    #[test]
    fn duplicate_registration_fails() {
        let mut table = DissectorTable::<u16>::new("udp.port");

        assert!(table.register(53, DNS::creator).is_ok());
        assert_eq!(
            table.register(53, DNS::creator),
            Err(Error::RegisterError("udp.port: 53".to_string()))
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn defaults_are_registered() {
        let registry = Registry::with_defaults().unwrap();

        assert_eq!(registry.udp_ports.create(53).unwrap().short_name(), "dns");
        assert_eq!(registry.udp_ports.create(921).unwrap().short_name(), "lwres");
        assert_eq!(
            registry.ipv6_next_headers.create(58).unwrap().short_name(),
            "icmpv6"
        );
        assert_eq!(registry.sctp_ppids.create(62).unwrap().short_name(), "f1ap");
        assert_eq!(registry.named.create("nrppa").unwrap().short_name(), "nrppa");
        assert!(registry.udp_ports.get(9).is_none());
    }
}
