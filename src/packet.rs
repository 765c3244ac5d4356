//! Packet Structure

use core::fmt::Debug;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::errors::Error;
use crate::layer::Layer;
use crate::registry::Registry;
use crate::transactions::{Transaction, TransactionTracker};
use crate::types::EncapType;

/// Layers produced by decoding a byte slice one layer after another.
#[derive(Debug, Default)]
pub struct DecodedChain {
    /// Successfully decoded layers, outermost first.
    pub layers: Vec<Box<dyn Layer + Send>>,
    /// Bytes consumed by `layers`.
    pub consumed: usize,
    /// Why decoding stopped early, if it did. The layer that failed is not in `layers`.
    pub error: Option<Error>,
}

/// Decode `bytes` starting with `first`, following whatever next layer each layer selects.
///
/// An error in any layer stops the chain; the layers decoded before it are kept.
pub fn decode_chain(
    registry: &Registry,
    first: Box<dyn Layer + Send>,
    bytes: &[u8],
) -> DecodedChain {
    let mut chain = DecodedChain::default();
    let mut layer = first;

    loop {
        match layer.decode_bytes(registry, &bytes[chain.consumed..]) {
            Ok((next, consumed)) => {
                chain.consumed = (chain.consumed + consumed).min(bytes.len());
                chain.layers.push(layer);
                match next {
                    Some(next) if chain.consumed < bytes.len() => layer = next,
                    _ => break,
                }
            }
            Err(e) => {
                log_debug!("{}: {}", layer.name(), e);
                chain.error = Some(e);
                break;
            }
        }
    }

    chain
}

/// Serialize layers as a map from the layer's short name to the layer.
#[allow(clippy::ptr_arg)]
pub(crate) fn serialize_layers<S>(
    layers: &Vec<Box<dyn Layer + Send>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(layers.len()))?;
    for layer in layers {
        map.serialize_entry(layer.short_name(), layer)?;
    }
    map.end()
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct PacketMetadata {
    /// Position of the packet in its capture, used to correlate transactions.
    pub frame: u64,
    pub len: usize,
}

/// A dissected packet.
#[derive(Debug, Default)]
pub struct Packet {
    pub meta: PacketMetadata,
    pub layers: Vec<Box<dyn Layer + Send>>,
    /// Trailing bytes no layer claimed, including those of a layer that failed to decode.
    pub unprocessed: Vec<u8>,
    /// The error that stopped decoding, if any.
    pub error: Option<Error>,
}

impl Packet {
    /// Create a Packet from a u8 buffer.
    ///
    /// This is the main API function. The first layer is picked by `encap` from the `registry`;
    /// an unknown `encap` leaves all the bytes unprocessed. If the first layer itself can not be
    /// decoded an error is returned, any later layer failing is recorded in
    /// [`error`][`Packet::error`] and the layers before it are kept.
    pub fn from_bytes(registry: &Registry, bytes: &[u8], encap: EncapType) -> Result<Self, Error> {
        let mut p = Packet {
            meta: PacketMetadata {
                frame: 0,
                len: bytes.len(),
            },
            ..Default::default()
        };

        let first = match registry.encap_types.create(encap) {
            Some(first) => first,
            None => {
                p.unprocessed = bytes.into();
                return Ok(p);
            }
        };

        let chain = decode_chain(registry, first, bytes);
        if chain.layers.is_empty() {
            if let Some(e) = chain.error {
                return Err(e);
            }
        }

        p.layers = chain.layers;
        p.error = chain.error;
        p.unprocessed = bytes[chain.consumed..].into();

        Ok(p)
    }

    pub fn with_frame(mut self, frame: u64) -> Self {
        self.meta.frame = frame;
        self
    }

    /// Record the transactions of this packet's layers in `tracker`.
    pub fn track_transactions(&self, tracker: &TransactionTracker) -> Vec<Transaction> {
        self.layers
            .iter()
            .filter_map(|layer| layer.transaction())
            .map(|(key, direction)| tracker.observe(key, direction, self.meta.frame))
            .collect()
    }
}

impl Serialize for Packet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        struct Layers<'a>(&'a Vec<Box<dyn Layer + Send>>);

        impl Serialize for Layers<'_> {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serialize_layers(self.0, serializer)
            }
        }

        let mut state = serializer.serialize_struct("Packet", 4)?;
        state.serialize_field("meta", &self.meta)?;
        state.serialize_field("layers", &Layers(&self.layers))?;
        if !self.unprocessed.is_empty() {
            state.serialize_field("unprocessed", &hex::encode(&self.unprocessed))?;
        }
        if let Some(ref e) = self.error {
            state.serialize_field("error", &e.to_string())?;
        }
        state.end()
    }
}
