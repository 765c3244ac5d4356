//! 'Layer' trait
//!
//! [`Layer`] trait is central to [`lancet`][`crate`]. All the dissectors for individual protocols
//! implement the `Layer` trait. Each Layer will implement a `decode_bytes` function that will return
//! the result of parsing the given byte slice.

use core::fmt::Debug;

use erased_serde::serialize_trait_object;

use crate::errors::Error;
use crate::registry::Registry;
use crate::transactions::{Direction, TransactionKey};

/// `Layer` Trait defines a 'Layer' in a Packet
///
/// Typically a Layer will correspond to Data Link Layer, Network Layer, Transport Layer or the
/// Application Layer. Each of the supported 'protocols' have implementation for this trait.
pub trait Layer: Send + Debug + erased_serde::Serialize {
    /// Main 'decoder' function.
    ///
    /// The return value is a Tuple `(Option<Box<dyn Layer + Send>>, usize)` on success. This
    /// indicates the next layer to decode (if any) and the number of bytes consumed by this
    /// layer. The next layer is looked up in the `registry` by whatever field of the current
    /// layer selects it (a port, a protocol number...). A return value of `None` indicates, we do
    /// not know how to decode further, but this is not an error.
    ///
    /// An `Err` means the message this layer represents is malformed and decoding of it stops.
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error>;

    /// Name for the given layer.
    fn name(&self) -> &'static str;

    /// Short name for the given layer.
    fn short_name(&self) -> &'static str;

    /// Request/response correlation key, for layers that carry one.
    fn transaction(&self) -> Option<(TransactionKey, Direction)> {
        None
    }
}

serialize_trait_object!(Layer);
