//! Request/response correlation
//!
//! Layers that carry a transaction identifier (DNS, ICMPv6 echo) report it through
//! [`Layer::transaction`][`crate::layer::Layer::transaction`]. A [`TransactionTracker`] indexes
//! the frames in which each side of a transaction was seen. Every direction of a key is recorded
//! at most once; later sightings (retransmissions, re-processing a capture) do not overwrite it.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionProtocol {
    Dns,
    Icmpv6Echo,
}

/// Composite key of a transaction.
///
/// `discriminator` disambiguates identical identifiers, e.g. the DNS flavour (unicast, mDNS,
/// LLMNR) or the ICMPv6 echo sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransactionKey {
    pub protocol: TransactionProtocol,
    pub id: u32,
    pub discriminator: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Request,
    Response,
}

/// Frames in which the request and the response of a transaction were seen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub request_frame: Option<u64>,
    pub response_frame: Option<u64>,
}

#[derive(Debug, Default)]
pub struct TransactionTracker {
    table: RwLock<HashMap<TransactionKey, Transaction>>,
}

impl TransactionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `direction` of `key` was seen in `frame` and return what is known about the
    /// transaction afterwards.
    pub fn observe(&self, key: TransactionKey, direction: Direction, frame: u64) -> Transaction {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        let entry = table.entry(key).or_default();
        let slot = match direction {
            Direction::Request => &mut entry.request_frame,
            Direction::Response => &mut entry.response_frame,
        };
        if slot.is_none() {
            *slot = Some(frame);
        }

        *entry
    }

    pub fn lookup(&self, key: &TransactionKey) -> Option<Transaction> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.get(key).copied()
    }

    /// The request and response frames of `key`, if both are known and the request came first.
    ///
    /// A response that was indexed before any request for it does not match.
    pub fn matched(&self, key: &TransactionKey) -> Option<(u64, u64)> {
        match self.lookup(key)? {
            Transaction {
                request_frame: Some(request),
                response_frame: Some(response),
            } if request <= response => Some((request, response)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn dns_key(id: u32) -> TransactionKey {
        TransactionKey {
            protocol: TransactionProtocol::Dns,
            id,
            discriminator: 0,
        }
    }

    #[test]
    fn request_then_response() {
        let tracker = TransactionTracker::new();
        let key = dns_key(0x1234);

        let t = tracker.observe(key, Direction::Request, 1);
        assert_eq!(t.request_frame, Some(1));
        assert_eq!(t.response_frame, None);
        assert_eq!(tracker.matched(&key), None);

        tracker.observe(key, Direction::Response, 3);
        assert_eq!(tracker.matched(&key), Some((1, 3)));
    }

    #[test]
    fn directions_are_written_once() {
        let tracker = TransactionTracker::new();
        let key = dns_key(7);

        tracker.observe(key, Direction::Request, 10);
        tracker.observe(key, Direction::Request, 12);
        tracker.observe(key, Direction::Response, 11);
        tracker.observe(key, Direction::Response, 13);

        assert_eq!(
            tracker.lookup(&key),
            Some(Transaction {
                request_frame: Some(10),
                response_frame: Some(11),
            })
        );
    }

    #[test]
    fn response_before_request_does_not_match() {
        let tracker = TransactionTracker::new();
        let key = dns_key(9);

        tracker.observe(key, Direction::Response, 2);
        assert_eq!(tracker.matched(&key), None);

        // Re-processing out of order: the request shows up later in the capture.
        tracker.observe(key, Direction::Request, 5);
        assert_eq!(tracker.matched(&key), None);
        assert_eq!(tracker.matched(&dns_key(10)), None);
    }

    #[test]
    fn keys_are_distinct_per_protocol() {
        let tracker = TransactionTracker::new();
        let echo = TransactionKey {
            protocol: TransactionProtocol::Icmpv6Echo,
            id: 9,
            discriminator: 0,
        };

        tracker.observe(dns_key(9), Direction::Request, 1);
        tracker.observe(echo, Direction::Response, 2);
        assert_eq!(tracker.len(), 2);
        assert_eq!(tracker.matched(&echo), None);
    }

    #[test]
    fn shared_between_threads() {
        let tracker = Arc::new(TransactionTracker::new());
        let handles: Vec<_> = (0..4_u32)
            .map(|i| {
                let tracker = Arc::clone(&tracker);
                thread::spawn(move || {
                    tracker.observe(dns_key(i), Direction::Request, i as u64);
                    tracker.observe(dns_key(i), Direction::Response, i as u64 + 100);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tracker.len(), 4);
        assert_eq!(tracker.matched(&dns_key(2)), Some((2, 102)));
    }
}
