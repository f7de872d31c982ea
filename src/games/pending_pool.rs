use crate::common::types::{Address, RequestId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Randomness request waiting for its callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub request_id: RequestId,
    /// Caller whose guess this request resolves
    pub player: Address,
    /// Guess as submitted; the callback never sees a newer one
    pub guess: u64,
    /// Range in force when the request was issued
    pub guess_range: u64,
    pub requested_at_block: u64,
}

/// Table correlating request ids with the callers who triggered them
#[derive(Debug, Default)]
pub struct PendingRequests {
    pending: HashMap<RequestId, PendingRequest>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self {
            pending: HashMap::new(),
        }
    }

    /// Returns false if the id was already pending; the existing entry is kept
    pub fn add_pending(&mut self, request: PendingRequest) -> bool {
        if self.pending.contains_key(&request.request_id) {
            return false;
        }
        self.pending.insert(request.request_id, request);
        true
    }

    /// Remove and return the entry, consuming the association
    pub fn take(&mut self, request_id: RequestId) -> Option<PendingRequest> {
        self.pending.remove(&request_id)
    }

    pub fn get(&self, request_id: RequestId) -> Option<&PendingRequest> {
        self.pending.get(&request_id)
    }

    pub fn is_pending(&self, request_id: RequestId) -> bool {
        self.pending.contains_key(&request_id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Lowest outstanding id. The engine keeps at most one.
    pub fn outstanding(&self) -> Option<RequestId> {
        self.pending.keys().min().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(id: u64) -> PendingRequest {
        PendingRequest {
            request_id: RequestId(id),
            player: Address::repeat_byte(0x05),
            guess: 45,
            guess_range: 256,
            requested_at_block: 1,
        }
    }

    #[test]
    fn test_pending_pool() {
        let mut pool = PendingRequests::new();
        assert!(pool.add_pending(request(1)));
        assert_eq!(pool.pending_count(), 1);
        assert!(pool.is_pending(RequestId(1)));
        assert_eq!(pool.outstanding(), Some(RequestId(1)));

        let taken = pool.take(RequestId(1)).expect("Should take request");
        assert_eq!(taken.guess, 45);
        assert_eq!(pool.pending_count(), 0);
        assert_eq!(pool.outstanding(), None);
    }

    #[test]
    fn test_take_is_single_use() {
        let mut pool = PendingRequests::new();
        pool.add_pending(request(3));
        assert!(pool.take(RequestId(3)).is_some());
        assert!(pool.take(RequestId(3)).is_none());
    }

    #[test]
    fn test_duplicate_id_keeps_original() {
        let mut pool = PendingRequests::new();
        pool.add_pending(request(2));

        let mut other = request(2);
        other.guess = 7;
        assert!(!pool.add_pending(other));
        assert_eq!(pool.get(RequestId(2)).map(|r| r.guess), Some(45));
    }
}
