use std::sync::Arc;

use crate::MemberId;

/// Per-member replication progress, refreshed by the replication engine and
/// consumed read-only.
pub trait FollowerStates {
    /// The index of the last log entry known to match on `member`, or
    /// `None` if no progress has been observed yet.
    fn match_index(&self, member: &MemberId) -> Option<u64>;
}

impl<T: FollowerStates + ?Sized> FollowerStates for Arc<T> {
    fn match_index(&self, member: &MemberId) -> Option<u64> {
        self.as_ref().match_index(member)
    }
}
