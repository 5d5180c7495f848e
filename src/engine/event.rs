use std::collections::BTreeSet;
use std::time::Instant;

use crate::MemberId;
use crate::Role;

/// An input to the membership engine.
///
/// Events carry every fact a transition needs (current time, the log's
/// append index, the target set) so the engine itself stays free of
/// collaborators.
#[derive(Clone, Debug)]
pub(crate) enum Event {
    /// This node's raft role changed. `pending_change` reports whether an
    /// uncommitted membership change is already in the log, in which case a
    /// fresh leader resumes waiting for its commit.
    RoleChanged { role: Role, pending_change: bool },

    /// The desired membership set was replaced.
    TargetChanged { target: BTreeSet<MemberId> },

    /// `member` is in the target set but not yet voting.
    MissingMember {
        member: MemberId,
        append_index: u64,
        now: Instant,
    },

    /// `member` is voting but no longer in the target set.
    SuperfluousMember { member: MemberId },

    /// Fresh replication progress for the member currently catching up.
    FollowerProgress {
        match_index: Option<u64>,
        append_index: u64,
        now: Instant,
    },

    /// The proposed membership entry was committed by the group.
    GroupCommitted,
}
