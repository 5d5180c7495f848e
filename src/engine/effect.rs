use crate::MemberId;

/// A side effect requested by an engine transition, executed by the manager.
#[derive(Clone, Debug)]
#[derive(PartialEq, Eq)]
pub(crate) enum Effect {
    /// Start replicating log entries to a member that is catching up but
    /// not yet voting.
    AddReplicationMember(MemberId),

    /// Stop the extra replication to a member.
    RemoveReplicationMember(MemberId),

    /// Propose the current voting set plus `member` to the group.
    ProposeAdd(MemberId),

    /// Propose the current voting set minus `member` to the group.
    ProposeRemove(MemberId),
}
