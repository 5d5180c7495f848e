use std::collections::BTreeSet;
use std::fmt;

use crate::MemberId;

/// A membership config recorded in the raft log: the set of voting members
/// effective from `log_index` on.
///
/// Entries are immutable once created; the log index identifies the
/// membership-change command that produced the entry.
#[derive(Clone, Debug, Default)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MembershipEntry {
    log_index: u64,
    members: BTreeSet<MemberId>,
}

impl MembershipEntry {
    pub fn new(log_index: u64, members: BTreeSet<MemberId>) -> Self {
        Self { log_index, members }
    }

    pub fn log_index(&self) -> u64 {
        self.log_index
    }

    pub fn members(&self) -> &BTreeSet<MemberId> {
        &self.members
    }
}

impl fmt::Display for MembershipEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{log_index:{}, members:[", self.log_index)?;
        for (i, m) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", m)?;
        }
        write!(f, "]}}")
    }
}
