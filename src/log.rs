use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::StorageError;
use crate::MemberId;

/// Read-only view of the raft log, as much of it as membership needs.
pub trait RaftLog {
    /// The current highest appended log index.
    fn append_index(&self) -> u64;

    /// All entries from `from_index` (inclusive) to the log's end, for
    /// recovery replay. Entries without a membership payload carry `None`.
    fn entries_from(&self, from_index: u64) -> Result<Vec<LogRecord>, StorageError>;
}

impl<T: RaftLog + ?Sized> RaftLog for Arc<T> {
    fn append_index(&self) -> u64 {
        self.as_ref().append_index()
    }

    fn entries_from(&self, from_index: u64) -> Result<Vec<LogRecord>, StorageError> {
        self.as_ref().entries_from(from_index)
    }
}

/// One raft log entry as seen by the membership subsystem.
#[derive(Clone, Debug)]
#[derive(PartialEq, Eq)]
pub struct LogRecord {
    pub index: u64,

    /// The proposed voting set, when the entry is a membership-change
    /// command; `None` for every other command type.
    pub members: Option<BTreeSet<MemberId>>,
}

/// A log mutation reported by the replication engine.
///
/// The membership subsystem receives every log command; only
/// membership-bearing appends and truncations move its state.
#[derive(Clone, Debug)]
#[derive(PartialEq, Eq)]
pub enum LogCommand {
    /// Entries were appended starting at `base_index`. `payloads[i]`
    /// belongs to log index `base_index + i`.
    Append {
        base_index: u64,
        payloads: Vec<Option<BTreeSet<MemberId>>>,
    },

    /// The log was truncated from `from_index` (inclusive) on.
    Truncate { from_index: u64 },

    /// Entries up to `safe_index` were pruned from the log's head. Pruning
    /// never touches membership state.
    Prune { safe_index: u64 },
}
