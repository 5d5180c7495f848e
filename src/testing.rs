//! In-memory test doubles for wiring the membership machinery without a
//! raft replication engine behind it.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Mutex;

use anyerror::AnyError;

use crate::error::ProposeError;
use crate::error::StorageError;
use crate::log::LogRecord;
use crate::log::RaftLog;
use crate::membership::codec;
use crate::progress::FollowerStates;
use crate::proposer::MembershipProposer;
use crate::storage::MembershipStorage;
use crate::waiter::Health;
use crate::waiter::RaftStateSnapshot;
use crate::waiter::RaftStateView;
use crate::MemberId;
use crate::MembershipState;

/// A small member id for tests.
pub fn mid(n: u64) -> MemberId {
    MemberId::new(0, n)
}

/// An in-memory raft log exposing just what membership consumes.
#[derive(Default)]
pub struct MemLog {
    append_index: AtomicU64,
    records: Mutex<Vec<LogRecord>>,
}

impl MemLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_append_index(&self, index: u64) {
        self.append_index.store(index, Ordering::Relaxed);
    }

    /// Add a record to be served during recovery replay.
    pub fn push_record(&self, index: u64, members: Option<BTreeSet<MemberId>>) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.push(LogRecord { index, members });
        let end = self.append_index.load(Ordering::Relaxed).max(index);
        self.append_index.store(end, Ordering::Relaxed);
    }
}

impl RaftLog for MemLog {
    fn append_index(&self) -> u64 {
        self.append_index.load(Ordering::Relaxed)
    }

    fn entries_from(&self, from_index: u64) -> Result<Vec<LogRecord>, StorageError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.iter().filter(|r| r.index >= from_index).cloned().collect())
    }
}

/// Records every proposed voting set instead of replicating it.
#[derive(Default)]
pub struct RecordingProposer {
    proposed: Mutex<Vec<BTreeSet<MemberId>>>,
}

impl RecordingProposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn proposed(&self) -> Vec<BTreeSet<MemberId>> {
        self.proposed.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl MembershipProposer for RecordingProposer {
    fn propose(&self, members: &BTreeSet<MemberId>) -> Result<(), ProposeError> {
        let mut proposed = self.proposed.lock().unwrap_or_else(|e| e.into_inner());
        proposed.push(members.clone());
        Ok(())
    }
}

/// Keeps the persisted record in memory, going through the binary codec the
/// way a file-backed implementation would.
#[derive(Default)]
pub struct MemStorage {
    saved: Mutex<Option<Vec<u8>>>,
    save_count: AtomicU64,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_count(&self) -> u64 {
        self.save_count.load(Ordering::Relaxed)
    }
}

impl MembershipStorage for MemStorage {
    fn save(&self, state: &MembershipState) -> Result<(), StorageError> {
        let buf = codec::encode_state(state)?;
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(buf);
        self.save_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn load(&self) -> Result<Option<MembershipState>, StorageError> {
        let saved = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        saved.as_deref().map(codec::decode_state).transpose()
    }
}

/// A fixed match-index table.
#[derive(Default)]
pub struct StaticFollowerStates {
    match_indexes: BTreeMap<MemberId, u64>,
}

impl StaticFollowerStates {
    pub fn new(match_indexes: impl IntoIterator<Item = (MemberId, u64)>) -> Self {
        Self {
            match_indexes: match_indexes.into_iter().collect(),
        }
    }
}

impl FollowerStates for StaticFollowerStates {
    fn match_index(&self, member: &MemberId) -> Option<u64> {
        self.match_indexes.get(member).copied()
    }
}

/// A health signal with a fixed verdict.
pub struct StaticHealth {
    cause: Option<String>,
}

impl StaticHealth {
    pub fn healthy() -> Self {
        Self { cause: None }
    }

    pub fn unhealthy(cause: impl ToString) -> Self {
        Self {
            cause: Some(cause.to_string()),
        }
    }
}

impl Health for StaticHealth {
    fn check(&self) -> Result<(), AnyError> {
        match &self.cause {
            None => Ok(()),
            Some(cause) => Err(AnyError::error(cause)),
        }
    }
}

/// Serves a scripted sequence of raft state snapshots, repeating the last
/// one once the script runs out.
pub struct ScriptedView {
    snapshots: Mutex<Vec<RaftStateSnapshot>>,
}

impl ScriptedView {
    pub fn new(snapshots: Vec<RaftStateSnapshot>) -> Self {
        assert!(!snapshots.is_empty());
        Self {
            snapshots: Mutex::new(snapshots),
        }
    }
}

impl RaftStateView for ScriptedView {
    fn snapshot(&self) -> RaftStateSnapshot {
        let mut snapshots = self.snapshots.lock().unwrap_or_else(|e| e.into_inner());
        if snapshots.len() > 1 {
            snapshots.remove(0)
        } else {
            snapshots[0].clone()
        }
    }
}
