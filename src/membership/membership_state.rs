use std::collections::BTreeSet;
use std::error::Error;
use std::fmt;

use validit::Validate;

use crate::MemberId;
use crate::MembershipEntry;

/// The membership configs a raft node needs to keep durable.
///
/// At most two entries exist at any time:
/// - `committed` has been acknowledged by a majority of the voting set;
/// - `appended` is in the log but not yet known to be committed.
///
/// Raft allows proposing a new membership only when the previous one is
/// committed, so there is never more than one outstanding entry. The state
/// walks a 4-state cycle:
///
/// ```text
/// (∅,∅) → (∅,appended) → (committed,∅)|(committed,appended) → (committed,∅) → ...
/// ```
///
/// `ordinal` increases on every mutating transition. It is a persistence
/// version only: storage uses it to order snapshots of this record, it plays
/// no part in membership semantics.
#[derive(Clone, Debug, Default)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MembershipState {
    committed: Option<MembershipEntry>,
    appended: Option<MembershipEntry>,
    ordinal: u64,
}

impl MembershipState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a state record from its persisted parts.
    pub fn restore(
        committed: Option<MembershipEntry>,
        appended: Option<MembershipEntry>,
        ordinal: u64,
    ) -> Self {
        Self {
            committed,
            appended,
            ordinal,
        }
    }

    /// Record a membership-change command appended to the log.
    ///
    /// Returns `false` without mutating if `log_index` is at or below either
    /// watermark. That is the expected outcome when replaying the log during
    /// recovery, not an error.
    ///
    /// If an appended entry already exists, it is promoted to committed
    /// first: raft never appends a second membership change before the first
    /// is committed, so a second append implies the earlier commit
    /// notification was not observed.
    pub fn append(&mut self, log_index: u64, members: BTreeSet<MemberId>) -> bool {
        if let Some(appended) = &self.appended {
            if log_index <= appended.log_index() {
                tracing::debug!(
                    log_index,
                    appended = appended.log_index(),
                    "ignoring stale membership append"
                );
                return false;
            }
        }
        if let Some(committed) = &self.committed {
            if log_index <= committed.log_index() {
                tracing::debug!(
                    log_index,
                    committed = committed.log_index(),
                    "ignoring stale membership append"
                );
                return false;
            }
        }

        if let Some(appended) = self.appended.take() {
            if let Some(committed) = &self.committed {
                if appended.log_index() <= committed.log_index() {
                    // The promotion below would move the state backwards.
                    // Upstream raft guarantees this cannot happen; if it
                    // does, membership state is silently corrupt.
                    tracing::warn!(
                        appended = appended.log_index(),
                        committed = committed.log_index(),
                        "appended membership entry is behind the committed one; \
                         upstream append-implies-commit assumption violated"
                    );
                    debug_assert!(
                        appended.log_index() > committed.log_index(),
                        "appended membership entry must be ahead of the committed one"
                    );
                }
            }
            self.committed = Some(appended);
        }

        self.appended = Some(MembershipEntry::new(log_index, members));
        self.ordinal += 1;
        true
    }

    /// Drop the appended entry if the log is truncated from `from_index` on.
    ///
    /// Returns `false` if there was nothing to drop.
    ///
    /// # Panics
    ///
    /// Panics if `from_index` reaches back into the committed entry. A
    /// committed entry conflicting with the leader is a raft safety
    /// violation upstream, and continuing would corrupt membership state.
    pub fn truncate(&mut self, from_index: u64) -> bool {
        if let Some(committed) = &self.committed {
            if from_index <= committed.log_index() {
                panic!(
                    "truncating log from index {} would remove the committed membership entry at {}",
                    from_index,
                    committed.log_index()
                );
            }
        }

        match &self.appended {
            Some(appended) if from_index <= appended.log_index() => {
                tracing::info!(
                    from_index,
                    appended = appended.log_index(),
                    "truncating uncommitted membership entry"
                );
                self.appended = None;
                self.ordinal += 1;
                true
            }
            _ => false,
        }
    }

    /// Promote the appended entry to committed once the group's commit index
    /// has reached it. Returns `true` if a promotion happened.
    pub fn commit(&mut self, commit_index: u64) -> bool {
        match self.appended.take() {
            Some(appended) if commit_index >= appended.log_index() => {
                tracing::info!(commit_index, entry = %appended, "membership entry committed");
                self.committed = Some(appended);
                self.ordinal += 1;
                true
            }
            other => {
                self.appended = other;
                false
            }
        }
    }

    /// The member set currently in effect: the appended one if present, else
    /// the committed one, else empty.
    pub fn latest_members(&self) -> BTreeSet<MemberId> {
        self.appended
            .as_ref()
            .or(self.committed.as_ref())
            .map(|e| e.members().clone())
            .unwrap_or_default()
    }

    /// True while a membership change is in the log but not yet committed.
    pub fn uncommitted_change_in_progress(&self) -> bool {
        self.appended.is_some()
    }

    pub fn committed(&self) -> Option<&MembershipEntry> {
        self.committed.as_ref()
    }

    pub fn appended(&self) -> Option<&MembershipEntry> {
        self.appended.as_ref()
    }

    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }
}

impl fmt::Display for MembershipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ordinal:{}, committed:", self.ordinal)?;
        match &self.committed {
            Some(c) => write!(f, "{}", c)?,
            None => write!(f, "None")?,
        }
        write!(f, ", appended:")?;
        match &self.appended {
            Some(a) => write!(f, "{}", a)?,
            None => write!(f, "None")?,
        }
        write!(f, "}}")
    }
}

impl Validate for MembershipState {
    fn validate(&self) -> Result<(), Box<dyn Error>> {
        if let (Some(committed), Some(appended)) = (&self.committed, &self.appended) {
            validit::less!(committed.log_index(), appended.log_index());
        }
        Ok(())
    }
}
