//! Orchestration of durable state, the change engine, and the published
//! member sets.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::time::Instant;

use tokio::sync::watch;
use validit::Valid;

use crate::engine::Effect;
use crate::engine::Event;
use crate::engine::MembershipEngine;
use crate::error::ConfigError;
use crate::error::StorageError;
use crate::log::LogCommand;
use crate::log::RaftLog;
use crate::progress::FollowerStates;
use crate::proposer::MembershipProposer;
use crate::storage::MembershipStorage;
use crate::MemberId;
use crate::MembershipConfig;
use crate::MembershipState;
use crate::Role;


/// The externally published, derived member sets.
///
/// `replication` is always a superset of `voting`: it adds the members that
/// receive log entries while catching up but do not vote yet.
#[derive(Clone, Debug, Default)]
#[derive(PartialEq, Eq)]
pub struct MembershipSets {
    pub voting: BTreeSet<MemberId>,
    pub replication: BTreeSet<MemberId>,
}

struct Inner {
    state: Valid<MembershipState>,
    engine: MembershipEngine,
    target: Option<BTreeSet<MemberId>>,

    /// Members receiving log entries on top of the voting set.
    additional_replication: BTreeSet<MemberId>,
}

/// Coordinates membership changes for one raft group.
///
/// All mutating calls serialize on an internal lock; reads of the published
/// sets go through a watch channel and never contend with writers. The
/// watch channel is also the change-notification mechanism: subscribe to it
/// to observe every republication.
pub struct MembershipManager<L, P, S>
where
    L: RaftLog,
    P: MembershipProposer,
    S: MembershipStorage,
{
    config: MembershipConfig,
    log: L,
    proposer: P,
    storage: S,

    inner: Mutex<Inner>,
    sets_tx: watch::Sender<MembershipSets>,
    sets_rx: watch::Receiver<MembershipSets>,
}

impl<L, P, S> MembershipManager<L, P, S>
where
    L: RaftLog,
    P: MembershipProposer,
    S: MembershipStorage,
{
    pub fn new(
        config: MembershipConfig,
        log: L,
        proposer: P,
        storage: S,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let (sets_tx, sets_rx) = watch::channel(MembershipSets::default());

        Ok(Self {
            inner: Mutex::new(Inner {
                state: Valid::new(MembershipState::new()),
                engine: MembershipEngine::new(config.clone()),
                target: None,
                additional_replication: BTreeSet::new(),
            }),
            config,
            log,
            proposer,
            storage,
            sets_tx,
            sets_rx,
        })
    }

    /// Load the persisted membership state and replay the log from
    /// `from_index` to its current end.
    ///
    /// Replay goes through the same append path used live, so entries
    /// already reflected in the persisted record are rejected harmlessly
    /// and recovery can be repeated.
    #[tracing::instrument(level = "debug", skip_all, fields(from_index = from_index))]
    pub fn recover(&self, from_index: u64) -> Result<(), StorageError> {
        let mut inner = self.lock_inner();

        if let Some(persisted) = self.storage.load()? {
            tracing::info!(state = %persisted, "loaded persisted membership state");
            *inner.state = persisted;
        }

        let before = inner.state.ordinal();
        for record in self.log.entries_from(from_index)? {
            if let Some(members) = record.members {
                inner.state.append(record.index, members);
            }
        }

        if inner.state.ordinal() != before {
            self.storage.save(&inner.state)?;
        }
        self.publish(&inner);
        Ok(())
    }

    /// Replace the desired membership set supplied by topology management.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn set_target_membership(&self, target: BTreeSet<MemberId>) {
        let mut inner = self.lock_inner();
        tracing::info!(members = %display_set(&target), "new target membership set");

        inner.target = Some(target.clone());
        let effects = inner.engine.handle(Event::TargetChanged { target });
        self.apply_effects(&mut inner, effects);

        self.check_start_condition(&mut inner);
        self.publish(&inner);
    }

    /// Report a raft role change for this node.
    #[tracing::instrument(level = "debug", skip_all, fields(role = %role))]
    pub fn on_role_changed(&self, role: Role) {
        let mut inner = self.lock_inner();

        let pending_change = inner.state.uncommitted_change_in_progress();
        let effects = inner.engine.handle(Event::RoleChanged {
            role,
            pending_change,
        });
        self.apply_effects(&mut inner, effects);

        self.check_start_condition(&mut inner);
        self.publish(&inner);
    }

    /// Feed fresh follower replication progress into the change machinery.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn on_follower_progress<F>(&self, states: &F)
    where F: FollowerStates + ?Sized {
        let mut inner = self.lock_inner();

        let Some(member) = inner.engine.catching_up() else {
            return;
        };

        let effects = inner.engine.handle(Event::FollowerProgress {
            match_index: states.match_index(&member),
            append_index: self.log.append_index(),
            now: Instant::now(),
        });
        self.apply_effects(&mut inner, effects);

        self.check_start_condition(&mut inner);
        self.publish(&inner);
    }

    /// Dispatch log commands from the replication engine, then apply the
    /// new commit index.
    #[tracing::instrument(level = "debug", skip_all, fields(commit_index = commit_index))]
    pub fn process_log_commands(
        &self,
        commit_index: u64,
        commands: &[LogCommand],
    ) -> Result<(), StorageError> {
        let mut inner = self.lock_inner();
        let before = inner.state.ordinal();

        for command in commands {
            match command {
                LogCommand::Append {
                    base_index,
                    payloads,
                } => {
                    for (i, payload) in payloads.iter().enumerate() {
                        if let Some(members) = payload {
                            inner.state.append(base_index + i as u64, members.clone());
                        }
                    }
                }
                LogCommand::Truncate { from_index } => {
                    inner.state.truncate(*from_index);
                }
                LogCommand::Prune { .. } => {}
            }
        }

        if inner.state.commit(commit_index) {
            let effects = inner.engine.handle(Event::GroupCommitted);
            self.apply_effects(&mut inner, effects);
            self.check_start_condition(&mut inner);
        }

        if inner.state.ordinal() != before {
            self.storage.save(&inner.state)?;
        }
        self.publish(&inner);
        Ok(())
    }

    /// The current voting member set.
    pub fn voting_members(&self) -> BTreeSet<MemberId> {
        self.sets_rx.borrow().voting.clone()
    }

    /// The current replication member set: voters plus members catching up.
    pub fn replication_members(&self) -> BTreeSet<MemberId> {
        self.sets_rx.borrow().replication.clone()
    }

    /// Subscribe to member-set republications. The receiver observes every
    /// change at least once; readers never block writers.
    pub fn subscribe(&self) -> watch::Receiver<MembershipSets> {
        self.sets_rx.clone()
    }

    /// True while a membership change is appended but not yet committed.
    pub fn uncommitted_change_in_progress(&self) -> bool {
        self.lock_inner().state.uncommitted_change_in_progress()
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fire the next change if one is warranted: a missing member first,
    /// else a superfluous one, guarded by the minimum group size.
    fn check_start_condition(&self, inner: &mut MutexGuard<'_, Inner>) {
        if !inner.engine.is_idle() {
            return;
        }
        let Some(target) = inner.target.clone() else {
            return;
        };

        let voting = inner.state.latest_members();

        if let Some(missing) = target.difference(&voting).next().copied() {
            let effects = inner.engine.handle(Event::MissingMember {
                member: missing,
                append_index: self.log.append_index(),
                now: Instant::now(),
            });
            self.apply_effects(inner, effects);
            return;
        }

        if let Some(superfluous) = voting.difference(&target).next().copied() {
            if voting.len() <= self.config.minimum_consensus_group_size {
                tracing::info!(
                    member = %superfluous,
                    group_size = voting.len(),
                    minimum = self.config.minimum_consensus_group_size,
                    "not removing member: voting set is at the minimum consensus group size"
                );
                return;
            }

            let effects = inner.engine.handle(Event::SuperfluousMember {
                member: superfluous,
            });
            self.apply_effects(inner, effects);
        }
    }

    fn apply_effects(&self, inner: &mut MutexGuard<'_, Inner>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::AddReplicationMember(member) => {
                    inner.additional_replication.insert(member);
                }
                Effect::RemoveReplicationMember(member) => {
                    inner.additional_replication.remove(&member);
                }
                Effect::ProposeAdd(member) => {
                    let mut members = inner.state.latest_members();
                    members.insert(member);
                    self.propose(members);
                }
                Effect::ProposeRemove(member) => {
                    let mut members = inner.state.latest_members();
                    members.remove(&member);
                    self.propose(members);
                }
            }
        }
    }

    fn propose(&self, members: BTreeSet<MemberId>) {
        tracing::info!(members = %display_set(&members), "proposing new voting member set");

        if let Err(e) = self.proposer.propose(&members) {
            // The consensus state stays in place; a role change or the
            // committed entry of a retried proposal resolves it.
            tracing::warn!(error = %e, "failed to submit membership proposal");
        }
    }

    fn publish(&self, inner: &MutexGuard<'_, Inner>) {
        let voting = inner.state.latest_members();
        let mut replication = voting.clone();
        replication.extend(inner.additional_replication.iter().copied());

        self.sets_tx.send_if_modified(|current| {
            if current.voting == voting && current.replication == replication {
                return false;
            }
            *current = MembershipSets {
                voting,
                replication,
            };
            true
        });
    }
}

fn display_set(members: &BTreeSet<MemberId>) -> String {
    let items: Vec<String> = members.iter().map(|m| m.to_string()).collect();
    format!("[{}]", items.join(","))
}
