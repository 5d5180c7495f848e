use std::fmt;
use std::mem;

use crate::engine::Effect;
use crate::engine::Event;
use crate::CatchupTracker;
use crate::MemberId;
use crate::MembershipConfig;

/// The membership engine's current state.
///
/// The topology enforces the one-change-at-a-time rule structurally: no
/// state offers a transition that starts a second change while one is in
/// flight.
#[derive(Clone, Debug)]
pub(crate) enum EngineState {
    /// Not the leader; membership changes are not driven from this node.
    Inactive,

    /// Leader with no change in flight, watching for a reason to start one.
    Idle,

    /// Replicating to `member` while it catches up, before proposing it as
    /// a voter.
    CatchingUp {
        member: MemberId,
        tracker: CatchupTracker,
    },

    /// A proposed voting set is in the log, waiting for the group to commit
    /// it. `awaiting` is the member admitted by this change, if any; it
    /// keeps receiving extra replication until the commit lands.
    ConsensusInProgress { awaiting: Option<MemberId> },
}

impl EngineState {
    fn name(&self) -> &'static str {
        match self {
            EngineState::Inactive => "Inactive",
            EngineState::Idle => "Idle",
            EngineState::CatchingUp { .. } => "CatchingUp",
            EngineState::ConsensusInProgress { .. } => "ConsensusInProgress",
        }
    }
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event-driven controller deciding when to propose membership changes.
///
/// `handle` is a total function: every (state, event) pair is covered, and
/// pairs with no transition are no-ops returning no effects.
pub(crate) struct MembershipEngine {
    state: EngineState,
    config: MembershipConfig,
}

impl MembershipEngine {
    pub(crate) fn new(config: MembershipConfig) -> Self {
        Self {
            state: EngineState::Inactive,
            config,
        }
    }

    pub(crate) fn is_idle(&self) -> bool {
        matches!(self.state, EngineState::Idle)
    }

    /// The member currently catching up, if any.
    pub(crate) fn catching_up(&self) -> Option<MemberId> {
        match &self.state {
            EngineState::CatchingUp { member, .. } => Some(*member),
            _ => None,
        }
    }

    /// Apply one event, returning the effects the manager must execute.
    pub(crate) fn handle(&mut self, event: Event) -> Vec<Effect> {
        let state = mem::replace(&mut self.state, EngineState::Inactive);
        let from = state.name();

        let (next, effects) = Self::transition(&self.config, state, event);

        if next.name() != from {
            tracing::debug!("membership engine: moving from {} to {}", from, next.name());
        }
        self.state = next;
        effects
    }

    fn transition(
        config: &MembershipConfig,
        state: EngineState,
        event: Event,
    ) -> (EngineState, Vec<Effect>) {
        match (state, event) {
            // --- role changes ---
            (EngineState::Inactive, Event::RoleChanged { role, pending_change }) => {
                if !role.is_leader() {
                    return (EngineState::Inactive, vec![]);
                }
                if pending_change {
                    tracing::info!(
                        "became leader with an uncommitted membership change in the log; \
                         waiting for it to commit"
                    );
                    (EngineState::ConsensusInProgress { awaiting: None }, vec![])
                } else {
                    (EngineState::Idle, vec![])
                }
            }
            (EngineState::Idle, Event::RoleChanged { role, .. }) => {
                if role.is_leader() {
                    (EngineState::Idle, vec![])
                } else {
                    (EngineState::Inactive, vec![])
                }
            }
            (EngineState::CatchingUp { member, tracker }, Event::RoleChanged { role, .. }) => {
                if role.is_leader() {
                    (EngineState::CatchingUp { member, tracker }, vec![])
                } else {
                    (
                        EngineState::Inactive,
                        vec![Effect::RemoveReplicationMember(member)],
                    )
                }
            }
            (EngineState::ConsensusInProgress { awaiting }, Event::RoleChanged { role, .. }) => {
                if role.is_leader() {
                    (EngineState::ConsensusInProgress { awaiting }, vec![])
                } else {
                    let effects =
                        awaiting.map(Effect::RemoveReplicationMember).into_iter().collect();
                    (EngineState::Inactive, effects)
                }
            }

            // --- starting a change, only from Idle ---
            (EngineState::Idle, Event::MissingMember { member, append_index, now }) => {
                tracing::info!(member = %member, "member is missing from the voting set; catching it up");
                (
                    EngineState::CatchingUp {
                        member,
                        tracker: CatchupTracker::new(append_index, now, config),
                    },
                    vec![Effect::AddReplicationMember(member)],
                )
            }
            (EngineState::Idle, Event::SuperfluousMember { member }) => {
                tracing::info!(member = %member, "member is no longer targeted; proposing its removal");
                (
                    EngineState::ConsensusInProgress { awaiting: None },
                    vec![Effect::ProposeRemove(member)],
                )
            }

            // --- catching up ---
            (
                EngineState::CatchingUp { member, mut tracker },
                Event::FollowerProgress { match_index, append_index, now },
            ) => {
                tracker.update(now, match_index, append_index);

                if !tracker.is_finished() {
                    return (EngineState::CatchingUp { member, tracker }, vec![]);
                }

                if tracker.goal_achieved() {
                    // Keep replicating to the member until the new voting
                    // set is committed; removal is deferred to the
                    // ConsensusInProgress exit.
                    (
                        EngineState::ConsensusInProgress {
                            awaiting: Some(member),
                        },
                        vec![Effect::ProposeAdd(member)],
                    )
                } else {
                    tracing::info!(member = %member, "member failed to catch up; abandoning the join");
                    (
                        EngineState::Idle,
                        vec![Effect::RemoveReplicationMember(member)],
                    )
                }
            }
            (EngineState::CatchingUp { member, tracker }, Event::TargetChanged { target }) => {
                if target.contains(&member) {
                    (EngineState::CatchingUp { member, tracker }, vec![])
                } else {
                    tracing::info!(member = %member, "member left the target set while catching up");
                    (
                        EngineState::Idle,
                        vec![Effect::RemoveReplicationMember(member)],
                    )
                }
            }

            // --- consensus completion ---
            (EngineState::ConsensusInProgress { awaiting }, Event::GroupCommitted) => {
                let effects = awaiting.map(Effect::RemoveReplicationMember).into_iter().collect();
                (EngineState::Idle, effects)
            }

            // everything else is a no-op
            (state, _) => (state, vec![]),
        }
    }
}
