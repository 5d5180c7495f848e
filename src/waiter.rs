use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyerror::AnyError;

use crate::error::JoinError;
use crate::MemberId;
use crate::MembershipConfig;

/// A point-in-time view of the raft state a joining node can observe
/// locally: who votes, how far the local log has committed, and the
/// leader's last known commit index.
///
/// The leader commit index comes from periodically refreshed state
/// snapshots, not from an event stream, which is why the waiter polls.
#[derive(Clone, Debug, Default)]
#[derive(PartialEq, Eq)]
pub struct RaftStateSnapshot {
    pub voting: BTreeSet<MemberId>,
    pub local_commit_index: Option<u64>,
    pub leader_commit_index: Option<u64>,
}

/// Supplies the waiter with fresh [`RaftStateSnapshot`]s.
pub trait RaftStateView {
    fn snapshot(&self) -> RaftStateSnapshot;
}

impl<T: RaftStateView + ?Sized> RaftStateView for Arc<T> {
    fn snapshot(&self) -> RaftStateSnapshot {
        self.as_ref().snapshot()
    }
}

/// Local health signal consulted on every poll. An unhealthy verdict is
/// fatal to the wait.
pub trait Health {
    fn check(&self) -> Result<(), AnyError>;
}

impl<T: Health + ?Sized> Health for Arc<T> {
    fn check(&self) -> Result<(), AnyError> {
        self.as_ref().check()
    }
}

/// Lets a node that has just joined the group wait until it is a full,
/// caught-up voting member.
///
/// The waiter polls: the poll delay grows by one base-delay step after
/// every unsuccessful attempt, up to the configured maximum. Cancellation
/// is dropping the future.
pub struct MembershipWaiter<V, H>
where
    V: RaftStateView,
    H: Health,
{
    id: MemberId,
    view: V,
    health: H,
    base_delay: Duration,
    max_delay: Duration,
}

impl<V, H> MembershipWaiter<V, H>
where
    V: RaftStateView,
    H: Health,
{
    pub fn new(id: MemberId, view: V, health: H, config: &MembershipConfig) -> Self {
        Self {
            id,
            view,
            health,
            base_delay: config.waiter_base_delay,
            max_delay: config.waiter_max_delay,
        }
    }

    /// Wait until this node is in the voting set and its local commit index
    /// has reached the leader's, or fail fatally on an unhealthy signal.
    #[tracing::instrument(level = "debug", skip_all, fields(id = %self.id))]
    pub async fn wait_to_join(&self) -> Result<(), JoinError> {
        let mut delay = self.base_delay;

        loop {
            self.health
                .check()
                .map_err(|source| JoinError::Unhealthy { source })?;

            let snapshot = self.view.snapshot();
            if self.caught_up(&snapshot) {
                tracing::info!("node is a caught-up voting member");
                return Ok(());
            }

            tracing::debug!(
                voting = snapshot.voting.contains(&self.id),
                local = ?snapshot.local_commit_index,
                leader = ?snapshot.leader_commit_index,
                ?delay,
                "not yet a caught-up voting member"
            );

            tokio::time::sleep(delay).await;
            delay = (delay + self.base_delay).min(self.max_delay);
        }
    }

    /// Like [`wait_to_join`](Self::wait_to_join), bounded by `timeout`.
    ///
    /// The timeout is converted into a fatal [`JoinError::Timeout`]; a
    /// node's startup sequence should abort on it.
    pub async fn wait_to_join_timeout(&self, timeout: Duration) -> Result<(), JoinError> {
        match tokio::time::timeout(timeout, self.wait_to_join()).await {
            Ok(res) => res,
            Err(_) => Err(JoinError::Timeout(
                timeout,
                "waiting to become a caught-up voting member".to_string(),
            )),
        }
    }

    fn caught_up(&self, snapshot: &RaftStateSnapshot) -> bool {
        snapshot.voting.contains(&self.id)
            && snapshot.local_commit_index.is_some()
            && snapshot.local_commit_index == snapshot.leader_commit_index
    }
}
