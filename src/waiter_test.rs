use std::time::Duration;

use maplit::btreeset;

use crate::error::JoinError;
use crate::testing::mid;
use crate::testing::ScriptedView;
use crate::testing::StaticHealth;
use crate::waiter::MembershipWaiter;
use crate::waiter::RaftStateSnapshot;
use crate::MembershipConfig;

fn config() -> MembershipConfig {
    MembershipConfig {
        waiter_base_delay: Duration::from_millis(100),
        waiter_max_delay: Duration::from_millis(300),
        ..Default::default()
    }
}

fn joined(n: u64) -> RaftStateSnapshot {
    RaftStateSnapshot {
        voting: btreeset! {mid(n)},
        local_commit_index: Some(9),
        leader_commit_index: Some(9),
    }
}

fn lagging(n: u64) -> RaftStateSnapshot {
    RaftStateSnapshot {
        voting: btreeset! {mid(n)},
        local_commit_index: Some(3),
        leader_commit_index: Some(9),
    }
}

fn not_voting() -> RaftStateSnapshot {
    RaftStateSnapshot {
        voting: btreeset! {mid(99)},
        local_commit_index: Some(9),
        leader_commit_index: Some(9),
    }
}

#[tokio::test(start_paused = true)]
async fn test_wait_succeeds_once_voting_and_caught_up() -> anyhow::Result<()> {
    let view = ScriptedView::new(vec![not_voting(), lagging(1), joined(1)]);
    let waiter = MembershipWaiter::new(mid(1), view, StaticHealth::healthy(), &config());

    waiter.wait_to_join_timeout(Duration::from_secs(10)).await?;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unknown_leader_commit_index_keeps_waiting() -> anyhow::Result<()> {
    let stuck = RaftStateSnapshot {
        voting: btreeset! {mid(1)},
        local_commit_index: Some(9),
        leader_commit_index: None,
    };
    let view = ScriptedView::new(vec![stuck]);
    let waiter = MembershipWaiter::new(mid(1), view, StaticHealth::healthy(), &config());

    let res = waiter.wait_to_join_timeout(Duration::from_secs(2)).await;
    assert!(matches!(res, Err(JoinError::Timeout(..))));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_fatal_and_descriptive() -> anyhow::Result<()> {
    let view = ScriptedView::new(vec![lagging(1)]);
    let waiter = MembershipWaiter::new(mid(1), view, StaticHealth::healthy(), &config());

    let res = waiter.wait_to_join_timeout(Duration::from_secs(3)).await;

    match res {
        Err(JoinError::Timeout(timeout, _)) => {
            assert_eq!(Duration::from_secs(3), timeout);
        }
        other => panic!("expected timeout, got {:?}", other),
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unhealthy_node_fails_immediately() -> anyhow::Result<()> {
    let view = ScriptedView::new(vec![joined(1)]);
    let waiter = MembershipWaiter::new(
        mid(1),
        view,
        StaticHealth::unhealthy("storage panicked"),
        &config(),
    );

    let res = waiter.wait_to_join_timeout(Duration::from_secs(10)).await;

    match res {
        Err(JoinError::Unhealthy { source }) => {
            assert!(source.to_string().contains("storage panicked"));
        }
        other => panic!("expected unhealthy, got {:?}", other),
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_poll_delay_grows_additively_to_the_cap() -> anyhow::Result<()> {
    let view = ScriptedView::new(vec![
        lagging(1),
        lagging(1),
        lagging(1),
        lagging(1),
        joined(1),
    ]);
    let waiter = MembershipWaiter::new(mid(1), view, StaticHealth::healthy(), &config());

    let start = tokio::time::Instant::now();
    waiter.wait_to_join().await?;

    // 100ms + 200ms + 300ms(cap) + 300ms(cap).
    assert_eq!(Duration::from_millis(900), start.elapsed());
    Ok(())
}
