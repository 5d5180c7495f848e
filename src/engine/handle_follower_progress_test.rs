use std::time::Duration;
use std::time::Instant;

use crate::engine::Effect;
use crate::engine::Event;
use crate::engine::MembershipEngine;
use crate::testing::mid;
use crate::MembershipConfig;
use crate::Role;

fn config() -> MembershipConfig {
    MembershipConfig {
        catchup_timeout: Duration::from_secs(60),
        catchup_round_timeout: Duration::from_secs(5),
        max_catchup_rounds: 2,
        ..Default::default()
    }
}

fn catching_up_eng(now: Instant) -> MembershipEngine {
    let mut eng = MembershipEngine::new(config());
    eng.handle(Event::RoleChanged {
        role: Role::Leader,
        pending_change: false,
    });
    eng.handle(Event::MissingMember {
        member: mid(7),
        append_index: 10,
        now,
    });
    eng
}

#[test]
fn test_goal_achieved_proposes_the_member_and_defers_removal() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut eng = catching_up_eng(t0);

    let effects = eng.handle(Event::FollowerProgress {
        match_index: Some(10),
        append_index: 12,
        now: t0 + Duration::from_secs(1),
    });

    assert_eq!(vec![Effect::ProposeAdd(mid(7))], effects);
    assert_eq!(None, eng.catching_up());

    // The member keeps its extra replication until the commit; only the
    // consensus exit removes it.
    let effects = eng.handle(Event::GroupCommitted);
    assert_eq!(vec![Effect::RemoveReplicationMember(mid(7))], effects);
    assert!(eng.is_idle());
    Ok(())
}

#[test]
fn test_catch_up_failure_returns_to_idle_and_drops_the_member() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut eng = catching_up_eng(t0);

    let effects = eng.handle(Event::FollowerProgress {
        match_index: Some(2),
        append_index: 10,
        now: t0 + Duration::from_secs(61),
    });

    assert_eq!(vec![Effect::RemoveReplicationMember(mid(7))], effects);
    assert!(eng.is_idle());
    Ok(())
}

#[test]
fn test_unfinished_progress_keeps_catching_up() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut eng = catching_up_eng(t0);

    let effects = eng.handle(Event::FollowerProgress {
        match_index: Some(2),
        append_index: 10,
        now: t0 + Duration::from_secs(1),
    });

    assert_eq!(Vec::<Effect>::new(), effects);
    assert_eq!(Some(mid(7)), eng.catching_up());
    Ok(())
}

#[test]
fn test_progress_is_ignored_outside_catching_up() -> anyhow::Result<()> {
    let mut eng = MembershipEngine::new(config());
    eng.handle(Event::RoleChanged {
        role: Role::Leader,
        pending_change: false,
    });

    let effects = eng.handle(Event::FollowerProgress {
        match_index: Some(10),
        append_index: 10,
        now: Instant::now(),
    });

    assert_eq!(Vec::<Effect>::new(), effects);
    assert!(eng.is_idle());
    Ok(())
}
