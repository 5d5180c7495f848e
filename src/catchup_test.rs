use std::time::Duration;
use std::time::Instant;

use crate::CatchupTracker;
use crate::MembershipConfig;

fn config() -> MembershipConfig {
    MembershipConfig {
        catchup_timeout: Duration::from_secs(60),
        catchup_round_timeout: Duration::from_secs(5),
        max_catchup_rounds: 3,
        ..Default::default()
    }
}

#[test]
fn test_goal_achieved_within_first_round() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut tracker = CatchupTracker::new(10, t0, &config());

    tracker.update(t0 + Duration::from_secs(2), Some(10), 12);

    assert!(tracker.is_finished());
    assert!(tracker.goal_achieved());
    Ok(())
}

#[test]
fn test_member_that_never_advances_fails_on_overall_timeout() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut tracker = CatchupTracker::new(10, t0, &config());

    // Match index stuck at 3, log never advances, round timeout long gone.
    tracker.update(t0 + Duration::from_secs(30), Some(3), 10);
    assert!(!tracker.is_finished(), "still within the overall budget");

    tracker.update(t0 + Duration::from_secs(61), Some(3), 10);
    assert!(tracker.is_finished());
    assert!(!tracker.goal_achieved());
    Ok(())
}

#[test]
fn test_no_progress_report_at_all_fails_on_overall_timeout() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut tracker = CatchupTracker::new(10, t0, &config());

    tracker.update(t0 + Duration::from_secs(61), None, 10);

    assert!(tracker.is_finished());
    assert!(!tracker.goal_achieved());
    Ok(())
}

#[test]
fn test_slow_target_reach_starts_new_round_against_moving_log() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut tracker = CatchupTracker::new(10, t0, &config());

    // Target reached, but 6s > 5s round timeout: new round, target moves to
    // the log's current append index.
    tracker.update(t0 + Duration::from_secs(6), Some(10), 25);
    assert!(!tracker.is_finished());
    assert_eq!(25, tracker.target_index());
    assert_eq!(2, tracker.round_count());

    // This round the member closes the gap in time.
    tracker.update(t0 + Duration::from_secs(8), Some(25), 30);
    assert!(tracker.is_finished());
    assert!(tracker.goal_achieved());
    Ok(())
}

#[test]
fn test_rounds_exhausted_finishes_without_achievement() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut tracker = CatchupTracker::new(10, t0, &config());

    // Each update reaches the round's target too slowly; 3 rounds allowed.
    tracker.update(t0 + Duration::from_secs(6), Some(10), 20);
    assert_eq!(2, tracker.round_count());

    tracker.update(t0 + Duration::from_secs(12), Some(20), 30);
    assert_eq!(3, tracker.round_count());

    tracker.update(t0 + Duration::from_secs(18), Some(30), 40);
    assert!(tracker.is_finished());
    assert!(!tracker.goal_achieved());
    Ok(())
}

#[test]
fn test_updates_after_finish_are_ignored() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let mut tracker = CatchupTracker::new(10, t0, &config());

    tracker.update(t0 + Duration::from_secs(1), Some(10), 10);
    assert!(tracker.is_finished());
    assert!(tracker.goal_achieved());

    tracker.update(t0 + Duration::from_secs(120), None, 10);
    assert!(tracker.goal_achieved(), "finished tracker never flips its verdict");
    Ok(())
}
