use std::time::Duration;
use std::time::Instant;

use crate::MembershipConfig;

/// Bounded-round catch-up progress for one joining member.
///
/// The goal is to observe the member's match index reach the leader's append
/// index *quickly enough*, i.e. within one round timeout. Because the leader
/// keeps appending, the target moves: when a round's target is reached too
/// slowly, a new round starts against the log's current append index. The
/// member gets at most `max_catchup_rounds` rounds, and the whole attempt is
/// bounded by `catchup_timeout`.
///
/// Time is threaded through every call so the tracker never reads a clock
/// itself.
#[derive(Clone, Debug)]
pub struct CatchupTracker {
    target_index: u64,
    start: Instant,
    round_start: Instant,
    round_count: usize,
    max_rounds: usize,
    round_timeout: Duration,
    catchup_timeout: Duration,
    finished: bool,
    achieved: bool,
}

impl CatchupTracker {
    /// Start tracking against the log's current append index.
    pub fn new(append_index: u64, now: Instant, config: &MembershipConfig) -> Self {
        Self {
            target_index: append_index,
            start: now,
            round_start: now,
            round_count: 1,
            max_rounds: config.max_catchup_rounds,
            round_timeout: config.catchup_round_timeout,
            catchup_timeout: config.catchup_timeout,
            finished: false,
            achieved: false,
        }
    }

    /// Feed the member's latest match index. `append_index` is the log's
    /// current append index, used as the next target if a new round starts.
    pub fn update(&mut self, now: Instant, match_index: Option<u64>, append_index: u64) {
        if self.finished {
            return;
        }

        let reached_target = match_index >= Some(self.target_index);

        if reached_target && now.duration_since(self.round_start) <= self.round_timeout {
            tracing::info!(
                target = self.target_index,
                round = self.round_count,
                "catch-up goal achieved"
            );
            self.achieved = true;
            self.finished = true;
        } else if now.duration_since(self.start) > self.catchup_timeout {
            tracing::info!(
                target = self.target_index,
                round = self.round_count,
                "catch-up timed out"
            );
            self.finished = true;
        } else if reached_target {
            // Reached the target, but too slowly for this round to count.
            if self.round_count < self.max_rounds {
                self.round_count += 1;
                self.round_start = now;
                self.target_index = append_index;
                tracing::debug!(
                    target = self.target_index,
                    round = self.round_count,
                    "starting new catch-up round"
                );
            } else {
                tracing::info!(
                    rounds = self.round_count,
                    "catch-up rounds exhausted"
                );
                self.finished = true;
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn goal_achieved(&self) -> bool {
        self.achieved
    }

    pub fn target_index(&self) -> u64 {
        self.target_index
    }

    pub fn round_count(&self) -> usize {
        self.round_count
    }
}
