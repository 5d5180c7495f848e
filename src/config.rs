use std::time::Duration;

use crate::error::ConfigError;

/// Runtime configuration for the membership change machinery.
///
/// The defaults are reasonable for clusters with sub-second replication
/// latency. `validate()` should be called once at startup; an invalid value
/// is a deployment error, not something to limp along with.
#[derive(Clone, Debug)]
#[derive(PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MembershipConfig {
    /// The voting set is never shrunk below this size, even when the target
    /// membership asks for it. Removing past this point risks losing the
    /// fault tolerance the group was sized for.
    pub minimum_consensus_group_size: usize,

    /// Overall budget for a joining member to catch up with the leader's
    /// log. When it elapses the join attempt is abandoned.
    pub catchup_timeout: Duration,

    /// A joining member must reach the current catch-up target within this
    /// window for the round to count as achieved.
    pub catchup_round_timeout: Duration,

    /// How many rounds of chasing a moving append index a joining member is
    /// granted before the attempt is abandoned.
    pub max_catchup_rounds: usize,

    /// Initial poll delay of the join-side waiter. Each unsuccessful poll
    /// adds this amount again, up to `waiter_max_delay`.
    pub waiter_base_delay: Duration,

    /// Upper bound for the join-side waiter's poll delay.
    pub waiter_max_delay: Duration,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            minimum_consensus_group_size: 3,
            catchup_timeout: Duration::from_secs(600),
            catchup_round_timeout: Duration::from_secs(5),
            max_catchup_rounds: 10,
            waiter_base_delay: Duration::from_secs(1),
            waiter_max_delay: Duration::from_secs(10),
        }
    }
}

impl MembershipConfig {
    /// Validate the config, returning it untouched if every value is usable.
    pub fn validate(self) -> Result<Self, ConfigError> {
        if self.minimum_consensus_group_size == 0 {
            return Err(ConfigError::MinGroupSizeTooSmall {
                got: self.minimum_consensus_group_size,
            });
        }

        if self.max_catchup_rounds == 0 {
            return Err(ConfigError::NoCatchupRounds {
                got: self.max_catchup_rounds,
            });
        }

        for (field, d) in [
            ("catchup_timeout", self.catchup_timeout),
            ("catchup_round_timeout", self.catchup_round_timeout),
            ("waiter_base_delay", self.waiter_base_delay),
            ("waiter_max_delay", self.waiter_max_delay),
        ] {
            if d.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
        }

        Ok(self)
    }
}
