//! Error types exposed by this crate.

use std::fmt;
use std::time::Duration;

use anyerror::AnyError;

/// An invalid configuration value, reported by
/// [`MembershipConfig::validate`](crate::MembershipConfig::validate).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("minimum consensus group size must be at least 1, got {got}")]
    MinGroupSizeTooSmall { got: usize },

    #[error("at least one catch-up round is required, got {got}")]
    NoCatchupRounds { got: usize },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },
}

/// What storage subject an error is about.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorSubject {
    /// The durable membership state record.
    State,

    /// The raft log consumed during recovery replay.
    Log,
}

impl fmt::Display for ErrorSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSubject::State => write!(f, "membership-state"),
            ErrorSubject::Log => write!(f, "raft-log"),
        }
    }
}

/// What it was doing when the error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ErrorVerb {
    Read,
    Write,
}

impl fmt::Display for ErrorVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorVerb::Read => write!(f, "read"),
            ErrorVerb::Write => write!(f, "write"),
        }
    }
}

/// A failure to read or write membership state, or to read the raft log
/// during recovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("when {verb} {subject}: {source}")]
pub struct StorageError {
    pub subject: ErrorSubject,
    pub verb: ErrorVerb,
    pub source: AnyError,
}

impl StorageError {
    pub fn new(subject: ErrorSubject, verb: ErrorVerb, source: impl Into<AnyError>) -> Self {
        Self {
            subject,
            verb,
            source: source.into(),
        }
    }

    pub fn read_state(source: impl Into<AnyError>) -> Self {
        Self::new(ErrorSubject::State, ErrorVerb::Read, source)
    }

    pub fn write_state(source: impl Into<AnyError>) -> Self {
        Self::new(ErrorSubject::State, ErrorVerb::Write, source)
    }

    pub fn read_log(source: impl Into<AnyError>) -> Self {
        Self::new(ErrorSubject::Log, ErrorVerb::Read, source)
    }
}

/// A failure to submit a proposed voting set to the replication engine.
///
/// Non-fatal: the change stays pending until the raft group either commits
/// it or the leader steps down, which resets the change machinery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProposeError {
    #[error("this node is no longer the leader")]
    NotLeader,

    #[error("failed to submit membership change: {source}")]
    Submit { source: AnyError },
}

/// Why a joining node's wait for full membership failed.
///
/// Any of these is fatal to the joining node's startup sequence.
#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("timeout after {0:?} when {1}")]
    Timeout(Duration, String),

    #[error("node became unhealthy while waiting to join: {source}")]
    Unhealthy { source: AnyError },
}
