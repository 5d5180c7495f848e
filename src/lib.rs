#![doc = include_str!("../README.md")]
#![deny(unused_qualifications)]

mod catchup;
mod config;
mod entry;
mod log;
mod manager;
mod node;
mod progress;
mod proposer;
mod role;
mod storage;
mod waiter;

pub mod error;
pub mod membership;
pub mod testing;

pub(crate) mod engine;

#[cfg(test)] mod catchup_test;
#[cfg(test)] mod waiter_test;

pub use anyerror;
pub use anyerror::AnyError;

pub use crate::catchup::CatchupTracker;
pub use crate::config::MembershipConfig;
pub use crate::entry::MembershipEntry;
pub use crate::error::ConfigError;
pub use crate::error::JoinError;
pub use crate::error::ProposeError;
pub use crate::error::StorageError;
pub use crate::log::LogCommand;
pub use crate::log::LogRecord;
pub use crate::log::RaftLog;
pub use crate::manager::MembershipManager;
pub use crate::manager::MembershipSets;
pub use crate::membership::MembershipState;
pub use crate::node::MemberId;
pub use crate::progress::FollowerStates;
pub use crate::proposer::MembershipProposer;
pub use crate::role::Role;
pub use crate::storage::MembershipStorage;
pub use crate::waiter::Health;
pub use crate::waiter::MembershipWaiter;
pub use crate::waiter::RaftStateSnapshot;
pub use crate::waiter::RaftStateView;
