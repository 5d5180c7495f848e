//! The membership change decision core.
//!
//! [`MembershipEngine`] holds the 4-state controller and nothing else: no
//! clock, no I/O, no shared sets. Inputs arrive as [`Event`]s and every
//! decision comes back as [`Effect`]s for the manager to execute, so each
//! transition is testable in isolation.

mod effect;
mod engine_impl;
mod event;

#[cfg(test)] mod handle_follower_progress_test;

pub(crate) use effect::Effect;
pub(crate) use engine_impl::MembershipEngine;
pub(crate) use event::Event;
