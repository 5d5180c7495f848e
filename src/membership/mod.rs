//! The durable membership state pair and its on-disk codec.

pub mod codec;
mod membership_state;

#[cfg(test)] mod codec_test;

pub use membership_state::MembershipState;
