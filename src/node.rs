use std::fmt;

/// A cluster member's unique identifier.
///
/// Member ids are opaque 128 bit values, compared by value. On the wire a
/// member id is laid out as two big-endian 8-byte halves.
#[derive(Clone, Copy, Debug, Default)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemberId(u128);

impl MemberId {
    /// Build a member id from its two 8-byte halves.
    pub fn new(high: u64, low: u64) -> Self {
        Self(((high as u128) << 64) | low as u128)
    }

    /// The most significant 8 bytes.
    pub fn high(&self) -> u64 {
        (self.0 >> 64) as u64
    }

    /// The least significant 8 bytes.
    pub fn low(&self) -> u64 {
        self.0 as u64
    }
}

impl From<u128> for MemberId {
    fn from(v: u128) -> Self {
        Self(v)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.0;
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:04x}-{:012x}",
            (b >> 96) as u32,
            (b >> 80) as u16,
            (b >> 64) as u16,
            (b >> 48) as u16,
            b & 0xffff_ffff_ffff
        )
    }
}
