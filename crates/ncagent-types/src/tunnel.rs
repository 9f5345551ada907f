//! Overlay tunnel identifier (VNI).

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A 24-bit overlay tunnel identifier.
///
/// Zero is reserved and never assigned to a subnet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TunnelId(u32);

impl TunnelId {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 16_777_215;

    pub fn new(id: u32) -> Result<Self, ParseError> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(TunnelId(id))
        } else {
            Err(ParseError::InvalidTunnelId(id))
        }
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TunnelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<u32> for TunnelId {
    type Error = ParseError;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        TunnelId::new(id)
    }
}

impl From<TunnelId> for u32 {
    fn from(id: TunnelId) -> u32 {
        id.0
    }
}
