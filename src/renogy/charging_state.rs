use crate::prelude::*;

use num_enum::{FromPrimitive, IntoPrimitive};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::fmt;
use std::str::FromStr;

/// Controller operating mode, register 0x120 low byte.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Hash,
    FromPrimitive,
    IntoPrimitive,
    SerializeDisplay,
    DeserializeFromStr,
)]
#[repr(u8)]
pub enum ChargingState {
    Deactivated = 0,
    Activated = 1,
    Mppt = 2,
    Equalizing = 3,
    Boost = 4,
    Floating = 5,
    CurrentLimiting = 6, // over power
    /// A code the controller documentation doesn't define. Kept so the byte
    /// can be written back unchanged.
    #[num_enum(catch_all)]
    Unrecognized(u8),
}

impl ChargingState {
    pub const KNOWN: [ChargingState; 7] = [
        ChargingState::Deactivated,
        ChargingState::Activated,
        ChargingState::Mppt,
        ChargingState::Equalizing,
        ChargingState::Boost,
        ChargingState::Floating,
        ChargingState::CurrentLimiting,
    ];

    pub fn code(self) -> u8 {
        self.into()
    }

    pub fn label(self) -> &'static str {
        match self {
            ChargingState::Deactivated => "charging deactivated",
            ChargingState::Activated => "charging activated",
            ChargingState::Mppt => "mppt charging mode",
            ChargingState::Equalizing => "equalizing charging mode",
            ChargingState::Boost => "boost charging mode",
            ChargingState::Floating => "floating charging mode",
            ChargingState::CurrentLimiting => "current limiting overpower",
            ChargingState::Unrecognized(_) => "unknown",
        }
    }

    pub fn is_recognized(self) -> bool {
        !matches!(self, ChargingState::Unrecognized(_))
    }
}

impl Default for ChargingState {
    fn default() -> Self {
        ChargingState::Deactivated
    }
}

impl fmt::Display for ChargingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChargingState {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::KNOWN
            .into_iter()
            .find(|state| state.label() == s)
            .ok_or_else(|| CodecError::ChargingStateName(s.to_string()))
    }
}
