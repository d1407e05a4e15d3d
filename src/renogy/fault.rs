use crate::prelude::*;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// The lowest fault bit; everything below is unused by the controller.
pub const FIRST_FAULT_BIT: u8 = 16;

/// One active controller fault. The discriminant is the fault's bit index in
/// the 32-bit fault register pair 0x121-0x122.
#[derive(
    Clone,
    Copy,
    Debug,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    IntoPrimitive,
    TryFromPrimitive,
    SerializeDisplay,
    DeserializeFromStr,
)]
#[repr(u8)]
pub enum ControllerFault {
    BatteryOverDischarge = 16,
    BatteryOverVoltage = 17,
    BatteryUnderVoltage = 18,
    LoadShortCircuit = 19,
    LoadOverPowerOrOverCurrent = 20,
    ControllerTemperatureTooHigh = 21,
    AmbientTemperatureTooHigh = 22,
    PhotovoltaicInputOverPower = 23,
    PhotovoltaicInputSideShortCircuit = 24,
    PhotovoltaicInputSideOverVoltage = 25,
    SolarPanelCounterCurrent = 26,
    SolarPanelWorkingPointOverVoltage = 27,
    SolarPanelReverselyConnected = 28,
    AntiReverseMosShort = 29,
    ChargeMosShortCircuit = 30,
}

impl ControllerFault {
    pub const ALL: [ControllerFault; 15] = [
        ControllerFault::BatteryOverDischarge,
        ControllerFault::BatteryOverVoltage,
        ControllerFault::BatteryUnderVoltage,
        ControllerFault::LoadShortCircuit,
        ControllerFault::LoadOverPowerOrOverCurrent,
        ControllerFault::ControllerTemperatureTooHigh,
        ControllerFault::AmbientTemperatureTooHigh,
        ControllerFault::PhotovoltaicInputOverPower,
        ControllerFault::PhotovoltaicInputSideShortCircuit,
        ControllerFault::PhotovoltaicInputSideOverVoltage,
        ControllerFault::SolarPanelCounterCurrent,
        ControllerFault::SolarPanelWorkingPointOverVoltage,
        ControllerFault::SolarPanelReverselyConnected,
        ControllerFault::AntiReverseMosShort,
        ControllerFault::ChargeMosShortCircuit,
    ];

    pub fn bit(self) -> u8 {
        self.into()
    }

    pub fn mask(self) -> u32 {
        1u32 << self.bit()
    }

    pub fn label(self) -> &'static str {
        use ControllerFault::*;

        match self {
            ChargeMosShortCircuit => "charge mos short circuit",
            AntiReverseMosShort => "anti reverse mos short",
            SolarPanelReverselyConnected => "solar panel reversely connected",
            SolarPanelWorkingPointOverVoltage => "solar panel working point overvoltage",
            SolarPanelCounterCurrent => "solar panel counter current",
            PhotovoltaicInputSideOverVoltage => "photovoltaic input side over voltage",
            PhotovoltaicInputSideShortCircuit => "photovoltaic input side short circuit",
            PhotovoltaicInputOverPower => "photovoltaic input overpower",
            AmbientTemperatureTooHigh => "ambient temperature too high",
            ControllerTemperatureTooHigh => "controller temperature too high",
            LoadOverPowerOrOverCurrent => "load over power or load over current",
            LoadShortCircuit => "load short circuit",
            BatteryUnderVoltage => "battery under voltage",
            BatteryOverVoltage => "battery over voltage",
            BatteryOverDischarge => "battery over discharge",
        }
    }

    /// Faults whose bits are set in `bits`. Bits 0-15 are ignored, as is
    /// bit 31, which the controller documentation leaves unnamed.
    pub fn from_bits(bits: u32) -> BTreeSet<ControllerFault> {
        let mut faults = BTreeSet::new();
        for bit in FIRST_FAULT_BIT..32 {
            if bits & (1u32 << bit) == 0 {
                continue;
            }
            match ControllerFault::try_from(bit) {
                Ok(fault) => {
                    faults.insert(fault);
                }
                Err(_) => debug!("ignoring unnamed fault bit {}", bit),
            }
        }
        faults
    }

    pub fn to_bits<'a>(faults: impl IntoIterator<Item = &'a ControllerFault>) -> u32 {
        faults.into_iter().fold(0, |acc, fault| acc | fault.mask())
    }
}

impl fmt::Display for ControllerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ControllerFault {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|fault| fault.label() == s)
            .ok_or_else(|| CodecError::FaultName(s.to_string()))
    }
}

/// Decodes the 4-byte big-endian fault field.
pub fn decode_bitmap(bytes: &[u8]) -> Result<BTreeSet<ControllerFault>, CodecError> {
    let bytes: [u8; 4] = bytes
        .try_into()
        .map_err(|_| CodecError::length(4, bytes.len()))?;

    Ok(ControllerFault::from_bits(u32::from_be_bytes(bytes)))
}

pub fn encode_bitmap(faults: &BTreeSet<ControllerFault>) -> [u8; 4] {
    ControllerFault::to_bits(faults).to_be_bytes()
}

/// Encodes faults given by label, failing on the first label that isn't a
/// known fault.
pub fn encode_bitmap_names<I, S>(names: I) -> Result<[u8; 4], CodecError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let faults = names
        .into_iter()
        .map(|name| name.as_ref().parse::<ControllerFault>())
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(encode_bitmap(&faults))
}
