use crate::prelude::*;

use bytes::{BufMut, BytesMut};
use nom_derive::{Nom, Parse};

/// First holding register of the dynamic controller information block.
pub const START_REGISTER: u16 = 0x100;
/// Registers in the block, 0x100 through 0x122.
pub const REGISTER_COUNT: u16 = 35;
/// Bytes in the block.
pub const BLOCK_LEN: usize = REGISTER_COUNT as usize * 2;

// {{{ RawRegisters
/// The register block exactly as the controller lays it out, before any
/// scaling.
#[derive(Clone, Debug, Default, Eq, PartialEq, Nom)]
#[nom(BigEndian)]
pub struct RawRegisters {
    pub battery_capacity_soc: u16, // 0x100
    pub battery_voltage: u16,      // 0x101, 0.1 V
    pub charging_current: u16,     // 0x102, 0.01 A

    pub controller_temperature: i8, // 0x103 high byte
    pub battery_temperature: i8,    // 0x103 low byte

    pub load_voltage: u16,   // 0x104, 0.1 V
    pub load_current: u16,   // 0x105, 0.01 A
    pub load_power: u16,     // 0x106
    pub panel_voltage: u16,  // 0x107, 0.1 V
    pub panel_current: u16,  // 0x108, 0.01 A
    pub charging_power: u16, // 0x109

    // 0x10A is the write-only light on/off command
    #[nom(SkipBefore(2))]
    pub battery_min_voltage_today: u16,     // 0x10B, 0.1 V
    pub battery_max_voltage_today: u16,     // 0x10C, 0.1 V
    pub max_charging_current_today: u16,    // 0x10D, 0.01 A
    pub max_discharging_current_today: u16, // 0x10E, 0.01 A
    pub max_charging_power_today: u16,      // 0x10F
    pub max_discharging_power_today: u16,   // 0x110
    pub charging_amp_hours_today: u16,      // 0x111
    pub discharging_amp_hours_today: u16,   // 0x112
    pub power_generation_today: u16,        // 0x113, deciwatt-hours
    pub power_consumption_today: u16,       // 0x114, deciwatt-hours

    pub total_operating_days: u16,          // 0x115
    pub total_battery_over_discharges: u16, // 0x116
    pub total_battery_full_charges: u16,    // 0x117
    pub total_charging_amp_hours: u32,      // 0x118-0x119
    pub total_discharging_amp_hours: u32,   // 0x11A-0x11B
    pub cumulative_power_generation: u32,   // 0x11C-0x11D, deciwatt-hours
    pub cumulative_power_consumption: u32,  // 0x11E-0x11F, deciwatt-hours

    pub load_status: u8,    // 0x120 high byte
    pub charging_state: u8, // 0x120 low byte

    pub controller_faults: u32, // 0x121-0x122
}

impl RawRegisters {
    /// Parses a complete block. Anything but exactly [`BLOCK_LEN`] bytes is
    /// rejected, including the 34-register reads some firmware tools make.
    pub fn decode(input: &[u8]) -> Result<Self, CodecError> {
        if input.len() != BLOCK_LEN {
            return Err(CodecError::length(BLOCK_LEN, input.len()));
        }

        match RawRegisters::parse(input) {
            Ok((rest, raw)) if rest.is_empty() => Ok(raw),
            Ok((rest, _)) => Err(CodecError::length(BLOCK_LEN, BLOCK_LEN - rest.len())),
            Err(_) => Err(CodecError::length(BLOCK_LEN, input.len())),
        }
    }

    pub fn bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = BytesMut::with_capacity(BLOCK_LEN);

        buf.put_u16(self.battery_capacity_soc);
        buf.put_u16(self.battery_voltage);
        buf.put_u16(self.charging_current);
        buf.put_i8(self.controller_temperature);
        buf.put_i8(self.battery_temperature);
        buf.put_u16(self.load_voltage);
        buf.put_u16(self.load_current);
        buf.put_u16(self.load_power);
        buf.put_u16(self.panel_voltage);
        buf.put_u16(self.panel_current);
        buf.put_u16(self.charging_power);
        buf.put_u16(0); // 0x10A
        buf.put_u16(self.battery_min_voltage_today);
        buf.put_u16(self.battery_max_voltage_today);
        buf.put_u16(self.max_charging_current_today);
        buf.put_u16(self.max_discharging_current_today);
        buf.put_u16(self.max_charging_power_today);
        buf.put_u16(self.max_discharging_power_today);
        buf.put_u16(self.charging_amp_hours_today);
        buf.put_u16(self.discharging_amp_hours_today);
        buf.put_u16(self.power_generation_today);
        buf.put_u16(self.power_consumption_today);
        buf.put_u16(self.total_operating_days);
        buf.put_u16(self.total_battery_over_discharges);
        buf.put_u16(self.total_battery_full_charges);
        buf.put_u32(self.total_charging_amp_hours);
        buf.put_u32(self.total_discharging_amp_hours);
        buf.put_u32(self.cumulative_power_generation);
        buf.put_u32(self.cumulative_power_consumption);
        buf.put_u8(self.load_status);
        buf.put_u8(self.charging_state);
        buf.put_u32(self.controller_faults);

        if buf.len() != BLOCK_LEN {
            return Err(CodecError::Invariant(buf.len()));
        }

        Ok(buf.to_vec())
    }
}
// }}}
