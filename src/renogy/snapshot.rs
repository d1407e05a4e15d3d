use crate::prelude::*;
use crate::renogy::fixed::Scale;
use crate::renogy::registers::RawRegisters;
use crate::renogy::status::LoadStatus;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Dynamic controller information: one decoded read of registers
/// 0x100-0x122.
///
/// Serialises to a flat object keyed by the field names below; decimals are
/// strings with two fractional digits.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub battery_capacity_soc: u16,                       // %
    pub battery_voltage: Fixed2,                         // V
    pub charging_current: Fixed2,                        // A
    pub controller_temperature: i8,                      // °C
    pub battery_temperature: i8,                         // °C
    pub street_light_load_voltage: Fixed2,               // V
    pub street_light_load_current: Fixed2,               // A
    pub street_light_load_power: Fixed2,                 // W
    pub solar_panel_voltage: Fixed2,                     // V
    pub solar_panel_current: Fixed2,                     // A
    pub charging_power: Fixed2,                          // W
    pub battery_minimum_voltage_current_day: Fixed2,     // V
    pub battery_maximum_voltage_current_day: Fixed2,     // V
    pub maximum_charging_current_current_day: Fixed2,    // A
    pub maximum_discharging_current_current_day: Fixed2, // A
    pub maximum_charging_power_current_day: Fixed2,      // W
    pub maximum_discharging_power_current_day: Fixed2,   // W
    pub charging_amp_hours_current_day: Fixed2,          // Ah
    pub discharging_amp_hours_current_day: Fixed2,       // Ah
    pub power_generation_current_day: Fixed2,            // kWh
    pub power_consumption_current_day: Fixed2,           // kWh
    pub total_operating_days: u16,
    pub total_battery_over_discharges: u16,
    pub total_battery_full_charges: u16,
    pub total_charging_amp_hours: Fixed2,                // Ah
    pub total_discharging_amp_hours: Fixed2,             // Ah
    pub cumulative_power_generation: Fixed2,             // kWh
    pub cumulative_power_consumption: Fixed2,            // kWh
    pub street_light_status: bool,
    pub street_light_brightness: u8,                     // %
    pub charging_state: ChargingState,
    #[serde(default)]
    pub controller_faults: BTreeSet<ControllerFault>,
}

impl Snapshot {
    /// Decodes a 70-byte register block.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let snapshot = Self::from_raw(&RawRegisters::decode(bytes)?);
        debug!(
            "decoded snapshot: soc={}% battery={}V state={}({}) faults={}",
            snapshot.battery_capacity_soc,
            snapshot.battery_voltage,
            snapshot.charging_state,
            snapshot.charging_state.code(),
            snapshot.controller_faults.len()
        );
        Ok(snapshot)
    }

    /// Encodes back into the 70-byte register block. Decimal fields are
    /// rounded half away from zero to the nearest register value.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        self.to_raw()?.bytes()
    }

    pub fn from_raw(raw: &RawRegisters) -> Self {
        let load = LoadStatus::from_byte(raw.load_status);
        let charging_state = ChargingState::from(raw.charging_state);
        if !charging_state.is_recognized() {
            warn!("unrecognised charging state code {:#04x}", raw.charging_state);
        }

        Self {
            battery_capacity_soc: raw.battery_capacity_soc,
            battery_voltage: fixed(raw.battery_voltage, Scale::Tenths),
            charging_current: fixed(raw.charging_current, Scale::Hundredths),
            controller_temperature: raw.controller_temperature,
            battery_temperature: raw.battery_temperature,
            street_light_load_voltage: fixed(raw.load_voltage, Scale::Tenths),
            street_light_load_current: fixed(raw.load_current, Scale::Hundredths),
            street_light_load_power: fixed(raw.load_power, Scale::Unit),
            solar_panel_voltage: fixed(raw.panel_voltage, Scale::Tenths),
            solar_panel_current: fixed(raw.panel_current, Scale::Hundredths),
            charging_power: fixed(raw.charging_power, Scale::Unit),
            battery_minimum_voltage_current_day: fixed(
                raw.battery_min_voltage_today,
                Scale::Tenths,
            ),
            battery_maximum_voltage_current_day: fixed(
                raw.battery_max_voltage_today,
                Scale::Tenths,
            ),
            maximum_charging_current_current_day: fixed(
                raw.max_charging_current_today,
                Scale::Hundredths,
            ),
            maximum_discharging_current_current_day: fixed(
                raw.max_discharging_current_today,
                Scale::Hundredths,
            ),
            maximum_charging_power_current_day: fixed(raw.max_charging_power_today, Scale::Unit),
            maximum_discharging_power_current_day: fixed(
                raw.max_discharging_power_today,
                Scale::Unit,
            ),
            charging_amp_hours_current_day: fixed(raw.charging_amp_hours_today, Scale::Unit),
            discharging_amp_hours_current_day: fixed(
                raw.discharging_amp_hours_today,
                Scale::Unit,
            ),
            power_generation_current_day: fixed(
                raw.power_generation_today,
                Scale::TenThousandths,
            ),
            power_consumption_current_day: fixed(
                raw.power_consumption_today,
                Scale::TenThousandths,
            ),
            total_operating_days: raw.total_operating_days,
            total_battery_over_discharges: raw.total_battery_over_discharges,
            total_battery_full_charges: raw.total_battery_full_charges,
            total_charging_amp_hours: Fixed2::from_register(
                raw.total_charging_amp_hours,
                Scale::Unit,
            ),
            total_discharging_amp_hours: Fixed2::from_register(
                raw.total_discharging_amp_hours,
                Scale::Unit,
            ),
            cumulative_power_generation: Fixed2::from_register(
                raw.cumulative_power_generation,
                Scale::TenThousandths,
            ),
            cumulative_power_consumption: Fixed2::from_register(
                raw.cumulative_power_consumption,
                Scale::TenThousandths,
            ),
            street_light_status: load.on,
            street_light_brightness: load.brightness,
            charging_state,
            controller_faults: ControllerFault::from_bits(raw.controller_faults),
        }
    }

    pub fn to_raw(&self) -> Result<RawRegisters, CodecError> {
        Ok(RawRegisters {
            battery_capacity_soc: self.battery_capacity_soc,
            battery_voltage: u16_register("battery_voltage", self.battery_voltage, Scale::Tenths)?,
            charging_current: u16_register(
                "charging_current",
                self.charging_current,
                Scale::Hundredths,
            )?,
            controller_temperature: self.controller_temperature,
            battery_temperature: self.battery_temperature,
            load_voltage: u16_register(
                "street_light_load_voltage",
                self.street_light_load_voltage,
                Scale::Tenths,
            )?,
            load_current: u16_register(
                "street_light_load_current",
                self.street_light_load_current,
                Scale::Hundredths,
            )?,
            load_power: u16_register(
                "street_light_load_power",
                self.street_light_load_power,
                Scale::Unit,
            )?,
            panel_voltage: u16_register(
                "solar_panel_voltage",
                self.solar_panel_voltage,
                Scale::Tenths,
            )?,
            panel_current: u16_register(
                "solar_panel_current",
                self.solar_panel_current,
                Scale::Hundredths,
            )?,
            charging_power: u16_register("charging_power", self.charging_power, Scale::Unit)?,
            battery_min_voltage_today: u16_register(
                "battery_minimum_voltage_current_day",
                self.battery_minimum_voltage_current_day,
                Scale::Tenths,
            )?,
            battery_max_voltage_today: u16_register(
                "battery_maximum_voltage_current_day",
                self.battery_maximum_voltage_current_day,
                Scale::Tenths,
            )?,
            max_charging_current_today: u16_register(
                "maximum_charging_current_current_day",
                self.maximum_charging_current_current_day,
                Scale::Hundredths,
            )?,
            max_discharging_current_today: u16_register(
                "maximum_discharging_current_current_day",
                self.maximum_discharging_current_current_day,
                Scale::Hundredths,
            )?,
            max_charging_power_today: u16_register(
                "maximum_charging_power_current_day",
                self.maximum_charging_power_current_day,
                Scale::Unit,
            )?,
            max_discharging_power_today: u16_register(
                "maximum_discharging_power_current_day",
                self.maximum_discharging_power_current_day,
                Scale::Unit,
            )?,
            charging_amp_hours_today: u16_register(
                "charging_amp_hours_current_day",
                self.charging_amp_hours_current_day,
                Scale::Unit,
            )?,
            discharging_amp_hours_today: u16_register(
                "discharging_amp_hours_current_day",
                self.discharging_amp_hours_current_day,
                Scale::Unit,
            )?,
            power_generation_today: u16_register(
                "power_generation_current_day",
                self.power_generation_current_day,
                Scale::TenThousandths,
            )?,
            power_consumption_today: u16_register(
                "power_consumption_current_day",
                self.power_consumption_current_day,
                Scale::TenThousandths,
            )?,
            total_operating_days: self.total_operating_days,
            total_battery_over_discharges: self.total_battery_over_discharges,
            total_battery_full_charges: self.total_battery_full_charges,
            total_charging_amp_hours: u32_register(
                "total_charging_amp_hours",
                self.total_charging_amp_hours,
                Scale::Unit,
            )?,
            total_discharging_amp_hours: u32_register(
                "total_discharging_amp_hours",
                self.total_discharging_amp_hours,
                Scale::Unit,
            )?,
            cumulative_power_generation: u32_register(
                "cumulative_power_generation",
                self.cumulative_power_generation,
                Scale::TenThousandths,
            )?,
            cumulative_power_consumption: u32_register(
                "cumulative_power_consumption",
                self.cumulative_power_consumption,
                Scale::TenThousandths,
            )?,
            load_status: self.load_status().to_byte()?,
            charging_state: self.charging_state.code(),
            controller_faults: ControllerFault::to_bits(&self.controller_faults),
        })
    }

    pub fn load_status(&self) -> LoadStatus {
        LoadStatus::new(self.street_light_status, self.street_light_brightness)
    }
}

impl TryFrom<&[u8]> for Snapshot {
    type Error = CodecError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::decode(bytes)
    }
}

fn fixed(raw: u16, scale: Scale) -> Fixed2 {
    Fixed2::from_register(u32::from(raw), scale)
}

/// Nearest register value for `value`, range checked against `0..=max`.
///
/// Decoding can round the top few values of a register up past its width
/// (4294967295 deciwatt-hours reads as 429496.73 kWh). Anything less than
/// half a hundredth over `max` is written back as `max`.
fn register(field: &'static str, value: Fixed2, scale: Scale, max: i64) -> Result<i64, CodecError> {
    let raw = value.to_register(scale);
    let slack = scale.divisor() / 200;

    match raw {
        raw if (0..=max).contains(&raw) => Ok(raw),
        raw if raw > max && raw - max < slack => Ok(max),
        raw => Err(CodecError::Range {
            field,
            value: raw,
            min: 0,
            max,
        }),
    }
}

fn u16_register(field: &'static str, value: Fixed2, scale: Scale) -> Result<u16, CodecError> {
    register(field, value, scale, i64::from(u16::MAX)).map(|raw| raw as u16)
}

fn u32_register(field: &'static str, value: Fixed2, scale: Scale) -> Result<u32, CodecError> {
    register(field, value, scale, i64::from(u32::MAX)).map(|raw| raw as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(bytes: &[u8]) -> Snapshot {
        match Snapshot::decode(bytes) {
            Ok(s) => s,
            Err(e) => panic!("decode failed: {e}"),
        }
    }

    #[test]
    fn any_block_decodes() {
        for fill in [0x00, 0x55, 0xaa, 0xff] {
            decoded(&[fill; 70]);
        }
    }

    #[test]
    fn wrong_length_fails() {
        assert_eq!(Snapshot::decode(&[0; 68]), Err(CodecError::length(70, 68)));
        assert_eq!(Snapshot::decode(&[0; 71]), Err(CodecError::length(70, 71)));
    }

    #[test]
    fn all_ones_block() {
        let s = decoded(&[0xff; 70]);
        assert_eq!(s.battery_capacity_soc, 0xffff);
        assert_eq!(s.battery_voltage.to_string(), "6553.50");
        assert_eq!(s.charging_current.to_string(), "655.35");
        assert_eq!(s.controller_temperature, -1);
        assert_eq!(s.power_generation_current_day.to_string(), "6.55");
        assert_eq!(s.cumulative_power_generation.to_string(), "429496.73");
        assert!(s.street_light_status);
        assert_eq!(s.street_light_brightness, 127);
        assert_eq!(s.charging_state, ChargingState::Unrecognized(0xff));
        assert_eq!(s.controller_faults.len(), 15);
    }

    #[test]
    fn unrecognised_state_is_written_back() -> Result<(), CodecError> {
        let mut bytes = vec![0; 70];
        bytes[65] = 0x07;
        let s = decoded(&bytes);
        assert_eq!(s.charging_state, ChargingState::Unrecognized(7));
        assert_eq!(s.encode()?, bytes);
        Ok(())
    }

    #[test]
    fn brightness_out_of_range_fails_encode() {
        let s = Snapshot {
            street_light_brightness: 101,
            ..Default::default()
        };
        assert!(matches!(
            s.encode(),
            Err(CodecError::Range { field: "street_light_brightness", value: 101, .. })
        ));
    }

    #[test]
    fn register_overflow_fails_encode() {
        let s = Snapshot {
            battery_voltage: Fixed2::from_hundredths(655_360), // 6553.6 V
            ..Default::default()
        };
        assert_eq!(
            s.encode(),
            Err(CodecError::Range {
                field: "battery_voltage",
                value: 65536,
                min: 0,
                max: 65535
            })
        );

        let s = Snapshot {
            charging_power: Fixed2::from_hundredths(-100),
            ..Default::default()
        };
        assert!(matches!(s.encode(), Err(CodecError::Range { field: "charging_power", .. })));
    }

    #[test]
    fn decimal_fields_round_to_nearest_register() -> Result<(), CodecError> {
        let s = Snapshot {
            street_light_load_power: Fixed2::from_hundredths(5440),
            maximum_charging_power_current_day: Fixed2::from_hundredths(1980),
            battery_voltage: Fixed2::from_hundredths(1365),
            ..Default::default()
        };
        let raw = s.to_raw()?;
        assert_eq!(raw.load_power, 54);
        assert_eq!(raw.max_charging_power_today, 20);
        assert_eq!(raw.battery_voltage, 137);
        Ok(())
    }

    #[test]
    fn energy_loses_sub_hundredth_precision() -> Result<(), CodecError> {
        let mut bytes = vec![0; 70];
        bytes[38..40].copy_from_slice(&12345u16.to_be_bytes());
        let s = decoded(&bytes);
        assert_eq!(s.power_generation_current_day, Fixed2::from_hundredths(123));

        // re-quantised value is stable
        let again = decoded(&s.encode()?);
        assert_eq!(again, s);
        assert_eq!(&s.encode()?[38..40], &12300u16.to_be_bytes());
        Ok(())
    }

    #[test]
    fn all_ones_block_re_encodes() -> Result<(), CodecError> {
        let s = Snapshot {
            street_light_brightness: 100,
            ..decoded(&[0xff; 70])
        };
        let bytes = s.encode()?;

        assert_eq!(&bytes[..6], &[0xff; 6]);
        // 6.5535 kWh reads as 6.55 and goes back as 65500
        assert_eq!(&bytes[38..40], &65500u16.to_be_bytes());
        // 429496.7295 kWh reads as 429496.73, one step past the register
        assert_eq!(&bytes[56..64], &[0xff; 8]);
        assert_eq!(bytes[64], 0xe4);
        assert_eq!(&bytes[66..70], &[0x7f, 0xff, 0x00, 0x00]);
        assert_eq!(decoded(&bytes).cumulative_power_generation, s.cumulative_power_generation);
        Ok(())
    }

    #[test]
    fn top_of_u32_energy_register_re_encodes() -> Result<(), CodecError> {
        for raw in [4_294_967_249u32, 4_294_967_250, 4_294_967_295] {
            let mut bytes = vec![0; 70];
            bytes[60..64].copy_from_slice(&raw.to_be_bytes());

            let written = decoded(&bytes).encode()?;
            let written = u32::from_be_bytes([written[60], written[61], written[62], written[63]]);
            assert!(raw.abs_diff(written) <= 50, "{raw} written back as {written}");
        }
        Ok(())
    }

    #[test]
    fn energy_beyond_rounding_slack_fails_encode() {
        let s = Snapshot {
            // 4294967400 deciwatt-hours
            cumulative_power_consumption: Fixed2::from_hundredths(42_949_674),
            ..Default::default()
        };
        assert_eq!(
            s.encode(),
            Err(CodecError::Range {
                field: "cumulative_power_consumption",
                value: 4_294_967_400,
                min: 0,
                max: 4_294_967_295
            })
        );
    }
}
