#![allow(dead_code)]

use renogy_modbus::prelude::*;
use std::collections::BTreeSet;

pub struct Factory;

impl Factory {
    /// Controller at 100% SOC, battery 13.6 V, 25 °C / 0 °C, charging
    /// deactivated, no faults.
    pub fn sample_bytes() -> Vec<u8> {
        vec![
            0x00, 0x64, 0x00, 0x88, 0x00, 0x96, 0x19, 0x00, 0x00, 0x88,
            0x01, 0x90, 0x00, 0x36, 0x00, 0xa6, 0x00, 0x6e, 0x00, 0x12,
            0x00, 0x00, 0x00, 0x00, 0x00, 0x84, 0x00, 0x96, 0x01, 0x90,
            0x00, 0x13, 0x00, 0x0c, 0x00, 0x04, 0x00, 0x04, 0x75, 0x30,
            0x75, 0x30, 0x00, 0x0c, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00,
            0x00, 0x0a, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x01, 0x86, 0xa0,
            0x00, 0x01, 0x86, 0xa0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]
    }

    pub fn sample_snapshot() -> Snapshot {
        let d = Fixed2::from_hundredths;

        Snapshot {
            battery_capacity_soc: 100,
            battery_voltage: d(1360),
            charging_current: d(150),
            controller_temperature: 25,
            battery_temperature: 0,
            street_light_load_voltage: d(1360),
            street_light_load_current: d(400),
            street_light_load_power: d(5400),
            solar_panel_voltage: d(1660),
            solar_panel_current: d(110),
            charging_power: d(1800),
            battery_minimum_voltage_current_day: d(0),
            battery_maximum_voltage_current_day: d(1320),
            maximum_charging_current_current_day: d(150),
            maximum_discharging_current_current_day: d(400),
            maximum_charging_power_current_day: d(1900),
            maximum_discharging_power_current_day: d(1200),
            charging_amp_hours_current_day: d(400),
            discharging_amp_hours_current_day: d(400),
            power_generation_current_day: d(300),
            power_consumption_current_day: d(300),
            total_operating_days: 12,
            total_battery_over_discharges: 0,
            total_battery_full_charges: 10,
            total_charging_amp_hours: d(1000),
            total_discharging_amp_hours: d(1000),
            cumulative_power_generation: d(1000),
            cumulative_power_consumption: d(1000),
            street_light_status: false,
            street_light_brightness: 0,
            charging_state: ChargingState::Deactivated,
            controller_faults: BTreeSet::new(),
        }
    }

    /// Read response from slave 1 carrying [`Factory::sample_bytes`].
    pub fn sample_response_frame() -> Vec<u8> {
        let mut frame = vec![0x01, 0x03, 0x46];
        frame.extend(Self::sample_bytes());
        frame.extend([0x41, 0xe8]);
        frame
    }

    /// Write request to slave 1 carrying [`Factory::sample_bytes`].
    pub fn sample_write_frame() -> Vec<u8> {
        let mut frame = vec![0x01, 0x10, 0x01, 0x00, 0x00, 0x23, 0x46];
        frame.extend(Self::sample_bytes());
        frame.extend([0xe1, 0x4c]);
        frame
    }
}
