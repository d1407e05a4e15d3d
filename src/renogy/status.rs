use crate::prelude::*;

const LOAD_ON: u8 = 0x80;
const BRIGHTNESS_MASK: u8 = 0x7f;

pub const MAX_BRIGHTNESS: u8 = 100;

/// Street light load state, register 0x120 high byte: bit 7 is the load
/// on/off flag, bits 0-6 the brightness percentage.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LoadStatus {
    pub on: bool,
    pub brightness: u8,
}

impl LoadStatus {
    pub fn new(on: bool, brightness: u8) -> Self {
        Self { on, brightness }
    }

    /// Unpacks the byte. Brightness above 100 fits in 7 bits and is passed
    /// through as read.
    pub fn from_byte(byte: u8) -> Self {
        let status = Self {
            on: byte & LOAD_ON != 0,
            brightness: byte & BRIGHTNESS_MASK,
        };
        if status.brightness > MAX_BRIGHTNESS {
            warn!("street light brightness {}% is above {}%", status.brightness, MAX_BRIGHTNESS);
        }
        status
    }

    pub fn to_byte(self) -> Result<u8, CodecError> {
        if self.brightness > MAX_BRIGHTNESS {
            return Err(CodecError::Range {
                field: "street_light_brightness",
                value: i64::from(self.brightness),
                min: 0,
                max: i64::from(MAX_BRIGHTNESS),
            });
        }

        let flag = if self.on { LOAD_ON } else { 0 };
        Ok(flag | self.brightness)
    }
}
