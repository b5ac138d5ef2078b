// This library is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This library is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this library.  If not, see <http://www.gnu.org/licenses/>.
//! EEPROM settings.
//!
//! The run configuration is stored to the onboard EEPROM when the user
//! saves from the options menu, and read back at startup.  One byte per
//! field from offset 0, in the order of [`Settings`].

use crate::hal::ByteStore;

/// How the half-press (focus) line is used before an exposure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
pub enum HalfPress {
    Off,
    FirstShot,
    EveryShot,
}

impl HalfPress {
    pub const fn to_byte(self) -> u8 {
        match self {
            HalfPress::Off => 0,
            HalfPress::FirstShot => 1,
            HalfPress::EveryShot => 2,
        }
    }

    pub const fn from_byte(v: u8) -> Option<Self> {
        match v {
            0 => Some(HalfPress::Off),
            1 => Some(HalfPress::FirstShot),
            2 => Some(HalfPress::EveryShot),
            _ => None,
        }
    }

    pub const fn next(self) -> Self {
        match self {
            HalfPress::Off => HalfPress::FirstShot,
            HalfPress::FirstShot => HalfPress::EveryShot,
            HalfPress::EveryShot => HalfPress::Off,
        }
    }

    pub const fn prev(self) -> Self {
        match self {
            HalfPress::Off => HalfPress::EveryShot,
            HalfPress::FirstShot => HalfPress::Off,
            HalfPress::EveryShot => HalfPress::FirstShot,
        }
    }

    pub const fn applies(self, first_shot: bool) -> bool {
        match self {
            HalfPress::Off => false,
            HalfPress::FirstShot => first_shot,
            HalfPress::EveryShot => true,
        }
    }
}

/// Saved run configuration, restored at boot.
// EEPROM variables that are saved:  9
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Exposure minutes (range: 0-99)     Default: 3
    pub exposure_min: u8,

    /// Exposure seconds (range: 0-59)     Default: 0.  0:00 is bulb mode.
    pub exposure_sec: u8,

    /// Delay minutes (range: 0-99)        Default: 0
    pub delay_min: u8,

    /// Delay seconds (range: 0-59)        Default: 5
    pub delay_sec: u8,

    /// Shots per run (range: 1-99)        Default: 10
    pub count: u8,

    /// Mirror lockup seconds (range: 0-99)  Default: 0 (off)
    pub mlu: u8,

    /// Display brightness (range: 0-5)    Default: 2
    pub brightness: u8,

    /// Half-press mode (range: 0-2)       Default: 0 (off)
    pub half_press: HalfPress,

    /// Encoder direction (range: 0,1)     Default: 0 (normal)
    pub encoder_reversed: bool,
}

// "Factory" default configuration can be configured here:
const EXPOSURE_MIN_DEFAULT: u8 = 3;
const EXPOSURE_SEC_DEFAULT: u8 = 0;
const DELAY_MIN_DEFAULT: u8 = 0;
const DELAY_SEC_DEFAULT: u8 = 5;
const COUNT_DEFAULT: u8 = 10;
const MLU_DEFAULT: u8 = 0;
const BRIGHTNESS_DEFAULT: u8 = 2;
const HALF_PRESS_DEFAULT: HalfPress = HalfPress::Off;
const ENCODER_REVERSED_DEFAULT: bool = false;

pub const MINUTES_MAX: u8 = 99;
pub const SECONDS_MAX: u8 = 59;
pub const COUNT_MIN: u8 = 1;
pub const COUNT_MAX: u8 = 99;
pub const MLU_MAX: u8 = 99;
pub const BRIGHTNESS_MAX: u8 = crate::config::BRIGHTNESS_LEVELS - 1;

pub const STORED_LEN: usize = 9;

impl Default for Settings {
    fn default() -> Self {
        Self {
            exposure_min: EXPOSURE_MIN_DEFAULT,
            exposure_sec: EXPOSURE_SEC_DEFAULT,
            delay_min: DELAY_MIN_DEFAULT,
            delay_sec: DELAY_SEC_DEFAULT,
            count: COUNT_DEFAULT,
            mlu: MLU_DEFAULT,
            brightness: BRIGHTNESS_DEFAULT,
            half_press: HALF_PRESS_DEFAULT,
            encoder_reversed: ENCODER_REVERSED_DEFAULT,
        }
    }
}

impl Settings {
    /// Reads the settings from `store`, or defaults if the read fails.
    /// Also returns how many fields were out of range and replaced.
    #[must_use]
    pub fn load<S: ByteStore>(store: &S) -> (Self, u8) {
        let mut vals: [u8; STORED_LEN] = [255; STORED_LEN];
        if store.read(0, &mut vals).is_err() {
            return (Settings::default(), STORED_LEN as u8);
        }
        Self::from_bytes(&vals)
    }

    /// Validates each byte against its range.
    #[must_use]
    pub fn from_bytes(vals: &[u8; STORED_LEN]) -> (Self, u8) {
        let mut repaired = 0;
        let mut check = |v: Option<u8>, default: u8| match v {
            Some(v) => v,
            None => {
                repaired += 1;
                default
            }
        };
        let in_range = |v: u8, lo: u8, hi: u8| (lo..=hi).contains(&v).then_some(v);

        let settings = Settings {
            exposure_min: check(in_range(vals[0], 0, MINUTES_MAX), EXPOSURE_MIN_DEFAULT),
            exposure_sec: check(in_range(vals[1], 0, SECONDS_MAX), EXPOSURE_SEC_DEFAULT),
            delay_min: check(in_range(vals[2], 0, MINUTES_MAX), DELAY_MIN_DEFAULT),
            delay_sec: check(in_range(vals[3], 0, SECONDS_MAX), DELAY_SEC_DEFAULT),
            count: check(in_range(vals[4], COUNT_MIN, COUNT_MAX), COUNT_DEFAULT),
            mlu: check(in_range(vals[5], 0, MLU_MAX), MLU_DEFAULT),
            brightness: check(in_range(vals[6], 0, BRIGHTNESS_MAX), BRIGHTNESS_DEFAULT),
            half_press: HalfPress::from_byte(check(in_range(vals[7], 0, 2), HALF_PRESS_DEFAULT.to_byte()))
                .unwrap_or(HALF_PRESS_DEFAULT),
            encoder_reversed: check(in_range(vals[8], 0, 1), u8::from(ENCODER_REVERSED_DEFAULT)) == 1,
        };
        (settings, repaired)
    }

    pub fn to_bytes(&self) -> [u8; STORED_LEN] {
        [
            self.exposure_min,
            self.exposure_sec,
            self.delay_min,
            self.delay_sec,
            self.count,
            self.mlu,
            self.brightness,
            self.half_press.to_byte(),
            u8::from(self.encoder_reversed),
        ]
    }

    /// Save the settings to `store`.
    ///
    /// EEPROM has a limited number of write cycles in its life.  Use this function
    /// sparingly -- good for human operated buttons, not so good for automation.
    pub fn save<S: ByteStore>(&self, store: &mut S) -> Result<(), S::Error> {
        store.write(0, &self.to_bytes())?;
        Ok(())
    }

    pub fn exposure_seconds(&self) -> u16 {
        crate::stops::join(self.exposure_min, self.exposure_sec)
    }

    pub fn set_exposure_seconds(&mut self, seconds: u16) {
        (self.exposure_min, self.exposure_sec) = crate::stops::split(seconds);
    }

    pub fn delay_seconds(&self) -> u16 {
        crate::stops::join(self.delay_min, self.delay_sec)
    }

    pub fn set_delay_seconds(&mut self, seconds: u16) {
        (self.delay_min, self.delay_sec) = crate::stops::split(seconds);
    }

    /// True when a run should count up until cancelled.
    pub fn is_bulb(&self) -> bool {
        self.exposure_min == 0 && self.exposure_sec == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::MemStore;

    #[test]
    fn erased_store_gives_defaults() {
        let store = MemStore::erased();
        let (settings, repaired) = Settings::load(&store);
        assert_eq!(settings, Settings::default());
        assert_eq!(repaired, STORED_LEN as u8);
    }

    #[test]
    fn save_and_reload() {
        let mut store = MemStore::erased();
        let saved = Settings {
            exposure_min: 12,
            exposure_sec: 34,
            delay_min: 1,
            delay_sec: 59,
            count: 99,
            mlu: 7,
            brightness: 5,
            half_press: HalfPress::FirstShot,
            encoder_reversed: true,
        };
        assert_eq!(saved.save(&mut store), Ok(()));
        let (loaded, repaired) = Settings::load(&store);
        assert_eq!(loaded, saved);
        assert_eq!(repaired, 0);
    }

    #[test]
    fn out_of_range_fields_fall_back() {
        // Everything but the delay is out of range.
        let (settings, repaired) = Settings::from_bytes(&[100, 60, 5, 30, 0, 100, 6, 3, 2]);
        assert_eq!(repaired, 7);
        assert_eq!(settings.exposure_min, EXPOSURE_MIN_DEFAULT);
        assert_eq!(settings.exposure_sec, EXPOSURE_SEC_DEFAULT);
        assert_eq!(settings.delay_min, 5);
        assert_eq!(settings.delay_sec, 30);
        assert_eq!(settings.count, COUNT_DEFAULT);
        assert_eq!(settings.mlu, MLU_DEFAULT);
        assert_eq!(settings.brightness, BRIGHTNESS_DEFAULT);
        assert_eq!(settings.half_press, HalfPress::Off);
        assert!(!settings.encoder_reversed);
    }

    #[test]
    fn failed_read_gives_defaults() {
        let mut store = MemStore::erased();
        store.fail = true;
        let (settings, _) = Settings::load(&store);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn failed_write_is_reported() {
        let mut store = MemStore::erased();
        store.fail = true;
        assert!(Settings::default().save(&mut store).is_err());
    }

    #[test]
    fn layout_is_fixed() {
        let s = Settings::default();
        assert_eq!(s.to_bytes(), [3, 0, 0, 5, 10, 0, 2, 0, 0]);
    }

    #[test]
    fn half_press_modes() {
        assert!(!HalfPress::Off.applies(true));
        assert!(HalfPress::FirstShot.applies(true));
        assert!(!HalfPress::FirstShot.applies(false));
        assert!(HalfPress::EveryShot.applies(false));
        assert_eq!(HalfPress::Off.prev().next(), HalfPress::Off);
    }
}
