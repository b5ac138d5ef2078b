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
//! Hardware seams.
//!
//! The board binary implements these over the AVR peripherals; [`crate::sim`]
//! implements them in memory for tests.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::input::Buttons;

/// Byte-addressed persistent store, e.g. the on-chip EEPROM.
pub trait ByteStore {
    type Error;

    fn read(&self, offset: u16, buf: &mut [u8]) -> Result<(), Self::Error>;
    fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), Self::Error>;
}

/// Everything the controller drives besides the clock and the display.
pub trait Board {
    type Console: ufmt::uWrite;
    type Store: ByteStore;

    fn set_shutter(&mut self, open: bool);
    fn set_half_press(&mut self, engaged: bool);

    fn store(&mut self) -> &mut Self::Store;
    fn console(&mut self) -> &mut Self::Console;

    /// Supply voltage in hundredths of a volt, if a reading is ready.
    fn supply_centivolts(&mut self) -> Option<u16>;
    /// Raw internal temperature sensor reading, if one is ready.
    fn temperature_raw(&mut self) -> Option<u16>;
    fn signature_byte(&mut self, index: u8) -> u8;

    /// Enters the deepest sleep mode and returns once a button or the
    /// encoder wakes the chip.
    fn sleep_until_wake(&mut self);
}

/// Segment bus and digit select lines, driven from the refresh interrupts.
pub trait DigitDriver {
    fn set_segments(&mut self, pattern: u8);
    fn select_digit(&mut self, index: u8);
    fn digits_off(&mut self);
}

/// Raw input lines read by the sampler.
pub trait InputLines {
    /// Buttons currently held down.
    fn buttons(&mut self) -> Buttons;
    /// Encoder detents since the last call.
    fn take_encoder(&mut self) -> i8;
}

/// Shutter and half-press opto outputs on two GPIO pins.
pub struct Outputs<S, H> {
    shutter: S,
    half_press: H,
}

impl<S: OutputPin, H: OutputPin> Outputs<S, H> {
    /// Takes both pins and releases them.
    pub fn new(mut shutter: S, mut half_press: H) -> Self {
        let _ = shutter.set_low();
        let _ = half_press.set_low();
        Self {
            shutter,
            half_press,
        }
    }

    pub fn set_shutter(&mut self, open: bool) {
        let _ = self.shutter.set_state(PinState::from(open));
    }

    pub fn set_half_press(&mut self, engaged: bool) {
        let _ = self.half_press.set_state(PinState::from(engaged));
    }

    pub fn release(self) -> (S, H) {
        (self.shutter, self.half_press)
    }
}

/// Four active-low push buttons.
pub struct ButtonPins<START, SELECT, SET, ENC> {
    start: START,
    select: SELECT,
    set: SET,
    enc: ENC,
}

impl<START, SELECT, SET, ENC> ButtonPins<START, SELECT, SET, ENC>
where
    START: InputPin,
    SELECT: InputPin,
    SET: InputPin,
    ENC: InputPin,
{
    pub fn new(start: START, select: SELECT, set: SET, enc: ENC) -> Self {
        Self {
            start,
            select,
            set,
            enc,
        }
    }

    /// Buttons currently down.  A pin that fails to read counts as released.
    pub fn read(&mut self) -> Buttons {
        let mut down = Buttons::NONE;
        if self.start.is_low().unwrap_or(false) {
            down |= Buttons::START;
        }
        if self.select.is_low().unwrap_or(false) {
            down |= Buttons::SELECT;
        }
        if self.set.is_low().unwrap_or(false) {
            down |= Buttons::SET;
        }
        if self.enc.is_low().unwrap_or(false) {
            down |= Buttons::ENC;
        }
        down
    }

    pub fn release(self) -> (START, SELECT, SET, ENC) {
        (self.start, self.select, self.set, self.enc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn outputs_follow_requests() {
        let shutter = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let half = PinMock::new(&[Transaction::set(State::Low), Transaction::set(State::High)]);

        let mut outputs = Outputs::new(shutter, half);
        outputs.set_shutter(true);
        outputs.set_half_press(true);
        outputs.set_shutter(false);

        let (mut shutter, mut half) = outputs.release();
        shutter.done();
        half.done();
    }

    #[test]
    fn buttons_are_active_low() {
        let start = PinMock::new(&[Transaction::get(State::Low)]);
        let select = PinMock::new(&[Transaction::get(State::High)]);
        let set = PinMock::new(&[Transaction::get(State::Low)]);
        let enc = PinMock::new(&[Transaction::get(State::High)]);

        let mut pins = ButtonPins::new(start, select, set, enc);
        assert_eq!(pins.read(), Buttons::START | Buttons::SET);

        let (mut start, mut select, mut set, mut enc) = pins.release();
        start.done();
        select.done();
        set.done();
        enc.done();
    }
}
