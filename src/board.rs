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
//! The ATmega168 side of the board traits.
use core::convert::Infallible;

use arduino_hal::port::mode::{Input, Output, PullUp};
use arduino_hal::port::Pin;

use astrotimer::config::{DIGIT_ENABLE, DIGIT_PORT_MASK};
use astrotimer::hal::{Board, ButtonPins, ByteStore, DigitDriver, InputLines, Outputs};
use astrotimer::power::is_wake;
use astrotimer::Buttons;

use crate::timer;

type OutPin = Pin<Output>;
type Button = Pin<Input<PullUp>>;

// ADMUX: reference in bits 7:6, channel in 3:0.
const ADMUX_BANDGAP: u8 = 0b0100_1110; // AVcc reference, measure 1.1 V
const ADMUX_TEMPERATURE: u8 = 0b1100_1000; // 1.1 V reference, channel 8
// ADCSRA: enable, start, prescaler 128.
const ADCSRA_START: u8 = 0b1100_0111;
const ADCSRA_BUSY: u8 = 0b0100_0000;
// 1.1 V * 1024 steps in centivolts.
const BANDGAP_SCALE: u32 = 110 * 1024;

// SPMCSR (I/O 0x37): SIGRD | SPMEN.
const SIGNATURE_READ: u8 = 0x21;

/// Segment bus on PORTD, digit decoder on PB0..PB3.
///
/// Zero sized: the interrupt handlers make one whenever they need it.
pub struct PortDigits;

impl PortDigits {
    /// Sets the segment and decoder pins as outputs, everything dark.
    pub fn init() {
        // SAFETY: the pins! macro never hands out PD0..PD7 or PB0..PB3
        // to anyone else, and interrupts are still off.
        let portd = unsafe { &*arduino_hal::pac::PORTD::ptr() };
        let portb = unsafe { &*arduino_hal::pac::PORTB::ptr() };
        portd.portd.write(|w| unsafe { w.bits(0xFF) });
        portd.ddrd.write(|w| unsafe { w.bits(0xFF) });
        portb
            .portb
            .modify(|r, w| unsafe { w.bits(r.bits() & !DIGIT_PORT_MASK) });
        portb
            .ddrb
            .modify(|r, w| unsafe { w.bits(r.bits() | DIGIT_PORT_MASK) });
    }
}

impl DigitDriver for PortDigits {
    fn set_segments(&mut self, pattern: u8) {
        // SAFETY: PORTD belongs to the segment bus.
        let portd = unsafe { &*arduino_hal::pac::PORTD::ptr() };
        portd.portd.write(|w| unsafe { w.bits(pattern) });
    }

    fn select_digit(&mut self, index: u8) {
        // SAFETY: only the decoder bits change.  Main-line writes to the
        // rest of PORTB happen with interrupts disabled.
        let portb = unsafe { &*arduino_hal::pac::PORTB::ptr() };
        portb.portb.modify(|r, w| unsafe {
            w.bits((r.bits() & !DIGIT_PORT_MASK) | DIGIT_ENABLE | (index & 0b111))
        });
    }

    fn digits_off(&mut self) {
        let portb = unsafe { &*arduino_hal::pac::PORTB::ptr() };
        portb
            .portb
            .modify(|r, w| unsafe { w.bits(r.bits() & !DIGIT_ENABLE) });
    }
}

#[derive(Debug)]
pub struct EepromFault;

/// Internal EEPROM.
pub struct EepromStore(arduino_hal::Eeprom);

impl EepromStore {
    pub fn new(eeprom: arduino_hal::Eeprom) -> Self {
        Self(eeprom)
    }
}

impl ByteStore for EepromStore {
    type Error = EepromFault;

    fn read(&self, offset: u16, buf: &mut [u8]) -> Result<(), EepromFault> {
        self.0.read(offset, buf).map_err(|_| EepromFault)
    }

    fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), EepromFault> {
        self.0.write(offset, data).map_err(|_| EepromFault)
    }
}

/// PD0 and PD1 carry segments, so there is no UART to log to.
pub struct Quiet;

impl ufmt::uWrite for Quiet {
    type Error = Infallible;

    fn write_str(&mut self, _s: &str) -> Result<(), Infallible> {
        Ok(())
    }
}

pub struct Hardware {
    outputs: Outputs<OutPin, OutPin>,
    store: EepromStore,
    console: Quiet,
    adc: arduino_hal::pac::ADC,
    cpu: arduino_hal::pac::CPU,
}

impl Hardware {
    pub fn new(
        outputs: Outputs<OutPin, OutPin>,
        store: EepromStore,
        adc: arduino_hal::pac::ADC,
        cpu: arduino_hal::pac::CPU,
    ) -> Self {
        Self {
            outputs,
            store,
            console: Quiet,
            adc,
            cpu,
        }
    }

    /// Idle sleep until the next interrupt.  Timers keep running.
    pub fn idle(&mut self) {
        self.cpu.smcr.write(|w| w.sm().idle().se().set_bit());
        avr_device::asm::sleep();
        self.cpu.smcr.reset();
    }

    /// One ADC conversion.  The first result after switching the
    /// multiplexer is thrown away while the reference settles.
    fn convert(&mut self, admux: u8) -> u16 {
        // SAFETY: raw ADMUX/ADCSRA values from the datasheet.
        self.adc.admux.write(|w| unsafe { w.bits(admux) });
        let mut value = 0;
        for _ in 0..2 {
            self.adc.adcsra.write(|w| unsafe { w.bits(ADCSRA_START) });
            while self.adc.adcsra.read().bits() & ADCSRA_BUSY != 0 {}
            value = self.adc.adc.read().bits();
        }
        self.adc.adcsra.reset();
        value
    }
}

fn read_pinc() -> u8 {
    // SAFETY: read-only.
    unsafe { &*arduino_hal::pac::PORTC::ptr() }.pinc.read().bits()
}

impl Board for Hardware {
    type Console = Quiet;
    type Store = EepromStore;

    fn set_shutter(&mut self, open: bool) {
        avr_device::interrupt::free(|_| self.outputs.set_shutter(open));
    }

    fn set_half_press(&mut self, engaged: bool) {
        avr_device::interrupt::free(|_| self.outputs.set_half_press(engaged));
    }

    fn store(&mut self) -> &mut EepromStore {
        &mut self.store
    }

    fn console(&mut self) -> &mut Quiet {
        &mut self.console
    }

    fn supply_centivolts(&mut self) -> Option<u16> {
        let raw = self.convert(ADMUX_BANDGAP);
        if raw == 0 {
            return None;
        }
        u16::try_from(BANDGAP_SCALE / u32::from(raw)).ok()
    }

    fn temperature_raw(&mut self) -> Option<u16> {
        Some(self.convert(ADMUX_TEMPERATURE))
    }

    fn signature_byte(&mut self, index: u8) -> u8 {
        // An interrupt between OUT and LPM would let the SIGRD window lapse.
        avr_device::interrupt::free(|_| {
            let value: u8;
            // SAFETY: SIGRD followed by LPM within four cycles reads the
            // signature row and changes nothing.
            unsafe {
                core::arch::asm!(
                    "out 0x37, {cmd}",
                    "lpm {value}, Z",
                    cmd = in(reg) SIGNATURE_READ,
                    value = out(reg) value,
                    in("Z") u16::from(index),
                );
            }
            value
        })
    }

    /// Power-down until a button goes down or the encoder turns.  Button
    /// releases also raise PCINT1, so those put the chip straight back to
    /// sleep.
    fn sleep_until_wake(&mut self) {
        PortDigits.digits_off();
        loop {
            let before = read_pinc();
            self.cpu.smcr.write(|w| w.sm().pdown().se().set_bit());
            avr_device::asm::sleep();
            self.cpu.smcr.reset();
            if is_wake(before, read_pinc()) {
                break;
            }
        }
    }
}

/// Buttons and the encoder count kept by PCINT1.
pub struct Lines {
    buttons: ButtonPins<Button, Button, Button, Button>,
}

impl Lines {
    pub fn new(buttons: ButtonPins<Button, Button, Button, Button>) -> Self {
        Self { buttons }
    }
}

impl InputLines for Lines {
    fn buttons(&mut self) -> Buttons {
        self.buttons.read()
    }

    fn take_encoder(&mut self) -> i8 {
        timer::take_encoder()
    }
}
