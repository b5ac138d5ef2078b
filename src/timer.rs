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
//! Timer and pin-change interrupts.
//!
//! Three timers run at once:
//!
//! ╔═══════╦═══════════╦═════════════╦════════════════════════════════════╗
//! ║ TIMER ║ PRESCALER ║ MODE        ║ USE                                ║
//! ╠═══════╬═══════════╬═════════════╬════════════════════════════════════╣
//! ║ TC0   ║        64 ║ normal      ║ digit advance (A), blanking (B)    ║
//! ║ TC1   ║        64 ║ normal      ║ 250 kHz stamp for encoder blackout ║
//! ║ TC2   ║      1024 ║ CTC, 125    ║ 125 Hz timebase                    ║
//! ╚═══════╩═══════════╩═════════════╩════════════════════════════════════╝
//!
//! TC0 overflows every 1.024 ms, so each of the five digit slots is lit
//! about 195 times a second.
use avr_device::interrupt::Mutex;
use core::cell::RefCell;

use astrotimer::config::{ENCODER_A, ENCODER_B, SUBTICKS_PER_SECOND};
use astrotimer::{Clock, Display, PollTimer, QuadratureDecoder};

use crate::board::PortDigits;

/// 16 MHz / 1024 / 125 = 125 Hz.
const TIMEBASE_COUNTS: u8 = SUBTICKS_PER_SECOND - 1;

pub static CLOCK: Clock = Clock::new();
pub static DISPLAY: Display = Display::new();
pub static POLL: PollTimer = PollTimer::new();
pub static ENCODER: Mutex<RefCell<QuadratureDecoder>> =
    Mutex::new(RefCell::new(QuadratureDecoder::new()));

/// Timer/Counter 2 Compare Match A: one subtick.
#[avr_device::interrupt(atmega168)]
fn TIMER2_COMPA() {
    CLOCK.on_subtick();
    POLL.on_subtick();
}

/// Timer/Counter 0 Compare Match A: light the next digit.
#[avr_device::interrupt(atmega168)]
fn TIMER0_COMPA() {
    DISPLAY.refresh(&mut PortDigits);
}

/// Timer/Counter 0 Compare Match B: dark for the rest of the slot.
#[avr_device::interrupt(atmega168)]
fn TIMER0_COMPB() {
    if let Some(compare) = DISPLAY.blank(&mut PortDigits) {
        // SAFETY: the only other writer is init_tc0(), which runs before
        // interrupts are enabled.
        let tc0 = unsafe { &*arduino_hal::pac::TC0::ptr() };
        tc0.ocr0b.write(|w| w.bits(compare));
    }
}

/// Pin change on port C: encoder phases, and button wake-up.
#[avr_device::interrupt(atmega168)]
fn PCINT1() {
    // SAFETY: read-only access to input and counter registers.
    let pins = unsafe { &*arduino_hal::pac::PORTC::ptr() }.pinc.read().bits();
    let now = unsafe { &*arduino_hal::pac::TC1::ptr() }.tcnt1.read().bits();
    avr_device::interrupt::free(|cs| {
        ENCODER
            .borrow(cs)
            .borrow_mut()
            .edge(pins & ENCODER_A != 0, pins & ENCODER_B != 0, now);
    })
}

/// Detents turned since the last call.
pub fn take_encoder() -> i8 {
    avr_device::interrupt::free(|cs| ENCODER.borrow(cs).borrow_mut().take())
}

/// Initialise Timer/Counter 0 for display multiplexing.
pub fn init_tc0(tc0: &arduino_hal::pac::TC0) {
    // Normal mode: count 0..=255 and wrap.
    tc0.tccr0a.reset();
    tc0.ocr0a.write(|w| w.bits(0));
    tc0.ocr0b.write(|w| w.bits(DISPLAY.blank_compare()));
    tc0.tccr0b.write(|w| w.cs0().prescale_64());
    tc0.timsk0.write(|w| w.ocie0a().set_bit().ocie0b().set_bit());
}

/// Initialise Timer/Counter 1 as a free-running 250 kHz stamp.  No interrupt.
pub fn init_tc1(tc1: &arduino_hal::pac::TC1) {
    tc1.tccr1a.reset();
    tc1.tccr1b.write(|w| w.cs1().prescale_64());
}

/// Initialise Timer/Counter 2 as the 125 Hz timebase.
pub fn init_tc2(tc2: &arduino_hal::pac::TC2) {
    // Clear Timer on Compare, so TIMER2_COMPA fires every TIMEBASE_COUNTS + 1.
    tc2.tccr2a.write(|w| w.wgm2().ctc());
    tc2.ocr2a.write(|w| w.bits(TIMEBASE_COUNTS));
    tc2.tccr2b.write(|w| w.cs2().prescale_1024());
    tc2.timsk2.write(|w| w.ocie2a().set_bit());
}

/// Enable pin-change interrupts on PC0..PC5.
pub fn init_pcint(exint: &arduino_hal::pac::EXINT) {
    // SAFETY: PCMSK1 only has PCINT8..PCINT14, all valid.
    exint.pcmsk1.write(|w| unsafe { w.bits(0b0011_1111) });
    // PCIE1 covers port C.
    exint.pcicr.write(|w| unsafe { w.bits(0b0000_0010) });
}
