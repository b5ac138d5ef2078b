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
//! Compile-time tuning constants.
//!
//! Everything the firmware counts in is derived from one 125 Hz timebase
//! (Timer2 in CTC mode, prescaler 1024, 125 counts at 16 MHz).  The clock
//! ticks on every 125th subtick and the input sampler runs every 6th.

// ═══════════════════════════════════════════════════════════════════════
// Timebase
// ═══════════════════════════════════════════════════════════════════════

/// Timebase interrupts per second.
pub const SUBTICKS_PER_SECOND: u8 = 125;

/// Timebase interrupts between input samples (6 x 8 ms = 48 ms).
pub const SUBTICKS_PER_POLL: u8 = 6;

// ═══════════════════════════════════════════════════════════════════════
// Input
// ═══════════════════════════════════════════════════════════════════════

/// Consecutive samples a button must stay down before a HOLD is reported
/// (about 750 ms).
pub const REPEAT_THRESHOLD: u8 = 15;

/// Encoder edges closer than this to the last detent are ignored.  Timer1
/// runs at 250 kHz, so 2500 counts is 10 ms.
pub const ENCODER_BLACKOUT_TICKS: u16 = 2500;

/// Quarter-cycle transitions making up one mechanical detent.
pub const STEPS_PER_DETENT: i8 = 4;

// ═══════════════════════════════════════════════════════════════════════
// Controller
// ═══════════════════════════════════════════════════════════════════════

/// Samples the SAVE acknowledgment stays up.
pub const SAVED_ACK_POLLS: u8 = 15;

/// Idle samples before the controller powers down (20 minutes).
pub const IDLE_POWER_OFF_POLLS: u16 = 24_000;

/// Seconds the half-press line is held before the shutter fires.
pub const HALF_PRESS_SECS: i8 = 2;

/// Upper bound on state re-dispatches within a single sample.
pub const MAX_REDISPATCH: u8 = 8;

/// Highest signature row address shown by the signature viewer.
pub const SIGNATURE_LAST: u8 = 31;

// ═══════════════════════════════════════════════════════════════════════
// Display
// ═══════════════════════════════════════════════════════════════════════

/// Number of brightness levels.  Level 0 is the dimmest.
pub const BRIGHTNESS_LEVELS: u8 = 6;

/// Timer0 compare B value per brightness level.  The digit is blanked when
/// the counter reaches this value, so larger means brighter.
pub const BLANK_COMPARE: [u8; BRIGHTNESS_LEVELS as usize] = [9, 18, 28, 50, 85, 255];

// ═══════════════════════════════════════════════════════════════════════
// Board pins (Arduino Nano, ATmega168)
// ═══════════════════════════════════════════════════════════════════════
//
//   PD0..PD7  segment bus, PD7 = A ... PD1 = G, PD0 = DP (low = lit)
//   PB0..PB2  digit address into the 74HC138 decoder
//   PB3       decoder enable (high = a digit is driven)
//   PB4       half-press opto
//   PB5       shutter opto
//   PC0, PC1  encoder A/B (PCINT8, PCINT9)
//   PC2       encoder click
//   PC3       SELECT
//   PC4       SET
//   PC5       START

/// PORTB bits owned by the digit decoder.
pub const DIGIT_PORT_MASK: u8 = 0b0000_1111;

/// Decoder enable bit on PORTB.
pub const DIGIT_ENABLE: u8 = 0b0000_1000;

/// Encoder phase bits on PINC.
pub const ENCODER_A: u8 = 0b0000_0001;
pub const ENCODER_B: u8 = 0b0000_0010;

/// Button bits on PINC (active low).
pub const BUTTON_MASK: u8 = 0b0011_1100;
