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
//! Multiplexed 7-segment display.
//!
//! The controller composes a [`Frame`] each cycle and publishes it with
//! [`Display::show`].  Two timer compare interrupts then drive the glass:
//! [`Display::refresh`] puts the next slot on the segment bus and enables its
//! digit, and [`Display::blank`] switches every digit off again some time
//! later.  The distance between the two is the brightness.
//!
//! Slot layout: 0 and 1 are the left digit pair, 2 and 3 the right pair,
//! and 4 is the colon/apostrophe.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::config::{BLANK_COMPARE, BRIGHTNESS_LEVELS};
use crate::hal::DigitDriver;

pub const SLOTS: usize = 5;

pub const HIGH_POS: usize = 0;
pub const LOW_POS: usize = 2;
pub const EXTRA_POS: usize = 4;

/// Segment patterns.  Bit 7 is segment A down to bit 1 for G, bit 0 is the
/// decimal point.  A cleared bit lights the segment.
pub mod glyph {
    pub const EMPTY: u8 = 0xFF;
    pub const DECIMAL_POINT: u8 = 0b0000_0001;

    pub const DIGITS: [u8; 16] = [
        0b0000_0011, // 0
        0b1001_1111, // 1
        0b0010_0101, // 2
        0b0000_1101, // 3
        0b1001_1001, // 4
        0b0100_1001, // 5
        0b0100_0001, // 6
        0b0001_1111, // 7
        0b0000_0001, // 8
        0b0000_1001, // 9
        0b0001_0001, // A
        0b1100_0001, // b
        0b0110_0011, // C
        0b1000_0101, // d
        0b0110_0001, // E
        0b0111_0001, // F
    ];

    pub const LETTER_A: u8 = DIGITS[10];
    pub const LETTER_B: u8 = DIGITS[11];
    pub const LETTER_C: u8 = DIGITS[12];
    pub const LETTER_D: u8 = DIGITS[13];
    pub const LETTER_E: u8 = DIGITS[14];
    pub const LETTER_H: u8 = 0b1001_0001;
    pub const LETTER_L: u8 = 0b1110_0011;
    pub const LETTER_O: u8 = DIGITS[0];
    pub const LETTER_P: u8 = 0b0011_0001;
    pub const LETTER_S: u8 = DIGITS[5];
    pub const LETTER_T: u8 = 0b1110_0001;
    pub const LETTER_V: u8 = 0b1000_0011;
    pub const LETTER_V_LOWER: u8 = 0b1100_0111;
    pub const MINUS: u8 = 0b1111_1101;

    // Slot 4 is wired to the colon on the A line and the apostrophe on DP.
    pub const COLON: u8 = 0b0111_1111;
    pub const APOS: u8 = 0b1111_1110;
}

use glyph::{DECIMAL_POINT, DIGITS, EMPTY, MINUS};

/// Blink rate for a field, read against [`Clock::phase`](crate::clock::Clock::phase).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Blink {
    Steady,
    /// Twice a second, for the field being edited.
    Fast,
    /// Once a second.
    Slow,
}

impl Blink {
    const fn mask(self) -> u8 {
        match self {
            Blink::Steady => 0,
            Blink::Fast => 0x40,
            Blink::Slow => 0x80,
        }
    }

    /// True during the dark half of the blink.
    pub const fn hides(self, phase: u8) -> bool {
        phase & self.mask() != 0
    }
}

/// How a two digit number is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumStyle {
    pub blink: Blink,
    /// Blank the tens digit below 10.
    pub strip_tens: bool,
    /// Blank the ones digit when the value is 0.
    pub strip_ones: bool,
    pub dot_tens: bool,
    pub dot_ones: bool,
}

impl NumStyle {
    pub const PLAIN: NumStyle = NumStyle {
        blink: Blink::Steady,
        strip_tens: false,
        strip_ones: false,
        dot_tens: false,
        dot_ones: false,
    };

    pub const fn blink(self, blink: Blink) -> Self {
        NumStyle { blink, ..self }
    }

    /// Strip both zeros, so 0 shows as two blanks.
    pub const fn stripped(self) -> Self {
        NumStyle {
            strip_tens: true,
            strip_ones: true,
            ..self
        }
    }

    pub const fn leading_blank(self) -> Self {
        NumStyle {
            strip_tens: true,
            ..self
        }
    }

    pub const fn dot_ones(self, on: bool) -> Self {
        NumStyle {
            dot_ones: on,
            ..self
        }
    }
}

/// One complete set of slot patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    slots: [u8; SLOTS],
}

impl Default for Frame {
    fn default() -> Self {
        Self::blank()
    }
}

impl Frame {
    pub const fn blank() -> Self {
        Self {
            slots: [EMPTY; SLOTS],
        }
    }

    pub fn slots(&self) -> &[u8; SLOTS] {
        &self.slots
    }

    pub fn set(&mut self, pos: usize, pattern: u8) {
        if let Some(slot) = self.slots.get_mut(pos) {
            *slot = pattern;
        }
    }

    pub fn text(&mut self, glyphs: [u8; SLOTS]) {
        self.slots = glyphs;
    }

    /// Writes `value` as two decimal digits at `pos` and `pos + 1`.
    pub fn num(&mut self, value: u8, pos: usize, style: NumStyle, phase: u8) {
        if pos + 1 >= SLOTS {
            return;
        }
        if style.blink.hides(phase) {
            self.slots[pos] = EMPTY;
            self.slots[pos + 1] = EMPTY;
            return;
        }
        let value = value.min(99);
        let mut tens = if style.strip_tens && value < 10 {
            EMPTY
        } else {
            DIGITS[usize::from(value / 10)]
        };
        let mut ones = if style.strip_ones && value == 0 {
            EMPTY
        } else {
            DIGITS[usize::from(value % 10)]
        };
        if style.dot_tens {
            tens ^= DECIMAL_POINT;
        }
        if style.dot_ones {
            ones ^= DECIMAL_POINT;
        }
        self.slots[pos] = tens;
        self.slots[pos + 1] = ones;
    }

    /// A letter on the left, `value` on the right.
    pub fn alnum(&mut self, letter: u8, value: u8, style: NumStyle, gap_dot: bool, phase: u8) {
        self.slots[0] = letter;
        self.slots[1] = if gap_dot { EMPTY ^ DECIMAL_POINT } else { EMPTY };
        self.slots[EXTRA_POS] = EMPTY;
        let style = NumStyle {
            strip_tens: style.blink == Blink::Steady,
            ..style
        };
        self.num(value, LOW_POS, style, phase);
    }

    /// A letter and a signed three digit value, -99..=999.  `dot` lights the
    /// decimal point of that slot.
    pub fn three(&mut self, letter: u8, value: i16, dot: Option<usize>) {
        self.slots[0] = letter;
        self.slots[EXTRA_POS] = EMPTY;
        if value < 0 {
            // The minus sits right before the leading digit.
            let v = value.unsigned_abs().min(99);
            if v < 10 {
                self.slots[1] = EMPTY;
                self.slots[2] = MINUS;
            } else {
                self.slots[1] = MINUS;
                self.slots[2] = DIGITS[usize::from(v / 10)];
            }
            self.slots[3] = DIGITS[usize::from(v % 10)];
        } else {
            let v = value.unsigned_abs().min(999);
            let hundreds = usize::from(v / 100);
            let tens = usize::from(v / 10 % 10);
            // Leading zeros go blank unless a dot sits right of them.
            let keep_from = dot.unwrap_or(3).min(3);
            self.slots[1] = if hundreds == 0 && keep_from > 1 { EMPTY } else { DIGITS[hundreds] };
            self.slots[2] = if v < 10 && keep_from > 2 { EMPTY } else { DIGITS[tens] };
            self.slots[3] = DIGITS[usize::from(v % 10)];
        }
        if let Some(pos) = dot {
            if let Some(slot) = self.slots.get_mut(pos) {
                *slot ^= DECIMAL_POINT;
            }
        }
    }

    /// Two hex digits at `pos` and `pos + 1`.
    pub fn hex(&mut self, value: u8, pos: usize) {
        if pos + 1 >= SLOTS {
            return;
        }
        self.slots[pos] = DIGITS[usize::from(value >> 4)];
        self.slots[pos + 1] = DIGITS[usize::from(value & 0x0F)];
    }
}

/// The buffer shared between the controller and the refresh interrupts.
pub struct Display {
    slots: [AtomicU8; SLOTS],
    cursor: AtomicU8,
    pending: AtomicU8,
    applied: AtomicU8,
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Display {
    pub const fn new() -> Self {
        let full = BLANK_COMPARE[BRIGHTNESS_LEVELS as usize - 1];
        Self {
            slots: [
                AtomicU8::new(EMPTY),
                AtomicU8::new(EMPTY),
                AtomicU8::new(EMPTY),
                AtomicU8::new(EMPTY),
                AtomicU8::new(EMPTY),
            ],
            cursor: AtomicU8::new(0),
            pending: AtomicU8::new(full),
            applied: AtomicU8::new(full),
        }
    }

    /// Publishes a frame.  Each slot is stored on its own.
    pub fn show(&self, frame: &Frame) {
        for (cell, &pattern) in self.slots.iter().zip(frame.slots.iter()) {
            cell.store(pattern, Ordering::Relaxed);
        }
    }

    pub fn clear(&self) {
        self.show(&Frame::blank());
    }

    pub fn slot(&self, pos: usize) -> u8 {
        self.slots
            .get(pos)
            .map_or(EMPTY, |cell| cell.load(Ordering::Relaxed))
    }

    /// Queues a brightness change for the next blanking interrupt.
    pub fn set_brightness(&self, level: u8) {
        let level = level.min(BRIGHTNESS_LEVELS - 1);
        self.pending
            .store(BLANK_COMPARE[usize::from(level)], Ordering::Relaxed);
    }

    /// The blanking compare value currently in effect.
    pub fn blank_compare(&self) -> u8 {
        self.applied.load(Ordering::Relaxed)
    }

    /// Digit-advance interrupt: show the next slot.
    pub fn refresh<D: DigitDriver>(&self, driver: &mut D) {
        let index = self.cursor.load(Ordering::Relaxed);
        let pattern = self.slot(usize::from(index));
        driver.set_segments(pattern);
        driver.select_digit(index);
        let next = if usize::from(index) + 1 >= SLOTS { 0 } else { index + 1 };
        self.cursor.store(next, Ordering::Relaxed);
    }

    /// Blanking interrupt: switch all digits off.  Returns the new compare
    /// value when a brightness change has to be programmed.
    pub fn blank<D: DigitDriver>(&self, driver: &mut D) -> Option<u8> {
        driver.digits_off();
        let pending = self.pending.load(Ordering::Relaxed);
        if pending == self.applied.load(Ordering::Relaxed) {
            return None;
        }
        self.applied.store(pending, Ordering::Relaxed);
        Some(pending)
    }
}

#[cfg(test)]
mod tests {
    use super::glyph::*;
    use super::*;
    use crate::sim::SimDigits;

    #[test]
    fn num_plain_and_dots() {
        let mut f = Frame::blank();
        f.num(7, HIGH_POS, NumStyle::PLAIN, 0);
        assert_eq!(f.slots()[0], DIGITS[0]);
        assert_eq!(f.slots()[1], DIGITS[7]);

        f.num(42, LOW_POS, NumStyle::PLAIN.dot_ones(true), 0);
        assert_eq!(f.slots()[2], DIGITS[4]);
        assert_eq!(f.slots()[3], DIGITS[2] ^ DECIMAL_POINT);
    }

    #[test]
    fn num_strips_zeros() {
        let mut f = Frame::blank();
        f.num(0, HIGH_POS, NumStyle::PLAIN.stripped(), 0);
        assert_eq!(f.slots()[0], EMPTY);
        assert_eq!(f.slots()[1], EMPTY);

        f.num(5, HIGH_POS, NumStyle::PLAIN.leading_blank(), 0);
        assert_eq!(f.slots()[0], EMPTY);
        assert_eq!(f.slots()[1], DIGITS[5]);
    }

    #[test]
    fn num_blinks_with_phase() {
        let mut f = Frame::blank();
        let style = NumStyle::PLAIN.blink(Blink::Fast);
        f.num(12, LOW_POS, style, 0x40);
        assert_eq!(f.slots()[2], EMPTY);
        assert_eq!(f.slots()[3], EMPTY);
        f.num(12, LOW_POS, style, 0x80);
        assert_eq!(f.slots()[2], DIGITS[1]);
    }

    #[test]
    fn num_clamps_large_values() {
        let mut f = Frame::blank();
        f.num(250, HIGH_POS, NumStyle::PLAIN, 0);
        assert_eq!(f.slots()[0], DIGITS[9]);
        assert_eq!(f.slots()[1], DIGITS[9]);
    }

    #[test]
    fn alnum_layout() {
        let mut f = Frame::blank();
        f.alnum(LETTER_C, 3, NumStyle::PLAIN, true, 0);
        assert_eq!(
            f.slots(),
            &[LETTER_C, EMPTY ^ DECIMAL_POINT, EMPTY, DIGITS[3], EMPTY]
        );

        // While blinking the leading zero stays so the field keeps its width.
        f.alnum(LETTER_L, 3, NumStyle::PLAIN.blink(Blink::Fast), false, 0);
        assert_eq!(f.slots()[2], DIGITS[0]);
    }

    #[test]
    fn three_digit_values() {
        let mut f = Frame::blank();
        f.three(LETTER_V, 330, Some(1));
        assert_eq!(
            f.slots(),
            &[LETTER_V, DIGITS[3] ^ DECIMAL_POINT, DIGITS[3], DIGITS[0], EMPTY]
        );

        f.three(LETTER_D, -1, None);
        assert_eq!(f.slots(), &[LETTER_D, EMPTY, MINUS, DIGITS[1], EMPTY]);

        f.three(LETTER_D, -42, None);
        assert_eq!(f.slots(), &[LETTER_D, MINUS, DIGITS[4], DIGITS[2], EMPTY]);

        f.three(LETTER_T, 42, None);
        assert_eq!(f.slots(), &[LETTER_T, EMPTY, DIGITS[4], DIGITS[2], EMPTY]);

        f.three(LETTER_T, 1500, None);
        assert_eq!(f.slots()[1..4], [DIGITS[9], DIGITS[9], DIGITS[9]]);
    }

    #[test]
    fn hex_digits() {
        let mut f = Frame::blank();
        f.hex(0x1E, LOW_POS);
        assert_eq!(f.slots()[2], DIGITS[1]);
        assert_eq!(f.slots()[3], LETTER_E);
    }

    #[test]
    fn refresh_walks_every_slot() {
        let display = Display::new();
        let mut f = Frame::blank();
        f.text([DIGITS[1], DIGITS[2], DIGITS[3], DIGITS[4], COLON]);
        display.show(&f);

        let mut digits = SimDigits::default();
        for expected in 0..SLOTS as u8 {
            display.refresh(&mut digits);
            assert_eq!(digits.selected, Some(expected));
            assert_eq!(digits.segments, f.slots()[usize::from(expected)]);
            display.blank(&mut digits);
            assert_eq!(digits.selected, None);
        }
        display.refresh(&mut digits);
        assert_eq!(digits.selected, Some(0));
    }

    #[test]
    fn brightness_waits_for_blank() {
        let display = Display::new();
        let mut digits = SimDigits::default();
        assert_eq!(display.blank(&mut digits), None);

        display.set_brightness(0);
        assert_eq!(display.blank_compare(), BLANK_COMPARE[5]);
        display.refresh(&mut digits);
        assert_eq!(display.blank_compare(), BLANK_COMPARE[5]);

        assert_eq!(display.blank(&mut digits), Some(BLANK_COMPARE[0]));
        assert_eq!(display.blank_compare(), BLANK_COMPARE[0]);
        assert_eq!(display.blank(&mut digits), None);
    }

    #[test]
    fn brightness_level_is_clamped() {
        let display = Display::new();
        let mut digits = SimDigits::default();
        display.set_brightness(200);
        assert_eq!(display.blank(&mut digits), None);
    }
}
