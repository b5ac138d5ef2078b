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
//! Button and encoder sampling.
//!
//! Buttons are polled every 48 ms.  A tap is reported when the button is
//! released; holding it for [`REPEAT_THRESHOLD`] samples reports a HOLD
//! instead, and nothing more until every button is up again.
//!
//! The encoder is decoded in the pin-change interrupt by
//! [`QuadratureDecoder`] and collected once per sample.  Turning it while
//! SELECT or SET is held produces a synthetic gesture in place of both the
//! button event and the rotation.

use core::convert::Infallible;
use core::ops::{BitAnd, BitOr, BitOrAssign, Not};
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::config::{ENCODER_BLACKOUT_TICKS, REPEAT_THRESHOLD, STEPS_PER_DETENT, SUBTICKS_PER_POLL};
use crate::hal::InputLines;

/// Button event bits, physical and synthetic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ufmt::derive::uDebug)]
pub struct Buttons(u8);

impl Buttons {
    pub const NONE: Buttons = Buttons(0);
    pub const START: Buttons = Buttons(0x01);
    pub const SELECT: Buttons = Buttons(0x02);
    pub const SET: Buttons = Buttons(0x04);
    pub const HOLD: Buttons = Buttons(0x08);
    pub const BACK: Buttons = Buttons(0x10);
    pub const BRIGHT_DOWN: Buttons = Buttons(0x20);
    pub const BRIGHT_UP: Buttons = Buttons(0x40);
    pub const ENC: Buttons = Buttons(0x80);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Buttons(bits)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// All bits of `other` are set.
    pub const fn contains(self, other: Buttons) -> bool {
        self.0 & other.0 == other.0
    }

    /// Any bit of `other` is set.
    pub const fn intersects(self, other: Buttons) -> bool {
        self.0 & other.0 != 0
    }

    pub fn remove(&mut self, other: Buttons) {
        self.0 &= !other.0;
    }
}

impl BitOr for Buttons {
    type Output = Buttons;
    fn bitor(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    fn bitor_assign(&mut self, rhs: Buttons) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Buttons;
    fn bitand(self, rhs: Buttons) -> Buttons {
        Buttons(self.0 & rhs.0)
    }
}

impl Not for Buttons {
    type Output = Buttons;
    fn not(self) -> Buttons {
        Buttons(!self.0)
    }
}

/// One poll's worth of input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    pub buttons: Buttons,
    pub encoder: i8,
}

impl Sample {
    pub const IDLE: Sample = Sample {
        buttons: Buttons::NONE,
        encoder: 0,
    };

    pub const fn is_idle(&self) -> bool {
        self.buttons.is_empty() && self.encoder == 0
    }
}

/// Tap/hold detection over the down set of all buttons at once.
#[derive(Debug, Default)]
pub struct Debouncer {
    down: Buttons,
    held: u8,
    latched: bool,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            down: Buttons::NONE,
            held: 0,
            latched: false,
        }
    }

    /// Feeds the buttons down at this sample and returns the events.
    pub fn update(&mut self, down: Buttons) -> Buttons {
        if self.latched {
            self.down = down;
            if down.is_empty() {
                self.latched = false;
                self.held = 0;
            }
            return Buttons::NONE;
        }

        if down != self.down {
            let released = self.down & !down;
            self.down = down;
            self.held = if down.is_empty() { 0 } else { 1 };
            return released;
        }

        if down.is_empty() {
            return Buttons::NONE;
        }
        self.held = self.held.saturating_add(1);
        if self.held >= REPEAT_THRESHOLD {
            self.latched = true;
            return Buttons::HOLD | down;
        }
        Buttons::NONE
    }

    /// Swallows everything until all buttons are released.
    pub fn suppress(&mut self, down: Buttons) {
        self.down = down;
        self.latched = !down.is_empty();
        self.held = 0;
    }
}

// Indexed by (previous AB << 2) | current AB.  00 -> 01 -> 11 -> 10 is
// clockwise.
const TRANSITIONS: [i8; 16] = [0, 1, -1, 0, -1, 0, 0, 1, 1, 0, 0, -1, 0, -1, 1, 0];

/// Quadrature decoder fed from the pin-change interrupt.
#[derive(Debug, Default)]
pub struct QuadratureDecoder {
    history: u8,
    cycle: i8,
    detents: i8,
    last_detent: Option<u16>,
}

impl QuadratureDecoder {
    pub const fn new() -> Self {
        Self {
            history: 0,
            cycle: 0,
            detents: 0,
            last_detent: None,
        }
    }

    /// Records an edge.  `now` is a free-running timer count used for the
    /// blackout after each detent.
    pub fn edge(&mut self, a: bool, b: bool, now: u16) {
        let state = (u8::from(a) << 1) | u8::from(b);
        self.history = ((self.history << 2) | state) & 0x0F;

        if let Some(last) = self.last_detent {
            if now.wrapping_sub(last) < ENCODER_BLACKOUT_TICKS {
                return;
            }
        }

        self.cycle += TRANSITIONS[usize::from(self.history)];
        if self.cycle >= STEPS_PER_DETENT {
            self.detents = self.detents.saturating_add(1);
        } else if self.cycle <= -STEPS_PER_DETENT {
            self.detents = self.detents.saturating_sub(1);
        } else {
            return;
        }
        self.cycle = 0;
        self.last_detent = Some(now);
    }

    /// Detents since the last call.
    pub fn take(&mut self) -> i8 {
        core::mem::take(&mut self.detents)
    }
}

/// Raised by the timebase interrupt every [`SUBTICKS_PER_POLL`] subticks.
pub struct PollTimer {
    count: AtomicU8,
    ready: AtomicBool,
}

impl Default for PollTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl PollTimer {
    pub const fn new() -> Self {
        Self {
            count: AtomicU8::new(0),
            ready: AtomicBool::new(false),
        }
    }

    pub fn on_subtick(&self) {
        let next = self.count.load(Ordering::Relaxed) + 1;
        if next >= SUBTICKS_PER_POLL {
            self.count.store(0, Ordering::Relaxed);
            self.ready.store(true, Ordering::Release);
        } else {
            self.count.store(next, Ordering::Relaxed);
        }
    }

    /// Consumes the ready flag.
    pub fn take(&self) -> bool {
        if self.ready.load(Ordering::Acquire) {
            self.ready.store(false, Ordering::Release);
            true
        } else {
            false
        }
    }
}

pub struct Sampler<'a> {
    timer: &'a PollTimer,
    debounce: Debouncer,
    reversed: bool,
}

impl<'a> Sampler<'a> {
    pub fn new(timer: &'a PollTimer) -> Self {
        Self {
            timer,
            debounce: Debouncer::new(),
            reversed: false,
        }
    }

    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    /// Forgets any button in progress, e.g. the one that woke the chip.
    pub fn reset<L: InputLines>(&mut self, lines: &mut L) {
        let down = lines.buttons();
        let _ = lines.take_encoder();
        self.debounce.suppress(down);
    }

    /// Returns the next sample once the poll timer has fired.
    pub fn poll<L: InputLines>(&mut self, lines: &mut L) -> nb::Result<Sample, Infallible> {
        if !self.timer.take() {
            return Err(nb::Error::WouldBlock);
        }
        let down = lines.buttons();
        let mut delta = lines.take_encoder();
        if self.reversed {
            delta = delta.saturating_neg();
        }
        Ok(self.compose(down, delta))
    }

    fn compose(&mut self, down: Buttons, encoder: i8) -> Sample {
        if encoder != 0 {
            let gesture = if down.contains(Buttons::SELECT) {
                Buttons::BACK
            } else if down.contains(Buttons::SET) {
                if encoder > 0 {
                    Buttons::BRIGHT_UP
                } else {
                    Buttons::BRIGHT_DOWN
                }
            } else {
                Buttons::NONE
            };
            if !gesture.is_empty() {
                self.debounce.suppress(down);
                return Sample {
                    buttons: gesture,
                    encoder: 0,
                };
            }
        }
        Sample {
            buttons: self.debounce.update(down),
            encoder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimLines;

    fn run(debouncer: &mut Debouncer, down: Buttons, samples: usize) -> Buttons {
        let mut seen = Buttons::NONE;
        for _ in 0..samples {
            seen |= debouncer.update(down);
        }
        seen
    }

    #[test]
    fn tap_reported_on_release() {
        let mut d = Debouncer::new();
        assert_eq!(d.update(Buttons::SET), Buttons::NONE);
        assert_eq!(d.update(Buttons::SET), Buttons::NONE);
        assert_eq!(d.update(Buttons::NONE), Buttons::SET);
        assert_eq!(d.update(Buttons::NONE), Buttons::NONE);
    }

    #[test]
    fn hold_at_threshold_then_silent_release() {
        let mut d = Debouncer::new();
        let before = run(&mut d, Buttons::START, usize::from(REPEAT_THRESHOLD) - 1);
        assert_eq!(before, Buttons::NONE);
        assert_eq!(d.update(Buttons::START), Buttons::HOLD | Buttons::START);
        assert_eq!(run(&mut d, Buttons::START, 40), Buttons::NONE);
        assert_eq!(d.update(Buttons::NONE), Buttons::NONE);
        // The next press is a fresh tap.
        d.update(Buttons::START);
        assert_eq!(d.update(Buttons::NONE), Buttons::START);
    }

    #[test]
    fn release_just_before_threshold_is_a_tap() {
        let mut d = Debouncer::new();
        let held = run(&mut d, Buttons::SELECT, usize::from(REPEAT_THRESHOLD) - 1);
        assert_eq!(held, Buttons::NONE);
        assert_eq!(d.update(Buttons::NONE), Buttons::SELECT);
    }

    #[test]
    fn chord_hold_reports_both() {
        let mut d = Debouncer::new();
        let both = Buttons::START | Buttons::SET;
        let seen = run(&mut d, both, usize::from(REPEAT_THRESHOLD));
        assert_eq!(seen, Buttons::HOLD | both);
    }

    #[test]
    fn short_taps_do_not_accumulate_into_a_hold() {
        let mut d = Debouncer::new();
        for _ in 0..4 {
            let seen = run(&mut d, Buttons::SET, 10);
            assert!(!seen.contains(Buttons::HOLD));
            assert_eq!(d.update(Buttons::NONE), Buttons::SET);
        }
    }

    fn feed(dec: &mut QuadratureDecoder, states: &[(bool, bool)], mut now: u16) -> u16 {
        for &(a, b) in states {
            now = now.wrapping_add(ENCODER_BLACKOUT_TICKS);
            dec.edge(a, b, now);
        }
        now
    }

    const CW: [(bool, bool); 4] = [(false, true), (true, true), (true, false), (false, false)];
    const CCW: [(bool, bool); 4] = [(true, false), (true, true), (false, true), (false, false)];

    #[test]
    fn full_cycles_make_detents() {
        let mut dec = QuadratureDecoder::new();
        let now = feed(&mut dec, &CW, 0);
        assert_eq!(dec.take(), 1);
        assert_eq!(dec.take(), 0);

        let now = feed(&mut dec, &CCW, now);
        feed(&mut dec, &CCW, now);
        assert_eq!(dec.take(), -2);
    }

    #[test]
    fn half_cycle_is_not_a_detent() {
        let mut dec = QuadratureDecoder::new();
        feed(&mut dec, &CW[..2], 0);
        assert_eq!(dec.take(), 0);
    }

    #[test]
    fn bounce_after_detent_is_ignored() {
        let mut dec = QuadratureDecoder::new();
        let now = feed(&mut dec, &CW, 0);
        assert_eq!(dec.take(), 1);
        // Contact bounce right after the detent.
        dec.edge(false, true, now.wrapping_add(1));
        dec.edge(false, false, now.wrapping_add(2));
        dec.edge(false, true, now.wrapping_add(3));
        dec.edge(false, false, now.wrapping_add(4));
        assert_eq!(dec.take(), 0);
        feed(&mut dec, &CW, now);
        assert_eq!(dec.take(), 1);
    }

    #[test]
    fn poll_waits_for_timer() {
        let timer = PollTimer::new();
        let mut sampler = Sampler::new(&timer);
        let mut lines = SimLines::default();
        assert_eq!(sampler.poll(&mut lines), Err(nb::Error::WouldBlock));
        for _ in 0..SUBTICKS_PER_POLL {
            timer.on_subtick();
        }
        assert_eq!(sampler.poll(&mut lines), Ok(Sample::IDLE));
        assert_eq!(sampler.poll(&mut lines), Err(nb::Error::WouldBlock));
    }

    fn sample(sampler: &mut Sampler, timer: &PollTimer, lines: &mut SimLines) -> Sample {
        for _ in 0..SUBTICKS_PER_POLL {
            timer.on_subtick();
        }
        match sampler.poll(lines) {
            Ok(s) => s,
            Err(_) => panic!("poll timer did not fire"),
        }
    }

    #[test]
    fn select_and_turn_is_back() {
        let timer = PollTimer::new();
        let mut sampler = Sampler::new(&timer);
        let mut lines = SimLines::default();

        lines.down = Buttons::SELECT;
        assert_eq!(sample(&mut sampler, &timer, &mut lines), Sample::IDLE);
        lines.encoder = 1;
        let s = sample(&mut sampler, &timer, &mut lines);
        assert_eq!(s.buttons, Buttons::BACK);
        assert_eq!(s.encoder, 0);

        lines.down = Buttons::NONE;
        assert_eq!(sample(&mut sampler, &timer, &mut lines), Sample::IDLE);
    }

    #[test]
    fn set_and_turn_adjusts_brightness() {
        let timer = PollTimer::new();
        let mut sampler = Sampler::new(&timer);
        let mut lines = SimLines::default();

        lines.down = Buttons::SET;
        lines.encoder = -1;
        assert_eq!(sample(&mut sampler, &timer, &mut lines).buttons, Buttons::BRIGHT_DOWN);
        lines.encoder = 2;
        assert_eq!(sample(&mut sampler, &timer, &mut lines).buttons, Buttons::BRIGHT_UP);
        lines.down = Buttons::NONE;
        assert_eq!(sample(&mut sampler, &timer, &mut lines), Sample::IDLE);
    }

    #[test]
    fn reversed_encoder() {
        let timer = PollTimer::new();
        let mut sampler = Sampler::new(&timer);
        sampler.set_reversed(true);
        let mut lines = SimLines::default();
        lines.encoder = 3;
        assert_eq!(sample(&mut sampler, &timer, &mut lines).encoder, -3);
    }

    #[test]
    fn reset_swallows_the_wake_button() {
        let timer = PollTimer::new();
        let mut sampler = Sampler::new(&timer);
        let mut lines = SimLines::default();
        lines.down = Buttons::START;
        sampler.reset(&mut lines);
        assert_eq!(sample(&mut sampler, &timer, &mut lines), Sample::IDLE);
        lines.down = Buttons::NONE;
        assert_eq!(sample(&mut sampler, &timer, &mut lines), Sample::IDLE);
    }
}
