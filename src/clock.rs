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
//! One-second up/down counter.
//!
//! The counter is advanced from the timebase interrupt and read/written by
//! the controller.  Every field is its own byte-sized atomic, written with
//! plain loads and stores only: the AVR has no compare-and-swap, and the
//! controller never needs two fields to change together.

use core::sync::atomic::{AtomicBool, AtomicI8, AtomicU8, Ordering};

use crate::config::SUBTICKS_PER_SECOND;

/// Which way the clock is counting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
pub enum Direction {
    Down,
    Stopped,
    Up,
}

impl Direction {
    const fn to_raw(self) -> i8 {
        match self {
            Direction::Down => -1,
            Direction::Stopped => 0,
            Direction::Up => 1,
        }
    }

    const fn from_raw(raw: i8) -> Self {
        match raw {
            r if r < 0 => Direction::Down,
            0 => Direction::Stopped,
            _ => Direction::Up,
        }
    }
}

pub struct Clock {
    minutes: AtomicI8,
    seconds: AtomicI8,
    direction: AtomicI8,
    enabled: AtomicBool,
    // Subticks since the last second boundary.
    phase: AtomicU8,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub const fn new() -> Self {
        Self {
            minutes: AtomicI8::new(0),
            seconds: AtomicI8::new(0),
            direction: AtomicI8::new(0),
            enabled: AtomicBool::new(false),
            phase: AtomicU8::new(0),
        }
    }

    pub fn minutes(&self) -> i8 {
        self.minutes.load(Ordering::Relaxed)
    }

    pub fn seconds(&self) -> i8 {
        self.seconds.load(Ordering::Relaxed)
    }

    pub fn direction(&self) -> Direction {
        Direction::from_raw(self.direction.load(Ordering::Relaxed))
    }

    pub fn set_minutes(&self, minutes: i8) {
        self.minutes.store(minutes, Ordering::Relaxed);
    }

    pub fn set_seconds(&self, seconds: i8) {
        self.seconds.store(seconds, Ordering::Relaxed);
    }

    pub fn set_direction(&self, direction: Direction) {
        self.direction.store(direction.to_raw(), Ordering::Relaxed);
    }

    /// Loads all three fields.  Only call while the clock is stopped.
    pub fn load(&self, minutes: i8, seconds: i8, direction: Direction) {
        self.set_minutes(minutes);
        self.set_seconds(seconds);
        self.set_direction(direction);
    }

    /// Resets the sub-second phase and enables ticking.
    pub fn start(&self) {
        self.phase.store(0, Ordering::Relaxed);
        self.enabled.store(true, Ordering::Release);
    }

    pub fn stop(&self) {
        self.enabled.store(false, Ordering::Release);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// True once a countdown has run out.
    pub fn elapsed(&self) -> bool {
        self.direction() == Direction::Stopped
    }

    /// Called from the timebase interrupt at `SUBTICKS_PER_SECOND`.  The
    /// phase keeps running while disabled since it also drives blinking.
    pub fn on_subtick(&self) {
        let next = self.phase.load(Ordering::Relaxed) + 1;
        if next < SUBTICKS_PER_SECOND {
            self.phase.store(next, Ordering::Relaxed);
            return;
        }
        self.phase.store(0, Ordering::Relaxed);
        if self.is_enabled() {
            self.tick();
        }
    }

    /// Advances the counter by one second.
    pub fn tick(&self) {
        let mut min = self.minutes();
        let mut sec = self.seconds();
        match self.direction() {
            Direction::Stopped => return,
            Direction::Up => {
                sec += 1;
                if sec >= 60 {
                    sec = 0;
                    min += 1;
                    if min >= 100 {
                        min = 0;
                    }
                }
            }
            Direction::Down => {
                if sec == 0 {
                    if min > 0 {
                        sec = 59;
                        min -= 1;
                    } else {
                        self.set_direction(Direction::Stopped);
                    }
                } else {
                    sec -= 1;
                    if sec == 0 && min == 0 {
                        self.set_direction(Direction::Stopped);
                    }
                }
            }
        }
        self.set_seconds(sec);
        self.set_minutes(min);
    }

    /// Blink phase.  Bit 7 toggles once a second, bit 6 twice.
    pub fn phase(&self) -> u8 {
        self.phase.load(Ordering::Relaxed).wrapping_mul(2)
    }

    pub fn reset_phase(&self) {
        self.phase.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_stops_at_zero() {
        let clock = Clock::new();
        clock.load(0, 3, Direction::Down);
        clock.start();
        for _ in 0..3 {
            clock.tick();
        }
        assert_eq!(clock.direction(), Direction::Stopped);
        assert_eq!((clock.minutes(), clock.seconds()), (0, 0));

        clock.tick();
        assert_eq!(clock.direction(), Direction::Stopped);
        assert_eq!((clock.minutes(), clock.seconds()), (0, 0));
    }

    #[test]
    fn countdown_borrows_from_minutes() {
        let clock = Clock::new();
        clock.load(2, 0, Direction::Down);
        clock.tick();
        assert_eq!((clock.minutes(), clock.seconds()), (1, 59));
        assert_eq!(clock.direction(), Direction::Down);
    }

    #[test]
    fn countdown_from_zero_stops_on_first_tick() {
        let clock = Clock::new();
        clock.load(0, 0, Direction::Down);
        clock.tick();
        assert!(clock.elapsed());
    }

    #[test]
    fn count_up_carries_and_wraps() {
        let clock = Clock::new();
        clock.load(0, 59, Direction::Up);
        clock.tick();
        assert_eq!((clock.minutes(), clock.seconds()), (1, 0));

        clock.load(99, 59, Direction::Up);
        clock.tick();
        assert_eq!((clock.minutes(), clock.seconds()), (0, 0));
        assert_eq!(clock.direction(), Direction::Up);
    }

    #[test]
    fn subticks_only_count_while_enabled() {
        let clock = Clock::new();
        clock.load(0, 5, Direction::Down);
        for _ in 0..SUBTICKS_PER_SECOND {
            clock.on_subtick();
        }
        assert_eq!(clock.seconds(), 5);

        clock.start();
        for _ in 0..SUBTICKS_PER_SECOND {
            clock.on_subtick();
        }
        assert_eq!(clock.seconds(), 4);

        clock.stop();
        for _ in 0..SUBTICKS_PER_SECOND {
            clock.on_subtick();
        }
        assert_eq!(clock.seconds(), 4);
    }

    #[test]
    fn phase_blink_bits() {
        let clock = Clock::new();
        assert_eq!(clock.phase() & 0x80, 0);
        for _ in 0..64 {
            clock.on_subtick();
        }
        assert_ne!(clock.phase() & 0x80, 0);
        clock.reset_phase();
        assert_eq!(clock.phase(), 0);
    }

    #[test]
    fn start_resets_phase() {
        let clock = Clock::new();
        for _ in 0..100 {
            clock.on_subtick();
        }
        clock.start();
        assert_eq!(clock.phase(), 0);
    }
}
