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
//! Idle power-off.

use crate::config::{BUTTON_MASK, ENCODER_A, ENCODER_B, IDLE_POWER_OFF_POLLS};
use crate::input::{Buttons, Sample};

/// Counts consecutive idle samples.
#[derive(Debug, Default)]
pub struct IdleTimer {
    polls: u16,
}

impl IdleTimer {
    pub const fn new() -> Self {
        Self { polls: 0 }
    }

    /// Records one sample.  Returns true when the idle timeout is reached.
    /// A running exposure never counts as idle.
    pub fn record(&mut self, sample: &Sample, running: bool) -> bool {
        if running || !sample.is_idle() {
            self.polls = 0;
            return false;
        }
        self.polls = self.polls.saturating_add(1);
        self.polls >= IDLE_POWER_OFF_POLLS
    }

    pub fn reset(&mut self) {
        self.polls = 0;
    }
}

/// START and SET held together switches the unit off.
pub const fn is_power_off_gesture(buttons: Buttons) -> bool {
    buttons.contains(Buttons::HOLD) && buttons.contains(Buttons::START) && buttons.contains(Buttons::SET)
}

/// Whether a pin change on port C should end power-down: a button went
/// down or the encoder moved.  `before` and `after` are PINC around the
/// sleep.  Button releases alone keep the unit asleep.
pub const fn is_wake(before: u8, after: u8) -> bool {
    let encoder = ENCODER_A | ENCODER_B;
    after & BUTTON_MASK != BUTTON_MASK || (before ^ after) & encoder != 0
}
