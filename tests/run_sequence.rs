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
//! Whole-unit runs: timebase, sampler and controller driven together the
//! way the board's interrupts and main loop drive them.

use astrotimer::config::{BLANK_COMPARE, SUBTICKS_PER_POLL, SUBTICKS_PER_SECOND};
use astrotimer::controller::Outcome;
use astrotimer::sim::{Event, MemStore, SimBoard, SimDigits, SimLines};
use astrotimer::{Buttons, Clock, Controller, Display, PollTimer, Sampler, Settings, State};

struct Rig<'a> {
    clock: &'a Clock,
    poll: &'a PollTimer,
    display: &'a Display,
    lines: SimLines,
    sampler: Sampler<'a>,
    controller: Controller<'a, SimBoard>,
    states: Vec<State>,
    subticks: u32,
    // Subtick of every shutter edge and the level it went to.
    shutter: Vec<(u32, bool)>,
}

impl<'a> Rig<'a> {
    fn new(clock: &'a Clock, poll: &'a PollTimer, display: &'a Display, board: SimBoard) -> Self {
        let mut lines = SimLines::default();
        let mut sampler = Sampler::new(poll);
        sampler.reset(&mut lines);
        Self {
            clock,
            poll,
            display,
            lines,
            sampler,
            controller: Controller::new(clock, display, board),
            states: Vec::new(),
            subticks: 0,
            shutter: Vec::new(),
        }
    }

    /// One timebase interrupt plus whatever the main loop does after it.
    fn subtick(&mut self) -> Option<Outcome> {
        self.subticks += 1;
        self.clock.on_subtick();
        self.poll.on_subtick();
        let sample = self.sampler.poll(&mut self.lines).ok()?;
        let outcome = self.controller.step(sample);
        if outcome == Outcome::Suspended {
            self.sampler.reset(&mut self.lines);
        }
        let open = self.controller.board().shutter;
        if self.shutter.last().map_or(false, |e| e.1) != open {
            self.shutter.push((self.subticks, open));
        }
        let state = self.controller.state();
        if self.states.last() != Some(&state) {
            self.states.push(state);
        }
        Some(outcome)
    }

    /// Runs until `n` samples have been taken.
    fn samples(&mut self, n: usize) -> Vec<Outcome> {
        let mut out = Vec::new();
        while out.len() < n {
            if let Some(outcome) = self.subtick() {
                out.push(outcome);
            }
        }
        out
    }

    fn seconds(&mut self, secs: usize) {
        for _ in 0..secs * usize::from(SUBTICKS_PER_SECOND) {
            self.subtick();
        }
    }

    fn tap(&mut self, buttons: Buttons) {
        self.lines.down = buttons;
        self.samples(1);
        self.lines.down = Buttons::NONE;
        self.samples(1);
    }
}

#[test]
fn three_shot_sequence() {
    let (clock, poll, display) = (Clock::new(), PollTimer::new(), Display::new());
    let mut rig = Rig::new(&clock, &poll, &display, SimBoard::new());
    {
        let s = rig.controller.settings_mut();
        s.count = 3;
        s.exposure_min = 0;
        s.exposure_sec = 2;
        s.delay_min = 0;
        s.delay_sec = 1;
        s.mlu = 0;
    }

    rig.tap(Buttons::START);
    assert!(rig.controller.state().is_running());

    // 3 x 2 s exposures and 2 x 1 s delays, with slack.
    rig.seconds(12);

    let board = rig.controller.board();
    assert_eq!(board.exposures(), 3);
    assert!(!board.shutter);
    assert_eq!(rig.controller.state(), State::Time);
    let waits = rig.states.iter().filter(|s| **s == State::Wait).count();
    assert_eq!(waits, 2);
    assert!(board.console.as_str().contains("run: done"));

    // Edges land on sample boundaries, so allow one poll either way.
    let close = |actual: u32, secs: u32| {
        let want = secs * u32::from(SUBTICKS_PER_SECOND);
        actual.abs_diff(want) <= u32::from(SUBTICKS_PER_POLL)
    };
    assert_eq!(rig.shutter.len(), 6);
    for (i, pair) in rig.shutter.windows(2).enumerate() {
        let ((from, level), (to, _)) = (pair[0], pair[1]);
        assert_eq!(level, i % 2 == 0);
        let secs = if level { 2 } else { 1 };
        assert!(close(to - from, secs), "edge {} lasted {} subticks", i, to - from);
    }
}

#[test]
fn start_cancels_a_running_exposure() {
    let (clock, poll, display) = (Clock::new(), PollTimer::new(), Display::new());
    let mut rig = Rig::new(&clock, &poll, &display, SimBoard::new());
    rig.controller.settings_mut().count = 1;

    rig.tap(Buttons::START);
    rig.seconds(1);
    assert_eq!(rig.controller.state(), State::RunAuto);
    assert!(rig.controller.board().shutter);

    rig.tap(Buttons::START);
    assert_eq!(rig.controller.state(), State::Time);
    assert!(!rig.controller.board().shutter);
    assert_eq!(
        rig.controller.board().events.as_slice(),
        &[Event::Shutter(true), Event::Shutter(false)]
    );
}

#[test]
fn holding_start_and_set_sleeps() {
    let (clock, poll, display) = (Clock::new(), PollTimer::new(), Display::new());
    let mut rig = Rig::new(&clock, &poll, &display, SimBoard::new());

    rig.lines.down = Buttons::START | Buttons::SET;
    let outcomes = rig.samples(30);
    assert!(outcomes.contains(&Outcome::Suspended));
    assert_eq!(rig.controller.board().sleeps, 1);

    // Releasing after wake-up is not taken as a tap.
    rig.lines.down = Buttons::NONE;
    rig.samples(3);
    assert_eq!(rig.controller.state(), State::Time);
    assert_eq!(rig.controller.board().sleeps, 1);
}

#[test]
fn saved_settings_come_back() {
    let mut store = MemStore::erased();
    let settings = Settings {
        count: 7,
        brightness: 4,
        ..Settings::default()
    };
    assert!(settings.save(&mut store).is_ok());

    let (clock, poll, display) = (Clock::new(), PollTimer::new(), Display::new());
    let rig = Rig::new(&clock, &poll, &display, SimBoard::with_store(store));
    assert_eq!(rig.controller.settings().count, 7);
    assert_eq!(rig.display.blank(&mut SimDigits::default()), Some(BLANK_COMPARE[4]));
    assert_eq!(display.blank_compare(), BLANK_COMPARE[4]);
    assert!(rig.controller.board().console.as_str().is_empty());
}

#[test]
fn display_scans_every_slot() {
    let (clock, poll, display) = (Clock::new(), PollTimer::new(), Display::new());
    let mut rig = Rig::new(&clock, &poll, &display, SimBoard::new());
    rig.samples(1);

    let mut digits = SimDigits::default();
    let mut seen = [false; 5];
    for _ in 0..5 {
        display.refresh(&mut digits);
        if let Some(i) = digits.selected {
            seen[usize::from(i)] = true;
        }
        display.blank(&mut digits);
        assert_eq!(digits.selected, None);
    }
    assert!(seen.iter().all(|s| *s));
}
