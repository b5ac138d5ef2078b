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
//! Menu and run state machine.
//!
//! [`Controller::step`] consumes one input sample, runs the state machine and
//! publishes the resulting frame.  A state that hands over to another one
//! within the same sample returns [`Flow::Redispatch`] and the new state is
//! evaluated straight away, up to [`MAX_REDISPATCH`] times.
//!
//! Menu layout:
//!
//! ```text
//!   Time -> Delay -> Count -> Mlu -> Options -> (Time)
//!                                       |
//!   Brightness -> HalfPress -> EncoderDir -> Power -> Temperature -> Signature
//! ```
//!
//! A run goes RunPrime -> [HpressWait] -> [MluPrime -> MluWait] ->
//! RunAuto | RunManual, then Wait -> RunPrime for every further shot.

use ufmt::uwriteln;

use crate::clock::{Clock, Direction};
use crate::config::{
    HALF_PRESS_SECS, MAX_REDISPATCH, SAVED_ACK_POLLS, SIGNATURE_LAST,
};
use crate::display::glyph::{
    APOS, COLON, EMPTY, LETTER_A, LETTER_B, LETTER_C, LETTER_D, LETTER_E, LETTER_H, LETTER_L,
    LETTER_O, LETTER_P, LETTER_S, LETTER_T, LETTER_V, LETTER_V_LOWER, MINUS,
};
use crate::display::{Blink, Display, Frame, NumStyle, EXTRA_POS, HIGH_POS, LOW_POS};
use crate::hal::Board;
use crate::input::{Buttons, Sample};
use crate::power::{is_power_off_gesture, IdleTimer};
use crate::settings::{
    Settings, BRIGHTNESS_MAX, COUNT_MAX, COUNT_MIN, MINUTES_MAX, MLU_MAX, SECONDS_MAX,
};
use crate::stops;

/// Accumulated values above this are treated as underflow and reset.
const SNAP_THRESHOLD: u8 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ufmt::derive::uDebug)]
pub enum State {
    Time,
    Delay,
    Count,
    Mlu,
    Options,

    Brightness,
    HalfPress,
    EncoderDir,
    Power,
    Temperature,
    Signature,
    Saved,

    TimeSetMins,
    TimeSetSecs,
    DelaySetMins,
    DelaySetSecs,
    CountSet,
    MluSet,

    RunPrime,
    HpressWait,
    MluPrime,
    MluWait,
    RunAuto,
    RunManual,
    Wait,
}

const MAIN_MENU: [State; 5] = [
    State::Time,
    State::Delay,
    State::Count,
    State::Mlu,
    State::Options,
];

const OPTIONS_MENU: [State; 6] = [
    State::Brightness,
    State::HalfPress,
    State::EncoderDir,
    State::Power,
    State::Temperature,
    State::Signature,
];

impl State {
    pub const fn is_running(self) -> bool {
        matches!(
            self,
            State::RunPrime
                | State::HpressWait
                | State::MluPrime
                | State::MluWait
                | State::RunAuto
                | State::RunManual
                | State::Wait
        )
    }

    /// Browse states from which START begins a run.
    pub const fn starts_run(self) -> bool {
        matches!(self, State::Time | State::Delay | State::Count | State::Mlu)
    }

    const fn is_editing(self) -> bool {
        matches!(
            self,
            State::TimeSetMins
                | State::TimeSetSecs
                | State::DelaySetMins
                | State::DelaySetSecs
                | State::CountSet
                | State::MluSet
        )
    }
}

/// Next or previous entry of `menu`, wrapping around.
fn cycle(menu: &[State], current: State, forward: bool) -> State {
    let len = menu.len();
    let i = menu.iter().position(|&s| s == current).unwrap_or(0);
    let j = if forward { (i + 1) % len } else { (i + len - 1) % len };
    menu[j]
}

/// Applies one sample of edit input to `value`, kept within `min..max`.
/// Returns true when the sample commits the field.
///
/// Buttons wrap past the top back to `min`; the encoder stops at either
/// end.
fn edit_value(value: &mut u8, input: &Sample, min: u8, max: u8) -> bool {
    let buttons = input.buttons;
    let mut v = *value;
    if buttons.contains(Buttons::SELECT) {
        v = if buttons.contains(Buttons::HOLD) {
            min
        } else {
            v.saturating_add(10)
        };
    } else if buttons.contains(Buttons::START) {
        v = v.saturating_add(if buttons.contains(Buttons::HOLD) { 10 } else { 1 });
    }
    if input.encoder != 0 {
        let moved = i16::from(v) + i16::from(input.encoder);
        v = u8::try_from(moved.clamp(i16::from(min), i16::from(max) - 1)).unwrap_or(min);
    } else if v >= max {
        v = min;
    }
    if v > SNAP_THRESHOLD {
        v = min;
    }
    *value = v;
    buttons.intersects(Buttons::SET | Buttons::ENC)
}

/// One brightness step down, wrapping from the dimmest to the brightest.
fn dimmer(level: u8) -> u8 {
    if level == 0 { BRIGHTNESS_MAX } else { level - 1 }
}

/// A clock field as a display value.
fn clock_value(v: i8) -> u8 {
    u8::try_from(v).unwrap_or(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// The frame is complete, wait for the next sample.
    Render,
    /// The state changed, evaluate the new one with the same input.
    Redispatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// The unit slept and has just woken up.  Input in progress should be
    /// discarded.
    Suspended,
}

/// What a running exposure shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunView {
    TimeLeft,
    ShotsLeft,
}

pub struct Controller<'a, B: Board> {
    clock: &'a Clock,
    display: &'a Display,
    board: B,
    settings: Settings,
    frame: Frame,
    state: State,
    // Where a run returns to.
    resume: State,
    remaining: u8,
    view: RunView,
    first_shot: bool,
    // SAVE acknowledgment countdown and the option it returns to.
    ack: u8,
    ack_from: State,
    signature_index: u8,
    idle: IdleTimer,
}

impl<'a, B: Board> Controller<'a, B> {
    /// Loads the settings from the board's store and applies the saved
    /// brightness.
    pub fn new(clock: &'a Clock, display: &'a Display, mut board: B) -> Self {
        let (settings, repaired) = Settings::load(board.store());
        if repaired > 0 {
            let _ = uwriteln!(board.console(), "settings: {} field(s) reset to default", repaired);
        }
        display.set_brightness(settings.brightness);
        Self {
            clock,
            display,
            board,
            settings,
            frame: Frame::blank(),
            state: State::Time,
            resume: State::Time,
            remaining: 0,
            view: RunView::TimeLeft,
            first_shot: true,
            ack: 0,
            ack_from: State::Brightness,
            signature_index: 0,
            idle: IdleTimer::new(),
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn remaining(&self) -> u8 {
        self.remaining
    }

    pub fn view(&self) -> RunView {
        self.view
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Runs one controller cycle for `sample`.
    pub fn step(&mut self, sample: Sample) -> Outcome {
        let mut input = sample;

        if input.buttons.intersects(Buttons::BRIGHT_UP | Buttons::BRIGHT_DOWN) {
            let level = self.settings.brightness;
            self.settings.brightness = if input.buttons.contains(Buttons::BRIGHT_UP) {
                (level + 1).min(BRIGHTNESS_MAX)
            } else {
                level.saturating_sub(1)
            };
            self.display.set_brightness(self.settings.brightness);
            input.buttons.remove(Buttons::BRIGHT_UP | Buttons::BRIGHT_DOWN);
        }

        let running = self.state.is_running();
        if !running && is_power_off_gesture(input.buttons) {
            return self.suspend();
        }
        if self.idle.record(&sample, running) {
            return self.suspend();
        }

        if self.state.starts_run() && input.buttons.intersects(Buttons::START | Buttons::ENC) {
            self.start_run();
            input = Sample::IDLE;
        }

        self.settle(&mut input);
        if self.state.is_running() && self.run_keys(&input) {
            self.settle(&mut Sample::default());
        }
        self.display.show(&self.frame);
        Outcome::Continue
    }

    fn settle(&mut self, input: &mut Sample) {
        for _ in 0..MAX_REDISPATCH {
            self.frame = Frame::blank();
            if self.dispatch(input) == Flow::Render {
                return;
            }
        }
    }

    fn goto(&mut self, next: State) {
        if next != self.state {
            let _ = uwriteln!(self.board.console(), "state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Moves to `next` and drops the input that caused it.
    fn go(&mut self, next: State, input: &mut Sample) -> Flow {
        self.goto(next);
        *input = Sample::IDLE;
        Flow::Redispatch
    }

    fn dispatch(&mut self, input: &mut Sample) -> Flow {
        match self.state {
            State::Time | State::Delay | State::Count | State::Mlu | State::Options => {
                self.browse(input)
            }
            State::Brightness
            | State::HalfPress
            | State::EncoderDir
            | State::Power
            | State::Temperature
            | State::Signature => self.option(input),
            State::Saved => self.saved(),
            s if s.is_editing() => self.edit(input),
            _ => self.run(input),
        }
    }

    fn browse(&mut self, input: &mut Sample) -> Flow {
        let buttons = input.buttons;
        if buttons.contains(Buttons::SELECT) {
            return self.go(cycle(&MAIN_MENU, self.state, true), input);
        }
        if buttons.contains(Buttons::BACK) {
            return self.go(cycle(&MAIN_MENU, self.state, false), input);
        }
        if buttons.contains(Buttons::SET)
            || (self.state == State::Options && buttons.intersects(Buttons::START | Buttons::ENC))
        {
            let next = match self.state {
                State::Time => State::TimeSetMins,
                State::Delay => State::DelaySetMins,
                State::Count => State::CountSet,
                State::Mlu => State::MluSet,
                _ => State::Brightness,
            };
            return self.go(next, input);
        }

        let turn = input.encoder;
        let s = &mut self.settings;
        match self.state {
            State::Time if turn != 0 => s.set_exposure_seconds(stops::step(s.exposure_seconds(), turn)),
            State::Delay if turn != 0 => s.set_delay_seconds(stops::step(s.delay_seconds(), turn)),
            State::Count if turn != 0 => {
                edit_value(&mut s.count, &Sample { buttons: Buttons::NONE, encoder: turn }, COUNT_MIN, COUNT_MAX + 1);
            }
            State::Mlu if turn != 0 => {
                edit_value(&mut s.mlu, &Sample { buttons: Buttons::NONE, encoder: turn }, 0, MLU_MAX + 1);
            }
            _ => {}
        }

        self.render_setting(Blink::Steady, Blink::Steady);
        Flow::Render
    }

    /// Draws the setting behind the current browse or edit state.
    fn render_setting(&mut self, high: Blink, low: Blink) {
        let phase = self.clock.phase();
        let s = &self.settings;
        let f = &mut self.frame;
        match self.state {
            State::Time | State::TimeSetMins | State::TimeSetSecs => {
                let min_style = if self.state == State::Time {
                    NumStyle::PLAIN.stripped()
                } else {
                    NumStyle::PLAIN.blink(high)
                };
                f.num(s.exposure_min, HIGH_POS, min_style, phase);
                f.num(s.exposure_sec, LOW_POS, NumStyle::PLAIN.blink(low), phase);
                f.set(EXTRA_POS, COLON);
            }
            State::Delay | State::DelaySetMins | State::DelaySetSecs => {
                let min_style = if self.state == State::Delay {
                    NumStyle::PLAIN.stripped()
                } else {
                    NumStyle::PLAIN.blink(high)
                };
                f.num(s.delay_min, HIGH_POS, min_style.dot_ones(true), phase);
                f.num(s.delay_sec, LOW_POS, NumStyle::PLAIN.blink(low), phase);
                f.set(EXTRA_POS, EMPTY);
            }
            State::Count | State::CountSet => {
                f.alnum(LETTER_C, s.count, NumStyle::PLAIN.blink(low), false, phase)
            }
            State::Mlu | State::MluSet => {
                f.alnum(LETTER_L, s.mlu, NumStyle::PLAIN.blink(low), false, phase)
            }
            State::Options => f.text([LETTER_O, LETTER_P, LETTER_T, LETTER_S, EMPTY]),
            _ => {}
        }
    }

    fn edit(&mut self, input: &mut Sample) -> Flow {
        let browse = match self.state {
            State::TimeSetMins | State::TimeSetSecs => State::Time,
            State::DelaySetMins | State::DelaySetSecs => State::Delay,
            State::CountSet => State::Count,
            _ => State::Mlu,
        };
        if input.buttons.contains(Buttons::BACK) {
            return self.go(browse, input);
        }
        if !input.is_idle() {
            self.clock.reset_phase();
        }

        let s = &mut self.settings;
        let (commit, next) = match self.state {
            State::TimeSetMins => (
                edit_value(&mut s.exposure_min, input, 0, MINUTES_MAX + 1),
                State::TimeSetSecs,
            ),
            State::TimeSetSecs => (
                edit_value(&mut s.exposure_sec, input, 0, SECONDS_MAX + 1),
                State::Time,
            ),
            State::DelaySetMins => (
                edit_value(&mut s.delay_min, input, 0, MINUTES_MAX + 1),
                State::DelaySetSecs,
            ),
            State::DelaySetSecs => (
                edit_value(&mut s.delay_sec, input, 0, SECONDS_MAX + 1),
                State::Delay,
            ),
            State::CountSet => (
                edit_value(&mut s.count, input, COUNT_MIN, COUNT_MAX + 1),
                State::Count,
            ),
            _ => (edit_value(&mut s.mlu, input, 0, MLU_MAX + 1), State::Mlu),
        };
        if commit {
            return self.go(next, input);
        }

        match self.state {
            State::TimeSetMins | State::DelaySetMins => {
                self.render_setting(Blink::Fast, Blink::Steady)
            }
            _ => self.render_setting(Blink::Steady, Blink::Fast),
        }
        Flow::Render
    }

    fn option(&mut self, input: &mut Sample) -> Flow {
        let buttons = input.buttons;
        if buttons.contains(Buttons::SELECT) {
            return self.go(cycle(&OPTIONS_MENU, self.state, true), input);
        }
        if buttons.contains(Buttons::BACK) {
            return self.go(State::Options, input);
        }

        let turn = input.encoder;
        let step = buttons.contains(Buttons::SET);
        let phase = self.clock.phase();
        match self.state {
            State::Brightness => {
                let level = self.settings.brightness;
                let level = if turn != 0 {
                    u8::try_from((i16::from(level) + i16::from(turn)).clamp(0, i16::from(BRIGHTNESS_MAX)))
                        .unwrap_or(0)
                } else if step {
                    dimmer(level)
                } else {
                    level
                };
                self.settings.brightness = level;
                self.display.set_brightness(level);
                self.frame.alnum(LETTER_B, level + 1, NumStyle::PLAIN, false, phase);
            }
            State::HalfPress => {
                let mode = self.settings.half_press;
                self.settings.half_press = if turn < 0 {
                    mode.prev()
                } else if turn > 0 || step {
                    mode.next()
                } else {
                    mode
                };
                let shown = self.settings.half_press.to_byte();
                self.frame.alnum(LETTER_H, shown, NumStyle::PLAIN, false, phase);
            }
            State::EncoderDir => {
                if turn != 0 || step {
                    self.settings.encoder_reversed = !self.settings.encoder_reversed;
                }
                let sign = if self.settings.encoder_reversed { -1 } else { 1 };
                self.frame.three(LETTER_D, sign, None);
            }
            State::Power => match self.board.supply_centivolts() {
                Some(cv) => self.frame.three(LETTER_V_LOWER, i16::try_from(cv).unwrap_or(i16::MAX), Some(1)),
                None => self.frame.text([LETTER_V_LOWER, MINUS, MINUS, MINUS, EMPTY]),
            },
            State::Temperature => match self.board.temperature_raw() {
                Some(raw) => self.frame.three(LETTER_T, i16::try_from(raw).unwrap_or(i16::MAX), None),
                None => self.frame.text([LETTER_T, MINUS, MINUS, MINUS, EMPTY]),
            },
            _ => {
                let index = self.signature_index;
                self.signature_index = if turn != 0 {
                    u8::try_from((i16::from(index) + i16::from(turn)).clamp(0, i16::from(SIGNATURE_LAST)))
                        .unwrap_or(0)
                } else if step {
                    if index >= SIGNATURE_LAST { 0 } else { index + 1 }
                } else {
                    index
                };
                let byte = self.board.signature_byte(self.signature_index);
                self.frame.num(self.signature_index, HIGH_POS, NumStyle::PLAIN, phase);
                self.frame.hex(byte, LOW_POS);
                self.frame.set(EXTRA_POS, APOS);
            }
        }

        let savable = matches!(
            self.state,
            State::Brightness | State::HalfPress | State::EncoderDir
        );
        if savable && buttons.intersects(Buttons::START | Buttons::ENC) {
            return self.save(input);
        }
        Flow::Render
    }

    fn save(&mut self, input: &mut Sample) -> Flow {
        match self.settings.save(self.board.store()) {
            Ok(()) => {
                let _ = uwriteln!(self.board.console(), "settings: saved");
                self.ack = SAVED_ACK_POLLS;
                self.ack_from = self.state;
                self.go(State::Saved, input)
            }
            Err(_) => {
                let _ = uwriteln!(self.board.console(), "settings: save failed");
                Flow::Render
            }
        }
    }

    fn saved(&mut self) -> Flow {
        self.frame.text([LETTER_S, LETTER_A, LETTER_V, LETTER_E, EMPTY]);
        self.ack = self.ack.saturating_sub(1);
        if self.ack == 0 {
            self.goto(self.ack_from);
        }
        Flow::Render
    }

    fn start_run(&mut self) {
        self.resume = self.state;
        self.remaining = self.settings.count.max(1);
        self.view = RunView::TimeLeft;
        self.first_shot = true;
        let _ = uwriteln!(self.board.console(), "run: {} shot(s)", self.remaining);
        self.goto(State::RunPrime);
    }

    fn run(&mut self, input: &mut Sample) -> Flow {
        let phase = self.clock.phase();
        match self.state {
            State::RunPrime => {
                if self.settings.half_press.applies(self.first_shot) {
                    self.board.set_half_press(true);
                    self.clock.load(0, HALF_PRESS_SECS, Direction::Down);
                    self.clock.start();
                    self.goto(State::HpressWait);
                    return Flow::Redispatch;
                }
                self.after_focus()
            }
            State::HpressWait => {
                if self.clock.elapsed() {
                    self.clock.stop();
                    return self.after_focus();
                }
                let sec = clock_value(self.clock.seconds());
                self.frame.alnum(LETTER_H, sec, NumStyle::PLAIN, false, phase);
                self.frame
                    .set(EXTRA_POS, if Blink::Slow.hides(phase) { EMPTY } else { APOS });
                Flow::Render
            }
            State::MluPrime => {
                self.board.set_shutter(false);
                self.clock.load(0, self.settings.mlu as i8, Direction::Down);
                self.clock.start();
                self.goto(State::MluWait);
                Flow::Redispatch
            }
            State::MluWait => {
                if self.clock.elapsed() {
                    self.clock.stop();
                    self.begin_exposure();
                    return Flow::Redispatch;
                }
                let sec = clock_value(self.clock.seconds());
                self.frame.alnum(LETTER_L, sec, NumStyle::PLAIN, false, phase);
                Flow::Render
            }
            State::RunAuto if self.clock.elapsed() => self.finish_exposure(input),
            State::RunAuto | State::RunManual => {
                self.render_running(phase);
                Flow::Render
            }
            _ => {
                if self.clock.elapsed() {
                    self.clock.stop();
                    self.goto(State::RunPrime);
                    return Flow::Redispatch;
                }
                self.render_waiting(phase);
                Flow::Render
            }
        }
    }

    /// Continues a shot once any half-press is done: raise the mirror or
    /// go straight to the exposure.
    fn after_focus(&mut self) -> Flow {
        let mlu = self.settings.mlu;
        if mlu > 0 {
            self.board.set_shutter(true);
            self.goto(State::MluPrime);
            let phase = self.clock.phase();
            self.frame.alnum(LETTER_L, mlu, NumStyle::PLAIN, false, phase);
            return Flow::Render;
        }
        self.begin_exposure();
        Flow::Redispatch
    }

    fn begin_exposure(&mut self) {
        let s = &self.settings;
        if s.is_bulb() {
            self.clock.load(0, 0, Direction::Up);
            self.goto(State::RunManual);
        } else {
            self.clock
                .load(s.exposure_min as i8, s.exposure_sec as i8, Direction::Down);
            self.goto(State::RunAuto);
        }
        self.board.set_shutter(true);
        self.clock.start();
    }

    fn finish_exposure(&mut self, input: &mut Sample) -> Flow {
        self.clock.stop();
        self.release_outputs();
        self.first_shot = false;
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            let _ = uwriteln!(self.board.console(), "run: done");
            return self.go(self.resume, input);
        }
        let s = &self.settings;
        self.clock
            .load(s.delay_min as i8, s.delay_sec as i8, Direction::Down);
        self.goto(State::Wait);
        self.clock.start();
        Flow::Redispatch
    }

    fn release_outputs(&mut self) {
        self.board.set_shutter(false);
        self.board.set_half_press(false);
    }

    fn render_running(&mut self, phase: u8) {
        let f = &mut self.frame;
        match self.view {
            RunView::TimeLeft => {
                f.num(clock_value(self.clock.minutes()), HIGH_POS, NumStyle::PLAIN.stripped(), phase);
                f.num(clock_value(self.clock.seconds()), LOW_POS, NumStyle::PLAIN.dot_ones(true), phase);
            }
            RunView::ShotsLeft => {
                f.alnum(LETTER_C, self.remaining, NumStyle::PLAIN.dot_ones(true), false, phase)
            }
        }
        f.set(EXTRA_POS, if Blink::Slow.hides(phase) { EMPTY } else { COLON });
    }

    fn render_waiting(&mut self, phase: u8) {
        let lit = !Blink::Slow.hides(phase);
        let f = &mut self.frame;
        match self.view {
            RunView::TimeLeft => {
                let min_style = NumStyle::PLAIN.stripped().dot_ones(lit);
                f.num(clock_value(self.clock.minutes()), HIGH_POS, min_style, phase);
                f.num(clock_value(self.clock.seconds()), LOW_POS, NumStyle::PLAIN, phase);
                f.set(EXTRA_POS, EMPTY);
            }
            RunView::ShotsLeft => f.alnum(LETTER_C, self.remaining, NumStyle::PLAIN, lit, phase),
        }
    }

    /// Keys that act while a run is in progress.  Returns true when the run
    /// was cancelled.
    fn run_keys(&mut self, input: &Sample) -> bool {
        let buttons = input.buttons;
        if buttons.intersects(Buttons::START | Buttons::ENC) {
            self.cancel();
            return true;
        }
        if buttons.contains(Buttons::SELECT) && self.settings.count > 1 {
            self.view = match self.view {
                RunView::TimeLeft => RunView::ShotsLeft,
                RunView::ShotsLeft => RunView::TimeLeft,
            };
        }
        if buttons.contains(Buttons::SET) {
            self.settings.brightness = dimmer(self.settings.brightness);
            self.display.set_brightness(self.settings.brightness);
        }
        false
    }

    fn cancel(&mut self) {
        self.clock.stop();
        self.release_outputs();
        if self.state == State::RunManual {
            self.settings.exposure_min = clock_value(self.clock.minutes()).min(MINUTES_MAX);
            self.settings.exposure_sec = clock_value(self.clock.seconds()).min(SECONDS_MAX);
        }
        let _ = uwriteln!(self.board.console(), "run: cancelled");
        self.goto(self.resume);
    }

    fn suspend(&mut self) -> Outcome {
        self.clock.stop();
        self.release_outputs();
        self.display.clear();
        let _ = uwriteln!(self.board.console(), "power: off");
        self.board.sleep_until_wake();
        let _ = uwriteln!(self.board.console(), "power: on");
        self.idle.reset();
        self.settle(&mut Sample::default());
        self.display.show(&self.frame);
        Outcome::Suspended
    }
}
