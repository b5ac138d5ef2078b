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
//! Camera intervalometer and exposure timer.
//!
//! Everything that decides what the timer does lives here and builds for
//! the host as well as the AVR, so it can be tested with `cargo test`.  The
//! board binary (`src/main.rs`, feature `board`) only wires these pieces to
//! the ATmega168 timers, pins and EEPROM.
//!
//! Data flow for one 48 ms cycle:
//!
//! ```text
//!   PollTimer --ready--> Sampler::poll --Sample--> Controller::step --Frame--> Display
//!                                                    |        ^
//!                                                    v        |
//!                                                  Board    Clock (ticked by Timer2)
//! ```
#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod controller;
pub mod display;
pub mod hal;
pub mod input;
pub mod power;
pub mod settings;
pub mod sim;
pub mod stops;

pub use clock::{Clock, Direction};
pub use controller::{Controller, Outcome, State};
pub use display::{Display, Frame};
pub use hal::{Board, ByteStore, DigitDriver, InputLines};
pub use input::{Buttons, PollTimer, QuadratureDecoder, Sample, Sampler};
pub use settings::Settings;
