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
//! Astro Timer firmware for an Arduino Nano (ATmega168).
#![no_std]
#![no_main]
#![feature(abi_avr_interrupt)]
#![feature(asm_experimental_arch)]

mod board;
#[cfg(feature = "panic-serial")]
mod panic;
mod timer;

#[cfg(not(feature = "panic-serial"))]
use panic_halt as _;

use astrotimer::hal::{ButtonPins, Outputs};
use astrotimer::{Controller, Outcome, Sampler};

use board::{EepromStore, Hardware, Lines, PortDigits};

#[arduino_hal::entry]
fn main() -> ! {
    let Some(dp) = arduino_hal::Peripherals::take() else {
        panic!("peripherals taken twice");
    };
    let pins = arduino_hal::pins!(dp);

    PortDigits::init();
    let outputs = Outputs::new(
        pins.d13.into_output().downgrade(),
        pins.d12.into_output().downgrade(),
    );
    // Encoder phases are read straight from PINC in the interrupt.
    let _ = pins.a0.into_pull_up_input();
    let _ = pins.a1.into_pull_up_input();
    let mut lines = Lines::new(ButtonPins::new(
        pins.a5.into_pull_up_input().downgrade(),
        pins.a3.into_pull_up_input().downgrade(),
        pins.a4.into_pull_up_input().downgrade(),
        pins.a2.into_pull_up_input().downgrade(),
    ));

    let store = EepromStore::new(arduino_hal::Eeprom::new(dp.EEPROM));
    let hardware = Hardware::new(outputs, store, dp.ADC, dp.CPU);
    let mut controller = Controller::new(&timer::CLOCK, &timer::DISPLAY, hardware);

    timer::init_tc0(&dp.TC0);
    timer::init_tc1(&dp.TC1);
    timer::init_tc2(&dp.TC2);
    timer::init_pcint(&dp.EXINT);

    let mut sampler = Sampler::new(&timer::POLL);
    sampler.set_reversed(controller.settings().encoder_reversed);
    sampler.reset(&mut lines);

    // SAFETY: all shared state is in place.
    unsafe { avr_device::interrupt::enable() };

    loop {
        let sample = match sampler.poll(&mut lines) {
            Ok(sample) => sample,
            Err(nb::Error::WouldBlock) => {
                controller.board_mut().idle();
                continue;
            }
            Err(nb::Error::Other(never)) => match never {},
        };
        if controller.step(sample) == Outcome::Suspended {
            sampler.reset(&mut lines);
        }
        sampler.set_reversed(controller.settings().encoder_reversed);
    }
}
