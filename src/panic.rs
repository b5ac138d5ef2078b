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
//! Panic report on the USART, for bench debugging with the display
//! disconnected.  PD0/PD1 are segment lines in normal running, so this
//! takes them back from the display.

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    // disable interrupts - the display and timebase are dead from here on
    avr_device::interrupt::disable();

    // SAFETY: we're never returning so stealing the peripherals is ok
    let dp = unsafe { arduino_hal::Peripherals::steal() };
    let pins = arduino_hal::pins!(dp);

    // Shutter and half-press released before anything else.
    pins.d13.into_output().set_low();
    pins.d12.into_output().set_low();

    let mut serial = arduino_hal::default_serial!(dp, pins, 19200);
    let _ = ufmt::uwriteln!(&mut serial, "astrotimer panic\r");

    if let Some(loc) = info.location() {
        let _ = ufmt::uwriteln!(
            &mut serial,
            " at {}:{}:{}\r",
            loc.file(),
            loc.line(),
            loc.column(),
        );
    }
    loop {}
}
