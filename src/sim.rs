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
//! In-memory board for running the controller off target.
//!
//! Everything the firmware would do to pins is recorded so tests can check
//! it afterwards.

use core::convert::Infallible;

use heapless::{String, Vec};

use crate::hal::{Board, ByteStore, DigitDriver, InputLines};
use crate::input::Buttons;

pub const STORE_SIZE: usize = 32;
const EVENT_LOG: usize = 64;
const CONSOLE_SIZE: usize = 2048;

/// Output edges seen by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Shutter(bool),
    HalfPress(bool),
    Sleep,
}

#[derive(Debug, PartialEq, Eq)]
pub struct StoreFault;

/// EEPROM stand-in.  Starts fully erased.
#[derive(Debug)]
pub struct MemStore {
    bytes: [u8; STORE_SIZE],
    /// Makes every access fail.
    pub fail: bool,
}

impl MemStore {
    pub const fn erased() -> Self {
        Self {
            bytes: [0xFF; STORE_SIZE],
            fail: false,
        }
    }

    pub fn with_bytes(data: &[u8]) -> Self {
        let mut store = Self::erased();
        let n = data.len().min(STORE_SIZE);
        store.bytes[..n].copy_from_slice(&data[..n]);
        store
    }

    pub fn bytes(&self) -> &[u8; STORE_SIZE] {
        &self.bytes
    }

    fn range(&self, offset: u16, len: usize) -> Result<core::ops::Range<usize>, StoreFault> {
        let start = usize::from(offset);
        let end = start + len;
        if self.fail || end > STORE_SIZE {
            return Err(StoreFault);
        }
        Ok(start..end)
    }
}

impl ByteStore for MemStore {
    type Error = StoreFault;

    fn read(&self, offset: u16, buf: &mut [u8]) -> Result<(), StoreFault> {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.bytes[range]);
        Ok(())
    }

    fn write(&mut self, offset: u16, data: &[u8]) -> Result<(), StoreFault> {
        let range = self.range(offset, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }
}

/// Console text.  Starts over when full.
#[derive(Debug, Default)]
pub struct LogBuffer {
    text: String<CONSOLE_SIZE>,
}

impl LogBuffer {
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }
}

impl ufmt::uWrite for LogBuffer {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        if self.text.push_str(s).is_err() {
            self.text.clear();
            let _ = self.text.push_str(s);
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct SimBoard {
    pub shutter: bool,
    pub half_press: bool,
    pub events: Vec<Event, EVENT_LOG>,
    pub store: MemStore,
    pub console: LogBuffer,
    pub supply: Option<u16>,
    pub temperature: Option<u16>,
    pub signature: [u8; 32],
    pub sleeps: u8,
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBoard {
    pub fn new() -> Self {
        Self::with_store(MemStore::erased())
    }

    pub fn with_store(store: MemStore) -> Self {
        Self {
            shutter: false,
            half_press: false,
            events: Vec::new(),
            store,
            console: LogBuffer::default(),
            supply: None,
            temperature: None,
            signature: [0; 32],
            sleeps: 0,
        }
    }

    fn record(&mut self, event: Event) {
        let _ = self.events.push(event);
    }

    /// Completed shutter open/close pairs.
    pub fn exposures(&self) -> usize {
        self.events
            .iter()
            .filter(|e| **e == Event::Shutter(false))
            .count()
    }
}

impl Board for SimBoard {
    type Console = LogBuffer;
    type Store = MemStore;

    fn set_shutter(&mut self, open: bool) {
        if self.shutter != open {
            self.shutter = open;
            self.record(Event::Shutter(open));
        }
    }

    fn set_half_press(&mut self, engaged: bool) {
        if self.half_press != engaged {
            self.half_press = engaged;
            self.record(Event::HalfPress(engaged));
        }
    }

    fn store(&mut self) -> &mut MemStore {
        &mut self.store
    }

    fn console(&mut self) -> &mut LogBuffer {
        &mut self.console
    }

    fn supply_centivolts(&mut self) -> Option<u16> {
        self.supply
    }

    fn temperature_raw(&mut self) -> Option<u16> {
        self.temperature
    }

    fn signature_byte(&mut self, index: u8) -> u8 {
        self.signature
            .get(usize::from(index))
            .copied()
            .unwrap_or(0xFF)
    }

    fn sleep_until_wake(&mut self) {
        self.sleeps = self.sleeps.saturating_add(1);
        self.record(Event::Sleep);
    }
}

/// Segment bus and digit lines.
#[derive(Debug, Default)]
pub struct SimDigits {
    pub segments: u8,
    pub selected: Option<u8>,
}

impl DigitDriver for SimDigits {
    fn set_segments(&mut self, pattern: u8) {
        self.segments = pattern;
    }

    fn select_digit(&mut self, index: u8) {
        self.selected = Some(index);
    }

    fn digits_off(&mut self) {
        self.selected = None;
    }
}

/// Buttons and encoder under test control.
#[derive(Debug, Default)]
pub struct SimLines {
    pub down: Buttons,
    pub encoder: i8,
}

impl InputLines for SimLines {
    fn buttons(&mut self) -> Buttons {
        self.down
    }

    fn take_encoder(&mut self) -> i8 {
        core::mem::take(&mut self.encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_bounds() {
        let mut store = MemStore::erased();
        assert_eq!(store.write(30, &[1, 2]), Ok(()));
        assert_eq!(store.write(31, &[1, 2]), Err(StoreFault));
        let mut buf = [0; 2];
        assert_eq!(store.read(30, &mut buf), Ok(()));
        assert_eq!(buf, [1, 2]);
    }

    #[test]
    fn outputs_record_edges_only() {
        let mut board = SimBoard::new();
        board.set_shutter(true);
        board.set_shutter(true);
        board.set_shutter(false);
        board.set_half_press(false);
        assert_eq!(board.events.as_slice(), &[Event::Shutter(true), Event::Shutter(false)]);
        assert_eq!(board.exposures(), 1);
    }

    #[test]
    fn console_wraps_when_full() {
        use ufmt::uWrite;
        let mut log = LogBuffer::default();
        for _ in 0..CONSOLE_SIZE {
            let _ = log.write_str("xy");
        }
        let _ = log.write_str("tail");
        assert!(log.as_str().ends_with("tail"));
    }
}
