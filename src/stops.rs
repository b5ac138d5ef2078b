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
//! Photographic stop table for turning the encoder through exposure times.

/// Standard exposure durations in seconds, ascending.
pub const STOPS: [u16; 37] = [
    0, 1, 2, 3, 4, 5, 6, 8, 10, 13, 15, 20, 25, 30, 40, 50, 60, 75, 90, 120, 150, 180, 240, 300,
    360, 480, 600, 720, 900, 1200, 1500, 1800, 2400, 3000, 3600, 4500, 5400,
];

/// Moves `seconds` by `delta` stops.  A value between two stops first
/// snaps to the stop above it when going down, or below it when going up,
/// so one detent never skips a stop.
pub fn step(seconds: u16, delta: i8) -> u16 {
    let last = STOPS.len() - 1;
    let mut index = STOPS
        .iter()
        .position(|&s| s >= seconds)
        .unwrap_or(STOPS.len());
    let exact = STOPS.get(index) == Some(&seconds);
    if delta > 0 && !exact {
        index = index.saturating_sub(1);
    }
    let moved = if delta >= 0 {
        index.saturating_add(usize::from(delta.unsigned_abs()))
    } else {
        index.saturating_sub(usize::from(delta.unsigned_abs()))
    };
    STOPS[moved.min(last)]
}

/// Minutes and seconds for a count of seconds.  Anything beyond 99:59 is
/// clamped.
pub const fn split(seconds: u16) -> (u8, u8) {
    let minutes = seconds / 60;
    if minutes > 99 {
        return (99, 59);
    }
    (minutes as u8, (seconds % 60) as u8)
}

pub const fn join(minutes: u8, seconds: u8) -> u16 {
    minutes as u16 * 60 + seconds as u16
}
