//! Pure input helpers: cyclic cursor stepping, the keypad matrix map and
//! the scan debouncer used by the button task.

use crate::config::{BUTTON_COLUMNS, BUTTON_DEBOUNCE_SCANS, BUTTON_ROWS};
use crate::ui::Event;

/// Move a cursor one item back, wrapping to the last item.
pub fn select_prev(selected: usize, item_count: usize) -> usize {
    if item_count == 0 {
        0
    } else if selected == 0 || selected >= item_count {
        item_count - 1
    } else {
        selected - 1
    }
}

/// Move a cursor one item forward, wrapping to the first item.
pub fn select_next(selected: usize, item_count: usize) -> usize {
    if selected + 1 < item_count {
        selected + 1
    } else {
        0
    }
}

/// Physical keys of the throttle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    Stop,
    Ok,
    Shift,
    Mode,
    Next,
    Prev,
    Menu,
    Digit(u8),
}

impl Key {
    /// Translate an edge of this key into a dispatcher event.
    pub fn event(self, pressed: bool) -> Event {
        match self {
            Key::Stop => Event::Back(pressed),
            Key::Ok => Event::Enter(pressed),
            Key::Shift => Event::Shift(pressed),
            Key::Mode => Event::Mode(pressed),
            Key::Next => Event::Next(pressed),
            Key::Prev => Event::Prev(pressed),
            Key::Menu => Event::Menu(pressed),
            Key::Digit(d) => Event::Digit(d, pressed),
        }
    }
}

/// Key wired at each (column, row) crossing of the matrix.
pub const KEYMAP: [[Option<Key>; BUTTON_ROWS]; BUTTON_COLUMNS] = [
    [
        Some(Key::Stop),
        Some(Key::Ok),
        Some(Key::Digit(1)),
        Some(Key::Digit(4)),
        Some(Key::Digit(7)),
        Some(Key::Shift),
    ],
    [
        None,
        Some(Key::Mode),
        Some(Key::Digit(2)),
        Some(Key::Digit(5)),
        Some(Key::Digit(8)),
        Some(Key::Digit(0)),
    ],
    [
        Some(Key::Next),
        Some(Key::Prev),
        Some(Key::Digit(3)),
        Some(Key::Digit(6)),
        Some(Key::Digit(9)),
        Some(Key::Menu),
    ],
];

/// Integrating debouncer for the whole matrix.
///
/// Each crossing counts up while closed and down while open; an edge is
/// reported only when the counter saturates. The first full scan only
/// learns the resting state so keys held at power-up do not fire.
pub struct Debouncer {
    counters: [[u8; BUTTON_ROWS]; BUTTON_COLUMNS],
    states: [[bool; BUTTON_ROWS]; BUTTON_COLUMNS],
    settled: bool,
}

impl Debouncer {
    pub const fn new() -> Self {
        Self {
            counters: [[0; BUTTON_ROWS]; BUTTON_COLUMNS],
            states: [[false; BUTTON_ROWS]; BUTTON_COLUMNS],
            settled: false,
        }
    }

    /// Feed one sampled crossing. Returns the new state on a debounced edge.
    pub fn sample(&mut self, column: usize, row: usize, closed: bool) -> Option<bool> {
        let counter = self.counters.get_mut(column)?.get_mut(row)?;
        if closed && *counter < BUTTON_DEBOUNCE_SCANS {
            *counter += 1;
        } else if !closed && *counter > 0 {
            *counter -= 1;
        }

        let state = match *counter {
            0 => false,
            BUTTON_DEBOUNCE_SCANS => true,
            _ => return None,
        };

        let last = &mut self.states[column][row];
        if *last == state {
            return None;
        }
        *last = state;
        if self.settled {
            Some(state)
        } else {
            None
        }
    }

    /// Mark the end of a full matrix scan.
    pub fn end_scan(&mut self) {
        self.settled = true;
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_next_wraps_to_first() {
        assert_eq!(select_next(0, 3), 1);
        assert_eq!(select_next(2, 3), 0);
        assert_eq!(select_next(0, 0), 0);
    }

    #[test]
    fn select_prev_wraps_to_last() {
        assert_eq!(select_prev(1, 3), 0);
        assert_eq!(select_prev(0, 3), 2);
        assert_eq!(select_prev(0, 0), 0);
    }

    #[test]
    fn stepping_count_times_returns_home() {
        for count in 1..8 {
            for start in 0..count {
                let mut pos = start;
                for _ in 0..count {
                    pos = select_next(pos, count);
                }
                assert_eq!(pos, start);
                for _ in 0..count {
                    pos = select_prev(pos, count);
                }
                assert_eq!(pos, start);
            }
        }
    }

    #[test]
    fn keymap_covers_all_digits() {
        for digit in 0..10u8 {
            let found = KEYMAP
                .iter()
                .flatten()
                .filter(|k| **k == Some(Key::Digit(digit)))
                .count();
            assert_eq!(found, 1, "digit {digit}");
        }
    }

    #[test]
    fn stop_key_maps_to_back() {
        assert_eq!(Key::Stop.event(true), Event::Back(true));
        assert_eq!(Key::Digit(5).event(false), Event::Digit(5, false));
    }

    #[test]
    fn debouncer_ignores_first_scan() {
        let mut d = Debouncer::new();
        for _ in 0..BUTTON_DEBOUNCE_SCANS {
            assert_eq!(d.sample(0, 0, true), None);
        }
        d.end_scan();
        // Held at power-up: no edge until it is released and pressed again.
        assert_eq!(d.sample(0, 0, true), None);
    }

    #[test]
    fn debouncer_reports_press_and_release() {
        let mut d = Debouncer::new();
        d.end_scan();
        assert_eq!(d.sample(1, 2, true), None);
        assert_eq!(d.sample(1, 2, true), Some(true));
        assert_eq!(d.sample(1, 2, true), None);
        assert_eq!(d.sample(1, 2, false), None);
        assert_eq!(d.sample(1, 2, false), Some(false));
    }

    #[test]
    fn debouncer_filters_single_glitch() {
        let mut d = Debouncer::new();
        d.end_scan();
        assert_eq!(d.sample(2, 0, true), None);
        assert_eq!(d.sample(2, 0, false), None);
        assert_eq!(d.sample(2, 0, false), None);
    }

    #[test]
    fn debouncer_rejects_out_of_range() {
        let mut d = Debouncer::new();
        assert_eq!(d.sample(BUTTON_COLUMNS, 0, true), None);
        assert_eq!(d.sample(0, BUTTON_ROWS, true), None);
    }
}
