//! Keypad matrix scanning.
//!
//! Three drive columns, six sense rows (active-low with internal pull-up):
//!   - column 0: STOP, OK, 1, 4, 7, SHIFT
//!   - column 1: -, MODE, 2, 5, 8, 0
//!   - column 2: NEXT, PREV, 3, 6, 9, MENU
//!
//! Every scan pulls one column low at a time and samples the rows.
//! Debounced edges go through `KEYMAP` and reach the UI channel as
//! dispatcher events, presses and releases alike.

use defmt::debug;
use embassy_nrf::gpio::{Input, Output};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Sender;
use embassy_time::{Duration, Timer};
use handthrottle::config::{BUTTON_COLUMNS, BUTTON_ROWS, BUTTON_SCAN_MS};
use handthrottle::ui::input_logic::{Debouncer, KEYMAP};
use handthrottle::ui::Event;

/// Depth of the key event channel.
pub const EVENT_QUEUE: usize = 8;

/// Time for a row line to follow its column after switching.
const SETTLE_US: u64 = 20;

/// Scan the matrix forever.
pub async fn matrix_task(
    mut columns: [Output<'static>; BUTTON_COLUMNS],
    rows: [Input<'static>; BUTTON_ROWS],
    tx: Sender<'static, CriticalSectionRawMutex, Event, EVENT_QUEUE>,
) -> ! {
    let mut debouncer = Debouncer::new();
    for column in columns.iter_mut() {
        column.set_high();
    }

    loop {
        for (c, column) in columns.iter_mut().enumerate() {
            column.set_low();
            Timer::after(Duration::from_micros(SETTLE_US)).await;

            for (r, row) in rows.iter().enumerate() {
                let Some(pressed) = debouncer.sample(c, r, row.is_low()) else {
                    continue;
                };
                if let Some(key) = KEYMAP[c][r] {
                    debug!("Key: {} {}", key, if pressed { "down" } else { "up" });
                    tx.send(key.event(pressed)).await;
                }
            }

            column.set_high();
        }
        debouncer.end_scan();

        Timer::after(Duration::from_millis(BUTTON_SCAN_MS)).await;
    }
}
