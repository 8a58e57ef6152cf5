//! Application-wide constants and compile-time configuration.
//!
//! Buffer capacities, timing parameters and hardware pin assignments live
//! here so they can be tuned in one place. Every bounded container in the
//! engine is sized from these values.

// Engine capacities

/// Deepest menu nesting the ancestor stack can hold.
pub const MAX_MENU_LEVEL: usize = 4;

/// Capacity of the shared edit/display string (prefix + value).
pub const STRING_LEN: usize = 32;

/// Number of characters visible on the main display line.
pub const SHOW_LEN: usize = 6;

/// Number of supported UI languages (English, Polish).
pub const LANGUAGES: usize = 2;

/// Highest child-lock level a menu branch can require.
pub const MAX_CHILD_LEVEL: u8 = 2;

/// Largest digit count an integer field may declare (fits in `u32`).
pub const MAX_INTEGER_DIGITS: u8 = 9;

/// Longest dotted IPv4 text, "255.255.255.255".
pub const IP_TEXT_LEN: usize = 15;

// Timing

/// Window in which repeated presses of one key cycle its alphabet (ms).
pub const MULTITAP_WINDOW_MS: u64 = 1000;

/// How long a parked wizard waits for the command station (ms).
pub const PENDING_TIMEOUT_MS: u64 = 5000;

/// Cadence of the `Timeout` event fed to the dispatcher (ms).
pub const TICK_MS: u64 = 100;

/// Two shift presses closer than this select the F21..F28 bank (ms).
pub const SHIFT_DOUBLE_PRESS_MS: u64 = 1000;

// Locomotive / turnout control

/// Number of throttle notches in each direction.
pub const LOCO_MAX_STEP: i8 = 21;

/// Locomotives kept in the on-device library.
pub const LOCO_LIST_LEN: usize = 64;

/// Longest loco name the NAME field accepts.
pub const LOCO_NAME_LEN: usize = 6;

/// Highest turnout number the keypad accepts.
pub const MAX_TURNOUT_ID: u16 = 1023;

/// Highest configuration variable accepted by the CV wizard.
pub const MAX_CV_NUMBER: u32 = 1024;

/// Locomotive functions F0..F28.
pub const LOCO_FUNCTIONS: u8 = 29;

/// Requests that can queue for the command-station link.
pub const OUTBOX_DEPTH: usize = 8;

/// Default idle power-down time (minutes).
pub const DEFAULT_IDLE_TIME_MIN: u8 = 5;

/// Default OLED contrast.
pub const DEFAULT_CONTRAST: u8 = 127;

// Button matrix
//
// Three drive columns, six sense rows (active-low with pull-up):
//
//   col 0 → P0.02    rows → P0.11 P0.12 P0.24 P0.25 P0.28 P0.29
//   col 1 → P0.03
//   col 2 → P0.04
//   I²C SDA → P0.26, SCL → P0.27

/// Matrix drive lines.
pub const BUTTON_COLUMNS: usize = 3;

/// Matrix sense lines.
pub const BUTTON_ROWS: usize = 6;

/// Matrix scan period (ms).
pub const BUTTON_SCAN_MS: u64 = 10;

/// Consecutive identical scans before an edge is reported.
pub const BUTTON_DEBOUNCE_SCANS: u8 = 2;

// Configuration storage

/// Flash page index where configuration storage starts (4 KB per page on nRF52840).
pub const STORAGE_FLASH_PAGE_START: u32 = 240;

/// Number of flash pages reserved for configuration storage.
pub const STORAGE_FLASH_PAGE_COUNT: u32 = 4;
