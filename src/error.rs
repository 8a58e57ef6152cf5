//! Unified error type for handthrottle.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.

/// Top-level error type used across the engine and the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Engine capacities
    /// Menu ancestor stack is already at `MAX_MENU_LEVEL`.
    MenuTooDeep,

    /// A display or value string would exceed `STRING_LEN`.
    BufferOverflow,

    /// An edit field declares a bound the shared buffer cannot hold.
    FieldTooLong,

    // Application
    /// Loco library operation refused.
    Library(LibraryError),

    /// The command-station request queue is full.
    OutboxFull,

    // Storage
    /// Flash read/write/erase failed.
    Storage,

    /// A stored configuration record is truncated or has an unknown layout.
    CorruptRecord,

    // UI / Display
    /// I²C transaction to the display failed.
    Display,
}

/// Why the loco library refused a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LibraryError {
    /// Every slot is taken.
    Full,
    /// Another record already uses this address; carries its index.
    Duplicate(usize),
    /// Nothing to delete.
    Empty,
    /// Index past the end of the library.
    NoSuchRecord,
}

// Convenience conversions

impl From<LibraryError> for Error {
    fn from(e: LibraryError) -> Self {
        Error::Library(e)
    }
}
