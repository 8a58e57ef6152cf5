//! User interface subsystem - the interaction engine behind the keypad.
//!
//! A handful of raw button events drive navigation through a static menu
//! tree, multi-field wizards and a single value editor that understands
//! four kinds of values. Everything here is hardware independent: the
//! engine only talks to the [`Display`] trait and is fed timestamps by the
//! caller.
//!
//! ## Components (leaves first)
//!
//! - [`edit`]: edits one scalar (text, integer, choice, IPv4) into a
//!   fixed-capacity buffer
//! - [`sequence`]: drives the editor across an ordered list of fields
//! - [`menu`]: walks the static menu tree with a bounded ancestor stack
//! - [`engine`]: the engine value that owns all sessions and the current page
//! - [`page`]: the event router in front of the engine and the throttle pages

pub mod edit;
pub mod engine;
pub mod input_logic;
pub mod menu;
pub mod page;
pub mod sequence;

use crate::config::{LANGUAGES, STRING_LEN};
use heapless::String;

/// A display string in every supported language.
pub type Label = [&'static str; LANGUAGES];

/// Top-level modes; exactly one is current and decides event routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Page {
    None,
    Menu,
    Edit,
    Sequence,
    Loco,
    Turnout,
    Password,
    Error,
}

/// Debounced input edges. `true` means pressed, `false` released.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Next(bool),
    Prev(bool),
    Enter(bool),
    Back(bool),
    Digit(u8, bool),
    Shift(bool),
    Mode(bool),
    Menu(bool),
    /// Periodic tick, fired every `TICK_MS`.
    Timeout,
}

/// Horizontal placement of a display line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Text output used by the engine.
///
/// `blink` is the zero-based column of `text` that should be drawn as a
/// blinking cursor.
pub trait Display {
    fn show_main(&mut self, text: &str, blink: Option<usize>, align: Align);
    fn show_bottom(&mut self, text: Option<&str>, align: Align);
    /// Start collecting draw calls; nothing reaches the panel until `commit_batch`.
    fn begin_batch(&mut self);
    fn commit_batch(&mut self);
    fn show_shift_indicator(&mut self, active: bool);
}

/// A value produced by the editor or supplied by a field handler.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    Text(String<STRING_LEN>),
    Integer(u32),
    /// Index into the field's option list.
    Choice(u8),
    Ip([u8; 4]),
}

impl Value {
    /// Build a text value, truncated to `STRING_LEN`.
    pub fn text(s: &str) -> Self {
        let mut out = String::new();
        for c in s.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
        Value::Text(out)
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_choice(&self) -> Option<u8> {
        match self {
            Value::Choice(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_ip(&self) -> Option<[u8; 4]> {
        match self {
            Value::Ip(octets) => Some(*octets),
            _ => None,
        }
    }
}

/// A user-visible failure shown on the Error page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fault {
    /// Numeric code shown as `ERR nn`.
    pub code: u8,
    pub message: &'static Label,
    /// Wizard field to reopen when the error is dismissed.
    pub retry_field: Option<usize>,
}

impl Fault {
    pub const fn new(code: u8, message: &'static Label) -> Self {
        Self {
            code,
            message,
            retry_field: None,
        }
    }

    pub const fn retry_at(self, field: usize) -> Self {
        Self {
            code: self.code,
            message: self.message,
            retry_field: Some(field),
        }
    }
}

/// Bits of the flag word accumulated along the menu path.
pub mod flags {
    /// Low byte: the action selected by an ancestor node.
    pub const ACTION_MASK: u32 = 0x00FF;
    /// Selecting a record edits it.
    pub const EDIT_RECORD: u32 = 0x03;
    /// Selecting a record deletes it.
    pub const DELETE_RECORD: u32 = 0x04;
    /// Second byte: index of the record being edited.
    pub const RECORD_MASK: u32 = 0xFF00;
    pub const RECORD_SHIFT: u32 = 8;

    /// Record index folded into `flags`.
    pub const fn record_index(flags: u32) -> usize {
        ((flags & RECORD_MASK) >> RECORD_SHIFT) as usize
    }

    pub const fn action(flags: u32) -> u32 {
        flags & ACTION_MASK
    }
}

/// Pick the text of `label` for `lang`, degrading to a blank string.
pub(crate) fn label_text(label: Option<&'static Label>, lang: usize) -> &'static str {
    match label {
        Some(texts) => match texts.get(lang) {
            Some(text) => *text,
            None => {
                error!("label has no text for language {}", lang);
                ""
            }
        },
        None => {
            error!("missing label");
            ""
        }
    }
}

/// Recording display shared by the unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::{Align, Display};
    use heapless::String;

    #[derive(Default)]
    pub struct Screen {
        pub main: String<64>,
        pub blink: Option<usize>,
        pub align: Option<Align>,
        pub bottom: Option<String<64>>,
        pub shift: bool,
        pub batches: u32,
    }

    impl Screen {
        pub fn main(&self) -> &str {
            self.main.as_str()
        }

        pub fn bottom(&self) -> &str {
            self.bottom.as_ref().map(|b| b.as_str()).unwrap_or("")
        }
    }

    impl Display for Screen {
        fn show_main(&mut self, text: &str, blink: Option<usize>, align: Align) {
            self.main.clear();
            let _ = self.main.push_str(text);
            self.blink = blink;
            self.align = Some(align);
        }

        fn show_bottom(&mut self, text: Option<&str>, _align: Align) {
            self.bottom = text.map(|t| {
                let mut s = String::new();
                let _ = s.push_str(t);
                s
            });
        }

        fn begin_batch(&mut self) {}

        fn commit_batch(&mut self) {
            self.batches += 1;
        }

        fn show_shift_indicator(&mut self, active: bool) {
            self.shift = active;
        }
    }
}
