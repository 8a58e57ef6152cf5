//! Value editor.
//!
//! One [`EditSession`] edits a single scalar of one of four kinds. The
//! session renders `prefix + value` out of one fixed-capacity buffer; the
//! prefix is read-only and the value part never grows past the kind's
//! bound.
//!
//! - Text: multi-tap entry on the digit keys, with a shift (case) flag
//! - Integer: typed digits, or spin up/down with next/prev
//! - Choice: cycles through an immutable option list
//! - IP: four dotted octets, edited in place

use core::fmt::Write;

use crate::config::{IP_TEXT_LEN, MAX_INTEGER_DIGITS, MULTITAP_WINDOW_MS, SHOW_LEN, STRING_LEN};
use crate::error::Error;
use crate::ui::input_logic::{select_next, select_prev};
use crate::ui::{Align, Display, Page, Value};
use heapless::{String, Vec};

/// Multi-tap alphabet of each digit key. The first symbol is the digit
/// itself, so the first press yields the second symbol.
pub const KEYPAD: [&str; 10] = [
    "0 ",
    "1_-/\\*[]<>",
    "2abc",
    "3def",
    "4ghi",
    "5jkl",
    "6mno",
    "7pqrs",
    "8tuv",
    "9wxyz",
];

/// Edit kind together with the bound only that kind needs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    Text { max_len: u8 },
    Integer { digits: u8 },
    Choice { options: &'static [&'static str] },
    Ip,
}

impl EditKind {
    /// Characters the value part may occupy.
    fn bound(&self) -> usize {
        match *self {
            EditKind::Text { max_len } => max_len as usize,
            EditKind::Integer { digits } => digits as usize,
            EditKind::Choice { options } => options.iter().map(|o| o.len()).max().unwrap_or(0),
            EditKind::Ip => IP_TEXT_LEN,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Navigating,
    /// A character is being chosen on `key`; `index` points into its alphabet.
    MultiTap { key: u8, index: usize, at: u64 },
    /// Digits are being typed; `anchor` is where the current run started.
    Inserting { anchor: usize },
}

/// Live state of one edit.
pub struct EditSession {
    caller: Page,
    kind: EditKind,
    /// Cursor within the value part, or the selected option for `Choice`.
    pos: usize,
    mode: Mode,
    shift: bool,
    prefix_len: usize,
    buf: Vec<u8, STRING_LEN>,
}

impl EditSession {
    pub const fn new() -> Self {
        Self {
            caller: Page::None,
            kind: EditKind::Integer { digits: 0 },
            pos: 0,
            mode: Mode::Navigating,
            shift: false,
            prefix_len: 0,
            buf: Vec::new(),
        }
    }

    /// Start editing. The committed value is handed back to `caller`.
    ///
    /// An initial value of the wrong kind is logged and replaced by the
    /// kind's blank value. A prefix that does not fit next to the value is
    /// dropped.
    pub fn open(
        &mut self,
        caller: Page,
        kind: EditKind,
        prefix: &str,
        initial: Option<&Value>,
    ) -> Result<(), Error> {
        let bound = kind.bound();
        if bound > STRING_LEN {
            error!("edit bound {} exceeds buffer", bound);
            return Err(Error::FieldTooLong);
        }
        if let EditKind::Integer { digits } = kind {
            if digits > MAX_INTEGER_DIGITS {
                error!("integer field with {} digits", digits);
                return Err(Error::FieldTooLong);
            }
        }

        self.caller = caller;
        self.kind = kind;
        self.pos = 0;
        self.mode = Mode::Navigating;
        self.shift = false;
        self.buf.clear();

        self.prefix_len = if prefix.len() > STRING_LEN - bound {
            error!("prefix '{}' does not fit, dropped", prefix);
            0
        } else {
            push_ascii(&mut self.buf, prefix, STRING_LEN)
        };

        if !self.seed(initial) {
            self.seed(None);
        }
        Ok(())
    }

    /// Load `initial` into the value part. Returns false on a kind mismatch.
    fn seed(&mut self, initial: Option<&Value>) -> bool {
        self.buf.truncate(self.prefix_len);
        match (self.kind, initial) {
            (EditKind::Text { max_len }, Some(Value::Text(text))) => {
                push_ascii(&mut self.buf, text, self.prefix_len + max_len as usize);
            }
            (EditKind::Integer { digits }, Some(Value::Integer(n))) => {
                if decimal_len(*n as u64) > digits as usize {
                    warn!("initial value {} wider than {} digits", n, digits);
                    return false;
                }
                self.write_integer(*n as u64);
            }
            (EditKind::Choice { options }, Some(Value::Choice(index))) => {
                let index = *index as usize;
                if index >= options.len() {
                    warn!("initial choice {} out of range", index);
                    return false;
                }
                self.pos = index;
            }
            (EditKind::Ip, Some(Value::Ip(octets))) => self.write_ip(*octets),
            (EditKind::Ip, None) => self.write_ip([0; 4]),
            (_, None) => {}
            (_, Some(_)) => {
                warn!("initial value does not match edit kind");
                return false;
            }
        }
        true
    }

    pub fn caller(&self) -> Page {
        self.caller
    }

    pub fn kind(&self) -> EditKind {
        self.kind
    }

    /// Text currently held by the session, prefix included.
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf).unwrap_or("")
    }

    fn value(&self) -> &[u8] {
        self.buf.get(self.prefix_len..).unwrap_or(&[])
    }

    // ── Events ──────────────────────────────────────────────────────────

    pub fn next(&mut self, lcd: &mut dyn Display) {
        match self.kind {
            EditKind::Text { max_len } => {
                self.mode = Mode::Navigating;
                self.pos = select_next(self.pos, max_len as usize);
            }
            EditKind::Integer { digits } => {
                if let Mode::Inserting { .. } = self.mode {
                    return;
                }
                let modulus = 10u64.pow(digits as u32);
                if modulus > 1 {
                    let n = (parse_decimal(self.value()) + 1) % modulus;
                    self.write_integer(n);
                }
            }
            EditKind::Choice { options } => self.pos = select_next(self.pos, options.len()),
            EditKind::Ip => {
                self.mode = Mode::Navigating;
                if self.pos + 1 < self.value().len() {
                    self.pos += 1;
                    if self.value().get(self.pos) == Some(&b'.') {
                        self.pos += 1;
                    }
                }
            }
        }
        self.render(lcd);
    }

    pub fn prev(&mut self, lcd: &mut dyn Display) {
        match self.kind {
            EditKind::Text { .. } => {
                self.mode = Mode::Navigating;
                self.pos = self.pos.saturating_sub(1);
            }
            EditKind::Integer { .. } => {
                if let Mode::Inserting { .. } = self.mode {
                    if self.buf.len() > self.prefix_len {
                        self.buf.pop();
                    }
                } else {
                    let n = parse_decimal(self.value()).saturating_sub(1);
                    self.write_integer(n);
                }
            }
            EditKind::Choice { options } => self.pos = select_prev(self.pos, options.len()),
            EditKind::Ip => {
                self.mode = Mode::Navigating;
                if self.pos > 0 {
                    self.pos -= 1;
                    if self.value().get(self.pos) == Some(&b'.') {
                        self.pos = self.pos.saturating_sub(1);
                    }
                }
            }
        }
        self.render(lcd);
    }

    /// A digit key was released at `now`.
    pub fn digit(&mut self, key: u8, now: u64, lcd: &mut dyn Display) {
        if key > 9 {
            warn!("digit {} out of range", key);
            return;
        }
        let result = match self.kind {
            EditKind::Text { max_len } => self.tap(key, now, max_len as usize),
            EditKind::Integer { digits } => self.type_digit(key, digits as usize),
            EditKind::Ip => self.type_octet_digit(key),
            EditKind::Choice { .. } => Ok(()),
        };
        if result.is_err() {
            error!("edit buffer full, digit {} dropped", key);
        }
        self.render(lcd);
    }

    /// Toggle the case applied to newly entered letters.
    pub fn shift(&mut self, pressed: bool, lcd: &mut dyn Display) {
        if pressed {
            self.shift = !self.shift;
            self.render(lcd);
        }
    }

    /// Commit a pending multi-tap character once its window has passed.
    pub fn timeout(&mut self, now: u64, lcd: &mut dyn Display) {
        if let (Mode::MultiTap { at, .. }, EditKind::Text { max_len }) = (self.mode, self.kind) {
            if now.saturating_sub(at) >= MULTITAP_WINDOW_MS {
                self.mode = Mode::Navigating;
                self.pos = advance_letter(self.pos, max_len as usize);
                self.render(lcd);
            }
        }
    }

    /// Finish editing; returns the caller and the edited value.
    pub fn commit(&mut self) -> (Page, Value) {
        let value = match self.kind {
            EditKind::Text { .. } => {
                let text = self.value();
                let end = text.iter().rposition(|c| *c != b' ').map_or(0, |i| i + 1);
                Value::text(core::str::from_utf8(&text[..end]).unwrap_or(""))
            }
            EditKind::Integer { .. } => {
                Value::Integer(parse_decimal(self.value()).min(u32::MAX as u64) as u32)
            }
            EditKind::Choice { .. } => Value::Choice(self.pos as u8),
            EditKind::Ip => Value::Ip(parse_ip(self.value())),
        };
        (self.close(), value)
    }

    /// Abandon editing; returns the caller.
    pub fn cancel(&mut self) -> Page {
        self.close()
    }

    fn close(&mut self) -> Page {
        let caller = self.caller;
        self.caller = Page::None;
        self.mode = Mode::Navigating;
        caller
    }

    // ── Text ────────────────────────────────────────────────────────────

    fn tap(&mut self, key: u8, now: u64, max_len: usize) -> Result<(), Error> {
        let alphabet = KEYPAD[key as usize].as_bytes();
        let index = match self.mode {
            Mode::MultiTap { key: last, index, at }
                if last == key && now.saturating_sub(at) < MULTITAP_WINDOW_MS =>
            {
                (index + 1) % alphabet.len()
            }
            Mode::MultiTap { .. } => {
                self.pos = advance_letter(self.pos, max_len);
                1 % alphabet.len()
            }
            _ => 1 % alphabet.len(),
        };

        let mut symbol = alphabet[index];
        if self.shift {
            symbol = symbol.to_ascii_uppercase();
        }
        self.put(self.pos, symbol)?;
        self.mode = Mode::MultiTap { key, index, at: now };
        Ok(())
    }

    /// Write `symbol` at value position `pos`, padding with blanks.
    fn put(&mut self, pos: usize, symbol: u8) -> Result<(), Error> {
        let at = self.prefix_len + pos;
        while self.buf.len() < at {
            self.buf.push(b' ').map_err(|_| Error::BufferOverflow)?;
        }
        match self.buf.get_mut(at) {
            Some(slot) => *slot = symbol,
            None => self.buf.push(symbol).map_err(|_| Error::BufferOverflow)?,
        }
        Ok(())
    }

    // ── Integer ─────────────────────────────────────────────────────────

    fn type_digit(&mut self, key: u8, digits: usize) -> Result<(), Error> {
        if digits == 0 {
            return Ok(());
        }
        if let Mode::Inserting { .. } = self.mode {
            if self.value().len() >= digits {
                self.buf.remove(self.prefix_len);
            }
        } else {
            self.buf.truncate(self.prefix_len);
            self.mode = Mode::Inserting { anchor: 0 };
        }
        self.buf.push(b'0' + key).map_err(|_| Error::BufferOverflow)?;
        self.pos = self.value().len().saturating_sub(1);
        Ok(())
    }

    fn write_integer(&mut self, n: u64) {
        let mut digits: String<20> = String::new();
        let _ = write!(digits, "{}", n);
        self.buf.truncate(self.prefix_len);
        push_ascii(&mut self.buf, &digits, STRING_LEN);
        self.pos = self.value().len().saturating_sub(1);
    }

    // ── IP ──────────────────────────────────────────────────────────────

    fn type_octet_digit(&mut self, key: u8) -> Result<(), Error> {
        let symbol = b'0' + key;
        match self.mode {
            Mode::Inserting { anchor } => {
                let at = self.prefix_len + self.pos + 1;
                self.buf.insert(at, symbol).map_err(|_| Error::BufferOverflow)?;
                self.pos += 1;
                if self.pos - anchor == 2 {
                    // Octet complete.
                    self.clamp_octet(anchor);
                    self.mode = Mode::Navigating;
                    if self.pos + 1 < self.value().len() {
                        self.pos += 2;
                    }
                }
            }
            _ => {
                let (start, end) = octet_bounds(self.value(), self.pos);
                for _ in start..end {
                    self.buf.remove(self.prefix_len + start);
                }
                self.buf
                    .insert(self.prefix_len + start, symbol)
                    .map_err(|_| Error::BufferOverflow)?;
                self.pos = start;
                self.mode = Mode::Inserting { anchor: start };
            }
        }
        Ok(())
    }

    /// Replace a three-digit octet starting at `start` by 255 if it overflows.
    fn clamp_octet(&mut self, start: usize) {
        let at = self.prefix_len + start;
        if let Some(octet) = self.buf.get_mut(at..at + 3) {
            if parse_decimal(octet) > 255 {
                octet.copy_from_slice(b"255");
            }
        }
    }

    fn write_ip(&mut self, octets: [u8; 4]) {
        let mut text: String<IP_TEXT_LEN> = String::new();
        let _ = write!(text, "{}.{}.{}.{}", octets[0], octets[1], octets[2], octets[3]);
        self.buf.truncate(self.prefix_len);
        push_ascii(&mut self.buf, &text, STRING_LEN);
    }

    // ── Rendering ───────────────────────────────────────────────────────

    pub fn render(&self, lcd: &mut dyn Display) {
        match self.kind {
            EditKind::Choice { options } => self.render_choice(lcd, options),
            EditKind::Integer { .. } => self.render_right_aligned(lcd),
            EditKind::Text { .. } | EditKind::Ip => {
                self.render_window(lcd, self.prefix_len + self.pos)
            }
        }
        lcd.show_shift_indicator(self.shift && matches!(self.kind, EditKind::Text { .. }));
    }

    /// Show the buffer with the cursor at `column`, scrolling so it stays visible.
    fn render_window(&self, lcd: &mut dyn Display, column: usize) {
        let text = self.as_str();
        if column < SHOW_LEN {
            lcd.show_main(text, Some(column), Align::Left);
        } else {
            let start = column + 1 - SHOW_LEN;
            lcd.show_main(text.get(start..).unwrap_or(""), Some(SHOW_LEN - 1), Align::Left);
        }
    }

    fn render_right_aligned(&self, lcd: &mut dyn Display) {
        let value = self.value();
        if self.prefix_len + value.len() > SHOW_LEN {
            self.render_window(lcd, self.buf.len().saturating_sub(1));
            return;
        }
        let mut line: String<STRING_LEN> = String::new();
        let _ = line.push_str(self.as_str().get(..self.prefix_len).unwrap_or(""));
        for _ in self.prefix_len + value.len()..SHOW_LEN {
            let _ = line.push(' ');
        }
        let _ = line.push_str(core::str::from_utf8(value).unwrap_or(""));
        lcd.show_main(&line, Some(SHOW_LEN - 1), Align::Left);
    }

    fn render_choice(&self, lcd: &mut dyn Display, options: &[&str]) {
        let option = match options.get(self.pos) {
            Some(option) => *option,
            None => {
                error!("choice {} has no option", self.pos);
                ""
            }
        };
        let mut line: String<STRING_LEN> = String::new();
        if self.prefix_len + option.len() <= SHOW_LEN {
            let _ = line.push_str(self.as_str().get(..self.prefix_len).unwrap_or(""));
            for _ in self.prefix_len + option.len()..SHOW_LEN {
                let _ = line.push(' ');
            }
        }
        push_str_truncated(&mut line, option);
        lcd.show_main(&line, None, Align::Left);
    }
}

impl Default for EditSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Append the ASCII form of `s` until `buf` holds `limit` bytes.
/// Returns the number of bytes appended.
fn push_ascii<const N: usize>(buf: &mut Vec<u8, N>, s: &str, limit: usize) -> usize {
    let mut pushed = 0;
    for c in s.chars() {
        if buf.len() >= limit {
            break;
        }
        let byte = if c.is_ascii() { c as u8 } else { b'?' };
        if buf.push(byte).is_err() {
            break;
        }
        pushed += 1;
    }
    pushed
}

fn push_str_truncated<const N: usize>(line: &mut String<N>, s: &str) {
    for c in s.chars() {
        if line.push(c).is_err() {
            break;
        }
    }
}

/// Cursor after a committed letter; stops on the last cell.
fn advance_letter(pos: usize, max_len: usize) -> usize {
    (pos + 1).min(max_len.saturating_sub(1))
}

fn decimal_len(mut n: u64) -> usize {
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}

/// Parse the leading decimal digits of `bytes`; blanks count as zero.
fn parse_decimal(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0u64, |acc, b| acc.saturating_mul(10).saturating_add((b - b'0') as u64))
}

/// Start and end (exclusive) of the octet containing `pos`.
fn octet_bounds(value: &[u8], pos: usize) -> (usize, usize) {
    let pos = pos.min(value.len());
    let start = value[..pos]
        .iter()
        .rposition(|c| *c == b'.')
        .map_or(0, |i| i + 1);
    let end = value[pos..]
        .iter()
        .position(|c| *c == b'.')
        .map_or(value.len(), |i| pos + i);
    (start, end)
}

fn parse_ip(value: &[u8]) -> [u8; 4] {
    let mut octets = [0u8; 4];
    for (slot, part) in octets.iter_mut().zip(value.split(|c| *c == b'.')) {
        *slot = parse_decimal(part).min(255) as u8;
    }
    octets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::testing::Screen;

    fn open(kind: EditKind, prefix: &str, initial: Option<Value>) -> (EditSession, Screen) {
        let mut session = EditSession::new();
        session
            .open(Page::Sequence, kind, prefix, initial.as_ref())
            .expect("field fits");
        let mut screen = Screen::default();
        session.render(&mut screen);
        (session, screen)
    }

    fn committed(session: &mut EditSession) -> Value {
        session.commit().1
    }

    // ── Text ────────────────────────────────────────────────────────────

    #[test]
    fn text_first_press_skips_digit() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", None);
        s.digit(2, 0, &mut lcd);
        assert_eq!(s.as_str(), "a");
        assert_eq!(lcd.blink, Some(0));
    }

    #[test]
    fn text_alphabet_cycle_returns_to_start() {
        for key in 0..10u8 {
            let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", None);
            s.digit(key, 0, &mut lcd);
            let first = s.as_str().as_bytes()[0];
            for tap in 0..KEYPAD[key as usize].len() {
                s.digit(key, 10 * (tap as u64 + 1), &mut lcd);
            }
            assert_eq!(s.as_str().as_bytes()[0], first, "key {key}");
        }
    }

    #[test]
    fn text_same_key_cycles_within_window() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", None);
        s.digit(7, 0, &mut lcd);
        s.digit(7, 100, &mut lcd);
        s.digit(7, 200, &mut lcd);
        assert_eq!(s.as_str(), "r");
        s.digit(7, 300, &mut lcd);
        s.digit(7, 400, &mut lcd);
        assert_eq!(s.as_str(), "7");
    }

    #[test]
    fn text_other_key_commits_and_advances() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", None);
        s.digit(2, 0, &mut lcd);
        s.digit(3, 100, &mut lcd);
        assert_eq!(s.as_str(), "ad");
        assert_eq!(lcd.blink, Some(1));
    }

    #[test]
    fn text_same_key_after_window_starts_new_character() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", None);
        s.digit(2, 0, &mut lcd);
        s.digit(2, MULTITAP_WINDOW_MS + 1, &mut lcd);
        assert_eq!(s.as_str(), "aa");
    }

    #[test]
    fn text_timeout_commits_only_after_window() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", None);
        s.digit(4, 0, &mut lcd);
        s.timeout(MULTITAP_WINDOW_MS - 1, &mut lcd);
        assert_eq!(lcd.blink, Some(0));
        s.timeout(MULTITAP_WINDOW_MS, &mut lcd);
        assert_eq!(lcd.blink, Some(1));
        s.digit(4, MULTITAP_WINDOW_MS + 10, &mut lcd);
        assert_eq!(s.as_str(), "gg");
    }

    #[test]
    fn text_shift_uppercases_letters_only() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", None);
        s.shift(true, &mut lcd);
        assert!(lcd.shift);
        s.shift(false, &mut lcd);
        assert!(lcd.shift);
        s.digit(5, 0, &mut lcd);
        assert_eq!(s.as_str(), "J");
        s.digit(1, 100, &mut lcd);
        assert_eq!(s.as_str(), "J_");
        s.shift(true, &mut lcd);
        s.digit(9, 200, &mut lcd);
        assert_eq!(s.as_str(), "J_w");
    }

    #[test]
    fn text_next_wraps_at_max_len() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 3 }, "", None);
        s.next(&mut lcd);
        s.next(&mut lcd);
        assert_eq!(lcd.blink, Some(2));
        s.next(&mut lcd);
        assert_eq!(lcd.blink, Some(0));
        s.prev(&mut lcd);
        assert_eq!(lcd.blink, Some(0));
    }

    #[test]
    fn text_last_cell_keeps_the_cursor() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 3 }, "", None);
        s.digit(2, 0, &mut lcd);
        s.digit(3, 100, &mut lcd);
        s.digit(4, 200, &mut lcd);
        assert_eq!(s.as_str(), "adg");
        s.timeout(200 + MULTITAP_WINDOW_MS, &mut lcd);
        assert_eq!(lcd.blink, Some(2));

        s.digit(5, 2000, &mut lcd);
        assert_eq!(s.as_str(), "adj");
        s.digit(6, 2100, &mut lcd);
        assert_eq!(s.as_str(), "adm");
    }

    #[test]
    fn text_commit_trims_trailing_padding() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", Some(Value::text("AB")));
        s.next(&mut lcd);
        s.next(&mut lcd);
        s.next(&mut lcd);
        s.next(&mut lcd);
        s.digit(0, 0, &mut lcd);
        assert_eq!(s.as_str(), "AB   ");
        assert_eq!(committed(&mut s), Value::text("AB"));
    }

    #[test]
    fn text_typing_past_content_pads_with_blanks() {
        let (mut s, mut lcd) = open(EditKind::Text { max_len: 6 }, "", Some(Value::text("A")));
        s.next(&mut lcd);
        s.next(&mut lcd);
        s.digit(2, 0, &mut lcd);
        assert_eq!(s.as_str(), "A a");
        assert_eq!(committed(&mut s), Value::text("A a"));
    }

    #[test]
    fn text_long_value_scrolls_cursor_into_view() {
        let (mut s, mut lcd) = open(
            EditKind::Text { max_len: 32 },
            "",
            Some(Value::text("ABCDEFGHIJ")),
        );
        for _ in 0..8 {
            s.next(&mut lcd);
        }
        assert_eq!(lcd.main(), "DEFGHIJ");
        assert_eq!(lcd.blink, Some(SHOW_LEN - 1));
    }

    // ── Integer ─────────────────────────────────────────────────────────

    #[test]
    fn integer_renders_right_aligned_after_prefix() {
        let (_, lcd) = open(EditKind::Integer { digits: 4 }, "L", Some(Value::Integer(3)));
        assert_eq!(lcd.main(), "L    3");
        assert_eq!(lcd.blink, Some(SHOW_LEN - 1));
    }

    #[test]
    fn integer_spin_wraps_modulo_digits() {
        let (mut s, mut lcd) = open(EditKind::Integer { digits: 2 }, "", Some(Value::Integer(98)));
        s.next(&mut lcd);
        assert_eq!(s.as_str(), "99");
        s.next(&mut lcd);
        assert_eq!(s.as_str(), "0");
        s.next(&mut lcd);
        assert_eq!(committed(&mut s), Value::Integer(1));
    }

    #[test]
    fn integer_spin_stays_in_range() {
        let (mut s, mut lcd) = open(EditKind::Integer { digits: 3 }, "V", None);
        for _ in 0..2500 {
            s.next(&mut lcd);
            let n = parse_decimal(s.value());
            assert!(n < 1000);
        }
    }

    #[test]
    fn integer_decrement_saturates_at_zero() {
        let (mut s, mut lcd) = open(EditKind::Integer { digits: 4 }, "", Some(Value::Integer(1)));
        s.prev(&mut lcd);
        s.prev(&mut lcd);
        assert_eq!(committed(&mut s), Value::Integer(0));
    }

    #[test]
    fn integer_typing_replaces_initial_value() {
        let (mut s, mut lcd) = open(EditKind::Integer { digits: 4 }, "L", Some(Value::Integer(3)));
        s.digit(1, 0, &mut lcd);
        s.digit(2, 0, &mut lcd);
        assert_eq!(lcd.main(), "L   12");
        assert_eq!(committed(&mut s), Value::Integer(12));
    }

    #[test]
    fn integer_typing_never_exceeds_digit_count() {
        let (mut s, mut lcd) = open(EditKind::Integer { digits: 4 }, "", None);
        for d in [1, 2, 3, 4, 5, 6] {
            s.digit(d, 0, &mut lcd);
            assert!(s.value().len() <= 4);
        }
        assert_eq!(s.as_str(), "3456");
    }

    #[test]
    fn integer_prev_while_typing_deletes_last_digit() {
        let (mut s, mut lcd) = open(EditKind::Integer { digits: 4 }, "", None);
        s.digit(4, 0, &mut lcd);
        s.digit(2, 0, &mut lcd);
        s.prev(&mut lcd);
        assert_eq!(s.as_str(), "4");
        s.prev(&mut lcd);
        assert_eq!(s.as_str(), "");
    }

    #[test]
    fn integer_next_is_ignored_while_typing() {
        let (mut s, mut lcd) = open(EditKind::Integer { digits: 4 }, "V", Some(Value::Integer(3)));
        s.digit(4, 0, &mut lcd);
        s.digit(2, 0, &mut lcd);
        s.next(&mut lcd);
        assert_eq!(lcd.main(), "V   42");
        assert_eq!(committed(&mut s), Value::Integer(42));
    }

    #[test]
    fn integer_empty_commits_zero() {
        let (mut s, _) = open(EditKind::Integer { digits: 3 }, "V", None);
        assert_eq!(committed(&mut s), Value::Integer(0));
    }

    #[test]
    fn integer_too_wide_initial_is_blanked() {
        let (s, _) = open(EditKind::Integer { digits: 2 }, "", Some(Value::Integer(123)));
        assert_eq!(s.as_str(), "");
    }

    // ── Choice ──────────────────────────────────────────────────────────

    const STEPS: &[&str] = &["14", "28", "128"];

    #[test]
    fn choice_renders_right_aligned() {
        let (_, lcd) = open(EditKind::Choice { options: STEPS }, "SS", Some(Value::Choice(2)));
        assert_eq!(lcd.main(), "SS 128");
        assert_eq!(lcd.blink, None);
    }

    #[test]
    fn choice_too_wide_drops_prefix() {
        let (_, lcd) = open(
            EditKind::Choice { options: &["TRACK OFF", "LOCO STOP"] },
            "",
            None,
        );
        assert_eq!(lcd.main(), "TRACK OFF");
    }

    #[test]
    fn choice_steps_cyclically() {
        let (mut s, mut lcd) = open(EditKind::Choice { options: STEPS }, "SS", Some(Value::Choice(2)));
        s.next(&mut lcd);
        assert_eq!(lcd.main(), "SS  14");
        s.prev(&mut lcd);
        s.prev(&mut lcd);
        assert_eq!(committed(&mut s), Value::Choice(1));
    }

    #[test]
    fn choice_out_of_range_initial_falls_back_to_first() {
        let (mut s, _) = open(EditKind::Choice { options: STEPS }, "", Some(Value::Choice(7)));
        assert_eq!(committed(&mut s), Value::Choice(0));
    }

    // ── IP ──────────────────────────────────────────────────────────────

    #[test]
    fn ip_defaults_to_zero_address() {
        let (mut s, _) = open(EditKind::Ip, "", None);
        assert_eq!(s.as_str(), "0.0.0.0");
        assert_eq!(committed(&mut s), Value::Ip([0, 0, 0, 0]));
    }

    #[test]
    fn ip_cursor_skips_dots() {
        let (mut s, mut lcd) = open(EditKind::Ip, "", Some(Value::Ip([10, 0, 0, 1])));
        s.next(&mut lcd);
        assert_eq!(lcd.blink, Some(1));
        s.next(&mut lcd);
        assert_eq!(lcd.blink, Some(3));
        s.prev(&mut lcd);
        assert_eq!(lcd.blink, Some(1));
    }

    #[test]
    fn ip_typing_replaces_octet_and_advances() {
        let (mut s, mut lcd) = open(EditKind::Ip, "", Some(Value::Ip([192, 168, 4, 1])));
        s.digit(1, 0, &mut lcd);
        assert_eq!(s.as_str(), "1.168.4.1");
        s.digit(0, 0, &mut lcd);
        s.digit(0, 0, &mut lcd);
        assert_eq!(s.as_str(), "100.168.4.1");
        // Cursor moved onto the next octet.
        s.digit(5, 0, &mut lcd);
        assert_eq!(s.as_str(), "100.5.4.1");
        assert_eq!(committed(&mut s), Value::Ip([100, 5, 4, 1]));
    }

    #[test]
    fn ip_overflowing_octet_is_clamped() {
        let (mut s, mut lcd) = open(EditKind::Ip, "", Some(Value::Ip([1, 2, 3, 4])));
        for _ in 0..3 {
            s.digit(9, 0, &mut lcd);
        }
        assert_eq!(s.as_str(), "255.2.3.4");
        // A fourth digit lands in the next octet, not the previous one.
        s.digit(9, 0, &mut lcd);
        assert_eq!(s.as_str(), "255.9.3.4");
    }

    #[test]
    fn ip_last_octet_overflow_keeps_four_octets() {
        let (mut s, mut lcd) = open(EditKind::Ip, "", Some(Value::Ip([1, 2, 3, 4])));
        for _ in 0..6 {
            s.next(&mut lcd);
        }
        for _ in 0..7 {
            s.digit(9, 0, &mut lcd);
        }
        assert_eq!(committed(&mut s), Value::Ip([1, 2, 3, 9]));
    }

    #[test]
    fn ip_any_digit_sequence_parses_to_valid_octets() {
        let (mut s, mut lcd) = open(EditKind::Ip, "IP", None);
        let keys = [9, 9, 9, 9, 9, 9, 9, 1, 2, 8, 7, 6, 5, 4, 3, 2, 1];
        for (i, key) in keys.iter().enumerate() {
            s.digit(*key, 0, &mut lcd);
            if i % 5 == 4 {
                s.prev(&mut lcd);
            }
            let dots = s.value().iter().filter(|c| **c == b'.').count();
            assert_eq!(dots, 3);
            assert!(s.value().len() <= IP_TEXT_LEN);
        }
        assert!(matches!(committed(&mut s), Value::Ip(_)));
    }

    // ── Session bounds ──────────────────────────────────────────────────

    #[test]
    fn oversized_prefix_is_dropped() {
        let (s, _) = open(
            EditKind::Text { max_len: 30 },
            "PREFIX",
            Some(Value::text("x")),
        );
        assert_eq!(s.as_str(), "x");
    }

    #[test]
    fn oversized_field_is_rejected() {
        let mut s = EditSession::new();
        assert_eq!(
            s.open(Page::Edit, EditKind::Text { max_len: 40 }, "", None),
            Err(Error::FieldTooLong)
        );
        assert_eq!(
            s.open(Page::Edit, EditKind::Integer { digits: 12 }, "", None),
            Err(Error::FieldTooLong)
        );
    }

    #[test]
    fn mismatched_initial_uses_blank_value() {
        let (s, _) = open(EditKind::Integer { digits: 4 }, "L", Some(Value::text("abc")));
        assert_eq!(s.as_str(), "L");
    }

    #[test]
    fn commit_returns_to_caller_once() {
        let (mut s, _) = open(EditKind::Integer { digits: 4 }, "", None);
        assert_eq!(s.commit().0, Page::Sequence);
        assert_eq!(s.caller(), Page::None);
    }
}
