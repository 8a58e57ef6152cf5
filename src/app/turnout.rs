//! Turnout page: switch the turnout whose number is shown.
//!
//! next sets the straight route and prev the diverging one; both keys
//! report press and release so the command station can drive the coil
//! while the key is down. Typing a digit opens the editor on a new
//! turnout number.

use crate::app::settings::Sections;
use crate::app::station::Request;
use crate::app::{text, ModeIndicator, Panel, Session};
use crate::config::{MAX_TURNOUT_ID, STRING_LEN};
use crate::ui::edit::EditKind;
use crate::ui::label_text;
use crate::ui::page::{Frame, ThrottlePage};
use crate::ui::{Align, Display, Page, Value};
use core::fmt::Write;
use heapless::String;

/// Digits of the turnout number.
const ID_DIGITS: u8 = 4;

/// Keep a typed number within the addressable range.
pub fn clamp_id(id: u32) -> u16 {
    id.clamp(1, MAX_TURNOUT_ID as u32) as u16
}

#[derive(Default)]
pub struct TurnoutPage;

impl TurnoutPage {
    fn show_id<D: Display>(&self, f: &mut Frame<'_, Session, D>) {
        let prefix = label_text(Some(&text::P_TURNOUT), f.ui.language());
        let mut line: String<STRING_LEN> = String::new();
        if write!(line, "{:<2}{:04}", prefix, f.ctx.config.turnout_id).is_err() {
            warn!("turnout line truncated");
        }
        f.lcd.show_main(&line, None, Align::Left);
    }

    fn switch<D: Display + Panel>(&self, f: &mut Frame<'_, Session, D>, straight: bool, pressed: bool) {
        let id = f.ctx.config.turnout_id;
        if pressed {
            info!("turnout {} {}", id, if straight { "straight" } else { "diverging" });
            self.show_id(f);
            f.lcd.show_mode(ModeIndicator::Turnout { straight });
        }
        let request = Request::SetTurnout {
            index: id.saturating_sub(1),
            straight,
            active: pressed,
        };
        if let Err(e) = f.ctx.send(request) {
            error!("turnout request lost: {}", e);
        }
    }
}

impl<D: Display + Panel> ThrottlePage<Session, D> for TurnoutPage {
    fn begin(&mut self, f: &mut Frame<'_, Session, D>) {
        self.show_id(f);
        f.lcd.show_bottom(None, Align::Center);
        f.lcd.show_mode(ModeIndicator::Turnout { straight: true });
        f.lcd.show_track(f.ctx.track);
    }

    fn resume(&mut self, f: &mut Frame<'_, Session, D>, value: Option<Value>) {
        if let Some(id) = value.as_ref().and_then(Value::as_integer) {
            f.ctx.config.turnout_id = clamp_id(id);
            f.ctx.mark(Sections::CONFIG);
        }
        self.begin(f);
    }

    fn exit(&mut self, f: &mut Frame<'_, Session, D>) {
        f.lcd.show_mode(ModeIndicator::Off);
    }

    fn next(&mut self, f: &mut Frame<'_, Session, D>, pressed: bool) {
        self.switch(f, true, pressed);
    }

    fn prev(&mut self, f: &mut Frame<'_, Session, D>, pressed: bool) {
        self.switch(f, false, pressed);
    }

    fn stop(&mut self, f: &mut Frame<'_, Session, D>) {
        let state = f.ctx.toggle_track();
        f.lcd.show_track(state);
    }

    fn digit(&mut self, f: &mut Frame<'_, Session, D>, digit: u8) {
        let prefix = label_text(Some(&text::P_TURNOUT), f.ui.language());
        let kind = EditKind::Integer { digits: ID_DIGITS };
        match f.ui.open_editor(f.lcd, Page::Turnout, kind, prefix, None) {
            Ok(()) => f.ui.edit_digit(f.lcd, digit, f.now),
            Err(e) => error!("turnout entry failed: {}", e),
        }
    }

    fn repeats_on_release(&self) -> bool {
        true
    }
}
