//! The interaction engine.
//!
//! [`Ui`] owns the current page tag and every session: the menu walker,
//! the running wizard, the value editor and the error page. Sub-engines
//! never call their parent; they finish by naming the page that started
//! them and [`Ui::return_to`] routes the result there. Returns to pages
//! the engine does not own (the loco and turnout pages) are parked as a
//! [`Handoff`] for the dispatcher to deliver.

use core::fmt::Write;

use crate::config::{LANGUAGES, SHOW_LEN};
use crate::error::Error;
use crate::ui::edit::{EditKind, EditSession};
use crate::ui::menu::{MenuBack, MenuNode, MenuState, MenuStep};
use crate::ui::sequence::{Submission, WizardField, WizardState, WizardStep};
use crate::ui::{label_text, Align, Display, Fault, Page, Value};
use heapless::String;

/// A result addressed to a page outside the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Handoff {
    pub page: Page,
    /// Committed editor value, or `None` when the page is simply resumed.
    pub value: Option<Value>,
}

#[derive(Clone, Copy)]
struct ErrorState {
    fault: Fault,
    return_page: Page,
}

pub struct Ui<C: 'static> {
    page: Page,
    lang: usize,
    menu: MenuState<C>,
    wizard: Option<WizardState<C>>,
    edit: EditSession,
    error: Option<ErrorState>,
    handoff: Option<Handoff>,
    /// Raised when a parked wizard misses its deadline.
    no_response: &'static Fault,
}

impl<C: 'static> Ui<C> {
    pub fn new(no_response: &'static Fault) -> Self {
        Self {
            page: Page::None,
            lang: 0,
            menu: MenuState::new(),
            wizard: None,
            edit: EditSession::new(),
            error: None,
            handoff: None,
            no_response,
        }
    }

    pub fn page(&self) -> Page {
        self.page
    }

    /// Switch pages without touching any session.
    pub fn set_page(&mut self, page: Page) {
        self.page = page;
    }

    pub fn language(&self) -> usize {
        self.lang
    }

    pub fn set_language(&mut self, lang: usize) {
        if lang < LANGUAGES {
            self.lang = lang;
        } else {
            error!("language {} not supported", lang);
        }
    }

    pub fn set_child_lock(&mut self, level: u8, pin: u16, password: &'static WizardField<C>) {
        self.menu.set_child_lock(level, pin, password);
    }

    pub fn wizard(&self) -> Option<&WizardState<C>> {
        self.wizard.as_ref()
    }

    pub fn menu(&self) -> &MenuState<C> {
        &self.menu
    }

    pub fn edit(&self) -> &EditSession {
        &self.edit
    }

    /// Result waiting for the loco or turnout page.
    pub fn take_handoff(&mut self) -> Option<Handoff> {
        self.handoff.take()
    }

    /// Repaint whichever engine page is current.
    pub fn redraw(&mut self, ctx: &C, lcd: &mut dyn Display) {
        match self.page {
            Page::Menu => self.menu.render(ctx, self.lang, lcd),
            Page::Edit => self.edit.render(lcd),
            Page::Error => {
                if let Some(state) = self.error {
                    self.render_error(lcd, &state.fault);
                }
            }
            _ => {}
        }
    }

    /// Deliver a finished sub-engine's result to `page`.
    pub fn return_to(
        &mut self,
        ctx: &mut C,
        lcd: &mut dyn Display,
        page: Page,
        value: Option<Value>,
        now: u64,
    ) {
        match page {
            Page::Menu => self.menu_back(ctx, lcd, now),
            Page::Sequence => {
                let submission = value.map_or(Submission::Aborted, Submission::Value);
                self.advance_wizard(ctx, lcd, submission, now)
            }
            Page::Edit => {
                self.page = Page::Edit;
                self.edit.render(lcd);
            }
            Page::Password => self.password_entered(ctx, lcd, value.as_ref(), now),
            Page::Loco | Page::Turnout => {
                self.page = page;
                self.handoff = Some(Handoff { page, value });
            }
            Page::None | Page::Error => self.page = page,
        }
    }

    // ── Menu ────────────────────────────────────────────────────────────

    pub fn start_menu(
        &mut self,
        ctx: &C,
        lcd: &mut dyn Display,
        caller: Page,
        root: &'static [MenuNode<C>],
    ) {
        self.menu.start(caller, root);
        self.page = Page::Menu;
        lcd.show_shift_indicator(false);
        self.menu.render(ctx, self.lang, lcd);
    }

    /// Leave the menu from any depth, discarding open wizards and edits.
    pub fn exit_menu(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        if !self.menu.is_active() {
            if self.page == Page::Edit {
                self.edit_cancel(ctx, lcd, now);
            }
            return;
        }
        self.wizard = None;
        self.error = None;
        self.edit.cancel();
        let caller = self.menu.exit();
        lcd.show_bottom(None, Align::Center);
        lcd.show_shift_indicator(false);
        self.return_to(ctx, lcd, caller, None, now);
    }

    pub fn menu_next(&mut self, ctx: &C, lcd: &mut dyn Display) {
        self.menu.next(ctx);
        self.menu.render(ctx, self.lang, lcd);
    }

    pub fn menu_prev(&mut self, ctx: &C, lcd: &mut dyn Display) {
        self.menu.prev(ctx);
        self.menu.render(ctx, self.lang, lcd);
    }

    pub fn menu_enter(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        let step = self.menu.enter(ctx);
        self.apply_menu_step(ctx, lcd, step, now);
    }

    pub fn menu_back(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        match self.menu.back() {
            MenuBack::Redraw => {
                self.page = Page::Menu;
                self.menu.render(ctx, self.lang, lcd);
            }
            MenuBack::Exit(caller) => {
                lcd.show_bottom(None, Align::Center);
                self.return_to(ctx, lcd, caller, None, now);
            }
        }
    }

    fn apply_menu_step(&mut self, ctx: &mut C, lcd: &mut dyn Display, step: MenuStep<C>, now: u64) {
        match step {
            MenuStep::Redraw => {
                self.page = Page::Menu;
                self.menu.render(ctx, self.lang, lcd);
            }
            MenuStep::Ignore => {}
            MenuStep::Challenge(field) => {
                let prefix = field.prefix.map_or("", |p| label_text(Some(p), self.lang));
                match self.open_editor(lcd, Page::Password, field.kind.edit_kind(), prefix, None) {
                    Ok(()) => {
                        if let Some(name) = field.name {
                            lcd.show_bottom(Some(label_text(Some(name), self.lang)), Align::Center);
                        }
                    }
                    Err(e) => {
                        error!("password prompt unavailable: {}", e);
                        self.menu.render(ctx, self.lang, lcd);
                    }
                }
            }
            MenuStep::Wizard { fields, flags } => {
                self.start_wizard(ctx, lcd, Page::Menu, flags, fields, now)
            }
            MenuStep::Back => self.menu_back(ctx, lcd, now),
            MenuStep::Fault(fault) => self.show_error(lcd, fault),
        }
    }

    fn password_entered(
        &mut self,
        ctx: &mut C,
        lcd: &mut dyn Display,
        answer: Option<&Value>,
        now: u64,
    ) {
        self.page = Page::Menu;
        let step = self.menu.answer_challenge(ctx, answer);
        self.apply_menu_step(ctx, lcd, step, now);
    }

    // ── Wizard ──────────────────────────────────────────────────────────

    /// Run `fields` as a wizard and return to `caller` when it ends.
    pub fn start_wizard(
        &mut self,
        ctx: &mut C,
        lcd: &mut dyn Display,
        caller: Page,
        flags: u32,
        fields: &'static [WizardField<C>],
        now: u64,
    ) {
        if fields.is_empty() {
            error!("wizard without fields");
            self.return_to(ctx, lcd, caller, None, now);
            return;
        }
        self.wizard = Some(WizardState::new(caller, flags, fields));
        self.page = Page::Sequence;
        self.begin_field(ctx, lcd, now);
    }

    /// Open the editor on the wizard's current field.
    fn begin_field(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        let Some(wizard) = self.wizard.as_ref() else {
            return;
        };
        let Some(field) = wizard.field() else {
            return;
        };
        let initial = wizard.prepare(ctx);
        let caller = wizard.caller();

        if let Some(name) = field.name {
            lcd.show_bottom(Some(label_text(Some(name), self.lang)), Align::Center);
        }
        let prefix = field.prefix.map_or("", |p| label_text(Some(p), self.lang));
        let opened = self.edit.open(
            Page::Sequence,
            field.kind.edit_kind(),
            prefix,
            initial.as_ref(),
        );
        match opened {
            Ok(()) => {
                self.page = Page::Edit;
                self.edit.render(lcd);
            }
            Err(e) => {
                error!("field cannot be edited: {}", e);
                self.wizard = None;
                lcd.show_bottom(None, Align::Center);
                self.return_to(ctx, lcd, caller, None, now);
            }
        }
    }

    fn advance_wizard(
        &mut self,
        ctx: &mut C,
        lcd: &mut dyn Display,
        submission: Submission,
        now: u64,
    ) {
        let Some(wizard) = self.wizard.as_mut() else {
            warn!("no wizard to advance");
            return;
        };
        match wizard.submit(ctx, submission, now) {
            WizardStep::Next => {
                self.page = Page::Sequence;
                self.begin_field(ctx, lcd, now);
            }
            WizardStep::Parked => self.page = Page::Sequence,
            WizardStep::Finished(caller) | WizardStep::Aborted(caller) => {
                self.wizard = None;
                lcd.show_bottom(None, Align::Center);
                self.return_to(ctx, lcd, caller, None, now);
            }
            WizardStep::Rejected(fault) => {
                self.page = Page::Sequence;
                self.show_error(lcd, fault);
            }
            WizardStep::Ignored => {}
        }
    }

    /// Back on a parked wizard.
    pub fn abort_wizard(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        self.advance_wizard(ctx, lcd, Submission::Aborted, now);
    }

    /// Re-show field `index` of the running wizard.
    pub fn resume_at(&mut self, ctx: &mut C, lcd: &mut dyn Display, index: usize, now: u64) {
        let resumed = self
            .wizard
            .as_mut()
            .is_some_and(|wizard| wizard.resume_at(index));
        if resumed {
            self.error = None;
            self.page = Page::Sequence;
            self.begin_field(ctx, lcd, now);
        }
    }

    /// The operation a parked wizard waits for has completed.
    pub fn complete_pending(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        let parked = self.wizard.as_ref().is_some_and(|w| w.is_parked());
        if parked {
            self.advance_wizard(ctx, lcd, Submission::Satisfied, now);
        } else {
            debug!("completion without a parked wizard");
        }
    }

    /// Stop waiting on a parked wizard without moving it.
    pub fn cancel_pending(&mut self) {
        if let Some(wizard) = self.wizard.as_mut() {
            wizard.cancel_pending();
        }
    }

    /// Raise the no-response fault once a parked wizard misses its deadline.
    pub fn check_pending(&mut self, lcd: &mut dyn Display, now: u64) {
        if let Some(wizard) = self.wizard.as_mut() {
            if wizard.pending_expired(now) {
                wizard.cancel_pending();
                error!("pending operation timed out");
                let fault = *self.no_response;
                self.show_error(lcd, fault);
            }
        }
    }

    // ── Editor ──────────────────────────────────────────────────────────

    /// Open the editor directly; the committed value is returned to `caller`.
    pub fn open_editor(
        &mut self,
        lcd: &mut dyn Display,
        caller: Page,
        kind: EditKind,
        prefix: &str,
        initial: Option<&Value>,
    ) -> Result<(), Error> {
        self.edit.open(caller, kind, prefix, initial)?;
        self.page = Page::Edit;
        self.edit.render(lcd);
        Ok(())
    }

    pub fn edit_next(&mut self, lcd: &mut dyn Display) {
        self.edit.next(lcd);
    }

    pub fn edit_prev(&mut self, lcd: &mut dyn Display) {
        self.edit.prev(lcd);
    }

    pub fn edit_digit(&mut self, lcd: &mut dyn Display, digit: u8, now: u64) {
        self.edit.digit(digit, now, lcd);
    }

    pub fn edit_shift(&mut self, lcd: &mut dyn Display, pressed: bool) {
        self.edit.shift(pressed, lcd);
    }

    pub fn edit_timeout(&mut self, lcd: &mut dyn Display, now: u64) {
        self.edit.timeout(now, lcd);
    }

    pub fn edit_enter(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        let (caller, value) = self.edit.commit();
        lcd.show_shift_indicator(false);
        self.return_to(ctx, lcd, caller, Some(value), now);
    }

    pub fn edit_cancel(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        let caller = self.edit.cancel();
        lcd.show_shift_indicator(false);
        self.return_to(ctx, lcd, caller, None, now);
    }

    // ── Error page ──────────────────────────────────────────────────────

    /// Interrupt the current page with `fault`.
    pub fn show_error(&mut self, lcd: &mut dyn Display, fault: Fault) {
        let return_page = match (self.page, self.error) {
            (Page::Error, Some(previous)) => previous.return_page,
            (page, _) => page,
        };
        warn!("error {} raised on page {}", fault.code, return_page);
        self.error = Some(ErrorState { fault, return_page });
        self.page = Page::Error;
        lcd.show_shift_indicator(false);
        self.render_error(lcd, &fault);
    }

    fn render_error(&self, lcd: &mut dyn Display, fault: &Fault) {
        let mut code: String<SHOW_LEN> = String::new();
        if write!(code, "ERR {:2}", fault.code).is_err() {
            warn!("fault code {} truncated", fault.code);
        }
        lcd.show_main(&code, None, Align::Left);
        lcd.show_bottom(Some(label_text(Some(fault.message), self.lang)), Align::Center);
    }

    /// Acknowledge the error page and go back to where it interrupted.
    pub fn dismiss_error(&mut self, ctx: &mut C, lcd: &mut dyn Display, now: u64) {
        let Some(state) = self.error.take() else {
            return;
        };
        lcd.show_bottom(None, Align::Center);

        if let Some(field) = state.fault.retry_field.filter(|_| self.wizard.is_some()) {
            self.resume_at(ctx, lcd, field, now);
            return;
        }
        match state.return_page {
            Page::Menu | Page::Password => {
                self.page = Page::Menu;
                self.menu.render(ctx, self.lang, lcd);
            }
            Page::Edit => {
                self.page = Page::Edit;
                if let Some(name) = self.wizard.as_ref().and_then(|w| w.field()).and_then(|f| f.name) {
                    lcd.show_bottom(Some(label_text(Some(name), self.lang)), Align::Center);
                }
                self.edit.render(lcd);
            }
            Page::Sequence => match self.wizard.as_ref().map(|w| w.index()) {
                Some(index) => self.resume_at(ctx, lcd, index, now),
                None => self.return_to(ctx, lcd, Page::Menu, None, now),
            },
            page @ (Page::Loco | Page::Turnout) => self.return_to(ctx, lcd, page, None, now),
            Page::None | Page::Error => self.page = Page::None,
        }
    }
}
