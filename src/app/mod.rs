//! Application layer - the throttle built on the interaction engine.
//!
//! [`Session`] is the context every menu action, field handler and page
//! works on: the configuration, the loco being edited, the programming
//! track state and the queue of requests for the command station.
//! [`Throttle`] bundles it with the dispatcher and is all the firmware
//! needs to talk to.
//!
//! ## Modules
//!
//! - [`menus`]: the static menu tree and wizard field lists
//! - [`fields`]: field handlers and the loco record list behind them
//! - [`loco`], [`turnout`]: the two throttle pages
//! - [`settings`], [`library`]: persisted configuration
//! - [`station`]: requests and notifications of the command-station link

pub mod faults;
pub mod fields;
pub mod library;
pub mod loco;
pub mod menus;
pub mod settings;
pub mod station;
pub mod text;
pub mod track;
pub mod turnout;

use crate::app::library::Loco;
use crate::app::loco::{speed_from_dcc, LocoPage};
use crate::app::settings::{ConfigDb, Sections};
use crate::app::station::{Notification, Outbox, Request};
use crate::app::track::TrackState;
use crate::app::turnout::TurnoutPage;
use crate::error::Error;
use crate::ui::engine::Ui;
use crate::ui::page::Dispatcher;
use crate::ui::{Display, Page};

/// Menu flag values owned by the application. The record actions come
/// from the engine.
pub mod flags {
    pub use crate::ui::flags::{DELETE_RECORD, EDIT_RECORD};

    pub const NEW_LOCO: u32 = 0x02;
    pub const LOCK_OFF: u32 = 0x05;
    pub const LOCK_SET: u32 = 0x06;
    pub const LOCK_LIB: u32 = 0x07;
}

/// Direction arrow next to the throttle bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Heading {
    Forward,
    Reverse,
    Paused,
}

/// Mode icon in the status row.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeIndicator {
    #[default]
    Off,
    /// `external` blinks the icon: another throttle controls this loco.
    Loco { reverse: bool, external: bool },
    Turnout { straight: bool },
}

/// Status indicators drawn around the text lines.
pub trait Panel {
    /// Throttle bar, `None` hides it.
    fn show_throttle(&mut self, notch: Option<u8>);
    fn show_heading(&mut self, heading: Option<Heading>);
    /// Indicator of function F`index`; the panel folds it onto its slots.
    fn show_function(&mut self, index: u8, on: bool);
    fn show_shift(&mut self, active: bool, second_bank: bool);
    fn show_mode(&mut self, mode: ModeIndicator);
    fn show_track(&mut self, state: TrackState);
}

/// Service-mode programming in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Programming {
    /// Loco address for programming on the main.
    pub addr: u16,
    pub cv: u16,
    /// Last value read or written; `None` while a read is outstanding.
    pub value: Option<u8>,
    /// CV whose answer the parked wizard waits for.
    pub awaiting: Option<u16>,
}

pub struct Session {
    pub(crate) config: ConfigDb,
    /// Loco being built by the NEW or EDIT wizard.
    pub(crate) draft: Loco,
    pub(crate) prog: Programming,
    pub(crate) track: TrackState,
    outbox: Outbox,
    dirty: Sections,
    /// Language or child lock changed and must be pushed into the engine.
    pub(crate) engine_stale: bool,
}

impl Session {
    pub fn new(config: ConfigDb) -> Self {
        Self {
            config,
            draft: Loco::default(),
            prog: Programming::default(),
            track: TrackState::Normal,
            outbox: Outbox::new(),
            dirty: Sections::NONE,
            engine_stale: true,
        }
    }

    pub fn config(&self) -> &ConfigDb {
        &self.config
    }

    pub fn programming(&self) -> &Programming {
        &self.prog
    }

    /// Record that `sections` need saving.
    pub(crate) fn mark(&mut self, sections: Sections) {
        self.dirty |= sections;
    }

    pub(crate) fn send(&mut self, request: Request) -> Result<(), Error> {
        debug!("queue {}", request);
        self.outbox.push(request)
    }

    /// Toggle track power as the back key does when no loco is moving.
    pub(crate) fn toggle_track(&mut self) -> TrackState {
        let (state, power) = self.track.toggled(self.config.stop_mode);
        info!("track {} -> {}", self.track, state);
        self.track = state;
        if let Err(e) = self.send(Request::SetPower(power)) {
            error!("power request lost: {}", e);
        }
        state
    }
}

/// The complete throttle: engine, pages and session.
pub struct Throttle {
    session: Session,
    dispatcher: Dispatcher<Session, LocoPage, TurnoutPage>,
}

impl Throttle {
    pub fn new(config: ConfigDb) -> Self {
        let ui = Ui::new(&faults::NO_RESPONSE);
        let mut throttle = Self {
            session: Session::new(config),
            dispatcher: Dispatcher::new(ui, LocoPage::new(), TurnoutPage, &menus::ROOT),
        };
        throttle.apply_settings();
        throttle
    }

    /// Push language and child lock into the engine.
    fn apply_settings(&mut self) {
        let config = &self.session.config;
        let ui = self.dispatcher.ui_mut();
        ui.set_language(config.language());
        ui.set_child_lock(config.child_level, config.child_pin, &menus::PASSWORD_PROMPT);
        self.session.engine_stale = false;
    }

    /// Show the loco page.
    pub fn start<D: Display + Panel>(&mut self, lcd: &mut D, now: u64) {
        self.dispatcher.start(&mut self.session, lcd, Page::Loco, now);
    }

    pub fn handle<D: Display + Panel>(&mut self, event: crate::ui::Event, now: u64, lcd: &mut D) {
        self.dispatcher.handle(&mut self.session, lcd, event, now);
        if self.session.engine_stale {
            self.apply_settings();
            lcd.begin_batch();
            self.dispatcher.redraw(&mut self.session, lcd, now);
            lcd.commit_batch();
        }
    }

    /// React to a decoded command-station message.
    pub fn notify<D: Display + Panel>(&mut self, notification: Notification, now: u64, lcd: &mut D) {
        lcd.begin_batch();
        self.apply_notification(notification, now, lcd);
        lcd.commit_batch();
    }

    fn apply_notification<D: Display + Panel>(
        &mut self,
        notification: Notification,
        now: u64,
        lcd: &mut D,
    ) {
        let page = self.dispatcher.page();
        let on_throttle_page = matches!(page, Page::Loco | Page::Turnout);
        match notification {
            Notification::Power(bits) => {
                if let Some(state) = TrackState::from_status(bits) {
                    self.session.track = state;
                    if on_throttle_page {
                        lcd.show_track(state);
                    }
                }
            }
            Notification::CvResult { cv, value } => {
                if self.session.prog.awaiting != Some(cv) {
                    debug!("unexpected answer for CV {}", cv);
                    return;
                }
                self.session.prog.awaiting = None;
                self.session.prog.value = Some(value);
                info!("CV {} = {}", cv, value);
                self.dispatcher.complete_pending(&mut self.session, lcd, now);
            }
            Notification::CvNack => {
                if self.session.prog.awaiting.take().is_none() {
                    debug!("service-mode error without a request");
                    return;
                }
                // A failed read still moves on so the value can be typed in.
                if self.session.prog.value.is_none() {
                    self.session.prog.value = Some(0);
                    self.dispatcher.complete_pending(&mut self.session, lcd, now);
                }
                self.dispatcher.ui_mut().cancel_pending();
                self.dispatcher.raise(&mut self.session, lcd, faults::NO_ACK, now);
            }
            Notification::ExtSpeed { addr, steps, value } => {
                let Some(loco) = self.current_loco(addr) else {
                    return;
                };
                loco.speed = speed_from_dcc(value, steps);
                if loco.speed != 0 {
                    loco.reverse = loco.speed < 0;
                }
                if page == Page::Loco {
                    loco::show_motion(Some(&*loco), lcd);
                }
            }
            Notification::ExtFunc { addr, mask, states } => {
                let Some(loco) = self.session.config.library.current_mut().filter(|l| l.addr == addr)
                else {
                    return;
                };
                loco.functions = (loco.functions & !mask) | (states & mask);
                if page == Page::Loco {
                    self.dispatcher.loco().show_functions(Some(&*loco), lcd);
                }
            }
            Notification::ExtControl { addr } => {
                if page != Page::Loco {
                    return;
                }
                if let Some(loco) = self.current_loco(addr) {
                    lcd.show_mode(ModeIndicator::Loco {
                        reverse: loco.reverse,
                        external: true,
                    });
                }
            }
        }
    }

    fn current_loco(&mut self, addr: u16) -> Option<&mut Loco> {
        self.session
            .config
            .library
            .current_mut()
            .filter(|l| l.addr == addr)
    }

    /// Next request for the command station.
    pub fn pop_request(&mut self) -> Option<Request> {
        self.session.outbox.pop()
    }

    /// Sections changed since the last call.
    pub fn take_dirty(&mut self) -> Sections {
        core::mem::take(&mut self.session.dirty)
    }

    pub fn config(&self) -> &ConfigDb {
        &self.session.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn page(&self) -> Page {
        self.dispatcher.page()
    }

    pub fn track(&self) -> TrackState {
        self.session.track
    }

    pub fn idle_time_min(&self) -> u8 {
        self.session.config.idle_time_min
    }
}
