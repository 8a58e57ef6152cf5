//! Integration tests for the handthrottle facade, driven key by key.

use handthrottle::app::settings::{ConfigDb, Sections};
use handthrottle::app::station::{status, Notification, Request};
use handthrottle::app::track::TrackState;
use handthrottle::app::{Heading, ModeIndicator, Panel};
use handthrottle::ui::{Align, Display, Event, Page};
use handthrottle::Throttle;
use heapless::String;

/// Display that keeps the last frame and indicator state.
#[derive(Default)]
struct Handset {
    main: String<64>,
    bottom: String<64>,
    throttle: Option<u8>,
    heading: Option<Heading>,
    mode: ModeIndicator,
    track: TrackState,
}

impl Display for Handset {
    fn show_main(&mut self, text: &str, _blink: Option<usize>, _align: Align) {
        self.main.clear();
        let _ = self.main.push_str(text);
    }

    fn show_bottom(&mut self, text: Option<&str>, _align: Align) {
        self.bottom.clear();
        let _ = self.bottom.push_str(text.unwrap_or(""));
    }

    fn begin_batch(&mut self) {}

    fn commit_batch(&mut self) {}

    fn show_shift_indicator(&mut self, _active: bool) {}
}

impl Panel for Handset {
    fn show_throttle(&mut self, notch: Option<u8>) {
        self.throttle = notch;
    }

    fn show_heading(&mut self, heading: Option<Heading>) {
        self.heading = heading;
    }

    fn show_function(&mut self, _index: u8, _on: bool) {}

    fn show_shift(&mut self, _active: bool, _second_bank: bool) {}

    fn show_mode(&mut self, mode: ModeIndicator) {
        self.mode = mode;
    }

    fn show_track(&mut self, state: TrackState) {
        self.track = state;
    }
}

struct Rig {
    throttle: Throttle,
    lcd: Handset,
    now: u64,
}

impl Rig {
    fn new(config: ConfigDb) -> Self {
        let mut throttle = Throttle::new(config);
        let mut lcd = Handset::default();
        throttle.start(&mut lcd, 0);
        Self {
            throttle,
            lcd,
            now: 0,
        }
    }

    fn english() -> Self {
        Self::new(ConfigDb {
            language: 0,
            ..ConfigDb::default()
        })
    }

    fn press(&mut self, key: fn(bool) -> Event) {
        self.now += 50;
        self.throttle.handle(key(true), self.now, &mut self.lcd);
        self.throttle.handle(key(false), self.now, &mut self.lcd);
    }

    fn type_number(&mut self, digits: &[u8]) {
        for &d in digits {
            self.now += 50;
            self.throttle.handle(Event::Digit(d, true), self.now, &mut self.lcd);
            self.throttle.handle(Event::Digit(d, false), self.now, &mut self.lcd);
        }
    }

    fn notify(&mut self, notification: Notification) {
        self.throttle.notify(notification, self.now, &mut self.lcd);
    }

    fn sent(&mut self) -> Vec<Request> {
        core::iter::from_fn(|| self.throttle.pop_request()).collect()
    }

    fn main(&self) -> &str {
        self.lcd.main.as_str()
    }

    fn bottom(&self) -> &str {
        self.lcd.bottom.as_str()
    }
}

#[test]
fn locked_menu_opens_only_with_the_pin() {
    let mut rig = Rig::new(ConfigDb {
        language: 0,
        child_level: 2,
        child_pin: 1234,
        ..ConfigDb::default()
    });
    rig.press(Event::Menu);
    assert_eq!(rig.main(), "LOCO");

    rig.press(Event::Enter);
    assert_eq!(rig.throttle.page(), Page::Edit);
    assert_eq!(rig.bottom(), "PASSWORD");
    rig.type_number(&[0, 0, 0, 0]);
    rig.press(Event::Enter);
    assert_eq!(rig.throttle.page(), Page::Menu);
    assert_eq!(rig.main(), "LOCO");

    rig.press(Event::Enter);
    rig.type_number(&[1, 2, 3, 4]);
    rig.press(Event::Enter);
    assert_eq!(rig.throttle.page(), Page::Menu);
    assert_eq!(rig.main(), "NEW");
}

#[test]
fn setting_a_child_lock_returns_to_user_interface() {
    let mut rig = Rig::english();
    rig.press(Event::Menu);
    rig.press(Event::Prev);
    assert_eq!(rig.main(), "SETTINGS");
    rig.press(Event::Enter);
    rig.press(Event::Next);
    rig.press(Event::Next);
    assert_eq!(rig.main(), "USER INTERFACE");
    rig.press(Event::Enter);
    rig.press(Event::Next);
    rig.press(Event::Enter);
    rig.press(Event::Next);
    assert_eq!(rig.main(), "PROG ");

    rig.press(Event::Enter);
    rig.type_number(&[1, 2, 3, 4]);
    rig.press(Event::Enter);
    assert_eq!(rig.main(), "CHILD LOCK");
    assert_eq!(rig.throttle.config().child_level, 1);
    assert_eq!(rig.throttle.config().child_pin, 1234);
    assert!(rig.throttle.take_dirty().contains(Sections::CONFIG));

    // Level 1 keeps the loco menu open but guards the settings.
    rig.press(Event::Back);
    rig.press(Event::Back);
    assert_eq!(rig.main(), "SETTINGS");
    rig.press(Event::Enter);
    assert_eq!(rig.throttle.page(), Page::Edit);
    rig.type_number(&[1, 2, 3, 4]);
    rig.press(Event::Enter);
    assert_eq!(rig.main(), "STOP MODE");
}

#[test]
fn new_loco_wizard_adds_to_the_library() {
    let mut rig = Rig::english();
    rig.press(Event::Menu);
    rig.press(Event::Enter);
    assert_eq!(rig.main(), "NEW");
    rig.press(Event::Enter);
    assert_eq!(rig.throttle.page(), Page::Edit);
    assert_eq!(rig.bottom(), "NAME");

    rig.press(Event::Enter);
    assert_eq!(rig.bottom(), "ADDRESS");
    rig.type_number(&[5, 2]);
    rig.press(Event::Enter);
    assert_eq!(rig.bottom(), "SPEED STEPS");
    rig.press(Event::Enter);

    assert_eq!(rig.throttle.page(), Page::Menu);
    assert_eq!(rig.main(), "NEW");
    let library = &rig.throttle.config().library;
    assert_eq!(library.len(), 2);
    assert_eq!(library.current().map(|l| l.addr), Some(52));
    assert!(rig.throttle.take_dirty().contains(Sections::LOCO_DB));
}

#[test]
fn duplicate_address_is_asked_again() {
    let mut rig = Rig::english();
    rig.press(Event::Menu);
    rig.press(Event::Enter);
    rig.press(Event::Enter);
    rig.press(Event::Enter);
    rig.type_number(&[3]);
    rig.press(Event::Enter);
    rig.press(Event::Enter);

    assert_eq!(rig.throttle.page(), Page::Error);
    assert_eq!(rig.main(), "ERR 10");
    assert_eq!(rig.bottom(), "LOCO EXIST");

    rig.press(Event::Enter);
    assert_eq!(rig.throttle.page(), Page::Edit);
    assert_eq!(rig.bottom(), "ADDRESS");
    rig.type_number(&[4]);
    rig.press(Event::Enter);
    rig.press(Event::Enter);
    assert_eq!(rig.throttle.config().library.len(), 2);
}

#[test]
fn cv_programming_waits_for_the_station() {
    let mut rig = Rig::english();
    rig.press(Event::Menu);
    rig.press(Event::Next);
    rig.press(Event::Enter);
    assert_eq!(rig.main(), "CV MODIFICATION");
    rig.press(Event::Enter);
    rig.type_number(&[2, 9]);
    rig.press(Event::Enter);

    assert_eq!(rig.throttle.page(), Page::Sequence);
    assert_eq!(rig.sent(), [Request::ReadCv { cv: 29 }]);

    // Keys are ignored while parked.
    rig.type_number(&[7]);
    assert_eq!(rig.throttle.page(), Page::Sequence);

    rig.notify(Notification::CvResult { cv: 29, value: 3 });
    assert_eq!(rig.throttle.page(), Page::Edit);
    assert_eq!(rig.bottom(), "VALUE");
    assert_eq!(rig.main(), "V    3");

    rig.type_number(&[5]);
    rig.press(Event::Enter);
    assert_eq!(rig.sent(), [Request::WriteCv { cv: 29, value: 5 }]);
    rig.notify(Notification::CvResult { cv: 29, value: 5 });
    assert_eq!(rig.throttle.page(), Page::Menu);
    assert_eq!(rig.main(), "CV MODIFICATION");
}

#[test]
fn refused_cv_read_still_asks_for_the_value() {
    let mut rig = Rig::english();
    rig.press(Event::Menu);
    rig.press(Event::Next);
    rig.press(Event::Enter);
    rig.press(Event::Enter);
    rig.type_number(&[2, 9]);
    rig.press(Event::Enter);
    assert_eq!(rig.sent(), [Request::ReadCv { cv: 29 }]);

    rig.notify(Notification::CvNack);
    assert_eq!(rig.throttle.page(), Page::Error);
    assert_eq!(rig.main(), "ERR  2");
    assert_eq!(rig.bottom(), "NO ACK");

    rig.press(Event::Enter);
    assert_eq!(rig.throttle.page(), Page::Edit);
    assert_eq!(rig.bottom(), "VALUE");
    assert_eq!(rig.main(), "V    0");
}

#[test]
fn refused_cv_write_keeps_no_ack_on_screen() {
    let mut rig = Rig::english();
    rig.press(Event::Menu);
    rig.press(Event::Next);
    rig.press(Event::Enter);
    rig.press(Event::Enter);
    rig.type_number(&[2, 9]);
    rig.press(Event::Enter);
    rig.notify(Notification::CvResult { cv: 29, value: 3 });
    rig.type_number(&[5]);
    rig.press(Event::Enter);
    assert_eq!(rig.sent(), [Request::ReadCv { cv: 29 }, Request::WriteCv { cv: 29, value: 5 }]);

    rig.notify(Notification::CvNack);
    assert_eq!(rig.throttle.page(), Page::Error);
    assert_eq!(rig.main(), "ERR  2");

    rig.throttle.handle(Event::Timeout, rig.now + 6_000, &mut rig.lcd);
    assert_eq!(rig.throttle.page(), Page::Error);
    assert_eq!(rig.main(), "ERR  2");
    assert_eq!(rig.bottom(), "NO ACK");
}

#[test]
fn silent_station_raises_no_response() {
    let mut rig = Rig::english();
    rig.press(Event::Menu);
    rig.press(Event::Next);
    rig.press(Event::Enter);
    rig.press(Event::Enter);
    rig.press(Event::Enter);
    assert_eq!(rig.throttle.page(), Page::Sequence);

    let parked = rig.now;
    rig.throttle.handle(Event::Timeout, parked + 1_000, &mut rig.lcd);
    assert_eq!(rig.throttle.page(), Page::Sequence);
    rig.throttle.handle(Event::Timeout, parked + 6_000, &mut rig.lcd);
    assert_eq!(rig.throttle.page(), Page::Error);
    assert_eq!(rig.main(), "ERR  1");
    assert_eq!(rig.bottom(), "NO RESPONCE");
}

#[test]
fn turnout_number_is_typed_and_switched() {
    let mut rig = Rig::english();
    rig.press(Event::Mode);
    assert_eq!(rig.throttle.page(), Page::Turnout);
    rig.type_number(&[1, 5]);
    rig.press(Event::Enter);
    assert_eq!(rig.main(), "T 0015");

    rig.press(Event::Next);
    assert_eq!(
        rig.sent(),
        [
            Request::SetTurnout {
                index: 14,
                straight: true,
                active: true
            },
            Request::SetTurnout {
                index: 14,
                straight: true,
                active: false
            },
        ]
    );
    assert_eq!(rig.lcd.mode, ModeIndicator::Turnout { straight: true });
}

#[test]
fn station_reports_reach_the_panel() {
    let mut rig = Rig::english();
    rig.notify(Notification::Power(status::SHORT_CIRCUIT));
    assert_eq!(rig.throttle.track(), TrackState::ShortCircuit);
    assert_eq!(rig.lcd.track, TrackState::ShortCircuit);

    rig.notify(Notification::ExtSpeed {
        addr: 3,
        steps: 128,
        value: 0x80 | 127,
    });
    assert_eq!(rig.lcd.throttle, Some(21));
    assert_eq!(rig.lcd.heading, Some(Heading::Forward));

    // Another address leaves the shown loco alone.
    rig.notify(Notification::ExtSpeed {
        addr: 9,
        steps: 128,
        value: 0,
    });
    assert_eq!(rig.lcd.throttle, Some(21));

    // Back with the loco running stops it; the track stays as reported.
    rig.press(Event::Back);
    assert_eq!(rig.lcd.throttle, Some(0));
    assert_eq!(rig.throttle.track(), TrackState::ShortCircuit);
}
