//! Field handlers and the loco record list behind the static menus.
//!
//! Settings that map one-to-one onto a [`ConfigDb`] member use
//! [`ConfigField`] with a getter/setter pair. The loco wizard, CV
//! programming and the child lock have their own handlers since their
//! writes reach further than one member.

use crate::app::faults::{self, LOCO_ADDRESS_FIELD};
use crate::app::flags::{LOCK_LIB, LOCK_SET};
use crate::app::library::{Loco, SpeedSteps};
use crate::app::menus;
use crate::app::settings::{ConfigDb, Sections, StopMode};
use crate::app::station::Request;
use crate::app::Session;
use crate::config::{LANGUAGES, MAX_CHILD_LEVEL, MAX_CV_NUMBER, STRING_LEN};
use crate::error::LibraryError;
use crate::ui::flags;
use crate::ui::menu::{MenuAction, RecordList};
use crate::ui::sequence::{FieldHandler, WizardField, WriteOutcome};
use crate::ui::{Fault, Value};
use heapless::String;

/// A setting stored in one [`ConfigDb`] member.
pub struct ConfigField {
    pub section: Sections,
    /// The engine has to pick the change up (language).
    pub apply: bool,
    pub get: fn(&ConfigDb) -> Value,
    pub set: fn(&mut ConfigDb, &Value),
}

impl FieldHandler<Session> for ConfigField {
    fn read(&self, s: &mut Session, _flags: u32) -> Option<Value> {
        Some((self.get)(&s.config))
    }

    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        (self.set)(&mut s.config, value);
        s.mark(self.section);
        s.engine_stale |= self.apply;
        WriteOutcome::Accepted
    }
}

fn set_text(out: &mut String<STRING_LEN>, value: &Value) {
    if let Some(text) = value.as_text() {
        out.clear();
        for c in text.chars() {
            if out.push(c).is_err() {
                break;
            }
        }
    }
}

fn set_ip(out: &mut [u8; 4], value: &Value) {
    if let Some(octets) = value.as_ip() {
        *out = octets;
    }
}

pub static SSID: ConfigField = ConfigField {
    section: Sections::WIFI,
    apply: false,
    get: |db| Value::text(&db.wifi.ssid),
    set: |db, v| set_text(&mut db.wifi.ssid, v),
};

pub static PASSWORD: ConfigField = ConfigField {
    section: Sections::WIFI,
    apply: false,
    get: |db| Value::text(&db.wifi.password),
    set: |db, v| set_text(&mut db.wifi.password, v),
};

pub static DHCP: ConfigField = ConfigField {
    section: Sections::WIFI,
    apply: false,
    get: |db| Value::Choice(db.wifi.dhcp as u8),
    set: |db, v| {
        if let Some(i) = v.as_choice() {
            db.wifi.dhcp = i != 0;
        }
    },
};

pub static IP: ConfigField = ConfigField {
    section: Sections::WIFI,
    apply: false,
    get: |db| Value::Ip(db.wifi.ip),
    set: |db, v| set_ip(&mut db.wifi.ip, v),
};

pub static MASK: ConfigField = ConfigField {
    section: Sections::WIFI,
    apply: false,
    get: |db| Value::Ip(db.wifi.mask),
    set: |db, v| set_ip(&mut db.wifi.mask, v),
};

pub static GATEWAY: ConfigField = ConfigField {
    section: Sections::WIFI,
    apply: false,
    get: |db| Value::Ip(db.wifi.gateway),
    set: |db, v| set_ip(&mut db.wifi.gateway, v),
};

pub static STATION_IP: ConfigField = ConfigField {
    section: Sections::WIFI,
    apply: false,
    get: |db| Value::Ip(db.wifi.station_ip),
    set: |db, v| set_ip(&mut db.wifi.station_ip, v),
};

pub static WEB_PAGE: ConfigField = ConfigField {
    section: Sections::CONFIG,
    apply: false,
    get: |db| Value::Choice(db.show_web_page as u8),
    set: |db, v| {
        if let Some(i) = v.as_choice() {
            db.show_web_page = i != 0;
        }
    },
};

pub static STOP_MODE: ConfigField = ConfigField {
    section: Sections::CONFIG,
    apply: false,
    get: |db| Value::Choice(db.stop_mode.index()),
    set: |db, v| {
        if let Some(mode) = v.as_choice().and_then(StopMode::from_index) {
            db.stop_mode = mode;
        }
    },
};

pub static LANGUAGE: ConfigField = ConfigField {
    section: Sections::CONFIG,
    apply: true,
    get: |db| Value::Choice(db.language),
    set: |db, v| {
        if let Some(i) = v.as_choice().filter(|&i| (i as usize) < LANGUAGES) {
            db.language = i;
        }
    },
};

pub static IDLE_TIME: ConfigField = ConfigField {
    section: Sections::CONFIG,
    apply: false,
    get: |db| Value::Integer(db.idle_time_min as u32),
    set: |db, v| {
        if let Some(n) = v.as_integer() {
            db.idle_time_min = n.min(u8::MAX as u32) as u8;
        }
    },
};

pub static CONTRAST: ConfigField = ConfigField {
    section: Sections::CONFIG,
    apply: false,
    get: |db| Value::Integer(db.contrast as u32),
    set: |db, v| {
        if let Some(n) = v.as_integer() {
            db.contrast = n.min(u8::MAX as u32) as u8;
        }
    },
};

/// Index of the record being edited, `None` for a new loco.
fn editing(flags: u32) -> Option<usize> {
    (flags::action(flags) == flags::EDIT_RECORD).then(|| flags::record_index(flags))
}

/// First loco field: loads the draft from the edited record or clears it.
pub struct LocoName;

impl FieldHandler<Session> for LocoName {
    fn read(&self, s: &mut Session, flags: u32) -> Option<Value> {
        match editing(flags).and_then(|i| s.config.library.get(i)) {
            Some(loco) => {
                s.draft = loco.clone();
                Some(Value::text(&loco.name))
            }
            None => {
                s.draft = Loco::default();
                None
            }
        }
    }

    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        if let Some(name) = value.as_text() {
            s.draft.set_name(name);
        }
        WriteOutcome::Accepted
    }
}

pub struct LocoAddress;

impl FieldHandler<Session> for LocoAddress {
    fn read(&self, s: &mut Session, _flags: u32) -> Option<Value> {
        Some(Value::Integer(s.draft.addr as u32))
    }

    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        match value.as_integer() {
            Some(addr @ 1..=0xFFFF) => {
                s.draft.addr = addr as u16;
                WriteOutcome::Accepted
            }
            _ => WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(LOCO_ADDRESS_FIELD)),
        }
    }
}

/// Last loco field: stores the draft.
pub struct LocoSteps;

impl FieldHandler<Session> for LocoSteps {
    fn read(&self, s: &mut Session, _flags: u32) -> Option<Value> {
        Some(Value::Choice(s.draft.steps.index()))
    }

    fn write(&self, s: &mut Session, flags: u32, value: &Value) -> WriteOutcome {
        if let Some(steps) = value.as_choice().and_then(SpeedSteps::from_index) {
            s.draft.steps = steps;
        }
        let stored = match editing(flags) {
            Some(index) => s.config.library.replace(index, &s.draft).map(|()| index),
            None => s.config.library.add(s.draft.clone()),
        };
        match stored {
            Ok(index) => {
                info!("loco {} stored at {}", s.draft.addr, index);
                s.config.library.select(index);
                s.mark(Sections::LOCO_DB);
                WriteOutcome::Accepted
            }
            Err(LibraryError::Full) => WriteOutcome::Rejected(faults::LIB_FULL),
            Err(LibraryError::Duplicate(other)) => {
                debug!("address {} taken by record {}", s.draft.addr, other);
                WriteOutcome::Rejected(faults::LOCO_EXIST)
            }
            Err(e) => {
                error!("loco not stored: {}", e);
                WriteOutcome::Rejected(faults::LIB_EMPTY)
            }
        }
    }
}

/// Loco library as a menu level.
pub struct LocoRecords;

impl RecordList<Session> for LocoRecords {
    fn count(&self, s: &Session) -> usize {
        s.config.library.len()
    }

    fn label(&self, s: &Session, index: usize, out: &mut String<STRING_LEN>) {
        if let Some(loco) = s.config.library.get(index) {
            let _ = out.push_str(&loco.name);
        }
    }

    fn delete(&self, s: &mut Session, index: usize) -> Result<(), Fault> {
        match s.config.library.remove(index) {
            Ok(loco) => {
                info!("loco {} deleted", loco.addr);
                s.mark(Sections::LOCO_DB);
                Ok(())
            }
            Err(e) => {
                warn!("delete {} failed: {}", index, e);
                Err(faults::LIB_EMPTY)
            }
        }
    }

    fn fields(&self) -> &'static [WizardField<Session>] {
        &menus::LOCO_FIELDS
    }

    fn empty_fault(&self) -> Option<Fault> {
        Some(faults::LIB_EMPTY)
    }
}

fn cv_in_range(value: &Value) -> Option<u16> {
    value
        .as_integer()
        .filter(|cv| (1..=MAX_CV_NUMBER).contains(cv))
        .map(|cv| cv as u16)
}

fn byte(value: &Value) -> Option<u8> {
    value.as_integer().and_then(|n| u8::try_from(n).ok())
}

/// Service-mode CV number; starts the read of the current value.
pub struct CvNumber;

impl FieldHandler<Session> for CvNumber {
    fn read(&self, s: &mut Session, _flags: u32) -> Option<Value> {
        (s.prog.cv != 0).then(|| Value::Integer(s.prog.cv as u32))
    }

    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        let Some(cv) = cv_in_range(value) else {
            return WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(0));
        };
        s.prog.cv = cv;
        s.prog.value = None;
        if s.send(Request::ReadCv { cv }).is_err() {
            return WriteOutcome::Rejected(faults::CONN_FAULT);
        }
        s.prog.awaiting = Some(cv);
        WriteOutcome::Pending
    }
}

/// Service-mode CV value; waits for the write to be confirmed.
pub struct CvValue;

impl FieldHandler<Session> for CvValue {
    fn read(&self, s: &mut Session, _flags: u32) -> Option<Value> {
        s.prog.value.map(|v| Value::Integer(v as u32))
    }

    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        let Some(byte) = byte(value) else {
            return WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(1));
        };
        let cv = s.prog.cv;
        s.prog.value = Some(byte);
        if s.send(Request::WriteCv { cv, value: byte }).is_err() {
            return WriteOutcome::Rejected(faults::CONN_FAULT);
        }
        s.prog.awaiting = Some(cv);
        WriteOutcome::Pending
    }
}

pub struct PomAddress;

impl FieldHandler<Session> for PomAddress {
    fn read(&self, s: &mut Session, _flags: u32) -> Option<Value> {
        let addr = match s.prog.addr {
            0 => s.config.library.current().map_or(0, |l| l.addr),
            addr => addr,
        };
        (addr != 0).then(|| Value::Integer(addr as u32))
    }

    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        match value.as_integer() {
            Some(addr @ 1..=0xFFFF) => {
                s.prog.addr = addr as u16;
                WriteOutcome::Accepted
            }
            _ => WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(0)),
        }
    }
}

pub struct PomCv;

impl FieldHandler<Session> for PomCv {
    fn read(&self, s: &mut Session, _flags: u32) -> Option<Value> {
        (s.prog.cv != 0).then(|| Value::Integer(s.prog.cv as u32))
    }

    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        match cv_in_range(value) {
            Some(cv) => {
                s.prog.cv = cv;
                WriteOutcome::Accepted
            }
            None => WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(1)),
        }
    }
}

/// Programming on the main has no answer; the write is fire and forget.
pub struct PomValue;

impl FieldHandler<Session> for PomValue {
    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        let Some(byte) = byte(value) else {
            return WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(2));
        };
        let request = Request::WritePomCv {
            addr: s.prog.addr,
            cv: s.prog.cv,
            value: byte,
        };
        match s.send(request) {
            Ok(()) => WriteOutcome::Accepted,
            Err(_) => WriteOutcome::Rejected(faults::CONN_FAULT),
        }
    }
}

/// New child-lock PIN; the level comes from the menu branch.
pub struct ChildLockPin;

impl FieldHandler<Session> for ChildLockPin {
    fn read(&self, s: &mut Session, _flags: u32) -> Option<Value> {
        Some(Value::Integer(s.config.child_pin as u32))
    }

    fn write(&self, s: &mut Session, flags: u32, value: &Value) -> WriteOutcome {
        let Some(pin) = value.as_integer().and_then(|n| u16::try_from(n).ok()) else {
            return WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(0));
        };
        let level = match flags::action(flags) {
            LOCK_LIB => MAX_CHILD_LEVEL,
            LOCK_SET => 1,
            _ => 0,
        };
        info!("child lock level {}", level);
        s.config.child_pin = pin;
        s.config.child_level = level;
        s.mark(Sections::CONFIG);
        s.engine_stale = true;
        WriteOutcome::Accepted
    }
}

pub struct ChildLockOff;

impl MenuAction<Session> for ChildLockOff {
    fn run(&self, s: &mut Session, _flags: u32) -> bool {
        info!("child lock off");
        s.config.child_level = 0;
        s.mark(Sections::CONFIG);
        s.engine_stale = true;
        true
    }
}

/// Factory reset; choice 1 keeps the loco library.
pub struct Reset;

impl FieldHandler<Session> for Reset {
    fn write(&self, s: &mut Session, _flags: u32, value: &Value) -> WriteOutcome {
        let sections = match value.as_choice() {
            Some(1) => Sections::CONFIG | Sections::WIFI,
            Some(2) => Sections::ALL,
            _ => return WriteOutcome::Accepted,
        };
        s.config.reset(sections);
        s.mark(sections);
        s.engine_stale = true;
        WriteOutcome::Accepted
    }
}

pub static LOCO_NAME: LocoName = LocoName;
pub static LOCO_ADDRESS: LocoAddress = LocoAddress;
pub static LOCO_STEPS: LocoSteps = LocoSteps;
pub static LOCO_RECORDS: LocoRecords = LocoRecords;
pub static CV_NUMBER: CvNumber = CvNumber;
pub static CV_VALUE: CvValue = CvValue;
pub static POM_ADDRESS: PomAddress = PomAddress;
pub static POM_CV: PomCv = PomCv;
pub static POM_VALUE: PomValue = PomValue;
pub static CHILD_LOCK_PIN: ChildLockPin = ChildLockPin;
pub static CHILD_LOCK_OFF: ChildLockOff = ChildLockOff;
pub static RESET: Reset = Reset;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::flags::NEW_LOCO;

    fn session() -> Session {
        Session::new(ConfigDb::default())
    }

    fn edit_flags(index: u32) -> u32 {
        flags::EDIT_RECORD | (index << flags::RECORD_SHIFT)
    }

    #[test]
    fn new_loco_is_added_and_selected() {
        let mut s = session();
        assert_eq!(LOCO_NAME.read(&mut s, NEW_LOCO), None);
        LOCO_NAME.write(&mut s, NEW_LOCO, &Value::text("BR52"));
        LOCO_ADDRESS.write(&mut s, NEW_LOCO, &Value::Integer(52));
        let outcome = LOCO_STEPS.write(&mut s, NEW_LOCO, &Value::Choice(1));
        assert_eq!(outcome, WriteOutcome::Accepted);
        let loco = s.config.library.current().unwrap();
        assert_eq!(loco.name.as_str(), "BR52");
        assert_eq!(loco.addr, 52);
        assert_eq!(loco.steps, SpeedSteps::Steps28);
        assert!(s.dirty.contains(Sections::LOCO_DB));
    }

    #[test]
    fn duplicate_address_asks_again_for_the_address() {
        let mut s = session();
        LOCO_NAME.read(&mut s, NEW_LOCO);
        LOCO_ADDRESS.write(&mut s, NEW_LOCO, &Value::Integer(3));
        match LOCO_STEPS.write(&mut s, NEW_LOCO, &Value::Choice(2)) {
            WriteOutcome::Rejected(fault) => {
                assert_eq!(fault.code, 10);
                assert_eq!(fault.retry_field, Some(LOCO_ADDRESS_FIELD));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(s.config.library.len(), 1);
    }

    #[test]
    fn edit_loads_the_record_and_keeps_its_own_address() {
        let mut s = session();
        let flags = edit_flags(0);
        assert_eq!(LOCO_NAME.read(&mut s, flags), Some(Value::text("DEFLT")));
        assert_eq!(LOCO_ADDRESS.read(&mut s, flags), Some(Value::Integer(3)));
        LOCO_NAME.write(&mut s, flags, &Value::text("V200"));
        assert_eq!(
            LOCO_STEPS.write(&mut s, flags, &Value::Choice(0)),
            WriteOutcome::Accepted
        );
        let loco = s.config.library.get(0).unwrap();
        assert_eq!(loco.name.as_str(), "V200");
        assert_eq!(loco.steps, SpeedSteps::Steps14);
        assert_eq!(s.config.library.len(), 1);
    }

    #[test]
    fn deleting_from_an_empty_library_fails() {
        let mut s = session();
        assert_eq!(LOCO_RECORDS.delete(&mut s, 0), Ok(()));
        assert_eq!(LOCO_RECORDS.count(&s), 0);
        assert_eq!(LOCO_RECORDS.delete(&mut s, 0), Err(faults::LIB_EMPTY));
    }

    #[test]
    fn cv_read_is_queued_and_parks() {
        let mut s = session();
        assert_eq!(
            CV_NUMBER.write(&mut s, 0, &Value::Integer(0)),
            WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(0))
        );
        assert_eq!(
            CV_NUMBER.write(&mut s, 0, &Value::Integer(29)),
            WriteOutcome::Pending
        );
        assert_eq!(s.prog.awaiting, Some(29));
        assert_eq!(s.outbox.pop(), Some(Request::ReadCv { cv: 29 }));
        assert_eq!(
            CV_VALUE.write(&mut s, 0, &Value::Integer(256)),
            WriteOutcome::Rejected(faults::WRONG_VALUE.retry_at(1))
        );
    }

    #[test]
    fn pom_write_goes_to_the_chosen_loco() {
        let mut s = session();
        assert_eq!(POM_ADDRESS.read(&mut s, 0), Some(Value::Integer(3)));
        POM_ADDRESS.write(&mut s, 0, &Value::Integer(7));
        POM_CV.write(&mut s, 0, &Value::Integer(3));
        assert_eq!(
            POM_VALUE.write(&mut s, 0, &Value::Integer(12)),
            WriteOutcome::Accepted
        );
        assert_eq!(
            s.outbox.pop(),
            Some(Request::WritePomCv {
                addr: 7,
                cv: 3,
                value: 12
            })
        );
    }

    #[test]
    fn child_lock_level_follows_the_branch() {
        let mut s = session();
        CHILD_LOCK_PIN.write(&mut s, LOCK_LIB, &Value::Integer(1234));
        assert_eq!(s.config.child_level, 2);
        assert_eq!(s.config.child_pin, 1234);
        CHILD_LOCK_PIN.write(&mut s, LOCK_SET, &Value::Integer(1234));
        assert_eq!(s.config.child_level, 1);
        assert!(CHILD_LOCK_OFF.run(&mut s, 0));
        assert_eq!(s.config.child_level, 0);
        assert!(s.engine_stale);
    }

    #[test]
    fn reset_settings_keeps_locos() {
        let mut s = session();
        LOCO_NAME.read(&mut s, NEW_LOCO);
        LOCO_ADDRESS.write(&mut s, NEW_LOCO, &Value::Integer(10));
        LOCO_STEPS.write(&mut s, NEW_LOCO, &Value::Choice(2));
        CONTRAST.write(&mut s, 0, &Value::Integer(300));
        assert_eq!(s.config.contrast, 255);

        RESET.write(&mut s, 0, &Value::Choice(1));
        assert_eq!(s.config.contrast, ConfigDb::default().contrast);
        assert_eq!(s.config.library.len(), 2);

        RESET.write(&mut s, 0, &Value::Choice(2));
        assert_eq!(s.config.library.len(), 1);
    }

    #[test]
    fn language_out_of_range_is_ignored() {
        let mut s = session();
        LANGUAGE.write(&mut s, 0, &Value::Choice(0));
        assert_eq!(s.config.language, 0);
        LANGUAGE.write(&mut s, 0, &Value::Choice(9));
        assert_eq!(s.config.language, 0);
        assert!(s.engine_stale);
    }
}
