//! Runtime configuration and its persisted byte record.
//!
//! Record layout (little-endian, version 1):
//!
//! ```text
//! [version]
//! [ssid len][ssid] [pass len][pass] [dhcp] [ip x4] [mask x4] [gateway x4] [station x4]
//! [stop mode] [language] [child level] [child pin u16] [turnout u16] [idle min] [web] [contrast]
//! [loco count] [selected] { [name len][name] [addr u16] [steps] } * count
//! ```

use core::ops::{BitOr, BitOrAssign};

use crate::app::library::{Library, Loco, SpeedSteps};
use crate::config::{DEFAULT_CONTRAST, DEFAULT_IDLE_TIME_MIN, MAX_CHILD_LEVEL, STRING_LEN};
use crate::error::Error;
use heapless::String;

const RECORD_VERSION: u8 = 1;

/// Upper bound of an encoded record.
pub const RECORD_LEN: usize = 1024;

/// Independently resettable parts of the configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sections(u8);

impl Sections {
    pub const NONE: Sections = Sections(0);
    pub const CONFIG: Sections = Sections(0x01);
    pub const LOCO_DB: Sections = Sections(0x02);
    pub const WIFI: Sections = Sections(0x04);
    pub const ALL: Sections = Sections(0x07);

    pub fn contains(self, other: Sections) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for Sections {
    type Output = Sections;

    fn bitor(self, rhs: Sections) -> Sections {
        Sections(self.0 | rhs.0)
    }
}

impl BitOrAssign for Sections {
    fn bitor_assign(&mut self, rhs: Sections) {
        self.0 |= rhs.0;
    }
}

/// What the back key does to the layout when the track is running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopMode {
    /// Switch track power off.
    #[default]
    TrackOff,
    /// Emergency-stop every loco, track stays powered.
    LocoStop,
}

impl StopMode {
    pub const LABELS: [&'static str; 2] = ["TRACK OFF", "LOCO STOP"];

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(StopMode::TrackOff),
            1 => Some(StopMode::LocoStop),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        self as u8
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wifi {
    pub ssid: String<STRING_LEN>,
    pub password: String<STRING_LEN>,
    pub dhcp: bool,
    pub ip: [u8; 4],
    pub mask: [u8; 4],
    pub gateway: [u8; 4],
    /// Address of the command station.
    pub station_ip: [u8; 4],
}

impl Default for Wifi {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            password: String::new(),
            dhcp: true,
            ip: [192, 168, 0, 100],
            mask: [255, 255, 255, 0],
            gateway: [192, 168, 0, 1],
            station_ip: [192, 168, 0, 111],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfigDb {
    pub wifi: Wifi,
    pub stop_mode: StopMode,
    /// Index into the label tables.
    pub language: u8,
    /// 0 = off, 1 = settings and programming locked, 2 = library locked too.
    pub child_level: u8,
    pub child_pin: u16,
    pub turnout_id: u16,
    pub library: Library,
    /// Minutes without input before the panel sleeps; 0 disables.
    pub idle_time_min: u8,
    pub show_web_page: bool,
    pub contrast: u8,
}

impl Default for ConfigDb {
    fn default() -> Self {
        Self {
            wifi: Wifi::default(),
            stop_mode: StopMode::TrackOff,
            language: 1,
            child_level: 0,
            child_pin: 0,
            turnout_id: 1,
            library: Library::with_default(),
            idle_time_min: DEFAULT_IDLE_TIME_MIN,
            show_web_page: false,
            contrast: DEFAULT_CONTRAST,
        }
    }
}

impl ConfigDb {
    /// Restore factory values for `sections`.
    pub fn reset(&mut self, sections: Sections) {
        let defaults = ConfigDb::default();
        if sections.contains(Sections::CONFIG) {
            info!("reset user config");
            self.stop_mode = defaults.stop_mode;
            self.language = defaults.language;
            self.child_level = defaults.child_level;
            self.child_pin = defaults.child_pin;
            self.turnout_id = defaults.turnout_id;
            self.idle_time_min = defaults.idle_time_min;
            self.show_web_page = defaults.show_web_page;
            self.contrast = defaults.contrast;
        }
        if sections.contains(Sections::LOCO_DB) {
            info!("reset loco library");
            self.library = defaults.library;
        }
        if sections.contains(Sections::WIFI) {
            info!("reset wifi settings");
            self.wifi = defaults.wifi;
        }
    }

    pub fn language(&self) -> usize {
        self.language as usize
    }

    /// Serialize into `buf`; returns the number of bytes written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let mut w = Writer { buf, len: 0 };
        w.u8(RECORD_VERSION)?;

        w.str(&self.wifi.ssid)?;
        w.str(&self.wifi.password)?;
        w.u8(self.wifi.dhcp as u8)?;
        for octets in [self.wifi.ip, self.wifi.mask, self.wifi.gateway, self.wifi.station_ip] {
            w.bytes(&octets)?;
        }

        w.u8(self.stop_mode.index())?;
        w.u8(self.language)?;
        w.u8(self.child_level)?;
        w.u16(self.child_pin)?;
        w.u16(self.turnout_id)?;
        w.u8(self.idle_time_min)?;
        w.u8(self.show_web_page as u8)?;
        w.u8(self.contrast)?;

        w.u8(self.library.len() as u8)?;
        w.u8(self.library.selected() as u8)?;
        for loco in self.library.iter() {
            w.str(&loco.name)?;
            w.u16(loco.addr)?;
            w.u8(loco.steps.index())?;
        }
        Ok(w.len)
    }

    /// Parse a record written by [`ConfigDb::encode`].
    pub fn decode(data: &[u8]) -> Result<Self, Error> {
        let mut r = Reader { data, pos: 0 };
        if r.u8()? != RECORD_VERSION {
            return Err(Error::CorruptRecord);
        }

        let mut db = ConfigDb::default();
        r.string(&mut db.wifi.ssid)?;
        r.string(&mut db.wifi.password)?;
        db.wifi.dhcp = r.u8()? != 0;
        db.wifi.ip = r.octets()?;
        db.wifi.mask = r.octets()?;
        db.wifi.gateway = r.octets()?;
        db.wifi.station_ip = r.octets()?;

        db.stop_mode = StopMode::from_index(r.u8()?).ok_or(Error::CorruptRecord)?;
        db.language = r.u8()?;
        db.child_level = r.u8()?.min(MAX_CHILD_LEVEL);
        db.child_pin = r.u16()?;
        db.turnout_id = r.u16()?;
        db.idle_time_min = r.u8()?;
        db.show_web_page = r.u8()? != 0;
        db.contrast = r.u8()?;

        let count = r.u8()? as usize;
        let selected = r.u8()? as usize;
        db.library.clear();
        for _ in 0..count {
            let mut name: String<STRING_LEN> = String::new();
            r.string(&mut name)?;
            let addr = r.u16()?;
            let steps = SpeedSteps::from_index(r.u8()?).ok_or(Error::CorruptRecord)?;
            db.library.restore(Loco::new(&name, addr, steps))?;
        }
        db.library.select(selected);
        Ok(db)
    }
}

struct Writer<'a> {
    buf: &'a mut [u8],
    len: usize,
}

impl Writer<'_> {
    fn bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let end = self.len + bytes.len();
        let slot = self.buf.get_mut(self.len..end).ok_or(Error::BufferOverflow)?;
        slot.copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }

    fn u8(&mut self, v: u8) -> Result<(), Error> {
        self.bytes(&[v])
    }

    fn u16(&mut self, v: u16) -> Result<(), Error> {
        self.bytes(&v.to_le_bytes())
    }

    fn str(&mut self, s: &str) -> Result<(), Error> {
        self.u8(s.len() as u8)?;
        self.bytes(s.as_bytes())
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        let out = self
            .data
            .get(self.pos..self.pos + n)
            .ok_or(Error::CorruptRecord)?;
        self.pos += n;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, Error> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn octets(&mut self) -> Result<[u8; 4], Error> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    fn string(&mut self, out: &mut String<STRING_LEN>) -> Result<(), Error> {
        let len = self.u8()? as usize;
        let text = core::str::from_utf8(self.take(len)?).map_err(|_| Error::CorruptRecord)?;
        out.clear();
        out.push_str(text).map_err(|_| Error::CorruptRecord)
    }
}
