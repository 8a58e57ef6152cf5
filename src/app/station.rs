//! Command-station link: requests the throttle queues and the
//! notifications it reacts to.
//!
//! The wire codec lives outside the library; the firmware drains
//! [`Outbox`] and feeds decoded [`Notification`]s back into the throttle.

use crate::config::OUTBOX_DEPTH;
use crate::error::Error;
use heapless::Deque;

/// Central-state bits reported with a power notification.
pub mod status {
    pub const EMERGENCY_STOP: u8 = 0x01;
    pub const TRACK_OFF: u8 = 0x02;
    pub const SHORT_CIRCUIT: u8 = 0x04;
    pub const SERVICE_MODE: u8 = 0x08;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    Normal,
    TrackOff,
    EmergencyStop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// `speed` is the DCC speed byte, bit 7 set for forward.
    SetSpeed { addr: u16, steps: u8, speed: u8 },
    /// `states` carries every function bit; `index` is the one that changed.
    SetFunction { addr: u16, index: u8, states: u32 },
    /// `index` is zero based.
    SetTurnout { index: u16, straight: bool, active: bool },
    ReadCv { cv: u16 },
    WriteCv { cv: u16, value: u8 },
    WritePomCv { addr: u16, cv: u16, value: u8 },
    SetPower(PowerMode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notification {
    /// Central-state bits, see [`status`].
    Power(u8),
    /// Service-mode answer for a read or write.
    CvResult { cv: u16, value: u8 },
    /// The decoder did not acknowledge a service-mode operation.
    CvNack,
    /// Another throttle drove `addr`; `value` is the raw speed byte.
    ExtSpeed { addr: u16, steps: u8, value: u8 },
    /// Another throttle switched the functions selected by `mask`.
    ExtFunc { addr: u16, mask: u32, states: u32 },
    /// Another throttle took over `addr`.
    ExtControl { addr: u16 },
}

/// Bounded request queue between the UI and the link task.
pub struct Outbox {
    queue: Deque<Request, OUTBOX_DEPTH>,
}

impl Outbox {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
        }
    }

    pub fn push(&mut self, request: Request) -> Result<(), Error> {
        self.queue.push_back(request).map_err(|_| {
            warn!("outbox full, dropping {}", request);
            Error::OutboxFull
        })
    }

    pub fn pop(&mut self) -> Option<Request> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}
