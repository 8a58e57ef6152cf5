//! Track power state as seen by the throttle.

use crate::app::settings::StopMode;
use crate::app::station::{status, PowerMode};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TrackState {
    #[default]
    Normal,
    Stopped,
    ShortCircuit,
}

impl TrackState {
    /// The back key with no loco to stop: stop a running layout, restart a
    /// stopped or shorted one.
    pub fn toggled(self, mode: StopMode) -> (TrackState, PowerMode) {
        match self {
            TrackState::Normal => {
                let power = match mode {
                    StopMode::TrackOff => PowerMode::TrackOff,
                    StopMode::LocoStop => PowerMode::EmergencyStop,
                };
                (TrackState::Stopped, power)
            }
            TrackState::Stopped | TrackState::ShortCircuit => (TrackState::Normal, PowerMode::Normal),
        }
    }

    /// State implied by a power notification; `None` when the bits say
    /// nothing about the track.
    pub fn from_status(bits: u8) -> Option<TrackState> {
        if bits == 0 {
            Some(TrackState::Normal)
        } else if bits & (status::EMERGENCY_STOP | status::TRACK_OFF) != 0 {
            Some(TrackState::Stopped)
        } else if bits & status::SHORT_CIRCUIT != 0 {
            Some(TrackState::ShortCircuit)
        } else {
            None
        }
    }
}
