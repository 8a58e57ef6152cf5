//! Loco page: drive the selected loco.
//!
//! next/prev step the throttle notch, digits toggle functions (shift and
//! double shift select the F11-F20 and F21-F28 banks), enter toggles F0,
//! back stops the loco and then the layout. With shift held next/prev
//! walk the library instead.

use crate::app::flags::NEW_LOCO;
use crate::app::library::{Loco, SpeedSteps};
use crate::app::station::Request;
use crate::app::{menus, text, Heading, ModeIndicator, Panel, Session};
use crate::config::{LOCO_FUNCTIONS, LOCO_MAX_STEP, SHIFT_DOUBLE_PRESS_MS};
use crate::ui::label_text;
use crate::ui::page::{Frame, ThrottlePage};
use crate::ui::{Align, Display, Page};

/// Function keys per bank.
const BANK_SIZE: u8 = 10;

/// Indicator slot of function F`index`: F0 has its own, the banks share 1-10.
pub fn function_slot(index: u8) -> usize {
    match index {
        0 => 0,
        n => (n as usize - 1) % BANK_SIZE as usize + 1,
    }
}

/// DCC speed byte for the loco's notch, direction in bit 7 (set = forward).
pub fn dcc_speed(loco: &Loco, emergency: bool) -> u8 {
    let notch = loco.speed.unsigned_abs() as u32;
    let max = LOCO_MAX_STEP as u32;
    let speed = if notch == 0 {
        emergency as u8
    } else {
        let (range, offset) = match loco.steps {
            SpeedSteps::Steps14 => (14, 1),
            SpeedSteps::Steps28 => (28, 3),
            SpeedSteps::Steps128 => (126, 1),
        };
        ((notch * range + max / 2) / max + offset) as u8
    };
    if loco.reverse {
        speed
    } else {
        speed | 0x80
    }
}

/// Throttle notch for a speed byte reported by the command station.
pub fn speed_from_dcc(value: u8, steps: u8) -> i8 {
    let steps = if steps < 2 { 128 } else { steps as i32 };
    let max = LOCO_MAX_STEP as i32;
    let magnitude = ((max * (value & 0x7F) as i32 + (steps - 1) / 2) / (steps - 1)).min(max) as i8;
    if value & 0x80 != 0 {
        magnitude
    } else {
        -magnitude
    }
}

/// Throttle bar and direction arrow of `loco`.
pub fn show_motion(loco: Option<&Loco>, panel: &mut impl Panel) {
    let Some(loco) = loco else {
        panel.show_throttle(None);
        panel.show_heading(None);
        return;
    };
    let heading = match loco.speed {
        0 => Heading::Paused,
        s if s > 0 => Heading::Forward,
        _ => Heading::Reverse,
    };
    panel.show_throttle(Some(loco.speed.unsigned_abs()));
    panel.show_heading(Some(heading));
}

fn send_speed(s: &mut Session, emergency: bool) {
    let request = match s.config.library.current() {
        Some(loco) => Request::SetSpeed {
            addr: loco.addr,
            steps: loco.steps.count(),
            speed: dcc_speed(loco, emergency),
        },
        None => return,
    };
    if let Err(e) = s.send(request) {
        error!("speed not sent: {}", e);
    }
}

pub struct LocoPage {
    /// 0, 10 or 20 while shift is held.
    bank: u8,
    /// Shift held: next/prev pick a loco.
    choosing: bool,
    last_shift: Option<u64>,
}

impl LocoPage {
    pub const fn new() -> Self {
        Self {
            bank: 0,
            choosing: false,
            last_shift: None,
        }
    }

    pub fn bank(&self) -> u8 {
        self.bank
    }

    /// F0 plus the ten indicators of the active bank.
    pub fn show_functions(&self, loco: Option<&Loco>, panel: &mut impl Panel) {
        let states = loco.map_or(0, |l| l.functions);
        panel.show_function(0, states & 1 != 0);
        for key in self.bank + 1..=self.bank + BANK_SIZE {
            if key < LOCO_FUNCTIONS {
                panel.show_function(key, states & (1 << key) != 0);
            } else {
                panel.show_function(key - self.bank, false);
            }
        }
    }

    fn show<D: Display + Panel>(&self, f: &mut Frame<'_, Session, D>) {
        let loco = f.ctx.config.library.current();
        match loco {
            Some(l) => f.lcd.show_main(&l.name, None, Align::Center),
            None => f.lcd.show_main(label_text(Some(&text::NEW_Q), f.ui.language()), None, Align::Center),
        }
        f.lcd.show_bottom(None, Align::Center);
        show_motion(loco, f.lcd);
        self.show_functions(loco, f.lcd);
        f.lcd.show_mode(ModeIndicator::Loco {
            reverse: loco.is_some_and(|l| l.reverse),
            external: false,
        });
        f.lcd.show_track(f.ctx.track);
    }

    fn hide(&self, panel: &mut impl Panel) {
        panel.show_throttle(None);
        panel.show_heading(None);
        for slot in 0..=BANK_SIZE {
            panel.show_function(slot, false);
        }
        panel.show_mode(ModeIndicator::Off);
    }

    fn step<D: Display + Panel>(&mut self, f: &mut Frame<'_, Session, D>, up: bool) {
        if self.choosing {
            if up {
                f.ctx.config.library.select_next();
            } else {
                f.ctx.config.library.select_prev();
            }
            self.show(f);
            return;
        }
        let Some(loco) = f.ctx.config.library.current_mut() else {
            return;
        };
        let speed = if up {
            (loco.speed + 1).min(LOCO_MAX_STEP)
        } else {
            (loco.speed - 1).max(-LOCO_MAX_STEP)
        };
        if speed == loco.speed {
            return;
        }
        loco.speed = speed;
        if speed != 0 {
            loco.reverse = speed < 0;
        }
        show_motion(Some(&*loco), f.lcd);
        send_speed(f.ctx, false);
    }

    fn toggle_function<D: Display + Panel>(&mut self, f: &mut Frame<'_, Session, D>, key: u8) {
        let Some(loco) = f.ctx.config.library.current_mut() else {
            return;
        };
        loco.functions ^= 1 << key;
        let on = loco.function(key);
        let request = Request::SetFunction {
            addr: loco.addr,
            index: key,
            states: loco.functions,
        };
        debug!("F{} {}", key, on);
        f.lcd.show_function(key, on);
        if let Err(e) = f.ctx.send(request) {
            error!("function not sent: {}", e);
        }
    }
}

impl Default for LocoPage {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Display + Panel> ThrottlePage<Session, D> for LocoPage {
    fn begin(&mut self, f: &mut Frame<'_, Session, D>) {
        self.show(f);
    }

    fn exit(&mut self, f: &mut Frame<'_, Session, D>) {
        self.bank = 0;
        self.choosing = false;
        self.hide(f.lcd);
    }

    fn next(&mut self, f: &mut Frame<'_, Session, D>, _pressed: bool) {
        self.step(f, true);
    }

    fn prev(&mut self, f: &mut Frame<'_, Session, D>, _pressed: bool) {
        self.step(f, false);
    }

    fn enter(&mut self, f: &mut Frame<'_, Session, D>) {
        if f.ctx.config.library.current().is_some() {
            self.toggle_function(f, 0);
            return;
        }
        info!("new loco from the throttle");
        self.hide(f.lcd);
        f.ui.start_wizard(f.ctx, f.lcd, Page::Loco, NEW_LOCO, &menus::LOCO_FIELDS, f.now);
    }

    fn stop(&mut self, f: &mut Frame<'_, Session, D>) {
        let emergency = self.choosing;
        let moving = match f.ctx.config.library.current_mut() {
            Some(loco) if emergency || loco.speed != 0 => {
                loco.speed = 0;
                show_motion(Some(&*loco), f.lcd);
                true
            }
            _ => false,
        };
        if moving {
            send_speed(f.ctx, emergency);
        } else {
            let state = f.ctx.toggle_track();
            f.lcd.show_track(state);
        }
    }

    fn digit(&mut self, f: &mut Frame<'_, Session, D>, digit: u8) {
        let key = match digit {
            0 => BANK_SIZE,
            d => d,
        } + self.bank;
        if key < LOCO_FUNCTIONS {
            self.toggle_function(f, key);
        }
    }

    fn shift(&mut self, f: &mut Frame<'_, Session, D>, pressed: bool) {
        if pressed {
            let double = self
                .last_shift
                .is_some_and(|t| f.now.saturating_sub(t) < SHIFT_DOUBLE_PRESS_MS);
            self.bank = if double { 2 * BANK_SIZE } else { BANK_SIZE };
            self.last_shift = Some(f.now);
        } else {
            self.bank = 0;
        }
        self.choosing = pressed;
        f.lcd.show_shift(pressed, self.bank == 2 * BANK_SIZE);
        self.show_functions(f.ctx.config.library.current(), f.lcd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::settings::{ConfigDb, StopMode};
    use crate::app::station::PowerMode;
    use crate::app::testing::Cockpit;
    use crate::app::track::TrackState;
    use crate::app::Throttle;
    use crate::ui::Event;
    use std::vec::Vec;

    fn drained(t: &mut Throttle) -> Vec<Request> {
        core::iter::from_fn(|| t.pop_request()).collect()
    }

    fn english() -> ConfigDb {
        ConfigDb {
            language: 0,
            ..ConfigDb::default()
        }
    }

    fn throttle() -> (Throttle, Cockpit) {
        let mut t = Throttle::new(english());
        let mut lcd = Cockpit::default();
        t.start(&mut lcd, 0);
        (t, lcd)
    }

    #[test]
    fn speed_bytes_per_step_mode() {
        let mut loco = Loco::new("X", 3, SpeedSteps::Steps128);
        loco.speed = LOCO_MAX_STEP;
        assert_eq!(dcc_speed(&loco, false), 0x80 | 127);
        loco.speed = 1;
        assert_eq!(dcc_speed(&loco, false), 0x80 | 7);
        loco.steps = SpeedSteps::Steps14;
        loco.speed = -LOCO_MAX_STEP;
        loco.reverse = true;
        assert_eq!(dcc_speed(&loco, false), 15);
        loco.steps = SpeedSteps::Steps28;
        loco.speed = LOCO_MAX_STEP;
        loco.reverse = false;
        assert_eq!(dcc_speed(&loco, false), 0x80 | 31);
    }

    #[test]
    fn standstill_and_emergency_stop() {
        let loco = Loco::new("X", 3, SpeedSteps::Steps128);
        assert_eq!(dcc_speed(&loco, false), 0x80);
        assert_eq!(dcc_speed(&loco, true), 0x81);
    }

    #[test]
    fn external_speed_maps_back_to_notches() {
        assert_eq!(speed_from_dcc(0x80 | 127, 128), LOCO_MAX_STEP);
        assert_eq!(speed_from_dcc(64, 128), -11);
        assert_eq!(speed_from_dcc(0x80 | 31, 28), LOCO_MAX_STEP);
        assert_eq!(speed_from_dcc(0, 0), 0);
    }

    #[test]
    fn function_slots_fold_banks() {
        assert_eq!(function_slot(0), 0);
        assert_eq!(function_slot(10), 10);
        assert_eq!(function_slot(11), 1);
        assert_eq!(function_slot(28), 8);
    }

    #[test]
    fn begin_shows_the_selected_loco() {
        let (_t, lcd) = throttle();
        assert_eq!(lcd.screen.main(), "DEFLT");
        assert_eq!(lcd.throttle, Some(0));
        assert_eq!(lcd.heading, Some(Heading::Paused));
        assert_eq!(
            lcd.mode,
            ModeIndicator::Loco {
                reverse: false,
                external: false
            }
        );
    }

    #[test]
    fn throttle_steps_send_speed() {
        let (mut t, mut lcd) = throttle();
        t.handle(Event::Next(true), 0, &mut lcd);
        t.handle(Event::Next(false), 0, &mut lcd);
        t.handle(Event::Next(true), 0, &mut lcd);
        assert_eq!(lcd.throttle, Some(2));
        assert_eq!(lcd.heading, Some(Heading::Forward));
        let sent = drained(&mut t);
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1],
            Request::SetSpeed {
                addr: 3,
                steps: 128,
                speed: 0x80 | 13
            }
        );
    }

    #[test]
    fn back_stops_loco_then_track() {
        let (mut t, mut lcd) = throttle();
        t.handle(Event::Next(true), 0, &mut lcd);
        drained(&mut t);

        t.handle(Event::Back(true), 0, &mut lcd);
        assert_eq!(lcd.throttle, Some(0));
        assert_eq!(
            drained(&mut t),
            [Request::SetSpeed {
                addr: 3,
                steps: 128,
                speed: 0x80
            }]
        );

        t.handle(Event::Back(true), 0, &mut lcd);
        assert_eq!(t.track(), TrackState::Stopped);
        assert_eq!(lcd.track, TrackState::Stopped);
        assert_eq!(drained(&mut t), [Request::SetPower(PowerMode::TrackOff)]);

        t.handle(Event::Back(true), 0, &mut lcd);
        assert_eq!(t.track(), TrackState::Normal);
        assert_eq!(drained(&mut t), [Request::SetPower(PowerMode::Normal)]);
    }

    #[test]
    fn loco_stop_mode_uses_emergency_power() {
        let config = ConfigDb {
            stop_mode: StopMode::LocoStop,
            ..english()
        };
        let mut t = Throttle::new(config);
        let mut lcd = Cockpit::default();
        t.start(&mut lcd, 0);
        t.handle(Event::Back(true), 0, &mut lcd);
        assert_eq!(drained(&mut t), [Request::SetPower(PowerMode::EmergencyStop)]);
    }

    #[test]
    fn shift_back_is_an_emergency_stop() {
        let (mut t, mut lcd) = throttle();
        t.handle(Event::Shift(true), 0, &mut lcd);
        t.handle(Event::Back(true), 0, &mut lcd);
        assert_eq!(
            drained(&mut t),
            [Request::SetSpeed {
                addr: 3,
                steps: 128,
                speed: 0x81
            }]
        );
        assert_eq!(t.track(), TrackState::Normal);
    }

    #[test]
    fn digits_toggle_functions_in_the_shifted_bank() {
        let (mut t, mut lcd) = throttle();
        t.handle(Event::Digit(3, true), 0, &mut lcd);
        t.handle(Event::Digit(3, false), 0, &mut lcd);
        assert!(lcd.functions[3]);

        t.handle(Event::Shift(true), 0, &mut lcd);
        t.handle(Event::Digit(0, false), 0, &mut lcd);
        t.handle(Event::Shift(false), 0, &mut lcd);
        t.handle(Event::Enter(false), 0, &mut lcd);

        let sent = drained(&mut t);
        assert_eq!(
            sent,
            [
                Request::SetFunction {
                    addr: 3,
                    index: 3,
                    states: 1 << 3
                },
                Request::SetFunction {
                    addr: 3,
                    index: 20,
                    states: 1 << 3 | 1 << 20
                },
                Request::SetFunction {
                    addr: 3,
                    index: 0,
                    states: 1 | 1 << 3 | 1 << 20
                },
            ]
        );
    }

    #[test]
    fn double_shift_selects_the_third_bank() {
        let (mut t, mut lcd) = throttle();
        t.handle(Event::Shift(true), 100, &mut lcd);
        t.handle(Event::Shift(false), 200, &mut lcd);
        t.handle(Event::Shift(true), 400, &mut lcd);
        assert!(lcd.second_bank);
        t.handle(Event::Digit(9, false), 400, &mut lcd);
        t.handle(Event::Digit(0, false), 400, &mut lcd);
        let sent = drained(&mut t);
        assert_eq!(sent.len(), 0);
        t.handle(Event::Digit(8, false), 400, &mut lcd);
        assert!(matches!(
            drained(&mut t)[..],
            [Request::SetFunction { index: 28, .. }]
        ));
    }

    #[test]
    fn shift_walks_the_library_to_new() {
        let (mut t, mut lcd) = throttle();
        t.handle(Event::Shift(true), 0, &mut lcd);
        t.handle(Event::Next(true), 0, &mut lcd);
        assert_eq!(lcd.screen.main(), "NEW?");
        assert_eq!(lcd.throttle, None);
        t.handle(Event::Shift(false), 0, &mut lcd);
        t.handle(Event::Next(true), 0, &mut lcd);
        assert!(drained(&mut t).is_empty());
    }
}
