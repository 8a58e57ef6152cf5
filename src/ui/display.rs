//! SSD1306 OLED panel.
//!
//! Layout on the 128×64 panel (FONT_6X10):
//!   - y 10: status row - mode, shift bank, track state
//!   - y 30: main line, with an inverted cursor cell while editing
//!   - y 36: throttle bar with the direction arrow
//!   - y 52: function indicators F0..F10 on the loco page
//!   - y 62: bottom line (field names, error text)
//!
//! Draw calls only update the frame state. The frame is rendered and
//! flushed when a batch commits, or right away outside a batch.

use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::{MonoTextStyle, MonoTextStyleBuilder};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};
use embedded_graphics::text::Text;
use handthrottle::app::loco::function_slot;
use handthrottle::app::track::TrackState;
use handthrottle::app::{Heading, ModeIndicator, Panel};
use handthrottle::config::{LOCO_MAX_STEP, STRING_LEN};
use handthrottle::ui::{Align, Display};
use heapless::String;
use ssd1306::mode::BufferedGraphicsMode;
use ssd1306::prelude::*;
use ssd1306::I2CDisplayInterface;
use ssd1306::Ssd1306;

/// Type alias for the concrete display driver.
///
/// Generic over the I²C implementation so callers pass in their HAL's
/// I²C peripheral.
pub type Driver<I2C> =
    Ssd1306<I2CInterface<I2C>, DisplaySize128x64, BufferedGraphicsMode<DisplaySize128x64>>;

const WIDTH: i32 = 128;
const CHAR_W: i32 = 6;
const CHAR_H: i32 = 10;

const STATUS_Y: i32 = 10;
const MAIN_Y: i32 = 30;
const BAR_Y: i32 = 34;
const FUNCTIONS_Y: i32 = 52;
const BOTTOM_Y: i32 = 62;

/// Function indicator slots: F0 plus one bank of ten.
const SLOTS: usize = 11;

fn text_style(color: BinaryColor) -> MonoTextStyle<'static, BinaryColor> {
    MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(color)
        .build()
}

fn column_x(text: &str, align: Align) -> i32 {
    let width = text.chars().count() as i32 * CHAR_W;
    match align {
        Align::Left => 0,
        Align::Center => ((WIDTH - width) / 2).max(0),
        Align::Right => (WIDTH - width).max(0),
    }
}

fn copy(out: &mut String<STRING_LEN>, text: &str) {
    out.clear();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
}

pub struct Oled<I2C> {
    driver: Driver<I2C>,
    batching: bool,
    main: String<STRING_LEN>,
    main_align: Align,
    cursor: Option<usize>,
    bottom: Option<String<STRING_LEN>>,
    bottom_align: Align,
    shift: bool,
    second_bank: bool,
    throttle: Option<u8>,
    heading: Option<Heading>,
    functions: [bool; SLOTS],
    mode: ModeIndicator,
    track: TrackState,
}

impl<I2C> Oled<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    /// Initialise the SSD1306 display and clear the screen.
    pub fn new(i2c: I2C) -> Self {
        let interface = I2CDisplayInterface::new(i2c);
        let mut driver = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        if driver.init().is_err() {
            defmt::error!("Display: init failed");
        }
        driver.clear_buffer();
        let _ = driver.flush();
        Self {
            driver,
            batching: false,
            main: String::new(),
            main_align: Align::Center,
            cursor: None,
            bottom: None,
            bottom_align: Align::Center,
            shift: false,
            second_bank: false,
            throttle: None,
            heading: None,
            functions: [false; SLOTS],
            mode: ModeIndicator::Off,
            track: TrackState::Normal,
        }
    }

    pub fn set_contrast(&mut self, contrast: u8) {
        let _ = self.driver.set_brightness(Brightness::custom(1, contrast));
    }

    /// Panel off for idle power-down; the frame is kept.
    pub fn set_sleep(&mut self, sleep: bool) {
        let _ = self.driver.set_display_on(!sleep);
    }

    fn changed(&mut self) {
        if !self.batching {
            self.render();
        }
    }

    fn render(&mut self) {
        self.driver.clear_buffer();
        self.draw_status();
        self.draw_main();
        self.draw_throttle();
        if matches!(self.mode, ModeIndicator::Loco { .. }) {
            self.draw_functions();
        }
        if let Some(bottom) = &self.bottom {
            let x = column_x(bottom, self.bottom_align);
            let _ = Text::new(bottom, Point::new(x, BOTTOM_Y), text_style(BinaryColor::On))
                .draw(&mut self.driver);
        }
        if self.driver.flush().is_err() {
            defmt::warn!("Display: flush failed");
        }
    }

    fn draw_status(&mut self) {
        let mode = match self.mode {
            ModeIndicator::Off => "",
            ModeIndicator::Loco { external: true, .. } => "LOK*",
            ModeIndicator::Loco { reverse: true, .. } => "<LOK",
            ModeIndicator::Loco { .. } => "LOK>",
            ModeIndicator::Turnout { straight: true } => "TRN|",
            ModeIndicator::Turnout { straight: false } => "TRN/",
        };
        let shift = match (self.shift, self.second_bank) {
            (false, _) => "",
            (true, false) => "S",
            (true, true) => "S2",
        };
        let track = match self.track {
            TrackState::Normal => "",
            TrackState::Stopped => "STOP",
            TrackState::ShortCircuit => "SHORT",
        };
        let style = text_style(BinaryColor::On);
        let _ = Text::new(mode, Point::new(0, STATUS_Y), style).draw(&mut self.driver);
        let _ = Text::new(shift, Point::new(48, STATUS_Y), style).draw(&mut self.driver);
        let x = column_x(track, Align::Right);
        let _ = Text::new(track, Point::new(x, STATUS_Y), style).draw(&mut self.driver);
    }

    fn draw_main(&mut self) {
        let x = column_x(&self.main, self.main_align);
        let _ = Text::new(&self.main, Point::new(x, MAIN_Y), text_style(BinaryColor::On))
            .draw(&mut self.driver);

        let Some(col) = self.cursor else {
            return;
        };
        let cell_x = x + col as i32 * CHAR_W;
        let _ = Rectangle::new(
            Point::new(cell_x, MAIN_Y - CHAR_H + 2),
            Size::new(CHAR_W as u32, CHAR_H as u32),
        )
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(&mut self.driver);

        let mut cell = [0u8; 4];
        if let Some(c) = self.main.chars().nth(col) {
            let _ = Text::new(
                c.encode_utf8(&mut cell),
                Point::new(cell_x, MAIN_Y),
                text_style(BinaryColor::Off),
            )
            .draw(&mut self.driver);
        }
    }

    fn draw_throttle(&mut self) {
        let Some(notch) = self.throttle else {
            return;
        };
        let span = WIDTH - 2 * CHAR_W;
        let filled = span * notch as i32 / LOCO_MAX_STEP as i32;
        let _ = Rectangle::new(Point::new(CHAR_W, BAR_Y), Size::new(span as u32, 6))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut self.driver);
        let _ = Rectangle::new(Point::new(CHAR_W, BAR_Y), Size::new(filled as u32, 6))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut self.driver);

        let arrow = match self.heading {
            Some(Heading::Forward) => ">",
            Some(Heading::Reverse) => "<",
            Some(Heading::Paused) => "=",
            None => "",
        };
        let _ = Text::new(arrow, Point::new(WIDTH - CHAR_W, BAR_Y + 6), text_style(BinaryColor::On))
            .draw(&mut self.driver);
    }

    fn draw_functions(&mut self) {
        const DIGITS: [&str; SLOTS] = ["L", "1", "2", "3", "4", "5", "6", "7", "8", "9", "0"];
        for (slot, on) in self.functions.iter().enumerate() {
            let x = slot as i32 * (CHAR_W + 5);
            let color = if *on {
                let _ = Rectangle::new(
                    Point::new(x, FUNCTIONS_Y - CHAR_H + 2),
                    Size::new(CHAR_W as u32, CHAR_H as u32),
                )
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(&mut self.driver);
                BinaryColor::Off
            } else {
                BinaryColor::On
            };
            let _ = Text::new(DIGITS[slot], Point::new(x, FUNCTIONS_Y), text_style(color))
                .draw(&mut self.driver);
        }
    }
}

impl<I2C> Display for Oled<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn show_main(&mut self, text: &str, blink: Option<usize>, align: Align) {
        copy(&mut self.main, text);
        self.cursor = blink;
        self.main_align = align;
        self.changed();
    }

    fn show_bottom(&mut self, text: Option<&str>, align: Align) {
        self.bottom = text.map(|t| {
            let mut line = String::new();
            copy(&mut line, t);
            line
        });
        self.bottom_align = align;
        self.changed();
    }

    fn begin_batch(&mut self) {
        self.batching = true;
    }

    fn commit_batch(&mut self) {
        self.batching = false;
        self.render();
    }

    fn show_shift_indicator(&mut self, active: bool) {
        self.shift = active;
        self.second_bank = false;
        self.changed();
    }
}

impl<I2C> Panel for Oled<I2C>
where
    I2C: embedded_hal::i2c::I2c,
{
    fn show_throttle(&mut self, notch: Option<u8>) {
        self.throttle = notch;
        self.changed();
    }

    fn show_heading(&mut self, heading: Option<Heading>) {
        self.heading = heading;
        self.changed();
    }

    fn show_function(&mut self, index: u8, on: bool) {
        self.functions[function_slot(index)] = on;
        self.changed();
    }

    fn show_shift(&mut self, active: bool, second_bank: bool) {
        self.shift = active;
        self.second_bank = second_bank;
        self.changed();
    }

    fn show_mode(&mut self, mode: ModeIndicator) {
        self.mode = mode;
        self.changed();
    }

    fn show_track(&mut self, state: TrackState) {
        self.track = state;
        self.changed();
    }
}
