//! handthrottle firmware entry point.
//!
//! Tasks:
//!   - `keypad`: scans the button matrix and feeds key edges into
//!     `KEY_EVENTS`.
//!   - `station`: takes requests off `REQUESTS` for the command station.
//!   - `main`: owns the throttle, the OLED and the flash. It turns key
//!     edges and the periodic tick into dispatcher events, saves dirty
//!     configuration and powers the panel down when idle.

#![no_std]
#![no_main]

#[path = "ui/buttons.rs"]
mod buttons;
#[path = "ui/display.rs"]
mod display;
mod storage;

use buttons::EVENT_QUEUE;
use defmt::{error, info, warn};
use embassy_embedded_hal::adapter::BlockingAsync;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_nrf::gpio::{Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::nvmc::Nvmc;
use embassy_nrf::twim::{self, Twim};
use embassy_nrf::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver};
use embassy_time::{Duration, Instant, Ticker};
use handthrottle::app::station::Request;
use handthrottle::config::{BUTTON_COLUMNS, BUTTON_ROWS, OUTBOX_DEPTH, TICK_MS};
use handthrottle::power_logic::display_should_sleep;
use handthrottle::ui::Event;
use handthrottle::Throttle;
use static_cell::StaticCell;
use storage::CONFIG_STORE;
use {defmt_rtt as _, panic_probe as _};

bind_interrupts!(struct Irqs {
    TWISPI0 => twim::InterruptHandler<peripherals::TWISPI0>;
});

type Flash = BlockingAsync<Nvmc<'static>>;

static FLASH: StaticCell<Flash> = StaticCell::new();
static KEY_EVENTS: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE> = Channel::new();
static REQUESTS: Channel<CriticalSectionRawMutex, Request, OUTBOX_DEPTH> = Channel::new();

#[embassy_executor::task]
async fn keypad(columns: [Output<'static>; BUTTON_COLUMNS], rows: [Input<'static>; BUTTON_ROWS]) {
    buttons::matrix_task(columns, rows, KEY_EVENTS.sender()).await
}

/// Drains the outgoing requests and logs them. Putting them on the
/// command-station link is left to the radio side of the handset.
#[embassy_executor::task]
async fn station(rx: Receiver<'static, CriticalSectionRawMutex, Request, OUTBOX_DEPTH>) {
    loop {
        let request = rx.receive().await;
        info!("Station: {}", request);
    }
}

fn now_ms() -> u64 {
    Instant::now().as_millis()
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("handthrottle starting");
    let p = embassy_nrf::init(Default::default());

    // Configuration first: language, contrast and the loco library
    // shape everything shown from the first frame.
    let flash: &'static mut Flash = FLASH.init(BlockingAsync::new(Nvmc::new(p.NVMC)));
    let config = CONFIG_STORE.lock().await.load(flash).await;

    let mut i2c_config = twim::Config::default();
    i2c_config.frequency = twim::Frequency::K400;
    let i2c = Twim::new(p.TWISPI0, Irqs, p.P0_26, p.P0_27, i2c_config);
    let mut lcd = display::Oled::new(i2c);
    let mut contrast = config.contrast;
    lcd.set_contrast(contrast);

    let columns = [
        Output::new(p.P0_02, Level::High, OutputDrive::Standard),
        Output::new(p.P0_03, Level::High, OutputDrive::Standard),
        Output::new(p.P0_04, Level::High, OutputDrive::Standard),
    ];
    let rows = [
        Input::new(p.P0_11, Pull::Up),
        Input::new(p.P0_12, Pull::Up),
        Input::new(p.P0_24, Pull::Up),
        Input::new(p.P0_25, Pull::Up),
        Input::new(p.P0_28, Pull::Up),
        Input::new(p.P0_29, Pull::Up),
    ];
    if spawner.spawn(keypad(columns, rows)).is_err() {
        error!("keypad task spawn failed");
    }
    if spawner.spawn(station(REQUESTS.receiver())).is_err() {
        error!("station task spawn failed");
    }

    let mut throttle = Throttle::new(config);
    throttle.start(&mut lcd, now_ms());

    let keys = KEY_EVENTS.receiver();
    let mut ticker = Ticker::every(Duration::from_millis(TICK_MS));
    let mut last_input = Instant::now();
    let mut asleep = false;

    loop {
        let event = match select(keys.receive(), ticker.next()).await {
            Either::First(event) => event,
            Either::Second(()) => Event::Timeout,
        };

        if event == Event::Timeout {
            let idle_secs = last_input.elapsed().as_secs();
            if !asleep && display_should_sleep(idle_secs, throttle.idle_time_min()) {
                info!("Panel: idle for {}s, sleeping", idle_secs);
                lcd.set_sleep(true);
                asleep = true;
            }
        } else {
            last_input = Instant::now();
            if asleep {
                info!("Panel: wake");
                lcd.set_sleep(false);
                asleep = false;
            }
        }

        throttle.handle(event, now_ms(), &mut lcd);

        while let Some(request) = throttle.pop_request() {
            if REQUESTS.try_send(request).is_err() {
                warn!("Station: queue full, dropped {}", request);
            }
        }

        if throttle.config().contrast != contrast {
            contrast = throttle.config().contrast;
            lcd.set_contrast(contrast);
        }

        let dirty = throttle.take_dirty();
        if !dirty.is_empty() {
            CONFIG_STORE
                .lock()
                .await
                .save(flash, throttle.config(), dirty)
                .await;
        }
    }
}
