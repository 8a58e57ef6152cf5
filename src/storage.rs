//! Persistent configuration storage.
//!
//! Uses the nRF52840's internal flash via the `sequential-storage` crate
//! to keep the throttle configuration (network settings, loco library,
//! child lock, user interface) across power cycles.
//!
//! Storage layout:
//!   - One key-value record holding the encoded `ConfigDb`.
//!   - Saves append a new copy; `sequential-storage` handles wear
//!     levelling and garbage collection of the flash pages.

use defmt::{debug, error, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use handthrottle::app::settings::{ConfigDb, Sections, RECORD_LEN};
use handthrottle::config::{STORAGE_FLASH_PAGE_COUNT, STORAGE_FLASH_PAGE_START};

/// Flash page size for nRF52840 (4 KB).
const FLASH_PAGE_SIZE: u32 = 4096;

/// Start address of our storage region.
const STORAGE_START: u32 = STORAGE_FLASH_PAGE_START * FLASH_PAGE_SIZE;

/// End address (exclusive) of our storage region.
const STORAGE_END: u32 = (STORAGE_FLASH_PAGE_START + STORAGE_FLASH_PAGE_COUNT) * FLASH_PAGE_SIZE;

/// Key of the configuration record in the map storage.
const KEY_CONFIG: u8 = 0x01;

/// Item buffer: the record plus the map's key and header overhead.
const BUFFER_SIZE: usize = RECORD_LEN + 32;

/// Flash side of the configuration, with a count of completed saves.
pub struct ConfigStore {
    saves: u32,
}

impl ConfigStore {
    pub const fn new() -> Self {
        Self { saves: 0 }
    }

    /// Read the stored configuration.
    ///
    /// A missing, unreadable or corrupt record yields the factory
    /// defaults, so the throttle always boots.
    pub async fn load(
        &mut self,
        flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
    ) -> ConfigDb {
        let flash_range = STORAGE_START..STORAGE_END;
        let mut buf = [0u8; BUFFER_SIZE];

        match sequential_storage::map::fetch_item::<u8, &[u8], _>(
            flash,
            flash_range,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_CONFIG,
        )
        .await
        {
            Ok(Some(data)) => match ConfigDb::decode(data) {
                Ok(config) => {
                    info!("Config: loaded {} locos", config.library.len());
                    config
                }
                Err(e) => {
                    warn!("Config: stored record rejected ({}), using defaults", e);
                    ConfigDb::default()
                }
            },
            Ok(None) => {
                info!("Config: nothing stored, using defaults");
                ConfigDb::default()
            }
            Err(e) => {
                error!("Flash read error: {:?}", defmt::Debug2Format(&e));
                ConfigDb::default()
            }
        }
    }

    /// Write the whole configuration if any section changed.
    ///
    /// Sections are tracked only to decide whether to write; the record
    /// always holds every section.
    pub async fn save(
        &mut self,
        flash: &mut impl embedded_storage_async::nor_flash::NorFlash,
        config: &ConfigDb,
        dirty: Sections,
    ) {
        if dirty.is_empty() {
            debug!("ConfigStore: no changes to save");
            return;
        }

        let mut data_buf = [0u8; RECORD_LEN];
        let len = match config.encode(&mut data_buf) {
            Ok(len) => len,
            Err(e) => {
                error!("Config: encode failed: {}", e);
                return;
            }
        };
        let item = &data_buf[..len];

        let flash_range = STORAGE_START..STORAGE_END;
        let mut buf = [0u8; BUFFER_SIZE];

        match sequential_storage::map::store_item::<u8, &[u8], _>(
            flash,
            flash_range,
            &mut sequential_storage::cache::NoCache::new(),
            &mut buf,
            &KEY_CONFIG,
            &item,
        )
        .await
        {
            Ok(_) => {
                self.saves = self.saves.wrapping_add(1);
                info!(
                    "Config: saved {} bytes (sections {=u8:#x}, save #{})",
                    len,
                    dirty.bits(),
                    self.saves
                );
            }
            Err(e) => {
                error!("Flash write error: {:?}", defmt::Debug2Format(&e));
            }
        }
    }
}

/// Global configuration store (protected by mutex for async access).
pub static CONFIG_STORE: Mutex<CriticalSectionRawMutex, ConfigStore> =
    Mutex::new(ConfigStore::new());
