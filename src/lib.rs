//! Library interface for handthrottle.
//!
//! Holds the hardware-independent part of the firmware: the interaction
//! engine (`ui`) and the throttle built on it (`app`), so both can be
//! tested on the host.
//!
//! Usage: `cargo test --lib`, or `cargo test` for the integration tests too.
//!
//! Note: The embedded binary uses main.rs with #![no_std] and #![no_main]
//! and declares the hardware modules (buttons, panel, flash) itself.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod app;
pub mod config;
pub mod error;
pub mod power_logic;
pub mod ui;

pub use app::Throttle;
pub use error::Error;

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests - cross-module behaviour
// ═══════════════════════════════════════════════════════════════════════════
