//! Clock and Wi-Fi status panel for an ESP32 with an ILI9341 display.
//!
//! The device-independent core (scheduling, the connect protocol, scanning,
//! time formatting and drawing) builds on the host and is tested there
//! against the simulated collaborators in [`sim`]. ESP-IDF bindings live in
//! `platform`, which only exists on the device.

pub mod app;
pub mod clock;
pub mod config;
pub mod connectivity;
pub mod display;
pub mod layout;
pub mod scanner;
pub mod scheduler;
pub mod sim;
pub mod system;
pub mod timebase;
pub mod views;

#[cfg(target_os = "espidf")]
pub mod platform;
