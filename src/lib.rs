//! # Duskshift Library
//!
//! Core library for automatic light/dark desktop theme switching.
//!
//! Exactly one switching policy is authoritative at any time: manual user
//! control, a fixed daily HH:MM schedule, or sunrise/sunset timing at a
//! geographic location. The library owns the policy state machine, the
//! background pollers that drive the schedule and location modes, and the
//! geolocation/sun-times clients those modes depend on. The desktop-specific
//! mechanics of flipping a theme live behind the [`backend::ThemeBackend`]
//! trait; persistence lives behind [`config::ConfigStore`]. Neither is
//! implemented here beyond test doubles.
//!
//! ## Architecture
//!
//! - **Core**: `core` module with the [`core::ModeController`] state machine,
//!   the three mode policies, and the shared [`core::ThemeContext`]
//! - **Schedulers**: `schedule` (clock triggers) and `geo::scheduler`
//!   (sun events), one worker thread each while enabled
//! - **Services**: `geo` for IP geolocation fallback and sun-times lookups
//! - **Infrastructure**: event bus, config snapshot contract, time source
//!   abstraction, HTTP client seam, and logging

// Import macros from logger module for use in all submodules
#[macro_use]
pub mod logger;

pub mod backend;
pub mod common;
pub mod config;
pub mod core;
pub mod events;
pub mod geo;
pub mod http;
pub mod schedule;
pub mod time_source;

pub use common::{Coordinates, SunEvent, SunPeriod, ThemeMode, ThemeType};
pub use core::ModeController;
