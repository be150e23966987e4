//! Mode state machine: controller, shared context, and the per-mode
//! handlers.
//!
//! Exactly one mode is authoritative at a time. The [`ModeController`] owns
//! the transition logic (validate, disable old, enable new, commit) and a
//! registry of [`ModeHandler`] implementations, one per [`ThemeMode`]. The
//! handlers share a [`ThemeContext`], which owns the backend slot, the
//! current mode/theme state, the event bus, and the persistence seam.
//!
//! [`ThemeMode`]: crate::common::ThemeMode

use chrono::NaiveTime;

use crate::common::Coordinates;

mod context;
mod controller;
mod location;
mod manual;
mod schedule;

pub use context::{ThemeApplyFn, ThemeContext};
pub use controller::ModeController;
pub use location::LocationModeHandler;
pub use manual::ManualModeHandler;
pub use schedule::ScheduleModeHandler;

/// Validated parameters passed to a handler when its mode is enabled.
///
/// Construction happens in the controller after validation, so handlers can
/// assume the contents are well-formed.
#[derive(Debug, Clone, Copy)]
pub enum ModeRequest {
    /// Manual mode, optionally applying a theme immediately.
    Manual {
        theme: Option<crate::common::ThemeType>,
    },
    /// Schedule mode with two distinct daily triggers.
    Schedule {
        dark_time: NaiveTime,
        light_time: NaiveTime,
    },
    /// Location mode. `None` means auto-detect via IP geolocation.
    Location { coordinates: Option<Coordinates> },
}

/// Per-mode activation contract.
///
/// Handlers own their background machinery (schedulers, workers) and must be
/// quiescent after `disable` returns: no callback of a disabled handler may
/// fire afterwards.
pub trait ModeHandler: Send {
    /// Activate the mode. Returns `false` when activation failed; the
    /// handler must be quiescent in that case too.
    fn enable(&mut self, request: &ModeRequest) -> bool;

    /// Deactivate the mode and stop its background machinery.
    fn disable(&mut self) -> bool;

    /// Whether the handler is currently active.
    fn is_enabled(&self) -> bool;

    /// Re-evaluate external inputs (e.g. re-detect location). Modes without
    /// refreshable inputs report `false`.
    fn refresh(&mut self) -> bool {
        false
    }
}
