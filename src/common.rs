//! Shared types and input validation.
//!
//! Closed sum types for the values that cross module boundaries
//! ("dark"/"light", "sunrise"/"sunset", "day"/"night"), plus validated
//! trigger-time and coordinate parsing. Validation happens once, here,
//! at the service boundary.

use chrono::NaiveTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Pattern for 24-hour HH:MM trigger times. Leading zero on the hour is
/// optional ("7:30" and "07:30" are both accepted).
static TRIGGER_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").expect("valid trigger time regex"));

/// The currently authoritative theme-switching policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Manual,
    Schedule,
    Location,
}

impl std::fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeMode::Manual => write!(f, "manual"),
            ThemeMode::Schedule => write!(f, "schedule"),
            ThemeMode::Location => write!(f, "location"),
        }
    }
}

/// Visual theme variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeType {
    Light,
    Dark,
}

impl ThemeType {
    /// The opposite theme variant.
    pub fn toggled(self) -> Self {
        match self {
            ThemeType::Light => ThemeType::Dark,
            ThemeType::Dark => ThemeType::Light,
        }
    }
}

impl std::fmt::Display for ThemeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThemeType::Light => write!(f, "light"),
            ThemeType::Dark => write!(f, "dark"),
        }
    }
}

/// An astronomical trigger fired by the sun-event scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunEvent {
    Sunrise,
    Sunset,
}

impl SunEvent {
    /// The theme a sun event maps to: sunrise brings light, sunset dark.
    pub fn theme(self) -> ThemeType {
        match self {
            SunEvent::Sunrise => ThemeType::Light,
            SunEvent::Sunset => ThemeType::Dark,
        }
    }
}

impl std::fmt::Display for SunEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SunEvent::Sunrise => write!(f, "sunrise"),
            SunEvent::Sunset => write!(f, "sunset"),
        }
    }
}

/// Whether "now" falls between today's sunrise and sunset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunPeriod {
    Day,
    Night,
}

impl SunPeriod {
    /// The theme appropriate for this period.
    pub fn theme(self) -> ThemeType {
        match self {
            SunPeriod::Day => ThemeType::Light,
            SunPeriod::Night => ThemeType::Dark,
        }
    }
}

/// A validated geographic position.
///
/// Constructed only through [`Coordinates::validated`], so a value of this
/// type is always in range and never the `(0, 0)` provider-default sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Validate and wrap a latitude/longitude pair.
    ///
    /// Rejects out-of-range values and the exact `(0, 0)` pair, which IP
    /// geolocation providers commonly return as a default when lookup fails.
    pub fn validated(latitude: f64, longitude: f64) -> Option<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return None;
        }
        if latitude == 0.0 && longitude == 0.0 {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
        })
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Parse an HH:MM trigger time string.
///
/// Returns `None` for anything that doesn't match the 24-hour pattern.
/// The regex gate is backed by a chrono parse so the returned value is
/// usable directly in time math.
pub fn parse_trigger_time(time_str: &str) -> Option<NaiveTime> {
    if !TRIGGER_TIME_RE.is_match(time_str) {
        return None;
    }
    NaiveTime::parse_from_str(time_str, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time_str, "%-H:%M"))
        .ok()
}

/// Check whether a string is a well-formed HH:MM trigger time.
pub fn is_valid_trigger_time(time_str: &str) -> bool {
    parse_trigger_time(time_str).is_some()
}

/// Convert an HH:MM trigger time to minutes since midnight.
pub fn trigger_time_minutes(time: NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}
