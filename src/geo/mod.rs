//! Geographic services: IP geolocation, sun-times lookups, sun-event
//! scheduling.
//!
//! This module resolves "where is this machine" through an ordered fallback
//! chain of IP geolocation providers. Providers disagree on response shape:
//! two expose flat latitude/longitude fields, one packs both into a single
//! `"lat,lon"` string, so extraction is table-driven and defensive. Any
//! per-provider failure (timeout, missing field, out-of-range coordinates)
//! moves on to the next provider; only when the whole chain fails does
//! resolution report no result.

use std::sync::{Arc, Mutex};

use crate::common::Coordinates;
use crate::http::HttpClient;

pub mod scheduler;
pub mod sun_times;

/// How a provider encodes coordinates in its JSON response.
enum CoordinateFields {
    /// Separate numeric latitude/longitude fields.
    Flat {
        lat: &'static str,
        lon: &'static str,
    },
    /// A single `"lat,lon"` string field requiring a split.
    Combined { loc: &'static str },
}

struct ProviderSpec {
    name: &'static str,
    url: &'static str,
    fields: CoordinateFields,
    city_key: &'static str,
    country_key: &'static str,
}

/// Ordered fallback chain. First success wins.
fn provider_table() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec {
            name: "ipapi.co",
            url: "https://ipapi.co/json/",
            fields: CoordinateFields::Flat {
                lat: "latitude",
                lon: "longitude",
            },
            city_key: "city",
            country_key: "country_name",
        },
        ProviderSpec {
            name: "ip-api.com",
            url: "http://ip-api.com/json/",
            fields: CoordinateFields::Flat {
                lat: "lat",
                lon: "lon",
            },
            city_key: "city",
            country_key: "country",
        },
        ProviderSpec {
            name: "ipinfo.io",
            url: "https://ipinfo.io/json",
            fields: CoordinateFields::Combined { loc: "loc" },
            city_key: "city",
            country_key: "country",
        },
    ]
}

/// A position the location mode operates from.
///
/// Produced either by auto-detection (provider chain) or wrapped from user
/// input; `auto_detected` decides whether [`refresh`] semantics apply.
///
/// [`refresh`]: crate::core::LocationModeHandler::refresh_location
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    /// Human-readable place description, e.g. "London, United Kingdom".
    pub description: String,
    /// Provider name, or "manual" for user-supplied coordinates.
    pub source: String,
    pub auto_detected: bool,
}

impl ResolvedLocation {
    /// Wrap validated user-supplied coordinates.
    pub fn manual(coordinates: Coordinates) -> Self {
        Self {
            description: format!("Manual location ({coordinates})"),
            source: "manual".to_string(),
            auto_detected: false,
            coordinates,
        }
    }
}

/// IP geolocation resolver with ordered provider fallback and a last-success
/// cache.
pub struct GeoResolver {
    client: Arc<dyn HttpClient>,
    cached: Mutex<Option<ResolvedLocation>>,
}

impl GeoResolver {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            cached: Mutex::new(None),
        }
    }

    /// Resolve the current location via the provider chain.
    ///
    /// Returns the first provider result that yields valid coordinates, and
    /// caches it. Returns `None` when every provider fails; provider failures
    /// are logged, never raised.
    pub fn resolve_current_location(&self) -> Option<ResolvedLocation> {
        for provider in provider_table() {
            log_debug!("Trying location provider: {}", provider.name);
            match self.query_provider(&provider) {
                Ok(location) => {
                    log_decorated!(
                        "Location detected: {} ({})",
                        location.description,
                        location.coordinates
                    );
                    *self.cached.lock().unwrap() = Some(location.clone());
                    return Some(location);
                }
                Err(e) => {
                    log_warning!("Provider {} failed: {e:#}", provider.name);
                }
            }
        }

        log_pipe!();
        log_error!("All geolocation providers failed");
        None
    }

    /// Last successfully resolved location, if any.
    pub fn cached_location(&self) -> Option<ResolvedLocation> {
        self.cached.lock().unwrap().clone()
    }

    /// Drop the cached location so the next resolve hits the network.
    pub fn clear_cache(&self) {
        *self.cached.lock().unwrap() = None;
        log_debug!("Location cache cleared");
    }

    fn query_provider(&self, provider: &ProviderSpec) -> anyhow::Result<ResolvedLocation> {
        let data = self.client.get_json(provider.url)?;

        let (latitude, longitude) = match &provider.fields {
            CoordinateFields::Flat { lat, lon } => {
                let latitude = data
                    .get(*lat)
                    .and_then(serde_json::Value::as_f64)
                    .ok_or_else(|| anyhow::anyhow!("Missing or non-numeric '{lat}' field"))?;
                let longitude = data
                    .get(*lon)
                    .and_then(serde_json::Value::as_f64)
                    .ok_or_else(|| anyhow::anyhow!("Missing or non-numeric '{lon}' field"))?;
                (latitude, longitude)
            }
            CoordinateFields::Combined { loc } => {
                let combined = data
                    .get(*loc)
                    .and_then(serde_json::Value::as_str)
                    .ok_or_else(|| anyhow::anyhow!("Missing '{loc}' field"))?;
                let (lat_str, lon_str) = combined
                    .split_once(',')
                    .ok_or_else(|| anyhow::anyhow!("Malformed '{loc}' field: {combined}"))?;
                (
                    lat_str.trim().parse::<f64>()?,
                    lon_str.trim().parse::<f64>()?,
                )
            }
        };

        let coordinates = Coordinates::validated(latitude, longitude).ok_or_else(|| {
            anyhow::anyhow!("Invalid coordinates from provider: {latitude}, {longitude}")
        })?;

        let city = data
            .get(provider.city_key)
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");
        let country = data
            .get(provider.country_key)
            .and_then(serde_json::Value::as_str)
            .unwrap_or("");
        let description = match (city.is_empty(), country.is_empty()) {
            (false, false) => format!("{city}, {country}"),
            (false, true) => city.to_string(),
            (true, false) => country.to_string(),
            (true, true) => "Unknown location".to_string(),
        };

        Ok(ResolvedLocation {
            coordinates,
            description,
            source: provider.name.to_string(),
            auto_detected: true,
        })
    }
}
