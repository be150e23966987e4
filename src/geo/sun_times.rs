//! Sun-times lookups against an external astronomical API.
//!
//! The service fetches sunrise/sunset instants (UTC) for a coordinate pair
//! and date, converts them to local time, and caches them per (rounded
//! coordinates, date). A cache hit for the same date short-circuits the
//! network call, so the sun-event scheduler polling every few seconds costs
//! one request per day. Stale dates are pruned on insert, keeping the cache
//! bounded for long-running processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Duration, Local, NaiveDate};

use crate::common::{Coordinates, SunEvent, SunPeriod};
use crate::http::HttpClient;
use crate::time_source::TimeSource;

/// Base URL of the sunrise/sunset API.
pub const SUN_API_BASE_URL: &str = "https://api.sunrisesunset.io";

/// Sunrise and sunset instants for one date, in local time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunTimes {
    pub date: NaiveDate,
    pub sunrise: DateTime<Local>,
    pub sunset: DateTime<Local>,
}

struct CacheEntry {
    times: SunTimes,
    #[allow(dead_code)]
    cached_at: DateTime<Local>,
}

/// Coordinates rounded to ~11m so float noise doesn't split cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    lat_e4: i64,
    lon_e4: i64,
    date: NaiveDate,
}

impl CacheKey {
    fn new(coordinates: Coordinates, date: NaiveDate) -> Self {
        Self {
            lat_e4: (coordinates.latitude * 10_000.0).round() as i64,
            lon_e4: (coordinates.longitude * 10_000.0).round() as i64,
            date,
        }
    }
}

/// Client for sunrise/sunset times with per-(coordinates, date) caching.
pub struct SunTimesService {
    client: Arc<dyn HttpClient>,
    time: Arc<dyn TimeSource>,
    cache: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl SunTimesService {
    pub fn new(client: Arc<dyn HttpClient>, time: Arc<dyn TimeSource>) -> Self {
        Self {
            client,
            time,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Sunrise/sunset for the given coordinates and date.
    ///
    /// Served from cache when possible. Network or protocol failures are
    /// logged and reported as `None`; the caller decides whether that is
    /// fatal.
    pub fn sun_times(&self, coordinates: Coordinates, date: NaiveDate) -> Option<SunTimes> {
        let key = CacheKey::new(coordinates, date);
        {
            let cache = self.cache.lock().unwrap();
            if let Some(entry) = cache.get(&key) {
                log_debug!("Using cached sun times for {date}");
                return Some(entry.times);
            }
        }

        match self.fetch_sun_times(coordinates, date) {
            Ok(times) => {
                let today = self.time.now().date_naive();
                let mut cache = self.cache.lock().unwrap();
                // Dates that can no longer be queried again just leak; drop them
                cache.retain(|k, _| k.date >= today);
                cache.insert(
                    key,
                    CacheEntry {
                        times,
                        cached_at: self.time.now(),
                    },
                );
                log_decorated!(
                    "Sun times for {date}: sunrise={}, sunset={}",
                    times.sunrise.format("%H:%M"),
                    times.sunset.format("%H:%M")
                );
                Some(times)
            }
            Err(e) => {
                log_warning!("Sun times lookup failed for {date}: {e:#}");
                None
            }
        }
    }

    /// Whether "now" falls between today's sunrise and sunset.
    ///
    /// `None` when today's sun times cannot be determined.
    pub fn current_sun_period(&self, coordinates: Coordinates) -> Option<SunPeriod> {
        let now = self.time.now();
        let times = self.sun_times(coordinates, now.date_naive())?;

        if times.sunrise <= now && now <= times.sunset {
            Some(SunPeriod::Day)
        } else {
            Some(SunPeriod::Night)
        }
    }

    /// The next sunrise or sunset event from "now".
    ///
    /// Today's remaining event if one is still ahead, otherwise tomorrow's
    /// sunrise.
    pub fn next_sun_event(&self, coordinates: Coordinates) -> Option<(DateTime<Local>, SunEvent)> {
        let now = self.time.now();
        let today = now.date_naive();
        let times = self.sun_times(coordinates, today)?;

        if times.sunrise > now {
            return Some((times.sunrise, SunEvent::Sunrise));
        }
        if times.sunset > now {
            return Some((times.sunset, SunEvent::Sunset));
        }

        let tomorrow = self.sun_times(coordinates, today + Duration::days(1))?;
        Some((tomorrow.sunrise, SunEvent::Sunrise))
    }

    /// Drop all cached entries.
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap().clear();
        log_debug!("Sun times cache cleared");
    }

    /// Number of cached (coordinates, date) entries.
    pub fn cached_entries(&self) -> usize {
        self.cache.lock().unwrap().len()
    }

    fn fetch_sun_times(&self, coordinates: Coordinates, date: NaiveDate) -> Result<SunTimes> {
        let url = format!(
            "{SUN_API_BASE_URL}/json?lat={}&lng={}&date={}&formatted=0",
            coordinates.latitude,
            coordinates.longitude,
            date.format("%Y-%m-%d")
        );
        log_debug!("Querying sun times API for {coordinates} on {date}");

        let data = self.client.get_json(&url)?;

        let status = data.get("status").and_then(serde_json::Value::as_str);
        if status != Some("OK") {
            return Err(anyhow!("API returned non-success status: {data}"));
        }

        let results = data
            .get("results")
            .ok_or_else(|| anyhow!("Missing 'results' object in API response"))?;
        let sunrise = parse_utc_instant(results, "sunrise")?;
        let sunset = parse_utc_instant(results, "sunset")?;

        Ok(SunTimes {
            date,
            sunrise,
            sunset,
        })
    }
}

/// Extract an ISO-8601 UTC timestamp field and convert it to local time.
fn parse_utc_instant(results: &serde_json::Value, key: &str) -> Result<DateTime<Local>> {
    let raw = results
        .get(key)
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| anyhow!("Missing '{key}' field in API response"))?;

    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Local))
        .with_context(|| format!("Invalid '{key}' timestamp: {raw}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::CannedHttpClient;
    use crate::time_source::MockTimeSource;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    const LONDON: Coordinates = Coordinates {
        latitude: 51.5074,
        longitude: -0.1278,
    };

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    /// API response whose instants land on the given local times.
    fn api_response(sunrise: DateTime<Local>, sunset: DateTime<Local>) -> serde_json::Value {
        json!({
            "status": "OK",
            "results": {
                "sunrise": sunrise.with_timezone(&Utc).to_rfc3339(),
                "sunset": sunset.with_timezone(&Utc).to_rfc3339(),
            }
        })
    }

    fn service(
        client: CannedHttpClient,
        now: DateTime<Local>,
    ) -> (SunTimesService, Arc<CannedHttpClient>, Arc<MockTimeSource>) {
        let client = Arc::new(client);
        let clock = Arc::new(MockTimeSource::new(now));
        (
            SunTimesService::new(client.clone(), clock.clone()),
            client,
            clock,
        )
    }

    #[test]
    fn fetches_and_caches_per_date() {
        let sunrise = local(2026, 8, 27, 7, 30);
        let sunset = local(2026, 8, 27, 18, 45);
        let client = CannedHttpClient::new();
        client.respond_json("api.sunrisesunset.io", api_response(sunrise, sunset));

        let (service, client, _) = service(client, local(2026, 8, 27, 12, 0));
        let date = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();

        let times = service.sun_times(LONDON, date).unwrap();
        assert_eq!(times.sunrise, sunrise);
        assert_eq!(times.sunset, sunset);

        // Second lookup is served from cache
        service.sun_times(LONDON, date).unwrap();
        assert_eq!(client.requests().len(), 1);
        assert_eq!(service.cached_entries(), 1);
    }

    #[test]
    fn non_ok_status_is_a_failure() {
        crate::logger::Log::set_enabled(false);
        let client = CannedHttpClient::new();
        client.respond_json("api.sunrisesunset.io", json!({"status": "INVALID_REQUEST"}));

        let (service, _, _) = service(client, local(2026, 8, 27, 12, 0));
        let date = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        assert!(service.sun_times(LONDON, date).is_none());
        crate::logger::Log::set_enabled(true);
    }

    #[test]
    fn missing_sunset_field_is_a_failure() {
        crate::logger::Log::set_enabled(false);
        let client = CannedHttpClient::new();
        client.respond_json(
            "api.sunrisesunset.io",
            json!({"status": "OK", "results": {"sunrise": "2026-08-27T06:30:00+00:00"}}),
        );

        let (service, _, _) = service(client, local(2026, 8, 27, 12, 0));
        let date = NaiveDate::from_ymd_opt(2026, 8, 27).unwrap();
        assert!(service.sun_times(LONDON, date).is_none());
        crate::logger::Log::set_enabled(true);
    }

    #[test]
    fn period_is_day_between_sunrise_and_sunset() {
        let client = CannedHttpClient::new();
        client.respond_json(
            "api.sunrisesunset.io",
            api_response(local(2026, 8, 27, 7, 30), local(2026, 8, 27, 18, 45)),
        );

        let (service, _, clock) = service(client, local(2026, 8, 27, 12, 0));
        assert_eq!(service.current_sun_period(LONDON), Some(SunPeriod::Day));

        clock.set(local(2026, 8, 27, 22, 0));
        assert_eq!(service.current_sun_period(LONDON), Some(SunPeriod::Night));

        clock.set(local(2026, 8, 27, 3, 0));
        assert_eq!(service.current_sun_period(LONDON), Some(SunPeriod::Night));
    }

    #[test]
    fn next_event_walks_today_then_tomorrow() {
        let client = CannedHttpClient::new();
        client.respond_json(
            "date=2026-08-28",
            api_response(local(2026, 8, 28, 7, 32), local(2026, 8, 28, 18, 43)),
        );
        client.respond_json(
            "api.sunrisesunset.io",
            api_response(local(2026, 8, 27, 7, 30), local(2026, 8, 27, 18, 45)),
        );

        let (service, _, clock) = service(client, local(2026, 8, 27, 5, 0));

        // Before sunrise
        let (at, event) = service.next_sun_event(LONDON).unwrap();
        assert_eq!((at, event), (local(2026, 8, 27, 7, 30), SunEvent::Sunrise));

        // Midday
        clock.set(local(2026, 8, 27, 12, 0));
        let (at, event) = service.next_sun_event(LONDON).unwrap();
        assert_eq!((at, event), (local(2026, 8, 27, 18, 45), SunEvent::Sunset));

        // After sunset: tomorrow's sunrise
        clock.set(local(2026, 8, 27, 23, 0));
        let (at, event) = service.next_sun_event(LONDON).unwrap();
        assert_eq!((at, event), (local(2026, 8, 28, 7, 32), SunEvent::Sunrise));
    }

    #[test]
    fn stale_dates_are_pruned_on_insert() {
        let client = CannedHttpClient::new();
        client.respond_json(
            "api.sunrisesunset.io",
            api_response(local(2026, 8, 27, 7, 30), local(2026, 8, 27, 18, 45)),
        );

        let (service, _, clock) = service(client, local(2026, 8, 27, 12, 0));
        service
            .sun_times(LONDON, NaiveDate::from_ymd_opt(2026, 8, 27).unwrap())
            .unwrap();
        assert_eq!(service.cached_entries(), 1);

        // Next day: fetching the new date drops yesterday's entry
        clock.set(local(2026, 8, 28, 12, 0));
        service
            .sun_times(LONDON, NaiveDate::from_ymd_opt(2026, 8, 28).unwrap())
            .unwrap();
        assert_eq!(service.cached_entries(), 1);
    }
}
