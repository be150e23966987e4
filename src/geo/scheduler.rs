//! Sun-event scheduler: sunrise/sunset theme triggers.
//!
//! While enabled, one background worker polls the wall clock at minute
//! granularity against the current date's sunrise/sunset instants, fetched
//! through [`SunTimesService`] at the start of each calendar date (and
//! retried while unresolved). Events match within a ±1-minute window rather
//! than to the exact second: the external API's resolution and local clock
//! drift make exact matching unreliable. Stopping carries the same
//! deterministic guarantee as the clock scheduler.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate};

use crate::common::{Coordinates, SunEvent};
use crate::geo::sun_times::{SunTimes, SunTimesService};
use crate::schedule::worker::{WORKER_STOP_TIMEOUT, Worker};
use crate::time_source::TimeSource;

/// Upper bound between wall-clock polls.
pub const SUN_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Matching window around a sun event.
const EVENT_WINDOW_SECS: i64 = 60;

/// Callback invoked when a sun event matches.
pub type SunEventCallback = Arc<dyn Fn(SunEvent) + Send + Sync>;

/// Background poller for sunrise/sunset events at fixed coordinates.
pub struct SunEventScheduler {
    service: Arc<SunTimesService>,
    time: Arc<dyn TimeSource>,
    poll_interval: Duration,
    worker: Option<Worker>,
}

impl SunEventScheduler {
    pub fn new(service: Arc<SunTimesService>, time: Arc<dyn TimeSource>) -> Self {
        Self::with_poll_interval(service, time, SUN_POLL_INTERVAL)
    }

    /// Custom poll interval, used by tests to keep real waits short.
    pub fn with_poll_interval(
        service: Arc<SunTimesService>,
        time: Arc<dyn TimeSource>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            service,
            time,
            poll_interval,
            worker: None,
        }
    }

    /// Start the event worker for the given coordinates. Any previous worker
    /// is stopped first.
    pub fn start(&mut self, coordinates: Coordinates, callback: SunEventCallback) -> bool {
        self.stop();

        let service = self.service.clone();
        let time = self.time.clone();
        let poll = self.poll_interval;

        let worker = Worker::spawn("sun-event-scheduler", move |signal| {
            log_debug!("Sun event scheduler worker started");
            let mut sun_times: Option<SunTimes> = None;
            let mut fetched_for: Option<NaiveDate> = None;
            let mut last_checked_bucket: Option<i64> = None;

            loop {
                if signal.is_stopped() {
                    break;
                }

                let now = time.now();
                let today = now.date_naive();

                // Fetch on first run and at day rollover; a failed fetch
                // leaves sun_times unset and is retried next lap
                if fetched_for != Some(today) || sun_times.is_none() {
                    sun_times = service.sun_times(coordinates, today);
                    fetched_for = Some(today);
                }

                let bucket = now.timestamp().div_euclid(60);
                if last_checked_bucket != Some(bucket) {
                    last_checked_bucket = Some(bucket);
                    if let Some(times) = sun_times {
                        let matched = if within_window(now, times.sunrise) {
                            Some(SunEvent::Sunrise)
                        } else if within_window(now, times.sunset) {
                            Some(SunEvent::Sunset)
                        } else {
                            None
                        };

                        if let Some(event) = matched {
                            if signal.is_stopped() {
                                break;
                            }
                            log_block_start!("{event} at {}", now.format("%H:%M"));
                            callback(event);
                        }
                    }
                }

                if signal.wait(poll) {
                    break;
                }
            }
            log_debug!("Sun event scheduler worker stopped");
        });

        match worker {
            Ok(worker) => {
                self.worker = Some(worker);
                true
            }
            Err(e) => {
                log_pipe!();
                log_error!("Failed to start sun event scheduler: {e:#}");
                false
            }
        }
    }

    /// Stop the worker, blocking (bounded) until it has observably finished.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take()
            && !worker.stop(WORKER_STOP_TIMEOUT)
        {
            log_warning!("Sun event scheduler worker did not stop within timeout; detached");
        }
    }

    /// Whether the event worker is currently running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for SunEventScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

fn within_window(now: DateTime<Local>, target: DateTime<Local>) -> bool {
    (now - target).num_seconds().abs() < EVENT_WINDOW_SECS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::CannedHttpClient;
    use crate::time_source::MockTimeSource;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Mutex;

    const POLL: Duration = Duration::from_millis(5);
    const SETTLE: Duration = Duration::from_millis(60);

    const LONDON: Coordinates = Coordinates {
        latitude: 51.5074,
        longitude: -0.1278,
    };

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn api_response(sunrise: DateTime<Local>, sunset: DateTime<Local>) -> serde_json::Value {
        json!({
            "status": "OK",
            "results": {
                "sunrise": sunrise.with_timezone(&Utc).to_rfc3339(),
                "sunset": sunset.with_timezone(&Utc).to_rfc3339(),
            }
        })
    }

    struct Fixture {
        scheduler: SunEventScheduler,
        clock: Arc<MockTimeSource>,
        events: Arc<Mutex<Vec<SunEvent>>>,
    }

    fn fixture(client: CannedHttpClient, start: DateTime<Local>) -> Fixture {
        let clock = Arc::new(MockTimeSource::new(start));
        let service = Arc::new(SunTimesService::new(Arc::new(client), clock.clone()));
        Fixture {
            scheduler: SunEventScheduler::with_poll_interval(service, clock.clone(), POLL),
            clock,
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn start(fixture: &mut Fixture) {
        let sink = fixture.events.clone();
        let callback: SunEventCallback = Arc::new(move |event| sink.lock().unwrap().push(event));
        assert!(fixture.scheduler.start(LONDON, callback));
    }

    #[test]
    fn fires_sunrise_and_sunset_in_window_and_nothing_at_noon() {
        let client = CannedHttpClient::new();
        client.respond_json(
            "api.sunrisesunset.io",
            api_response(local(2026, 8, 27, 7, 30), local(2026, 8, 27, 18, 45)),
        );

        let mut fx = fixture(client, local(2026, 8, 27, 7, 28));
        start(&mut fx);
        std::thread::sleep(SETTLE);
        assert!(fx.events.lock().unwrap().is_empty());

        fx.clock.set(local(2026, 8, 27, 7, 30));
        std::thread::sleep(SETTLE);
        assert_eq!(*fx.events.lock().unwrap(), vec![SunEvent::Sunrise]);

        // Noon is inside no window
        fx.clock.set(local(2026, 8, 27, 12, 0));
        std::thread::sleep(SETTLE);
        assert_eq!(*fx.events.lock().unwrap(), vec![SunEvent::Sunrise]);

        fx.clock.set(local(2026, 8, 27, 18, 45));
        std::thread::sleep(SETTLE);
        assert_eq!(
            *fx.events.lock().unwrap(),
            vec![SunEvent::Sunrise, SunEvent::Sunset]
        );

        fx.scheduler.stop();
    }

    #[test]
    fn refetches_at_day_rollover() {
        let client = CannedHttpClient::new();
        client.respond_json(
            "date=2026-08-28",
            api_response(local(2026, 8, 28, 7, 32), local(2026, 8, 28, 18, 43)),
        );
        client.respond_json(
            "api.sunrisesunset.io",
            api_response(local(2026, 8, 27, 7, 30), local(2026, 8, 27, 18, 45)),
        );

        let mut fx = fixture(client, local(2026, 8, 27, 23, 50));
        start(&mut fx);
        std::thread::sleep(SETTLE);

        // Next day's sunrise comes from the refetched times
        fx.clock.set(local(2026, 8, 28, 7, 32));
        std::thread::sleep(SETTLE);
        assert_eq!(*fx.events.lock().unwrap(), vec![SunEvent::Sunrise]);

        fx.scheduler.stop();
    }

    #[test]
    fn failed_fetch_is_retried_without_firing() {
        crate::logger::Log::set_enabled(false);
        let client = CannedHttpClient::new();
        client.respond_failure("api.sunrisesunset.io", "simulated outage");

        let mut fx = fixture(client, local(2026, 8, 27, 7, 29));
        start(&mut fx);
        fx.clock.set(local(2026, 8, 27, 7, 30));
        std::thread::sleep(SETTLE);

        assert!(fx.events.lock().unwrap().is_empty());
        fx.scheduler.stop();
        crate::logger::Log::set_enabled(true);
    }

    #[test]
    fn no_callback_after_stop_returns() {
        let client = CannedHttpClient::new();
        client.respond_json(
            "api.sunrisesunset.io",
            api_response(local(2026, 8, 27, 7, 30), local(2026, 8, 27, 18, 45)),
        );

        let mut fx = fixture(client, local(2026, 8, 27, 12, 0));
        start(&mut fx);
        std::thread::sleep(SETTLE);
        fx.scheduler.stop();
        assert!(!fx.scheduler.is_running());

        fx.clock.set(local(2026, 8, 27, 18, 45));
        std::thread::sleep(SETTLE);
        assert!(fx.events.lock().unwrap().is_empty());
    }
}
