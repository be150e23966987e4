//! Clock scheduler: fixed daily HH:MM theme triggers.
//!
//! While enabled, one background worker polls the wall clock at a bounded
//! interval and compares the current minute against the two configured
//! triggers. A trigger fires its callback at most once per distinct minute,
//! so multiple wake-ups inside the same minute never double-fire. Stopping
//! is deterministic: no callback fires after [`ClockScheduler::stop`]
//! returns.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;

use crate::common::{ThemeType, trigger_time_minutes};
use crate::time_source::TimeSource;

pub(crate) mod worker;

use worker::{WORKER_STOP_TIMEOUT, Worker};

/// Upper bound between wall-clock polls. Minute-granularity triggers only
/// need the worker to wake a few times per minute.
pub const CLOCK_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Callback invoked when a trigger matches.
pub type TriggerCallback = Arc<dyn Fn(ThemeType) + Send + Sync>;

#[derive(Clone, Copy)]
struct Triggers {
    dark_minutes: u32,
    light_minutes: u32,
}

/// Background poller for two fixed daily HH:MM triggers.
pub struct ClockScheduler {
    time: Arc<dyn TimeSource>,
    poll_interval: Duration,
    triggers: Option<Triggers>,
    worker: Option<Worker>,
}

impl ClockScheduler {
    pub fn new(time: Arc<dyn TimeSource>) -> Self {
        Self::with_poll_interval(time, CLOCK_POLL_INTERVAL)
    }

    /// Custom poll interval, used by tests to keep real waits short.
    pub fn with_poll_interval(time: Arc<dyn TimeSource>, poll_interval: Duration) -> Self {
        Self {
            time,
            poll_interval,
            triggers: None,
            worker: None,
        }
    }

    /// Start the trigger worker. Any previous worker is stopped first.
    ///
    /// `dark_time` and `light_time` must differ; callers validate the raw
    /// strings, this guards the invariant.
    pub fn start(
        &mut self,
        dark_time: NaiveTime,
        light_time: NaiveTime,
        callback: TriggerCallback,
    ) -> bool {
        if dark_time == light_time {
            log_error!("Clock scheduler requires distinct dark and light trigger times");
            return false;
        }
        self.stop();

        let triggers = Triggers {
            dark_minutes: trigger_time_minutes(dark_time),
            light_minutes: trigger_time_minutes(light_time),
        };
        let time = self.time.clone();
        let poll = self.poll_interval;

        let worker = Worker::spawn("clock-scheduler", move |signal| {
            log_debug!("Clock scheduler worker started");
            // Minute buckets since the epoch, so a day rollover still counts
            // as a new minute
            let mut last_checked_bucket: Option<i64> = None;

            loop {
                if signal.is_stopped() {
                    break;
                }

                let now = time.now();
                let bucket = now.timestamp().div_euclid(60);
                if last_checked_bucket != Some(bucket) {
                    last_checked_bucket = Some(bucket);

                    let current_minutes = trigger_time_minutes(now.time());
                    let matched = if current_minutes == triggers.dark_minutes {
                        Some(ThemeType::Dark)
                    } else if current_minutes == triggers.light_minutes {
                        Some(ThemeType::Light)
                    } else {
                        None
                    };

                    if let Some(theme) = matched {
                        // Re-check: a stop requested mid-iteration must win
                        if signal.is_stopped() {
                            break;
                        }
                        log_block_start!(
                            "Schedule trigger at {}: switching to {theme} theme",
                            now.format("%H:%M")
                        );
                        callback(theme);
                    }
                }

                if signal.wait(poll) {
                    break;
                }
            }
            log_debug!("Clock scheduler worker stopped");
        });

        match worker {
            Ok(worker) => {
                self.worker = Some(worker);
                self.triggers = Some(triggers);
                true
            }
            Err(e) => {
                log_pipe!();
                log_error!("Failed to start clock scheduler: {e:#}");
                false
            }
        }
    }

    /// Stop the worker, blocking (bounded) until it has observably finished.
    pub fn stop(&mut self) {
        self.triggers = None;
        if let Some(worker) = self.worker.take()
            && !worker.stop(WORKER_STOP_TIMEOUT)
        {
            log_warning!("Clock scheduler worker did not stop within timeout; detached");
        }
    }

    /// Whether the trigger worker is currently running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// The soonest future trigger, wrapping to tomorrow's earliest trigger
    /// when both of today's have passed.
    pub fn next_trigger_time(&self) -> Option<(NaiveTime, ThemeType)> {
        let triggers = self.triggers?;
        let current_minutes = trigger_time_minutes(self.time.now().time());

        let mut ordered = [
            (triggers.dark_minutes, ThemeType::Dark),
            (triggers.light_minutes, ThemeType::Light),
        ];
        ordered.sort_by_key(|(minutes, _)| *minutes);

        let (minutes, theme) = ordered
            .iter()
            .find(|(minutes, _)| *minutes > current_minutes)
            .copied()
            .unwrap_or(ordered[0]);

        NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).map(|t| (t, theme))
    }
}

impl Drop for ClockScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
