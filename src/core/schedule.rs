//! Schedule mode: fixed daily HH:MM triggers.
//!
//! Enabling starts the clock scheduler and immediately applies the theme the
//! current wall-clock time calls for, so the desktop is correct right away
//! instead of waiting for the next trigger. An immediate apply failure is
//! not fatal (the scheduler keeps running and will retry the theme at its
//! next trigger); a scheduler that fails to start is.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveTime;

use super::{ModeHandler, ModeRequest, ThemeApplyFn};
use crate::common::{ThemeType, trigger_time_minutes};
use crate::schedule::{ClockScheduler, TriggerCallback};
use crate::time_source::TimeSource;

pub struct ScheduleModeHandler {
    scheduler: ClockScheduler,
    time: Arc<dyn TimeSource>,
    apply: ThemeApplyFn,
    times: Option<(NaiveTime, NaiveTime)>,
    enabled: bool,
}

impl ScheduleModeHandler {
    pub fn new(time: Arc<dyn TimeSource>, apply: ThemeApplyFn) -> Self {
        Self {
            scheduler: ClockScheduler::new(time.clone()),
            time,
            apply,
            times: None,
            enabled: false,
        }
    }

    /// Custom poll interval, used by tests to keep real waits short.
    pub fn with_poll_interval(
        time: Arc<dyn TimeSource>,
        apply: ThemeApplyFn,
        poll_interval: Duration,
    ) -> Self {
        Self {
            scheduler: ClockScheduler::with_poll_interval(time.clone(), poll_interval),
            time,
            apply,
            times: None,
            enabled: false,
        }
    }

    /// The active (dark, light) trigger pair while enabled.
    pub fn schedule_times(&self) -> Option<(NaiveTime, NaiveTime)> {
        self.times
    }

    /// The soonest future trigger while enabled.
    pub fn next_trigger_time(&self) -> Option<(NaiveTime, ThemeType)> {
        self.scheduler.next_trigger_time()
    }
}

/// The theme the schedule calls for at a given time of day.
///
/// Light between the light and dark triggers, dark otherwise, with both
/// orderings of the two triggers handled.
fn theme_for_time(now: NaiveTime, dark_time: NaiveTime, light_time: NaiveTime) -> ThemeType {
    let now_m = trigger_time_minutes(now);
    let dark_m = trigger_time_minutes(dark_time);
    let light_m = trigger_time_minutes(light_time);

    if light_m < dark_m {
        if (light_m..dark_m).contains(&now_m) {
            ThemeType::Light
        } else {
            ThemeType::Dark
        }
    } else if (dark_m..light_m).contains(&now_m) {
        ThemeType::Dark
    } else {
        ThemeType::Light
    }
}

impl ModeHandler for ScheduleModeHandler {
    fn enable(&mut self, request: &ModeRequest) -> bool {
        let ModeRequest::Schedule {
            dark_time,
            light_time,
        } = *request
        else {
            return false;
        };

        let callback: TriggerCallback = {
            let apply = self.apply.clone();
            Arc::new(move |theme| {
                apply(theme);
            })
        };

        if !self.scheduler.start(dark_time, light_time, callback) {
            return false;
        }

        let immediate = theme_for_time(self.time.now().time(), dark_time, light_time);
        log_decorated!("Schedule active: dark at {dark_time}, light at {light_time}");
        (self.apply)(immediate);

        self.times = Some((dark_time, light_time));
        self.enabled = true;
        true
    }

    fn disable(&mut self) -> bool {
        self.scheduler.stop();
        self.times = None;
        self.enabled = false;
        true
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::parse_trigger_time;
    use crate::time_source::MockTimeSource;
    use chrono::{Local, TimeZone};
    use std::sync::Mutex;

    const POLL: Duration = Duration::from_millis(5);

    fn t(s: &str) -> NaiveTime {
        parse_trigger_time(s).unwrap()
    }

    #[test]
    fn theme_for_time_covers_both_trigger_orderings() {
        // Conventional: light in the morning, dark in the evening
        assert_eq!(theme_for_time(t("12:00"), t("19:00"), t("07:00")), ThemeType::Light);
        assert_eq!(theme_for_time(t("22:00"), t("19:00"), t("07:00")), ThemeType::Dark);
        assert_eq!(theme_for_time(t("03:00"), t("19:00"), t("07:00")), ThemeType::Dark);
        assert_eq!(theme_for_time(t("07:00"), t("19:00"), t("07:00")), ThemeType::Light);
        assert_eq!(theme_for_time(t("19:00"), t("19:00"), t("07:00")), ThemeType::Dark);

        // Inverted: dark trigger earlier in the day than light
        assert_eq!(theme_for_time(t("12:00"), t("06:00"), t("22:00")), ThemeType::Dark);
        assert_eq!(theme_for_time(t("23:00"), t("06:00"), t("22:00")), ThemeType::Light);
        assert_eq!(theme_for_time(t("01:00"), t("06:00"), t("22:00")), ThemeType::Light);
    }

    #[test]
    fn enable_applies_the_immediate_theme_and_starts_scheduler() {
        let clock = Arc::new(MockTimeSource::new(
            Local.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap(),
        ));
        let applied = Arc::new(Mutex::new(Vec::new()));
        let sink = applied.clone();
        let apply: ThemeApplyFn = Arc::new(move |theme| {
            sink.lock().unwrap().push(theme);
            true
        });

        let mut handler = ScheduleModeHandler::with_poll_interval(clock, apply, POLL);
        assert!(handler.enable(&ModeRequest::Schedule {
            dark_time: t("19:00"),
            light_time: t("07:00"),
        }));

        assert!(handler.is_enabled());
        assert_eq!(*applied.lock().unwrap(), vec![ThemeType::Light]);
        assert_eq!(handler.schedule_times(), Some((t("19:00"), t("07:00"))));
        assert_eq!(
            handler.next_trigger_time(),
            Some((t("19:00"), ThemeType::Dark))
        );

        assert!(handler.disable());
        assert!(!handler.is_enabled());
        assert_eq!(handler.schedule_times(), None);
        assert_eq!(handler.next_trigger_time(), None);
    }

    #[test]
    fn enable_rejects_identical_triggers() {
        crate::logger::Log::set_enabled(false);
        let clock = Arc::new(MockTimeSource::new(
            Local.with_ymd_and_hms(2026, 8, 27, 12, 0, 0).unwrap(),
        ));
        let mut handler =
            ScheduleModeHandler::with_poll_interval(clock, Arc::new(|_| true), POLL);

        let enabled = handler.enable(&ModeRequest::Schedule {
            dark_time: t("07:00"),
            light_time: t("07:00"),
        });
        crate::logger::Log::set_enabled(true);

        assert!(!enabled);
        assert!(!handler.is_enabled());
    }
}
