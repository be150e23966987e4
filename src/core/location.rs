//! Location mode: sunrise/sunset-driven switching at a geographic position.
//!
//! Enabling resolves a position (user-supplied coordinates, or IP
//! geolocation when none were given), starts the sun-event scheduler there,
//! and immediately applies the theme for the current sun period. Location
//! refresh re-runs auto-detection for roaming machines and moves the
//! scheduler only when the position actually changed; a failed refresh
//! leaves the previous position active.

use std::sync::Arc;
use std::time::Duration;

use super::{ModeHandler, ModeRequest, ThemeApplyFn};
use crate::common::Coordinates;
use crate::events::{ErrorKind, EventBus};
use crate::geo::scheduler::{SunEventCallback, SunEventScheduler};
use crate::geo::sun_times::SunTimesService;
use crate::geo::{GeoResolver, ResolvedLocation};
use crate::time_source::TimeSource;

pub struct LocationModeHandler {
    resolver: Arc<GeoResolver>,
    sun: Arc<SunTimesService>,
    scheduler: SunEventScheduler,
    apply: ThemeApplyFn,
    events: EventBus,
    active: Option<ResolvedLocation>,
    enabled: bool,
}

impl LocationModeHandler {
    pub fn new(
        resolver: Arc<GeoResolver>,
        sun: Arc<SunTimesService>,
        time: Arc<dyn TimeSource>,
        apply: ThemeApplyFn,
        events: EventBus,
    ) -> Self {
        Self {
            scheduler: SunEventScheduler::new(sun.clone(), time),
            resolver,
            sun,
            apply,
            events,
            active: None,
            enabled: false,
        }
    }

    /// Custom poll interval, used by tests to keep real waits short.
    pub fn with_poll_interval(
        resolver: Arc<GeoResolver>,
        sun: Arc<SunTimesService>,
        time: Arc<dyn TimeSource>,
        apply: ThemeApplyFn,
        events: EventBus,
        poll_interval: Duration,
    ) -> Self {
        Self {
            scheduler: SunEventScheduler::with_poll_interval(sun.clone(), time, poll_interval),
            resolver,
            sun,
            apply,
            events,
            active: None,
            enabled: false,
        }
    }

    /// The position the mode currently operates from, while enabled.
    pub fn current_location(&self) -> Option<&ResolvedLocation> {
        self.active.as_ref()
    }

    /// The next sunrise or sunset at the active position, while enabled.
    pub fn next_sun_event(&self) -> Option<(chrono::DateTime<chrono::Local>, crate::common::SunEvent)> {
        let location = self.active.as_ref()?;
        self.sun.next_sun_event(location.coordinates)
    }

    /// Re-run auto-detection and move the scheduler if the machine moved.
    ///
    /// Only meaningful while enabled with an auto-detected position; manual
    /// coordinates have nothing to refresh. Returns `true` when the mode is
    /// running at an up-to-date position afterwards, whether or not it
    /// changed. On failure the previous position stays active.
    pub fn refresh_location(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(previous) = self.active.clone() else {
            return false;
        };
        if !previous.auto_detected {
            log_debug!("Location refresh skipped: coordinates are user-supplied");
            return false;
        }

        log_block_start!("Refreshing location");
        self.resolver.clear_cache();
        let Some(fresh) = self.resolver.resolve_current_location() else {
            self.events.error(
                ErrorKind::LocationRefreshFailed,
                "Location refresh failed; keeping previous location",
            );
            return false;
        };

        if fresh.coordinates == previous.coordinates {
            // The running scheduler and the applied theme are already
            // correct for these coordinates; a restart would refetch the
            // same sun times
            log_decorated!("Location unchanged: {}", fresh.description);
            return true;
        }

        if !self.start_scheduler_at(fresh.coordinates) {
            // Put the scheduler back where it was
            self.start_scheduler_at(previous.coordinates);
            self.events.error(
                ErrorKind::LocationRefreshFailed,
                "Could not reschedule at the new location; keeping previous location",
            );
            return false;
        }

        self.apply_current_period(fresh.coordinates);
        self.events
            .status(format!("Location updated: {}", fresh.description), true);
        self.active = Some(fresh);
        true
    }

    fn start_scheduler_at(&mut self, coordinates: Coordinates) -> bool {
        let callback: SunEventCallback = {
            let apply = self.apply.clone();
            Arc::new(move |event| {
                apply(event.theme());
            })
        };
        self.scheduler.start(coordinates, callback)
    }

    /// Apply the theme for the current sun period. A failed lookup is not
    /// fatal: the scheduler corrects the theme at the next sun event.
    fn apply_current_period(&self, coordinates: Coordinates) {
        match self.sun.current_sun_period(coordinates) {
            Some(period) => {
                (self.apply)(period.theme());
            }
            None => {
                log_warning!("Could not determine the current sun period; theme left unchanged");
            }
        }
    }
}

impl ModeHandler for LocationModeHandler {
    fn enable(&mut self, request: &ModeRequest) -> bool {
        let ModeRequest::Location { coordinates } = *request else {
            return false;
        };

        let location = match coordinates {
            Some(coordinates) => ResolvedLocation::manual(coordinates),
            None => match self.resolver.resolve_current_location() {
                Some(location) => location,
                None => {
                    self.events.error(
                        ErrorKind::LocationDetectionFailed,
                        "Could not detect a location from any provider",
                    );
                    return false;
                }
            },
        };

        if !self.start_scheduler_at(location.coordinates) {
            self.events.error(
                ErrorKind::SchedulingFailed,
                "Could not start the sun-event scheduler",
            );
            return false;
        }

        self.apply_current_period(location.coordinates);
        self.events.status(
            format!("Location mode active: {}", location.description),
            true,
        );
        self.active = Some(location);
        self.enabled = true;
        true
    }

    fn disable(&mut self) -> bool {
        self.scheduler.stop();
        self.active = None;
        self.enabled = false;
        true
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn refresh(&mut self) -> bool {
        self.refresh_location()
    }
}
