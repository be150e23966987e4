//! Mode transition orchestration.
//!
//! All mode changes go through [`ModeController`]. A transition validates
//! its inputs first (nothing changes on bad input), disables the previously
//! active handler, enables the target handler, and only then commits: the
//! mode is recorded, observers are notified, and the configuration snapshot
//! is persisted. When enabling the target fails, the previous handler stays
//! disabled but the recorded mode value is left untouched, so the embedding
//! application can surface the failure and retry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::common::{Coordinates, ThemeMode, ThemeType, parse_trigger_time};
use crate::events::{ErrorKind, EventBus};

use super::{ModeHandler, ModeRequest, ThemeApplyFn, ThemeContext};

pub struct ModeController {
    context: Arc<ThemeContext>,
    handlers: HashMap<ThemeMode, Box<dyn ModeHandler>>,
    active: Option<ThemeMode>,
}

impl ModeController {
    pub fn new(context: Arc<ThemeContext>) -> Self {
        Self {
            context,
            handlers: HashMap::new(),
            active: None,
        }
    }

    /// Theme-application closure bound to this controller's context, for
    /// constructing mode handlers.
    pub fn apply_fn(&self) -> ThemeApplyFn {
        let context = self.context.clone();
        Arc::new(move |theme| context.apply_theme(theme))
    }

    pub fn context(&self) -> &Arc<ThemeContext> {
        &self.context
    }

    pub fn events(&self) -> &EventBus {
        self.context.events()
    }

    pub fn current_mode(&self) -> ThemeMode {
        self.context.current_mode()
    }

    pub fn current_theme(&self) -> Option<ThemeType> {
        self.context.current_theme()
    }

    /// Install the handler for a mode, replacing any previous one.
    ///
    /// A replaced handler that was active is disabled first; the mode then
    /// falls back to manual.
    pub fn register_mode_handler(&mut self, mode: ThemeMode, handler: Box<dyn ModeHandler>) {
        if self.active == Some(mode) {
            self.deactivate(mode);
            self.handlers.insert(mode, handler);
            if mode != ThemeMode::Manual {
                self.set_manual_mode(None);
            }
            return;
        }
        self.handlers.insert(mode, handler);
    }

    /// Remove the handler for a mode. An active non-manual mode falls back
    /// to manual.
    pub fn unregister_mode_handler(&mut self, mode: ThemeMode) -> Option<Box<dyn ModeHandler>> {
        let was_active = self.active == Some(mode);
        if was_active {
            self.deactivate(mode);
        }
        let removed = self.handlers.remove(&mode);
        if was_active && mode != ThemeMode::Manual {
            self.set_manual_mode(None);
        }
        removed
    }

    /// Switch to manual mode, optionally applying a theme immediately.
    pub fn set_manual_mode(&mut self, theme: Option<ThemeType>) -> bool {
        log_block_start!("Switching to manual mode");
        if !self.transition(ThemeMode::Manual, ModeRequest::Manual { theme }) {
            return false;
        }
        self.context.update_config(|cfg| {
            cfg.current_mode = ThemeMode::Manual;
            cfg.schedule_enabled = false;
            cfg.location_enabled = false;
            if let Some(theme) = theme {
                cfg.manual_theme = theme;
            }
        });
        true
    }

    /// Switch to schedule mode with the given HH:MM trigger strings.
    ///
    /// Validation happens before any state change: malformed or identical
    /// times emit an [`ErrorKind::InvalidTime`] event and leave the current
    /// mode running.
    pub fn set_schedule_mode(&mut self, dark_time: &str, light_time: &str) -> bool {
        let (Some(dark), Some(light)) = (
            parse_trigger_time(dark_time),
            parse_trigger_time(light_time),
        ) else {
            self.context.events().error(
                ErrorKind::InvalidTime,
                format!("Invalid trigger times: '{dark_time}' / '{light_time}'"),
            );
            return false;
        };
        if dark == light {
            self.context.events().error(
                ErrorKind::InvalidTime,
                format!("Dark and light trigger times must differ: '{dark_time}'"),
            );
            return false;
        }

        log_block_start!("Switching to schedule mode ({dark_time} / {light_time})");
        if !self.transition(
            ThemeMode::Schedule,
            ModeRequest::Schedule {
                dark_time: dark,
                light_time: light,
            },
        ) {
            return false;
        }

        let (dark_time, light_time) = (dark_time.to_string(), light_time.to_string());
        self.context.update_config(|cfg| {
            cfg.current_mode = ThemeMode::Schedule;
            cfg.schedule_enabled = true;
            cfg.location_enabled = false;
            cfg.dark_time = dark_time;
            cfg.light_time = light_time;
        });
        true
    }

    /// Switch to location mode.
    ///
    /// With both coordinates given they are validated and used directly;
    /// otherwise the location is auto-detected via IP geolocation. A single
    /// coordinate is treated as none given.
    pub fn set_location_mode(&mut self, latitude: Option<f64>, longitude: Option<f64>) -> bool {
        let coordinates = match (latitude, longitude) {
            (Some(lat), Some(lon)) => match Coordinates::validated(lat, lon) {
                Some(coordinates) => Some(coordinates),
                None => {
                    self.context.events().error(
                        ErrorKind::InvalidCoordinates,
                        format!("Invalid coordinates: {lat}, {lon}"),
                    );
                    return false;
                }
            },
            _ => None,
        };

        log_block_start!("Switching to location mode");
        if !self.transition(ThemeMode::Location, ModeRequest::Location { coordinates }) {
            return false;
        }

        self.context.update_config(|cfg| {
            cfg.current_mode = ThemeMode::Location;
            cfg.schedule_enabled = false;
            cfg.location_enabled = true;
            cfg.auto_location = coordinates.is_none();
            cfg.latitude = coordinates.map(|c| c.latitude);
            cfg.longitude = coordinates.map(|c| c.longitude);
        });
        true
    }

    /// Force manual mode and apply the dark theme.
    pub fn manual_switch_to_dark(&mut self) -> bool {
        self.manual_switch(ThemeType::Dark)
    }

    /// Force manual mode and apply the light theme.
    pub fn manual_switch_to_light(&mut self) -> bool {
        self.manual_switch(ThemeType::Light)
    }

    /// Force manual mode and apply the opposite of the current theme.
    ///
    /// Dark flips to light; anything else, including no theme applied yet,
    /// flips to dark.
    pub fn manual_toggle_theme(&mut self) -> bool {
        let next = match self.context.current_theme() {
            Some(ThemeType::Dark) => ThemeType::Light,
            _ => ThemeType::Dark,
        };
        self.manual_switch(next)
    }

    fn manual_switch(&mut self, theme: ThemeType) -> bool {
        self.context
            .events()
            .status(format!("Switching to {theme} theme..."), true);

        let switched = if self.active == Some(ThemeMode::Manual) {
            // Already manual: apply directly, no mode transition
            if self.context.apply_theme(theme) {
                self.context.update_config(|cfg| cfg.manual_theme = theme);
                true
            } else {
                false
            }
        } else {
            self.set_manual_mode(Some(theme))
        };

        if switched {
            self.context
                .events()
                .status(format!("Successfully switched to {theme} theme"), true);
        } else {
            self.context
                .events()
                .status(format!("Failed to switch to {theme} theme"), false);
        }
        switched
    }

    /// Re-run location detection for an active, auto-detected location mode.
    pub fn refresh_location(&mut self) -> bool {
        if self.active != Some(ThemeMode::Location) {
            return false;
        }
        match self.handlers.get_mut(&ThemeMode::Location) {
            Some(handler) => handler.refresh(),
            None => false,
        }
    }

    /// Re-activate the mode recorded in the configuration snapshot.
    ///
    /// Called once at startup after handlers are registered. Falls back to
    /// manual mode when the persisted mode cannot be activated.
    pub fn restore_from_config(&mut self) -> bool {
        let snapshot = self.context.load_config();
        log_info!("Restoring {} mode from saved configuration", snapshot.current_mode);
        let restored = match snapshot.current_mode {
            ThemeMode::Manual => self.set_manual_mode(Some(snapshot.manual_theme)),
            ThemeMode::Schedule => {
                self.set_schedule_mode(&snapshot.dark_time, &snapshot.light_time)
            }
            ThemeMode::Location => {
                let (latitude, longitude) = if snapshot.auto_location {
                    (None, None)
                } else {
                    (snapshot.latitude, snapshot.longitude)
                };
                self.set_location_mode(latitude, longitude)
            }
        };

        if !restored && snapshot.current_mode != ThemeMode::Manual {
            log_warning!(
                "Could not restore {} mode; falling back to manual",
                snapshot.current_mode
            );
            return self.set_manual_mode(Some(snapshot.manual_theme));
        }
        restored
    }

    /// Disable the active handler and drop all event listeners.
    pub fn cleanup(&mut self) {
        log_block_start!("Shutting down mode controller");
        if let Some(active) = self.active {
            self.deactivate(active);
        }
        self.context.events().clear();
        log_end!();
    }

    fn deactivate(&mut self, mode: ThemeMode) {
        if let Some(handler) = self.handlers.get_mut(&mode)
            && !handler.disable()
        {
            log_warning!("Handler for {mode} mode did not disable cleanly");
        }
        self.active = None;
    }

    fn transition(&mut self, target: ThemeMode, request: ModeRequest) -> bool {
        if !self.handlers.contains_key(&target) {
            self.context.events().error(
                ErrorKind::HandlerUnavailable,
                format!("No handler registered for {target} mode"),
            );
            return false;
        }

        // Disable whatever is running, including the target itself when its
        // parameters are being replaced
        if let Some(active) = self.active {
            self.deactivate(active);
        }

        let Some(handler) = self.handlers.get_mut(&target) else {
            return false;
        };
        if !handler.enable(&request) {
            log_warning!("Failed to enable {target} mode");
            return false;
        }

        self.active = Some(target);
        self.context.record_mode(target);
        true
    }
}
