//! Shared state owned jointly by the controller and the mode handlers.
//!
//! The context is the single place a theme actually gets applied: handlers
//! and the controller both go through [`ThemeContext::apply_theme`], which
//! funnels every apply through the backend slot, keeps the current-theme
//! record, and emits [`AppEvent::ThemeChanged`] only when the applied theme
//! differs from the last one. Re-applies still reach the backend (the
//! desktop may have drifted underneath us) but observers are not re-notified.

use std::sync::{Arc, Mutex};

use crate::backend::ThemeBackend;
use crate::common::{ThemeMode, ThemeType};
use crate::config::{ConfigSnapshot, ConfigStore};
use crate::events::{AppEvent, ErrorKind, EventBus};

/// Theme-application closure handed to mode handlers.
///
/// Handlers hold this instead of the whole context so their worker threads
/// capture exactly one capability.
pub type ThemeApplyFn = Arc<dyn Fn(ThemeType) -> bool + Send + Sync>;

struct ModeState {
    current_mode: ThemeMode,
    current_theme: Option<ThemeType>,
}

/// Backend slot, mode/theme state, event bus, and persistence seam.
pub struct ThemeContext {
    backend: Mutex<Option<Box<dyn ThemeBackend + Send>>>,
    state: Mutex<ModeState>,
    events: EventBus,
    store: Mutex<Box<dyn ConfigStore + Send>>,
}

impl ThemeContext {
    pub fn new(store: Box<dyn ConfigStore + Send>) -> Self {
        let initial_mode = store.load().current_mode;
        Self {
            backend: Mutex::new(None),
            state: Mutex::new(ModeState {
                current_mode: initial_mode,
                current_theme: None,
            }),
            events: EventBus::new(),
            store: Mutex::new(store),
        }
    }

    /// Install (or replace) the theme backend.
    pub fn set_backend(&self, backend: Box<dyn ThemeBackend + Send>) {
        log_debug!("Theme backend registered: {}", backend.name());
        *self.backend.lock().unwrap() = Some(backend);
    }

    /// Remove the backend. Subsequent applies fail with a backend error.
    pub fn clear_backend(&self) {
        *self.backend.lock().unwrap() = None;
    }

    pub fn has_backend(&self) -> bool {
        self.backend.lock().unwrap().is_some()
    }

    /// Apply a theme through the backend.
    ///
    /// Always calls into the backend, even when `theme` matches the current
    /// record. Emits `ThemeChanged` only on an actual change, and an error
    /// event when the backend is missing, uninitialized, or reports failure.
    pub fn apply_theme(&self, theme: ThemeType) -> bool {
        let applied = {
            let mut slot = self.backend.lock().unwrap();
            match slot.as_mut() {
                None => {
                    drop(slot);
                    self.events.error(
                        ErrorKind::BackendUnavailable,
                        "No theme backend is registered",
                    );
                    return false;
                }
                Some(backend) if !backend.is_initialized() => {
                    let name = backend.name();
                    drop(slot);
                    self.events.error(
                        ErrorKind::BackendUnavailable,
                        format!("Theme backend '{name}' is not initialized"),
                    );
                    return false;
                }
                Some(backend) => match theme {
                    ThemeType::Dark => backend.apply_dark_theme(),
                    ThemeType::Light => backend.apply_light_theme(),
                },
            }
        };

        if !applied {
            log_pipe!();
            log_error!("Backend failed to apply {theme} theme");
            self.events.error(
                ErrorKind::ThemeApplicationFailed,
                format!("Failed to apply {theme} theme"),
            );
            return false;
        }

        let changed = {
            let mut state = self.state.lock().unwrap();
            if state.current_theme == Some(theme) {
                false
            } else {
                state.current_theme = Some(theme);
                true
            }
        };

        if changed {
            log_indented!("Theme applied: {theme}");
            self.events.emit(&AppEvent::ThemeChanged { theme });
        }
        true
    }

    /// Record a committed mode transition and notify observers.
    pub fn record_mode(&self, new_mode: ThemeMode) {
        let old_mode = {
            let mut state = self.state.lock().unwrap();
            let old = state.current_mode;
            state.current_mode = new_mode;
            old
        };
        self.events.emit(&AppEvent::ModeChanged {
            new_mode,
            old_mode: Some(old_mode),
        });
    }

    pub fn current_mode(&self) -> ThemeMode {
        self.state.lock().unwrap().current_mode
    }

    pub fn current_theme(&self) -> Option<ThemeType> {
        self.state.lock().unwrap().current_theme
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn load_config(&self) -> ConfigSnapshot {
        self.store.lock().unwrap().load()
    }

    /// Load-modify-save a configuration snapshot.
    ///
    /// A failed save is logged but never blocks the state change that
    /// triggered it; in-memory state stays authoritative.
    pub fn update_config(&self, update: impl FnOnce(&mut ConfigSnapshot)) {
        let mut store = self.store.lock().unwrap();
        let mut snapshot = store.load();
        update(&mut snapshot);
        if let Err(e) = store.save(&snapshot) {
            log_warning!("Failed to persist configuration: {e:#}");
        }
    }
}
