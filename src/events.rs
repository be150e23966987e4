//! Typed event bus for mode, theme, status, and error notifications.
//!
//! The UI-facing surfaces of the application (tray icon, dialogs) observe the
//! core through this bus rather than being called directly. Delivery is
//! defensive: a listener that panics is caught and logged, and the remaining
//! listeners still receive the event. Listeners are identified by the
//! [`ListenerId`] returned at subscription, which is the removal handle.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::common::{ThemeMode, ThemeType};

/// Classification for error events, so observers can react per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed trigger time strings.
    InvalidTime,
    /// Out-of-range or sentinel coordinates.
    InvalidCoordinates,
    /// No theme backend registered or backend not initialized.
    BackendUnavailable,
    /// The backend reported failure applying a theme.
    ThemeApplicationFailed,
    /// Every geolocation provider failed.
    LocationDetectionFailed,
    /// Re-resolving the location failed during a refresh.
    LocationRefreshFailed,
    /// A scheduler could not be started.
    SchedulingFailed,
    /// The requested mode has no registered handler.
    HandlerUnavailable,
}

/// A notification fanned out by the core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The authoritative mode changed. `old_mode` is `None` only before the
    /// first transition after construction.
    ModeChanged {
        new_mode: ThemeMode,
        old_mode: Option<ThemeMode>,
    },
    /// The applied theme actually changed (idempotent re-applies do not
    /// produce this event).
    ThemeChanged { theme: ThemeType },
    /// Human-readable progress feedback, e.g. "Switching to dark theme...".
    Status { message: String, success: bool },
    /// A structured error report.
    Error { kind: ErrorKind, message: String },
}

/// Handle for removing a subscribed listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&AppEvent) + Send + Sync>;

struct Registry {
    listeners: Vec<(ListenerId, Listener)>,
}

/// Cloneable handle to the shared listener registry.
///
/// Cheap to clone; all clones deliver to the same listeners.
#[derive(Clone)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
    next_id: Arc<AtomicU64>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                listeners: Vec::new(),
            })),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a listener for all events. Returns the removal handle.
    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&AppEvent) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut registry = self.registry.lock().unwrap();
        registry.listeners.push((id, Arc::new(listener)));
        id
    }

    /// Remove a previously subscribed listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        let mut registry = self.registry.lock().unwrap();
        registry.listeners.retain(|(lid, _)| *lid != id);
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.registry.lock().unwrap().listeners.len()
    }

    /// Remove all listeners. Called from controller cleanup.
    pub fn clear(&self) {
        self.registry.lock().unwrap().listeners.clear();
    }

    /// Deliver an event to every listener in subscription order.
    ///
    /// The registry lock is released before delivery, so listeners may
    /// subscribe or unsubscribe from inside a callback without deadlocking.
    /// A panicking listener is logged and skipped; delivery continues.
    pub fn emit(&self, event: &AppEvent) {
        let snapshot: Vec<(ListenerId, Listener)> = {
            let registry = self.registry.lock().unwrap();
            registry.listeners.clone()
        };

        for (id, listener) in snapshot {
            let result = catch_unwind(AssertUnwindSafe(|| listener(event)));
            if result.is_err() {
                log_warning!("Event listener {:?} panicked; continuing delivery", id);
            }
        }
    }

    /// Convenience for emitting a status event.
    pub fn status(&self, message: impl Into<String>, success: bool) {
        self.emit(&AppEvent::Status {
            message: message.into(),
            success,
        });
    }

    /// Convenience for emitting an error event.
    pub fn error(&self, kind: ErrorKind, message: impl Into<String>) {
        self.emit(&AppEvent::Error {
            kind,
            message: message.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn delivers_in_subscription_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            bus.subscribe(move |_| seen.lock().unwrap().push(tag));
        }

        bus.status("hello", true);
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        let id = bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        bus.status("one", true);
        bus.unsubscribe(id);
        bus.status("two", true);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn panicking_listener_does_not_abort_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));

        bus.subscribe(|_| panic!("listener bug"));
        let c = count.clone();
        bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        crate::logger::Log::set_enabled(false);
        bus.status("still delivered", true);
        crate::logger::Log::set_enabled(true);

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clones_share_the_registry() {
        let bus = EventBus::new();
        let clone = bus.clone();
        let count = Arc::new(AtomicUsize::new(0));

        let c = count.clone();
        bus.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });

        clone.status("via clone", true);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
