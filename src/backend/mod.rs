//! Theme backend abstraction.
//!
//! A backend is the desktop-specific capability that actually flips the
//! visual theme (a settings-database write, a DE-specific command, and so
//! on). The core never assumes a backend is present: the controller holds an
//! optional backend slot, and absence is a normal, handled condition that
//! surfaces as a failed apply with an error event rather than a panic.
//!
//! Backend discovery and loading are the embedding application's concern;
//! this crate only defines the contract and test doubles.

use crate::common::ThemeType;

/// Contract consumed by the theme-application path.
#[cfg_attr(test, mockall::automock)]
pub trait ThemeBackend: Send {
    /// Apply the dark theme. Returns `true` on success.
    fn apply_dark_theme(&mut self) -> bool;

    /// Apply the light theme. Returns `true` on success.
    fn apply_light_theme(&mut self) -> bool;

    /// The theme the desktop currently shows, if the backend can tell.
    fn current_theme(&self) -> Option<ThemeType>;

    /// Whether the backend finished its own initialization and is usable.
    fn is_initialized(&self) -> bool;

    /// Human-readable backend name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(any(test, feature = "testing-support"))]
pub mod testing {
    use std::sync::Arc;
    use std::sync::Mutex;

    use crate::common::ThemeType;

    use super::ThemeBackend;

    /// Test backend that records every apply call.
    ///
    /// Cloneable handle: the controller consumes the boxed backend, so tests
    /// keep a second handle to the shared call log for assertions.
    #[derive(Clone)]
    pub struct RecordingBackend {
        applied: Arc<Mutex<Vec<ThemeType>>>,
        fail_applies: Arc<Mutex<bool>>,
    }

    impl Default for RecordingBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RecordingBackend {
        pub fn new() -> Self {
            Self {
                applied: Arc::new(Mutex::new(Vec::new())),
                fail_applies: Arc::new(Mutex::new(false)),
            }
        }

        /// Make subsequent apply calls report failure.
        pub fn set_failing(&self, failing: bool) {
            *self.fail_applies.lock().unwrap() = failing;
        }

        /// Every theme the backend was asked to apply, in order, including
        /// failed attempts.
        pub fn applied(&self) -> Vec<ThemeType> {
            self.applied.lock().unwrap().clone()
        }

        fn apply(&mut self, theme: ThemeType) -> bool {
            self.applied.lock().unwrap().push(theme);
            !*self.fail_applies.lock().unwrap()
        }
    }

    impl ThemeBackend for RecordingBackend {
        fn apply_dark_theme(&mut self) -> bool {
            self.apply(ThemeType::Dark)
        }

        fn apply_light_theme(&mut self) -> bool {
            self.apply(ThemeType::Light)
        }

        fn current_theme(&self) -> Option<ThemeType> {
            self.applied.lock().unwrap().last().copied()
        }

        fn is_initialized(&self) -> bool {
            true
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }
}
