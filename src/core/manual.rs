//! Manual mode: no automation, the user picks the theme.
//!
//! This is the fallback mode every transition can land on. Enabling without
//! a theme never fails; enabling with a requested theme fails when the
//! backend rejects the apply, so the controller does not commit a switch
//! that visibly did nothing.

use super::{ModeHandler, ModeRequest, ThemeApplyFn};

pub struct ManualModeHandler {
    apply: ThemeApplyFn,
    enabled: bool,
}

impl ManualModeHandler {
    pub fn new(apply: ThemeApplyFn) -> Self {
        Self {
            apply,
            enabled: false,
        }
    }
}

impl ModeHandler for ManualModeHandler {
    fn enable(&mut self, request: &ModeRequest) -> bool {
        let theme = match request {
            ModeRequest::Manual { theme } => *theme,
            _ => None,
        };
        if let Some(theme) = theme
            && !(self.apply)(theme)
        {
            // The apply path already reported the failure
            return false;
        }
        self.enabled = true;
        true
    }

    fn disable(&mut self) -> bool {
        self.enabled = false;
        true
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
