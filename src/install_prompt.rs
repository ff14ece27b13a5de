// SPDX-License-Identifier: GPL-3.0-only

//! Deferred "install app" prompt
//!
//! The platform announces once that the app can be installed. The prompt is
//! parked here until the UI decides to show it; showing consumes it.

use chrono::{DateTime, Utc};
use std::sync::Mutex;
use tracing::debug;

/// Platform availability event, kept until consumed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPrompt {
    /// Platforms the app can be installed on
    pub platforms: Vec<String>,
    pub received_at: DateTime<Utc>,
}

impl InstallPrompt {
    pub fn new(platforms: Vec<String>) -> Self {
        Self {
            platforms,
            received_at: Utc::now(),
        }
    }
}

/// Single-entry slot for a deferred prompt
#[derive(Debug, Default)]
pub struct InstallPromptSlot {
    prompt: Mutex<Option<InstallPrompt>>,
}

impl InstallPromptSlot {
    pub const fn new() -> Self {
        Self {
            prompt: Mutex::new(None),
        }
    }

    /// Park a prompt; ignored if one is already waiting
    ///
    /// # Returns
    /// `true` if the prompt was stored
    pub fn capture(&self, prompt: InstallPrompt) -> bool {
        let Ok(mut slot) = self.prompt.lock() else {
            return false;
        };
        if slot.is_some() {
            debug!("Install prompt already captured");
            return false;
        }
        debug!(platforms = ?prompt.platforms, "Install prompt captured");
        *slot = Some(prompt);
        true
    }

    /// Consume the parked prompt
    pub fn take(&self) -> Option<InstallPrompt> {
        self.prompt.lock().ok()?.take()
    }

    pub fn is_available(&self) -> bool {
        self.prompt.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }
}

static GLOBAL_SLOT: InstallPromptSlot = InstallPromptSlot::new();

/// Park the process-wide prompt
pub fn capture(prompt: InstallPrompt) -> bool {
    GLOBAL_SLOT.capture(prompt)
}

/// Consume the process-wide prompt
pub fn take() -> Option<InstallPrompt> {
    GLOBAL_SLOT.take()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_is_consumed_once() {
        let slot = InstallPromptSlot::new();
        assert!(slot.take().is_none());

        assert!(slot.capture(InstallPrompt::new(vec!["web".into()])));
        assert!(!slot.capture(InstallPrompt::new(vec!["other".into()])));
        assert!(slot.is_available());

        let prompt = slot.take().unwrap();
        assert_eq!(prompt.platforms, vec!["web".to_string()]);
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_global_slot_round_trip() {
        assert!(capture(InstallPrompt::new(vec!["web".into()])));
        assert!(take().is_some());
        assert!(take().is_none());
    }
}
