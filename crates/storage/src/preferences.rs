use anyhow::{Context, Result};
use shared::domain::{Contrast, Preferences, Theme};
use tracing::{debug, warn};

use crate::KeyValueStore;

/// Storage keys, optionally namespaced (`"tuzobus-"` gives `tuzobus-theme`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreferenceKeys {
    pub theme: String,
    pub contrast: String,
}

impl PreferenceKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            theme: format!("{prefix}theme"),
            contrast: format!("{prefix}contrast"),
        }
    }
}

impl Default for PreferenceKeys {
    fn default() -> Self {
        Self::with_prefix("")
    }
}

/// Flags the rendering layer reads to pick palette and contrast class sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresentationAttributes {
    pub dark: bool,
    pub high_contrast: bool,
}

impl PresentationAttributes {
    pub fn class_list(&self) -> Vec<&'static str> {
        let mut classes = Vec::with_capacity(2);
        if self.dark {
            classes.push("dark");
        }
        if self.high_contrast {
            classes.push("high-contrast");
        }
        classes
    }
}

pub struct PreferenceStore {
    backend: Box<dyn KeyValueStore>,
    keys: PreferenceKeys,
    cached: Preferences,
    presentation: PresentationAttributes,
}

impl PreferenceStore {
    pub fn new(backend: Box<dyn KeyValueStore>, keys: PreferenceKeys) -> Self {
        Self {
            backend,
            keys,
            cached: Preferences::default(),
            presentation: PresentationAttributes::default(),
        }
    }

    pub fn load(&self) -> Preferences {
        let theme = match self.backend.get(&self.keys.theme) {
            None => Theme::default(),
            Some(raw) => Theme::from_stored(&raw).unwrap_or_else(|| {
                warn!(key = %self.keys.theme, value = %raw, "unrecognized stored theme; using default");
                Theme::default()
            }),
        };
        let contrast = match self.backend.get(&self.keys.contrast) {
            None => Contrast::default(),
            Some(raw) => Contrast::from_stored(&raw).unwrap_or_else(|| {
                warn!(key = %self.keys.contrast, value = %raw, "unrecognized stored contrast; using default");
                Contrast::default()
            }),
        };
        Preferences { theme, contrast }
    }

    /// Adopts `preferences` as the cached state and mirrors it into the
    /// presentation flags. Nothing is written back.
    pub fn apply(&mut self, preferences: Preferences) {
        self.cached = preferences;
        self.presentation.dark = preferences.theme.is_dark();
        self.presentation.high_contrast = preferences.contrast.is_high();
        debug!(?preferences, "applied preferences to presentation");
    }

    /// Cache, then presentation, then durable write. A failed write leaves the
    /// first two updated; the next `load` re-derives from what was persisted.
    pub fn set_theme(&mut self, dark: bool) -> Result<()> {
        let theme = Theme::from_dark(dark);
        self.cached.theme = theme;
        self.presentation.dark = dark;
        self.backend
            .set(&self.keys.theme, theme.as_stored())
            .with_context(|| format!("failed to persist theme '{}'", theme.as_stored()))
    }

    pub fn set_contrast(&mut self, high: bool) -> Result<()> {
        let contrast = Contrast::from_high(high);
        self.cached.contrast = contrast;
        self.presentation.high_contrast = high;
        self.backend
            .set(&self.keys.contrast, contrast.as_stored())
            .with_context(|| format!("failed to persist contrast '{}'", contrast.as_stored()))
    }

    pub fn preferences(&self) -> Preferences {
        self.cached
    }

    pub fn presentation(&self) -> PresentationAttributes {
        self.presentation
    }

    pub fn keys(&self) -> &PreferenceKeys {
        &self.keys
    }
}

#[cfg(test)]
#[path = "tests/preferences_tests.rs"]
mod tests;
