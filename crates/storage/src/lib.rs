use anyhow::{Context, Result};
use std::{
    cell::RefCell,
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    rc::Rc,
};
use tracing::warn;

mod preferences;
pub use preferences::{PreferenceKeys, PreferenceStore, PresentationAttributes};

/// Durable string key-value substrate backing the preference flags.
///
/// Reads are infallible: a missing key, an unreadable backing file or a
/// corrupt document all read as "unset".
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Process-local store. Clones share the same map, so a clone handed to a
/// second `PreferenceStore` behaves like a reload over the same substrate.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes a raw value, bypassing any validation. Used to seed fixtures.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.insert_raw(key, value);
        Ok(())
    }
}

/// Flat JSON object on disk (`settings.json` under the profile data dir).
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent_dir_exists(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(err) => {
                warn!(path = %self.path.display(), "settings file unreadable, using defaults: {err}");
                return BTreeMap::new();
            }
        };

        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
            Ok(document) => document
                .into_iter()
                .filter_map(|(key, value)| match value {
                    serde_json::Value::String(value) => Some((key, value)),
                    _ => None,
                })
                .collect(),
            Err(err) => {
                warn!(path = %self.path.display(), "settings file is not a JSON object, using defaults: {err}");
                BTreeMap::new()
            }
        }
    }
}

impl KeyValueStore for SettingsFile {
    fn get(&self, key: &str) -> Option<String> {
        self.read_entries().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_entries();
        entries.insert(key.to_string(), value.to_string());
        let serialized =
            serde_json::to_string_pretty(&entries).context("failed to serialize settings")?;

        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serialized)
            .with_context(|| format!("failed to write '{}'", staging.display()))?;
        fs::rename(&staging, &self.path).with_context(|| {
            format!(
                "failed to move '{}' into place at '{}'",
                staging.display(),
                self.path.display()
            )
        })?;
        Ok(())
    }
}

fn ensure_parent_dir_exists(path: &Path) -> Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for settings file '{}'",
            parent.display(),
            path.display()
        )
    })?;

    Ok(())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
