use std::sync::Arc;

use lifelog::{Document, UserSettings, SETTINGS_KEY};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::codec;
use crate::error::StoreError;
use crate::traits::BackingStore;

/// The single [`UserSettings`] record.
///
/// A missing or unreadable slot reads as the defaults; missing fields in a
/// stored record take their default values.
pub struct SettingsStore<S> {
    store: Arc<S>,
}

impl<S> Clone for SettingsStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: BackingStore> SettingsStore<S> {
    /// Settings stored under [`SETTINGS_KEY`].
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// The slot key.
    pub fn key(&self) -> &str {
        SETTINGS_KEY
    }

    /// Current settings. Never fails.
    pub fn get(&self) -> UserSettings {
        codec::decode_one(SETTINGS_KEY, self.raw().as_deref()).unwrap_or_default()
    }

    /// Shallow-merge `patch` into the current settings and persist them.
    /// Stored fields that [`UserSettings`] does not declare are kept.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use lifelog_store::{MemoryStore, SettingsStore};
    ///
    /// let settings = SettingsStore::new(Arc::new(MemoryStore::new()));
    /// let s = settings.update(&serde_json::json!({ "darkMode": true })).unwrap();
    /// assert!(s.dark_mode);
    /// assert_eq!(s.theme_color, "pink");
    /// ```
    pub fn update<P: Serialize + ?Sized>(&self, patch: &P) -> Result<UserSettings, StoreError> {
        let patch = codec::to_document(SETTINGS_KEY, patch)?;
        let mut doc = self.current_document()?;
        codec::merge_patch(&mut doc, patch);
        let updated: UserSettings = serde_json::from_value(Value::Object(doc.clone()))
            .map_err(|e| StoreError::Patch {
                key: SETTINGS_KEY.to_string(),
                reason: e.to_string(),
            })?;
        self.save(doc, &updated)?;
        Ok(updated)
    }

    /// Apply a typed edit to the current settings and persist them.
    pub fn modify(&self, edit: impl FnOnce(&mut UserSettings)) -> Result<UserSettings, StoreError> {
        let mut settings = self.get();
        edit(&mut settings);
        self.save(self.current_document()?, &settings)?;
        Ok(settings)
    }

    /// Remove stored settings so the defaults apply again.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.store.remove(SETTINGS_KEY).map_err(|e| {
            warn!(key = SETTINGS_KEY, error = %e, "failed to reset settings");
            StoreError::write(SETTINGS_KEY, e)
        })
    }

    fn raw(&self) -> Option<String> {
        match self.store.get(SETTINGS_KEY) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = SETTINGS_KEY, error = %e, "failed to read settings");
                None
            }
        }
    }

    // The stored object with the typed view written over it.
    fn current_document(&self) -> Result<Document, StoreError> {
        let raw = self.raw();
        let stored = raw.as_deref().and_then(|text| serde_json::from_str(text).ok());
        let mut doc = match stored {
            Some(Value::Object(map)) => map,
            _ => Document::new(),
        };
        let current = codec::decode_one(SETTINGS_KEY, raw.as_deref()).unwrap_or_default();
        write_over(&mut doc, &current)?;
        Ok(doc)
    }

    fn save(&self, mut doc: Document, settings: &UserSettings) -> Result<(), StoreError> {
        write_over(&mut doc, settings)?;
        let raw = codec::encode_one(SETTINGS_KEY, &doc)?;
        self.store.set(SETTINGS_KEY, &raw).map_err(|e| {
            warn!(key = SETTINGS_KEY, error = %e, "failed to write settings");
            StoreError::write(SETTINGS_KEY, e)
        })?;
        debug!(key = SETTINGS_KEY, "saved settings");
        Ok(())
    }
}

fn write_over(doc: &mut Document, settings: &UserSettings) -> Result<(), StoreError> {
    for (field, value) in codec::to_document(SETTINGS_KEY, settings)? {
        doc.insert(field, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde_json::json;

    #[test]
    fn defaults_when_missing_or_corrupt() {
        let store = Arc::new(MemoryStore::new());
        let settings = SettingsStore::new(Arc::clone(&store));
        assert_eq!(settings.get(), UserSettings::default());

        store.set(SETTINGS_KEY, "{not json").unwrap();
        assert_eq!(settings.get(), UserSettings::default());
    }

    #[test]
    fn partial_record_fills_defaults() {
        let store = Arc::new(MemoryStore::new());
        store.set(SETTINGS_KEY, r#"{"themeColor":"blue"}"#).unwrap();
        let s = SettingsStore::new(store).get();
        assert_eq!(s.theme_color, "blue");
        assert!(!s.dark_mode);
        assert!(!s.push_notifications);
    }

    #[test]
    fn update_merges_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let settings = SettingsStore::new(Arc::clone(&store));
        settings.update(&json!({ "themeColor": "mint" })).unwrap();
        let s = settings.update(&json!({ "pushNotifications": true })).unwrap();
        assert_eq!(s.theme_color, "mint");
        assert!(s.push_notifications);
        assert_eq!(SettingsStore::new(store).get(), s);
    }

    #[test]
    fn update_rejects_wrong_types() {
        let settings = SettingsStore::new(Arc::new(MemoryStore::new()));
        assert!(settings.update(&json!({ "darkMode": "on" })).is_err());
        assert!(settings.update(&json!(true)).is_err());
    }

    #[test]
    fn undeclared_fields_survive_writes() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(SETTINGS_KEY, r#"{"themeColor":"blue","language":"ko","fontScale":1.5}"#)
            .unwrap();
        let settings = SettingsStore::new(Arc::clone(&store));

        settings.update(&json!({ "darkMode": true })).unwrap();
        settings.modify(|s| s.theme_color = "mint".into()).unwrap();

        let stored: Value = serde_json::from_str(&store.get(SETTINGS_KEY).unwrap().unwrap()).unwrap();
        assert_eq!(stored["language"], "ko");
        assert_eq!(stored["fontScale"], 1.5);
        assert_eq!(stored["darkMode"], true);
        assert_eq!(stored["themeColor"], "mint");
        assert_eq!(stored["pushNotifications"], false);
    }

    #[test]
    fn write_failure_keeps_previous_settings() {
        let settings = SettingsStore::new(Arc::new(MemoryStore::with_quota(20)));
        let err = settings.update(&json!({ "darkMode": true })).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(settings.get(), UserSettings::default());
    }

    #[test]
    fn modify_and_reset() {
        let settings = SettingsStore::new(Arc::new(MemoryStore::new()));
        settings.modify(|s| s.dark_mode = true).unwrap();
        assert!(settings.get().dark_mode);
        settings.reset().unwrap();
        assert_eq!(settings.get(), UserSettings::default());
    }
}
