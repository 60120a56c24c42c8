use serde::{Deserialize, Serialize};

/// Backing-store key of the settings singleton.
pub const SETTINGS_KEY: &str = "userSettings";

/// Per-user display and notification preferences.
///
/// A stored object missing some fields takes the defaults for just those
/// fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub dark_mode: bool,
    pub theme_color: String,
    pub push_notifications: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            theme_color: "pink".to_string(),
            push_notifications: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults() {
        let s = UserSettings::default();
        assert!(!s.dark_mode);
        assert_eq!(s.theme_color, "pink");
        assert!(!s.push_notifications);
    }

    #[test]
    fn partial_object_fills_missing_fields() {
        let s: UserSettings = serde_json::from_value(json!({ "darkMode": true })).unwrap();
        assert!(s.dark_mode);
        assert_eq!(s.theme_color, "pink");
    }
}
