//! Persisted dashboard settings
//!
//! A single blob stored under [`SETTINGS_KEY`] holds the selected tenant, the selected
//! branding, and feature toggles. Older blobs used a flat layout with toggles at the top
//! level; [`migrate_settings`] upgrades any known version into the current one so there is
//! exactly one representation in memory.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed key the settings blob is stored under
pub const SETTINGS_KEY: &str = "crewboard-settings";

/// Current settings layout version
pub const SETTINGS_VERSION: u32 = 2;

/// Legacy top-level keys that are not feature toggles
const LEGACY_RESERVED_KEYS: &[&str] = &["selectedClient", "branding", "selectedBranding"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub version: u32,
    /// Opaque tenant selector (client code or id); never interpreted here
    pub selected_client: Option<String>,
    pub selected_branding: Option<String>,
    #[serde(default)]
    pub features: BTreeMap<String, bool>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            selected_client: None,
            selected_branding: None,
            features: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }

    /// Select a tenant. Returns true when the selection changed.
    pub fn select_client(&mut self, selector: &str) -> bool {
        let selector = selector.trim();
        let next = if selector.is_empty() {
            None
        } else {
            Some(selector.to_string())
        };
        let changed = self.selected_client != next;
        self.selected_client = next;
        changed
    }
}

fn string_field(map: &serde_json::Map<String, serde_json::Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Upgrade a stored settings blob of any known version to [`SETTINGS_VERSION`].
///
/// Unknown keys are ignored. Anything that is not a JSON object yields default settings.
pub fn migrate_settings(raw: serde_json::Value) -> Settings {
    let map = match raw {
        serde_json::Value::Object(map) => map,
        _ => return Settings::default(),
    };

    let version = map.get("version").and_then(|v| v.as_u64()).unwrap_or(1);

    if version >= u64::from(SETTINGS_VERSION) {
        let features = map
            .get("features")
            .and_then(|v| v.as_object())
            .map(|features| {
                features
                    .iter()
                    .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
                    .collect()
            })
            .unwrap_or_default();

        return Settings {
            version: SETTINGS_VERSION,
            selected_client: string_field(&map, "selectedClient"),
            selected_branding: string_field(&map, "selectedBranding"),
            features,
        };
    }

    // Version 1: flat blob, branding under `branding`, toggles at the top level
    let features = map
        .iter()
        .filter(|(k, _)| !LEGACY_RESERVED_KEYS.contains(&k.as_str()) && k.as_str() != "version")
        .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
        .collect();

    tracing::debug!("Migrated settings blob from version {} to {}", version, SETTINGS_VERSION);

    Settings {
        version: SETTINGS_VERSION,
        selected_client: string_field(&map, "selectedClient"),
        selected_branding: string_field(&map, "branding")
            .or_else(|| string_field(&map, "selectedBranding")),
        features,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn migrates_flat_legacy_blob() {
        let settings = migrate_settings(json!({
            "selectedClient": "ACME_CORP",
            "branding": "acme",
            "showInvitations": true,
            "darkMode": false,
            "pageSize": 25
        }));
        assert_eq!(settings.version, SETTINGS_VERSION);
        assert_eq!(settings.selected_client.as_deref(), Some("ACME_CORP"));
        assert_eq!(settings.selected_branding.as_deref(), Some("acme"));
        assert!(settings.feature_enabled("showInvitations"));
        assert!(!settings.feature_enabled("darkMode"));
        assert!(!settings.features.contains_key("pageSize"));
    }

    #[test]
    fn current_blob_round_trips() {
        let mut settings = Settings::default();
        settings.select_client("DEMO_CORP");
        settings.features.insert("bulkActions".to_string(), true);

        let raw = serde_json::to_value(&settings).unwrap();
        assert_eq!(migrate_settings(raw), settings);
    }

    #[test]
    fn non_object_yields_defaults() {
        assert_eq!(migrate_settings(json!("garbage")), Settings::default());
        assert_eq!(migrate_settings(serde_json::Value::Null), Settings::default());
    }

    #[test]
    fn select_client_reports_changes() {
        let mut settings = Settings::default();
        assert!(settings.select_client("ACME_CORP"));
        assert!(!settings.select_client(" ACME_CORP "));
        assert!(settings.select_client(""));
        assert_eq!(settings.selected_client, None);
    }
}
