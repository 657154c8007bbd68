//! Engine configuration
//!
//! Loaded from TOML, then layered with `FLEETCAP_*` environment variables:
//!
//! ```toml
//! log_filter = "info"
//! active_statuses = ["ACTIVE", "TRIAL"]
//!
//! [defaults]
//! max_devices = 2
//! api_access = true
//! ```
//!
//! Entries under `[defaults]` replace individual codes of the standard
//! default table; codes not mentioned keep their standard value.

use fleet_core::{CapabilityValue, FleetError, FleetResult, SubscriptionStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::defaults::CapabilityDefaults;
use crate::subscription::ActiveSubscriptionPolicy;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FLEETCAP_";

/// Configuration for the resolution engine and its host process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// `tracing-subscriber` filter directive
    pub log_filter: String,
    /// Subscription statuses counted as active
    pub active_statuses: Vec<SubscriptionStatus>,
    /// Replacements for the standard default table
    pub defaults: BTreeMap<String, CapabilityValue>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            active_statuses: vec![SubscriptionStatus::Active, SubscriptionStatus::Trial],
            defaults: BTreeMap::new(),
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> FleetResult<Self> {
        toml::from_str(content).map_err(|e| FleetError::invalid(format!("Invalid TOML: {e}")))
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> FleetResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FleetError::internal(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    /// Merge `FLEETCAP_*` variables from the process environment
    pub fn merge_with_env(&mut self) -> FleetResult<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Merge `FLEETCAP_*` variables from an explicit source.
    ///
    /// - `FLEETCAP_LOG_FILTER` replaces the log filter
    /// - `FLEETCAP_ACTIVE_STATUSES` is a comma-separated status list
    /// - `FLEETCAP_DEFAULT_<CODE>` sets the default for `<code>` (lowercased);
    ///   `true`/`false` become booleans, integers become ints, anything else text
    pub fn merge_with_vars<I>(&mut self, vars: I) -> FleetResult<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(key) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match key {
                "LOG_FILTER" => self.log_filter = value,
                "ACTIVE_STATUSES" => {
                    self.active_statuses = value
                        .split(',')
                        .filter(|s| !s.trim().is_empty())
                        .map(|s| s.parse::<SubscriptionStatus>())
                        .collect::<FleetResult<Vec<_>>>()?;
                }
                other => {
                    if let Some(code) = other.strip_prefix("DEFAULT_") {
                        self.defaults
                            .insert(code.to_ascii_lowercase(), parse_env_value(&value));
                    }
                }
            }
        }
        Ok(())
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> FleetResult<()> {
        if self.active_statuses.is_empty() {
            return Err(FleetError::invalid(
                "active_statuses must name at least one status",
            ));
        }
        if let Some(code) = self.defaults.keys().find(|code| code.trim().is_empty()) {
            return Err(FleetError::invalid(format!(
                "default table contains an empty code: {code:?}"
            )));
        }
        Ok(())
    }

    /// The default table to inject into the resolver
    pub fn capability_defaults(&self) -> CapabilityDefaults {
        self.defaults
            .iter()
            .fold(CapabilityDefaults::standard(), |table, (code, value)| {
                table.with(code.clone(), value.clone())
            })
    }

    /// The active-subscription policy
    pub fn subscription_policy(&self) -> ActiveSubscriptionPolicy {
        ActiveSubscriptionPolicy::new(self.active_statuses.iter().copied())
    }
}

fn parse_env_value(raw: &str) -> CapabilityValue {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        CapabilityValue::Bool(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        CapabilityValue::Bool(false)
    } else if let Ok(v) = trimmed.parse::<i64>() {
        CapabilityValue::Int(v)
    } else {
        CapabilityValue::Text(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::codes;
    use std::io::Write;

    #[test]
    fn test_toml_defaults_layer_over_standard_table() {
        let config = EngineConfig::from_toml_str(
            r#"
            active_statuses = ["ACTIVE"]

            [defaults]
            max_devices = 2
            api_access = true
            fleet_color = "blue"
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        let defaults = config.capability_defaults();
        assert_eq!(defaults.get(codes::MAX_DEVICES), Some(&CapabilityValue::Int(2)));
        assert_eq!(defaults.get(codes::API_ACCESS), Some(&CapabilityValue::Bool(true)));
        assert_eq!(defaults.get(codes::MAX_UNITS), Some(&CapabilityValue::Int(1)));
        assert_eq!(
            defaults.get("fleet_color"),
            Some(&CapabilityValue::Text("blue".to_string()))
        );
        assert_eq!(config.log_filter, "info");
        assert!(!config.subscription_policy().is_eligible(SubscriptionStatus::Trial));
    }

    #[test]
    fn test_env_vars_override_file_values() {
        let mut config = EngineConfig::default();
        config
            .merge_with_vars(vec![
                ("FLEETCAP_LOG_FILTER".to_string(), "debug".to_string()),
                ("FLEETCAP_ACTIVE_STATUSES".to_string(), "active, trial".to_string()),
                ("FLEETCAP_DEFAULT_MAX_USERS".to_string(), "10".to_string()),
                ("FLEETCAP_DEFAULT_SMS_ALERTS".to_string(), "TRUE".to_string()),
                ("UNRELATED".to_string(), "x".to_string()),
            ])
            .unwrap();

        assert_eq!(config.log_filter, "debug");
        assert_eq!(
            config.active_statuses,
            vec![SubscriptionStatus::Active, SubscriptionStatus::Trial]
        );
        assert_eq!(config.defaults.get("max_users"), Some(&CapabilityValue::Int(10)));
        assert_eq!(config.defaults.get("sms_alerts"), Some(&CapabilityValue::Bool(true)));
    }

    #[test]
    fn test_bad_status_in_env_is_rejected() {
        let mut config = EngineConfig::default();
        let result = config.merge_with_vars(vec![(
            "FLEETCAP_ACTIVE_STATUSES".to_string(),
            "ACTIVE,PAUSED".to_string(),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_status_list_fails_validation() {
        let config = EngineConfig {
            active_statuses: Vec::new(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_filter = \"warn\"").unwrap();
        let config = EngineConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.log_filter, "warn");
        assert_eq!(config.active_statuses.len(), 2);
    }
}
