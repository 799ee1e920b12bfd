//! Walk configuration.
//!
//! Every field has a default, so an empty TOML file is a valid config:
//!
//! ```toml
//! counter_policy = "reset_on_walk"   # or "reset_on_load", "cumulative"
//! max_depth = 64
//! default_color = [0.5, 0.5, 0.5]
//! color_scopes = ["surface", "curve", "generic"]
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stepview_kernel::{ColorType, Rgb};

use crate::error::ConfigError;

/// When the uid serial counters start over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterPolicy {
    /// Every walk starts from serial 0.
    #[default]
    ResetOnWalk,
    /// Re-walking the same document continues the serials; loading or
    /// creating a document starts over.
    ResetOnLoad,
    /// Serials are never reset for the lifetime of the model.
    Cumulative,
}

/// Settings for walking a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// When uid serials start over.
    pub counter_policy: CounterPolicy,
    /// Deepest assembly nesting visited; `None` means unlimited.
    pub max_depth: Option<usize>,
    /// Color for shapes with no color in the document.
    pub default_color: Rgb,
    /// Order in which color scopes are probed; must list every scope once.
    pub color_scopes: Vec<ColorType>,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            counter_policy: CounterPolicy::default(),
            max_depth: None,
            default_color: Rgb::MID_GRAY,
            color_scopes: vec![ColorType::Surface, ColorType::Curve, ColorType::Generic],
        }
    }
}

impl WalkConfig {
    /// Parse and validate a TOML config.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: WalkConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.color_scopes.is_empty() {
            return Err(ConfigError::Invalid("color_scopes is empty".into()));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.color_scopes.iter().find(|scope| !seen.insert(**scope)) {
            return Err(ConfigError::Invalid(format!(
                "color scope '{dup}' listed twice"
            )));
        }
        // reordering is allowed, dropping a scope is not
        if let Some(missing) = ColorType::ALL.iter().find(|scope| !seen.contains(*scope)) {
            return Err(ConfigError::Invalid(format!(
                "color scope '{missing}' missing from color_scopes"
            )));
        }
        let Rgb { r, g, b } = self.default_color;
        if [r, g, b].iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::Invalid(format!(
                "default_color {} is outside 0..1",
                self.default_color
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_toml_is_default() {
        let config = WalkConfig::from_toml_str("").unwrap();
        assert_eq!(config, WalkConfig::default());
        assert_eq!(config.counter_policy, CounterPolicy::ResetOnWalk);
        assert_eq!(
            config.color_scopes,
            vec![ColorType::Surface, ColorType::Curve, ColorType::Generic]
        );
    }

    #[test]
    fn test_full_toml() {
        let config = WalkConfig::from_toml_str(
            r#"
            counter_policy = "cumulative"
            max_depth = 8
            default_color = [0.2, 0.3, 0.4]
            color_scopes = ["generic", "surface", "curve"]
            "#,
        )
        .unwrap();
        assert_eq!(config.counter_policy, CounterPolicy::Cumulative);
        assert_eq!(config.max_depth, Some(8));
        assert_eq!(config.default_color, Rgb::new(0.2, 0.3, 0.4));
        assert_eq!(
            config.color_scopes,
            vec![ColorType::Generic, ColorType::Surface, ColorType::Curve]
        );
    }

    #[test]
    fn test_scope_subset_is_invalid() {
        let err = WalkConfig::from_toml_str(r#"color_scopes = ["generic"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("surface")));

        let config = WalkConfig {
            color_scopes: vec![ColorType::Curve, ColorType::Surface],
            ..WalkConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(msg)) if msg.contains("generic")));
    }

    #[test]
    fn test_duplicate_scope_is_invalid() {
        let err = WalkConfig::from_toml_str(r#"color_scopes = ["curve", "curve"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("curve")));
    }

    #[test]
    fn test_empty_scopes_is_invalid() {
        let err = WalkConfig::from_toml_str("color_scopes = []").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_out_of_range_color_is_invalid() {
        let err = WalkConfig::from_toml_str("default_color = [0.5, 2.0, 0.5]").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_policy_is_toml_error() {
        let err = WalkConfig::from_toml_str(r#"counter_policy = "sometimes""#).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "counter_policy = \"reset_on_load\"").unwrap();
        let config = WalkConfig::load(file.path()).unwrap();
        assert_eq!(config.counter_policy, CounterPolicy::ResetOnLoad);
    }
}
