//! Generator configuration loaded from YAML.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Error type for configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Error reading config file
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A setting is out of range
    #[error("Invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Payload type packed into generated `google.protobuf.Any` messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnyPayload {
    #[default]
    Struct,
    Duration,
    Timestamp,
    FieldMask,
    Empty,
}

/// Upper bound for every length and count setting.
pub const MAX_COLLECTION_LEN: usize = 1 << 16;

/// Upper bound for `max_depth`, `struct_depth` and `value_depth`.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Knobs for message generation.
///
/// Every field has a default, so an empty YAML document is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Strings are drawn with length in `[0, max_string_len)`
    pub max_string_len: usize,

    /// Lower bound for repeated fields, maps and field mask paths
    pub min_elements: usize,

    /// Upper bound (inclusive) for repeated fields, maps and field mask paths
    pub max_elements: usize,

    /// Probability that an optional or message-typed field is populated
    pub present_chance: f64,

    /// Nesting depth at which ordinary messages stop recursing
    pub max_depth: usize,

    /// Upper bound (inclusive) on `Struct` field count
    pub struct_max_fields: usize,

    /// Nesting allowed below a top-level `Struct`; 0 keeps values flat
    pub struct_depth: usize,

    /// Struct nesting allowed below a `Value`; 0 excludes the struct branch
    pub value_depth: usize,

    /// Retry bound for drawing a non-empty field path segment
    pub max_segment_attempts: usize,

    /// Payload type for `Any`
    pub any_payload: AnyPayload,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_string_len: 20,
            min_elements: 0,
            max_elements: 10,
            present_chance: 0.8,
            max_depth: 8,
            struct_max_fields: 20,
            struct_depth: 0,
            value_depth: 1,
            max_segment_attempts: 64,
            any_payload: AnyPayload::default(),
        }
    }
}

impl GeneratorConfig {
    /// Load config from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: GeneratorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the generators cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.present_chance) {
            return Err(ConfigError::Invalid {
                field: "present_chance",
                reason: format!("{} is not within [0, 1]", self.present_chance),
            });
        }
        if self.min_elements > self.max_elements {
            return Err(ConfigError::Invalid {
                field: "min_elements",
                reason: format!(
                    "{} is greater than max_elements ({})",
                    self.min_elements, self.max_elements
                ),
            });
        }
        if self.max_string_len < 2 {
            return Err(ConfigError::Invalid {
                field: "max_string_len",
                reason: "must be at least 2 so field path segments can be non-empty".to_string(),
            });
        }
        for (field, value) in [
            ("max_string_len", self.max_string_len),
            ("max_elements", self.max_elements),
            ("struct_max_fields", self.struct_max_fields),
        ] {
            if value > MAX_COLLECTION_LEN {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} exceeds the limit of {MAX_COLLECTION_LEN}"),
                });
            }
        }
        for (field, value) in [
            ("max_depth", self.max_depth),
            ("struct_depth", self.struct_depth),
            ("value_depth", self.value_depth),
        ] {
            if value > MAX_NESTING_DEPTH {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{value} exceeds the limit of {MAX_NESTING_DEPTH}"),
                });
            }
        }
        if self.max_segment_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "max_segment_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = GeneratorConfig::from_yaml("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.struct_max_fields, 20);
        assert_eq!(config.any_payload, AnyPayload::Struct);
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
max_elements: 3
struct_depth: 2
any_payload: field_mask
"#;
        let config = GeneratorConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.max_elements, 3);
        assert_eq!(config.struct_depth, 2);
        assert_eq!(config.any_payload, AnyPayload::FieldMask);
        assert_eq!(config.max_string_len, 20);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let err = GeneratorConfig::from_yaml("present_chance: 1.5").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "present_chance",
                ..
            }
        ));

        let err = GeneratorConfig::from_yaml("min_elements: 5\nmax_elements: 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "min_elements", .. }));

        assert!(GeneratorConfig::from_yaml("max_segment_attempts: 0").is_err());
        assert!(GeneratorConfig::from_yaml("max_string_len: 1").is_err());
    }

    #[test]
    fn test_oversized_settings_rejected() {
        let err = GeneratorConfig::from_yaml("max_elements: 18446744073709551615").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_elements", .. }));

        let err = GeneratorConfig::from_yaml("struct_max_fields: 100000").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "struct_max_fields",
                ..
            }
        ));

        let err = GeneratorConfig::from_yaml("max_depth: 1000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "max_depth", .. }));

        assert!(GeneratorConfig::from_yaml("max_elements: 65536").is_ok());
    }

    #[test]
    fn test_unknown_payload_is_yaml_error() {
        let err = GeneratorConfig::from_yaml("any_payload: wrapper").unwrap_err();
        assert!(matches!(err, ConfigError::YamlError(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gen.yaml");
        fs::write(&path, "max_depth: 2\n").unwrap();
        let config = GeneratorConfig::from_file(&path).unwrap();
        assert_eq!(config.max_depth, 2);
    }
}
