//! Engine configuration.
//!
//! Configuration is an explicit value handed to every invocation; nothing in
//! the engine reads global state. It can be loaded from TOML:
//!
//! ```toml
//! command_refactoring = true
//! configurable_codes = ["MyLintCode"]
//!
//! [logging]
//! level = "debug"
//! ```

use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Compiler problem codes whose severity a user can lower. Errors with one of
/// these codes do not suppress error-gated assists.
pub const CONFIGURABLE_CODES: &[&str] = &[
    "UnusedImport",
    "LocalVariableIsNeverUsed",
    "ArgumentIsNeverUsed",
    "UnusedPrivateField",
    "UnusedPrivateMethod",
    "UnusedPrivateType",
    "UnusedLabel",
    "DeadCode",
    "UnnecessaryCast",
    "UnnecessaryInstanceof",
    "RawTypeReference",
    "UnsafeTypeConversion",
    "MissingOverrideAnnotation",
    "MissingSerialVersion",
    "NullPointerAccess",
    "PotentialNullPointerAccess",
    "RedundantNullCheck",
    "ParameterAssignment",
    "UnusedWarningToken",
    "DeprecatedType",
    "DeprecatedMethod",
    "DeprecatedField",
    "DiscouragedReference",
    "ForbiddenReference",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct AssistConfig {
    /// Offer large refactorings (extract method, extract variable, ...) as
    /// client-executed commands instead of materialized edits.
    #[serde(default)]
    pub command_refactoring: bool,

    /// Additional diagnostic codes treated as configurable-severity.
    #[serde(default)]
    pub configurable_codes: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            command_refactoring: false,
            configurable_codes: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AssistConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// `true` if an error with `code` may be downgraded by the user.
    pub fn is_configurable(&self, code: &str) -> bool {
        CONFIGURABLE_CODES.contains(&code) || self.configurable_codes.iter().any(|c| c == code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[schemars(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for the `vega.*` targets, or a full `EnvFilter` directive string.
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,

    /// Emit logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_owned()
    }

    pub(crate) fn normalize_level_directives(input: &str) -> String {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Self::default_level();
        }

        match trimmed.to_ascii_lowercase().as_str() {
            "trace" => "trace".to_owned(),
            "debug" => "debug".to_owned(),
            "info" => "info".to_owned(),
            "warn" | "warning" => "warn".to_owned(),
            "error" => "error".to_owned(),
            _ => trimmed.to_owned(),
        }
    }

    fn config_env_filter(&self) -> tracing_subscriber::EnvFilter {
        let directives = Self::normalize_level_directives(&self.level);
        tracing_subscriber::EnvFilter::try_new(directives).unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::default()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
        })
    }

    /// Effective filter for hosts that install a subscriber. `RUST_LOG`, when
    /// set, is merged after the configured level.
    pub fn env_filter(&self) -> tracing_subscriber::EnvFilter {
        let env_directives = std::env::var("RUST_LOG")
            .ok()
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());

        let config_directives = Self::normalize_level_directives(&self.level);

        match env_directives {
            Some(env_directives) => {
                let combined = format!("{config_directives},{env_directives}");
                tracing_subscriber::EnvFilter::try_new(combined)
                    .or_else(|_| tracing_subscriber::EnvFilter::try_new(env_directives))
                    .unwrap_or_else(|_| self.config_env_filter())
            }
            None => self.config_env_filter(),
        }
    }

    /// Formatting layer writing to `writer`: JSON lines when `json` is set,
    /// plain text otherwise. Hosts stack it with [`Self::env_filter`].
    pub fn fmt_layer<S, W>(&self, writer: W) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'a> LookupSpan<'a> + 'static,
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        if self.json {
            layer.json().boxed()
        } else {
            layer.boxed()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
            json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Toml(err.message().to_owned())
    }
}

/// JSON schema for [`AssistConfig`], for editor integrations.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(AssistConfig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AssistConfig::from_toml_str("").unwrap();
        assert_eq!(config, AssistConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parses_all_fields() {
        let config = AssistConfig::from_toml_str(
            r#"
                command_refactoring = true
                configurable_codes = ["MyLint"]

                [logging]
                level = "Warning"
                json = true
            "#,
        )
        .unwrap();
        assert!(config.command_refactoring);
        assert!(config.is_configurable("MyLint"));
        assert!(config.is_configurable("UnusedImport"));
        assert!(!config.is_configurable("UndefinedName"));
        assert!(config.logging.json);
        assert_eq!(LoggingConfig::normalize_level_directives(&config.logging.level), "warn");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = AssistConfig::from_toml_str("command_refactorings = true").unwrap_err();
        let ConfigError::Toml(message) = err;
        assert!(message.contains("command_refactorings"), "{message}");
    }

    #[test]
    fn directive_strings_pass_through() {
        assert_eq!(
            LoggingConfig::normalize_level_directives(" vega.assists=trace "),
            "vega.assists=trace"
        );
        assert_eq!(LoggingConfig::normalize_level_directives(""), "info");
    }

    #[test]
    fn schema_lists_top_level_properties() {
        let schema = serde_json::to_value(json_schema()).unwrap();
        let properties = schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("command_refactoring"));
        assert!(properties.contains_key("configurable_codes"));
        assert!(properties.contains_key("logging"));
    }
}
