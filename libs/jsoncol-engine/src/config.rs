use jsoncol_api::codec::codec_by_name;
use jsoncol_api::factory::JsonConverterFactory;
use serde::Deserialize;

use crate::error::EngineError;

/// Root configuration — parsed from TOML.
///
/// ```toml
/// [json]
/// codec = "pretty"
///
/// [conventions]
/// underscore = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionConfig {
    #[serde(default)]
    pub json: JsonConfig,

    #[serde(default)]
    pub conventions: ConventionsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonConfig {
    /// Codec name: `compact` or `pretty`.
    #[serde(default = "default_codec")]
    pub codec: String,
}

fn default_codec() -> String {
    "compact".to_string()
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConventionsConfig {
    /// Rewrite table and column names to snake_case after the json scan.
    #[serde(default)]
    pub underscore: bool,
}

impl ConversionConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let load = || -> Result<Self, EngineError> {
            let content = std::fs::read_to_string(path)?;
            Self::parse(&content)
        };
        load().map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Converter factory with the configured codec injected.
    pub fn factory(&self) -> Result<JsonConverterFactory, EngineError> {
        let codec = codec_by_name(&self.json.codec).ok_or_else(|| {
            EngineError::Config(format!(
                "unknown json codec '{}' (expected 'compact' or 'pretty')",
                self.json.codec
            ))
        })?;
        Ok(JsonConverterFactory::new(codec))
    }
}
