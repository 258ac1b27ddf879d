use crate::config::ConversionConfig;
use crate::conventions;
use crate::error::EngineError;
use crate::model::{Model, ModelBuilder};
use crate::scanner;

/// Run the configured model passes in order and freeze the model.
///
/// 1. json scan — converters on every `#[json]` property.
/// 2. underscore naming (if enabled) — sees the converted properties.
/// 3. build.
pub fn build_model(
    mut builder: ModelBuilder,
    config: &ConversionConfig,
) -> Result<Model, EngineError> {
    let factory = config.factory()?;

    scanner::add_json_conversions(&mut builder, &factory)?;

    if config.conventions.underscore {
        conventions::apply_underscore_naming(&mut builder)?;
    }

    builder.build()
}
