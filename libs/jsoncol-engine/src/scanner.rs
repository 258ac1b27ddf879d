use jsoncol_api::factory::JsonConverterFactory;
use jsoncol_api::schema::{ConverterHook, Marker};

use crate::error::EngineError;
use crate::model::ModelBuilder;

/// Outcome of one json scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// `(entity, property)` pairs that received a converter, in model order.
    pub converted: Vec<(String, String)>,
}

/// Install a JSON converter on every property marked `#[json]`.
///
/// Must run before any naming convention or other pass that needs each
/// property's final storage representation. Running it again over the same
/// builder re-registers the cached converters, so each marked property still
/// holds exactly one.
pub fn add_json_conversions(
    builder: &mut ModelBuilder,
    factory: &JsonConverterFactory,
) -> Result<ScanReport, EngineError> {
    // Collect first: registration needs the builder mutably.
    let mut targets: Vec<(String, String, Option<ConverterHook>)> = Vec::new();
    for entity in builder.entity_types() {
        for prop in entity.marked(Marker::Json) {
            targets.push((entity.name.clone(), prop.name.clone(), prop.json));
        }
    }

    let mut report = ScanReport::default();
    for (entity, property, hook) in targets {
        let ctx = format!("{entity}.{property}");
        let hook = hook.ok_or_else(|| {
            EngineError::Config(format!(
                "{ctx}: marked for json conversion but has no converter hook"
            ))
        })?;
        let converter = hook(factory).map_err(|e| EngineError::from(e).with_context(&ctx))?;

        builder
            .property(&entity, &property)?
            .has_conversion(converter)?;

        tracing::debug!(entity = %entity, property = %property, "registered json converter");
        report.converted.push((entity, property));
    }

    tracing::info!(
        converted = report.converted.len(),
        codec = factory.codec().name(),
        "json conversions added"
    );
    Ok(report)
}
