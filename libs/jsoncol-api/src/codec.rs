use std::borrow::Cow;
use std::sync::Arc;

use crate::error::ConvertError;

/// Layout serde_json uses when a converter serializes a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    #[default]
    Compact,
    Pretty,
}

/// JSON text codec: the stored form around serde_json's own text.
///
/// Converters serialize with `serde_json::to_string` / `to_string_pretty`
/// (picked by `layout`) and deserialize with `serde_json::from_str::<T>`;
/// the codec only sees text on both sides. Injected into
/// `JsonConverterFactory` so the text form is chosen by the caller, not by a
/// process-wide default.
pub trait JsonCodec: Send + Sync {
    fn layout(&self) -> Layout {
        Layout::Compact
    }

    /// Stored text for the JSON serde_json produced.
    fn encode(&self, json: String) -> Result<String, ConvertError> {
        Ok(json)
    }

    /// JSON text to hand to serde_json for a stored value.
    fn decode<'a>(&self, stored: &'a str) -> Result<Cow<'a, str>, ConvertError> {
        Ok(Cow::Borrowed(stored))
    }

    /// Name used in configuration (`[json] codec = "..."`).
    fn name(&self) -> &str;
}

/// Single-line JSON. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompactJson;

impl JsonCodec for CompactJson {
    fn name(&self) -> &str {
        "compact"
    }
}

/// Indented JSON, for stores that are read by humans.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrettyJson;

impl JsonCodec for PrettyJson {
    fn layout(&self) -> Layout {
        Layout::Pretty
    }

    fn name(&self) -> &str {
        "pretty"
    }
}

/// Resolve a codec by its configuration name.
pub fn codec_by_name(name: &str) -> Option<Arc<dyn JsonCodec>> {
    match name {
        "compact" => Some(Arc::new(CompactJson)),
        "pretty" => Some(Arc::new(PrettyJson)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_codecs_pass_text_through() {
        for codec in [codec_by_name("compact"), codec_by_name("pretty")] {
            let codec = codec.unwrap();
            assert_eq!(codec.encode("[1]".to_string()).unwrap(), "[1]");
            assert!(matches!(codec.decode("[1]").unwrap(), Cow::Borrowed("[1]")));
        }
    }

    #[test]
    fn layouts() {
        assert_eq!(CompactJson.layout(), Layout::Compact);
        assert_eq!(PrettyJson.layout(), Layout::Pretty);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(codec_by_name("pretty").unwrap().name(), "pretty");
        assert_eq!(codec_by_name("compact").unwrap().name(), "compact");
        assert!(codec_by_name("yaml").is_none());
    }
}
