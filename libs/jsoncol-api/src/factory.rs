use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{CompactJson, JsonCodec};
use crate::converter::{JsonValueConverter, ValueConverter};

/// Typed converter factory.
///
/// Builds `JsonValueConverter<T>` for any serde type and caches the
/// type-erased converter per `TypeId`, so every property of the same declared
/// type shares one converter. The codec is injected; `Default` uses
/// `CompactJson`.
pub struct JsonConverterFactory {
    codec: Arc<dyn JsonCodec>,
    cache: RwLock<HashMap<TypeId, Arc<dyn ValueConverter>>>,
}

impl Default for JsonConverterFactory {
    fn default() -> Self {
        Self::new(Arc::new(CompactJson))
    }
}

impl std::fmt::Debug for JsonConverterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonConverterFactory")
            .field("codec", &self.codec.name())
            .field("cached", &self.cached_types())
            .finish()
    }
}

impl JsonConverterFactory {
    pub fn new(codec: Arc<dyn JsonCodec>) -> Self {
        Self {
            codec,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn codec(&self) -> &Arc<dyn JsonCodec> {
        &self.codec
    }

    /// Fresh typed converter pair for `T` (not cached).
    pub fn create<T>(&self) -> JsonValueConverter<T>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        JsonValueConverter::new(Arc::clone(&self.codec))
    }

    /// Shared type-erased converter for `T`, built on first request.
    pub fn converter<T>(&self) -> Arc<dyn ValueConverter>
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        let key = TypeId::of::<T>();
        {
            let guard = match self.cache.read() {
                Ok(g) => g,
                Err(poisoned) => {
                    tracing::warn!("converter cache read lock was poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            if let Some(conv) = guard.get(&key) {
                return Arc::clone(conv);
            }
        }

        let mut guard = match self.cache.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("converter cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let conv = guard.entry(key).or_insert_with(|| {
            tracing::debug!(
                model_type = std::any::type_name::<T>(),
                codec = self.codec.name(),
                "instantiated json converter"
            );
            let conv: Arc<dyn ValueConverter> = Arc::new(self.create::<T>());
            conv
        });
        Arc::clone(conv)
    }

    /// Number of distinct types with a cached converter.
    pub fn cached_types(&self) -> usize {
        match self.cache.read() {
            Ok(g) => g.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::*;
    use crate::codec::PrettyJson;
    use crate::error::ConvertError;

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[test]
    fn converter_is_cached_per_type() {
        let factory = JsonConverterFactory::default();
        let a = factory.converter::<Point>();
        let b = factory.converter::<Point>();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(factory.cached_types(), 1);

        let c = factory.converter::<Vec<Point>>();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(factory.cached_types(), 2);
    }

    #[test]
    fn injected_codec_is_used() {
        let factory = JsonConverterFactory::new(Arc::new(PrettyJson));
        let text = factory.create::<Point>().to_storage(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(text, "{\n  \"x\": 1,\n  \"y\": 2\n}");
    }

    /// Deterministic stand-in codec: wraps the compact form in markers.
    struct Tagged;

    impl JsonCodec for Tagged {
        fn encode(&self, json: String) -> Result<String, ConvertError> {
            Ok(format!("<{json}>"))
        }

        fn decode<'a>(&self, stored: &'a str) -> Result<Cow<'a, str>, ConvertError> {
            stored
                .strip_prefix('<')
                .and_then(|t| t.strip_suffix('>'))
                .map(Cow::Borrowed)
                .ok_or_else(|| ConvertError::deserialization("missing tag"))
        }

        fn name(&self) -> &str {
            "tagged"
        }
    }

    #[test]
    fn substitute_codec_round_trips() {
        let factory = JsonConverterFactory::new(Arc::new(Tagged));
        let conv = factory.create::<Point>();
        let text = conv.to_storage(&Point { x: 3, y: 4 }).unwrap();
        assert_eq!(text, r#"<{"x":3,"y":4}>"#);
        assert_eq!(conv.from_storage(&text).unwrap(), Point { x: 3, y: 4 });
        assert!(conv.from_storage(r#"{"x":3,"y":4}"#).unwrap_err().is_deserialization());
    }
}
