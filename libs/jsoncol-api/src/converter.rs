use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec::{JsonCodec, Layout};
use crate::error::ConvertError;
use crate::schema::StoreType;
use crate::value::ColumnValue;

/// Property-level value converter, type-erased for the mapping layer.
///
/// Solves one task: move a property value across the storage boundary.
/// Built once at model-build time, then shared by every row read and write.
/// Implementations hold no mutable state and may be called from any thread.
pub trait ValueConverter: Send + Sync {
    /// `TypeId` of the in-memory type this converter accepts and produces.
    fn model_type(&self) -> TypeId;
    /// Name of the in-memory type (for diagnostics).
    fn model_type_name(&self) -> &'static str;
    /// Column representation produced by `to_column`.
    fn store_type(&self) -> StoreType;

    /// `value` must be a `&T` where `TypeId::of::<T>() == self.model_type()`.
    fn to_column(&self, value: &dyn Any) -> Result<ColumnValue, ConvertError>;
    /// Returns a boxed `T`.
    fn from_column(&self, stored: &ColumnValue) -> Result<Box<dyn Any>, ConvertError>;
}

/// Bidirectional `T ↔ JSON text` converter pair.
///
/// - `to_storage()` serializes with `serde_json::to_string` (or
///   `to_string_pretty`, per the codec layout) and hands the text to the codec.
/// - `from_storage()` lets the codec unwrap the stored text, then parses it
///   with `serde_json::from_str::<T>`, so duplicate fields and shape
///   mismatches fail the same way the typed decoder does.
pub struct JsonValueConverter<T> {
    codec: Arc<dyn JsonCodec>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonValueConverter<T> {
    fn clone(&self) -> Self {
        Self {
            codec: Arc::clone(&self.codec),
            _marker: PhantomData,
        }
    }
}

impl<T> JsonValueConverter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    pub fn new(codec: Arc<dyn JsonCodec>) -> Self {
        Self {
            codec,
            _marker: PhantomData,
        }
    }

    pub fn to_storage(&self, value: &T) -> Result<String, ConvertError> {
        let json = match self.codec.layout() {
            Layout::Compact => serde_json::to_string(value),
            Layout::Pretty => serde_json::to_string_pretty(value),
        }
        .map_err(|e| {
            ConvertError::serialization(e.to_string())
                .with_context(std::any::type_name::<T>())
        })?;
        self.codec.encode(json)
    }

    pub fn from_storage(&self, text: &str) -> Result<T, ConvertError> {
        let json = self.codec.decode(text)?;
        parse::<T>(&json)
    }
}

fn parse<T: DeserializeOwned>(json: &str) -> Result<T, ConvertError> {
    serde_json::from_str(json)
        .map_err(|e| ConvertError::from(e).with_context(std::any::type_name::<T>()))
}

impl<T> ValueConverter for JsonValueConverter<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    fn model_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn model_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn store_type(&self) -> StoreType {
        StoreType::Text
    }

    fn to_column(&self, value: &dyn Any) -> Result<ColumnValue, ConvertError> {
        let value = value.downcast_ref::<T>().ok_or_else(|| {
            ConvertError::config(format!(
                "converter for {} received a value of another type",
                std::any::type_name::<T>()
            ))
        })?;
        self.to_storage(value).map(ColumnValue::Text)
    }

    fn from_column(&self, stored: &ColumnValue) -> Result<Box<dyn Any>, ConvertError> {
        let value = match stored {
            ColumnValue::Text(text) => self.from_storage(text)?,
            // NULL column reads as JSON `null`: fine for `Option<_>`, an error otherwise.
            ColumnValue::Null => parse::<T>("null")?,
            other => {
                return Err(ConvertError::deserialization(format!(
                    "expected text column for {}, found {other:?}",
                    std::any::type_name::<T>()
                )));
            }
        };
        Ok(Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use proptest::prelude::*;

    use super::*;
    use crate::codec::{CompactJson, PrettyJson};
    use crate::error::ErrorKind;

    #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Metadata {
        tags: Vec<String>,
        priority: i32,
    }

    fn converter<T: Serialize + DeserializeOwned + 'static>() -> JsonValueConverter<T> {
        JsonValueConverter::new(Arc::new(CompactJson))
    }

    fn pretty<T: Serialize + DeserializeOwned + 'static>() -> JsonValueConverter<T> {
        JsonValueConverter::new(Arc::new(PrettyJson))
    }

    #[test]
    fn order_metadata_scenario() {
        let conv = converter::<Metadata>();
        let meta = Metadata {
            tags: vec!["a".into(), "b".into()],
            priority: 3,
        };
        let text = conv.to_storage(&meta).unwrap();
        assert_eq!(text, r#"{"tags":["a","b"],"priority":3}"#);
        assert_eq!(conv.from_storage(&text).unwrap(), meta);
    }

    #[test]
    fn output_matches_field_structure() {
        let conv = converter::<Metadata>();
        let meta = Metadata {
            tags: vec!["x".into()],
            priority: -1,
        };
        let parsed: serde_json::Value =
            serde_json::from_str(&conv.to_storage(&meta).unwrap()).unwrap();
        assert_eq!(parsed["tags"], serde_json::json!(["x"]));
        assert_eq!(parsed["priority"], serde_json::json!(-1));
        assert_eq!(parsed.as_object().unwrap().len(), 2);
    }

    #[test]
    fn round_trips_common_shapes() {
        let list = vec![1u64, 2, u64::MAX];
        let c = converter::<Vec<u64>>();
        assert_eq!(c.from_storage(&c.to_storage(&list).unwrap()).unwrap(), list);

        let mut map = BTreeMap::new();
        map.insert("k".to_string(), vec![Some(1.5), None]);
        let c = converter::<BTreeMap<String, Vec<Option<f64>>>>();
        assert_eq!(c.from_storage(&c.to_storage(&map).unwrap()).unwrap(), map);

        let c = converter::<Option<Metadata>>();
        assert_eq!(c.to_storage(&None).unwrap(), "null");
        assert_eq!(c.from_storage("null").unwrap(), None);

        let c = converter::<String>();
        assert_eq!(c.to_storage(&"quote\"d".to_string()).unwrap(), r#""quote\"d""#);
    }

    #[test]
    fn not_json_fails_with_deserialization_error() {
        let err = converter::<Metadata>().from_storage("not json").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Deserialization);
    }

    #[test]
    fn structural_mismatch_fails_with_deserialization_error() {
        let err = converter::<Metadata>()
            .from_storage(r#"{"tags":"a","priority":3}"#)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Deserialization);
        assert!(err.message.contains("Metadata"), "{}", err.message);
    }

    #[test]
    fn non_string_map_keys_fail_to_serialize() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair".to_string());
        let err = converter::<HashMap<(i32, i32), String>>()
            .to_storage(&map)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Serialization);
    }

    #[test]
    fn erased_path_checks_type_and_column_kind() {
        let conv: Arc<dyn ValueConverter> = Arc::new(converter::<Metadata>());
        assert_eq!(conv.model_type(), TypeId::of::<Metadata>());
        assert_eq!(conv.store_type(), StoreType::Text);

        let err = conv.to_column(&42i64).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);

        let err = conv.from_column(&ColumnValue::Int64(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Deserialization);

        let meta = Metadata {
            tags: vec![],
            priority: 0,
        };
        let stored = conv.to_column(&meta).unwrap();
        let back = conv.from_column(&stored).unwrap();
        assert_eq!(back.downcast_ref::<Metadata>(), Some(&meta));
    }

    #[test]
    fn null_column_reads_only_into_option() {
        let conv = converter::<Option<Metadata>>();
        let back = ValueConverter::from_column(&conv, &ColumnValue::Null).unwrap();
        assert_eq!(back.downcast_ref::<Option<Metadata>>(), Some(&None));

        let conv = converter::<Metadata>();
        let err = ValueConverter::from_column(&conv, &ColumnValue::Null).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Deserialization);
    }

    #[test]
    fn duplicate_fields_are_rejected() {
        let err = converter::<Metadata>()
            .from_storage(r#"{"tags":[],"priority":1,"priority":2}"#)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Deserialization);
        assert!(err.message.contains("duplicate field"), "{}", err.message);
    }

    #[test]
    fn wide_integers_round_trip() {
        let c = converter::<u128>();
        let text = c.to_storage(&u128::MAX).unwrap();
        assert_eq!(text, "340282366920938463463374607431768211455");
        assert_eq!(c.from_storage(&text).unwrap(), u128::MAX);

        let c = converter::<(i128, i64, u64)>();
        let extremes = (i128::MIN, i64::MIN, u64::MAX);
        assert_eq!(c.from_storage(&c.to_storage(&extremes).unwrap()).unwrap(), extremes);
    }

    fn arb_metadata() -> impl Strategy<Value = Metadata> {
        (prop::collection::vec(any::<String>(), 0..6), any::<i32>())
            .prop_map(|(tags, priority)| Metadata { tags, priority })
    }

    fn arb_index() -> impl Strategy<Value = BTreeMap<String, Vec<Option<i64>>>> {
        prop::collection::btree_map(
            any::<String>(),
            prop::collection::vec(any::<Option<i64>>(), 0..4),
            0..4,
        )
    }

    proptest! {
        #[test]
        fn metadata_round_trips(meta in arb_metadata()) {
            for conv in [converter::<Metadata>(), pretty::<Metadata>()] {
                let text = conv.to_storage(&meta).unwrap();
                prop_assert_eq!(conv.from_storage(&text).unwrap(), meta.clone());
            }
        }

        #[test]
        fn nested_collections_round_trip(
            index in arb_index(),
            maybe in proptest::option::of(arb_metadata()),
        ) {
            let conv = converter::<BTreeMap<String, Vec<Option<i64>>>>();
            prop_assert_eq!(conv.from_storage(&conv.to_storage(&index).unwrap()).unwrap(), index);

            let conv = converter::<Option<Metadata>>();
            prop_assert_eq!(conv.from_storage(&conv.to_storage(&maybe).unwrap()).unwrap(), maybe);
        }

        #[test]
        fn integers_round_trip(value in any::<(u128, i128, u64, i64)>()) {
            for conv in [converter::<(u128, i128, u64, i64)>(), pretty()] {
                let text = conv.to_storage(&value).unwrap();
                prop_assert_eq!(conv.from_storage(&text).unwrap(), value);
            }
        }
    }
}
