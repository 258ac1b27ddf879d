use crate::error::ConvertError;
use crate::schema::StoreType;

/// Column-level value, as seen by the storage side of the mapping layer.
///
/// The store never sees entity types — only these. Properties with a JSON
/// converter always land in `Text`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ColumnValue {
    Null,
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Text(String),
}

impl ColumnValue {
    pub fn store_type(&self) -> Option<StoreType> {
        match self {
            ColumnValue::Null => None,
            ColumnValue::Int64(_) => Some(StoreType::Int64),
            ColumnValue::Float64(_) => Some(StoreType::Float64),
            ColumnValue::Bool(_) => Some(StoreType::Bool),
            ColumnValue::Text(_) => Some(StoreType::Text),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ColumnValue::Text(s) => Some(s),
            _ => None,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            ColumnValue::Null => "null",
            ColumnValue::Int64(_) => "int64",
            ColumnValue::Float64(_) => "float64",
            ColumnValue::Bool(_) => "bool",
            ColumnValue::Text(_) => "text",
        }
    }
}

/// Positional array of column values. Order matches `EntityMap.properties`.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Row(pub Vec<ColumnValue>);

/// A Rust type with a native column representation.
///
/// Entity fields without the `#[json]` marker must implement this.
pub trait Column: Sized {
    const STORE_TYPE: StoreType;

    fn to_column(&self) -> ColumnValue;
    fn from_column(value: &ColumnValue) -> Result<Self, ConvertError>;
}

fn mismatch(expected: StoreType, got: &ColumnValue) -> ConvertError {
    ConvertError::schema(format!(
        "expected {expected:?} column, found {}",
        got.kind_name()
    ))
}

impl Column for i64 {
    const STORE_TYPE: StoreType = StoreType::Int64;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Int64(*self)
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConvertError> {
        match value {
            ColumnValue::Int64(v) => Ok(*v),
            other => Err(mismatch(Self::STORE_TYPE, other)),
        }
    }
}

impl Column for i32 {
    const STORE_TYPE: StoreType = StoreType::Int64;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Int64(i64::from(*self))
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConvertError> {
        match value {
            ColumnValue::Int64(v) => i32::try_from(*v)
                .map_err(|_| ConvertError::schema(format!("value {v} out of range for i32"))),
            other => Err(mismatch(Self::STORE_TYPE, other)),
        }
    }
}

impl Column for f64 {
    const STORE_TYPE: StoreType = StoreType::Float64;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Float64(*self)
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConvertError> {
        match value {
            ColumnValue::Float64(v) => Ok(*v),
            other => Err(mismatch(Self::STORE_TYPE, other)),
        }
    }
}

impl Column for bool {
    const STORE_TYPE: StoreType = StoreType::Bool;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Bool(*self)
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConvertError> {
        match value {
            ColumnValue::Bool(v) => Ok(*v),
            other => Err(mismatch(Self::STORE_TYPE, other)),
        }
    }
}

impl Column for String {
    const STORE_TYPE: StoreType = StoreType::Text;

    fn to_column(&self) -> ColumnValue {
        ColumnValue::Text(self.clone())
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConvertError> {
        match value {
            ColumnValue::Text(v) => Ok(v.clone()),
            other => Err(mismatch(Self::STORE_TYPE, other)),
        }
    }
}

/// `None` ↔ `ColumnValue::Null`.
impl<T: Column> Column for Option<T> {
    const STORE_TYPE: StoreType = T::STORE_TYPE;

    fn to_column(&self) -> ColumnValue {
        match self {
            Some(v) => v.to_column(),
            None => ColumnValue::Null,
        }
    }

    fn from_column(value: &ColumnValue) -> Result<Self, ConvertError> {
        match value {
            ColumnValue::Null => Ok(None),
            other => T::from_column(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn option_maps_none_to_null() {
        let none: Option<i64> = None;
        assert_eq!(none.to_column(), ColumnValue::Null);
        assert_eq!(Option::<i64>::from_column(&ColumnValue::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_column(&ColumnValue::Int64(7)).unwrap(),
            Some(7)
        );
    }

    #[test]
    fn wrong_column_kind_is_schema_error() {
        let err = i64::from_column(&ColumnValue::Text("1".into())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
        assert!(err.message.contains("Int64"), "{}", err.message);
    }

    #[test]
    fn i32_rejects_out_of_range() {
        let err = i32::from_column(&ColumnValue::Int64(i64::MAX)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Schema);
        assert_eq!(i32::from_column(&ColumnValue::Int64(-5)).unwrap(), -5);
    }

    #[test]
    fn null_has_no_store_type() {
        assert_eq!(ColumnValue::Null.store_type(), None);
        assert_eq!(
            ColumnValue::Text(String::new()).store_type(),
            Some(StoreType::Text)
        );
    }
}
