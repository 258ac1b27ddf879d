use crate::error::EngineError;
use crate::model::ModelBuilder;

/// Rewrite table and column names to snake_case.
///
/// Only properties whose storage representation is already resolved (native
/// column or registered converter) are renamed; the rest keep their name and
/// are reported with a warning. Run `add_json_conversions` first.
///
/// Returns the number of properties left unrenamed.
pub fn apply_underscore_naming(builder: &mut ModelBuilder) -> Result<usize, EngineError> {
    let entities: Vec<(String, String, Vec<String>)> = builder
        .entity_types()
        .map(|e| {
            (
                e.name.clone(),
                e.table.clone(),
                e.properties.iter().map(|p| p.name.clone()).collect(),
            )
        })
        .collect();

    let mut skipped = 0;
    for (entity, table, properties) in entities {
        builder.set_table_name(&entity, underscore(&table))?;
        for property in properties {
            let mut prop = builder.property(&entity, &property)?;
            if prop.store_type().is_none() {
                tracing::warn!(
                    entity = %entity,
                    property = %property,
                    "storage representation unresolved, column not renamed"
                );
                skipped += 1;
                continue;
            }
            prop.has_column_name(underscore(&property));
        }
    }
    Ok(skipped)
}

/// `OrderLine` → `order_line`, `HTTPStatus` → `http_status`, `already_snake` unchanged.
pub fn underscore(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::underscore;

    #[test]
    fn underscore_names() {
        assert_eq!(underscore("Order"), "order");
        assert_eq!(underscore("OrderLine"), "order_line");
        assert_eq!(underscore("HTTPStatus"), "http_status");
        assert_eq!(underscore("Line2Item"), "line2_item");
        assert_eq!(underscore("already_snake"), "already_snake");
        assert_eq!(underscore("Snake_Case"), "snake_case");
    }
}
