use serde_json::Value;

use super::{assign_scalar, is_features_key, is_specifications_key};
use crate::domain::{DomainError, Product};

/// Parses one loosely typed JSON product record.
///
/// Known fields are normalized onto [`Product`] with string/number coercion;
/// `specifications` objects and `features` arrays keep their structure;
/// every other leaf lands in `extra` keyed by its own field name. The record
/// is walked exactly once.
pub fn parse_product_json(value: &Value) -> Result<Product, DomainError> {
    let object = value
        .as_object()
        .ok_or_else(|| DomainError::validation("Product record must be a JSON object"))?;

    let mut product = Product::default();
    for (key, value) in object {
        if is_specifications_key(key) {
            parse_specifications(&mut product, value);
        } else if is_features_key(key) {
            parse_features(&mut product, value);
        } else {
            walk_leaf(&mut product, key, value);
        }
    }

    product.validate()?;
    if product.name.trim().is_empty() {
        return Err(DomainError::validation("Product name is required"));
    }
    Ok(product)
}

/// Parses a batch payload: a JSON array of records, a single record, or a
/// `{"products": [...]}` wrapper.
pub fn parse_products_json(raw: &str) -> Result<Vec<Product>, DomainError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| DomainError::validation(format!("Invalid JSON: {e}")))?;

    let records = match &value {
        Value::Array(items) => items.iter().collect::<Vec<_>>(),
        Value::Object(map) => match map.get("products").and_then(Value::as_array) {
            Some(items) => items.iter().collect(),
            None => vec![&value],
        },
        _ => return Err(DomainError::validation("Expected a product or product list")),
    };

    records.into_iter().map(parse_product_json).collect()
}

fn parse_specifications(product: &mut Product, value: &Value) {
    let Some(object) = value.as_object() else {
        return;
    };
    for (name, value) in object {
        if let Some(text) = scalar_text(value) {
            product.specifications.insert(name.clone(), text);
        }
    }
}

fn parse_features(product: &mut Product, value: &Value) {
    let Some(items) = value.as_array() else {
        return;
    };
    for item in items {
        if let Some(text) = scalar_text(item) {
            product.features.push(text);
        }
    }
}

fn walk_leaf(product: &mut Product, key: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                walk_leaf(product, key, value);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_leaf(product, key, item);
            }
        }
        _ => {
            if let Some(text) = scalar_text(value) {
                assign_scalar(product, key, &text);
            }
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_typical_record() {
        let record = json!({
            "id": 42,
            "name": "AquaPhone X",
            "sku": "AQX-001",
            "description": "Waterproof smartphone",
            "brand": "HydroTech",
            "category": "Smartphones",
            "price": 599.99,
            "imageUrl": "https://cdn.example.com/aqx.jpg",
            "rating": 4.5,
            "stock": 12,
            "specifications": { "Display": "6.1 inch OLED", "Battery": "4500 mAh" },
            "features": ["IP68", "Wireless charging"]
        });

        let product = parse_product_json(&record).unwrap();
        assert_eq!(product.id, 42);
        assert_eq!(product.name, "AquaPhone X");
        assert_eq!(product.price, Some(599.99));
        assert_eq!(product.stock, Some(12));
        assert_eq!(product.specifications.len(), 2);
        assert_eq!(product.features, vec!["IP68", "Wireless charging"]);
        assert!(product.extra.is_empty());
    }

    #[test]
    fn test_numeric_fields_coerce_from_strings() {
        let record = json!({
            "id": "7",
            "name": "Loose Types",
            "price": "19.90",
            "rating": "3.5",
            "stock": "4"
        });

        let product = parse_product_json(&record).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.price, Some(19.90));
        assert_eq!(product.rating, Some(3.5));
        assert_eq!(product.stock, Some(4));
    }

    #[test]
    fn test_unknown_leaves_become_extra() {
        let record = json!({
            "id": 7,
            "name": "Vendor Special",
            "color": "red",
            "warranty": { "years": 2 }
        });

        let product = parse_product_json(&record).unwrap();
        assert_eq!(
            product.extra,
            vec![
                ("color".to_string(), "red".to_string()),
                ("years".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn test_missing_or_bad_id_rejected() {
        let err = parse_product_json(&json!({ "name": "No Id" })).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = parse_product_json(&json!({ "id": "abc", "name": "Bad Id" })).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_batch_shapes() {
        let array = r#"[{"id": 1, "name": "A"}, {"id": 2, "name": "B"}]"#;
        assert_eq!(parse_products_json(array).unwrap().len(), 2);

        let wrapped = r#"{"products": [{"id": 1, "name": "A"}]}"#;
        assert_eq!(parse_products_json(wrapped).unwrap().len(), 1);

        let single = r#"{"id": 3, "name": "C"}"#;
        let products = parse_products_json(single).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id, 3);
    }
}
