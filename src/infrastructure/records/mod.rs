pub mod json;
pub mod xml;

pub use json::{parse_product_json, parse_products_json};
pub use xml::parse_products_xml;

use crate::domain::Product;

/// Assigns one scalar field onto the product, coercing loosely typed values
/// (vendors send numbers as strings and vice versa) to their semantic type.
/// Unrecognized keys land in `extra`, which the chunker turns into `generic`
/// chunks, so new vendor fields stay searchable without a schema change.
fn assign_scalar(product: &mut Product, key: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    match normalize_key(key).as_str() {
        "id" | "productid" => {
            if let Some(id) = coerce_int(value) {
                product.id = id;
            }
        }
        "name" | "productname" | "title" => product.name = value.to_string(),
        "sku" => product.sku = value.to_string(),
        "description" => product.description = value.to_string(),
        "brand" | "manufacturer" => product.brand = value.to_string(),
        "category" => product.category = value.to_string(),
        "price" => product.price = coerce_float(value),
        "imageurl" | "image" | "imagelink" => product.image_url = value.to_string(),
        "rating" => product.rating = coerce_float(value),
        "stock" | "quantity" => product.stock = coerce_int(value),
        _ => product.extra.push((key.to_string(), value.to_string())),
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn coerce_int(value: &str) -> Option<i64> {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| value.parse::<f64>().ok().map(|f| f as i64))
}

fn coerce_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok()
}

fn is_specifications_key(key: &str) -> bool {
    matches!(normalize_key(key).as_str(), "specifications" | "specs")
}

fn is_features_key(key: &str) -> bool {
    normalize_key(key) == "features"
}
