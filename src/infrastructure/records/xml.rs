use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{assign_scalar, is_features_key, is_specifications_key};
use crate::domain::{DomainError, Product};

/// Parses an XML catalog export: a `<products>` list of `<product>` elements
/// (a bare `<product>` root also works). Element semantics mirror the JSON
/// parser: known children normalize onto [`Product`], `<specifications>` and
/// `<features>` keep their structure, anything else becomes an `extra` leaf.
pub fn parse_products_xml(raw: &str) -> Result<Vec<Product>, DomainError> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(true);

    let mut products = Vec::new();
    loop {
        match read_event(&mut reader)? {
            Event::Start(e) if local_name(&e) == "product" => {
                products.push(parse_product(&mut reader)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if products.is_empty() {
        return Err(DomainError::validation("No <product> elements found"));
    }
    Ok(products)
}

fn parse_product(reader: &mut Reader<&[u8]>) -> Result<Product, DomainError> {
    let mut product = Product::default();

    loop {
        match read_event(reader)? {
            Event::Start(e) => {
                let name = local_name(&e);
                if is_specifications_key(&name) {
                    parse_specifications(reader, &mut product)?;
                } else if is_features_key(&name) {
                    parse_features(reader, &mut product)?;
                } else {
                    let text = read_text(reader, &e)?;
                    assign_scalar(&mut product, &name, &text);
                }
            }
            Event::End(e) if local_name_end(e.local_name().as_ref()) == "product" => break,
            Event::Eof => {
                return Err(DomainError::validation("Unclosed <product> element"));
            }
            _ => {}
        }
    }

    product.validate()?;
    if product.name.trim().is_empty() {
        return Err(DomainError::validation("Product name is required"));
    }
    Ok(product)
}

fn parse_specifications(
    reader: &mut Reader<&[u8]>,
    product: &mut Product,
) -> Result<(), DomainError> {
    loop {
        match read_event(reader)? {
            Event::Start(e) => {
                // Either <specification name="Display">...</specification>
                // or the spec name as the element itself: <Display>...</Display>.
                let attr_name = e
                    .try_get_attribute("name")
                    .map_err(invalid_xml)?
                    .map(|a| a.unescape_value().map(|v| v.into_owned()))
                    .transpose()
                    .map_err(invalid_xml)?;
                // The fallback keeps the tag's original case so spec names
                // stay readable in prompts, matching the attribute form.
                let name = attr_name.unwrap_or_else(|| tag_name(&e));
                let value = read_text(reader, &e)?;
                if !value.trim().is_empty() {
                    product.specifications.insert(name, value.trim().to_string());
                }
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(DomainError::validation("Unclosed <specifications> element"));
            }
            _ => {}
        }
    }
}

fn parse_features(reader: &mut Reader<&[u8]>, product: &mut Product) -> Result<(), DomainError> {
    loop {
        match read_event(reader)? {
            Event::Start(e) => {
                let value = read_text(reader, &e)?;
                if !value.trim().is_empty() {
                    product.features.push(value.trim().to_string());
                }
            }
            Event::End(_) => return Ok(()),
            Event::Eof => {
                return Err(DomainError::validation("Unclosed <features> element"));
            }
            _ => {}
        }
    }
}

fn read_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>, DomainError> {
    reader.read_event().map_err(invalid_xml)
}

fn read_text(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<String, DomainError> {
    reader
        .read_text(start.name())
        .map(|t| t.into_owned())
        .map_err(invalid_xml)
}

fn local_name(e: &BytesStart<'_>) -> String {
    tag_name(e).to_ascii_lowercase()
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn local_name_end(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_ascii_lowercase()
}

fn invalid_xml(e: impl std::fmt::Display) -> DomainError {
    DomainError::validation(format!("Invalid XML: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_export() {
        let xml = r#"
<products>
  <product>
    <id>42</id>
    <name>AquaPhone X</name>
    <description>Waterproof smartphone</description>
    <brand>HydroTech</brand>
    <price>599.99</price>
    <imageUrl>https://cdn.example.com/aqx.jpg</imageUrl>
    <specifications>
      <specification name="Display">6.1 inch OLED</specification>
      <specification name="Battery">4500 mAh</specification>
    </specifications>
    <features>
      <feature>IP68</feature>
      <feature>Wireless charging</feature>
    </features>
  </product>
  <product>
    <id>43</id>
    <name>HydroCam Pro</name>
  </product>
</products>
"#;

        let products = parse_products_xml(xml).unwrap();
        assert_eq!(products.len(), 2);

        let first = &products[0];
        assert_eq!(first.id, 42);
        assert_eq!(first.name, "AquaPhone X");
        assert_eq!(first.price, Some(599.99));
        assert_eq!(first.image_url, "https://cdn.example.com/aqx.jpg");
        assert_eq!(
            first.specifications.get("Display").map(String::as_str),
            Some("6.1 inch OLED")
        );
        assert_eq!(first.features.len(), 2);

        assert_eq!(products[1].id, 43);
    }

    #[test]
    fn test_spec_name_from_element_tag_keeps_case() {
        let xml = r#"
<product>
  <id>1</id>
  <name>Tagged Specs</name>
  <specifications>
    <Display>6.1 inch</Display>
    <RefreshRate>120 Hz</RefreshRate>
  </specifications>
</product>
"#;
        let products = parse_products_xml(xml).unwrap();
        assert_eq!(
            products[0].specifications.get("Display").map(String::as_str),
            Some("6.1 inch")
        );
        assert_eq!(
            products[0]
                .specifications
                .get("RefreshRate")
                .map(String::as_str),
            Some("120 Hz")
        );
    }

    #[test]
    fn test_unknown_elements_become_extra() {
        let xml = r#"
<product>
  <id>1</id>
  <name>Vendor Special</name>
  <color>red</color>
</product>
"#;
        let products = parse_products_xml(xml).unwrap();
        assert_eq!(
            products[0].extra,
            vec![("color".to_string(), "red".to_string())]
        );
    }

    #[test]
    fn test_malformed_xml_rejected() {
        assert!(parse_products_xml("<products><product><id>1</id>").is_err());
        assert!(parse_products_xml("not xml at all").is_err());
        assert!(parse_products_xml("<products></products>").is_err());
    }
}
