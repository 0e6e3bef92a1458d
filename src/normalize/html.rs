//! HTML payload normalization
//!
//! Fields are located by declared CSS selectors rather than full-document
//! structural parsing. A selector that fails to match an optional field
//! leaves the field absent; unexpected multiplicities are errors naming the
//! field and selector. Sections matching the shape's section selector but
//! covered by no field selector are captured as raw fragments in `extra`.

use crate::{
    Error, Result,
    normalize::{FieldOutcome, apply_kind_str, shape::{FieldSource, Shape}},
    types::NormalizedResult,
};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

/// Normalize an HTML body against the declared shape
pub fn normalize_html(body: &str, shape: &Shape) -> Result<NormalizedResult> {
    let document = Html::parse_document(body);
    let mut result = NormalizedResult::new();
    let mut matched_nodes = Vec::new();

    for field in &shape.fields {
        let FieldSource::HtmlSelector { selector, attr } = &field.source else {
            continue;
        };

        let parsed = Selector::parse(selector)
            .map_err(|e| Error::parse(&field.name, selector, format!("invalid selector: {e}")))?;
        let matches: Vec<ElementRef> = document.select(&parsed).collect();

        let element = match matches.len() {
            0 if field.required => {
                return Err(Error::parse(
                    &field.name,
                    selector,
                    "expected one match, found 0",
                ));
            }
            0 => continue,
            1 => matches[0],
            n => {
                return Err(Error::parse(
                    &field.name,
                    selector,
                    format!("expected one match, found {}", n),
                ));
            }
        };
        matched_nodes.push(element.id());

        let raw = match attr {
            Some(attr) => match element.value().attr(attr) {
                Some(value) => value.to_string(),
                None if field.required => {
                    return Err(Error::parse(
                        &field.name,
                        selector,
                        format!("matched element has no `{}` attribute", attr),
                    ));
                }
                None => continue,
            },
            None => element.text().collect::<String>().trim().to_string(),
        };

        match apply_kind_str(field, &raw)? {
            FieldOutcome::Value(value) => {
                result.fields.insert(field.name.clone(), value);
            }
            FieldOutcome::Demote(raw) => {
                result.extra.insert(field.name.clone(), Value::String(raw));
            }
        }
    }

    if let Some(section_selector) = &shape.html_sections {
        collect_uncovered_sections(
            &document,
            section_selector,
            &matched_nodes,
            &mut result,
        )?;
    }

    Ok(result)
}

/// Preserve sections no field selector touched, so newly appeared siblings
/// survive normalization instead of being discarded
fn collect_uncovered_sections(
    document: &Html,
    section_selector: &str,
    matched_nodes: &[ego_tree::NodeId],
    result: &mut NormalizedResult,
) -> Result<()> {
    let parsed = Selector::parse(section_selector).map_err(|e| {
        Error::parse(
            "sections",
            section_selector,
            format!("invalid selector: {e}"),
        )
    })?;

    for (index, section) in document.select(&parsed).enumerate() {
        let covered = section
            .descendants()
            .any(|node| matched_nodes.contains(&node.id()));
        if covered {
            continue;
        }

        let key = section_key(&section, index);
        tracing::debug!(key = %key, "preserving uncovered HTML section");
        result
            .extra
            .insert(key, Value::String(section.html()));
    }

    Ok(())
}

/// Stable-ish key for an uncovered section: id, then classes, then position
fn section_key(section: &ElementRef<'_>, index: usize) -> String {
    let element = section.value();
    if let Some(id) = element.attr("id") {
        return format!("section#{}", id);
    }
    let classes: Vec<&str> = element.classes().collect();
    if !classes.is_empty() {
        return format!("section.{}", classes.join("."));
    }
    format!("section:{}:{}", element.name(), index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::shape::{FieldKind, FieldSpec};
    use crate::normalize::dates::DateFormat;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const DEAL_PAGE: &str = r#"<html><body>
      <main>
        <section id="summary">
          <h1 class="deal-name">example.com</h1>
          <span class="deal-price">1999</span>
        </section>
        <section id="history">
          <time class="listed-at">1699920000</time>
        </section>
        <section id="promo-banner"><p>New! Premium listings</p></section>
      </main>
    </body></html>"#;

    fn field(name: &str, selector: &str) -> FieldSpec {
        FieldSpec::new(
            name,
            FieldSource::HtmlSelector {
                selector: selector.to_string(),
                attr: None,
            },
        )
    }

    fn deal_shape() -> Shape {
        Shape::new("deal-page")
            .with_field(field("name", "h1.deal-name").required())
            .with_field(field("price", "span.deal-price").with_kind(FieldKind::Integer))
            .with_field(field("listed_at", "time.listed-at").with_kind(FieldKind::Date(vec![
                DateFormat::EpochSeconds,
                DateFormat::Rfc3339,
            ])))
            .with_html_sections("main > section")
    }

    #[test]
    fn test_fields_extracted_by_selector() {
        let result = normalize_html(DEAL_PAGE, &deal_shape()).unwrap();

        assert_eq!(result.get("name"), Some(&json!("example.com")));
        assert_eq!(result.get("price"), Some(&json!(1999)));
        assert_eq!(
            result.get("listed_at"),
            Some(&json!("2023-11-14T00:00:00+00:00"))
        );
    }

    #[test]
    fn test_uncovered_section_preserved_as_fragment() {
        let result = normalize_html(DEAL_PAGE, &deal_shape()).unwrap();

        let fragment = result.get_extra("section#promo-banner").unwrap();
        assert!(fragment.as_str().unwrap().contains("Premium listings"));
        // Covered sections are not duplicated into extra
        assert!(result.get_extra("section#summary").is_none());
        assert!(result.get_extra("section#history").is_none());
    }

    #[test]
    fn test_required_field_zero_matches_is_parse_error() {
        let shape = Shape::new("deal-page").with_field(field("name", "h1.missing").required());
        let err = normalize_html(DEAL_PAGE, &shape).unwrap_err();
        match err {
            Error::Parse { field, selector, reason } => {
                assert_eq!(field, "name");
                assert_eq!(selector, "h1.missing");
                assert!(reason.contains("found 0"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_optional_field_zero_matches_is_absent() {
        let shape = Shape::new("deal-page").with_field(field("discount", "span.discount"));
        let result = normalize_html(DEAL_PAGE, &shape).unwrap();
        assert!(result.get("discount").is_none());
        assert!(result.extra.is_empty());
    }

    #[test]
    fn test_unexpected_multiplicity_is_parse_error() {
        // "section" matches three elements
        let shape = Shape::new("deal-page").with_field(field("summary", "section"));
        let err = normalize_html(DEAL_PAGE, &shape).unwrap_err();
        match err {
            Error::Parse { reason, .. } => assert!(reason.contains("found 3")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_attribute_extraction() {
        let html = r#"<html><body><a class="deal-link" href="/deal/42">view</a></body></html>"#;
        let shape = Shape::new("link").with_field(
            FieldSpec::new(
                "url",
                FieldSource::HtmlSelector {
                    selector: "a.deal-link".to_string(),
                    attr: Some("href".to_string()),
                },
            )
            .required(),
        );

        let result = normalize_html(html, &shape).unwrap();
        assert_eq!(result.get("url"), Some(&json!("/deal/42")));
    }

    #[test]
    fn test_unparseable_date_lands_in_extra() {
        let html = r#"<html><body><time class="listed-at">soon</time></body></html>"#;
        let shape = Shape::new("page").with_field(
            field("listed_at", "time.listed-at")
                .with_kind(FieldKind::Date(vec![DateFormat::EpochSeconds])),
        );

        let result = normalize_html(html, &shape).unwrap();
        assert!(result.get("listed_at").is_none());
        assert_eq!(result.get_extra("listed_at"), Some(&json!("soon")));
    }
}
