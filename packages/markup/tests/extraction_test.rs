//! End-to-end extraction tests over complete documents.
//!
//! Each test scans a document with a fresh extractor, the way the composer
//! does for every fetched template and fragment.

use composer_markup::{
    extract, scan, Asset, ContentExtractor, ContentRange, ExtractorConfig, MarkupError,
};
use pretty_assertions::assert_eq;

const FRAGMENT: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Cart</title>
    <link rel="stylesheet" href="/cart/main.css" data-rd-options="include">
    <script src="/cart/main.js" data-rd-options="async,include"></script>
    <script src="/cart/debug.js" data-rd-options="async"></script>
    <link rel="icon" href="/favicon.ico"/>
  </head>
  <body>
    <header><link rel="preload" href="/late.css" data-rd-options="include"/></header>
    <rewe-digital-content><div class="cart">
      <span>3 items</span>
    </div></rewe-digital-content>
  </body>
</html>
"#;

fn config() -> ExtractorConfig {
    ExtractorConfig::new("rewe-digital-content", "data-rd-options")
}

#[test]
fn test_fragment_content_and_assets() {
    let extraction = extract(FRAGMENT, ContentRange::whole(FRAGMENT), &config()).unwrap();

    assert_eq!(
        extraction.content(FRAGMENT),
        Some("<div class=\"cart\">\n      <span>3 items</span>\n    </div>")
    );
    assert_eq!(
        extraction.links,
        vec![
            r#"<link rel="stylesheet" href="/cart/main.css" data-rd-options="include" />"#,
            r#"<script src="/cart/main.js" data-rd-options="async,include" ></script>"#,
        ]
    );
}

#[test]
fn test_spec_scenario_include() {
    let html = r#"<head><link rel="x" data-opt="include"/></head><content>Hi</content>"#;
    let config = ExtractorConfig::new("content", "data-opt");
    let extraction = extract(html, ContentRange::whole(html), &config).unwrap();

    assert_eq!(extraction.links, vec![r#"<link rel="x" data-opt="include" />"#]);
    assert_eq!(extraction.content(html), Some("Hi"));
}

#[test]
fn test_spec_scenario_exclude() {
    let html = r#"<head><link rel="x" data-opt="exclude"/></head><content>Hi</content>"#;
    let config = ExtractorConfig::new("content", "data-opt");
    let extraction = extract(html, ContentRange::whole(html), &config).unwrap();

    assert!(extraction.links.is_empty());
    assert_eq!(extraction.content(html), Some("Hi"));
}

#[test]
fn test_template_without_content_element_keeps_default() {
    let template = "<html><head></head><body><main>page</main></body></html>";
    let default = ContentRange::whole(template);
    let extraction = extract(template, default, &config()).unwrap();
    assert_eq!(extraction.content_range, default);
}

#[test]
fn test_content_range_ignores_nesting_of_other_elements() {
    let html = "<a><b><content><x><y><z></z></y></x></content></b></a>";
    let config = ExtractorConfig::new("content", "data-opt");
    let extraction = extract(html, ContentRange::whole(html), &config).unwrap();
    assert_eq!(extraction.content(html), Some("<x><y><z></z></y></x>"));
}

/// Documented quirk: the start of the window moves with every content open
/// until the first close, so nested same-name elements pair the innermost
/// open with the first close. The second pair of siblings is ignored.
#[test]
fn test_repeated_content_elements_quirk() {
    let config = ExtractorConfig::new("content", "data-opt");

    let siblings = "<content>first</content><content>second</content>";
    let extraction = extract(siblings, ContentRange::whole(siblings), &config).unwrap();
    assert_eq!(extraction.content(siblings), Some("first"));

    let nested = "<content>outer<content>inner</content>tail</content>";
    let extraction = extract(nested, ContentRange::whole(nested), &config).unwrap();
    assert_eq!(extraction.content(nested), Some("inner"));
}

#[test]
fn test_render_round_trip() {
    let html = r#"<head>
        <link rel="stylesheet" href="a.css" data-opt="include" media="print"/>
        <script src="b.js" data-opt="include" defer></script>
    </head>"#;
    let config = ExtractorConfig::new("content", "data-opt");
    let first = extract(html, ContentRange::whole(html), &config).unwrap();
    assert_eq!(first.assets.len(), 2);

    for asset in &first.assets {
        let rendered = format!("<head>{}</head>", asset.render());
        let again = extract(&rendered, ContentRange::whole(&rendered), &config).unwrap();
        assert_eq!(again.assets.len(), 1);
        assert_equivalent(asset, &again.assets[0]);
    }
}

fn assert_equivalent(expected: &Asset, actual: &Asset) {
    assert_eq!(expected.tag(), actual.tag());
    assert_eq!(expected.is_self_closing(), actual.is_self_closing());

    let mut expected_attributes = expected.attributes().to_vec();
    let mut actual_attributes = actual.attributes().to_vec();
    expected_attributes.sort();
    actual_attributes.sort();
    assert_eq!(expected_attributes, actual_attributes);
}

#[test]
fn test_upstream_failure_propagates() {
    let config = config();
    let mut extractor = ContentExtractor::new(ContentRange::new(0, 0), &config);
    let err = scan("<head><link href=\"a.css", &mut extractor).unwrap_err();
    assert!(matches!(err, MarkupError::UnterminatedAttributeValue { .. }));
}
