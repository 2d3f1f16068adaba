//! End-to-end composition tests against a mock backend.
//!
//! The template and fragments are fixtures of a small shop page. The blocking
//! HTTP client runs on a blocking thread so it does not stall the runtime
//! serving the mocks.

use std::fs;
use std::path::Path;

use composer_gateway::{ComposedPage, Composer, ComposerConfig, ComposerError, SessionRoot};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Load fixture file content.
fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("shop")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load {}: {}", path.display(), e))
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/html; charset=utf-8")
        .set_body_string(body)
}

async fn compose(
    config: ComposerConfig,
    url: String,
    session: SessionRoot,
) -> composer_gateway::Result<ComposedPage> {
    tokio::task::spawn_blocking(move || {
        let composer = Composer::over_http(config)?;
        composer.compose(&url, session)
    })
    .await
    .expect("compose task panicked")
}

async fn mount_shop(server: &MockServer) {
    let template = load_fixture("template.html").replace("{base}", &server.uri());

    Mock::given(method("GET"))
        .and(path("/template"))
        .respond_with(html(template).insert_header("x-rd-template-version", "7"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/header"))
        .respond_with(html(load_fixture("header.html")))
        .mount(server)
        .await;

    // The cart only answers requests carrying the user's session entry.
    Mock::given(method("GET"))
        .and(path("/cart"))
        .and(header("x-rd-user", "alice"))
        .respond_with(html(load_fixture("cart.html")).insert_header("x-rd-cart-count", "2"))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_compose_shop_page() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    // Server errors are retried before falling back.
    Mock::given(method("GET"))
        .and(path("/recommendations"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let page = compose(
        ComposerConfig::default(),
        format!("{}/template", server.uri()),
        SessionRoot::of([("user", "alice")]),
    )
    .await
    .expect("composition should succeed");

    assert!(page.html.contains("<nav>Home | Cart</nav>"));
    assert!(!page.html.contains("<header>Shop</header>"));
    assert!(page.html.contains(r#"<div class="cart">2 items</div>"#));
    assert!(page.html.contains("<p>No recommendations</p>"));
    assert!(!page.html.contains("rewe-digital-include"));
    assert!(!page.html.contains("cart-debug.js"));

    assert_eq!(
        page.assets,
        vec![
            r#"<script src="/shared.js" data-rd-options="include" ></script>"#,
            r#"<link rel="stylesheet" href="/cart.css" data-rd-options="include" />"#,
        ]
    );
    assert!(page.html.contains(
        "<link rel=\"stylesheet\" href=\"/shop.css\">\n<script src=\"/shared.js\" data-rd-options=\"include\" ></script>\n<link rel=\"stylesheet\" href=\"/cart.css\" data-rd-options=\"include\" />\n</head>"
    ));

    assert_eq!(page.session.get("user"), Some("alice"));
    assert_eq!(page.session.get("template-version"), Some("7"));
    assert_eq!(page.session.get("cart-count"), Some("2"));
    assert!(page.session.is_dirty());

    assert_eq!(page.warnings.len(), 1);
    assert!(page.warnings[0].contains("/recommendations"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_session_entry_uses_fallback() {
    let server = MockServer::start().await;
    mount_shop(&server).await;

    let page = compose(
        ComposerConfig::default(),
        format!("{}/template", server.uri()),
        SessionRoot::empty(),
    )
    .await
    .expect("composition should succeed");

    // Without the user entry the cart mock does not match and answers 404.
    assert!(page.html.contains("Your cart is unavailable"));
    assert_eq!(page.assets.len(), 1);
    assert_eq!(page.session.get("cart-count"), None);
    assert_eq!(page.warnings.len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_template_not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/template"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = compose(
        ComposerConfig::default(),
        format!("{}/template", server.uri()),
        SessionRoot::empty(),
    )
    .await;

    let err = result.expect_err("missing template should fail");
    assert!(matches!(err, ComposerError::TemplateDownload { .. }));
    assert!(err.to_string().contains("/template"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversized_fragment_uses_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/template"))
        .respond_with(html(format!(
            r#"<div><rewe-digital-include path="{}/big">small</rewe-digital-include></div>"#,
            server.uri()
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(html("x".repeat(4096)))
        .mount(&server)
        .await;

    let config = ComposerConfig {
        max_response_size: 1024,
        ..ComposerConfig::default()
    };
    let page = compose(config, format!("{}/template", server.uri()), SessionRoot::empty())
        .await
        .expect("composition should succeed");

    assert_eq!(page.html, "<div>small</div>");
    assert!(page.warnings[0].contains("exceeding the limit"));
}
