//! Composer Markup - streaming extraction for HTML fragment composition.
//!
//! Every document fetched by the composer is scanned once. The scan feeds a
//! [`MarkupHandler`](handler::MarkupHandler) with structural events, and the
//! handlers in this crate reduce those events to what composition needs:
//! where the fragment's content lives and which head assets must be hoisted
//! into the composed page.
//!
//! # Example
//!
//! ```
//! use composer_markup::{extract, ContentRange, ExtractorConfig};
//!
//! let config = ExtractorConfig::new("rewe-digital-content", "data-rd-options");
//! let html = concat!(
//!     r#"<html><head><script src="cart.js" data-rd-options="include"></script></head>"#,
//!     "<body><rewe-digital-content>Cart</rewe-digital-content></body></html>",
//! );
//!
//! let extraction = extract(html, ContentRange::whole(html), &config).unwrap();
//! assert_eq!(extraction.content(html), Some("Cart"));
//! assert_eq!(extraction.links.len(), 1);
//! ```
//!
//! # Architecture
//!
//! - [`handler`]: The event sink trait and event payloads
//! - [`scanner`]: Single-pass scanner that produces events
//! - [`extractor`]: Content range and head asset extraction
//! - [`asset`]: Pending and finalized asset declarations
//! - [`range`]: Content range value type
//! - [`include`]: Include element collection for the orchestrator
//! - [`error`]: Error types and Result alias

pub mod asset;
pub mod error;
pub mod extractor;
pub mod handler;
pub mod include;
pub mod range;
pub mod scanner;

pub use asset::{Asset, PendingAsset};
pub use error::{MarkupError, Result};
pub use extractor::{extract, ContentExtractor, Extraction, ExtractorConfig};
pub use include::{collect_includes, Include, IncludeCollector};
pub use range::ContentRange;
pub use scanner::scan;
