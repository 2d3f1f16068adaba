//! Fragment Composer - stitch HTML fragments from backend services into a
//! template.
//!
//! A template marks the places where fragments go with include elements.
//! The composer fetches every fragment, cuts out its content element, and
//! forwards the head assets each fragment asks for into the template head.
//! Session entries travel between backends as `x-rd-` headers.
//!
//! # Example
//!
//! ```
//! use composer_gateway::compose::insert_assets;
//! use composer_gateway::config;
//!
//! assert!(config::validate_url("http://localhost:8080/template").is_ok());
//! assert_eq!(
//!     insert_assets("<head></head>", &["<link href=\"a.css\" />".to_string()]).as_deref(),
//!     Some("<head><link href=\"a.css\" />\n</head>")
//! );
//! ```
//!
//! # Architecture
//!
//! - [`config`]: Configuration defaults, loading and validation
//! - [`error`]: Error types and Result alias
//! - [`http`]: HTTP client for fetching templates and fragments
//! - [`session`]: Session state shared between backends
//! - [`composable`]: Merging of values collected across fragments
//! - [`compose`]: Template composition
//! - [`cli`]: Command-line interface

pub mod cli;
pub mod composable;
pub mod compose;
pub mod config;
pub mod error;
pub mod http;
pub mod session;

// Re-export commonly used items
pub use compose::{ComposedPage, Composer, FragmentSource, HttpFragmentSource};
pub use config::ComposerConfig;
pub use error::{ComposerError, Result};
pub use session::{SessionFragment, SessionRoot};
