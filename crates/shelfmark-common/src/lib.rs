//! Shelfmark-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across shelfmark:
//!
//! - **Typed IDs**: Catalog identities and metrics-record identifiers
//! - **Core Types**: Enums for media kinds and file classifications
//! - **Path Utilities**: Functions to detect file types by extension
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use shelfmark_common::{CatalogId, MediaKind, Error, Result};
//! use shelfmark_common::paths::is_video_file;
//! use std::path::Path;
//!
//! // Remote catalog IDs are positive, placeholders negative
//! let id = CatalogId::from(603);
//! assert!(!id.is_placeholder());
//!
//! // Check file types
//! assert!(is_video_file(Path::new("movie.mkv")));
//!
//! // Use common error types
//! fn example() -> Result<()> {
//!     Err(Error::not_found("entry"))
//! }
//! ```

pub mod error;
pub mod ids;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use ids::*;
pub use types::*;
