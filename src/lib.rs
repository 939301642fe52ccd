//! Field-level sanitization and validation over loosely structured input
//! trees. Declare named field specs with chainable operations, merge the
//! named input sources by priority, and evaluate every chain (including
//! async custom steps) into one report: sanitized values plus
//! declaration-ordered errors.
//!
//! ```no_run
//! use form_field_validator::{field, Form, Sources};
//! use serde_json::json;
//!
//! # async fn demo() -> form_field_validator::Result<()> {
//! let form = Form::new()
//!     .field(field("username").trim().required().is_alphanumeric())
//!     .field(field("email").label("Email address").trim().is_email());
//!
//! let sources = Sources::from([("body".to_string(), json!({
//!     "username": "  ada  ",
//!     "email": "ada@example.com",
//! }))]);
//!
//! let report = form.validate(&sources).await?;
//! assert!(report.is_valid());
//! assert_eq!(report.values["username"], json!("ada"));
//! # Ok(())
//! # }
//! ```

pub mod catalog; // primitive registry, extensible with user operations
pub mod config;
pub mod errors;
pub mod merge;
pub mod path;
pub mod report;
mod executor;
mod field;
mod form;

pub use catalog::{Catalog, Check, Sanitize};
pub use config::Config;
pub use errors::{ConfigError, Result};
pub use field::{field, FieldSpec};
pub use form::{validate_tree, Form};
pub use merge::Sources;
pub use report::{Report, ValidationError};
