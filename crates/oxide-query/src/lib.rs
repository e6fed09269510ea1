//! # oxide-query
//!
//! Typed descriptions of server queries and the errors data fetching can
//! produce.
//!
//! A [`QueryKey`] ties a cache key and an endpoint to the response and
//! parameter types, so call sites cannot mix them up:
//!
//! ```rust
//! use oxide_query::{QueryKey, QueryRegistry};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Search {
//!     q: String,
//! }
//!
//! pub const SEARCH: QueryKey<Vec<String>, Search> =
//!     QueryKey::new("search", "/api/search").requires_params();
//!
//! let path = SEARCH
//!     .resolve_path(Some(&Search { q: "forms".into() }))
//!     .unwrap();
//! assert_eq!(path, "/api/search?q=forms");
//!
//! let mut registry = QueryRegistry::new();
//! registry.register("search", &SEARCH).unwrap();
//! ```
//!
//! [`QueryError`] distinguishes server responses from connectivity
//! failures, which is what error displays key their behaviour on.

mod error;
mod key;
mod registry;

pub use error::{QueryError, Result, NETWORK_ERROR_CODE};
pub use key::QueryKey;
pub use registry::{QueryDescriptor, QueryRegistry};
