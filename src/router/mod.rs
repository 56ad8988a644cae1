//! # Router Module
//!
//! Path matching for switchyard. The router knows nothing about hooks or
//! responses; it turns registered paths into an index and answers "which
//! route, which handler" for a lookup path and a request method.
//!
//! ## Path kinds
//!
//! Every registered path becomes exactly one [`RoutePath`] variant, chosen
//! once at registration time by inspecting the argument:
//!
//! - **Literal** (`/health`): stored with a trailing `/`, looked up by exact
//!   string comparison.
//! - **Pattern** (`/users/:id`): compiled into a [`Pattern`] that extracts
//!   named segments.
//! - **Regex** (`Regex::new("^/files/.*")`): tested with `is_match`.
//!
//! ## Precedence
//!
//! Within the pattern and regex collections, registration order is the only
//! precedence; there is no specificity scoring. Across collections the owner
//! applies a fixed order (literal, controllers, pattern, regex, wildcard).
//!
//! ## Example
//!
//! ```rust
//! use switchyard::router::{Pattern, RouteIndex};
//!
//! let pattern = Pattern::compile("/users/:id/posts/:title").unwrap();
//! let params = pattern.match_path("/users/123/posts/deno").unwrap();
//! assert_eq!(params.len(), 2);
//! assert!(pattern.match_path("/users/123/posts").is_none());
//!
//! let index = RouteIndex::new();
//! assert!(index.is_empty());
//! ```

mod index;
mod pattern;
mod route;

use smallvec::SmallVec;
use std::sync::Arc;

pub use index::{Insertion, MatchStage, RouteHit, RouteIndex};
pub use pattern::{Pattern, PARAM_MARKER};
pub use route::{
    normalize_literal, HandlerConfig, HandlerEntry, IntoRoutePath, Metadata, Route, RouteConfig,
    RouteMethod, RoutePath, WILDCARD_PATH,
};

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Extracted path parameters, in template order.
///
/// Names are shared with the compiled [`Pattern`]; values are per request.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;
