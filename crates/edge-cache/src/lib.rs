//! Cache-Control directives for the edge request pipeline.
//!
//! This crate provides:
//! - `CacheControl` - Structured directive set merged into one header value
//! - `CacheScope` - Coarse presets (public, private, no-store)
//!
//! # Example
//!
//! ```
//! use edge_cache::CacheControl;
//!
//! let value = CacheControl::public()
//!     .with_max_age(300)
//!     .with_swr(60)
//!     .header_value();
//!
//! assert_eq!(value, "public, max-age=300, stale-while-revalidate=60");
//! ```

mod control;
mod policy;

pub use control::*;
pub use policy::*;
