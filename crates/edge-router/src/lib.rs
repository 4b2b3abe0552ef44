//! Route matching and module loading for the edge request pipeline.
//!
//! Routes are declared programmatically, one per page or endpoint:
//!
//! ```text
//! /                    -> [layout, index]
//! /actions/            -> [layout, actions]
//! /blog/[slug]/        -> [layout, blog-layout, post]
//! /docs/[...path]/     -> [layout, docs]
//! ```
//!
//! `load_route` picks the first matching route, extracts its parameters
//! and loads every module on the path from outermost layout to leaf.
//!
//! # Usage
//!
//! ```rust,ignore
//! use edge_router::prelude::*;
//!
//! let routes = vec![RouteData::from_path("/blog/[slug]/", vec![layout, post])?];
//! let cache = ModuleCache::new();
//! let loaded = load_route(&routes, &[], true, "/blog/hello/", &cache).await?;
//! ```

mod cache;
mod error;
mod head;
mod loader;
mod menu;
mod module;
pub mod prelude;
mod route;
mod routing;

pub use cache::*;
pub use error::*;
pub use head::*;
pub use loader::*;
pub use menu::*;
pub use module::*;
pub use route::*;
pub use routing::*;
