//! Handler-chain resolution and request driver.
//!
//! This crate turns a matched route into a running pipeline:
//! - `CityApp` - Builder producing the `CityPlan` an app is served from
//! - `resolve_request_handlers` - Assemble the handler chain for a route
//! - `request_handler` - Drive one request through its chain
//! - `Renderer` - Pluggable HTML rendering for pages
//! - `adapter` - Buffered and streaming live-serving adapters
//!
//! # Example
//!
//! ```rust,ignore
//! use edge_handler::prelude::*;
//!
//! let plan = CityApp::new("pizza-city")
//!     .route(RouteData::from_path("/", vec![layout, index])?)
//!     .build();
//!
//! let response = adapter::serve(&plan, RequestContext::new(Method::GET, "http://localhost/")).await?;
//! assert_eq!(response.head.status, 200);
//! ```

pub mod adapter;
mod error_page;
mod page_data;
mod plan;
pub mod prelude;
mod render;
mod request_handler;
mod resolve;

pub use error_page::*;
pub use page_data::*;
pub use plan::*;
pub use render::*;
pub use request_handler::*;
pub use resolve::*;
