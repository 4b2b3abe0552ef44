//! Public SDK for the edge request pipeline.
//!
//! This crate re-exports all platform functionality:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! let plan = CityApp::new("my-city")
//!     .route(RouteData::from_path("/", vec![ModuleLoader::ready("index", index())])?)
//!     .build();
//!
//! // Live request
//! let response = serve(&plan, RequestContext::new(Method::GET, "http://localhost/")).await?;
//!
//! // Offline rendering
//! let sys = Arc::new(FsSystem::new(StaticGenerateOptions::new("dist")));
//! let result = generate(sys, plan).await?;
//! ```

pub use edge_cache;
pub use edge_core;
pub use edge_handler;
pub use edge_observability;
pub use edge_router;
pub use edge_static;
pub use edge_streaming;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_handler::prelude::*;
    pub use edge_observability::{init_logging, LogFormat, LogLevel};
    pub use edge_static::{
        generate, generate_with_progress, load_options, FsSystem, GenerateEvent, StaticGenerateOptions,
        StaticGenerateResult, StaticWorkerRenderResult, System,
    };
}
