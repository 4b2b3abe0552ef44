//! Static generation for the edge request pipeline.
//!
//! Every static pathname of a `CityPlan` is rendered through the same
//! pipeline that serves live requests, with a file-backed writer instead of
//! a network one:
//! - `generate` - Fan pathnames out over a pool of workers
//! - `worker_handler` - Message handler run inside each worker
//! - `System` / `FsSystem` - File layout and worker hosting
//! - `StaticGenerateOptions` / `load_options` - Configuration
//!
//! # Example
//!
//! ```rust,ignore
//! let options = load_options("edge.toml")?;
//! let sys = Arc::new(FsSystem::new(options));
//! let result = generate(sys, plan).await?;
//! println!("{} pages in {:?}", result.rendered, result.duration);
//! ```

mod config;
mod error;
mod fs;
mod pending;
mod pool;
mod system;
mod types;
mod worker;

pub use config::*;
pub use error::*;
pub use fs::*;
pub use pending::*;
pub use pool::*;
pub use system::*;
pub use types::*;
pub use worker::*;
