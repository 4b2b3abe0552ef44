//! Prelude for convenient imports.
//!
//! ```rust,ignore
//! use edge_router::prelude::*;
//! ```

pub use crate::{
    get_menu_loader, get_path_params, load_route, Component, ContentMenu, DocumentHead, HeadLink,
    HeadMeta, LoadedRoute, MenuData, MenuModule, ModuleCache, ModuleLoader, RouteData, RouteModule,
    RouterError,
};
