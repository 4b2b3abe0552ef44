//! Route modules.

mod actions;
mod api;
mod index;
mod layout;
mod pizza;

pub use actions::*;
pub use api::*;
pub use index::*;
pub use layout::*;
pub use pizza::*;
