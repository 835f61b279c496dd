//! Settings module for enderpearl
//!
//! XDG-compliant layered settings loading.

pub mod loader;
pub mod model;

pub use loader::{find_settings_files, load_settings, settings_paths};
pub use model::*;
