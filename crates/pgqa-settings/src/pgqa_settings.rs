//! PGQA Settings
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables. The resolved `Settings` is read once at startup.

mod error;
mod settings;
mod settings_file;

pub use error::SettingsError;
pub use settings::*;
pub use settings_file::*;
