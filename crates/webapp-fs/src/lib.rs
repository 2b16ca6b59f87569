//! Filesystem layer for the webapp runtime configuration engine
//!
//! Provides web-root path resolution and settings-source loading:
//!
//! - **Web root**: startup-argument scan and pure logical directory paths
//! - **Settings values**: explicit tagged union with strict accessors
//! - **Sources**: INI and JSON decoding with extension-based format dispatch
//!   and name-based discovery

pub mod error;
pub mod ini;
pub mod loader;
pub mod value;
pub mod webroot;

pub use error::{Error, Result};
pub use ini::{IniEncoding, load_ini, parse_ini};
pub use loader::{Decoder, FormatRegistry, SourceLoader, load_json};
pub use value::{RawSettingsMap, SettingsValue};
pub use webroot::{AppDir, DEFAULT_ENVIRONMENT, StartupArgs, WebRoot};
