//! fabex-core: Core types, configuration, and logging for fabex.

pub mod build_info;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;

pub use config::Config;
pub use error::{Error, Result};
pub use filter::{FilterKind, FilterPattern, PathFilter};
