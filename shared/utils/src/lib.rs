pub mod bom;
pub mod config;
pub mod error;
pub mod logging;
pub mod validation;

pub use self::config::{AppConfig, BomConfig, LoggingConfig};
pub use bom::*;
pub use error::*;
pub use logging::*;
pub use validation::*;
