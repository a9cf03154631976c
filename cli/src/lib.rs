//! Command-line front end for the Inkwell letter engine.
//!
//! ```text
//! inkwell ingest-text "Dear Sir, I am writing to inquire..." --source manual
//! inkwell ingest-dir Data_Engineering/Bronze_Raw
//! inkwell generate "Thank Margaret for the scarf"
//! inkwell stats
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::{Cli, Command};
pub use config::{InkwellConfig, ProviderKind};
