// bsaguard - Archive version audit for Bethesda game installations
//
// This is the library crate containing the audit pipeline and data structures.
// The binary crate (main.rs) provides the command line entry point.

pub mod config;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ConfigManager;
pub use metrics::AuditMetrics;
pub use models::{AuditState, GameProfile, GameProfiles, MainConfig, UserConfig};
pub use services::{AuditInputs, AuditOutcome, AuditService};
pub use state::{StateChange, StateManager};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
