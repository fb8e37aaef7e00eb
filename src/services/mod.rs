//! Services module - the archive audit pipeline.
//!
//! The services have no dependency on how results are presented; they report
//! through [`ProgressSink`] and the [`StateManager`](crate::state::StateManager).
//!
//! # Components
//!
//! - [`header`]: reads the format version from an archive's first bytes
//! - [`correlator`]: pairs auditable plugins with the archives their names prefix
//! - [`detector`]: compares each candidate's version with the active game's profile
//! - [`report`]: groups issues by owning mod and formats the detail report
//! - [`load_order`]: `plugins.txt` parsing and game detection
//! - [`audit`]: runs a whole batch and drives the notification slots
//!
//! # Usage Example
//!
//! ```ignore
//! use bsaguard::services::{AuditInputs, AuditService};
//!
//! let service = AuditService::new(profiles, state_manager, metrics);
//! let inputs = AuditInputs::new("skyrimse")
//!     .with_game_path("C:/Games/Skyrim Special Edition")
//!     .with_plugins(plugins);
//!
//! if let AuditOutcome::IssuesFound(report) = service.check(&inputs).await {
//!     println!("{report}");
//! }
//! ```

pub mod audit;
pub mod correlator;
pub mod detector;
pub mod header;
pub mod load_order;
pub mod report;

pub use audit::{AuditError, AuditInputs, AuditOutcome, AuditService, list_archives};
pub use correlator::{auditable_plugins, correlate, is_archive_file};
pub use detector::{MismatchDetector, ProgressEvent, ProgressSink};
pub use header::{HeaderError, read_version, try_read_version, version_from_prefix};
pub use load_order::{detect_game_from_load_order, load_plugins_txt, parse_plugins_txt};
pub use report::{AuditReport, GroupKey, ReportEntry, ReportSection, group, intended_games};
