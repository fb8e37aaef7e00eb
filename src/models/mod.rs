//! Data models for bsaguard.
//!
//! - [`GameProfiles`]: per-game archive expectations (expected version, archive kind)
//! - [`PluginRecord`] / [`ModRecord`]: read-only inputs from the plugin and mod registries
//! - [`ArchiveCandidate`] / [`ArchiveIssue`]: transient values flowing through one audit batch
//! - [`AuditState`]: the visible notification slots, owned by
//!   [`StateManager`](crate::state::StateManager)
//! - [`MainConfig`] / [`UserConfig`] / [`ModRegistry`]: YAML configuration

pub mod audit_state;
pub mod config;
pub mod game_profile;
pub mod issue;
pub mod plugin;

pub use audit_state::{
    AuditState, CHECKING_NOTIFICATION_ID, ProgressNotification, RESULT_NOTIFICATION_ID,
    ResultNotification, SHOW_DETAILS_ACTION, Severity, progress_percent,
};
pub use config::{ArchiveData, MainConfig, ModEntry, ModRegistry, UserConfig};
pub use game_profile::{ArchiveKind, GameProfile, GameProfiles, ProfileError, UNREADABLE_VERSION};
pub use issue::{ArchiveCandidate, ArchiveIssue};
pub use plugin::{ModRecord, PluginRecord};
