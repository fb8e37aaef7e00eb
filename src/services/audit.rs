//! Audit pipeline driver.
//!
//! [`AuditService::check`] runs one batch: game lookup, data directory
//! listing, correlation, detection and the notification slot updates.
//! [`AuditService::run`] repeats it for every change of the published
//! [`AuditInputs`].
//!
//! Nothing here surfaces an error to the notification layer. Batches that
//! cannot run are logged and reported back as [`AuditOutcome::Skipped`].

use crate::metrics::AuditMetrics;
use crate::models::{GameProfiles, ModRecord, ModRegistry, PluginRecord, UNREADABLE_VERSION};
use crate::services::correlator::{correlate, is_archive_file};
use crate::services::detector::MismatchDetector;
use crate::services::report::AuditReport;
use crate::state::StateManager;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;

/// Name of the folder holding plugins and archives inside a game installation.
pub const DATA_FOLDER: &str = "Data";

/// Everything a batch reads. Published through a `watch` channel so the
/// latest state always wins.
#[derive(Debug, Clone, Default)]
pub struct AuditInputs {
    pub game_id: String,

    /// Root of the game installation, if one was discovered
    pub game_path: Option<Utf8PathBuf>,

    /// Plugin state keyed by lowercased plugin name
    pub plugins: IndexMap<String, PluginRecord>,

    /// Installed mods keyed by id
    pub mods: IndexMap<String, ModRecord>,
}

impl AuditInputs {
    pub fn new(game_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_game_path(mut self, game_path: impl Into<Utf8PathBuf>) -> Self {
        self.game_path = Some(game_path.into());
        self
    }

    pub fn with_plugins(mut self, plugins: impl IntoIterator<Item = PluginRecord>) -> Self {
        self.plugins = plugins
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p))
            .collect();
        self
    }

    pub fn with_mods(mut self, mods: impl IntoIterator<Item = ModRecord>) -> Self {
        self.mods = mods.into_iter().map(|m| (m.id.clone(), m)).collect();
        self
    }

    /// Take the installed mods from `registry` and give every plugin without
    /// an owner the mod that lists it.
    pub fn with_registry(mut self, registry: &ModRegistry) -> Self {
        for plugin in self.plugins.values_mut() {
            if plugin.mod_id.is_none() {
                plugin.mod_id = registry.mod_id_for_plugin(&plugin.name).map(str::to_string);
            }
        }
        self.mods = registry.records();
        self
    }

    /// `<game_path>/Data`, when an installation is known.
    pub fn data_dir(&self) -> Option<Utf8PathBuf> {
        self.game_path.as_ref().map(|path| path.join(DATA_FOLDER))
    }
}

/// Reasons a batch stops before any archive is read.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Game {0} has no archive profile")]
    UnsupportedGame(String),

    #[error("No installation found for {0}")]
    NoInstallation(String),

    #[error("Failed to list data directory {path}")]
    DataDirUnreadable {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of one batch.
#[derive(Debug)]
pub enum AuditOutcome {
    /// Stopped before detection; no notification was touched
    Skipped(AuditError),

    /// No archive belongs to an auditable plugin
    NothingToCheck,

    Clean { checked: usize },

    IssuesFound(AuditReport),
}

impl AuditOutcome {
    pub fn issue_count(&self) -> usize {
        match self {
            AuditOutcome::IssuesFound(report) => report.issue_count(),
            _ => 0,
        }
    }

    pub fn has_issues(&self) -> bool {
        self.issue_count() > 0
    }
}

/// Archive file names in `data_dir`, sorted case-insensitively.
///
/// Entries that are not `bsa`/`ba2` files or whose names are not valid
/// UTF-8 are left out, as are directories. Symbolic links count as the
/// entry they point to.
pub async fn list_archives(data_dir: &Utf8Path) -> Result<Vec<String>, AuditError> {
    let unreadable = |source: std::io::Error| AuditError::DataDirUnreadable {
        path: data_dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(data_dir).await.map_err(unreadable)?;
    let mut archives = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let Ok(name) = entry.file_name().into_string() else {
            tracing::debug!("Skipping non UTF-8 entry in {}", data_dir);
            continue;
        };
        if !is_archive_file(&name) {
            continue;
        }
        // `metadata` follows symlinks. A broken link stays in the listing and
        // is reported as unreadable when its header is read.
        match tokio::fs::metadata(entry.path()).await {
            Ok(metadata) if metadata.is_dir() => {
                tracing::debug!("Skipping directory {} in {}", name, data_dir)
            }
            Ok(_) => archives.push(name),
            Err(e) => {
                tracing::debug!("Cannot stat {} in {}: {}", name, data_dir, e);
                archives.push(name);
            }
        }
    }

    archives.sort_by_key(|name| name.to_lowercase());
    Ok(archives)
}

/// Runs audit batches against the profile table and reports into the
/// session's notification state.
#[derive(Clone)]
pub struct AuditService {
    profiles: GameProfiles,
    state: StateManager,
    metrics: Arc<AuditMetrics>,
}

impl AuditService {
    pub fn new(profiles: GameProfiles, state: StateManager, metrics: Arc<AuditMetrics>) -> Self {
        Self {
            profiles,
            state,
            metrics,
        }
    }

    pub fn profiles(&self) -> &GameProfiles {
        &self.profiles
    }

    pub fn state(&self) -> &StateManager {
        &self.state
    }

    pub fn metrics(&self) -> &AuditMetrics {
        &self.metrics
    }

    /// Run one batch for `inputs`.
    pub async fn check(&self, inputs: &AuditInputs) -> AuditOutcome {
        match self.try_check(inputs).await {
            Ok(outcome) => outcome,
            Err(err) => {
                match &err {
                    AuditError::UnsupportedGame(game_id) => {
                        tracing::debug!("Skipping archive check, {} is not supported", game_id)
                    }
                    AuditError::NoInstallation(_) => {
                        tracing::warn!("Skipping archive check: {}", err)
                    }
                    AuditError::DataDirUnreadable { source, .. } => {
                        tracing::warn!("Skipping archive check: {}: {}", err, source)
                    }
                }
                self.metrics.record_batch_skipped();
                AuditOutcome::Skipped(err)
            }
        }
    }

    async fn try_check(&self, inputs: &AuditInputs) -> Result<AuditOutcome, AuditError> {
        let profile = self
            .profiles
            .lookup(&inputs.game_id)
            .ok_or_else(|| AuditError::UnsupportedGame(inputs.game_id.clone()))?;

        let data_dir = inputs
            .data_dir()
            .ok_or_else(|| AuditError::NoInstallation(profile.display_name.clone()))?;

        let archives = list_archives(&data_dir).await?;
        let candidates = correlate(inputs.plugins.values(), &archives);

        if candidates.is_empty() {
            tracing::debug!(
                "No archives to check for {} ({} archives in {})",
                profile.display_name,
                archives.len(),
                data_dir
            );
            self.metrics.record_batch_skipped();
            return Ok(AuditOutcome::NothingToCheck);
        }

        tracing::info!(
            "Checking {} archives against {} version {}",
            candidates.len(),
            profile.archive_kind,
            profile.expected_version
        );

        self.state.begin_batch(&profile.game_id);
        let started = Instant::now();

        let detector = MismatchDetector::new(profile, &data_dir, &inputs.plugins, &inputs.mods);
        let issues = detector.detect(&candidates, &self.state).await;

        let unreadable = issues
            .iter()
            .filter(|i| i.detected_version == UNREADABLE_VERSION)
            .count();
        self.metrics
            .record_batch(candidates.len(), issues.len(), unreadable, started.elapsed());

        if issues.is_empty() {
            tracing::info!(
                "All {} archives match {}",
                candidates.len(),
                profile.display_name
            );
            self.state.finish_batch(None);
            return Ok(AuditOutcome::Clean {
                checked: candidates.len(),
            });
        }

        let report = AuditReport::build(&issues, profile, &self.profiles);
        self.state.finish_batch(Some(&report));
        Ok(AuditOutcome::IssuesFound(report))
    }

    /// Run a batch for the current inputs and again after every change,
    /// until the sender is dropped.
    ///
    /// Changes published while a batch runs are coalesced into one follow-up
    /// batch over the latest inputs.
    pub async fn run(&self, mut inputs: watch::Receiver<AuditInputs>) {
        loop {
            let snapshot = inputs.borrow_and_update().clone();
            self.check(&snapshot).await;

            if inputs.changed().await.is_err() {
                tracing::debug!("Audit inputs closed, stopping");
                break;
            }
        }
    }
}
