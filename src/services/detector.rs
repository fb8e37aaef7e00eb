//! Archive version mismatch detection.
//!
//! [`MismatchDetector`] reads the header version of every correlated archive
//! and keeps the ones that differ from the active game's expected version.
//! Progress goes to a [`ProgressSink`] before each archive is read, and the
//! sink is told once when the batch is over.

use crate::models::{ArchiveCandidate, ArchiveIssue, GameProfile, ModRecord, PluginRecord};
use crate::services::header::read_version;
use camino::Utf8Path;
use indexmap::IndexMap;

/// Emitted before each archive of a batch is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Archives fully processed so far
    pub completed: usize,
    pub total: usize,
    pub current_archive: String,
}

/// Receiver of batch progress.
///
/// [`crate::state::StateManager`] implements this to drive the "checking
/// archives" notification.
#[cfg_attr(test, mockall::automock)]
pub trait ProgressSink: Send + Sync {
    fn progress(&self, event: &ProgressEvent);

    /// Called exactly once when the batch is over, issues or not.
    fn finished(&self);
}

/// Compares archive header versions against the active game's profile.
///
/// Candidates are read one at a time, in order, so progress is monotonic and
/// at most one archive is open at any moment.
pub struct MismatchDetector<'a> {
    profile: &'a GameProfile,
    data_dir: &'a Utf8Path,
    plugins: &'a IndexMap<String, PluginRecord>,
    mods: &'a IndexMap<String, ModRecord>,
}

impl<'a> MismatchDetector<'a> {
    pub fn new(
        profile: &'a GameProfile,
        data_dir: &'a Utf8Path,
        plugins: &'a IndexMap<String, PluginRecord>,
        mods: &'a IndexMap<String, ModRecord>,
    ) -> Self {
        Self {
            profile,
            data_dir,
            plugins,
            mods,
        }
    }

    /// Check every candidate and return the mismatches in candidate order.
    pub async fn detect(
        &self,
        candidates: &[ArchiveCandidate],
        sink: &dyn ProgressSink,
    ) -> Vec<ArchiveIssue> {
        let total = candidates.len();
        let mut issues = Vec::new();

        for (completed, candidate) in candidates.iter().enumerate() {
            sink.progress(&ProgressEvent {
                completed,
                total,
                current_archive: candidate.archive_file_name.clone(),
            });

            let path = self.data_dir.join(&candidate.archive_file_name);
            let detected_version = read_version(&path).await;

            if detected_version == self.profile.expected_version {
                continue;
            }

            tracing::info!(
                "Archive {} (loaded by {}) has version {}, {} expects {}",
                candidate.archive_file_name,
                candidate.owning_plugin_name,
                detected_version,
                self.profile.display_name,
                self.profile.expected_version
            );

            let owning_plugin = self.resolve_plugin(&candidate.owning_plugin_name);
            let owning_mod = owning_plugin.and_then(|p| self.resolve_mod(p));

            issues.push(ArchiveIssue {
                archive_file_name: candidate.archive_file_name.clone(),
                detected_version,
                expected_version: self.profile.expected_version,
                owning_plugin: owning_plugin.cloned(),
                owning_mod: owning_mod.cloned(),
            });
        }

        sink.finished();
        issues
    }

    fn resolve_plugin(&self, name: &str) -> Option<&'a PluginRecord> {
        let plugins = self.plugins;
        plugins
            .get(&name.to_lowercase())
            .or_else(|| plugins.values().find(|p| p.name.eq_ignore_ascii_case(name)))
    }

    fn resolve_mod(&self, plugin: &PluginRecord) -> Option<&'a ModRecord> {
        let mods = self.mods;
        let mod_id = plugin.mod_id.as_deref()?;
        let found = mods.get(mod_id);
        if found.is_none() {
            tracing::debug!("Mod {} of plugin {} is not installed", mod_id, plugin.name);
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArchiveKind, UNREADABLE_VERSION};
    use camino::Utf8PathBuf;
    use mockall::Sequence;
    use mockall::predicate::*;
    use std::fs;
    use tempfile::TempDir;

    fn data_dir_with(archives: &[(&str, u8)]) -> (TempDir, Utf8PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        for (name, version) in archives {
            fs::write(data_dir.join(name), [b'B', b'S', b'A', 0, *version, 0, 0, 0, 36]).unwrap();
        }
        (temp_dir, data_dir)
    }

    fn plugin_map(plugins: Vec<PluginRecord>) -> IndexMap<String, PluginRecord> {
        plugins
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p))
            .collect()
    }

    fn sse() -> GameProfile {
        GameProfile::new("skyrimse", "Skyrim Special Edition", 105, ArchiveKind::Bsa)
    }

    #[tokio::test]
    async fn test_progress_then_finished_in_order() {
        let (_dir, data_dir) = data_dir_with(&[("a.bsa", 105), ("b.bsa", 104)]);
        let profile = sse();
        let plugins = plugin_map(vec![
            PluginRecord::new("A.esp", 0),
            PluginRecord::new("B.esp", 1),
        ]);
        let mods = IndexMap::new();

        let mut seq = Sequence::new();
        let mut sink = MockProgressSink::new();
        sink.expect_progress()
            .with(eq(ProgressEvent {
                completed: 0,
                total: 2,
                current_archive: "a.bsa".to_string(),
            }))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_progress()
            .with(eq(ProgressEvent {
                completed: 1,
                total: 2,
                current_archive: "b.bsa".to_string(),
            }))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        sink.expect_finished()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        let candidates = vec![
            ArchiveCandidate::new("a.bsa", "A.esp"),
            ArchiveCandidate::new("b.bsa", "B.esp"),
        ];
        let detector = MismatchDetector::new(&profile, &data_dir, &plugins, &mods);
        let issues = detector.detect(&candidates, &sink).await;

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].archive_file_name, "b.bsa");
        assert_eq!(issues[0].detected_version, 104);
        assert_eq!(issues[0].expected_version, 105);
        assert_eq!(issues[0].plugin_name(), "B.esp");
    }

    #[tokio::test]
    async fn test_finished_on_empty_batch() {
        let (_dir, data_dir) = data_dir_with(&[]);
        let profile = sse();
        let plugins = IndexMap::new();
        let mods = IndexMap::new();

        let mut sink = MockProgressSink::new();
        sink.expect_progress().times(0);
        sink.expect_finished().times(1).return_const(());

        let detector = MismatchDetector::new(&profile, &data_dir, &plugins, &mods);
        assert!(detector.detect(&[], &sink).await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_archive_reported_with_sentinel() {
        let (_dir, data_dir) = data_dir_with(&[]);
        let profile = sse();
        let plugins = plugin_map(vec![PluginRecord::new("Gone.esp", 0)]);
        let mods = IndexMap::new();

        let mut sink = MockProgressSink::new();
        sink.expect_progress().times(1).return_const(());
        sink.expect_finished().times(1).return_const(());

        let detector = MismatchDetector::new(&profile, &data_dir, &plugins, &mods);
        let issues = detector
            .detect(&[ArchiveCandidate::new("gone.bsa", "Gone.esp")], &sink)
            .await;

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].detected_version, UNREADABLE_VERSION);
    }

    #[tokio::test]
    async fn test_resolves_owning_mod() {
        let (_dir, data_dir) = data_dir_with(&[("tracked.bsa", 104), ("stale.bsa", 104)]);
        let profile = sse();
        let plugins = plugin_map(vec![
            PluginRecord::new("Tracked.esp", 0).with_mod("tracked-mod"),
            PluginRecord::new("Stale.esp", 1).with_mod("uninstalled-mod"),
        ]);
        let mut mods = IndexMap::new();
        mods.insert("tracked-mod".to_string(), ModRecord::new("tracked-mod"));

        let mut sink = MockProgressSink::new();
        sink.expect_progress().times(2).return_const(());
        sink.expect_finished().times(1).return_const(());

        let detector = MismatchDetector::new(&profile, &data_dir, &plugins, &mods);
        let issues = detector
            .detect(
                &[
                    ArchiveCandidate::new("tracked.bsa", "Tracked.esp"),
                    ArchiveCandidate::new("stale.bsa", "stale.ESP"),
                ],
                &sink,
            )
            .await;

        assert_eq!(issues[0].owning_mod.as_ref().unwrap().id, "tracked-mod");
        assert_eq!(issues[1].owning_plugin.as_ref().unwrap().name, "Stale.esp");
        assert!(issues[1].owning_mod.is_none());
    }
}
