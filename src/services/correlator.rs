//! Plugin to archive correlation.
//!
//! The engine loads an archive on behalf of a plugin when the archive's file
//! name starts with the plugin's name (minus extension), so `Foo.esp` loads
//! `Foo.bsa` and `Foo - Textures.bsa`. Matching here is case-insensitive.

use crate::models::{ArchiveCandidate, ArchiveKind, PluginRecord};
use camino::Utf8Path;

/// Whether `file_name` has one of the recognized archive extensions.
pub fn is_archive_file(file_name: &str) -> bool {
    Utf8Path::new(file_name)
        .extension()
        .map(|ext| {
            ArchiveKind::ALL
                .iter()
                .any(|kind| ext.eq_ignore_ascii_case(kind.extension()))
        })
        .unwrap_or(false)
}

/// Plugins taking part in the audit, in ascending load order.
///
/// Ties are broken by case-insensitive name so the order is deterministic.
pub fn auditable_plugins<'a, I>(plugins: I) -> Vec<&'a PluginRecord>
where
    I: IntoIterator<Item = &'a PluginRecord>,
{
    let mut selected: Vec<&PluginRecord> =
        plugins.into_iter().filter(|p| p.is_auditable()).collect();
    selected.sort_by(|a, b| {
        a.load_order
            .cmp(&b.load_order)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    selected
}

/// Pair every auditable plugin with the archives its name prefixes.
///
/// Output is grouped per plugin in load order; a plugin's archives keep the
/// order of `archive_files`. An archive matched by several plugins appears
/// once per plugin.
pub fn correlate<'a, I>(plugins: I, archive_files: &[String]) -> Vec<ArchiveCandidate>
where
    I: IntoIterator<Item = &'a PluginRecord>,
{
    let archives: Vec<(&str, String)> = archive_files
        .iter()
        .filter(|name| is_archive_file(name))
        .map(|name| (name.as_str(), name.to_lowercase()))
        .collect();

    let mut candidates = Vec::new();

    for plugin in auditable_plugins(plugins) {
        let key = plugin.match_key();

        for (archive, lowered) in &archives {
            if lowered.starts_with(&key) {
                candidates.push(ArchiveCandidate::new(archive, &plugin.name));
            }
        }
    }

    tracing::debug!(
        "Correlated {} archive(s) into {} candidate(s)",
        archives.len(),
        candidates.len()
    );

    candidates
}
