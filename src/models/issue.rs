use crate::models::{ModRecord, PluginRecord};

/// An archive file paired with the plugin whose name prefixes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveCandidate {
    pub archive_file_name: String,
    pub owning_plugin_name: String,
}

impl ArchiveCandidate {
    pub fn new(archive_file_name: &str, owning_plugin_name: &str) -> Self {
        Self {
            archive_file_name: archive_file_name.to_string(),
            owning_plugin_name: owning_plugin_name.to_string(),
        }
    }
}

/// An archive whose header version differs from what the active game expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveIssue {
    pub archive_file_name: String,
    pub detected_version: u32,
    pub expected_version: u32,
    pub owning_plugin: Option<PluginRecord>,
    pub owning_mod: Option<ModRecord>,
}

impl ArchiveIssue {
    /// Name of the plugin that loads the archive, or `"unknown plugin"`.
    pub fn plugin_name(&self) -> &str {
        self.owning_plugin
            .as_ref()
            .map(|p| p.name.as_str())
            .unwrap_or("unknown plugin")
    }
}
