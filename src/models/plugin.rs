use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// A plugin as reported by the plugin-management layer.
///
/// Treated as read-only input; records are processed in ascending
/// `load_order`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginRecord {
    /// File name including extension (e.g. `Foo.esp`)
    pub name: String,

    /// Shipped with the base game
    #[serde(default)]
    pub is_native: bool,

    /// Declares that the engine loads archives for this plugin
    #[serde(default = "default_loads_archive")]
    pub loads_archive: bool,

    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub load_order: i32,

    /// Identifier of the mod that installed this plugin, if it is tracked
    #[serde(default)]
    pub mod_id: Option<String>,
}

fn default_loads_archive() -> bool {
    true
}

impl PluginRecord {
    /// An enabled, archive-loading, non-native plugin.
    pub fn new(name: &str, load_order: i32) -> Self {
        Self {
            name: name.to_string(),
            is_native: false,
            loads_archive: true,
            enabled: true,
            load_order,
            mod_id: None,
        }
    }

    pub fn with_mod(mut self, mod_id: &str) -> Self {
        self.mod_id = Some(mod_id.to_string());
        self
    }

    /// Whether this plugin takes part in the archive audit.
    pub fn is_auditable(&self) -> bool {
        self.enabled && self.loads_archive && !self.is_native
    }

    /// Lower-cased file name without extension; archives whose name starts
    /// with this key are loaded on behalf of the plugin.
    pub fn match_key(&self) -> String {
        Utf8Path::new(&self.name)
            .file_stem()
            .unwrap_or(self.name.as_str())
            .to_lowercase()
    }
}

/// Metadata for an installed mod (content package).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModRecord {
    pub id: String,

    #[serde(default)]
    pub custom_file_name: Option<String>,

    #[serde(default)]
    pub logical_file_name: Option<String>,

    #[serde(default)]
    pub name: Option<String>,
}

impl ModRecord {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    /// Name shown to the user: custom name, then logical file name, then raw
    /// name, falling back to the id. Empty strings are skipped.
    pub fn display_name(&self) -> &str {
        [&self.custom_file_name, &self.logical_file_name, &self.name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|s| !s.is_empty())
            .unwrap_or(self.id.as_str())
    }
}
