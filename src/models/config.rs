use crate::models::{GameProfile, GameProfiles, ModRecord, ProfileError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Main configuration from bsaguard Main.yaml
///
/// Contains the game profile table and the plugins each game ships with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    #[serde(rename = "Archive_Data")]
    pub archive_data: ArchiveData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveData {
    pub version: String,

    #[serde(rename = "Game_Profiles")]
    pub game_profiles: Vec<GameProfile>,

    #[serde(rename = "Native_Plugins", default)]
    pub native_plugins: IndexMap<String, Vec<String>>,
}

impl MainConfig {
    /// Build the validated profile table.
    pub fn profiles(&self) -> Result<GameProfiles, ProfileError> {
        GameProfiles::from_profiles(self.archive_data.game_profiles.clone())
    }

    /// Get the native plugin list for a specific game
    pub fn get_native_plugins(&self, game_id: &str) -> Option<&Vec<String>> {
        self.archive_data.native_plugins.get(game_id)
    }

    /// Check if a plugin ships with the given game
    pub fn is_native_plugin(&self, game_id: &str, plugin: &str) -> bool {
        if let Some(natives) = self.get_native_plugins(game_id) {
            natives.iter().any(|s| s.eq_ignore_ascii_case(plugin))
        } else {
            false
        }
    }
}

/// User settings from bsaguard Config.yaml, overridable through `BSAGUARD_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub game_id: Option<String>,

    /// Game installation directory (the folder containing `Data`)
    #[serde(default)]
    pub game_path: Option<String>,

    #[serde(default)]
    pub plugins_txt: Option<String>,

    #[serde(default)]
    pub mods_file: Option<String>,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default)]
    pub debug_mode: bool,

    #[serde(default)]
    pub json_logs: bool,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            game_id: None,
            game_path: None,
            plugins_txt: None,
            mods_file: None,
            log_dir: default_log_dir(),
            debug_mode: false,
            json_logs: false,
        }
    }
}

fn default_log_dir() -> String {
    "logs".to_string()
}

/// Installed-mod registry file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModRegistry {
    #[serde(default)]
    pub mods: IndexMap<String, ModEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModEntry {
    #[serde(default)]
    pub custom_file_name: Option<String>,

    #[serde(default)]
    pub logical_file_name: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    /// Plugin files installed by this mod
    #[serde(default)]
    pub plugins: Vec<String>,
}

impl ModRegistry {
    /// Mod records keyed by mod id.
    pub fn records(&self) -> IndexMap<String, ModRecord> {
        self.mods
            .iter()
            .map(|(id, entry)| {
                let record = ModRecord {
                    id: id.clone(),
                    custom_file_name: entry.custom_file_name.clone(),
                    logical_file_name: entry.logical_file_name.clone(),
                    name: entry.name.clone(),
                };
                (id.clone(), record)
            })
            .collect()
    }

    /// Id of the first mod that lists `plugin` (case-insensitive).
    pub fn mod_id_for_plugin(&self, plugin: &str) -> Option<&str> {
        self.mods
            .iter()
            .find(|(_, entry)| entry.plugins.iter().any(|p| p.eq_ignore_ascii_case(plugin)))
            .map(|(id, _)| id.as_str())
    }
}
