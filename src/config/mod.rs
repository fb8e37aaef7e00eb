use crate::models::{ArchiveData, GameProfiles, MainConfig, ModRegistry, UserConfig};
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Prefix of environment variables that override user settings.
pub const ENV_PREFIX: &str = "BSAGUARD";

/// Configuration manager for loading and saving YAML configuration files.
///
/// Manages two configuration files:
/// - Main config (`bsaguard Main.yaml`): game profile table, native plugin lists
/// - User config (`bsaguard Config.yaml`): paths and logging preferences
///
/// The mod registry lives wherever the user points it and is loaded with
/// [`load_mod_registry`](Self::load_mod_registry).
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: Utf8PathBuf,
    main_config_path: Utf8PathBuf,
    user_config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the specified configuration directory.
    ///
    /// # Arguments
    /// * `config_dir` - Directory containing configuration files (e.g., "bsaguard Data")
    pub fn new<P: AsRef<Utf8Path>>(config_dir: P) -> Result<Self> {
        let config_dir = config_dir.as_ref().to_path_buf();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {}", config_dir))?;
        }

        Ok(Self {
            main_config_path: config_dir.join("bsaguard Main.yaml"),
            user_config_path: config_dir.join("bsaguard Config.yaml"),
            config_dir,
        })
    }

    /// Load the main configuration file.
    ///
    /// Falls back to the built-in profile table when the file doesn't exist.
    /// A file whose profiles are invalid (duplicate ids, reserved version) is
    /// rejected.
    pub fn load_main_config(&self) -> Result<MainConfig> {
        if !self.main_config_path.exists() {
            tracing::warn!(
                "Main config file not found at {}, using defaults",
                self.main_config_path
            );
            return Ok(self.create_default_main_config());
        }

        let file_contents = fs::read_to_string(&self.main_config_path)
            .with_context(|| format!("Failed to read main config: {}", self.main_config_path))?;

        let config: MainConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse main config: {}", self.main_config_path))?;

        config
            .profiles()
            .with_context(|| format!("Invalid game profiles in {}", self.main_config_path))?;

        tracing::info!(
            "Loaded main config from {} ({} games)",
            self.main_config_path,
            config.archive_data.game_profiles.len()
        );
        Ok(config)
    }

    /// Save the main configuration file.
    pub fn save_main_config(&self, config: &MainConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize main config to YAML")?;

        fs::write(&self.main_config_path, yaml_string)
            .with_context(|| format!("Failed to write main config: {}", self.main_config_path))?;

        tracing::info!("Saved main config to {}", self.main_config_path);
        Ok(())
    }

    /// Load user settings.
    ///
    /// Layers, later wins: built-in defaults, `bsaguard Config.yaml` (optional),
    /// then `BSAGUARD_*` environment variables (e.g. `BSAGUARD_GAME_PATH`).
    pub fn load_user_config(&self) -> Result<UserConfig> {
        if !self.user_config_path.exists() {
            tracing::debug!(
                "User config file not found at {}, using defaults and environment",
                self.user_config_path
            );
        }

        let settings = config::Config::builder()
            .add_source(
                config::File::new(self.user_config_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .with_context(|| format!("Failed to read user config: {}", self.user_config_path))?;

        let config: UserConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse user config: {}", self.user_config_path))?;

        tracing::info!("Loaded user config from {}", self.user_config_path);
        Ok(config)
    }

    /// Save the user configuration file.
    pub fn save_user_config(&self, config: &UserConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize user config to YAML")?;

        fs::write(&self.user_config_path, yaml_string)
            .with_context(|| format!("Failed to write user config: {}", self.user_config_path))?;

        tracing::info!("Saved user config to {}", self.user_config_path);
        Ok(())
    }

    /// Load an installed-mod registry.
    ///
    /// # Returns
    /// The loaded registry, or an empty one if the file doesn't exist
    pub fn load_mod_registry(&self, path: &Utf8Path) -> Result<ModRegistry> {
        if !path.exists() {
            tracing::warn!("Mod registry not found at {}, treating all plugins as unmanaged", path);
            return Ok(ModRegistry::default());
        }

        let file_contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read mod registry: {}", path))?;

        let registry: ModRegistry = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse mod registry: {}", path))?;

        tracing::info!("Loaded {} mods from {}", registry.mods.len(), path);
        Ok(registry)
    }

    /// Create the default main configuration: built-in profiles plus the
    /// master files each game ships with.
    fn create_default_main_config(&self) -> MainConfig {
        use indexmap::IndexMap;

        fn names(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }

        let skyrim_masters = [
            "Skyrim.esm",
            "Update.esm",
            "Dawnguard.esm",
            "HearthFires.esm",
            "Dragonborn.esm",
        ];

        let mut native_plugins = IndexMap::new();
        native_plugins.insert("oblivion".to_string(), names(&["Oblivion.esm"]));
        native_plugins.insert(
            "fallout3".to_string(),
            names(&[
                "Fallout3.esm",
                "Anchorage.esm",
                "ThePitt.esm",
                "BrokenSteel.esm",
                "PointLookout.esm",
                "Zeta.esm",
            ]),
        );
        native_plugins.insert(
            "falloutnv".to_string(),
            names(&[
                "FalloutNV.esm",
                "DeadMoney.esm",
                "HonestHearts.esm",
                "OldWorldBlues.esm",
                "LonesomeRoad.esm",
                "GunRunnersArsenal.esm",
                "CaravanPack.esm",
                "ClassicPack.esm",
                "MercenaryPack.esm",
                "TribalPack.esm",
            ]),
        );
        native_plugins.insert("skyrim".to_string(), names(&skyrim_masters));
        native_plugins.insert(
            "enderal".to_string(),
            names(&["Skyrim.esm", "Update.esm", "Enderal - Forgotten Stories.esm"]),
        );
        native_plugins.insert(
            "skyrimse".to_string(),
            names(&[&skyrim_masters[..], &["_ResourcePack.esl"][..]].concat()),
        );
        native_plugins.insert(
            "enderalspecialedition".to_string(),
            names(&[&skyrim_masters[..], &["Enderal - Forgotten Stories.esm"][..]].concat()),
        );
        native_plugins.insert(
            "skyrimvr".to_string(),
            names(&[&skyrim_masters[..], &["SkyrimVR.esm"][..]].concat()),
        );
        native_plugins.insert(
            "fallout4".to_string(),
            names(&[
                "Fallout4.esm",
                "DLCRobot.esm",
                "DLCworkshop01.esm",
                "DLCCoast.esm",
                "DLCworkshop02.esm",
                "DLCworkshop03.esm",
                "DLCNukaWorld.esm",
                "DLCUltraHighResolution.esm",
            ]),
        );
        native_plugins.insert(
            "fallout4vr".to_string(),
            names(&["Fallout4.esm", "Fallout4_VR.esm"]),
        );

        MainConfig {
            archive_data: ArchiveData {
                version: crate::VERSION.to_string(),
                game_profiles: GameProfiles::builtin().to_vec(),
                native_plugins,
            },
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}
