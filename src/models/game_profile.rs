use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version reported for an archive whose header could not be read.
///
/// No supported game uses this value, so an unreadable archive always shows up
/// as a mismatch. [`GameProfiles::from_profiles`] rejects profiles that claim it.
pub const UNREADABLE_VERSION: u32 = 0;

/// Container format family used by a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArchiveKind {
    #[serde(rename = "BSA")]
    Bsa,
    #[serde(rename = "BA2")]
    Ba2,
}

impl ArchiveKind {
    /// Every recognized archive format.
    pub const ALL: [ArchiveKind; 2] = [ArchiveKind::Bsa, ArchiveKind::Ba2];

    /// Lower-case file extension used by archives of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Bsa => "bsa",
            ArchiveKind::Ba2 => "ba2",
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveKind::Bsa => write!(f, "BSA"),
            ArchiveKind::Ba2 => write!(f, "BA2"),
        }
    }
}

/// Archive expectations for one supported game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameProfile {
    #[serde(rename = "id")]
    pub game_id: String,

    #[serde(rename = "name")]
    pub display_name: String,

    #[serde(rename = "version")]
    pub expected_version: u32,

    #[serde(rename = "kind")]
    pub archive_kind: ArchiveKind,
}

impl GameProfile {
    pub fn new(
        game_id: &str,
        display_name: &str,
        expected_version: u32,
        archive_kind: ArchiveKind,
    ) -> Self {
        Self {
            game_id: game_id.to_string(),
            display_name: display_name.to_string(),
            expected_version,
            archive_kind,
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProfileError {
    #[error("Game {0} is listed more than once")]
    DuplicateGame(String),

    #[error("Game {0} uses the reserved version {UNREADABLE_VERSION}")]
    ReservedVersion(String),
}

/// Lookup table from game identifier to [`GameProfile`].
///
/// Built once at start-up and never mutated afterwards. Iteration order is the
/// order the profiles were supplied in, which is also the order used when
/// naming games in reverse lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameProfiles {
    profiles: IndexMap<String, GameProfile>,
}

impl GameProfiles {
    /// The table of games supported out of the box.
    pub fn builtin() -> Self {
        let profiles = vec![
            GameProfile::new("oblivion", "Oblivion", 103, ArchiveKind::Bsa),
            GameProfile::new("fallout3", "Fallout 3", 104, ArchiveKind::Bsa),
            GameProfile::new("falloutnv", "Fallout: New Vegas", 104, ArchiveKind::Bsa),
            GameProfile::new("skyrim", "Skyrim", 104, ArchiveKind::Bsa),
            GameProfile::new("enderal", "Enderal", 104, ArchiveKind::Bsa),
            GameProfile::new("skyrimse", "Skyrim Special Edition", 105, ArchiveKind::Bsa),
            GameProfile::new(
                "enderalspecialedition",
                "Enderal Special Edition",
                105,
                ArchiveKind::Bsa,
            ),
            GameProfile::new("skyrimvr", "Skyrim VR", 105, ArchiveKind::Bsa),
            GameProfile::new("fallout4", "Fallout 4", 1, ArchiveKind::Ba2),
            GameProfile::new("fallout4vr", "Fallout 4 VR", 1, ArchiveKind::Ba2),
        ];

        Self {
            profiles: profiles
                .into_iter()
                .map(|p| (p.game_id.clone(), p))
                .collect(),
        }
    }

    /// Build a table from explicit profiles, rejecting duplicate ids and
    /// profiles that collide with [`UNREADABLE_VERSION`].
    pub fn from_profiles(profiles: Vec<GameProfile>) -> Result<Self, ProfileError> {
        let mut table = IndexMap::with_capacity(profiles.len());

        for profile in profiles {
            if profile.expected_version == UNREADABLE_VERSION {
                return Err(ProfileError::ReservedVersion(profile.game_id));
            }
            if table.contains_key(&profile.game_id) {
                return Err(ProfileError::DuplicateGame(profile.game_id));
            }
            table.insert(profile.game_id.clone(), profile);
        }

        Ok(Self { profiles: table })
    }

    pub fn lookup(&self, game_id: &str) -> Option<&GameProfile> {
        self.profiles.get(game_id)
    }

    /// All games whose expected version equals `version`, in table order.
    pub fn games_for_version(&self, version: u32) -> Vec<&GameProfile> {
        self.profiles
            .values()
            .filter(|p| p.expected_version == version)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameProfile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn to_vec(&self) -> Vec<GameProfile> {
        self.profiles.values().cloned().collect()
    }
}

impl Default for GameProfiles {
    fn default() -> Self {
        Self::builtin()
    }
}
