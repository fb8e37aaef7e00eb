//! Grouping and formatting of detected archive issues.

use crate::models::{ArchiveIssue, GameProfile, GameProfiles};
use indexmap::IndexMap;
use std::fmt;

/// Label of the group collecting issues whose plugin belongs to no known mod.
pub const UNMANAGED_LABEL: &str = "Not managed by bsaguard";

/// Phrase used when no profiled game claims a detected version.
pub const UNKNOWN_GAME: &str = "an unknown game";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    /// Issues whose plugin belongs to the mod with this id
    Mod(String),
    Unmanaged,
}

/// Partition issues by owning mod, keeping detector order inside each group.
///
/// Groups appear in the order their first issue was detected.
pub fn group(issues: &[ArchiveIssue]) -> IndexMap<GroupKey, Vec<ArchiveIssue>> {
    let mut groups: IndexMap<GroupKey, Vec<ArchiveIssue>> = IndexMap::new();

    for issue in issues {
        let key = match &issue.owning_mod {
            Some(record) => GroupKey::Mod(record.id.clone()),
            None => GroupKey::Unmanaged,
        };
        groups.entry(key).or_default().push(issue.clone());
    }

    groups
}

/// Human-facing label of a group.
pub fn group_label(key: &GroupKey, issues: &[ArchiveIssue]) -> String {
    match key {
        GroupKey::Unmanaged => UNMANAGED_LABEL.to_string(),
        GroupKey::Mod(id) => issues
            .iter()
            .find_map(|i| i.owning_mod.as_ref())
            .map(|m| m.display_name().to_string())
            .unwrap_or_else(|| id.clone()),
    }
}

/// Names of the games whose archives carry `version`, joined with `/`.
pub fn intended_games(profiles: &GameProfiles, version: u32) -> String {
    let names: Vec<&str> = profiles
        .games_for_version(version)
        .iter()
        .map(|p| p.display_name.as_str())
        .collect();

    if names.is_empty() {
        UNKNOWN_GAME.to_string()
    } else {
        names.join("/")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub archive: String,
    pub plugin: String,
    pub detected_version: u32,
    pub intended_games: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    pub key: GroupKey,
    pub label: String,
    pub entries: Vec<ReportEntry>,
}

/// Detail report for one batch, one section per owning mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub game: GameProfile,
    pub sections: Vec<ReportSection>,
}

impl AuditReport {
    pub fn build(issues: &[ArchiveIssue], game: &GameProfile, profiles: &GameProfiles) -> Self {
        let sections = group(issues)
            .into_iter()
            .map(|(key, issues)| ReportSection {
                label: group_label(&key, &issues),
                entries: issues
                    .iter()
                    .map(|issue| ReportEntry {
                        archive: issue.archive_file_name.clone(),
                        plugin: issue.plugin_name().to_string(),
                        detected_version: issue.detected_version,
                        intended_games: intended_games(profiles, issue.detected_version),
                    })
                    .collect(),
                key,
            })
            .collect();

        Self {
            game: game.clone(),
            sections,
        }
    }

    pub fn issue_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl fmt::Display for AuditReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "The following archives were not built for {} (expected {} version {}) \
             and will likely crash the game:",
            self.game.display_name, self.game.archive_kind, self.game.expected_version
        )?;

        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "{}:", section.label)?;
            for entry in &section.entries {
                writeln!(
                    f,
                    "  - {} (loaded by {}): version {}, this archive belongs to {}",
                    entry.archive, entry.plugin, entry.detected_version, entry.intended_games
                )?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ModRecord, PluginRecord};

    fn issue(
        archive: &str,
        plugin: &str,
        mod_record: Option<ModRecord>,
        version: u32,
    ) -> ArchiveIssue {
        let mut owning_plugin = PluginRecord::new(plugin, 0);
        owning_plugin.mod_id = mod_record.as_ref().map(|m| m.id.clone());
        ArchiveIssue {
            archive_file_name: archive.to_string(),
            detected_version: version,
            expected_version: 105,
            owning_plugin: Some(owning_plugin),
            owning_mod: mod_record,
        }
    }

    #[test]
    fn test_group_by_mod() {
        let armors = ModRecord::new("armors");
        let issues = vec![
            issue("a.bsa", "A.esp", Some(armors.clone()), 104),
            issue("loose.bsa", "Loose.esp", None, 104),
            issue("a - textures.bsa", "A.esp", Some(armors), 104),
        ];

        let groups = group(&issues);
        let keys: Vec<&GroupKey> = groups.keys().collect();
        assert_eq!(
            keys,
            vec![&GroupKey::Mod("armors".to_string()), &GroupKey::Unmanaged]
        );

        let armor_issues = &groups[&GroupKey::Mod("armors".to_string())];
        assert_eq!(armor_issues[0].archive_file_name, "a.bsa");
        assert_eq!(armor_issues[1].archive_file_name, "a - textures.bsa");
        assert_eq!(groups[&GroupKey::Unmanaged].len(), 1);
    }

    #[test]
    fn test_group_label() {
        let mut record = ModRecord::new("armors");
        record.logical_file_name = Some("Immersive Armors".to_string());
        let issues = vec![issue("a.bsa", "A.esp", Some(record), 104)];

        assert_eq!(
            group_label(&GroupKey::Mod("armors".to_string()), &issues),
            "Immersive Armors"
        );
        assert_eq!(group_label(&GroupKey::Unmanaged, &[]), UNMANAGED_LABEL);
    }

    #[test]
    fn test_intended_games() {
        let profiles = GameProfiles::builtin();
        assert_eq!(intended_games(&profiles, 103), "Oblivion");
        assert_eq!(
            intended_games(&profiles, 104),
            "Fallout 3/Fallout: New Vegas/Skyrim/Enderal"
        );
        assert_eq!(intended_games(&profiles, 0), UNKNOWN_GAME);
    }

    #[test]
    fn test_report_text() {
        let profiles = GameProfiles::builtin();
        let sse = profiles.lookup("skyrimse").unwrap();
        let issues = vec![issue("old.bsa", "Old.esp", None, 104)];

        let report = AuditReport::build(&issues, sse, &profiles);
        assert_eq!(report.issue_count(), 1);

        let text = report.to_string();
        assert!(text.contains("Skyrim Special Edition"));
        assert!(text.contains("Not managed by bsaguard:"));
        assert!(text.contains("old.bsa (loaded by Old.esp): version 104"));
        assert!(text.contains("belongs to Fallout 3/Fallout: New Vegas/Skyrim/Enderal"));
    }
}
