//! Load order parsing and game detection from `plugins.txt`.
//!
//! Two formats are understood:
//! - Modern (Skyrim SE, Fallout 4): every plugin is listed, enabled ones carry a `*` prefix
//! - Legacy (Oblivion, Fallout 3/NV, Skyrim): only active plugins are listed, no prefix
//!
//! A file without a single `*` line is treated as legacy, so every entry is enabled.
//!
//! # Examples
//!
//! ```ignore
//! use bsaguard::services::load_order::{detect_game_from_load_order, parse_plugins_txt};
//!
//! let content = "*Skyrim.esm\n*MyMod.esp\nDisabled.esp\n";
//! let plugins = parse_plugins_txt(content, |name| name.eq_ignore_ascii_case("Skyrim.esm"));
//! assert!(plugins[1].enabled);
//! assert!(!plugins[2].enabled);
//! ```

use crate::models::PluginRecord;
use anyhow::{Context, Result};
use camino::Utf8Path;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::sync::LazyLock;

/// `[*]<name>.esp|esm|esl`, surrounding whitespace ignored.
static PLUGIN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\*)?\s*(.+?\.(?:esp|esm|esl))\s*$").expect("Invalid plugin line regex")
});

/// Master files identifying each game, checked in order.
const GAME_MASTERS: [(&str, &str); 5] = [
    ("skyrim.esm", "skyrimse"),
    ("fallout4.esm", "fallout4"),
    ("falloutnv.esm", "falloutnv"),
    ("fallout3.esm", "fallout3"),
    ("oblivion.esm", "oblivion"),
];

/// Parse the contents of a `plugins.txt` into plugin records.
///
/// `load_order` is the plugin's position among the parsed entries. Plugins
/// for which `is_native` returns true are flagged as native. Every plugin
/// is assumed to load archives; the correlator only pairs it with archives
/// that actually exist.
pub fn parse_plugins_txt(content: &str, is_native: impl Fn(&str) -> bool) -> Vec<PluginRecord> {
    let entries: Vec<(bool, &str)> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let caps = PLUGIN_LINE.captures(line)?;
            let name = caps.get(2)?.as_str();
            Some((caps.get(1).is_some(), name))
        })
        .collect();

    let legacy = !entries.iter().any(|(starred, _)| *starred);
    if legacy && !entries.is_empty() {
        tracing::debug!("No '*' markers in plugins.txt, treating every entry as enabled");
    }

    entries
        .into_iter()
        .enumerate()
        .map(|(position, (starred, name))| PluginRecord {
            name: name.to_string(),
            is_native: is_native(name),
            loads_archive: true,
            enabled: legacy || starred,
            load_order: position as i32,
            mod_id: None,
        })
        .collect()
}

/// Read and parse a `plugins.txt` file.
pub fn load_plugins_txt(
    path: &Utf8Path,
    is_native: impl Fn(&str) -> bool,
) -> Result<Vec<PluginRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read load order file: {}", path))?;

    let plugins = parse_plugins_txt(&content, is_native);
    tracing::info!("Loaded {} plugins from {}", plugins.len(), path);
    Ok(plugins)
}

/// Detects the game by reading the load order file and looking for its
/// master file.
///
/// `Skyrim.esm` maps to `skyrimse`, the most common Skyrim flavour; pass the
/// game explicitly for Skyrim LE, VR or Enderal.
///
/// # Errors
///
/// Returns an error if the file cannot be read
pub fn detect_game_from_load_order(load_order_path: &Utf8Path) -> Result<Option<String>> {
    let file = File::open(load_order_path)
        .with_context(|| format!("Failed to open load order file: {}", load_order_path))?;

    let reader = BufReader::new(file);

    for line_result in reader.lines() {
        let line = line_result.context("Failed to read line from load order file")?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let plugin_name = line.trim_start_matches(['*', '+', '-']).trim().to_lowercase();

        for (master, game_id) in GAME_MASTERS {
            if plugin_name == master {
                tracing::info!("Detected game {} from load order", game_id);
                return Ok(Some(game_id.to_string()));
            }
        }
    }

    tracing::debug!("Could not detect game from load order {}", load_order_path);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_modern_format() {
        let content =
            "# This file is used by the game\n*Skyrim.esm\n*Foo.esp\nBar.esp\n\n*Baz.esl\n";
        let plugins = parse_plugins_txt(content, |name| name.eq_ignore_ascii_case("skyrim.esm"));

        let names: Vec<&str> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Skyrim.esm", "Foo.esp", "Bar.esp", "Baz.esl"]);

        assert!(plugins[0].is_native);
        assert!(plugins[1].enabled);
        assert!(!plugins[2].enabled);
        assert!(plugins[3].enabled);
        assert_eq!(plugins[3].load_order, 3);
    }

    #[test]
    fn test_parse_legacy_format() {
        let content = "Oblivion.esm\nFoo.esp\n";
        let plugins = parse_plugins_txt(content, |_| false);

        assert_eq!(plugins.len(), 2);
        assert!(plugins.iter().all(|p| p.enabled));
    }

    #[test]
    fn test_parse_skips_non_plugins() {
        let content = "*Foo.esp\n*readme.txt\n*Foo.bsa\n  *Spaced Name.ESM  \n";
        let plugins = parse_plugins_txt(content, |_| false);

        let names: Vec<&str> = plugins.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Foo.esp", "Spaced Name.ESM"]);
        assert_eq!(plugins[1].load_order, 1);
    }

    #[test]
    fn test_detect_skyrim_from_load_order() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "# comment").unwrap();
        writeln!(temp_file, "*Skyrim.esm").unwrap();
        writeln!(temp_file, "*Update.esm").unwrap();

        let temp_path = Utf8Path::from_path(temp_file.path()).unwrap();
        let result = detect_game_from_load_order(temp_path).unwrap();
        assert_eq!(result, Some("skyrimse".to_string()));
    }

    #[test]
    fn test_detect_fallout4_from_load_order() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "*Fallout4.esm").unwrap();
        writeln!(temp_file, "*DLCRobot.esm").unwrap();

        let temp_path = Utf8Path::from_path(temp_file.path()).unwrap();
        let result = detect_game_from_load_order(temp_path).unwrap();
        assert_eq!(result, Some("fallout4".to_string()));
    }

    #[test]
    fn test_detect_unknown_game() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "*Morrowind.esm").unwrap();

        let temp_path = Utf8Path::from_path(temp_file.path()).unwrap();
        assert_eq!(detect_game_from_load_order(temp_path).unwrap(), None);
    }
}
