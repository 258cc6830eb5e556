// Pattern bank persistence: <dir>/.gridbeat/patterns.json, written on save
// and quit, read on startup. Malformed data never crashes the caller — a
// bad file loads as an empty bank and the caller seeds a default pattern;
// a pattern with an illegal length is dropped; a track whose step row
// disagrees with a legal length gets repaired in place.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::pattern::Pattern;

const APP_DIR: &str = ".gridbeat";
const BANK_FILE: &str = "patterns.json";
const SHARE_FILE: &str = "share.txt";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PatternBank {
    pub patterns: Vec<Pattern>,
    #[serde(default)]
    pub current: Option<String>,
}

// <project_dir>/.gridbeat/patterns.json
fn bank_file_path(dir: &Path) -> PathBuf {
    dir.join(APP_DIR).join(BANK_FILE)
}

/// Load and sanitize the bank. Absence, unreadable JSON, and schema failure
/// all come back as `None`; the caller falls back to a seed pattern.
pub fn load_bank(dir: &Path) -> Option<PatternBank> {
    let data = std::fs::read_to_string(bank_file_path(dir)).ok()?;
    let mut bank: PatternBank = serde_json::from_str(&data).ok()?;
    sanitize(&mut bank);
    Some(bank)
}

/// Save the bank, creating the dot directory if needed.
pub fn save_bank(dir: &Path, bank: &PatternBank) -> anyhow::Result<()> {
    let path = bank_file_path(dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(bank)?;
    std::fs::write(&path, json)?;
    Ok(())
}

/// Drop the current pattern's share token next to the bank file, returning
/// where it landed so the UI can say so.
pub fn save_share_token(dir: &Path, token: &str) -> anyhow::Result<PathBuf> {
    let path = dir.join(APP_DIR).join(SHARE_FILE);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, token)?;
    Ok(path)
}

fn sanitize(bank: &mut PatternBank) {
    bank.patterns.retain(|p| p.has_valid_length());
    for pattern in &mut bank.patterns {
        if !pattern.is_consistent() {
            pattern.repair();
        }
    }
    if let Some(current) = &bank.current {
        if !bank.patterns.iter().any(|p| &p.id == current) {
            bank.current = None;
        }
    }
}
