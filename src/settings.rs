use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LocacaoError, Result};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const WORKBOOK_ENV: &str = "LOCACAO_WORKBOOK";

/// Relative path the spreadsheet is expected at when nothing else is configured.
pub const DEFAULT_WORKBOOK: &str = "docs/controle-locacao.xlsx";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_workbook_path")]
    pub workbook_path: String,
}

fn default_database_path() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("locacao")
        .join("locacao.db")
        .to_string_lossy()
        .to_string()
}

fn default_workbook_path() -> String {
    DEFAULT_WORKBOOK.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            workbook_path: default_workbook_path(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("locacao")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing or unreadable files fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| LocacaoError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// Strip an optional `sqlite://` or `sqlite:` scheme from a connection string.
pub fn database_path_from_url(url: &str) -> PathBuf {
    let url = url.trim();
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    PathBuf::from(path)
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Flag, then `DATABASE_URL`, then the settings file.
pub fn resolve_database_path(flag: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        return database_path_from_url(path);
    }
    if let Some(url) = non_empty_env(DATABASE_URL_ENV) {
        return database_path_from_url(&url);
    }
    PathBuf::from(load_settings().database_path)
}

/// Flag, then `LOCACAO_WORKBOOK`, then the settings file.
pub fn resolve_workbook_path(flag: Option<&str>) -> PathBuf {
    if let Some(path) = flag {
        return PathBuf::from(path);
    }
    if let Some(path) = non_empty_env(WORKBOOK_ENV) {
        return PathBuf::from(path);
    }
    PathBuf::from(load_settings().workbook_path)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
