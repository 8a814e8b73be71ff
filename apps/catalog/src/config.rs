use std::{fs, path::PathBuf, time::Duration};

use anyhow::Context;
use client_core::{QueryState, DEFAULT_API_BASE_URL, DEFAULT_PAGE_SIZE};
use serde::Deserialize;
use shared::domain::{SortKey, SortOrder};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "catalog.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: u32,
    pub sort_by: SortKey,
    pub order: SortOrder,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            sort_by: SortKey::Id,
            order: SortOrder::Asc,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base_url: Option<String>,
    page_size: Option<u32>,
    sort_by: Option<String>,
    order: Option<String>,
    request_timeout_secs: Option<u64>,
}

impl Settings {
    pub fn query_state(&self) -> QueryState {
        QueryState {
            page: 1,
            page_size: self.page_size,
            sort_key: self.sort_by,
            sort_order: self.order,
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let file_cfg: FileSettings = toml::from_str(raw).context("malformed settings file")?;
        if let Some(v) = file_cfg.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = file_cfg.page_size {
            self.set_page_size(v);
        }
        if let Some(v) = file_cfg.sort_by {
            self.set_sort_by(&v);
        }
        if let Some(v) = file_cfg.order {
            self.set_order(&v);
        }
        if file_cfg.request_timeout_secs.is_some() {
            self.request_timeout_secs = file_cfg.request_timeout_secs;
        }
        Ok(())
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("CATALOG_API_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("APP__API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = lookup("APP__PAGE_SIZE") {
            match v.trim().parse::<u32>() {
                Ok(parsed) => self.set_page_size(parsed),
                Err(_) => warn!("settings: ignoring APP__PAGE_SIZE='{v}'"),
            }
        }
        if let Some(v) = lookup("APP__SORT_BY") {
            self.set_sort_by(&v);
        }
        if let Some(v) = lookup("APP__ORDER") {
            self.set_order(&v);
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            match v.trim().parse::<u64>() {
                Ok(parsed) => self.request_timeout_secs = Some(parsed),
                Err(_) => warn!("settings: ignoring APP__REQUEST_TIMEOUT_SECS='{v}'"),
            }
        }
    }

    fn set_page_size(&mut self, page_size: u32) {
        if page_size == 0 {
            warn!("settings: page size must be at least 1, keeping {}", self.page_size);
            return;
        }
        self.page_size = page_size;
    }

    fn set_sort_by(&mut self, raw: &str) {
        match raw.parse() {
            Ok(parsed) => self.sort_by = parsed,
            Err(err) => warn!("settings: {err}, keeping '{}'", self.sort_by),
        }
    }

    fn set_order(&mut self, raw: &str) {
        match raw.parse() {
            Ok(parsed) => self.order = parsed,
            Err(err) => warn!("settings: {err}, keeping '{}'", self.order),
        }
    }
}

fn config_path(explicit: Option<PathBuf>, lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    explicit
        .or_else(|| lookup("CATALOG_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Defaults, then the settings file, then environment overrides.
pub fn load_settings(explicit_path: Option<PathBuf>) -> Settings {
    load_settings_with(explicit_path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    explicit_path: Option<PathBuf>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    let path = config_path(explicit_path, &lookup);
    if let Ok(raw) = fs::read_to_string(&path) {
        if let Err(err) = settings.apply_file(&raw) {
            warn!("settings: ignoring '{}': {err:#}", path.display());
        }
    }

    settings.apply_env(lookup);
    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
