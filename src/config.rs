use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use strum_macros::Display;

use crate::api::{API_URL_ENV, DEFAULT_API_BASE_URL};
use crate::internal::ui::app::Action;

const CONFIG_FILE_NAME: &str = "config.ron";
const CONFIG_DIR_NAME: &str = "med-news-tui";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub ui: UiConfig,
    /// Per-context key overrides, e.g. `list: { "Ctrl+r": Refresh }`.
    pub keybindings: Option<KeyBindingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend root, e.g. "http://localhost:5001/api". `NEWS_API_URL` wins when set.
    pub base_url: String,
    /// Timeout for list/detail/stats requests and the immediate collection.
    pub timeout_secs: u64,
    /// Timeout for the historical (7 day) collection, which runs for tens of seconds.
    pub historical_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: 30,
            historical_timeout_secs: 300,
        }
    }
}

impl ApiConfig {
    pub fn resolved_base_url(&self) -> String {
        self.base_url_with_override(std::env::var(API_URL_ENV).ok())
    }

    /// Pick the environment override when present and non-blank.
    pub fn base_url_with_override(&self, env_value: Option<String>) -> String {
        env_value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| self.base_url.clone())
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    /// Extra `module=level` directives, e.g. `{"reqwest": "warn"}`.
    pub module_levels: HashMap<String, String>,
    pub log_directory: Option<String>,
    /// Emit request/render timings at debug level.
    pub enable_performance_metrics: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            module_levels: HashMap::new(),
            log_directory: None,
            enable_performance_metrics: false,
        }
    }
}

impl LoggingConfig {
    /// Build an `EnvFilter` directive string from the level and module overrides.
    pub fn filter_directives(&self) -> String {
        let mut modules: Vec<_> = self.module_levels.iter().collect();
        modules.sort();
        let mut filter = self.level.to_string();
        for (module, level) in modules {
            filter.push_str(&format!(",{}={}", module, level));
        }
        filter
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Display, Default)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PaddingConfig {
    pub horizontal: u16,
    pub vertical: u16,
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            horizontal: 1,
            vertical: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct UiConfig {
    /// Optional JSON theme file; the built-in palette is used when absent.
    pub theme_file: Option<String>,
    pub theme_mode: ThemeMode,
    /// Show keyword tags under each article in the list.
    pub show_keywords: bool,
    pub padding: PaddingConfig,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme_file: None,
            theme_mode: ThemeMode::Dark,
            show_keywords: true,
            padding: PaddingConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct KeyBindingConfig {
    pub global: HashMap<String, Action>,
    pub list: HashMap<String, Action>,
    pub detail: HashMap<String, Action>,
}

impl AppConfig {
    /// Load `config.ron` from the working directory, next to the executable,
    /// or the user config directory. Falls back to defaults.
    pub fn load() -> Self {
        for path in Self::candidate_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    tracing::error!("{:#}", e);
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Self::default()
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::from_ron_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    pub fn from_ron_str(content: &str) -> Result<Self> {
        Ok(ron::from_str::<AppConfig>(content)?)
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];

        if let Ok(exe) = std::env::current_exe()
            && let Some(dir) = exe.parent()
        {
            candidates.push(dir.join(CONFIG_FILE_NAME));
        }

        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME));
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:5001/api");
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.ui.theme_mode, ThemeMode::Dark);
        assert!(config.keybindings.is_none());
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = AppConfig::from_ron_str(
            r#"(
                // only override what we need
                api: (base_url: "http://news.internal:8080/api"),
                logging: (level: debug, module_levels: {"reqwest": "warn"}),
            )"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://news.internal:8080/api");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.logging.filter_directives(), "debug,reqwest=warn");
        assert!(config.ui.show_keywords);
    }

    #[test]
    fn test_keybinding_overrides_parse() {
        let config = AppConfig::from_ron_str(
            r#"(keybindings: Some((list: {"Ctrl+r": Refresh, "x": ClearFilters})))"#,
        )
        .unwrap();

        let bindings = config.keybindings.unwrap();
        assert!(matches!(bindings.list.get("Ctrl+r"), Some(Action::Refresh)));
        assert!(matches!(bindings.list.get("x"), Some(Action::ClearFilters)));
        assert!(bindings.detail.is_empty());
    }

    #[test]
    fn test_env_override_wins_when_non_blank() {
        let api = ApiConfig::default();
        assert_eq!(
            api.base_url_with_override(Some("http://remote/api".to_string())),
            "http://remote/api"
        );
        assert_eq!(
            api.base_url_with_override(Some("  ".to_string())),
            "http://localhost:5001/api"
        );
        assert_eq!(api.base_url_with_override(None), "http://localhost:5001/api");
    }

    #[test]
    fn test_load_from_reports_path_on_error() {
        let path = std::env::temp_dir().join("med_news_tui_bad_config.ron");
        {
            let mut file = fs::File::create(&path).unwrap();
            file.write_all(b"(api: (timeout_secs: \"soon\"))").unwrap();
        }

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("med_news_tui_bad_config.ron"));

        let _ = fs::remove_file(path);
    }
}
