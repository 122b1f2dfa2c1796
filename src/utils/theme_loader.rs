use anyhow::{Context, Result};
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::config::{ThemeMode, UiConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeFile {
    #[serde(default)]
    pub name: String,
    pub themes: Vec<ThemeVariant>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThemeVariant {
    #[serde(default)]
    pub name: String,
    pub mode: ThemeMode,
    pub colors: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TuiTheme {
    pub background: Color,
    pub foreground: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    pub border: Color,
    pub link: Color,
    /// Category chip
    pub category: Color,
    /// Confidence percentage
    pub confidence: Color,
    /// Source, date and other secondary text
    pub muted: Color,
    pub keyword: Color,
    pub error: Color,
    pub success: Color,
}

impl TuiTheme {
    pub fn dark() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Reset,
            selection_bg: Color::Blue,
            selection_fg: Color::White,
            border: Color::Gray,
            link: Color::LightBlue,
            category: Color::Cyan,
            confidence: Color::Yellow,
            muted: Color::DarkGray,
            keyword: Color::Magenta,
            error: Color::LightRed,
            success: Color::LightGreen,
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Reset,
            foreground: Color::Black,
            selection_bg: Color::LightBlue,
            selection_fg: Color::Black,
            border: Color::DarkGray,
            link: Color::Blue,
            category: Color::Blue,
            confidence: Color::Rgb(176, 120, 0),
            muted: Color::Gray,
            keyword: Color::Magenta,
            error: Color::Red,
            success: Color::Green,
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Dark => Self::dark(),
            ThemeMode::Light => Self::light(),
        }
    }
}

impl Default for TuiTheme {
    fn default() -> Self {
        Self::dark()
    }
}

/// Theme from `ui.theme_file` when set and readable, else the built-in palette.
pub fn resolve_theme(ui: &UiConfig, enable_performance_metrics: bool) -> TuiTheme {
    match &ui.theme_file {
        Some(path) => match load_theme(Path::new(path), ui.theme_mode, enable_performance_metrics) {
            Ok(theme) => theme,
            Err(e) => {
                tracing::error!("Failed to load theme '{}': {:#}", path, e);
                TuiTheme::for_mode(ui.theme_mode)
            }
        },
        None => TuiTheme::for_mode(ui.theme_mode),
    }
}

#[tracing::instrument(skip(path, mode), fields(path = ?path, mode = %mode))]
pub fn load_theme(
    path: &Path,
    mode: ThemeMode,
    enable_performance_metrics: bool,
) -> Result<TuiTheme> {
    let start = std::time::Instant::now();
    let content = fs::read_to_string(path).context("Failed to read theme file")?;
    let theme = parse_theme(&content, mode)?;

    if enable_performance_metrics {
        tracing::debug!(elapsed = ?start.elapsed(), "Loaded theme");
    }
    Ok(theme)
}

/// Build a theme from JSON. Missing colors keep the built-in value for `mode`.
pub fn parse_theme(content: &str, mode: ThemeMode) -> Result<TuiTheme> {
    let theme_file: ThemeFile =
        serde_json::from_str(content).context("Failed to parse theme JSON")?;

    let variant = theme_file
        .themes
        .iter()
        .find(|t| t.mode == mode)
        .or_else(|| theme_file.themes.first())
        .context("No matching theme variant found")?;
    tracing::debug!(file = %theme_file.name, variant = %variant.name, "Using theme variant");

    let base = TuiTheme::for_mode(mode);
    let pick = |keys: &[&str], fallback: Color| {
        keys.iter()
            .find_map(|k| variant.colors.get(*k))
            .map(|hex| parse_color(hex))
            .unwrap_or(fallback)
    };

    Ok(TuiTheme {
        background: pick(&["background"], base.background),
        foreground: pick(&["foreground"], base.foreground),
        selection_bg: pick(
            &["selection.background", "list.active.background"],
            base.selection_bg,
        ),
        selection_fg: pick(&["selection.foreground", "foreground"], base.selection_fg),
        border: pick(&["border"], base.border),
        link: pick(&["link", "base.blue"], base.link),
        category: pick(&["category", "base.cyan"], base.category),
        confidence: pick(&["confidence", "base.yellow"], base.confidence),
        muted: pick(&["muted.foreground"], base.muted),
        keyword: pick(&["keyword", "base.magenta"], base.keyword),
        error: pick(&["error", "base.red"], base.error),
        success: pick(&["success", "base.green"], base.success),
    })
}

fn parse_color(hex: &str) -> Color {
    if let Ok(c) = hex.parse::<Color>() {
        return c;
    }

    let hex = hex.trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .unwrap_or(0)
    };
    match hex.len() {
        // 8-char hex carries alpha; only RGB is used.
        6 | 8 => Color::Rgb(channel(0..2), channel(2..4), channel(4..6)),
        _ => Color::Reset,
    }
}
