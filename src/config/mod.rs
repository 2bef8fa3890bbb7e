//! Configuration layer: typed settings with layered precedence (file → env).

use std::{path::Path, str::FromStr};

use config::{Config, Environment, File, Map};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::application::highlight::{DEFAULT_THEME, HighlighterOptions, SQL_LANG};

const DEFAULT_CONFIG_BASENAME: &str = "sqltint";
const ENV_PREFIX: &str = "SQLTINT";
const ENV_SEPARATOR: &str = "__";
const LIST_SEPARATOR: &str = ",";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub highlight: HighlighterOptions,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings from `sqltint.*` in the working directory, the optional
/// explicit file, then `SQLTINT__*` environment variables.
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    load_from_sources(config_file, None)
}

fn load_from_sources(
    config_file: Option<&Path>,
    environment: Option<Map<String, String>>,
) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false));

    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
            .list_separator(LIST_SEPARATOR)
            .with_list_parse_key("highlight.themes")
            .with_list_parse_key("highlight.langs")
            .source(environment),
    );

    let raw: RawSettings = builder.build()?.try_deserialize()?;
    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    highlight: RawHighlightSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawHighlightSettings {
    themes: Option<Vec<String>>,
    langs: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { highlight, logging } = raw;

        let highlight = build_highlight_settings(highlight)?;
        let logging = build_logging_settings(logging)?;

        Ok(Self { highlight, logging })
    }
}

fn build_highlight_settings(
    highlight: RawHighlightSettings,
) -> Result<HighlighterOptions, LoadError> {
    let themes = match highlight.themes {
        Some(themes) => non_empty_names(themes, "highlight.themes")?,
        None => vec![DEFAULT_THEME.to_string()],
    };
    let langs = match highlight.langs {
        Some(langs) => non_empty_names(langs, "highlight.langs")?,
        None => vec![SQL_LANG.to_string()],
    };
    if !langs.iter().any(|lang| lang.eq_ignore_ascii_case(SQL_LANG)) {
        return Err(LoadError::invalid(
            "highlight.langs",
            format!("must include `{SQL_LANG}`; SQL snippets are rendered with it"),
        ));
    }

    Ok(HighlighterOptions::new(themes, langs))
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

/// Trim entries, drop blanks and duplicates, and require at least one name.
fn non_empty_names(values: Vec<String>, key: &'static str) -> Result<Vec<String>, LoadError> {
    let mut names: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() || names.iter().any(|name| name == trimmed) {
            continue;
        }
        names.push(trimmed.to_string());
    }

    if names.is_empty() {
        return Err(LoadError::invalid(key, "must name at least one entry"));
    }
    Ok(names)
}
