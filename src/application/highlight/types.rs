use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Theme loaded when no configuration says otherwise.
pub const DEFAULT_THEME: &str = "base16-ocean.dark";
/// Grammar identifier used for SQL snippets.
pub const SQL_LANG: &str = "sql";

/// Immutable set of themes and grammars an engine is built with.
///
/// The first theme is the engine's primary theme and is what [`render_sql`]
/// uses. Both lists must be non-empty.
///
/// [`render_sql`]: super::render_sql
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlighterOptions {
    pub themes: Vec<String>,
    pub langs: Vec<String>,
}

impl HighlighterOptions {
    pub fn new<T, L>(themes: T, langs: L) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        L: IntoIterator,
        L::Item: Into<String>,
    {
        Self {
            themes: themes.into_iter().map(Into::into).collect(),
            langs: langs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn primary_theme(&self) -> Option<&str> {
        self.themes.first().map(String::as_str)
    }
}

impl Default for HighlighterOptions {
    fn default() -> Self {
        Self::new([DEFAULT_THEME], [SQL_LANG])
    }
}

/// Grammar/theme pair selected for a single render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeOptions<'a> {
    pub lang: &'a str,
    pub theme: &'a str,
}

impl<'a> CodeOptions<'a> {
    pub fn new(lang: &'a str, theme: &'a str) -> Self {
        Self { lang, theme }
    }

    pub fn sql(theme: &'a str) -> Self {
        Self::new(SQL_LANG, theme)
    }
}

/// Failures raised while constructing an engine. Cloneable so a memoized
/// failure can be handed to every caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("highlighter options must name at least one {0}")]
    EmptyOptions(&'static str),
    #[error("unknown language `{0}`")]
    UnknownLanguage(String),
    #[error("unknown theme `{0}`")]
    UnknownTheme(String),
    #[error("syntax pack could not be decoded: {message}")]
    SyntaxPack { message: String },
    #[error("engine construction task failed: {message}")]
    Task { message: String },
}

impl EngineError {
    pub fn syntax_pack(message: impl Into<String>) -> Self {
        Self::SyntaxPack {
            message: message.into(),
        }
    }

    pub fn task(message: impl Into<String>) -> Self {
        Self::Task {
            message: message.into(),
        }
    }
}

/// Failures raised by an engine while turning code into markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HighlightError {
    #[error("language `{0}` was not loaded into this highlighter")]
    LanguageNotLoaded(String),
    #[error("theme `{0}` was not loaded into this highlighter")]
    ThemeNotLoaded(String),
    #[error("syntax highlighting failed: {language}: {message}")]
    Highlighting { language: String, message: String },
}

/// Rendering capability of a provisioned engine. Implementations must be
/// deterministic: the same code and options yield identical markup.
pub trait CodeToHtml: Send + Sync {
    fn code_to_html(
        &self,
        code: &str,
        options: &CodeOptions<'_>,
    ) -> Result<String, HighlightError>;

    /// Theme used when the caller does not pick one.
    fn primary_theme(&self) -> &str;
}

/// Builds engines for a [`Provisioner`](super::Provisioner).
#[async_trait]
pub trait EngineFactory: Send + Sync + 'static {
    type Engine: Send + Sync + 'static;

    async fn build(&self, options: &HighlighterOptions) -> Result<Self::Engine, EngineError>;
}
