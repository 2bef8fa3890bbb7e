use std::fmt;

use async_trait::async_trait;
use syntect::{
    dumps::from_uncompressed_data,
    easy::HighlightLines,
    highlighting::{Color, Theme, ThemeSet},
    html::{IncludeBackground, styled_line_to_highlighted_html},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};
use tracing::debug;

use super::types::{
    CodeOptions, CodeToHtml, EngineError, EngineFactory, HighlightError, HighlighterOptions,
};

static SYNTAX_PACK: &[u8] = include_bytes!(env!("SYNTAX_PACK_FILE"));

/// Syntect-backed engine holding the grammars and themes it was built with.
///
/// Construction decodes the embedded syntax pack and the default theme set,
/// which is why callers are expected to obtain one through a
/// [`Provisioner`](super::Provisioner) rather than building it per request.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    themes: Vec<LoadedTheme>,
    languages: Vec<LoadedLanguage>,
}

struct LoadedTheme {
    name: String,
    class: String,
    theme: Theme,
}

struct LoadedLanguage {
    token: String,
    syntax_index: usize,
}

impl Highlighter {
    pub fn new(options: &HighlighterOptions) -> Result<Self, EngineError> {
        if options.themes.is_empty() {
            return Err(EngineError::EmptyOptions("theme"));
        }
        if options.langs.is_empty() {
            return Err(EngineError::EmptyOptions("language"));
        }

        let syntax_set: SyntaxSet = from_uncompressed_data(SYNTAX_PACK)
            .map_err(|err| EngineError::syntax_pack(err.to_string()))?;
        let languages = resolve_languages(&syntax_set, &options.langs)?;
        let themes = resolve_themes(ThemeSet::load_defaults(), &options.themes)?;

        debug!(
            target = "sqltint::engine",
            syntaxes = syntax_set.syntaxes().len(),
            languages = languages.len(),
            themes = themes.len(),
            "Highlighter assembled"
        );

        Ok(Self {
            syntax_set,
            themes,
            languages,
        })
    }

    pub fn theme_names(&self) -> impl Iterator<Item = &str> {
        self.themes.iter().map(|loaded| loaded.name.as_str())
    }

    pub fn language_names(&self) -> impl Iterator<Item = &str> {
        self.languages
            .iter()
            .map(move |loaded| self.syntax(loaded).name.as_str())
    }

    fn syntax(&self, language: &LoadedLanguage) -> &SyntaxReference {
        &self.syntax_set.syntaxes()[language.syntax_index]
    }

    fn language(&self, lang: &str) -> Option<&LoadedLanguage> {
        self.languages.iter().find(|loaded| {
            loaded.token.eq_ignore_ascii_case(lang)
                || self.syntax(loaded).name.eq_ignore_ascii_case(lang)
        })
    }

    fn theme(&self, name: &str) -> Option<&LoadedTheme> {
        self.themes
            .iter()
            .find(|loaded| loaded.name == name)
            .or_else(|| {
                self.themes
                    .iter()
                    .find(|loaded| loaded.name.eq_ignore_ascii_case(name))
            })
    }
}

impl CodeToHtml for Highlighter {
    fn code_to_html(
        &self,
        code: &str,
        options: &CodeOptions<'_>,
    ) -> Result<String, HighlightError> {
        let language = self
            .language(options.lang)
            .ok_or_else(|| HighlightError::LanguageNotLoaded(options.lang.to_string()))?;
        let theme = self
            .theme(options.theme)
            .ok_or_else(|| HighlightError::ThemeNotLoaded(options.theme.to_string()))?;
        let highlighting_error = |err: syntect::Error| HighlightError::Highlighting {
            language: language.token.clone(),
            message: err.to_string(),
        };

        let mut source = code.to_string();
        if !source.ends_with('\n') {
            source.push('\n');
        }

        let mut highlighter = HighlightLines::new(self.syntax(language), &theme.theme);
        let mut lines = Vec::new();
        for line in LinesWithEndings::from(source.as_str()) {
            let regions = highlighter
                .highlight_line(line, &self.syntax_set)
                .map_err(highlighting_error)?;
            // Line terminators are emitted between line spans, never inside them.
            let visible: Vec<_> = regions
                .into_iter()
                .filter_map(|(style, text)| {
                    let text = text.trim_end_matches(['\r', '\n']);
                    (!text.is_empty()).then_some((style, text))
                })
                .collect();
            let html = styled_line_to_highlighted_html(&visible, IncludeBackground::No)
                .map_err(highlighting_error)?;
            lines.push(format!("<span class=\"line\">{html}</span>"));
        }

        Ok(format!(
            "<pre class=\"sqltint {}\"{} tabindex=\"0\"><code class=\"language-{}\">{}</code></pre>",
            theme.class,
            pre_style(&theme.theme),
            language.token,
            lines.join("\n")
        ))
    }

    fn primary_theme(&self) -> &str {
        self.themes
            .first()
            .map(|loaded| loaded.name.as_str())
            .unwrap_or_default()
    }
}

impl fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Highlighter")
            .field("themes", &self.theme_names().collect::<Vec<_>>())
            .field(
                "languages",
                &self
                    .languages
                    .iter()
                    .map(|loaded| loaded.token.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

fn resolve_languages(
    syntax_set: &SyntaxSet,
    requested: &[String],
) -> Result<Vec<LoadedLanguage>, EngineError> {
    let mut languages: Vec<LoadedLanguage> = Vec::with_capacity(requested.len());
    for token in requested {
        let syntax = find_syntax(syntax_set, token)
            .ok_or_else(|| EngineError::UnknownLanguage(token.clone()))?;
        let syntax_index = syntax_set
            .syntaxes()
            .iter()
            .position(|candidate| std::ptr::eq(candidate, syntax))
            .ok_or_else(|| EngineError::UnknownLanguage(token.clone()))?;

        if languages
            .iter()
            .any(|loaded| loaded.syntax_index == syntax_index)
        {
            continue;
        }

        languages.push(LoadedLanguage {
            token: token.to_ascii_lowercase(),
            syntax_index,
        });
    }
    Ok(languages)
}

fn find_syntax<'a>(syntax_set: &'a SyntaxSet, token: &str) -> Option<&'a SyntaxReference> {
    let lowercase = token.to_ascii_lowercase();
    syntax_set
        .find_syntax_by_token(&lowercase)
        .or_else(|| syntax_set.find_syntax_by_name(token))
        .or_else(|| syntax_set.find_syntax_by_extension(&lowercase))
}

fn resolve_themes(
    mut theme_set: ThemeSet,
    requested: &[String],
) -> Result<Vec<LoadedTheme>, EngineError> {
    let mut themes: Vec<LoadedTheme> = Vec::with_capacity(requested.len());
    for name in requested {
        let key = if theme_set.themes.contains_key(name) {
            Some(name.clone())
        } else {
            theme_set
                .themes
                .keys()
                .find(|candidate| candidate.eq_ignore_ascii_case(name))
                .cloned()
        };

        let Some(key) = key else {
            if themes.iter().any(|loaded| loaded.name.eq_ignore_ascii_case(name)) {
                continue;
            }
            return Err(EngineError::UnknownTheme(name.clone()));
        };

        if let Some(theme) = theme_set.themes.remove(&key) {
            themes.push(LoadedTheme {
                class: slug::slugify(&key),
                name: key,
                theme,
            });
        }
    }
    Ok(themes)
}

fn pre_style(theme: &Theme) -> String {
    let mut declarations = Vec::new();
    if let Some(background) = theme.settings.background {
        declarations.push(format!("background-color:{}", hex(background)));
    }
    if let Some(foreground) = theme.settings.foreground {
        declarations.push(format!("color:{}", hex(foreground)));
    }

    if declarations.is_empty() {
        String::new()
    } else {
        format!(" style=\"{}\"", declarations.join(";"))
    }
}

fn hex(color: Color) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

/// Production [`EngineFactory`] building [`Highlighter`]s on the blocking pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntectFactory;

#[async_trait]
impl EngineFactory for SyntectFactory {
    type Engine = Highlighter;

    async fn build(&self, options: &HighlighterOptions) -> Result<Highlighter, EngineError> {
        let options = options.clone();
        tokio::task::spawn_blocking(move || Highlighter::new(&options))
            .await
            .map_err(|err| EngineError::task(err.to_string()))?
    }
}
