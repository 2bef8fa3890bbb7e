//! Themed HTML rendering for SQL snippets.
//!
//! A [`Provisioner`] builds one syntect-backed [`Highlighter`] on first demand
//! and shares it with every caller; [`render_sql`] turns SQL text into markup
//! with it.
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let highlighter = sqltint::get_highlighter().await?;
//! let html = sqltint::render_sql("SELECT * FROM users;", &highlighter)?;
//! # let _ = html;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod infra;

pub use application::highlight::{
    CodeOptions, CodeToHtml, ConfigureError, DEFAULT_THEME, EngineError, EngineFactory,
    HighlightError, Highlighter, HighlighterOptions, Provisioner, SQL_LANG, SyntectFactory,
    configure_shared_highlighter, get_highlighter, render_sql, shared_provisioner,
};
