//! SQL highlighting: a single-flight engine provisioner and a renderer that
//! turns SQL snippets into themed HTML.
//!
//! The engine is expensive to build, so it is owned by a [`Provisioner`] and
//! shared behind an `Arc`. Rendering is synchronous and pure given an engine.

mod engine;
mod instruments;
mod provisioner;
mod render;
mod types;

pub(crate) use instruments::{INSTRUMENTS, Instrument, InstrumentKind};

pub use engine::{Highlighter, SyntectFactory};
pub use provisioner::{
    ConfigureError, Provisioner, configure_shared_highlighter, get_highlighter,
    shared_provisioner,
};
pub use render::render_sql;
pub use types::{
    CodeOptions, CodeToHtml, DEFAULT_THEME, EngineError, EngineFactory, HighlightError,
    HighlighterOptions, SQL_LANG,
};
