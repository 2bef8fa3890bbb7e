use std::sync::Arc;

use metrics::counter;
use tracing::trace;

use super::types::{CodeOptions, CodeToHtml, HighlightError};

pub(crate) const METRIC_RENDER_TOTAL: &str = "sqltint_render_total";

/// Render a SQL snippet with the engine's SQL grammar and primary theme.
///
/// Empty input is rendered as a single space so the engine never sees an empty
/// document.
pub fn render_sql<E>(code: &str, engine: &E) -> Result<String, HighlightError>
where
    E: CodeToHtml + ?Sized,
{
    let code = if code.is_empty() { " " } else { code };
    counter!(METRIC_RENDER_TOTAL).increment(1);
    trace!(
        target = "sqltint::render",
        bytes = code.len(),
        theme = engine.primary_theme(),
        "Rendering SQL snippet"
    );
    engine.code_to_html(code, &CodeOptions::sql(engine.primary_theme()))
}

impl<T: CodeToHtml + ?Sized> CodeToHtml for Arc<T> {
    fn code_to_html(
        &self,
        code: &str,
        options: &CodeOptions<'_>,
    ) -> Result<String, HighlightError> {
        (**self).code_to_html(code, options)
    }

    fn primary_theme(&self) -> &str {
        (**self).primary_theme()
    }
}
