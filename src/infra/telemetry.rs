use std::sync::Once;

use metrics::{describe_counter, describe_histogram};
use tracing::debug;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::highlight::{INSTRUMENTS, Instrument, InstrumentKind};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })?;

    debug!(
        target = "sqltint::telemetry",
        level = %logging.level,
        format = ?logging.format,
        instruments = INSTRUMENTS.len(),
        "Telemetry installed"
    );
    Ok(())
}

/// Register descriptions for the highlighter's metrics with the installed
/// recorder. Safe to call repeatedly.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| INSTRUMENTS.iter().for_each(describe));
}

fn describe(instrument: &Instrument) {
    let Instrument {
        name,
        kind,
        unit,
        description,
    } = *instrument;
    match kind {
        InstrumentKind::Counter => describe_counter!(name, unit, description),
        InstrumentKind::Histogram => describe_histogram!(name, unit, description),
    }
}
