use metrics::Unit;

use super::{
    provisioner::{
        METRIC_ENGINE_BUILD_FAILED_TOTAL, METRIC_ENGINE_BUILD_MS, METRIC_ENGINE_BUILD_TOTAL,
    },
    render::METRIC_RENDER_TOTAL,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InstrumentKind {
    Counter,
    Histogram,
}

/// A metric recorded by the highlighter, with the metadata a recorder shows.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Instrument {
    pub name: &'static str,
    pub kind: InstrumentKind,
    pub unit: Unit,
    pub description: &'static str,
}

pub(crate) const INSTRUMENTS: &[Instrument] = &[
    Instrument {
        name: METRIC_ENGINE_BUILD_TOTAL,
        kind: InstrumentKind::Counter,
        unit: Unit::Count,
        description: "Total number of highlighter constructions started.",
    },
    Instrument {
        name: METRIC_ENGINE_BUILD_FAILED_TOTAL,
        kind: InstrumentKind::Counter,
        unit: Unit::Count,
        description: "Total number of highlighter constructions that failed.",
    },
    Instrument {
        name: METRIC_ENGINE_BUILD_MS,
        kind: InstrumentKind::Histogram,
        unit: Unit::Milliseconds,
        description: "Highlighter construction latency in milliseconds.",
    },
    Instrument {
        name: METRIC_RENDER_TOTAL,
        kind: InstrumentKind::Counter,
        unit: Unit::Count,
        description: "Total number of SQL snippets rendered.",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instrument_names_are_unique_and_prefixed() {
        for (index, instrument) in INSTRUMENTS.iter().enumerate() {
            assert!(instrument.name.starts_with("sqltint_"), "{}", instrument.name);
            assert!(
                INSTRUMENTS[index + 1..]
                    .iter()
                    .all(|other| other.name != instrument.name),
                "{} is listed twice",
                instrument.name
            );
        }
    }

    #[test]
    fn latency_is_measured_in_milliseconds() {
        let build_ms = INSTRUMENTS
            .iter()
            .find(|instrument| instrument.name == METRIC_ENGINE_BUILD_MS)
            .expect("build latency is described");
        assert_eq!(build_ms.kind, InstrumentKind::Histogram);
        assert_eq!(build_ms.unit, Unit::Milliseconds);
    }
}
