use std::{fmt, sync::Arc, time::Instant};

use futures::future::{BoxFuture, FutureExt, Shared};
use metrics::{counter, histogram};
use once_cell::sync::{Lazy, OnceCell};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    engine::{Highlighter, SyntectFactory},
    types::{EngineError, EngineFactory, HighlighterOptions},
};

pub(crate) const METRIC_ENGINE_BUILD_TOTAL: &str = "sqltint_engine_build_total";
pub(crate) const METRIC_ENGINE_BUILD_FAILED_TOTAL: &str = "sqltint_engine_build_failed_total";
pub(crate) const METRIC_ENGINE_BUILD_MS: &str = "sqltint_engine_build_ms";

type Construction<E> = Shared<BoxFuture<'static, Result<Arc<E>, EngineError>>>;

/// Owns at most one engine for its lifetime.
///
/// The first call to [`acquire`](Self::acquire) spawns construction through the
/// injected factory as its own task and memoizes a shared handle to it. Every
/// caller, including those arriving while it is pending, awaits that handle, so
/// the factory runs exactly once and keeps running when its first caller goes
/// away. The outcome is memoized either way: a failed construction is replayed
/// to every later caller and never retried.
pub struct Provisioner<F: EngineFactory> {
    factory: Arc<F>,
    options: HighlighterOptions,
    construction: OnceCell<Construction<F::Engine>>,
}

impl<F: EngineFactory> Provisioner<F> {
    pub fn new(factory: F, options: HighlighterOptions) -> Self {
        Self {
            factory: Arc::new(factory),
            options,
            construction: OnceCell::new(),
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn options(&self) -> &HighlighterOptions {
        &self.options
    }

    /// Whether any caller has asked for the engine yet.
    pub fn is_requested(&self) -> bool {
        self.construction.get().is_some()
    }

    /// Settled outcome, or `None` while unrequested or still constructing.
    pub fn get(&self) -> Option<Result<Arc<F::Engine>, EngineError>> {
        self.construction
            .get()
            .and_then(|construction| construction.peek().cloned())
    }

    /// Return the shared engine, constructing it on first demand.
    ///
    /// The first call must happen inside a Tokio runtime. Once the engine is
    /// ready this completes on its first poll.
    pub async fn acquire(&self) -> Result<Arc<F::Engine>, EngineError> {
        self.construction
            .get_or_init(|| self.spawn_construction())
            .clone()
            .await
    }

    fn spawn_construction(&self) -> Construction<F::Engine> {
        let factory = Arc::clone(&self.factory);
        let options = self.options.clone();
        let task = tokio::spawn(async move { construct(factory.as_ref(), &options).await });

        async move {
            task.await
                .unwrap_or_else(|err| Err(EngineError::task(err.to_string())))
        }
        .boxed()
        .shared()
    }
}

async fn construct<F: EngineFactory>(
    factory: &F,
    options: &HighlighterOptions,
) -> Result<Arc<F::Engine>, EngineError> {
    debug!(
        target = "sqltint::provisioner",
        themes = ?options.themes,
        langs = ?options.langs,
        "Constructing highlighter"
    );
    counter!(METRIC_ENGINE_BUILD_TOTAL).increment(1);

    let started_at = Instant::now();
    let outcome = factory.build(options).await;
    let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_ENGINE_BUILD_MS).record(elapsed_ms);

    match outcome {
        Ok(engine) => {
            info!(
                target = "sqltint::provisioner",
                elapsed_ms,
                themes = ?options.themes,
                langs = ?options.langs,
                "Highlighter ready"
            );
            Ok(Arc::new(engine))
        }
        Err(err) => {
            counter!(METRIC_ENGINE_BUILD_FAILED_TOTAL).increment(1);
            warn!(
                target = "sqltint::provisioner",
                elapsed_ms,
                error = %err,
                "Highlighter construction failed; outcome is memoized"
            );
            Err(err)
        }
    }
}

impl<F: EngineFactory> fmt::Debug for Provisioner<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.construction.get().map(Shared::peek) {
            None => "unrequested",
            Some(None) => "pending",
            Some(Some(Ok(_))) => "ready",
            Some(Some(Err(_))) => "failed",
        };
        f.debug_struct("Provisioner")
            .field("options", &self.options)
            .field("state", &state)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigureError {
    #[error("shared highlighter already configured or in use")]
    AlreadyConfigured,
}

static SHARED_OPTIONS: OnceCell<HighlighterOptions> = OnceCell::new();

static SHARED_PROVISIONER: Lazy<Provisioner<SyntectFactory>> = Lazy::new(|| {
    let options = SHARED_OPTIONS.get_or_init(HighlighterOptions::default);
    Provisioner::new(SyntectFactory, options.clone())
});

/// Set the options used by [`shared_provisioner`]. Must run before the shared
/// provisioner is first touched, and only once.
pub fn configure_shared_highlighter(options: HighlighterOptions) -> Result<(), ConfigureError> {
    SHARED_OPTIONS
        .set(options)
        .map_err(|_| ConfigureError::AlreadyConfigured)
}

/// Process-wide provisioner, created on first use.
pub fn shared_provisioner() -> &'static Provisioner<SyntectFactory> {
    &SHARED_PROVISIONER
}

/// Acquire the process-wide highlighter.
pub async fn get_highlighter() -> Result<Arc<Highlighter>, EngineError> {
    shared_provisioner().acquire().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use futures::FutureExt;

    use super::*;

    #[derive(Debug)]
    struct Engine;

    #[derive(Default)]
    struct CountingFactory {
        builds: AtomicUsize,
    }

    #[async_trait]
    impl EngineFactory for CountingFactory {
        type Engine = Engine;

        async fn build(&self, _options: &HighlighterOptions) -> Result<Engine, EngineError> {
            self.builds.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(Engine)
        }
    }

    #[tokio::test]
    async fn state_moves_from_unrequested_to_ready() {
        let provisioner =
            Provisioner::new(CountingFactory::default(), HighlighterOptions::default());
        assert!(!provisioner.is_requested());
        assert!(provisioner.get().is_none());
        assert!(format!("{provisioner:?}").contains("unrequested"));

        provisioner.acquire().await.expect("engine builds");

        assert!(provisioner.is_requested());
        assert!(matches!(provisioner.get(), Some(Ok(_))));
        assert!(format!("{provisioner:?}").contains("ready"));
    }

    #[tokio::test]
    async fn ready_engine_is_returned_without_suspending() {
        let provisioner =
            Provisioner::new(CountingFactory::default(), HighlighterOptions::default());
        let first = provisioner.acquire().await.expect("engine builds");

        let second = provisioner
            .acquire()
            .now_or_never()
            .expect("ready engine does not suspend")
            .expect("engine builds");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(provisioner.factory.builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn options_are_kept_verbatim() {
        let options = HighlighterOptions::new(["InspiredGitHub"], ["sql", "postgresql"]);
        let provisioner = Provisioner::new(CountingFactory::default(), options.clone());
        assert_eq!(provisioner.options(), &options);
    }
}
