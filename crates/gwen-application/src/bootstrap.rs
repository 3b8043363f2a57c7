//! ResilientBootstrapper - startup health probe, model catalog and heartbeat.
//!
//! Both startup procedures retry on a fixed delay and degrade to a usable
//! fallback once their budget is spent. Each procedure runs at most once at a
//! time: a call made while the same procedure is still in flight is skipped.

use gwen_core::backend::{HealthReport, WorkspaceBackend};
use gwen_core::config::{ClientConfig, DEFAULT_HEARTBEAT_INTERVAL_SECS};
use gwen_core::error::{GwenError, Result};
use gwen_core::event::{EventBus, SessionEvent, StatusIndicator};
use gwen_core::retry::RetryPlan;
use gwen_core::session::{ModelCatalog, PREFERRED_MODEL, SessionState};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub const MODELS_LOADED: &str = "Models loaded successfully";
pub const MODELS_FAILED: &str = "Failed to load models. Please check if Ollama is running.";

/// Result of one `check_health` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "report", rename_all = "snake_case")]
pub enum HealthOutcome {
    Healthy(HealthReport),
    /// Retries exhausted; carries the last report seen.
    Unhealthy(HealthReport),
    /// Another health check was already running.
    Skipped,
}

impl HealthOutcome {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy(_))
    }
}

/// Result of one `load_models` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "catalog", rename_all = "snake_case")]
pub enum ModelLoadOutcome {
    Loaded(ModelCatalog),
    /// Retries exhausted; the single-entry fallback catalog is in place.
    Fallback(ModelCatalog),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapOutcome {
    pub health: HealthOutcome,
    pub models: ModelLoadOutcome,
}

/// Clears an in-flight flag when the owning procedure returns.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ResilientBootstrapper {
    state: Arc<SessionState>,
    backend: Arc<dyn WorkspaceBackend>,
    events: EventBus,
    preferred_model: String,
    health_retry: RetryPlan,
    model_retry: RetryPlan,
    heartbeat_interval: Duration,
    health_in_flight: AtomicBool,
    models_in_flight: AtomicBool,
}

impl ResilientBootstrapper {
    pub fn new(
        state: Arc<SessionState>,
        backend: Arc<dyn WorkspaceBackend>,
        events: EventBus,
    ) -> Self {
        Self {
            state,
            backend,
            events,
            preferred_model: PREFERRED_MODEL.to_string(),
            health_retry: RetryPlan::default(),
            model_retry: RetryPlan::default(),
            heartbeat_interval: Duration::from_secs(DEFAULT_HEARTBEAT_INTERVAL_SECS),
            health_in_flight: AtomicBool::new(false),
            models_in_flight: AtomicBool::new(false),
        }
    }

    /// Applies retry budgets, heartbeat cadence and preferred model.
    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.preferred_model = config.preferred_model.clone();
        self.health_retry = config.health_retry;
        self.model_retry = config.model_retry;
        self.heartbeat_interval = config.heartbeat_interval();
        self
    }

    pub fn health_retry(&self) -> RetryPlan {
        self.health_retry
    }

    pub fn model_retry(&self) -> RetryPlan {
        self.model_retry
    }

    /// Runs the health probe and the model load side by side.
    pub async fn bootstrap(&self) -> BootstrapOutcome {
        tracing::info!("[Bootstrap] Starting");
        let (health, models) = tokio::join!(
            self.check_health(self.health_retry),
            self.load_models(self.model_retry)
        );
        tracing::info!(
            "[Bootstrap] Done (healthy: {}, models loaded: {})",
            health.is_healthy(),
            self.state.models_loaded()
        );
        BootstrapOutcome { health, models }
    }

    // ============================================================================
    // Health
    // ============================================================================

    /// Probes backend health, retrying while the server status is not "ok".
    ///
    /// The status indicators are refreshed after every attempt, including the
    /// ones that will be retried.
    pub async fn check_health(&self, mut plan: RetryPlan) -> HealthOutcome {
        let Some(_guard) = InFlight::acquire(&self.health_in_flight) else {
            tracing::debug!("[Bootstrap] Health check already in flight, skipping");
            return HealthOutcome::Skipped;
        };

        loop {
            let report = match self.backend.health().await {
                Ok(report) => report,
                Err(e) => {
                    tracing::warn!("[Bootstrap] Health check failed: {}", e);
                    HealthReport::unreachable()
                }
            };
            self.publish_health(&report);

            if report.server_ok() {
                return HealthOutcome::Healthy(report);
            }

            plan.consume();
            if plan.is_exhausted() {
                tracing::warn!("[Bootstrap] Health check retries exhausted");
                return HealthOutcome::Unhealthy(report);
            }
            tracing::info!(
                "[Bootstrap] Retrying health check in {}ms... ({} attempts remaining)",
                plan.delay_ms,
                plan.attempts_remaining
            );
            tokio::time::sleep(plan.delay()).await;
        }
    }

    fn publish_health(&self, report: &HealthReport) {
        self.events.emit(SessionEvent::HealthChanged {
            server: StatusIndicator::server(report.server_ok()),
            runtime: StatusIndicator::runtime(report.runtime_ok()),
        });
    }

    // ============================================================================
    // Models
    // ============================================================================

    /// Loads the model catalog once both backend and model runtime are
    /// healthy. On exhaustion the single preferred-model catalog is installed
    /// and the session is marked as not loaded.
    pub async fn load_models(&self, mut plan: RetryPlan) -> ModelLoadOutcome {
        let Some(_guard) = InFlight::acquire(&self.models_in_flight) else {
            tracing::debug!("[Bootstrap] Model load already in flight, skipping");
            return ModelLoadOutcome::Skipped;
        };

        tracing::info!("[Bootstrap] Loading models...");
        loop {
            match self.fetch_catalog().await {
                Ok(catalog) => {
                    tracing::info!("[Bootstrap] Models loaded: {:?}", catalog.models);
                    self.install_catalog(catalog.clone(), true);
                    self.events.notify_success(MODELS_LOADED);
                    return ModelLoadOutcome::Loaded(catalog);
                }
                Err(e) => {
                    tracing::warn!("[Bootstrap] Model load failed: {}", e);
                }
            }

            plan.consume();
            if plan.is_exhausted() {
                let fallback = ModelCatalog::fallback(&self.preferred_model);
                self.install_catalog(fallback.clone(), false);
                self.events.notify_error(MODELS_FAILED);
                return ModelLoadOutcome::Fallback(fallback);
            }
            tracing::info!(
                "[Bootstrap] Retrying model load in {}ms... ({} attempts remaining)",
                plan.delay_ms,
                plan.attempts_remaining
            );
            tokio::time::sleep(plan.delay()).await;
        }
    }

    async fn fetch_catalog(&self) -> Result<ModelCatalog> {
        let report = self.backend.health().await?;
        if !report.fully_ok() {
            return Err(GwenError::application("Server or Ollama is not healthy"));
        }
        let models = self.backend.models().await?;
        if models.is_empty() {
            return Err(GwenError::application("Model catalog is empty"));
        }
        Ok(ModelCatalog::from_models(models, &self.preferred_model))
    }

    fn install_catalog(&self, catalog: ModelCatalog, loaded: bool) {
        self.state.set_catalog(catalog.clone(), loaded);
        self.events
            .emit(SessionEvent::ModelsChanged { catalog, loaded });
    }

    // ============================================================================
    // Heartbeat
    // ============================================================================

    /// Runs [`bootstrap`](Self::bootstrap) and starts the heartbeat once it
    /// has returned, so the first heartbeat probe lands one interval after
    /// startup settled.
    pub async fn start(self: &Arc<Self>) -> (BootstrapOutcome, JoinHandle<()>) {
        let outcome = self.bootstrap().await;
        (outcome, self.spawn_heartbeat())
    }

    /// Starts the recurring health probe.
    ///
    /// The first probe fires one interval from now. The loop runs until the
    /// returned handle is aborted.
    pub fn spawn_heartbeat(self: &Arc<Self>) -> JoinHandle<()> {
        let bootstrapper = Arc::clone(self);
        let period = self.heartbeat_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!("[Heartbeat] Started ({}s interval)", period.as_secs());

            loop {
                ticker.tick().await;
                tracing::debug!("[Heartbeat] Tick");
                let outcome = bootstrapper.check_health(bootstrapper.health_retry).await;
                if outcome == HealthOutcome::Skipped {
                    tracing::debug!("[Heartbeat] Previous health check still running");
                }
            }
        })
    }
}
