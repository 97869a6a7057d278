use crate::error::ApiError;
use abtest_core::config::AnalysisConfig;
use abtest_experiments::{
    AnalysisRequest, ExperimentAnalyzer, ExperimentReport, SampleSizePlan, SampleSizeRequest,
    ValidationError,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared, read-only state for the analysis endpoints.
#[derive(Clone)]
pub struct AppState {
    analyzer: Arc<ExperimentAnalyzer>,
    permits: Arc<Semaphore>,
}

impl AppState {
    /// Builds the state from engine settings and a cap on concurrent analyses.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the engine settings are out of range.
    pub fn new(
        config: &AnalysisConfig,
        max_concurrent_analyses: usize,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            analyzer: Arc::new(ExperimentAnalyzer::new(config)?),
            permits: Arc::new(Semaphore::new(max_concurrent_analyses.max(1))),
        })
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct IndexResponse {
    pub service: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<&'static str>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::InvalidBody(rejection.body_text()))
}

/// Runs the full frequentist + Bayesian analysis for one experiment.
///
/// Input is validated before any computation. The Monte Carlo work runs on
/// the blocking pool so it never stalls the async workers. The concurrency
/// permit moves into the blocking task and is held until the work finishes,
/// even if the client goes away first.
///
/// # Errors
/// Returns `ApiError::InvalidBody` (400) for malformed JSON,
/// `ApiError::Validation` (400) for inconsistent counts or an out-of-range
/// confidence level, or `ApiError::Internal` (500) if the analysis task fails.
pub async fn analyze_experiment(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<ExperimentReport>, ApiError> {
    let request = json_body(payload)?;
    request.observation()?;

    let permit = state
        .permits
        .clone()
        .acquire_owned()
        .await
        .map_err(|_| ApiError::Unavailable)?;

    let analyzer = Arc::clone(&state.analyzer);
    let report = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        analyzer.analyze_request(&request)
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(report))
}

/// Computes the visitors per variant needed to detect a relative lift.
///
/// # Errors
/// Returns `ApiError::InvalidBody` (400) for malformed JSON or
/// `ApiError::Validation` (400) if any planning input is out of range.
pub async fn calculate_sample_size(
    payload: Result<Json<SampleSizeRequest>, JsonRejection>,
) -> Result<Json<SampleSizePlan>, ApiError> {
    let plan = json_body(payload)?.plan()?;
    tracing::debug!(
        baseline_rate = plan.baseline_rate,
        sample_size_per_variant = plan.sample_size_per_variant,
        "Sample size planned"
    );
    Ok(Json(plan))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        service: "A/B Experiment Analysis API",
        version: env!("CARGO_PKG_VERSION"),
        endpoints: vec![
            "/health",
            "/experiments/analyze",
            "/experiments/sample-size",
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use abtest_core::config::MAX_BAYESIAN_SAMPLES;
    use std::time::Duration;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            experiment_name: None,
            control_conversions: 100,
            control_visitors: 1000,
            variant_conversions: 130,
            variant_visitors: 1000,
            confidence_level: 0.95,
            seed: Some(1),
        }
    }

    #[test]
    fn state_rejects_invalid_engine_settings() {
        let config = AnalysisConfig {
            power: 0.0,
            ..AnalysisConfig::default()
        };
        assert!(AppState::new(&config, 4).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn permit_is_held_until_cancelled_analysis_finishes() {
        let config = AnalysisConfig {
            bayesian_samples: MAX_BAYESIAN_SAMPLES,
            ..AnalysisConfig::default()
        };
        let state = AppState::new(&config, 1).unwrap();

        let handler = analyze_experiment(State(state.clone()), Ok(Json(request())));
        let outcome = tokio::time::timeout(Duration::from_millis(1), handler).await;

        assert!(outcome.is_err(), "analysis should still be running");
        assert_eq!(state.permits.available_permits(), 0);

        // Released once the blocking task completes
        let permit = tokio::time::timeout(
            Duration::from_secs(120),
            state.permits.clone().acquire_owned(),
        )
        .await;
        assert!(matches!(permit, Ok(Ok(_))));
    }
}
