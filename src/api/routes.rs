use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Environment;
use crate::domain::EvaluationDecision;
use crate::engine::{checks, DecisionEngine};
use crate::narrative::{NarrativeError, NarrativeService};
use crate::observability::MetricsRegistry;
use crate::underwriter::{ProductionFallback, UnderwriterSchema};

use super::auth::require_api_key;
use super::error::ApiError;
use super::request::{
    BorrowerIdRequest, BorrowerTypeRequest, CheckNarrativeRequest, JsonBody, OpenBankingRequest,
};
use super::response::{
    CheckResponse, DecisionResponse, Endpoint, ErrorResponse, HealthResponse, NarrativeResponse,
    ReadyResponse, SmeRiskResponse, VerifiedNarrativeResponse,
};

/// Shared application state.
pub struct AppState {
    /// Rule engine over the process-wide rule table
    pub engine: DecisionEngine,

    /// Narrative service, absent when no collaborator is configured
    pub narrative: Option<NarrativeService>,

    pub metrics: Arc<MetricsRegistry>,

    pub environment: Environment,

    /// Domain reported by the production schema fallback
    pub public_domain: String,

    /// Expected `X-API-Key`; auth is disabled when unset
    pub api_key: Option<String>,

    /// Application start time
    pub start_time: Instant,

    /// Application version
    pub version: String,

    /// Latency budget in milliseconds
    pub latency_budget_ms: u64,

    pub request_timeout: Duration,

    pub max_concurrency: usize,
}

/// Create the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/evaluate/borrower-type", post(handle_borrower_type))
        .route("/evaluate/borrower-id", post(handle_borrower_id))
        .route("/evaluate/open-banking", post(handle_open_banking))
        .route("/evaluate/sme-risk", post(handle_sme_risk))
        .route("/underwriter-schema", get(handle_underwriter_schema))
        .route("/generate-narrative", post(handle_generate_narrative))
        .route("/check-narrative", post(handle_check_narrative))
        .route(
            "/generate-and-verify-narrative",
            post(handle_generate_and_verify),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let open = Router::new()
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready))
        .route("/metrics", get(handle_metrics));

    // Router::layer wraps each route separately, so the permits must be
    // shared across all of them
    Router::new()
        .merge(protected)
        .merge(open)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    state.request_timeout,
                ))
                .layer(GlobalConcurrencyLimitLayer::new(state.max_concurrency.max(1))),
        )
        .with_state(state)
}

fn check_latency(state: &AppState, endpoint: Endpoint, start: Instant) {
    state.metrics.record_latency(start);

    let elapsed = start.elapsed();
    if elapsed.as_millis() > state.latency_budget_ms as u128 {
        warn!(
            endpoint = endpoint.path(),
            latency_ms = elapsed.as_millis() as u64,
            budget_ms = state.latency_budget_ms,
            "Decision latency exceeded budget"
        );
    }
}

fn complete_check(
    state: &AppState,
    endpoint: Endpoint,
    decision: EvaluationDecision,
    start: Instant,
) -> Result<Json<DecisionResponse>, ApiError> {
    state.metrics.record_simple_check();
    check_latency(state, endpoint, start);

    let outcome = decision.decision;
    let response = DecisionResponse::assemble(endpoint, decision).map_err(|v| {
        state.metrics.record_outcome_violation();
        v
    })?;
    state.metrics.record_decision(outcome);

    info!(
        endpoint = endpoint.path(),
        decision = %outcome,
        confidence = response.confidence,
        latency_ms = start.elapsed().as_millis() as u64,
        "Decision completed"
    );
    Ok(Json(response))
}

async fn handle_borrower_type(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<BorrowerTypeRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let start = Instant::now();
    let decision = checks::evaluate_borrower_type(&req.borrower_type);
    complete_check(&state, Endpoint::BorrowerType, decision, start)
}

async fn handle_borrower_id(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<BorrowerIdRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let start = Instant::now();
    let decision = checks::evaluate_borrower_id(req.is_verified);
    complete_check(&state, Endpoint::BorrowerId, decision, start)
}

async fn handle_open_banking(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<OpenBankingRequest>,
) -> Result<Json<DecisionResponse>, ApiError> {
    let start = Instant::now();
    let decision = checks::evaluate_open_banking(req.is_connected);
    complete_check(&state, Endpoint::OpenBanking, decision, start)
}

/// SME risk decision over the rule table.
async fn handle_sme_risk(
    State(state): State<Arc<AppState>>,
    JsonBody(raw): JsonBody<Value>,
) -> Result<Json<SmeRiskResponse>, ApiError> {
    let start = Instant::now();

    let decision = state.engine.evaluate_raw(&raw).map_err(|e| {
        state.metrics.record_validation_error();
        warn!(field = e.field().unwrap_or("-"), error = %e, "Rejected SME risk request");
        e
    })?;

    state
        .metrics
        .record_sme_evaluation(&decision, state.engine.ruleset().len());
    check_latency(&state, Endpoint::SmeRisk, start);

    let outcome = decision.decision;
    let primary_rule = decision.primary_rule;
    let fired = decision.fired_rules.len();
    let response = SmeRiskResponse::assemble(decision).map_err(|v| {
        state.metrics.record_outcome_violation();
        v
    })?;
    state.metrics.record_decision(outcome);

    info!(
        endpoint = Endpoint::SmeRisk.path(),
        decision = %outcome,
        confidence = response.confidence,
        primary_rule = primary_rule.map(|r| r.get()),
        fired_rules = fired,
        latency_ms = start.elapsed().as_millis() as u64,
        "Decision completed"
    );
    Ok(Json(response))
}

/// Underwriter schema in staging; an opaque fallback in production.
async fn handle_underwriter_schema(State(state): State<Arc<AppState>>) -> Response {
    if state.environment.is_production() {
        let fallback = ProductionFallback::new(state.public_domain.clone());
        info!(action_id = %fallback.action_id, "Underwriter schema withheld in production");
        return Json(fallback).into_response();
    }

    Json(UnderwriterSchema::build(state.engine.ruleset(), Utc::now())).into_response()
}

fn narrative_service(state: &AppState) -> Result<&NarrativeService, ApiError> {
    state
        .narrative
        .as_ref()
        .ok_or(ApiError::Narrative(NarrativeError::NotConfigured))
}

async fn handle_generate_narrative(
    State(state): State<Arc<AppState>>,
    JsonBody(decision): JsonBody<EvaluationDecision>,
) -> Result<Json<NarrativeResponse>, ApiError> {
    let narrative = narrative_service(&state)?.generate(&decision).await?;
    Ok(Json(NarrativeResponse { narrative }))
}

async fn handle_check_narrative(
    State(state): State<Arc<AppState>>,
    JsonBody(req): JsonBody<CheckNarrativeRequest>,
) -> Result<Json<CheckResponse>, ApiError> {
    let outcome = narrative_service(&state)?
        .check(&req.narrative, &req.evaluation_decision)
        .await?;
    Ok(Json(CheckResponse {
        result: outcome.result,
        consistent: outcome.consistent,
    }))
}

async fn handle_generate_and_verify(
    State(state): State<Arc<AppState>>,
    JsonBody(decision): JsonBody<EvaluationDecision>,
) -> Result<Json<VerifiedNarrativeResponse>, ApiError> {
    let outcome = narrative_service(&state)?
        .generate_and_verify(&decision)
        .await?;
    Ok(Json(VerifiedNarrativeResponse {
        narrative: outcome.narrative,
        verified: outcome.verified,
        attempts: outcome.attempts,
    }))
}

/// Health check endpoint.
async fn handle_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        rule_version: state.engine.ruleset().policy_version().to_string(),
        environment: state.environment.as_str(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Readiness check endpoint.
async fn handle_ready(State(state): State<Arc<AppState>>) -> Response {
    let ruleset = state.engine.ruleset();

    if ruleset.is_empty() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("No rules loaded", "NOT_READY")),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            rule_version: ruleset.policy_version().to_string(),
            rules: ruleset.len(),
            narrative_enabled: state.narrative.is_some(),
        }),
    )
        .into_response()
}

/// Metrics endpoint (Prometheus format).
async fn handle_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = format!(
        r#"# HELP loaneval_uptime_seconds Application uptime in seconds
# TYPE loaneval_uptime_seconds counter
loaneval_uptime_seconds {}

# HELP loaneval_rules Number of rules loaded
# TYPE loaneval_rules gauge
loaneval_rules {}

{}"#,
        state.start_time.elapsed().as_secs(),
        state.engine.ruleset().len(),
        state.metrics.to_prometheus(),
    );

    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; charset=utf-8",
        )],
        metrics,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decision, LendingPolicy};
    use crate::narrative::{NarrativeClient, ScriptedClient};
    use crate::rules::RuleSet;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    const KEY: &str = "test-key";

    /// Narrative backend that never answers.
    struct StalledClient;

    #[async_trait::async_trait]
    impl NarrativeClient for StalledClient {
        async fn complete(&self, _prompt: &str) -> Result<String, NarrativeError> {
            std::future::pending().await
        }

        fn name(&self) -> &str {
            "stalled"
        }
    }

    fn test_app_state(
        environment: Environment,
        narrative: Option<Arc<ScriptedClient>>,
    ) -> Arc<AppState> {
        let narrative = narrative.map(|client| client as Arc<dyn NarrativeClient>);
        Arc::new(build_state(environment, narrative, 16))
    }

    fn build_state(
        environment: Environment,
        narrative: Option<Arc<dyn NarrativeClient>>,
        max_concurrency: usize,
    ) -> AppState {
        crate::observability::tracing::init_test_tracing();
        let ruleset = Arc::new(RuleSet::from_policy(&LendingPolicy::default()).unwrap());
        let metrics = Arc::new(MetricsRegistry::new());
        let narrative = narrative
            .map(|client| NarrativeService::new(client, ruleset.clone(), metrics.clone(), 2));

        AppState {
            engine: DecisionEngine::new(ruleset),
            narrative,
            metrics,
            environment,
            public_domain: "loans.example.com".to_string(),
            api_key: Some(KEY.to_string()),
            start_time: Instant::now(),
            version: "0.1.0-test".to_string(),
            latency_budget_ms: 100,
            request_timeout: Duration::from_secs(5),
            max_concurrency,
        }
    }

    fn app() -> Router {
        create_router(test_app_state(Environment::Staging, None))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-api-key", KEY)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_key(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("x-api-key", KEY)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn sme_body() -> Value {
        json!({
            "smeProfile": "EB",
            "riskProfile": "T1",
            "stressedDSCR": 1.5,
            "loanAmount": 100000,
            "loanType": "unsecured"
        })
    }

    #[tokio::test]
    async fn test_health_endpoint_is_open() {
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rule_version"], "3.0");
        assert_eq!(body["environment"], "staging");
    }

    #[tokio::test]
    async fn test_ready_reports_rule_count() {
        let request = Request::builder()
            .uri("/ready")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rules"], 68);
        assert_eq!(body["narrative_enabled"], false);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_unauthorized() {
        let request = Request::builder()
            .method("POST")
            .uri("/evaluate/sme-risk")
            .header("content-type", "application/json")
            .body(Body::from(sme_body().to_string()))
            .unwrap();

        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_sme_risk_pass() {
        let (status, body) = send(app(), post_json("/evaluate/sme-risk", sme_body())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["decision"], "PASS");
        assert_eq!(body["rule_version"], "3.0");
        assert!(body["confidence"].as_f64().unwrap() <= 1.0);
        assert!(!body["fired_rules"].as_array().unwrap().is_empty());
        assert!(body["assessment"].is_object());
    }

    #[tokio::test]
    async fn test_sme_risk_stressed_startup_never_passes() {
        let body = json!({
            "smeProfile": "SU",
            "riskProfile": "T3",
            "stressedDSCR": 0.8,
            "loanAmount": 50000,
            "loanType": "unsecured"
        });

        let (status, body) = send(app(), post_json("/evaluate/sme-risk", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["decision"] == "FAIL" || body["decision"] == "FLAG/UW");
    }

    #[tokio::test]
    async fn test_sme_risk_validation_error_names_field() {
        let mut body = sme_body();
        body["loanType"] = json!("overdraft");

        let state = test_app_state(Environment::Staging, None);
        let (status, body) =
            send(create_router(state.clone()), post_json("/evaluate/sme-risk", body)).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "loanType");
        assert_eq!(
            state
                .metrics
                .validation_errors_total
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/evaluate/borrower-type")
            .header("content-type", "application/json")
            .header("x-api-key", KEY)
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_borrower_type() {
        let (_, accepted) = send(
            app(),
            post_json("/evaluate/borrower-type", json!({ "borrower_type": "LTD" })),
        )
        .await;
        let (_, declined) = send(
            app(),
            post_json("/evaluate/borrower-type", json!({ "borrower_type": "Partnership" })),
        )
        .await;

        assert_eq!(accepted["decision"], "PASS");
        assert_eq!(accepted["confidence"], 0.95);
        assert_eq!(declined["decision"], "FAIL");
        assert_eq!(declined["confidence"], 0.99);
    }

    #[tokio::test]
    async fn test_unverified_borrower_is_conditional() {
        let (_, id) = send(
            app(),
            post_json("/evaluate/borrower-id", json!({ "is_verified": false })),
        )
        .await;
        let (_, banking) = send(
            app(),
            post_json("/evaluate/open-banking", json!({ "is_connected": false })),
        )
        .await;

        assert_eq!(id["decision"], "CONDITIONAL_PASS");
        assert_eq!(banking["decision"], "CONDITIONAL_PASS");
    }

    #[tokio::test]
    async fn test_strong_application_passes_every_check() {
        let requests = [
            post_json("/evaluate/borrower-type", json!({ "borrower_type": "LTD" })),
            post_json("/evaluate/borrower-id", json!({ "is_verified": true })),
            post_json("/evaluate/open-banking", json!({ "is_connected": true })),
            post_json("/evaluate/sme-risk", sme_body()),
        ];

        for request in requests {
            let (status, body) = send(app(), request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["decision"], "PASS");
        }
    }

    #[tokio::test]
    async fn test_underwriter_schema_in_staging() {
        let (status, body) = send(app(), get_with_key("/underwriter-schema")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["version"], "3.0");
        assert_eq!(body["audit_and_versioning"]["rule_version"], "3.0");
        assert_eq!(body["rules"].as_array().unwrap().len(), 68);
    }

    #[tokio::test]
    async fn test_underwriter_schema_withheld_in_production() {
        let app = create_router(test_app_state(Environment::Production, None));

        let (status, body) = send(app, get_with_key("/underwriter-schema")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["function_name"], "getUnderwriterSchema");
        assert_eq!(body["domain"], "loans.example.com");
        assert!(body["action_id"].is_string());
        assert!(body.get("rules").is_none());
    }

    #[tokio::test]
    async fn test_narrative_unavailable_without_client() {
        let decision = json!({ "decision": "PASS", "confidence": 0.9, "explanation": "ok" });

        let (status, body) = send(app(), post_json("/generate-narrative", decision)).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "NARRATIVE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn test_generate_and_verify_narrative() {
        let client = Arc::new(ScriptedClient::replying([
            "The application passed comfortably.",
            "No contradictions found.",
        ]));
        let app = create_router(test_app_state(Environment::Staging, Some(client)));
        let decision = json!({ "decision": "PASS", "confidence": 0.9, "explanation": "ok" });

        let (status, body) =
            send(app, post_json("/generate-and-verify-narrative", decision)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["narrative"], "The application passed comfortably.");
        assert_eq!(body["verified"], true);
        assert_eq!(body["attempts"], 1);
    }

    #[tokio::test]
    async fn test_check_narrative() {
        let client = Arc::new(ScriptedClient::replying(["Confidence is misreported."]));
        let app = create_router(test_app_state(Environment::Staging, Some(client)));
        let body = json!({
            "narrative": "Declined.",
            "evaluation_decision": { "decision": "PASS", "confidence": 0.9, "explanation": "ok" }
        });

        let (status, body) = send(app, post_json("/check-narrative", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["consistent"], false);
        assert_eq!(body["result"], "Confidence is misreported.");
    }

    #[tokio::test]
    async fn test_narrative_failure_is_bad_gateway() {
        let client = Arc::new(ScriptedClient::new([Err(NarrativeError::Api {
            status: 429,
            body: "rate limited".to_string(),
        })]));
        let app = create_router(test_app_state(Environment::Staging, Some(client)));
        let decision = json!({ "decision": "FAIL", "confidence": 0.99, "explanation": "declined" });

        let (status, body) = send(app, post_json("/generate-narrative", decision)).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "NARRATIVE_FAILED");
    }

    #[tokio::test]
    async fn test_metrics_after_decision() {
        let state = test_app_state(Environment::Staging, None);
        send(
            create_router(state.clone()),
            post_json("/evaluate/sme-risk", sme_body()),
        )
        .await;

        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = create_router(state).oneshot(request).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let text = String::from_utf8(bytes.to_vec()).unwrap();

        assert!(text.contains("loaneval_rules 68"));
        assert!(text.contains("loaneval_decisions_total 1"));
        assert!(text.contains("loaneval_decisions{outcome=\"pass\"} 1"));
        assert!(text.contains("loaneval_evaluations{family=\"sme_risk\"} 1"));
    }

    #[tokio::test]
    async fn test_concurrency_limit_spans_all_routes() {
        let state = build_state(Environment::Staging, Some(Arc::new(StalledClient)), 1);
        let app = create_router(Arc::new(state));
        let decision = json!({ "decision": "PASS", "confidence": 0.9, "explanation": "ok" });
        let health = || {
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap()
        };

        // Holds the only permit until aborted
        let held = tokio::spawn(
            app.clone()
                .oneshot(post_json("/generate-narrative", decision)),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;

        let waiting =
            tokio::time::timeout(Duration::from_millis(200), app.clone().oneshot(health())).await;
        assert!(waiting.is_err(), "a different route bypassed the limit");

        held.abort();
        let _ = held.await;

        let response = tokio::time::timeout(Duration::from_secs(2), app.oneshot(health()))
            .await
            .expect("permit released")
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_decision_enum_matches_wire() {
        assert_eq!(
            serde_json::to_value(Decision::ConditionalPass).unwrap(),
            "CONDITIONAL_PASS"
        );
    }
}
