//! Liveness and readiness endpoints.

use crate::config::{AppConfig, HealthConfig};
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use identity_mcp_core::ClaimClient;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SELF_CHECK: &str = "self";
pub const CLAIM_API_CHECK: &str = "claim-api";

/// Ordered from best to worst so the overall status is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn http_status(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub description: Option<String>,
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl HealthCheckResult {
    pub fn healthy(description: Option<&str>) -> Self {
        Self {
            status: HealthStatus::Healthy,
            description: description.map(str::to_string),
            data: Default::default(),
        }
    }

    pub fn unhealthy(description: &str) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            description: Some(description.to_string()),
            data: Default::default(),
        }
    }
}

#[async_trait::async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> HealthCheckResult;
}

/// The process is up
pub struct SelfCheck;

#[async_trait::async_trait]
impl HealthCheck for SelfCheck {
    async fn check(&self) -> HealthCheckResult {
        HealthCheckResult::healthy(None)
    }
}

/// The identity store answers a claims info request
pub struct ClaimApiCheck {
    client: Arc<dyn ClaimClient>,
}

impl ClaimApiCheck {
    pub fn new(client: Arc<dyn ClaimClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HealthCheck for ClaimApiCheck {
    async fn check(&self) -> HealthCheckResult {
        match self.client.claims_info().await {
            Ok(Some(_)) => HealthCheckResult::healthy(Some("Claim API is reachable.")),
            Ok(None) => HealthCheckResult::unhealthy("Claim API returned null info."),
            Err(e) => {
                tracing::error!(error = %format!("{e:#}"), "Claim API health check failed");
                let mut result = HealthCheckResult::unhealthy("Claim API is unreachable.");
                result
                    .data
                    .insert("error".to_string(), serde_json::Value::String(format!("{e:#}")));
                result
            }
        }
    }
}

/// JSON body of both health endpoints
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub version: String,
    pub client_id: String,
    pub results: BTreeMap<String, HealthCheckResult>,
}

/// Named health checks plus the identity reported alongside them
pub struct HealthChecks {
    checks: Vec<(String, Arc<dyn HealthCheck>)>,
    version: String,
    client_id: String,
}

impl HealthChecks {
    pub fn new(app: &AppConfig) -> Self {
        Self {
            checks: Vec::new(),
            version: app.version.clone(),
            client_id: app.client_id.clone(),
        }
    }

    /// `self` and `claim-api`
    pub fn standard(app: &AppConfig, client: Arc<dyn ClaimClient>) -> Self {
        Self::new(app)
            .with_check(CLAIM_API_CHECK, Arc::new(ClaimApiCheck::new(client)))
            .with_check(SELF_CHECK, Arc::new(SelfCheck))
    }

    pub fn with_check(mut self, name: impl Into<String>, check: Arc<dyn HealthCheck>) -> Self {
        self.checks.push((name.into(), check));
        self
    }

    /// Run the checks whose name passes `predicate`, concurrently.
    pub async fn report<F>(&self, predicate: F) -> HealthReport
    where
        F: Fn(&str) -> bool,
    {
        let selected: Vec<_> = self
            .checks
            .iter()
            .filter(|(name, _)| predicate(name))
            .collect();

        let outcomes =
            futures::future::join_all(selected.iter().map(|(_, check)| check.check())).await;

        let results: BTreeMap<String, HealthCheckResult> = selected
            .iter()
            .map(|(name, _)| name.clone())
            .zip(outcomes)
            .collect();

        let status = results
            .values()
            .map(|r| r.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        HealthReport {
            status,
            version: self.version.clone(),
            client_id: self.client_id.clone(),
            results,
        }
    }
}

/// Health routes, or an empty router when health is disabled
pub fn router(config: &HealthConfig, checks: Arc<HealthChecks>) -> Router {
    if !config.enabled {
        return Router::new();
    }

    let live_route = config.live_route();
    let ready_route = config.ready_route();

    let router = Router::new().route(&live_route, get(live));
    let router = if ready_route == live_route {
        tracing::warn!(path = %ready_route, "Readiness shares the liveness path, serving liveness only");
        router
    } else {
        router.route(&ready_route, get(ready))
    };

    router.with_state(checks)
}

async fn live(State(checks): State<Arc<HealthChecks>>) -> (StatusCode, Json<HealthReport>) {
    respond(checks.report(|name| name.contains(SELF_CHECK)).await)
}

async fn ready(State(checks): State<Arc<HealthChecks>>) -> (StatusCode, Json<HealthReport>) {
    respond(checks.report(|_| true).await)
}

fn respond(report: HealthReport) -> (StatusCode, Json<HealthReport>) {
    (report.status.http_status(), Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use axum::body::Body;
    use axum::http::Request;
    use identity_mcp_core::{Claim, ClaimId, ClaimsInfo, ClaimsQuery};
    use tower::ServiceExt; // for `oneshot`

    /// Identity store stub that only answers claims info
    struct InfoOnly(Option<anyhow::Result<Option<ClaimsInfo>>>);

    #[async_trait::async_trait]
    impl ClaimClient for InfoOnly {
        async fn claims_info(&self) -> anyhow::Result<Option<ClaimsInfo>> {
            match &self.0 {
                Some(Ok(info)) => Ok(*info),
                _ => Err(anyhow!("connection refused")),
            }
        }

        async fn load_claims(&self, _: &ClaimsQuery) -> anyhow::Result<Option<Vec<Claim>>> {
            Ok(None)
        }

        async fn load_claim(&self, _: &ClaimId) -> anyhow::Result<Option<Claim>> {
            Ok(None)
        }

        async fn create_claim(&self, _: &Claim) -> anyhow::Result<Option<Claim>> {
            Ok(None)
        }

        async fn update_claim(&self, _: &ClaimId, _: &Claim) -> anyhow::Result<Option<Claim>> {
            Ok(None)
        }

        async fn delete_claim(&self, _: &ClaimId) -> anyhow::Result<Option<Claim>> {
            Ok(None)
        }
    }

    fn checks(answer: Option<anyhow::Result<Option<ClaimsInfo>>>) -> Arc<HealthChecks> {
        let app = AppConfig {
            version: "1.0.0".to_string(),
            client_id: "identity-mcp".to_string(),
            ..Default::default()
        };
        Arc::new(HealthChecks::standard(&app, Arc::new(InfoOnly(answer))))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null))
    }

    #[tokio::test]
    async fn test_ready_when_store_reachable() {
        let app = router(
            &HealthConfig::default(),
            checks(Some(Ok(Some(ClaimsInfo { total_count: 3 })))),
        );
        let (status, body) = get_json(app, "/health/ready").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Healthy");
        assert_eq!(body["version"], "1.0.0");
        assert_eq!(body["clientId"], "identity-mcp");
        assert_eq!(body["results"]["claim-api"]["description"], "Claim API is reachable.");
        assert_eq!(body["results"]["self"]["status"], "Healthy");
    }

    #[tokio::test]
    async fn test_ready_unavailable_when_store_unreachable() {
        let app = router(&HealthConfig::default(), checks(None));
        let (status, body) = get_json(app, "/health/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "Unhealthy");
        assert_eq!(body["results"]["claim-api"]["description"], "Claim API is unreachable.");
    }

    #[tokio::test]
    async fn test_ready_unavailable_on_null_info() {
        let app = router(&HealthConfig::default(), checks(Some(Ok(None))));
        let (status, body) = get_json(app, "/health/ready").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body["results"]["claim-api"]["description"],
            "Claim API returned null info."
        );
    }

    #[tokio::test]
    async fn test_live_only_runs_self() {
        let app = router(&HealthConfig::default(), checks(None));
        let (status, body) = get_json(app, "/health/live").await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["results"].get("claim-api").is_none());
        assert_eq!(body["results"]["self"]["status"], "Healthy");
    }

    #[tokio::test]
    async fn test_disabled_health_is_not_found() {
        let config = HealthConfig {
            enabled: false,
            ..Default::default()
        };
        let (status, _) = get_json(router(&config, checks(None)), "/health/live").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_routes_use_normalized_paths() {
        let config = HealthConfig {
            live_path: "health/live/".to_string(),
            ready_path: "health/live".to_string(),
            ..Default::default()
        };
        let (status, body) = get_json(router(&config, checks(None)), "/health/live").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["results"]["self"]["status"], "Healthy");
    }

    #[test]
    fn test_overall_status_ordering() {
        assert!(HealthStatus::Unhealthy > HealthStatus::Degraded);
        assert_eq!(HealthStatus::Degraded.http_status(), StatusCode::OK);
    }
}
