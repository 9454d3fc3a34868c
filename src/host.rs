use std::future::Future;

use axum::{
    extract::{Json, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::capabilities::schema::prepare_args;
use crate::capabilities::CapabilitySet;
use crate::config::Config;
use crate::error::{CapabilityError, Result};
use crate::interfaces::capabilities::{Action, Invocation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub host: String,
    pub port: u16,
    /// Inbound requests must present this token when set.
    pub auth_token: Option<String>,
}

impl HostConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.bind_host().to_string(),
            port: config.bind_port(),
            auth_token: config.auth_token().map(str::to_string),
        }
    }
}

#[derive(Clone)]
pub struct HostState {
    pub capabilities: CapabilitySet,
    pub auth_token: Option<String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    capabilities: usize,
    version: String,
}

#[derive(Deserialize)]
struct ToolRequest {
    #[serde(default)]
    args: Value,
    #[serde(default)]
    action: Option<Action>,
}

#[derive(Serialize)]
struct ToolResponse {
    result: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

pub fn build_router(state: HostState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/capabilities", get(list_capabilities))
        .route("/tools/{name}", post(run_tool))
        .with_state(state)
}

async fn health(State(state): State<HostState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        capabilities: state.capabilities.len(),
        version: crate::VERSION.to_string(),
    })
}

async fn list_capabilities(State(state): State<HostState>, headers: HeaderMap) -> Response {
    if let Err(err) = authorize(&headers, state.auth_token.as_deref()) {
        return err;
    }
    Json(state.capabilities.describe()).into_response()
}

async fn run_tool(
    State(state): State<HostState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<ToolRequest>,
) -> Response {
    if let Err(err) = authorize(&headers, state.auth_token.as_deref()) {
        return err;
    }

    let Some(capability) = state.capabilities.get(&name) else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown capability: {name}"),
        );
    };

    let args = match prepare_args(&capability.schema(), payload.args) {
        Ok(args) => args,
        Err(violations) => {
            warn!(capability = %name, problems = %violations, "rejected invalid arguments");
            return error_response(StatusCode::BAD_REQUEST, violations.to_string());
        }
    };

    let invocation = Invocation {
        args,
        action: payload.action,
    };
    info!(
        capability = %name,
        workspace = ?invocation.workspace_id(),
        "dispatching capability"
    );
    let result = capability.run(invocation).await;
    (StatusCode::OK, Json(ToolResponse { result })).into_response()
}

fn authorize(headers: &HeaderMap, token: Option<&str>) -> std::result::Result<(), Response> {
    let Some(expected) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(());
    };

    let bearer = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();
    let api_key = headers
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default();

    if bearer == expected || api_key == expected {
        Ok(())
    } else {
        Err(error_response(
            StatusCode::UNAUTHORIZED,
            "Unauthorized".to_string(),
        ))
    }
}

/// Registers a capability set with the HTTP runtime and serves it.
pub struct CapabilityHost {
    config: HostConfig,
    capabilities: CapabilitySet,
}

impl CapabilityHost {
    pub fn new(config: HostConfig, capabilities: CapabilitySet) -> Self {
        Self {
            config,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn router(&self) -> Router {
        build_router(HostState {
            capabilities: self.capabilities.clone(),
            auth_token: self.config.auth_token.clone(),
        })
    }

    pub async fn start(self) -> Result<()> {
        self.start_with_shutdown(futures::future::pending::<()>())
            .await
    }

    pub async fn start_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| CapabilityError::Runtime(format!("failed to bind {addr}: {e}")))?;

        info!(
            addr = %addr,
            capabilities = ?self.capabilities.names(),
            "capability host listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| CapabilityError::Runtime(e.to_string()))?;

        Ok(())
    }
}
