use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;

use goalsmith_core::auth::{
    CredentialVerifier, DEFAULT_ROLE, FixedCredentialVerifier, hash_password,
};
use goalsmith_core::goal::{GOAL_FIELDS, REQUEST_FIELDS, missing_fields};
use goalsmith_core::store::{EchoGoalStore, GoalStore};
use goalsmith_core::synthesis::{GeminiConfig, GeminiGenerator};
use goalsmith_core::token::guard::{self, GuardError};
use goalsmith_core::token::{TokenClaims, TokenConfig, issue_token};
use goalsmith_core::{Goal, GoalRequest, GoalSynthesizer, PromptCatalog, UpdateRequest};

use crate::config::AppConfig;

const GENERATOR_UNAVAILABLE: &str =
    "SMART Goals Generator not initialized. Please check your Google API key configuration.";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    missing: Vec<String>,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            missing: Vec::new(),
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    /// 400 naming each missing field, in the order given.
    pub fn missing_fields(fields: &[&str]) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: format!("Missing required fields: {}", fields.join(", ")),
            missing: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn method_not_allowed(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, msg)
    }

    /// 500 with a caller-facing message. The cause is logged, not returned.
    pub fn internal(msg: impl Into<String>, err: anyhow::Error) -> Self {
        let message = msg.into();
        tracing::error!(error = %format!("{err:#}"), "{message}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = if self.missing.is_empty() {
            json!({ "error": self.message })
        } else {
            json!({ "error": self.message, "missing": self.missing })
        };
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Shared, immutable per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no API key is configured or the client failed to build.
    pub synthesizer: Option<Arc<GoalSynthesizer>>,
    pub catalog: Arc<PromptCatalog>,
    pub token_config: Arc<TokenConfig>,
    pub verifier: Arc<dyn CredentialVerifier>,
    pub store: Arc<dyn GoalStore>,
}

/// Load the prompt catalog: the configured file if any, else the embedded one.
pub fn load_catalog(config: &AppConfig) -> Result<Arc<PromptCatalog>> {
    let catalog = match &config.catalog_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "loading prompt catalog");
            PromptCatalog::load(path)?
        }
        None => PromptCatalog::bundled().context("embedded prompt catalog is invalid")?,
    };
    Ok(Arc::new(catalog))
}

/// Build the Gemini-backed synthesizer, or `None` when it cannot be used.
pub fn build_synthesizer(
    config: &AppConfig,
    catalog: Arc<PromptCatalog>,
) -> Option<Arc<GoalSynthesizer>> {
    let Some(api_key) = &config.api_key else {
        tracing::warn!("GEMINI_API_KEY not set; goal generation is unavailable");
        return None;
    };

    let mut gemini = GeminiConfig::new(api_key.clone());
    gemini.model = config.model.clone();
    match GeminiGenerator::new(gemini) {
        Ok(generator) => {
            tracing::info!(model = %generator.model(), "goal generator initialized");
            Some(Arc::new(GoalSynthesizer::new(
                Arc::new(generator),
                catalog,
                config.retry,
            )))
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to initialize goal generator");
            None
        }
    }
}

fn build_state(config: &AppConfig) -> Result<AppState> {
    let catalog = load_catalog(config)?;
    Ok(AppState {
        synthesizer: build_synthesizer(config, catalog.clone()),
        catalog,
        token_config: Arc::new(config.token_config()?.clone()),
        verifier: Arc::new(FixedCredentialVerifier::new(
            config.login_email.clone(),
            config.login_password.clone(),
        )),
        store: Arc::new(EchoGoalStore),
    })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/generate-smart-goals", post(generate_goals))
        .route("/api/save-user-goal", post(save_goal))
        .route("/api/edit-user-goal", post(edit_goal))
        .route("/api/protected", get(protected))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/password/hash", post(password_hash))
        .merge(protected)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(config: AppConfig) -> Result<()> {
    let state = build_state(&config)?;
    let app = build_router(state);
    let addr: SocketAddr = format!("{}:{}", config.bind, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.bind, config.port))?;
    tracing::info!("goalsmith serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("goalsmith serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Reject requests without a valid bearer token; otherwise expose the
/// token's claims to the handler as an extension.
async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let claims = guard::require_bearer(&state.token_config, header).map_err(|e| {
        match &e {
            GuardError::InvalidToken(cause) => {
                tracing::info!(path = %req.uri().path(), cause = %cause, "rejected token")
            }
            other => tracing::info!(path = %req.uri().path(), reason = %other, "rejected request"),
        }
        AppError::unauthorized(e.to_string())
    })?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

// ---------------------------------------------------------------------------
// Body helpers
// ---------------------------------------------------------------------------

/// Parse the request body as a JSON object regardless of content type.
fn json_object(body: &Bytes) -> Result<Value, AppError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| AppError::bad_request(format!("Failed to parse JSON: {e}")))?;
    if !value.is_object() {
        return Err(AppError::bad_request("No JSON data provided"));
    }
    Ok(value)
}

fn require_fields(body: &Value, required: &[&str]) -> Result<(), AppError> {
    let missing = missing_fields(body, required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::missing_fields(&missing))
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::bad_request(format!("Invalid request: {e}")))
}

fn str_field<'a>(body: &'a Value, name: &str) -> &'a str {
    body.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn not_found() -> AppError {
    AppError::not_found("Endpoint not found")
}

async fn method_not_allowed() -> AppError {
    AppError::method_not_allowed("Method not allowed")
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let generator_status = if state.synthesizer.is_some() {
        "initialized"
    } else {
        "failed"
    };
    Json(json!({
        "status": "healthy",
        "timestamp": timestamp(),
        "generator_status": generator_status,
    }))
}

async fn generate_goals(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let synthesizer = state
        .synthesizer
        .clone()
        .ok_or_else(|| AppError::internal(GENERATOR_UNAVAILABLE, anyhow::anyhow!("no generator")))?;

    let body = json_object(&body)?;
    require_fields(&body, &REQUEST_FIELDS)?;
    let request: GoalRequest = decode(body)?;

    let result = synthesizer.generate_goals(&request).await;
    let source = result.source();
    if let goalsmith_core::Synthesized::Fallback { reason, .. } = &result {
        tracing::warn!(%reason, "returning fallback goals");
    }
    let goals = result.into_value();
    tracing::info!(count = goals.len(), ?source, "goals generated");

    Ok(Json(json!({
        "success": true,
        "goals_count": goals.len(),
        "goals": goals,
        "timestamp": timestamp(),
        "source": source,
    }))
    .into_response())
}

async fn save_goal(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let body = json_object(&body)?;
    require_fields(&body, &GOAL_FIELDS)?;
    let goal: Goal = decode(body)?;

    let saved = state
        .store
        .save(goal)
        .await
        .map_err(|e| AppError::internal("Failed to save user goal", e))?;

    Ok(Json(json!({
        "success": true,
        "goal": saved,
        "message": "User goal saved successfully",
    }))
    .into_response())
}

async fn edit_goal(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let body = json_object(&body)?;
    let goal_value = body.get("goal").cloned().unwrap_or(Value::Null);
    require_fields(&goal_value, &GOAL_FIELDS)?;
    let goal: Goal = decode(goal_value)?;
    let request = UpdateRequest {
        goal,
        comment: str_field(&body, "comment").to_string(),
    };

    let synthesizer = state
        .synthesizer
        .clone()
        .ok_or_else(|| AppError::internal(GENERATOR_UNAVAILABLE, anyhow::anyhow!("no generator")))?;

    let result = synthesizer.update_goal(&request).await;
    let source = result.source();
    let updated = state
        .store
        .update(result.into_value())
        .await
        .map_err(|e| AppError::internal("Failed to update user goal", e))?;

    Ok(Json(json!({
        "success": true,
        "goal": updated,
        "message": "User goal updated successfully",
        "source": source,
    }))
    .into_response())
}

async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let body = json_object(&body)?;
    require_fields(&body, &["email", "password"])?;
    let email = str_field(&body, "email");
    tracing::info!(%email, "login attempt");

    let profile = state
        .verifier
        .verify(email, str_field(&body, "password"))
        .await
        .map_err(|e| AppError::internal("Authentication failed", e))?
        .ok_or_else(|| {
            tracing::info!(%email, "invalid credentials");
            AppError::unauthorized("Invalid email or password")
        })?;

    let claims = TokenClaims::new(&profile.email, &profile.name, DEFAULT_ROLE, Utc::now());
    let token = issue_token(&state.token_config, &claims)
        .map_err(|e| AppError::internal("Failed to issue token", e.into()))?;
    tracing::info!(email = %profile.email, "login succeeded");

    Ok(Json(json!({
        "token": token,
        "user": profile,
        "prompts": state.catalog.as_ref(),
    }))
    .into_response())
}

/// Hash a password off the async workers.
async fn hash_blocking(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::internal("Error hashing password", e.into()))?
        .map_err(|e| AppError::internal("Error hashing password", e.into()))
}

async fn register(body: Bytes) -> Result<Response, AppError> {
    let body = json_object(&body)?;
    require_fields(&body, &["email", "password"])?;
    let email = str_field(&body, "email").to_string();
    let name = str_field(&body, "name").to_string();

    // Not persisted: the hash only proves the password is acceptable.
    hash_blocking(str_field(&body, "password").to_string()).await?;
    tracing::info!(%email, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User registered successfully",
            "user": { "email": email, "name": name, "role": DEFAULT_ROLE },
        })),
    )
        .into_response())
}

async fn password_hash(body: Bytes) -> Result<Response, AppError> {
    let body = json_object(&body)?;
    require_fields(&body, &["password"])?;
    let hashed = hash_blocking(str_field(&body, "password").to_string()).await?;
    Ok(Json(json!({ "hashed_password": hashed })).into_response())
}

async fn protected(Extension(claims): Extension<TokenClaims>) -> Json<Value> {
    Json(json!({
        "message": format!("Welcome {}, you are authenticated!", claims.email),
        "user": claims,
        "timestamp": timestamp(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
