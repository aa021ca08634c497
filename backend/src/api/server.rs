//! HTTP server for the offers API.
//!
//! Serves the JSON document produced by `convert` to authenticated clients.
//! The document is re-read on every request, so a new conversion is picked
//! up without a restart.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | POST   | `/auth/token`     | Exchange client credentials for a token  |
//! | GET    | `/api/offers`     | Offers, filtered by `filter[field]=value`|
//! | GET    | `/api/logs`       | SSE stream for real-time logs            |
//!
//! Both `/api` routes require `Authorization: Bearer <token>`.

use axum::{
    extract::{rejection::JsonRejection, Query, Request, State},
    http::{header, HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{sse::Event, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::auth::{bearer_token, TokenIssuer, CLIENT_NAME, TOKEN_TTL_SECS};
use super::logs::{log_error, log_info, log_success, LOG_BROADCASTER};
use super::offers::{filter_offers, load_offers, parse_filters, OffersResponse};
use crate::error::{ServerError, ServerResult};

/// Server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// JSON document to serve
    pub data_file: PathBuf,
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Accepted client id for `/auth/token`
    pub client_id: Option<String>,
    /// Accepted client secret for `/auth/token`
    pub client_secret: Option<String>,
}

impl ServerConfig {
    /// Returns an error when the signing secret is missing.
    pub fn check(&self) -> ServerResult<()> {
        if self.jwt_secret.is_empty() {
            return Err(ServerError::MissingConfig("JWT_SECRET"));
        }
        Ok(())
    }

    /// Both credentials configured and equal to the given ones.
    fn accepts(&self, client_id: Option<&str>, client_secret: Option<&str>) -> bool {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => {
                client_id == Some(id.as_str()) && client_secret == Some(secret.as_str())
            }
            _ => false,
        }
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
    tokens: Arc<TokenIssuer>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret);
        Self {
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }
}

/// Credentials posted to `/auth/token`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

/// Successful `/auth/token` response
#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/auth/token", post(issue_token))
        .route("/api/offers", get(list_offers))
        .route("/api/logs", get(sse_logs))
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(config: ServerConfig) -> ServerResult<()> {
    config.check()?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    log_success(format!("Server running on http://localhost:{}", config.port));
    log_info(format!("Serving {}", config.data_file.display()));
    log_info("POST /auth/token  - Get an access token");
    log_info("GET  /api/offers  - List offers (Bearer token)");
    log_info("GET  /api/logs    - SSE log stream (Bearer token)");
    log_info("GET  /health      - Health check");
    if config.client_id.is_none() || config.client_secret.is_none() {
        log_error("CLIENT_ID/CLIENT_SECRET not set: token requests will be refused");
    }

    let app = router(AppState::new(config));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log every request, with the parsed filters when present
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    log_info(format!("{} {}", method, uri));

    if uri.query().is_some() {
        let filters = parse_filters(&query_pairs(&uri));
        if !filters.is_empty() {
            let shown: Vec<String> = filters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            log_info(format!("Filters: {}", shown.join(", ")));
        }
    }

    next.run(request).await
}

/// Decode the query string into pairs, ignoring malformed input
fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map(|Query(pairs)| pairs)
        .unwrap_or_default()
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "offersheet",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "token": "POST /auth/token",
            "offers": "GET /api/offers",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// Exchange client credentials for an access token
pub async fn issue_token(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<Value>)> {
    let request = body.map(|Json(request)| request).unwrap_or_default();

    if !state
        .config
        .accepts(request.client_id.as_deref(), request.client_secret.as_deref())
    {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid credentials" })),
        ));
    }

    let access_token = state.tokens.issue(CLIENT_NAME).map_err(|e| {
        log_error(format!("Token error: {}", e));
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "message": "Cannot issue token" })),
        )
    })?;

    Ok(Json(TokenResponse {
        access_token,
        token_type: "Bearer",
        expires_in: TOKEN_TTL_SECS,
    }))
}

/// 401 without a bearer token, 403 when the token does not verify
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), StatusCode> {
    let token = bearer_token(headers).ok_or(StatusCode::UNAUTHORIZED)?;
    state.tokens.verify(token).map_err(|e| {
        log_error(format!("JWT Error: {}", e));
        StatusCode::FORBIDDEN
    })?;
    Ok(())
}

/// List offers matching `filter[field]=value` parameters
pub async fn list_offers(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Json<OffersResponse>, StatusCode> {
    authorize(&state, &headers)?;

    let filters = parse_filters(&query);
    let data_file = state.config.data_file.clone();
    let offers = tokio::task::spawn_blocking(move || load_offers(&data_file))
        .await
        .map_err(|e| {
            log_error(format!("Offers task failed: {}", e));
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
    let offers = filter_offers(offers, &filters);
    if !filters.is_empty() {
        log_info(format!("[FILTER] {} filter(s) | total: {}", filters.len(), offers.len()));
    }

    Ok(Json(OffersResponse::new(offers)))
}

/// SSE endpoint for real-time log streaming
pub async fn sse_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, StatusCode> {
    authorize(&state, &headers)?;
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Ok(Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
