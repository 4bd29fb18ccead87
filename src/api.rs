use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::{header, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{Transaction, TransactionPayload};
use crate::store::TransactionStore;

/// Shared handler state. The mutex serializes every store operation.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<TransactionStore>>,
    pub users: Arc<HashMap<String, String>>,
}

impl AppState {
    pub fn new(store: Arc<Mutex<TransactionStore>>, users: HashMap<String, String>) -> Self {
        Self {
            store,
            users: Arc::new(users),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, TransactionStore>, ApiError> {
        self.store
            .lock()
            .map_err(|_| ApiError::Internal("transaction store lock poisoned".to_string()))
    }
}

/// JSON body shared by every response
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl Envelope<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            count: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid JSON: {0}")]
    MalformedBody(String),

    #[error("Unauthorized - Invalid or missing credentials")]
    Unauthorized,

    #[error("Endpoint not found")]
    EndpointNotFound,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Store(StoreError::DuplicateId(_) | StoreError::IdsExhausted) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ApiError::Store(_) | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::EndpointNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(Envelope::failure(self.to_string()))).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            get(get_transaction).put(update_transaction).delete(delete_transaction),
        )
        .fallback(endpoint_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(cfg: Config, store: Arc<Mutex<TransactionStore>>) -> eyre::Result<()> {
    let app = router(AppState::new(store, cfg.users.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    info!("API listening on http://{}", addr);
    info!("  GET    /transactions       - List all");
    info!("  GET    /transactions/:id   - Get one");
    info!("  POST   /transactions       - Create new");
    info!("  PUT    /transactions/:id   - Update");
    info!("  DELETE /transactions/:id   - Delete");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

// ---------- auth ----------

async fn require_auth(State(state): State<AppState>, req: Request, next: Next) -> Result<Response, ApiError> {
    if !is_authorized(req.headers(), &state.users) {
        warn!("Rejected {} {}: bad or missing credentials", req.method(), req.uri().path());
        return Err(ApiError::Unauthorized);
    }
    Ok(next.run(req).await)
}

/// Check an `Authorization: Basic <base64(name:password)>` header
pub fn is_authorized(headers: &HeaderMap, users: &HashMap<String, String>) -> bool {
    let Some(value) = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let Some(("Basic", encoded)) = value.split_once(' ') else {
        return false;
    };
    let Some(decoded) = STANDARD
        .decode(encoded.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    match decoded.split_once(':') {
        Some((name, password)) => users.get(name).is_some_and(|expected| expected == password),
        None => false,
    }
}

// ---------- handlers ----------

async fn list_transactions(State(state): State<AppState>) -> Result<Json<Envelope<Vec<Transaction>>>, ApiError> {
    let store = state.store()?;
    let data: Vec<Transaction> = store.list().cloned().collect();
    let count = data.len();
    Ok(Json(Envelope::ok(data).with_count(count)))
}

async fn get_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Transaction>>, ApiError> {
    let store = state.store()?;
    let tx = store.get(&id)?.clone();
    Ok(Json(Envelope::ok(tx)))
}

async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Transaction>>), ApiError> {
    let Json(payload) = payload?;
    let tx = state.store()?.create(payload)?;
    info!("Created new transaction with ID: {}", tx.id);
    Ok((
        StatusCode::CREATED,
        Json(Envelope::ok(tx).with_message("Transaction created")),
    ))
}

async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TransactionPayload>, JsonRejection>,
) -> Result<Json<Envelope<Transaction>>, ApiError> {
    let Json(payload) = payload?;
    let tx = state.store()?.update(&id, payload)?;
    info!("Updated transaction {}", id);
    Ok(Json(Envelope::ok(tx).with_message("Transaction updated")))
}

async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Envelope<Transaction>>, ApiError> {
    let removed = state.store()?.delete(&id)?;
    info!("Deleted transaction {}", id);
    Ok(Json(
        Envelope::ok(removed).with_message(format!("Transaction {} deleted", id)),
    ))
}

async fn endpoint_not_found() -> ApiError {
    ApiError::EndpointNotFound
}
