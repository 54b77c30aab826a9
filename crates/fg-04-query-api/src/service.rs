//! HTTP service: axum router, JSON-RPC dispatch and health endpoint.

use crate::domain::config::QueryApiConfig;
use crate::domain::error::ApiError;
use crate::domain::methods::RpcMethod;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use fg_03_finality::FinalityQueryApi;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Application state shared across handlers
#[derive(Clone)]
struct AppState {
    api: Arc<dyn FinalityQueryApi>,
    max_batch_size: usize,
}

/// Build the query router over `api`.
pub fn build_router(api: Arc<dyn FinalityQueryApi>, config: &QueryApiConfig) -> Router {
    let state = AppState {
        api,
        max_batch_size: config.max_batch_size,
    };

    Router::new()
        .route("/", post(handle_json_rpc))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
}

fn error_response(id: Value, error: ApiError) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": error,
        "id": id
    })
}

/// Handle JSON-RPC request
async fn handle_json_rpc(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let request: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(error_response(Value::Null, ApiError::parse_error(e.to_string()))),
            );
        }
    };

    let response = match request {
        Value::Array(requests) if requests.is_empty() => {
            error_response(Value::Null, ApiError::invalid_request("empty batch"))
        }
        Value::Array(requests) if requests.len() > state.max_batch_size => error_response(
            Value::Null,
            ApiError::limit_exceeded(format!("batch of {} requests", requests.len()))
                .with_data(json!({ "max_batch_size": state.max_batch_size })),
        ),
        Value::Array(requests) => {
            let mut responses = Vec::with_capacity(requests.len());
            for req in &requests {
                responses.push(process_single_request(&state, req).await);
            }
            Value::Array(responses)
        }
        single => process_single_request(&state, &single).await,
    };

    (StatusCode::OK, Json(response))
}

/// Extract the request id to echo back.
fn parse_id(object: &Map<String, Value>) -> Result<Value, ApiError> {
    // Notifications (no id) get no result in JSON-RPC; we require an id.
    let id = object.get("id").cloned().unwrap_or(Value::Null);
    match &id {
        Value::Number(_) => Ok(id),
        Value::String(s) if s.is_empty() => Err(ApiError::invalid_request("empty string id")),
        Value::String(s) if s.len() > 256 => {
            Err(ApiError::invalid_request("id string too long (max 256 chars)"))
        }
        Value::String(_) => Ok(id),
        Value::Null => Err(ApiError::invalid_request(
            "null id (notifications not supported)",
        )),
        _ => Err(ApiError::invalid_request("id must be string or number")),
    }
}

/// Process a single JSON-RPC request
async fn process_single_request(state: &AppState, request: &Value) -> Value {
    let Some(object) = request.as_object() else {
        return error_response(Value::Null, ApiError::invalid_request("request must be an object"));
    };
    let id = match parse_id(object) {
        Ok(id) => id,
        Err(e) => return error_response(Value::Null, e),
    };
    if object.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return error_response(id, ApiError::invalid_request("jsonrpc must be \"2.0\""));
    }

    let Some(method) = request.get("method").and_then(Value::as_str) else {
        return error_response(id, ApiError::invalid_request("missing method"));
    };
    let params = request.get("params");

    match route_method(state, method, params).await {
        Ok(result) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result
        }),
        Err(e) => {
            debug!(method, code = e.code, "JSON-RPC error: {}", e.message);
            error_response(id, e)
        }
    }
}

/// Route JSON-RPC method to its handler.
async fn route_method(
    state: &AppState,
    method: &str,
    params: Option<&Value>,
) -> Result<Value, ApiError> {
    let Some(rpc_method) = RpcMethod::from_name(method) else {
        return Err(ApiError::method_not_found(method));
    };

    match rpc_method {
        RpcMethod::IsBlockFinalizedByHeight => {
            let height: u64 = parse_param(params, 0)?;
            let finalized = state.api.is_block_finalized_by_height(height).await?;
            Ok(json!(finalized))
        }
        RpcMethod::IsBlockFinalizedByHash => {
            let hash: String = parse_param(params, 0)?;
            let finalized = state.api.is_block_finalized_by_hash(&hash).await?;
            Ok(json!(finalized))
        }
        RpcMethod::LatestFinalizedBlock => {
            let block = state.api.latest_finalized_block().await?;
            serde_json::to_value(block).map_err(|e| ApiError::internal(e.to_string()))
        }
        RpcMethod::ActivatedTimestamp => {
            let timestamp = state.api.activated_timestamp().await?;
            Ok(json!(timestamp))
        }
    }
}

/// Parse a required parameter from JSON-RPC params array.
fn parse_param<T: serde::de::DeserializeOwned>(
    params: Option<&Value>,
    index: usize,
) -> Result<T, ApiError> {
    let param = params
        .and_then(|p| {
            if p.is_array() {
                p.get(index)
            } else if index == 0 {
                Some(p)
            } else {
                None
            }
        })
        .ok_or_else(|| ApiError::invalid_params(format!("missing parameter at index {}", index)))?;

    serde_json::from_value(param.clone())
        .map_err(|e| ApiError::invalid_params(format!("invalid parameter at index {}: {}", index, e)))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "finality-query-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
