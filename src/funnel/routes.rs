//! REST and WebSocket endpoints for the chat funnel.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message as WsFrame, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, FunnelError};

use super::events::FunnelEvent;
use super::manager::FunnelManager;
use super::model::ProfileUpdate;
use super::state::ConversationStep;

/// Shown to the prospect when the payment provider call fails.
const CHECKOUT_RETRY_MESSAGE: &str = "Betaling kon niet worden gestart, probeer het opnieuw.";

/// Shared state for funnel routes.
#[derive(Clone)]
pub struct FunnelRouteState {
    pub manager: Arc<FunnelManager>,
}

#[derive(Debug, Deserialize)]
struct StepRequest {
    step: ConversationStep,
}

#[derive(Debug, Deserialize)]
struct MessageRequest {
    content: String,
}

/// Message from a chat widget over the WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Message { content: String },
}

/// Build the funnel REST + WebSocket routes.
pub fn funnel_routes(state: FunnelRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat/sessions", post(create_session))
        .route("/api/chat/sessions/{id}", get(get_session))
        .route("/api/chat/sessions/{id}/profile", patch(update_profile))
        .route("/api/chat/sessions/{id}/step", post(set_step))
        .route("/api/chat/sessions/{id}/advance", post(advance))
        .route("/api/chat/sessions/{id}/messages", post(add_message))
        .route("/api/chat/sessions/{id}/clear", post(clear))
        .route("/api/chat/sessions/{id}/recommendation", get(recommendation))
        .route("/api/chat/sessions/{id}/checkout", post(checkout))
        .route("/ws/chat/{id}", get(ws_handler))
        .with_state(state)
}

/// Map a funnel error onto an HTTP response.
fn error_response(err: FunnelError) -> Response {
    let (status, body) = match &err {
        FunnelError::SessionNotFound(_) => (
            StatusCode::NOT_FOUND,
            serde_json::json!({"error": err.to_string()}),
        ),
        FunnelError::Validation(v) | FunnelError::Checkout(CheckoutError::Validation(v)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            serde_json::json!({"error": v.to_string(), "retryable": false}),
        ),
        FunnelError::Checkout(CheckoutError::NotConfigured) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({"error": "Betalen is tijdelijk niet beschikbaar.", "retryable": false}),
        ),
        FunnelError::Checkout(e) => (
            StatusCode::BAD_GATEWAY,
            serde_json::json!({"error": CHECKOUT_RETRY_MESSAGE, "retryable": e.is_retryable()}),
        ),
    };
    (status, Json(body)).into_response()
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

// ── Sessions ────────────────────────────────────────────────────────────

/// POST /api/chat/sessions
async fn create_session(State(state): State<FunnelRouteState>) -> impl IntoResponse {
    let view = state.manager.create_session().await;
    (StatusCode::CREATED, Json(view))
}

/// GET /api/chat/sessions/{id}
///
/// Restores the conversation from its slot if needed. An unknown id gets a
/// fresh conversation, so clients must adopt the returned `conversationId`.
async fn get_session(
    State(state): State<FunnelRouteState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    Json(state.manager.resume(id).await)
}

/// PATCH /api/chat/sessions/{id}/profile
async fn update_profile(
    State(state): State<FunnelRouteState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    match state.manager.update_profile(id, update).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/chat/sessions/{id}/step
async fn set_step(
    State(state): State<FunnelRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StepRequest>,
) -> Response {
    match state.manager.set_step(id, body.step).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/chat/sessions/{id}/advance
async fn advance(State(state): State<FunnelRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.advance(id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/chat/sessions/{id}/messages
async fn add_message(
    State(state): State<FunnelRouteState>,
    Path(id): Path<Uuid>,
    Json(body): Json<MessageRequest>,
) -> Response {
    if body.content.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "content must not be empty"})),
        )
            .into_response();
    }
    match state.manager.add_user_message(id, body.content).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/chat/sessions/{id}/clear
async fn clear(State(state): State<FunnelRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.clear(id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/chat/sessions/{id}/recommendation
async fn recommendation(State(state): State<FunnelRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.recommendation(id).await {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/chat/sessions/{id}/checkout
///
/// Returns `{sessionId, url}`. Provider failures answer 502 with
/// `retryable: true`; the conversation is left as it was.
async fn checkout(State(state): State<FunnelRouteState>, Path(id): Path<Uuid>) -> Response {
    match state.manager.start_checkout(id).await {
        Ok(session) => Json(session).into_response(),
        Err(e) => error_response(e),
    }
}

// ── WebSocket ───────────────────────────────────────────────────────────

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<FunnelRouteState>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    info!(conversation_id = %id, "Chat WebSocket connecting");
    ws.on_upgrade(move |socket| handle_socket(socket, state.manager, id))
}

async fn handle_socket(mut socket: WebSocket, manager: Arc<FunnelManager>, mut id: Uuid) {
    // Subscribe before the sync so no event falls in between.
    let mut rx = manager.subscribe();

    let sync = match manager.view(id).await {
        Ok(session) => FunnelEvent::SessionSync { session },
        Err(e) => {
            debug!(conversation_id = %id, "Closing WebSocket: {}", e);
            let _ = socket.send(WsFrame::Close(None)).await;
            return;
        }
    };
    if let Ok(json) = serde_json::to_string(&sync) {
        if socket.send(WsFrame::Text(json.into())).await.is_err() {
            warn!("Failed to send initial sync, client disconnected");
            return;
        }
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !event.concerns(id) {
                            continue;
                        }
                        if let FunnelEvent::SessionCleared { conversation_id, .. } = &event {
                            id = *conversation_id;
                        }
                        if let Ok(json) = serde_json::to_string(&event) {
                            if socket.send(WsFrame::Text(json.into())).await.is_err() {
                                debug!("Client disconnected during send");
                                break;
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "WS client lagged behind broadcast");
                        if let Ok(session) = manager.view(id).await {
                            let sync = FunnelEvent::SessionSync { session };
                            if let Ok(json) = serde_json::to_string(&sync) {
                                if socket.send(WsFrame::Text(json.into())).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        debug!("Broadcast channel closed");
                        break;
                    }
                }
            }

            result = socket.recv() => {
                match result {
                    Some(Ok(WsFrame::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Message { content }) => {
                                if content.trim().is_empty() {
                                    continue;
                                }
                                if let Err(e) = manager.add_user_message(id, content).await {
                                    warn!(conversation_id = %id, "Failed to append WS message: {}", e);
                                }
                            }
                            Err(e) => {
                                debug!("Ignoring malformed WS message: {}", e);
                            }
                        }
                    }
                    Some(Ok(WsFrame::Close(_))) | None => {
                        debug!(conversation_id = %id, "Chat WebSocket closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!("WebSocket error: {}", e);
                        break;
                    }
                }
            }
        }
    }
}
