//! Axum handlers for `/api/*` routes.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{Instrument, error, info_span, warn};
use uuid::Uuid;

use super::AppState;

const MESSAGE_REQUIRED: &str = "Message required";
const INTERNAL_ERROR: &str = "Erro interno no Bolota AI";

#[derive(Deserialize)]
pub(super) struct WebhookRequest {
    #[serde(default)]
    message: Option<Value>,
}

fn json_error(status: StatusCode, msg: &str) -> Response {
    (status, Json(json!({ "error": msg }))).into_response()
}

/// POST /api/webhook
pub(super) async fn webhook(
    State(state): State<AppState>,
    body: Result<Json<WebhookRequest>, JsonRejection>,
) -> Response {
    let request_id = Uuid::now_v7();
    let span = info_span!("webhook", %request_id);

    async move {
        let message = match body {
            Ok(Json(WebhookRequest { message: Some(Value::String(m)) })) if !m.trim().is_empty() => m,
            Ok(_) => return json_error(StatusCode::BAD_REQUEST, MESSAGE_REQUIRED),
            Err(rejection) => {
                warn!(error = %rejection, "rejected webhook body");
                return json_error(StatusCode::BAD_REQUEST, MESSAGE_REQUIRED);
            }
        };

        match state.chat.handle(&message).await {
            Ok(reply) => (StatusCode::OK, Json(json!({ "reply": reply.reply }))).into_response(),
            Err(e) => {
                error!(error = %e, "chat turn failed");
                json_error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR)
            }
        }
    }
    .instrument(span)
    .await
}

/// GET /api/health
pub(super) async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "bot_name": &*state.bot_name,
        "provider": state.chat.provider().name(),
        "model": &*state.model,
    }))
}
