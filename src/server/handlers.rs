//! HTTP request handlers for the three boundary operations.

use crate::audio::AudioPayload;
use crate::error::{Stage, StageError, ToneTwistError};
use crate::persona::list_personas;
use crate::pipeline::Pipeline;
use axum::{
    Json,
    extract::{Multipart, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
}

/// Body of the enhance and synthesize routes.
#[derive(Debug, Default, Deserialize)]
pub struct StyleRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub transcription: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhanceResponse {
    pub enhanced_text: String,
}

/// Public persona listing entry. Voice ids and credential slots stay private.
#[derive(Debug, Serialize)]
pub struct StyleInfo {
    pub value: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub avatar: &'static str,
}

impl IntoResponse for StageError {
    fn into_response(self) -> Response {
        let body = self.to_response();
        let status =
            StatusCode::from_u16(body.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(body)).into_response()
    }
}

fn rejected(stage: Stage, message: impl Into<String>) -> StageError {
    StageError::new(stage, ToneTwistError::validation(message))
}

fn json_body(stage: Stage, body: Result<Json<StyleRequest>, JsonRejection>) -> Result<StyleRequest, StageError> {
    body.map(|Json(request)| request).map_err(|e| {
        tracing::debug!(error = %e.body_text(), "Rejected request body");
        rejected(stage, "Invalid JSON in request body.")
    })
}

/// POST /api/transcribe - multipart upload with a `file` field
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, StageError> {
    let mut payload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| rejected(Stage::Transcription, format!("Invalid upload: {}", e.body_text())))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            rejected(Stage::Transcription, format!("Invalid upload: {}", e.body_text()))
        })?;

        let mut audio = AudioPayload::new(bytes.to_vec(), filename);
        if let Some(content_type) = content_type {
            audio = audio.with_content_type(content_type);
        }
        payload = Some(audio);
        break;
    }

    let payload = payload.ok_or_else(|| rejected(Stage::Transcription, "No audio file provided."))?;
    let transcription = state.pipeline.transcribe(&payload).await?;

    Ok(Json(TranscribeResponse { transcription }))
}

/// POST /api/enhance - `{ text, style }` → `{ enhancedText }`
pub async fn enhance(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StyleRequest>, JsonRejection>,
) -> Result<Json<EnhanceResponse>, StageError> {
    let request = json_body(Stage::Enhancement, body)?;
    let text = request.text.unwrap_or_default();
    let style = request.style.unwrap_or_default();

    let enhanced_text = state.pipeline.enhance(&text, &style).await?;

    Ok(Json(EnhanceResponse { enhanced_text }))
}

/// POST /api/synthesize - `{ text, style }` → audio bytes
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StyleRequest>, JsonRejection>,
) -> Result<Response, StageError> {
    let request = json_body(Stage::Synthesis, body)?;
    let text = request.text.unwrap_or_default();
    let Some(style) = request.style.filter(|style| !style.trim().is_empty()) else {
        return Err(rejected(
            Stage::Synthesis,
            "Missing or invalid style in request body.",
        ));
    };

    let audio = state.pipeline.synthesize(&text, &style).await?;
    let length = audio.len();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, audio.content_type.to_string()),
            (header::CONTENT_LENGTH, length.to_string()),
        ],
        audio.bytes,
    )
        .into_response())
}

/// GET /api/styles - persona listing
pub async fn styles() -> Json<Vec<StyleInfo>> {
    Json(
        list_personas()
            .iter()
            .map(|persona| StyleInfo {
                value: persona.key,
                label: persona.label,
                description: persona.description,
                avatar: persona.avatar,
            })
            .collect(),
    )
}
