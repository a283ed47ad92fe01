//! Prediction handler

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::HeaderMap,
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::models::ScalingDirective;
use crate::render;
use crate::{AppError, AppResult, AppState};

/// Fields of the multipart upload
#[derive(Debug, Default)]
struct Upload {
    file: Option<Vec<u8>>,
    grams: Option<String>,
    mult: Option<String>,
}

/// Classify an uploaded image and estimate its nutrients
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    // Readiness is checked before the body is touched
    let predictor = state.predictor();
    predictor.ensure_ready()?;

    let multipart = multipart.map_err(|e| AppError::InvalidInput(e.body_text()))?;
    let upload = read_upload(multipart).await?;
    let directive = ScalingDirective::from_fields(upload.grams.as_deref(), upload.mult.as_deref());

    let outcome = tokio::task::spawn_blocking(move || {
        predictor.predict(upload.file.as_deref(), directive)
    })
    .await??;

    if super::wants_json(&headers) {
        Ok(Json(outcome).into_response())
    } else {
        Ok(Html(render::status_page(&state.page_context(), Some(&outcome))).into_response())
    }
}

async fn read_upload(mut multipart: Multipart) -> AppResult<Upload> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidInput(format!("Failed to read upload: {}", e)))?;
                upload.file = Some(bytes.to_vec());
            }
            // Unreadable scaling fields fall back to defaults
            "grams" => upload.grams = field.text().await.ok(),
            "mult" => upload.mult = field.text().await.ok(),
            other => tracing::debug!("Ignoring form field '{}'", other),
        }
    }

    Ok(upload)
}
