use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use super::booking::{handle_submission, VALIDATION_MESSAGE};
use crate::errors::AppError;
use crate::models::{AppointmentForm, Session, StoredAppointment, SubmitResult};
use crate::services::appointments;
use crate::services::visitors::Visitor;
use crate::state::AppState;

// GET /api/session
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Extension(visitor): Extension<Arc<Visitor>>,
) -> Json<Session> {
    Json(visitor.session(state.auth.as_deref()).await)
}

// POST /api/appointments
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(visitor): Extension<Arc<Visitor>>,
    Json(form): Json<AppointmentForm>,
) -> Response {
    match handle_submission(&state, &visitor, form).await {
        Ok(result) => Json(result).into_response(),
        Err(AppError::Validation(missing)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "success": false,
                "message": VALIDATION_MESSAGE,
                "missing": missing,
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "unexpected submission error");
            Json(SubmitResult::failed(appointments::FAILED_MESSAGE)).into_response()
        }
    }
}

// GET /api/appointments — only the caller's own collection
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Extension(visitor): Extension<Arc<Visitor>>,
) -> Result<Json<Vec<StoredAppointment>>, AppError> {
    let session = visitor.session(state.auth.as_deref()).await;
    let saved =
        appointments::list_appointments(state.store.as_ref(), &session, &state.config.app_id)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to list appointments");
                AppError::Backend("could not load appointments".to_string())
            })?;
    Ok(Json(saved))
}
