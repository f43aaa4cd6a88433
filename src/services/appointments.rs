use chrono::Utc;

use crate::models::{AppointmentRecord, Session, StoredAppointment, SubmitResult};
use crate::services::store::DocumentStore;

pub const NOT_READY_MESSAGE: &str = "System not ready. Please try again.";
pub const SAVED_MESSAGE: &str = "Appointment confirmed and saved successfully!";
pub const FAILED_MESSAGE: &str = "An error occurred while confirming the appointment.";

pub fn collection_path(app_id: &str, user_id: &str) -> String {
    format!("artifacts/{app_id}/users/{user_id}/appointments")
}

/// Writes one appointment for the session's identity. Backend errors are
/// logged and turned into a generic failure result.
pub async fn save_appointment(
    store: &dyn DocumentStore,
    session: &Session,
    app_id: &str,
    record: AppointmentRecord,
) -> SubmitResult {
    if !session.can_write() {
        tracing::error!("database not ready or user id missing");
        return SubmitResult::failed(NOT_READY_MESSAGE);
    }

    let path = collection_path(app_id, &session.user_id);
    let document = match serde_json::to_value(StoredAppointment::new(record, Utc::now())) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize appointment");
            return SubmitResult::failed(FAILED_MESSAGE);
        }
    };

    match store.add_document(session, &path, &document).await {
        Ok(id) => {
            tracing::info!(document_id = %id, path = %path, "appointment saved");
            SubmitResult::ok(SAVED_MESSAGE)
        }
        Err(e) => {
            tracing::error!(error = %e, path = %path, "error saving appointment");
            SubmitResult::failed(FAILED_MESSAGE)
        }
    }
}

pub async fn list_appointments(
    store: &dyn DocumentStore,
    session: &Session,
    app_id: &str,
) -> anyhow::Result<Vec<StoredAppointment>> {
    let path = collection_path(app_id, &session.user_id);
    store
        .list_documents(session, &path)
        .await?
        .into_iter()
        .map(|doc| serde_json::from_value(doc).map_err(Into::into))
        .collect()
}
