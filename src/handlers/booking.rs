use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Extension, Form};
use chrono::Utc;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{AppointmentForm, PatientMode, SubmitResult, Toast, ToastKind};
use crate::services::appointments;
use crate::services::visitors::Visitor;
use crate::state::AppState;

static BOOKING_HTML: &str = include_str!("../web/booking.html");

pub const VALIDATION_MESSAGE: &str = "Please fill out all required fields and agree to the terms.";
pub const REGISTERED_LOOKUP_MESSAGE: &str =
    "Please login or enter details to search for existing profile.";

/// Validates a submission, writes it under the visitor's identity, and
/// reports the outcome as a toast. Validation failures never reach the store.
pub async fn handle_submission(
    state: &AppState,
    visitor: &Visitor,
    form: AppointmentForm,
) -> Result<SubmitResult, AppError> {
    let record = match form.into_record(&state.config.default_appointment_date) {
        Ok(record) => record,
        Err(e) => {
            tracing::info!(error = %e, visitor = %visitor.id, "appointment rejected");
            visitor.notify(VALIDATION_MESSAGE, ToastKind::Error);
            return Err(e);
        }
    };

    let session = visitor.session(state.auth.as_deref()).await;
    let result = appointments::save_appointment(
        state.store.as_ref(),
        &session,
        &state.config.app_id,
        record,
    )
    .await;

    let kind = if result.success {
        ToastKind::Success
    } else {
        ToastKind::Error
    };
    visitor.notify(&result.message, kind);
    Ok(result)
}

// GET /
#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub mode: PatientMode,
}

pub async fn booking_page(
    State(state): State<Arc<AppState>>,
    Extension(visitor): Extension<Arc<Visitor>>,
    Query(query): Query<PageQuery>,
) -> Html<String> {
    let form = AppointmentForm {
        mode: query.mode,
        ..Default::default()
    };
    Html(render_page(&state, &visitor, &form).await)
}

// POST /mode/new
pub async fn select_new_patient() -> Redirect {
    Redirect::to("/?mode=new")
}

// POST /mode/registered
pub async fn select_registered_patient(Extension(visitor): Extension<Arc<Visitor>>) -> Redirect {
    visitor.notify(REGISTERED_LOOKUP_MESSAGE, ToastKind::Error);
    Redirect::to("/?mode=registered")
}

// POST /appointments
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    Extension(visitor): Extension<Arc<Visitor>>,
    Form(form): Form<AppointmentForm>,
) -> Response {
    let mode = form.mode;
    let status = match handle_submission(&state, &visitor, form.clone()).await {
        // A fresh page is the form reset; the identity is rendered again.
        Ok(result) if result.success => {
            return Redirect::to(&format!("/?mode={}", mode.as_str())).into_response();
        }
        Ok(_) => StatusCode::BAD_GATEWAY,
        Err(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Html(render_page(&state, &visitor, &form).await)).into_response()
}

pub async fn render_page(state: &AppState, visitor: &Visitor, form: &AppointmentForm) -> String {
    let user_id = visitor.user_id().await;
    let toasts = visitor
        .toasts
        .as_ref()
        .map(|t| t.active())
        .unwrap_or_default();

    let (new_btn, registered_btn) = match form.mode {
        PatientMode::New => ("btn-active text-primary", "text-gray-500"),
        PatientMode::Registered => ("text-gray-500", "btn-active text-primary"),
    };
    let details_class = if form.mode.shows_patient_details() {
        ""
    } else {
        "hidden"
    };

    BOOKING_HTML
        .replace("{{toasts}}", &render_toasts(&toasts))
        .replace("{{user_id}}", &escape_html(&user_id))
        .replace("{{new_btn_class}}", new_btn)
        .replace("{{registered_btn_class}}", registered_btn)
        .replace("{{mode}}", form.mode.as_str())
        .replace("{{details_class}}", details_class)
        .replace("{{default_date}}", &escape_html(&state.config.default_appointment_date))
        .replace("{{branch}}", &escape_html(&form.branch))
        .replace("{{speciality}}", &escape_html(&form.speciality))
        .replace("{{doctor}}", &escape_html(&form.doctor))
        .replace("{{appointment_date}}", &escape_html(&form.appointment_date))
        .replace("{{name}}", &escape_html(&form.name))
        .replace("{{phone}}", &escape_html(&form.phone))
        .replace("{{age}}", &escape_html(&form.age))
        .replace("{{gender}}", &escape_html(&form.gender))
        .replace("{{notes}}", &escape_html(&form.notes))
        .replace("{{terms_checked}}", if form.terms { "checked" } else { "" })
}

fn render_toasts(toasts: &[Toast]) -> String {
    let now = Utc::now();
    toasts
        .iter()
        .map(|toast| {
            let remaining_ms = (toast.expires_at - now).num_milliseconds().max(0);
            format!(
                r#"<div class="alert {} shadow-lg" data-toast-id="{}" style="animation-delay: {}ms"><span>{}</span></div>"#,
                toast.kind.alert_class(),
                escape_html(&toast.id),
                remaining_ms,
                escape_html(&toast.message),
            )
        })
        .collect()
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}
