pub mod api;
pub mod booking;
pub mod health;
pub mod toasts;
pub mod visitor;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(booking::booking_page))
        .route("/mode/new", post(booking::select_new_patient))
        .route("/mode/registered", post(booking::select_registered_patient))
        .route("/appointments", post(booking::submit_form))
        .route("/api/session", get(api::get_session))
        .route(
            "/api/appointments",
            get(api::list_appointments).post(api::create_appointment),
        )
        .route("/api/toasts", get(toasts::get_toasts))
        .route("/api/toasts/:id/dismiss", post(toasts::dismiss_toast))
        .route("/api/toasts/events", get(toasts::events_stream))
        // Routes above this layer belong to a visitor; health does not.
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            visitor::resolve_visitor,
        ))
        .route("/health", get(health::health))
        .with_state(state)
}
