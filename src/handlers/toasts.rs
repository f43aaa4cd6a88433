use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::Path;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{Extension, Json};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::errors::AppError;
use crate::models::{Toast, ToastEvent};
use crate::services::visitors::Visitor;

// GET /api/toasts
pub async fn get_toasts(Extension(visitor): Extension<Arc<Visitor>>) -> Json<Vec<Toast>> {
    Json(
        visitor
            .toasts
            .as_ref()
            .map(|t| t.active())
            .unwrap_or_default(),
    )
}

// POST /api/toasts/:id/dismiss
pub async fn dismiss_toast(
    Extension(visitor): Extension<Arc<Visitor>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let dismissed = visitor
        .toasts
        .as_ref()
        .map(|t| t.dismiss(&id))
        .unwrap_or(false);
    if !dismissed {
        return Err(AppError::NotFound(format!("toast {id}")));
    }
    Ok(Json(serde_json::json!({"ok": true})))
}

// GET /api/toasts/events — SSE stream
pub async fn events_stream(
    Extension(visitor): Extension<Arc<Visitor>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    // Subscribe before the snapshot so nothing shown in between is lost.
    // Without a toast container the live stream closes immediately.
    let rx = match &visitor.toasts {
        Some(toasts) => toasts.subscribe(),
        None => broadcast::channel(1).1,
    };
    let current = visitor
        .toasts
        .as_ref()
        .map(|t| t.active())
        .unwrap_or_default();

    let catchup_stream = tokio_stream::iter(
        current
            .into_iter()
            .map(|toast| Ok::<_, Infallible>(toast_event(&ToastEvent::Shown(toast)))),
    );

    let live_stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(event) => Some(Ok::<_, Infallible>(toast_event(&event))),
        Err(tokio_stream::wrappers::errors::BroadcastStreamRecvError::Lagged(_)) => None,
    });

    Sse::new(catchup_stream.chain(live_stream))
        .keep_alive(KeepAlive::new().interval(Duration::from_secs(30)))
}

fn toast_event(event: &ToastEvent) -> Event {
    let name = match event {
        ToastEvent::Shown(_) => "toast_shown",
        ToastEvent::Removed { .. } => "toast_removed",
    };
    let data = serde_json::to_string(event).unwrap_or_default();
    Event::default().event(name).data(data)
}
