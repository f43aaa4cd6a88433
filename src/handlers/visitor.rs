use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;

use crate::services::visitors::VISITOR_COOKIE;
use crate::state::AppState;

/// Attaches the caller's `Visitor` to the request, signing a new one in when
/// the cookie is missing or unknown.
pub async fn resolve_visitor(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let cookie_id = visitor_cookie(req.headers());
    let (visitor, is_new) = state
        .visitors
        .resolve(
            cookie_id.as_deref(),
            state.auth.as_deref(),
            state.config.initial_auth_token.as_deref(),
        )
        .await;

    let visitor_id = visitor.id.clone();
    req.extensions_mut().insert(visitor);
    let mut res = next.run(req).await;

    if is_new {
        let cookie = format!("{VISITOR_COOKIE}={visitor_id}; Path=/; HttpOnly; SameSite=Lax");
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                res.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "failed to build visitor cookie"),
        }
    }
    res
}

pub fn visitor_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == VISITOR_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visitor_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; docto_visitor=abc123; lang=en"),
        );
        assert_eq!(visitor_cookie(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_visitor_cookie_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(visitor_cookie(&headers).is_none());
        headers.insert(COOKIE, HeaderValue::from_static("docto_visitor="));
        assert!(visitor_cookie(&headers).is_none());
    }
}
