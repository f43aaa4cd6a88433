use chrono::{DateTime, Utc};

use crate::models::{Session, SessionSource};
use crate::services::auth::AuthProvider;

/// Signs in a new visitor. Any failure degrades to a random local identity
/// so the booking form stays usable.
pub async fn bootstrap(auth: Option<&dyn AuthProvider>, initial_token: Option<&str>) -> Session {
    let Some(auth) = auth else {
        tracing::debug!("no auth provider configured, using fallback identity");
        return Session::fallback();
    };

    let token = initial_token.filter(|t| !t.trim().is_empty());
    let (result, source) = match token {
        Some(token) => (
            auth.sign_in_with_custom_token(token).await,
            SessionSource::CustomToken,
        ),
        None => (auth.sign_in_anonymously().await, SessionSource::Anonymous),
    };

    let session = match result {
        Ok(user) if !user.uid.trim().is_empty() => {
            let credentials = user.credentials(Utc::now());
            Session::authenticated(user.uid, credentials, source)
        }
        Ok(_) => {
            tracing::error!(source = ?source, "sign-in returned an empty uid");
            Session::fallback()
        }
        Err(e) => {
            tracing::error!(error = %e, source = ?source, "error authenticating");
            Session::fallback()
        }
    };

    tracing::info!(user_id = %session.user_id, source = ?session.source, "session ready");
    session
}

/// Rotates the session's ID token when it is about to expire. The user id is
/// left untouched. A failed refresh keeps the old credentials and is logged.
pub async fn refresh_if_expired(
    auth: Option<&dyn AuthProvider>,
    session: &mut Session,
    now: DateTime<Utc>,
) {
    let (Some(auth), Some(credentials)) = (auth, session.credentials.as_ref()) else {
        return;
    };
    if !credentials.needs_refresh(now) {
        return;
    }
    let refresh_token = credentials.refresh_token.clone();

    match auth.refresh(&refresh_token).await {
        Ok(user) => {
            if user.uid != session.user_id {
                tracing::warn!(
                    user_id = %session.user_id,
                    refreshed_uid = %user.uid,
                    "refreshed token belongs to another uid, keeping session uid"
                );
            }
            session.credentials = Some(user.credentials(now));
            tracing::debug!(user_id = %session.user_id, "id token refreshed");
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = %session.user_id, "error refreshing id token");
        }
    }
}
