use std::sync::{Arc, Mutex};
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use docto::config::AppConfig;
use docto::db;
use docto::handlers;
use docto::services::auth::firebase::FirebaseAuth;
use docto::services::auth::AuthProvider;
use docto::services::store::firestore::FirestoreStore;
use docto::services::store::sqlite::SqliteStore;
use docto::services::store::DocumentStore;
use docto::services::visitors::{spawn_sweeper, VisitorRegistry};
use docto::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let auth: Option<Box<dyn AuthProvider>> = if config.backend.has_auth() {
        Some(Box::new(FirebaseAuth::new(config.backend.api_key.clone())))
    } else {
        tracing::warn!("no apiKey in FIREBASE_CONFIG, visitors get fallback identities");
        None
    };

    let store: Box<dyn DocumentStore> = if config.backend.has_firestore() {
        tracing::info!(project = %config.backend.project_id, "using Firestore document store");
        Box::new(FirestoreStore::new(
            config.backend.project_id.clone(),
            config.backend.api_key.clone(),
        ))
    } else {
        tracing::info!(path = %config.database_url, "using local SQLite document store");
        let conn = db::init_db(&config.database_url)?;
        Box::new(SqliteStore::new(Arc::new(Mutex::new(conn))))
    };

    let toast_ttl = if config.toast_ttl_secs > 0 {
        Some(Duration::from_secs(config.toast_ttl_secs))
    } else {
        tracing::warn!("toast container disabled, notifications are dropped");
        None
    };
    let visitors = Arc::new(VisitorRegistry::new(
        toast_ttl,
        Duration::from_secs(config.visitor_idle_secs),
    ));
    spawn_sweeper(Arc::clone(&visitors));

    let state = Arc::new(AppState {
        config: config.clone(),
        auth,
        store,
        visitors,
    });

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
