use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::auth::AuthProvider;
use crate::services::store::DocumentStore;
use crate::services::visitors::VisitorRegistry;

pub struct AppState {
    pub config: AppConfig,
    pub auth: Option<Box<dyn AuthProvider>>,
    pub store: Box<dyn DocumentStore>,
    pub visitors: Arc<VisitorRegistry>,
}
