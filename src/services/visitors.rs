use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::models::{Session, ToastKind};
use crate::services::auth::AuthProvider;
use crate::services::notifications::Toaster;
use crate::services::session;

pub const VISITOR_COOKIE: &str = "docto_visitor";

/// One browser's view of the booking form: its own identity and its own
/// toast container.
pub struct Visitor {
    pub id: String,
    session: tokio::sync::Mutex<Session>,
    pub toasts: Option<Arc<Toaster>>,
    last_seen: Mutex<DateTime<Utc>>,
}

impl Visitor {
    fn new(session: Session, toast_ttl: Option<Duration>, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            session: tokio::sync::Mutex::new(session),
            toasts: toast_ttl.map(|ttl| Arc::new(Toaster::new(ttl))),
            last_seen: Mutex::new(now),
        }
    }

    /// Current session with a usable ID token, refreshed if it expired.
    pub async fn session(&self, auth: Option<&dyn AuthProvider>) -> Session {
        let mut current = self.session.lock().await;
        session::refresh_if_expired(auth, &mut current, Utc::now()).await;
        current.clone()
    }

    pub async fn user_id(&self) -> String {
        self.session.lock().await.user_id.clone()
    }

    /// Shows a toast if this visitor has a toast container.
    pub fn notify(&self, message: &str, kind: ToastKind) {
        if let Some(toasts) = &self.toasts {
            toasts.show(message, kind);
        }
    }

    fn touch(&self, now: DateTime<Utc>) {
        if let Ok(mut seen) = self.last_seen.lock() {
            *seen = now;
        }
    }

    fn idle_since(&self) -> DateTime<Utc> {
        self.last_seen.lock().map(|seen| *seen).unwrap_or_else(|_| Utc::now())
    }
}

pub struct VisitorRegistry {
    visitors: Mutex<HashMap<String, Arc<Visitor>>>,
    toast_ttl: Option<Duration>,
    idle_ttl: chrono::Duration,
}

impl VisitorRegistry {
    /// A `toast_ttl` of `None` means visitors have no toast container.
    pub fn new(toast_ttl: Option<Duration>, idle_ttl: Duration) -> Self {
        Self {
            visitors: Mutex::new(HashMap::new()),
            toast_ttl,
            idle_ttl: chrono::Duration::from_std(idle_ttl)
                .unwrap_or_else(|_| chrono::Duration::hours(1)),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Visitor>> {
        let visitor = self.visitors.lock().ok()?.get(id).cloned()?;
        visitor.touch(Utc::now());
        Some(visitor)
    }

    /// Looks up the visitor behind a cookie value. Unknown or missing ids get
    /// a brand new visitor with a server-chosen id; the bool reports that.
    pub async fn resolve(
        &self,
        cookie_id: Option<&str>,
        auth: Option<&dyn AuthProvider>,
        initial_token: Option<&str>,
    ) -> (Arc<Visitor>, bool) {
        if let Some(visitor) = cookie_id.and_then(|id| self.get(id)) {
            return (visitor, false);
        }

        let identity = session::bootstrap(auth, initial_token).await;
        let visitor = Arc::new(Visitor::new(identity, self.toast_ttl, Utc::now()));
        if let Ok(mut visitors) = self.visitors.lock() {
            visitors.insert(visitor.id.clone(), Arc::clone(&visitor));
        }
        tracing::debug!(visitor = %visitor.id, "new visitor");
        (visitor, true)
    }

    pub fn len(&self) -> usize {
        self.visitors.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops expired toasts and forgets visitors idle for longer than the
    /// idle TTL. Returns how many visitors were evicted.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let Ok(mut visitors) = self.visitors.lock() else {
            return 0;
        };
        let before = visitors.len();
        visitors.retain(|_, visitor| now - visitor.idle_since() < self.idle_ttl);
        for visitor in visitors.values() {
            if let Some(toasts) = &visitor.toasts {
                toasts.prune_expired(now);
            }
        }
        before - visitors.len()
    }
}

/// Runs [`VisitorRegistry::sweep`] once a second so live subscribers see
/// toasts go.
pub fn spawn_sweeper(registry: Arc<VisitorRegistry>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        loop {
            interval.tick().await;
            let evicted = registry.sweep(Utc::now());
            if evicted > 0 {
                tracing::debug!(count = evicted, "idle visitors evicted");
            }
        }
    })
}
