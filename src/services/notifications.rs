use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::models::{Toast, ToastEvent, ToastKind};

/// Active toast notifications. Toasts stack in creation order and each one
/// disappears `ttl` after it was shown.
pub struct Toaster {
    toasts: Mutex<Vec<Toast>>,
    ttl: chrono::Duration,
    tx: broadcast::Sender<ToastEvent>,
}

impl Toaster {
    pub fn new(ttl: Duration) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            toasts: Mutex::new(Vec::new()),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(5)),
            tx,
        }
    }

    pub fn show(&self, message: &str, kind: ToastKind) -> Toast {
        self.show_at(message, kind, Utc::now())
    }

    pub fn show_at(&self, message: &str, kind: ToastKind, now: DateTime<Utc>) -> Toast {
        let toast = Toast {
            id: uuid::Uuid::new_v4().to_string(),
            message: message.to_string(),
            kind,
            created_at: now,
            expires_at: now + self.ttl,
        };

        if let Ok(mut toasts) = self.toasts.lock() {
            toasts.push(toast.clone());
        }
        // No subscribers is fine.
        let _ = self.tx.send(ToastEvent::Shown(toast.clone()));
        toast
    }

    pub fn active(&self) -> Vec<Toast> {
        self.active_at(Utc::now())
    }

    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Toast> {
        self.prune_expired(now);
        self.toasts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn dismiss(&self, id: &str) -> bool {
        let removed = match self.toasts.lock() {
            Ok(mut toasts) => {
                let before = toasts.len();
                toasts.retain(|t| t.id != id);
                toasts.len() != before
            }
            Err(_) => false,
        };
        if removed {
            let _ = self.tx.send(ToastEvent::Removed { id: id.to_string() });
        }
        removed
    }

    pub fn prune_expired(&self, now: DateTime<Utc>) -> Vec<String> {
        let expired: Vec<String> = match self.toasts.lock() {
            Ok(mut toasts) => {
                let ids = toasts
                    .iter()
                    .filter(|t| t.is_expired(now))
                    .map(|t| t.id.clone())
                    .collect();
                toasts.retain(|t| !t.is_expired(now));
                ids
            }
            Err(_) => vec![],
        };
        for id in &expired {
            let _ = self.tx.send(ToastEvent::Removed { id: id.clone() });
        }
        expired
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ToastEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toaster() -> Toaster {
        Toaster::new(Duration::from_secs(5))
    }

    #[test]
    fn test_toasts_stack_in_order() {
        let t = toaster();
        let now = Utc::now();
        t.show_at("first", ToastKind::Success, now);
        t.show_at("second", ToastKind::Error, now);
        t.show_at("second", ToastKind::Error, now);

        let active = t.active_at(now);
        let messages: Vec<_> = active.iter().map(|t| t.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second", "second"]);
    }

    #[test]
    fn test_toast_expires_after_five_seconds() {
        let t = toaster();
        let now = Utc::now();
        let toast = t.show_at("hello", ToastKind::Success, now);

        assert_eq!(t.active_at(now + chrono::Duration::milliseconds(4999)).len(), 1);
        assert_eq!(t.prune_expired(now + chrono::Duration::seconds(5)), vec![toast.id]);
        assert!(t.active_at(now + chrono::Duration::seconds(5)).is_empty());
    }

    #[test]
    fn test_dismiss() {
        let t = toaster();
        let toast = t.show("bye", ToastKind::Error);
        assert!(t.dismiss(&toast.id));
        assert!(!t.dismiss(&toast.id));
        assert!(t.active().is_empty());
    }

    #[test]
    fn test_subscribers_see_show_and_remove() {
        let t = toaster();
        let mut rx = t.subscribe();
        let now = Utc::now();
        let toast = t.show_at("x", ToastKind::Success, now);
        t.prune_expired(now + chrono::Duration::seconds(6));

        match rx.try_recv().unwrap() {
            ToastEvent::Shown(shown) => assert_eq!(shown.id, toast.id),
            other => panic!("unexpected event {other:?}"),
        }
        match rx.try_recv().unwrap() {
            ToastEvent::Removed { id } => assert_eq!(id, toast.id),
            other => panic!("unexpected event {other:?}"),
        }
    }
}
