use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::Connection;

use super::DocumentStore;
use crate::db::queries;
use crate::models::Session;

/// Local document store used when no hosted project is configured.
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn add_document(
        &self,
        _session: &Session,
        collection: &str,
        document: &serde_json::Value,
    ) -> anyhow::Result<String> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        queries::insert_document(&db, collection, &id, document)?;
        Ok(id)
    }

    async fn list_documents(
        &self,
        _session: &Session,
        collection: &str,
    ) -> anyhow::Result<Vec<serde_json::Value>> {
        let db = self
            .db
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))?;
        queries::list_documents(&db, collection)
    }
}
