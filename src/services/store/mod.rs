pub mod firestore;
pub mod sqlite;

use async_trait::async_trait;

use crate::models::Session;

/// A backend that holds JSON documents grouped into slash-separated
/// collection paths.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document and returns its generated id.
    async fn add_document(
        &self,
        session: &Session,
        collection: &str,
        document: &serde_json::Value,
    ) -> anyhow::Result<String>;

    async fn list_documents(
        &self,
        session: &Session,
        collection: &str,
    ) -> anyhow::Result<Vec<serde_json::Value>>;
}
