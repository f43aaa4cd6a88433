use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::DocumentStore;
use crate::models::Session;

const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const PAGE_SIZE: &str = "300";

pub struct FirestoreStore {
    project_id: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl FirestoreStore {
    pub fn new(project_id: String, api_key: String) -> Self {
        Self::with_base_url(project_id, api_key, FIRESTORE_URL.to_string())
    }

    pub fn with_base_url(project_id: String, api_key: String, base_url: String) -> Self {
        Self {
            project_id,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn collection_url(&self, collection: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}",
            self.base_url,
            self.project_id,
            collection.trim_matches('/')
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder, session: &Session) -> reqwest::RequestBuilder {
        let builder = if self.api_key.is_empty() {
            builder
        } else {
            builder.query(&[("key", &self.api_key)])
        };
        match session.id_token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn read_json(resp: reqwest::Response) -> anyhow::Result<Value> {
        let status = resp.status();
        let data: Value = resp
            .json()
            .await
            .context("failed to parse Firestore response")?;

        if !status.is_success() {
            anyhow::bail!("Firestore error ({}): {}", status, data["error"]["message"]);
        }
        Ok(data)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add_document(
        &self,
        session: &Session,
        collection: &str,
        document: &Value,
    ) -> anyhow::Result<String> {
        let body = json!({ "fields": encode_fields(document)? });

        let resp = self
            .request(self.client.post(self.collection_url(collection)), session)
            .json(&body)
            .send()
            .await
            .context("failed to call Firestore createDocument")?;

        let data = Self::read_json(resp).await?;
        data["name"]
            .as_str()
            .and_then(|name| name.rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(|id| id.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing document name in Firestore response"))
    }

    async fn list_documents(&self, session: &Session, collection: &str) -> anyhow::Result<Vec<Value>> {
        let url = self.collection_url(collection);
        let mut documents = vec![];
        let mut page_token: Option<String> = None;

        loop {
            let mut builder = self
                .request(self.client.get(&url), session)
                .query(&[("pageSize", PAGE_SIZE)]);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token)]);
            }

            let resp = builder
                .send()
                .await
                .context("failed to call Firestore listDocuments")?;
            let data = Self::read_json(resp).await?;

            // An empty collection comes back as `{}`.
            if let Some(page) = data["documents"].as_array() {
                for doc in page {
                    documents.push(decode_value(
                        &json!({ "mapValue": { "fields": doc["fields"] } }),
                    )?);
                }
            }

            match data["nextPageToken"].as_str().filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token.to_string()),
                None => break,
            }
        }

        Ok(documents)
    }
}

/// Encodes a JSON object as a Firestore `fields` map.
pub fn encode_fields(document: &Value) -> anyhow::Result<Value> {
    let Value::Object(map) = document else {
        anyhow::bail!("Firestore documents must be JSON objects");
    };
    let fields: Map<String, Value> = map
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect();
    Ok(Value::Object(fields))
}

pub fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match n.as_i64() {
            Some(i) => json!({ "integerValue": i.to_string() }),
            None => json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() }
        }),
        Value::Object(_) => json!({
            "mapValue": { "fields": encode_fields(value).unwrap_or_default() }
        }),
    }
}

pub fn decode_value(value: &Value) -> anyhow::Result<Value> {
    let Value::Object(typed) = value else {
        anyhow::bail!("Firestore value is not an object: {value}");
    };
    let Some((kind, inner)) = typed.iter().next() else {
        anyhow::bail!("empty Firestore value");
    };

    Ok(match kind.as_str() {
        "nullValue" => Value::Null,
        "booleanValue" | "doubleValue" | "stringValue" | "timestampValue" | "referenceValue" => {
            inner.clone()
        }
        "integerValue" => {
            let raw = inner.as_str().map(str::to_string).unwrap_or_else(|| inner.to_string());
            let parsed: i64 = raw
                .parse()
                .with_context(|| format!("bad integerValue: {raw}"))?;
            json!(parsed)
        }
        "arrayValue" => {
            let values = match inner["values"].as_array() {
                Some(values) => values.iter().map(decode_value).collect::<anyhow::Result<Vec<_>>>()?,
                None => vec![],
            };
            Value::Array(values)
        }
        "mapValue" => {
            let mut out = Map::new();
            if let Some(fields) = inner["fields"].as_object() {
                for (k, v) in fields {
                    out.insert(k.clone(), decode_value(v)?);
                }
            }
            Value::Object(out)
        }
        other => anyhow::bail!("unsupported Firestore value type: {other}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Credentials, SessionSource};
    use axum::http::{HeaderMap, Method, StatusCode, Uri};
    use axum::response::IntoResponse;
    use axum::Router;
    use chrono::Utc;

    #[test]
    fn test_encode_appointment_shape() {
        let doc = json!({
            "branch": "North",
            "termsAgreed": true,
            "patientDetails": { "name": "Jane", "age": "" },
        });
        let fields = encode_fields(&doc).unwrap();
        assert_eq!(fields["branch"], json!({ "stringValue": "North" }));
        assert_eq!(fields["termsAgreed"], json!({ "booleanValue": true }));
        assert_eq!(
            fields["patientDetails"]["mapValue"]["fields"]["name"],
            json!({ "stringValue": "Jane" })
        );
    }

    #[test]
    fn test_encode_numbers_and_arrays() {
        assert_eq!(encode_value(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(encode_value(&json!(1.5)), json!({ "doubleValue": 1.5 }));
        assert_eq!(
            encode_value(&json!([null])),
            json!({ "arrayValue": { "values": [{ "nullValue": null }] } })
        );
    }

    #[test]
    fn test_encode_rejects_non_object() {
        assert!(encode_fields(&json!("x")).is_err());
    }

    #[test]
    fn test_decode_firestore_document() {
        let doc = json!({
            "branch": "North",
            "count": 3,
            "tags": ["a", "b"],
            "patientDetails": { "name": "Jane" },
            "note": null,
        });
        let encoded = json!({ "mapValue": { "fields": encode_fields(&doc).unwrap() } });
        assert_eq!(decode_value(&encoded).unwrap(), doc);
    }

    #[test]
    fn test_decode_unknown_type() {
        assert!(decode_value(&json!({ "geoPointValue": {} })).is_err());
    }

    async fn fake_firestore(
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: String,
    ) -> axum::response::Response {
        let authorized = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer good-token");
        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({"error": {"message": "UNAUTHENTICATED"}})),
            )
                .into_response();
        }

        let query = uri.query().unwrap_or("").to_string();
        if method == Method::POST {
            let doc: Value = serde_json::from_str(&body).unwrap();
            assert_eq!(doc["fields"]["branch"], json!({ "stringValue": "North" }));
            assert!(uri.path().ends_with("/documents/artifacts/a/users/u1/appointments"));
            return axum::Json(json!({ "name": "projects/p/databases/(default)/documents/artifacts/a/users/u1/appointments/doc-42" }))
                .into_response();
        }

        let page = |n: i64| json!({ "name": format!("x/{n}"), "fields": { "n": { "integerValue": n.to_string() } } });
        if query.contains("pageToken=second") {
            axum::Json(json!({ "documents": [page(3)] })).into_response()
        } else {
            axum::Json(json!({ "documents": [page(1), page(2)], "nextPageToken": "second" }))
                .into_response()
        }
    }

    async fn serve_fake() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().fallback(fake_firestore);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    fn session_with_token(token: &str) -> Session {
        Session::authenticated(
            "u1".to_string(),
            Credentials {
                id_token: token.to_string(),
                refresh_token: "r".to_string(),
                expires_at: Utc::now() + chrono::Duration::hours(1),
            },
            SessionSource::Anonymous,
        )
    }

    #[tokio::test]
    async fn test_add_document_returns_generated_id() {
        let store = FirestoreStore::with_base_url("p".to_string(), String::new(), serve_fake().await);
        let id = store
            .add_document(&session_with_token("good-token"), "artifacts/a/users/u1/appointments", &json!({ "branch": "North" }))
            .await
            .unwrap();
        assert_eq!(id, "doc-42");
    }

    #[tokio::test]
    async fn test_add_document_error_body() {
        let store = FirestoreStore::with_base_url("p".to_string(), String::new(), serve_fake().await);
        let err = store
            .add_document(&session_with_token("expired"), "c", &json!({ "branch": "North" }))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("401"));
        assert!(msg.contains("UNAUTHENTICATED"));
    }

    #[tokio::test]
    async fn test_list_documents_follows_page_tokens() {
        let store = FirestoreStore::with_base_url("p".to_string(), String::new(), serve_fake().await);
        let docs = store
            .list_documents(&session_with_token("good-token"), "c")
            .await
            .unwrap();
        assert_eq!(docs, vec![json!({ "n": 1 }), json!({ "n": 2 }), json!({ "n": 3 })]);
    }

    #[test]
    fn test_collection_url() {
        let store = FirestoreStore::new("clinic".to_string(), String::new());
        assert_eq!(
            store.collection_url("artifacts/app/users/u1/appointments"),
            "https://firestore.googleapis.com/v1/projects/clinic/databases/(default)/documents/artifacts/app/users/u1/appointments"
        );
    }
}
