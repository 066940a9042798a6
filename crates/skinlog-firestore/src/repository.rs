//! FirestorePhotoRepository - IPhotoRepository implementation over REST
//!
//! Issues `documents:runQuery` requests and maps Firestore's typed field
//! encoding (`stringValue`, `timestampValue`) onto the port-level
//! [`PhotoRecord`] DTO. Documents missing required fields are skipped
//! with a warning rather than failing the whole listing; transport and
//! status errors surface as `anyhow` errors for the sync engine to
//! classify.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use skinlog_core::domain::OwnerId;
use skinlog_core::ports::{IPhotoRepository, PhotoRecord};

/// Production Firestore REST endpoint
const FIRESTORE_BASE_URL: &str = "https://firestore.googleapis.com";

// ============================================================================
// Firestore wire types
// ============================================================================

/// One element of a runQuery response stream
///
/// Entries carrying only `readTime` (no document) are progress markers
/// and are ignored.
#[derive(Debug, Deserialize)]
struct QueryResult {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    /// Full resource name; the document ID is its last path segment
    name: String,
    #[serde(default)]
    fields: serde_json::Map<String, serde_json::Value>,
}

impl FirestoreDocument {
    fn doc_id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    fn string_field(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)?
            .get("stringValue")?
            .as_str()
            .map(str::to_owned)
    }

    fn timestamp_field(&self, key: &str) -> Option<DateTime<Utc>> {
        let raw = self.fields.get(key)?.get("timestampValue")?.as_str()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Maps a document onto the port DTO, or explains why it can't be
fn record_from_document(doc: &FirestoreDocument) -> Result<PhotoRecord, String> {
    let owner_id = doc
        .string_field("uid")
        .ok_or_else(|| "missing uid".to_string())?;
    let url = doc
        .string_field("url")
        .ok_or_else(|| "missing url".to_string())?;
    let created_at = doc
        .timestamp_field("createdAt")
        .ok_or_else(|| "missing or malformed createdAt".to_string())?;

    Ok(PhotoRecord {
        id: doc.doc_id().to_string(),
        owner_id,
        // A missing date key is recoverable downstream from createdAt.
        date_key: doc.string_field("dateISO").unwrap_or_default(),
        url,
        created_at,
        local_id: doc.string_field("localId"),
    })
}

// ============================================================================
// FirestorePhotoRepository
// ============================================================================

/// Firestore-backed photo repository
pub struct FirestorePhotoRepository {
    http: Client,
    base_url: String,
    project_id: String,
    collection: String,
    auth_token: Option<String>,
}

impl FirestorePhotoRepository {
    /// Creates a repository for the given project and collection
    pub fn new(project_id: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::with_base_url(FIRESTORE_BASE_URL, project_id, collection)
    }

    /// Creates a repository against a custom endpoint (tests, emulator)
    pub fn with_base_url(
        base_url: impl Into<String>,
        project_id: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            collection: collection.into(),
            auth_token: None,
        }
    }

    /// Attaches the signed-in user's ID token to every request
    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    fn run_query_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/databases/(default)/documents:runQuery",
            self.base_url, self.project_id
        )
    }
}

#[async_trait::async_trait]
impl IPhotoRepository for FirestorePhotoRepository {
    async fn list_by_owner(&self, owner: &OwnerId) -> Result<Vec<PhotoRecord>> {
        // Single-field equality filter only; no orderBy, no range. Both
        // would demand a composite index the deployment doesn't carry.
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": "uid" },
                        "op": "EQUAL",
                        "value": { "stringValue": owner.as_str() }
                    }
                }
            }
        });

        let mut request = self.http.post(self.run_query_url()).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .context("Failed to reach the photo repository")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Photo repository query failed with {status}: {detail}");
        }

        let results: Vec<QueryResult> = response
            .json()
            .await
            .context("Failed to decode photo repository response")?;

        let mut records = Vec::new();
        for result in &results {
            let Some(doc) = &result.document else {
                continue;
            };
            match record_from_document(doc) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    warn!(document = %doc.name, reason, "Skipping undecodable photo document");
                }
            }
        }

        debug!(owner = %owner, count = records.len(), "Listed photo documents");
        Ok(records)
    }
}
