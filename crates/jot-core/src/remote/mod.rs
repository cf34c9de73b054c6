//! Remote note store client.
//!
//! Request/response wrapper translating note operations into calls against
//! the hosted document database and blob bucket. Every operation is a single
//! round trip with no retries; failures are mapped onto the crate's error
//! kinds at the call site.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::{RemoteConfig, BUCKET_ID, COLLECTION_ID, DATABASE_ID};
use crate::error::{Error, Result};
use crate::http::{
    build_client, parse_api_error, request_error, status_error, PROJECT_HEADER, SESSION_HEADER,
};
use crate::models::{ImageAsset, Note, NoteColor};

/// New note payload submitted to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
    pub owner_id: String,
    pub color: NoteColor,
    pub image_id: Option<String>,
}

/// Field updates for an existing note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChanges {
    pub title: String,
    pub content: String,
    pub color: NoteColor,
    pub image: ImageField,
    pub pinned: Option<bool>,
}

/// What happens to the stored image reference on a note update.
///
/// `Keep` omits the field from the write entirely; `Clear` writes an
/// explicit null. The store treats those differently, so the distinction
/// must survive payload construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ImageField {
    #[default]
    Keep,
    Clear,
    Set(String),
}

/// Narrow store interface the synchronizer drives.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// List the owner's notes, server-sorted pinned-first then most recently
    /// updated, optionally restricted by a title search.
    async fn list(&self, owner_id: &str, title_filter: Option<&str>) -> Result<Vec<Note>>;

    async fn create(&self, draft: NoteDraft) -> Result<Note>;

    async fn update(&self, id: &str, changes: NoteChanges) -> Result<Note>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Upload image bytes, returning the new file identifier.
    async fn upload_image(&self, asset: &ImageAsset) -> Result<String>;

    async fn delete_image(&self, id: &str) -> Result<()>;
}

/// HTTP implementation of [`NoteStore`] against the Appwrite REST API.
#[derive(Clone)]
pub struct AppwriteNoteStore {
    config: RemoteConfig,
    client: reqwest::Client,
    session_secret: Option<String>,
}

impl std::fmt::Debug for AppwriteNoteStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("AppwriteNoteStore")
            .field("config", &self.config)
            .field(
                "session_secret",
                &self.session_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl AppwriteNoteStore {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = build_client(config.timeout)?;
        Ok(Self {
            config,
            client,
            session_secret: None,
        })
    }

    /// Attach the session secret used for authenticated requests.
    #[must_use]
    pub fn with_session(mut self, session_secret: impl Into<String>) -> Self {
        self.session_secret = Some(session_secret.into());
        self
    }

    /// Deterministic preview URL for a stored image. No network call.
    #[must_use]
    pub fn image_preview_url(&self, image_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/view?project={}&mode=admin",
            self.config.endpoint,
            BUCKET_ID,
            urlencoding::encode(image_id),
            urlencoding::encode(&self.config.project_id),
        )
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{DATABASE_ID}/collections/{COLLECTION_ID}/documents",
            self.config.endpoint
        )
    }

    fn document_url(&self, id: &str) -> String {
        format!("{}/{}", self.documents_url(), urlencoding::encode(id))
    }

    fn files_url(&self) -> String {
        format!("{}/storage/buckets/{BUCKET_ID}/files", self.config.endpoint)
    }

    fn file_url(&self, id: &str) -> String {
        format!("{}/{}", self.files_url(), urlencoding::encode(id))
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let builder = builder.header(PROJECT_HEADER, &self.config.project_id);
        match &self.session_secret {
            Some(secret) => builder.header(SESSION_HEADER, secret),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = self
            .request(builder)
            .send()
            .await
            .map_err(|error| request_error(&error))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        Ok(response)
    }
}

#[async_trait]
impl NoteStore for AppwriteNoteStore {
    async fn list(&self, owner_id: &str, title_filter: Option<&str>) -> Result<Vec<Note>> {
        let queries: Vec<(&str, String)> = list_queries(owner_id, title_filter)
            .into_iter()
            .map(|query| ("queries[]", query))
            .collect();

        let response = self
            .send(self.client.get(self.documents_url()).query(&queries))
            .await?;
        let payload = response
            .json::<DocumentList>()
            .await
            .map_err(|error| request_error(&error))?;

        Ok(payload.documents.into_iter().map(Note::from).collect())
    }

    async fn create(&self, draft: NoteDraft) -> Result<Note> {
        let payload = create_payload(&draft);
        let response = self
            .send(self.client.post(self.documents_url()).json(&payload))
            .await?;
        let document = response
            .json::<NoteDocument>()
            .await
            .map_err(|error| request_error(&error))?;
        Ok(document.into())
    }

    async fn update(&self, id: &str, changes: NoteChanges) -> Result<Note> {
        let payload = update_payload(&changes);
        let response = self
            .send(self.client.patch(self.document_url(id)).json(&payload))
            .await?;
        let document = response
            .json::<NoteDocument>()
            .await
            .map_err(|error| request_error(&error))?;
        Ok(document.into())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.send(self.client.delete(self.document_url(id))).await?;
        Ok(())
    }

    async fn upload_image(&self, asset: &ImageAsset) -> Result<String> {
        if asset.bytes.is_empty() {
            return Err(Error::Upload("image asset has no bytes".to_string()));
        }

        let part = multipart::Part::bytes(asset.bytes.clone())
            .file_name(asset.upload_file_name())
            .mime_str(&asset.resolved_mime_type())
            .map_err(|error| Error::Upload(format!("invalid image MIME type: {error}")))?;
        let form = multipart::Form::new()
            .text("fileId", "unique()")
            // Public-read grant so preview URLs resolve without a session.
            .text("permissions[]", "read(\"any\")")
            .part("file", part);

        let response = self
            .request(self.client.post(self.files_url()))
            .multipart(form)
            .send()
            .await
            .map_err(|error| Error::Upload(error.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upload(parse_api_error(status, &body)));
        }

        let payload = response
            .json::<FileResponse>()
            .await
            .map_err(|error| Error::Upload(error.to_string()))?;
        if payload.id.trim().is_empty() {
            return Err(Error::Upload(
                "upload response did not include a file identifier".to_string(),
            ));
        }
        Ok(payload.id)
    }

    async fn delete_image(&self, id: &str) -> Result<()> {
        self.send(self.client.delete(self.file_url(id))).await?;
        Ok(())
    }
}

/// Server-side query set: owner equality, pinned-desc/updatedAt-desc order,
/// optional full-text title search.
fn list_queries(owner_id: &str, title_filter: Option<&str>) -> Vec<String> {
    let mut queries = vec![
        serde_json::json!({"method": "equal", "attribute": "owner_id", "values": [owner_id]})
            .to_string(),
        serde_json::json!({"method": "orderDesc", "attribute": "pinned"}).to_string(),
        serde_json::json!({"method": "orderDesc", "attribute": "$updatedAt"}).to_string(),
    ];

    if let Some(title) = title_filter.map(str::trim).filter(|title| !title.is_empty()) {
        queries.push(
            serde_json::json!({"method": "search", "attribute": "title", "values": [title]})
                .to_string(),
        );
    }

    queries
}

fn create_payload(draft: &NoteDraft) -> Value {
    let mut data = Map::new();
    data.insert("title".to_string(), Value::from(draft.title.clone()));
    data.insert("content".to_string(), Value::from(draft.content.clone()));
    data.insert("owner_id".to_string(), Value::from(draft.owner_id.clone()));
    data.insert("color".to_string(), Value::from(draft.color.as_hex()));
    data.insert("pinned".to_string(), Value::from(false));
    if let Some(image_id) = &draft.image_id {
        data.insert("image_id".to_string(), Value::from(image_id.clone()));
    }

    serde_json::json!({
        "documentId": "unique()",
        "data": data,
        "permissions": owner_permissions(&draft.owner_id),
    })
}

fn update_payload(changes: &NoteChanges) -> Value {
    let mut data = Map::new();
    data.insert("title".to_string(), Value::from(changes.title.clone()));
    data.insert("content".to_string(), Value::from(changes.content.clone()));
    data.insert("color".to_string(), Value::from(changes.color.as_hex()));
    match &changes.image {
        ImageField::Keep => {}
        ImageField::Clear => {
            data.insert("image_id".to_string(), Value::Null);
        }
        ImageField::Set(image_id) => {
            data.insert("image_id".to_string(), Value::from(image_id.clone()));
        }
    }
    if let Some(pinned) = changes.pinned {
        data.insert("pinned".to_string(), Value::from(pinned));
    }

    serde_json::json!({ "data": data })
}

/// Per-owner read/update/delete grants attached to every document write.
fn owner_permissions(owner_id: &str) -> Vec<String> {
    vec![
        format!("read(\"user:{owner_id}\")"),
        format!("update(\"user:{owner_id}\")"),
        format!("delete(\"user:{owner_id}\")"),
    ]
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    documents: Vec<NoteDocument>,
}

#[derive(Debug, Deserialize)]
struct NoteDocument {
    #[serde(rename = "$id")]
    id: String,
    title: String,
    content: String,
    owner_id: String,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    pinned: Option<bool>,
    #[serde(default)]
    image_id: Option<String>,
    #[serde(rename = "$createdAt")]
    created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    updated_at: DateTime<Utc>,
}

impl From<NoteDocument> for Note {
    fn from(document: NoteDocument) -> Self {
        Self {
            id: document.id,
            title: document.title,
            content: document.content,
            owner_id: document.owner_id,
            color: document
                .color
                .as_deref()
                .map(NoteColor::from_hex_or_default)
                .unwrap_or_default(),
            pinned: document.pinned.unwrap_or(false),
            image_id: document
                .image_id
                .filter(|image_id| !image_id.trim().is_empty()),
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FileResponse {
    #[serde(rename = "$id")]
    id: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn test_store() -> AppwriteNoteStore {
        let config = RemoteConfig::new("https://cloud.example.com/v1", "proj-1").unwrap();
        AppwriteNoteStore::new(config).unwrap()
    }

    #[test]
    fn preview_url_has_the_exact_backend_shape() {
        let store = test_store();
        assert_eq!(
            store.image_preview_url("img-42"),
            "https://cloud.example.com/v1/storage/buckets/note-images/files/img-42/view?project=proj-1&mode=admin"
        );
    }

    #[test]
    fn list_queries_filter_and_order_by_owner_and_recency() {
        let queries = list_queries("user-1", None);
        assert_eq!(queries.len(), 3);
        assert!(queries[0].contains("\"equal\""));
        assert!(queries[0].contains("user-1"));
        assert!(queries[1].contains("\"orderDesc\"") && queries[1].contains("pinned"));
        assert!(queries[2].contains("\"orderDesc\"") && queries[2].contains("$updatedAt"));
    }

    #[test]
    fn list_queries_append_title_search_when_given() {
        let queries = list_queries("user-1", Some("groceries"));
        assert_eq!(queries.len(), 4);
        assert!(queries[3].contains("\"search\""));
        assert!(queries[3].contains("groceries"));

        // Blank filters are treated as absent.
        assert_eq!(list_queries("user-1", Some("   ")).len(), 3);
    }

    #[test]
    fn create_payload_grants_owner_scoped_permissions() {
        let draft = NoteDraft {
            title: "Groceries".to_string(),
            content: "Milk, eggs".to_string(),
            owner_id: "user-1".to_string(),
            color: NoteColor::Green,
            image_id: None,
        };
        let payload = create_payload(&draft);

        assert_eq!(payload["documentId"], "unique()");
        assert_eq!(payload["data"]["color"], "#22C55E");
        assert_eq!(payload["data"]["pinned"], false);
        assert!(payload["data"].get("image_id").is_none());

        let permissions: Vec<&str> = payload["permissions"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(
            permissions,
            vec![
                "read(\"user:user-1\")",
                "update(\"user:user-1\")",
                "delete(\"user:user-1\")",
            ]
        );
    }

    #[test]
    fn create_payload_carries_image_when_present() {
        let draft = NoteDraft {
            title: "t".to_string(),
            content: "c".to_string(),
            owner_id: "user-1".to_string(),
            color: NoteColor::Default,
            image_id: Some("img-1".to_string()),
        };
        assert_eq!(create_payload(&draft)["data"]["image_id"], "img-1");
    }

    #[test]
    fn update_payload_keeps_image_field_out_when_untouched() {
        let changes = NoteChanges {
            title: "t".to_string(),
            content: "c".to_string(),
            color: NoteColor::Blue,
            image: ImageField::Keep,
            pinned: None,
        };
        let payload = update_payload(&changes);
        assert!(payload["data"].get("image_id").is_none());
        assert!(payload["data"].get("pinned").is_none());
    }

    #[test]
    fn update_payload_writes_explicit_null_on_clear() {
        let changes = NoteChanges {
            title: "t".to_string(),
            content: "c".to_string(),
            color: NoteColor::Blue,
            image: ImageField::Clear,
            pinned: Some(true),
        };
        let payload = update_payload(&changes);
        assert_eq!(payload["data"]["image_id"], Value::Null);
        assert_eq!(payload["data"]["pinned"], true);
    }

    #[test]
    fn update_payload_sets_replacement_image_id() {
        let changes = NoteChanges {
            title: "t".to_string(),
            content: "c".to_string(),
            color: NoteColor::Blue,
            image: ImageField::Set("img-2".to_string()),
            pinned: None,
        };
        assert_eq!(update_payload(&changes)["data"]["image_id"], "img-2");
    }

    #[test]
    fn note_document_deserializes_backend_field_names() {
        let raw = serde_json::json!({
            "$id": "note-1",
            "title": "Groceries",
            "content": "Milk, eggs",
            "owner_id": "user-1",
            "color": "#22C55E",
            "pinned": true,
            "image_id": "img-1",
            "$createdAt": "2025-05-01T10:00:00.000+00:00",
            "$updatedAt": "2025-05-02T11:30:00.000+00:00",
        });
        let note: Note = serde_json::from_value::<NoteDocument>(raw).unwrap().into();

        assert_eq!(note.id, "note-1");
        assert_eq!(note.color, NoteColor::Green);
        assert!(note.pinned);
        assert_eq!(note.image_id.as_deref(), Some("img-1"));
        assert!(note.updated_at > note.created_at);
    }

    #[test]
    fn note_document_defaults_missing_optional_fields() {
        let raw = serde_json::json!({
            "$id": "note-2",
            "title": "Bare",
            "content": "No extras",
            "owner_id": "user-1",
            "$createdAt": "2025-05-01T10:00:00.000+00:00",
            "$updatedAt": "2025-05-01T10:00:00.000+00:00",
        });
        let note: Note = serde_json::from_value::<NoteDocument>(raw).unwrap().into();

        assert_eq!(note.color, NoteColor::Default);
        assert!(!note.pinned);
        assert_eq!(note.image_id, None);
    }
}
