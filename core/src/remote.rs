//! Remote document service: the cloud backup target.
//!
//! The service stores exactly one JSON document. Every failure comes back
//! as a `RemoteError` value; nothing here panics or propagates past the
//! trait boundary.

use crate::{
    config::RemoteConfig,
    error::{RemoteError, RemoteResult},
    store::KeyValueStore,
    types::EntityId,
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[async_trait]
pub trait RemoteDocumentService: Send + Sync {
    /// Whether credentials are present. Gates every sync attempt.
    fn is_configured(&self) -> bool;

    /// Create a new document and remember its id.
    async fn create(&self, data: &Value) -> RemoteResult<EntityId>;

    /// Read the current document. `NoDocumentId` means nothing has been
    /// pushed yet.
    async fn read(&self) -> RemoteResult<Value>;

    /// Overwrite the document, creating it on first use.
    async fn update(&self, data: &Value) -> RemoteResult<()>;
}

/// JSONBin-compatible HTTP backend.
pub struct JsonBinService {
    client: Client,
    config: RemoteConfig,
    kv: Arc<dyn KeyValueStore>,
    id_key: String,
    document_id: Mutex<Option<String>>,
}

impl JsonBinService {
    pub fn new(config: RemoteConfig, kv: Arc<dyn KeyValueStore>, id_key: impl Into<String>) -> Self {
        let id_key = id_key.into();
        // Pinned id from config wins over the cached one.
        let document_id = config.document_id.clone().or_else(|| match kv.get(&id_key) {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Could not read cached document id: {e}");
                None
            }
        });
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {e}");
                Client::new()
            });
        Self {
            client,
            config,
            kv,
            id_key,
            document_id: Mutex::new(document_id),
        }
    }

    pub fn document_id(&self) -> Option<String> {
        self.document_id.lock().ok().and_then(|id| id.clone())
    }

    pub fn has_document(&self) -> bool {
        self.document_id().is_some()
    }

    fn remember_document_id(&self, id: &str) {
        if let Ok(mut slot) = self.document_id.lock() {
            *slot = Some(id.to_string());
        }
        if let Err(e) = self.kv.set(&self.id_key, id) {
            log::warn!("Could not cache document id {id}: {e}");
        }
    }

    fn api_key(&self) -> RemoteResult<&str> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(RemoteError::NotConfigured),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

/// Turn a non-2xx response into `Rejected`, using the body's `message`
/// when the service sent one.
async fn rejected(response: Response, fallback: &str) -> RemoteError {
    let status = response.status().as_u16();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| fallback.to_string());
    RemoteError::Rejected { status, message }
}

fn transport(err: reqwest::Error) -> RemoteError {
    RemoteError::Transport(err.to_string())
}

#[async_trait]
impl RemoteDocumentService for JsonBinService {
    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    async fn create(&self, data: &Value) -> RemoteResult<EntityId> {
        let key = self.api_key()?;
        let mut request = self
            .client
            .post(self.url("/b"))
            .header("X-Master-Key", key)
            .header("X-Bin-Name", self.config.document_name.as_str())
            .header("X-Bin-Private", "true")
            .json(data);
        if let Some(collection) = &self.config.collection_id {
            request = request.header("X-Collection-Id", collection.as_str());
        }

        let response = request.send().await.map_err(transport)?;
        if !response.status().is_success() {
            return Err(rejected(response, "Failed to create bin").await);
        }
        let body: Value = response.json().await.map_err(transport)?;
        let id = body
            .pointer("/metadata/id")
            .and_then(Value::as_str)
            .ok_or_else(|| RemoteError::Malformed("create response has no metadata.id".into()))?
            .to_string();
        self.remember_document_id(&id);
        log::info!("Created remote document {id}");
        Ok(id)
    }

    async fn read(&self) -> RemoteResult<Value> {
        let key = self.api_key()?;
        let id = self.document_id().ok_or(RemoteError::NoDocumentId)?;

        let response = self
            .client
            .get(self.url(&format!("/b/{id}")))
            .header("X-Master-Key", key)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(rejected(response, "Failed to read bin").await);
        }
        let mut body: Value = response.json().await.map_err(transport)?;
        match body.get_mut("record") {
            Some(record) => Ok(record.take()),
            None => Err(RemoteError::Malformed("read response has no record".into())),
        }
    }

    async fn update(&self, data: &Value) -> RemoteResult<()> {
        let key = self.api_key()?;
        let Some(id) = self.document_id() else {
            self.create(data).await?;
            return Ok(());
        };

        let response = self
            .client
            .put(self.url(&format!("/b/{id}")))
            .header("X-Master-Key", key)
            .json(data)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(rejected(response, "Failed to update bin").await);
        }
        Ok(())
    }
}
