//! Persistence contracts and reference stores.
//!
//! The engine only ever talks to the [`PersistenceGateway`] key-value
//! contract and the [`BlobStorage`] contract; records cross the boundary
//! as plain JSON values with no back-references to live state. Two
//! reference gateways ship with the crate: an in-memory one for tests and
//! a JSON-file one for local use.

use crate::error::{PaintError, Result};
use crate::game::FilledRegion;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Size cap for plain blob uploads.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Artworks,
    Drafts,
    Settings,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Artworks => "artworks",
            StoreKind::Drafts => "drafts",
            StoreKind::Settings => "settings",
        }
    }
}

/// Key-value persistence consumed by the game engine. Implementations
/// must store plain structured records; a failed operation reports an
/// error without corrupting previously stored data.
pub trait PersistenceGateway {
    fn put(&mut self, store: StoreKind, key: &str, value: Value) -> Result<()>;
    fn get(&self, store: StoreKind, key: &str) -> Result<Option<Value>>;
    fn get_all(&self, store: StoreKind) -> Result<Vec<Value>>;
    fn delete(&mut self, store: StoreKind, key: &str) -> Result<()>;

    /// Records whose top-level `index` field equals `needle`. Used for
    /// "artworks by templateId".
    fn query_by_index(&self, store: StoreKind, index: &str, needle: &str) -> Result<Vec<Value>> {
        Ok(self
            .get_all(store)?
            .into_iter()
            .filter(|v| v.get(index).and_then(Value::as_str) == Some(needle))
            .collect())
    }
}

/// Blob/image storage consumed by template generation and artwork save.
pub trait BlobStorage {
    fn upload(
        &mut self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<StoredBlob>;
    fn get_public_url(&self, bucket: &str, path: &str) -> String;
    fn remove(&mut self, bucket: &str, path: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub path: String,
    pub public_url: String,
}

/// Play-session payload, discriminated explicitly by mode — numbered-region
/// progress and freehand canvases never share fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ArtworkContent {
    #[serde(rename_all = "camelCase")]
    NumberedRegion {
        filled_regions: Vec<FilledRegion>,
        mistakes_count: u32,
    },
    #[serde(rename_all = "camelCase")]
    Freehand { canvas_data_url: String },
}

/// Durable result of a play session. Repeated saves against the same
/// template update one record (latest wins), they do not accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artwork {
    pub id: String,
    pub template_id: String,
    pub title: String,
    pub thumbnail_data_url: String,
    pub content: ArtworkContent,
    /// 0–100
    pub progress: u32,
    pub created_at: u64,
    pub updated_at: u64,
    pub is_synced: bool,
}

/// Lightweight autosave keyed by template id, overwritten on every tick.
/// Exists only for "resume where I left off"; an [`Artwork`] is the
/// explicit snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub template_id: String,
    pub content: ArtworkContent,
    pub updated_at: u64,
}

pub fn to_record<T: Serialize>(record: &T) -> Result<Value> {
    serde_json::to_value(record).map_err(|e| PaintError::persistence(e.to_string()))
}

pub fn from_record<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| PaintError::persistence(e.to_string()))
}

/// In-memory gateway for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    artworks: HashMap<String, Value>,
    drafts: HashMap<String, Value>,
    settings: HashMap<String, Value>,
    /// Test hook: when set, writes fail with a persistence error while
    /// reads keep working.
    pub fail_writes: bool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, store: StoreKind) -> &HashMap<String, Value> {
        match store {
            StoreKind::Artworks => &self.artworks,
            StoreKind::Drafts => &self.drafts,
            StoreKind::Settings => &self.settings,
        }
    }

    fn map_mut(&mut self, store: StoreKind) -> &mut HashMap<String, Value> {
        match store {
            StoreKind::Artworks => &mut self.artworks,
            StoreKind::Drafts => &mut self.drafts,
            StoreKind::Settings => &mut self.settings,
        }
    }
}

impl PersistenceGateway for MemoryGateway {
    fn put(&mut self, store: StoreKind, key: &str, value: Value) -> Result<()> {
        if self.fail_writes {
            return Err(PaintError::persistence("write failure injected"));
        }
        self.map_mut(store).insert(key.to_string(), value);
        Ok(())
    }

    fn get(&self, store: StoreKind, key: &str) -> Result<Option<Value>> {
        Ok(self.map(store).get(key).cloned())
    }

    fn get_all(&self, store: StoreKind) -> Result<Vec<Value>> {
        Ok(self.map(store).values().cloned().collect())
    }

    fn delete(&mut self, store: StoreKind, key: &str) -> Result<()> {
        if self.fail_writes {
            return Err(PaintError::persistence("write failure injected"));
        }
        self.map_mut(store).remove(key);
        Ok(())
    }
}

/// File-backed gateway: one JSON document per store under a root
/// directory. Each write rewrites the whole store document, which keeps
/// last-write-wins semantics trivially correct.
#[derive(Debug)]
pub struct JsonFileGateway {
    root: PathBuf,
}

impl JsonFileGateway {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| PaintError::persistence(e.to_string()))?;
        Ok(JsonFileGateway { root })
    }

    fn store_path(&self, store: StoreKind) -> PathBuf {
        self.root.join(format!("{}.json", store.as_str()))
    }

    fn load_store(&self, store: StoreKind) -> Result<HashMap<String, Value>> {
        let path = self.store_path(store);
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let text = fs::read_to_string(&path).map_err(|e| PaintError::persistence(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| PaintError::persistence(e.to_string()))
    }

    fn save_store(&self, store: StoreKind, records: &HashMap<String, Value>) -> Result<()> {
        let text = serde_json::to_string_pretty(records)
            .map_err(|e| PaintError::persistence(e.to_string()))?;
        fs::write(self.store_path(store), text).map_err(|e| PaintError::persistence(e.to_string()))
    }
}

impl PersistenceGateway for JsonFileGateway {
    fn put(&mut self, store: StoreKind, key: &str, value: Value) -> Result<()> {
        let mut records = self.load_store(store)?;
        records.insert(key.to_string(), value);
        self.save_store(store, &records)
    }

    fn get(&self, store: StoreKind, key: &str) -> Result<Option<Value>> {
        Ok(self.load_store(store)?.get(key).cloned())
    }

    fn get_all(&self, store: StoreKind) -> Result<Vec<Value>> {
        Ok(self.load_store(store)?.into_values().collect())
    }

    fn delete(&mut self, store: StoreKind, key: &str) -> Result<()> {
        let mut records = self.load_store(store)?;
        if records.remove(key).is_some() {
            self.save_store(store, &records)?;
        }
        Ok(())
    }
}

/// Directory-backed blob store; public URLs are file paths.
#[derive(Debug)]
pub struct DirBlobStorage {
    root: PathBuf,
}

impl DirBlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| PaintError::persistence(e.to_string()))?;
        Ok(DirBlobStorage { root })
    }

    fn blob_path(&self, bucket: &str, path: &str) -> PathBuf {
        self.root.join(bucket).join(path)
    }
}

impl BlobStorage for DirBlobStorage {
    fn upload(
        &mut self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<StoredBlob> {
        if bytes.is_empty() {
            return Err(PaintError::validation("file", "empty"));
        }
        if bytes.len() > MAX_UPLOAD_BYTES {
            return Err(PaintError::validation(
                "file",
                format!("{} bytes exceeds {}", bytes.len(), MAX_UPLOAD_BYTES),
            ));
        }

        let full = self.blob_path(bucket, path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| PaintError::persistence(e.to_string()))?;
        }
        fs::write(&full, bytes).map_err(|e| PaintError::persistence(e.to_string()))?;

        Ok(StoredBlob {
            path: format!("{}/{}", bucket, path),
            public_url: self.get_public_url(bucket, path),
        })
    }

    fn get_public_url(&self, bucket: &str, path: &str) -> String {
        format!("file://{}", self.blob_path(bucket, path).display())
    }

    fn remove(&mut self, bucket: &str, path: &str) -> Result<()> {
        let full = self.blob_path(bucket, path);
        if full.exists() {
            fs::remove_file(full).map_err(|e| PaintError::persistence(e.to_string()))?;
        }
        Ok(())
    }
}
