//! File-backed element store.
//!
//! Layout under the session root:
//!
//! ```text
//! elements.json            ["fire", "water", "steam"]
//! pair_memo.json           [{"first": "fire", "second": "water", "result": "steam"}]
//! images/<hex(name)>.png   one image per element name
//! key.config               generative service credential, plain text
//! ```
//!
//! Every write goes to a uniquely named temporary file in the same directory
//! and is renamed into place.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use alchemy_domain::{ElementImage, ElementName};

use crate::infrastructure::ports::{ElementStorePort, PairMemoEntry, StoreError};

const ELEMENTS_FILE: &str = "elements.json";
const PAIR_MEMO_FILE: &str = "pair_memo.json";
const IMAGES_DIR: &str = "images";
const CREDENTIAL_FILE: &str = "key.config";

pub struct FileElementStore {
    root: PathBuf,
}

impl FileElementStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn image_path(&self, name: &ElementName) -> PathBuf {
        self.root
            .join(IMAGES_DIR)
            .join(format!("{}.png", hex::encode(name.as_str().as_bytes())))
    }

    async fn read_json<T: serde::de::DeserializeOwned + Default>(
        &self,
        file: &str,
        operation: &'static str,
    ) -> Result<T, StoreError> {
        match read_optional(&self.root.join(file), operation).await? {
            Some(bytes) => serde_json::from_slice(&bytes).map_err(StoreError::serialization),
            None => Ok(T::default()),
        }
    }

    async fn write_json<T: serde::Serialize + ?Sized>(
        &self,
        file: &str,
        value: &T,
        operation: &'static str,
    ) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(StoreError::serialization)?;
        write_atomic(&self.root.join(file), &bytes, operation).await
    }
}

#[async_trait]
impl ElementStorePort for FileElementStore {
    async fn load_element_names(&self) -> Result<Vec<ElementName>, StoreError> {
        self.read_json(ELEMENTS_FILE, "load_element_names").await
    }

    async fn save_element_names(&self, names: &[ElementName]) -> Result<(), StoreError> {
        self.write_json(ELEMENTS_FILE, names, "save_element_names")
            .await
    }

    async fn load_pair_memo(&self) -> Result<Vec<PairMemoEntry>, StoreError> {
        self.read_json(PAIR_MEMO_FILE, "load_pair_memo").await
    }

    async fn save_pair_memo(&self, entries: &[PairMemoEntry]) -> Result<(), StoreError> {
        self.write_json(PAIR_MEMO_FILE, entries, "save_pair_memo")
            .await
    }

    async fn save_image(&self, name: &ElementName, image: &ElementImage) -> Result<(), StoreError> {
        write_atomic(&self.image_path(name), image.as_bytes(), "save_image").await
    }

    async fn load_image(&self, name: &ElementName) -> Result<Option<ElementImage>, StoreError> {
        Ok(read_optional(&self.image_path(name), "load_image")
            .await?
            .map(ElementImage::from))
    }

    async fn has_image(&self, name: &ElementName) -> Result<bool, StoreError> {
        tokio::fs::try_exists(self.image_path(name))
            .await
            .map_err(|e| StoreError::io("has_image", e))
    }

    /// Removes elements, memo and images. The credential is a setting, not a
    /// save, and survives.
    async fn clear(&self) -> Result<(), StoreError> {
        for file in [ELEMENTS_FILE, PAIR_MEMO_FILE] {
            match tokio::fs::remove_file(self.root.join(file)).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::io("clear", e)),
            }
        }
        match tokio::fs::remove_dir_all(self.root.join(IMAGES_DIR)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io("clear", e)),
        }
        tracing::info!(root = %self.root.display(), "Removed all save files");
        Ok(())
    }

    async fn load_credential(&self) -> Result<Option<String>, StoreError> {
        let Some(bytes) = read_optional(&self.root.join(CREDENTIAL_FILE), "load_credential").await?
        else {
            tracing::debug!("No key.config found");
            return Ok(None);
        };
        let credential = String::from_utf8(bytes).map_err(StoreError::serialization)?;
        let credential = credential.trim();
        Ok((!credential.is_empty()).then(|| credential.to_string()))
    }

    async fn save_credential(&self, credential: &str) -> Result<(), StoreError> {
        write_atomic(
            &self.root.join(CREDENTIAL_FILE),
            credential.trim().as_bytes(),
            "save_credential",
        )
        .await
    }
}

async fn read_optional(path: &Path, operation: &'static str) -> Result<Option<Vec<u8>>, StoreError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(operation, format!("{}: {}", path.display(), e))),
    }
}

async fn write_atomic(path: &Path, bytes: &[u8], operation: &'static str) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| StoreError::io(operation, format!("{} has no parent", path.display())))?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| StoreError::io(operation, format!("{}: {}", parent.display(), e)))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = parent.join(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| StoreError::io(operation, format!("{}: {}", tmp.display(), e)))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(StoreError::io(
            operation,
            format!("{}: {}", path.display(), e),
        ));
    }
    Ok(())
}
