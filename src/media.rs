//! Disk-backed media storage.
//!
//! Uploads land in a temp area first, then move under a folder keyed by a
//! generated public id; the public URL is the base URL plus that id. Deletion
//! is best-effort everywhere it is used as a cascade step.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use futures_util::TryStreamExt;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::{ApiError, ApiResult};

/// Per-file upload cap (bytes). Generous enough for raw video.
const MAX_UPLOAD_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    base_url: String,
}

/// A stored media object: where clients fetch it and the id deletion uses.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    pub url: String,
    pub public_id: String,
}

/// A multipart file parked in the temp area, not yet committed.
#[derive(Debug)]
pub struct TempFile {
    pub path: PathBuf,
    pub original_name: String,
    pub size: u64,
}

impl Drop for TempFile {
    fn drop(&mut self) {
        // Gone already if the upload was committed.
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Text fields and files of one multipart form.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, TempFile>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn require_text(&self, name: &str) -> ApiResult<String> {
        self.fields
            .get(name)
            .map(String::clone)
            .ok_or_else(|| ApiError::invalid(name, format!("{name} is required")))
    }

    pub fn take_file(&mut self, name: &str) -> Option<TempFile> {
        self.files.remove(name)
    }

    pub fn require_file(&mut self, name: &str) -> ApiResult<TempFile> {
        self.take_file(name)
            .ok_or_else(|| ApiError::invalid(name, format!("{name} file is required")))
    }
}

impl MediaStore {
    pub fn new(cfg: &MediaConfig) -> std::io::Result<Self> {
        let root = PathBuf::from(&cfg.root);
        std::fs::create_dir_all(root.join("tmp"))?;
        Ok(Self {
            root,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Drain a multipart payload: text fields collected as strings, files
    /// spooled into the temp area.
    pub async fn read_form(&self, mut payload: Multipart) -> ApiResult<UploadForm> {
        let mut form = UploadForm::default();

        while let Some(mut field) = payload
            .try_next()
            .await
            .map_err(|e| ApiError::BadRequest(format!("malformed multipart payload: {e}")))?
        {
            let name = field.name().to_string();
            let filename = field
                .content_disposition()
                .get_filename()
                .map(str::to_string);

            match filename {
                Some(original_name) => {
                    let temp_path = self.root.join("tmp").join(Uuid::new_v4().simple().to_string());
                    let mut file = tokio::fs::File::create(&temp_path).await?;
                    let mut size: u64 = 0;

                    while let Some(chunk) = field
                        .try_next()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("upload stream failed: {e}")))?
                    {
                        size += chunk.len() as u64;
                        if size > MAX_UPLOAD_BYTES {
                            drop(file);
                            let _ = tokio::fs::remove_file(&temp_path).await;
                            return Err(ApiError::invalid(&name, "file exceeds the upload limit"));
                        }
                        file.write_all(&chunk).await?;
                    }
                    file.flush().await?;

                    form.files.insert(
                        name,
                        TempFile {
                            path: temp_path,
                            original_name,
                            size,
                        },
                    );
                }
                None => {
                    let mut value = Vec::new();
                    while let Some(chunk) = field
                        .try_next()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("upload stream failed: {e}")))?
                    {
                        value.extend_from_slice(&chunk);
                    }
                    let text = String::from_utf8(value)
                        .map_err(|_| ApiError::invalid(&name, "field must be valid UTF-8"))?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    /// Commit a temp file under `folder`; returns the public URL and id.
    pub async fn commit(&self, temp: TempFile, folder: &str) -> ApiResult<MediaAsset> {
        let extension = Path::new(&temp.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();
        let public_id = format!("{folder}/{}{extension}", Uuid::new_v4().simple());

        let target = self.root.join(&public_id);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&temp.path, &target).await?;

        Ok(MediaAsset {
            url: format!("{}/{public_id}", self.base_url),
            public_id,
        })
    }

    pub async fn delete(&self, public_id: &str) -> ApiResult<()> {
        tokio::fs::remove_file(self.root.join(public_id)).await?;
        Ok(())
    }

    /// Cascade/replacement flavor: failure is logged, never propagated.
    pub async fn delete_best_effort(&self, public_id: &str) -> bool {
        match self.delete(public_id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("media deletion failed for {public_id}: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &tempfile::TempDir) -> MediaStore {
        MediaStore::new(&MediaConfig {
            root: dir.path().to_string_lossy().into_owned(),
            base_url: "http://localhost:8080/media/".into(),
        })
        .unwrap()
    }

    fn temp_file(store_root: &Path, name: &str, contents: &[u8]) -> TempFile {
        let path = store_root.join("tmp").join(Uuid::new_v4().simple().to_string());
        std::fs::write(&path, contents).unwrap();
        TempFile {
            path,
            original_name: name.to_string(),
            size: contents.len() as u64,
        }
    }

    #[tokio::test]
    async fn commit_moves_file_and_builds_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let temp = temp_file(dir.path(), "clip.mp4", b"fake video bytes");

        let asset = store.commit(temp, "videos").await.unwrap();
        assert!(asset.public_id.starts_with("videos/"));
        assert!(asset.public_id.ends_with(".mp4"));
        assert_eq!(
            asset.url,
            format!("http://localhost:8080/media/{}", asset.public_id)
        );
        assert!(dir.path().join(&asset.public_id).exists());
    }

    #[tokio::test]
    async fn delete_removes_committed_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let temp = temp_file(dir.path(), "thumb.jpg", b"jpg");

        let asset = store.commit(temp, "thumbnails").await.unwrap();
        assert!(store.delete_best_effort(&asset.public_id).await);
        assert!(!dir.path().join(&asset.public_id).exists());
    }

    #[tokio::test]
    async fn best_effort_delete_swallows_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        assert!(!store.delete_best_effort("videos/never-existed.mp4").await);
    }

    #[tokio::test]
    async fn dropped_temp_files_are_cleaned_up() {
        let dir = tempfile::tempdir().unwrap();
        let _store = store(&dir);
        let path = {
            let temp = temp_file(dir.path(), "orphan.bin", b"bytes");
            temp.path.clone()
        };
        assert!(!path.exists());
    }
}
