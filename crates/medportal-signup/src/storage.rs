//! Profile image storage

use crate::session::ProfileImage;
use crate::StorageError;
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

pub const PROFILE_FOLDER: &str = "profile";
const DEFAULT_FOLDER: &str = "default";

/// Accepted extensions and their content types
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
];

#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// Store an image, returning its public reference
    async fn upload(&self, image: &ProfileImage, folder: Option<&str>) -> Result<String, StorageError>;

    /// Remove a previously uploaded image. Missing files are not an error.
    async fn delete(&self, reference: &str) -> Result<(), StorageError>;
}

/// Images on the local filesystem, served under `public_url`
#[derive(Clone, Debug)]
pub struct LocalImageStorage {
    base_path: PathBuf,
    public_url: String,
}

impl LocalImageStorage {
    pub fn new(base_path: impl Into<PathBuf>, public_url: &str) -> Self {
        Self {
            base_path: base_path.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    fn path_for(&self, reference: &str) -> Option<PathBuf> {
        let relative = reference
            .strip_prefix(&self.public_url)
            .unwrap_or(reference)
            .trim_start_matches('/');

        // Only plain `<folder>/<file>` references resolve
        let mut path = self.base_path.clone();
        for segment in relative.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }
}

/// Lowercased extension of an allowed image. A declared content type must
/// be an image type as well.
fn image_extension(image: &ProfileImage) -> Result<String, StorageError> {
    let ext = image
        .extension()
        .map(str::to_ascii_lowercase)
        .filter(|ext| IMAGE_TYPES.iter().any(|(allowed, _)| allowed == ext))
        .ok_or_else(|| StorageError::InvalidImage(format!("unsupported file: {}", image.file_name)))?;

    if let Some(content_type) = image.content_type.as_deref() {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if !IMAGE_TYPES.iter().any(|(_, allowed)| *allowed == mime) {
            return Err(StorageError::InvalidImage(format!(
                "unsupported content type: {content_type}"
            )));
        }
    }
    Ok(ext)
}

fn safe_segment(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[async_trait]
impl ImageStorage for LocalImageStorage {
    async fn upload(&self, image: &ProfileImage, folder: Option<&str>) -> Result<String, StorageError> {
        let folder = folder.unwrap_or(DEFAULT_FOLDER);
        if !safe_segment(folder) {
            return Err(StorageError::InvalidImage(format!("invalid folder: {folder}")));
        }
        let ext = image_extension(image)?;
        if image.bytes.is_empty() {
            return Err(StorageError::InvalidImage("empty file".to_string()));
        }

        let dir = self.base_path.join(folder);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let filepath = dir.join(&filename);
        tokio::fs::write(&filepath, &image.bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: filepath.display().to_string(),
                source,
            })?;

        tracing::debug!("Stored image {} ({} bytes)", filepath.display(), image.bytes.len());
        Ok(format!("{}/{}/{}", self.public_url, folder, filename))
    }

    async fn delete(&self, reference: &str) -> Result<(), StorageError> {
        let Some(path) = self.path_for(reference) else {
            tracing::warn!("Refusing to delete image outside storage: {}", reference);
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Delete {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}
