//! Use case for sharing a local photo: upload it, then post its URL.

use std::path::Path;

use super::send_message::{send_photo, MessageStore, SendMessageError};

/// Errors that can occur at the source level (blob storage).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageSourceError {
    /// The local file could not be read.
    LocalRead { message: String },
    Unauthorized,
    Rejected { code: String },
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPhotoError {
    /// The picked path does not name a readable file.
    InvalidPath,
    Upload(StorageSourceError),
    Send(SendMessageError),
}

/// Stores photos under a flat namespace and hands back fetchable URLs.
pub trait PhotoStorage {
    /// Uploads the file at `path` as `file_name` and returns its download URL.
    fn upload_photo(&self, path: &Path, file_name: &str) -> Result<String, StorageSourceError>;
}

impl<T: PhotoStorage + ?Sized> PhotoStorage for &T {
    fn upload_photo(&self, path: &Path, file_name: &str) -> Result<String, StorageSourceError> {
        (*self).upload_photo(path, file_name)
    }
}

/// Name the photo is stored under: the last component of the picked path.
pub fn photo_file_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.trim().is_empty())
}

/// Uploads the photo and posts a message pointing at it.
///
/// Returns the key of the posted message.
pub fn upload_and_send_photo<B>(
    backend: &B,
    author: &str,
    path: &Path,
) -> Result<String, UploadPhotoError>
where
    B: PhotoStorage + MessageStore,
{
    if !path.is_file() {
        return Err(UploadPhotoError::InvalidPath);
    }
    let file_name = photo_file_name(path).ok_or(UploadPhotoError::InvalidPath)?;

    let url = backend
        .upload_photo(path, &file_name)
        .map_err(UploadPhotoError::Upload)?;

    tracing::debug!(file_name = %file_name, "photo uploaded, posting photo message");

    send_photo(backend, author, &url).map_err(UploadPhotoError::Send)
}
