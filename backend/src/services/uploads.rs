//! Upload storage service
//!
//! Stores uploaded images under the upload directory with generated names and
//! reads them back for serving.

use crate::error::AppError;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use uuid::Uuid;

/// URL prefix under which stored uploads are served
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";

/// Fallback content type for unknown extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Upload storage service
pub struct UploadService;

impl UploadService {
    /// Generate a fresh stored filename, keeping the original extension
    ///
    /// # Arguments
    /// * `original_filename` - Name supplied by the client, if any
    ///
    /// # Returns
    /// * `<uuid>.<ext>` when the original has an extension, otherwise `<uuid>`
    pub fn stored_filename_for(original_filename: Option<&str>) -> String {
        let unique = Uuid::new_v4().simple().to_string();
        let extension = original_filename
            .map(Path::new)
            .and_then(|p| p.extension())
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty());

        match extension {
            Some(ext) => format!("{}.{}", unique, ext),
            None => unique,
        }
    }

    /// URL path for a stored filename
    pub fn url_for(stored_filename: &str) -> String {
        format!("{}{}", UPLOADS_URL_PREFIX, stored_filename)
    }

    /// Content type inferred from the file extension
    pub fn content_type_for(filename: &str) -> &'static str {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            _ => OCTET_STREAM,
        }
    }

    /// Resolve a requested filename inside the upload directory
    ///
    /// Only a single normal path component is accepted, so the result can
    /// never point outside `upload_dir`.
    pub fn resolve(upload_dir: &Path, filename: &str) -> Result<PathBuf, AppError> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !filename.contains('\\') => {
                Ok(upload_dir.join(name))
            }
            _ => Err(AppError::ImageNotFound(filename.to_string())),
        }
    }

    /// Write an uploaded image to the upload directory
    ///
    /// # Arguments
    /// * `upload_dir` - Directory to store the file in
    /// * `original_filename` - Client-supplied name, used only for its extension
    /// * `data` - File contents
    ///
    /// # Returns
    /// * `Ok(String)` - The generated stored filename
    /// * `Err(AppError::Upload)` - If the file could not be written
    pub async fn store_image(
        upload_dir: &Path,
        original_filename: Option<&str>,
        data: &[u8],
    ) -> Result<String, AppError> {
        let stored_filename = Self::stored_filename_for(original_filename);
        let file_path = upload_dir.join(&stored_filename);

        let write = async {
            let mut file = fs::File::create(&file_path).await?;
            file.write_all(data).await?;
            file.sync_all().await
        };

        if let Err(e) = write.await {
            // Best effort, the partial file is useless either way
            if let Err(cleanup) = fs::remove_file(&file_path).await {
                warn!(path = %file_path.display(), error = %cleanup, "Failed to remove partial upload");
            }
            return Err(AppError::Upload(format!(
                "Failed to write {}: {}",
                file_path.display(),
                e
            )));
        }

        info!(
            stored_filename = %stored_filename,
            bytes = data.len(),
            "Saved uploaded image"
        );
        Ok(stored_filename)
    }

    /// Read a stored upload
    ///
    /// # Returns
    /// * `Ok((bytes, content_type))`
    /// * `Err(AppError::ImageNotFound)` - If the name is invalid or the file is unreadable
    pub async fn read_image(
        upload_dir: &Path,
        filename: &str,
    ) -> Result<(Vec<u8>, &'static str), AppError> {
        let path = Self::resolve(upload_dir, filename)?;
        let data = fs::read(&path).await.map_err(|e| {
            warn!(path = %path.display(), error = %e, "Error serving image");
            AppError::ImageNotFound(filename.to_string())
        })?;

        Ok((data, Self::content_type_for(filename)))
    }
}
