use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::ImageFormat;
use log::{info, warn};
use uuid::Uuid;

use crate::{
    api::error,
    constants::DEFAULT_PROFILE_PIC,
    modules::{
        profile_pic::model::{ProfilePicResponse, UploadConfig},
        user::{model::profile_pic_url, repository::UserRepository},
    },
};

/// Decodes `bytes` and shrinks the image to fit within `size`x`size`,
/// keeping its aspect ratio. Returns the encoded thumbnail and its extension.
pub fn make_thumbnail(
    bytes: &[u8],
    mime_type: &str,
    size: u32,
) -> Result<(Vec<u8>, &'static str), error::SystemError> {
    let format = ImageFormat::from_mime_type(mime_type).ok_or_else(|| {
        error::SystemError::bad_request(format!("File type '{mime_type}' is not allowed"))
    })?;

    let thumbnail = image::load_from_memory_with_format(bytes, format)?.thumbnail(size, size);

    let mut out = Cursor::new(Vec::new());
    thumbnail.write_to(&mut out, format)?;

    let extension = format.extensions_str().first().copied().unwrap_or("img");
    Ok((out.into_inner(), extension))
}

/// Only plain generated names are ever served or removed.
pub fn is_stored_name(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.starts_with('.')
        && filename.chars().all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-')
}

/// Best effort removal of a stored picture. The shared default is kept.
pub async fn remove_stored_picture(upload_dir: &str, filename: &str) {
    if filename == DEFAULT_PROFILE_PIC || !is_stored_name(filename) {
        return;
    }

    let path = Path::new(upload_dir).join(filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => info!("Removed profile picture {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to remove profile picture {}: {}", path.display(), e),
    }
}

#[derive(Clone)]
pub struct ProfilePicService<U>
where
    U: UserRepository + Send + Sync,
{
    user_repo: Arc<U>,
    config: UploadConfig,
}

impl<U> ProfilePicService<U>
where
    U: UserRepository + Send + Sync,
{
    pub fn new(user_repo: Arc<U>, config: UploadConfig) -> Self {
        info!("ProfilePicService storing pictures in {}", config.upload_dir);
        Self { user_repo, config }
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    fn validate_file(&self, file_size: usize, mime_type: &str) -> Result<(), error::SystemError> {
        if file_size > self.config.max_file_size {
            return Err(error::SystemError::payload_too_large(format!(
                "File size exceeds maximum allowed size of {} bytes",
                self.config.max_file_size
            )));
        }

        if !self.config.allowed_mime_types.iter().any(|m| m == mime_type) {
            return Err(error::SystemError::bad_request(format!(
                "File type '{}' is not allowed",
                mime_type
            )));
        }

        Ok(())
    }

    fn generate_filename(extension: &str) -> String {
        format!("{:016x}.{}", rand::random::<u64>(), extension)
    }

    /// Stores a thumbnail of the upload as the user's picture and removes the
    /// one it replaces.
    pub async fn upload(
        &self,
        user_id: Uuid,
        bytes: Vec<u8>,
        mime_type: String,
    ) -> Result<ProfilePicResponse, error::SystemError> {
        self.validate_file(bytes.len(), &mime_type)?;

        let size = self.config.thumbnail_size;
        let (thumbnail, extension) =
            actix_web::web::block(move || make_thumbnail(&bytes, &mime_type, size))
                .await
                .map_err(|e| error::SystemError::InternalError(Box::new(e)))??;

        let filename = Self::generate_filename(extension);
        tokio::fs::create_dir_all(&self.config.upload_dir).await?;
        tokio::fs::write(Path::new(&self.config.upload_dir).join(&filename), &thumbnail).await?;

        let previous = match self.user_repo.replace_profile_pic(&user_id, &filename).await {
            Ok(previous) => previous,
            Err(e) => {
                remove_stored_picture(&self.config.upload_dir, &filename).await;
                return Err(e);
            }
        };
        remove_stored_picture(&self.config.upload_dir, &previous).await;

        info!("User {} changed profile picture to {}", user_id, filename);
        Ok(ProfilePicResponse { profile_pic_url: profile_pic_url(&filename) })
    }
}
