use serde::Serialize;

use crate::{constants::PROFILE_PIC_SIZE, ENV};

/// Profile picture upload configuration
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub max_file_size: usize,
    pub allowed_mime_types: Vec<String>,
    pub upload_dir: String,
    /// Longest edge of the stored thumbnail, in pixels.
    pub thumbnail_size: u32,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            max_file_size: ENV.max_upload_size,
            upload_dir: ENV.upload_dir.clone(),
            ..Default::default()
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024, // 5MB
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/gif".to_string(),
                "image/webp".to_string(),
            ],
            upload_dir: "./uploads/profile_pics".to_string(),
            thumbnail_size: PROFILE_PIC_SIZE,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfilePicResponse {
    pub profile_pic_url: String,
}
