use std::time::Duration;

use reqwest::blocking::multipart::{Form, Part};
use serde::{Deserialize, Serialize};

use super::StorageError;
use crate::models::UploadedFile;

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";
const DEFAULT_FOLDER: &str = "pneumonia-xrays";
const UPLOAD_TAGS: &str = "pneumonia-detection,xray";
const UPLOAD_TIMEOUT_SECS: u64 = 30;

/// Where an uploaded image ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub url: String,
    pub public_id: String,
}

/// Object storage for analysed images.
pub trait ImageStore: Send + Sync {
    fn upload(&self, image: &UploadedFile, public_id: &str) -> Result<StoredImage, StorageError>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

/// Unsigned Cloudinary uploads through an upload preset.
pub struct CloudinaryStore {
    upload_url: String,
    upload_preset: String,
    folder: String,
    client: reqwest::blocking::Client,
}

impl CloudinaryStore {
    pub fn new(cloud_name: &str, upload_preset: &str) -> Result<Self, StorageError> {
        Self::with_api_base(CLOUDINARY_API, cloud_name, upload_preset)
    }

    /// Same as [`CloudinaryStore::new`] against a different API host.
    pub fn with_api_base(
        api_base: &str,
        cloud_name: &str,
        upload_preset: &str,
    ) -> Result<Self, StorageError> {
        if cloud_name.trim().is_empty() || upload_preset.trim().is_empty() {
            return Err(StorageError::NotConfigured);
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
            .build()
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        Ok(Self {
            upload_url: format!(
                "{}/{}/image/upload",
                api_base.trim_end_matches('/'),
                cloud_name.trim()
            ),
            upload_preset: upload_preset.trim().to_string(),
            folder: DEFAULT_FOLDER.to_string(),
            client,
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }
}

impl ImageStore for CloudinaryStore {
    fn upload(&self, image: &UploadedFile, public_id: &str) -> Result<StoredImage, StorageError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.media_type)
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("upload_preset", self.upload_preset.clone())
            .text("public_id", public_id.to_string())
            .text("folder", self.folder.clone())
            .text("tags", UPLOAD_TAGS);

        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .map_err(|e| StorageError::Upload(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(StorageError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UploadResponse = response
            .json()
            .map_err(|e| StorageError::Upload(format!("unreadable upload response: {e}")))?;

        tracing::info!(public_id = %parsed.public_id, "Storage: image uploaded");

        Ok(StoredImage {
            url: parsed.secure_url,
            public_id: parsed.public_id,
        })
    }
}
