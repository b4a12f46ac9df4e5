/// An uploaded document as received from the route layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    /// Declared media type (e.g. `image/jpeg`, `application/pdf`).
    pub media_type: String,
    pub file_name: String,
}

impl UploadedFile {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            file_name: file_name.into(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        is_pdf_media_type(&self.media_type)
    }
}

/// True for `application/pdf`, ignoring case and media type parameters.
pub fn is_pdf_media_type(media_type: &str) -> bool {
    media_type
        .split(';')
        .next()
        .map(|essence| essence.trim().eq_ignore_ascii_case("application/pdf"))
        .unwrap_or(false)
}
