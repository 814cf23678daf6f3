//! Shop logo and banner images.

use reqwest::Method;
use reqwest::multipart::{Form, Part};
use tracing::instrument;

use super::Store;
use crate::error::{ClientError, action};

/// A file to upload as multipart form data.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    /// Wrap file contents, guessing the content type from the extension.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = image_content_type(&file_name).map(str::to_owned);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    fn into_part(self) -> Result<Part, ClientError> {
        let part = Part::bytes(self.bytes).file_name(self.file_name);
        match self.content_type {
            Some(content_type) => Ok(part.mime_str(&content_type)?),
            None => Ok(part),
        }
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// The shop logo as served.
#[derive(Clone, PartialEq, Eq)]
pub struct Logo {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl std::fmt::Debug for Logo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logo")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn image_content_type(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

impl Store {
    /// Replace the shop logo (multipart field `logo`).
    ///
    /// # Errors
    ///
    /// Returns the request error.
    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    pub async fn upload_logo(&self, file: Upload) -> Result<(), ClientError> {
        let form = Form::new().part("logo", file.into_part()?);
        let token = self.token().await;
        let request = self
            .inner
            .api
            .request(Method::POST, &["logoBanner", "upload-logo"], token.as_ref())?
            .multipart(form);

        self.inner.api.send_bytes(request, action::UPLOAD_LOGO).await?;
        tracing::info!("Logo uploaded successfully");
        Ok(())
    }

    /// Download the shop logo.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    #[instrument(skip(self))]
    pub async fn logo(&self) -> Result<Logo, ClientError> {
        let request = self
            .inner
            .api
            .request(Method::GET, &["logoBanner", "logo"], None)?;
        let (bytes, content_type) = self.inner.api.send_bytes(request, action::FETCH_LOGO).await?;
        Ok(Logo {
            bytes,
            content_type,
        })
    }

    /// Replace the banner images (one multipart field `banner` per file).
    ///
    /// # Errors
    ///
    /// Returns the request error.
    #[instrument(skip(self, files), fields(count = files.len()))]
    pub async fn upload_banner_images(&self, files: Vec<Upload>) -> Result<(), ClientError> {
        let mut form = Form::new();
        for file in files {
            form = form.part("banner", file.into_part()?);
        }

        let token = self.token().await;
        let request = self
            .inner
            .api
            .request(Method::POST, &["logoBanner", "upload-banner"], token.as_ref())?
            .multipart(form);

        self.inner
            .api
            .send_bytes(request, action::UPLOAD_BANNERS)
            .await?;
        tracing::info!("Banner images uploaded successfully");
        Ok(())
    }

    /// Banner image listing, as the backend renders it.
    ///
    /// # Errors
    ///
    /// Returns the request error.
    #[instrument(skip(self))]
    pub async fn banner_images(&self) -> Result<serde_json::Value, ClientError> {
        let request = self
            .inner
            .api
            .request(Method::GET, &["logoBanner", "banner"], None)?;
        self.inner.api.send_json(request, action::FETCH_BANNERS).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_from_extension() {
        assert_eq!(image_content_type("logo.PNG"), Some("image/png"));
        assert_eq!(image_content_type("a.b.jpeg"), Some("image/jpeg"));
        assert_eq!(image_content_type("notes.txt"), None);
        assert_eq!(image_content_type("no-extension"), None);
    }

    #[test]
    fn test_upload_debug_hides_contents() {
        let upload = Upload::new("banner.webp", vec![1, 2, 3]);
        assert_eq!(upload.content_type.as_deref(), Some("image/webp"));
        let debug = format!("{upload:?}");
        assert!(debug.contains("len: 3"));
        assert!(!debug.contains("[1, 2, 3]"));
    }
}
