//! Image upload: multipart in, file on disk, public URL out.
//!
//! The accepted type is decided by sniffing magic bytes, never by the
//! filename or the client-declared content type.

use crate::auth::AdminClaims;
use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageType {
    pub fn mime(self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
            ImageType::Gif => "image/gif",
            ImageType::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageType::Jpeg => "jpg",
            ImageType::Png => "png",
            ImageType::Gif => "gif",
            ImageType::Webp => "webp",
        }
    }
}

/// Identify the image format from its leading bytes.
pub fn sniff_image_type(data: &[u8]) -> Option<ImageType> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageType::Jpeg);
    }
    if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(ImageType::Png);
    }
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        return Some(ImageType::Gif);
    }
    if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
        return Some(ImageType::Webp);
    }
    None
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub url: String,
    pub filename: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub content_type: &'static str,
}

/// POST /api/upload — multipart with an `image` file field.
pub async fn upload(
    _claims: AdminClaims,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut image: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| AppError::BadRequest("malformed multipart body".into()))?
    {
        if field.name() == Some("image") {
            let data = field
                .bytes()
                .await
                .map_err(|_| AppError::BadRequest("file too large or truncated upload".into()))?;
            image = Some(data.to_vec());
            break;
        }
    }
    let data = image.ok_or_else(|| AppError::BadRequest("no image provided".into()))?;

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::BadRequest("file too large (max 5MB)".into()));
    }
    let image_type = sniff_image_type(&data).ok_or_else(|| {
        AppError::BadRequest("unsupported file type (JPG, PNG, GIF, WEBP only)".into())
    })?;

    let filename = format!("img_{}.{}", Uuid::new_v4(), image_type.extension());
    write_upload(&state.config.upload_dir, &filename, &data).await?;

    let url = format!("{}/uploads/{}", state.config.public_base_url, filename);
    tracing::debug!(%filename, size = data.len(), "stored upload");
    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url,
            filename,
            size: data.len(),
            content_type: image_type.mime(),
        }),
    ))
}

/// Write the file under `dir`, creating the directory on demand.
async fn write_upload(dir: &Path, filename: &str, data: &[u8]) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_the_four_accepted_formats() {
        assert_eq!(sniff_image_type(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageType::Jpeg));
        assert_eq!(
            sniff_image_type(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0x00]),
            Some(ImageType::Png)
        );
        assert_eq!(sniff_image_type(b"GIF89a...."), Some(ImageType::Gif));

        let mut webp = Vec::from(*b"RIFF");
        webp.extend_from_slice(&[0x24, 0x00, 0x00, 0x00]);
        webp.extend_from_slice(b"WEBP");
        assert_eq!(sniff_image_type(&webp), Some(ImageType::Webp));
    }

    #[test]
    fn rejects_everything_else() {
        assert_eq!(sniff_image_type(b"<svg xmlns=..."), None);
        assert_eq!(sniff_image_type(b"%PDF-1.4"), None);
        assert_eq!(sniff_image_type(b"RIFF....WAVE"), None);
        assert_eq!(sniff_image_type(b""), None);
    }

    #[test]
    fn extension_follows_sniffed_type_not_filename() {
        assert_eq!(ImageType::Jpeg.extension(), "jpg");
        assert_eq!(ImageType::Jpeg.mime(), "image/jpeg");
        assert_eq!(ImageType::Webp.extension(), "webp");
    }

    #[tokio::test]
    async fn write_upload_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("uploads");
        let path = write_upload(&nested, "img_test.png", b"fake bytes")
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"fake bytes");
    }
}
