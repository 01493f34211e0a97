//! Image upload handlers
//!
//! Uploads are decoded, re-encoded as JPEG and named after the SHA-256 of
//! the encoded bytes, so the same picture uploaded twice maps to one file.

use std::io::Cursor;
use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Multipart, Path, State};
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared::error::{AppError, ErrorCode};

use crate::api::{ApiResult, ok, ok_message};
use crate::audit_log;
use crate::auth::AdminUser;
use crate::state::AppState;

/// Maximum file size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Request body limit: file plus multipart framing
pub const MAX_BODY_SIZE: usize = MAX_FILE_SIZE + 64 * 1024;

const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

const JPEG_QUALITY: u8 = 85;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub url: String,
    pub size: usize,
    /// False when identical content was already stored
    pub created: bool,
}

fn calculate_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Extension check plus a MIME sanity check on the client's filename
fn check_extension(filename: &str) -> Result<String, AppError> {
    let ext = FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::InvalidFileExtension,
                format!("Invalid file extension for: {filename}"),
            )
        })?;

    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!(
                "Unsupported file format '{ext}'. Supported: {}",
                SUPPORTED_FORMATS.join(", ")
            ),
        ));
    }

    let is_image = mime_guess::from_path(filename)
        .first()
        .is_some_and(|m| m.type_().as_str() == "image");
    if !is_image {
        return Err(AppError::new(ErrorCode::UnsupportedFileFormat));
    }
    Ok(ext)
}

/// Decode and re-encode as JPEG
fn reencode_jpeg(data: &[u8]) -> Result<Vec<u8>, AppError> {
    let img = image::load_from_memory(data).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidImageFile, format!("Invalid image: {e}"))
    })?;

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        img.to_rgb8().write_with_encoder(encoder).map_err(|e| {
            AppError::with_message(
                ErrorCode::ImageProcessingFailed,
                format!("Failed to compress image: {e}"),
            )
        })?;
    }
    Ok(buffer)
}

/// Stored names are `<sha256 hex>.jpg`; anything else is rejected
fn is_stored_name(filename: &str) -> bool {
    filename
        .strip_suffix(".jpg")
        .is_some_and(|stem| stem.len() == 64 && stem.chars().all(|c| c.is_ascii_hexdigit()))
}

/// POST /api/upload (admin), multipart field `file`
pub async fn upload(
    State(state): State<AppState>,
    admin: AdminUser,
    mut multipart: Multipart,
) -> ApiResult<UploadResponse> {
    let mut field_data: Option<Vec<u8>> = None;
    let mut original_filename = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        AppError::with_message(
            ErrorCode::InvalidRequest,
            format!("Invalid multipart request: {e}"),
        )
    })? {
        if field.name() == Some("file") {
            original_filename = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| {
                AppError::with_message(ErrorCode::FileTooLarge, format!("Multipart error: {e}"))
            })?;
            field_data = Some(bytes.to_vec());
            break;
        }
    }

    let data = field_data.ok_or_else(|| AppError::new(ErrorCode::NoFileProvided))?;
    let original_name = original_filename.ok_or_else(|| AppError::new(ErrorCode::NoFilename))?;

    if data.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile).into());
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("Maximum size is {}MB", MAX_FILE_SIZE / 1024 / 1024),
        )
        .into());
    }
    check_extension(&original_name)?;

    let encoded = tokio::task::spawn_blocking(move || reencode_jpeg(&data))
        .await
        .map_err(|e| AppError::internal(format!("Image task failed: {e}")))??;

    let filename = format!("{}.jpg", calculate_hash(&encoded));
    let upload_dir = PathBuf::from(&state.config.upload_dir);
    let path = upload_dir.join(&filename);

    let created = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
        tracing::info!(original_name = %original_name, filename = %filename, "Duplicate image, reusing stored file");
        false
    } else {
        tokio::fs::create_dir_all(&upload_dir).await.map_err(|e| {
            AppError::with_message(ErrorCode::FileStorageFailed, format!("Failed to create upload dir: {e}"))
        })?;
        tokio::fs::write(&path, &encoded).await.map_err(|e| {
            AppError::with_message(ErrorCode::FileStorageFailed, format!("Failed to save file: {e}"))
        })?;
        audit_log!(admin.id, "upload", format!("upload:{filename}"), &original_name);
        true
    };

    ok(UploadResponse {
        url: state.upload_url(&filename),
        size: encoded.len(),
        filename,
        created,
    })
}

/// DELETE /api/upload/{filename} (admin)
pub async fn delete(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(filename): Path<String>,
) -> ApiResult<()> {
    if !is_stored_name(&filename) {
        return Err(AppError::with_message(ErrorCode::InvalidFormat, "Invalid filename").into());
    }
    let path = PathBuf::from(&state.config.upload_dir).join(&filename);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(AppError::not_found(format!("File {filename}")).into());
        }
        Err(e) => return Err(e.into()),
    }

    audit_log!(admin.id, "delete_upload", format!("upload:{filename}"));
    ok_message("File deleted")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([200, 30, 30]));
        let mut out = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_extension_rules() {
        assert_eq!(check_extension("photo.PNG").unwrap(), "png");
        assert_eq!(check_extension("a.jpeg").unwrap(), "jpeg");
        assert_eq!(
            check_extension("notes.txt").unwrap_err().code,
            ErrorCode::UnsupportedFileFormat
        );
        assert_eq!(
            check_extension("noext").unwrap_err().code,
            ErrorCode::InvalidFileExtension
        );
    }

    #[test]
    fn test_reencode_is_jpeg_and_stable() {
        let png = png_bytes();
        let a = reencode_jpeg(&png).unwrap();
        let b = reencode_jpeg(&png).unwrap();
        assert_eq!(&a[..2], &[0xFF, 0xD8]);
        assert_eq!(calculate_hash(&a), calculate_hash(&b));
    }

    #[test]
    fn test_garbage_is_not_an_image() {
        let err = reencode_jpeg(b"definitely not an image").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidImageFile);
    }

    #[test]
    fn test_stored_name_guard() {
        let name = format!("{}.jpg", "a".repeat(64));
        assert!(is_stored_name(&name));
        assert!(!is_stored_name("../etc/passwd"));
        assert!(!is_stored_name("abc.jpg"));
    }
}
