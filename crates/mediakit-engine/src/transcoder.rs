use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use image::imageops::FilterType;
use image::ImageFormat;
use mediakit_contracts::media::UploadedImage;

use crate::error::MediaError;

pub const DOWNLOAD_FILE_NAME: &str = "upscaled-image.png";
const MAX_OUTPUT_DIMENSION: f64 = 16_384.0;

/// Where an incoming image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(PathBuf),
    Clipboard {
        mime_type: Option<String>,
        bytes: Vec<u8>,
    },
}

impl ImageSource {
    pub fn label(&self) -> String {
        match self {
            Self::File(path) => path.display().to_string(),
            Self::Clipboard { .. } => "clipboard".to_string(),
        }
    }

    /// Clipboard items declared as something other than an image are not image pastes.
    pub fn is_declared_image(&self) -> bool {
        match self {
            Self::File(_) => true,
            Self::Clipboard { mime_type, .. } => mime_type
                .as_deref()
                .map_or(true, |mime| mime.starts_with("image/")),
        }
    }
}

/// Reads the source into a data URI, keeping the original bytes untouched.
pub fn load_from_source(source: &ImageSource) -> Result<UploadedImage, MediaError> {
    match source {
        ImageSource::File(path) => {
            let bytes = fs::read(path).map_err(|err| {
                MediaError::Read(format!(
                    "Failed to read the image file {}: {err}",
                    path.display()
                ))
            })?;
            encode_bytes(&bytes, None)
        }
        ImageSource::Clipboard { mime_type, bytes } => encode_bytes(bytes, mime_type.as_deref()),
    }
}

fn encode_bytes(bytes: &[u8], declared_mime: Option<&str>) -> Result<UploadedImage, MediaError> {
    if let Some(mime) = declared_mime {
        if !mime.starts_with("image/") {
            return Err(MediaError::Read(format!(
                "Unsupported content type '{mime}'. Please provide an image."
            )));
        }
    }
    let format = image::guess_format(bytes)
        .map_err(|_| MediaError::Read("Failed to read the image file. Unrecognized image data.".to_string()))?;
    if !matches!(
        format,
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP | ImageFormat::Gif | ImageFormat::Bmp
    ) {
        return Err(MediaError::Read(format!(
            "Unsupported image format {format:?}. Use PNG, JPEG, WebP, GIF or BMP."
        )));
    }
    image::load_from_memory_with_format(bytes, format)
        .map_err(|err| MediaError::Read(format!("Failed to read the image file: {err}")))?;
    Ok(UploadedImage::from_bytes(format.to_mime_type(), bytes))
}

pub fn dimensions(image: &UploadedImage) -> Result<(u32, u32), MediaError> {
    let decoded = decode(image)?;
    Ok((decoded.width(), decoded.height()))
}

/// Scales by `scale` with Lanczos resampling and re-encodes as PNG.
/// A scale of exactly 1 returns the input unchanged.
pub fn resize(image: &UploadedImage, scale: f64) -> Result<UploadedImage, MediaError> {
    if scale == 1.0 {
        return Ok(image.clone());
    }
    if !scale.is_finite() || scale <= 0.0 {
        return Err(MediaError::Render(format!(
            "Invalid scale factor {scale}; expected a positive number."
        )));
    }
    let decoded = decode(image)?;
    let width = (f64::from(decoded.width()) * scale).floor();
    let height = (f64::from(decoded.height()) * scale).floor();
    if width < 1.0 || height < 1.0 {
        return Err(MediaError::Render(
            "Resized image would have no pixels.".to_string(),
        ));
    }
    if width > MAX_OUTPUT_DIMENSION || height > MAX_OUTPUT_DIMENSION {
        return Err(MediaError::Render(format!(
            "Resized image {width}x{height} exceeds the {MAX_OUTPUT_DIMENSION} pixel limit."
        )));
    }

    let resized = decoded.resize_exact(width as u32, height as u32, FilterType::Lanczos3);
    let mut out = Vec::new();
    resized
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|err| MediaError::Render(format!("Failed to encode resized image: {err}")))?;
    Ok(UploadedImage::from_bytes("image/png", &out))
}

fn decode(image: &UploadedImage) -> Result<image::DynamicImage, MediaError> {
    let bytes = image
        .decode_bytes()
        .map_err(|err| MediaError::Render(format!("Failed to load image for resizing: {err}")))?;
    image::load_from_memory(&bytes)
        .map_err(|err| MediaError::Render(format!("Failed to load image for resizing: {err}")))
}

/// Writes the decoded bytes. A directory target (or none) gets `upscaled-image.png`.
pub fn save_image(image: &UploadedImage, target: Option<&Path>) -> Result<PathBuf> {
    let path = match target {
        Some(path) if path.is_dir() => path.join(DOWNLOAD_FILE_NAME),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(DOWNLOAD_FILE_NAME),
    };
    let bytes = image.decode_bytes()?;
    if bytes.is_empty() {
        bail!("image has no data to save");
    }
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
