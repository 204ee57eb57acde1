//! Image scanning and validation

use rcfa_types::{Error, Result};
use rcfa_vision::ImagePayload;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Supported image extensions
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Check if a path is a supported image file
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Validate an image file exists and is readable
pub fn validate_image(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }

    if !path.is_file() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a file",
            path.display()
        )));
    }

    if !is_supported_image(path) {
        return Err(Error::InvalidImageFormat(format!(
            "Unsupported image format: {}",
            path.display()
        )));
    }

    if std::fs::metadata(path)?.len() == 0 {
        return Err(Error::EmptyImage(path.display().to_string()));
    }

    // Decoding catches truncated or mislabelled files before they reach the model
    image::open(path)?;

    Ok(())
}

/// Read a validated image into the payload sent to the model
pub fn load_image(path: &Path) -> Result<ImagePayload> {
    validate_image(path)?;
    let bytes = std::fs::read(path)?;
    ImagePayload::from_bytes(bytes, &path.display().to_string())
}

/// Scan a directory for image files
pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Err(Error::FileNotFound(dir.display().to_string()));
    }

    if !dir.is_dir() {
        return Err(Error::InvalidImageFormat(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_supported_image(path))
        .collect();

    images.sort();

    Ok(images)
}
