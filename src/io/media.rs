// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bitmap image loading and saving.
//!
//! This module handles loading image files into RGBA buffers for the canvas
//! and the report editor, and writing flattened annotations back out.

use image::{ImageFormat, RgbaImage};
use std::path::Path;
use thiserror::Error;

/// Extensions offered by the "Open Image Viewer" dialog.
pub const VIEWER_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];
/// Extensions offered when inserting an image into a report.
pub const REPORT_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "gif"];

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to save {path}: {source}")]
    Save {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Decode an image file into 8-bit RGBA.
pub fn load_image(path: &Path) -> Result<RgbaImage, MediaError> {
    let img = image::open(path).map_err(|source| MediaError::Load {
        path: path.display().to_string(),
        source,
    })?;
    let rgba = img.to_rgba8();
    log::info!("Loaded image: {} ({}x{})", path.display(), rgba.width(), rgba.height());
    Ok(rgba)
}

/// Write an RGBA buffer as PNG.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), MediaError> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| MediaError::Save {
            path: path.display().to_string(),
            source,
        })?;
    log::info!("Saved image: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_save_then_load_preserves_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("annotated.png");

        let mut img = RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255]));
        img.put_pixel(3, 2, Rgba([255, 0, 0, 128]));
        save_png(&img, &path).unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!(loaded.dimensions(), (8, 4));
        assert_eq!(*loaded.get_pixel(3, 2), Rgba([255, 0, 0, 128]));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let err = load_image(&path).unwrap_err();
        assert!(matches!(err, MediaError::Load { .. }));
    }
}
