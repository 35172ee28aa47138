// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Medical volume loading (DICOM and NIfTI).
//!
//! Files are dispatched by extension. Decoding itself is done by the
//! `dicom-pixeldata` and `nifti` crates when the `volumes` feature is
//! enabled; this module only reshapes their output into a [`Volume`].

use crate::models::volume::{Volume, VolumeKind};
use std::path::Path;
use thiserror::Error;

/// Extensions offered by the "Open Medical Image" dialog. `.nii.gz` files
/// are matched by their final `gz` component.
pub const VOLUME_EXTENSIONS: [&str; 3] = ["dcm", "nii", "gz"];

#[derive(Debug, Error)]
pub enum VolumeError {
    #[error("unsupported medical image: {0}")]
    Unsupported(String),

    #[cfg(feature = "volumes")]
    #[error("could not decode {path}: {message}")]
    Decode { path: String, message: String },

    #[error("decoded array of {path} has an unusable shape {shape:?}")]
    Shape { path: String, shape: Vec<usize> },

    #[cfg(not(feature = "volumes"))]
    #[error("this build has no {0} support (enable the `volumes` feature)")]
    Disabled(&'static str),
}

/// Load a DICOM or NIfTI file as a stack of slices.
pub fn load_volume(path: &Path) -> Result<Volume, VolumeError> {
    let kind = VolumeKind::from_path(path)
        .ok_or_else(|| VolumeError::Unsupported(path.display().to_string()))?;

    let (shape, data) = match kind {
        VolumeKind::Dicom => decode_dicom(path)?,
        VolumeKind::Nifti => decode_nifti(path)?,
    };

    let volume = Volume::from_shape(kind, &shape, data).ok_or_else(|| VolumeError::Shape {
        path: path.display().to_string(),
        shape: shape.clone(),
    })?;

    log::info!(
        "Loaded {} volume {} ({} x {} x {})",
        kind.label(),
        path.display(),
        volume.frames,
        volume.rows,
        volume.columns
    );
    Ok(volume)
}

#[cfg(feature = "volumes")]
fn decode_error(path: &Path, err: impl std::fmt::Display) -> VolumeError {
    VolumeError::Decode {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

/// Pixel data as `frames x rows x columns`, samples per pixel averaged.
#[cfg(feature = "volumes")]
fn decode_dicom(path: &Path) -> Result<(Vec<usize>, Vec<f32>), VolumeError> {
    use dicom_pixeldata::PixelDecoder;

    let object = dicom_object::open_file(path).map_err(|e| decode_error(path, e))?;
    let pixels = object.decode_pixel_data().map_err(|e| decode_error(path, e))?;

    let frames = pixels.number_of_frames() as usize;
    let rows = pixels.rows() as usize;
    let columns = pixels.columns() as usize;
    let samples = (pixels.samples_per_pixel() as usize).max(1);

    let raw: Vec<f32> = pixels.to_vec::<f32>().map_err(|e| decode_error(path, e))?;
    let data = if samples == 1 {
        raw
    } else {
        raw.chunks_exact(samples)
            .map(|px| px.iter().sum::<f32>() / samples as f32)
            .collect()
    };

    Ok((vec![frames, rows, columns], data))
}

/// Voxels with axes reversed, so slices run along the last spatial axis.
#[cfg(feature = "volumes")]
fn decode_nifti(path: &Path) -> Result<(Vec<usize>, Vec<f32>), VolumeError> {
    use nifti::{IntoNdArray, NiftiObject, ReaderOptions};

    let object = ReaderOptions::new()
        .read_file(path)
        .map_err(|e| decode_error(path, e))?;
    let array = object
        .into_volume()
        .into_ndarray::<f32>()
        .map_err(|e| decode_error(path, e))?
        .reversed_axes();

    let shape = array.shape().to_vec();
    let data = array.iter().copied().collect();
    Ok((shape, data))
}

#[cfg(not(feature = "volumes"))]
fn decode_dicom(_path: &Path) -> Result<(Vec<usize>, Vec<f32>), VolumeError> {
    Err(VolumeError::Disabled("DICOM"))
}

#[cfg(not(feature = "volumes"))]
fn decode_nifti(_path: &Path) -> Result<(Vec<usize>, Vec<f32>), VolumeError> {
    Err(VolumeError::Disabled("NIfTI"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let err = load_volume(Path::new("fundus.png")).unwrap_err();
        assert!(matches!(err, VolumeError::Unsupported(_)));
    }

    #[test]
    fn test_unreadable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.nii");
        std::fs::write(&path, b"definitely not nifti").unwrap();
        assert!(load_volume(&path).is_err());

        let path = dir.path().join("broken.dcm");
        std::fs::write(&path, b"definitely not dicom").unwrap();
        assert!(load_volume(&path).is_err());
    }

    #[cfg(feature = "volumes")]
    #[test]
    fn test_corrupt_dicom_reports_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.dcm");
        std::fs::write(&path, b"definitely not dicom").unwrap();
        assert!(matches!(load_volume(&path), Err(VolumeError::Decode { .. })));
    }

    #[cfg(not(feature = "volumes"))]
    #[test]
    fn test_volumes_disabled_without_feature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.nii");
        std::fs::write(&path, b"x").unwrap();
        assert!(matches!(load_volume(&path), Err(VolumeError::Disabled("NIfTI"))));
    }
}
