// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Decoded medical volumes.
//!
//! Every source array is reshaped to `frames x rows x columns` so the viewer
//! can step through 2D slices regardless of the original dimensionality.

use image::GrayImage;
use std::path::Path;

/// Medical file formats the viewer accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    Dicom,
    Nifti,
}

impl VolumeKind {
    /// Dispatch on the file extension (`.dcm`, `.nii`, `.nii.gz`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();
        if name.ends_with(".dcm") {
            Some(VolumeKind::Dicom)
        } else if name.ends_with(".nii") || name.ends_with(".nii.gz") {
            Some(VolumeKind::Nifti)
        } else {
            None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VolumeKind::Dicom => "DICOM",
            VolumeKind::Nifti => "NIfTI",
        }
    }
}

/// A stack of equally sized grayscale slices.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub kind: VolumeKind,
    pub frames: usize,
    pub rows: usize,
    pub columns: usize,
    data: Vec<f32>,
    min: f32,
    max: f32,
}

impl Volume {
    /// Build a volume from a row-major array of any dimensionality.
    ///
    /// The last two axes become rows and columns; all leading axes are
    /// flattened into frames. Returns `None` if the shape does not match
    /// the data or is empty.
    pub fn from_shape(kind: VolumeKind, shape: &[usize], data: Vec<f32>) -> Option<Self> {
        let (frames, rows, columns) = match shape {
            [] => return None,
            [columns] => (1, 1, *columns),
            [leading @ .., rows, columns] => (leading.iter().product::<usize>(), *rows, *columns),
        };
        if frames * rows * columns == 0 || frames * rows * columns != data.len() {
            return None;
        }

        let (min, max) = data
            .iter()
            .filter(|v| v.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let (min, max) = if min <= max { (min, max) } else { (0.0, 0.0) };

        Some(Self {
            kind,
            frames,
            rows,
            columns,
            data,
            min,
            max,
        })
    }

    /// Global value range used for display windowing.
    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn middle_frame(&self) -> usize {
        self.frames / 2
    }

    /// One frame windowed to 8-bit gray. Out-of-range indices are clamped.
    pub fn slice(&self, frame: usize) -> GrayImage {
        let frame = frame.min(self.frames - 1);
        let len = self.rows * self.columns;
        let start = frame * len;
        let span = self.max - self.min;

        let pixels = self.data[start..start + len]
            .iter()
            .map(|&v| {
                if span > 0.0 && v.is_finite() {
                    (((v - self.min) / span) * 255.0).round().clamp(0.0, 255.0) as u8
                } else {
                    0
                }
            })
            .collect();

        // Length always matches rows * columns.
        GrayImage::from_raw(self.columns as u32, self.rows as u32, pixels)
            .unwrap_or_else(|| GrayImage::new(self.columns as u32, self.rows as u32))
    }
}
