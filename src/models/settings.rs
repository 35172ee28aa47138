// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! User-adjustable application settings.

use super::annotation::Brush;
use super::viewport::ZoomLimits;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_TEAMS_URL: &str = "https://teams.microsoft.com";

/// Settings read from `smart_eye.yaml`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding one folder per patient
    pub data_root: PathBuf,
    pub zoom_min: Option<f32>,
    pub zoom_max: Option<f32>,
    /// Brush widths in viewport pixels
    pub draw_width: f32,
    pub erase_width: f32,
    pub teams_url: String,
    /// Report editor text size in pixels
    pub report_font_size: f32,
}

impl Default for Settings {
    fn default() -> Self {
        let brush = Brush::default();
        Self {
            data_root: PathBuf::from("data").join("patients"),
            zoom_min: None,
            zoom_max: None,
            draw_width: brush.draw_width,
            erase_width: brush.erase_width,
            teams_url: DEFAULT_TEAMS_URL.to_string(),
            report_font_size: 14.0,
        }
    }
}

impl Settings {
    pub fn zoom_limits(&self) -> ZoomLimits {
        ZoomLimits {
            min: self.zoom_min,
            max: self.zoom_max,
        }
    }

    /// Default red brush with the configured widths.
    pub fn brush(&self) -> Brush {
        Brush {
            draw_width: self.draw_width,
            erase_width: self.erase_width,
            ..Brush::default()
        }
    }
}
