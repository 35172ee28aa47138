// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Freehand annotation data structures.
//!
//! This module defines the brush state and the transparent overlay that
//! accumulates strokes on top of a base image.

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// A pixel position in original-image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    fn center(self) -> (f32, f32) {
        (self.x as f32 + 0.5, self.y as f32 + 0.5)
    }
}

/// Whether strokes paint color or clear the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushMode {
    #[default]
    Draw,
    Erase,
}

/// Pen colors offered in the canvas toolbar.
pub const PALETTE: [(&str, Rgba<u8>); 6] = [
    ("black", Rgba([0, 0, 0, 255])),
    ("white", Rgba([255, 255, 255, 255])),
    ("red", Rgba([255, 0, 0, 255])),
    ("blue", Rgba([0, 0, 255, 255])),
    ("green", Rgba([0, 128, 0, 255])),
    ("yellow", Rgba([255, 255, 0, 255])),
];

/// Active brush. Changes apply to the next segment only.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Brush {
    pub color: Rgba<u8>,
    pub mode: BrushMode,
    /// Draw width in viewport pixels
    pub draw_width: f32,
    /// Erase width in viewport pixels
    pub erase_width: f32,
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Rgba([255, 0, 0, 255]),
            mode: BrushMode::Draw,
            draw_width: 3.0,
            erase_width: 10.0,
        }
    }
}

impl Brush {
    /// Segment width in image pixels at the given zoom, so strokes keep a
    /// constant on-screen thickness.
    pub fn width_at(&self, zoom: f32) -> f32 {
        let viewport_width = match self.mode {
            BrushMode::Draw => self.draw_width,
            BrushMode::Erase => self.erase_width,
        };
        viewport_width / zoom
    }
}

/// Transparent overlay plus the state of the stroke being drawn.
#[derive(Debug, Clone)]
pub struct AnnotationSurface {
    overlay: RgbaImage,
    last_point: Option<Point>,
}

impl AnnotationSurface {
    /// Create a fully transparent overlay of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            overlay: RgbaImage::new(width, height),
            last_point: None,
        }
    }

    pub fn overlay(&self) -> &RgbaImage {
        &self.overlay
    }

    #[cfg(test)]
    pub fn dimensions(&self) -> (u32, u32) {
        self.overlay.dimensions()
    }

    #[cfg(test)]
    pub fn is_stroking(&self) -> bool {
        self.last_point.is_some()
    }

    /// Record the starting point of a new, independent stroke.
    pub fn begin_stroke(&mut self, pos: Point) {
        self.last_point = Some(pos);
    }

    /// Draw a segment from the last point to `pos`.
    ///
    /// Returns `true` if the overlay changed. Does nothing when no stroke
    /// has been started.
    pub fn extend_stroke(&mut self, pos: Point, brush: &Brush, zoom: f32) -> bool {
        let Some(from) = self.last_point else {
            return false;
        };

        let paint = match brush.mode {
            BrushMode::Draw => Rgba([brush.color[0], brush.color[1], brush.color[2], 255]),
            BrushMode::Erase => Rgba([0, 0, 0, 0]),
        };
        stamp_segment(&mut self.overlay, from, pos, brush.width_at(zoom), paint);

        self.last_point = Some(pos);
        true
    }

    pub fn end_stroke(&mut self) {
        self.last_point = None;
    }
}

/// Write `paint` into every pixel whose center lies within half the width
/// of the segment. The distance test gives round caps, and consecutive
/// segments sharing an endpoint therefore meet with round joins.
fn stamp_segment(target: &mut RgbaImage, from: Point, to: Point, width: f32, paint: Rgba<u8>) {
    let radius = (width / 2.0).max(0.5);
    let (ax, ay) = from.center();
    let (bx, by) = to.center();
    let (w, h) = target.dimensions();

    let min_x = (ax.min(bx) - radius).floor().max(0.0) as u32;
    let min_y = (ay.min(by) - radius).floor().max(0.0) as u32;
    let max_x = ((ax.max(bx) + radius).ceil() as u32).min(w);
    let max_y = ((ay.max(by) + radius).ceil() as u32).min(h);

    let (dx, dy) = (bx - ax, by - ay);
    let len_sq = dx * dx + dy * dy;
    let radius_sq = radius * radius;

    for y in min_y..max_y {
        for x in min_x..max_x {
            let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
            let t = if len_sq > 0.0 {
                (((px - ax) * dx + (py - ay) * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let (cx, cy) = (ax + t * dx - px, ay + t * dy - py);
            if cx * cx + cy * cy <= radius_sq {
                target.put_pixel(x, y, paint);
            }
        }
    }
}
