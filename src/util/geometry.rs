// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the coordinate transformations between the zoomed
//! view of an image and its original pixel grid.

use crate::models::annotation::Point;

/// Size of an image rendered at `zoom`, never smaller than one pixel per axis.
pub fn rendered_size(original: (u32, u32), zoom: f32) -> (u32, u32) {
    let scale = |len: u32| ((len as f32 * zoom).round() as u32).max(1);
    (scale(original.0), scale(original.1))
}

/// Convert a position on the rendered image to an original-image pixel.
///
/// `pointer` is relative to the top-left corner of the rendered image
/// (viewport position plus scroll offset). Returns `None` when the position
/// falls outside the image or the rendered size is degenerate.
pub fn viewport_to_image(pointer: [f32; 2], rendered: (u32, u32), original: (u32, u32)) -> Option<Point> {
    if rendered.0 == 0 || rendered.1 == 0 {
        return None;
    }

    let scale_x = original.0 as f32 / rendered.0 as f32;
    let scale_y = original.1 as f32 / rendered.1 as f32;

    let img_x = (pointer[0] * scale_x).floor();
    let img_y = (pointer[1] * scale_y).floor();

    if img_x < 0.0 || img_y < 0.0 {
        return None;
    }

    let (x, y) = (img_x as u32, img_y as u32);
    if x < original.0 && y < original.1 {
        Some(Point::new(x, y))
    } else {
        None
    }
}

/// Scroll offset that keeps the content under `pointer` fixed across a
/// change of rendered size.
///
/// The pointer's fractional position within the old rendering is reapplied
/// to the new one.
pub fn anchored_scroll(
    pointer: [f32; 2],
    scroll: [f32; 2],
    before: (u32, u32),
    after: (u32, u32),
) -> [f32; 2] {
    let rel_x = (pointer[0] + scroll[0]) / before.0.max(1) as f32;
    let rel_y = (pointer[1] + scroll[1]) / before.1.max(1) as f32;

    [
        after.0 as f32 * rel_x - pointer[0],
        after.1 as f32 * rel_y - pointer[1],
    ]
}
