// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Zoomable, annotatable image canvas state.
//!
//! [`ImageCanvas`] owns the base image, its annotation overlay and the view
//! state (zoom and scroll). It is independent of egui: the canvas widget
//! feeds it pointer positions and uploads whatever [`ImageCanvas::render`]
//! produces.

use super::annotation::{AnnotationSurface, Brush, BrushMode, Point};
use crate::util::geometry;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Zoom multiplier for one wheel step towards the viewer.
pub const ZOOM_IN_STEP: f32 = 1.15;
/// Zoom multiplier for one wheel step away from the viewer.
///
/// Not the reciprocal of [`ZOOM_IN_STEP`]: in followed by out lands on
/// 0.9775 of the starting zoom.
pub const ZOOM_OUT_STEP: f32 = 0.85;
/// Zoom never drops to or below zero, whatever the configured limits.
pub const MIN_ZOOM_EPSILON: f32 = 1e-4;

/// Direction of a zoom step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

impl ZoomDirection {
    /// Direction for a vertical wheel delta (positive = away from the user).
    pub fn from_wheel(delta_y: f32) -> Option<Self> {
        if delta_y > 0.0 {
            Some(ZoomDirection::In)
        } else if delta_y < 0.0 {
            Some(ZoomDirection::Out)
        } else {
            None
        }
    }

    fn factor(self) -> f32 {
        match self {
            ZoomDirection::In => ZOOM_IN_STEP,
            ZoomDirection::Out => ZOOM_OUT_STEP,
        }
    }
}

/// Optional bounds on the zoom factor. Unset bounds leave zoom unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoomLimits {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

impl ZoomLimits {
    fn apply(&self, zoom: f32) -> f32 {
        let mut zoom = zoom;
        if let Some(max) = self.max {
            zoom = zoom.min(max);
        }
        if let Some(min) = self.min {
            zoom = zoom.max(min);
        }
        zoom.max(MIN_ZOOM_EPSILON)
    }
}

/// Zoom and scroll offset of the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub zoom: f32,
    pub scroll: [f32; 2],
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            scroll: [0.0, 0.0],
        }
    }
}

/// Base image and the overlay sized to match it. Replaced as a unit.
#[derive(Debug, Clone)]
struct Layers {
    base: RgbaImage,
    surface: AnnotationSurface,
}

impl Layers {
    fn new(base: RgbaImage) -> Self {
        let (width, height) = base.dimensions();
        Self {
            base,
            surface: AnnotationSurface::new(width, height),
        }
    }

    fn composite(&self) -> RgbaImage {
        let mut out = self.base.clone();
        imageops::overlay(&mut out, self.surface.overlay(), 0, 0);
        out
    }
}

/// Composite prepared for display.
#[derive(Debug, Clone)]
pub struct RenderedView {
    /// Pixels to upload. Downsampled when zoomed out, full resolution
    /// otherwise (magnification is left to the texture sampler).
    pub pixels: RgbaImage,
    /// On-screen size of the rendered image in viewport pixels.
    pub size: (u32, u32),
}

/// The zoomable annotated canvas.
#[derive(Debug, Clone, Default)]
pub struct ImageCanvas {
    layers: Option<Layers>,
    view: ViewState,
    brush: Brush,
    limits: ZoomLimits,
    dirty: bool,
}

impl ImageCanvas {
    pub fn new(brush: Brush, limits: ZoomLimits) -> Self {
        Self {
            brush,
            limits,
            ..Default::default()
        }
    }

    /// Replace the base image, allocate a matching transparent overlay and
    /// reset the view.
    pub fn set_image(&mut self, base: RgbaImage) {
        log::info!("Canvas image set ({}x{})", base.width(), base.height());
        self.layers = Some(Layers::new(base));
        self.view = ViewState::default();
        self.dirty = true;
    }

    pub fn has_image(&self) -> bool {
        self.layers.is_some()
    }

    /// Original image size, if an image is loaded.
    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.layers.as_ref().map(|l| l.base.dimensions())
    }

    #[cfg(test)]
    pub fn overlay_size(&self) -> Option<(u32, u32)> {
        self.layers.as_ref().map(|l| l.surface.dimensions())
    }

    #[cfg(test)]
    pub fn overlay(&self) -> Option<&RgbaImage> {
        self.layers.as_ref().map(|l| l.surface.overlay())
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn zoom_factor(&self) -> f32 {
        self.view.zoom
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Size of the image as currently displayed.
    pub fn rendered_size(&self) -> Option<(u32, u32)> {
        self.image_size()
            .map(|size| geometry::rendered_size(size, self.view.zoom))
    }

    /// Multiply the zoom by one step and keep the image point under
    /// `pointer` (viewport coordinates) fixed.
    pub fn zoom(&mut self, direction: ZoomDirection, pointer: [f32; 2]) {
        let Some(before) = self.rendered_size() else {
            return;
        };

        self.view.zoom = self.limits.apply(self.view.zoom * direction.factor());
        self.dirty = true;

        if let Some(after) = self.rendered_size() {
            self.view.scroll = geometry::anchored_scroll(pointer, self.view.scroll, before, after);
        }
        log::debug!("Zoom {:?} -> {:.4}", direction, self.view.zoom);
    }

    /// Back to 1:1 with the image's top-left corner in view.
    pub fn reset_zoom(&mut self) {
        if self.layers.is_none() {
            return;
        }
        self.view = ViewState::default();
        self.dirty = true;
    }

    /// Shift the scroll offset by a raw delta. Scrolling past the image
    /// edges is allowed.
    pub fn pan(&mut self, delta: [f32; 2]) {
        self.view.scroll[0] += delta[0];
        self.view.scroll[1] += delta[1];
    }

    /// Image pixel under a viewport position.
    pub fn image_pos(&self, pointer: [f32; 2]) -> Option<Point> {
        let original = self.image_size()?;
        let rendered = self.rendered_size()?;
        let content = [pointer[0] + self.view.scroll[0], pointer[1] + self.view.scroll[1]];
        geometry::viewport_to_image(content, rendered, original)
    }

    pub fn set_color(&mut self, color: Rgba<u8>) {
        self.brush.color = color;
    }

    pub fn set_mode(&mut self, mode: BrushMode) {
        self.brush.mode = mode;
    }

    /// Picking a palette color always returns the brush to drawing.
    pub fn pick_color(&mut self, color: Rgba<u8>) {
        self.set_color(color);
        self.set_mode(BrushMode::Draw);
    }

    pub fn toggle_eraser(&mut self) {
        let mode = match self.brush.mode {
            BrushMode::Draw => BrushMode::Erase,
            BrushMode::Erase => BrushMode::Draw,
        };
        self.set_mode(mode);
    }

    pub fn begin_stroke(&mut self, pos: Point) {
        if let Some(layers) = self.layers.as_mut() {
            layers.surface.begin_stroke(pos);
        }
    }

    pub fn extend_stroke(&mut self, pos: Point) {
        let zoom = self.view.zoom;
        if let Some(layers) = self.layers.as_mut() {
            if layers.surface.extend_stroke(pos, &self.brush, zoom) {
                self.dirty = true;
            }
        }
    }

    pub fn end_stroke(&mut self) {
        if let Some(layers) = self.layers.as_mut() {
            layers.surface.end_stroke();
        }
    }

    /// Whether the view changed since the last call. Clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Composite scaled by the current zoom with a smooth filter.
    pub fn render(&self) -> Option<RenderedView> {
        let layers = self.layers.as_ref()?;
        let size = geometry::rendered_size(layers.base.dimensions(), self.view.zoom);
        let composite = layers.composite();

        let pixels = if self.view.zoom < 1.0 {
            imageops::resize(&composite, size.0, size.1, FilterType::Triangle)
        } else {
            composite
        };
        Some(RenderedView { pixels, size })
    }

    /// Full-resolution composite, independent of the view.
    pub fn export(&self) -> Option<RgbaImage> {
        self.layers.as_ref().map(Layers::composite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]))
    }

    fn canvas_with(width: u32, height: u32) -> ImageCanvas {
        let mut canvas = ImageCanvas::default();
        canvas.set_image(gray(width, height));
        canvas
    }

    #[test]
    fn test_set_image_resets_view_and_sizes_overlay() {
        let mut canvas = canvas_with(100, 100);
        canvas.zoom(ZoomDirection::In, [10.0, 10.0]);
        canvas.pan([5.0, 5.0]);

        canvas.set_image(gray(40, 70));
        assert_eq!(canvas.overlay_size(), Some((40, 70)));
        assert_eq!(canvas.image_size(), Some((40, 70)));
        assert_eq!(canvas.view(), ViewState::default());
        assert!(canvas.overlay().unwrap().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_zoom_in_then_out_is_not_reversible() {
        let mut canvas = canvas_with(100, 100);
        canvas.zoom(ZoomDirection::In, [0.0, 0.0]);
        canvas.zoom(ZoomDirection::Out, [0.0, 0.0]);
        assert!((canvas.zoom_factor() - 0.9775).abs() < 1e-6);
        assert_ne!(canvas.zoom_factor(), 1.0);
    }

    #[test]
    fn test_zoom_without_image_is_noop() {
        let mut canvas = ImageCanvas::default();
        canvas.zoom(ZoomDirection::In, [0.0, 0.0]);
        assert_eq!(canvas.zoom_factor(), 1.0);
        assert!(canvas.render().is_none());
        assert!(canvas.export().is_none());
    }

    #[test]
    fn test_zoom_limits_are_applied() {
        let limits = ZoomLimits { min: Some(0.5), max: Some(2.0) };
        let mut canvas = ImageCanvas::new(Brush::default(), limits);
        canvas.set_image(gray(10, 10));
        for _ in 0..20 {
            canvas.zoom(ZoomDirection::In, [0.0, 0.0]);
        }
        assert_eq!(canvas.zoom_factor(), 2.0);
        for _ in 0..40 {
            canvas.zoom(ZoomDirection::Out, [0.0, 0.0]);
        }
        assert_eq!(canvas.zoom_factor(), 0.5);
    }

    #[test]
    fn test_unbounded_zoom_stays_positive() {
        let mut canvas = canvas_with(10, 10);
        for _ in 0..1000 {
            canvas.zoom(ZoomDirection::Out, [0.0, 0.0]);
        }
        assert!(canvas.zoom_factor() >= MIN_ZOOM_EPSILON);
    }

    #[test]
    fn test_zoom_keeps_pixel_under_pointer() {
        let mut canvas = canvas_with(400, 300);
        let pointer = [120.0, 90.0];
        let before = canvas.image_pos(pointer).unwrap();

        canvas.zoom(ZoomDirection::In, pointer);
        let after = canvas.image_pos(pointer).unwrap();
        assert!(before.x.abs_diff(after.x) <= 1);
        assert!(before.y.abs_diff(after.y) <= 1);

        canvas.zoom(ZoomDirection::Out, pointer);
        canvas.zoom(ZoomDirection::Out, pointer);
        let again = canvas.image_pos(pointer).unwrap();
        assert!(before.x.abs_diff(again.x) <= 1);
        assert!(before.y.abs_diff(again.y) <= 1);
    }

    #[test]
    fn test_pan_is_unclamped() {
        let mut canvas = canvas_with(10, 10);
        canvas.pan([-50.0, 1000.0]);
        assert_eq!(canvas.view().scroll, [-50.0, 1000.0]);
        // The scrolled-away image is no longer under the pointer
        assert!(canvas.image_pos([5.0, 5.0]).is_none());
        // ...but is found where it moved to
        assert_eq!(canvas.image_pos([55.0, -995.0]), Some(Point::new(5, 5)));
    }

    #[test]
    fn test_render_size_follows_zoom() {
        let mut canvas = canvas_with(200, 100);
        canvas.zoom(ZoomDirection::Out, [0.0, 0.0]);
        let view = canvas.render().unwrap();
        assert_eq!(view.size, (170, 85));
        assert_eq!(view.pixels.dimensions(), (170, 85));

        canvas.reset_zoom();
        canvas.zoom(ZoomDirection::In, [0.0, 0.0]);
        let view = canvas.render().unwrap();
        assert_eq!(view.size, (230, 115));
        assert_eq!(view.pixels.dimensions(), (200, 100));
    }

    #[test]
    fn test_stroke_end_to_end() {
        let mut canvas = canvas_with(100, 100);
        canvas.begin_stroke(Point::new(10, 10));
        canvas.extend_stroke(Point::new(90, 90));
        canvas.end_stroke();

        let overlay = canvas.overlay().unwrap();
        assert_eq!(*overlay.get_pixel(50, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(*overlay.get_pixel(5, 95), Rgba([0, 0, 0, 0]));

        let exported = canvas.export().unwrap();
        assert_eq!(*exported.get_pixel(50, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(*exported.get_pixel(5, 95), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn test_export_is_independent_of_zoom() {
        let mut canvas = canvas_with(64, 48);
        canvas.set_color(Rgba([0, 0, 255, 255]));
        canvas.begin_stroke(Point::new(3, 3));
        canvas.extend_stroke(Point::new(60, 40));
        canvas.end_stroke();

        let reference = canvas.export().unwrap();
        for direction in [ZoomDirection::In, ZoomDirection::In, ZoomDirection::Out] {
            canvas.zoom(direction, [20.0, 20.0]);
            let exported = canvas.export().unwrap();
            assert_eq!(exported.dimensions(), (64, 48));
            assert_eq!(exported.as_raw(), reference.as_raw());
        }
    }

    #[test]
    fn test_eraser_removes_strokes() {
        let mut canvas = canvas_with(50, 50);
        canvas.begin_stroke(Point::new(5, 25));
        canvas.extend_stroke(Point::new(45, 25));
        canvas.end_stroke();
        assert_eq!(canvas.overlay().unwrap().get_pixel(25, 25)[3], 255);

        canvas.toggle_eraser();
        assert_eq!(canvas.brush().mode, BrushMode::Erase);
        canvas.begin_stroke(Point::new(25, 5));
        canvas.extend_stroke(Point::new(25, 45));
        canvas.end_stroke();
        assert_eq!(canvas.overlay().unwrap().get_pixel(25, 25)[3], 0);
        assert_eq!(canvas.overlay().unwrap().get_pixel(10, 25)[3], 255);
    }

    #[test]
    fn test_pick_color_leaves_eraser() {
        let mut canvas = canvas_with(10, 10);
        canvas.toggle_eraser();
        assert_eq!(canvas.brush().mode, BrushMode::Erase);

        canvas.pick_color(Rgba([0, 128, 0, 255]));
        assert_eq!(canvas.brush().mode, BrushMode::Draw);
        assert_eq!(canvas.brush().color, Rgba([0, 128, 0, 255]));
    }

    #[test]
    fn test_new_image_drops_stroke_in_progress() {
        let mut canvas = canvas_with(60, 60);
        canvas.begin_stroke(Point::new(5, 5));
        canvas.set_image(gray(60, 60));
        canvas.extend_stroke(Point::new(55, 55));
        canvas.end_stroke();

        assert!(canvas.overlay().unwrap().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_annotation_without_image_is_noop() {
        let mut canvas = ImageCanvas::default();
        canvas.begin_stroke(Point::new(1, 1));
        canvas.extend_stroke(Point::new(5, 5));
        canvas.end_stroke();
        assert!(canvas.overlay().is_none());
        assert!(!canvas.take_dirty());
    }

    #[test]
    fn test_dirty_flag_tracks_changes() {
        let mut canvas = canvas_with(10, 10);
        assert!(canvas.take_dirty());
        assert!(!canvas.take_dirty());
        canvas.zoom(ZoomDirection::In, [0.0, 0.0]);
        assert!(canvas.take_dirty());
    }
}
