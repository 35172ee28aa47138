// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for image display and freehand annotation.
//!
//! The canvas paints the rendered composite at its zoomed size, offset by
//! the scroll position. Left-drag draws (or erases), right-drag pans and
//! the mouse wheel zooms around the pointer.

use crate::models::viewport::{ImageCanvas, ZoomDirection};

/// Message shown in place of the canvas when an image fails to load.
pub const LOAD_FAILED: &str = "Failed to load image.";

/// Display the canvas and handle pointer interaction.
///
/// Returns the size of the canvas viewport so menu-driven zooms can
/// anchor on its centre.
pub fn show(
    ui: &mut egui::Ui,
    canvas: &mut ImageCanvas,
    texture: &mut Option<egui::TextureHandle>,
    status: Option<&str>,
) -> egui::Vec2 {
    let available = ui.available_size();

    if let Some(message) = status {
        ui.centered_and_justified(|ui| {
            ui.label(
                egui::RichText::new(message)
                    .size(16.0)
                    .color(egui::Color32::from_gray(200)),
            );
        });
        return available;
    }

    if !canvas.has_image() {
        ui.centered_and_justified(|ui| {
            ui.label(
                egui::RichText::new("Open an image to begin annotating")
                    .color(egui::Color32::from_gray(180)),
            );
        });
        return available;
    }

    let (rect, response) = ui.allocate_exact_size(available, egui::Sense::click_and_drag());
    let to_local = |pos: egui::Pos2| [pos.x - rect.min.x, pos.y - rect.min.y];

    // Zoom around the pointer
    if let Some(pos) = response.hover_pos() {
        let scroll = ui.input(|i| i.raw_scroll_delta.y);
        if let Some(direction) = ZoomDirection::from_wheel(scroll) {
            canvas.zoom(direction, to_local(pos));
        }
    }

    // Freehand strokes
    if response.drag_started_by(egui::PointerButton::Primary) {
        if let Some(pos) = response.interact_pointer_pos() {
            if let Some(point) = canvas.image_pos(to_local(pos)) {
                canvas.begin_stroke(point);
            }
        }
    }
    if response.dragged_by(egui::PointerButton::Primary) {
        if let Some(pos) = response.interact_pointer_pos() {
            // Moves outside the image are skipped
            if let Some(point) = canvas.image_pos(to_local(pos)) {
                canvas.extend_stroke(point);
            }
        }
    }
    if response.drag_stopped_by(egui::PointerButton::Primary) {
        canvas.end_stroke();
    }

    // Pan
    if response.dragged_by(egui::PointerButton::Secondary) {
        let delta = response.drag_delta();
        canvas.pan([-delta.x, -delta.y]);
    }

    if canvas.take_dirty() || texture.is_none() {
        upload(ui.ctx(), canvas, texture);
    }

    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(40));

    if let (Some(texture), Some((width, height))) = (texture.as_ref(), canvas.rendered_size()) {
        let scroll = canvas.view().scroll;
        let image_rect = egui::Rect::from_min_size(
            rect.min - egui::vec2(scroll[0], scroll[1]),
            egui::vec2(width as f32, height as f32),
        );
        painter.image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }

    rect.size()
}

/// Re-render the composite and replace the texture.
fn upload(ctx: &egui::Context, canvas: &ImageCanvas, texture: &mut Option<egui::TextureHandle>) {
    let Some(view) = canvas.render() else {
        *texture = None;
        return;
    };
    let size = [view.pixels.width() as usize, view.pixels.height() as usize];
    let image = egui::ColorImage::from_rgba_unmultiplied(size, view.pixels.as_raw());
    match texture {
        Some(handle) => handle.set(image, egui::TextureOptions::LINEAR),
        None => *texture = Some(ctx.load_texture("canvas", image, egui::TextureOptions::LINEAR)),
    }
    log::debug!("Canvas texture {}x{} shown at {:?}", size[0], size[1], view.size);
}
