// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation toolbar.
//!
//! Colour palette, eraser toggle and the canvas view controls.

use crate::models::annotation::{BrushMode, PALETTE};
use crate::models::viewport::ImageCanvas;

/// Toolbar requests the application has to carry out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    None,
    SaveImage,
}

/// Display the toolbar. Brush and zoom changes are applied directly.
pub fn show(ui: &mut egui::Ui, canvas: &mut ImageCanvas) -> ToolbarAction {
    let mut action = ToolbarAction::None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        ui.label("Colour:");
        let brush = *canvas.brush();
        for (name, color) in PALETTE {
            let selected = brush.mode == BrushMode::Draw && brush.color == color;
            let swatch = egui::Button::new("")
                .fill(egui::Color32::from_rgba_unmultiplied(color[0], color[1], color[2], color[3]))
                .min_size(egui::vec2(20.0, 20.0))
                .stroke(if selected {
                    egui::Stroke::new(2.0, ui.visuals().selection.stroke.color)
                } else {
                    egui::Stroke::new(1.0, egui::Color32::from_gray(90))
                });
            if ui.add(swatch).on_hover_text(name).clicked() {
                canvas.pick_color(color);
            }
        }

        ui.separator();

        if ui
            .selectable_label(brush.mode == BrushMode::Erase, "⌫ Eraser")
            .clicked()
        {
            canvas.toggle_eraser();
        }

        ui.separator();

        if ui.button("Reset Zoom").clicked() {
            canvas.reset_zoom();
        }
        if ui.button("💾 Save Image").clicked() {
            action = ToolbarAction::SaveImage;
        }

        ui.separator();

        let hint = match brush.mode {
            BrushMode::Draw => "Left-drag to draw, right-drag to pan, wheel to zoom",
            BrushMode::Erase => "Left-drag to erase, right-drag to pan, wheel to zoom",
        };
        ui.label(egui::RichText::new(hint).italics().weak());

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if let Some((width, height)) = canvas.image_size() {
                ui.label(format!(
                    "{}x{}  |  {:.0}%",
                    width,
                    height,
                    canvas.zoom_factor() * 100.0
                ));
            }
        });
    });

    action
}
