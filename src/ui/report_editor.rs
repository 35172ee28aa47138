// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Report editor window.
//!
//! A monospace text area with images floating above it. Images are moved
//! by dragging, resized from their bottom-right corner and scaled with the
//! mouse wheel.

use crate::models::patient::PatientId;
use crate::models::report::{ReportDraft, ReportLayout, PageSize, RESIZE_HANDLE};
use image::RgbaImage;
use std::collections::HashMap;

/// Requests the application has to carry out for the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    InsertImage,
    Save,
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragMode {
    Move,
    Resize,
}

pub struct ReportEditor {
    patient: PatientId,
    draft: ReportDraft,
    font_size: f32,
    /// Size of the editing area as last shown
    viewport: [f32; 2],
    textures: HashMap<u64, egui::TextureHandle>,
    dragging: Option<(u64, DragMode)>,
    saving: bool,
}

impl ReportEditor {
    pub fn new(patient: PatientId, font_size: f32) -> Self {
        Self {
            patient,
            draft: ReportDraft::default(),
            font_size,
            viewport: [600.0, 500.0],
            textures: HashMap::new(),
            dragging: None,
            saving: false,
        }
    }

    pub fn patient(&self) -> &PatientId {
        &self.patient
    }

    pub fn draft(&self) -> &ReportDraft {
        &self.draft
    }

    /// Place an image at its natural size in the middle of the editor.
    pub fn insert_image(&mut self, pixels: RgbaImage) {
        let id = self.draft.insert_image(pixels, self.viewport);
        log::info!("Inserted image {} into report for {}", id, self.patient);
    }

    /// Page layout of the draft as it is currently shown.
    pub fn layout(&self) -> ReportLayout {
        self.draft.layout(self.viewport, self.font_size, PageSize::A4)
    }

    /// Mark a save in progress; editing controls are disabled until the
    /// application closes the editor or calls [`Self::save_failed`].
    pub fn set_saving(&mut self) {
        self.saving = true;
    }

    pub fn save_failed(&mut self) {
        self.saving = false;
    }

    pub fn show(&mut self, ctx: &egui::Context) -> EditorAction {
        let mut action = EditorAction::None;
        let mut open = true;

        egui::Window::new(format!("Report: {}", self.patient))
            .id(egui::Id::new("report_editor"))
            .default_size([700.0, 600.0])
            .open(&mut open)
            .show(ctx, |ui| {
                ui.add_enabled_ui(!self.saving, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("🖼 Insert Image").clicked() {
                            action = EditorAction::InsertImage;
                        }
                        if ui.button("💾 Save as PDF").clicked() {
                            action = EditorAction::Save;
                        }
                        if self.saving {
                            ui.spinner();
                        }
                    });
                    ui.separator();
                    self.editing_area(ui);
                });
            });

        if !open {
            action = EditorAction::Close;
        }
        action
    }

    fn editing_area(&mut self, ui: &mut egui::Ui) {
        let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
        self.viewport = [rect.width(), rect.height()];

        ui.put(
            rect,
            egui::TextEdit::multiline(&mut self.draft.text)
                .font(egui::FontId::monospace(self.font_size))
                .desired_width(rect.width())
                .frame(false),
        );

        let painter = ui.painter_at(rect);
        for img in &mut self.draft.images {
            let image_rect = egui::Rect::from_min_size(
                rect.min + egui::vec2(img.pos[0], img.pos[1]),
                egui::vec2(img.size[0], img.size[1]),
            );
            let response = ui.interact(
                image_rect,
                egui::Id::new(("report_image", img.id)),
                egui::Sense::drag(),
            );

            if response.drag_started() {
                if let Some(pos) = response.interact_pointer_pos() {
                    let local = [pos.x - image_rect.min.x, pos.y - image_rect.min.y];
                    let mode = if img.on_resize_handle(local) {
                        DragMode::Resize
                    } else {
                        DragMode::Move
                    };
                    self.dragging = Some((img.id, mode));
                }
            }
            if response.dragged() {
                match self.dragging {
                    Some((id, DragMode::Move)) if id == img.id => {
                        let delta = response.drag_delta();
                        img.move_by([delta.x, delta.y]);
                    }
                    Some((id, DragMode::Resize)) if id == img.id => {
                        if let Some(pos) = response.interact_pointer_pos() {
                            img.resize_to([pos.x - image_rect.min.x, pos.y - image_rect.min.y]);
                        }
                    }
                    _ => {}
                }
            }
            if response.drag_stopped() {
                self.dragging = None;
            }
            if response.hovered() {
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if scroll != 0.0 {
                    img.zoom(scroll > 0.0);
                }
            }

            let texture = self.textures.entry(img.id).or_insert_with(|| {
                let size = [img.pixels.width() as usize, img.pixels.height() as usize];
                let color = egui::ColorImage::from_rgba_unmultiplied(size, img.pixels.as_raw());
                ui.ctx().load_texture(format!("report_image_{}", img.id), color, egui::TextureOptions::LINEAR)
            });
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );

            let handle = egui::Rect::from_min_max(
                image_rect.max - egui::vec2(RESIZE_HANDLE, RESIZE_HANDLE),
                image_rect.max,
            );
            painter.rect_filled(handle, 0.0, egui::Color32::from_rgba_unmultiplied(60, 60, 60, 180));
            if response.hovered() {
                painter.rect_stroke(image_rect, 0.0, egui::Stroke::new(1.0, ui.visuals().selection.stroke.color));
            }
        }
    }
}
