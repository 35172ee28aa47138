// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Slice viewer for DICOM and NIfTI volumes.
//!
//! One viewer lives for the whole session. Loading a new file replaces its
//! volume through [`VolumeViewer::load`]; [`VolumeViewer::reset`] clears it.

use crate::models::volume::Volume;

#[derive(Default)]
pub struct VolumeViewer {
    volume: Option<Volume>,
    frame: usize,
    texture: Option<egui::TextureHandle>,
    /// Frame currently held by `texture`
    uploaded: Option<usize>,
}

impl VolumeViewer {
    /// Drop the volume; the viewer shows nothing until the next load.
    pub fn reset(&mut self) {
        self.volume = None;
        self.frame = 0;
        self.texture = None;
        self.uploaded = None;
    }

    /// Replace the volume and show its middle slice.
    pub fn load(&mut self, volume: Volume) {
        self.reset();
        self.frame = volume.middle_frame();
        self.volume = Some(volume);
    }

    pub fn volume(&self) -> Option<&Volume> {
        self.volume.as_ref()
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn set_frame(&mut self, frame: usize) {
        if let Some(volume) = &self.volume {
            self.frame = frame.min(volume.frames - 1);
        }
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let Some(volume) = self.volume() else {
            ui.centered_and_justified(|ui| {
                ui.label(
                    egui::RichText::new("No image shown")
                        .color(egui::Color32::from_gray(180)),
                );
            });
            return;
        };

        let frames = volume.frames;
        let (columns, rows) = (volume.columns, volume.rows);
        let (low, high) = volume.range();
        let summary = format!(
            "{} volume  |  {} x {} x {}  |  values {} to {}",
            volume.kind.label(),
            frames,
            rows,
            columns,
            low,
            high
        );

        let mut frame = self.frame();
        ui.horizontal(|ui| {
            ui.label(summary);
            if frames > 1 {
                ui.separator();
                ui.add(egui::Slider::new(&mut frame, 0..=frames - 1).text("Slice"));
            }
        });
        self.set_frame(frame);

        if self.uploaded != Some(self.frame) {
            let Some(volume) = &self.volume else {
                return;
            };
            let slice = volume.slice(self.frame);
            let image = egui::ColorImage::from_gray([columns, rows], slice.as_raw());
            self.texture = Some(ui.ctx().load_texture("volume_slice", image, egui::TextureOptions::LINEAR));
            self.uploaded = Some(self.frame);
        }

        let Some(texture) = &self.texture else {
            return;
        };

        // Fit the slice into the remaining space, keeping its aspect ratio
        let available = ui.available_size();
        let img_aspect = columns as f32 / rows as f32;
        let available_aspect = available.x / available.y.max(1.0);
        let (display_width, display_height) = if img_aspect > available_aspect {
            (available.x, available.x / img_aspect)
        } else {
            (available.y * img_aspect, available.y)
        };

        let (rect, _) = ui.allocate_exact_size(available, egui::Sense::hover());
        let image_rect = egui::Rect::from_center_size(rect.center(), egui::vec2(display_width, display_height));
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 0.0, egui::Color32::BLACK);
        painter.image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::volume::VolumeKind;

    fn volume(frames: usize) -> Volume {
        Volume::from_shape(VolumeKind::Nifti, &[frames, 2, 2], vec![1.0; frames * 4]).unwrap()
    }

    #[test]
    fn test_load_selects_middle_slice() {
        let mut viewer = VolumeViewer::default();
        viewer.load(volume(9));
        assert_eq!(viewer.frame(), 4);
        assert_eq!(viewer.volume().map(|v| v.frames), Some(9));
    }

    #[test]
    fn test_load_replaces_previous_volume() {
        let mut viewer = VolumeViewer::default();
        viewer.load(volume(9));
        viewer.set_frame(8);
        viewer.load(volume(3));
        assert_eq!(viewer.frame(), 1);
        assert_eq!(viewer.volume().map(|v| v.frames), Some(3));
    }

    #[test]
    fn test_reset_and_frame_clamp() {
        let mut viewer = VolumeViewer::default();
        viewer.set_frame(5);
        assert_eq!(viewer.frame(), 0);

        viewer.load(volume(4));
        viewer.set_frame(100);
        assert_eq!(viewer.frame(), 3);

        viewer.reset();
        assert!(viewer.volume().is_none());
        assert_eq!(viewer.frame(), 0);
    }
}
