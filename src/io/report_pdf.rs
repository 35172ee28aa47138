// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! PDF output for report drafts.
//!
//! Takes a [`ReportLayout`] (top-left origin, points) and writes it with
//! `printpdf`, whose origin is the bottom-left corner.

use crate::models::patient::REPORT_PREFIX;
use crate::models::report::{ReportDraft, ReportLayout};
use chrono::Local;
use printpdf::image_crate::{DynamicImage, Rgb, RgbImage};
use printpdf::{BuiltinFont, Image, ImageTransform, Mm, PdfDocument};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;


#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn pt_to_mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

/// `Report_<YYYYmmdd_HHMMSS>.pdf` for the current local time.
pub fn report_file_name() -> String {
    format!("{}{}.pdf", REPORT_PREFIX, Local::now().format("%Y%m%d_%H%M%S"))
}

/// Unique report path inside a patient folder.
pub fn report_path(patient_dir: &Path) -> PathBuf {
    patient_dir.join(report_file_name())
}

/// Write a laid-out draft to `path`. Text is drawn first, images on top.
pub fn write_report(draft: &ReportDraft, layout: &ReportLayout, path: &Path) -> Result<(), ReportError> {
    let page_w = pt_to_mm(layout.page.width);
    let page_h = pt_to_mm(layout.page.height);
    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Report");

    let (doc, first_page, first_layer) = PdfDocument::new(title, page_w, page_h, "Layer 1");
    let font = doc
        .add_builtin_font(BuiltinFont::Courier)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;

    for (index, content) in layout.pages.iter().enumerate() {
        let (page, layer) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(page_w, page_h, "Layer 1")
        };
        let layer = doc.get_page(page).get_layer(layer);

        for run in &content.text {
            // use_text positions the baseline; approximate it by the ascent
            let baseline = layout.page.height - run.y - run.font_size * 0.8;
            layer.use_text(&run.text, run.font_size, pt_to_mm(run.x), pt_to_mm(baseline), &font);
        }

        for run in &content.images {
            let Some(placed) = draft.images.get(run.image_index) else {
                continue;
            };
            let rgb = to_pdf_rgb(&placed.pixels);
            let (px_w, px_h) = rgb.dimensions();
            if px_w == 0 || px_h == 0 {
                continue;
            }

            // At 72 dpi one pixel is one point; scale from there
            let transform = ImageTransform {
                translate_x: Some(pt_to_mm(run.x)),
                translate_y: Some(pt_to_mm(layout.page.height - run.y - run.height)),
                scale_x: Some(run.width / px_w as f32),
                scale_y: Some(run.height / px_h as f32),
                dpi: Some(72.0),
                ..Default::default()
            };
            Image::from_dynamic_image(&DynamicImage::ImageRgb8(rgb))
                .add_to_layer(layer.clone(), transform);
        }
    }

    let file = File::create(path).map_err(|source| ReportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;

    log::info!("Saved report {} ({} page(s))", path.display(), layout.pages.len());
    Ok(())
}

/// Composite over white paper, in the `image` version `printpdf` links
/// against.
fn to_pdf_rgb(pixels: &image::RgbaImage) -> RgbImage {
    let (w, h) = pixels.dimensions();
    let mut out = RgbImage::new(w, h);
    for (x, y, p) in pixels.enumerate_pixels() {
        let alpha = p[3] as u16;
        let over_white = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, Rgb([over_white(p[0]), over_white(p[1]), over_white(p[2])]));
    }
    out
}
