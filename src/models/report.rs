// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Report drafts and their page layout.
//!
//! A draft is a text buffer with freely placed images on top. Saving lays
//! both out on fixed-size pages with one uniform scale, so the PDF matches
//! what the editor showed.

use image::RgbaImage;

/// Smallest edge length a placed image can be resized to, in editor pixels.
pub const MIN_IMAGE_EDGE: f32 = 40.0;
/// Size of the square resize handle in the bottom-right corner.
pub const RESIZE_HANDLE: f32 = 12.0;
/// Wheel scaling bounds for placed images.
pub const IMAGE_SCALE_RANGE: (f32, f32) = (0.1, 5.0);
/// Horizontal advance of a monospace glyph, in ems.
pub const MONO_ADVANCE: f32 = 0.6;
/// Line height as a multiple of the font size.
pub const LINE_SPACING: f32 = 1.25;

/// Page geometry in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageSize {
    /// ISO A4 portrait with a 10 mm margin.
    pub const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
        margin: 28.0,
    };

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    pub fn content_height(&self) -> f32 {
        self.height - 2.0 * self.margin
    }
}

/// An image floating over the report text, in editor coordinates.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub id: u64,
    pub pixels: RgbaImage,
    /// Top-left corner relative to the editor area
    pub pos: [f32; 2],
    pub size: [f32; 2],
    /// Wheel zoom relative to the natural size
    pub scale: f32,
}

impl PlacedImage {
    fn natural_size(&self) -> [f32; 2] {
        [self.pixels.width() as f32, self.pixels.height() as f32]
    }

    /// Whether a point relative to the image's top-left corner is on the
    /// resize handle.
    pub fn on_resize_handle(&self, local: [f32; 2]) -> bool {
        let (w, h) = (self.size[0], self.size[1]);
        (w - RESIZE_HANDLE..=w).contains(&local[0]) && (h - RESIZE_HANDLE..=h).contains(&local[1])
    }

    pub fn move_by(&mut self, delta: [f32; 2]) {
        self.pos[0] += delta[0];
        self.pos[1] += delta[1];
    }

    /// Resize so the bottom-right corner follows a point relative to the
    /// top-left corner.
    pub fn resize_to(&mut self, local: [f32; 2]) {
        self.size = [local[0].max(MIN_IMAGE_EDGE), local[1].max(MIN_IMAGE_EDGE)];
    }

    /// Wheel zoom: 1.1x in, 0.9x out, applied to the natural size.
    pub fn zoom(&mut self, zoom_in: bool) {
        let factor = if zoom_in { 1.1 } else { 0.9 };
        let (lo, hi) = IMAGE_SCALE_RANGE;
        self.scale = (self.scale * factor).clamp(lo, hi);
        let natural = self.natural_size();
        self.size = [natural[0] * self.scale, natural[1] * self.scale];
    }
}

/// Text plus floating images for one editing session.
#[derive(Debug, Clone, Default)]
pub struct ReportDraft {
    pub text: String,
    pub images: Vec<PlacedImage>,
    next_id: u64,
}

impl ReportDraft {
    /// Add an image at its natural size, centered in the editor viewport.
    pub fn insert_image(&mut self, pixels: RgbaImage, viewport: [f32; 2]) -> u64 {
        let size = [pixels.width() as f32, pixels.height() as f32];
        let pos = [
            ((viewport[0] - size[0]) / 2.0).floor(),
            ((viewport[1] - size[1]) / 2.0).floor(),
        ];
        let id = self.next_id;
        self.next_id += 1;
        self.images.push(PlacedImage {
            id,
            pixels,
            pos,
            size,
            scale: 1.0,
        });
        id
    }

    #[cfg(test)]
    pub fn image_mut(&mut self, id: u64) -> Option<&mut PlacedImage> {
        self.images.iter_mut().find(|img| img.id == id)
    }

    /// Lay out the draft as it appears in an editor of `viewport` size
    /// using text of `font_size` pixels.
    pub fn layout(&self, viewport: [f32; 2], font_size: f32, page: PageSize) -> ReportLayout {
        let scale = page_scale(viewport, page);
        let page_height = page.content_height();
        let line_height = font_size * LINE_SPACING;
        let columns = wrap_columns(viewport[0], font_size);

        let mut pages: Vec<PageContent> = vec![PageContent::default()];
        let scaled_line = line_height * scale;

        // Text lines and images share one editor-y to page mapping
        for (i, line) in wrap_text(&self.text, columns).into_iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            let (index, y) = page_offset(i as f32 * scaled_line, page_height);
            page_slot(&mut pages, index).text.push(TextRun {
                text: line,
                x: page.margin,
                y: page.margin + y,
                font_size: font_size * scale,
            });
        }

        for (image_index, img) in self.images.iter().enumerate() {
            let (index, y) = page_offset(img.pos[1] * scale, page_height);
            page_slot(&mut pages, index).images.push(ImageRun {
                image_index,
                x: page.margin + img.pos[0] * scale,
                y: page.margin + y,
                width: img.size[0] * scale,
                height: img.size[1] * scale,
            });
        }

        ReportLayout { page, scale, pages }
    }
}

/// Page index and offset within that page's content area of a scaled
/// editor y coordinate.
fn page_offset(top: f32, page_height: f32) -> (usize, f32) {
    let top = top.max(0.0);
    let index = (top / page_height).floor() as usize;
    (index, top - index as f32 * page_height)
}

fn page_slot(pages: &mut Vec<PageContent>, index: usize) -> &mut PageContent {
    if pages.len() <= index {
        pages.resize_with(index + 1, PageContent::default);
    }
    &mut pages[index]
}

/// Uniform editor-to-page scale that fits the editor viewport on a page.
pub fn page_scale(viewport: [f32; 2], page: PageSize) -> f32 {
    let sx = page.content_width() / viewport[0].max(1.0);
    let sy = page.content_height() / viewport[1].max(1.0);
    sx.min(sy)
}

/// Monospace characters that fit on one editor line.
pub fn wrap_columns(viewport_width: f32, font_size: f32) -> usize {
    ((viewport_width / (font_size * MONO_ADVANCE)).floor() as usize).max(1)
}

/// Greedy word wrap at `columns` characters. Explicit newlines and leading
/// indentation are kept and words longer than a line are split.
pub fn wrap_text(text: &str, columns: usize) -> Vec<String> {
    let columns = columns.max(1);
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        let mut line_len = 0;

        for (k, word) in paragraph.split(' ').enumerate() {
            let mut word: Vec<char> = word.chars().collect();

            if k > 0 {
                if line_len > 0 && line_len + 1 + word.len() > columns {
                    lines.push(std::mem::take(&mut line));
                    line_len = 0;
                } else {
                    line.push(' ');
                    line_len += 1;
                }
            }
            while word.len() > columns - line_len {
                let rest = word.split_off(columns - line_len);
                line.extend(word);
                lines.push(std::mem::take(&mut line));
                line_len = 0;
                word = rest;
            }
            line_len += word.len();
            line.extend(word);
        }
        lines.push(line);
    }
    lines
}

/// A line of text on a page. `y` is the top of the line, from the page top.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
}

/// A placed image on a page, referring to `ReportDraft::images`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRun {
    pub image_index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContent {
    pub text: Vec<TextRun>,
    pub images: Vec<ImageRun>,
}

/// Pages ready to be written, all coordinates in points from the top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub page: PageSize,
    pub scale: f32,
    pub pages: Vec<PageContent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::new(w, h)
    }

    #[test]
    fn test_page_scale_uses_smaller_ratio() {
        let page = PageSize { width: 600.0, height: 800.0, margin: 0.0 };
        assert_eq!(page_scale([300.0, 200.0], page), 2.0);
        assert_eq!(page_scale([100.0, 800.0], page), 1.0);
    }

    #[test]
    fn test_insert_centers_image() {
        let mut draft = ReportDraft::default();
        let id = draft.insert_image(image(100, 50), [900.0, 600.0]);
        let img = draft.image_mut(id).unwrap();
        assert_eq!(img.pos, [400.0, 275.0]);
        assert_eq!(img.size, [100.0, 50.0]);
        assert_ne!(draft.insert_image(image(1, 1), [10.0, 10.0]), id);
    }

    #[test]
    fn test_resize_handle_and_minimum_size() {
        let mut draft = ReportDraft::default();
        let id = draft.insert_image(image(100, 80), [0.0, 0.0]);
        let img = draft.image_mut(id).unwrap();

        assert!(img.on_resize_handle([95.0, 75.0]));
        assert!(!img.on_resize_handle([50.0, 75.0]));
        assert!(!img.on_resize_handle([95.0, 10.0]));

        img.resize_to([10.0, 300.0]);
        assert_eq!(img.size, [MIN_IMAGE_EDGE, 300.0]);
    }

    #[test]
    fn test_wheel_zoom_is_clamped() {
        let mut draft = ReportDraft::default();
        let id = draft.insert_image(image(100, 100), [0.0, 0.0]);
        let img = draft.image_mut(id).unwrap();

        img.zoom(true);
        assert!((img.size[0] - 110.0).abs() < 1e-3);
        for _ in 0..100 {
            img.zoom(true);
        }
        assert_eq!(img.scale, 5.0);
        assert_eq!(img.size, [500.0, 500.0]);
        for _ in 0..100 {
            img.zoom(false);
        }
        assert_eq!(img.scale, 0.1);
    }

    #[test]
    fn test_move_by() {
        let mut draft = ReportDraft::default();
        let id = draft.insert_image(image(10, 10), [10.0, 10.0]);
        let img = draft.image_mut(id).unwrap();
        img.move_by([5.0, -3.0]);
        assert_eq!(img.pos, [5.0, -3.0]);
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("the quick brown fox", 10), ["the quick", "brown fox"]);
        assert_eq!(wrap_text("a\n\nb", 10), ["a", "", "b"]);
        assert_eq!(wrap_text("abcdefghij", 4), ["abcd", "efgh", "ij"]);
        assert_eq!(wrap_text("", 4), [""]);
    }

    #[test]
    fn test_wrap_text_keeps_indentation() {
        assert_eq!(
            wrap_text("Findings:\n    IOP 14 mmHg", 40),
            ["Findings:", "    IOP 14 mmHg"]
        );
        assert_eq!(wrap_text("  a  b", 10), ["  a  b"]);
        assert_eq!(wrap_text("   x", 2), ["  ", "x"]);
    }

    #[test]
    fn test_layout_scales_text_and_images_uniformly() {
        let page = PageSize { width: 600.0, height: 800.0, margin: 0.0 };
        let mut draft = ReportDraft::default();
        draft.text = "hello".to_string();
        draft.insert_image(image(50, 20), [300.0, 400.0]);

        let layout = draft.layout([300.0, 400.0], 10.0, page);
        assert_eq!(layout.scale, 2.0);
        assert_eq!(layout.pages.len(), 1);

        let text = &layout.pages[0].text[0];
        assert_eq!(text.text, "hello");
        assert_eq!(text.font_size, 20.0);
        assert_eq!((text.x, text.y), (0.0, 0.0));

        let img = &layout.pages[0].images[0];
        assert_eq!((img.x, img.y), (250.0, 380.0));
        assert_eq!((img.width, img.height), (100.0, 40.0));
    }

    #[test]
    fn test_long_text_flows_onto_more_pages() {
        let page = PageSize { width: 200.0, height: 200.0, margin: 0.0 };
        let mut draft = ReportDraft::default();
        draft.text = (0..30).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");

        // 10px font, 12.5px lines, scale 1: 16 lines per page
        let layout = draft.layout([200.0, 200.0], 10.0, page);
        assert_eq!(layout.pages.len(), 2);
        assert_eq!(layout.pages[0].text.len(), 16);
        assert_eq!(layout.pages[1].text.len(), 14);
        assert_eq!(layout.pages[1].text[0].text, "line 16");
        assert_eq!(layout.pages[1].text[0].y, 0.0);
    }

    #[test]
    fn test_image_below_first_page_goes_to_later_page() {
        let page = PageSize { width: 100.0, height: 100.0, margin: 10.0 };
        let mut draft = ReportDraft::default();
        let id = draft.insert_image(image(10, 10), [80.0, 80.0]);
        draft.image_mut(id).unwrap().pos = [0.0, 130.0];

        let layout = draft.layout([80.0, 80.0], 10.0, page);
        assert_eq!(layout.scale, 1.0);
        assert_eq!(layout.pages.len(), 2);
        assert!(layout.pages[0].images.is_empty());
        assert_eq!(layout.pages[1].images[0].y, 10.0 + 50.0);
    }

    #[test]
    fn test_text_and_images_share_page_breaks() {
        let mut draft = ReportDraft::default();
        draft.text = (0..211).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");

        // Editor twice the A4 content area; 12px font gives 15px lines
        let viewport = [1078.0, 1572.0];
        let id = draft.insert_image(image(20, 20), viewport);
        draft.image_mut(id).unwrap().pos = [0.0, 210.0 * 15.0];

        let layout = draft.layout(viewport, 12.0, PageSize::A4);
        assert_eq!(layout.scale, 0.5);

        let (text_page, text) = layout
            .pages
            .iter()
            .enumerate()
            .find_map(|(p, page)| page.text.iter().find(|t| t.text == "line 210").map(|t| (p, t)))
            .unwrap();
        let (image_page, img) = layout
            .pages
            .iter()
            .enumerate()
            .find_map(|(p, page)| page.images.first().map(|img| (p, img)))
            .unwrap();

        assert_eq!(text_page, 2);
        assert_eq!(image_page, text_page);
        assert_eq!(img.y, text.y);
    }
}
