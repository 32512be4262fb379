// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Page model produced by the layout builder and its serialization to PDF.
//!
//! Positions are in millimetres from the top-left corner of an A4 page, the same way the
//! layout code reasons about them. Conversion to PDF points happens in [`PdfDocument::to_bytes`].

use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, Str, TextStr};

use super::fonts::{FontStyle, encode_win_ansi};
use super::logo::PdfImage;

pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;
const MM_TO_PT: f32 = 72.0 / 25.4;
const LINE_WIDTH_PT: f32 = 0.57;

/// 8-bit RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    fn components(self) -> (f32, f32, f32) {
        (
            f32::from(self.0) / 255.0,
            f32::from(self.1) / 255.0,
            f32::from(self.2) / 255.0,
        )
    }
}

/// One drawing instruction
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        style: FontStyle,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        fill: Option<Rgb>,
        stroke: Option<Rgb>,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        color: Rgb,
    },
    /// Entry of [`PdfDocument::images`] scaled into a box whose top-left corner is `x`, `y`
    Image {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Text runs of the page in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Rect { .. } | DrawOp::Line { .. } | DrawOp::Image { .. } => None,
        })
    }
}

/// Laid-out document, ready to be serialized
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PdfDocument {
    pub title: String,
    pub pages: Vec<Page>,
    pub images: Vec<PdfImage>,
}

impl PdfDocument {
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Every text run of the document
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(Page::texts)
    }

    /// Serialize to PDF bytes
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut pdf = Pdf::new();
        let mut alloc = Ref::new(1);

        let catalog_id = alloc.bump();
        let page_tree_id = alloc.bump();
        let regular_id = alloc.bump();
        let bold_id = alloc.bump();
        let info_id = alloc.bump();
        let page_refs: Vec<(Ref, Ref)> = self
            .pages
            .iter()
            .map(|_| (alloc.bump(), alloc.bump()))
            .collect();
        let image_refs: Vec<(Ref, Option<Ref>)> = self
            .images
            .iter()
            .map(|image| (alloc.bump(), image.alpha.as_ref().map(|_| alloc.bump())))
            .collect();

        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.pages(page_tree_id)
            .kids(page_refs.iter().map(|(page_id, _)| *page_id))
            .count(i32::try_from(page_refs.len()).unwrap_or(i32::MAX));

        for (id, style) in [(regular_id, FontStyle::Regular), (bold_id, FontStyle::Bold)] {
            pdf.type1_font(id)
                .base_font(Name(style.base_font()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        for (page, (page_id, content_id)) in self.pages.iter().zip(&page_refs) {
            let mut pdf_page = pdf.page(*page_id);
            pdf_page.media_box(Rect::new(
                0.0,
                0.0,
                PAGE_WIDTH_MM * MM_TO_PT,
                PAGE_HEIGHT_MM * MM_TO_PT,
            ));
            pdf_page.parent(page_tree_id);
            pdf_page.contents(*content_id);
            let mut resources = pdf_page.resources();
            resources
                .fonts()
                .pair(Name(FontStyle::Regular.resource_name()), regular_id)
                .pair(Name(FontStyle::Bold.resource_name()), bold_id);
            if !image_refs.is_empty() {
                let mut x_objects = resources.x_objects();
                for (index, (image_id, _)) in image_refs.iter().enumerate() {
                    let name = image_name(index);
                    x_objects.pair(Name(name.as_bytes()), *image_id);
                }
            }
            resources.finish();
            pdf_page.finish();

            let content = render_page(page);
            pdf.stream(*content_id, &content);
        }

        for (image, (image_id, mask_id)) in self.images.iter().zip(&image_refs) {
            write_image(&mut pdf, image, *image_id, *mask_id);
        }

        pdf.document_info(info_id)
            .title(TextStr(&self.title))
            .creator(TextStr("Home Assistant"))
            .producer(TextStr("energy-report"));

        pdf.finish()
    }
}

/// XObject resource name of an image
fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

fn write_image(pdf: &mut Pdf, image: &PdfImage, image_id: Ref, mask_id: Option<Ref>) {
    let width = i32::try_from(image.width).unwrap_or(i32::MAX);
    let height = i32::try_from(image.height).unwrap_or(i32::MAX);

    let mut xobject = pdf.image_xobject(image_id, &image.rgb);
    xobject.filter(Filter::FlateDecode);
    xobject.width(width);
    xobject.height(height);
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    if let Some(mask_id) = mask_id {
        xobject.s_mask(mask_id);
    }
    xobject.finish();

    if let (Some(mask_id), Some(alpha)) = (mask_id, &image.alpha) {
        let mut mask = pdf.image_xobject(mask_id, alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(width);
        mask.height(height);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        mask.finish();
    }
}

fn pt(mm: f32) -> f32 {
    mm * MM_TO_PT
}

/// PDF y coordinate of a distance from the top edge
fn flip(y_mm: f32) -> f32 {
    pt(PAGE_HEIGHT_MM - y_mm)
}

fn render_page(page: &Page) -> Vec<u8> {
    let mut content = Content::new();
    content.set_line_width(LINE_WIDTH_PT);

    for op in &page.ops {
        match op {
            DrawOp::Text {
                x,
                baseline,
                size,
                style,
                color,
                text,
            } => {
                let (r, g, b) = color.components();
                content.set_fill_rgb(r, g, b);
                content.begin_text();
                content.set_font(Name(style.resource_name()), *size);
                content.set_text_matrix([1.0, 0.0, 0.0, 1.0, pt(*x), flip(*baseline)]);
                content.show(Str(&encode_win_ansi(text)));
                content.end_text();
            }
            DrawOp::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
            } => {
                let rect = (pt(*x), flip(*y + *height), pt(*width), pt(*height));
                if let Some(fill) = fill {
                    let (r, g, b) = fill.components();
                    content.set_fill_rgb(r, g, b);
                    content.rect(rect.0, rect.1, rect.2, rect.3);
                    content.fill_nonzero();
                }
                if let Some(stroke) = stroke {
                    let (r, g, b) = stroke.components();
                    content.set_stroke_rgb(r, g, b);
                    content.rect(rect.0, rect.1, rect.2, rect.3);
                    content.stroke();
                }
            }
            DrawOp::Line {
                x1,
                y1,
                x2,
                y2,
                color,
            } => {
                let (r, g, b) = color.components();
                content.set_stroke_rgb(r, g, b);
                content.move_to(pt(*x1), flip(*y1));
                content.line_to(pt(*x2), flip(*y2));
                content.stroke();
            }
            DrawOp::Image {
                x,
                y,
                width,
                height,
                image,
            } => {
                let name = image_name(*image);
                content.save_state();
                content.transform([pt(*width), 0.0, 0.0, pt(*height), pt(*x), flip(*y + *height)]);
                content.x_object(Name(name.as_bytes()));
                content.restore_state();
            }
        }
    }

    content.finish().to_vec()
}
