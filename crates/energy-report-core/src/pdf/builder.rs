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

use std::collections::BTreeSet;

use tracing::debug;

use super::document::{DrawOp, PAGE_HEIGHT_MM, PAGE_WIDTH_MM, Page, PdfDocument, Rgb};
use super::fonts::{FontStyle, text_width};
use super::logo::PdfImage;
use crate::error::{ReportError, ReportResult};
use crate::format::format_measure;

pub const PRIMARY_COLOR: Rgb = Rgb(46, 134, 193);
const HEADER_TEXT_COLOR: Rgb = Rgb(255, 255, 255);
const TEXT_COLOR: Rgb = Rgb(33, 37, 41);
const LIGHT_TEXT_COLOR: Rgb = Rgb(110, 117, 126);
const BORDER_COLOR: Rgb = Rgb(222, 230, 236);
const ZEBRA_COLORS: [Rgb; 2] = [Rgb(255, 255, 255), Rgb(245, 249, 252)];
const TOTAL_FILL_COLOR: Rgb = Rgb(235, 239, 243);
const TOTAL_TEXT_COLOR: Rgb = Rgb(87, 96, 106);
const CHART_BACKGROUND: Rgb = Rgb(245, 249, 253);
const BAR_TRACK_COLOR: Rgb = Rgb(226, 235, 243);
const BAR_BORDER_COLOR: Rgb = Rgb(202, 214, 223);

const MARGIN_X: f32 = 15.0;
const HEADER_TOP: f32 = 12.0;
const CONTENT_TOP: f32 = 29.0;
const COVER_TOP: f32 = 70.0;
const COVER_TITLE_TOP: f32 = 100.0;
const COVER_LOGO_MAX_WIDTH: f32 = 140.0;
const COVER_LOGO_MAX_HEIGHT: f32 = 90.0;
const COVER_LOGO_GAP: f32 = 12.0;
const PAGE_BREAK_TRIGGER: f32 = PAGE_HEIGHT_MM - 18.0;
const FOOTER_TOP: f32 = PAGE_HEIGHT_MM - 15.0;
const CELL_MARGIN: f32 = 1.0;
const PT_PER_MM: f32 = 72.0 / 25.4;

const SECTION_SPACING: f32 = 9.0;
const SECTION_TITLE_SPACING: f32 = 4.0;
const TABLE_BOTTOM_SPACING: f32 = 3.0;
const TABLE_TITLE_HEIGHT: f32 = 9.0;
const TABLE_HEADER_HEIGHT: f32 = 8.0;
const TABLE_ROW_HEIGHT: f32 = 7.0;
const TABLE_FONT_SIZE: f32 = 10.0;

/// Placeholders substituted in the localized templates
pub const CURRENT_PAGE: &str = "{current}";
pub const TOTAL_PAGES: &str = "{total}";
pub const UNIT: &str = "{unit}";

/// Localized strings the layout draws on its own
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PdfLabels {
    pub title: String,
    pub period_label: String,
    /// Right side of the footer, e.g. "Generated on 05/03/2024 10:00"
    pub generated: String,
    /// Left side of the footer with [`CURRENT_PAGE`] and [`TOTAL_PAGES`] placeholders
    pub page_template: String,
    pub table_empty: String,
    /// Chart unit caption with a [`UNIT`] placeholder
    pub chart_units_template: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableConfig {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Relative column weights, equal widths when absent
    pub column_weights: Option<Vec<f32>>,
    /// Rows rendered bold on a darker background (totals)
    pub emphasize_rows: Vec<usize>,
}

/// One bar of a horizontal bar chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub value: f64,
    pub unit: String,
    pub color: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct Font {
    style: FontStyle,
    size: f32,
    color: Rgb,
}

impl Font {
    const fn new(style: FontStyle, size: f32, color: Rgb) -> Self {
        Self { style, size, color }
    }
}

/// A4 report layout with cover page, header band, footer and automatic page breaks
#[derive(Debug)]
pub struct EnergyPdfBuilder {
    labels: PdfLabels,
    pages: Vec<Page>,
    images: Vec<PdfImage>,
    /// Whether each page gets the header band and footer
    decorated: Vec<bool>,
    y: f32,
    content_started: bool,
}

impl EnergyPdfBuilder {
    #[must_use]
    pub fn new(labels: PdfLabels) -> Self {
        Self {
            labels,
            pages: Vec::new(),
            images: Vec::new(),
            decorated: Vec::new(),
            y: CONTENT_TOP,
            content_started: false,
        }
    }

    fn available_width() -> f32 {
        PAGE_WIDTH_MM - 2.0 * MARGIN_X
    }

    /// Title page without header and footer, with the logo centred above the title
    pub fn add_cover_page(&mut self, subtitle: &str, details: &[String], logo: Option<&PdfImage>) {
        self.new_page(false);
        let width = Self::available_width();

        match logo {
            Some(logo) => {
                let (logo_width, logo_height) =
                    logo.fit((width * 0.6).min(COVER_LOGO_MAX_WIDTH), COVER_LOGO_MAX_HEIGHT);
                self.push(DrawOp::Image {
                    x: (PAGE_WIDTH_MM - logo_width) / 2.0,
                    y: COVER_TOP,
                    width: logo_width,
                    height: logo_height,
                    image: self.images.len(),
                });
                self.images.push(logo.clone());
                self.y = COVER_TOP + logo_height + COVER_LOGO_GAP;
            }
            None => self.y = COVER_TITLE_TOP,
        }

        let title = self.labels.title.clone();
        self.cell(
            MARGIN_X,
            self.y,
            width,
            16.0,
            &title,
            Align::Center,
            Font::new(FontStyle::Bold, 28.0, PRIMARY_COLOR),
        );
        self.y += 16.0;

        self.cell(
            MARGIN_X,
            self.y,
            width,
            10.0,
            subtitle,
            Align::Center,
            Font::new(FontStyle::Regular, 14.0, TEXT_COLOR),
        );
        self.y += 20.0;

        for line in details {
            self.cell(
                MARGIN_X,
                self.y,
                width,
                8.0,
                line,
                Align::Center,
                Font::new(FontStyle::Regular, 11.0, TEXT_COLOR),
            );
            self.y += 8.0;
        }

        self.content_started = false;
    }

    pub fn add_section_title(&mut self, text: &str) {
        self.ensure_space(10.0);
        self.cell(
            MARGIN_X,
            self.y,
            Self::available_width(),
            10.0,
            text,
            Align::Left,
            Font::new(FontStyle::Bold, 15.0, PRIMARY_COLOR),
        );
        self.y += 10.0 + SECTION_TITLE_SPACING;
    }

    pub fn add_paragraph(&mut self, text: &str, bold: bool, size: f32) {
        let style = if bold { FontStyle::Bold } else { FontStyle::Regular };
        self.ensure_space(SECTION_SPACING);
        self.multi_cell(text, 6.0 * size / 11.0, Font::new(style, size, TEXT_COLOR));
        self.y += 1.0;
    }

    /// Zebra table with a coloured header row and a right-aligned last column
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Render` when the column weights are invalid or do not match
    /// the headers.
    pub fn add_table(&mut self, config: &TableConfig) -> ReportResult<()> {
        let columns = config.headers.len();
        if columns == 0 {
            return Ok(());
        }

        let widths = match &config.column_weights {
            Some(weights) => Self::compute_column_widths(weights)?,
            None => vec![Self::available_width() / columns as f32; columns],
        };
        if widths.len() != columns {
            return Err(ReportError::Render(format!(
                "table '{}' has {columns} headers but {} column widths",
                config.title,
                widths.len()
            )));
        }

        self.ensure_space(TABLE_TITLE_HEIGHT + TABLE_HEADER_HEIGHT + TABLE_ROW_HEIGHT);
        if !config.title.is_empty() {
            self.cell(
                MARGIN_X,
                self.y,
                Self::available_width(),
                TABLE_TITLE_HEIGHT,
                &config.title,
                Align::Left,
                Font::new(FontStyle::Bold, 13.0, TEXT_COLOR),
            );
            self.y += TABLE_TITLE_HEIGHT;
        }

        self.draw_row(
            &config.headers,
            &widths,
            TABLE_HEADER_HEIGHT,
            PRIMARY_COLOR,
            Font::new(FontStyle::Bold, TABLE_FONT_SIZE, HEADER_TEXT_COLOR),
        );

        if config.rows.is_empty() {
            let mut empty_row = vec![String::new(); columns];
            if let Some(first) = empty_row.first_mut() {
                first.clone_from(&self.labels.table_empty);
            }
            self.draw_row(
                &empty_row,
                &widths,
                TABLE_ROW_HEIGHT,
                ZEBRA_COLORS[0],
                Font::new(FontStyle::Regular, TABLE_FONT_SIZE, TEXT_COLOR),
            );
            self.y += TABLE_BOTTOM_SPACING;
            return Ok(());
        }

        for (index, row) in config.rows.iter().enumerate() {
            let (fill, font) = if config.emphasize_rows.contains(&index) {
                (
                    TOTAL_FILL_COLOR,
                    Font::new(FontStyle::Bold, TABLE_FONT_SIZE, TOTAL_TEXT_COLOR),
                )
            } else {
                (
                    ZEBRA_COLORS[index % 2],
                    Font::new(FontStyle::Regular, TABLE_FONT_SIZE, TEXT_COLOR),
                )
            };
            self.draw_row(row, &widths, TABLE_ROW_HEIGHT, fill, font);
        }

        self.y += TABLE_BOTTOM_SPACING;
        Ok(())
    }

    /// Horizontal bar chart; positive and negative values extend from a shared zero line
    ///
    /// Charts whose values are all zero are skipped.
    pub fn add_chart(&mut self, title: &str, series: &[ChartBar], ylabel: Option<&str>) {
        if !series.iter().any(|bar| bar.value.abs() > 1e-6) {
            debug!("Skipping empty chart '{title}'");
            return;
        }

        let ylabel = ylabel.map(str::to_owned).or_else(|| {
            let units: BTreeSet<&str> = series
                .iter()
                .map(|bar| bar.unit.as_str())
                .filter(|unit| !unit.is_empty())
                .collect();
            if units.len() == 1 {
                units.into_iter().next().map(str::to_owned)
            } else {
                None
            }
        });

        let bar_height = 8.0;
        let bar_spacing = 4.0;
        let padding = 8.0;
        let bars = series.len() as f32;
        let chart_height =
            2.0 * padding + bars * bar_height + (bars - 1.0).max(0.0) * bar_spacing;

        self.ensure_space(chart_height + 20.0);
        self.cell(
            MARGIN_X,
            self.y,
            Self::available_width(),
            8.0,
            title,
            Align::Left,
            Font::new(FontStyle::Bold, 12.0, TEXT_COLOR),
        );
        self.y += 8.0;
        match ylabel {
            Some(unit) => {
                let caption = self.labels.chart_units_template.replace(UNIT, &unit);
                self.cell(
                    MARGIN_X,
                    self.y,
                    Self::available_width(),
                    5.0,
                    &caption,
                    Align::Left,
                    Font::new(FontStyle::Regular, 9.0, LIGHT_TEXT_COLOR),
                );
                self.y += 5.0;
            }
            None => self.y += 1.0,
        }

        let chart_left = MARGIN_X;
        let chart_width = Self::available_width();
        let mut value_width = (chart_width * 0.18).clamp(32.0, 60.0);
        let mut label_width = (chart_width * 0.38).clamp(45.0, 90.0);
        let mut bar_area_width = chart_width - label_width - value_width - 8.0;
        if bar_area_width < 70.0 {
            label_width = (chart_width - value_width - 78.0).max(40.0);
            bar_area_width = chart_width - label_width - value_width - 8.0;
        }
        if bar_area_width < 60.0 {
            value_width = (chart_width - label_width - 68.0).max(30.0);
            bar_area_width = chart_width - label_width - value_width - 8.0;
        }
        let bar_area_width = bar_area_width.max(55.0);

        let chart_top = self.y;
        self.push(DrawOp::Rect {
            x: chart_left,
            y: chart_top,
            width: chart_width,
            height: chart_height,
            fill: Some(CHART_BACKGROUND),
            stroke: Some(BORDER_COLOR),
        });

        let bar_area_left = chart_left + label_width + 4.0;
        let positive_max = series.iter().map(|bar| bar.value).fold(0.0_f64, f64::max) as f32;
        let negative_min = series.iter().map(|bar| bar.value).fold(0.0_f64, f64::min) as f32;

        let zero_x = if positive_max > 0.0 && negative_min < 0.0 {
            bar_area_left + negative_min.abs() / (positive_max - negative_min) * bar_area_width
        } else if positive_max > 0.0 {
            bar_area_left
        } else {
            bar_area_left + bar_area_width
        };
        let positive_scale = if positive_max > 0.0 {
            (bar_area_left + bar_area_width - zero_x) / positive_max
        } else {
            0.0
        };
        let negative_scale = if negative_min < 0.0 {
            (zero_x - bar_area_left) / negative_min.abs()
        } else {
            0.0
        };

        self.push(DrawOp::Line {
            x1: zero_x,
            y1: chart_top,
            x2: zero_x,
            y2: chart_top + chart_height,
            color: BAR_BORDER_COLOR,
        });

        let mut track_top = chart_top + padding;
        for bar in series {
            let value = bar.value as f32;
            self.push(DrawOp::Rect {
                x: bar_area_left,
                y: track_top,
                width: bar_area_width,
                height: bar_height,
                fill: Some(BAR_TRACK_COLOR),
                stroke: None,
            });

            let span = if value >= 0.0 && positive_scale > 0.0 {
                let width = (value * positive_scale).max(0.5);
                Some((zero_x, width))
            } else if value < 0.0 && negative_scale > 0.0 {
                let width = (value.abs() * negative_scale).max(0.5);
                Some((zero_x - width, width))
            } else {
                None
            };
            if let Some((x, width)) = span {
                self.push(DrawOp::Rect {
                    x,
                    y: track_top,
                    width,
                    height: bar_height,
                    fill: Some(bar.color),
                    stroke: None,
                });
            }

            self.push(DrawOp::Rect {
                x: bar_area_left,
                y: track_top,
                width: bar_area_width,
                height: bar_height,
                fill: None,
                stroke: Some(BAR_BORDER_COLOR),
            });

            let font = Font::new(FontStyle::Regular, 10.0, TEXT_COLOR);
            self.cell(
                chart_left + 4.0,
                track_top + 1.0,
                label_width - 4.0,
                bar_height - 2.0,
                &bar.label,
                Align::Left,
                font,
            );
            let value_text = format_measure(Some(bar.value), &bar.unit);
            self.cell(
                bar_area_left + bar_area_width + 4.0,
                track_top + 1.0,
                value_width,
                bar_height - 2.0,
                &value_text,
                Align::Right,
                font,
            );

            track_top += bar_height + bar_spacing;
        }

        self.y = chart_top + chart_height + 4.0;
    }

    /// Convert relative weights into column widths spanning the content area
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Render` for empty weights or a non-positive total.
    pub fn compute_column_widths(weights: &[f32]) -> ReportResult<Vec<f32>> {
        if weights.is_empty() {
            return Err(ReportError::Render("column weights cannot be empty".to_owned()));
        }
        let total: f32 = weights.iter().sum();
        if total <= 0.0 || weights.iter().any(|w| *w < 0.0) {
            return Err(ReportError::Render(
                "column weights must be non-negative with a positive sum".to_owned(),
            ));
        }
        let available = Self::available_width();
        Ok(weights.iter().map(|w| w / total * available).collect())
    }

    /// Small grey note at the end of the report
    pub fn add_footer(&mut self, text: &str) {
        self.ensure_space(5.0);
        self.multi_cell(text, 5.0, Font::new(FontStyle::Regular, 9.0, LIGHT_TEXT_COLOR));
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Draw headers and footers, now that the page count is known
    #[must_use]
    pub fn finish(self) -> PdfDocument {
        let total = self.pages.len();
        let mut pages = self.pages;

        for (index, (page, decorated)) in pages.iter_mut().zip(&self.decorated).enumerate() {
            if !*decorated {
                continue;
            }
            let width = Self::available_width();

            let mut header = vec![DrawOp::Rect {
                x: MARGIN_X,
                y: HEADER_TOP,
                width,
                height: 8.0,
                fill: Some(PRIMARY_COLOR),
                stroke: None,
            }];
            header.extend(cell_op(
                MARGIN_X,
                HEADER_TOP,
                width,
                8.0,
                &self.labels.title,
                Align::Left,
                Font::new(FontStyle::Bold, 12.0, HEADER_TEXT_COLOR),
            ));
            header.push(DrawOp::Rect {
                x: MARGIN_X,
                y: HEADER_TOP + 8.0,
                width,
                height: 6.0,
                fill: Some(PRIMARY_COLOR),
                stroke: None,
            });
            header.extend(cell_op(
                MARGIN_X,
                HEADER_TOP + 8.0,
                width,
                6.0,
                &self.labels.period_label,
                Align::Left,
                Font::new(FontStyle::Regular, 9.0, HEADER_TEXT_COLOR),
            ));
            let body = std::mem::take(&mut page.ops);
            page.ops = header;
            page.ops.extend(body);

            let page_text = self
                .labels
                .page_template
                .replace(CURRENT_PAGE, &(index + 1).to_string())
                .replace(TOTAL_PAGES, &total.to_string());
            let footer_font = Font::new(FontStyle::Regular, 9.0, LIGHT_TEXT_COLOR);
            page.ops.extend(cell_op(
                MARGIN_X,
                FOOTER_TOP,
                width,
                5.0,
                &page_text,
                Align::Left,
                footer_font,
            ));
            page.ops.extend(cell_op(
                MARGIN_X,
                FOOTER_TOP,
                width,
                5.0,
                &self.labels.generated,
                Align::Right,
                footer_font,
            ));
        }

        PdfDocument {
            title: self.labels.title,
            pages,
            images: self.images,
        }
    }

    fn new_page(&mut self, decorated: bool) {
        self.pages.push(Page::default());
        self.decorated.push(decorated);
        self.y = CONTENT_TOP;
    }

    fn ensure_content_page(&mut self) {
        if !self.content_started {
            self.new_page(true);
            self.content_started = true;
        }
    }

    fn ensure_space(&mut self, height: f32) {
        self.ensure_content_page();
        if self.y + height > PAGE_BREAK_TRIGGER {
            self.new_page(true);
        }
    }

    fn push(&mut self, op: DrawOp) {
        if let Some(page) = self.pages.last_mut() {
            page.ops.push(op);
        }
    }

    #[expect(clippy::too_many_arguments)]
    fn cell(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        text: &str,
        align: Align,
        font: Font,
    ) {
        if let Some(op) = cell_op(x, y, width, height, text, align, font) {
            self.push(op);
        }
    }

    fn draw_row(
        &mut self,
        cells: &[String],
        widths: &[f32],
        height: f32,
        fill: Rgb,
        font: Font,
    ) {
        self.ensure_space(height);
        let y = self.y;
        let last = cells.len().saturating_sub(1);
        let mut x = MARGIN_X;

        for (index, (value, width)) in cells.iter().zip(widths).enumerate() {
            self.push(DrawOp::Rect {
                x,
                y,
                width: *width,
                height,
                fill: Some(fill),
                stroke: Some(BORDER_COLOR),
            });
            let align = if index == last { Align::Right } else { Align::Left };
            self.cell(x, y, *width, height, value, align, font);
            x += width;
        }

        self.y += height;
    }

    fn multi_cell(&mut self, text: &str, line_height: f32, font: Font) {
        let width = Self::available_width();
        for line in wrap_text(text, width - 2.0 * CELL_MARGIN, font.style, font.size) {
            self.ensure_space(line_height);
            self.cell(MARGIN_X, self.y, width, line_height, &line, Align::Left, font);
            self.y += line_height;
        }
    }
}

fn width_mm(text: &str, style: FontStyle, size: f32) -> f32 {
    text_width(text, style, size) / PT_PER_MM
}

/// Text op for a cell, vertically centred; text wider than the cell is truncated
fn cell_op(
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    text: &str,
    align: Align,
    font: Font,
) -> Option<DrawOp> {
    if text.is_empty() {
        return None;
    }
    let text = fit_text(text, (width - 2.0 * CELL_MARGIN).max(0.0), font.style, font.size);
    let text_width = width_mm(&text, font.style, font.size);
    let text_x = match align {
        Align::Left => x + CELL_MARGIN,
        Align::Center => x + (width - text_width) / 2.0,
        Align::Right => x + width - CELL_MARGIN - text_width,
    };
    Some(DrawOp::Text {
        x: text_x,
        baseline: y + 0.5 * height + 0.3 * font.size / PT_PER_MM,
        size: font.size,
        style: font.style,
        color: font.color,
        text,
    })
}

fn fit_text(text: &str, width: f32, style: FontStyle, size: f32) -> String {
    if width_mm(text, style, size) <= width {
        return text.to_owned();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while chars.pop().is_some() {
        let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
        if width_mm(&candidate, style, size) <= width {
            return candidate;
        }
    }
    String::new()
}

/// Break text into lines no wider than `width` millimetres
///
/// Explicit newlines are kept; words longer than a line are split between characters.
fn wrap_text(text: &str, width: f32, style: FontStyle, size: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_owned()
            } else {
                format!("{line} {word}")
            };
            if width_mm(&candidate, style, size) <= width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            for c in word.chars() {
                line.push(c);
                if line.chars().count() > 1 && width_mm(&line, style, size) > width {
                    line.pop();
                    lines.push(std::mem::take(&mut line));
                    line.push(c);
                }
            }
        }
        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> PdfLabels {
        PdfLabels {
            title: "Energy report".to_owned(),
            period_label: "Period: 01/03/2024 – 31/03/2024".to_owned(),
            generated: "Generated on 01/04/2024 08:00".to_owned(),
            page_template: format!("Page {CURRENT_PAGE} / {TOTAL_PAGES}"),
            table_empty: "No data available".to_owned(),
            chart_units_template: format!("Unit: {UNIT}"),
        }
    }

    fn table(rows: usize) -> TableConfig {
        TableConfig {
            title: "Energy totals".to_owned(),
            headers: vec!["Category".to_owned(), "Total".to_owned()],
            rows: (0..rows)
                .map(|i| vec![format!("Row {i}"), format!("{i}.00 kWh")])
                .collect(),
            column_weights: Some(vec![2.0, 1.0]),
            emphasize_rows: vec![],
        }
    }

    #[test]
    fn test_cover_has_no_header_and_content_pages_have_footer() {
        let mut builder = EnergyPdfBuilder::new(labels());
        builder.add_cover_page(
            "Monthly report",
            &["Generated on 01/04/2024 08:00".to_owned()],
            None,
        );
        builder.add_section_title("Overview");
        builder.add_paragraph("Solar production reached 5.000 kWh.", false, 11.0);
        let document = builder.finish();

        assert_eq!(document.page_count(), 2);
        let cover: Vec<&str> = document.pages[0].texts().collect();
        assert!(!cover.iter().any(|t| t.starts_with("Page ")));
        let content: Vec<&str> = document.pages[1].texts().collect();
        assert_eq!(content.first(), Some(&"Energy report"));
        assert!(content.contains(&"Page 2 / 2"));
        assert!(content.contains(&"Overview"));
    }

    #[test]
    fn test_cover_logo_is_centred_above_title() {
        let logo = PdfImage {
            width: 200,
            height: 100,
            rgb: Vec::new(),
            alpha: None,
        };
        let mut builder = EnergyPdfBuilder::new(labels());
        builder.add_cover_page("Monthly report", &[], Some(&logo));
        let document = builder.finish();

        assert_eq!(document.images, vec![logo]);
        let cover = &document.pages[0].ops;
        assert_eq!(
            cover.first(),
            Some(&DrawOp::Image {
                x: 51.0,
                y: COVER_TOP,
                width: 108.0,
                height: 54.0,
                image: 0,
            })
        );
        let title_baseline = cover.iter().find_map(|op| match op {
            DrawOp::Text { baseline, text, .. } if text == "Energy report" => Some(*baseline),
            _ => None,
        });
        assert!(title_baseline.is_some_and(|y| y > COVER_TOP + 54.0));
    }

    #[test]
    fn test_long_table_breaks_pages() {
        let mut builder = EnergyPdfBuilder::new(labels());
        builder.add_table(&table(80)).unwrap();
        let document = builder.finish();

        assert!(document.page_count() >= 3);
        let last_row = document.texts().filter(|t| *t == "Row 79").count();
        assert_eq!(last_row, 1);
        assert!(document.texts().any(|t| t == "Page 3 / 3" || t.starts_with("Page 3 /")));
    }

    #[test]
    fn test_empty_table_shows_placeholder() {
        let mut builder = EnergyPdfBuilder::new(labels());
        builder.add_table(&table(0)).unwrap();
        let document = builder.finish();
        assert!(document.texts().any(|t| t == "No data available"));
    }

    #[test]
    fn test_mismatched_weights_rejected() {
        let mut builder = EnergyPdfBuilder::new(labels());
        let mut config = table(1);
        config.column_weights = Some(vec![1.0, 1.0, 1.0]);
        assert!(matches!(builder.add_table(&config), Err(ReportError::Render(_))));
    }

    #[test]
    fn test_compute_column_widths() {
        let widths = EnergyPdfBuilder::compute_column_widths(&[1.0, 3.0]).unwrap();
        assert!((widths[0] - 45.0).abs() < 1e-3);
        assert!((widths[1] - 135.0).abs() < 1e-3);
        assert!(EnergyPdfBuilder::compute_column_widths(&[]).is_err());
        assert!(EnergyPdfBuilder::compute_column_widths(&[0.0, 0.0]).is_err());
    }

    #[test]
    fn test_zero_chart_is_skipped() {
        let mut builder = EnergyPdfBuilder::new(labels());
        builder.add_section_title("Overview");
        let before = builder.finish();

        let mut builder = EnergyPdfBuilder::new(labels());
        builder.add_section_title("Overview");
        builder.add_chart(
            "Energy distribution",
            &[ChartBar {
                label: "Solar production".to_owned(),
                value: 0.0,
                unit: "kWh".to_owned(),
                color: PRIMARY_COLOR,
            }],
            None,
        );
        assert_eq!(builder.finish(), before);
    }

    #[test]
    fn test_chart_with_mixed_signs_draws_every_bar() {
        let mut builder = EnergyPdfBuilder::new(labels());
        let bars = [("Import", 4.0), ("Export", -1.5), ("Solar", 2.0)].map(|(label, value)| {
            ChartBar {
                label: label.to_owned(),
                value,
                unit: "kWh".to_owned(),
                color: PRIMARY_COLOR,
            }
        });
        builder.add_chart("Energy distribution", &bars, None);
        let document = builder.finish();
        let texts: Vec<&str> = document.texts().collect();

        assert!(texts.contains(&"Unit: kWh"));
        assert!(texts.contains(&"-1.50 kWh"));
        let coloured_bars = document.pages[0]
            .ops
            .iter()
            .filter(|op| {
                matches!(op, DrawOp::Rect { fill: Some(c), .. } if *c == PRIMARY_COLOR)
            })
            .count();
        // three value bars plus the header band
        assert_eq!(coloured_bars, 3 + 2);
    }

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "Estimated total consumption is 6.000 kWh, of which 2.000 kWh is not covered by tracked devices.";
        let lines = wrap_text(text, 60.0, FontStyle::Regular, 11.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| width_mm(l, FontStyle::Regular, 11.0) <= 60.0));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_fit_text_truncates() {
        let fitted = fit_text(
            "A very long category label that cannot fit",
            20.0,
            FontStyle::Regular,
            10.0,
        );
        assert!(fitted.ends_with("..."));
        assert!(width_mm(&fitted, FontStyle::Regular, 10.0) <= 20.0);
    }
}
