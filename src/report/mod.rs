//! Printable schematic report.
//!
//! Pages are laid out as a backend-neutral display list of [`DrawOp`]s in
//! millimeters with a top-left origin and y growing downwards. The
//! [`pdf`] backend turns a finished [`ReportDocument`] into PDF bytes.

pub mod pdf;
pub mod projector;
pub mod summary;

use serde::Deserialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::config::ReportConfig;
use crate::model::{Rgb, StuffingPlan};

/// A4 landscape.
pub const PAGE_WIDTH_MM: f64 = 297.0;
pub const PAGE_HEIGHT_MM: f64 = 210.0;
pub const PAGE_MARGIN_MM: f64 = 20.0;

pub const BRAND_BLUE: Rgb = Rgb::new(0, 64, 255);
pub const FOOTER_GREY: Rgb = Rgb::new(120, 120, 120);

/// Typographic point in millimeters.
const PT_TO_MM: f64 = 0.3528;
/// Average Helvetica glyph width relative to the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF backend failed: {0}")]
    Pdf(String),
    #[error("embedded image unusable: {0}")]
    Image(String),
}

/// Axis-aligned rectangle on a page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PageRect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Shrinks the rectangle by `amount` on every side.
    pub fn inset(&self, amount: f64) -> Self {
        Self::new(
            self.x + amount,
            self.y + amount,
            (self.w - 2.0 * amount).max(0.0),
            (self.h - 2.0 * amount).max(0.0),
        )
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width_mm: f64,
}

impl Stroke {
    pub const fn new(color: Rgb, width_mm: f64) -> Self {
        Self { color, width_mm }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    Rect {
        rect: PageRect,
        fill: Option<Rgb>,
        stroke: Option<Stroke>,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        stroke: Stroke,
    },
    /// `y` is the text baseline.
    Text {
        x: f64,
        y: f64,
        size_pt: f64,
        text: String,
        color: Rgb,
        style: FontStyle,
    },
    /// PNG-encoded raster image stretched into `rect`.
    Image { rect: PageRect, png: Vec<u8> },
}

#[derive(Clone, Debug, PartialEq)]
pub enum PageKind {
    Summary,
    Step { step: u32, placement_id: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportPage {
    pub kind: PageKind,
    pub ops: Vec<DrawOp>,
}

impl ReportPage {
    pub fn new(kind: PageKind) -> Self {
        Self {
            kind,
            ops: Vec::new(),
        }
    }

    pub fn rect(&mut self, rect: PageRect, fill: Option<Rgb>, stroke: Option<Stroke>) {
        self.ops.push(DrawOp::Rect { rect, fill, stroke });
    }

    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), stroke: Stroke) {
        self.ops.push(DrawOp::Line { from, to, stroke });
    }

    pub fn text(
        &mut self,
        x: f64,
        y: f64,
        size_pt: f64,
        text: impl Into<String>,
        color: Rgb,
        style: FontStyle,
    ) {
        self.ops.push(DrawOp::Text {
            x,
            y,
            size_pt,
            text: text.into(),
            color,
            style,
        });
    }

    /// Text horizontally centered on `center_x`.
    pub fn centered_text(
        &mut self,
        center_x: f64,
        y: f64,
        size_pt: f64,
        text: impl Into<String>,
        color: Rgb,
        style: FontStyle,
    ) {
        let text = text.into();
        let x = center_x - approx_text_width(&text, size_pt) / 2.0;
        self.text(x, y, size_pt, text, color, style);
    }

    /// All text runs on the page, in draw order.
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().any(|text| text.contains(needle))
    }
}

/// Estimated rendered width of `text` in millimeters.
pub fn approx_text_width(text: &str, size_pt: f64) -> f64 {
    text.chars().count() as f64 * size_pt * PT_TO_MM * AVG_GLYPH_WIDTH
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportDocument {
    pub title: String,
    pub width_mm: f64,
    pub height_mm: f64,
    pub pages: Vec<ReportPage>,
}

/// Raster capture embedded into the summary page.
#[derive(Clone, Debug, PartialEq)]
pub struct Screenshot {
    pub png: Vec<u8>,
    /// Width divided by height.
    pub aspect_ratio: f64,
}

/// Per-call report overrides.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct ReportOptions {
    /// Summary page heading.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    /// Embed a capture of the fitted 3D view on the summary page.
    #[serde(default)]
    pub include_screenshot: Option<bool>,
}

/// Options merged over the configured defaults.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSettings {
    pub title: String,
    pub company_name: String,
    pub include_screenshot: bool,
    pub generated_at: String,
}

impl ReportSettings {
    pub fn resolve(config: &ReportConfig, options: &ReportOptions) -> Self {
        Self {
            title: options.title.clone().unwrap_or_else(|| config.title.clone()),
            company_name: options
                .company_name
                .clone()
                .unwrap_or_else(|| config.company_name.clone()),
            include_screenshot: options.include_screenshot.unwrap_or(config.include_screenshot),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

/// Lays out the whole report: one summary page followed by one page per
/// resolvable placement in step order.
pub fn build_document(
    plan: &StuffingPlan,
    settings: &ReportSettings,
    screenshot: Option<&Screenshot>,
) -> ReportDocument {
    let ordered = plan.placements_by_step();
    let mut pages = Vec::with_capacity(ordered.len() + 1);
    pages.push(summary::render_summary_page(plan, settings, screenshot));
    for index in 0..ordered.len() {
        pages.push(projector::render_step_page(plan, &ordered, index, pages.len() + 1));
    }

    if let Some(last) = pages.last_mut() {
        last.text(
            PAGE_MARGIN_MM,
            PAGE_HEIGHT_MM - 5.0,
            8.0,
            format!("Generated on {}", settings.generated_at),
            FOOTER_GREY,
            FontStyle::Italic,
        );
    }

    ReportDocument {
        title: settings.title.clone(),
        width_mm: PAGE_WIDTH_MM,
        height_mm: PAGE_HEIGHT_MM,
        pages,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::fixtures::{mixed_plan, two_cube_plan};

    pub(crate) fn settings() -> ReportSettings {
        ReportSettings {
            title: "STUFFING RESULT".into(),
            company_name: "ACME Logistics".into(),
            include_screenshot: true,
            generated_at: "2026-01-02 03:04:05".into(),
        }
    }

    #[test]
    fn one_summary_page_plus_one_page_per_placement() {
        let document = build_document(&two_cube_plan(), &settings(), None);
        assert_eq!(document.pages.len(), 3);
        assert_eq!(document.pages[0].kind, PageKind::Summary);
        assert_eq!(
            document.pages[1].kind,
            PageKind::Step {
                step: 1,
                placement_id: "p1".into()
            }
        );
        assert_eq!(
            document.pages[2].kind,
            PageKind::Step {
                step: 2,
                placement_id: "p2".into()
            }
        );
    }

    #[test]
    fn unresolvable_placements_get_no_page() {
        let document = build_document(&mixed_plan(), &settings(), None);
        assert_eq!(document.pages.len(), 4);
        assert!(document.pages.iter().all(|page| !matches!(
            &page.kind,
            PageKind::Step { placement_id, .. } if placement_id == "ghost"
        )));
    }

    #[test]
    fn footers_number_pages_and_stamp_last_page() {
        let document = build_document(&two_cube_plan(), &settings(), None);
        assert!(document.pages[1].has_text("Page 2 - Step 1"));
        assert!(document.pages[2].has_text("Page 3 - Step 2"));
        assert!(document.pages[2].has_text("Generated on 2026-01-02 03:04:05"));
        assert!(!document.pages[1].has_text("Generated on"));
    }

    #[test]
    fn options_override_configured_defaults() {
        let config = ReportConfig::default();
        let options = ReportOptions {
            title: Some("Manifest".into()),
            company_name: None,
            include_screenshot: Some(false),
        };
        let settings = ReportSettings::resolve(&config, &options);
        assert_eq!(settings.title, "Manifest");
        assert_eq!(settings.company_name, config.company_name);
        assert!(!settings.include_screenshot);
    }

    #[test]
    fn inset_never_goes_negative() {
        let rect = PageRect::new(0.0, 0.0, 10.0, 4.0).inset(3.0);
        assert_eq!(rect, PageRect::new(3.0, 3.0, 4.0, 0.0));
    }
}
