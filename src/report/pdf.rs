//! PDF backend for [`ReportDocument`]s.

use printpdf::path::PaintMode;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rect,
};

use crate::model::Rgb;
use crate::report::{DrawOp, FontStyle, PageRect, ReportDocument, ReportError, Stroke};

const IMAGE_DPI: f32 = 300.0;
const MM_PER_INCH: f32 = 25.4;
const PT_PER_MM: f64 = 1.0 / 0.3528;
const LAYER_NAME: &str = "Layer 1";

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ReportError> {
        let font = |builtin| doc.add_builtin_font(builtin).map_err(pdf_error);
        Ok(Self {
            regular: font(BuiltinFont::Helvetica)?,
            bold: font(BuiltinFont::HelveticaBold)?,
            italic: font(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Italic => &self.italic,
        }
    }
}

fn pdf_error(err: printpdf::Error) -> ReportError {
    ReportError::Pdf(err.to_string())
}

fn color(rgb: Rgb) -> Color {
    let [r, g, b] = rgb.to_unit();
    Color::Rgb(printpdf::Rgb::new(r, g, b, None))
}

/// Serializes the document. Either the whole file is produced or an error
/// is returned; no partial output escapes.
pub fn render_pdf(document: &ReportDocument) -> Result<Vec<u8>, ReportError> {
    let page_w = Mm(document.width_mm as f32);
    let page_h = Mm(document.height_mm as f32);
    let (doc, first_page, first_layer) =
        PdfDocument::new(document.title.as_str(), page_w, page_h, LAYER_NAME);
    let fonts = Fonts::load(&doc)?;

    for (index, page) in document.pages.iter().enumerate() {
        let (page_idx, layer_idx) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(page_w, page_h, LAYER_NAME)
        };
        let layer = doc.get_page(page_idx).get_layer(layer_idx);
        let painter = Painter {
            layer,
            fonts: &fonts,
            page_height: document.height_mm,
        };
        for op in &page.ops {
            painter.draw(op)?;
        }
    }

    doc.save_to_bytes().map_err(pdf_error)
}

struct Painter<'a> {
    layer: PdfLayerReference,
    fonts: &'a Fonts,
    page_height: f64,
}

impl Painter<'_> {
    /// Page y (top-down) to PDF y (bottom-up).
    fn flip(&self, y: f64) -> Mm {
        Mm((self.page_height - y) as f32)
    }

    fn point(&self, (x, y): (f64, f64)) -> Point {
        Point::new(Mm(x as f32), self.flip(y))
    }

    fn set_stroke(&self, stroke: Stroke) {
        self.layer.set_outline_color(color(stroke.color));
        self.layer
            .set_outline_thickness((stroke.width_mm * PT_PER_MM) as f32);
    }

    fn draw(&self, op: &DrawOp) -> Result<(), ReportError> {
        match op {
            DrawOp::Rect { rect, fill, stroke } => self.draw_rect(rect, *fill, *stroke),
            DrawOp::Line { from, to, stroke } => {
                self.set_stroke(*stroke);
                self.layer.add_line(Line {
                    points: vec![(self.point(*from), false), (self.point(*to), false)],
                    is_closed: false,
                });
            }
            DrawOp::Text {
                x,
                y,
                size_pt,
                text,
                color: text_color,
                style,
            } => {
                self.layer.set_fill_color(color(*text_color));
                self.layer.use_text(
                    text.as_str(),
                    *size_pt as f32,
                    Mm(*x as f32),
                    self.flip(*y),
                    self.fonts.get(*style),
                );
            }
            DrawOp::Image { rect, png } => self.draw_image(rect, png)?,
        }
        Ok(())
    }

    fn draw_rect(&self, rect: &PageRect, fill: Option<Rgb>, stroke: Option<Stroke>) {
        let mode = match (fill, stroke) {
            (Some(_), Some(_)) => PaintMode::FillStroke,
            (Some(_), None) => PaintMode::Fill,
            (None, Some(_)) => PaintMode::Stroke,
            (None, None) => return,
        };
        if let Some(fill) = fill {
            self.layer.set_fill_color(color(fill));
        }
        if let Some(stroke) = stroke {
            self.set_stroke(stroke);
        }
        let shape = Rect::new(
            Mm(rect.x as f32),
            self.flip(rect.bottom()),
            Mm(rect.right() as f32),
            self.flip(rect.y),
        )
        .with_mode(mode);
        self.layer.add_rect(shape);
    }

    fn draw_image(&self, rect: &PageRect, png: &[u8]) -> Result<(), ReportError> {
        let decoded =
            image::load_from_memory(png).map_err(|err| ReportError::Image(err.to_string()))?;
        if decoded.width() == 0 || decoded.height() == 0 || rect.w <= 0.0 || rect.h <= 0.0 {
            return Ok(());
        }
        let natural_w = decoded.width() as f32 / IMAGE_DPI * MM_PER_INCH;
        let natural_h = decoded.height() as f32 / IMAGE_DPI * MM_PER_INCH;
        // PDF images do not carry our alpha channel
        let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());

        Image::from_dynamic_image(&rgb).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(rect.x as f32)),
                translate_y: Some(self.flip(rect.bottom())),
                scale_x: Some(rect.w as f32 / natural_w),
                scale_y: Some(rect.h as f32 / natural_h),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        Ok(())
    }
}
