//! Fitted top and side projections for step pages.
//!
//! Both views map physical X to page X. The top view maps physical Y to
//! page Y and the side view maps physical Z to page Y, each inverted
//! because the page grows downwards.

use crate::model::{ItemSpec, Placement, Rgb, StuffingPlan};
use crate::report::{
    BRAND_BLUE, FOOTER_GREY, FontStyle, PAGE_HEIGHT_MM, PAGE_MARGIN_MM, PAGE_WIDTH_MM, PageKind,
    PageRect, ReportPage, Stroke,
};
use crate::rotation;
use crate::types::Vec3;

/// Inner padding of a view box, split evenly between opposite sides.
pub const VIEW_PADDING_MM: f64 = 20.0;
pub const VIEW_GAP_MM: f64 = 10.0;
pub const LEGEND_HEIGHT_MM: f64 = 30.0;

const CONTAINER_STROKE: Stroke = Stroke::new(Rgb::BLACK, 0.5);
const CURRENT_STROKE: Stroke = Stroke::new(Rgb::new(20, 20, 20), 0.6);
const PAST_STROKE: Stroke = Stroke::new(Rgb::new(180, 180, 180), 0.2);
const GUIDE_STROKE: Stroke = Stroke::new(Rgb::new(90, 90, 90), 0.3);
const GUIDE_OFFSET_MM: f64 = 4.0;
const ARROW_HEAD_MM: f64 = 2.0;
const SWATCH_MM: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewKind {
    Top,
    Side,
}

impl ViewKind {
    /// Container extent along page X and page Y.
    pub fn extent(self, container: Vec3) -> (f64, f64) {
        match self {
            ViewKind::Top => (container.x, container.y),
            ViewKind::Side => (container.x, container.z),
        }
    }

    pub fn caption(self) -> &'static str {
        match self {
            ViewKind::Top => "Top View (XY)",
            ViewKind::Side => "Side View (XZ)",
        }
    }

    /// Page rectangle of a box in this view.
    pub fn project(self, fit: &ViewFit, corner: Vec3, oriented: Vec3) -> PageRect {
        match self {
            ViewKind::Top => fit.project(corner.x, corner.y, oriented.x, oriented.y),
            ViewKind::Side => fit.project(corner.x, corner.z, oriented.x, oriented.z),
        }
    }
}

/// Uniform scale and centering of a container extent inside an area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewFit {
    pub scale: f64,
    pub origin_x: f64,
    pub origin_y: f64,
    pub extent_x: f64,
    pub extent_y: f64,
}

impl ViewFit {
    /// `scale = min(area.w / extent_x, area.h / extent_y)`; the leftover
    /// space is split evenly on both sides.
    pub fn fit(area: PageRect, extent_x: f64, extent_y: f64) -> Self {
        let scale = if extent_x > 0.0 && extent_y > 0.0 {
            (area.w / extent_x).min(area.h / extent_y)
        } else {
            0.0
        };
        Self {
            scale,
            origin_x: area.x + (area.w - extent_x * scale) / 2.0,
            origin_y: area.y + (area.h - extent_y * scale) / 2.0,
            extent_x,
            extent_y,
        }
    }

    /// Outline of the whole container.
    pub fn container_rect(&self) -> PageRect {
        PageRect::new(
            self.origin_x,
            self.origin_y,
            self.extent_x * self.scale,
            self.extent_y * self.scale,
        )
    }

    /// Maps a footprint given by its lower corner `(a, b)` and size
    /// `(da, db)` in millimeters, inverting the vertical axis.
    pub fn project(&self, a: f64, b: f64, da: f64, db: f64) -> PageRect {
        PageRect::new(
            self.origin_x + a * self.scale,
            self.origin_y + (self.extent_y - (b + db)) * self.scale,
            da * self.scale,
            db * self.scale,
        )
    }
}

pub fn project_top(fit: &ViewFit, corner: Vec3, oriented: Vec3) -> PageRect {
    ViewKind::Top.project(fit, corner, oriented)
}

pub fn project_side(fit: &ViewFit, corner: Vec3, oriented: Vec3) -> PageRect {
    ViewKind::Side.project(fit, corner, oriented)
}

/// Fixed regions of a step page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepLayout {
    pub title_y: f64,
    pub top_box: PageRect,
    pub side_box: PageRect,
    pub legend_box: PageRect,
}

impl StepLayout {
    pub fn a4_landscape() -> Self {
        let title_y = PAGE_MARGIN_MM + 5.0;
        let diagram_top = title_y + 10.0;
        let diagram_h = PAGE_HEIGHT_MM - PAGE_MARGIN_MM - LEGEND_HEIGHT_MM - diagram_top;
        let diagram_w = PAGE_WIDTH_MM - 2.0 * PAGE_MARGIN_MM;
        let box_w = (diagram_w - VIEW_GAP_MM) / 2.0;
        Self {
            title_y,
            top_box: PageRect::new(PAGE_MARGIN_MM, diagram_top, box_w, diagram_h),
            side_box: PageRect::new(
                PAGE_MARGIN_MM + box_w + VIEW_GAP_MM,
                diagram_top,
                box_w,
                diagram_h,
            ),
            legend_box: PageRect::new(
                PAGE_MARGIN_MM,
                PAGE_HEIGHT_MM - PAGE_MARGIN_MM - LEGEND_HEIGHT_MM,
                diagram_w,
                LEGEND_HEIGHT_MM,
            ),
        }
    }

    pub fn view_box(&self, view: ViewKind) -> PageRect {
        match view {
            ViewKind::Top => self.top_box,
            ViewKind::Side => self.side_box,
        }
    }

    /// Fit of `view` for the given container.
    pub fn fit(&self, view: ViewKind, container: Vec3) -> ViewFit {
        let (extent_x, extent_y) = view.extent(container);
        ViewFit::fit(
            self.view_box(view).inset(VIEW_PADDING_MM / 2.0),
            extent_x,
            extent_y,
        )
    }
}

/// Renders the page for `ordered[index]`.
///
/// `ordered` holds the resolvable placements sorted by step. Every
/// placement at or below the page's step is drawn; those at exactly that
/// step are filled with their color and outlined boldly, earlier ones get a
/// thin grey outline only.
pub fn render_step_page(
    plan: &StuffingPlan,
    ordered: &[(&Placement, &ItemSpec)],
    index: usize,
    page_number: usize,
) -> ReportPage {
    let (current, current_item) = ordered[index];
    let mut page = ReportPage::new(PageKind::Step {
        step: current.step,
        placement_id: current.id.clone(),
    });
    let layout = StepLayout::a4_landscape();
    let container = plan.container.dims;

    page.centered_text(
        PAGE_WIDTH_MM / 2.0,
        layout.title_y,
        20.0,
        format!("Step {}: Load {}", current.step, current_item.label),
        BRAND_BLUE,
        FontStyle::Bold,
    );

    for view in [ViewKind::Top, ViewKind::Side] {
        let fit = layout.fit(view, container);
        let outline = fit.container_rect();
        page.rect(outline, None, Some(CONTAINER_STROKE));
        page.text(
            outline.x,
            outline.y - 5.0,
            10.0,
            view.caption(),
            Rgb::BLACK,
            FontStyle::Regular,
        );

        let visible = ordered
            .iter()
            .filter(|(placement, _)| placement.step <= current.step);
        let (now, past): (Vec<_>, Vec<_>) =
            visible.partition(|(placement, _)| placement.step == current.step);

        for (placement, item) in past {
            let dims = rotation::resolve(item.base_dims, placement.rotation_code).dims;
            page.rect(view.project(&fit, placement.position, dims), None, Some(PAST_STROKE));
        }
        for (placement, item) in now {
            let dims = rotation::resolve(item.base_dims, placement.rotation_code).dims;
            page.rect(
                view.project(&fit, placement.position, dims),
                Some(item.color),
                Some(CURRENT_STROKE),
            );
        }

        draw_axis_guides(&mut page, &fit, view);
    }

    draw_legend(&mut page, &layout.legend_box, current, current_item);

    page.text(
        PAGE_MARGIN_MM,
        PAGE_HEIGHT_MM - 10.0,
        8.0,
        format!("Page {} - Step {}", page_number, current.step),
        FOOTER_GREY,
        FontStyle::Italic,
    );
    page
}

fn draw_axis_guides(page: &mut ReportPage, fit: &ViewFit, view: ViewKind) {
    let outline = fit.container_rect();
    let (extent_x, extent_y) = (fit.extent_x, fit.extent_y);

    // length axis below the container, pointing right
    let y = outline.bottom() + GUIDE_OFFSET_MM;
    let tip = (outline.right(), y);
    page.line((outline.x, y), tip, GUIDE_STROKE);
    page.line(tip, (tip.0 - ARROW_HEAD_MM, y - ARROW_HEAD_MM / 2.0), GUIDE_STROKE);
    page.line(tip, (tip.0 - ARROW_HEAD_MM, y + ARROW_HEAD_MM / 2.0), GUIDE_STROKE);
    page.centered_text(
        outline.x + outline.w / 2.0,
        y + 4.0,
        8.0,
        format!("L {} mm", extent_x),
        GUIDE_STROKE.color,
        FontStyle::Regular,
    );

    // width or height axis left of the container, pointing up
    let x = outline.x - GUIDE_OFFSET_MM;
    let tip = (x, outline.y);
    page.line((x, outline.bottom()), tip, GUIDE_STROKE);
    page.line(tip, (x - ARROW_HEAD_MM / 2.0, tip.1 + ARROW_HEAD_MM), GUIDE_STROKE);
    page.line(tip, (x + ARROW_HEAD_MM / 2.0, tip.1 + ARROW_HEAD_MM), GUIDE_STROKE);
    let axis = match view {
        ViewKind::Top => "W",
        ViewKind::Side => "H",
    };
    let label = format!("{} {} mm", axis, extent_y);
    let width = super::approx_text_width(&label, 8.0);
    page.text(
        x - 1.0 - width,
        outline.y + outline.h / 2.0,
        8.0,
        label,
        GUIDE_STROKE.color,
        FontStyle::Regular,
    );
}

fn draw_legend(page: &mut ReportPage, area: &PageRect, placement: &Placement, item: &ItemSpec) {
    let resolved = rotation::resolve(item.base_dims, placement.rotation_code);
    let left = area.x;
    let right = area.x + area.w / 2.0;
    let row = |n: f64| area.y + 6.0 + n * 7.0;

    page.rect(
        PageRect::new(left, row(0.0) - 4.0, SWATCH_MM, SWATCH_MM),
        Some(item.color),
        Some(Stroke::new(Rgb::new(100, 100, 100), 0.2)),
    );
    page.text(
        left + SWATCH_MM + 3.0,
        row(0.0),
        12.0,
        item.label.clone(),
        Rgb::BLACK,
        FontStyle::Bold,
    );
    let identity = match &item.sku {
        Some(sku) => format!("ID: {} | SKU: {}", item.id, sku),
        None => format!("ID: {}", item.id),
    };
    page.text(left, row(1.0), 10.0, identity, Rgb::BLACK, FontStyle::Regular);
    page.text(
        left,
        row(2.0),
        10.0,
        format!("Weight: {} kg per unit", item.weight_kg),
        Rgb::BLACK,
        FontStyle::Regular,
    );

    let position = placement.position;
    page.text(
        right,
        row(0.0),
        10.0,
        format!("Position: ({}, {}, {}) mm", position.x, position.y, position.z),
        Rgb::BLACK,
        FontStyle::Regular,
    );
    let dims = resolved.dims;
    page.text(
        right,
        row(1.0),
        10.0,
        format!("Dimensions: {} x {} x {} mm", dims.x, dims.y, dims.z),
        Rgb::BLACK,
        FontStyle::Regular,
    );
    page.text(
        right,
        row(2.0),
        10.0,
        format!("Rotation: {}", placement.rotation_code),
        Rgb::BLACK,
        FontStyle::Regular,
    );
}
