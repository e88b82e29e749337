//! Summary page: container identity, cargo totals, per-item table and an
//! optional screenshot of the fitted 3D view.

use crate::model::{Rgb, StuffingPlan};
use crate::report::{
    BRAND_BLUE, DrawOp, FontStyle, PAGE_MARGIN_MM, PAGE_WIDTH_MM, PageKind, PageRect, ReportPage,
    ReportSettings, Screenshot, Stroke, approx_text_width,
};

const PANEL_HEIGHT_MM: f64 = 120.0;
const LEFT_SHARE: f64 = 0.35;
const BORDER: Stroke = Stroke::new(Rgb::new(200, 200, 200), 0.5);
const RULE: Stroke = Stroke::new(Rgb::new(200, 200, 200), 0.3);
const VALUE_OFFSET_MM: f64 = 50.0;
/// Column starts as fractions of the table width.
const COLUMNS: [f64; 4] = [0.0, 0.40, 0.55, 0.75];

pub fn render_summary_page(
    plan: &StuffingPlan,
    settings: &ReportSettings,
    screenshot: Option<&Screenshot>,
) -> ReportPage {
    let mut page = ReportPage::new(PageKind::Summary);
    let margin = PAGE_MARGIN_MM;

    page.text(margin, margin, 28.0, settings.title.clone(), BRAND_BLUE, FontStyle::Bold);
    let company_width = approx_text_width(&settings.company_name, 12.0);
    page.text(
        PAGE_WIDTH_MM - margin - company_width,
        margin,
        12.0,
        settings.company_name.clone(),
        Rgb::new(90, 90, 90),
        FontStyle::Regular,
    );

    let panel = PageRect::new(
        margin,
        margin + 15.0,
        PAGE_WIDTH_MM - 2.0 * margin,
        PANEL_HEIGHT_MM,
    );
    page.rect(panel, None, Some(BORDER));
    let left_w = panel.w * LEFT_SHARE;
    page.line(
        (panel.x + left_w, panel.y),
        (panel.x + left_w, panel.bottom()),
        BORDER,
    );

    render_container_column(&mut page, plan, panel, left_w, screenshot);
    render_totals_column(&mut page, plan, panel, left_w);
    page
}

fn render_container_column(
    page: &mut ReportPage,
    plan: &StuffingPlan,
    panel: PageRect,
    left_w: f64,
    screenshot: Option<&Screenshot>,
) {
    let x = panel.x + 15.0;
    let mut y = panel.y + 12.0;
    let container = &plan.container;

    page.text(x, y, 16.0, container.name.clone(), Rgb::BLACK, FontStyle::Bold);
    y += 6.0;
    let dims = container.dims;
    page.text(
        x,
        y,
        10.0,
        format!("{} x {} x {} mm", dims.x, dims.y, dims.z),
        Rgb::BLACK,
        FontStyle::Regular,
    );
    y += 9.0;

    match screenshot.filter(|shot| shot.aspect_ratio.is_finite() && shot.aspect_ratio > 0.0) {
        Some(shot) => {
            // leave room for the unit line below the image
            let max_h = panel.bottom() - y - 14.0;
            let mut img_w = left_w - 30.0;
            let mut img_h = img_w / shot.aspect_ratio;
            if img_h > max_h {
                img_h = max_h.max(0.0);
                img_w = img_h * shot.aspect_ratio;
            }
            page.ops.push(DrawOp::Image {
                rect: PageRect::new(x, y, img_w, img_h),
                png: shot.png.clone(),
            });
            y += img_h + 8.0;
        }
        None => y += 50.0,
    }

    page.text(x, y, 12.0, "1 unit", Rgb::BLACK, FontStyle::Regular);
}

fn render_totals_column(page: &mut ReportPage, plan: &StuffingPlan, panel: PageRect, left_w: f64) {
    let x = panel.x + left_w + 20.0;
    let right_edge = panel.right() - 20.0;
    let mut y = panel.y + 12.0;

    let packages = plan.resolved_placements().count();
    let mut stats = vec![
        ("Total:", format!("{} packages", packages)),
        ("Cargo volume:", format!("{:.2} m3", plan.cargo_volume_m3())),
        ("Cargo weight:", format!("{:.2} kg", plan.cargo_weight_kg())),
        (
            "Max payload:",
            format!("{:.2} kg", plan.container.max_weight_kg),
        ),
    ];
    if let Some(code) = &plan.plan_code {
        stats.push(("Plan:", code.clone()));
    }
    for (label, value) in stats {
        page.text(x, y, 11.0, label, Rgb::BLACK, FontStyle::Bold);
        page.text(x + VALUE_OFFSET_MM, y, 11.0, value, Rgb::BLACK, FontStyle::Regular);
        y += 8.0;
    }
    y += 4.0;

    let table_w = right_edge - x;
    let column = |i: usize| x + table_w * COLUMNS[i];

    page.line((x, y), (right_edge, y), RULE);
    y += 6.0;
    for (i, header) in ["Name", "Packages", "Volume", "Weight"].into_iter().enumerate() {
        page.text(column(i), y, 10.0, header, Rgb::BLACK, FontStyle::Bold);
    }
    y += 1.0;
    page.line((x, y), (right_edge, y), RULE);
    y += 6.0;

    for row in plan.item_totals() {
        page.text(column(0), y, 9.0, row.item.label.clone(), Rgb::BLACK, FontStyle::Regular);
        page.text(
            column(1) + 5.0,
            y,
            9.0,
            row.packages.to_string(),
            Rgb::BLACK,
            FontStyle::Regular,
        );
        page.text(
            column(2),
            y,
            9.0,
            format!("{:.1} m3", row.volume_m3),
            Rgb::BLACK,
            FontStyle::Regular,
        );
        page.text(
            column(3),
            y,
            9.0,
            format!("{:.1} kg", row.weight_kg),
            Rgb::BLACK,
            FontStyle::Regular,
        );
        y += 6.0;
    }
}
