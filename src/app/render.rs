use eframe::egui;
use tikzsketch::model::{
    ArrowHead, AxisLines, AxisParams, Element, ElementKind, GridMode, LegendPos, LineStyle,
    PlotParams, PlotType, Point, ShapeGeometry, ShapeParams, SourceType, Style, parse_color,
};
use tikzsketch::sampler::{self, SampleDomain};
use tikzsketch::{SceneStore, ViewportTransform, tikz};

/// Maps scene coordinates onto the preview rect: one scene unit is `unit` pixels at
/// scale 1, y points up and the origin starts at the rect center.
#[derive(Clone, Copy)]
pub(super) struct PreviewFrame {
    pub center: egui::Pos2,
    pub unit: f64,
    pub view: ViewportTransform,
}

impl PreviewFrame {
    pub fn to_screen(&self, p: Point) -> egui::Pos2 {
        let d = self
            .view
            .data_to_display(Point::new(p.x * self.unit, -p.y * self.unit));
        egui::pos2(self.center.x + d.x as f32, self.center.y + d.y as f32)
    }

    /// Screen position in the viewport's display space.
    pub fn display_point(&self, pos: egui::Pos2) -> Point {
        Point::new(f64::from(pos.x - self.center.x), f64::from(pos.y - self.center.y))
    }

    fn px(&self, len: f64) -> f32 {
        (len * self.unit * self.view.scale) as f32
    }
}

/// Most grid or tick lines drawn along one direction.
const MAX_LINES: usize = 1000;

fn color32(name: &str, opacity: f64) -> Option<egui::Color32> {
    let c = parse_color(name)?;
    let alpha = (opacity.clamp(0.0, 100.0) / 100.0 * 255.0).round() as u8;
    Some(egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, alpha))
}

fn stroke_for(frame: &PreviewFrame, style: &Style) -> egui::Stroke {
    let color = color32(&style.color, style.opacity).unwrap_or(egui::Color32::BLACK);
    // Widths are millimetres and a scene unit is a centimetre.
    let width = frame.px(style.line_width / 10.0).max(1.0);
    egui::Stroke::new(width, color)
}

fn fill_for(style: &Style) -> Option<egui::Color32> {
    color32(&style.fill, style.opacity)
}

fn highlight(painter: &egui::Painter, points: &[egui::Pos2], closed: bool, stroke: egui::Stroke) {
    let color = painter.ctx().style().visuals.selection.bg_fill.gamma_multiply(0.6);
    let glow = egui::Stroke::new(stroke.width + 5.0, color);
    if closed {
        painter.add(egui::Shape::closed_line(points.to_vec(), glow));
    } else {
        painter.add(egui::Shape::line(points.to_vec(), glow));
    }
}

pub(super) fn draw_background(
    painter: &egui::Painter,
    rect: egui::Rect,
    frame: &PreviewFrame,
    show_grid: bool,
) {
    painter.rect_filled(rect, 0.0, egui::Color32::WHITE);
    if !show_grid {
        return;
    }
    let spacing = frame.px(1.0);
    if spacing < 8.0 {
        return;
    }
    let grid_color = egui::Color32::from_gray(225);
    let origin = frame.to_screen(Point::default());
    let x0 = origin.x - ((origin.x - rect.min.x) / spacing).floor() * spacing;
    for i in 0..MAX_LINES {
        let x = x0 + i as f32 * spacing;
        if x >= rect.max.x {
            break;
        }
        painter.line_segment(
            [egui::pos2(x, rect.min.y), egui::pos2(x, rect.max.y)],
            egui::Stroke::new(1.0, grid_color),
        );
    }
    let y0 = origin.y - ((origin.y - rect.min.y) / spacing).floor() * spacing;
    for i in 0..MAX_LINES {
        let y = y0 + i as f32 * spacing;
        if y >= rect.max.y {
            break;
        }
        painter.line_segment(
            [egui::pos2(rect.min.x, y), egui::pos2(rect.max.x, y)],
            egui::Stroke::new(1.0, grid_color),
        );
    }
}

/// Draws the scene the way the markup lays it out: axes with their plots, then shapes.
pub(super) fn draw_scene(painter: &egui::Painter, frame: &PreviewFrame, store: &SceneStore) {
    let selected = store.selected();
    for element in store.elements() {
        if let ElementKind::Axis(axis) = &element.kind {
            let plots: Vec<&Element> = store.children(element.id).collect();
            draw_axis(painter, frame, element, axis, &plots, selected);
        }
    }
    for element in store.elements() {
        if let ElementKind::Shape(shape) = &element.kind {
            if element.parent_id.is_none() {
                draw_shape(painter, frame, shape, &element.style, selected == Some(element.id));
            }
        }
    }
}

fn ellipse_points(
    frame: &PreviewFrame,
    center: Point,
    rx: f64,
    ry: f64,
    from_deg: f64,
    to_deg: f64,
) -> Vec<egui::Pos2> {
    let segments = 64;
    (0..=segments)
        .map(|i| {
            let frac = f64::from(i) / f64::from(segments);
            let t = (from_deg + (to_deg - from_deg) * frac).to_radians();
            frame.to_screen(Point::new(center.x + rx * t.cos(), center.y + ry * t.sin()))
        })
        .collect()
}

fn draw_shape(
    painter: &egui::Painter,
    frame: &PreviewFrame,
    shape: &ShapeParams,
    style: &Style,
    selected: bool,
) {
    let stroke = stroke_for(frame, style);
    let fill = fill_for(style);
    let origin = Point::new(shape.x, shape.y);
    match shape.geometry {
        ShapeGeometry::Circle { radius } => {
            let points = ellipse_points(frame, origin, radius, radius, 0.0, 360.0);
            draw_closed(painter, points, fill, stroke, style.line_style, selected);
        }
        ShapeGeometry::Ellipse { radius_x, radius_y } => {
            let points = ellipse_points(frame, origin, radius_x, radius_y, 0.0, 360.0);
            draw_closed(painter, points, fill, stroke, style.line_style, selected);
        }
        ShapeGeometry::Rectangle { width, height } => {
            let points = [
                origin,
                Point::new(origin.x + width, origin.y),
                Point::new(origin.x + width, origin.y + height),
                Point::new(origin.x, origin.y + height),
            ]
            .into_iter()
            .map(|p| frame.to_screen(p))
            .collect();
            draw_closed(painter, points, fill, stroke, style.line_style, selected);
        }
        ShapeGeometry::Line { width, height } => {
            let a = frame.to_screen(origin);
            let b = frame.to_screen(Point::new(origin.x + width, origin.y + height));
            if selected {
                highlight(painter, &[a, b], false, stroke);
            }
            draw_styled_polyline(painter, &[a, b], stroke, style.line_style);
            draw_arrows(painter, &[a, b], stroke, style.arrow_head);
        }
        ShapeGeometry::Arc {
            radius,
            angle_start,
            angle_end,
        } => {
            // The arc starts at the shape position, so the center sits one radius back.
            let t = angle_start.to_radians();
            let center = Point::new(origin.x - radius * t.cos(), origin.y - radius * t.sin());
            let points = ellipse_points(frame, center, radius, radius, angle_start, angle_end);
            if selected {
                highlight(painter, &points, false, stroke);
            }
            draw_styled_polyline(painter, &points, stroke, style.line_style);
            draw_arrows(painter, &points, stroke, style.arrow_head);
        }
        ShapeGeometry::Grid { width, height } => {
            let (x0, x1) = (origin.x.min(origin.x + width), origin.x.max(origin.x + width));
            let (y0, y1) = (origin.y.min(origin.y + height), origin.y.max(origin.y + height));
            for x in steps(x0, x1, 1.0) {
                let line = [
                    frame.to_screen(Point::new(x, y0)),
                    frame.to_screen(Point::new(x, y1)),
                ];
                draw_styled_polyline(painter, &line, stroke, style.line_style);
            }
            for y in steps(y0, y1, 1.0) {
                let line = [
                    frame.to_screen(Point::new(x0, y)),
                    frame.to_screen(Point::new(x1, y)),
                ];
                draw_styled_polyline(painter, &line, stroke, style.line_style);
            }
            if selected {
                let bounds = [
                    frame.to_screen(Point::new(x0, y0)),
                    frame.to_screen(Point::new(x1, y0)),
                    frame.to_screen(Point::new(x1, y1)),
                    frame.to_screen(Point::new(x0, y1)),
                ];
                highlight(painter, &bounds, true, stroke);
            }
        }
    }
}

fn draw_closed(
    painter: &egui::Painter,
    points: Vec<egui::Pos2>,
    fill: Option<egui::Color32>,
    stroke: egui::Stroke,
    line_style: LineStyle,
    selected: bool,
) {
    if selected {
        highlight(painter, &points, true, stroke);
    }
    if let Some(fill) = fill {
        painter.add(egui::Shape::convex_polygon(
            points.clone(),
            fill,
            egui::Stroke::NONE,
        ));
    }
    let mut ring = points;
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    draw_styled_polyline(painter, &ring, stroke, line_style);
}

/// Rounds `span / 8` up to 1, 2 or 5 times a power of ten.
fn tick_step(span: f64) -> f64 {
    let raw = (span / 8.0).abs().max(1e-9);
    let magnitude = 10f64.powf(raw.log10().floor());
    let norm = raw / magnitude;
    let nice = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Multiples of `step` within `[min, max]`, at most [`MAX_LINES`] of them.
fn steps(min: f64, max: f64, step: f64) -> Vec<f64> {
    let first = (min / step).ceil();
    let count = (max / step + 1e-6).floor() - first;
    if count.is_nan() || count < 0.0 || !first.is_finite() {
        return Vec::new();
    }
    let count = (count as usize).min(MAX_LINES - 1);
    (0..=count).map(|i| (first + i as f64) * step).collect()
}

fn ticks(min: f64, max: f64) -> Vec<f64> {
    steps(min, max, tick_step(max - min))
}

fn draw_axis(
    painter: &egui::Painter,
    frame: &PreviewFrame,
    element: &Element,
    axis: &AxisParams,
    plots: &[&Element],
    selected: Option<tikzsketch::ElementId>,
) {
    let (xmin, xmax) = (axis.xmin.min(axis.xmax), axis.xmin.max(axis.xmax));
    let (ymin, ymax) = (axis.ymin.min(axis.ymax), axis.ymin.max(axis.ymax));
    let box_rect = egui::Rect::from_two_pos(
        frame.to_screen(Point::new(xmin, ymin)),
        frame.to_screen(Point::new(xmax, ymax)),
    );
    let text_color = egui::Color32::from_gray(40);
    let grid_color = egui::Color32::from_gray(210);
    let axis_stroke = egui::Stroke::new(1.2, egui::Color32::from_gray(30));

    if axis.grid != GridMode::None {
        for x in ticks(xmin, xmax) {
            painter.line_segment(
                [frame.to_screen(Point::new(x, ymin)), frame.to_screen(Point::new(x, ymax))],
                egui::Stroke::new(1.0, grid_color),
            );
        }
        for y in ticks(ymin, ymax) {
            painter.line_segment(
                [frame.to_screen(Point::new(xmin, y)), frame.to_screen(Point::new(xmax, y))],
                egui::Stroke::new(1.0, grid_color),
            );
        }
    }

    let corners = |a: Point, b: Point| [frame.to_screen(a), frame.to_screen(b)];
    match axis.axis_lines {
        AxisLines::Box => {
            painter.add(egui::Shape::closed_line(
                vec![
                    box_rect.left_top(),
                    box_rect.right_top(),
                    box_rect.right_bottom(),
                    box_rect.left_bottom(),
                ],
                axis_stroke,
            ));
        }
        AxisLines::Left => {
            let corner = Point::new(xmin, ymin);
            painter.line_segment(corners(corner, Point::new(xmax, ymin)), axis_stroke);
            painter.line_segment(corners(corner, Point::new(xmin, ymax)), axis_stroke);
        }
        AxisLines::Middle | AxisLines::Center => {
            let x0 = 0f64.clamp(xmin, xmax);
            let y0 = 0f64.clamp(ymin, ymax);
            let h = corners(Point::new(xmin, y0), Point::new(xmax, y0));
            let v = corners(Point::new(x0, ymin), Point::new(x0, ymax));
            painter.line_segment(h, axis_stroke);
            painter.line_segment(v, axis_stroke);
            draw_arrowhead(painter, h[0], h[1], axis_stroke);
            draw_arrowhead(painter, v[0], v[1], axis_stroke);
        }
    }

    let font = egui::FontId::proportional(13.0);
    painter.text(
        box_rect.right_center() + egui::vec2(6.0, 0.0),
        egui::Align2::LEFT_CENTER,
        plain_label(&axis.xlabel),
        font.clone(),
        text_color,
    );
    painter.text(
        box_rect.center_top() - egui::vec2(0.0, 6.0),
        egui::Align2::CENTER_BOTTOM,
        plain_label(&axis.ylabel),
        font.clone(),
        text_color,
    );
    if !axis.title.trim().is_empty() {
        painter.text(
            box_rect.center_top() - egui::vec2(0.0, 24.0),
            egui::Align2::CENTER_BOTTOM,
            plain_label(&axis.title),
            egui::FontId::proportional(15.0),
            text_color,
        );
    }
    if selected == Some(element.id) {
        let outline = vec![
            box_rect.left_top(),
            box_rect.right_top(),
            box_rect.right_bottom(),
            box_rect.left_bottom(),
        ];
        highlight(painter, &outline, true, axis_stroke);
    }

    let clipped = painter.with_clip_rect(box_rect.intersect(painter.clip_rect()));
    for plot in plots {
        if let ElementKind::Plot(params) = &plot.kind {
            draw_plot(&clipped, frame, params, &plot.style, selected == Some(plot.id));
        }
    }
    if axis.legend {
        draw_legend(painter, box_rect, axis.legend_pos, plots, frame);
    }
}

/// Drops math-mode dollars and braces for on-screen labels.
fn plain_label(label: &str) -> String {
    label.chars().filter(|c| !matches!(c, '$' | '{' | '}')).collect()
}

fn plot_runs(plot: &PlotParams) -> Vec<Vec<Point>> {
    match plot.source_type {
        SourceType::Expression => {
            sampler::sample_preview_runs(&plot.expression, SampleDomain::of_plot(plot))
        }
        SourceType::Data => {
            let points = tikz::data_points(&plot.data_points);
            if points.is_empty() { Vec::new() } else { vec![points] }
        }
    }
}

fn draw_plot(
    painter: &egui::Painter,
    frame: &PreviewFrame,
    plot: &PlotParams,
    style: &Style,
    selected: bool,
) {
    let stroke = stroke_for(frame, style);
    let lo = plot.range_start.unwrap_or(f64::NEG_INFINITY);
    let hi = plot.range_end.unwrap_or(f64::INFINITY);
    for run in plot_runs(plot) {
        let run: Vec<Point> = run.into_iter().filter(|p| p.y >= lo && p.y <= hi).collect();
        match plot.plot_type {
            PlotType::OnlyMarks => {
                for p in &run {
                    painter.circle_filled(frame.to_screen(*p), stroke.width + 2.0, stroke.color);
                }
            }
            PlotType::Ybar => {
                let half = run
                    .windows(2)
                    .map(|w| (w[1].x - w[0].x).abs())
                    .fold(f64::INFINITY, f64::min);
                let half = if half.is_finite() { half * 0.4 } else { 0.4 };
                let fill = fill_for(style).unwrap_or(stroke.color.gamma_multiply(0.5));
                for p in &run {
                    let bar = egui::Rect::from_two_pos(
                        frame.to_screen(Point::new(p.x - half, 0.0)),
                        frame.to_screen(Point::new(p.x + half, p.y)),
                    );
                    painter.rect_filled(bar, 0.0, fill);
                }
            }
            PlotType::ConstPlot => {
                let mut steps = Vec::with_capacity(run.len() * 2);
                for w in run.windows(2) {
                    steps.push(frame.to_screen(w[0]));
                    steps.push(frame.to_screen(Point::new(w[1].x, w[0].y)));
                }
                if let Some(last) = run.last() {
                    steps.push(frame.to_screen(*last));
                }
                if selected {
                    highlight(painter, &steps, false, stroke);
                }
                draw_styled_polyline(painter, &steps, stroke, style.line_style);
            }
            PlotType::Sharp | PlotType::Smooth => {
                let points: Vec<egui::Pos2> = run.iter().map(|p| frame.to_screen(*p)).collect();
                if selected {
                    highlight(painter, &points, false, stroke);
                }
                draw_styled_polyline(painter, &points, stroke, style.line_style);
            }
        }
    }
}

fn draw_legend(
    painter: &egui::Painter,
    box_rect: egui::Rect,
    pos: LegendPos,
    plots: &[&Element],
    frame: &PreviewFrame,
) {
    let entries: Vec<(String, egui::Stroke)> = plots
        .iter()
        .filter_map(|e| match &e.kind {
            ElementKind::Plot(p) => p
                .legend()
                .map(|l| (plain_label(l), stroke_for(frame, &e.style))),
            _ => None,
        })
        .collect();
    if entries.is_empty() {
        return;
    }
    let row = 16.0;
    let size = egui::vec2(110.0, row * entries.len() as f32 + 6.0);
    let margin = 6.0;
    let min = match pos {
        LegendPos::NorthWest => box_rect.left_top() + egui::vec2(margin, margin),
        LegendPos::NorthEast => box_rect.right_top() + egui::vec2(-margin - size.x, margin),
        LegendPos::SouthWest => box_rect.left_bottom() + egui::vec2(margin, -margin - size.y),
        LegendPos::SouthEast => box_rect.right_bottom() - size - egui::vec2(margin, margin),
        LegendPos::OuterNorthEast => box_rect.right_top() + egui::vec2(margin, 0.0),
    };
    let legend_rect = egui::Rect::from_min_size(min, size);
    painter.rect_filled(legend_rect, 2.0, egui::Color32::from_white_alpha(230));
    for (i, (label, stroke)) in entries.into_iter().enumerate() {
        let y = legend_rect.min.y + 3.0 + row * (i as f32 + 0.5);
        let x = legend_rect.min.x + 6.0;
        painter.line_segment([egui::pos2(x, y), egui::pos2(x + 18.0, y)], stroke);
        painter.text(
            egui::pos2(x + 24.0, y),
            egui::Align2::LEFT_CENTER,
            label,
            egui::FontId::proportional(12.0),
            egui::Color32::from_gray(30),
        );
    }
}

fn draw_styled_polyline(
    painter: &egui::Painter,
    points: &[egui::Pos2],
    stroke: egui::Stroke,
    line_style: LineStyle,
) {
    if points.len() < 2 {
        return;
    }
    match line_style {
        LineStyle::Solid => {
            painter.add(egui::Shape::line(points.to_vec(), stroke));
        }
        LineStyle::Dashed | LineStyle::Dotted => {
            let (dash, gap) = if line_style == LineStyle::Dashed {
                (10.0, 5.0)
            } else {
                (2.0, 4.0)
            };
            for pair in points.windows(2) {
                draw_dashed_line(painter, pair[0], pair[1], stroke, dash, gap);
            }
        }
    }
}

fn draw_dashed_line(
    painter: &egui::Painter,
    a: egui::Pos2,
    b: egui::Pos2,
    stroke: egui::Stroke,
    dash_len: f32,
    gap_len: f32,
) {
    let v = b - a;
    let len = v.length();
    if len <= f32::EPSILON {
        return;
    }
    let dir = v / len;
    let mut pos = 0.0;
    let mut drawing = true;
    while pos < len {
        let seg_len = if drawing { dash_len } else { gap_len };
        let next_pos = (pos + seg_len).min(len);
        if drawing {
            painter.line_segment([a + dir * pos, a + dir * next_pos], stroke);
        }
        pos = next_pos;
        drawing = !drawing;
    }
}

fn draw_arrows(
    painter: &egui::Painter,
    points: &[egui::Pos2],
    stroke: egui::Stroke,
    arrow: ArrowHead,
) {
    let n = points.len();
    if n < 2 {
        return;
    }
    if matches!(arrow, ArrowHead::End | ArrowHead::Both) {
        draw_arrowhead(painter, points[n - 2], points[n - 1], stroke);
    }
    if matches!(arrow, ArrowHead::Start | ArrowHead::Both) {
        draw_arrowhead(painter, points[1], points[0], stroke);
    }
}

fn draw_arrowhead(painter: &egui::Painter, a: egui::Pos2, b: egui::Pos2, stroke: egui::Stroke) {
    let v = b - a;
    if v.length_sq() <= f32::EPSILON {
        return;
    }
    let dir = v.normalized();
    let size = 6.0 + stroke.width * 2.0;
    let perp = egui::vec2(-dir.y, dir.x);
    let base = b - dir * size;
    painter.add(egui::Shape::convex_polygon(
        vec![b, base + perp * (size * 0.5), base - perp * (size * 0.5)],
        stroke.color,
        egui::Stroke::NONE,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_flips_y_and_centers_the_origin() {
        let frame = PreviewFrame {
            center: egui::pos2(100.0, 50.0),
            unit: 10.0,
            view: ViewportTransform::default(),
        };
        assert_eq!(frame.to_screen(Point::new(1.0, 2.0)), egui::pos2(110.0, 30.0));
        assert_eq!(frame.display_point(egui::pos2(110.0, 30.0)), Point::new(10.0, -20.0));
    }

    #[test]
    fn tick_steps_are_round() {
        assert_eq!(tick_step(20.0), 5.0);
        assert_eq!(tick_step(8.0), 1.0);
        assert_eq!(ticks(-10.0, 10.0), vec![-10.0, -5.0, 0.0, 5.0, 10.0]);
    }

    #[test]
    fn line_positions_end_at_huge_magnitudes() {
        let far = ticks(1e18, 1e18 + 256.0);
        assert!(!far.is_empty());
        assert!(far.len() <= MAX_LINES);
        assert_eq!(steps(0.0, 1e7, 1.0).len(), MAX_LINES);
        assert_eq!(steps(-1.5, 1.5, 1.0), vec![-1.0, 0.0, 1.0]);
        assert!(steps(2.0, 1.0, 1.0).is_empty());
        assert!(steps(f64::NAN, 1.0, 1.0).is_empty());
    }

    #[test]
    fn labels_lose_math_delimiters() {
        assert_eq!(plain_label("$x^{2}$"), "x^2");
    }
}
