use crate::model::{
    ArrowHead, AxisLines, AxisParams, Element, ElementKind, GridMode, LineStyle, PlotParams,
    PlotType, Point, ShapeGeometry, ShapeParams, SourceType, Style, DEFAULT_DOMAIN_END,
    DEFAULT_DOMAIN_START, DEFAULT_LINE_WIDTH, DEFAULT_OPACITY, DEFAULT_SAMPLES, parse_color,
};

/// Bound used in `restrict y to domain` when only one side is set.
const RESTRICT_FALLBACK: f64 = 1000.0;

/// Compiles the scene into one `tikzpicture`: every axis with its plots first, then the
/// free shapes, each in collection order. Always a full recompute.
pub fn generate(elements: &[Element]) -> String {
    let mut out = String::new();
    out.push_str("\\begin{tikzpicture}\n");

    for element in elements {
        match &element.kind {
            ElementKind::Axis(axis) => {
                write_axis_header(&mut out, axis);
                for child in elements.iter().filter(|e| e.parent_id == Some(element.id)) {
                    match &child.kind {
                        ElementKind::Plot(plot) => write_plot(&mut out, plot, &child.style),
                        ElementKind::Shape(_) | ElementKind::Axis(_) => {}
                    }
                }
                out.push_str("  \\end{axis}\n");
            }
            ElementKind::Shape(_) | ElementKind::Plot(_) => {}
        }
    }

    for element in elements.iter().filter(|e| e.parent_id.is_none()) {
        match &element.kind {
            ElementKind::Shape(shape) => write_shape(&mut out, shape, &element.style),
            ElementKind::Axis(_) | ElementKind::Plot(_) => {}
        }
    }

    out.push_str("\\end{tikzpicture}\n");
    out
}

fn num(v: f64) -> String {
    if v == 0.0 {
        // Avoids "-0".
        return "0".to_string();
    }
    format!("{}", v)
}

fn differs(a: f64, b: f64) -> bool {
    (a - b).abs() > 1e-9
}

fn bracket(opts: &[String]) -> String {
    if opts.is_empty() {
        String::new()
    } else {
        format!("[{}]", opts.join(", "))
    }
}

/// Hex colors become an inline xcolor `rgb,255` expression; anything else passes through.
fn color_value(color: &str) -> String {
    let color = color.trim();
    match (color.starts_with('#'), parse_color(color)) {
        (true, Some(c)) => format!("{{rgb,255:red,{};green,{};blue,{}}}", c.r, c.g, c.b),
        _ => color.to_string(),
    }
}

fn line_style_token(style: LineStyle) -> Option<&'static str> {
    match style {
        LineStyle::Solid => None,
        LineStyle::Dashed => Some("dashed"),
        LineStyle::Dotted => Some("dotted"),
    }
}

fn arrow_token(arrow: ArrowHead) -> Option<&'static str> {
    match arrow {
        ArrowHead::None => None,
        ArrowHead::End => Some("->"),
        ArrowHead::Start => Some("<-"),
        ArrowHead::Both => Some("<->"),
    }
}

/// Only values that differ from the style defaults produce a token.
pub fn style_options(style: &Style) -> Vec<String> {
    let mut opts = Vec::new();
    if !style.has_default_color() {
        opts.push(format!("color={}", color_value(&style.color)));
    }
    if !style.fill.trim().is_empty() {
        opts.push(format!("fill={}", color_value(&style.fill)));
    }
    if differs(style.line_width, DEFAULT_LINE_WIDTH) {
        opts.push(format!("line width={}mm", num(style.line_width)));
    }
    if differs(style.opacity, DEFAULT_OPACITY) {
        opts.push(format!("opacity={}", num(style.opacity / 100.0)));
    }
    if let Some(t) = line_style_token(style.line_style) {
        opts.push(t.to_string());
    }
    if let Some(t) = arrow_token(style.arrow_head) {
        opts.push(t.to_string());
    }
    opts
}

fn write_shape(out: &mut String, shape: &ShapeParams, style: &Style) {
    let opts = bracket(&style_options(style));
    let at = format!("({},{})", num(shape.x), num(shape.y));
    let path = match shape.geometry {
        ShapeGeometry::Circle { radius } => format!("circle ({})", num(radius)),
        ShapeGeometry::Rectangle { width, height } => {
            format!("rectangle ++({},{})", num(width), num(height))
        }
        ShapeGeometry::Line { width, height } => format!("-- ++({},{})", num(width), num(height)),
        ShapeGeometry::Grid { width, height } => {
            format!("grid ++({},{})", num(width), num(height))
        }
        ShapeGeometry::Ellipse { radius_x, radius_y } => {
            format!("ellipse ({} and {})", num(radius_x), num(radius_y))
        }
        ShapeGeometry::Arc {
            radius,
            angle_start,
            angle_end,
        } => format!(
            "arc ({}:{}:{})",
            num(angle_start),
            num(angle_end),
            num(radius)
        ),
    };
    out.push_str(&format!("  \\draw{} {} {};\n", opts, at, path));
}

fn grid_value(grid: GridMode) -> &'static str {
    match grid {
        GridMode::None => "none",
        GridMode::Major => "major",
        GridMode::Minor => "minor",
        GridMode::Both => "both",
    }
}

fn axis_lines_value(lines: AxisLines) -> &'static str {
    match lines {
        AxisLines::Box => "box",
        AxisLines::Left => "left",
        AxisLines::Middle => "middle",
        AxisLines::Center => "center",
    }
}

/// `{-2,0,2}` and `-2,0,2` are both accepted.
fn tick_list(raw: &str) -> Option<String> {
    let t = raw.trim();
    let t = t
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(t)
        .trim();
    (!t.is_empty()).then(|| format!("{{{}}}", t))
}

fn write_axis_header(out: &mut String, axis: &AxisParams) {
    let mut keys = vec![
        format!("axis lines={}", axis_lines_value(axis.axis_lines)),
        format!("xlabel={{{}}}", axis.xlabel),
        format!("ylabel={{{}}}", axis.ylabel),
        format!("grid={}", grid_value(axis.grid)),
        format!("xmin={}, xmax={}", num(axis.xmin), num(axis.xmax)),
        format!("ymin={}, ymax={}", num(axis.ymin), num(axis.ymax)),
    ];
    if !axis.title.trim().is_empty() {
        keys.push(format!("title={{{}}}", axis.title));
    }
    if let Some(ticks) = tick_list(&axis.xtick) {
        keys.push(format!("xtick={}", ticks));
    }
    if let Some(ticks) = tick_list(&axis.ytick) {
        keys.push(format!("ytick={}", ticks));
    }
    if axis.legend {
        keys.push(format!("legend pos={}", axis.legend_pos.label()));
    }

    out.push_str("  \\begin{axis}[\n");
    for (i, key) in keys.iter().enumerate() {
        out.push_str("    ");
        out.push_str(key);
        if i + 1 < keys.len() {
            out.push(',');
        }
        out.push('\n');
    }
    out.push_str("  ]\n");
}

pub fn plot_options(plot: &PlotParams, style: &Style) -> Vec<String> {
    let mut opts = Vec::new();
    if plot.plot_type != PlotType::Sharp {
        opts.push(plot.plot_type.label().to_string());
    }
    opts.extend(style_options(style));
    if plot.samples != DEFAULT_SAMPLES {
        opts.push(format!("samples={}", plot.samples));
    }
    let domain_changed = differs(plot.domain_start, DEFAULT_DOMAIN_START)
        || differs(plot.domain_end, DEFAULT_DOMAIN_END);
    if domain_changed {
        opts.push(format!(
            "domain={}:{}",
            num(plot.domain_start),
            num(plot.domain_end)
        ));
    }
    if plot.range_start.is_some() || plot.range_end.is_some() {
        opts.push(format!(
            "restrict y to domain={}:{}",
            num(plot.range_start.unwrap_or(-RESTRICT_FALLBACK)),
            num(plot.range_end.unwrap_or(RESTRICT_FALLBACK))
        ));
    }
    opts
}

fn write_plot(out: &mut String, plot: &PlotParams, style: &Style) {
    let opts = bracket(&plot_options(plot, style));
    match plot.source_type {
        SourceType::Expression => {
            out.push_str(&format!(
                "    \\addplot{} {{{}}};\n",
                opts,
                plot.expression.trim()
            ));
        }
        SourceType::Data => {
            let coords = coordinate_rows(&plot.data_points)
                .iter()
                .map(|(x, y)| format!("({},{})", x, y))
                .collect::<Vec<_>>()
                .join(" ");
            out.push_str(&format!("    \\addplot{} coordinates {{{}}};\n", opts, coords));
        }
    }
    if let Some(entry) = plot.legend() {
        out.push_str(&format!("    \\addlegendentry{{{}}}\n", entry));
    }
}

fn is_numeric(token: &str) -> bool {
    token.parse::<f64>().is_ok_and(f64::is_finite)
}

/// The first two numeric tokens of every line that has at least two, as written.
/// Other lines are dropped.
pub fn coordinate_rows(text: &str) -> Vec<(&str, &str)> {
    let mut rows = Vec::new();
    for line in text.lines() {
        let mut numeric = line.split_whitespace().filter(|t| is_numeric(t));
        match (numeric.next(), numeric.next()) {
            (Some(x), Some(y)) => rows.push((x, y)),
            _ => {
                if !line.trim().is_empty() {
                    tracing::debug!(line, "dropping malformed coordinate line");
                }
            }
        }
    }
    rows
}

/// Numeric form of [`coordinate_rows`], for previews.
pub fn data_points(text: &str) -> Vec<Point> {
    coordinate_rows(text)
        .into_iter()
        .filter_map(|(x, y)| Some(Point::new(x.parse().ok()?, y.parse().ok()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ElementId, LegendPos, ShapeType};

    fn shape(id: u64, geometry: ShapeGeometry, style: Style) -> Element {
        Element {
            id: ElementId(id),
            parent_id: None,
            name: String::new(),
            kind: ElementKind::Shape(ShapeParams {
                x: 0.0,
                y: 0.0,
                geometry,
            }),
            style,
        }
    }

    fn axis(id: u64, params: AxisParams) -> Element {
        Element {
            id: ElementId(id),
            parent_id: None,
            name: String::new(),
            kind: ElementKind::Axis(params),
            style: Style::default(),
        }
    }

    fn plot(id: u64, parent: u64, params: PlotParams) -> Element {
        Element {
            id: ElementId(id),
            parent_id: Some(ElementId(parent)),
            name: String::new(),
            kind: ElementKind::Plot(params),
            style: Style::default(),
        }
    }

    #[test]
    fn empty_scene_is_just_the_picture() {
        assert_eq!(generate(&[]), "\\begin{tikzpicture}\n\\end{tikzpicture}\n");
    }

    #[test]
    fn every_shape_type_has_its_path() {
        let cases = [
            (ShapeType::Circle, "\\draw (0,0) circle (1);"),
            (ShapeType::Rectangle, "\\draw (0,0) rectangle ++(2,1);"),
            (ShapeType::Line, "\\draw (0,0) -- ++(2,1);"),
            (ShapeType::Grid, "\\draw (0,0) grid ++(4,4);"),
            (ShapeType::Ellipse, "\\draw (0,0) ellipse (2 and 1);"),
            (ShapeType::Arc, "\\draw (0,0) arc (0:90:1);"),
        ];
        for (t, expected) in cases {
            let out = generate(&[shape(1, ShapeGeometry::default_for(t), Style::default())]);
            assert!(out.contains(expected), "{t}: {out}");
        }
    }

    #[test]
    fn default_style_emits_no_options() {
        assert!(style_options(&Style::default()).is_empty());
    }

    #[test]
    fn non_default_style_emits_each_token() {
        let style = Style {
            color: "#ff0000".to_string(),
            fill: "blue".to_string(),
            line_width: 1.2,
            opacity: 50.0,
            line_style: LineStyle::Dashed,
            arrow_head: ArrowHead::Both,
        };
        assert_eq!(
            style_options(&style),
            vec![
                "color={rgb,255:red,255;green,0;blue,0}",
                "fill=blue",
                "line width=1.2mm",
                "opacity=0.5",
                "dashed",
                "<->",
            ]
        );
    }

    #[test]
    fn black_by_name_is_still_default() {
        let style = Style {
            color: "Black".to_string(),
            ..Default::default()
        };
        assert!(style_options(&style).is_empty());
    }

    #[test]
    fn axis_header_is_sparse_for_optional_keys() {
        let out = generate(&[axis(1, AxisParams::default())]);
        assert!(out.contains("axis lines=middle"));
        assert!(out.contains("xlabel={$x$}"));
        assert!(out.contains("grid=major"));
        assert!(out.contains("xmin=-10, xmax=10"));
        assert!(!out.contains("title="));
        assert!(!out.contains("xtick="));
        assert!(!out.contains("legend pos="));

        let out = generate(&[axis(
            1,
            AxisParams {
                title: "Growth".to_string(),
                xtick: "{-1,0,1}".to_string(),
                ytick: "0,5".to_string(),
                legend: true,
                legend_pos: LegendPos::SouthEast,
                ..Default::default()
            },
        )]);
        assert!(out.contains("title={Growth}"));
        assert!(out.contains("xtick={-1,0,1}"));
        assert!(out.contains("ytick={0,5}"));
        assert!(out.contains("legend pos=south east\n"));
    }

    #[test]
    fn plot_options_follow_their_defaults() {
        let p = PlotParams::default();
        assert!(plot_options(&p, &Style::default()).is_empty());

        let p = PlotParams {
            plot_type: PlotType::OnlyMarks,
            samples: 10,
            domain_start: -5.0,
            domain_end: 5.0,
            range_end: Some(3.0),
            ..Default::default()
        };
        assert_eq!(
            plot_options(&p, &Style::default()),
            vec![
                "only marks",
                "samples=10",
                "domain=-5:5",
                "restrict y to domain=-1000:3"
            ]
        );
    }

    #[test]
    fn restricted_range_fills_the_missing_bound() {
        let lower_only = PlotParams {
            range_start: Some(-2.0),
            ..Default::default()
        };
        assert_eq!(
            plot_options(&lower_only, &Style::default()),
            vec!["restrict y to domain=-2:1000"]
        );
        let both = PlotParams {
            range_start: Some(-2.5),
            range_end: Some(4.0),
            ..Default::default()
        };
        assert_eq!(
            plot_options(&both, &Style::default()),
            vec!["restrict y to domain=-2.5:4"]
        );
    }

    #[test]
    fn plots_nest_under_their_axis_in_order() {
        let elements = [
            axis(1, AxisParams::default()),
            shape(2, ShapeGeometry::default(), Style::default()),
            axis(3, AxisParams::default()),
            plot(
                4,
                3,
                PlotParams {
                    expression: "x".to_string(),
                    ..Default::default()
                },
            ),
            plot(
                5,
                1,
                PlotParams {
                    expression: "x^3".to_string(),
                    legend_entry: Some("cubic".to_string()),
                    ..Default::default()
                },
            ),
        ];
        let out = generate(&elements);
        let axis_header = concat!(
            "  \\begin{axis}[\n",
            "    axis lines=middle,\n",
            "    xlabel={$x$},\n",
            "    ylabel={$y$},\n",
            "    grid=major,\n",
            "    xmin=-10, xmax=10,\n",
            "    ymin=-10, ymax=10\n",
            "  ]\n",
        );
        let expected = [
            "\\begin{tikzpicture}\n",
            axis_header,
            "    \\addplot {x^3};\n",
            "    \\addlegendentry{cubic}\n",
            "  \\end{axis}\n",
            axis_header,
            "    \\addplot {x};\n",
            "  \\end{axis}\n",
            "  \\draw (0,0) circle (1);\n",
            "\\end{tikzpicture}\n",
        ]
        .concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn coordinate_rows_drop_malformed_lines() {
        let rows = coordinate_rows("0 0\n1 1\nbad\n2 4\n3\n  5   6  7\nnan 1\n");
        assert_eq!(rows, vec![("0", "0"), ("1", "1"), ("2", "4"), ("5", "6")]);
    }

    #[test]
    fn data_plot_emits_coordinates() {
        let elements = [
            axis(1, AxisParams::default()),
            plot(
                2,
                1,
                PlotParams {
                    source_type: SourceType::Data,
                    data_points: "0 0\n1.5 -2".to_string(),
                    ..Default::default()
                },
            ),
        ];
        assert!(generate(&elements).contains("\\addplot coordinates {(0,0) (1.5,-2)};"));
    }

    #[test]
    fn data_points_are_numeric() {
        assert_eq!(
            data_points("1 2\nx\n-1 0.5"),
            vec![Point::new(1.0, 2.0), Point::new(-1.0, 0.5)]
        );
    }

    #[test]
    fn negative_zero_prints_as_zero() {
        assert_eq!(num(-0.0), "0");
        assert_eq!(num(-2.5), "-2.5");
    }
}
