use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_LINE_WIDTH: f64 = 0.8;
pub const DEFAULT_OPACITY: f64 = 100.0;
pub const DEFAULT_SAMPLES: u32 = 100;
pub const DEFAULT_DOMAIN_START: f64 = -10.0;
pub const DEFAULT_DOMAIN_END: f64 = 10.0;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Shape,
    Axis,
    Plot,
}

impl ElementType {
    pub fn label(self) -> &'static str {
        match self {
            ElementType::Shape => "Shape",
            ElementType::Axis => "Axis",
            ElementType::Plot => "Plot",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Base color names understood by the markup target, with their RGB values.
const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("black", Rgba::opaque(0, 0, 0)),
    ("white", Rgba::opaque(255, 255, 255)),
    ("red", Rgba::opaque(255, 0, 0)),
    ("green", Rgba::opaque(0, 255, 0)),
    ("blue", Rgba::opaque(0, 0, 255)),
    ("cyan", Rgba::opaque(0, 255, 255)),
    ("magenta", Rgba::opaque(255, 0, 255)),
    ("yellow", Rgba::opaque(255, 255, 0)),
    ("gray", Rgba::opaque(128, 128, 128)),
    ("darkgray", Rgba::opaque(64, 64, 64)),
    ("lightgray", Rgba::opaque(191, 191, 191)),
    ("orange", Rgba::opaque(255, 128, 0)),
    ("purple", Rgba::opaque(191, 0, 64)),
    ("brown", Rgba::opaque(191, 128, 64)),
    ("lime", Rgba::opaque(191, 255, 0)),
    ("olive", Rgba::opaque(128, 128, 0)),
    ("pink", Rgba::opaque(255, 191, 191)),
    ("teal", Rgba::opaque(0, 128, 128)),
    ("violet", Rgba::opaque(128, 0, 128)),
];

/// Parses `#rrggbb`, `#rgb` or a base color name. Returns `None` for anything else.
pub fn parse_color(s: &str) -> Option<Rgba> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(s))
        .map(|(_, c)| *c)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgba::opaque(r, g, b))
        }
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 16 + v;
            }
            Some(Rgba::opaque(out[0], out[1], out[2]))
        }
        _ => None,
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ArrowHead {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "->")]
    End,
    #[serde(rename = "<-")]
    Start,
    #[serde(rename = "<->")]
    Both,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Style {
    pub color: String,
    pub fill: String,
    /// Stroke width in millimetres.
    pub line_width: f64,
    /// Percentage, 0 to 100.
    pub opacity: f64,
    pub line_style: LineStyle,
    pub arrow_head: ArrowHead,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            fill: String::new(),
            line_width: DEFAULT_LINE_WIDTH,
            opacity: DEFAULT_OPACITY,
            line_style: LineStyle::Solid,
            arrow_head: ArrowHead::None,
        }
    }
}

impl Style {
    /// Black in any spelling, or no color at all.
    pub fn has_default_color(&self) -> bool {
        let c = self.color.trim();
        c.is_empty() || parse_color(c) == parse_color(DEFAULT_COLOR)
    }

    pub fn apply(&mut self, patch: &StylePatch) {
        if let Some(color) = &patch.color {
            self.color = color.clone();
        }
        if let Some(fill) = &patch.fill {
            self.fill = fill.clone();
        }
        if let Some(w) = patch.line_width {
            self.line_width = w;
        }
        if let Some(o) = patch.opacity {
            self.opacity = o.clamp(0.0, 100.0);
        }
        if let Some(s) = patch.line_style {
            self.line_style = s;
        }
        if let Some(a) = patch.arrow_head {
            self.arrow_head = a;
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Circle,
    Rectangle,
    Line,
    Grid,
    Ellipse,
    Arc,
}

impl ShapeType {
    pub const ALL: [ShapeType; 6] = [
        ShapeType::Circle,
        ShapeType::Rectangle,
        ShapeType::Line,
        ShapeType::Grid,
        ShapeType::Ellipse,
        ShapeType::Arc,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ShapeType::Circle => "Circle",
            ShapeType::Rectangle => "Rectangle",
            ShapeType::Line => "Line",
            ShapeType::Grid => "Grid",
            ShapeType::Ellipse => "Ellipse",
            ShapeType::Arc => "Arc",
        }
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "shapeType",
    rename_all = "lowercase",
    rename_all_fields = "camelCase"
)]
pub enum ShapeGeometry {
    Circle { radius: f64 },
    Rectangle { width: f64, height: f64 },
    Line { width: f64, height: f64 },
    Grid { width: f64, height: f64 },
    Ellipse { radius_x: f64, radius_y: f64 },
    Arc { radius: f64, angle_start: f64, angle_end: f64 },
}

impl Default for ShapeGeometry {
    fn default() -> Self {
        Self::default_for(ShapeType::Circle)
    }
}

impl ShapeGeometry {
    pub fn default_for(shape_type: ShapeType) -> Self {
        match shape_type {
            ShapeType::Circle => ShapeGeometry::Circle { radius: 1.0 },
            ShapeType::Rectangle => ShapeGeometry::Rectangle {
                width: 2.0,
                height: 1.0,
            },
            ShapeType::Line => ShapeGeometry::Line {
                width: 2.0,
                height: 1.0,
            },
            ShapeType::Grid => ShapeGeometry::Grid {
                width: 4.0,
                height: 4.0,
            },
            ShapeType::Ellipse => ShapeGeometry::Ellipse {
                radius_x: 2.0,
                radius_y: 1.0,
            },
            ShapeType::Arc => ShapeGeometry::Arc {
                radius: 1.0,
                angle_start: 0.0,
                angle_end: 90.0,
            },
        }
    }

    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeGeometry::Circle { .. } => ShapeType::Circle,
            ShapeGeometry::Rectangle { .. } => ShapeType::Rectangle,
            ShapeGeometry::Line { .. } => ShapeType::Line,
            ShapeGeometry::Grid { .. } => ShapeType::Grid,
            ShapeGeometry::Ellipse { .. } => ShapeType::Ellipse,
            ShapeGeometry::Arc { .. } => ShapeType::Arc,
        }
    }

    fn radius(&self) -> Option<f64> {
        match self {
            ShapeGeometry::Circle { radius } | ShapeGeometry::Arc { radius, .. } => Some(*radius),
            _ => None,
        }
    }

    fn extent(&self) -> Option<(f64, f64)> {
        match self {
            ShapeGeometry::Rectangle { width, height }
            | ShapeGeometry::Line { width, height }
            | ShapeGeometry::Grid { width, height } => Some((*width, *height)),
            _ => None,
        }
    }

    /// Converts to another shape type, keeping the radius or the width/height pair
    /// when both types have one.
    pub fn with_type(self, shape_type: ShapeType) -> Self {
        if self.shape_type() == shape_type {
            return self;
        }
        let mut next = Self::default_for(shape_type);
        if let Some(r) = self.radius() {
            match &mut next {
                ShapeGeometry::Circle { radius } | ShapeGeometry::Arc { radius, .. } => *radius = r,
                _ => {}
            }
        }
        if let Some((w, h)) = self.extent() {
            match &mut next {
                ShapeGeometry::Rectangle { width, height }
                | ShapeGeometry::Line { width, height }
                | ShapeGeometry::Grid { width, height } => {
                    *width = w;
                    *height = h;
                }
                _ => {}
            }
        }
        next
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ShapeParams {
    pub x: f64,
    pub y: f64,
    #[serde(flatten)]
    pub geometry: ShapeGeometry,
}

impl ShapeParams {
    pub fn shape_type(&self) -> ShapeType {
        self.geometry.shape_type()
    }

    pub fn apply(&mut self, patch: &ShapePatch) {
        if let Some(t) = patch.shape_type {
            self.geometry = self.geometry.with_type(t);
        }
        if let Some(x) = patch.x {
            self.x = x;
        }
        if let Some(y) = patch.y {
            self.y = y;
        }
        match &mut self.geometry {
            ShapeGeometry::Circle { radius } => {
                set(radius, patch.radius);
            }
            ShapeGeometry::Rectangle { width, height }
            | ShapeGeometry::Line { width, height }
            | ShapeGeometry::Grid { width, height } => {
                set(width, patch.width);
                set(height, patch.height);
            }
            ShapeGeometry::Ellipse { radius_x, radius_y } => {
                set(radius_x, patch.radius_x);
                set(radius_y, patch.radius_y);
            }
            ShapeGeometry::Arc {
                radius,
                angle_start,
                angle_end,
            } => {
                set(radius, patch.radius);
                set(angle_start, patch.angle_start);
                set(angle_end, patch.angle_end);
            }
        }
    }
}

fn set(slot: &mut f64, value: Option<f64>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    None,
    #[default]
    Major,
    Minor,
    Both,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AxisLines {
    Box,
    Left,
    #[default]
    Middle,
    Center,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum LegendPos {
    #[default]
    NorthWest,
    NorthEast,
    SouthWest,
    SouthEast,
    OuterNorthEast,
}

impl LegendPos {
    pub const ALL: [LegendPos; 5] = [
        LegendPos::NorthWest,
        LegendPos::NorthEast,
        LegendPos::SouthWest,
        LegendPos::SouthEast,
        LegendPos::OuterNorthEast,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LegendPos::NorthWest => "north west",
            LegendPos::NorthEast => "north east",
            LegendPos::SouthWest => "south west",
            LegendPos::SouthEast => "south east",
            LegendPos::OuterNorthEast => "outer north east",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct AxisParams {
    pub xlabel: String,
    pub ylabel: String,
    pub title: String,
    pub xmin: f64,
    pub xmax: f64,
    pub ymin: f64,
    pub ymax: f64,
    pub grid: GridMode,
    pub axis_lines: AxisLines,
    /// Literal tick list, e.g. `-2,0,2`. Empty means automatic ticks.
    pub xtick: String,
    pub ytick: String,
    pub legend: bool,
    pub legend_pos: LegendPos,
}

impl Default for AxisParams {
    fn default() -> Self {
        Self {
            xlabel: "$x$".to_string(),
            ylabel: "$y$".to_string(),
            title: String::new(),
            xmin: -10.0,
            xmax: 10.0,
            ymin: -10.0,
            ymax: 10.0,
            grid: GridMode::Major,
            axis_lines: AxisLines::Middle,
            xtick: String::new(),
            ytick: String::new(),
            legend: false,
            legend_pos: LegendPos::NorthWest,
        }
    }
}

impl AxisParams {
    pub fn apply(&mut self, patch: &AxisPatch) {
        if let Some(v) = &patch.xlabel {
            self.xlabel = v.clone();
        }
        if let Some(v) = &patch.ylabel {
            self.ylabel = v.clone();
        }
        if let Some(v) = &patch.title {
            self.title = v.clone();
        }
        set(&mut self.xmin, patch.xmin);
        set(&mut self.xmax, patch.xmax);
        set(&mut self.ymin, patch.ymin);
        set(&mut self.ymax, patch.ymax);
        if let Some(g) = patch.grid {
            self.grid = g;
        }
        if let Some(l) = patch.axis_lines {
            self.axis_lines = l;
        }
        if let Some(v) = &patch.xtick {
            self.xtick = v.clone();
        }
        if let Some(v) = &patch.ytick {
            self.ytick = v.clone();
        }
        if let Some(l) = patch.legend {
            self.legend = l;
        }
        if let Some(p) = patch.legend_pos {
            self.legend_pos = p;
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Expression,
    Data,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PlotType {
    #[default]
    #[serde(rename = "sharp")]
    Sharp,
    #[serde(rename = "smooth")]
    Smooth,
    #[serde(rename = "const plot")]
    ConstPlot,
    #[serde(rename = "ybar")]
    Ybar,
    #[serde(rename = "only marks")]
    OnlyMarks,
}

impl PlotType {
    pub const ALL: [PlotType; 5] = [
        PlotType::Sharp,
        PlotType::Smooth,
        PlotType::ConstPlot,
        PlotType::Ybar,
        PlotType::OnlyMarks,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PlotType::Sharp => "sharp",
            PlotType::Smooth => "smooth",
            PlotType::ConstPlot => "const plot",
            PlotType::Ybar => "ybar",
            PlotType::OnlyMarks => "only marks",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlotParams {
    pub source_type: SourceType,
    pub expression: String,
    /// One `x y` pair per line.
    pub data_points: String,
    pub plot_type: PlotType,
    pub samples: u32,
    pub domain_start: f64,
    pub domain_end: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range_end: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend_entry: Option<String>,
}

impl Default for PlotParams {
    fn default() -> Self {
        Self {
            source_type: SourceType::Expression,
            expression: "x^2".to_string(),
            data_points: String::new(),
            plot_type: PlotType::Sharp,
            samples: DEFAULT_SAMPLES,
            domain_start: DEFAULT_DOMAIN_START,
            domain_end: DEFAULT_DOMAIN_END,
            range_start: None,
            range_end: None,
            legend_entry: None,
        }
    }
}

impl PlotParams {
    pub fn apply(&mut self, patch: &PlotPatch) {
        if let Some(s) = patch.source_type {
            self.source_type = s;
        }
        if let Some(v) = &patch.expression {
            self.expression = v.clone();
        }
        if let Some(v) = &patch.data_points {
            self.data_points = v.clone();
        }
        if let Some(t) = patch.plot_type {
            self.plot_type = t;
        }
        if let Some(n) = patch.samples {
            self.samples = n;
        }
        set(&mut self.domain_start, patch.domain_start);
        set(&mut self.domain_end, patch.domain_end);
        if let Some(r) = patch.range_start {
            self.range_start = r;
        }
        if let Some(r) = patch.range_end {
            self.range_end = r;
        }
        if let Some(l) = &patch.legend_entry {
            self.legend_entry = l.clone();
        }
    }

    /// The legend entry, if one is set and not blank.
    pub fn legend(&self) -> Option<&str> {
        self.legend_entry
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "params", rename_all = "lowercase")]
pub enum ElementKind {
    Shape(ShapeParams),
    Axis(AxisParams),
    Plot(PlotParams),
}

impl ElementKind {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementKind::Shape(_) => ElementType::Shape,
            ElementKind::Axis(_) => ElementType::Axis,
            ElementKind::Plot(_) => ElementType::Plot,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ElementId>,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    #[serde(default)]
    pub style: Style,
}

impl Element {
    pub fn element_type(&self) -> ElementType {
        self.kind.element_type()
    }

    pub fn is_axis(&self) -> bool {
        matches!(self.kind, ElementKind::Axis(_))
    }

    pub fn is_plot(&self) -> bool {
        matches!(self.kind, ElementKind::Plot(_))
    }

    /// Applies an update. Returns `false` when a params patch targets another kind.
    pub fn apply(&mut self, update: &ElementUpdate) -> bool {
        match (update, &mut self.kind) {
            (ElementUpdate::Style(patch), _) => self.style.apply(patch),
            (ElementUpdate::Rename(name), _) => self.name = name.clone(),
            (ElementUpdate::Params(ParamsPatch::Shape(p)), ElementKind::Shape(params)) => {
                params.apply(p)
            }
            (ElementUpdate::Params(ParamsPatch::Axis(p)), ElementKind::Axis(params)) => {
                params.apply(p)
            }
            (ElementUpdate::Params(ParamsPatch::Plot(p)), ElementKind::Plot(params)) => {
                params.apply(p)
            }
            (ElementUpdate::Params(_), _) => return false,
        }
        true
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapePatch {
    pub shape_type: Option<ShapeType>,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub radius: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub radius_x: Option<f64>,
    pub radius_y: Option<f64>,
    pub angle_start: Option<f64>,
    pub angle_end: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AxisPatch {
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub title: Option<String>,
    pub xmin: Option<f64>,
    pub xmax: Option<f64>,
    pub ymin: Option<f64>,
    pub ymax: Option<f64>,
    pub grid: Option<GridMode>,
    pub axis_lines: Option<AxisLines>,
    pub xtick: Option<String>,
    pub ytick: Option<String>,
    pub legend: Option<bool>,
    pub legend_pos: Option<LegendPos>,
}

/// Nested options on the optional fields: `Some(None)` clears the field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlotPatch {
    pub source_type: Option<SourceType>,
    pub expression: Option<String>,
    pub data_points: Option<String>,
    pub plot_type: Option<PlotType>,
    pub samples: Option<u32>,
    pub domain_start: Option<f64>,
    pub domain_end: Option<f64>,
    pub range_start: Option<Option<f64>>,
    pub range_end: Option<Option<f64>>,
    pub legend_entry: Option<Option<String>>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StylePatch {
    pub color: Option<String>,
    pub fill: Option<String>,
    pub line_width: Option<f64>,
    pub opacity: Option<f64>,
    pub line_style: Option<LineStyle>,
    pub arrow_head: Option<ArrowHead>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamsPatch {
    Shape(ShapePatch),
    Axis(AxisPatch),
    Plot(PlotPatch),
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementUpdate {
    Params(ParamsPatch),
    Style(StylePatch),
    Rename(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_named_colors() {
        assert_eq!(parse_color("#ff8000"), Some(Rgba::opaque(255, 128, 0)));
        assert_eq!(parse_color("#f00"), Some(Rgba::opaque(255, 0, 0)));
        assert_eq!(parse_color("Blue"), Some(Rgba::opaque(0, 0, 255)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn default_color_accepts_any_black_spelling() {
        let mut style = Style::default();
        assert!(style.has_default_color());
        style.color = "black".to_string();
        assert!(style.has_default_color());
        style.color = "#000".to_string();
        assert!(style.has_default_color());
        style.color = "#010101".to_string();
        assert!(!style.has_default_color());
    }

    #[test]
    fn shape_patch_merges_only_given_fields() {
        let mut shape = ShapeParams {
            x: 1.0,
            y: 2.0,
            geometry: ShapeGeometry::Rectangle {
                width: 3.0,
                height: 4.0,
            },
        };
        shape.apply(&ShapePatch {
            height: Some(5.0),
            radius: Some(9.0),
            ..Default::default()
        });
        assert_eq!(shape.x, 1.0);
        assert_eq!(
            shape.geometry,
            ShapeGeometry::Rectangle {
                width: 3.0,
                height: 5.0
            }
        );
    }

    #[test]
    fn changing_shape_type_keeps_compatible_fields() {
        let g = ShapeGeometry::Arc {
            radius: 3.0,
            angle_start: 10.0,
            angle_end: 20.0,
        };
        assert_eq!(
            g.with_type(ShapeType::Circle),
            ShapeGeometry::Circle { radius: 3.0 }
        );
        let g = ShapeGeometry::Line {
            width: 5.0,
            height: -1.0,
        };
        assert_eq!(
            g.with_type(ShapeType::Grid),
            ShapeGeometry::Grid {
                width: 5.0,
                height: -1.0
            }
        );
        assert_eq!(
            g.with_type(ShapeType::Ellipse),
            ShapeGeometry::default_for(ShapeType::Ellipse)
        );
    }

    #[test]
    fn params_patch_for_another_kind_is_rejected() {
        let mut e = Element {
            id: ElementId(1),
            parent_id: None,
            name: "Axis 1".to_string(),
            kind: ElementKind::Axis(AxisParams::default()),
            style: Style::default(),
        };
        let before = e.clone();
        let applied = e.apply(&ElementUpdate::Params(ParamsPatch::Plot(PlotPatch {
            samples: Some(3),
            ..Default::default()
        })));
        assert!(!applied);
        assert_eq!(e, before);
    }

    #[test]
    fn plot_patch_can_clear_optional_fields() {
        let mut p = PlotParams {
            range_start: Some(-1.0),
            legend_entry: Some("f".to_string()),
            ..Default::default()
        };
        p.apply(&PlotPatch {
            range_start: Some(None),
            legend_entry: Some(None),
            ..Default::default()
        });
        assert_eq!(p.range_start, None);
        assert_eq!(p.legend(), None);
    }

    #[test]
    fn element_json_uses_kind_and_params_keys() {
        let e = Element {
            id: ElementId(7),
            parent_id: Some(ElementId(2)),
            name: "Plot 1".to_string(),
            kind: ElementKind::Plot(PlotParams::default()),
            style: Style::default(),
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["kind"], "plot");
        assert_eq!(v["parentId"], 2);
        assert_eq!(v["params"]["plotType"], "sharp");
        assert_eq!(v["style"]["lineWidth"], 0.8);
        let back: Element = serde_json::from_value(v).unwrap();
        assert_eq!(back, e);
    }

    #[test]
    fn shape_json_is_flat() {
        let e = Element {
            id: ElementId(1),
            parent_id: None,
            name: String::new(),
            kind: ElementKind::Shape(ShapeParams {
                x: 0.5,
                y: 0.0,
                geometry: ShapeGeometry::Ellipse {
                    radius_x: 2.0,
                    radius_y: 1.0,
                },
            }),
            style: Style::default(),
        };
        let v = serde_json::to_value(&e).unwrap();
        assert_eq!(v["params"]["shapeType"], "ellipse");
        assert_eq!(v["params"]["radiusX"], 2.0);
        assert_eq!(v["params"]["x"], 0.5);
    }
}
