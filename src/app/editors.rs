use eframe::egui;
use tikzsketch::model::{
    ArrowHead, AxisLines, AxisParams, AxisPatch, GridMode, LegendPos, LineStyle, PlotParams,
    PlotPatch, PlotType, ShapeGeometry, ShapeParams, ShapePatch, ShapeType, SourceType, Style,
    StylePatch,
};

fn combo<T: Copy + PartialEq>(
    ui: &mut egui::Ui,
    id: &str,
    value: &mut T,
    options: &[T],
    label: impl Fn(T) -> &'static str,
) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_salt(id)
        .selected_text(label(*value))
        .show_ui(ui, |ui| {
            for &option in options {
                changed |= ui.selectable_value(value, option, label(option)).changed();
            }
        });
    changed
}

fn number(ui: &mut egui::Ui, label: &str, value: &mut f64, speed: f64) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.add(egui::DragValue::new(value).speed(speed)).changed()
    })
    .inner
}

fn text_row(ui: &mut egui::Ui, label: &str, value: &mut String) -> bool {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.text_edit_singleline(value).changed()
    })
    .inner
}

fn grid_label(g: GridMode) -> &'static str {
    match g {
        GridMode::None => "none",
        GridMode::Major => "major",
        GridMode::Minor => "minor",
        GridMode::Both => "both",
    }
}

fn axis_lines_label(l: AxisLines) -> &'static str {
    match l {
        AxisLines::Box => "box",
        AxisLines::Left => "left",
        AxisLines::Middle => "middle",
        AxisLines::Center => "center",
    }
}

fn line_style_label(s: LineStyle) -> &'static str {
    match s {
        LineStyle::Solid => "Solid",
        LineStyle::Dashed => "Dashed",
        LineStyle::Dotted => "Dotted",
    }
}

fn arrow_label(a: ArrowHead) -> &'static str {
    match a {
        ArrowHead::None => "None",
        ArrowHead::End => "->",
        ArrowHead::Start => "<-",
        ArrowHead::Both => "<->",
    }
}

pub(super) fn shape_editor(ui: &mut egui::Ui, shape: &mut ShapeParams) -> bool {
    let mut changed = false;
    let mut shape_type = shape.shape_type();
    ui.horizontal(|ui| {
        ui.label("Type:");
        if combo(ui, "shape_type", &mut shape_type, &ShapeType::ALL, ShapeType::label) {
            shape.geometry = shape.geometry.with_type(shape_type);
            changed = true;
        }
    });
    changed |= number(ui, "x", &mut shape.x, 0.1);
    changed |= number(ui, "y", &mut shape.y, 0.1);
    match &mut shape.geometry {
        ShapeGeometry::Circle { radius } => {
            changed |= number(ui, "Radius", radius, 0.05);
        }
        ShapeGeometry::Rectangle { width, height }
        | ShapeGeometry::Line { width, height }
        | ShapeGeometry::Grid { width, height } => {
            changed |= number(ui, "Width", width, 0.1);
            changed |= number(ui, "Height", height, 0.1);
        }
        ShapeGeometry::Ellipse { radius_x, radius_y } => {
            changed |= number(ui, "Radius x", radius_x, 0.05);
            changed |= number(ui, "Radius y", radius_y, 0.05);
        }
        ShapeGeometry::Arc {
            radius,
            angle_start,
            angle_end,
        } => {
            changed |= number(ui, "Radius", radius, 0.05);
            changed |= number(ui, "Start angle", angle_start, 1.0);
            changed |= number(ui, "End angle", angle_end, 1.0);
        }
    }
    changed
}

pub(super) fn axis_editor(ui: &mut egui::Ui, axis: &mut AxisParams) -> bool {
    let mut changed = false;
    changed |= text_row(ui, "x label", &mut axis.xlabel);
    changed |= text_row(ui, "y label", &mut axis.ylabel);
    changed |= text_row(ui, "Title", &mut axis.title);
    ui.horizontal(|ui| {
        ui.label("x:");
        changed |= ui.add(egui::DragValue::new(&mut axis.xmin).speed(0.1)).changed();
        ui.label("to");
        changed |= ui.add(egui::DragValue::new(&mut axis.xmax).speed(0.1)).changed();
    });
    ui.horizontal(|ui| {
        ui.label("y:");
        changed |= ui.add(egui::DragValue::new(&mut axis.ymin).speed(0.1)).changed();
        ui.label("to");
        changed |= ui.add(egui::DragValue::new(&mut axis.ymax).speed(0.1)).changed();
    });
    ui.horizontal(|ui| {
        ui.label("Grid:");
        changed |= combo(
            ui,
            "axis_grid",
            &mut axis.grid,
            &[GridMode::None, GridMode::Major, GridMode::Minor, GridMode::Both],
            grid_label,
        );
    });
    ui.horizontal(|ui| {
        ui.label("Axis lines:");
        changed |= combo(
            ui,
            "axis_lines",
            &mut axis.axis_lines,
            &[AxisLines::Box, AxisLines::Left, AxisLines::Middle, AxisLines::Center],
            axis_lines_label,
        );
    });
    changed |= text_row(ui, "x ticks", &mut axis.xtick);
    changed |= text_row(ui, "y ticks", &mut axis.ytick);
    changed |= ui.checkbox(&mut axis.legend, "Legend").changed();
    if axis.legend {
        ui.horizontal(|ui| {
            ui.label("Position:");
            changed |= combo(
                ui,
                "legend_pos",
                &mut axis.legend_pos,
                &LegendPos::ALL,
                LegendPos::label,
            );
        });
    }
    changed
}

fn optional_number(ui: &mut egui::Ui, label: &str, value: &mut Option<f64>, fallback: f64) -> bool {
    ui.horizontal(|ui| {
        let mut on = value.is_some();
        let mut changed = ui.checkbox(&mut on, label).changed();
        match (on, value.as_mut()) {
            (true, Some(v)) => changed |= ui.add(egui::DragValue::new(v).speed(0.1)).changed(),
            (true, None) => *value = Some(fallback),
            (false, _) => *value = None,
        }
        changed
    })
    .inner
}

pub(super) fn plot_editor(ui: &mut egui::Ui, plot: &mut PlotParams) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        changed |= ui
            .selectable_value(&mut plot.source_type, SourceType::Expression, "Expression")
            .changed();
        changed |= ui
            .selectable_value(&mut plot.source_type, SourceType::Data, "Data")
            .changed();
    });
    match plot.source_type {
        SourceType::Expression => {
            changed |= text_row(ui, "y =", &mut plot.expression);
            ui.horizontal(|ui| {
                ui.label("Samples:");
                changed |= ui
                    .add(egui::DragValue::new(&mut plot.samples).range(2..=2000))
                    .changed();
            });
        }
        SourceType::Data => {
            ui.label("Points (x y per line):");
            changed |= ui
                .add(
                    egui::TextEdit::multiline(&mut plot.data_points)
                        .code_editor()
                        .desired_rows(4),
                )
                .changed();
        }
    }
    ui.horizontal(|ui| {
        ui.label("Plot type:");
        changed |= combo(ui, "plot_type", &mut plot.plot_type, &PlotType::ALL, PlotType::label);
    });
    ui.horizontal(|ui| {
        ui.label("Domain:");
        changed |= ui
            .add(egui::DragValue::new(&mut plot.domain_start).speed(0.1))
            .changed();
        ui.label("to");
        changed |= ui
            .add(egui::DragValue::new(&mut plot.domain_end).speed(0.1))
            .changed();
    });
    changed |= optional_number(ui, "y from", &mut plot.range_start, -10.0);
    changed |= optional_number(ui, "y to", &mut plot.range_end, 10.0);

    let mut legend = plot.legend_entry.clone().unwrap_or_default();
    if text_row(ui, "Legend", &mut legend) {
        plot.legend_entry = if legend.is_empty() { None } else { Some(legend) };
        changed = true;
    }
    changed
}

const PRESETS: [(&str, egui::Color32); 6] = [
    ("black", egui::Color32::from_rgb(0, 0, 0)),
    ("red", egui::Color32::from_rgb(255, 0, 0)),
    ("blue", egui::Color32::from_rgb(0, 0, 255)),
    ("teal", egui::Color32::from_rgb(0, 128, 128)),
    ("orange", egui::Color32::from_rgb(255, 128, 0)),
    ("violet", egui::Color32::from_rgb(128, 0, 128)),
];

fn color_row(ui: &mut egui::Ui, label: &str, color: &mut String) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        for (name, c) in PRESETS {
            if ui
                .add_sized([18.0, 18.0], egui::Button::new("").fill(c))
                .on_hover_text(name)
                .clicked()
            {
                *color = name.to_string();
                changed = true;
            }
        }
        changed |= ui
            .add(egui::TextEdit::singleline(color).desired_width(70.0))
            .changed();
    });
    changed
}

pub(super) fn style_editor(ui: &mut egui::Ui, style: &mut Style) -> bool {
    let mut changed = false;
    changed |= color_row(ui, "Color", &mut style.color);
    changed |= color_row(ui, "Fill", &mut style.fill);
    changed |= ui
        .add(egui::Slider::new(&mut style.line_width, 0.1..=5.0).text("Width (mm)"))
        .changed();
    changed |= ui
        .add(egui::Slider::new(&mut style.opacity, 0.0..=100.0).text("Opacity"))
        .changed();
    ui.horizontal(|ui| {
        ui.label("Line:");
        changed |= combo(
            ui,
            "line_style",
            &mut style.line_style,
            &[LineStyle::Solid, LineStyle::Dashed, LineStyle::Dotted],
            line_style_label,
        );
    });
    ui.horizontal(|ui| {
        ui.label("Arrow:");
        changed |= combo(
            ui,
            "arrow_head",
            &mut style.arrow_head,
            &[ArrowHead::None, ArrowHead::End, ArrowHead::Start, ArrowHead::Both],
            arrow_label,
        );
    });
    changed
}

fn changed<T: PartialEq + Clone>(old: &T, new: &T) -> Option<T> {
    (old != new).then(|| new.clone())
}

fn geometry_fields(g: &ShapeGeometry) -> ShapePatch {
    match *g {
        ShapeGeometry::Circle { radius } => ShapePatch {
            radius: Some(radius),
            ..Default::default()
        },
        ShapeGeometry::Rectangle { width, height }
        | ShapeGeometry::Line { width, height }
        | ShapeGeometry::Grid { width, height } => ShapePatch {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        },
        ShapeGeometry::Ellipse { radius_x, radius_y } => ShapePatch {
            radius_x: Some(radius_x),
            radius_y: Some(radius_y),
            ..Default::default()
        },
        ShapeGeometry::Arc {
            radius,
            angle_start,
            angle_end,
        } => ShapePatch {
            radius: Some(radius),
            angle_start: Some(angle_start),
            angle_end: Some(angle_end),
            ..Default::default()
        },
    }
}

/// Field-level difference between two edits of the same shape.
pub(super) fn shape_patch(old: &ShapeParams, new: &ShapeParams) -> ShapePatch {
    let (a, b) = (geometry_fields(&old.geometry), geometry_fields(&new.geometry));
    let pick = |a: Option<f64>, b: Option<f64>| if a != b { b } else { None };
    ShapePatch {
        shape_type: changed(&old.shape_type(), &new.shape_type()),
        x: changed(&old.x, &new.x),
        y: changed(&old.y, &new.y),
        radius: pick(a.radius, b.radius),
        width: pick(a.width, b.width),
        height: pick(a.height, b.height),
        radius_x: pick(a.radius_x, b.radius_x),
        radius_y: pick(a.radius_y, b.radius_y),
        angle_start: pick(a.angle_start, b.angle_start),
        angle_end: pick(a.angle_end, b.angle_end),
    }
}

pub(super) fn axis_patch(old: &AxisParams, new: &AxisParams) -> AxisPatch {
    AxisPatch {
        xlabel: changed(&old.xlabel, &new.xlabel),
        ylabel: changed(&old.ylabel, &new.ylabel),
        title: changed(&old.title, &new.title),
        xmin: changed(&old.xmin, &new.xmin),
        xmax: changed(&old.xmax, &new.xmax),
        ymin: changed(&old.ymin, &new.ymin),
        ymax: changed(&old.ymax, &new.ymax),
        grid: changed(&old.grid, &new.grid),
        axis_lines: changed(&old.axis_lines, &new.axis_lines),
        xtick: changed(&old.xtick, &new.xtick),
        ytick: changed(&old.ytick, &new.ytick),
        legend: changed(&old.legend, &new.legend),
        legend_pos: changed(&old.legend_pos, &new.legend_pos),
    }
}

pub(super) fn plot_patch(old: &PlotParams, new: &PlotParams) -> PlotPatch {
    PlotPatch {
        source_type: changed(&old.source_type, &new.source_type),
        expression: changed(&old.expression, &new.expression),
        data_points: changed(&old.data_points, &new.data_points),
        plot_type: changed(&old.plot_type, &new.plot_type),
        samples: changed(&old.samples, &new.samples),
        domain_start: changed(&old.domain_start, &new.domain_start),
        domain_end: changed(&old.domain_end, &new.domain_end),
        range_start: changed(&old.range_start, &new.range_start),
        range_end: changed(&old.range_end, &new.range_end),
        legend_entry: changed(&old.legend_entry, &new.legend_entry),
    }
}

pub(super) fn style_patch(old: &Style, new: &Style) -> StylePatch {
    StylePatch {
        color: changed(&old.color, &new.color),
        fill: changed(&old.fill, &new.fill),
        line_width: changed(&old.line_width, &new.line_width),
        opacity: changed(&old.opacity, &new.opacity),
        line_style: changed(&old.line_style, &new.line_style),
        arrow_head: changed(&old.arrow_head, &new.arrow_head),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_patch_reapplies_to_the_edited_shape() {
        let old = ShapeParams {
            x: 1.0,
            y: 0.0,
            geometry: ShapeGeometry::Circle { radius: 2.0 },
        };
        let new = ShapeParams {
            x: 1.5,
            y: 0.0,
            geometry: old.geometry.with_type(ShapeType::Arc),
        };
        let patch = shape_patch(&old, &new);
        assert_eq!(patch.shape_type, Some(ShapeType::Arc));
        assert_eq!(patch.radius, None);
        assert_eq!(patch.y, None);
        let mut applied = old;
        applied.apply(&patch);
        assert_eq!(applied, new);
    }

    #[test]
    fn plot_patch_clears_the_legend() {
        let old = PlotParams {
            legend_entry: Some("f".to_string()),
            ..Default::default()
        };
        let new = PlotParams::default();
        let patch = plot_patch(&old, &new);
        assert_eq!(patch.legend_entry, Some(None));
        assert_eq!(patch.expression, None);
        let mut applied = old;
        applied.apply(&patch);
        assert_eq!(applied, new);
    }

    #[test]
    fn unchanged_style_gives_an_empty_patch() {
        let style = Style::default();
        assert_eq!(style_patch(&style, &style), StylePatch::default());
    }
}
