use eframe::egui;
use tikzsketch::model::{ElementKind, ElementType, ElementUpdate, ParamsPatch};
use tikzsketch::{ElementId, ZoomDirection};

use super::SketchApp;
use super::editors::{
    axis_editor, axis_patch, plot_editor, plot_patch, shape_editor, shape_patch, style_editor,
    style_patch,
};
use super::render::{PreviewFrame, draw_background, draw_scene};

enum ListAction {
    Select(Option<ElementId>),
    Remove(ElementId),
}

impl eframe::App for SketchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let typing = ctx.wants_keyboard_input();
        let (mut copy_requested, mut deselect, mut delete) = (false, false, false);
        ctx.input_mut(|i| {
            if !typing {
                deselect = i.consume_key(egui::Modifiers::NONE, egui::Key::Escape);
                delete = i.consume_key(egui::Modifiers::NONE, egui::Key::Delete);
            }
            copy_requested =
                i.consume_key(egui::Modifiers::COMMAND | egui::Modifiers::SHIFT, egui::Key::C);
        });
        if copy_requested {
            self.copy_markup(ctx);
        }
        if deselect {
            self.session.select(None);
        }
        if delete {
            if let Some(id) = self.session.store().selected() {
                self.session.remove(id);
            }
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Copy markup").clicked() {
                    self.copy_markup(ctx);
                }
                if ui.button("Save markup").clicked() {
                    self.save_markup_to_path();
                }
                if ui.button("Save markup as…").clicked() {
                    self.save_markup_dialog();
                }
                ui.separator();
                if ui.button("Reset view").clicked() {
                    self.view.reset();
                }
                ui.label(format!("{:.0}%", self.view.scale * 100.0));
                ui.separator();
                let mut settings_changed = ui
                    .checkbox(&mut self.settings.show_preview_grid, "Grid")
                    .changed();
                settings_changed |= ui
                    .checkbox(&mut self.settings.autosave, "Autosave")
                    .changed();
                if settings_changed {
                    self.session.storage_mut().autosave = self.settings.autosave;
                    self.save_settings();
                }
                if let Some(status) = &self.status {
                    ui.separator();
                    ui.label(status.as_str());
                }
            });
        });

        egui::SidePanel::left("scene_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.staging_panel(ui);
                    ui.separator();
                    self.element_list(ui);
                });
            });

        egui::SidePanel::right("properties_panel")
            .resizable(true)
            .min_width(220.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    ui.heading("Properties");
                    ui.separator();
                    self.properties_panel(ui);
                });
            });

        egui::TopBottomPanel::bottom("markup_panel")
            .resizable(true)
            .default_height(200.0)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.strong("TikZ");
                    if ui.small_button("Copy").clicked() {
                        self.copy_markup(ctx);
                    }
                });
                egui::ScrollArea::both().show(ui, |ui| {
                    let mut markup: &str = self.session.markup();
                    ui.add(
                        egui::TextEdit::multiline(&mut markup)
                            .code_editor()
                            .desired_width(f32::INFINITY),
                    );
                });
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                let center = rect.center();

                let scroll_delta = ctx.input(|i| i.raw_scroll_delta.y);
                if scroll_delta.abs() > 0.0 {
                    if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                        if rect.contains(hover_pos) {
                            let direction = if scroll_delta > 0.0 {
                                ZoomDirection::In
                            } else {
                                ZoomDirection::Out
                            };
                            let frame = self.preview_frame(center);
                            self.view.zoom(direction, frame.display_point(hover_pos));
                        }
                    }
                }

                if response.drag_started() {
                    self.view.begin_pan();
                }
                if response.dragged() {
                    let delta = response.drag_delta();
                    self.view.pan_by(f64::from(delta.x), f64::from(delta.y));
                }
                if response.drag_stopped() || (!response.hovered() && !response.dragged()) {
                    self.view.end_pan();
                }
                if response.double_clicked() {
                    self.view.reset();
                }

                let painter = ui.painter_at(rect);
                let frame = self.preview_frame(center);
                draw_background(&painter, rect, &frame, self.settings.show_preview_grid);
                draw_scene(&painter, &frame, self.session.store());
            });
    }
}

impl SketchApp {
    fn preview_frame(&self, center: egui::Pos2) -> PreviewFrame {
        PreviewFrame {
            center,
            unit: f64::from(self.settings.preview_unit_px),
            view: self.view,
        }
    }

    fn staging_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Add");
        let staged = self.session.store().staging().clone();
        let mut next = staged.clone();
        ui.push_id("staging", |ui| {
            egui::CollapsingHeader::new("Shape")
                .default_open(true)
                .show(ui, |ui| {
                    let mut shape = next.staged_shape();
                    if shape_editor(ui, &mut shape) {
                        next.shape_type = shape.shape_type();
                        next.shape = shape;
                    }
                });
            egui::CollapsingHeader::new("Axis").show(ui, |ui| {
                axis_editor(ui, &mut next.axis);
            });
            egui::CollapsingHeader::new("Plot").show(ui, |ui| {
                plot_editor(ui, &mut next.plot);
            });
            egui::CollapsingHeader::new("Style").show(ui, |ui| {
                style_editor(ui, &mut next.style);
            });
        });
        if next != staged {
            self.session.edit_staging(|s| *s = next);
        }

        ui.horizontal(|ui| {
            for element_type in [ElementType::Shape, ElementType::Axis, ElementType::Plot] {
                if ui.button(format!("Add {}", element_type.label())).clicked() {
                    self.session.add(element_type);
                    self.status = Some(format!("Added {}", element_type.label()));
                }
            }
        });
    }

    fn element_list(&mut self, ui: &mut egui::Ui) {
        ui.heading("Elements");
        let store = self.session.store();
        let selected = store.selected();
        let mut action = None;
        let mut row = |ui: &mut egui::Ui, element: &tikzsketch::Element, indent: bool| {
            ui.horizontal(|ui| {
                if indent {
                    ui.add_space(16.0);
                }
                let is_selected = selected == Some(element.id);
                let text = format!("{} {}", element.name, element.id);
                if ui.selectable_label(is_selected, text).clicked() {
                    action = Some(ListAction::Select((!is_selected).then_some(element.id)));
                }
                if ui.small_button("✕").on_hover_text("Delete").clicked() {
                    action = Some(ListAction::Remove(element.id));
                }
            });
        };
        if store.is_empty() {
            ui.weak("Nothing yet. Add a shape, axis or plot.");
        }
        for element in store.elements().iter().filter(|e| e.parent_id.is_none()) {
            row(ui, element, false);
            if element.is_axis() {
                for child in store.children(element.id) {
                    row(ui, child, true);
                }
            }
        }
        match action {
            Some(ListAction::Select(id)) => self.session.select(id),
            Some(ListAction::Remove(id)) => self.session.remove(id),
            None => {}
        }
    }

    fn properties_panel(&mut self, ui: &mut egui::Ui) {
        let Some(element) = self.session.store().selected_element().cloned() else {
            ui.weak("Select an element to edit it.");
            return;
        };
        let id = element.id;
        let mut updates = Vec::new();

        ui.horizontal(|ui| {
            ui.label(element.element_type().label());
            let mut name = element.name.clone();
            if ui.text_edit_singleline(&mut name).changed() {
                updates.push(ElementUpdate::Rename(name));
            }
        });
        ui.separator();

        ui.push_id(id.0, |ui| {
            match &element.kind {
                ElementKind::Shape(old) => {
                    let mut new = *old;
                    if shape_editor(ui, &mut new) && new != *old {
                        updates.push(ElementUpdate::Params(ParamsPatch::Shape(shape_patch(
                            old, &new,
                        ))));
                    }
                }
                ElementKind::Axis(old) => {
                    let mut new = old.clone();
                    if axis_editor(ui, &mut new) && new != *old {
                        updates.push(ElementUpdate::Params(ParamsPatch::Axis(axis_patch(
                            old, &new,
                        ))));
                    }
                }
                ElementKind::Plot(old) => {
                    let mut new = old.clone();
                    if plot_editor(ui, &mut new) && new != *old {
                        updates.push(ElementUpdate::Params(ParamsPatch::Plot(plot_patch(
                            old, &new,
                        ))));
                    }
                }
            }
            ui.separator();
            ui.label("Style");
            let mut style = element.style.clone();
            if style_editor(ui, &mut style) && style != element.style {
                updates.push(ElementUpdate::Style(style_patch(&element.style, &style)));
            }
        });

        let mut reparent = None;
        if element.is_plot() {
            ui.separator();
            let axes: Vec<(ElementId, String)> = self
                .session
                .store()
                .elements()
                .iter()
                .filter(|e| e.is_axis())
                .map(|e| (e.id, format!("{} {}", e.name, e.id)))
                .collect();
            let current = element.parent_id;
            let current_text = axes
                .iter()
                .find(|(axis_id, _)| Some(*axis_id) == current)
                .map(|(_, name)| name.clone())
                .unwrap_or_default();
            ui.horizontal(|ui| {
                ui.label("Axis:");
                egui::ComboBox::from_id_salt("plot_parent")
                    .selected_text(current_text)
                    .show_ui(ui, |ui| {
                        for (axis_id, name) in &axes {
                            let is_current = current == Some(*axis_id);
                            if ui.selectable_label(is_current, name.as_str()).clicked() {
                                reparent = Some(*axis_id);
                            }
                        }
                    });
            });
        }

        ui.separator();
        let delete = ui.button("Delete").clicked();

        for update in updates {
            self.session.update(id, update);
        }
        if let Some(axis) = reparent.filter(|a| Some(*a) != element.parent_id) {
            self.session.set_parent(id, axis);
        }
        if delete {
            self.session.remove(id);
            self.status = Some(format!("Deleted {}", element.name));
        }
    }
}
