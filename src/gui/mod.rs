//! The application window: a toolbar, a side panel with selection details and the legend, and
//! the map filling the rest.

use eframe::{
    egui,
    egui::{vec2, Color32, ComboBox, Context, DragValue, RichText, ScrollArea, Sense, Ui},
};
use strum::IntoEnumIterator;

use crate::{
    controller::{MapController, MapEvent},
    map::MapConfig,
    misc_types::{FeatureKind, Strand},
    state::State,
    util::format_thousands,
};

mod input;
mod map;
pub mod paint;
mod save;

pub const WINDOW_WIDTH: f32 = 1_200.;
pub const WINDOW_HEIGHT: f32 = 800.;

pub const ROW_SPACING: f32 = 22.;
pub const COL_SPACING: f32 = 30.;

const SIDE_PANEL_WIDTH: f32 = 260.;
const LEGEND_SWATCH_SIZE: f32 = 12.;

const FONT_SIZE_MIN: f32 = 8.;
const FONT_SIZE_MAX: f32 = 20.;

const HEADING_COLOR: Color32 = Color32::from_rgb(220, 220, 220);

fn display_filters(config: &mut MapConfig, ui: &mut Ui) {
    ui.horizontal(|ui| {
        ui.label("Ruler:");
        ui.checkbox(&mut config.show_ruler, "");
        ui.add_space(COL_SPACING / 2.);

        ui.label("Labels:");
        ui.checkbox(&mut config.show_labels, "");
        ui.add_space(COL_SPACING / 2.);

        ui.label("ORF candidates:");
        ui.checkbox(&mut config.show_ghosts, "");
        ui.add_space(COL_SPACING / 2.);

        ui.label("Sequence:");
        ui.checkbox(&mut config.show_sequence, "");
        ui.add_space(COL_SPACING / 2.);

        ui.label("Translation:");
        ui.checkbox(&mut config.show_translation, "");

        ComboBox::from_id_salt("translation_frame")
            .width(60.)
            .selected_text(format!("Frame {}", config.translation_frame + 1))
            .show_ui(ui, |ui| {
                for frame in 0..3 {
                    ui.selectable_value(
                        &mut config.translation_frame,
                        frame,
                        format!("Frame {}", frame + 1),
                    );
                }
            });
        ui.add_space(COL_SPACING / 2.);

        ui.label("Font size:");
        ui.add(
            DragValue::new(&mut config.font_size)
                .range(FONT_SIZE_MIN..=FONT_SIZE_MAX)
                .speed(0.1),
        );
    });
}

fn view_info(state: &mut State, ui: &mut Ui) {
    ui.heading(RichText::new("Sequence").color(HEADING_COLOR));

    if state.data.is_empty() {
        ui.label("No sequence loaded");
        return;
    }

    ui.label(format!(
        "{}: {} bp, {}",
        state.data.name,
        format_thousands(state.data.len()),
        state.data.topology.to_string()
    ));

    ui.horizontal(|ui| {
        ui.label(format!("Zoom: {:.1}×", state.controller.projection().zoom()));

        if ui
            .button("Reset view")
            .on_hover_text("Zoom out fully, and clear the selection.")
            .clicked()
        {
            state.controller = MapController::new(state.data.topology);
        }
    });
}

fn selection_section(state: &mut State, ui: &mut Ui) {
    ui.heading(RichText::new("Selection").color(HEADING_COLOR));

    let seq_len = state.data.len();
    let topology = state.data.topology;
    let mut events = Vec::new();

    if let Some(sel) = state.controller.selection() {
        ui.label(format!(
            "{}..{}  {} bp",
            sel.start + 1,
            sel.end,
            sel.len(seq_len, topology)
        ));
    }

    for id in state.controller.selected() {
        if let Some(feature) = state.features.iter().find(|f| f.id == *id) {
            ui.horizontal(|ui| {
                ui.label(RichText::new(feature.label()).color(feature.color()));
                ui.label(feature.location_descrip(seq_len, topology));
            });
        }
    }

    if state.controller.selection().is_none() && state.controller.selected().is_empty() {
        ui.label("Click a feature, or drag along the backbone.");
        return;
    }

    ui.horizontal(|ui| {
        if ui
            .button("Copy sequence")
            .on_hover_text("Copy the selected sequence to the clipboard. (Ctrl + c)")
            .clicked()
        {
            if let Some(text) = state.controller.copy_text(&state.data, &state.features) {
                events.push(MapEvent::CopyText(text));
            }
        }

        if !state.controller.selected().is_empty()
            && ui
                .button("Delete")
                .on_hover_text("Delete the selected features. (Del)")
                .clicked()
        {
            events.push(MapEvent::DeleteFeatures(state.controller.selected().to_vec()));
        }
    });

    state.handle_events(events);
}

/// Edits requested from the map's context menu land here.
fn feature_editor(state: &mut State, ui: &mut Ui) {
    let Some(id) = state.ui.editing else {
        return;
    };
    let Some(feature) = state.features.iter_mut().find(|f| f.id == id) else {
        state.ui.editing = None;
        return;
    };

    ui.heading(RichText::new("Edit feature").color(HEADING_COLOR));

    ui.horizontal(|ui| {
        ui.label("Label:");
        ui.text_edit_singleline(&mut feature.label);
    });

    ui.horizontal(|ui| {
        ui.label("Type:");
        ComboBox::from_id_salt(("feature_kind", id))
            .selected_text(feature.kind.to_string())
            .show_ui(ui, |ui| {
                for kind in FeatureKind::iter() {
                    ui.selectable_value(&mut feature.kind, kind, kind.to_string());
                }
            });
    });

    ui.horizontal(|ui| {
        ui.label("Strand:");
        ui.radio_value(&mut feature.strand, Strand::Forward, "Forward");
        ui.radio_value(&mut feature.strand, Strand::Reverse, "Reverse");
    });

    if ui.button("Done").clicked() {
        state.ui.editing = None;
    }
}

/// Kinds present in the document, with their colors.
fn legend(state: &State, ui: &mut Ui) {
    ui.heading(RichText::new("Legend").color(HEADING_COLOR));

    for kind in FeatureKind::iter() {
        if !state.features.iter().any(|f| f.kind == kind) {
            continue;
        }

        ui.horizontal(|ui| {
            let (rect, _) =
                ui.allocate_exact_size(vec2(LEGEND_SWATCH_SIZE, LEGEND_SWATCH_SIZE), Sense::hover());
            ui.painter().rect_filled(rect, 2., kind.color());
            ui.label(kind.to_string());
        });
    }

    if !state.ghosts.is_empty() {
        ui.label(format!("{} ORF candidates (dashed)", state.ghosts.len()));
    }
}

pub fn draw(state: &mut State, ctx: &Context) {
    input::handle_global(state, ctx);

    egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            save::save_section(state, ui);
            ui.add_space(COL_SPACING);
            display_filters(&mut state.config, ui);
        });
    });

    egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
        ui.label(&state.ui.status);
    });

    egui::SidePanel::right("side_panel")
        .default_width(SIDE_PANEL_WIDTH)
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                view_info(state, ui);
                ui.add_space(ROW_SPACING);

                selection_section(state, ui);
                ui.add_space(ROW_SPACING);

                feature_editor(state, ui);
                ui.add_space(ROW_SPACING);

                legend(state, ui);
            });
        });

    egui::CentralPanel::default()
        .frame(egui::Frame::none())
        .show(ctx, |ui| map::map_canvas(state, ui));
}
