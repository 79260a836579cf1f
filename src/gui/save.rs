//! GUI code for opening documents and exporting the map.

use eframe::egui::Ui;

use crate::{file_io::svg::export_svg, state::State};

/// Open and export buttons, and the dialogs behind them.
pub fn save_section(state: &mut State, ui: &mut Ui) {
    if ui
        .button("Open")
        .on_hover_text("Load a map document, in JSON format. (Ctrl + o)")
        .clicked()
    {
        state.ui.file_dialogs.load.pick_file();
    }

    let can_export = state.ui.last_frame.is_some() && !state.data.is_empty();
    if ui
        .add_enabled(can_export, eframe::egui::Button::new("Export SVG"))
        .on_hover_text("Save the map as currently shown, as an SVG image. (Ctrl + e)")
        .clicked()
    {
        state.ui.file_dialogs.export_svg.save_file();
    }

    let ctx = ui.ctx();
    state.ui.file_dialogs.load.update(ctx);
    state.ui.file_dialogs.export_svg.update(ctx);

    if let Some(path) = state.ui.file_dialogs.load.take_picked() {
        state.load_path(&path);
    } else if let Some(path) = state.ui.file_dialogs.export_svg.take_picked() {
        let Some(frame) = &state.ui.last_frame else {
            return;
        };

        state.ui.status = match export_svg(frame, &path) {
            Ok(()) => format!("Exported {}", path.display()),
            Err(e) => {
                log::error!("Error exporting SVG to {}: {e}", path.display());
                format!("Error exporting SVG: {e}")
            }
        };
    }
}
