//! The map canvas, and its context menu.

use eframe::egui::{
    vec2, Area, Context, CursorIcon, Frame, Id, Order, Sense, Ui,
};

use crate::{
    gui::{input::handle_map_input, paint::to_egui_shapes},
    map::{render_map, MapInput, BACKGROUND_COLOR},
    state::State,
};

pub fn map_canvas(state: &mut State, ui: &mut Ui) {
    Frame::canvas(ui.style())
        .fill(BACKGROUND_COLOR)
        .show(ui, |ui| {
            let desired_size = vec2(ui.available_width(), ui.available_height());
            let (response, _painter) = ui.allocate_painter(desired_size, Sense::click_and_drag());
            let viewport = response.rect;

            ui.ctx()
                .input(|ip| handle_map_input(state, &response, ip));

            state.controller.sync(&state.features, state.data.len());

            if state.controller.hovered().is_some() {
                ui.ctx().set_cursor_icon(CursorIcon::PointingHand);
            }

            let input = MapInput {
                data: &state.data,
                features: &state.features,
                ghosts: &state.ghosts,
                view: state.controller.view(),
            };

            let frame = ui
                .ctx()
                .fonts(|fonts| render_map(&input, viewport, &state.config, fonts));
            let shapes = ui.ctx().fonts(|fonts| to_egui_shapes(&frame.shapes, fonts));

            ui.painter().with_clip_rect(viewport).extend(shapes);

            state.ui.last_frame = Some(frame);
        });

    context_menu(state, ui.ctx());
}

/// The right-click menu. Clicks on the map dismiss it through the controller; clicks elsewhere in
/// `handle_global`, which needs the menu's rect.
fn context_menu(state: &mut State, ctx: &Context) {
    let Some(menu) = state.controller.menu() else {
        state.ui.menu_rect = None;
        return;
    };

    let mut chosen = None;

    let area = Area::new(Id::new("map_context_menu"))
        .fixed_pos(menu.pos)
        .order(Order::Foreground)
        .show(ctx, |ui| {
            Frame::popup(ui.style()).show(ui, |ui| {
                for action in state.controller.menu_actions() {
                    if ui.button(action.to_string()).clicked() {
                        chosen = Some(action);
                    }
                }
            });
        });
    state.ui.menu_rect = Some(area.response.rect);

    if let Some(action) = chosen {
        let events = state
            .controller
            .context_action(action, &state.data, &state.features);
        state.handle_events(events);
    }
}
