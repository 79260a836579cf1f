//! Code related to mouse and keyboard input handling.

use eframe::egui::{Context, Event, InputState, Key, PointerButton, Response, Vec2};

use crate::{
    controller::{DragState, MapKey},
    state::State,
};

/// Hotkeys and file drops; these apply regardless of where the pointer is.
pub fn handle_global(state: &mut State, ctx: &Context) {
    let mut dropped = None;
    let mut events = Vec::new();

    // Don't steal keys from text fields.
    let keys_active = !ctx.wants_keyboard_input();

    ctx.input(|ip| {
        if let Some(file) = ip.raw.dropped_files.first() {
            dropped = file.path.clone();
        }

        // Presses on the map reach the controller through `handle_map_input`. Anywhere else, a
        // press outside the context menu dismisses it.
        if ip.pointer.any_pressed() {
            if let Some(pos) = ip.pointer.interact_pos() {
                let on_menu = state.ui.menu_rect.is_some_and(|r| r.contains(pos));
                let on_map = state
                    .ui
                    .last_frame
                    .as_ref()
                    .is_some_and(|f| f.viewport.contains(pos));

                if !on_menu && !on_map {
                    state.controller.close_menu();
                }
            }
        }

        if ip.key_pressed(Key::O) && ip.modifiers.command {
            state.ui.file_dialogs.load.pick_file();
        }

        if ip.key_pressed(Key::E) && ip.modifiers.command {
            state.ui.file_dialogs.export_svg.save_file();
        }

        if !keys_active {
            return;
        }

        let mut keys = Vec::new();
        if ip.key_pressed(Key::Escape) {
            keys.push(MapKey::Escape);
        }
        if ip.key_pressed(Key::Delete) || ip.key_pressed(Key::Backspace) {
            keys.push(MapKey::Delete);
        }
        // egui reports command + C as a copy event, rather than a key press.
        if ip.events.iter().any(|e| matches!(e, Event::Copy)) {
            keys.push(MapKey::Copy);
        }

        for key in keys {
            events.extend(state.controller.key_pressed(key, &state.data, &state.features));
        }
    });

    if let Some(path) = dropped {
        state.load_path(&path);
    }

    state.handle_events(events);
}

/// Pointer, wheel and pinch input over the map canvas. Hit testing runs against the previous
/// frame's layout, which is what the user is looking at.
pub fn handle_map_input(state: &mut State, response: &Response, ip: &InputState) {
    let viewport = response.rect;
    let seq_len = state.data.len();
    let layout = state
        .ui
        .last_frame
        .as_ref()
        .filter(|f| f.viewport == viewport)
        .and_then(|f| f.layout.as_ref());

    let ctrl = &mut state.controller;
    let pointer = ip.pointer.latest_pos();

    // Presses covered by another layer, eg the context menu, belong to it.
    if response.hovered() {
        if let Some(pos) = pointer {
            ctrl.pointer_moved(pos, layout);

            for button in [PointerButton::Primary, PointerButton::Secondary] {
                if ip.pointer.button_pressed(button) {
                    ctrl.pointer_pressed(pos, button, ip.modifiers, layout);
                }
            }

            let scroll = ip.smooth_scroll_delta;
            if scroll != Vec2::ZERO {
                ctrl.wheel(scroll, pos, ip.modifiers, viewport, seq_len);
            }

            ctrl.pinch_zoom(ip.zoom_delta(), pos, viewport, seq_len);
        }
    } else if let (Some(pos), DragState::DragSelecting { .. }) = (pointer, ctrl.drag()) {
        // Keep a drag-selection following the pointer outside the canvas.
        ctrl.pointer_moved(pos, layout);
    }

    if ip.pointer.button_released(PointerButton::Primary) {
        if let Some(pos) = pointer {
            ctrl.pointer_released(pos, layout);
        }
    }
}
