// Disables the terminal window on Windows, in release mode.
#![cfg_attr(
    all(not(debug_assertions), target_os = "windows"),
    windows_subsystem = "windows"
)]

//! An interactive map of an annotated circular or linear sequence: features on tracks around a
//! backbone, with labels, a ruler, and sequence letters at high zoom.

use std::{env, path::Path};

use eframe::egui;

use crate::{
    file_io::save::{load_prefs, DEFAULT_PREFS_FILE},
    gui::{WINDOW_HEIGHT, WINDOW_WIDTH},
    state::State,
};

mod amino_acids;
mod controller;
mod file_io;
mod gui;
mod labels;
mod map;
mod misc_types;
mod projection;
mod sequence;
mod state;
mod track_layout;
mod util;

fn main() -> eframe::Result {
    env_logger::init();

    let config = load_prefs(Path::new(DEFAULT_PREFS_FILE));
    let mut state = State::new(config);

    // If launched with a path argument, eg from a file association, open that document.
    let args: Vec<String> = env::args().collect();
    if args.len() > 1 {
        state.load_path(Path::new(&args[1]));
    }

    let window_title = state.window_title();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT]),
        ..Default::default()
    };

    eframe::run_native(
        &window_title,
        options,
        Box::new(|_cc| Ok(Box::new(state))),
    )
}
