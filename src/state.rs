//! Application state: the loaded document, display preferences, and the map controller.

use std::path::{Path, PathBuf};

use copypasta::{ClipboardContext, ClipboardProvider};
use eframe::egui::{Context, Rect, ViewportCommand};
use egui_file_dialog::FileDialog;

use crate::{
    controller::{MapController, MapEvent},
    file_io::{
        load_map_document, name_from_path,
        save::{save_prefs, DEFAULT_PREFS_FILE, DEFAULT_SVG_FILE},
        LoadedMap,
    },
    gui,
    map::{MapConfig, MapFrame},
    misc_types::{Feature, FeatureId, GhostInterval},
    sequence::SeqData,
};

pub const WINDOW_TITLE: &str = "Plasmap";

pub struct FileDialogs {
    pub load: FileDialog,
    pub export_svg: FileDialog,
}

impl Default for FileDialogs {
    fn default() -> Self {
        Self {
            load: FileDialog::new(),
            export_svg: FileDialog::new().default_file_name(DEFAULT_SVG_FILE),
        }
    }
}

/// State that doesn't persist between sessions.
#[derive(Default)]
pub struct StateUi {
    pub file_dialogs: FileDialogs,
    /// The last frame drawn. Hit testing for this frame's input runs against it, and SVG export
    /// writes it.
    pub last_frame: Option<MapFrame>,
    /// The feature an edit was requested for; shown in the side panel.
    pub editing: Option<FeatureId>,
    /// Shown in the status bar.
    pub status: String,
    /// Where the context menu was drawn last frame, while it's open.
    pub menu_rect: Option<Rect>,
}

#[derive(Default)]
pub struct State {
    pub data: SeqData,
    pub features: Vec<Feature>,
    pub ghosts: Vec<GhostInterval>,
    pub path_loaded: Option<PathBuf>,
    pub config: MapConfig,
    pub controller: MapController,
    pub ui: StateUi,
    /// Set when the title should be updated next frame.
    pub title_dirty: bool,
}

impl eframe::App for State {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        if self.title_dirty {
            ctx.send_viewport_cmd(ViewportCommand::Title(self.window_title()));
            self.title_dirty = false;
        }

        let config_prev = self.config.clone();

        gui::draw(self, ctx);

        if self.config != config_prev {
            save_prefs(Path::new(DEFAULT_PREFS_FILE), &self.config);
        }
    }
}

impl State {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn window_title(&self) -> String {
        if self.data.name.is_empty() {
            WINDOW_TITLE.to_owned()
        } else {
            format!("{} - {WINDOW_TITLE}", self.data.name)
        }
    }

    /// Replace the current document. View state is reset, as positions and ids refer to the old
    /// sequence.
    pub fn load(&mut self, loaded: LoadedMap, path: Option<&Path>) {
        let LoadedMap {
            mut data,
            features,
            ghosts,
        } = loaded;

        if data.name.is_empty() {
            if let Some(p) = path {
                data.name = name_from_path(p);
            }
        }

        self.controller = MapController::new(data.topology);
        self.data = data;
        self.features = features;
        self.ghosts = ghosts;
        self.path_loaded = path.map(|p| p.to_owned());
        self.ui.last_frame = None;
        self.ui.editing = None;
        self.ui.status = format!(
            "Loaded {}: {} features",
            self.data.name,
            self.features.len()
        );
        self.title_dirty = true;
    }

    /// Load a map document; on failure, log it and keep the current document.
    pub fn load_path(&mut self, path: &Path) {
        match load_map_document(path) {
            Ok(loaded) => self.load(loaded, Some(path)),
            Err(e) => {
                log::error!("{e}");
                self.ui.status = e.to_string();
            }
        }
    }

    /// Act on requests from the map.
    pub fn handle_events(&mut self, events: Vec<MapEvent>) {
        for event in events {
            match event {
                MapEvent::DeleteFeatures(ids) => {
                    let count_prev = self.features.len();
                    self.features.retain(|f| !ids.contains(&f.id));

                    log::info!("Deleted {} features", count_prev - self.features.len());
                    self.ui.status = format!("Deleted {} features", count_prev - self.features.len());

                    if self.ui.editing.is_some_and(|id| ids.contains(&id)) {
                        self.ui.editing = None;
                    }
                }
                MapEvent::CopyText(text) => {
                    let len = text.len();
                    match copy_to_clipboard(text) {
                        Ok(()) => self.ui.status = format!("Copied {len} bp"),
                        Err(e) => {
                            log::error!("Unable to copy to the clipboard: {e}");
                            self.ui.status = "Unable to copy to the clipboard".to_owned();
                        }
                    }
                }
                MapEvent::EditFeature(id) => {
                    log::info!("Edit requested for feature {id}");
                    self.ui.editing = Some(id);
                }
            }
        }
    }
}

fn copy_to_clipboard(text: String) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut ctx = ClipboardContext::new()?;
    ctx.set_contents(text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{misc_types::FeatureKind, sequence::SeqTopology};

    fn loaded() -> LoadedMap {
        LoadedMap {
            data: SeqData::new("", "ACGTACGTACGT", SeqTopology::Circular),
            features: vec![
                Feature::new(1, 0, 4, FeatureKind::Gene),
                Feature::new(2, 4, 8, FeatureKind::Promoter),
                Feature::new(3, 8, 2, FeatureKind::Ori),
            ],
            ghosts: Vec::new(),
        }
    }

    #[test]
    fn test_load_names_from_path() {
        let mut state = State::default();
        state.load(loaded(), Some(Path::new("/tmp/pUC19.json")));

        assert_eq!(state.data.name, "pUC19");
        assert_eq!(state.window_title(), "pUC19 - Plasmap");
        assert!(state.title_dirty);
    }

    #[test]
    fn test_delete_and_edit_events() {
        let mut state = State::default();
        state.load(loaded(), None);

        state.handle_events(vec![MapEvent::EditFeature(3)]);
        assert_eq!(state.ui.editing, Some(3));

        state.handle_events(vec![MapEvent::DeleteFeatures(vec![1, 3])]);
        let ids: Vec<_> = state.features.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![2]);
        assert_eq!(state.ui.editing, None);
    }
}
