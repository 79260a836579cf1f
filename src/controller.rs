//! Pointer, wheel and keyboard handling for the map. This owns all view state that survives
//! between frames: the projection, the selection range, selected and hovered features, and the
//! context menu. Hit testing goes through the layout of the last rendered frame.

use eframe::egui::{Modifiers, PointerButton, Pos2, Rect, Vec2};

use crate::{
    map::{geometry::FrameLayout, MapView},
    misc_types::{Feature, FeatureId, SeqRange},
    projection::Projection,
    sequence::{SeqData, SeqTopology},
};

/// Zoom factor per pixel of vertical wheel delta, as an exponent.
pub const WHEEL_ZOOM_SPEED: f32 = 0.002;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// `anchor` is the position under the pointer when the drag started.
    DragSelecting { anchor: usize },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MenuTarget {
    Feature(FeatureId),
    Position(usize),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ContextMenu {
    /// Where the menu is anchored, in screen coordinates.
    pub pos: Pos2,
    pub target: MenuTarget,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ContextAction {
    CopySequence,
    Select,
    Edit,
    Delete,
    CopyPosition,
    CopySelection,
}

impl ContextAction {
    /// For display in the menu.
    pub fn to_string(self) -> String {
        match self {
            Self::CopySequence => "Copy sequence",
            Self::Select => "Select",
            Self::Edit => "Edit feature",
            Self::Delete => "Delete feature",
            Self::CopyPosition => "Copy position",
            Self::CopySelection => "Copy selection",
        }
        .to_owned()
    }
}

/// Keys the map responds to.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MapKey {
    Escape,
    /// Delete or Backspace.
    Delete,
    /// Command + C.
    Copy,
}

/// Requests leaving the map; the application acts on them.
#[derive(Clone, PartialEq, Debug)]
pub enum MapEvent {
    DeleteFeatures(Vec<FeatureId>),
    CopyText(String),
    EditFeature(FeatureId),
}

/// The selection a drag from `anchor` to `current` produces. Circular selections keep the
/// drag direction, so dragging clockwise through the origin selects across it.
fn drag_selection(anchor: usize, current: usize, topology: SeqTopology) -> Option<SeqRange> {
    match topology {
        SeqTopology::Circular => SeqRange::selection(anchor, current),
        SeqTopology::Linear => SeqRange::selection(anchor.min(current), anchor.max(current)),
    }
}

#[derive(Clone, Debug, Default)]
pub struct MapController {
    projection: Projection,
    selection: Option<SeqRange>,
    /// The first entry is the primary selection; it drives auto-centering and the tooltip.
    selected: Vec<FeatureId>,
    hovered: Option<FeatureId>,
    drag: DragState,
    menu: Option<ContextMenu>,
}

impl MapController {
    pub fn new(topology: SeqTopology) -> Self {
        Self {
            projection: Projection::new(topology),
            ..Default::default()
        }
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn selection(&self) -> Option<SeqRange> {
        self.selection
    }

    pub fn selected(&self) -> &[FeatureId] {
        &self.selected
    }

    pub fn hovered(&self) -> Option<FeatureId> {
        self.hovered
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn menu(&self) -> Option<ContextMenu> {
        self.menu
    }

    /// Close the context menu, eg on a click outside the map. Returns true if it was open.
    pub fn close_menu(&mut self) -> bool {
        let was_open = self.menu.take().is_some();
        if was_open {
            log::debug!("Context menu dismissed");
        }
        was_open
    }

    pub fn view(&self) -> MapView<'_> {
        MapView {
            projection: &self.projection,
            selection: self.selection,
            selected: &self.selected,
            hovered: self.hovered,
        }
    }

    fn topology(&self) -> SeqTopology {
        self.projection.topology()
    }

    fn clear_selection(&mut self) {
        self.selection = None;
        self.selected.clear();
    }

    pub fn select_feature(&mut self, id: FeatureId) {
        self.selection = None;
        self.selected = vec![id];
    }

    pub fn pointer_moved(&mut self, pos: Pos2, layout: Option<&FrameLayout>) {
        let Some(layout) = layout else {
            self.hovered = None;
            return;
        };

        self.hovered = layout.feature_at(pos);

        if let DragState::DragSelecting { anchor } = self.drag {
            self.selection = drag_selection(anchor, layout.position_at(pos), self.topology());
        }
    }

    pub fn pointer_pressed(
        &mut self,
        pos: Pos2,
        button: PointerButton,
        modifiers: Modifiers,
        layout: Option<&FrameLayout>,
    ) {
        // Any click dismisses an open menu. A right click then opens one at the new target; other
        // clicks do nothing else.
        if self.menu.take().is_some() && button != PointerButton::Secondary {
            return;
        }

        let Some(layout) = layout else {
            return;
        };

        let feature = layout.feature_at(pos);

        match button {
            PointerButton::Secondary => {
                let target = match feature {
                    Some(id) => MenuTarget::Feature(id),
                    None => MenuTarget::Position(layout.position_at(pos)),
                };
                log::debug!("Opening context menu for {target:?}");
                self.menu = Some(ContextMenu { pos, target });
            }
            PointerButton::Primary => {
                if let Some(id) = feature {
                    if modifiers.shift || modifiers.command {
                        if let Some(i) = self.selected.iter().position(|s| *s == id) {
                            self.selected.remove(i);
                        } else {
                            self.selected.push(id);
                        }
                    } else if self.selected == [id] {
                        self.selected.clear();
                    } else {
                        self.select_feature(id);
                    }
                    self.selection = None;
                } else if layout.on_backbone(pos) {
                    let anchor = layout.position_at(pos);
                    log::debug!("Drag-select started at {anchor}");

                    self.clear_selection();
                    self.drag = DragState::DragSelecting { anchor };
                } else {
                    self.clear_selection();
                }
            }
            _ => (),
        }
    }

    pub fn pointer_released(&mut self, pos: Pos2, layout: Option<&FrameLayout>) {
        let DragState::DragSelecting { anchor } = self.drag else {
            return;
        };
        self.drag = DragState::Idle;

        if let Some(layout) = layout {
            self.selection = drag_selection(anchor, layout.position_at(pos), self.topology());
        }
        log::debug!("Drag-select finished: {:?}", self.selection);
    }

    /// Vertical scrolling zooms at the pointer. Horizontal scrolling, or vertical with shift held,
    /// rotates the circle or pans the linear view.
    pub fn wheel(
        &mut self,
        delta: Vec2,
        pos: Pos2,
        modifiers: Modifiers,
        viewport: Rect,
        seq_len: usize,
    ) {
        let (zoom_amount, side_amount) = if modifiers.shift {
            (0., delta.x + delta.y)
        } else {
            (delta.y, delta.x)
        };

        if zoom_amount != 0. {
            let factor = (zoom_amount * WHEEL_ZOOM_SPEED).exp();
            self.projection.zoom_at(factor, pos, viewport, seq_len);
        }

        if side_amount != 0. {
            match self.topology() {
                SeqTopology::Circular => self.projection.rotate_by(side_amount),
                SeqTopology::Linear => self.projection.pan_by(-side_amount, viewport, seq_len),
            }
        }
    }

    /// Pinch or ctrl-scroll zoom; `factor` is multiplicative.
    pub fn pinch_zoom(&mut self, factor: f32, pos: Pos2, viewport: Rect, seq_len: usize) {
        if factor != 1. {
            self.projection.zoom_at(factor, pos, viewport, seq_len);
        }
    }

    /// The sequence text to copy: the selected range, or else the primary selected feature.
    pub fn copy_text(&self, data: &SeqData, features: &[Feature]) -> Option<String> {
        let range = match self.selection {
            Some(sel) => sel,
            None => {
                let id = self.selected.first()?;
                features.iter().find(|f| f.id == *id)?.range
            }
        };

        let text = data.subseq(range);
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn key_pressed(
        &mut self,
        key: MapKey,
        data: &SeqData,
        features: &[Feature],
    ) -> Vec<MapEvent> {
        let mut result = Vec::new();

        match key {
            MapKey::Escape => {
                if self.menu.take().is_none() {
                    self.clear_selection();
                    self.hovered = None;
                    self.drag = DragState::Idle;
                }
            }
            MapKey::Delete => {
                if !self.selected.is_empty() {
                    result.push(MapEvent::DeleteFeatures(self.selected.clone()));
                }
            }
            MapKey::Copy => {
                if let Some(text) = self.copy_text(data, features) {
                    result.push(MapEvent::CopyText(text));
                }
            }
        }

        result
    }

    /// Actions the menu offers for its target.
    pub fn menu_actions(&self) -> Vec<ContextAction> {
        match self.menu.map(|m| m.target) {
            Some(MenuTarget::Feature(_)) => vec![
                ContextAction::CopySequence,
                ContextAction::Select,
                ContextAction::Edit,
                ContextAction::Delete,
            ],
            Some(MenuTarget::Position(_)) => {
                let mut result = vec![ContextAction::CopyPosition];
                if self.selection.is_some() {
                    result.push(ContextAction::CopySelection);
                }
                result
            }
            None => Vec::new(),
        }
    }

    /// Run a context menu action, and close the menu.
    pub fn context_action(
        &mut self,
        action: ContextAction,
        data: &SeqData,
        features: &[Feature],
    ) -> Vec<MapEvent> {
        let Some(menu) = self.menu.take() else {
            return Vec::new();
        };

        let mut result = Vec::new();

        match (action, menu.target) {
            (ContextAction::CopySequence, MenuTarget::Feature(id)) => {
                if let Some(feature) = features.iter().find(|f| f.id == id) {
                    let text = data.subseq(feature.range);
                    if !text.is_empty() {
                        result.push(MapEvent::CopyText(text));
                    }
                }
            }
            (ContextAction::Select, MenuTarget::Feature(id)) => self.select_feature(id),
            (ContextAction::Edit, MenuTarget::Feature(id)) => {
                result.push(MapEvent::EditFeature(id))
            }
            (ContextAction::Delete, MenuTarget::Feature(id)) => {
                result.push(MapEvent::DeleteFeatures(vec![id]))
            }
            // Positions are shown 1-based.
            (ContextAction::CopyPosition, MenuTarget::Position(pos)) => {
                result.push(MapEvent::CopyText((pos + 1).to_string()))
            }
            (ContextAction::CopySelection, _) => {
                if let Some(sel) = self.selection {
                    let text = data.subseq(sel);
                    if !text.is_empty() {
                        result.push(MapEvent::CopyText(text));
                    }
                }
            }
            (action, target) => {
                log::warn!("Context action {action:?} doesn't apply to {target:?}");
            }
        }

        result
    }

    /// Run once per frame, before drawing: drop references to features that no longer exist,
    /// re-clamp the projection, and auto-center on a newly selected feature.
    pub fn sync(&mut self, features: &[Feature], seq_len: usize) {
        let exists = |id: &FeatureId| features.iter().any(|f| f.id == *id);

        self.selected.retain(exists);
        if !self.hovered.as_ref().is_some_and(exists) {
            self.hovered = None;
        }
        if let Some(ContextMenu {
            target: MenuTarget::Feature(id),
            ..
        }) = self.menu
        {
            if !exists(&id) {
                self.menu = None;
            }
        }

        self.projection.sync(seq_len);

        let primary = self
            .selected
            .first()
            .and_then(|id| features.iter().find(|f| f.id == *id));

        if self.projection.auto_center(primary, seq_len) {
            log::debug!("Centered on feature {:?}", primary.map(|f| f.id));
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;
    use crate::{
        map::{geometry::MapGeometry, MapConfig},
        misc_types::FeatureKind,
        projection::CircleFrame,
    };

    fn viewport() -> Rect {
        Rect::from_min_size(Pos2::ZERO, vec2(800., 600.))
    }

    fn setup() -> (SeqData, Vec<Feature>, MapController) {
        let data = SeqData::new("p", &"AACCGGTT".repeat(125), SeqTopology::Circular);
        let features = vec![
            Feature::new(1, 100, 300, FeatureKind::CodingRegion),
            Feature::new(2, 600, 700, FeatureKind::Promoter),
        ];
        (data, features, MapController::new(SeqTopology::Circular))
    }

    fn layout(ctrl: &MapController, data: &SeqData, features: &[Feature]) -> FrameLayout {
        FrameLayout::new(
            ctrl.projection(),
            viewport(),
            data,
            features,
            &MapConfig::default(),
        )
    }

    fn circle(layout: &FrameLayout) -> CircleFrame {
        match &layout.geometry {
            MapGeometry::Circle(f) => f.clone(),
            MapGeometry::Linear(_) => panic!("Expected a circular frame"),
        }
    }

    fn click(ctrl: &mut MapController, pos: Pos2, layout: &FrameLayout, modifiers: Modifiers) {
        ctrl.pointer_pressed(pos, PointerButton::Primary, modifiers, Some(layout));
        ctrl.pointer_released(pos, Some(layout));
    }

    #[test]
    fn test_drag_select_on_backbone() {
        let (data, features, mut ctrl) = setup();
        let layout = layout(&ctrl, &data, &features);
        let frame = circle(&layout);

        let down = frame.point_at(400., frame.radius + 2.);
        let up = frame.point_at(520., frame.radius - 3.);

        ctrl.pointer_pressed(down, PointerButton::Primary, Modifiers::NONE, Some(&layout));
        assert_eq!(ctrl.drag(), DragState::DragSelecting { anchor: 400 });

        ctrl.pointer_moved(frame.point_at(450., frame.radius), Some(&layout));
        assert_eq!(ctrl.selection(), Some(SeqRange::new(400, 450)));

        ctrl.pointer_released(up, Some(&layout));
        assert_eq!(ctrl.drag(), DragState::Idle);
        assert_eq!(ctrl.selection(), Some(SeqRange::new(400, 520)));
    }

    #[test]
    fn test_drag_in_place_selects_nothing() {
        let (data, features, mut ctrl) = setup();
        let layout = layout(&ctrl, &data, &features);
        let frame = circle(&layout);

        click(&mut ctrl, frame.point_at(400., frame.radius), &layout, Modifiers::NONE);
        assert_eq!(ctrl.selection(), None);
    }

    #[test]
    fn test_drag_through_origin_wraps() {
        let (data, features, mut ctrl) = setup();
        let layout = layout(&ctrl, &data, &features);
        let frame = circle(&layout);

        ctrl.pointer_pressed(
            frame.point_at(950., frame.radius),
            PointerButton::Primary,
            Modifiers::NONE,
            Some(&layout),
        );
        ctrl.pointer_released(frame.point_at(30., frame.radius), Some(&layout));

        let sel = ctrl.selection().unwrap();
        assert_eq!(sel, SeqRange::new(950, 30));
        assert_eq!(sel.len(1_000, SeqTopology::Circular), 80);
    }

    #[test]
    fn test_linear_drag_is_normalized() {
        let data = SeqData::new("l", &"ACGT".repeat(250), SeqTopology::Linear);
        let mut ctrl = MapController::new(SeqTopology::Linear);
        let layout = FrameLayout::new(
            ctrl.projection(),
            viewport(),
            &data,
            &[],
            &MapConfig::default(),
        );
        let MapGeometry::Linear(frame) = &layout.geometry else {
            panic!("Expected a linear frame");
        };

        let y = frame.backbone_y;
        ctrl.pointer_pressed(
            pos2(frame.position_to_x(600.), y),
            PointerButton::Primary,
            Modifiers::NONE,
            Some(&layout),
        );
        ctrl.pointer_released(pos2(frame.position_to_x(200.), y), Some(&layout));

        assert_eq!(ctrl.selection(), Some(SeqRange::new(200, 600)));
    }

    #[test]
    fn test_click_feature_toggles_selection() {
        let (data, features, mut ctrl) = setup();
        let layout = layout(&ctrl, &data, &features);
        let frame = circle(&layout);

        let on_1 = frame.point_at(200., layout.feature(1).unwrap().mid());
        let on_2 = frame.point_at(650., layout.feature(2).unwrap().mid());

        click(&mut ctrl, on_1, &layout, Modifiers::NONE);
        assert_eq!(ctrl.selected(), &[1]);

        click(&mut ctrl, on_2, &layout, Modifiers::SHIFT);
        assert_eq!(ctrl.selected(), &[1, 2]);

        click(&mut ctrl, on_2, &layout, Modifiers::NONE);
        assert_eq!(ctrl.selected(), &[2]);

        // Clicking the sole selected feature deselects it.
        click(&mut ctrl, on_2, &layout, Modifiers::NONE);
        assert!(ctrl.selected().is_empty());

        // Empty space clears.
        click(&mut ctrl, on_1, &layout, Modifiers::NONE);
        click(&mut ctrl, frame.center, &layout, Modifiers::NONE);
        assert!(ctrl.selected().is_empty());
    }

    #[test]
    fn test_context_menu_and_escape_priority() {
        let (data, features, mut ctrl) = setup();
        let layout = layout(&ctrl, &data, &features);
        let frame = circle(&layout);
        let on_1 = frame.point_at(200., layout.feature(1).unwrap().mid());

        click(&mut ctrl, on_1, &layout, Modifiers::NONE);
        ctrl.pointer_pressed(on_1, PointerButton::Secondary, Modifiers::NONE, Some(&layout));
        assert_eq!(ctrl.menu().unwrap().target, MenuTarget::Feature(1));
        assert_eq!(ctrl.menu_actions().len(), 4);

        // Escape closes the menu first, and keeps the selection.
        ctrl.key_pressed(MapKey::Escape, &data, &features);
        assert!(ctrl.menu().is_none());
        assert_eq!(ctrl.selected(), &[1]);

        ctrl.key_pressed(MapKey::Escape, &data, &features);
        assert!(ctrl.selected().is_empty());
    }

    #[test]
    fn test_click_dismisses_menu_only() {
        let (data, features, mut ctrl) = setup();
        let layout = layout(&ctrl, &data, &features);
        let frame = circle(&layout);
        let on_1 = frame.point_at(200., layout.feature(1).unwrap().mid());

        ctrl.pointer_pressed(
            frame.center,
            PointerButton::Secondary,
            Modifiers::NONE,
            Some(&layout),
        );
        assert!(matches!(
            ctrl.menu().unwrap().target,
            MenuTarget::Position(_)
        ));

        click(&mut ctrl, on_1, &layout, Modifiers::NONE);
        assert!(ctrl.menu().is_none());
        assert!(ctrl.selected().is_empty());
    }

    #[test]
    fn test_right_click_moves_open_menu() {
        let (data, features, mut ctrl) = setup();
        let layout = layout(&ctrl, &data, &features);
        let frame = circle(&layout);
        let on_1 = frame.point_at(200., layout.feature(1).unwrap().mid());
        let on_2 = frame.point_at(650., layout.feature(2).unwrap().mid());

        ctrl.pointer_pressed(on_1, PointerButton::Secondary, Modifiers::NONE, Some(&layout));
        assert_eq!(ctrl.menu().unwrap().target, MenuTarget::Feature(1));

        ctrl.pointer_pressed(on_2, PointerButton::Secondary, Modifiers::NONE, Some(&layout));
        let menu = ctrl.menu().unwrap();
        assert_eq!(menu.target, MenuTarget::Feature(2));
        assert_eq!(menu.pos, on_2);

        assert!(ctrl.close_menu());
        assert!(!ctrl.close_menu());
        assert!(ctrl.menu().is_none());
        assert!(ctrl.selected().is_empty());
    }

    #[test]
    fn test_menu_actions() {
        let (data, features, mut ctrl) = setup();
        let layout = layout(&ctrl, &data, &features);
        let frame = circle(&layout);
        let on_2 = frame.point_at(650., layout.feature(2).unwrap().mid());

        ctrl.pointer_pressed(on_2, PointerButton::Secondary, Modifiers::NONE, Some(&layout));
        let events = ctrl.context_action(ContextAction::CopySequence, &data, &features);
        assert_eq!(events, vec![MapEvent::CopyText(data.subseq(SeqRange::new(600, 700)))]);
        assert!(ctrl.menu().is_none());

        ctrl.pointer_pressed(on_2, PointerButton::Secondary, Modifiers::NONE, Some(&layout));
        let events = ctrl.context_action(ContextAction::Delete, &data, &features);
        assert_eq!(events, vec![MapEvent::DeleteFeatures(vec![2])]);

        ctrl.pointer_pressed(on_2, PointerButton::Secondary, Modifiers::NONE, Some(&layout));
        let events = ctrl.context_action(ContextAction::Edit, &data, &features);
        assert_eq!(events, vec![MapEvent::EditFeature(2)]);

        let on_backbone = frame.point_at(10., frame.radius);
        ctrl.pointer_pressed(
            on_backbone,
            PointerButton::Secondary,
            Modifiers::NONE,
            Some(&layout),
        );
        let events = ctrl.context_action(ContextAction::CopyPosition, &data, &features);
        assert_eq!(events, vec![MapEvent::CopyText("11".to_owned())]);
    }

    #[test]
    fn test_copy_respects_wraparound() {
        let data = SeqData::new("p", "AACCGGTT", SeqTopology::Circular);
        let mut ctrl = MapController::new(SeqTopology::Circular);
        ctrl.selection = Some(SeqRange::new(6, 2));

        let events = ctrl.key_pressed(MapKey::Copy, &data, &[]);
        assert_eq!(events, vec![MapEvent::CopyText("TTAA".to_owned())]);
    }

    #[test]
    fn test_copy_falls_back_to_feature() {
        let data = SeqData::new("p", "AACCGGTT", SeqTopology::Circular);
        let features = vec![Feature::new(4, 7, 1, FeatureKind::Gene)];
        let mut ctrl = MapController::new(SeqTopology::Circular);
        ctrl.select_feature(4);

        assert_eq!(ctrl.copy_text(&data, &features), Some("TA".to_owned()));
    }

    #[test]
    fn test_delete_requires_selection() {
        let (data, features, mut ctrl) = setup();
        assert!(ctrl.key_pressed(MapKey::Delete, &data, &features).is_empty());

        ctrl.select_feature(2);
        assert_eq!(
            ctrl.key_pressed(MapKey::Delete, &data, &features),
            vec![MapEvent::DeleteFeatures(vec![2])]
        );
    }

    #[test]
    fn test_sync_drops_missing_and_centers() {
        let (_, features, mut ctrl) = setup();
        ctrl.selected = vec![9, 2];
        ctrl.sync(&features, 1_000);

        assert_eq!(ctrl.selected(), &[2]);
        // Feature 2's midpoint, 650, is now at the top.
        let angle = ctrl.projection().rotation() + 650. / 1_000. * core::f32::consts::TAU;
        assert!((crate::util::normalize_angle(angle + 0.001) - 0.001).abs() < 1e-3);
    }

    #[test]
    fn test_wheel_zooms_and_rotates() {
        let (_, _, mut ctrl) = setup();
        let p = pos2(400., 100.);

        ctrl.wheel(vec2(0., 200.), p, Modifiers::NONE, viewport(), 1_000);
        assert!(ctrl.projection().zoom() > 1.);

        let zoom = ctrl.projection().zoom();
        let rotation = ctrl.projection().rotation();
        ctrl.wheel(vec2(0., 50.), p, Modifiers::SHIFT, viewport(), 1_000);
        assert_eq!(ctrl.projection().zoom(), zoom);
        assert_ne!(ctrl.projection().rotation(), rotation);
    }
}
