//! Wires the reducer to its collaborators.
//!
//! The host calls [`Session::on_frame`] once per camera tick and
//! [`Session::click_at`] for real pointer clicks. Everything the reducer asks
//! for is forwarded to a [`Surface`] (the canvas) and a [`Ui`] (the widgets).

use tracing::{debug, warn};

use crate::error::Error;
use crate::interaction::{Action, Reducer, UiEffect};
use crate::storage::LocalStore;
use crate::types::{Color, ElementId, PaintStroke, Point};

/// The drawing surface the hand paints on.
pub trait Surface {
    fn paint(&mut self, stroke: &PaintStroke);
    fn clear(&mut self);
    /// PNG-encoded snapshot of the current drawing.
    fn export_bitmap(&self) -> Result<Vec<u8>, Error>;
    /// Draw a PNG over the surface, top-left aligned.
    fn load_bitmap(&mut self, png: &[u8]) -> Result<(), Error>;
}

/// The widget layer on top of the canvas.
pub trait Ui {
    fn show(&mut self, id: ElementId);
    fn hide(&mut self, id: ElementId);
    fn set_background(&mut self, id: ElementId, color: Color);
    /// Topmost visible element under a pixel.
    fn hit_test(&self, x: f32, y: f32) -> Option<ElementId>;
}

pub struct Session<S, U> {
    pub reducer: Reducer,
    pub surface: S,
    pub ui: U,
    store: LocalStore,
}

impl<S: Surface, U: Ui> Session<S, U> {
    pub fn new(reducer: Reducer, surface: S, ui: U, store: LocalStore) -> Self {
        Self { reducer, surface, ui, store }
    }

    /// One camera tick. Returns the action the reducer produced, after applying it.
    pub fn on_frame(&mut self, frame: &[Point]) -> Action {
        let action = self.reducer.on_frame(frame);
        match action {
            Action::None => {}
            Action::Paint(stroke) => self.surface.paint(&stroke),
            Action::DwellClick(at) => self.click_at(at.x, at.y),
        }
        action
    }

    /// Click whatever is under (x,y). Nothing there means nothing happens.
    pub fn click_at(&mut self, x: f32, y: f32) {
        match self.ui.hit_test(x, y) {
            Some(id) => self.click(id),
            None => debug!(x, y, "click hit no element"),
        }
    }

    /// Dispatch a click on a known element and apply its effects in order.
    pub fn click(&mut self, id: ElementId) {
        debug!(element = ?id, "ui click");
        for effect in self.reducer.on_ui_click(id) {
            if let Err(e) = self.apply(effect) {
                // A failed save/load must not stop the drawing session.
                warn!(error = %e, ?effect, "ui effect failed");
            }
        }
    }

    fn apply(&mut self, effect: UiEffect) -> Result<(), Error> {
        match effect {
            UiEffect::Show(id) => self.ui.show(id),
            UiEffect::Hide(id) => self.ui.hide(id),
            UiEffect::SetBackground(id, color) => self.ui.set_background(id, color),
            UiEffect::ClearCanvas => self.surface.clear(),
            UiEffect::ExportBitmap => {
                let png = self.surface.export_bitmap()?;
                self.store.save(&png)?;
            }
            UiEffect::LoadBitmap => {
                let png = self.store.load()?;
                self.surface.load_bitmap(&png)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::interaction::InteractionConfig;
    use crate::types::{Page, ScreenPoint};

    #[derive(Default)]
    struct Paper {
        strokes: Vec<PaintStroke>,
        cleared: usize,
    }

    impl Surface for Paper {
        fn paint(&mut self, stroke: &PaintStroke) {
            self.strokes.push(*stroke);
        }
        fn clear(&mut self) {
            self.cleared += 1;
            self.strokes.clear();
        }
        fn export_bitmap(&self) -> Result<Vec<u8>, Error> {
            Ok(vec![self.strokes.len() as u8])
        }
        fn load_bitmap(&mut self, png: &[u8]) -> Result<(), Error> {
            self.cleared = png[0] as usize;
            Ok(())
        }
    }

    /// Every element is clickable everywhere; a single target answers hit tests.
    #[derive(Default)]
    struct Board {
        under_cursor: Option<ElementId>,
        hidden: HashSet<ElementId>,
    }

    impl Ui for Board {
        fn show(&mut self, id: ElementId) {
            self.hidden.remove(&id);
        }
        fn hide(&mut self, id: ElementId) {
            self.hidden.insert(id);
        }
        fn set_background(&mut self, _id: ElementId, _color: Color) {}
        fn hit_test(&self, _x: f32, _y: f32) -> Option<ElementId> {
            self.under_cursor
        }
    }

    fn session(dir: &std::path::Path) -> Session<Paper, Board> {
        let reducer = Reducer::seeded(InteractionConfig::default(), 3);
        Session::new(reducer, Paper::default(), Board::default(), LocalStore::new(dir, "test"))
    }

    #[test]
    fn paint_actions_reach_the_surface() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let frame = vec![Point::xy(-0.5, 0.5); 50];
        for _ in 0..5 {
            s.on_frame(&frame);
        }
        assert_eq!(s.surface.strokes.len(), 5);
        assert_eq!(s.surface.strokes[0].at, ScreenPoint { x: 640.0, y: 360.0 });
    }

    #[test]
    fn dwell_click_on_empty_spot_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let frame = vec![Point::xy(-0.5, 0.5); 50];
        for _ in 0..30 {
            s.on_frame(&frame);
        }
        assert_eq!(s.reducer.state().page, Page::Canvas);
        assert_eq!(s.reducer.state().dwell_frames, 0);
    }

    #[test]
    fn dwell_click_opens_the_menu_under_the_hand() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.ui.under_cursor = Some(ElementId::ColorMenuButton);
        let frame = vec![Point::xy(-0.9, 0.1); 50];
        let clicks = (0..30)
            .filter(|_| matches!(s.on_frame(&frame), Action::DwellClick(_)))
            .count();
        assert_eq!(clicks, 1);
        assert_eq!(s.reducer.state().page, Page::ColorMenu);
        assert!(s.ui.hidden.contains(&ElementId::Canvas));
        // 29 paints before the click, none after it since we are in the menu now.
        assert_eq!(s.surface.strokes.len(), 29);
    }

    #[test]
    fn save_then_load_round_trips_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        for _ in 0..3 {
            s.on_frame(&vec![Point::xy(-0.5, 0.5); 50]);
        }
        s.click(ElementId::SaveButton);
        assert!(dir.path().join("test.png").exists());

        s.click(ElementId::LoadButton);
        assert_eq!(s.surface.cleared, 3);
    }

    #[test]
    fn load_without_a_saved_image_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        s.click(ElementId::LoadButton);
        assert_eq!(s.reducer.state().page, Page::Canvas);
    }
}
