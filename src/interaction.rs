//! Gesture-to-interaction reducer.
//!
//! Turns each aggregated depth frame into at most one [`Action`]: a paint dab,
//! a synthetic dwell click, or nothing. Page changes never come from frames;
//! they happen only when the host reports a UI click via
//! [`Reducer::on_ui_click`], which answers with the [`UiEffect`]s to apply.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, info};

use crate::aggregate::{aggregate, DEFAULT_MIN_POINTS};
use crate::types::{Centroid, Color, ElementId, Page, PaintStroke, Point, ScreenPoint};

/// Brush size range while painting, in pixels: [MIN, MIN + SPAN).
pub const BRUSH_MIN_RADIUS: f32 = 5.0;
pub const BRUSH_RADIUS_SPAN: f32 = 30.0;
/// Fixed eraser dab size, in pixels.
pub const ERASER_RADIUS: f32 = 30.0;

/// How the dwell counter treats a moving hand.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DwellPolicy {
    /// Any valid frame counts toward the dwell, wherever the hand is.
    Presence,
    /// A jump larger than `max_displacement` meters starts a new episode.
    Stable { max_displacement: f64 },
}

/// Thresholds for the reducer. Defaults: 40 points, 30 Hz, 1 second to click.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Frames with this many points or fewer are ignored.
    pub min_points: usize,
    /// Camera refresh rate; dwell time is counted in frames of this rate.
    pub fps: f64,
    pub seconds_to_click: f64,
    pub dwell_policy: DwellPolicy,
    /// Canvas size the cursor is mapped onto.
    pub canvas_width: usize,
    pub canvas_height: usize,
    /// Color used when erasing and after a clear.
    pub background: Color,
    /// Active color at startup and after a clear.
    pub default_color: Color,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            fps: 30.0,
            seconds_to_click: 1.0,
            dwell_policy: DwellPolicy::Presence,
            canvas_width: 1280,
            canvas_height: 720,
            background: Color::WHITE,
            default_color: Color::BLACK,
        }
    }
}

impl InteractionConfig {
    /// Consecutive valid frames needed for a synthetic click (never less than 1).
    pub fn frames_to_click(&self) -> u32 {
        ((self.seconds_to_click * self.fps).ceil() as u32).max(1)
    }
}

/// Everything the reducer remembers between frames.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionState {
    pub page: Page,
    /// Last valid centroid; None while nobody is touching.
    pub cursor: Option<Centroid>,
    pub dwell_frames: u32,
    pub active_color: Color,
    pub is_erasing: bool,
}

impl InteractionState {
    pub fn new(default_color: Color) -> Self {
        Self {
            page: Page::Canvas,
            cursor: None,
            dwell_frames: 0,
            active_color: default_color,
            is_erasing: false,
        }
    }
}

/// What one frame asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    None,
    /// Dab the canvas.
    Paint(PaintStroke),
    /// Click whatever element sits under this pixel.
    DwellClick(ScreenPoint),
}

/// What one UI click asks the host to do, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEffect {
    Show(ElementId),
    Hide(ElementId),
    SetBackground(ElementId, Color),
    ClearCanvas,
    ExportBitmap,
    LoadBitmap,
}

/// Owns the interaction state; the only way to mutate it.
/// Takes `&mut self` everywhere, so frame and click handling cannot overlap.
pub struct Reducer {
    config: InteractionConfig,
    state: InteractionState,
    rng: StdRng,
}

impl Reducer {
    pub fn new(config: InteractionConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic brush jitter, for tests and replays.
    pub fn seeded(config: InteractionConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: InteractionConfig, rng: StdRng) -> Self {
        let state = InteractionState::new(config.default_color);
        Self { config, state, rng }
    }

    pub fn state(&self) -> &InteractionState {
        &self.state
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    /// Cursor mapped onto the canvas, if someone is touching.
    pub fn cursor_on_screen(&self) -> Option<ScreenPoint> {
        self.state
            .cursor
            .map(|c| c.to_screen(self.config.canvas_width, self.config.canvas_height))
    }

    /// Dwell progress in [0, 1], for the HUD.
    pub fn dwell_progress(&self) -> f32 {
        self.state.dwell_frames as f32 / self.config.frames_to_click() as f32
    }

    /// Feed one camera frame.
    pub fn on_frame(&mut self, frame: &[Point]) -> Action {
        // 1) No hand (or too small a cluster): forget the cursor and the dwell.
        let Some(centroid) = aggregate(frame, self.config.min_points) else {
            self.state.dwell_frames = 0;
            self.state.cursor = None;
            return Action::None;
        };

        // 2) Optional stability check against the previous cursor.
        if let (DwellPolicy::Stable { max_displacement }, Some(prev)) =
            (self.config.dwell_policy, self.state.cursor)
        {
            let dx = centroid.x - prev.x;
            let dy = centroid.y - prev.y;
            if (dx * dx + dy * dy).sqrt() > max_displacement {
                self.state.dwell_frames = 0;
            }
        }

        self.state.cursor = Some(centroid);
        self.state.dwell_frames += 1;
        let at = centroid.to_screen(self.config.canvas_width, self.config.canvas_height);

        // 3) Held long enough: click once, then start counting again.
        if self.state.dwell_frames >= self.config.frames_to_click() {
            self.state.dwell_frames = 0;
            debug!(x = at.x, y = at.y, page = self.state.page.as_str(), "dwell click");
            return Action::DwellClick(at);
        }

        // 4) Only the canvas page paints.
        if self.state.page != Page::Canvas {
            return Action::None;
        }
        Action::Paint(self.brush_stroke(at))
    }

    fn brush_stroke(&mut self, at: ScreenPoint) -> PaintStroke {
        if self.state.is_erasing {
            return PaintStroke {
                at,
                radius: ERASER_RADIUS,
                color: self.config.background,
                opacity: 1.0,
            };
        }
        PaintStroke {
            at,
            radius: BRUSH_MIN_RADIUS + self.rng.gen_range(0.0..BRUSH_RADIUS_SPAN),
            color: self.state.active_color,
            opacity: self.rng.gen_range(0.0..1.0),
        }
    }

    /// Handle a click on a UI element (real or synthetic).
    /// Always resets the dwell so the same spot cannot click twice in a row.
    pub fn on_ui_click(&mut self, target: ElementId) -> Vec<UiEffect> {
        use ElementId::*;
        use UiEffect::*;

        self.state.dwell_frames = 0;
        let before = self.state.page;

        let effects = match target {
            ColorMenuButton => self.toggle_color_menu(),
            MainMenuButton if self.state.page == Page::Canvas => {
                self.state.page = Page::MainMenu;
                vec![
                    Hide(Canvas),
                    Hide(ColorMenuButton),
                    Hide(MainMenuButton),
                    Show(BackButton),
                    Show(MainMenu),
                ]
            }
            MainMenuButton => Vec::new(),
            BackButton => {
                let mut effects = self.toggle_color_menu();
                effects.push(Show(ColorMenuButton));
                effects
            }
            SaveButton => vec![ExportBitmap],
            LoadButton => vec![LoadBitmap],
            ClearButton => {
                self.state.active_color = self.config.default_color;
                vec![
                    ClearCanvas,
                    SetBackground(ColorMenuButton, self.config.default_color),
                ]
            }
            EraserButton => {
                self.state.is_erasing = true;
                Vec::new()
            }
            Swatch(color) => {
                self.state.active_color = color;
                self.state.is_erasing = false;
                vec![SetBackground(ColorMenuButton, color)]
            }
            Canvas | ColorMenu | MainMenu => Vec::new(),
        };

        if before != self.state.page {
            info!(from = before.as_str(), to = self.state.page.as_str(), "page change");
        }
        effects
    }

    fn toggle_color_menu(&mut self) -> Vec<UiEffect> {
        use ElementId::*;
        use UiEffect::*;

        match self.state.page {
            Page::Canvas => {
                self.state.page = Page::ColorMenu;
                vec![Hide(Canvas), Hide(MainMenuButton), Show(EraserButton), Show(ColorMenu)]
            }
            Page::ColorMenu => {
                self.state.page = Page::Canvas;
                vec![Hide(ColorMenu), Hide(EraserButton), Show(Canvas), Show(MainMenuButton)]
            }
            Page::MainMenu => {
                self.state.page = Page::Canvas;
                vec![
                    Hide(MainMenu),
                    Hide(BackButton),
                    Hide(EraserButton),
                    Show(Canvas),
                    Show(MainMenuButton),
                    Show(ColorMenuButton),
                ]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = Color::rgb(0xFF, 0, 0);

    fn hand(n: usize, x: f64, y: f64) -> Vec<Point> {
        vec![Point::xy(x, y); n]
    }

    fn reducer() -> Reducer {
        Reducer::seeded(InteractionConfig::default(), 7)
    }

    #[test]
    fn starts_on_canvas_with_nothing_held() {
        let r = reducer();
        assert_eq!(r.state(), &InteractionState::new(Color::BLACK));
        assert_eq!(r.config().frames_to_click(), 30);
    }

    #[test]
    fn small_frame_resets_dwell_and_cursor() {
        let mut r = reducer();
        for _ in 0..5 {
            r.on_frame(&hand(50, -0.2, 0.3));
        }
        assert_eq!(r.state().dwell_frames, 5);

        assert_eq!(r.on_frame(&hand(40, -0.2, 0.3)), Action::None);
        assert_eq!(r.state().dwell_frames, 0);
        assert_eq!(r.state().cursor, None);

        assert_eq!(r.on_frame(&[]), Action::None);
        assert_eq!(r.state().dwell_frames, 0);
    }

    #[test]
    fn short_frame_then_valid_frame_counts_one() {
        let mut r = reducer();
        r.on_frame(&hand(10, 0.2, 0.3));
        r.on_frame(&hand(50, 0.2, 0.3));
        assert_eq!(r.state().dwell_frames, 1);
    }

    #[test]
    fn dwell_click_fires_once_on_frame_thirty_and_resets() {
        let mut r = reducer();
        let frame = hand(50, 0.2, 0.3);
        let mut clicks = Vec::new();
        for i in 1..=59 {
            if let Action::DwellClick(at) = r.on_frame(&frame) {
                clicks.push((i, at));
                assert_eq!(r.state().dwell_frames, 0);
            }
        }
        assert_eq!(clicks.len(), 1);
        let (frame_no, at) = clicks[0];
        assert_eq!(frame_no, 30);
        assert_eq!(at.x, (-0.2 * 1280.0) as f32);
        assert_eq!(at.y, (0.3 * 720.0) as f32);
        assert_eq!(r.state().dwell_frames, 29);
    }

    #[test]
    fn frames_to_click_rounds_up() {
        let cfg = InteractionConfig { seconds_to_click: 0.5, fps: 25.0, ..Default::default() };
        assert_eq!(cfg.frames_to_click(), 13);
        let cfg = InteractionConfig { seconds_to_click: 0.0, ..Default::default() };
        assert_eq!(cfg.frames_to_click(), 1);
    }

    #[test]
    fn paints_only_on_canvas() {
        let mut r = reducer();
        match r.on_frame(&hand(50, -0.5, 0.5)) {
            Action::Paint(s) => {
                assert_eq!(s.at, ScreenPoint { x: 640.0, y: 360.0 });
                assert_eq!(s.color, Color::BLACK);
                assert!((5.0..35.0).contains(&s.radius));
                assert!((0.0..1.0).contains(&s.opacity));
            }
            other => panic!("expected paint, got {other:?}"),
        }

        r.on_ui_click(ElementId::ColorMenuButton);
        assert_eq!(r.state().page, Page::ColorMenu);
        for _ in 0..10 {
            assert_eq!(r.on_frame(&hand(50, -0.5, 0.5)), Action::None);
        }

        r.on_ui_click(ElementId::ColorMenuButton);
        r.on_ui_click(ElementId::MainMenuButton);
        assert_eq!(r.state().page, Page::MainMenu);
        assert_eq!(r.on_frame(&hand(50, -0.5, 0.5)), Action::None);
    }

    #[test]
    fn eraser_paints_background_with_fixed_brush() {
        let mut r = reducer();
        r.on_ui_click(ElementId::Swatch(RED));
        r.on_ui_click(ElementId::EraserButton);
        match r.on_frame(&hand(50, -0.5, 0.5)) {
            Action::Paint(s) => {
                assert_eq!(s.color, Color::WHITE);
                assert_eq!(s.radius, ERASER_RADIUS);
                assert_eq!(s.opacity, 1.0);
            }
            other => panic!("expected paint, got {other:?}"),
        }
        // Erasing does not forget the chosen color.
        assert_eq!(r.state().active_color, RED);
    }

    #[test]
    fn dwell_click_fires_in_menus_too() {
        let mut r = reducer();
        r.on_ui_click(ElementId::ColorMenuButton);
        let frame = hand(50, -0.1, 0.1);
        let fired = (0..30)
            .map(|_| r.on_frame(&frame))
            .filter(|a| matches!(a, Action::DwellClick(_)))
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn stable_policy_restarts_episode_on_jump() {
        let cfg = InteractionConfig {
            dwell_policy: DwellPolicy::Stable { max_displacement: 0.05 },
            ..Default::default()
        };
        let mut r = Reducer::seeded(cfg, 1);
        for _ in 0..10 {
            r.on_frame(&hand(50, -0.2, 0.2));
        }
        assert_eq!(r.state().dwell_frames, 10);

        // Small drift keeps counting.
        r.on_frame(&hand(50, -0.21, 0.2));
        assert_eq!(r.state().dwell_frames, 11);

        // A jump starts over with this frame as the first.
        r.on_frame(&hand(50, -0.6, 0.6));
        assert_eq!(r.state().dwell_frames, 1);
    }

    #[test]
    fn presence_policy_ignores_movement() {
        let mut r = reducer();
        r.on_frame(&hand(50, -0.1, 0.1));
        r.on_frame(&hand(50, -0.9, 0.9));
        assert_eq!(r.state().dwell_frames, 2);
    }

    #[test]
    fn every_ui_click_resets_dwell() {
        let targets = [
            ElementId::ColorMenuButton,
            ElementId::MainMenuButton,
            ElementId::BackButton,
            ElementId::SaveButton,
            ElementId::LoadButton,
            ElementId::ClearButton,
            ElementId::EraserButton,
            ElementId::Swatch(RED),
        ];
        for target in targets {
            let mut r = reducer();
            for _ in 0..12 {
                r.on_frame(&hand(50, -0.3, 0.3));
            }
            r.on_ui_click(target);
            assert_eq!(r.state().dwell_frames, 0, "{target:?}");
        }
    }

    #[test]
    fn color_menu_button_toggles_between_canvas_and_menu() {
        let mut r = reducer();
        let effects = r.on_ui_click(ElementId::ColorMenuButton);
        assert_eq!(r.state().page, Page::ColorMenu);
        assert!(effects.contains(&UiEffect::Hide(ElementId::Canvas)));
        assert!(effects.contains(&UiEffect::Show(ElementId::ColorMenu)));
        assert!(effects.contains(&UiEffect::Show(ElementId::EraserButton)));

        let effects = r.on_ui_click(ElementId::ColorMenuButton);
        assert_eq!(r.state().page, Page::Canvas);
        assert!(effects.contains(&UiEffect::Show(ElementId::Canvas)));
        assert!(effects.contains(&UiEffect::Hide(ElementId::ColorMenu)));
    }

    #[test]
    fn main_menu_round_trip() {
        let mut r = reducer();
        let effects = r.on_ui_click(ElementId::MainMenuButton);
        assert_eq!(r.state().page, Page::MainMenu);
        assert!(effects.contains(&UiEffect::Hide(ElementId::Canvas)));
        assert!(effects.contains(&UiEffect::Show(ElementId::MainMenu)));

        r.on_ui_click(ElementId::ColorMenuButton);
        assert_eq!(r.state().page, Page::Canvas);
    }

    #[test]
    fn main_menu_button_only_works_from_canvas() {
        let mut r = reducer();
        r.on_ui_click(ElementId::ColorMenuButton);
        assert!(r.on_ui_click(ElementId::MainMenuButton).is_empty());
        assert_eq!(r.state().page, Page::ColorMenu);
    }

    #[test]
    fn back_button_acts_like_color_menu_button() {
        let mut r = reducer();
        r.on_ui_click(ElementId::MainMenuButton);
        let effects = r.on_ui_click(ElementId::BackButton);
        assert_eq!(r.state().page, Page::Canvas);
        assert_eq!(effects.last(), Some(&UiEffect::Show(ElementId::ColorMenuButton)));
    }

    #[test]
    fn swatch_sets_color_and_stops_erasing_without_page_change() {
        let mut r = reducer();
        r.on_ui_click(ElementId::ColorMenuButton);
        r.on_ui_click(ElementId::EraserButton);
        assert!(r.state().is_erasing);

        let effects = r.on_ui_click(ElementId::Swatch(RED));
        assert_eq!(r.state().active_color, RED);
        assert!(!r.state().is_erasing);
        assert_eq!(r.state().page, Page::ColorMenu);
        assert_eq!(effects, vec![UiEffect::SetBackground(ElementId::ColorMenuButton, RED)]);
    }

    #[test]
    fn clear_resets_color_and_keeps_page() {
        let mut r = reducer();
        r.on_ui_click(ElementId::Swatch(RED));
        let effects = r.on_ui_click(ElementId::ClearButton);
        assert_eq!(effects[0], UiEffect::ClearCanvas);
        assert_eq!(r.state().active_color, Color::BLACK);
        assert_eq!(r.state().page, Page::Canvas);
    }

    #[test]
    fn save_and_load_keep_page() {
        let mut r = reducer();
        r.on_ui_click(ElementId::MainMenuButton);
        assert_eq!(r.on_ui_click(ElementId::SaveButton), vec![UiEffect::ExportBitmap]);
        assert_eq!(r.on_ui_click(ElementId::LoadButton), vec![UiEffect::LoadBitmap]);
        assert_eq!(r.state().page, Page::MainMenu);
    }

    #[test]
    fn frames_never_change_page() {
        let mut r = reducer();
        for i in 0..200 {
            let n = if i % 7 == 0 { 5 } else { 50 };
            r.on_frame(&hand(n, -0.4, 0.4));
            assert_eq!(r.state().page, Page::Canvas);
        }
    }

    #[test]
    fn same_seed_same_strokes() {
        let mut a = reducer();
        let mut b = reducer();
        let frame = hand(50, -0.5, 0.5);
        for _ in 0..5 {
            assert_eq!(a.on_frame(&frame), b.on_frame(&frame));
        }
    }
}
