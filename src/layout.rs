// Software widget layer: buttons, the color menu and the main menu as plain
// rectangles over the canvas. Visual expectation: COLORS top-left, MENU
// top-right; the color menu is a grid of swatches, the main menu a column of
// SAVE / LOAD / CLEAR.

use crate::draw::{draw_text, fill_rect, text_width};
use crate::session::Ui;
use crate::types::{Color, ElementId, FrameBuffer};

const BUTTON_W: usize = 160;
const BUTTON_H: usize = 64;
const MARGIN: usize = 24;
const LABEL_SCALE: usize = 3;
const MENU_BACKDROP: Color = Color::rgb(0x20, 0x20, 0x24);
const BUTTON_FACE: Color = Color::rgb(0x44, 0x44, 0x4C);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x as f32
            && y >= self.y as f32
            && x < (self.x + self.w) as f32
            && y < (self.y + self.h) as f32
    }
}

#[derive(Debug, Clone)]
struct Element {
    id: ElementId,
    rect: Rect,
    visible: bool,
    background: Color,
    label: &'static str,
    // Hidden whenever the parent is hidden.
    parent: Option<ElementId>,
}

/// All widgets, bottom to top. Later entries win hit tests.
pub struct Layout {
    elements: Vec<Element>,
}

impl Layout {
    /// Start-up screen: canvas, COLORS and MENU visible, everything else hidden.
    pub fn new(width: usize, height: usize, palette: &[Color], button_tint: Color) -> Self {
        let full = Rect { x: 0, y: 0, w: width, h: height };
        let left = Rect { x: MARGIN, y: MARGIN, w: BUTTON_W, h: BUTTON_H };
        let right = Rect { x: width.saturating_sub(MARGIN + BUTTON_W), y: MARGIN, w: BUTTON_W, h: BUTTON_H };
        let mut elements = Vec::new();

        let mut push = |id, rect, visible, background, label, parent| {
            elements.push(Element { id, rect, visible, background, label, parent });
        };

        push(ElementId::Canvas, full, true, Color::WHITE, "", None);
        push(ElementId::ColorMenu, full, false, MENU_BACKDROP, "", None);
        push(ElementId::MainMenu, full, false, MENU_BACKDROP, "", None);

        // Swatch grid below the header row.
        let top = MARGIN * 2 + BUTTON_H;
        let cols = 4usize;
        let rows = palette.len().div_ceil(cols).max(1);
        let cell_w = width.saturating_sub(MARGIN) / cols;
        let cell_h = height.saturating_sub(top + MARGIN) / rows;
        for (i, &color) in palette.iter().enumerate() {
            let rect = Rect {
                x: MARGIN + (i % cols) * cell_w,
                y: top + (i / cols) * cell_h,
                w: cell_w.saturating_sub(MARGIN),
                h: cell_h.saturating_sub(MARGIN),
            };
            push(ElementId::Swatch(color), rect, true, color, "", Some(ElementId::ColorMenu));
        }

        // Main menu column.
        let col_x = width.saturating_sub(BUTTON_W * 2) / 2;
        let entries = [
            (ElementId::SaveButton, "SAVE"),
            (ElementId::LoadButton, "LOAD"),
            (ElementId::ClearButton, "CLEAR"),
        ];
        for (i, (id, label)) in entries.into_iter().enumerate() {
            let rect = Rect { x: col_x, y: top + i * (BUTTON_H * 2), w: BUTTON_W * 2, h: BUTTON_H };
            push(id, rect, true, BUTTON_FACE, label, Some(ElementId::MainMenu));
        }

        // Header buttons last so they sit on top of both menus.
        push(ElementId::ColorMenuButton, left, true, button_tint, "COLORS", None);
        push(ElementId::BackButton, left, false, BUTTON_FACE, "BACK", None);
        push(ElementId::MainMenuButton, right, true, BUTTON_FACE, "MENU", None);
        push(ElementId::EraserButton, right, false, BUTTON_FACE, "ERASER", None);

        Self { elements }
    }

    fn find(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    fn find_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Visible, and so is its parent.
    pub fn is_shown(&self, id: ElementId) -> bool {
        match self.find(id) {
            Some(e) => e.visible && e.parent.is_none_or(|p| self.is_shown(p)),
            None => false,
        }
    }

    pub fn rect(&self, id: ElementId) -> Option<Rect> {
        self.find(id).map(|e| e.rect)
    }

    /// Current fill of a widget, e.g. the swatch tint on COLORS.
    pub fn background(&self, id: ElementId) -> Option<Color> {
        self.find(id).map(|e| e.background)
    }

    /// Draw the visible widgets over `canvas` into `screen` (same size).
    /// Visual: the canvas when it is shown, otherwise the dark menu backdrop.
    pub fn render(&self, canvas: &FrameBuffer, screen: &mut FrameBuffer) {
        if self.is_shown(ElementId::Canvas) && canvas.pixels.len() == screen.pixels.len() {
            screen.pixels.copy_from_slice(&canvas.pixels);
        } else {
            screen.pixels.fill(MENU_BACKDROP.to_u32());
        }

        for e in &self.elements {
            if matches!(e.id, ElementId::Canvas | ElementId::ColorMenu | ElementId::MainMenu) {
                continue;
            }
            if !self.is_shown(e.id) {
                continue;
            }
            let r = e.rect;
            fill_rect(screen, r.x as i32, r.y as i32, r.w, r.h, e.background.to_u32());
            if !e.label.is_empty() {
                let ink = if luma(e.background) > 140 { Color::BLACK } else { Color::WHITE };
                let tx = r.x + r.w.saturating_sub(text_width(e.label, LABEL_SCALE)) / 2;
                let ty = r.y + r.h.saturating_sub(7 * LABEL_SCALE) / 2;
                draw_text(screen, tx as i32, ty as i32, e.label, ink.to_u32(), LABEL_SCALE);
            }
        }
    }
}

fn luma(c: Color) -> u32 {
    (c.r as u32 * 299 + c.g as u32 * 587 + c.b as u32 * 114) / 1000
}

impl Ui for Layout {
    fn show(&mut self, id: ElementId) {
        if let Some(e) = self.find_mut(id) {
            e.visible = true;
        }
    }

    fn hide(&mut self, id: ElementId) {
        if let Some(e) = self.find_mut(id) {
            e.visible = false;
        }
    }

    fn set_background(&mut self, id: ElementId, color: Color) {
        if let Some(e) = self.find_mut(id) {
            e.background = color;
        }
    }

    fn hit_test(&self, x: f32, y: f32) -> Option<ElementId> {
        self.elements
            .iter()
            .rev()
            .find(|e| e.rect.contains(x, y) && self.is_shown(e.id))
            .map(|e| e.id)
    }
}
