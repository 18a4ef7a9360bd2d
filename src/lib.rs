//! Paint on a projected surface with your hand.
//!
//! A depth camera reports the points just above the surface; the
//! [`interaction::Reducer`] turns each frame into a paint dab or, after about a
//! second of holding still, a synthetic click that drives the menus.

pub mod aggregate;
pub mod camera;
pub mod canvas;
pub mod config;
pub mod draw;
pub mod error;
pub mod gamma;
pub mod interaction;
pub mod layout;
pub mod pointer;
pub mod session;
pub mod storage;
pub mod types;

pub use error::Error;
pub use interaction::{Action, InteractionConfig, InteractionState, Reducer, UiEffect};
pub use session::{Session, Surface, Ui};
pub use types::{Centroid, Color, ElementId, Frame, Page, PaintStroke, Point, ScreenPoint};
