//! Card rendering: text fitting and image composition.

pub mod compose;
pub mod text;

pub use compose::{Compositor, SlotLayout, layout_slots};
pub use text::{FontSet, TextMeasure, TextRenderer, fit_text};
