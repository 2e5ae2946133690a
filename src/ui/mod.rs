pub mod layout;
pub mod syntax;
pub mod widgets;

pub use layout::{AppLayout, LayoutAreas, centered_rect};
pub use syntax::Highlighter;
pub use widgets::*;
