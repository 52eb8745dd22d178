//! Layout engine.
//!
//! Both passes are pure functions of `(rows, visibility, container)`: calling
//! them twice with the same input yields the same geometry, and the reason a
//! pass runs ([`LayoutTrigger`]) never influences the result.
//!
//! - [`flow`]: fixed label column, scrollable rows, pinned footer buttons.
//! - [`proportional`]: vertical stack scaled to the container height with
//!   minimum-size floors.
use serde::Serialize;
use strum::Display;

pub mod flow;
pub mod proportional;

pub use flow::{FlowGeometry, FlowPlacement, FlowRow, FooterButton};
pub use proportional::{
    PlacedRow, ProportionalGeometry, ProportionalMinimums, RowKind, RowSpec,
};

/// Container size in device units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Placed rectangle. `x`/`y` are signed: footer buttons of a container
/// narrower than the button row end up left of the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Same rectangle moved vertically.
    pub fn offset_y(self, dy: i32) -> Self {
        Self {
            y: self.y + dy,
            ..self
        }
    }
}

/// Scaled sizes of one proportional pass. Derived per pass, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutMetrics {
    pub padding: u32,
    pub gap: u32,
    pub label_height: u32,
    pub element_height: u32,
    pub font_size: u32,
    pub scale: f64,
}

/// Why a layout pass runs. Logged, otherwise ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
pub enum LayoutTrigger {
    InitialDraw,
    /// Intermediate size while the user is still dragging.
    Resizing,
    Resized,
    VisibilityChanged,
}
