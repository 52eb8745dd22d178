//! Flow layout: one row per field, a fixed label column on the left, controls
//! on the right, three action buttons pinned to the bottom-right corner.
//!
//! Everything above the footer is a scrollable region; rows keep their
//! natural size and the region reports whether it overflows.
use serde::Serialize;
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::trace;

use super::{Rect, Size};
use crate::control::ROW_HEIGHT;

pub const INSET: i32 = 10;
pub const LABEL_WIDTH: u32 = 150;
pub const GAP: i32 = 10;
pub const CONTROL_WIDTH: u32 = 200;
pub const TOP_OFFSET: i32 = 10;
pub const MIN_ROW_ADVANCE: u32 = 30;
pub const ROW_SPACING: u32 = 10;
pub const FOOTER_HEIGHT: u32 = 40;
pub const BUTTON_WIDTH: u32 = 80;
pub const BUTTON_HEIGHT: u32 = 26;
pub const BUTTON_SPACING: i32 = 90;
pub const BUTTON_BOTTOM_MARGIN: i32 = 10;

/// Footer buttons, left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
pub enum FooterButton {
    #[strum(to_string = "OK")]
    Ok,
    Cancel,
    Apply,
}

impl FooterButton {
    /// Distance of the button's left edge from the container's right edge,
    /// in button slots.
    fn slots_from_right(self) -> i32 {
        match self {
            FooterButton::Ok => 3,
            FooterButton::Cancel => 2,
            FooterButton::Apply => 1,
        }
    }
}

/// Input row: identifies the field and how tall its control is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowRow {
    pub key: String,
    pub control_height: u32,
    pub visible: bool,
}

impl FlowRow {
    pub fn new(key: impl Into<String>, control_height: u32) -> Self {
        Self {
            key: key.into(),
            control_height,
            visible: true,
        }
    }

    /// Vertical space reserved for the row when visible.
    pub fn advance(&self) -> u32 {
        MIN_ROW_ADVANCE.max(self.control_height + ROW_SPACING)
    }
}

/// Label and control rectangles of one visible row, in scroll-region
/// coordinates. Label text is right-aligned inside `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowPlacement {
    pub key: String,
    pub label: Rect,
    pub control: Rect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowGeometry {
    pub rows: Vec<FlowPlacement>,
    /// Scrollable region above the footer.
    pub viewport: Rect,
    pub content_height: u32,
    pub scrolls: bool,
    pub buttons: Vec<(FooterButton, Rect)>,
}

impl FlowGeometry {
    pub fn row(&self, key: &str) -> Option<&FlowPlacement> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn button(&self, button: FooterButton) -> Option<Rect> {
        self.buttons
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, rect)| *rect)
    }

    /// Footer button under a point in container coordinates.
    pub fn button_at(&self, x: i32, y: i32) -> Option<FooterButton> {
        self.buttons
            .iter()
            .find(|(_, rect)| rect.contains(x, y))
            .map(|(b, _)| *b)
    }
}

/// Compute the flow layout for `rows` inside `container`.
pub fn layout(rows: &[FlowRow], container: Size) -> FlowGeometry {
    let control_x = INSET + LABEL_WIDTH as i32 + GAP;
    let mut current_y = TOP_OFFSET;
    let mut placements = Vec::with_capacity(rows.len());

    for row in rows.iter().filter(|r| r.visible) {
        placements.push(FlowPlacement {
            key: row.key.clone(),
            label: Rect::new(INSET, current_y, LABEL_WIDTH, ROW_HEIGHT),
            control: Rect::new(control_x, current_y, CONTROL_WIDTH, row.control_height),
        });
        current_y += row.advance() as i32;
    }

    let content_height = current_y.max(0) as u32;
    let viewport = Rect::new(
        0,
        0,
        container.width,
        container.height.saturating_sub(FOOTER_HEIGHT),
    );

    let button_y = container.height as i32 - BUTTON_HEIGHT as i32 - BUTTON_BOTTOM_MARGIN;
    let buttons = FooterButton::iter()
        .map(|b| {
            let x = container.width as i32 - b.slots_from_right() * BUTTON_SPACING;
            (b, Rect::new(x, button_y, BUTTON_WIDTH, BUTTON_HEIGHT))
        })
        .collect();

    trace!(
        rows = placements.len(),
        content_height,
        width = container.width,
        height = container.height,
        "flow layout pass"
    );

    FlowGeometry {
        scrolls: content_height > viewport.height,
        rows: placements,
        viewport,
        content_height,
        buttons,
    }
}
