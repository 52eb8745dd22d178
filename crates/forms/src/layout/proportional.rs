//! Proportional layout: a vertical stack whose padding, gaps, row heights and
//! font size grow with the container height and never drop below their
//! minimums.
//!
//! For `n` visible rows and `g = n - 1` gaps:
//!
//! ```text
//! min_total = 2 * padding + g * gap + sum(min row height)
//! scale     = max(container_height / min_total, 1)
//! ```
//!
//! Every size is `round(minimum * scale)`. Hidden rows take no space at all.
use serde::Serialize;
use tracing::trace;

use super::{LayoutMetrics, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProportionalMinimums {
    pub padding: u32,
    pub gap: u32,
    pub label_height: u32,
    pub element_height: u32,
    pub font_size: u32,
}

impl Default for ProportionalMinimums {
    fn default() -> Self {
        Self {
            padding: 20,
            gap: 8,
            label_height: 18,
            element_height: 28,
            font_size: 14,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Label,
    Input,
    /// A row of `n` equally wide buttons.
    Buttons(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSpec {
    pub key: &'static str,
    pub kind: RowKind,
    pub visible: bool,
}

impl RowSpec {
    pub const fn new(key: &'static str, kind: RowKind) -> Self {
        Self {
            key,
            kind,
            visible: true,
        }
    }

    pub const fn hidden(mut self, hidden: bool) -> Self {
        self.visible = !hidden;
        self
    }

    fn min_height(&self, min: &ProportionalMinimums) -> u32 {
        match self.kind {
            RowKind::Label => min.label_height,
            RowKind::Input | RowKind::Buttons(_) => min.element_height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlacedRow {
    pub key: &'static str,
    pub rect: Rect,
    /// Button cells for [`RowKind::Buttons`]; empty otherwise.
    pub cells: Vec<Rect>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProportionalGeometry {
    pub metrics: LayoutMetrics,
    pub rows: Vec<PlacedRow>,
}

impl ProportionalGeometry {
    pub fn row(&self, key: &str) -> Option<&PlacedRow> {
        self.rows.iter().find(|r| r.key == key)
    }
}

fn scaled(min: u32, scale: f64) -> u32 {
    (min as f64 * scale).round() as u32
}

/// Metrics for the visible subset of `rows` in a container `height` tall.
pub fn metrics(rows: &[RowSpec], height: u32, min: &ProportionalMinimums) -> LayoutMetrics {
    let visible: Vec<&RowSpec> = rows.iter().filter(|r| r.visible).collect();
    let gaps = visible.len().saturating_sub(1) as u32;
    let min_total = 2 * min.padding
        + gaps * min.gap
        + visible.iter().map(|r| r.min_height(min)).sum::<u32>();

    let scale = if min_total == 0 {
        1.0
    } else {
        (height as f64 / min_total as f64).max(1.0)
    };

    LayoutMetrics {
        padding: scaled(min.padding, scale),
        gap: scaled(min.gap, scale),
        label_height: scaled(min.label_height, scale),
        element_height: scaled(min.element_height, scale),
        font_size: scaled(min.font_size, scale),
        scale,
    }
}

/// Place the visible rows of `rows` inside `container`.
pub fn layout(
    rows: &[RowSpec],
    container: Size,
    min: &ProportionalMinimums,
) -> ProportionalGeometry {
    let m = metrics(rows, container.height, min);
    let inner_width = container.width.saturating_sub(2 * m.padding);
    let mut y = m.padding as i32;
    let mut placed = Vec::new();

    for row in rows.iter().filter(|r| r.visible) {
        let height = match row.kind {
            RowKind::Label => m.label_height,
            RowKind::Input | RowKind::Buttons(_) => m.element_height,
        };
        let rect = Rect::new(m.padding as i32, y, inner_width, height);
        let cells = match row.kind {
            RowKind::Buttons(n) => split_cells(rect, n, m.gap),
            _ => Vec::new(),
        };
        placed.push(PlacedRow {
            key: row.key,
            rect,
            cells,
        });
        y += (height + m.gap) as i32;
    }

    trace!(
        rows = placed.len(),
        scale = m.scale,
        height = container.height,
        "proportional layout pass"
    );

    ProportionalGeometry {
        metrics: m,
        rows: placed,
    }
}

/// Divide `rect` horizontally into `n` equal cells separated by `gap`.
fn split_cells(rect: Rect, n: usize, gap: u32) -> Vec<Rect> {
    if n == 0 {
        return Vec::new();
    }
    let n32 = n as u32;
    let cell = rect.width.saturating_sub(gap * (n32 - 1)) / n32;
    (0..n32)
        .map(|i| Rect::new(rect.x + (i * (cell + gap)) as i32, rect.y, cell, rect.height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn login_rows(create: bool) -> Vec<RowSpec> {
        vec![
            RowSpec::new("user_label", RowKind::Label),
            RowSpec::new("user", RowKind::Input),
            RowSpec::new("confirm_label", RowKind::Label).hidden(!create),
            RowSpec::new("confirm", RowKind::Input).hidden(!create),
            RowSpec::new("buttons", RowKind::Buttons(3)),
        ]
    }

    #[test]
    fn scale_never_below_one() {
        let min = ProportionalMinimums::default();
        for height in [0u32, 1, 50, 150, 10_000] {
            let m = metrics(&login_rows(true), height, &min);
            assert!(m.scale >= 1.0, "height {height}");
            assert!(m.element_height >= min.element_height);
            assert!(m.padding >= min.padding);
        }
    }

    #[test]
    fn doubling_height_doubles_sizes() {
        let min = ProportionalMinimums::default();
        // 2*20 + 2*8 + 18 + 28 + 28 = 130
        let m = metrics(&login_rows(false), 260, &min);
        assert_eq!(m.scale, 2.0);
        assert_eq!(m.padding, 40);
        assert_eq!(m.gap, 16);
        assert_eq!(m.label_height, 36);
        assert_eq!(m.element_height, 56);
        assert_eq!(m.font_size, 28);
    }

    #[test]
    fn hidden_rows_take_no_space_at_floor_scale() {
        let min = ProportionalMinimums::default();
        let size = Size::new(300, 10);
        let shown = layout(&login_rows(true), size, &min);
        let hidden = layout(&login_rows(false), size, &min);

        assert!(hidden.row("confirm").is_none());
        let y = |g: &ProportionalGeometry| g.row("buttons").map(|r| r.rect.y).unwrap_or_default();
        // label 18 + gap 8 + input 28 + gap 8
        assert_eq!(y(&shown) - y(&hidden), 62);
    }

    #[test]
    fn button_row_is_split_evenly() {
        let min = ProportionalMinimums::default();
        let geo = layout(&login_rows(false), Size::new(340, 10), &min);
        let cells = &geo.row("buttons").map(|r| r.cells.clone()).unwrap_or_default();
        // inner 300, gaps 16 → cells of 94
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], Rect::new(20, cells[0].y, 94, 28));
        assert_eq!(cells[1].x, 20 + 94 + 8);
        assert_eq!(cells[2].x, 20 + 2 * (94 + 8));
    }

    #[test]
    fn no_visible_rows_has_unit_scale() {
        let rows = [RowSpec::new("x", RowKind::Input).hidden(true)];
        let min = ProportionalMinimums {
            padding: 0,
            ..Default::default()
        };
        let geo = layout(&rows, Size::new(100, 100), &min);
        assert_eq!(geo.metrics.scale, 1.0);
        assert!(geo.rows.is_empty());
    }

    #[test]
    fn identical_input_identical_output() {
        let min = ProportionalMinimums::default();
        let size = Size::new(420, 333);
        assert_eq!(
            layout(&login_rows(true), size, &min),
            layout(&login_rows(true), size, &min)
        );
    }
}
