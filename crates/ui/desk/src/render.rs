//! Device units ↔ terminal cells.
//!
//! Forms lay out in integer device units; a terminal cell covers
//! `cell_width × cell_height` of them. Positions and sizes are rounded to the
//! nearest cell, sizes never below one cell, and everything is clipped to the
//! target area.
use forms::Size;
use ratatui::layout::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellMetrics {
    pub cell_width: u16,
    pub cell_height: u16,
}

impl CellMetrics {
    pub fn new(cell_width: u16, cell_height: u16) -> Self {
        Self {
            cell_width: cell_width.max(1),
            cell_height: cell_height.max(1),
        }
    }

    /// Container size of a cell area.
    pub fn size_of(&self, area: Rect) -> Size {
        Size::new(
            area.width as u32 * self.cell_width as u32,
            area.height as u32 * self.cell_height as u32,
        )
    }

    /// Place a device rectangle inside `area`, with the content scrolled up by
    /// `scroll` units. `None` when nothing of it is visible.
    pub fn to_cells(&self, rect: forms::Rect, area: Rect, scroll: u32) -> Option<Rect> {
        let cw = self.cell_width as f64;
        let ch = self.cell_height as f64;
        let x = (rect.x as f64 / cw).round() as i32;
        let y = ((rect.y as f64 - scroll as f64) / ch).round() as i32;
        let w = ((rect.width as f64 / cw).round() as i32).max(1);
        let h = ((rect.height as f64 / ch).round() as i32).max(1);

        let left = (area.x as i32 + x).max(area.x as i32);
        let top = (area.y as i32 + y).max(area.y as i32);
        let right = (area.x as i32 + x + w).min(area.right() as i32);
        let bottom = (area.y as i32 + y + h).min(area.bottom() as i32);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(
            left as u16,
            top as u16,
            (right - left) as u16,
            (bottom - top) as u16,
        ))
    }

    /// Device-unit point at the centre of a cell, relative to `area`.
    pub fn to_units(&self, column: u16, row: u16, area: Rect) -> Option<(i32, i32)> {
        if !area.contains(ratatui::layout::Position::new(column, row)) {
            return None;
        }
        let cw = self.cell_width as i32;
        let ch = self.cell_height as i32;
        Some((
            (column - area.x) as i32 * cw + cw / 2,
            (row - area.y) as i32 * ch + ch / 2,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CELLS: CellMetrics = CellMetrics {
        cell_width: 10,
        cell_height: 20,
    };

    #[test]
    fn size_scales_by_cell() {
        assert_eq!(CELLS.size_of(Rect::new(3, 3, 48, 16)), Size::new(480, 320));
    }

    #[test]
    fn rects_round_and_offset() {
        let area = Rect::new(2, 1, 60, 20);
        let rect = forms::Rect::new(170, 40, 200, 20);
        assert_eq!(CELLS.to_cells(rect, area, 0), Some(Rect::new(19, 3, 20, 1)));
        assert_eq!(CELLS.to_cells(rect, area, 40), Some(Rect::new(19, 1, 20, 1)));
    }

    #[test]
    fn tiny_rects_get_one_cell_and_outside_is_none() {
        let area = Rect::new(0, 0, 10, 5);
        assert_eq!(
            CELLS.to_cells(forms::Rect::new(0, 0, 2, 2), area, 0),
            Some(Rect::new(0, 0, 1, 1))
        );
        assert_eq!(CELLS.to_cells(forms::Rect::new(0, 400, 50, 20), area, 0), None);
        assert_eq!(CELLS.to_cells(forms::Rect::new(-500, 0, 50, 20), area, 0), None);
    }

    #[test]
    fn clipping_to_area() {
        let area = Rect::new(0, 0, 10, 5);
        assert_eq!(
            CELLS.to_cells(forms::Rect::new(50, 0, 200, 20), area, 0),
            Some(Rect::new(5, 0, 5, 1))
        );
    }

    #[test]
    fn cell_points_map_to_unit_centres() {
        let area = Rect::new(2, 1, 60, 20);
        assert_eq!(CELLS.to_units(2, 1, area), Some((5, 10)));
        assert_eq!(CELLS.to_units(4, 2, area), Some((25, 30)));
        assert_eq!(CELLS.to_units(0, 0, area), None);
    }
}
