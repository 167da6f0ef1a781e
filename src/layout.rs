//! Slot-grid geometry.
//!
//! The grid is four rows inside a caller-supplied bounds rect: a centered
//! head cell, a jacket | body | accessory row, a centered legs cell, and a
//! centered feet cell. When no accessory is assigned, the body cell widens to
//! fill the accessory position and its content re-centers within the widened
//! cell. The renderer and the compositor both take their rects from here so
//! the composited preview matches the live layout exactly.

use crate::{
    draft::SlotKey,
    geom::Rect,
};

/// Gap between grid cells, in pixels.
pub const GRID_GAP: f64 = 8.0;

/// Cell rects for all six slots in display order, within `bounds`.
/// `accessory_occupied` toggles the body-widening rule.
pub fn slot_rects(bounds: Rect, accessory_occupied: bool) -> [(SlotKey, Rect); 6] {
    let cell_w = (bounds.width - 2.0 * GRID_GAP) / 3.0;
    let cell_h = (bounds.height - 3.0 * GRID_GAP) / 4.0;
    let centered_x = bounds.x + (bounds.width - cell_w) / 2.0;
    let row_y = |row: f64| bounds.y + row * (cell_h + GRID_GAP);

    let col_x = |col: f64| bounds.x + col * (cell_w + GRID_GAP);
    let body = if accessory_occupied {
        Rect::new(col_x(1.0), row_y(1.0), cell_w, cell_h)
    } else {
        Rect::new(col_x(1.0), row_y(1.0), 2.0 * cell_w + GRID_GAP, cell_h)
    };

    [
        (
            SlotKey::Head,
            Rect::new(centered_x, row_y(0.0), cell_w, cell_h),
        ),
        (
            SlotKey::Jacket,
            Rect::new(col_x(0.0), row_y(1.0), cell_w, cell_h),
        ),
        (SlotKey::Body, body),
        (
            SlotKey::Accessory,
            Rect::new(col_x(2.0), row_y(1.0), cell_w, cell_h),
        ),
        (
            SlotKey::Legs,
            Rect::new(centered_x, row_y(2.0), cell_w, cell_h),
        ),
        (
            SlotKey::Feet,
            Rect::new(centered_x, row_y(3.0), cell_w, cell_h),
        ),
    ]
}

/// Rect for a single slot under the same rules.
pub fn slot_rect(bounds: Rect, slot: SlotKey, accessory_occupied: bool) -> Rect {
    let rects = slot_rects(bounds, accessory_occupied);
    rects
        .iter()
        .find(|(k, _)| *k == slot)
        .map(|(_, r)| *r)
        .unwrap_or_default()
}
