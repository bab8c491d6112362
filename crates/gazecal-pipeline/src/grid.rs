//! Calibration target layout.
//!
//! A 5×5 interior grid with an 8% margin per axis, plus four near-corner
//! targets at a fixed 20 px inset: 29 targets total. All arithmetic is
//! integer arithmetic (truncating margin, integer grid step) so the target
//! pixels are stable for a given resolution.

use gazecal_core::{Real, Vec2};

pub const GRID_ROWS: usize = 5;
pub const GRID_COLS: usize = 5;

/// Margin fraction kept clear on each axis around the interior grid.
pub const GRID_MARGIN_FRAC: Real = 0.08;

/// Inset of the four extra corner targets, in pixels.
pub const CORNER_INSET: i64 = 20;

/// Generate the calibration target layout for a screen resolution.
///
/// Interior targets come first in row-major order, then the four corners
/// (top-left, top-right, bottom-left, bottom-right).
pub fn calibration_grid(screen_w: u32, screen_h: u32) -> Vec<Vec2> {
    let w = screen_w as i64;
    let h = screen_h as i64;

    let margin_x = (screen_w as Real * GRID_MARGIN_FRAC) as i64;
    let margin_y = (screen_h as Real * GRID_MARGIN_FRAC) as i64;

    let grid_w = w - 2 * margin_x;
    let grid_h = h - 2 * margin_y;
    let step_x = grid_w / (GRID_COLS as i64 - 1);
    let step_y = grid_h / (GRID_ROWS as i64 - 1);

    let mut points = Vec::with_capacity(GRID_ROWS * GRID_COLS + 4);
    for row in 0..GRID_ROWS as i64 {
        for col in 0..GRID_COLS as i64 {
            points.push(Vec2::new(
                (margin_x + col * step_x) as Real,
                (margin_y + row * step_y) as Real,
            ));
        }
    }

    points.push(Vec2::new(CORNER_INSET as Real, CORNER_INSET as Real));
    points.push(Vec2::new((w - CORNER_INSET) as Real, CORNER_INSET as Real));
    points.push(Vec2::new(CORNER_INSET as Real, (h - CORNER_INSET) as Real));
    points.push(Vec2::new(
        (w - CORNER_INSET) as Real,
        (h - CORNER_INSET) as Real,
    ));

    points
}
