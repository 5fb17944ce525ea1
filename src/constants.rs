//! Grid geometry, scoring constants, and solver tuning parameters.

/// Number of cells on the 3×5 grid.
pub const CELL_COUNT: usize = 15;

/// Cells per grid row.
pub const GRID_COLS: usize = 5;

/// Dice per deck, fixed for a session.
pub const DECK_SIZE: usize = 5;

/// Lowest pip a die can hold.
pub const PIP_MIN: u8 = 1;

/// Saturation pip: dice at this level cannot merge further.
pub const PIP_MAX: u8 = 7;

/// Combo counter value for a fresh board (the first combo stack is intrinsic).
pub const COMBO_BASE_COUNT: u32 = 1;

/// Flat DPS added to the combo multiplier per counted combo merge.
pub const COMBO_DPS_PER_COUNT: f64 = 10.0;

/// Moon speed-up per adjacent moon pip when the moon count is off-tier.
pub const MOON_BASE_SPD_UP_PP: f64 = 0.15;

/// Moon speed-up per adjacent moon pip at an active moon count (3, 5 or 7).
pub const MOON_ACTIVE_SPD_UP_PP: f64 = 0.18;

/// Convergence threshold for value iteration: max |ΔQ| per sweep.
pub const Q_EPSILON: f64 = 1e-4;

/// Safety cap on value-iteration sweeps. Convergence is guaranteed for
/// gamma < 1 with bounded rewards, so hitting this indicates a malformed model.
pub const MAX_SWEEPS: usize = 10_000;

/// Default frontier depth for the advisor.
pub const DEFAULT_DEPTH: usize = 3;

/// Default beam width per frontier level.
pub const DEFAULT_BREADTH: usize = 10;

/// Default discount factor.
pub const DEFAULT_GAMMA: f64 = 0.5;

/// Entry cap for the session DPS cache.
pub const SCORE_CACHE_CAPACITY: usize = 1 << 16;

/// Orthogonal neighbors of cell `i`: ±1 within the same row, ±5 within bounds.
pub fn adjacent_cells(i: usize) -> Vec<usize> {
    debug_assert!(i < CELL_COUNT, "cell {} out of range", i);
    let mut adj = Vec::with_capacity(4);
    if i + GRID_COLS < CELL_COUNT {
        adj.push(i + GRID_COLS);
    }
    if i >= GRID_COLS {
        adj.push(i - GRID_COLS);
    }
    if i % GRID_COLS > 0 {
        adj.push(i - 1);
    }
    if i % GRID_COLS < GRID_COLS - 1 {
        adj.push(i + 1);
    }
    adj
}
