//! Immutable board snapshots: legality checks, state transitions, and the
//! canonical serialization that doubles as state identity.
//!
//! A board is 15 cells plus the session deck. Every mutator returns a new
//! board; the speed-up vector (moon aura) is recomputed once per construction.
//! The combo counter travels with the board lineage: a speculative merge in
//! one search branch can never leak into the scoring of a sibling branch.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::constants::{
    adjacent_cells, CELL_COUNT, COMBO_BASE_COUNT, DECK_SIZE, GRID_COLS, MOON_ACTIVE_SPD_UP_PP,
    MOON_BASE_SPD_UP_PP, PIP_MAX, PIP_MIN,
};
use crate::types::{Action, BoardError, Deck, Die, DieKind};

/// One immutable board snapshot.
#[derive(Clone, Debug)]
pub struct Board {
    cells: [Option<Die>; CELL_COUNT],
    deck: Deck,
    spd_ups: [f64; CELL_COUNT],
    combo_count: u32,
}

/// Identity is the canonical serialization: cells only. The speed-up vector is
/// derived and the combo counter is lineage metadata, not board content.
impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.cells == other.cells
    }
}

impl Eq for Board {}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cells.hash(state);
    }
}

impl Board {
    /// Build a board from explicit cells. Fails unless there are exactly 15
    /// cells, every occupied pip is in [1, 7], and every occupied kind is a
    /// deck member, a special, or the placeholder.
    pub fn new(cells: Vec<Option<Die>>, deck: Deck) -> Result<Self, BoardError> {
        let len = cells.len();
        let cells: [Option<Die>; CELL_COUNT] =
            cells.try_into().map_err(|_| BoardError::BadCellCount(len))?;
        for die in cells.iter().flatten() {
            if !(PIP_MIN..=PIP_MAX).contains(&die.pip) {
                return Err(BoardError::PipOutOfRange(die.pip));
            }
            let allowed = deck.contains(&die.kind)
                || die.kind.is_special()
                || die.kind == DieKind::Placeholder;
            if !allowed {
                return Err(BoardError::KindNotInDeck(die.kind.token().to_string()));
            }
        }
        Ok(Self::assemble(cells, deck, COMBO_BASE_COUNT))
    }

    /// Fresh empty board for the given deck.
    pub fn empty(deck: Deck) -> Self {
        Self::assemble(std::array::from_fn(|_| None), deck, COMBO_BASE_COUNT)
    }

    /// Parse a canonical state string (15 comma-joined cell tokens).
    /// Exact inverse of [`Board::serialize`].
    pub fn parse(state: &str, deck: Deck) -> Result<Self, BoardError> {
        let mut cells = Vec::with_capacity(CELL_COUNT);
        for token in state.split(',') {
            if token == "0" {
                cells.push(None);
                continue;
            }
            let last = token
                .chars()
                .last()
                .ok_or_else(|| BoardError::BadStateString(state.to_string()))?;
            let pip = last
                .to_digit(10)
                .ok_or_else(|| BoardError::BadToken(token.to_string()))? as u8;
            let kind = DieKind::from_token(&token[..token.len() - last.len_utf8()])?;
            cells.push(Some(Die::new(kind, pip)?));
        }
        Self::new(cells, deck)
    }

    /// Canonical state string: 15 comma-joined cell tokens, `0` for empty.
    pub fn serialize(&self) -> String {
        let tokens: Vec<String> = self
            .cells
            .iter()
            .map(|c| match c {
                None => "0".to_string(),
                Some(die) => die.token(),
            })
            .collect();
        tokens.join(",")
    }

    fn assemble(cells: [Option<Die>; CELL_COUNT], deck: Deck, combo_count: u32) -> Self {
        let spd_ups = compute_speed_ups(&cells);
        Board {
            cells,
            deck,
            spd_ups,
            combo_count,
        }
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Lineage-scoped count of completed combo merges (fresh boards start at
    /// [`COMBO_BASE_COUNT`]).
    pub fn combo_count(&self) -> u32 {
        self.combo_count
    }

    /// Die at `cell`, or `None` if the cell is empty or out of range.
    pub fn die_at(&self, cell: usize) -> Option<&Die> {
        self.cells.get(cell)?.as_ref()
    }

    /// Moon-aura speed multiplier for `cell`.
    pub fn speed_up(&self, cell: usize) -> f64 {
        self.spd_ups[cell]
    }

    /// Indices of unoccupied cells.
    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELL_COUNT)
            .filter(|&i| self.cells[i].is_none())
            .collect()
    }

    /// Whether merging `src` onto `dest` is legal: distinct in-range occupied
    /// cells, matching kinds (joker and mimic match anything), matching pips,
    /// and pip below the cap.
    pub fn legal_merge(&self, src: usize, dest: usize) -> bool {
        if src == dest || src >= CELL_COUNT || dest >= CELL_COUNT {
            return false;
        }
        let (Some(s), Some(d)) = (self.cells[src].as_ref(), self.cells[dest].as_ref()) else {
            return false;
        };
        if s.kind != d.kind {
            let wild =
                |k: &DieKind| matches!(k, DieKind::Joker | DieKind::Mimic);
            if !wild(&s.kind) && !wild(&d.kind) {
                return false;
            }
        }
        s.pip == d.pip && s.pip != PIP_MAX
    }

    /// All ordered `(src, dest)` pairs passing [`Board::legal_merge`].
    pub fn possible_merges(&self) -> Vec<(usize, usize)> {
        let occupied: Vec<usize> = (0..CELL_COUNT)
            .filter(|&i| self.cells[i].is_some())
            .collect();
        let mut merges = Vec::new();
        for &src in &occupied {
            for &dest in &occupied {
                if self.legal_merge(src, dest) {
                    merges.push((src, dest));
                }
            }
        }
        merges
    }

    /// New board with `cell` emptied. Fails if already empty.
    pub fn remove(&self, cell: usize) -> Result<Board, BoardError> {
        if cell >= CELL_COUNT {
            return Err(BoardError::CellOutOfRange(cell));
        }
        if self.cells[cell].is_none() {
            return Err(BoardError::EmptyCell(cell));
        }
        let mut cells = self.cells.clone();
        cells[cell] = None;
        Ok(Self::assemble(cells, self.deck.clone(), self.combo_count))
    }

    /// New board with a die spawned at an empty cell. The kind must be a deck
    /// member or the placeholder.
    pub fn spawn(&self, kind: DieKind, cell: usize, pip: u8) -> Result<Board, BoardError> {
        if !self.deck.contains(&kind) && kind != DieKind::Placeholder {
            return Err(BoardError::KindNotInDeck(kind.token().to_string()));
        }
        if cell >= CELL_COUNT {
            return Err(BoardError::CellOutOfRange(cell));
        }
        if self.cells[cell].is_some() {
            return Err(BoardError::OccupiedCell(cell));
        }
        let die = Die::new(kind, pip)?;
        let mut cells = self.cells.clone();
        cells[cell] = Some(die);
        Ok(Self::assemble(cells, self.deck.clone(), self.combo_count))
    }

    /// Merge `src` onto `dest`. Fails unless [`Board::legal_merge`].
    ///
    /// Joker source: `dest` is unchanged and `src` becomes a copy of `dest`.
    /// Otherwise both cells empty out and `new_kind` spawns at `dest` with
    /// pip = old dest pip + 1; a combo source increments the lineage counter.
    pub fn merge(&self, src: usize, dest: usize, new_kind: DieKind) -> Result<Board, BoardError> {
        if !self.legal_merge(src, dest) {
            return Err(BoardError::IllegalMerge { src, dest });
        }
        if !self.deck.contains(&new_kind) && new_kind != DieKind::Placeholder {
            return Err(BoardError::KindNotInDeck(new_kind.token().to_string()));
        }
        let (Some(src_die), Some(dest_die)) = (self.cells[src].clone(), self.cells[dest].clone())
        else {
            return Err(BoardError::IllegalMerge { src, dest });
        };
        let mut cells = self.cells.clone();
        if src_die.kind == DieKind::Joker {
            cells[src] = Some(dest_die);
            return Ok(Self::assemble(cells, self.deck.clone(), self.combo_count));
        }
        let combo_count = self.combo_count + u32::from(src_die.kind == DieKind::Combo);
        cells[src] = None;
        cells[dest] = Some(Die {
            kind: new_kind,
            // legal_merge guarantees dest pip < PIP_MAX
            pip: dest_die.pip + 1,
        });
        Ok(Self::assemble(cells, self.deck.clone(), combo_count))
    }

    /// Enumerate every successor board: one merge per legal ordered pair (the
    /// destination gets a placeholder, standing in for whichever die spawns)
    /// and one growth step per growth die below the pip cap.
    pub fn next_states(&self) -> Vec<(Action, Board)> {
        let mut out = Vec::new();
        for (src, dest) in self.possible_merges() {
            if let Ok(board) = self.merge(src, dest, DieKind::Placeholder) {
                out.push((Action::Merge { src, dest }, board));
            }
        }
        for cell in 0..CELL_COUNT {
            if let Some(die) = &self.cells[cell] {
                if die.kind == DieKind::Growth && die.pip < PIP_MAX {
                    let mut cells = self.cells.clone();
                    cells[cell] = Some(Die {
                        kind: DieKind::Placeholder,
                        pip: die.pip + 1,
                    });
                    out.push((
                        Action::Grow { cell },
                        Self::assemble(cells, self.deck.clone(), self.combo_count),
                    ));
                }
            }
        }
        out
    }
}

/// Moon-aura multipliers, derived once per board.
///
/// Moons and placeholders project an aura onto their orthogonal neighbors: the
/// weight is the strongest adjacent moon pip (placeholders count at pip / 5,
/// being one-in-five likely to resolve to the deck's moon). The per-pip bonus
/// steps up from 0.15 to 0.18 when the board holds an active count (3, 5 or 7)
/// of moon-ish dice. No moon-ish dice means all multipliers are 1.
fn compute_speed_ups(cells: &[Option<Die>; CELL_COUNT]) -> [f64; CELL_COUNT] {
    let mut spd_ups = [1.0; CELL_COUNT];
    let moonish = cells
        .iter()
        .flatten()
        .filter(|d| matches!(d.kind, DieKind::Moon | DieKind::Placeholder))
        .count();
    if moonish == 0 {
        return spd_ups;
    }
    let pp = if matches!(moonish, 3 | 5 | 7) {
        MOON_ACTIVE_SPD_UP_PP
    } else {
        MOON_BASE_SPD_UP_PP
    };
    for (i, spd_up) in spd_ups.iter_mut().enumerate() {
        let mut weight: f64 = 0.0;
        for j in adjacent_cells(i) {
            if let Some(die) = &cells[j] {
                match die.kind {
                    DieKind::Moon => weight = weight.max(die.pip as f64),
                    DieKind::Placeholder => {
                        weight = weight.max(die.pip as f64 / DECK_SIZE as f64)
                    }
                    _ => {}
                }
            }
        }
        if weight > 0.0 {
            *spd_up = 1.0 + weight * pp;
        }
    }
    spd_ups
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..CELL_COUNT / GRID_COLS {
            let tokens: Vec<String> = self.cells[row * GRID_COLS..(row + 1) * GRID_COLS]
                .iter()
                .map(|c| match c {
                    None => "0".to_string(),
                    Some(die) => die.token(),
                })
                .collect();
            writeln!(f, "[{}]", tokens.join(", "))?;
        }
        Ok(())
    }
}
