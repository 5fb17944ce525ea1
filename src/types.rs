//! Die kinds, deck, actions, and the board-engine error taxonomy.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::constants::{CELL_COUNT, DECK_SIZE, PIP_MAX, PIP_MIN};

/// Closed alphabet of die kinds.
///
/// The five specials carry fixed single-letter tokens; ordinary catalog dice
/// are identified by their catalog id. [`DieKind::Placeholder`] (`x`) marks a
/// die whose identity is not yet determined — every merge result and the
/// growth transition spawn placeholders.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum DieKind {
    /// Catalog die, keyed by id.
    Ordinary(Arc<str>),
    Combo,
    Growth,
    Joker,
    Mimic,
    Moon,
    Placeholder,
}

impl DieKind {
    /// Parse a kind token (everything in a cell token except the trailing pip
    /// digit). `0` is the empty-cell marker and is rejected here.
    pub fn from_token(token: &str) -> Result<Self, BoardError> {
        match token {
            "c" => Ok(DieKind::Combo),
            "g" => Ok(DieKind::Growth),
            "j" => Ok(DieKind::Joker),
            "m" => Ok(DieKind::Mimic),
            "o" => Ok(DieKind::Moon),
            "x" => Ok(DieKind::Placeholder),
            "" | "0" => Err(BoardError::BadToken(token.to_string())),
            id if id.contains(',') => Err(BoardError::BadToken(token.to_string())),
            id => Ok(DieKind::Ordinary(Arc::from(id))),
        }
    }

    /// Canonical token for this kind.
    pub fn token(&self) -> &str {
        match self {
            DieKind::Ordinary(id) => id,
            DieKind::Combo => "c",
            DieKind::Growth => "g",
            DieKind::Joker => "j",
            DieKind::Mimic => "m",
            DieKind::Moon => "o",
            DieKind::Placeholder => "x",
        }
    }

    /// One of the five special kinds (placeholder excluded).
    pub fn is_special(&self) -> bool {
        matches!(
            self,
            DieKind::Combo | DieKind::Growth | DieKind::Joker | DieKind::Mimic | DieKind::Moon
        )
    }
}

impl fmt::Display for DieKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// One die instance: kind plus pip level in [1, 7].
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Die {
    pub kind: DieKind,
    pub pip: u8,
}

impl Die {
    pub fn new(kind: DieKind, pip: u8) -> Result<Self, BoardError> {
        if !(PIP_MIN..=PIP_MAX).contains(&pip) {
            return Err(BoardError::PipOutOfRange(pip));
        }
        Ok(Die { kind, pip })
    }

    /// Cell token: `<kind><pip>`.
    pub fn token(&self) -> String {
        format!("{}{}", self.kind.token(), self.pip)
    }
}

/// The five-die hand fixed for a session. Cheap to clone (shared storage).
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Deck {
    kinds: Arc<[DieKind; DECK_SIZE]>,
}

impl Deck {
    pub fn new(kinds: Vec<DieKind>) -> Result<Self, BoardError> {
        let len = kinds.len();
        let arr: [DieKind; DECK_SIZE] = kinds
            .try_into()
            .map_err(|_| BoardError::BadDeckSize(len))?;
        Ok(Deck {
            kinds: Arc::new(arr),
        })
    }

    pub fn contains(&self, kind: &DieKind) -> bool {
        self.kinds.iter().any(|k| k == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DieKind> {
        self.kinds.iter()
    }
}

impl fmt::Display for Deck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = self.kinds.iter().map(|k| k.token()).collect();
        write!(f, "[{}]", tokens.join(", "))
    }
}

/// A board transition the player can take: merge two dice, or level a growth
/// die. Tokens use 1-based cell indices (`m_1_2`, `g_3`).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    Merge { src: usize, dest: usize },
    Grow { cell: usize },
}

impl Action {
    /// Canonical action token, used as the solver's action key.
    pub fn token(&self) -> String {
        match self {
            Action::Merge { src, dest } => format!("m_{}_{}", src + 1, dest + 1),
            Action::Grow { cell } => format!("g_{}", cell + 1),
        }
    }

    /// Parse an action token back into an action.
    pub fn from_token(token: &str) -> Result<Self, BoardError> {
        let bad = || BoardError::BadToken(token.to_string());
        let mut parts = token.split('_');
        let parsed = match parts.next() {
            Some("m") => {
                let src: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
                let dest: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
                if src < 1 || dest < 1 {
                    return Err(bad());
                }
                Action::Merge {
                    src: src - 1,
                    dest: dest - 1,
                }
            }
            Some("g") => {
                let cell: usize = parts.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
                if cell < 1 {
                    return Err(bad());
                }
                Action::Grow { cell: cell - 1 }
            }
            _ => return Err(bad()),
        };
        if parts.next().is_some() {
            return Err(bad());
        }
        Ok(parsed)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

/// Board-engine contract violations. All are synchronous, local, and
/// unrecoverable; callers are expected to pre-validate via `legal_merge` /
/// `empty_cells` rather than probe with fallible calls.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("expected {CELL_COUNT} cells, got {0}")]
    BadCellCount(usize),
    #[error("expected {DECK_SIZE} deck entries, got {0}")]
    BadDeckSize(usize),
    #[error("cell index out of range: {0}")]
    CellOutOfRange(usize),
    #[error("cell {0} is empty")]
    EmptyCell(usize),
    #[error("cell {0} already holds a die")]
    OccupiedCell(usize),
    #[error("pip out of range [1, 7]: {0}")]
    PipOutOfRange(u8),
    #[error("die kind {0} is not in the deck")]
    KindNotInDeck(String),
    #[error("illegal merge: {src} -> {dest}")]
    IllegalMerge { src: usize, dest: usize },
    #[error("unrecognized token: {0:?}")]
    BadToken(String),
    #[error("malformed state string: {0}")]
    BadStateString(String),
}
