//! Dice-attribute catalog: per-kind damage multiplier and attack speed.
//!
//! The catalog is external data — a JSON array with one row per die — loaded
//! once into an in-memory map and read-only to the rest of the crate. Joker
//! and placeholder need no entry: the joker scores as its best deck substitute
//! and the placeholder scores from the session baseline.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DieKind;

/// One catalog row as stored on disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogRow {
    /// Die-kind token (`c`, `g`, `m`, `o`, or an ordinary id).
    pub id: String,
    pub name: String,
    /// Class level of the die, 1-5.
    pub class: u8,
    /// Base damage multiplier ("mtd").
    pub mtd: f64,
    /// Attack interval divisor; lower is faster.
    pub atk_spd: f64,
}

/// In-memory attributes for one die kind.
#[derive(Clone, Debug, PartialEq)]
pub struct DieStats {
    pub name: String,
    pub class: u8,
    pub mtd: f64,
    pub atk_spd: f64,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad catalog id: {0:?}")]
    BadId(String),
    #[error("duplicate catalog id: {0}")]
    DuplicateId(String),
    #[error("non-positive attack speed for {id}: {atk_spd}")]
    BadAttackSpeed { id: String, atk_spd: f64 },
    #[error("no catalog entry for die kind: {0}")]
    MissingKind(String),
}

/// Read-only die-attribute lookup, keyed by kind.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: HashMap<DieKind, DieStats>,
}

impl Catalog {
    pub fn from_rows(rows: Vec<CatalogRow>) -> Result<Self, CatalogError> {
        let mut entries = HashMap::with_capacity(rows.len());
        for row in rows {
            let kind = DieKind::from_token(&row.id)
                .map_err(|_| CatalogError::BadId(row.id.clone()))?;
            if matches!(kind, DieKind::Joker | DieKind::Placeholder) {
                return Err(CatalogError::BadId(row.id));
            }
            if row.atk_spd <= 0.0 {
                return Err(CatalogError::BadAttackSpeed {
                    id: row.id,
                    atk_spd: row.atk_spd,
                });
            }
            let stats = DieStats {
                name: row.name,
                class: row.class,
                mtd: row.mtd,
                atk_spd: row.atk_spd,
            };
            if entries.insert(kind, stats).is_some() {
                return Err(CatalogError::DuplicateId(row.id));
            }
        }
        Ok(Catalog { entries })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let rows: Vec<CatalogRow> = serde_json::from_str(json)?;
        Self::from_rows(rows)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Attributes for `kind`, if cataloged.
    pub fn stats(&self, kind: &DieKind) -> Option<&DieStats> {
        self.entries.get(kind)
    }

    /// Built-in catalog covering the four stat-bearing specials plus a small
    /// roster of ordinary dice, for tests and the demo driver.
    pub fn builtin() -> Self {
        let rows = vec![
            row("c", "Combo", 3, 10.0, 1.0),
            row("g", "Growth", 3, 15.0, 1.0),
            row("m", "Mimic", 4, 20.0, 1.0),
            row("o", "Moon", 4, 12.0, 1.0),
            row("1", "Fire", 1, 24.0, 0.8),
            row("2", "Electric", 1, 18.0, 0.6),
            row("3", "Wind", 2, 9.0, 0.4),
            row("4", "Iron", 2, 40.0, 1.6),
        ];
        // Rows above are well-formed by construction.
        Self::from_rows(rows).expect("builtin catalog is valid")
    }
}

fn row(id: &str, name: &str, class: u8, mtd: f64, atk_spd: f64) -> CatalogRow {
    CatalogRow {
        id: id.to_string(),
        name: name.to_string(),
        class,
        mtd,
        atk_spd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_specials() {
        let cat = Catalog::builtin();
        for kind in [DieKind::Combo, DieKind::Growth, DieKind::Mimic, DieKind::Moon] {
            assert!(cat.stats(&kind).is_some(), "missing {kind:?}");
        }
        assert!(cat.stats(&DieKind::Joker).is_none());
        assert!(cat.stats(&DieKind::Placeholder).is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let json = r#"[
            {"id": "c", "name": "Combo", "class": 3, "mtd": 10.0, "atk_spd": 1.0},
            {"id": "12", "name": "Gun", "class": 1, "mtd": 5.5, "atk_spd": 0.5}
        ]"#;
        let cat = Catalog::from_json(json).unwrap();
        assert_eq!(cat.stats(&DieKind::Combo).unwrap().mtd, 10.0);
        let gun = DieKind::from_token("12").unwrap();
        assert_eq!(cat.stats(&gun).unwrap().atk_spd, 0.5);
    }

    #[test]
    fn test_rejects_bad_rows() {
        assert!(matches!(
            Catalog::from_rows(vec![row("j", "Joker", 4, 0.0, 1.0)]),
            Err(CatalogError::BadId(_))
        ));
        assert!(matches!(
            Catalog::from_rows(vec![row("c", "Combo", 3, 10.0, 0.0)]),
            Err(CatalogError::BadAttackSpeed { .. })
        ));
        assert!(matches!(
            Catalog::from_rows(vec![
                row("c", "Combo", 3, 10.0, 1.0),
                row("c", "Combo", 3, 11.0, 1.0),
            ]),
            Err(CatalogError::DuplicateId(_))
        ));
    }
}
