//! Session scoring context: catalog, deck baselines, and the bounded DPS cache.
//!
//! [`GameContext`] is built once per session and then treated as read-only by
//! everything downstream (frontier search, advisor). The placeholder baseline
//! — the mean single-die score of each deck member placed alone at pip 1 — is
//! derived here at construction and threaded explicitly instead of living at
//! process scope.
//!
//! Scores are memoized in a session-owned cache keyed by canonical state plus
//! the lineage combo counter. Content-addressed keys mean cached values are
//! never stale, and per-session ownership means a value computed under one
//! deck can never be served for another.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::board::Board;
use crate::catalog::{Catalog, CatalogError};
use crate::constants::{CELL_COUNT, COMBO_DPS_PER_COUNT, DECK_SIZE, PIP_MAX, SCORE_CACHE_CAPACITY};
use crate::types::{Deck, Die, DieKind};

/// Bounded, LRU-evicted score cache.
///
/// Entries carry a last-touch tick; when the map reaches capacity the
/// least-recently-touched half is dropped in one pass, so eviction cost is
/// amortized over at least capacity/2 inserts.
struct ScoreCache {
    map: HashMap<String, (u64, f64)>,
    tick: u64,
    capacity: usize,
}

impl ScoreCache {
    fn new(capacity: usize) -> Self {
        ScoreCache {
            map: HashMap::new(),
            tick: 0,
            capacity,
        }
    }

    fn get(&mut self, key: &str) -> Option<f64> {
        self.tick += 1;
        let tick = self.tick;
        self.map.get_mut(key).map(|entry| {
            entry.0 = tick;
            entry.1
        })
    }

    fn insert(&mut self, key: String, value: f64) {
        if self.map.len() >= self.capacity {
            self.evict_older_half();
        }
        self.tick += 1;
        self.map.insert(key, (self.tick, value));
    }

    fn evict_older_half(&mut self) {
        let mut ticks: Vec<u64> = self.map.values().map(|&(t, _)| t).collect();
        ticks.sort_unstable();
        let cutoff = ticks[ticks.len() / 2];
        self.map.retain(|_, &mut (t, _)| t >= cutoff);
    }

    fn clear(&mut self) {
        self.map.clear();
    }

    fn len(&self) -> usize {
        self.map.len()
    }
}

/// Per-session scoring engine: catalog + deck + derived baselines + cache.
pub struct GameContext {
    catalog: Catalog,
    deck: Deck,
    placeholder_dps: f64,
    cache: RefCell<ScoreCache>,
}

impl GameContext {
    /// Build a session context. Fails if any stat-bearing deck member (i.e.
    /// anything but joker and placeholder) is missing from the catalog.
    pub fn new(catalog: Catalog, deck: Deck) -> Result<Self, CatalogError> {
        for kind in deck.iter() {
            if matches!(kind, DieKind::Joker | DieKind::Placeholder) {
                continue;
            }
            if catalog.stats(kind).is_none() {
                return Err(CatalogError::MissingKind(kind.token().to_string()));
            }
        }
        let mut ctx = GameContext {
            catalog,
            deck: deck.clone(),
            placeholder_dps: 0.0,
            cache: RefCell::new(ScoreCache::new(SCORE_CACHE_CAPACITY)),
        };

        // Baseline bootstrap: score each deck member alone at cell 0, pip 1,
        // with the placeholder baseline still at 0, then average over the deck.
        let empty = Board::empty(deck.clone());
        let mut total = 0.0;
        for kind in deck.iter() {
            if let Ok(single) = empty.spawn(kind.clone(), 0, 1) {
                total += ctx.score_uncached(&single);
            }
        }
        ctx.placeholder_dps = total / DECK_SIZE as f64;
        // Bootstrap scores were computed against the zero baseline; drop them
        // so growth/placeholder states are never served stale values.
        ctx.cache.borrow_mut().clear();
        Ok(ctx)
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Mean single-die score of the deck ("average placeholder DPS").
    pub fn placeholder_dps(&self) -> f64 {
        self.placeholder_dps
    }

    /// Total board DPS, memoized by canonical state + combo counter.
    pub fn score(&self, board: &Board) -> f64 {
        let key = format!("{}#{}", board.serialize(), board.combo_count());
        if let Some(hit) = self.cache.borrow_mut().get(&key) {
            return hit;
        }
        let dps = self.score_uncached(board);
        self.cache.borrow_mut().insert(key, dps);
        dps
    }

    fn score_uncached(&self, board: &Board) -> f64 {
        (0..CELL_COUNT)
            .filter_map(|cell| board.die_at(cell).map(|die| self.die_dps(board, cell, die)))
            .sum()
    }

    /// DPS contribution of one die at `cell`, one rule per kind.
    pub fn die_dps(&self, board: &Board, cell: usize, die: &Die) -> f64 {
        let spd_up = board.speed_up(cell);
        let pip = die.pip as f64;
        match &die.kind {
            DieKind::Placeholder => self.placeholder_dps * pip * spd_up,
            DieKind::Joker => self
                .deck
                .iter()
                .filter(|k| **k != DieKind::Joker)
                .map(|k| {
                    self.die_dps(
                        board,
                        cell,
                        &Die {
                            kind: k.clone(),
                            pip: die.pip,
                        },
                    )
                })
                .fold(0.0, f64::max),
            DieKind::Combo => match self.catalog.stats(&die.kind) {
                Some(stats) => {
                    let mtd = stats.mtd + board.combo_count() as f64 * COMBO_DPS_PER_COUNT;
                    mtd * pip * spd_up / stats.atk_spd
                }
                None => 0.0,
            },
            DieKind::Growth if die.pip < PIP_MAX => {
                self.placeholder_dps * (die.pip + 1).min(PIP_MAX) as f64 * spd_up
            }
            kind => match self.catalog.stats(kind) {
                Some(stats) => stats.mtd * pip * spd_up / stats.atk_spd,
                // kinds outside the validated set contribute nothing
                None => 0.0,
            },
        }
    }

    #[cfg(test)]
    fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::COMBO_BASE_COUNT;

    fn test_ctx() -> GameContext {
        let deck = Deck::new(vec![
            DieKind::Combo,
            DieKind::Joker,
            DieKind::Moon,
            DieKind::Growth,
            DieKind::Mimic,
        ])
        .unwrap();
        GameContext::new(Catalog::builtin(), deck).unwrap()
    }

    // Builtin stats: combo mtd 10 (+10/count), growth 15, mimic 20, moon 12,
    // all at attack speed 1. Bootstrap singles: combo 20 (count starts at 1),
    // joker 20 (best substitute), moon 12, growth 0 (zero baseline), mimic 20
    // => baseline (20+20+12+0+20)/5 = 14.4.
    const BASELINE: f64 = 14.4;

    #[test]
    fn test_placeholder_baseline() {
        let ctx = test_ctx();
        assert!((ctx.placeholder_dps() - BASELINE).abs() < 1e-9);
    }

    #[test]
    fn test_empty_board_scores_zero() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone());
        assert_eq!(ctx.score(&board), 0.0);
    }

    #[test]
    fn test_single_placeholder_scores_baseline_times_pip() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone())
            .spawn(DieKind::Placeholder, 0, 3)
            .unwrap();
        assert!((ctx.score(&board) - BASELINE * 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_growth_scores_one_pip_ahead() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone())
            .spawn(DieKind::Growth, 0, 1)
            .unwrap();
        // growth below the cap scores as a placeholder at pip+1, with the
        // real baseline (not the zero bootstrap value)
        assert!((ctx.score(&board) - BASELINE * 2.0).abs() < 1e-9);

        let capped = Board::empty(ctx.deck().clone())
            .spawn(DieKind::Growth, 0, 7)
            .unwrap();
        assert!((ctx.score(&capped) - 15.0 * 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_joker_takes_best_substitute() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone())
            .spawn(DieKind::Joker, 0, 1)
            .unwrap();
        // best non-joker substitute at pip 1 is growth: baseline * 2 = 28.8
        assert!((ctx.score(&board) - BASELINE * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_combo_scales_with_lineage_counter() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone())
            .spawn(DieKind::Combo, 0, 1)
            .unwrap()
            .spawn(DieKind::Combo, 1, 1)
            .unwrap();
        let merged = board.merge(0, 1, DieKind::Combo).unwrap();
        assert_eq!(merged.combo_count(), COMBO_BASE_COUNT + 1);
        // (10 + 2*10) * pip 2 / 1.0
        assert!((ctx.score(&merged) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_moon_buffs_neighbor() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone())
            .spawn(DieKind::Moon, 0, 2)
            .unwrap()
            .spawn(DieKind::Mimic, 1, 1)
            .unwrap();
        // mimic 20 * pip 1 * (1 + 2*0.15), moon 12 * pip 2 unbuffed
        let expected = 20.0 * 1.3 + 24.0;
        assert!((ctx.score(&board) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_memoized_and_stable() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone())
            .spawn(DieKind::Mimic, 3, 4)
            .unwrap();
        let first = ctx.score(&board);
        let misses = ctx.cache_len();
        let second = ctx.score(&board);
        assert_eq!(first, second);
        assert_eq!(ctx.cache_len(), misses, "second call must hit the cache");

        let equal = Board::parse(&board.serialize(), ctx.deck().clone()).unwrap();
        assert_eq!(ctx.score(&equal), first);
    }

    #[test]
    fn test_cache_eviction_keeps_bound() {
        let mut cache = ScoreCache::new(8);
        for i in 0..100 {
            cache.insert(format!("k{i}"), i as f64);
        }
        assert!(cache.len() <= 8);
        // most recent entry survives
        assert_eq!(cache.get("k99"), Some(99.0));
    }
}
