//! Bounded frontier expansion: a score-ranked beam over the reachable graph.
//!
//! The beam is a heuristic candidate generator, not part of any optimality
//! guarantee: at each depth level every frontier board is expanded, and only
//! the `breadth` highest-scoring children survive to the next level. Pruning
//! ranks by raw current-state DPS and stays fully decoupled from the solver's
//! value function.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::board::Board;
use crate::context::GameContext;
use crate::types::Action;

/// Union of every visited state's successor map, keyed by canonical state.
pub type FrontierMap = HashMap<String, Vec<(Action, Board)>>;

/// Expand `depth` levels from `root`, keeping a beam of `breadth` boards per
/// level. Returns the successor map of every board visited along the way.
pub fn expand_frontier(
    ctx: &GameContext,
    root: &Board,
    depth: usize,
    breadth: usize,
) -> FrontierMap {
    let mut visited: FrontierMap = HashMap::new();
    let mut frontier = vec![root.clone()];
    for _ in 0..depth {
        let mut children: Vec<Board> = Vec::new();
        for board in &frontier {
            let successors = visited
                .entry(board.serialize())
                .or_insert_with(|| board.next_states());
            children.extend(successors.iter().map(|(_, next)| next.clone()));
        }
        // score-ranked beam: keep the `breadth` highest-scoring children
        let mut ranked: Vec<(f64, Board)> = children
            .into_iter()
            .map(|b| (ctx.score(&b), b))
            .collect();
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        if ranked.len() > breadth {
            ranked.drain(..ranked.len() - breadth);
        }
        frontier = ranked.into_iter().map(|(_, b)| b).collect();
    }
    visited
}
