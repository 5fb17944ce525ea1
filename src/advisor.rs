//! Glue between the board engine and the solver: expand a bounded frontier,
//! flatten it into a transition table, solve, and read the greedy action for
//! the current board.
//!
//! The placeholder die already stands for "whichever of the five dice spawns
//! next", so every action has exactly one outcome and is declared with
//! probability 1. Rewards follow the interchange contract:
//! `reward(s, a, s') = score(parse(s')) - score(parse(s))` over the canonical
//! serialize/parse round trip.

use std::collections::HashMap;

use thiserror::Error;

use crate::board::Board;
use crate::constants::{DEFAULT_BREADTH, DEFAULT_DEPTH, DEFAULT_GAMMA};
use crate::context::GameContext;
use crate::frontier::expand_frontier;
use crate::mdp::{Mdp, MdpError, TransitionProb};
use crate::types::{Action, BoardError};

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error(transparent)]
    Board(#[from] BoardError),
    #[error(transparent)]
    Mdp(#[from] MdpError),
}

/// Search and solver parameters for one recommendation.
#[derive(Clone, Copy, Debug)]
pub struct AdvisorParams {
    /// Frontier depth (levels of look-ahead).
    pub depth: usize,
    /// Beam width per frontier level.
    pub breadth: usize,
    /// Discount factor, in [0, 1).
    pub gamma: f64,
}

impl Default for AdvisorParams {
    fn default() -> Self {
        AdvisorParams {
            depth: DEFAULT_DEPTH,
            breadth: DEFAULT_BREADTH,
            gamma: DEFAULT_GAMMA,
        }
    }
}

/// Recommend the optimal next action for `board`, or `None` when the explored
/// subgraph offers no action from it.
pub fn recommend(
    ctx: &GameContext,
    board: &Board,
    params: &AdvisorParams,
) -> Result<Option<Action>, AdvisorError> {
    let frontier = expand_frontier(ctx, board, params.depth, params.breadth);

    // Flatten the frontier into solver inputs.
    let mut states: Vec<String> = Vec::new();
    let mut transitions: Vec<TransitionProb> = Vec::new();
    let mut action_by_token: HashMap<String, Action> = HashMap::new();
    for (state, successors) in &frontier {
        states.push(state.clone());
        for (action, result) in successors {
            let token = action.token();
            let result_state = result.serialize();
            states.push(result_state.clone());
            // deterministic outcome: the placeholder absorbs spawn uncertainty
            transitions.push(TransitionProb::new(
                state.clone(),
                token.clone(),
                result_state,
                1.0,
            ));
            action_by_token.insert(token, action.clone());
        }
    }
    if transitions.is_empty() {
        return Ok(None);
    }
    let actions: Vec<String> = action_by_token.keys().cloned().collect();

    // Score every declared state once, so the reward function is a pure
    // lookup and parse failures surface here instead of inside the solver.
    let mut score_by_state: HashMap<String, f64> = HashMap::with_capacity(states.len());
    for state in &states {
        if !score_by_state.contains_key(state) {
            let parsed = Board::parse(state, ctx.deck().clone())?;
            score_by_state.insert(state.clone(), ctx.score(&parsed));
        }
    }
    let reward = |state: &str, _action: &str, result: &str| -> f64 {
        score_by_state[result] - score_by_state[state]
    };

    let mdp = Mdp::new(&states, &actions, &transitions, reward, params.gamma)?;
    let policy = mdp.solve()?;

    // Greedy over the actions actually available from the root. A plain
    // argmax over the full action set would fall back to an undeclared
    // (state, action) pair (Q = 0) whenever every real option has negative
    // value, recommending a move the board cannot take.
    let root_state = board.serialize();
    let mut root_tokens: Vec<String> = frontier
        .get(&root_state)
        .map(|succ| succ.iter().map(|(a, _)| a.token()).collect())
        .unwrap_or_default();
    root_tokens.sort_unstable();
    let mut best: Option<(f64, &String)> = None;
    for token in &root_tokens {
        if let Some(q) = policy.q_star(&root_state, token) {
            let better = match best {
                Some((best_q, _)) => q > best_q,
                None => true,
            };
            if better {
                best = Some((q, token));
            }
        }
    }
    Ok(best.and_then(|(_, token)| action_by_token.get(token).cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::types::{Deck, DieKind};

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

    #[test]
    fn test_empty_board_has_no_recommendation() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone());
        let action = recommend(&ctx, &board, &AdvisorParams::default()).unwrap();
        assert_eq!(action, None);
    }

    #[test]
    fn test_recommends_a_legal_action() {
        let ctx = test_ctx();
        let board = Board::empty(ctx.deck().clone())
            .spawn(DieKind::Combo, 0, 1)
            .unwrap()
            .spawn(DieKind::Combo, 1, 1)
            .unwrap()
            .spawn(DieKind::Growth, 2, 1)
            .unwrap();
        let action = recommend(&ctx, &board, &AdvisorParams::default())
            .unwrap()
            .expect("non-empty board must yield an action");
        match action {
            Action::Merge { src, dest } => assert!(board.legal_merge(src, dest)),
            Action::Grow { cell } => {
                let die = board.die_at(cell).unwrap();
                assert_eq!(die.kind, DieKind::Growth);
                assert!(die.pip < 7);
            }
        }
    }
}
