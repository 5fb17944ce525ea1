//! # Dicemerge — dice-merge board simulator and optimal-move advisor
//!
//! Models a single-player dice-merging puzzle on a fixed 3×5 grid with a fixed
//! five-die deck, and recommends a next move by combining a bounded beam search
//! over reachable boards with **synchronous value iteration** over the sampled
//! transition model.
//!
//! ## Pipeline
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | 1 | [`board`] | Immutable board snapshots: merge/growth/spawn/remove transitions, legality checks, canonical serialization |
//! | 2 | [`context`] | Session-scoped scoring: dice catalog, deck baselines, bounded DPS cache |
//! | 3 | [`frontier`] | Score-ranked beam expansion of the reachable state graph |
//! | 4 | [`mdp`] | Value iteration to Q\*, V\*, π\* over the flattened transition table |
//! | 5 | [`advisor`] | Glue: frontier → transition table → solver → greedy action |
//!
//! ## State representation
//!
//! A board serializes to 15 comma-joined cell tokens, each either `0` (empty)
//! or `<kind><pip>` (e.g. `c3` = combo die at pip 3, `x1` = placeholder at
//! pip 1). The serialization is the board's identity: two boards compare equal
//! iff their canonical strings match, and the same strings key both the DPS
//! cache and the solver's state set.
//!
//! The placeholder kind `x` stands for "whichever die spawns next": every merge
//! produces a placeholder at the destination, so action outcomes are
//! deterministic and each transition carries probability 1.
//!
//! ## Scoring
//!
//! Per-cell DPS contributions are summed over the board, with special rules for
//! combo (scales with the lineage-carried combo counter), growth (scores one
//! pip ahead until capped), joker (best non-joker deck substitute), and moon
//! (speed-up aura over adjacent cells). Scores are memoized in a bounded
//! session cache keyed by canonical state.

pub mod advisor;
pub mod board;
pub mod catalog;
pub mod constants;
pub mod context;
pub mod frontier;
pub mod mdp;
pub mod types;
