//! Markov-decision solver: synchronous value iteration over an explicit,
//! finite transition table.
//!
//! The solver is a single batch computation with no internal state machine.
//! It consumes declared states, actions, `(state, action, result, prob)`
//! tuples, and a reward function, and iterates
//!
//! ```text
//! Q*(s,a) = Σ_{s'} P(s'|s,a) · [R(s,a,s') + γ · max_{a'} Q*(s',a')]
//! ```
//!
//! until the max absolute change across all (s, a) falls below [`Q_EPSILON`].
//! Every update in a sweep reads the previous sweep's frozen snapshot, which
//! makes the sweep embarrassingly parallel per state — each is distributed
//! with rayon. Rewards are evaluated once per declared transition at
//! construction, so sweeps are pure reads.
//!
//! Probabilities are validated to lie in [0, 1]; the solver deliberately does
//! not check that outcomes of a fixed (s, a) sum to 1 — normalization is the
//! model builder's contract.

use std::collections::HashMap;

use rayon::prelude::*;
use thiserror::Error;

use crate::constants::{MAX_SWEEPS, Q_EPSILON};

/// Solver contract violations and non-convergence.
#[derive(Debug, Error, PartialEq)]
pub enum MdpError {
    #[error("undeclared state: {0:?}")]
    UnknownState(String),
    #[error("undeclared action: {0:?}")]
    UnknownAction(String),
    #[error("probability out of range [0, 1]: {0}")]
    BadProbability(f64),
    #[error("discount factor out of range [0, 1): {0}")]
    BadGamma(f64),
    #[error("value iteration did not converge within {0} sweeps")]
    NoConvergence(usize),
}

/// One declared transition: from `state`, taking `action`, reach `result`
/// with probability `prob`. States and actions are canonical tokens.
#[derive(Clone, Debug)]
pub struct TransitionProb {
    pub state: String,
    pub action: String,
    pub result: String,
    pub prob: f64,
}

impl TransitionProb {
    pub fn new(
        state: impl Into<String>,
        action: impl Into<String>,
        result: impl Into<String>,
        prob: f64,
    ) -> Self {
        TransitionProb {
            state: state.into(),
            action: action.into(),
            result: result.into(),
            prob,
        }
    }
}

/// Interned outcome: result-state index, probability, precomputed reward.
#[derive(Clone, Copy, Debug)]
struct Outcome {
    result: usize,
    prob: f64,
    reward: f64,
}

/// A validated, reward-annotated transition model ready to solve.
#[derive(Debug)]
pub struct Mdp {
    states: Vec<String>,
    actions: Vec<String>,
    state_index: HashMap<String, usize>,
    /// arcs[s * actions.len() + a]
    arcs: Vec<Vec<Outcome>>,
    gamma: f64,
}

impl Mdp {
    /// Validate and intern the model. States and actions are deduplicated and
    /// sorted, fixing the tie-break order of every later argmax. Fails on an
    /// undeclared state/action, a probability outside [0, 1], or gamma
    /// outside [0, 1). Duplicate (state, action, result) tuples keep the last
    /// declared probability.
    pub fn new(
        states: &[String],
        actions: &[String],
        transitions: &[TransitionProb],
        reward: impl Fn(&str, &str, &str) -> f64,
        gamma: f64,
    ) -> Result<Self, MdpError> {
        if !(0.0..1.0).contains(&gamma) {
            return Err(MdpError::BadGamma(gamma));
        }
        let mut states: Vec<String> = states.to_vec();
        states.sort_unstable();
        states.dedup();
        let mut actions: Vec<String> = actions.to_vec();
        actions.sort_unstable();
        actions.dedup();

        let state_index: HashMap<String, usize> = states
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let action_index: HashMap<&str, usize> = actions
            .iter()
            .enumerate()
            .map(|(i, a)| (a.as_str(), i))
            .collect();

        let num_actions = actions.len();
        let mut declared: Vec<HashMap<usize, f64>> = vec![HashMap::new(); states.len() * num_actions];
        for t in transitions {
            let s = *state_index
                .get(&t.state)
                .ok_or_else(|| MdpError::UnknownState(t.state.clone()))?;
            let a = *action_index
                .get(t.action.as_str())
                .ok_or_else(|| MdpError::UnknownAction(t.action.clone()))?;
            let r = *state_index
                .get(&t.result)
                .ok_or_else(|| MdpError::UnknownState(t.result.clone()))?;
            if !(0.0..=1.0).contains(&t.prob) {
                return Err(MdpError::BadProbability(t.prob));
            }
            declared[s * num_actions + a].insert(r, t.prob);
        }

        let arcs: Vec<Vec<Outcome>> = declared
            .iter()
            .enumerate()
            .map(|(sa, outcomes)| {
                let s = sa / num_actions;
                let a = sa % num_actions;
                let mut row: Vec<Outcome> = outcomes
                    .iter()
                    .map(|(&r, &prob)| Outcome {
                        result: r,
                        prob,
                        reward: reward(&states[s], &actions[a], &states[r]),
                    })
                    .collect();
                row.sort_by_key(|arc| arc.result);
                row
            })
            .collect();

        Ok(Mdp {
            states,
            actions,
            state_index,
            arcs,
            gamma,
        })
    }

    /// Run synchronous value iteration to the fixed point.
    pub fn solve(&self) -> Result<Policy, MdpError> {
        let num_states = self.states.len();
        let num_actions = self.actions.len();
        let mut q = vec![0.0f64; num_states * num_actions];

        let mut sweeps = 0;
        loop {
            if sweeps >= MAX_SWEEPS {
                return Err(MdpError::NoConvergence(MAX_SWEEPS));
            }
            sweeps += 1;

            // frozen snapshot of V(s') = max_a' Q(s', a') for this sweep
            let v_prev: Vec<f64> = (0..num_states)
                .map(|s| row_max(&q[s * num_actions..(s + 1) * num_actions]))
                .collect();

            let next: Vec<f64> = (0..num_states)
                .into_par_iter()
                .flat_map_iter(|s| {
                    let v_prev = &v_prev;
                    (0..num_actions).map(move |a| {
                        self.arcs[s * num_actions + a]
                            .iter()
                            .map(|arc| arc.prob * (arc.reward + self.gamma * v_prev[arc.result]))
                            .sum::<f64>()
                    })
                })
                .collect();

            let delta = q
                .iter()
                .zip(next.iter())
                .map(|(old, new)| (old - new).abs())
                .fold(0.0f64, f64::max);
            q = next;
            if delta < Q_EPSILON {
                break;
            }
        }

        let mut v = Vec::with_capacity(num_states);
        let mut pi = Vec::with_capacity(num_states);
        for s in 0..num_states {
            let row = &q[s * num_actions..(s + 1) * num_actions];
            // first maximal action wins ties (actions are in sorted order)
            let mut best = 0;
            for a in 1..row.len() {
                if row[a] > row[best] {
                    best = a;
                }
            }
            v.push(if row.is_empty() { 0.0 } else { row[best] });
            pi.push(best);
        }
        Ok(Policy {
            states: self.states.clone(),
            actions: self.actions.clone(),
            state_index: self.state_index.clone(),
            num_actions,
            q,
            v,
            pi,
            sweeps,
        })
    }
}

/// max over a Q row; empty rows (no declared actions) value to 0.
fn row_max(row: &[f64]) -> f64 {
    if row.is_empty() {
        return 0.0;
    }
    row.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Converged optimal value functions and greedy policy.
pub struct Policy {
    states: Vec<String>,
    actions: Vec<String>,
    state_index: HashMap<String, usize>,
    num_actions: usize,
    q: Vec<f64>,
    v: Vec<f64>,
    pi: Vec<usize>,
    sweeps: usize,
}

impl Policy {
    /// Q*(s, a), if both are declared.
    pub fn q_star(&self, state: &str, action: &str) -> Option<f64> {
        let s = *self.state_index.get(state)?;
        let a = self.actions.iter().position(|x| x == action)?;
        Some(self.q[s * self.num_actions + a])
    }

    /// V*(s) = max_a Q*(s, a).
    pub fn v_star(&self, state: &str) -> Option<f64> {
        let s = *self.state_index.get(state)?;
        Some(self.v[s])
    }

    /// π*(s) = argmax_a Q*(s, a); ties resolve to the first action in the
    /// solver's sorted order. `None` for undeclared states or an empty
    /// action set.
    pub fn pi_star(&self, state: &str) -> Option<&str> {
        let s = *self.state_index.get(state)?;
        self.actions.get(self.pi[s]).map(|a| a.as_str())
    }

    /// Declared states, in the solver's fixed order.
    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Sweeps taken to converge.
    pub fn sweeps(&self) -> usize {
        self.sweeps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_self_loop_fixed_point() {
        // one state, one self-loop with reward 1, gamma 0.5: Q* = 1/(1-γ) = 2
        let mdp = Mdp::new(
            &strs(&["s"]),
            &strs(&["a"]),
            &[TransitionProb::new("s", "a", "s", 1.0)],
            |_, _, _| 1.0,
            0.5,
        )
        .unwrap();
        let policy = mdp.solve().unwrap();
        let q = policy.q_star("s", "a").unwrap();
        assert!((q - 2.0).abs() < 1e-3, "q = {q}");
        assert_eq!(policy.pi_star("s"), Some("a"));
        assert!(policy.sweeps() < MAX_SWEEPS);
    }

    #[test]
    fn test_greedy_policy_picks_better_action() {
        // terminal state t; from s, `good` pays 10 and `bad` pays 1
        let states = strs(&["s", "t"]);
        let actions = strs(&["bad", "good"]);
        let transitions = vec![
            TransitionProb::new("s", "good", "t", 1.0),
            TransitionProb::new("s", "bad", "t", 1.0),
        ];
        let mdp = Mdp::new(
            &states,
            &actions,
            &transitions,
            |_, a, _| if a == "good" { 10.0 } else { 1.0 },
            0.5,
        )
        .unwrap();
        let policy = mdp.solve().unwrap();
        assert_eq!(policy.pi_star("s"), Some("good"));
        assert!((policy.v_star("s").unwrap() - 10.0).abs() < 1e-6);
        // terminal state has no outgoing arcs: all-zero row, first action wins
        assert_eq!(policy.pi_star("t"), Some("bad"));
        assert_eq!(policy.v_star("t"), Some(0.0));
    }

    #[test]
    fn test_branching_outcomes_weight_by_probability() {
        let states = strs(&["s", "hi", "lo"]);
        let actions = strs(&["a"]);
        let transitions = vec![
            TransitionProb::new("s", "a", "hi", 0.25),
            TransitionProb::new("s", "a", "lo", 0.75),
        ];
        let mdp = Mdp::new(
            &states,
            &actions,
            &transitions,
            |_, _, r| if r == "hi" { 8.0 } else { 0.0 },
            0.5,
        )
        .unwrap();
        let policy = mdp.solve().unwrap();
        assert!((policy.q_star("s", "a").unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_construction_contract() {
        let states = strs(&["s"]);
        let actions = strs(&["a"]);
        assert_eq!(
            Mdp::new(
                &states,
                &actions,
                &[TransitionProb::new("s", "a", "ghost", 1.0)],
                |_, _, _| 0.0,
                0.5,
            )
            .unwrap_err(),
            MdpError::UnknownState("ghost".to_string())
        );
        assert_eq!(
            Mdp::new(
                &states,
                &actions,
                &[TransitionProb::new("s", "zz", "s", 1.0)],
                |_, _, _| 0.0,
                0.5,
            )
            .unwrap_err(),
            MdpError::UnknownAction("zz".to_string())
        );
        assert_eq!(
            Mdp::new(
                &states,
                &actions,
                &[TransitionProb::new("s", "a", "s", 1.5)],
                |_, _, _| 0.0,
                0.5,
            )
            .unwrap_err(),
            MdpError::BadProbability(1.5)
        );
        assert_eq!(
            Mdp::new(&states, &actions, &[], |_, _, _| 0.0, 1.0).unwrap_err(),
            MdpError::BadGamma(1.0)
        );
    }

    #[test]
    fn test_one_more_sweep_is_stable() {
        // after convergence, a manual Bellman backup changes Q by < epsilon
        let states = strs(&["s"]);
        let actions = strs(&["a"]);
        let mdp = Mdp::new(
            &states,
            &actions,
            &[TransitionProb::new("s", "a", "s", 1.0)],
            |_, _, _| 1.0,
            0.5,
        )
        .unwrap();
        let policy = mdp.solve().unwrap();
        let q = policy.q_star("s", "a").unwrap();
        let backed_up = 1.0 + 0.5 * q;
        assert!((backed_up - q).abs() < Q_EPSILON);
    }
}
