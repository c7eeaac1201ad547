//! Path scoring: reward-per-time and time-discounted-reward metrics
//!
//! Scores drive both bundle construction (via marginal gains) and the bids
//! replicated through consensus, so they must be finite and deterministic
//! for any reachable input.

use crate::agent::AgentState;
use crate::geometry::Point;
use crate::spatial::SpatialIndex;
use crate::types::{TaskId, MIN_SCORE};
use serde::{Deserialize, Serialize};

/// Fallback speed when the host has not reported one, m/s
pub const DEFAULT_VELOCITY: f64 = 2.0;

/// Scoring metric selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Metric {
    /// Reward per time: negative total elapsed time, higher is better
    #[default]
    Rpt,
    /// Time-discounted reward: sum of lambda^t over cumulative times
    Tdr,
}

/// Evaluates paths and insertion gains for one agent
#[derive(Debug, Clone)]
pub struct TaskScorer {
    metric: Metric,
    lambda: f64,
}

impl TaskScorer {
    pub fn new(metric: Metric, lambda: f64) -> Self {
        TaskScorer { metric, lambda }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Score of `path` executed from the agent's current pose
    pub fn evaluate_path(&self, agent: &AgentState, path: &[TaskId], index: &SpatialIndex) -> f64 {
        match self.metric {
            Metric::Rpt => self.rpt_score(agent, path, index),
            Metric::Tdr => self.tdr_score(agent, path, index),
        }
    }

    /// Score change from inserting `task_id` at `position` in `path`
    pub fn compute_marginal_gain(
        &self,
        agent: &AgentState,
        task_id: &TaskId,
        path: &[TaskId],
        position: usize,
        index: &SpatialIndex,
    ) -> f64 {
        let mut candidate: Vec<TaskId> = path.to_vec();
        let position = position.min(candidate.len());
        candidate.insert(position, task_id.clone());

        let new_score = self.evaluate_path(agent, &candidate, index);
        let current_score = self.evaluate_path(agent, path, index);
        new_score - current_score
    }

    /// Best (gain, position) over every insertion point 0..=len.
    /// Ties keep the earliest position encountered.
    pub fn find_optimal_insertion(
        &self,
        agent: &AgentState,
        task_id: &TaskId,
        path: &[TaskId],
        index: &SpatialIndex,
    ) -> (f64, usize) {
        let mut best_score = MIN_SCORE;
        let mut best_position = 0;

        for position in 0..=path.len() {
            let gain = self.compute_marginal_gain(agent, task_id, path, position, index);
            if gain > best_score {
                best_score = gain;
                best_position = position;
            }
        }

        (best_score, best_position)
    }

    fn effective_velocity(agent: &AgentState) -> f64 {
        let v = agent.velocity();
        if v <= 0.0 {
            DEFAULT_VELOCITY
        } else {
            v
        }
    }

    fn travel_time(from: &Point, to: &Point, velocity: f64) -> f64 {
        if velocity <= 0.0 {
            return f64::INFINITY;
        }
        from.distance_to(to) / velocity
    }

    fn rpt_score(&self, agent: &AgentState, path: &[TaskId], index: &SpatialIndex) -> f64 {
        if path.is_empty() {
            return 0.0;
        }

        let velocity = Self::effective_velocity(agent);
        let mut total_time = 0.0;
        let mut current = agent.pose().position;

        for task_id in path {
            // Tasks missing from the index contribute no time.
            let Some(task) = index.get(task_id) else {
                continue;
            };
            total_time += Self::travel_time(&current, &task.position(), velocity);
            total_time += task.duration();
            current = task.end_position();
        }

        -total_time
    }

    fn tdr_score(&self, agent: &AgentState, path: &[TaskId], index: &SpatialIndex) -> f64 {
        if path.is_empty() {
            return 0.0;
        }

        let velocity = Self::effective_velocity(agent);
        let mut reward = 0.0;
        let mut elapsed = 0.0;
        let mut current = agent.pose().position;

        for task_id in path {
            let Some(task) = index.get(task_id) else {
                continue;
            };
            elapsed += Self::travel_time(&current, &task.position(), velocity);
            elapsed += task.duration();
            reward += self.lambda.powf(elapsed);
            current = task.end_position();
        }

        reward
    }
}
