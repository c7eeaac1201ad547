//! Bundle construction: candidate selection and greedy addition
//!
//! A build pass queries the spatial index around the agent, scores each
//! available candidate at its best insertion point, and claims the single
//! best one -- once per call, or repeatedly until nothing more passes the
//! bid gate, depending on the configured mode.

use crate::agent::AgentState;
use crate::auction_info;
use crate::scorer::{Metric, TaskScorer};
use crate::spatial::SpatialIndex;
use crate::types::{Bid, TaskId, MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How much of the bundle one build pass may fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BundleMode {
    /// Claim at most one task per pass, interleaving with consensus
    #[default]
    Add,
    /// Keep claiming until the bundle is full or no candidate passes the gate
    FullBundle,
}

/// Builds an agent's bundle from spatially nearby candidates
#[derive(Debug, Clone)]
pub struct BundleBuilder {
    scorer: TaskScorer,
    query_radius: f64,
    mode: BundleMode,
}

impl BundleBuilder {
    pub fn new(metric: Metric, lambda: f64, query_radius: f64, mode: BundleMode) -> Self {
        BundleBuilder {
            scorer: TaskScorer::new(metric, lambda),
            query_radius,
            mode,
        }
    }

    pub fn scorer(&self) -> &TaskScorer {
        &self.scorer
    }

    /// Run one build pass; returns the number of tasks claimed
    pub fn build(
        &self,
        agent: &mut AgentState,
        index: &SpatialIndex,
        available: &[TaskId],
    ) -> usize {
        match self.mode {
            BundleMode::Add => {
                if self.add_one(agent, index, available) {
                    1
                } else {
                    0
                }
            }
            BundleMode::FullBundle => {
                let mut added = 0;
                while self.add_one(agent, index, available) {
                    added += 1;
                }
                added
            }
        }
    }

    /// Nearby tasks intersected with the caller's available list
    fn candidates(
        &self,
        agent: &AgentState,
        index: &SpatialIndex,
        available: &[TaskId],
    ) -> Vec<TaskId> {
        let available: BTreeSet<&TaskId> = available.iter().collect();
        index
            .query_radius(agent.pose().position, self.query_radius)
            .into_iter()
            .filter(|id| available.contains(id))
            .collect()
    }

    /// The single best (task, gain, position) over all candidates
    fn find_best(
        &self,
        agent: &AgentState,
        index: &SpatialIndex,
        candidates: &[TaskId],
    ) -> Option<(TaskId, f64, usize)> {
        let mut best: Option<(TaskId, f64, usize)> = None;

        for task_id in candidates {
            if agent.bundle().contains(task_id) {
                continue;
            }
            if !index.contains(task_id) {
                continue;
            }

            let (gain, position) =
                self.scorer
                    .find_optimal_insertion(agent, task_id, agent.path().tasks(), index);
            if gain <= MIN_SCORE {
                continue;
            }
            let better = match &best {
                Some((_, best_gain, _)) => gain > *best_gain,
                None => true,
            };
            if better {
                best = Some((task_id.clone(), gain, position));
            }
        }

        best
    }

    /// A claim goes through only if our provisional bid strictly beats the
    /// best bid we currently know of for the task.
    fn should_bid(&self, agent: &AgentState, task_id: &TaskId, score: f64) -> bool {
        let current = agent.winning_bid(task_id);
        if !current.is_valid() {
            return true;
        }
        let ours = Bid::new(agent.id().clone(), score, agent.own_timestamp());
        ours.beats(&current)
    }

    fn add_one(&self, agent: &mut AgentState, index: &SpatialIndex, available: &[TaskId]) -> bool {
        if agent.bundle().is_full() {
            return false;
        }

        let candidates = self.candidates(agent, index, available);
        if candidates.is_empty() {
            return false;
        }

        let Some((task_id, gain, position)) = self.find_best(agent, index, &candidates) else {
            return false;
        };

        if !self.should_bid(agent, &task_id, gain) {
            return false;
        }

        if agent.add_to_bundle(task_id.clone(), gain, position).is_err() {
            return false;
        }
        auction_info!(
            "agent {} claimed task {} at path position {} (gain {:.3})",
            agent.id(),
            task_id,
            position,
            gain
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Pose};
    use crate::task::Task;
    use crate::types::AgentId;

    fn agent_at_origin(capacity: usize) -> AgentState {
        let mut a = AgentState::new(AgentId::from("robot_1"), capacity);
        a.set_pose(Pose::new(0.0, 0.0, 0.0));
        a.set_velocity(2.0);
        a
    }

    fn builder(mode: BundleMode) -> BundleBuilder {
        BundleBuilder::new(Metric::Rpt, 0.95, 100.0, mode)
    }

    #[test]
    fn add_mode_claims_single_nearest_best() {
        let mut index = SpatialIndex::new();
        index.insert(Task::point("near", Point::new(5.0, 0.0), 1.0));
        index.insert(Task::point("far", Point::new(50.0, 0.0), 1.0));
        let mut agent = agent_at_origin(10);
        let available = vec![TaskId::from("near"), TaskId::from("far")];

        let added = builder(BundleMode::Add).build(&mut agent, &index, &available);
        assert_eq!(added, 1);
        assert_eq!(agent.bundle().tasks(), &[TaskId::from("near")]);
        assert_eq!(agent.winner(&TaskId::from("near")), AgentId::from("robot_1"));
        assert!(agent.local_bid(&TaskId::from("near")) > MIN_SCORE);
    }

    #[test]
    fn full_bundle_mode_fills_to_capacity() {
        let mut index = SpatialIndex::new();
        for i in 0..5 {
            index.insert(Task::point(
                format!("t{}", i),
                Point::new(5.0 + i as f64, 0.0),
                1.0,
            ));
        }
        let mut agent = agent_at_origin(3);
        let available: Vec<TaskId> = index.task_ids();

        let added = builder(BundleMode::FullBundle).build(&mut agent, &index, &available);
        assert_eq!(added, 3);
        assert!(agent.bundle().is_full());
        assert_eq!(agent.path().len(), 3);
    }

    #[test]
    fn empty_candidate_set_is_noop() {
        let index = SpatialIndex::new();
        let mut agent = agent_at_origin(10);
        let added = builder(BundleMode::Add).build(&mut agent, &index, &[]);
        assert_eq!(added, 0);
        assert!(agent.bundle().is_empty());
    }

    #[test]
    fn full_bundle_is_noop() {
        let mut index = SpatialIndex::new();
        index.insert(Task::point("a", Point::new(5.0, 0.0), 1.0));
        index.insert(Task::point("b", Point::new(6.0, 0.0), 1.0));
        let mut agent = agent_at_origin(1);
        let available = vec![TaskId::from("a"), TaskId::from("b")];

        let b = builder(BundleMode::Add);
        assert_eq!(b.build(&mut agent, &index, &available), 1);
        assert_eq!(b.build(&mut agent, &index, &available), 0);
        assert_eq!(agent.bundle().len(), 1);
    }

    #[test]
    fn radius_filters_out_distant_tasks() {
        let mut index = SpatialIndex::new();
        index.insert(Task::point("beyond", Point::new(500.0, 0.0), 1.0));
        let mut agent = agent_at_origin(10);
        let available = vec![TaskId::from("beyond")];

        let added = builder(BundleMode::Add).build(&mut agent, &index, &available);
        assert_eq!(added, 0);
    }

    #[test]
    fn bid_gate_respects_stronger_known_bid() {
        let mut index = SpatialIndex::new();
        index.insert(Task::point("t", Point::new(10.0, 0.0), 5.0));
        let mut agent = agent_at_origin(10);
        // Someone already holds t with a score our -10 gain cannot beat.
        agent.update_winning_bid(
            TaskId::from("t"),
            Bid::new(AgentId::from("robot_0"), 100.0, 1.0),
        );

        let added = builder(BundleMode::Add).build(&mut agent, &index, &[TaskId::from("t")]);
        assert_eq!(added, 0);
        assert!(agent.bundle().is_empty());
    }

    #[test]
    fn bid_gate_lets_better_bid_through() {
        let mut index = SpatialIndex::new();
        index.insert(Task::point("t", Point::new(10.0, 0.0), 5.0));
        let mut agent = agent_at_origin(10);
        agent.update_winning_bid(
            TaskId::from("t"),
            Bid::new(AgentId::from("robot_9"), -500.0, 1.0),
        );

        let added = builder(BundleMode::Add).build(&mut agent, &index, &[TaskId::from("t")]);
        assert_eq!(added, 1);
        assert_eq!(agent.winner(&TaskId::from("t")), AgentId::from("robot_1"));
    }
}
