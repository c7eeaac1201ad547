//! Tick-driven phase orchestration
//!
//! A tick advances the engine through three phases in strict order:
//! bundle-building, communicate, consensus. The message sent in phase two
//! reflects the post-bundle state; consensus processes received frames in
//! the order the transport hands them over. A tick is atomic with respect
//! to host task mutation -- `&mut self` enforces that at compile time.

use crate::agent::AgentState;
use crate::auction_debug;
use crate::builder::BundleBuilder;
use crate::config::Config;
use crate::consensus::ConsensusResolver;
use crate::geometry::Pose;
use crate::message::Message;
use crate::spatial::SpatialIndex;
use crate::task::Task;
use crate::transport::Transport;
use crate::types::{AgentId, TaskId, MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot of allocation progress for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub tick_count: u64,
    pub bundle_size: usize,
    pub task_count: usize,
    pub total_path_score: f64,
    pub converged: bool,
}

/// One agent's consensus-based bundle auction engine
pub struct CbbaEngine {
    config: Config,
    agent: AgentState,
    builder: BundleBuilder,
    resolver: ConsensusResolver,
    /// Every known task, completed ones included
    tasks: BTreeMap<TaskId, Task>,
    /// Uncompleted tasks only
    spatial: SpatialIndex,
    transport: Option<Box<dyn Transport>>,
    tick_count: u64,
    current_time: f64,
}

impl CbbaEngine {
    pub fn new(agent_id: AgentId, config: Config, transport: Option<Box<dyn Transport>>) -> Self {
        let builder = BundleBuilder::new(
            config.metric,
            config.lambda,
            config.query_radius,
            config.bundle_mode,
        );
        CbbaEngine {
            agent: AgentState::new(agent_id, config.bundle_capacity),
            builder,
            resolver: ConsensusResolver::new(),
            config,
            tasks: BTreeMap::new(),
            spatial: SpatialIndex::new(),
            transport,
            tick_count: 0,
            current_time: 0.0,
        }
    }

    pub fn update_pose(&mut self, pose: Pose) {
        self.agent.set_pose(pose);
    }

    pub fn update_velocity(&mut self, velocity: f64) {
        self.agent.set_velocity(velocity);
    }

    /// Register a task, replacing any existing record under the same ID
    pub fn add_task(&mut self, task: Task) {
        if task.is_completed() {
            self.spatial.remove(task.id());
        } else {
            self.spatial.insert(task.clone());
        }
        self.tasks.insert(task.id().clone(), task);
    }

    /// Drop a task entirely; it also leaves the bundle and path
    pub fn remove_task(&mut self, id: &TaskId) {
        self.tasks.remove(id);
        self.spatial.remove(id);
        self.agent.remove_from_bundle(id);
        self.agent.clear_local_bid(id);
    }

    /// Mark a task done: it leaves the bundle, path and spatial index but
    /// stays queryable in the task table
    pub fn mark_task_completed(&mut self, id: &TaskId) {
        let Some(task) = self.tasks.get_mut(id) else {
            return;
        };
        task.set_completed(true);
        self.spatial.remove(id);
        self.agent.remove_from_bundle(id);
        self.agent.clear_local_bid(id);
    }

    /// Advance one bundle/communicate/consensus triad
    pub fn tick(&mut self, dt: f64) {
        self.tick_count += 1;
        self.current_time += dt;
        self.agent.set_own_timestamp(self.current_time);
        self.agent.snapshot_winners();

        self.bundle_phase();
        self.communicate_phase();
        self.consensus_phase();

        self.agent.check_convergence();
    }

    fn bundle_phase(&mut self) {
        let available = self.available_tasks();
        self.builder.build(&mut self.agent, &self.spatial, &available);
    }

    fn communicate_phase(&mut self) {
        if self.transport.is_none() {
            return;
        }
        let frame = self.build_message().encode();
        if let Some(transport) = self.transport.as_mut() {
            transport.send(&frame);
        }
    }

    fn consensus_phase(&mut self) {
        let frames = match self.transport.as_mut() {
            Some(transport) => transport.recv(),
            None => return,
        };
        for frame in frames {
            match Message::decode(&frame) {
                Ok(message) => self.resolver.process_message(&mut self.agent, &message),
                Err(e) => {
                    // One bad frame never aborts the batch; the sender
                    // rebroadcasts its state next tick anyway.
                    auction_debug!(
                        "agent {} dropped malformed frame ({} bytes): {}",
                        self.agent.id(),
                        frame.len(),
                        e
                    );
                }
            }
        }
    }

    /// Uncompleted tasks not already in the bundle
    fn available_tasks(&self) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|task| !task.is_completed() && !self.agent.bundle().contains(task.id()))
            .map(|task| task.id().clone())
            .collect()
    }

    fn build_message(&self) -> Message {
        Message {
            sender: self.agent.id().clone(),
            timestamp: self.current_time,
            bundle: self.agent.bundle().tasks().to_vec(),
            path: self.agent.path().tasks().to_vec(),
            winning_bids: self.agent.winning_bids().clone(),
            winners: self.agent.winners().clone(),
            timestamps: self.agent.timestamps().clone(),
        }
    }

    pub fn bundle(&self) -> &[TaskId] {
        self.agent.bundle().tasks()
    }

    pub fn path(&self) -> &[TaskId] {
        self.agent.path().tasks()
    }

    /// First task in the path, i.e. the next one to execute
    pub fn next_task(&self) -> Option<&TaskId> {
        self.agent.path().first()
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        self.tasks.values().cloned().collect()
    }

    pub fn has_converged(&self) -> bool {
        self.agent.has_converged()
    }

    /// Sum of this agent's own bids over the current path
    pub fn total_score(&self) -> f64 {
        self.agent
            .path()
            .iter()
            .map(|id| self.agent.local_bid(id))
            .filter(|score| *score > MIN_SCORE)
            .sum()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            tick_count: self.tick_count,
            bundle_size: self.agent.bundle().len(),
            task_count: self.tasks.len(),
            total_path_score: self.total_score(),
            converged: self.agent.has_converged(),
        }
    }

    /// Clear auction state and counters; tasks and pose survive
    pub fn reset(&mut self) {
        let pose = self.agent.pose();
        let velocity = self.agent.velocity();
        self.agent = AgentState::new(self.agent.id().clone(), self.config.bundle_capacity);
        self.agent.set_pose(pose);
        self.agent.set_velocity(velocity);
        self.tick_count = 0;
        self.current_time = 0.0;
    }

    pub fn agent_id(&self) -> &AgentId {
        self.agent.id()
    }

    pub fn pose(&self) -> Pose {
        self.agent.pose()
    }

    pub fn velocity(&self) -> f64 {
        self.agent.velocity()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    #[cfg(test)]
    pub(crate) fn agent_state(&self) -> &AgentState {
        &self.agent
    }
}
