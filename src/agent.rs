//! Per-agent replicated auction state
//!
//! Every agent keeps its own view of the global auction: its bundle and path,
//! the best known bid and winner per task, its own marginal-gain bids, and
//! the freshest information time it has seen per agent. Consensus works by
//! exchanging and reconciling exactly this state.

use crate::auction_debug;
use crate::bundle::{Bundle, Path};
use crate::error::Error;
use crate::geometry::Pose;
use crate::types::{AgentId, Bid, TaskId, MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    id: AgentId,
    pose: Pose,
    velocity: f64,

    /// Claimed tasks in claim order (b)
    bundle: Bundle,
    /// Execution order over the bundle (p)
    path: Path,
    /// Best known bid per task (y)
    winning_bids: BTreeMap<TaskId, Bid>,
    /// Winner per task, the O(1) projection of y (z)
    winners: BTreeMap<TaskId, AgentId>,
    /// Own marginal-gain bids for tasks this agent added (c)
    local_bids: BTreeMap<TaskId, f64>,
    /// Last-known information time per agent (s); own entry = tick time
    timestamps: BTreeMap<AgentId, f64>,

    prev_winners: BTreeMap<TaskId, AgentId>,
    converged: bool,
}

impl AgentState {
    pub fn new(id: AgentId, bundle_capacity: usize) -> Self {
        let mut timestamps = BTreeMap::new();
        timestamps.insert(id.clone(), 0.0);
        AgentState {
            id,
            pose: Pose::default(),
            velocity: 0.0,
            bundle: Bundle::new(bundle_capacity),
            path: Path::new(),
            winning_bids: BTreeMap::new(),
            winners: BTreeMap::new(),
            local_bids: BTreeMap::new(),
            timestamps,
            prev_winners: BTreeMap::new(),
            converged: false,
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.id
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    pub fn set_velocity(&mut self, velocity: f64) {
        self.velocity = velocity;
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn winning_bids(&self) -> &BTreeMap<TaskId, Bid> {
        &self.winning_bids
    }

    pub fn winners(&self) -> &BTreeMap<TaskId, AgentId> {
        &self.winners
    }

    pub fn local_bids(&self) -> &BTreeMap<TaskId, f64> {
        &self.local_bids
    }

    pub fn timestamps(&self) -> &BTreeMap<AgentId, f64> {
        &self.timestamps
    }

    /// Claim a task: append to the bundle, insert into the path at
    /// `position`, and record our own bid as the winning one.
    pub fn add_to_bundle(
        &mut self,
        task_id: TaskId,
        score: f64,
        position: usize,
    ) -> Result<(), Error> {
        self.bundle.push(task_id.clone())?;
        if let Err(e) = self.path.insert(task_id.clone(), position) {
            self.bundle.remove(&task_id);
            return Err(e);
        }
        let bid = Bid::new(self.id.clone(), score, self.own_timestamp());
        self.update_winning_bid(task_id.clone(), bid);
        self.local_bids.insert(task_id, score);
        Ok(())
    }

    /// Drop a task from bundle and path.
    ///
    /// Winning-bid state is left alone: y and z track the global auction,
    /// not local membership.
    pub fn remove_from_bundle(&mut self, task_id: &TaskId) {
        self.bundle.remove(task_id);
        self.path.remove(task_id);
    }

    pub fn clear_local_bid(&mut self, task_id: &TaskId) {
        self.local_bids.remove(task_id);
    }

    /// Record a new winning bid for a task, keeping z in step with y
    pub fn update_winning_bid(&mut self, task_id: TaskId, bid: Bid) {
        self.winners.insert(task_id.clone(), bid.agent.clone());
        self.winning_bids.insert(task_id, bid);
    }

    /// Best known bid for a task; unassigned if unknown
    pub fn winning_bid(&self, task_id: &TaskId) -> Bid {
        self.winning_bids
            .get(task_id)
            .cloned()
            .unwrap_or_else(Bid::unassigned)
    }

    /// Known winner for a task; the no-agent sentinel if unknown
    pub fn winner(&self, task_id: &TaskId) -> AgentId {
        self.winners
            .get(task_id)
            .cloned()
            .unwrap_or_else(AgentId::none)
    }

    /// Own recorded marginal gain for a task
    pub fn local_bid(&self, task_id: &TaskId) -> f64 {
        self.local_bids.get(task_id).copied().unwrap_or(MIN_SCORE)
    }

    /// Ratchet the known information time for `agent_id` forward.
    /// Timestamps moving backward are ignored.
    pub fn observe_timestamp(&mut self, agent_id: AgentId, ts: f64) {
        let entry = self.timestamps.entry(agent_id).or_insert(0.0);
        if ts > *entry {
            *entry = ts;
        }
    }

    pub fn timestamp(&self, agent_id: &AgentId) -> f64 {
        self.timestamps.get(agent_id).copied().unwrap_or(0.0)
    }

    /// Advance own information time; monotonically non-decreasing
    pub fn set_own_timestamp(&mut self, ts: f64) {
        let id = self.id.clone();
        self.observe_timestamp(id, ts);
    }

    pub fn own_timestamp(&self) -> f64 {
        self.timestamps.get(&self.id).copied().unwrap_or(0.0)
    }

    /// Losing a task invalidates everything scheduled after it: downstream
    /// marginal gains were computed assuming we would stand at its tail.
    /// Removes the task and all later path entries from bundle and path,
    /// returning the dropped IDs in path order. Winning-bid state for the
    /// dropped successors is kept; their local bids are cleared.
    pub fn release_from(&mut self, task_id: &TaskId) -> Vec<TaskId> {
        let Some(position) = self.path.position(task_id) else {
            return Vec::new();
        };
        let dropped: Vec<TaskId> = self.path.tasks()[position..].to_vec();
        for id in &dropped {
            self.bundle.remove(id);
            self.local_bids.remove(id);
        }
        self.path.truncate(position);
        if dropped.len() > 1 {
            auction_debug!(
                "agent {} dropped {} successor(s) after losing {}",
                self.id,
                dropped.len() - 1,
                task_id
            );
        }
        dropped
    }

    /// Remember the current winner view for the next convergence check
    pub fn snapshot_winners(&mut self) {
        self.prev_winners = self.winners.clone();
    }

    /// Converged when the winner view did not change since the snapshot
    pub fn check_convergence(&mut self) {
        self.converged = self.winners == self.prev_winners;
    }

    pub fn has_converged(&self) -> bool {
        self.converged
    }
}
