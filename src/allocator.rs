//! Outer host-facing API
//!
//! [`Allocator`] is the thin public handle around an engine chosen at
//! construction time. The algorithm set is a closed enum: dispatch happens
//! once per call by matching the variant, with no trait objects involved.

use crate::config::{Algorithm, Config};
use crate::engine::{CbbaEngine, Statistics};
use crate::geometry::{Point, Pose};
use crate::task::Task;
use crate::transport::Transport;
use crate::types::{AgentId, TaskId};

enum EngineKind {
    Cbba(CbbaEngine),
}

/// One agent's task-allocation instance
pub struct Allocator {
    engine: EngineKind,
    neighbors: Vec<AgentId>,
}

impl Allocator {
    /// Build an allocator for `agent_id` with the algorithm named in
    /// `config`. Passing no transport is valid: the agent then allocates
    /// purely from local knowledge.
    pub fn new(
        agent_id: impl Into<AgentId>,
        config: Config,
        transport: Option<Box<dyn Transport>>,
    ) -> Self {
        let agent_id = agent_id.into();
        let engine = match config.algorithm {
            Algorithm::Cbba => EngineKind::Cbba(CbbaEngine::new(agent_id, config, transport)),
        };
        Allocator {
            engine,
            neighbors: Vec::new(),
        }
    }

    fn cbba(&self) -> &CbbaEngine {
        match &self.engine {
            EngineKind::Cbba(engine) => engine,
        }
    }

    fn cbba_mut(&mut self) -> &mut CbbaEngine {
        match &mut self.engine {
            EngineKind::Cbba(engine) => engine,
        }
    }

    pub fn update_pose(&mut self, x: f64, y: f64, heading: f64) {
        self.cbba_mut().update_pose(Pose::new(x, y, heading));
    }

    pub fn update_velocity(&mut self, velocity: f64) {
        self.cbba_mut().update_velocity(velocity);
    }

    /// Add a point task at a single location
    pub fn add_point_task(
        &mut self,
        id: impl Into<TaskId>,
        position: Point,
        duration: f64,
    ) {
        self.cbba_mut().add_task(Task::point(id, position, duration));
    }

    /// Add a geometric task running from `head` to `tail`
    pub fn add_segment_task(
        &mut self,
        id: impl Into<TaskId>,
        head: Point,
        tail: Point,
        duration: f64,
    ) {
        self.cbba_mut().add_task(Task::segment(id, head, tail, duration));
    }

    /// Add a prebuilt task record
    pub fn add_task(&mut self, task: Task) {
        self.cbba_mut().add_task(task);
    }

    /// Remove a task; unknown IDs are ignored
    pub fn remove_task(&mut self, id: &TaskId) {
        self.cbba_mut().remove_task(id);
    }

    /// Mark a task completed; unknown IDs are ignored
    pub fn mark_task_completed(&mut self, id: &TaskId) {
        self.cbba_mut().mark_task_completed(id);
    }

    /// Record the current neighbor set for hosts that track adjacency
    pub fn update_neighbors(&mut self, neighbors: Vec<AgentId>) {
        self.neighbors = neighbors;
    }

    pub fn neighbors(&self) -> &[AgentId] {
        &self.neighbors
    }

    /// Advance one allocation round
    pub fn tick(&mut self, dt: f64) {
        self.cbba_mut().tick(dt);
    }

    /// Tasks this agent currently claims, in claim order
    pub fn bundle(&self) -> &[TaskId] {
        self.cbba().bundle()
    }

    /// Claimed tasks in execution order
    pub fn path(&self) -> &[TaskId] {
        self.cbba().path()
    }

    /// The next task to execute, if any
    pub fn next_task(&self) -> Option<&TaskId> {
        self.cbba().next_task()
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.cbba().task(id)
    }

    pub fn all_tasks(&self) -> Vec<Task> {
        self.cbba().all_tasks()
    }

    /// Whether the winner view survived the last tick unchanged.
    /// This is a per-tick observation, not a global guarantee.
    pub fn has_converged(&self) -> bool {
        self.cbba().has_converged()
    }

    pub fn statistics(&self) -> Statistics {
        self.cbba().statistics()
    }

    /// Clear allocation state; registered tasks and pose survive
    pub fn reset(&mut self) {
        self.cbba_mut().reset();
    }

    pub fn agent_id(&self) -> &AgentId {
        self.cbba().agent_id()
    }

    pub fn pose(&self) -> Pose {
        self.cbba().pose()
    }

    pub fn velocity(&self) -> f64 {
        self.cbba().velocity()
    }
}
