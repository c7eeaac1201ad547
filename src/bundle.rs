//! Bundle and path sequences
//!
//! The bundle records the order in which tasks were claimed; the path
//! records the order in which they will be executed. Both hold the same set
//! of task IDs at every observable moment.

use crate::error::Error;
use crate::types::TaskId;
use serde::{Deserialize, Serialize};

/// Capacity-bounded, insertion-ordered set of claimed tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    tasks: Vec<TaskId>,
    capacity: usize,
}

impl Bundle {
    pub fn new(capacity: usize) -> Self {
        Bundle {
            tasks: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a newly claimed task
    pub fn push(&mut self, id: TaskId) -> Result<(), Error> {
        if self.tasks.contains(&id) {
            return Err(Error::ItemAlreadyExists);
        }
        if self.tasks.len() >= self.capacity {
            return Err(Error::CapacityFull);
        }
        self.tasks.push(id);
        Ok(())
    }

    pub fn remove(&mut self, id: &TaskId) -> bool {
        if let Some(pos) = self.tasks.iter().position(|t| t == id) {
            self.tasks.remove(pos);
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.tasks.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskId> {
        self.tasks.iter()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

/// Execution order over the bundled tasks
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Path {
    tasks: Vec<TaskId>,
}

impl Path {
    pub fn new() -> Self {
        Path::default()
    }

    /// Insert a task at `position` in the execution order
    pub fn insert(&mut self, id: TaskId, position: usize) -> Result<(), Error> {
        if self.tasks.contains(&id) {
            return Err(Error::ItemAlreadyExists);
        }
        if position > self.tasks.len() {
            return Err(Error::IndexOutOfBounds);
        }
        self.tasks.insert(position, id);
        Ok(())
    }

    pub fn remove(&mut self, id: &TaskId) -> bool {
        if let Some(pos) = self.tasks.iter().position(|t| t == id) {
            self.tasks.remove(pos);
            true
        } else {
            false
        }
    }

    /// Position of a task in the execution order
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t == id)
    }

    /// Drop every task at `position` and after
    pub fn truncate(&mut self, position: usize) {
        self.tasks.truncate(position);
    }

    /// The next task to execute
    pub fn first(&self) -> Option<&TaskId> {
        self.tasks.first()
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[TaskId] {
        &self.tasks
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TaskId> {
        self.tasks.iter()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}
