//! R-tree-backed spatial index over the task pool
//!
//! The tree is keyed on task bounding boxes; a secondary map holds the full
//! task records. Queries return owned ID vectors, so tree restructuring on
//! later inserts never invalidates a result already handed out.

use crate::geometry::{BoundingBox, Point};
use crate::task::Task;
use crate::types::TaskId;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct IndexEntry {
    id: TaskId,
    position: [f64; 2],
    envelope: AABB<[f64; 2]>,
}

impl IndexEntry {
    fn for_task(task: &Task) -> Self {
        let pos = task.position();
        let bbox = task.bbox();
        IndexEntry {
            id: task.id().clone(),
            position: [pos.x, pos.y],
            envelope: AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]),
        }
    }
}

impl PartialEq for IndexEntry {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for IndexEntry {
    // Nearest-neighbor distance is to the representative position, not
    // the padded box.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Spatial index over tasks, answering radius / kNN / box queries
#[derive(Default)]
pub struct SpatialIndex {
    tree: RTree<IndexEntry>,
    tasks: BTreeMap<TaskId, Task>,
}

impl std::fmt::Debug for SpatialIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialIndex")
            .field("tasks", &self.tasks)
            .finish()
    }
}

impl SpatialIndex {
    pub fn new() -> Self {
        SpatialIndex::default()
    }

    /// Insert a task, replacing any existing record under the same ID
    pub fn insert(&mut self, task: Task) {
        if let Some(old) = self.tasks.get(task.id()) {
            self.tree.remove(&IndexEntry::for_task(old));
        }
        self.tree.insert(IndexEntry::for_task(&task));
        self.tasks.insert(task.id().clone(), task);
    }

    /// Remove a task by ID; unknown IDs are ignored
    pub fn remove(&mut self, id: &TaskId) -> Option<Task> {
        let task = self.tasks.remove(id)?;
        self.tree.remove(&IndexEntry::for_task(&task));
        Some(task)
    }

    pub fn clear(&mut self) {
        self.tree = RTree::new();
        self.tasks.clear();
    }

    /// IDs of tasks whose representative position lies within `radius` of
    /// `position`. A bounding-box prefilter narrows candidates before the
    /// exact point-to-point distance check.
    pub fn query_radius(&self, position: Point, radius: f64) -> Vec<TaskId> {
        let query = AABB::from_corners(
            [position.x - radius, position.y - radius],
            [position.x + radius, position.y + radius],
        );
        let mut result: Vec<TaskId> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .filter(|entry| {
                let dx = entry.position[0] - position.x;
                let dy = entry.position[1] - position.y;
                (dx * dx + dy * dy).sqrt() <= radius
            })
            .map(|entry| entry.id.clone())
            .collect();
        result.sort();
        result
    }

    /// Up to `k` task IDs ordered by distance to `position`, ascending
    pub fn query_nearest(&self, position: Point, k: usize) -> Vec<TaskId> {
        self.tree
            .nearest_neighbor_iter(&[position.x, position.y])
            .take(k)
            .map(|entry| entry.id.clone())
            .collect()
    }

    /// IDs of tasks whose bounding box intersects `bbox`
    pub fn query_box(&self, bbox: &BoundingBox) -> Vec<TaskId> {
        let query = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        let mut result: Vec<TaskId> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.id.clone())
            .collect();
        result.sort();
        result
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.keys().cloned().collect()
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with_line_of_tasks() -> SpatialIndex {
        let mut index = SpatialIndex::new();
        for i in 0..10 {
            let x = i as f64 * 10.0;
            index.insert(Task::point(format!("t{}", i), Point::new(x, 0.0), 1.0));
        }
        index
    }

    #[test]
    fn radius_query_uses_exact_distance() {
        let index = index_with_line_of_tasks();
        // t0 at 0, t1 at 10, t2 at 20; radius 15 from origin catches two.
        let hits = index.query_radius(Point::new(0.0, 0.0), 15.0);
        assert_eq!(hits, vec![TaskId::from("t0"), TaskId::from("t1")]);
    }

    #[test]
    fn radius_query_boundary_is_inclusive() {
        let index = index_with_line_of_tasks();
        let hits = index.query_radius(Point::new(0.0, 0.0), 10.0);
        assert!(hits.contains(&TaskId::from("t1")));
    }

    #[test]
    fn nearest_orders_by_distance() {
        let index = index_with_line_of_tasks();
        let hits = index.query_nearest(Point::new(33.0, 0.0), 3);
        assert_eq!(
            hits,
            vec![TaskId::from("t3"), TaskId::from("t4"), TaskId::from("t2")]
        );
    }

    #[test]
    fn nearest_caps_at_population() {
        let mut index = SpatialIndex::new();
        index.insert(Task::point("only", Point::new(0.0, 0.0), 1.0));
        assert_eq!(index.query_nearest(Point::new(5.0, 5.0), 10).len(), 1);
    }

    #[test]
    fn box_query_matches_bbox_intersection() {
        let mut index = SpatialIndex::new();
        index.insert(Task::segment(
            "row",
            Point::new(0.0, 0.0),
            Point::new(20.0, 0.0),
            5.0,
        ));
        index.insert(Task::point("far", Point::new(100.0, 100.0), 5.0));
        let hits = index.query_box(&BoundingBox::new(15.0, -1.0, 30.0, 1.0));
        assert_eq!(hits, vec![TaskId::from("row")]);
    }

    #[test]
    fn insert_replaces_existing_id() {
        let mut index = SpatialIndex::new();
        index.insert(Task::point("t", Point::new(0.0, 0.0), 1.0));
        index.insert(Task::point("t", Point::new(50.0, 0.0), 1.0));
        assert_eq!(index.len(), 1);
        assert!(index.query_radius(Point::new(0.0, 0.0), 5.0).is_empty());
        assert_eq!(index.query_radius(Point::new(50.0, 0.0), 5.0).len(), 1);
    }

    #[test]
    fn remove_under_churn() {
        let mut index = index_with_line_of_tasks();
        for i in (0..10).step_by(2) {
            index.remove(&TaskId::from(format!("t{}", i).as_str()));
        }
        assert_eq!(index.len(), 5);
        let hits = index.query_radius(Point::new(0.0, 0.0), 1000.0);
        assert_eq!(hits.len(), 5);
        assert!(hits.iter().all(|id| {
            let n: usize = id.as_str()[1..].parse().unwrap();
            n % 2 == 1
        }));
        // Removing an unknown ID is a no-op.
        assert!(index.remove(&TaskId::from("missing")).is_none());
    }

    #[test]
    fn clear_empties_both_structures() {
        let mut index = index_with_line_of_tasks();
        index.clear();
        assert!(index.is_empty());
        assert!(index.query_nearest(Point::new(0.0, 0.0), 3).is_empty());
    }
}
