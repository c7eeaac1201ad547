//! Task records: point tasks and geometric (segment) tasks

use crate::geometry::{BoundingBox, Point};
use crate::types::TaskId;
use serde::{Deserialize, Serialize};

const POINT_PADDING: f64 = 5.0;
const SEGMENT_PADDING: f64 = 1.0;

/// Spatial shape of a task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TaskGeometry {
    /// Single location
    Point(Point),
    /// Directed segment (e.g. a row or swath); execution runs head to tail
    Segment { head: Point, tail: Point },
}

/// A unit of work in the shared pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    geometry: TaskGeometry,
    duration: f64,
    completed: bool,
    bbox: BoundingBox,
}

impl Task {
    /// Point task at a single location
    pub fn point(id: impl Into<TaskId>, position: Point, duration: f64) -> Self {
        Task {
            id: id.into(),
            geometry: TaskGeometry::Point(position),
            duration,
            completed: false,
            bbox: BoundingBox::from_point(&position, POINT_PADDING),
        }
    }

    /// Geometric task running from `head` to `tail`
    pub fn segment(id: impl Into<TaskId>, head: Point, tail: Point, duration: f64) -> Self {
        Task {
            id: id.into(),
            geometry: TaskGeometry::Segment { head, tail },
            duration,
            completed: false,
            bbox: BoundingBox::from_points(&head, &tail, SEGMENT_PADDING),
        }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn geometry(&self) -> &TaskGeometry {
        &self.geometry
    }

    /// Representative position: the point itself, or the segment midpoint
    pub fn position(&self) -> Point {
        match &self.geometry {
            TaskGeometry::Point(p) => *p,
            TaskGeometry::Segment { head, tail } => head.midpoint(tail),
        }
    }

    /// Where the agent stands after executing this task
    pub fn end_position(&self) -> Point {
        match &self.geometry {
            TaskGeometry::Point(p) => *p,
            TaskGeometry::Segment { tail, .. } => *tail,
        }
    }

    /// Head-to-tail length; zero for point tasks
    pub fn length(&self) -> f64 {
        match &self.geometry {
            TaskGeometry::Point(_) => 0.0,
            TaskGeometry::Segment { head, tail } => head.distance_to(tail),
        }
    }

    pub fn is_segment(&self) -> bool {
        matches!(self.geometry, TaskGeometry::Segment { .. })
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) {
        self.duration = duration;
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_task_bbox_padding() {
        let t = Task::point("t1", Point::new(0.0, 0.0), 5.0);
        assert_eq!(t.bbox().min_x, -5.0);
        assert_eq!(t.bbox().max_y, 5.0);
        assert_eq!(t.position(), Point::new(0.0, 0.0));
        assert_eq!(t.end_position(), Point::new(0.0, 0.0));
        assert_eq!(t.length(), 0.0);
    }

    #[test]
    fn segment_task_midpoint_and_tail() {
        let t = Task::segment("row_3", Point::new(0.0, 0.0), Point::new(10.0, 0.0), 20.0);
        assert_eq!(t.position(), Point::new(5.0, 0.0));
        assert_eq!(t.end_position(), Point::new(10.0, 0.0));
        assert_eq!(t.length(), 10.0);
        assert_eq!(t.bbox().min_x, -1.0);
        assert_eq!(t.bbox().max_x, 11.0);
    }

    #[test]
    fn zero_length_segment_degrades_to_point() {
        let p = Point::new(3.0, 3.0);
        let t = Task::segment("z", p, p, 1.0);
        assert_eq!(t.position(), p);
        assert_eq!(t.end_position(), p);
        assert_eq!(t.length(), 0.0);
    }

    #[test]
    fn completion_flag() {
        let mut t = Task::point("t1", Point::new(1.0, 1.0), 0.0);
        assert!(!t.is_completed());
        t.set_completed(true);
        assert!(t.is_completed());
    }
}
