//! # bundlecast - decentralized bundle auctions for multi-agent task allocation
//!
//! Each agent owns one [`Allocator`]; there is no central coordinator. Every
//! tick the agent greedily claims nearby tasks into a bundle, broadcasts its
//! auction view as an opaque byte frame, and reconciles the frames it
//! received from neighbors. The collective converges to a conflict-free
//! assignment under arbitrary message loss and reordering.
//!
//! ## Modules
//!
//! - [`allocator`] - host-facing API handle
//! - [`engine`] - tick-driven phase orchestration
//! - [`builder`] - bundle construction with a spatial prefilter
//! - [`consensus`] - conflict resolution over neighbor messages
//! - [`scorer`] - reward-per-time and time-discounted path metrics
//! - [`spatial`] - R-tree index over the task pool
//! - [`message`] - binary wire codec
//! - [`transport`] - byte-frame transport capability
//! - [`agent`], [`bundle`], [`task`], [`geometry`], [`types`] - state and data model
//! - [`config`], [`error`], [`logger`] - supporting surface
//!
//! ## Quick start
//!
//! ```rust
//! use bundlecast::{Allocator, Config, MessageHub, Point};
//!
//! let hub = MessageHub::new();
//! let config = Config::default().with_query_radius(50.0);
//! let mut a = Allocator::new("robot_1", config.clone(), Some(Box::new(hub.endpoint("robot_1"))));
//! let mut b = Allocator::new("robot_2", config, Some(Box::new(hub.endpoint("robot_2"))));
//!
//! a.update_pose(0.0, 0.0, 0.0);
//! a.update_velocity(2.0);
//! b.update_pose(100.0, 0.0, 0.0);
//! b.update_velocity(2.0);
//!
//! for alloc in [&mut a, &mut b] {
//!     alloc.add_point_task("t_west", Point::new(10.0, 0.0), 5.0);
//!     alloc.add_point_task("t_east", Point::new(90.0, 0.0), 5.0);
//! }
//!
//! for _ in 0..4 {
//!     a.tick(0.1);
//!     b.tick(0.1);
//! }
//!
//! assert!(a.has_converged() && b.has_converged());
//! assert_eq!(a.bundle(), [bundlecast::TaskId::from("t_west")]);
//! assert_eq!(b.bundle(), [bundlecast::TaskId::from("t_east")]);
//! ```

pub mod agent;
pub mod allocator;
pub mod builder;
pub mod bundle;
pub mod config;
pub mod consensus;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod logger;
pub mod message;
pub mod scorer;
pub mod spatial;
pub mod task;
pub mod transport;
pub mod types;

pub use agent::AgentState;
pub use allocator::Allocator;
pub use builder::{BundleBuilder, BundleMode};
pub use bundle::{Bundle, Path};
pub use config::{Algorithm, Config};
pub use consensus::ConsensusResolver;
pub use engine::{CbbaEngine, Statistics};
pub use error::Error;
pub use geometry::{BoundingBox, Point, Pose};
pub use message::Message;
pub use scorer::{Metric, TaskScorer, DEFAULT_VELOCITY};
pub use spatial::SpatialIndex;
pub use task::{Task, TaskGeometry};
pub use transport::{ClosureTransport, HubTransport, MessageHub, Transport};
pub use types::{AgentId, Bid, TaskId, MIN_SCORE};
