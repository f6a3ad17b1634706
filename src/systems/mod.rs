//! Frame systems run by the engine in declared order

mod bounds;
mod collision;
mod motion;
mod partition;
mod status;

pub use bounds::BoundsSystem;
pub use collision::CollisionSystem;
pub use motion::MotionSystem;
pub use partition::PartitionSystem;
pub use status::StatusSystem;
