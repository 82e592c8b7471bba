pub mod body;
pub mod kinematics;
pub mod movable;
pub mod obstacle;
pub mod pose;
pub mod wall;

pub use body::{Collidable, Crossing, FixedBody};
pub use kinematics::{BodyState, MassProperties};
pub use movable::{BodyKind, MovableBody};
pub use obstacle::StaticObstacle;
pub use pose::Pose;
pub use wall::{Wall, WallSide};
