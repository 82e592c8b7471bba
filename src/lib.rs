//! Swept-segment collision detection and impulse response for 2D polygonal
//! bodies, advanced by a double-buffered fixed-step scheduler.

pub mod collision;
pub mod common;
pub mod integration;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

// Re-export key types for easier use
pub use collision::{BreakpointHook, FrictionPolicy, ImpulseRounding, SteppingBreakpoint};
pub use common::{ColliderConfig, Material, PhysicsError, Result, Snapshot};
pub use math::vec2::Vec2;
pub use objects::{BodyKind, FixedBody, MovableBody, StaticObstacle, Wall, WallSide};
pub use shapes::{Polygon, Shape};
pub use world::{Collider, StepReport};
