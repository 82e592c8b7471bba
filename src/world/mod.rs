pub mod collider;

pub use collider::{Collider, ColliderStats, StepReport};
