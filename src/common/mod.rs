//! Ambient types shared by every module: errors, configuration, materials
//! and the snapshot codec.

pub mod config;
pub mod error;
pub mod material;
pub mod snapshot;

pub use config::ColliderConfig;
pub use error::{PhysicsError, Result};
pub use material::Material;
pub use snapshot::{FrameHeader, Snapshot};
