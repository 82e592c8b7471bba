//! Error types for scene construction and state restore.

use thiserror::Error;

/// Errors raised while building bodies, configuring a collider or restoring
/// a snapshot. Running a step never produces one of these: numerical
/// problems flow into the simulated state instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    /// A polygon was built from zero vertices.
    #[error("polygon must have at least one vertex")]
    EmptyPolygon,

    /// A polygon vertex was NaN or infinite.
    #[error("polygon vertex {index} is not finite")]
    NonFiniteVertex {
        /// Position of the offending vertex in the input.
        index: usize,
    },

    /// A shape was built from zero polygon elements.
    #[error("shape must have at least one polygon element")]
    EmptyShape,

    /// Mass was zero, negative or NaN. Infinite mass is allowed.
    #[error("invalid mass: {0} (must be positive)")]
    InvalidMass(f64),

    /// A non-positive or non-finite timestep.
    #[error("invalid timestep: {0} (must be positive and finite)")]
    InvalidTimestep(f64),

    /// A snapshot buffer was shorter than the body's snapshot size.
    #[error("snapshot buffer too short: expected {expected} bytes, got {actual}")]
    SnapshotTooShort {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        actual: usize,
    },

    /// A body handle that the collider does not know about.
    #[error("unknown body handle: {0}")]
    UnknownBody(usize),

    /// Invalid collider configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it.
        reason: String,
    },
}

/// Result alias for fallible construction.
pub type Result<T> = std::result::Result<T, PhysicsError>;
