pub mod detector;
pub mod hook;
pub mod registry;
pub mod response;

// Re-export key types
pub use detector::DetectionState;
pub use hook::{BreakpointHook, NoopBreakpoint, SteppingBreakpoint};
pub use registry::{CollisionDetection, CollisionPoints, Counterpart, DetectionId, DetectionRegistry};
pub use response::{
    ContactCoefficients, FrictionPolicy, ImpulseDecomposition, ImpulseRounding, PassContact,
    SolverSettings,
};
