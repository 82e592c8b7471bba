//! Breakpoint hooks called after each recorded detection.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, warn};

use crate::collision::registry::CollisionDetection;

pub trait BreakpointHook: Send {
    fn on_detection(&mut self, detection: &CollisionDetection);
}

/// Does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBreakpoint;

impl BreakpointHook for NoopBreakpoint {
    fn on_detection(&mut self, _detection: &CollisionDetection) {}
}

/// Blocks the simulation thread after each detection until the controller
/// sends a resume token. Once the controller is dropped the hook stops
/// blocking.
#[derive(Debug)]
pub struct SteppingBreakpoint {
    resume: Receiver<()>,
    hits: usize,
    detached: bool,
}

impl SteppingBreakpoint {
    /// Returns the hook and the sender used to resume it.
    pub fn new() -> (Self, Sender<()>) {
        let (sender, resume) = mpsc::channel();
        let hook = Self {
            resume,
            hits: 0,
            detached: false,
        };
        (hook, sender)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

impl BreakpointHook for SteppingBreakpoint {
    fn on_detection(&mut self, detection: &CollisionDetection) {
        self.hits += 1;
        if self.detached {
            return;
        }
        debug!(
            moving = detection.moving,
            other = ?detection.other,
            vertex = detection.vertex,
            "breakpoint, waiting for resume"
        );
        if self.resume.recv().is_err() {
            warn!("breakpoint controller dropped, no longer stopping");
            self.detached = true;
        }
    }
}
