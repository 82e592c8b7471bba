//! Fixed-width binary snapshots of body state for an external recorder.
//!
//! All values are little-endian. Floats are written by bit pattern so a
//! restore reproduces the stored state exactly.

use bytes::{Buf, BufMut};

use crate::common::error::{PhysicsError, Result};
use crate::math::vec2::Vec2;

/// Opaque, fixed-size serialization of a body's buffered state.
pub trait Snapshot {
    /// Number of bytes `store` writes. Constant for the lifetime of the body.
    fn snapshot_size(&self) -> usize;

    fn store<B: BufMut>(&self, buf: &mut B);

    /// Reads back what `store` wrote. On error the body is left untouched.
    fn restore(&mut self, buf: &[u8]) -> Result<()>;
}

pub(crate) const F64_SIZE: usize = 8;
pub(crate) const VEC2_SIZE: usize = 2 * F64_SIZE;

pub(crate) fn ensure_len(buf: &[u8], expected: usize) -> Result<()> {
    if buf.len() < expected {
        return Err(PhysicsError::SnapshotTooShort {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

pub(crate) fn put_vec2<B: BufMut>(buf: &mut B, v: Vec2) {
    buf.put_f64_le(v.x);
    buf.put_f64_le(v.y);
}

pub(crate) fn get_vec2<B: Buf>(buf: &mut B) -> Vec2 {
    let x = buf.get_f64_le();
    let y = buf.get_f64_le();
    Vec2::new(x, y)
}

/// Header of a recorder file: four size fields, encoded with the same
/// fixed-width codec as body state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameHeader {
    pub begin_frame: u64,
    pub end_frame: u64,
    pub current_frame: u64,
    pub frame_counter: u64,
}

impl FrameHeader {
    pub const SIZE: usize = 4 * 8;

    pub fn encode<B: BufMut>(&self, buf: &mut B) {
        buf.put_u64_le(self.begin_frame);
        buf.put_u64_le(self.end_frame);
        buf.put_u64_le(self.current_frame);
        buf.put_u64_le(self.frame_counter);
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        ensure_len(buf, Self::SIZE)?;
        let mut cursor = buf;
        Ok(Self {
            begin_frame: cursor.get_u64_le(),
            end_frame: cursor.get_u64_le(),
            current_frame: cursor.get_u64_le(),
            frame_counter: cursor.get_u64_le(),
        })
    }
}
