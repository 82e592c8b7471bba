//! Double buffering with one shared slot selector per body.
//!
//! Every buffered field of a body is a `Buffered<T>`; none of them know which
//! slot is active. The owning body keeps a single `ActiveSlot` and passes it
//! in on every access, so flipping that one value swaps all fields at once.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which of the two slots currently holds the readable ("active") state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ActiveSlot {
    #[default]
    A,
    B,
}

impl ActiveSlot {
    fn index(self) -> usize {
        match self {
            ActiveSlot::A => 0,
            ActiveSlot::B => 1,
        }
    }

    /// The slot that is not active.
    pub fn other(self) -> Self {
        match self {
            ActiveSlot::A => ActiveSlot::B,
            ActiveSlot::B => ActiveSlot::A,
        }
    }

    pub fn flip(&mut self) {
        *self = self.other();
    }
}

/// A value stored twice, addressed by `ActiveSlot`.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffered<T> {
    slots: [T; 2],
}

impl<T: Clone> Buffered<T> {
    /// Both slots start with the same value.
    pub fn new(value: T) -> Self {
        Self {
            slots: [value.clone(), value],
        }
    }

    /// Writes `value` into both slots.
    pub fn set_both(&mut self, value: T) {
        self.slots[1] = value.clone();
        self.slots[0] = value;
    }
}

impl<T> Buffered<T> {
    pub fn active(&self, slot: ActiveSlot) -> &T {
        &self.slots[slot.index()]
    }

    pub fn background(&self, slot: ActiveSlot) -> &T {
        &self.slots[slot.other().index()]
    }

    pub fn background_mut(&mut self, slot: ActiveSlot) -> &mut T {
        &mut self.slots[slot.other().index()]
    }
}
