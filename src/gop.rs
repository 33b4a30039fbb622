//! Frame types, reference links and encode order within one closed GOP.
//!
//! Slots are display positions inside the GOP. References are slot
//! indices into the same GOP, never pointers.

use strum_macros::{Display, EnumIter};

use crate::image::Picture;
use crate::mpeg1::constants::{PICTURE_TYPE_B, PICTURE_TYPE_INTRA, PICTURE_TYPE_PREDICTIVE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display)]
pub enum FrameType {
    I,
    P,
    B,
}

impl FrameType {
    /// 3-bit `picture_coding_type`.
    pub fn coding_type(&self) -> u8 {
        match self {
            FrameType::I => PICTURE_TYPE_INTRA,
            FrameType::P => PICTURE_TYPE_PREDICTIVE,
            FrameType::B => PICTURE_TYPE_B,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, FrameType::I | FrameType::P)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Unassigned,
    TypeAssigned,
    ReferencesLinked,
    Encoded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub frame_type: FrameType,
    /// Nearest earlier I or P slot.
    pub previous: Option<usize>,
    /// Nearest later P slot, B frames only.
    pub future: Option<usize>,
    pub state: SlotState,
}

/// Type of `slot` from the repeating pattern alone: slot 0 is I, then a P
/// every `b_frames + 1` slots starting at slot 1.
pub fn pattern_frame_type(slot: usize, b_frames: usize) -> FrameType {
    if slot == 0 {
        FrameType::I
    } else if (slot - 1) % b_frames.saturating_add(1) == 0 {
        FrameType::P
    } else {
        FrameType::B
    }
}

/// Types for a GOP of `len` slots. A B slot left without a later P (only
/// possible at the end of the GOP) becomes a P.
pub fn assign_frame_types(len: usize, b_frames: usize) -> Vec<FrameType> {
    let mut types = (0..len)
        .map(|slot| pattern_frame_type(slot, b_frames))
        .collect::<Vec<FrameType>>();
    if let Some(last) = types.last_mut() {
        if *last == FrameType::B {
            *last = FrameType::P;
        }
    }
    types
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GopPlan {
    slots: Vec<Slot>,
}

impl GopPlan {
    pub fn new(len: usize, b_frames: usize) -> GopPlan {
        let mut slots = vec![
            Slot {
                frame_type: FrameType::I,
                previous: None,
                future: None,
                state: SlotState::Unassigned,
            };
            len
        ];

        for (slot, frame_type) in slots.iter_mut().zip(assign_frame_types(len, b_frames)) {
            slot.frame_type = frame_type;
            slot.state = SlotState::TypeAssigned;
        }

        for index in 0..len {
            let frame_type = slots[index].frame_type;
            let previous = match frame_type {
                FrameType::I => None,
                _ => (0..index).rev().find(|&s| slots[s].frame_type.is_reference()),
            };
            let future = match frame_type {
                FrameType::B => (index + 1..len).find(|&s| slots[s].frame_type == FrameType::P),
                _ => None,
            };
            let slot = &mut slots[index];
            slot.previous = previous;
            slot.future = future;
            slot.state = SlotState::ReferencesLinked;
        }

        GopPlan { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Display slots in coding order: each P ahead of the B slots it bounds.
    pub fn encode_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.slots.len());
        let mut pending = Vec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.frame_type == FrameType::B {
                pending.push(index);
            } else {
                order.push(index);
                order.append(&mut pending);
            }
        }
        order.append(&mut pending);
        order
    }

    /// Whether every reference of `index` has been encoded.
    pub fn is_ready(&self, index: usize) -> bool {
        let slot = &self.slots[index];
        slot.state == SlotState::ReferencesLinked
            && [slot.previous, slot.future]
                .iter()
                .flatten()
                .all(|&r| self.slots[r].state == SlotState::Encoded)
    }

    pub fn mark_encoded(&mut self, index: usize) {
        self.slots[index].state = SlotState::Encoded;
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| s.state == SlotState::Encoded)
    }
}

/// One source picture held in the GOP arena.
#[derive(Debug, Clone)]
pub struct Frame {
    pub display_index: usize,
    pub picture: Picture,
}

/// Pictures of the GOP being collected, indexed by slot.
#[derive(Debug, Default)]
pub struct Gop {
    pub frames: Vec<Frame>,
}

impl Gop {
    pub fn new(capacity: usize) -> Gop {
        Gop {
            frames: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first_display_index(&self) -> Option<usize> {
        self.frames.first().map(|f| f.display_index)
    }

    pub fn take(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }
}
