//! Dual-hand slot assignment.
//!
//! Detector side labels are not identity-stable. [`SidePolicy`] decides
//! whether to trust them or to re-derive left/right from screen position
//! each frame; the resulting [`HandSlots`] feed every hand channel.

use crate::landmarks::{HandLandmarks, Side};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How detected hands are assigned to the left and right slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SidePolicy {
    /// Use the detector's side label.
    #[default]
    TrustDetector,
    /// With two hands, the one with the smaller palm x is Left.
    /// A single hand keeps its detector label.
    ByPosition,
}

/// Hand fusion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Slot preferred by dominant-hand channels when both hands are present
    pub primary: Side,
    /// Slot assignment policy
    pub side_policy: SidePolicy,
    /// Mirror cursor x and swipe direction (selfie view)
    pub mirror_x: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            primary: Side::Right,
            side_policy: SidePolicy::TrustDetector,
            mirror_x: false,
        }
    }
}

/// How a hand ended up in its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assignment {
    /// The detector's side label.
    Label,
    /// Its label was taken by an earlier hand, so it got the other slot.
    Fallback,
    /// Screen-space ordering of two hands.
    Position,
}

#[derive(Debug, Clone, Copy)]
struct Entry<'a> {
    hand: &'a HandLandmarks,
    assignment: Assignment,
}

/// The hands of one frame, indexed by slot.
#[derive(Debug, Clone, Copy, Default)]
pub struct HandSlots<'a> {
    slots: [Option<Entry<'a>>; 2],
}

impl<'a> HandSlots<'a> {
    /// Assign `hands` to slots. Extra hands beyond two are ignored.
    ///
    /// With `mirror_x` the position policy orders hands by mirrored x, so
    /// Left is always the hand on the left of the displayed image.
    pub fn resolve<I>(hands: I, policy: SidePolicy, mirror_x: bool) -> Self
    where
        I: IntoIterator<Item = &'a HandLandmarks>,
    {
        let mut present: Vec<&HandLandmarks> = hands.into_iter().collect();
        if present.len() > 2 {
            trace!("Ignoring {} extra hands", present.len() - 2);
            present.truncate(2);
        }

        let mut slots = [None, None];
        match (policy, present.as_slice()) {
            (SidePolicy::ByPosition, [a, b]) => {
                let screen_x = |hand: &HandLandmarks| {
                    let x = hand.palm().x;
                    if mirror_x {
                        1.0 - x
                    } else {
                        x
                    }
                };
                let (left, right) = if screen_x(*a) <= screen_x(*b) {
                    (*a, *b)
                } else {
                    (*b, *a)
                };
                for (side, hand) in [(Side::Left, left), (Side::Right, right)] {
                    slots[side.index()] = Some(Entry {
                        hand,
                        assignment: Assignment::Position,
                    });
                }
            }
            _ => {
                for &hand in &present {
                    let wanted = hand.side.index();
                    let (free, assignment) = if slots[wanted].is_none() {
                        (wanted, Assignment::Label)
                    } else {
                        // Duplicate label: fall back to the other slot
                        (hand.side.opposite().index(), Assignment::Fallback)
                    };
                    if slots[free].is_none() {
                        slots[free] = Some(Entry { hand, assignment });
                    }
                }
            }
        }
        Self { slots }
    }

    /// Hand in a slot.
    pub fn get(&self, side: Side) -> Option<&'a HandLandmarks> {
        self.slots[side.index()].map(|entry| entry.hand)
    }

    /// How the hand in a slot was assigned.
    pub fn assignment(&self, side: Side) -> Option<Assignment> {
        self.slots[side.index()].map(|entry| entry.assignment)
    }

    /// The primary slot's hand, or the other one when the primary is empty.
    pub fn dominant(&self, primary: Side) -> Option<(Side, &'a HandLandmarks)> {
        self.get(primary)
            .map(|h| (primary, h))
            .or_else(|| self.get(primary.opposite()).map(|h| (primary.opposite(), h)))
    }

    /// Occupied slots, left first.
    pub fn iter(&self) -> impl Iterator<Item = (Side, &'a HandLandmarks)> + '_ {
        Side::BOTH
            .into_iter()
            .filter_map(move |side| self.get(side).map(|h| (side, h)))
    }

    /// Whether any slot is occupied.
    pub fn any(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }
}
