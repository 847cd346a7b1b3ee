//! Bounding volumes reported by a source file.

use serde::{Deserialize, Serialize};

/// Axis-aligned box of blocks. `min` is inclusive, `max` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionBox {
    /// Minimum corner (inclusive).
    pub min: [i32; 3],
    /// Maximum corner (exclusive).
    pub max: [i32; 3],
}

impl SelectionBox {
    /// Creates a box from two opposite corners in any order.
    pub fn new(a: [i32; 3], b: [i32; 3]) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1]), a[2].min(b[2])],
            max: [a[0].max(b[0]), a[1].max(b[1]), a[2].max(b[2])],
        }
    }

    /// Size along each axis. An inverted axis has size 0.
    pub fn size(&self) -> [u64; 3] {
        [0, 1, 2].map(|i| u64::try_from(i64::from(self.max[i]) - i64::from(self.min[i])).unwrap_or(0))
    }

    /// Number of blocks inside the box.
    ///
    /// Each axis spans at most 2^32 blocks, so the product always fits.
    pub fn volume(&self) -> u128 {
        self.size().iter().map(|&s| u128::from(s)).product()
    }

    /// Returns `true` if the block at `pos` is inside the box.
    pub fn contains(&self, pos: [i32; 3]) -> bool {
        (0..3).all(|i| self.min[i] <= pos[i] && pos[i] < self.max[i])
    }
}

/// Ordered collection of boxes describing the occupied volume.
///
/// The import path passes it through untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionGroup {
    boxes: Vec<SelectionBox>,
}

impl SelectionGroup {
    /// Creates a group from a list of boxes.
    pub fn new(boxes: Vec<SelectionBox>) -> Self {
        Self { boxes }
    }

    /// The boxes, in file order.
    pub fn boxes(&self) -> &[SelectionBox] {
        &self.boxes
    }

    /// Returns `true` if the group has no boxes.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Smallest box enclosing every box of the group.
    pub fn bounds(&self) -> Option<SelectionBox> {
        let mut boxes = self.boxes.iter();
        let first = *boxes.next()?;
        Some(boxes.fold(first, |acc, b| SelectionBox {
            min: [0, 1, 2].map(|i| acc.min[i].min(b.min[i])),
            max: [0, 1, 2].map(|i| acc.max[i].max(b.max[i])),
        }))
    }

    /// Sum of box volumes. Overlapping boxes are counted twice.
    pub fn volume(&self) -> u128 {
        self.boxes
            .iter()
            .map(SelectionBox::volume)
            .fold(0, u128::saturating_add)
    }

    /// Returns `true` if any box contains `pos`.
    pub fn contains(&self, pos: [i32; 3]) -> bool {
        self.boxes.iter().any(|b| b.contains(pos))
    }
}

impl From<SelectionBox> for SelectionGroup {
    fn from(b: SelectionBox) -> Self {
        Self { boxes: vec![b] }
    }
}
