//! Chunk-grid coordinates and dimension names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a chunk column within a dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk-grid X coordinate.
    pub x: i32,
    /// Chunk-grid Z coordinate.
    pub z: i32,
}

impl ChunkCoord {
    /// Creates a new chunk coordinate.
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Name of a sub-world inside a source file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dimension(String);

impl Dimension {
    /// Wraps a dimension name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The dimension name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_as_map_key() {
        let mut set = std::collections::HashSet::new();
        set.insert(ChunkCoord::new(1, 2));
        assert!(set.contains(&ChunkCoord::new(1, 2)));
        assert!(!set.contains(&ChunkCoord::new(2, 1)));
    }
}
