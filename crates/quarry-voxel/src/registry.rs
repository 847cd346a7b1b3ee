//! Block registry: deduplicates [`BlockDescriptor`] values into compact
//! [`BlockId`] indices.
//!
//! One registry is shared by every chunk of an import. Chunks never own a
//! copy of it; they carry its [`RegistryToken`] and store ids that only make
//! sense against that registry.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Namespace assumed when a block string omits one.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Index of a block type inside one [`BlockRegistry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Identity of a registry instance, used to check chunk bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RegistryToken(u64);

impl RegistryToken {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A distinct block type as read from a file.
///
/// Compared and hashed by value. The canonical text form is
/// `namespace:base_name[key=value,...]`, with properties sorted by key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockDescriptor {
    /// Namespace, e.g. `minecraft`.
    pub namespace: String,
    /// Block name within the namespace, e.g. `oak_stairs`.
    pub base_name: String,
    /// Block state properties.
    pub properties: BTreeMap<String, String>,
}

/// A block string that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockParseError {
    /// The string (or its name part) was empty.
    #[error("empty block name")]
    EmptyName,
    /// A `[` was opened but never closed, or text follows the `]`.
    #[error("malformed property list in {0:?}")]
    MalformedProperties(String),
    /// A property was not of the form `key=value`.
    #[error("malformed property {0:?}")]
    MalformedProperty(String),
}

impl BlockDescriptor {
    /// Creates a descriptor with no properties.
    pub fn new(namespace: impl Into<String>, base_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            base_name: base_name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Adds or replaces a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for BlockDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.base_name)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{key}={value}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

impl FromStr for BlockDescriptor {
    type Err = BlockParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, props) = match s.find('[') {
            Some(open) => {
                let Some(inner) = s[open + 1..].strip_suffix(']') else {
                    return Err(BlockParseError::MalformedProperties(s.to_string()));
                };
                (&s[..open], Some(inner))
            }
            None => (s, None),
        };

        let (namespace, base_name) = match name.split_once(':') {
            Some((ns, base)) => (ns, base),
            None => (DEFAULT_NAMESPACE, name),
        };
        if namespace.is_empty() || base_name.is_empty() {
            return Err(BlockParseError::EmptyName);
        }

        let mut block = BlockDescriptor::new(namespace, base_name);
        if let Some(props) = props.filter(|p| !p.is_empty()) {
            for pair in props.split(',') {
                let Some((key, value)) = pair.split_once('=') else {
                    return Err(BlockParseError::MalformedProperty(pair.to_string()));
                };
                let key = key.trim();
                if key.is_empty() {
                    return Err(BlockParseError::MalformedProperty(pair.to_string()));
                }
                block.properties.insert(key.to_string(), value.trim().to_string());
            }
        }
        Ok(block)
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`BlockDescriptor`] → [`BlockId`] with O(1) lookup both ways.
///
/// Ids are handed out densely from 0 in first-seen order and never change.
/// There is no removal.
#[derive(Debug)]
pub struct BlockRegistry {
    token: RegistryToken,
    /// Dense table where `index == BlockId.0`.
    blocks: Vec<BlockDescriptor>,
    ids: FxHashMap<BlockDescriptor, BlockId>,
}

impl BlockRegistry {
    /// Creates an empty registry with a fresh token.
    pub fn new() -> Self {
        Self {
            token: RegistryToken::next(),
            blocks: Vec::new(),
            ids: FxHashMap::default(),
        }
    }

    /// Returns the id for `block`, registering it on first sight.
    ///
    /// Interning the same descriptor twice yields the same id.
    pub fn intern(&mut self, block: &BlockDescriptor) -> BlockId {
        if let Some(&id) = self.ids.get(block) {
            return id;
        }
        let id = BlockId(self.blocks.len() as u32);
        self.ids.insert(block.clone(), id);
        self.blocks.push(block.clone());
        id
    }

    /// Returns the descriptor for `id`, or `None` if this registry never
    /// produced it.
    pub fn get(&self, id: BlockId) -> Option<&BlockDescriptor> {
        self.blocks.get(id.0 as usize)
    }

    /// Returns the id of an already registered descriptor.
    pub fn lookup(&self, block: &BlockDescriptor) -> Option<BlockId> {
        self.ids.get(block).copied()
    }

    /// Number of registered block types.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Returns `true` if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// All entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (BlockId, &BlockDescriptor)> {
        self.blocks
            .iter()
            .enumerate()
            .map(|(i, block)| (BlockId(i as u32), block))
    }

    /// Identity of this registry instance.
    pub fn token(&self) -> RegistryToken {
        self.token
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
