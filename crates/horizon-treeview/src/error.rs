//! Error types for the tree view.

use crate::node::NodeId;

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, TreeError>;

/// Result returned by a [`ChildLoader`](crate::ChildLoader).
pub type LoadResult = std::result::Result<(), LoadError>;

/// Errors raised by tree mutations and queries.
///
/// Structural errors are detected before anything is mutated, so a failed
/// call leaves the tree exactly as it was.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The node ID is invalid or the node has been destroyed.
    #[error("Invalid or destroyed node ID {0:?}")]
    InvalidNode(NodeId),

    /// The node already has a parent.
    #[error("Node {node:?} is already attached to {parent:?}")]
    AlreadyParented { node: NodeId, parent: NodeId },

    /// The node is not a child of the given parent.
    #[error("Node {node:?} is not a child of {parent:?}")]
    NotAChild { node: NodeId, parent: NodeId },

    /// The same node was passed twice in one batch.
    #[error("Node {0:?} appears more than once in the batch")]
    DuplicateNode(NodeId),

    /// Inserting the node would make it its own ancestor.
    #[error("Inserting {node:?} under {parent:?} would make it its own ancestor")]
    WouldCreateCycle { node: NodeId, parent: NodeId },

    /// The node is the root of the attached projection and cannot be re-parented.
    #[error("Node {0:?} is the root of the attached projection")]
    RootAttached(NodeId),

    /// Only parentless nodes can back a projection.
    #[error("Node {0:?} has a parent and cannot be a projection root")]
    NotARoot(NodeId),

    /// Insertion position past the end of the child list.
    #[error("Insertion index {index} is out of bounds for {len} children")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Check state was set on a node without a checkbox.
    #[error("Node {0:?} is not checkable")]
    NotCheckable(NodeId),

    /// The node cannot become a row of the current projection.
    #[error("Node {0:?} is not visible")]
    NotVisible(NodeId),

    /// The child provider failed. The node's lazy flag stays cleared.
    #[error("Loading children of {node:?} failed: {source}")]
    Load {
        node: NodeId,
        #[source]
        source: LoadError,
    },

    /// Configuration could not be read or written.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl TreeError {
    /// Create a load error for a node.
    pub fn load(node: NodeId, source: LoadError) -> Self {
        Self::Load { node, source }
    }
}

/// Errors reported by a [`ChildLoader`](crate::ChildLoader).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The node is lazy but nothing can materialize its children.
    #[error("{0} does not support lazy loading")]
    Unsupported(String),

    /// The provider could not produce the children.
    #[error("Provider failed: {0}")]
    Provider(String),

    /// A structural edit issued by the provider was rejected.
    #[error("Structural edit rejected: {0}")]
    Tree(Box<TreeError>),
}

impl LoadError {
    /// Create a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }
}

impl From<TreeError> for LoadError {
    fn from(err: TreeError) -> Self {
        Self::Tree(Box::new(err))
    }
}

/// Errors reading or writing a [`TreeViewConfig`](crate::TreeViewConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse error.
    #[error("Failed to parse tree view config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("Failed to serialize tree view config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
