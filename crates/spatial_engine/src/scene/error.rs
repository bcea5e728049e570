//! Scene error types

use crate::config::ConfigError;
use crate::render::RenderError;

/// Errors raised by scene construction, hierarchy edits and drawing
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// A node handle does not belong to the tree it was used with
    #[error("Transform node not found")]
    NodeNotFound,

    /// An object handle is stale or was never spawned
    #[error("Scene object not found")]
    ObjectNotFound,

    /// Checked lookup into a mesh, node or binding list failed
    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Which list was indexed
        what: &'static str,
        /// Requested index
        index: usize,
        /// Length of the list
        len: usize,
    },

    /// Attaching the node would make it its own ancestor
    #[error("Attaching node would create a hierarchy cycle")]
    HierarchyCycle,

    /// The root can only go away with its object
    #[error("Cannot remove an object's root node")]
    RootRemoval,

    /// A scene description without any nodes
    #[error("Scene description has no nodes")]
    EmptyScene,

    /// The root names a parent, or another node names none or a later one
    #[error("Node {node} has invalid parent {parent:?}")]
    InvalidParent {
        /// Offending node index
        node: usize,
        /// Parent index it names
        parent: Option<usize>,
    },

    /// Culling settings failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Failure reported by the rendering backend
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
