//! Importer-facing scene description
//!
//! Asset importers flatten a loaded file into a [`SceneDescription`]: a list
//! of meshes with their vertex positions and a list of nodes in parent-first
//! order. [`SpatialObject`](crate::scene::SpatialObject) turns it into a
//! transform arena plus mesh bindings.

use crate::foundation::math::{LocalTransform, Mat4, Vec3};
use crate::render::{MaterialBinding, MeshHandle};
use crate::scene::{Aabb, SceneError, SceneResult};

/// Index count of a cube made of 12 triangles
pub const CUBE_INDEX_COUNT: u32 = 36;

/// One mesh as handed over by the importer
#[derive(Debug, Clone)]
pub struct MeshDescription {
    /// Backend geometry handle
    pub mesh: MeshHandle,
    /// Number of indices to draw
    pub index_count: u32,
    /// Vertex positions in node-local space, used only for bounds
    pub positions: Vec<Vec3>,
    /// Material the importer assigned
    pub material: MaterialBinding,
}

impl MeshDescription {
    /// Local bounds of the vertex positions, `None` without vertices
    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(&self.positions)
    }
}

/// Local transform of an imported node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeTransform {
    /// Already decomposed translation / rotation / scale
    Trs(LocalTransform),
    /// Affine matrix, decomposed on import
    Matrix(Mat4),
}

impl NodeTransform {
    /// Decomposed local transform
    pub fn to_local(&self) -> LocalTransform {
        match self {
            NodeTransform::Trs(local) => *local,
            NodeTransform::Matrix(matrix) => LocalTransform::from_matrix(matrix),
        }
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        NodeTransform::Trs(LocalTransform::identity())
    }
}

/// One node of the imported hierarchy
#[derive(Debug, Clone, Default)]
pub struct NodeDescription {
    /// Node name from the source file
    pub name: String,
    /// Local transform relative to the parent
    pub transform: NodeTransform,
    /// Index of the parent node; `None` only for node 0
    pub parent: Option<usize>,
    /// Indices into [`SceneDescription::meshes`] bound to this node
    pub meshes: Vec<usize>,
}

/// Flattened node hierarchy plus meshes
#[derive(Debug, Clone, Default)]
pub struct SceneDescription {
    /// Nodes, parents always before their children; node 0 is the root
    pub nodes: Vec<NodeDescription>,
    /// Meshes referenced by index from the nodes
    pub meshes: Vec<MeshDescription>,
}

impl SceneDescription {
    /// Empty description
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mesh and return its index
    pub fn add_mesh(&mut self, mesh: MeshDescription) -> usize {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    /// Append a node and return its index
    pub fn add_node(&mut self, node: NodeDescription) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Single-node description of an axis-aligned cube centred on the origin
    pub fn cube(mesh: MeshHandle, half_extent: f32) -> Self {
        let positions = Aabb::cube(Vec3::zeros(), half_extent).corners().to_vec();
        let mut description = Self::new();
        let index = description.add_mesh(MeshDescription {
            mesh,
            index_count: CUBE_INDEX_COUNT,
            positions,
            material: MaterialBinding::Default,
        });
        description.add_node(NodeDescription {
            name: "cube".to_string(),
            meshes: vec![index],
            ..Default::default()
        });
        description
    }

    /// Check parent ordering and mesh references
    pub fn validate(&self) -> SceneResult<()> {
        if self.nodes.is_empty() {
            return Err(SceneError::EmptyScene);
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let parent_ok = match (index, node.parent) {
                (0, None) => true,
                (0, Some(_)) | (_, None) => false,
                (_, Some(parent)) => parent < index,
            };
            if !parent_ok {
                return Err(SceneError::InvalidParent { node: index, parent: node.parent });
            }

            for mesh in &node.meshes {
                self.mesh(*mesh)?;
            }
        }
        Ok(())
    }

    /// Checked mesh lookup
    pub fn mesh(&self, index: usize) -> SceneResult<&MeshDescription> {
        self.meshes.get(index).ok_or(SceneError::IndexOutOfRange {
            what: "mesh",
            index,
            len: self.meshes.len(),
        })
    }

    /// Checked node lookup
    pub fn node(&self, index: usize) -> SceneResult<&NodeDescription> {
        self.nodes.get(index).ok_or(SceneError::IndexOutOfRange {
            what: "node",
            index,
            len: self.nodes.len(),
        })
    }

    /// Indices of the direct children of `index`
    pub fn children_of(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.parent == Some(index))
            .map(|(child, _)| child)
    }

    /// Node that becomes the object's root.
    ///
    /// A mesh-less root with exactly one child is a wrapper added by many
    /// exporters; it is skipped along with its transform.
    pub fn effective_root(&self) -> usize {
        let Some(root) = self.nodes.first() else {
            return 0;
        };
        if !root.meshes.is_empty() {
            return 0;
        }

        let mut children = self.children_of(0);
        match (children.next(), children.next()) {
            (Some(only), None) => only,
            _ => 0,
        }
    }

    /// Local bounds of a node: the union of its non-degenerate mesh bounds,
    /// or a cube of `default_half_extent` when none contribute
    pub fn node_local_aabb(&self, index: usize, default_half_extent: f32) -> SceneResult<Aabb> {
        let node = self.node(index)?;

        let mut bounds: Option<Aabb> = None;
        for mesh in &node.meshes {
            let Some(mesh_bounds) = self.mesh(*mesh)?.aabb() else {
                continue;
            };
            if mesh_bounds.is_degenerate() {
                continue;
            }
            bounds = Some(match bounds {
                Some(current) => current.union(&mesh_bounds),
                None => mesh_bounds,
            });
        }

        Ok(bounds.unwrap_or_else(|| Aabb::cube(Vec3::zeros(), default_half_extent)))
    }
}
