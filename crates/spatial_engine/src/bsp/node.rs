//! BSP tree nodes
//!
//! The tree records which side of each configured plane an object's centre
//! falls on. Culling does not walk it; it backs inspection tools through
//! [`BspNode::collect_visible`].

use crate::bsp::BspPlane;
use crate::foundation::collections::ObjectId;
use crate::foundation::math::Vec3;

/// Node of the partition tree
#[derive(Debug, Clone, Default)]
pub struct BspNode {
    /// Splitting plane, `None` for nodes created only to hold objects
    pub plane: Option<BspPlane>,
    /// Subtree in front of the plane
    pub front: Option<Box<BspNode>>,
    /// Subtree behind the plane
    pub back: Option<Box<BspNode>>,
    /// Objects stored at this node (leaves only)
    pub objects: Vec<ObjectId>,
}

impl BspNode {
    /// Empty leaf
    pub fn leaf() -> Self {
        Self::default()
    }

    /// Childless node carrying a plane
    pub fn with_plane(plane: BspPlane) -> Self {
        Self {
            plane: Some(plane),
            ..Default::default()
        }
    }

    /// Build the tree for a plane list.
    ///
    /// The root carries plane 0 and both children of a level-`i` node carry
    /// plane `i + 1`. Nodes of the last level have no children, so they are
    /// leaves and the last plane never splits anything.
    pub fn build(planes: &[BspPlane]) -> Self {
        match planes.first() {
            Some(plane) => {
                let mut root = Self::with_plane(*plane);
                root.grow(planes, 0);
                root
            }
            None => Self::leaf(),
        }
    }

    fn grow(&mut self, planes: &[BspPlane], level: usize) {
        let Some(next) = planes.get(level + 1) else {
            return;
        };

        let mut front = Self::with_plane(*next);
        let mut back = Self::with_plane(*next);
        front.grow(planes, level + 1);
        back.grow(planes, level + 1);
        self.front = Some(Box::new(front));
        self.back = Some(Box::new(back));
    }

    /// No children on either side
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }

    fn side_is_front(&self, point: Vec3) -> bool {
        self.plane.map_or(true, |plane| plane.is_point_in_front(point))
    }

    /// Store `object` in the leaf its centre falls into, creating the child
    /// on that side if it is missing
    pub fn insert(&mut self, object: ObjectId, center: Vec3) {
        if self.is_leaf() {
            self.objects.push(object);
            return;
        }

        let child = if self.side_is_front(center) {
            &mut self.front
        } else {
            &mut self.back
        };
        child.get_or_insert_with(Box::default).insert(object, center);
    }

    /// Remove every occurrence of `object` from this subtree
    pub fn remove(&mut self, object: ObjectId) -> bool {
        let before = self.objects.len();
        self.objects.retain(|o| *o != object);
        let mut removed = self.objects.len() != before;

        for child in [&mut self.front, &mut self.back].into_iter().flatten() {
            removed |= child.remove(object);
        }
        removed
    }

    /// Objects in the leaves on the camera's side of every plane on the way down
    pub fn collect_visible(&self, camera_position: Vec3) -> Vec<ObjectId> {
        let mut visible = Vec::new();
        self.collect_into(camera_position, &mut visible);
        visible
    }

    fn collect_into(&self, camera_position: Vec3, out: &mut Vec<ObjectId>) {
        if self.is_leaf() {
            out.extend_from_slice(&self.objects);
            return;
        }

        let child = if self.side_is_front(camera_position) {
            &self.front
        } else {
            &self.back
        };
        if let Some(child) = child {
            child.collect_into(camera_position, out);
        }
    }

    /// Objects stored anywhere in this subtree
    pub fn object_count(&self) -> usize {
        self.objects.len()
            + self.front.as_ref().map_or(0, |n| n.object_count())
            + self.back.as_ref().map_or(0, |n| n.object_count())
    }

    /// Number of levels, 1 for a lone leaf
    pub fn depth(&self) -> usize {
        let front = self.front.as_ref().map_or(0, |n| n.depth());
        let back = self.back.as_ref().map_or(0, |n| n.depth());
        1 + front.max(back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn object(n: u64) -> ObjectId {
        ObjectId::from(KeyData::from_ffi(n))
    }

    fn two_planes() -> [BspPlane; 2] {
        [BspPlane::new(Vec3::x(), 0.0), BspPlane::new(Vec3::z(), 0.0)]
    }

    #[test]
    fn test_build_levels() {
        assert!(BspNode::build(&[]).is_leaf());
        assert!(BspNode::build(&two_planes()[..1]).is_leaf());

        let tree = BspNode::build(&two_planes());
        assert_eq!(tree.depth(), 2);
        let front = tree.front.as_ref().expect("front");
        assert_eq!(front.plane, Some(two_planes()[1]));
        assert!(front.is_leaf());
    }

    #[test]
    fn test_insert_and_collect_by_camera_side() {
        let mut tree = BspNode::build(&two_planes());
        tree.insert(object(1), Vec3::new(5.0, 0.0, 0.0));
        tree.insert(object(2), Vec3::new(-5.0, 0.0, 0.0));
        tree.insert(object(3), Vec3::new(5.0, 0.0, -5.0));

        assert_eq!(tree.object_count(), 3);
        assert_eq!(tree.collect_visible(Vec3::new(10.0, 0.0, 0.0)), vec![object(1), object(3)]);
        assert_eq!(tree.collect_visible(Vec3::new(-10.0, 0.0, 0.0)), vec![object(2)]);
    }

    #[test]
    fn test_single_plane_root_keeps_everything() {
        let mut tree = BspNode::build(&two_planes()[..1]);
        tree.insert(object(1), Vec3::new(5.0, 0.0, 0.0));
        tree.insert(object(2), Vec3::new(-5.0, 0.0, 0.0));
        assert_eq!(tree.collect_visible(Vec3::new(10.0, 0.0, 0.0)).len(), 2);
    }

    #[test]
    fn test_remove() {
        let mut tree = BspNode::build(&two_planes());
        tree.insert(object(1), Vec3::new(5.0, 0.0, 0.0));
        assert!(tree.remove(object(1)));
        assert!(!tree.remove(object(1)));
        assert_eq!(tree.object_count(), 0);
    }
}
