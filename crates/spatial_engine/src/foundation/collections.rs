//! Handle types and arena collections

pub use slotmap::{SecondaryMap, SlotMap};

slotmap::new_key_type! {
    /// Handle to a transform node inside one object's [`TransformTree`](crate::scene::TransformTree)
    pub struct NodeId;

    /// Handle to a spatial object owned by the [`SceneManager`](crate::scene::SceneManager)
    pub struct ObjectId;

    /// Process-wide key for a registered transform node
    pub struct NodeKey;
}
