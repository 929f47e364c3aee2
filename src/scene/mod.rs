//! Write-only interface to the host scene
//!
//! The importer never reads back from the scene. Everything it creates goes
//! through [`SceneSink`], which a host implements on top of its own mesh,
//! material and object records. [`MemoryScene`] is a plain in-memory
//! implementation.

mod memory;

pub use memory::{MemoryScene, SceneImage, SceneMaterial, SceneMesh, SceneObject, UvLayer};

use crate::error::Result;
use crate::materials::MaterialRecord;
use crate::translate::CornerUvs;
use std::fmt;
use std::path::Path;

macro_rules! scene_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub usize);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

scene_id!(
    /// Handle of an image loaded into the scene
    ImageId
);
scene_id!(
    /// Handle of a scene material
    MaterialId
);
scene_id!(
    /// Handle of a scene mesh
    MeshId
);
scene_id!(
    /// Handle of a scene object
    ObjectId
);

/// Index of a material slot on one mesh
pub type SlotIndex = usize;

/// The host scene operations the importer needs
pub trait SceneSink {
    /// Load an image file into the scene
    ///
    /// The file at `path` only exists for the duration of the call.
    fn load_image(&mut self, name: &str, path: &Path) -> Result<ImageId>;

    /// Create a material; textured records come with their loaded image
    fn create_material(
        &mut self,
        record: &MaterialRecord,
        image: Option<ImageId>,
    ) -> Result<MaterialId>;

    /// Create a mesh from vertex, edge and face arrays
    fn create_mesh(
        &mut self,
        name: &str,
        vertices: &[[f64; 3]],
        edges: &[[usize; 2]],
        faces: &[[usize; 3]],
    ) -> Result<MeshId>;

    /// Append a material slot to a mesh and return its index
    fn add_material_slot(&mut self, mesh: MeshId, material: MaterialId) -> Result<SlotIndex>;

    /// Assign a slot to every face; `None` leaves the face on the default material
    fn set_face_materials(&mut self, mesh: MeshId, slots: &[Option<SlotIndex>]) -> Result<()>;

    /// Write per-corner UVs of every face into a named UV layer
    fn set_corner_uvs(&mut self, mesh: MeshId, layer: &str, uvs: &[CornerUvs]) -> Result<()>;

    /// Create an object wrapping a mesh
    fn create_object(&mut self, name: &str, mesh: MeshId) -> Result<ObjectId>;

    /// Link an object into the active collection
    fn link_object(&mut self, object: ObjectId) -> Result<()>;

    /// Mark an object selected, optionally making it the active object
    fn select_object(&mut self, object: ObjectId, active: bool) -> Result<()>;
}
