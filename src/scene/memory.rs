//! In-memory scene used by tests and the command-line tool

use super::{ImageId, MaterialId, MeshId, ObjectId, SceneSink, SlotIndex};
use crate::error::{Error, Result};
use crate::materials::MaterialRecord;
use crate::translate::CornerUvs;
use std::path::Path;

/// An image loaded from disk
#[derive(Debug, Clone, PartialEq)]
pub struct SceneImage {
    /// Image name
    pub name: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// A material and the image it samples
#[derive(Debug, Clone, PartialEq)]
pub struct SceneMaterial {
    /// Material parameters
    pub record: MaterialRecord,
    /// Bound image, for textured materials
    pub image: Option<ImageId>,
}

/// A named per-corner UV layer
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    /// Layer name
    pub name: String,
    /// UVs of each face corner
    pub uvs: Vec<CornerUvs>,
}

/// A mesh with its material slots and UV layers
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneMesh {
    /// Mesh name
    pub name: String,
    /// Vertex positions
    pub vertices: Vec<[f64; 3]>,
    /// Explicit edges
    pub edges: Vec<[usize; 2]>,
    /// Faces
    pub faces: Vec<[usize; 3]>,
    /// Material slots in insertion order
    pub material_slots: Vec<MaterialId>,
    /// Slot of every face, empty until assigned
    pub face_materials: Vec<Option<SlotIndex>>,
    /// UV layers
    pub uv_layers: Vec<UvLayer>,
}

impl SceneMesh {
    /// UV layer by name
    pub fn uv_layer(&self, name: &str) -> Option<&UvLayer> {
        self.uv_layers.iter().find(|layer| layer.name == name)
    }
}

/// An object in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Object name
    pub name: String,
    /// Wrapped mesh
    pub mesh: MeshId,
    /// Linked into the collection
    pub linked: bool,
    /// Selected
    pub selected: bool,
}

/// A scene kept entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryScene {
    images: Vec<SceneImage>,
    materials: Vec<SceneMaterial>,
    meshes: Vec<SceneMesh>,
    objects: Vec<SceneObject>,
    active: Option<ObjectId>,
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Loaded images
    pub fn images(&self) -> &[SceneImage] {
        &self.images
    }

    /// Created materials
    pub fn materials(&self) -> &[SceneMaterial] {
        &self.materials
    }

    /// Created meshes
    pub fn meshes(&self) -> &[SceneMesh] {
        &self.meshes
    }

    /// Created objects, linked or not
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Objects linked into the collection
    pub fn linked_objects(&self) -> impl Iterator<Item = &SceneObject> + '_ {
        self.objects.iter().filter(|object| object.linked)
    }

    /// The active object
    pub fn active_object(&self) -> Option<&SceneObject> {
        self.active.and_then(|id| self.objects.get(id.0))
    }

    /// Look up a material by id
    pub fn material(&self, id: MaterialId) -> Option<&SceneMaterial> {
        self.materials.get(id.0)
    }

    /// Look up a mesh by id
    pub fn mesh(&self, id: MeshId) -> Option<&SceneMesh> {
        self.meshes.get(id.0)
    }

    /// True when nothing has been created
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
            && self.materials.is_empty()
            && self.meshes.is_empty()
            && self.objects.is_empty()
    }

    fn mesh_mut(&mut self, id: MeshId) -> Result<&mut SceneMesh> {
        self.meshes
            .get_mut(id.0)
            .ok_or_else(|| Error::scene(format!("Unknown mesh {}", id)))
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject> {
        self.objects
            .get_mut(id.0)
            .ok_or_else(|| Error::scene(format!("Unknown object {}", id)))
    }
}

impl SceneSink for MemoryScene {
    fn load_image(&mut self, name: &str, path: &Path) -> Result<ImageId> {
        let (width, height) = image::ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.into_dimensions())
            .map_err(|e| Error::scene(format!("Cannot load image '{}': {}", name, e)))?;
        self.images.push(SceneImage {
            name: name.to_string(),
            width,
            height,
        });
        Ok(ImageId(self.images.len() - 1))
    }

    fn create_material(
        &mut self,
        record: &MaterialRecord,
        image: Option<ImageId>,
    ) -> Result<MaterialId> {
        if let Some(id) = image
            && id.0 >= self.images.len()
        {
            return Err(Error::scene(format!("Unknown image {}", id)));
        }
        self.materials.push(SceneMaterial {
            record: record.clone(),
            image,
        });
        Ok(MaterialId(self.materials.len() - 1))
    }

    fn create_mesh(
        &mut self,
        name: &str,
        vertices: &[[f64; 3]],
        edges: &[[usize; 2]],
        faces: &[[usize; 3]],
    ) -> Result<MeshId> {
        self.meshes.push(SceneMesh {
            name: name.to_string(),
            vertices: vertices.to_vec(),
            edges: edges.to_vec(),
            faces: faces.to_vec(),
            ..SceneMesh::default()
        });
        Ok(MeshId(self.meshes.len() - 1))
    }

    fn add_material_slot(&mut self, mesh: MeshId, material: MaterialId) -> Result<SlotIndex> {
        if material.0 >= self.materials.len() {
            return Err(Error::scene(format!("Unknown material {}", material)));
        }
        let mesh = self.mesh_mut(mesh)?;
        mesh.material_slots.push(material);
        Ok(mesh.material_slots.len() - 1)
    }

    fn set_face_materials(&mut self, mesh: MeshId, slots: &[Option<SlotIndex>]) -> Result<()> {
        let mesh = self.mesh_mut(mesh)?;
        if slots.len() != mesh.faces.len() {
            return Err(Error::scene(format!(
                "Mesh '{}' has {} faces but {} face materials were given",
                mesh.name,
                mesh.faces.len(),
                slots.len()
            )));
        }
        if let Some(slot) = slots
            .iter()
            .flatten()
            .find(|&&slot| slot >= mesh.material_slots.len())
        {
            return Err(Error::scene(format!(
                "Mesh '{}' has no material slot {}",
                mesh.name, slot
            )));
        }
        mesh.face_materials = slots.to_vec();
        Ok(())
    }

    fn set_corner_uvs(&mut self, mesh: MeshId, layer: &str, uvs: &[CornerUvs]) -> Result<()> {
        let mesh = self.mesh_mut(mesh)?;
        if uvs.len() != mesh.faces.len() {
            return Err(Error::scene(format!(
                "Mesh '{}' has {} faces but {} UV triples were given",
                mesh.name,
                mesh.faces.len(),
                uvs.len()
            )));
        }
        match mesh.uv_layers.iter_mut().find(|l| l.name == layer) {
            Some(existing) => existing.uvs = uvs.to_vec(),
            None => mesh.uv_layers.push(UvLayer {
                name: layer.to_string(),
                uvs: uvs.to_vec(),
            }),
        }
        Ok(())
    }

    fn create_object(&mut self, name: &str, mesh: MeshId) -> Result<ObjectId> {
        if mesh.0 >= self.meshes.len() {
            return Err(Error::scene(format!("Unknown mesh {}", mesh)));
        }
        self.objects.push(SceneObject {
            name: name.to_string(),
            mesh,
            linked: false,
            selected: false,
        });
        Ok(ObjectId(self.objects.len() - 1))
    }

    fn link_object(&mut self, object: ObjectId) -> Result<()> {
        self.object_mut(object)?.linked = true;
        Ok(())
    }

    fn select_object(&mut self, object: ObjectId, active: bool) -> Result<()> {
        self.object_mut(object)?.selected = true;
        if active {
            self.active = Some(object);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::{FlatMaterial, TexturedMaterial};
    use crate::model::ResourceId;
    use std::io::Write;

    fn flat() -> MaterialRecord {
        MaterialRecord::Flat(FlatMaterial {
            name: "red".to_string(),
            base_color: [1.0, 0.0, 0.0, 1.0],
            alpha: 1.0,
            roughness: 0.5,
            metallic: 0.0,
            blend: false,
        })
    }

    fn triangle_mesh(scene: &mut MemoryScene) -> MeshId {
        scene
            .create_mesh(
                "tri",
                &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
                &[],
                &[[0, 1, 2]],
            )
            .unwrap()
    }

    #[test]
    fn test_slots_and_face_materials() {
        let mut scene = MemoryScene::new();
        let mesh = triangle_mesh(&mut scene);
        let material = scene.create_material(&flat(), None).unwrap();
        let slot = scene.add_material_slot(mesh, material).unwrap();
        assert_eq!(slot, 0);

        scene.set_face_materials(mesh, &[Some(slot)]).unwrap();
        assert_eq!(scene.mesh(mesh).unwrap().face_materials, vec![Some(0)]);

        assert!(scene.set_face_materials(mesh, &[Some(1)]).is_err());
        assert!(scene.set_face_materials(mesh, &[]).is_err());
    }

    #[test]
    fn test_unknown_ids_are_scene_errors() {
        let mut scene = MemoryScene::new();
        let err = scene.create_object("x", MeshId(3)).unwrap_err();
        assert!(matches!(err, Error::Scene(_)));
        assert!(scene.link_object(ObjectId(0)).is_err());
        assert!(scene.create_material(&flat(), Some(ImageId(0))).is_err());
        assert!(scene.is_empty());
    }

    #[test]
    fn test_link_and_select() {
        let mut scene = MemoryScene::new();
        let mesh = triangle_mesh(&mut scene);
        let object = scene.create_object("tri", mesh).unwrap();
        assert_eq!(scene.linked_objects().count(), 0);

        scene.link_object(object).unwrap();
        scene.select_object(object, true).unwrap();
        assert_eq!(scene.linked_objects().count(), 1);
        assert_eq!(scene.active_object().unwrap().name, "tri");
        assert!(scene.objects()[0].selected);
    }

    #[test]
    fn test_uv_layer_replaces_same_name() {
        let mut scene = MemoryScene::new();
        let mesh = triangle_mesh(&mut scene);
        scene
            .set_corner_uvs(mesh, "UVMap", &[[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]])
            .unwrap();
        scene
            .set_corner_uvs(mesh, "UVMap", &[[[0.5, 0.5]; 3]])
            .unwrap();
        let mesh = scene.mesh(mesh).unwrap();
        assert_eq!(mesh.uv_layers.len(), 1);
        assert_eq!(mesh.uv_layer("UVMap").unwrap().uvs[0], [[0.5, 0.5]; 3]);
    }

    #[test]
    fn test_load_image_reads_dimensions() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbaImage::new(3, 2)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(png.get_ref()).unwrap();

        let mut scene = MemoryScene::new();
        let image = scene.load_image("wood", file.path()).unwrap();
        assert_eq!(scene.images()[image.0].width, 3);
        assert_eq!(scene.images()[image.0].height, 2);

        let textured = MaterialRecord::Textured(TexturedMaterial {
            name: "3MF_Texture_5".to_string(),
            texture_id: ResourceId(4),
            uv_layer: "UVMap".to_string(),
        });
        let material = scene.create_material(&textured, Some(image)).unwrap();
        assert_eq!(scene.material(material).unwrap().image, Some(image));
    }

    #[test]
    fn test_load_image_missing_file_fails() {
        let mut scene = MemoryScene::new();
        assert!(
            scene
                .load_image("gone", Path::new("/nonexistent/texture.png"))
                .is_err()
        );
    }
}
