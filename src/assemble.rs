//! Scene assembly: translate everything, then commit everything
//!
//! [`SceneAssembler::stage`] reads the resource graph, builds the material
//! tables and translates every mesh without touching the scene. Only a fully
//! staged import reaches [`SceneAssembler::commit`], so a read or geometry error
//! leaves the scene unchanged.

use crate::error::{Error, Result};
use crate::importer::ImportConfig;
use crate::materials::{
    DecodedImage, MaterialBuilder, MaterialRecord, MaterialRef, MaterialTables, decode_images,
};
use crate::model::{ObjectResource, ResourceId};
use crate::reader::ResourceGraph;
use crate::scene::{ImageId, MaterialId, ObjectId, SceneSink, SlotIndex};
use crate::translate::{TranslatedMesh, translate_mesh};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{Read, Seek, Write};
use std::sync::Arc;

/// Everything an import will write, computed before the first scene call
#[derive(Debug, Clone, Default)]
pub struct StagedImport {
    /// Translated meshes in document order
    pub meshes: Vec<TranslatedMesh>,
    /// Decoded texture images keyed by Texture2D resource id
    pub images: HashMap<ResourceId, DecodedImage>,
    /// The lookup tables the meshes were translated against
    pub tables: MaterialTables,
    /// Objects that were not translated (components or unknown kinds)
    pub skipped_objects: usize,
}

impl StagedImport {
    /// Total vertices across all meshes
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(TranslatedMesh::vertex_count).sum()
    }

    /// Total triangles across all meshes
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(TranslatedMesh::face_count).sum()
    }

    /// Total triangles left without material because of unknown groups
    pub fn unresolved_triangles(&self) -> usize {
        self.meshes.iter().map(|m| m.unresolved_triangles).sum()
    }
}

/// What a commit created in the scene
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommitReport {
    /// Created objects, in mesh order
    pub objects: Vec<ObjectId>,
    /// Number of distinct materials created
    pub materials: usize,
    /// Number of images loaded
    pub images: usize,
}

/// Stages and commits imports according to an [`ImportConfig`]
#[derive(Debug, Clone)]
pub struct SceneAssembler<'a> {
    config: &'a ImportConfig,
}

impl<'a> SceneAssembler<'a> {
    /// Create an assembler for one configuration
    pub fn new(config: &'a ImportConfig) -> Self {
        Self { config }
    }

    /// Read, build materials and translate every mesh object
    ///
    /// A Texture2D whose part is absent from the package is skipped like an
    /// undecodable one; other package errors abort. Performs no scene writes.
    pub fn stage<R: Read + Seek>(&self, graph: &mut ResourceGraph<R>) -> Result<StagedImport> {
        let mut attachments = Vec::new();
        for attachment in graph.texture2d_attachments() {
            match attachment {
                Ok(attachment) => attachments.push(attachment),
                Err(Error::MissingFile(message)) => warn!("Skipping texture: {}", message),
                Err(e) => return Err(e),
            }
        }
        let images = decode_images(attachments);

        let builder = MaterialBuilder::from_config(self.config);
        let mut colors = builder.build_color_materials(graph.color_groups());
        builder.add_base_materials(&mut colors, graph.base_material_groups());
        let textures = builder.build_texture_materials(graph.texture_groups(), &images);
        let tables = MaterialTables::new(colors, textures);

        let mut meshes = Vec::new();
        let mut skipped_objects = 0;
        for object in graph.objects() {
            match object {
                ObjectResource::Mesh(mesh) => meshes.push(translate_mesh(mesh, &tables)?),
                ObjectResource::Components(_) | ObjectResource::Unknown { .. } => {
                    if self.config.strict_objects {
                        return Err(Error::UnsupportedObject {
                            id: object.id().0,
                            kind: object.kind().to_string(),
                        });
                    }
                    warn!("Skipping object {}: {}", object.id(), object.kind());
                    skipped_objects += 1;
                }
            }
        }

        Ok(StagedImport {
            meshes,
            images,
            tables,
            skipped_objects,
        })
    }

    /// Write a staged import into the scene
    ///
    /// Images are loaded first, then one material per distinct record, then
    /// meshes with their slots, face materials and UVs, and finally objects,
    /// which are linked and selected.
    pub fn commit<S: SceneSink + ?Sized>(
        &self,
        staged: &StagedImport,
        sink: &mut S,
    ) -> Result<CommitReport> {
        let used = distinct_materials(&staged.meshes);

        let mut image_ids: HashMap<ResourceId, ImageId> = HashMap::new();
        for texture_id in used.iter().filter_map(|m| m.texture_id()) {
            if image_ids.contains_key(&texture_id) {
                continue;
            }
            match staged.images.get(&texture_id) {
                Some(image) => {
                    image_ids.insert(texture_id, load_image(sink, image)?);
                }
                None => warn!("Texture {} has no decoded image", texture_id),
            }
        }

        let mut material_ids: HashMap<*const MaterialRecord, MaterialId> = HashMap::new();
        for material in &used {
            let image = material
                .texture_id()
                .and_then(|id| image_ids.get(&id).copied());
            let id = sink.create_material(material, image)?;
            material_ids.insert(Arc::as_ptr(material), id);
        }

        let mut objects = Vec::with_capacity(staged.meshes.len());
        for mesh in &staged.meshes {
            let name = mesh.name.as_deref();
            let mesh_id = sink.create_mesh(
                name.unwrap_or(&self.config.mesh_name),
                &mesh.vertices,
                &mesh.edges,
                &mesh.faces,
            )?;

            if !mesh.face_materials.is_empty() {
                let mut slots: HashMap<*const MaterialRecord, SlotIndex> = HashMap::new();
                let mut face_slots = Vec::with_capacity(mesh.face_materials.len());
                for material in &mesh.face_materials {
                    let slot = match material {
                        Some(material) => {
                            let key = Arc::as_ptr(material);
                            let slot = match slots.get(&key) {
                                Some(&slot) => slot,
                                None => {
                                    let material_id =
                                        material_ids.get(&key).copied().ok_or_else(|| {
                                            Error::scene(format!(
                                                "Material '{}' was not created",
                                                material.name()
                                            ))
                                        })?;
                                    let slot = sink.add_material_slot(mesh_id, material_id)?;
                                    slots.insert(key, slot);
                                    slot
                                }
                            };
                            Some(slot)
                        }
                        None => None,
                    };
                    face_slots.push(slot);
                }
                sink.set_face_materials(mesh_id, &face_slots)?;
            }

            if let Some(ref uvs) = mesh.corner_uvs {
                sink.set_corner_uvs(mesh_id, &self.config.uv_layer_name, uvs)?;
            }

            let object = sink.create_object(name.unwrap_or(&self.config.object_name), mesh_id)?;
            debug!("Created object {} for resource {}", object, mesh.object_id);
            objects.push(object);
        }

        for &object in &objects {
            sink.link_object(object)?;
        }

        if self.config.select_imported {
            let last = objects.len().saturating_sub(1);
            for (index, &object) in objects.iter().enumerate() {
                sink.select_object(object, index == last)?;
            }
        }

        Ok(CommitReport {
            objects,
            materials: material_ids.len(),
            images: image_ids.len(),
        })
    }
}

/// Materials referenced by any face, deduplicated by identity, in first-use order
fn distinct_materials(meshes: &[TranslatedMesh]) -> Vec<MaterialRef> {
    let mut seen = std::collections::HashSet::new();
    meshes
        .iter()
        .flat_map(|mesh| mesh.face_materials.iter().flatten())
        .filter(|material| seen.insert(Arc::as_ptr(*material)))
        .cloned()
        .collect()
}

/// Hand one image to the scene through a temporary file
///
/// The file is removed when this returns, whether loading succeeded or not.
fn load_image<S: SceneSink + ?Sized>(sink: &mut S, image: &DecodedImage) -> Result<ImageId> {
    let mut file = tempfile::Builder::new()
        .prefix("3mf_texture_")
        .suffix(&format!(".{}", image.extension()))
        .tempfile()?;
    file.write_all(&image.data)?;
    file.flush()?;

    let name = format!("3MF_Image_{}", image.texture_id);
    sink.load_image(&name, file.path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::FlatMaterial;
    use crate::scene::{MemoryScene, MeshId};
    use crate::translate::CornerUvs;
    use std::path::{Path, PathBuf};

    fn flat(name: &str) -> MaterialRef {
        Arc::new(MaterialRecord::Flat(FlatMaterial {
            name: name.to_string(),
            base_color: [1.0, 1.0, 1.0, 1.0],
            alpha: 1.0,
            roughness: 0.5,
            metallic: 0.0,
            blend: false,
        }))
    }

    fn mesh(id: usize, face_materials: Vec<Option<MaterialRef>>) -> TranslatedMesh {
        let faces = vec![[0, 1, 2]; face_materials.len().max(1)];
        TranslatedMesh {
            object_id: ResourceId(id),
            name: None,
            vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            edges: Vec::new(),
            faces,
            face_materials,
            corner_uvs: None,
            unresolved_triangles: 0,
        }
    }

    #[test]
    fn test_materials_are_shared_by_identity() {
        let red = flat("red");
        let same_value = flat("red");
        let staged = StagedImport {
            meshes: vec![
                mesh(1, vec![Some(red.clone()), Some(same_value.clone()), None]),
                mesh(2, vec![Some(red.clone())]),
            ],
            ..StagedImport::default()
        };

        let config = ImportConfig::default();
        let mut scene = MemoryScene::new();
        let report = SceneAssembler::new(&config)
            .commit(&staged, &mut scene)
            .unwrap();

        assert_eq!(report.materials, 2);
        assert_eq!(scene.materials().len(), 2);

        let first = scene.mesh(MeshId(0)).unwrap();
        assert_eq!(first.material_slots.len(), 2);
        assert_eq!(first.face_materials, vec![Some(0), Some(1), None]);
        assert_eq!(first.name, "3MF_Mesh");

        let second = scene.mesh(MeshId(1)).unwrap();
        assert_eq!(second.material_slots, vec![first.material_slots[0]]);
    }

    #[test]
    fn test_objects_are_linked_and_last_is_active() {
        let staged = StagedImport {
            meshes: vec![mesh(1, Vec::new()), mesh(2, Vec::new())],
            ..StagedImport::default()
        };
        let config = ImportConfig::default();
        let mut scene = MemoryScene::new();
        let report = SceneAssembler::new(&config)
            .commit(&staged, &mut scene)
            .unwrap();

        assert_eq!(report.objects.len(), 2);
        assert_eq!(scene.linked_objects().count(), 2);
        assert!(scene.objects().iter().all(|o| o.selected));
        assert_eq!(scene.active_object().unwrap().mesh, MeshId(1));
        assert_eq!(scene.objects()[0].name, "3mf_object");
        assert!(scene.meshes()[0].face_materials.is_empty());
    }

    #[test]
    fn test_selection_can_be_disabled() {
        let staged = StagedImport {
            meshes: vec![mesh(1, Vec::new())],
            ..StagedImport::default()
        };
        let config = ImportConfig::default().with_select_imported(false);
        let mut scene = MemoryScene::new();
        SceneAssembler::new(&config)
            .commit(&staged, &mut scene)
            .unwrap();
        assert!(scene.active_object().is_none());
        assert!(!scene.objects()[0].selected);
    }

    /// Records the image paths it is given and whether they existed
    #[derive(Default)]
    struct PathRecorder {
        inner: MemoryScene,
        seen: Vec<(PathBuf, bool)>,
    }

    impl SceneSink for PathRecorder {
        fn load_image(&mut self, name: &str, path: &Path) -> Result<ImageId> {
            self.seen.push((path.to_path_buf(), path.exists()));
            self.inner.load_image(name, path)
        }
        fn create_material(
            &mut self,
            record: &MaterialRecord,
            image: Option<ImageId>,
        ) -> Result<MaterialId> {
            self.inner.create_material(record, image)
        }
        fn create_mesh(
            &mut self,
            name: &str,
            vertices: &[[f64; 3]],
            edges: &[[usize; 2]],
            faces: &[[usize; 3]],
        ) -> Result<MeshId> {
            self.inner.create_mesh(name, vertices, edges, faces)
        }
        fn add_material_slot(&mut self, mesh: MeshId, material: MaterialId) -> Result<SlotIndex> {
            self.inner.add_material_slot(mesh, material)
        }
        fn set_face_materials(&mut self, mesh: MeshId, slots: &[Option<SlotIndex>]) -> Result<()> {
            self.inner.set_face_materials(mesh, slots)
        }
        fn set_corner_uvs(&mut self, mesh: MeshId, layer: &str, uvs: &[CornerUvs]) -> Result<()> {
            self.inner.set_corner_uvs(mesh, layer, uvs)
        }
        fn create_object(&mut self, name: &str, mesh: MeshId) -> Result<ObjectId> {
            self.inner.create_object(name, mesh)
        }
        fn link_object(&mut self, object: ObjectId) -> Result<()> {
            self.inner.link_object(object)
        }
        fn select_object(&mut self, object: ObjectId, active: bool) -> Result<()> {
            self.inner.select_object(object, active)
        }
    }

    #[test]
    fn test_texture_temp_files_are_removed() {
        let mut png = std::io::Cursor::new(Vec::new());
        image::RgbaImage::new(2, 2)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let textured = Arc::new(MaterialRecord::Textured(crate::materials::TexturedMaterial {
            name: "3MF_Texture_5".to_string(),
            texture_id: ResourceId(4),
            uv_layer: "UVMap".to_string(),
        }));
        let mut translated = mesh(1, vec![Some(textured)]);
        translated.corner_uvs = Some(vec![[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]]);

        let mut images = HashMap::new();
        images.insert(
            ResourceId(4),
            DecodedImage {
                texture_id: ResourceId(4),
                content_type: "image/png".to_string(),
                data: png.into_inner(),
            },
        );
        let staged = StagedImport {
            meshes: vec![translated],
            images,
            ..StagedImport::default()
        };

        let config = ImportConfig::default();
        let mut sink = PathRecorder::default();
        let report = SceneAssembler::new(&config)
            .commit(&staged, &mut sink)
            .unwrap();

        assert_eq!(report.images, 1);
        assert_eq!(sink.seen.len(), 1);
        let (path, existed) = &sink.seen[0];
        assert!(*existed);
        assert!(!path.exists());
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

        let material = &sink.inner.materials()[0];
        assert_eq!(material.image, Some(ImageId(0)));
        assert!(sink.inner.meshes()[0].uv_layer("UVMap").is_some());
    }
}
