//! Mesh translation: one 3MF mesh resource into scene-ready arrays
//!
//! Geometry is copied as-is. Vertex positions and triangle index triples keep
//! their source order and winding, with no welding or deduplication. Material
//! and UV assignment is derived per triangle from the property record and the
//! [`MaterialTables`].

use crate::error::{Error, Result};
use crate::materials::{Lookup, MaterialRef, MaterialTables};
use crate::model::{MeshResource, ResourceId};
use log::debug;

/// Per-corner UV coordinates of one face
pub type CornerUvs = [[f32; 2]; 3];

/// Scene-ready representation of one mesh resource
#[derive(Debug, Clone)]
pub struct TranslatedMesh {
    /// Resource id of the source object
    pub object_id: ResourceId,
    /// Source object name, if any
    pub name: Option<String>,
    /// Vertex positions
    pub vertices: Vec<[f64; 3]>,
    /// Explicit edges (always empty; edges are derived from faces)
    pub edges: Vec<[usize; 2]>,
    /// Faces as vertex index triples
    pub faces: Vec<[usize; 3]>,
    /// Material of each face, `None` for unmaterialized faces
    ///
    /// Empty when the source mesh has no triangle properties.
    pub face_materials: Vec<Option<MaterialRef>>,
    /// UV of each face corner, present when at least one face is textured
    ///
    /// Faces without a textured material keep `(0, 0)` at every corner.
    pub corner_uvs: Option<Vec<CornerUvs>>,
    /// Faces whose property record named no known group
    pub unresolved_triangles: usize,
}

impl TranslatedMesh {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when no face carries a material
    pub fn is_plain(&self) -> bool {
        self.face_materials.iter().all(Option::is_none)
    }
}

/// Translate one mesh resource
///
/// Fails with a geometry error when the property sequence does not match the
/// triangle count or a triangle indexes past the vertex array. Property records
/// naming an unknown group leave their triangle unmaterialized.
pub fn translate_mesh(mesh: &MeshResource, tables: &MaterialTables) -> Result<TranslatedMesh> {
    let object_id = mesh.id;
    let triangle_count = mesh.triangles.len();
    let vertex_count = mesh.vertices.len();

    if mesh.has_properties() && mesh.properties.len() != triangle_count {
        return Err(Error::PropertyCountMismatch {
            object_id: object_id.0,
            triangle_count,
            property_count: mesh.properties.len(),
        });
    }

    let mut faces = Vec::with_capacity(triangle_count);
    for (index, triangle) in mesh.triangles.iter().enumerate() {
        let indices = triangle.indices();
        if let Some(&vertex) = indices.iter().find(|&&v| v >= vertex_count) {
            return Err(Error::VertexIndexOutOfBounds {
                object_id: object_id.0,
                triangle: index,
                vertex,
                vertex_count,
            });
        }
        faces.push(indices);
    }

    let vertices = mesh.vertices.iter().map(|v| v.position()).collect();

    let mut face_materials = Vec::new();
    let mut uvs: Vec<CornerUvs> = Vec::new();
    let mut textured = false;
    let mut unresolved_triangles = 0;

    if mesh.has_properties() {
        face_materials.reserve(triangle_count);
        uvs.reserve(triangle_count);

        for (index, properties) in mesh.properties.iter().enumerate() {
            let mut corners = [[0.0_f32; 2]; 3];
            let material = match properties.as_ref().map(|p| (p, tables.lookup(p))) {
                None => None,
                Some((_, Lookup::Color(material))) => Some(material.clone()),
                Some((p, Lookup::Texture(entry))) => {
                    textured = true;
                    for (corner, pid) in corners.iter_mut().zip(p.property_ids) {
                        if let Some(uv) = entry.uv(pid) {
                            *corner = uv;
                        }
                    }
                    Some(entry.material.clone())
                }
                Some((p, Lookup::Missing)) => {
                    debug!(
                        "Object {}: triangle {} references unknown property group {}",
                        object_id, index, p.resource_id
                    );
                    unresolved_triangles += 1;
                    None
                }
            };
            face_materials.push(material);
            uvs.push(corners);
        }
    }

    debug!(
        "Translated object {}: {} vertices, {} faces, {} unresolved",
        object_id, vertex_count, triangle_count, unresolved_triangles
    );

    Ok(TranslatedMesh {
        object_id,
        name: mesh.name.clone(),
        vertices,
        edges: Vec::new(),
        faces,
        face_materials,
        corner_uvs: textured.then_some(uvs),
        unresolved_triangles,
    })
}
