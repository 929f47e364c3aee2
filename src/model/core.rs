//! Core resource graph types: identifiers, geometry and object kinds

use std::fmt;

/// Identifier of a 3MF resource (object, color group, texture, texture group)
///
/// Unique within a model and stable for the lifetime of a read session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub usize);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of an entry inside one property group
///
/// Only meaningful together with the [`ResourceId`] of the group it indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub usize);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A 3D vertex with x, y, z coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl Vertex {
    /// Create a new vertex
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Position as an array
    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// A triangle defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    /// Index of first vertex
    pub v1: usize,
    /// Index of second vertex
    pub v2: usize,
    /// Index of third vertex
    pub v3: usize,
}

impl Triangle {
    /// Create a new triangle
    pub fn new(v1: usize, v2: usize, v3: usize) -> Self {
        Self { v1, v2, v3 }
    }

    /// Vertex indices in source winding order
    pub fn indices(&self) -> [usize; 3] {
        [self.v1, self.v2, self.v3]
    }
}

/// Property assignment of one triangle: the group and one entry per corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriangleProperties {
    /// Property group (color group, base material group or texture group)
    pub resource_id: ResourceId,
    /// Per-corner entries inside `resource_id`
    pub property_ids: [PropertyId; 3],
}

impl TriangleProperties {
    /// Create a property record
    pub fn new(resource_id: ResourceId, property_ids: [PropertyId; 3]) -> Self {
        Self {
            resource_id,
            property_ids,
        }
    }

    /// Same entry for all three corners
    pub fn uniform(resource_id: ResourceId, property_id: PropertyId) -> Self {
        Self::new(resource_id, [property_id; 3])
    }
}

/// A mesh object resource
///
/// `properties` is either empty (plain geometry) or parallel to `triangles`,
/// with `None` for triangles that carry no property.
#[derive(Debug, Clone, Default)]
pub struct MeshResource {
    /// Object id
    pub id: ResourceId,
    /// Object name (optional)
    pub name: Option<String>,
    /// List of vertices
    pub vertices: Vec<Vertex>,
    /// List of triangles
    pub triangles: Vec<Triangle>,
    /// Per-triangle property records
    pub properties: Vec<Option<TriangleProperties>>,
}

impl MeshResource {
    /// Create an empty mesh resource
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// True when at least one triangle carries a property record
    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }
}

/// Reference to another object from a components object
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// Referenced object
    pub object_id: ResourceId,
    /// Optional 3x4 affine transform, row-major
    pub transform: Option<[f64; 12]>,
}

/// An object assembled from other objects
#[derive(Debug, Clone)]
pub struct ComponentsResource {
    /// Object id
    pub id: ResourceId,
    /// Object name (optional)
    pub name: Option<String>,
    /// Referenced objects
    pub components: Vec<Component>,
}

/// The object kinds a 3MF resource section can hold
#[derive(Debug, Clone)]
pub enum ObjectResource {
    /// Object with a triangle mesh
    Mesh(MeshResource),
    /// Object built from components
    Components(ComponentsResource),
    /// Object with neither a mesh nor components (extension-only shapes)
    Unknown {
        /// Object id
        id: ResourceId,
        /// Object name (optional)
        name: Option<String>,
    },
}

impl ObjectResource {
    /// Resource id of the object
    pub fn id(&self) -> ResourceId {
        match self {
            ObjectResource::Mesh(mesh) => mesh.id,
            ObjectResource::Components(components) => components.id,
            ObjectResource::Unknown { id, .. } => *id,
        }
    }

    /// Human-readable kind, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ObjectResource::Mesh(_) => "mesh object",
            ObjectResource::Components(_) => "components object",
            ObjectResource::Unknown { .. } => "object without mesh or components",
        }
    }

    /// The mesh, when this is a mesh object
    pub fn as_mesh(&self) -> Option<&MeshResource> {
        match self {
            ObjectResource::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

/// Placement of an object in the build
#[derive(Debug, Clone, PartialEq)]
pub struct BuildItem {
    /// Referenced object
    pub object_id: ResourceId,
    /// Optional 3x4 affine transform, row-major
    pub transform: Option<[f64; 12]>,
}

/// Resources section of a model
#[derive(Debug, Clone, Default)]
pub struct Resources {
    /// Objects in document order
    pub objects: Vec<ObjectResource>,
    /// Color groups (materials extension)
    pub color_groups: Vec<super::ColorGroup>,
    /// Base material groups
    pub base_material_groups: Vec<super::BaseMaterialGroup>,
    /// Texture2D resources (materials extension)
    pub texture2d_resources: Vec<super::Texture2D>,
    /// Texture2D groups (materials extension)
    pub texture2d_groups: Vec<super::Texture2DGroup>,
}

/// The parsed root model part
#[derive(Debug, Clone)]
pub struct Model {
    /// Unit of measurement (default: millimeter)
    pub unit: String,
    /// Resources
    pub resources: Resources,
    /// Build items
    pub build: Vec<BuildItem>,
}

impl Model {
    /// Create an empty model
    pub fn new() -> Self {
        Self {
            unit: "millimeter".to_string(),
            resources: Resources::default(),
            build: Vec::new(),
        }
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
