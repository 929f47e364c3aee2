//! Import entry points
//!
//! ```ignore
//! use threemf_import::{MemoryScene, import};
//!
//! let mut scene = MemoryScene::new();
//! let summary = import("model.3mf", &mut scene)?;
//! println!("{}", summary);
//! ```

use crate::assemble::SceneAssembler;
use crate::error::{Error, Result};
use crate::materials::{DEFAULT_METALLIC, DEFAULT_ROUGHNESS, DEFAULT_UV_LAYER};
use crate::reader::ResourceGraph;
use crate::scene::SceneSink;
use log::info;
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

/// Default name of objects created for unnamed meshes
pub const DEFAULT_OBJECT_NAME: &str = "3mf_object";

/// Default name of mesh data created for unnamed meshes
pub const DEFAULT_MESH_NAME: &str = "3MF_Mesh";

/// Settings for one import
///
/// # Example
///
/// ```
/// use threemf_import::ImportConfig;
///
/// let config = ImportConfig::new()
///     .with_uv_layer_name("Atlas")
///     .with_strict_objects(true);
/// assert_eq!(config.uv_layer_name, "Atlas");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ImportConfig {
    /// UV layer that corner UVs are written to and textures sample from
    pub uv_layer_name: String,
    /// Roughness of flat materials
    pub default_roughness: f32,
    /// Metallic factor of flat materials
    pub default_metallic: f32,
    /// Object name used when the source object has none
    pub object_name: String,
    /// Mesh data name used when the source object has none
    pub mesh_name: String,
    /// Fail on components or unknown objects instead of skipping them
    pub strict_objects: bool,
    /// Select imported objects and make the last one active
    pub select_imported: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            uv_layer_name: DEFAULT_UV_LAYER.to_string(),
            default_roughness: DEFAULT_ROUGHNESS,
            default_metallic: DEFAULT_METALLIC,
            object_name: DEFAULT_OBJECT_NAME.to_string(),
            mesh_name: DEFAULT_MESH_NAME.to_string(),
            strict_objects: false,
            select_imported: true,
        }
    }
}

impl ImportConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the UV layer name
    pub fn with_uv_layer_name(mut self, name: impl Into<String>) -> Self {
        self.uv_layer_name = name.into();
        self
    }

    /// Set the roughness of flat materials
    pub fn with_default_roughness(mut self, roughness: f32) -> Self {
        self.default_roughness = roughness;
        self
    }

    /// Set the metallic factor of flat materials
    pub fn with_default_metallic(mut self, metallic: f32) -> Self {
        self.default_metallic = metallic;
        self
    }

    /// Set the fallback object name
    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = name.into();
        self
    }

    /// Set the fallback mesh data name
    pub fn with_mesh_name(mut self, name: impl Into<String>) -> Self {
        self.mesh_name = name.into();
        self
    }

    /// Fail on object kinds other than meshes
    pub fn with_strict_objects(mut self, strict: bool) -> Self {
        self.strict_objects = strict;
        self
    }

    /// Select imported objects
    pub fn with_select_imported(mut self, select: bool) -> Self {
        self.select_imported = select;
        self
    }
}

/// Counts reported by a successful import
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ImportSummary {
    /// Objects created
    pub objects: usize,
    /// Vertices across all created meshes
    pub vertices: usize,
    /// Triangles across all created meshes
    pub triangles: usize,
    /// Distinct materials created
    pub materials: usize,
    /// Texture images loaded
    pub textures: usize,
    /// Triangles whose property record named an unknown group
    pub unresolved_triangles: usize,
    /// Objects skipped because they are not meshes
    pub skipped_objects: usize,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn count(n: usize, one: &str, many: &str) -> String {
            format!("{} {}", n, if n == 1 { one } else { many })
        }

        write!(
            f,
            "Imported {} ({}, {}, {})",
            count(self.objects, "object", "objects"),
            count(self.vertices, "vertex", "vertices"),
            count(self.triangles, "triangle", "triangles"),
            count(self.materials, "material", "materials"),
        )?;
        if self.textures > 0 {
            write!(f, ", {}", count(self.textures, "texture", "textures"))?;
        }
        if self.skipped_objects > 0 {
            write!(f, ", skipped {}", count(self.skipped_objects, "object", "objects"))?;
        }
        Ok(())
    }
}

/// Import a 3MF file with default settings
pub fn import<P, S>(path: P, sink: &mut S) -> Result<ImportSummary>
where
    P: AsRef<Path>,
    S: SceneSink + ?Sized,
{
    import_with_config(path, sink, &ImportConfig::default())
}

/// Import a 3MF file
///
/// Nothing is written to `sink` unless reading and translating every mesh
/// succeeds.
pub fn import_with_config<P, S>(
    path: P,
    sink: &mut S,
    config: &ImportConfig,
) -> Result<ImportSummary>
where
    P: AsRef<Path>,
    S: SceneSink + ?Sized,
{
    let path = path.as_ref();
    info!("Importing 3MF file {}", path.display());
    let mut graph = ResourceGraph::open(path)?;
    run(&mut graph, sink, config)
}

/// Import a 3MF package from an in-memory or otherwise seekable source
pub fn import_from_reader<R, S>(
    reader: R,
    sink: &mut S,
    config: &ImportConfig,
) -> Result<ImportSummary>
where
    R: Read + Seek,
    S: SceneSink + ?Sized,
{
    info!("Importing 3MF package from reader");
    let mut graph = ResourceGraph::from_reader(reader)?;
    run(&mut graph, sink, config)
}

fn run<R, S>(
    graph: &mut ResourceGraph<R>,
    sink: &mut S,
    config: &ImportConfig,
) -> Result<ImportSummary>
where
    R: Read + Seek,
    S: SceneSink + ?Sized,
{
    let assembler = SceneAssembler::new(config);
    let staged = assembler.stage(graph)?;
    let report = assembler.commit(&staged, sink)?;

    let summary = ImportSummary {
        objects: report.objects.len(),
        vertices: staged.vertex_count(),
        triangles: staged.triangle_count(),
        materials: report.materials,
        textures: report.images,
        unresolved_triangles: staged.unresolved_triangles(),
        skipped_objects: staged.skipped_objects,
    };
    info!("{}", summary);
    Ok(summary)
}

/// Export a scene to 3MF
///
/// Export is not implemented; this always fails and never touches `path`.
pub fn export<P: AsRef<Path>>(path: P) -> Result<()> {
    Err(Error::Unsupported(format!(
        "3MF export is not implemented (requested '{}')",
        path.as_ref().display()
    )))
}
