//! # threemf-import
//!
//! Import 3MF (3D Manufacturing Format) files into a scene graph.
//!
//! A 3MF file is a ZIP container following the Open Packaging Conventions
//! (OPC) with an XML model part inside. This crate reads the model's mesh
//! objects, color groups, base materials and texture groups, and translates
//! them into meshes, per-face materials and per-corner UVs written to a host
//! scene through the [`SceneSink`] trait.
//!
//! ## Pipeline
//!
//! 1. [`ResourceGraph`] opens the package and parses the root model.
//! 2. [`MaterialBuilder`] turns color groups into flat materials (sRGB to
//!    linear) and texture groups into textured materials.
//! 3. [`translate_mesh`] copies geometry and assigns a material and corner UVs
//!    to every triangle.
//! 4. [`SceneAssembler`] commits the translated meshes to the scene once every
//!    mesh translated successfully.
//!
//! ## Example
//!
//! ```no_run
//! use threemf_import::{MemoryScene, import};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut scene = MemoryScene::new();
//! let summary = import("model.3mf", &mut scene)?;
//!
//! println!("{}", summary);
//! println!("Scene contains {} objects", scene.objects().len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assemble;
pub mod error;
pub mod importer;
pub mod materials;
pub mod model;
pub mod opc;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod scene;
pub mod translate;

pub use assemble::{CommitReport, SceneAssembler, StagedImport};
pub use error::{Error, ErrorCategory, Result};
pub use importer::{
    ImportConfig, ImportSummary, export, import, import_from_reader, import_with_config,
};
pub use materials::{
    FlatMaterial, MaterialBuilder, MaterialRecord, MaterialRef, MaterialTables, TexturedMaterial,
    color_to_linear, srgb_to_linear,
};
pub use model::{
    BuildItem, ColorGroup, MeshResource, Model, ObjectResource, PropertyId, ResourceId,
    Texture2DGroup, Triangle, TriangleProperties, Vertex,
};
pub use reader::ResourceGraph;
pub use registry::{OperatorInfo, OperatorKind, OperatorOutcome, OperatorRegistry};
pub use scene::{MemoryScene, SceneSink};
pub use translate::{TranslatedMesh, translate_mesh};
