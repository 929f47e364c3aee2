//! Read-only access to the resource graph of a 3MF package
//!
//! [`ResourceGraph`] owns the open package and the parsed root model for the
//! duration of one import. All accessors are forward iterators over borrowed
//! data; texture attachments are read from the package lazily.

use crate::error::{Error, Result};
use crate::model::*;
use crate::opc::Package;
use crate::parser::parse_model_xml;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// A parsed 3MF resource graph backed by its package
pub struct ResourceGraph<R: Read> {
    package: Package<R>,
    model: Model,
}

impl ResourceGraph<BufReader<File>> {
    /// Open a 3MF file from disk
    ///
    /// Fails with a read error when the file is missing, is not a 3MF package,
    /// or its root model part is malformed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> ResourceGraph<R> {
    /// Open a 3MF package from any seekable reader
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut package = Package::open(reader)?;
        let xml = package.get_model()?;
        let model = parse_model_xml(&xml)?;
        Ok(Self { package, model })
    }

    /// The parsed root model
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// All objects in document order, whatever their kind
    pub fn objects(&self) -> impl Iterator<Item = &ObjectResource> + '_ {
        self.model.resources.objects.iter()
    }

    /// Objects that carry a triangle mesh
    pub fn mesh_objects(&self) -> impl Iterator<Item = &MeshResource> + '_ {
        self.objects().filter_map(ObjectResource::as_mesh)
    }

    /// Color groups in document order
    pub fn color_groups(&self) -> impl Iterator<Item = &ColorGroup> + '_ {
        self.model.resources.color_groups.iter()
    }

    /// Base material groups in document order
    pub fn base_material_groups(&self) -> impl Iterator<Item = &BaseMaterialGroup> + '_ {
        self.model.resources.base_material_groups.iter()
    }

    /// Texture coordinate groups in document order
    pub fn texture_groups(&self) -> impl Iterator<Item = &Texture2DGroup> + '_ {
        self.model.resources.texture2d_groups.iter()
    }

    /// Build items in document order
    pub fn build_items(&self) -> impl Iterator<Item = &BuildItem> + '_ {
        self.model.build.iter()
    }

    /// Image bytes of every Texture2D resource, read on demand
    pub fn texture2d_attachments(&mut self) -> Attachments<'_, R> {
        Attachments {
            package: &mut self.package,
            textures: self.model.resources.texture2d_resources.iter(),
        }
    }
}

/// Lazy iterator over texture attachments
///
/// Each step reads one part from the package. A Texture2D resource whose part
/// is absent yields [`Error::MissingFile`].
pub struct Attachments<'a, R: Read> {
    package: &'a mut Package<R>,
    textures: std::slice::Iter<'a, Texture2D>,
}

impl<R: Read + Seek> Iterator for Attachments<'_, R> {
    type Item = Result<TextureAttachment>;

    fn next(&mut self) -> Option<Self::Item> {
        let texture = self.textures.next()?;
        let attachment = self
            .package
            .get_file_binary(&texture.path)
            .map_err(|e| match e {
                Error::MissingFile(_) => Error::MissingFile(format!(
                    "Texture {} references missing part '{}'",
                    texture.id, texture.path
                )),
                other => other,
            })
            .map(|data| TextureAttachment {
                texture_id: texture.id,
                path: texture.path.clone(),
                content_type: texture.contenttype.clone(),
                data,
            });
        Some(attachment)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.textures.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::{CONTENT_TYPES_PATH, RELS_PATH};
    use std::io::{Cursor, Write};
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
  <Default Extension="png" ContentType="image/png"/>
</Types>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

    const MODEL: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02" xmlns:m="http://schemas.microsoft.com/3dmanufacturing/material/2015/02">
  <resources>
    <m:texture2d id="10" path="/3D/Texture/a.png" contenttype="image/png"/>
    <m:texture2d id="11" path="/3D/Texture/missing.png" contenttype="image/png"/>
    <m:texture2dgroup id="12" texid="10"><m:tex2coord u="0" v="1"/></m:texture2dgroup>
    <m:colorgroup id="2"><m:color color="#808080"/></m:colorgroup>
    <object id="1"><mesh><vertices><vertex x="0" y="0" z="0"/></vertices><triangles/></mesh></object>
    <object id="3"/>
  </resources>
  <build><item objectid="1"/></build>
</model>"##;

    fn graph() -> ResourceGraph<Cursor<Vec<u8>>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, data) in [
            (CONTENT_TYPES_PATH, CONTENT_TYPES.as_bytes()),
            (RELS_PATH, RELS.as_bytes()),
            ("3D/3dmodel.model", MODEL.as_bytes()),
            ("3D/Texture/a.png", &b"png-bytes"[..]),
        ] {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        ResourceGraph::from_reader(zip.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_iterators_expose_resources() {
        let graph = graph();
        assert_eq!(graph.objects().count(), 2);
        assert_eq!(graph.mesh_objects().count(), 1);
        assert_eq!(graph.color_groups().next().unwrap().id, ResourceId(2));
        assert_eq!(graph.texture_groups().next().unwrap().texid, ResourceId(10));
        assert_eq!(graph.build_items().count(), 1);
        assert_eq!(graph.base_material_groups().count(), 0);
    }

    #[test]
    fn test_attachments_are_lazy_and_report_missing_parts() {
        let mut graph = graph();
        let mut attachments = graph.texture2d_attachments();
        assert_eq!(attachments.size_hint(), (2, Some(2)));

        let first = attachments.next().unwrap().unwrap();
        assert_eq!(first.texture_id, ResourceId(10));
        assert_eq!(first.data, b"png-bytes");
        assert_eq!(first.content_type, "image/png");

        let second = attachments.next().unwrap();
        assert!(matches!(second, Err(Error::MissingFile(_))));
        assert!(attachments.next().is_none());
    }

    #[test]
    fn test_open_missing_file_is_read_error() {
        let err = ResourceGraph::open("/nonexistent/model.3mf")
            .err()
            .unwrap();
        assert!(err.is_read_error());
    }
}
