//! XML parsing for the 3MF root model part
//!
//! The parser is a single streaming pass over the model XML. It keeps the
//! elements the importer consumes (objects, meshes, components, build items,
//! color groups, base materials, textures and texture groups) and skips
//! everything else, so files using extensions the importer does not translate
//! still load.

mod core;
mod material;

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

use self::core::{
    ObjectHeader, TriangleRefs, parse_build_item, parse_component, parse_object, parse_triangle,
    parse_vertex,
};
use self::material::{
    parse_base_element, parse_basematerials_start, parse_color_element, parse_colorgroup_start,
    parse_tex2coord, parse_texture2d, parse_texture2dgroup_start,
};

/// Size of 3MF transformation matrix (4x3 affine transform in row-major order)
const TRANSFORM_MATRIX_SIZE: usize = 12;

/// Default buffer capacity for XML parsing (4KB)
const XML_BUFFER_CAPACITY: usize = 4096;

/// Valid values of the model `unit` attribute
const UNITS: [&str; 6] = [
    "micron",
    "millimeter",
    "centimeter",
    "inch",
    "foot",
    "meter",
];

/// Extract local name from potentially namespaced XML element name
///
/// - `"m:colorgroup"` returns `"colorgroup"`
/// - `"object"` returns `"object"`
pub(crate) fn get_local_name(name_str: &str) -> &str {
    match name_str.rfind(':') {
        Some(pos) => &name_str[pos + 1..],
        None => name_str,
    }
}

/// Collect the attributes of an element into a map keyed by qualified name
pub(crate) fn parse_attributes(e: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attrs = HashMap::with_capacity(8);

    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        let value =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;

        attrs.insert(key.to_string(), value.to_string());
    }

    Ok(attrs)
}

/// Parse the root model XML into a [`Model`]
pub fn parse_model_xml(xml: &str) -> Result<Model> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut parser = ModelParser::default();
    let mut buf = Vec::with_capacity(XML_BUFFER_CAPACITY);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::DocType(_)) => {
                return Err(Error::InvalidXml(
                    "DTD declarations are not allowed in 3MF files".to_string(),
                ));
            }
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                parser.start(get_local_name(name_str), e)?;
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                let local_name = get_local_name(name_str);
                parser.start(local_name, e)?;
                parser.end(local_name)?;
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;
                parser.end(get_local_name(name_str))?;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    parser.finish()
}

/// Mesh under construction, with the raw property attributes of its triangles
struct MeshBuilder {
    mesh: MeshResource,
    refs: Vec<TriangleRefs>,
}

#[derive(Default)]
struct ModelParser {
    model: Model,
    seen_model: bool,
    resources_count: usize,
    in_resources: bool,
    in_build: bool,
    current_object: Option<ObjectHeader>,
    current_mesh: Option<MeshBuilder>,
    finished_mesh: Option<MeshBuilder>,
    current_components: Option<Vec<Component>>,
    current_colorgroup: Option<ColorGroup>,
    current_basematerials: Option<BaseMaterialGroup>,
    current_texture2dgroup: Option<Texture2DGroup>,
}

impl ModelParser {
    fn start(&mut self, local_name: &str, e: &BytesStart<'_>) -> Result<()> {
        match local_name {
            "model" if !self.seen_model => {
                self.seen_model = true;
                let attrs = parse_attributes(e)?;
                if let Some(unit) = attrs.get("unit") {
                    if !UNITS.contains(&unit.as_str()) {
                        return Err(Error::InvalidXml(format!(
                            "Invalid unit '{}'. Must be one of: {}",
                            unit,
                            UNITS.join(", ")
                        )));
                    }
                    self.model.unit = unit.clone();
                }
            }
            "resources" if self.seen_model => {
                self.resources_count += 1;
                if self.resources_count > 1 {
                    return Err(Error::InvalidXml(
                        "Model must contain exactly one <resources> element".to_string(),
                    ));
                }
                self.in_resources = true;
            }
            "build" if self.seen_model => {
                self.in_build = true;
            }
            "item" if self.in_build => {
                self.model.build.push(parse_build_item(e)?);
            }
            "object" if self.in_resources => {
                self.current_object = Some(parse_object(e)?);
                self.finished_mesh = None;
                self.current_components = None;
            }
            "mesh" if self.current_object.is_some() => {
                if let Some(ref object) = self.current_object {
                    let mut mesh = MeshResource::new(object.id);
                    mesh.name = object.name.clone();
                    self.current_mesh = Some(MeshBuilder {
                        mesh,
                        refs: Vec::new(),
                    });
                }
            }
            "vertex" if self.current_mesh.is_some() => {
                if let Some(ref mut builder) = self.current_mesh {
                    builder.mesh.vertices.push(parse_vertex(e)?);
                }
            }
            "triangle" if self.current_mesh.is_some() => {
                if let Some(ref mut builder) = self.current_mesh {
                    let (triangle, refs) = parse_triangle(e)?;
                    builder.mesh.triangles.push(triangle);
                    builder.refs.push(refs);
                }
            }
            "components" if self.current_object.is_some() => {
                self.current_components = Some(Vec::new());
            }
            "component" if self.current_components.is_some() => {
                let component = parse_component(e)?;
                if let Some(ref mut components) = self.current_components {
                    components.push(component);
                }
            }
            "colorgroup" if self.in_resources => {
                self.current_colorgroup = Some(parse_colorgroup_start(e)?);
            }
            "color" if self.current_colorgroup.is_some() => {
                if let Some(ref mut group) = self.current_colorgroup {
                    let color = parse_color_element(e, group.id)?;
                    group.colors.push(color);
                }
            }
            "basematerials" if self.in_resources => {
                self.current_basematerials = Some(parse_basematerials_start(e)?);
            }
            "base" if self.current_basematerials.is_some() => {
                let base = parse_base_element(e)?;
                if let Some(ref mut group) = self.current_basematerials {
                    group.materials.push(base);
                }
            }
            "texture2d" if self.in_resources => {
                self.model
                    .resources
                    .texture2d_resources
                    .push(parse_texture2d(e)?);
            }
            "texture2dgroup" if self.in_resources => {
                self.current_texture2dgroup = Some(parse_texture2dgroup_start(e)?);
            }
            "tex2coord" if self.current_texture2dgroup.is_some() => {
                let coord = parse_tex2coord(e)?;
                if let Some(ref mut group) = self.current_texture2dgroup {
                    group.tex2coords.push(coord);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn end(&mut self, local_name: &str) -> Result<()> {
        match local_name {
            "resources" => self.in_resources = false,
            "build" => self.in_build = false,
            "mesh" => {
                if let Some(builder) = self.current_mesh.take() {
                    self.finished_mesh = Some(builder);
                }
            }
            "object" => {
                if let Some(object) = self.current_object.take() {
                    let resource = self.finish_object(object);
                    self.model.resources.objects.push(resource);
                }
            }
            "colorgroup" => {
                if let Some(group) = self.current_colorgroup.take() {
                    self.model.resources.color_groups.push(group);
                }
            }
            "basematerials" => {
                if let Some(group) = self.current_basematerials.take() {
                    self.model.resources.base_material_groups.push(group);
                }
            }
            "texture2dgroup" => {
                if let Some(group) = self.current_texture2dgroup.take() {
                    self.model.resources.texture2d_groups.push(group);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Turn the parsed children of an object into its resource kind
    fn finish_object(&mut self, object: ObjectHeader) -> ObjectResource {
        if let Some(builder) = self.finished_mesh.take().or_else(|| self.current_mesh.take()) {
            let MeshBuilder { mut mesh, refs } = builder;
            let properties: Vec<Option<TriangleProperties>> =
                refs.iter().map(|r| r.resolve(&object)).collect();
            if properties.iter().any(Option::is_some) {
                mesh.properties = properties;
            }
            return ObjectResource::Mesh(mesh);
        }

        if let Some(components) = self.current_components.take() {
            return ObjectResource::Components(ComponentsResource {
                id: object.id,
                name: object.name,
                components,
            });
        }

        ObjectResource::Unknown {
            id: object.id,
            name: object.name,
        }
    }

    fn finish(self) -> Result<Model> {
        if !self.seen_model {
            return Err(Error::InvalidXml(
                "Root element must be <model>".to_string(),
            ));
        }
        if self.resources_count == 0 {
            return Err(Error::InvalidXml(
                "Model must contain a <resources> element".to_string(),
            ));
        }
        Ok(self.model)
    }
}
