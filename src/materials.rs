//! Material construction from 3MF property groups
//!
//! Color groups and base materials become flat-color materials keyed by
//! `(ResourceId, PropertyId)`. Texture coordinate groups become image-textured
//! materials keyed by `ResourceId`. Both tables are built once, before any mesh is
//! translated, and are only read afterwards.
//!
//! Records are shared through [`MaterialRef`] (`Arc`), so the identity of a
//! material is the identity of its allocation: two keys that resolve to the same
//! record share one scene material, while two records with equal values do not.

use crate::importer::ImportConfig;
use crate::model::*;
use image::ImageReader;
use log::{debug, warn};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

/// Default roughness of generated materials
pub const DEFAULT_ROUGHNESS: f32 = 0.5;

/// Default metallic factor of generated materials
pub const DEFAULT_METALLIC: f32 = 0.0;

/// Default name of the UV layer textured materials sample from
pub const DEFAULT_UV_LAYER: &str = "UVMap";

/// Convert one normalized sRGB channel to linear light
///
/// Values are expected in `[0, 1]`; out-of-range input is not clamped.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Convert an sRGB byte color to linear RGB plus linear alpha
///
/// The alpha channel is only normalized, never gamma-decoded.
pub fn color_to_linear(color: Rgba) -> [f32; 4] {
    let (r, g, b, a) = color;
    [
        srgb_to_linear(f32::from(r) / 255.0),
        srgb_to_linear(f32::from(g) / 255.0),
        srgb_to_linear(f32::from(b) / 255.0),
        f32::from(a) / 255.0,
    ]
}

/// A principled material with a constant base color
#[derive(Debug, Clone, PartialEq)]
pub struct FlatMaterial {
    /// Material name
    pub name: String,
    /// Linear base color; the fourth component is always 1.0
    pub base_color: [f32; 4],
    /// Linear alpha
    pub alpha: f32,
    /// Roughness
    pub roughness: f32,
    /// Metallic factor
    pub metallic: f32,
    /// Alpha blending is required (alpha below 1.0)
    pub blend: bool,
}

/// A material whose base color samples an image through a UV layer
#[derive(Debug, Clone, PartialEq)]
pub struct TexturedMaterial {
    /// Material name
    pub name: String,
    /// Texture2D resource providing the image
    pub texture_id: ResourceId,
    /// UV layer the image is sampled through
    pub uv_layer: String,
}

/// A material derived from 3MF property data
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialRecord {
    /// Constant color
    Flat(FlatMaterial),
    /// Image texture
    Textured(TexturedMaterial),
}

impl MaterialRecord {
    /// Material name
    pub fn name(&self) -> &str {
        match self {
            MaterialRecord::Flat(m) => &m.name,
            MaterialRecord::Textured(m) => &m.name,
        }
    }

    /// Texture2D resource sampled by this material, if any
    pub fn texture_id(&self) -> Option<ResourceId> {
        match self {
            MaterialRecord::Flat(_) => None,
            MaterialRecord::Textured(m) => Some(m.texture_id),
        }
    }
}

/// Shared handle to a material record
pub type MaterialRef = Arc<MaterialRecord>;

/// A texture attachment with a recognised image format
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Texture2D resource the image belongs to
    pub texture_id: ResourceId,
    /// Declared content type
    pub content_type: String,
    /// Encoded image data, handed to the scene unchanged
    pub data: Vec<u8>,
}

impl DecodedImage {
    /// File extension matching the content type
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            _ => "png",
        }
    }
}

/// Check texture attachments, keyed by Texture2D resource id
///
/// Only the image header is read. Attachments whose format or dimensions the
/// `image` crate cannot recognise are logged and left out.
pub fn decode_images<I>(attachments: I) -> HashMap<ResourceId, DecodedImage>
where
    I: IntoIterator<Item = TextureAttachment>,
{
    let mut images = HashMap::new();
    for attachment in attachments {
        let dimensions = ImageReader::new(Cursor::new(attachment.data.as_slice()))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)
            .and_then(|reader| reader.into_dimensions());
        match dimensions {
            Ok((width, height)) => {
                debug!(
                    "Decoded texture {} ({}x{}, {})",
                    attachment.texture_id, width, height, attachment.content_type
                );
                images.insert(
                    attachment.texture_id,
                    DecodedImage {
                        texture_id: attachment.texture_id,
                        content_type: attachment.content_type,
                        data: attachment.data,
                    },
                );
            }
            Err(e) => warn!(
                "Skipping texture {} ('{}'): {}",
                attachment.texture_id, attachment.path, e
            ),
        }
    }
    images
}

/// Flat materials keyed by `(group, entry)`
pub type ColorTable = HashMap<(ResourceId, PropertyId), MaterialRef>;

/// Textured material of one texture coordinate group with its UV table
#[derive(Debug, Clone)]
pub struct TextureEntry {
    /// Shared textured material
    pub material: MaterialRef,
    /// UV coordinates indexed by property id
    pub coords: Vec<Tex2Coord>,
}

impl TextureEntry {
    /// UV of one property id, `None` when the group has no such entry
    pub fn uv(&self, property_id: PropertyId) -> Option<[f32; 2]> {
        self.coords.get(property_id.0).map(|c| [c.u, c.v])
    }
}

/// Textured materials keyed by texture group
pub type TextureTable = HashMap<ResourceId, TextureEntry>;

/// Result of resolving one triangle property record
#[derive(Debug)]
pub enum Lookup<'a> {
    /// Flat material from the color table
    Color(&'a MaterialRef),
    /// Textured material with its UV table
    Texture(&'a TextureEntry),
    /// The record names no known group
    Missing,
}

/// The two read-only lookup tables consumed by mesh translation
#[derive(Debug, Clone, Default)]
pub struct MaterialTables {
    /// Flat materials
    pub colors: ColorTable,
    /// Textured materials
    pub textures: TextureTable,
}

impl MaterialTables {
    /// Create tables from their parts
    pub fn new(colors: ColorTable, textures: TextureTable) -> Self {
        Self { colors, textures }
    }

    /// Resolve a triangle property record
    ///
    /// The color table is consulted with the first corner's property id before
    /// the texture table is consulted with the group id.
    pub fn lookup(&self, properties: &TriangleProperties) -> Lookup<'_> {
        let group = properties.resource_id;
        if let Some(material) = self.colors.get(&(group, properties.property_ids[0])) {
            return Lookup::Color(material);
        }
        match self.textures.get(&group) {
            Some(entry) => Lookup::Texture(entry),
            None => Lookup::Missing,
        }
    }

    /// Number of distinct material records across both tables
    pub fn material_count(&self) -> usize {
        self.colors.len() + self.textures.len()
    }
}

/// Builds material lookup tables from 3MF property groups
#[derive(Debug, Clone)]
pub struct MaterialBuilder {
    roughness: f32,
    metallic: f32,
    uv_layer: String,
}

impl Default for MaterialBuilder {
    fn default() -> Self {
        Self {
            roughness: DEFAULT_ROUGHNESS,
            metallic: DEFAULT_METALLIC,
            uv_layer: DEFAULT_UV_LAYER.to_string(),
        }
    }
}

impl MaterialBuilder {
    /// Builder with default roughness, metallic and UV layer
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder using the material settings of an import configuration
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            roughness: config.default_roughness,
            metallic: config.default_metallic,
            uv_layer: config.uv_layer_name.clone(),
        }
    }

    fn flat(&self, name: String, color: Rgba) -> MaterialRef {
        let [r, g, b, alpha] = color_to_linear(color);
        Arc::new(MaterialRecord::Flat(FlatMaterial {
            name,
            base_color: [r, g, b, 1.0],
            alpha,
            roughness: self.roughness,
            metallic: self.metallic,
            blend: alpha < 1.0,
        }))
    }

    /// One flat material per color entry
    pub fn build_color_materials<'a, I>(&self, groups: I) -> ColorTable
    where
        I: IntoIterator<Item = &'a ColorGroup>,
    {
        let mut table = ColorTable::new();
        for group in groups {
            for (pid, color) in group.entries() {
                let name = format!("3MF_Color_{}_{}", group.id, pid);
                table
                    .entry((group.id, pid))
                    .or_insert_with(|| self.flat(name, color));
            }
        }
        table
    }

    /// Add one flat material per base material entry to an existing color table
    ///
    /// Keys already present are left untouched.
    pub fn add_base_materials<'a, I>(&self, table: &mut ColorTable, groups: I)
    where
        I: IntoIterator<Item = &'a BaseMaterialGroup>,
    {
        for group in groups {
            for (pid, base) in group.entries() {
                let name = if base.name.is_empty() {
                    format!("3MF_Base_{}_{}", group.id, pid)
                } else {
                    base.name.clone()
                };
                table
                    .entry((group.id, pid))
                    .or_insert_with(|| self.flat(name, base.displaycolor));
            }
        }
    }

    /// One textured material per texture group whose image decoded
    ///
    /// Groups referencing a texture without a decoded image are skipped.
    pub fn build_texture_materials<'a, I>(
        &self,
        groups: I,
        images: &HashMap<ResourceId, DecodedImage>,
    ) -> TextureTable
    where
        I: IntoIterator<Item = &'a Texture2DGroup>,
    {
        let mut table = TextureTable::new();
        for group in groups {
            if !images.contains_key(&group.texid) {
                warn!(
                    "Skipping texture group {}: no decoded image for texture {}",
                    group.id, group.texid
                );
                continue;
            }
            let material = Arc::new(MaterialRecord::Textured(TexturedMaterial {
                name: format!("3MF_Texture_{}", group.id),
                texture_id: group.texid,
                uv_layer: self.uv_layer.clone(),
            }));
            table.insert(
                group.id,
                TextureEntry {
                    material,
                    coords: group.tex2coords.clone(),
                },
            );
        }
        table
    }
}
