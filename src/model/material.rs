//! Material extension types: color groups, base materials and textures

use super::core::{PropertyId, ResourceId};

/// Color in RGBA byte format (red, green, blue, alpha)
pub type Rgba = (u8, u8, u8, u8);

/// Color group from materials extension
#[derive(Debug, Clone)]
pub struct ColorGroup {
    /// Color group ID
    pub id: ResourceId,
    /// List of colors in this group, indexed by property id
    pub colors: Vec<Rgba>,
}

impl ColorGroup {
    /// Create a new color group
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            colors: Vec::new(),
        }
    }

    /// Colors paired with their property ids
    pub fn entries(&self) -> impl Iterator<Item = (PropertyId, Rgba)> + '_ {
        self.colors
            .iter()
            .enumerate()
            .map(|(index, color)| (PropertyId(index), *color))
    }
}

/// Base material group
#[derive(Debug, Clone)]
pub struct BaseMaterialGroup {
    /// Base material group ID
    pub id: ResourceId,
    /// List of base materials in this group, indexed by property id
    pub materials: Vec<BaseMaterial>,
}

impl BaseMaterialGroup {
    /// Create a new base material group
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            materials: Vec::new(),
        }
    }

    /// Base materials paired with their property ids
    pub fn entries(&self) -> impl Iterator<Item = (PropertyId, &BaseMaterial)> + '_ {
        self.materials
            .iter()
            .enumerate()
            .map(|(index, material)| (PropertyId(index), material))
    }
}

/// Individual base material within a base material group
#[derive(Debug, Clone, PartialEq)]
pub struct BaseMaterial {
    /// Material name
    pub name: String,
    /// Display color
    pub displaycolor: Rgba,
}

impl BaseMaterial {
    /// Create a new base material
    pub fn new(name: String, displaycolor: Rgba) -> Self {
        Self { name, displaycolor }
    }
}

/// Texture2D resource from materials extension
#[derive(Debug, Clone, PartialEq)]
pub struct Texture2D {
    /// Texture ID
    pub id: ResourceId,
    /// Path to the image part within the 3MF package
    pub path: String,
    /// Content type (image/jpeg or image/png)
    pub contenttype: String,
}

impl Texture2D {
    /// Create a new Texture2D resource
    pub fn new(id: ResourceId, path: String, contenttype: String) -> Self {
        Self {
            id,
            path,
            contenttype,
        }
    }
}

/// Texture 2D coordinate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tex2Coord {
    /// U coordinate (horizontal, from left)
    pub u: f32,
    /// V coordinate (vertical, from bottom)
    pub v: f32,
}

impl Tex2Coord {
    /// Create a new texture coordinate
    pub fn new(u: f32, v: f32) -> Self {
        Self { u, v }
    }
}

/// Texture2D group from materials extension
#[derive(Debug, Clone)]
pub struct Texture2DGroup {
    /// Texture2D group ID
    pub id: ResourceId,
    /// Reference to texture2d resource
    pub texid: ResourceId,
    /// List of texture coordinates, indexed by property id
    pub tex2coords: Vec<Tex2Coord>,
}

impl Texture2DGroup {
    /// Create a new texture2d group
    pub fn new(id: ResourceId, texid: ResourceId) -> Self {
        Self {
            id,
            texid,
            tex2coords: Vec::new(),
        }
    }
}

/// Raw bytes of the image part a Texture2D resource points at
#[derive(Debug, Clone)]
pub struct TextureAttachment {
    /// Texture2D resource the image belongs to
    pub texture_id: ResourceId,
    /// Part path inside the package
    pub path: String,
    /// Declared content type
    pub content_type: String,
    /// Encoded image data
    pub data: Vec<u8>,
}
