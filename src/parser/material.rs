//! Material extension parsing
//!
//! Color groups, base materials, textures and texture coordinate groups.

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::events::BytesStart;

use super::parse_attributes;

/// Parse color from hex string format (#RRGGBB or #RRGGBBAA)
pub(super) fn parse_color(color_str: &str) -> Option<Rgba> {
    let color_str = color_str.trim().trim_start_matches('#');
    if !color_str.is_ascii() {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&color_str[range], 16).ok();

    match color_str.len() {
        6 => Some((channel(0..2)?, channel(2..4)?, channel(4..6)?, 255)),
        8 => Some((
            channel(0..2)?,
            channel(2..4)?,
            channel(4..6)?,
            channel(6..8)?,
        )),
        _ => None,
    }
}

fn parse_id(e: &BytesStart<'_>, element: &str, attribute: &str) -> Result<ResourceId> {
    let attrs = parse_attributes(e)?;
    let id = attrs
        .get(attribute)
        .ok_or_else(|| Error::missing_attribute(element, attribute))?
        .parse::<usize>()?;
    Ok(ResourceId(id))
}

/// Parse colorgroup start and return initialized group
pub(super) fn parse_colorgroup_start(e: &BytesStart<'_>) -> Result<ColorGroup> {
    Ok(ColorGroup::new(parse_id(e, "colorgroup", "id")?))
}

/// Parse color element
pub(super) fn parse_color_element(e: &BytesStart<'_>, colorgroup_id: ResourceId) -> Result<Rgba> {
    let attrs = parse_attributes(e)?;
    let color_str = attrs
        .get("color")
        .ok_or_else(|| Error::missing_attribute("color", "color"))?;

    parse_color(color_str).ok_or_else(|| {
        Error::InvalidXml(format!(
            "Invalid color format '{}' in colorgroup {}. \
             Colors must be in format #RRGGBB or #RRGGBBAA.",
            color_str, colorgroup_id
        ))
    })
}

/// Parse basematerials group start and return initialized group
pub(super) fn parse_basematerials_start(e: &BytesStart<'_>) -> Result<BaseMaterialGroup> {
    Ok(BaseMaterialGroup::new(parse_id(e, "basematerials", "id")?))
}

/// Parse base material element
///
/// A missing or malformed displaycolor falls back to opaque white.
pub(super) fn parse_base_element(e: &BytesStart<'_>) -> Result<BaseMaterial> {
    let attrs = parse_attributes(e)?;
    let name = attrs.get("name").cloned().unwrap_or_default();
    let displaycolor = attrs
        .get("displaycolor")
        .and_then(|c| parse_color(c))
        .unwrap_or((255, 255, 255, 255));
    Ok(BaseMaterial::new(name, displaycolor))
}

/// Parse texture2d element
pub(super) fn parse_texture2d(e: &BytesStart<'_>) -> Result<Texture2D> {
    let attrs = parse_attributes(e)?;
    let id = attrs
        .get("id")
        .ok_or_else(|| Error::missing_attribute("texture2d", "id"))?
        .parse::<usize>()?;
    let path = attrs
        .get("path")
        .ok_or_else(|| Error::missing_attribute("texture2d", "path"))?
        .to_string();
    let contenttype = attrs
        .get("contenttype")
        .ok_or_else(|| Error::missing_attribute("texture2d", "contenttype"))?
        .to_string();

    Ok(Texture2D::new(ResourceId(id), path, contenttype))
}

/// Parse texture2dgroup start and return initialized group
pub(super) fn parse_texture2dgroup_start(e: &BytesStart<'_>) -> Result<Texture2DGroup> {
    let id = parse_id(e, "texture2dgroup", "id")?;
    let texid = parse_id(e, "texture2dgroup", "texid")?;
    Ok(Texture2DGroup::new(id, texid))
}

/// Parse tex2coord element
pub(super) fn parse_tex2coord(e: &BytesStart<'_>) -> Result<Tex2Coord> {
    let attrs = parse_attributes(e)?;
    let u = attrs
        .get("u")
        .ok_or_else(|| Error::missing_attribute("tex2coord", "u"))?
        .trim()
        .parse::<f32>()?;
    let v = attrs
        .get("v")
        .ok_or_else(|| Error::missing_attribute("tex2coord", "v"))?
        .trim()
        .parse::<f32>()?;
    Ok(Tex2Coord::new(u, v))
}
