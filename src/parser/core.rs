//! Core 3MF element parsing
//!
//! Objects, vertices, triangles, components and build items.

use crate::error::{Error, Result};
use crate::model::*;
use quick_xml::events::BytesStart;

use super::{TRANSFORM_MATRIX_SIZE, parse_attributes};

/// Attributes of an `<object>` element that matter while its children are parsed
#[derive(Debug, Clone)]
pub(super) struct ObjectHeader {
    pub id: ResourceId,
    pub name: Option<String>,
    /// Default property group for triangles without `pid`
    pub pid: Option<usize>,
    /// Default property index for triangles without `p1`
    pub pindex: Option<usize>,
}

/// Property attributes of a `<triangle>` element before defaults are applied
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct TriangleRefs {
    pub pid: Option<usize>,
    pub pindex: Option<usize>,
    pub p1: Option<usize>,
    pub p2: Option<usize>,
    pub p3: Option<usize>,
}

impl TriangleRefs {
    /// Apply 3MF defaulting rules against the owning object
    ///
    /// `pid` falls back to the object's `pid`, `p1` to the triangle's `pindex`
    /// and then the object's `pindex`, and `p2`/`p3` to `p1`.
    pub fn resolve(&self, object: &ObjectHeader) -> Option<TriangleProperties> {
        let pid = self.pid.or(object.pid)?;
        let p1 = self.p1.or(self.pindex).or(object.pindex)?;
        let p2 = self.p2.unwrap_or(p1);
        let p3 = self.p3.unwrap_or(p1);
        Some(TriangleProperties::new(
            ResourceId(pid),
            [PropertyId(p1), PropertyId(p2), PropertyId(p3)],
        ))
    }
}

/// Parse object element attributes
pub(super) fn parse_object(e: &BytesStart<'_>) -> Result<ObjectHeader> {
    let attrs = parse_attributes(e)?;

    let id = attrs
        .get("id")
        .ok_or_else(|| Error::missing_attribute("object", "id"))?
        .parse::<usize>()?;

    let pid = attrs.get("pid").map(|v| v.parse::<usize>()).transpose()?;
    let pindex = attrs
        .get("pindex")
        .map(|v| v.parse::<usize>())
        .transpose()?;

    Ok(ObjectHeader {
        id: ResourceId(id),
        name: attrs.get("name").filter(|n| !n.is_empty()).cloned(),
        pid,
        pindex,
    })
}

/// Parse vertex element attributes
pub(super) fn parse_vertex(e: &BytesStart<'_>) -> Result<Vertex> {
    let mut x_opt: Option<f64> = None;
    let mut y_opt: Option<f64> = None;
    let mut z_opt: Option<f64> = None;

    let parse_f64 = |value: &[u8]| -> Result<f64> {
        let value_str = std::str::from_utf8(value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        Ok(value_str.trim().parse::<f64>()?)
    };

    for attr_result in e.attributes() {
        let attr = attr_result?;
        match attr.key.as_ref() {
            b"x" => x_opt = Some(parse_f64(&attr.value)?),
            b"y" => y_opt = Some(parse_f64(&attr.value)?),
            b"z" => z_opt = Some(parse_f64(&attr.value)?),
            _ => {}
        }
    }

    let x = x_opt.ok_or_else(|| Error::missing_attribute("vertex", "x"))?;
    let y = y_opt.ok_or_else(|| Error::missing_attribute("vertex", "y"))?;
    let z = z_opt.ok_or_else(|| Error::missing_attribute("vertex", "z"))?;

    for (axis, value) in [("x", x), ("y", y), ("z", z)] {
        if !value.is_finite() {
            return Err(Error::InvalidXml(format!(
                "Vertex {} coordinate must be finite (got {})",
                axis, value
            )));
        }
    }

    Ok(Vertex::new(x, y, z))
}

/// Parse triangle element attributes
pub(super) fn parse_triangle(e: &BytesStart<'_>) -> Result<(Triangle, TriangleRefs)> {
    let mut v1_opt: Option<usize> = None;
    let mut v2_opt: Option<usize> = None;
    let mut v3_opt: Option<usize> = None;
    let mut refs = TriangleRefs::default();

    for attr_result in e.attributes() {
        let attr = attr_result?;
        let key = attr.key.as_ref();

        let slot = match key {
            b"v1" => &mut v1_opt,
            b"v2" => &mut v2_opt,
            b"v3" => &mut v3_opt,
            b"pid" => &mut refs.pid,
            b"pindex" => &mut refs.pindex,
            b"p1" => &mut refs.p1,
            b"p2" => &mut refs.p2,
            b"p3" => &mut refs.p3,
            _ => continue,
        };

        let value_str =
            std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
        *slot = Some(value_str.trim().parse::<usize>()?);
    }

    let v1 = v1_opt.ok_or_else(|| Error::missing_attribute("triangle", "v1"))?;
    let v2 = v2_opt.ok_or_else(|| Error::missing_attribute("triangle", "v2"))?;
    let v3 = v3_opt.ok_or_else(|| Error::missing_attribute("triangle", "v3"))?;

    Ok((Triangle::new(v1, v2, v3), refs))
}

/// Parse a 3x4 transform attribute (12 whitespace-separated numbers)
pub(super) fn parse_transform(element: &str, transform_str: &str) -> Result<[f64; 12]> {
    let values = transform_str
        .split_whitespace()
        .map(|s| s.parse::<f64>().map_err(Error::from))
        .collect::<Result<Vec<f64>>>()?;

    if values.len() != TRANSFORM_MATRIX_SIZE {
        return Err(Error::InvalidXml(format!(
            "{} transform matrix must have exactly {} values (got {})",
            element,
            TRANSFORM_MATRIX_SIZE,
            values.len()
        )));
    }

    if let Some((idx, val)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(Error::InvalidXml(format!(
            "{} transform matrix value at index {} must be finite (got {})",
            element, idx, val
        )));
    }

    let mut transform = [0.0; TRANSFORM_MATRIX_SIZE];
    transform.copy_from_slice(&values);
    Ok(transform)
}

/// Parse component element attributes
pub(super) fn parse_component(e: &BytesStart<'_>) -> Result<Component> {
    let attrs = parse_attributes(e)?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("component", "objectid"))?
        .parse::<usize>()?;

    let transform = attrs
        .get("transform")
        .map(|t| parse_transform("Component", t))
        .transpose()?;

    Ok(Component {
        object_id: ResourceId(objectid),
        transform,
    })
}

/// Parse build item element attributes
pub(super) fn parse_build_item(e: &BytesStart<'_>) -> Result<BuildItem> {
    let attrs = parse_attributes(e)?;

    let objectid = attrs
        .get("objectid")
        .ok_or_else(|| Error::missing_attribute("item", "objectid"))?
        .parse::<usize>()?;

    let transform = attrs
        .get("transform")
        .map(|t| parse_transform("Build item", t))
        .transpose()?;

    Ok(BuildItem {
        object_id: ResourceId(objectid),
        transform,
    })
}
