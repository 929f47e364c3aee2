//! OPC (Open Packaging Conventions) access for 3MF files
//!
//! 3MF files are ZIP archives following the OPC standard. The importer needs
//! three things from the package: confirmation that it is a 3MF package, the
//! root model part, and the binary parts that Texture2D resources point at.

use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::io::{Read, Seek};
use urlencoding::decode;
use zip::ZipArchive;

/// Content types file path
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

/// Relationships file path
pub const RELS_PATH: &str = "_rels/.rels";

/// 3D model relationship type
pub const MODEL_REL_TYPE: &str = "http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel";

const RELS_CONTENT_TYPE: &str = "application/vnd.openxmlformats-package.relationships+xml";
const MODEL_CONTENT_TYPE: &str = "application/vnd.ms-package.3dmanufacturing-3dmodel+xml";

/// An open 3MF package
pub struct Package<R: Read> {
    archive: ZipArchive<R>,
    model_path: String,
}

impl<R: Read + Seek> Package<R> {
    /// Open a 3MF package from a reader
    ///
    /// Fails when the reader is not a ZIP archive, when the OPC control parts are
    /// missing, or when no 3D model relationship points at an existing part.
    pub fn open(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        for required in [CONTENT_TYPES_PATH, RELS_PATH] {
            if archive.by_name(required).is_err() {
                return Err(Error::invalid_format_context(
                    "OPC package structure",
                    &format!(
                        "Missing required file '{}'. The 3MF file may be corrupt or improperly formatted.",
                        required
                    ),
                ));
            }
        }

        let content_types = read_string(&mut archive, CONTENT_TYPES_PATH)?;
        validate_content_types(&content_types)?;

        let rels = read_string(&mut archive, RELS_PATH)?;
        let model_path = discover_model_path(&rels)?;
        let model_path = resolve_part_name(&mut archive, &model_path).ok_or_else(|| {
            Error::invalid_format_context(
                "OPC relationships",
                &format!(
                    "Model relationship points to non-existent part '{}'",
                    model_path
                ),
            )
        })?;

        Ok(Self {
            archive,
            model_path,
        })
    }

    /// Path of the root model part
    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    /// Get the root model part content
    pub fn get_model(&mut self) -> Result<String> {
        let path = self.model_path.clone();
        read_string(&mut self.archive, &path)
    }

    /// Get a part as binary data
    ///
    /// Accepts part names with or without a leading slash, percent-encoded or not.
    pub fn get_file_binary(&mut self, name: &str) -> Result<Vec<u8>> {
        let path = resolve_part_name(&mut self.archive, name)
            .ok_or_else(|| Error::MissingFile(name.to_string()))?;
        let mut file = self
            .archive
            .by_name(&path)
            .map_err(|_| Error::MissingFile(path.clone()))?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        Ok(content)
    }
}

fn read_string<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut file = archive
        .by_name(name)
        .map_err(|_| Error::MissingFile(name.to_string()))?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

/// Map a part name as written in XML to the entry name stored in the ZIP
///
/// Part names in relationships and resource paths usually start with `/` and may
/// be percent-encoded, while ZIP entry names carry neither.
fn resolve_part_name<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Option<String> {
    let stripped = name.strip_prefix('/').unwrap_or(name);
    let mut candidates = vec![stripped.to_string()];
    if let Ok(decoded) = decode(stripped)
        && decoded != stripped
    {
        candidates.push(decoded.into_owned());
    }
    candidates.push(name.to_string());

    candidates
        .into_iter()
        .find(|candidate| archive.by_name(candidate).is_ok())
}

fn attribute_value(e: &BytesStart<'_>, wanted: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        let key =
            std::str::from_utf8(attr.key.as_ref()).map_err(|e| Error::InvalidXml(e.to_string()))?;
        if key == wanted {
            let value =
                std::str::from_utf8(&attr.value).map_err(|e| Error::InvalidXml(e.to_string()))?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}

/// Validate that `[Content_Types].xml` declares relationships and 3D models
fn validate_content_types(content: &str) -> Result<()> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut found_rels = false;
    let mut found_model = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                if name_str.ends_with("Default") || name_str.ends_with("Override") {
                    let content_type = attribute_value(e, "ContentType")?;
                    match content_type.as_deref() {
                        Some(RELS_CONTENT_TYPE) => found_rels = true,
                        Some(MODEL_CONTENT_TYPE) => found_model = true,
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !found_rels {
        return Err(Error::InvalidFormat(
            "Content Types missing required 'rels' content type".to_string(),
        ));
    }

    if !found_model {
        return Err(Error::InvalidFormat(
            "Content Types missing required model content type (Default or Override)".to_string(),
        ));
    }

    Ok(())
}

/// Find the target of the 3D model relationship in `_rels/.rels`
fn discover_model_path(rels: &str) -> Result<String> {
    let mut reader = Reader::from_str(rels);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let name = e.name();
                let name_str = std::str::from_utf8(name.as_ref())
                    .map_err(|e| Error::InvalidXml(e.to_string()))?;

                if name_str.ends_with("Relationship")
                    && attribute_value(e, "Type")?.as_deref() == Some(MODEL_REL_TYPE)
                    && let Some(target) = attribute_value(e, "Target")?
                {
                    return Ok(target);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Err(Error::MissingFile(
        "3D model relationship not found".to_string(),
    ))
}
