//! Error types for 3MF import
//!
//! Every error carries a stable code so that diagnostics shown to the user can be
//! matched against documentation and bug reports.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors (read errors)
//! - **E2xxx**: XML parsing and structure errors (read errors)
//! - **E3xxx**: Geometry errors in mesh resources
//! - **E4xxx**: Unsupported operations and object kinds
//! - **E5xxx**: Failures reported by the scene sink
//!
//! Only fatal conditions are errors. A triangle that references a property group
//! unknown to the material tables is recovered locally and counted in
//! [`ImportSummary::unresolved_triangles`](crate::ImportSummary::unresolved_triangles).

use std::io;
use thiserror::Error;

/// Result type for import operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The source file is missing, unreadable or not a valid 3MF package
    Read,
    /// A mesh resource is malformed
    Geometry,
    /// The requested operation or object kind is not supported
    Unsupported,
    /// The scene rejected a write
    Scene,
}

/// Errors that can occur while importing a 3MF file
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading the file
    ///
    /// **Error Code**: E1001
    ///
    /// **Common Causes**:
    /// - File not found
    /// - Insufficient permissions
    /// - Failure writing a temporary texture file
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - The file is not a ZIP archive
    /// - Corrupted or truncated archive
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Missing required part in the 3MF package
    ///
    /// **Error Code**: E1003
    ///
    /// **Common Causes**:
    /// - Missing root model part
    /// - Texture2D resource pointing at a part that is not in the package
    ///   (import skips such textures instead of failing)
    #[error("[E1003] Missing required file: {0}")]
    MissingFile(String),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Missing required attributes
    /// - Invalid attribute values (colors, non-finite coordinates)
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// Invalid 3MF package format
    ///
    /// **Error Code**: E2004
    ///
    /// **Common Causes**:
    /// - Missing `[Content_Types].xml` or `_rels/.rels`
    /// - No 3D model relationship
    #[error("[E2004] Invalid 3MF format: {0}")]
    InvalidFormat(String),

    /// Numeric value could not be parsed
    ///
    /// **Error Code**: E2005
    #[error("[E2005] Parse error: {0}")]
    ParseError(String),

    /// A triangle references a vertex outside the mesh's vertex array
    ///
    /// **Error Code**: E3001
    #[error(
        "[E3001] Object {object_id}: triangle {triangle} references vertex {vertex}, \
         but the mesh only has {vertex_count} vertices"
    )]
    VertexIndexOutOfBounds {
        /// Resource id of the mesh object
        object_id: usize,
        /// Zero-based triangle index
        triangle: usize,
        /// Offending vertex index
        vertex: usize,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// The triangle-property sequence does not have one entry per triangle
    ///
    /// **Error Code**: E3002
    #[error(
        "[E3002] Object {object_id}: {property_count} triangle properties for \
         {triangle_count} triangles"
    )]
    PropertyCountMismatch {
        /// Resource id of the mesh object
        object_id: usize,
        /// Number of triangles in the mesh
        triangle_count: usize,
        /// Number of triangle-property records
        property_count: usize,
    },

    /// Unsupported operation
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Invoking 3MF export, which is not implemented
    #[error("[E4001] Unsupported operation: {0}")]
    Unsupported(String),

    /// Object kind that the importer does not translate (strict mode only)
    ///
    /// **Error Code**: E4002
    #[error("[E4002] Unsupported object {id}: {kind}")]
    UnsupportedObject {
        /// Resource id of the object
        id: usize,
        /// Human-readable object kind
        kind: String,
    },

    /// The scene sink rejected a write
    ///
    /// **Error Code**: E5001
    #[error("[E5001] Scene error: {0}")]
    Scene(String),
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(format!("Failed to parse integer: {}", err))
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl Error {
    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Io(_)
            | Error::Zip(_)
            | Error::MissingFile(_)
            | Error::Xml(_)
            | Error::XmlAttr(_)
            | Error::InvalidXml(_)
            | Error::InvalidFormat(_)
            | Error::ParseError(_) => ErrorCategory::Read,
            Error::VertexIndexOutOfBounds { .. } | Error::PropertyCountMismatch { .. } => {
                ErrorCategory::Geometry
            }
            Error::Unsupported(_) | Error::UnsupportedObject { .. } => ErrorCategory::Unsupported,
            Error::Scene(_) => ErrorCategory::Scene,
        }
    }

    /// True for errors raised while reading the source package
    pub fn is_read_error(&self) -> bool {
        self.category() == ErrorCategory::Read
    }

    /// True for errors raised by malformed mesh geometry
    pub fn is_geometry_error(&self) -> bool {
        self.category() == ErrorCategory::Geometry
    }

    /// Create an InvalidXml error for a missing required attribute
    ///
    /// # Example
    /// ```ignore
    /// Error::missing_attribute("object", "id")
    /// ```
    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Error::InvalidXml(format!(
            "Element '<{}>' is missing required attribute '{}'",
            element, attribute
        ))
    }

    /// Create an InvalidFormat error with context about what structure is invalid
    pub fn invalid_format_context(context: &str, message: &str) -> Self {
        Error::InvalidFormat(format!("{}: {}", context, message))
    }

    /// Create a Scene error
    pub fn scene(message: impl Into<String>) -> Self {
        Error::Scene(message.into())
    }
}
