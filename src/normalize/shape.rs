//! Declared target shapes
//!
//! A [`Shape`] names the fields a caller expects from a payload and where
//! each one lives: a JSON pointer, an XML path, or an HTML selector. Whether
//! a missing field fails the record is declared per field, never inferred.

use crate::normalize::dates::DateFormat;

/// Where a field's value lives in the raw payload
#[derive(Debug, Clone)]
pub enum FieldSource {
    /// RFC 6901 pointer into a JSON document (e.g. `/data/results`)
    JsonPointer(String),
    /// Slash-separated element path relative to the document root, with an
    /// optional `@attr` leaf (e.g. `item/title`, `item/@id`)
    XmlPath(String),
    /// CSS selector into an HTML document; `attr` None reads element text
    HtmlSelector {
        /// CSS selector
        selector: String,
        /// Attribute to read; None reads the text content
        attr: Option<String>,
    },
}

impl FieldSource {
    /// Human-readable selector string for error reporting
    pub fn describe(&self) -> &str {
        match self {
            Self::JsonPointer(pointer) => pointer,
            Self::XmlPath(path) => path,
            Self::HtmlSelector { selector, .. } => selector,
        }
    }
}

/// How a raw value is interpreted
#[derive(Debug, Clone, Default)]
pub enum FieldKind {
    /// Keep as-is (string for XML/HTML, verbatim JSON value)
    #[default]
    Verbatim,
    /// Parse as a signed integer
    Integer,
    /// Parse as a boolean (`true`/`false`/`1`/`0`)
    Boolean,
    /// Try each date interpreter in order; on total failure the raw string
    /// is preserved in `extra` instead of failing the record
    Date(Vec<DateFormat>),
}

/// One declared field of a target shape
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// Logical field name in the normalized result
    pub name: String,
    /// Where the value lives
    pub source: FieldSource,
    /// How the value is interpreted
    pub kind: FieldKind,
    /// Whether absence fails the whole record
    pub required: bool,
}

impl FieldSpec {
    /// Create an optional verbatim field
    pub fn new(name: impl Into<String>, source: FieldSource) -> Self {
        Self {
            name: name.into(),
            source,
            kind: FieldKind::Verbatim,
            required: false,
        }
    }

    /// Mark the field as structurally required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the interpretation kind
    pub fn with_kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }
}

/// A named target shape: declared fields plus HTML section coverage
#[derive(Debug, Clone)]
pub struct Shape {
    /// Shape name used in diagnostics
    pub name: String,
    /// Declared fields
    pub fields: Vec<FieldSpec>,
    /// Selector for sibling HTML sections; matched sections not covered by
    /// any field selector are preserved as raw fragments in `extra`
    pub html_sections: Option<String>,
}

impl Shape {
    /// Create an empty shape
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            html_sections: None,
        }
    }

    /// Append a field
    pub fn with_field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare the HTML section selector for drift capture
    pub fn with_html_sections(mut self, selector: impl Into<String>) -> Self {
        self.html_sections = Some(selector.into());
        self
    }
}
