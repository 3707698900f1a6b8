//! Parser for `fmresultset` response documents.
//!
//! A response is a single complete-or-error unit: either the whole document
//! becomes a [`ParsedResponse`] or parsing stops at the first problem. The
//! error code is checked before anything else is read.

use log::{debug, warn};
use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;

use crate::{
    coerce::ContainerBase,
    errors::{FmError, ParseError, build_error},
    format::{DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT, DEFAULT_TIMESTAMP_FORMAT, FormatSet},
    meta::{FieldMeta, strip_table_prefix},
    record::{FieldMetaMap, PortalMetaMap, Record, RecordTree},
};

/// FileMaker's "no records match the request" code.
pub const NO_RECORDS_FOUND: i64 = 401;

const ROOT_ELEMENT: &str = "fmresultset";

/// Per-call parser settings, usually derived from the connection config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Raise `NoRecordsFound` for code 401 instead of returning an empty result.
    pub raise_on_401: bool,
    /// Descend into `<relatedset>` portal data.
    pub include_portals: bool,
    /// Connection location used for container field URLs.
    pub container: ContainerBase,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raise_on_401(mut self, raise: bool) -> Self {
        self.raise_on_401 = raise;
        self
    }

    pub fn with_portals(mut self, include: bool) -> Self {
        self.include_portals = include;
        self
    }

    pub fn with_container(mut self, container: ContainerBase) -> Self {
        self.container = container;
        self
    }
}

/// Attributes of the `<datasource>` element.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Datasource {
    pub database: String,
    pub layout: String,
    pub table: String,
    pub total_count: u64,
}

/// A fully parsed response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedResponse {
    pub datasource: Datasource,
    /// Size of the found set as declared by the server.
    pub found_count: u64,
    pub formats: FormatSet,
    pub fields: FieldMetaMap,
    pub portals: PortalMetaMap,
    pub records: Vec<Record>,
}

impl ParsedResponse {
    /// Total number of records in the table.
    pub fn total_count(&self) -> u64 {
        self.datasource.total_count
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn field_meta(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.get(name)
    }

    pub fn portal_meta(&self, table: &str) -> Option<&FieldMetaMap> {
        self.portals.get(table)
    }
}

impl<'a> IntoIterator for &'a ParsedResponse {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Parses a raw response body.
pub fn parse(raw: &[u8], options: &ParseOptions) -> Result<ParsedResponse, FmError> {
    let text = std::str::from_utf8(raw).map_err(ParseError::from)?;
    parse_str(text, options)
}

/// Parses a response body that is already text.
pub fn parse_str(text: &str, options: &ParseOptions) -> Result<ParsedResponse, FmError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    // The engine always emits a DOCTYPE pointing at its DTD.
    let mut parsing = ParsingOptions::default();
    parsing.allow_dtd = true;
    let doc = Document::parse_with_options(text, parsing).map_err(ParseError::from)?;

    // Tag names are matched on their local part, so the fmresultset
    // namespace is tolerated without being checked.
    let root = doc.root_element();
    if root.tag_name().name() != ROOT_ELEMENT {
        return Err(ParseError::UnexpectedRoot {
            found: root.tag_name().name().to_string(),
        }
        .into());
    }

    let code = error_code(root)?;
    if code != 0 {
        if code != NO_RECORDS_FOUND || options.raise_on_401 {
            return Err(build_error(code, None).into());
        }
        debug!("no records found (code {code}); returning an empty result");
    }

    let datasource_node = child(root, "datasource");
    let formats = match datasource_node {
        Some(node) => FormatSet::from_filemaker(
            format_attribute(node, "date-format", DEFAULT_DATE_FORMAT),
            format_attribute(node, "time-format", DEFAULT_TIME_FORMAT),
            format_attribute(node, "timestamp-format", DEFAULT_TIMESTAMP_FORMAT),
        ),
        None => FormatSet::default(),
    };
    let datasource = match datasource_node {
        Some(node) => Datasource {
            database: node.attribute("database").unwrap_or_default().to_string(),
            layout: node.attribute("layout").unwrap_or_default().to_string(),
            table: node.attribute("table").unwrap_or_default().to_string(),
            total_count: count_attribute(node, "datasource", "total-count")?,
        },
        None => Datasource::default(),
    };

    let resultset = child(root, "resultset");
    let found_count = match resultset {
        Some(node) => count_attribute(node, "resultset", "count")?,
        None => 0,
    };

    let (fields, portals) = match child(root, "metadata") {
        Some(metadata) => (field_definitions(metadata)?, related_set_definitions(metadata)?),
        None => (FieldMetaMap::new(), PortalMetaMap::new()),
    };

    let tree = RecordTree {
        portal_meta: &portals,
        formats: &formats,
        container: &options.container,
        include_portals: options.include_portals,
    };
    let records = match resultset {
        Some(node) => elements(node, "record")
            .map(|record| tree.parse_record(record, &fields, None))
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    if code == 0 && found_count != records.len() as u64 {
        warn!(
            "server declared a found set of {found_count} but delivered {} records",
            records.len()
        );
    }
    debug!(
        "parsed {} records from {}/{} (found {found_count}, total {}, portals {:?})",
        records.len(),
        datasource.database,
        datasource.layout,
        datasource.total_count,
        portals.keys().collect::<Vec<_>>()
    );

    Ok(ParsedResponse {
        datasource,
        found_count,
        formats,
        fields,
        portals,
        records,
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element() && n.tag_name().name() == name)
}

fn elements<'a, 'input>(node: Node<'a, 'input>, name: &'static str) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn error_code(root: Node) -> Result<i64, ParseError> {
    let node = child(root, "error").ok_or(ParseError::MissingElement("error"))?;
    let raw = node.attribute("code").ok_or(ParseError::MissingAttribute {
        element: "error",
        attr: "code",
    })?;
    raw.trim().parse::<i64>().map_err(|_| ParseError::InvalidAttribute {
        element: "error",
        attr: "code",
        value: raw.to_string(),
    })
}

// Name listings report every format as "".
fn format_attribute<'a>(node: Node<'a, '_>, attr: &str, default: &'a str) -> &'a str {
    node.attribute(attr).filter(|value| !value.is_empty()).unwrap_or(default)
}

fn count_attribute(node: Node, element: &'static str, attr: &'static str) -> Result<u64, ParseError> {
    match node.attribute(attr) {
        Some(raw) => raw.trim().parse::<u64>().map_err(|_| ParseError::InvalidAttribute {
            element,
            attr,
            value: raw.to_string(),
        }),
        None => Ok(0),
    }
}

fn field_definition_name<'a>(node: Node<'a, '_>) -> Result<&'a str, ParseError> {
    node.attribute("name").ok_or(ParseError::MissingAttribute {
        element: "field-definition",
        attr: "name",
    })
}

fn field_definitions(metadata: Node) -> Result<FieldMetaMap, ParseError> {
    let mut fields = FieldMetaMap::new();
    for node in elements(metadata, "field-definition") {
        let name = field_definition_name(node)?;
        fields.insert(name, FieldMeta::from_node(&node, name)?);
    }
    Ok(fields)
}

fn related_set_definitions(metadata: Node) -> Result<PortalMetaMap, ParseError> {
    let mut portals = PortalMetaMap::new();
    for set in elements(metadata, "relatedset-definition") {
        let table = set.attribute("table").ok_or(ParseError::MissingAttribute {
            element: "relatedset-definition",
            attr: "table",
        })?;
        let mut fields = FieldMetaMap::new();
        for node in elements(set, "field-definition") {
            let name = strip_table_prefix(field_definition_name(node)?, table);
            fields.insert(name, FieldMeta::from_node(&node, name)?);
        }
        portals.insert(table, fields);
    }
    Ok(portals)
}
