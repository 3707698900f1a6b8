//! Records and the recursive `<record>` parser.

use roxmltree::Node;
use serde::Serialize;

use crate::{
    ci_map::CaseInsensitiveMap,
    coerce::{ContainerBase, FieldValue, coerce},
    errors::{FmError, ParseError},
    format::FormatSet,
    meta::{FieldMeta, strip_table_prefix},
};

/// Field metadata keyed by field name.
pub type FieldMetaMap = CaseInsensitiveMap<FieldMeta>;

/// Portal metadata keyed by related table occurrence name.
pub type PortalMetaMap = CaseInsensitiveMap<FieldMetaMap>;

/// The stored value of one field on a record.
///
/// The shape follows the number of `<data>` elements delivered, not the
/// declared repetition count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Null,
    Single(FieldValue),
    Repeating(Vec<Option<FieldValue>>),
}

impl RecordValue {
    fn from_data(mut values: Vec<Option<FieldValue>>) -> Self {
        match values.len() {
            0 => RecordValue::Null,
            1 => match values.pop().flatten() {
                Some(value) => RecordValue::Single(value),
                None => RecordValue::Null,
            },
            _ => RecordValue::Repeating(values),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RecordValue::Null)
    }

    pub fn as_single(&self) -> Option<&FieldValue> {
        match self {
            RecordValue::Single(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_repeating(&self) -> Option<&[Option<FieldValue>]> {
        match self {
            RecordValue::Repeating(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        self.as_single().and_then(FieldValue::as_text)
    }
}

impl PartialEq<&str> for RecordValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

/// One FileMaker record with its coerced field values and portal rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    record_id: String,
    mod_id: String,
    fields: CaseInsensitiveMap<RecordValue>,
    #[serde(skip_serializing_if = "CaseInsensitiveMap::is_empty")]
    portals: CaseInsensitiveMap<Vec<Record>>,
}

impl Record {
    pub fn new(record_id: impl Into<String>, mod_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            mod_id: mod_id.into(),
            fields: CaseInsensitiveMap::new(),
            portals: CaseInsensitiveMap::new(),
        }
    }

    /// FileMaker's internal record id, needed for edit and delete.
    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Modification token; changes every time the record is saved.
    pub fn mod_id(&self) -> &str {
        &self.mod_id
    }

    pub fn get(&self, field: &str) -> Option<&RecordValue> {
        self.fields.get(field)
    }

    /// Like [`Record::get`], but a missing field is an error.
    pub fn value(&self, field: &str) -> Result<&RecordValue, FmError> {
        self.fields.get(field).ok_or_else(|| FmError::FieldNotFound {
            field: field.to_string(),
        })
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(RecordValue::as_text)
    }

    pub fn fields(&self) -> &CaseInsensitiveMap<RecordValue> {
        &self.fields
    }

    /// Rows of a portal, keyed by related table occurrence name.
    pub fn portal(&self, table: &str) -> Option<&[Record]> {
        self.portals.get(table).map(Vec::as_slice)
    }

    pub fn portals(&self) -> &CaseInsensitiveMap<Vec<Record>> {
        &self.portals
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: RecordValue) {
        self.fields.insert(name, value);
    }

    /// Appends rows to a portal, creating it (possibly empty) if needed.
    pub fn extend_portal(&mut self, table: &str, rows: Vec<Record>) {
        match self.portals.get_mut(table) {
            Some(existing) => existing.extend(rows),
            None => {
                self.portals.insert(table, rows);
            }
        }
    }
}

/// Shared, read-only inputs for building the records of one response.
#[derive(Debug, Clone, Copy)]
pub struct RecordTree<'a> {
    pub portal_meta: &'a PortalMetaMap,
    pub formats: &'a FormatSet,
    pub container: &'a ContainerBase,
    pub include_portals: bool,
}

impl<'a> RecordTree<'a> {
    /// Builds a [`Record`] from a `<record>` node.
    ///
    /// `table` is set when parsing a portal row; field names are then
    /// stripped of their `Table::` prefix before metadata lookup.
    pub fn parse_record(&self, node: Node, fields: &FieldMetaMap, table: Option<&str>) -> Result<Record, FmError> {
        let mut record = Record::new(
            node.attribute("record-id").unwrap_or_default(),
            node.attribute("mod-id").unwrap_or_default(),
        );

        for child in node.children().filter(|n| n.is_element()) {
            match child.tag_name().name() {
                "field" => {
                    let (name, value) = self.parse_field(child, fields, table)?;
                    record.insert_field(name, value);
                }
                "relatedset" if self.include_portals => {
                    let (portal, rows) = self.parse_related_set(child)?;
                    record.extend_portal(portal, rows);
                }
                _ => {}
            }
        }

        Ok(record)
    }

    fn parse_field(
        &self,
        node: Node,
        fields: &FieldMetaMap,
        table: Option<&str>,
    ) -> Result<(String, RecordValue), FmError> {
        let raw_name = node.attribute("name").ok_or(ParseError::MissingAttribute {
            element: "field",
            attr: "name",
        })?;
        let name = match table {
            Some(table) => strip_table_prefix(raw_name, table),
            None => raw_name,
        };

        let meta = fields.get(name).ok_or_else(|| ParseError::UndeclaredField {
            field: name.to_string(),
            table: table.map(str::to_string),
        })?;

        let values = node
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "data")
            .map(|data| coerce(data.text().unwrap_or_default(), meta, self.formats, self.container))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((name.to_string(), RecordValue::from_data(values)))
    }

    fn parse_related_set<'n>(&self, node: Node<'n, '_>) -> Result<(&'n str, Vec<Record>), FmError> {
        let table = node.attribute("table").ok_or(ParseError::MissingAttribute {
            element: "relatedset",
            attr: "table",
        })?;
        let fields = self.portal_meta.get(table).ok_or_else(|| ParseError::UndeclaredPortal {
            table: table.to_string(),
        })?;

        let rows = node
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "record")
            .map(|row| self.parse_record(row, fields, Some(table)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((table, rows))
    }
}
