use roxmltree::Node;
use serde::Serialize;

use crate::{ci_map::canonical, errors::ParseError};

/// Declared result type of a FileMaker field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Text,
    Number,
    Date,
    Time,
    Timestamp,
    Container,
    /// A result type this crate does not know; values read as null.
    Other(String),
}

impl ResultType {
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "text" => ResultType::Text,
            "number" => ResultType::Number,
            "date" => ResultType::Date,
            "time" => ResultType::Time,
            "timestamp" => ResultType::Timestamp,
            "container" => ResultType::Container,
            _ => ResultType::Other(raw.to_string()),
        }
    }
}

/// How a field obtains its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    #[default]
    Normal,
    Calculation,
    Summary,
}

impl EntryType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "normal" => Some(EntryType::Normal),
            "calculation" => Some(EntryType::Calculation),
            "summary" => Some(EntryType::Summary),
            _ => None,
        }
    }
}

/// Metadata from one `<field-definition>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldMeta {
    pub name: String,
    pub result: ResultType,
    pub entry: EntryType,
    pub max_repeats: u32,
    pub global: bool,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, result: ResultType) -> Self {
        Self {
            name: name.into(),
            result,
            entry: EntryType::Normal,
            max_repeats: 1,
            global: false,
        }
    }

    pub fn with_entry(mut self, entry: EntryType) -> Self {
        self.entry = entry;
        self
    }

    pub fn with_max_repeats(mut self, max_repeats: u32) -> Self {
        self.max_repeats = max_repeats.max(1);
        self
    }

    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    /// Reads a `<field-definition>` node. `name` is passed in already
    /// stripped of any portal table prefix.
    pub(crate) fn from_node(node: &Node, name: &str) -> Result<Self, ParseError> {
        const ELEMENT: &str = "field-definition";

        let result = node
            .attribute("result")
            .map(ResultType::parse)
            .ok_or(ParseError::MissingAttribute {
                element: ELEMENT,
                attr: "result",
            })?;

        let entry = match node.attribute("type") {
            Some(raw) => EntryType::parse(raw).ok_or_else(|| ParseError::InvalidAttribute {
                element: ELEMENT,
                attr: "type",
                value: raw.to_string(),
            })?,
            None => EntryType::Normal,
        };

        let max_repeats = match node.attribute("max-repeat") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(value) if value >= 1 => value,
                _ => {
                    return Err(ParseError::InvalidAttribute {
                        element: ELEMENT,
                        attr: "max-repeat",
                        value: raw.to_string(),
                    });
                }
            },
            None => 1,
        };

        let global = node.attribute("global").is_some_and(|raw| raw.eq_ignore_ascii_case("yes"));

        Ok(Self {
            name: name.to_string(),
            result,
            entry,
            max_repeats,
            global,
        })
    }
}

/// Strips a `Table::` prefix from a related field name, ignoring case the
/// same way [`CaseInsensitiveMap`](crate::CaseInsensitiveMap) does.
pub(crate) fn strip_table_prefix<'a>(name: &'a str, table: &str) -> &'a str {
    match name.split_once("::") {
        Some((head, field)) if canonical(head) == canonical(table) => field,
        _ => name,
    }
}
