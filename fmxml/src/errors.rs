use std::fmt;

use thiserror::Error;

/// Top-level error type returned by fmxml.
#[derive(Debug, Error)]
pub enum FmError {
    /// The server answered with a non-zero FileMaker error code.
    #[error(transparent)]
    FileMaker(#[from] FileMakerError),

    /// The HTTP exchange failed or returned an unexpected status.
    #[error("communication error: {message}")]
    Communication { status: Option<u16>, message: String },

    /// The server rejected the supplied credentials (HTTP 401).
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// Invalid input supplied to a request builder or layout operation.
    #[error("invalid parameter: {message}")]
    Parameter { message: String },

    /// The response document does not follow the fmresultset grammar.
    #[error("malformed response: {0}")]
    Parse(#[from] ParseError),

    /// A datum could not be converted into the declared field type.
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// Connection configuration could not be loaded or resolved.
    #[error("invalid configuration: {message}")]
    Config { message: String },

    /// A record was asked for a field it does not carry.
    #[error("field '{field}' not present on record")]
    FieldNotFound { field: String },
}

impl FmError {
    /// Maps a non-success HTTP status the way the Web Publishing Engine uses them.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 => FmError::Authentication { message },
            _ => FmError::Communication {
                status: Some(status),
                message,
            },
        }
    }

    /// Returns the FileMaker error, if this is one.
    pub fn as_filemaker(&self) -> Option<&FileMakerError> {
        match self {
            FmError::FileMaker(err) => Some(err),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FmError>;

/// Classification of a FileMaker numeric error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    System,
    RecordMissing,
    FieldMissing,
    ScriptMissing,
    LayoutMissing,
    TableMissing,
    Missing,
    RecordAccessDenied,
    FieldCannotBeModified,
    FieldAccessDenied,
    Security,
    RecordInUse,
    TableInUse,
    RecordModIdMismatch,
    Concurrency,
    NoRecordsFound,
    General,
    DateValidation,
    TimeValidation,
    NumberValidation,
    RangeValidation,
    UniqueValidation,
    ExistingValidation,
    ValueListValidation,
    ValidationCalculation,
    InvalidFindModeValue,
    MaxCharactersValidation,
    Validation,
    UnableToOpenFile,
    File,
    Unknown,
}

/// The code-range family an [`ErrorKind`] belongs to.
///
/// Specific kinds are members of their range's family, so `RecordMissing`
/// and `Missing` both report [`ErrorFamily::Missing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    System,
    Missing,
    Security,
    Concurrency,
    General,
    Validation,
    File,
    Unknown,
}

impl ErrorKind {
    /// Name used in rendered error messages.
    pub const fn name(self) -> &'static str {
        match self {
            ErrorKind::System => "System",
            ErrorKind::RecordMissing => "RecordMissing",
            ErrorKind::FieldMissing => "FieldMissing",
            ErrorKind::ScriptMissing => "ScriptMissing",
            ErrorKind::LayoutMissing => "LayoutMissing",
            ErrorKind::TableMissing => "TableMissing",
            ErrorKind::Missing => "Missing",
            ErrorKind::RecordAccessDenied => "RecordAccessDenied",
            ErrorKind::FieldCannotBeModified => "FieldCannotBeModified",
            ErrorKind::FieldAccessDenied => "FieldAccessDenied",
            ErrorKind::Security => "Security",
            ErrorKind::RecordInUse => "RecordInUse",
            ErrorKind::TableInUse => "TableInUse",
            ErrorKind::RecordModIdMismatch => "RecordModIdMismatch",
            ErrorKind::Concurrency => "Concurrency",
            ErrorKind::NoRecordsFound => "NoRecordsFound",
            ErrorKind::General => "General",
            ErrorKind::DateValidation => "DateValidation",
            ErrorKind::TimeValidation => "TimeValidation",
            ErrorKind::NumberValidation => "NumberValidation",
            ErrorKind::RangeValidation => "RangeValidation",
            ErrorKind::UniqueValidation => "UniqueValidation",
            ErrorKind::ExistingValidation => "ExistingValidation",
            ErrorKind::ValueListValidation => "ValueListValidation",
            ErrorKind::ValidationCalculation => "ValidationCalculation",
            ErrorKind::InvalidFindModeValue => "InvalidFindModeValue",
            ErrorKind::MaxCharactersValidation => "MaxCharactersValidation",
            ErrorKind::Validation => "Validation",
            ErrorKind::UnableToOpenFile => "UnableToOpenFile",
            ErrorKind::File => "File",
            ErrorKind::Unknown => "Unknown",
        }
    }

    pub const fn family(self) -> ErrorFamily {
        match self {
            ErrorKind::System => ErrorFamily::System,
            ErrorKind::RecordMissing
            | ErrorKind::FieldMissing
            | ErrorKind::ScriptMissing
            | ErrorKind::LayoutMissing
            | ErrorKind::TableMissing
            | ErrorKind::Missing => ErrorFamily::Missing,
            ErrorKind::RecordAccessDenied
            | ErrorKind::FieldCannotBeModified
            | ErrorKind::FieldAccessDenied
            | ErrorKind::Security => ErrorFamily::Security,
            ErrorKind::RecordInUse
            | ErrorKind::TableInUse
            | ErrorKind::RecordModIdMismatch
            | ErrorKind::Concurrency => ErrorFamily::Concurrency,
            ErrorKind::NoRecordsFound | ErrorKind::General => ErrorFamily::General,
            ErrorKind::DateValidation
            | ErrorKind::TimeValidation
            | ErrorKind::NumberValidation
            | ErrorKind::RangeValidation
            | ErrorKind::UniqueValidation
            | ErrorKind::ExistingValidation
            | ErrorKind::ValueListValidation
            | ErrorKind::ValidationCalculation
            | ErrorKind::InvalidFindModeValue
            | ErrorKind::MaxCharactersValidation
            | ErrorKind::Validation => ErrorFamily::Validation,
            ErrorKind::UnableToOpenFile | ErrorKind::File => ErrorFamily::File,
            ErrorKind::Unknown => ErrorFamily::Unknown,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps a FileMaker error code onto its [`ErrorKind`].
///
/// Exact-code overrides are checked before the range default, so 200-202
/// resolve to their specific kinds while 203-299 fall back to `Security`.
pub const fn classify(code: i64) -> ErrorKind {
    match code {
        101 => ErrorKind::RecordMissing,
        102 => ErrorKind::FieldMissing,
        104 => ErrorKind::ScriptMissing,
        105 => ErrorKind::LayoutMissing,
        106 => ErrorKind::TableMissing,
        200 => ErrorKind::RecordAccessDenied,
        201 => ErrorKind::FieldCannotBeModified,
        202 => ErrorKind::FieldAccessDenied,
        301 => ErrorKind::RecordInUse,
        302 => ErrorKind::TableInUse,
        306 => ErrorKind::RecordModIdMismatch,
        401 => ErrorKind::NoRecordsFound,
        500 => ErrorKind::DateValidation,
        501 => ErrorKind::TimeValidation,
        502 => ErrorKind::NumberValidation,
        503 => ErrorKind::RangeValidation,
        504 => ErrorKind::UniqueValidation,
        505 => ErrorKind::ExistingValidation,
        506 => ErrorKind::ValueListValidation,
        507 => ErrorKind::ValidationCalculation,
        508 => ErrorKind::InvalidFindModeValue,
        511 => ErrorKind::MaxCharactersValidation,
        802 => ErrorKind::UnableToOpenFile,
        0..=99 => ErrorKind::System,
        100..=199 => ErrorKind::Missing,
        200..=299 => ErrorKind::Security,
        300..=399 => ErrorKind::Concurrency,
        400..=499 => ErrorKind::General,
        500..=599 => ErrorKind::Validation,
        800..=899 => ErrorKind::File,
        _ => ErrorKind::Unknown,
    }
}

/// Builds the error raised for a non-zero FileMaker response code.
pub fn build_error(code: i64, custom_message: Option<&str>) -> FileMakerError {
    let kind = classify(code);
    let message = match custom_message {
        Some(custom) => format!("{kind} occurred: {custom} (FileMaker Error #{code})"),
        None => format!("{kind} occurred: (FileMaker Error #{code})"),
    };
    FileMakerError { code, kind, message }
}

/// Protocol error reported by the Web Publishing Engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FileMakerError {
    code: i64,
    kind: ErrorKind,
    message: String,
}

impl FileMakerError {
    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if this error belongs to the given code family.
    pub fn is(&self, family: ErrorFamily) -> bool {
        self.kind.family() == family
    }
}

/// Structural problems in a response document.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("response is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("unexpected root element '{found}'")]
    UnexpectedRoot { found: String },

    #[error("missing <{0}> element")]
    MissingElement(&'static str),

    #[error("missing attribute '{attr}' on <{element}>")]
    MissingAttribute { element: &'static str, attr: &'static str },

    #[error("invalid value '{value}' for attribute '{attr}' on <{element}>")]
    InvalidAttribute {
        element: &'static str,
        attr: &'static str,
        value: String,
    },

    /// A `<field>` node names a field absent from the declared metadata.
    #[error("field '{field}' is not declared in the response metadata{}", table_suffix(.table))]
    UndeclaredField { field: String, table: Option<String> },

    /// A `<relatedset>` node names a portal absent from the declared metadata.
    #[error("portal '{table}' is not declared in the response metadata")]
    UndeclaredPortal { table: String },
}

fn table_suffix(table: &Option<String>) -> String {
    match table {
        Some(table) => format!(" for portal '{table}'"),
        None => String::new(),
    }
}

/// Which declared type a datum failed to convert into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionTarget {
    Number,
    Date,
    Time,
    Timestamp,
    Container,
}

impl fmt::Display for CoercionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CoercionTarget::Number => "number",
            CoercionTarget::Date => "date",
            CoercionTarget::Time => "time",
            CoercionTarget::Timestamp => "timestamp",
            CoercionTarget::Container => "container",
        };
        f.write_str(name)
    }
}

/// A raw datum did not match its field's declared result type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot read '{value}' in field '{field}' as {target}{}", pattern_suffix(.pattern))]
pub struct CoercionError {
    pub field: String,
    pub value: String,
    pub target: CoercionTarget,
    pub pattern: Option<String>,
}

fn pattern_suffix(pattern: &Option<String>) -> String {
    match pattern {
        Some(pattern) => format!(" using pattern '{pattern}'"),
        None => String::new(),
    }
}

impl CoercionError {
    pub fn new(field: impl Into<String>, value: impl Into<String>, target: CoercionTarget) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            target,
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }
}
