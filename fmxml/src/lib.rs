//! fmxml core library.
//!
//! Exposes a FileMaker database, reached through the XML Web Publishing
//! Engine, as servers, databases, layouts, records and portals. The heart of
//! the crate is the response pipeline: [`resultset::parse`] turns an
//! `fmresultset` document into a [`ParsedResponse`], classifying non-zero
//! error codes through [`errors::classify`] and coercing every datum into a
//! typed [`FieldValue`].
//!
//! # Example
//! ```
//! use fmxml::{ParseOptions, parse};
//!
//! let xml = br#"<fmresultset xmlns="http://www.filemaker.com/xml/fmresultset">
//!   <error code="0"/>
//!   <datasource database="Contacts" layout="Web" table="People" total-count="1"
//!     date-format="MM/dd/yyyy" time-format="HH:mm:ss" timestamp-format="MM/dd/yyyy HH:mm:ss"/>
//!   <metadata><field-definition name="Name" result="text" type="normal" max-repeat="1" global="no"/></metadata>
//!   <resultset count="1" fetch-size="1">
//!     <record record-id="12" mod-id="3"><field name="Name"><data>Bill</data></field></record>
//!   </resultset>
//! </fmresultset>"#;
//!
//! let response = parse(xml, &ParseOptions::new()).unwrap();
//! assert_eq!(response.records[0].record_id(), "12");
//! assert_eq!(response.records[0].text("name"), Some("Bill"));
//! ```

pub mod ci_map;
pub mod coerce;
pub mod config;
pub mod errors;
pub mod format;
pub mod meta;
pub mod record;
pub mod request;
pub mod resultset;
pub mod server;
pub mod transport;

pub use ci_map::CaseInsensitiveMap;
pub use coerce::{ContainerBase, FieldValue, coerce};
pub use config::ConnectionConfig;
pub use errors::*;
pub use format::{FormatSet, translate};
pub use meta::{EntryType, FieldMeta, ResultType};
pub use record::{FieldMetaMap, PortalMetaMap, Record, RecordTree, RecordValue};
pub use request::{Action, FindRequest, LogicalOperator, QueryOptions, Request, ScriptCall, SortOrder};
pub use resultset::{Datasource, ParseOptions, ParsedResponse, parse, parse_str};
pub use server::{Database, Layout, Server};
pub use transport::{RequestContext, Transport};
