//! End-to-end parsing of captured Web Publishing Engine responses.

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use fmxml::{
    ContainerBase, EntryType, ErrorFamily, ErrorKind, FieldValue, FmError, ParseOptions, ResultType, parse,
};
use bigdecimal::BigDecimal;

const PEOPLE: &str = include_str!("fixtures/people.xml");
const NO_RECORDS: &str = include_str!("fixtures/no_records.xml");
const FIELD_MISSING: &str = include_str!("fixtures/field_missing.xml");

fn options() -> ParseOptions {
    ParseOptions::new()
        .with_portals(true)
        .with_container(ContainerBase::new("https", "fm.example.com", 443))
}

#[test]
fn reads_counts_and_metadata() {
    let response = parse(PEOPLE.as_bytes(), &options()).expect("parse people");
    assert_eq!(response.total_count(), 250);
    assert_eq!(response.found_count, 2);
    assert_eq!(response.len(), 2);
    assert_eq!(response.datasource.table, "People");

    let phones = response.field_meta("phones").expect("phones meta");
    assert_eq!(phones.name, "Phones");
    assert_eq!(phones.max_repeats, 3);
    assert!(response.field_meta("gSession").unwrap().global);
    assert_eq!(response.field_meta("OrderCount").unwrap().entry, EntryType::Calculation);

    let orders = response.portal_meta("orders").expect("orders portal meta");
    assert_eq!(orders.get("Total").unwrap().result, ResultType::Number);
    assert!(orders.get("Orders::Total").is_none());
}

#[test]
fn coerces_every_result_type() {
    let response = parse(PEOPLE.as_bytes(), &options()).unwrap();
    let bill = &response.records[0];

    assert_eq!(bill.record_id(), "12");
    assert_eq!(bill.mod_id(), "3");
    assert_eq!(bill.get("Name").unwrap(), &"Bill");

    let balance = bill.get("Balance").unwrap().as_single().and_then(FieldValue::as_number);
    assert_eq!(balance, BigDecimal::from_str("123456789012345678901234567890.25").ok().as_ref());

    let born = bill.get("Born").unwrap().as_single().and_then(FieldValue::as_date);
    assert_eq!(born, NaiveDate::from_ymd_opt(1971, 2, 28));

    let alarm = bill.get("Alarm").unwrap().as_single().and_then(FieldValue::as_time);
    assert_eq!(alarm, NaiveTime::from_hms_opt(6, 45, 0));

    let modified = bill.get("Modified").unwrap().as_single().and_then(FieldValue::as_timestamp);
    assert_eq!(
        modified,
        NaiveDate::from_ymd_opt(2026, 10, 16).and_then(|d| d.and_hms_opt(8, 33, 10))
    );

    let photo = bill.get("Photo").unwrap().as_single().and_then(FieldValue::as_container).unwrap();
    assert_eq!(photo.host_str(), Some("fm.example.com"));
    assert_eq!(photo.path(), "/fmi/xml/cnt/bill.jpg");
    assert!(photo.query().unwrap().contains("-recid=12"));
}

#[test]
fn repeating_fields_keep_delivered_arity() {
    let response = parse(PEOPLE.as_bytes(), &options()).unwrap();

    let phones = response.records[0].get("Phones").unwrap().as_repeating().unwrap();
    assert_eq!(phones.len(), 3);
    assert_eq!(phones[0], Some(FieldValue::Text("555-0100".into())));
    assert_eq!(phones[1], Some(FieldValue::Text(String::new())));

    // Declared max-repeat is 3, but a single <data> is a scalar.
    assert_eq!(response.records[1].get("Phones").unwrap(), &"555-0111");
    // No <data> at all is null.
    assert!(response.records[1].get("gSession").unwrap().is_null());
}

#[test]
fn empty_data_is_null_except_for_text() {
    let response = parse(PEOPLE.as_bytes(), &options()).unwrap();
    let ann = &response.records[1];
    for field in ["Balance", "Born", "Alarm", "Modified", "Photo"] {
        assert!(ann.get(field).unwrap().is_null(), "{field} should be null");
    }
    assert_eq!(response.records[0].get("gSession").unwrap(), &"");
    assert_eq!(ann.text("name"), Some("Ann & Co"));
}

#[test]
fn portal_rows_strip_table_prefix() {
    let response = parse(PEOPLE.as_bytes(), &options()).unwrap();
    let orders = response.records[0].portal("Orders").expect("orders portal");
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].record_id(), "501");
    assert_eq!(
        orders[0].get("Total").unwrap().as_single().and_then(FieldValue::as_number),
        BigDecimal::from_str("19.99").ok().as_ref()
    );
    assert!(orders[1].get("Placed").unwrap().is_null());

    assert_eq!(response.records[1].portal("orders").map(<[_]>::len), Some(0));
}

#[test]
fn portals_are_ignored_when_not_requested() {
    let response = parse(PEOPLE.as_bytes(), &options().with_portals(false)).unwrap();
    assert!(response.records.iter().all(|record| record.portals().is_empty()));
    // Portal metadata is still reported.
    assert!(response.portal_meta("Orders").is_some());
}

#[test]
fn parsing_is_idempotent() {
    let first = parse(PEOPLE.as_bytes(), &options()).unwrap();
    let second = parse(PEOPLE.as_bytes(), &options()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn no_records_is_empty_by_default() {
    let response = parse(NO_RECORDS.as_bytes(), &ParseOptions::new()).unwrap();
    assert!(response.is_empty());
    assert_eq!(response.found_count, 0);
    assert_eq!(response.total_count(), 250);
}

#[test]
fn no_records_raises_when_configured() {
    let err = parse(NO_RECORDS.as_bytes(), &ParseOptions::new().with_raise_on_401(true)).unwrap_err();
    let fm = match err {
        FmError::FileMaker(fm) => fm,
        other => panic!("expected a FileMaker error, got {other:?}"),
    };
    assert_eq!(fm.kind(), ErrorKind::NoRecordsFound);
    assert_eq!(fm.code(), 401);
    assert!(fm.is(ErrorFamily::General));
}

#[test]
fn field_missing_carries_kind_and_code() {
    let err = parse(FIELD_MISSING.as_bytes(), &ParseOptions::new()).unwrap_err();
    let fm = err.as_filemaker().expect("filemaker error");
    assert_eq!(fm.kind(), ErrorKind::FieldMissing);
    assert!(fm.is(ErrorFamily::Missing));

    let message = err.to_string();
    assert!(message.contains("FieldMissing"));
    assert!(message.contains("102"));
    assert_eq!(message, "FieldMissing occurred: (FileMaker Error #102)");
}

#[test]
fn bad_datum_aborts_the_whole_response() {
    let broken = PEOPLE.replace("<data>02/28/1971</data>", "<data>1971-02-28</data>");
    let err = parse(broken.as_bytes(), &options()).unwrap_err();
    let coercion = match err {
        FmError::Coercion(coercion) => coercion,
        other => panic!("expected a coercion error, got {other:?}"),
    };
    assert_eq!(coercion.field, "Born");
    assert_eq!(coercion.value, "1971-02-28");
}

#[test]
fn serializes_records_as_plain_json() {
    let response = parse(PEOPLE.as_bytes(), &options()).unwrap();
    let json = serde_json::to_value(&response.records[0]).unwrap();
    assert_eq!(json["record_id"], "12");
    assert_eq!(json["fields"]["Name"], "Bill");
    assert_eq!(json["fields"]["Born"], "1971-02-28");
    assert_eq!(json["fields"]["Phones"][2], "555-0199");
    assert_eq!(json["portals"]["Orders"][1]["record_id"], "502");
    assert!(json["portals"]["Orders"][1]["fields"]["Placed"].is_null());
}
