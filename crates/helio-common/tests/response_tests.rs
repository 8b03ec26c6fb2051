//! Tests for query responses and their table views.

use chrono::{TimeZone, Utc};
use helio_common::response::{QueryResponse, QueryResponseRow, Value};
use helio_common::{HelioError, TimeRange};

fn goes_row() -> QueryResponseRow {
    QueryResponseRow::new()
        .with("Start Time", Utc.with_ymd_and_hms(2016, 1, 1, 0, 0, 0).unwrap())
        .with("End Time", Utc.with_ymd_and_hms(2016, 1, 1, 23, 59, 59).unwrap())
        .with("Instrument", "GOES")
        .with("Physobs", "irradiance")
        .with("Source", "GOES")
        .with("Provider", "NOAA")
        .with("SatelliteNumber", 15i64)
        .with(
            "url",
            "https://umbra.nascom.nasa.gov/goes/fits/2016/go1520160101.fits",
        )
}

// ============================================================================
// show() tests
// ============================================================================

#[test]
fn test_show_all_columns() {
    let qr = QueryResponse::new("XRSClient", vec![goes_row()]);
    let table = qr.show(&[]).unwrap();
    let expected = [
        "Start Time",
        "End Time",
        "Instrument",
        "Physobs",
        "Source",
        "Provider",
        "SatelliteNumber",
        "url",
    ];
    assert_eq!(table.colnames(), expected);
    assert_eq!(table.cell(0, "Instrument"), Some(&Value::from("GOES")));
}

#[test]
fn test_show_subset_keeps_requested_order() {
    let qr = QueryResponse::new("XRSClient", vec![goes_row()]);
    let table = qr.show(&["Start Time", "Instrument"]).unwrap();
    assert_eq!(table.colnames(), ["Start Time", "Instrument"]);

    let reversed = qr.show(&["Instrument", "Start Time"]).unwrap();
    assert_eq!(reversed.colnames(), ["Instrument", "Start Time"]);
}

#[test]
fn test_show_empty_response() {
    let qr = QueryResponse::new("XRSClient", Vec::new());
    let table = qr.show(&[]).unwrap();
    assert!(table.is_empty());
    assert!(table.colnames().is_empty());
}

// ============================================================================
// column access tests
// ============================================================================

#[test]
fn test_column_values() {
    let mut second = goes_row();
    second.set("SatelliteNumber", 13i64);
    let qr = QueryResponse::new("XRSClient", vec![goes_row(), second]);

    let sats: Vec<i64> = qr
        .column("SatelliteNumber")
        .unwrap()
        .into_iter()
        .filter_map(Value::as_int)
        .collect();
    assert_eq!(sats, vec![15, 13]);
}

#[test]
fn test_column_unknown() {
    let qr = QueryResponse::new("XRSClient", vec![goes_row()]);
    assert!(matches!(qr.column("Wavelength"), Err(HelioError::UnknownColumn(_))));
}

#[test]
fn test_get_out_of_range() {
    let qr = QueryResponse::new("XRSClient", vec![goes_row()]);
    assert!(qr.get(0).is_ok());
    assert!(matches!(qr.get(1), Err(HelioError::RowOutOfRange { index: 1, len: 1 })));
}

#[test]
fn test_display_header_mentions_client() {
    let qr = QueryResponse::new("XRSClient", vec![goes_row()]);
    let text = qr.to_string();
    assert!(text.starts_with("1 Results from the XRSClient:"));
    assert!(text.contains("2016-01-01 00:00:00.000"));
}

// ============================================================================
// TimeRange tests
// ============================================================================

#[test]
fn test_time_range_intersects() {
    let a = TimeRange::parse("2012/10/4", "2012/10/5").unwrap();
    let b = TimeRange::parse("2012/10/5", "2012/10/6").unwrap();
    let c = TimeRange::parse("2012/10/6 00:00:01", "2012/10/7").unwrap();
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
}

#[test]
fn test_time_range_days_span_month() {
    let tr = TimeRange::parse("2009/08/30 00:10", "2009/09/02").unwrap();
    let days: Vec<String> = tr.days().map(|d| d.format("%Y%m%d").to_string()).collect();
    assert_eq!(days, vec!["20090830", "20090831", "20090901", "20090902"]);
}
