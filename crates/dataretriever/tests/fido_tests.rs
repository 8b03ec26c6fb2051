//! Tests for dispatch across registered clients.

use dataretriever::{ClientError, ClientResult, DataClient, Fido, RegisteredValues, XrsClientConfig};
use helio_common::{Attr, AttrKind, Query, QueryOr, QueryResponse, QueryResponseRow};
use test_utils::time_range;

/// Client serving a single instrument with one fixed file per query.
struct StaticClient {
    instrument: &'static str,
    fail: bool,
}

impl DataClient for StaticClient {
    fn name(&self) -> &str {
        "StaticClient"
    }

    fn description(&self) -> &str {
        "Serves one canned file."
    }

    fn info_url(&self) -> &str {
        "https://example.com/"
    }

    fn registered_values(&self) -> Vec<RegisteredValues> {
        vec![RegisteredValues::new(
            AttrKind::Instrument,
            [(self.instrument, "Canned instrument")],
        )]
    }

    fn can_handle_query(&self, attrs: &[Attr]) -> bool {
        attrs.iter().any(|a| {
            matches!(a, Attr::Instrument(name) if name.eq_ignore_ascii_case(self.instrument))
        })
    }

    fn search(&self, _attrs: &[Attr]) -> ClientResult<QueryResponse> {
        if self.fail {
            return Err(ClientError::cannot_handle(self.name(), "offline"));
        }
        let row = QueryResponseRow::new()
            .with("Instrument", self.instrument)
            .with("url", "https://example.com/canned.fits");
        Ok(QueryResponse::new(self.name(), vec![row]))
    }
}

fn xrs_query() -> Query {
    Query::new()
        .time(time_range!("2012/10/4", "2012/10/5"))
        .instrument("XRS")
}

// ============================================================================
// Dispatch
// ============================================================================

#[test]
fn test_default_clients_serve_xrs() {
    let fido = Fido::with_default_clients(XrsClientConfig::default());
    let unified = fido.search(&xrs_query()).unwrap();
    assert_eq!(unified.len(), 1);
    assert_eq!(unified.file_num(), 8);
    assert_eq!(unified.get(0).map(QueryResponse::client), Some("XRSClient"));
}

#[test]
fn test_no_client_for_unknown_instrument() {
    let fido = Fido::with_default_clients(XrsClientConfig::default());
    let query = Query::new()
        .time(time_range!("2012/10/4", "2012/10/5"))
        .instrument("EVE");
    let err = fido.search(&query).unwrap_err();
    assert!(matches!(err, ClientError::NoClient(_)));
}

#[test]
fn test_empty_registry() {
    let err = Fido::new().search(&xrs_query()).unwrap_err();
    assert!(matches!(err, ClientError::NoClient(_)));
}

#[test]
fn test_only_matching_clients_searched() {
    let mut fido = Fido::with_default_clients(XrsClientConfig::default());
    fido.register(Box::new(StaticClient {
        instrument: "EVE",
        fail: false,
    }));

    let unified = fido.search(&xrs_query()).unwrap();
    assert_eq!(unified.len(), 1);

    let eve = Query::new()
        .time(time_range!("2012/10/4", "2012/10/5"))
        .instrument("eve");
    let unified = fido.search(&eve).unwrap();
    assert_eq!(unified.file_num(), 1);
    assert_eq!(unified.rows().count(), 1);
}

#[test]
fn test_declining_client_skipped() {
    let mut fido = Fido::with_default_clients(XrsClientConfig::default());
    fido.register(Box::new(StaticClient {
        instrument: "XRS",
        fail: true,
    }));

    let unified = fido.search(&xrs_query()).unwrap();
    assert_eq!(unified.len(), 1);
    assert_eq!(unified.file_num(), 8);
}

#[test]
fn test_two_clients_both_answer() {
    let mut fido = Fido::with_default_clients(XrsClientConfig::default());
    fido.register(Box::new(StaticClient {
        instrument: "XRS",
        fail: false,
    }));

    let unified = fido.search(&xrs_query()).unwrap();
    assert_eq!(unified.len(), 2);
    assert_eq!(unified.file_num(), 9);
    let clients: Vec<&str> = unified.iter().map(QueryResponse::client).collect();
    assert_eq!(clients, vec!["XRSClient", "StaticClient"]);
}

#[test]
fn test_resolution_error_propagates() {
    let fido = Fido::with_default_clients(XrsClientConfig::default());
    let err = fido.search(&xrs_query().resolution("ctime")).unwrap_err();
    assert!(matches!(err, ClientError::InvalidResolution { .. }));
}

// ============================================================================
// Disjunctions
// ============================================================================

fn satellite_query(day: &str, satellite: u8) -> Query {
    Query::new()
        .time(time_range!(day, day))
        .instrument("XRS")
        .satellite(satellite)
}

#[test]
fn test_or_query_one_response_per_branch() {
    let fido = Fido::with_default_clients(XrsClientConfig::default());
    let first = satellite_query("2012/10/4", 15);
    let second = satellite_query("2005/4/27", 12);

    let unified = fido.search_any(&(first.clone() | second.clone())).unwrap();
    assert_eq!(unified.len(), 2);

    let alone_first = fido.search(&first).unwrap();
    let alone_second = fido.search(&second).unwrap();
    assert_eq!(unified.get(0), alone_first.get(0));
    assert_eq!(unified.get(1), alone_second.get(0));
    assert_eq!(
        unified.file_num(),
        alone_first.file_num() + alone_second.file_num()
    );
}

#[test]
fn test_or_query_fails_when_a_branch_is_unserved() {
    let fido = Fido::with_default_clients(XrsClientConfig::default());
    let eve = Query::new()
        .time(time_range!("2012/10/4", "2012/10/5"))
        .instrument("EVE");
    let err = fido.search_any(&(xrs_query() | eve)).unwrap_err();
    assert!(matches!(err, ClientError::NoClient(_)));

    let err = fido.search_any(&QueryOr::new()).unwrap_err();
    assert!(matches!(err, ClientError::NoClient(_)));
}

#[test]
fn test_unified_slicing() {
    let fido = Fido::with_default_clients(XrsClientConfig::default());
    let query: QueryOr = [12u8, 13, 15]
        .into_iter()
        .map(|sat| satellite_query("2009/6/1", sat))
        .collect();
    let unified = fido.search_any(&query).unwrap();
    assert_eq!(unified.len(), 3);

    assert_eq!(unified.slice(1..).len(), 2);
    assert_eq!(unified.slice(0..1).len(), 1);
    assert_eq!(unified.slice(1..).get(0), unified.get(1));
    assert_eq!(unified.slice(..=1).len(), 2);
    assert!(unified.slice(5..).is_empty());
    assert!(unified.slice(2..1).is_empty());

    let reversed = unified.reversed();
    assert_eq!(reversed.len(), unified.len());
    assert_eq!(reversed.get(0), unified.get(2));
    assert_eq!(reversed.get(2), unified.get(0));
}

#[test]
fn test_unified_path_format_keys() {
    let t1 = QueryResponse::new(
        "A",
        vec![QueryResponseRow::new()
            .with("Start Time", "2011/01/01")
            .with("!excite!", "cat")
            .with("01 wibble", "parsnip")],
    );
    let t2 = QueryResponse::new(
        "B",
        vec![QueryResponseRow::new()
            .with("End Time", "2011/01/01")
            .with("!excite!", "rabbit")],
    );

    let keys: Vec<String> = t1.path_format_keys().into_iter().collect();
    assert_eq!(keys, vec!["01_wibble", "_excite_", "start_time"]);

    let unified = dataretriever::UnifiedResponse::new(vec![t1, t2]);
    let keys: Vec<String> = unified.path_format_keys().into_iter().collect();
    assert_eq!(keys, vec!["_excite_"]);
    assert!(dataretriever::UnifiedResponse::default().path_format_keys().is_empty());
}

// ============================================================================
// Display
// ============================================================================

#[test]
fn test_unified_display() {
    let fido = Fido::with_default_clients(XrsClientConfig::default());
    let text = fido.search(&xrs_query()).unwrap().to_string();
    assert!(text.starts_with("Results from 1 Provider:"));
    assert!(text.contains("8 Results from the XRSClient:"));
    assert!(text.contains("SatelliteNumber"));
    assert!(!text.contains("Resolution"));
}

#[test]
fn test_registered_clients_listed() {
    let fido = Fido::with_default_clients(XrsClientConfig::default());
    let names: Vec<&str> = fido.clients().map(|c| c.name()).collect();
    assert_eq!(names, vec!["XRSClient"]);
}
