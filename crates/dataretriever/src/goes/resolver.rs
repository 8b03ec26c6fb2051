//! Resolution of an XRS query into daily files.

use chrono::NaiveDate;
use helio_common::{QueryResponseRow, TimeRange};
use serde::Serialize;
use tracing::{debug, instrument};

use super::era::{Provider, ProviderEra, Resolution};
use super::query::XrsQuery;
use super::{XrsClientConfig, PHYSOBS, SOURCE};
use crate::error::{ClientError, ClientResult};

/// Column hidden from default table views.
pub const RESOLUTION_COLUMN: &str = "Resolution";

/// Columns of every row, in order.
pub const COLUMNS: &[&str] = &[
    "Start Time",
    "End Time",
    "Instrument",
    "Physobs",
    "Source",
    "Provider",
    "SatelliteNumber",
    "url",
    RESOLUTION_COLUMN,
];

/// One daily file with its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
    pub time_range: TimeRange,
    pub instrument: String,
    pub satellite: u8,
    pub provider: Provider,
    pub era: ProviderEra,
    pub resolution: Option<Resolution>,
    pub url: String,
}

impl ResolvedFile {
    /// Ordering key: start time, provider preference, era, satellite,
    /// cadence, URL.
    fn sort_key(&self) -> (chrono::DateTime<chrono::Utc>, u8, u8, u8, u8, &str) {
        (
            self.time_range.start(),
            self.provider.preference(),
            era_rank(self.era),
            self.satellite,
            self.resolution.map_or(0, |r| r as u8 + 1),
            &self.url,
        )
    }

    pub fn to_row(&self) -> QueryResponseRow {
        QueryResponseRow::new()
            .with("Start Time", self.time_range.start())
            .with("End Time", self.time_range.end())
            .with("Instrument", self.instrument.as_str())
            .with("Physobs", PHYSOBS.0)
            .with("Source", SOURCE.0)
            .with("Provider", self.provider.as_str())
            .with("SatelliteNumber", i64::from(self.satellite))
            .with("url", self.url.as_str())
            .with(
                RESOLUTION_COLUMN,
                self.resolution.map(|r| r.token()).unwrap_or(""),
            )
    }
}

/// Eras of one provider keep chronological order among themselves.
fn era_rank(era: ProviderEra) -> u8 {
    ProviderEra::ALL
        .iter()
        .position(|e| *e == era)
        .map_or(u8::MAX, |p| p as u8)
}

fn base_url(config: &XrsClientConfig, era: ProviderEra) -> &str {
    match era {
        ProviderEra::SdacTwoDigitYear | ProviderEra::SdacFourDigitYear => &config.sdac_base_url,
        ProviderEra::NceiReprocessed => &config.ncei_base_url,
        ProviderEra::GoesR => &config.goesr_base_url,
    }
}

/// Eras allowed by the provider filter with any coverage inside the range.
fn active_eras(query: &XrsQuery) -> Vec<ProviderEra> {
    let first = query.time_range.start().date_naive();
    let last = query.time_range.end().date_naive();
    ProviderEra::ALL
        .into_iter()
        .filter(|e| query.provider.map_or(true, |p| e.provider() == p))
        .filter(|e| e.window().overlaps(first, last))
        .collect()
}

/// Check the requested cadence against the active eras.
///
/// Returns the cadences to enumerate per era: `None` enumerates everything
/// an era offers.
fn requested_resolution(
    query: &XrsQuery,
    eras: &[ProviderEra],
) -> ClientResult<Option<Resolution>> {
    let Some(token) = query.resolution_token.as_deref() else {
        return Ok(None);
    };

    let mut available: Vec<Resolution> = eras
        .iter()
        .flat_map(|e| e.resolutions().iter().copied())
        .collect();
    available.sort_unstable();
    available.dedup();

    match query.resolution {
        Some(r) if available.contains(&r) => Ok(Some(r)),
        _ => Err(ClientError::InvalidResolution {
            requested: token.to_string(),
            range: query.time_range.to_string(),
            available: if available.is_empty() {
                "none".to_string()
            } else {
                available
                    .iter()
                    .map(|r| r.token())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        }),
    }
}

fn files_for_day(
    query: &XrsQuery,
    config: &XrsClientConfig,
    eras: &[ProviderEra],
    resolution: Option<Resolution>,
    day: NaiveDate,
) -> Vec<ResolvedFile> {
    let mut files = Vec::new();

    for era in eras.iter().filter(|e| e.window().contains(day)) {
        let cadences: Vec<Option<Resolution>> = match resolution {
            Some(r) if era.offers(r) => vec![Some(r)],
            Some(_) => continue,
            None if era.resolutions().is_empty() => vec![None],
            None => era.resolutions().iter().copied().map(Some).collect(),
        };

        for satellite in era.satellites_on(day) {
            if query.satellite.map_or(false, |s| s != satellite) {
                continue;
            }
            for cadence in &cadences {
                files.push(ResolvedFile {
                    time_range: TimeRange::whole_day(day),
                    instrument: query.instrument.clone(),
                    satellite,
                    provider: era.provider(),
                    era: *era,
                    resolution: *cadence,
                    url: era.file_url(base_url(config, *era), satellite, day, *cadence),
                });
            }
        }
    }

    // Keep only the most preferred provider's files for this day.
    if let Some(best) = files.iter().map(|f| f.provider.preference()).min() {
        let before = files.len();
        files.retain(|f| f.provider.preference() == best);
        if files.len() < before {
            debug!(
                day = %day,
                dropped = before - files.len(),
                "Dropped files superseded by reprocessed data"
            );
        }
    }

    files
}

/// Enumerate the daily files covering a query, sorted by start time.
///
/// Overlapping eras of one provider are all enumerated. When different
/// providers cover the same day, only the preferred provider's files are
/// kept for that day.
#[instrument(skip_all, fields(range = %query.time_range, instrument = %query.instrument))]
pub fn resolve(query: &XrsQuery, config: &XrsClientConfig) -> ClientResult<Vec<ResolvedFile>> {
    let eras = active_eras(query);
    let resolution = requested_resolution(query, &eras)?;

    debug!(
        eras = ?eras.iter().map(|e| e.label()).collect::<Vec<_>>(),
        resolution = ?resolution,
        "Selected provider eras"
    );

    let mut files: Vec<ResolvedFile> = query
        .time_range
        .days()
        .flat_map(|day| files_for_day(query, config, &eras, resolution, day))
        .collect();

    files.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use helio_common::Attr;

    fn query(start: &str, end: &str, extra: Vec<Attr>) -> XrsQuery {
        let mut attrs = vec![
            Attr::Time(TimeRange::parse(start, end).unwrap()),
            Attr::Instrument("XRS".into()),
        ];
        attrs.extend(extra);
        XrsQuery::from_attrs(&attrs).unwrap()
    }

    #[test]
    fn test_active_eras_respect_provider() {
        let q = query("2013/10/28", "2013/10/29", vec![Attr::Provider("SDAC".into())]);
        assert_eq!(active_eras(&q), vec![ProviderEra::SdacFourDigitYear]);
    }

    #[test]
    fn test_active_eras_at_goesr_boundary() {
        let q = query("2017/02/06", "2017/02/07", vec![]);
        assert!(active_eras(&q).contains(&ProviderEra::GoesR));
        let q = query("2017/02/05", "2017/02/06", vec![]);
        assert!(!active_eras(&q).contains(&ProviderEra::GoesR));
    }

    #[test]
    fn test_invalid_resolution_lists_available() {
        let q = query("2012/10/4 20:20", "2012/10/4 21:00", vec![Attr::Resolution("ctime".into())]);
        match resolve(&q, &XrsClientConfig::default()) {
            Err(ClientError::InvalidResolution { requested, available, .. }) => {
                assert_eq!(requested, "ctime");
                assert_eq!(available, "flx1s, avg1m");
            }
            other => panic!("expected InvalidResolution, got {:?}", other),
        }
    }

    #[test]
    fn test_sdac_only_range_has_no_resolutions() {
        let q = query("1995/06/03", "1995/06/04", vec![Attr::Resolution("avg1m".into())]);
        match resolve(&q, &XrsClientConfig::default()) {
            Err(ClientError::InvalidResolution { available, .. }) => assert_eq!(available, "none"),
            other => panic!("expected InvalidResolution, got {:?}", other),
        }
    }

    #[test]
    fn test_row_columns() {
        let q = query("2016/1/1", "2016/1/1 12:00", vec![Attr::SatelliteNumber(15)]);
        let files = resolve(&q, &XrsClientConfig::default()).unwrap();
        let row = files[0].to_row();
        let cols: Vec<&str> = row.colnames().collect();
        assert_eq!(cols, COLUMNS);
        assert_eq!(row["Provider"].as_str(), Some("NOAA"));
        assert_eq!(row["Resolution"].as_str(), Some("flx1s"));
    }
}
