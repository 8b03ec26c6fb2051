//! GOES X-ray Sensor (XRS) client.
//!
//! Daily XRS flux files live in three archives whose coverage overlaps:
//!
//! - SDAC FITS files (1980-2020), in two filename conventions that overlap
//!   for a few days in January 1999
//! - NCEI reprocessed NetCDF for GOES 8-15 (2001-2020), at two cadences
//! - NGDC NetCDF for the GOES-R series (2017 onwards), at two cadences
//!
//! The client maps a query onto these archives without listing any remote
//! directory: coverage comes from the static era table in [`era`].

pub mod era;
pub mod query;
pub mod resolver;

use helio_common::{Attr, AttrKind, QueryResponse};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::client::{DataClient, RegisteredValues};
use crate::error::ClientResult;

pub use era::{DateWindow, Provider, ProviderEra, Resolution};
pub use query::XrsQuery;
pub use resolver::{resolve, ResolvedFile, COLUMNS, RESOLUTION_COLUMN};

pub const CLIENT_NAME: &str = "XRSClient";

pub const INSTRUMENTS: &[(&str, &str)] = &[
    ("GOES", "The Geostationary Operational Environmental Satellite Program."),
    ("XRS", "GOES X-ray Sensor"),
];

pub const SOURCE: (&str, &str) = ("NASA", "The National Aeronautics and Space Administration.");

pub const PHYSOBS: (&str, &str) = ("irradiance", "the flux of radiant energy per unit area.");

/// Archive hosts. Paths below them follow each era's naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XrsClientConfig {
    #[serde(default = "default_sdac_base_url")]
    pub sdac_base_url: String,
    #[serde(default = "default_ncei_base_url")]
    pub ncei_base_url: String,
    #[serde(default = "default_goesr_base_url")]
    pub goesr_base_url: String,
}

fn default_sdac_base_url() -> String {
    "https://umbra.nascom.nasa.gov/goes/fits".to_string()
}

fn default_ncei_base_url() -> String {
    "https://www.ncei.noaa.gov/data/goes-space-environment-monitor/access/science/xrs".to_string()
}

fn default_goesr_base_url() -> String {
    "https://data.ngdc.noaa.gov/platforms/solar-space-observing-satellites/goes".to_string()
}

impl Default for XrsClientConfig {
    fn default() -> Self {
        Self {
            sdac_base_url: default_sdac_base_url(),
            ncei_base_url: default_ncei_base_url(),
            goesr_base_url: default_goesr_base_url(),
        }
    }
}

/// Client for GOES XRS daily flux files.
#[derive(Debug, Clone, Default)]
pub struct XrsClient {
    config: XrsClientConfig,
}

impl XrsClient {
    pub fn new(config: XrsClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &XrsClientConfig {
        &self.config
    }

    /// Resolve attributes into typed file records.
    pub fn resolve_files(&self, attrs: &[Attr]) -> ClientResult<Vec<ResolvedFile>> {
        let query = XrsQuery::from_attrs(attrs)?;
        resolve(&query, &self.config)
    }
}

impl DataClient for XrsClient {
    fn name(&self) -> &str {
        CLIENT_NAME
    }

    fn description(&self) -> &str {
        "Provides access to several GOES XRS irradiance datasets."
    }

    fn info_url(&self) -> &str {
        "https://www.ncei.noaa.gov/"
    }

    fn registered_values(&self) -> Vec<RegisteredValues> {
        vec![
            RegisteredValues::new(AttrKind::Instrument, INSTRUMENTS.iter().copied()),
            RegisteredValues::new(AttrKind::Physobs, [PHYSOBS]),
            RegisteredValues::new(AttrKind::Source, [SOURCE]),
            RegisteredValues::new(
                AttrKind::Provider,
                Provider::ALL.iter().map(|p| (p.as_str(), p.description())),
            ),
            RegisteredValues::new(
                AttrKind::SatelliteNumber,
                era::known_satellites()
                    .into_iter()
                    .map(|n| (n.to_string(), format!("GOES Satellite Number {}", n))),
            ),
            RegisteredValues::new(
                AttrKind::Resolution,
                Resolution::ALL.iter().map(|r| (r.token(), r.description())),
            ),
        ]
    }

    /// Needs an explicit instrument even though `search` defaults to XRS.
    fn can_handle_query(&self, attrs: &[Attr]) -> bool {
        if !attrs.iter().any(|a| matches!(a, Attr::Instrument(_))) {
            return false;
        }
        match XrsQuery::from_attrs(attrs) {
            Ok(_) => true,
            Err(e) => !e.is_cannot_handle(),
        }
    }

    #[instrument(skip_all, fields(client = CLIENT_NAME))]
    fn search(&self, attrs: &[Attr]) -> ClientResult<QueryResponse> {
        let files = self.resolve_files(attrs)?;
        info!(count = files.len(), "Resolved XRS files");

        let rows = files.iter().map(ResolvedFile::to_row).collect();
        Ok(QueryResponse::new(CLIENT_NAME, rows)
            .with_columns(COLUMNS.iter().copied())
            .with_hidden_columns([RESOLUTION_COLUMN]))
    }
}

impl std::fmt::Display for XrsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
