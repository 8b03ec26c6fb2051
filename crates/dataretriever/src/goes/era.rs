//! Provider eras for GOES XRS data.
//!
//! Each era is one archive with one naming convention, valid over a window of
//! calendar days, with its own roster of satellites. Windows are inclusive
//! and stored as `(year, month, day)` tuples so the table stays `const`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar day as `(year, month, day)`; tuples order chronologically.
pub type Ymd = (i32, u32, u32);

fn ymd(date: NaiveDate) -> Ymd {
    (date.year(), date.month(), date.day())
}

/// Inclusive day window, open-ended when `last` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub first: Ymd,
    pub last: Option<Ymd>,
}

impl DateWindow {
    pub const fn new(first: Ymd, last: Ymd) -> Self {
        Self {
            first,
            last: Some(last),
        }
    }

    pub const fn open(first: Ymd) -> Self {
        Self { first, last: None }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        let d = ymd(date);
        d >= self.first && self.last.map_or(true, |last| d <= last)
    }

    /// True when any day in `[from, to]` falls inside the window.
    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        ymd(to) >= self.first && self.last.map_or(true, |last| ymd(from) <= last)
    }
}

/// Organisation serving an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    /// Solar Data Analysis Center (NASA GSFC), legacy FITS archive.
    Sdac,
    /// NOAA NCEI/NGDC, reprocessed NetCDF science products.
    Noaa,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Noaa, Provider::Sdac];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Sdac => "SDAC",
            Provider::Noaa => "NOAA",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Provider::Sdac => "The Solar Data Analysis Center.",
            Provider::Noaa => "The National Oceanic and Atmospheric Administration.",
        }
    }

    /// Lower ranks win when providers cover the same day.
    pub fn preference(&self) -> u8 {
        match self {
            Provider::Noaa => 0,
            Provider::Sdac => 1,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling cadence of an XRS product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    /// Full-cadence flux: 1 s for GOES-R, 2 s for GOES 13-15, 3 s before.
    Flx1s,
    /// One-minute averages.
    Avg1m,
}

impl Resolution {
    pub const ALL: [Resolution; 2] = [Resolution::Flx1s, Resolution::Avg1m];

    pub fn token(&self) -> &'static str {
        match self {
            Resolution::Flx1s => "flx1s",
            Resolution::Avg1m => "avg1m",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Resolution::Flx1s => {
                "High-cadence XRS measurements: 1s for GOES-R, 2s for GOES 13-15, 3s for GOES<13"
            }
            Resolution::Avg1m => "1-minute averages of XRS measurements",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Resolution::ALL
            .into_iter()
            .find(|r| r.token().eq_ignore_ascii_case(s.trim()))
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// Coverage of one satellite within an era's archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SatelliteWindow {
    pub satellite: u8,
    pub window: DateWindow,
}

const fn sat(satellite: u8, first: Ymd, last: Ymd) -> SatelliteWindow {
    SatelliteWindow {
        satellite,
        window: DateWindow::new(first, last),
    }
}

const fn sat_open(satellite: u8, first: Ymd) -> SatelliteWindow {
    SatelliteWindow {
        satellite,
        window: DateWindow::open(first),
    }
}

const SDAC_ROSTER: &[SatelliteWindow] = &[
    sat(2, (1981, 1, 1), (1983, 4, 30)),
    sat(5, (1983, 5, 2), (1984, 7, 31)),
    sat(6, (1983, 6, 1), (1994, 8, 18)),
    sat(7, (1994, 1, 1), (1996, 8, 13)),
    sat(8, (1996, 3, 21), (2003, 6, 18)),
    sat(9, (1997, 1, 1), (1998, 9, 8)),
    sat(10, (1998, 7, 10), (2009, 12, 1)),
    sat(11, (2006, 6, 20), (2008, 2, 15)),
    sat(12, (2002, 12, 13), (2007, 5, 8)),
    sat(13, (2006, 8, 1), (2006, 8, 1)),
    sat(14, (2009, 12, 2), (2010, 10, 4)),
    sat(15, (2010, 9, 1), (2020, 3, 3)),
];

// GOES-13 went dark 2012-09-23..2012-10-17; GOES-14 stood in for it.
const NCEI_ROSTER: &[SatelliteWindow] = &[
    sat(8, (1995, 1, 3), (2003, 6, 16)),
    sat(10, (1998, 7, 10), (2009, 12, 1)),
    sat(11, (2006, 6, 20), (2008, 2, 15)),
    sat(12, (2002, 12, 13), (2007, 5, 8)),
    sat(13, (2010, 4, 14), (2012, 9, 23)),
    sat(13, (2012, 10, 18), (2017, 12, 14)),
    sat(14, (2009, 12, 2), (2010, 10, 4)),
    sat(14, (2012, 9, 24), (2012, 10, 17)),
    sat(15, (2010, 9, 1), (2020, 3, 3)),
];

const GOESR_ROSTER: &[SatelliteWindow] = &[
    sat(16, (2017, 2, 7), (2025, 4, 6)),
    sat(17, (2018, 6, 1), (2023, 1, 10)),
    sat_open(18, (2022, 9, 1)),
    sat_open(19, (2025, 4, 7)),
];

/// How the date is spelled inside a filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateEncoding {
    /// `YYMMDD`
    TwoDigitYear,
    /// `YYYYMMDD`
    FourDigitYear,
}

impl DateEncoding {
    pub fn encode(&self, date: NaiveDate) -> String {
        match self {
            DateEncoding::TwoDigitYear => date.format("%y%m%d").to_string(),
            DateEncoding::FourDigitYear => date.format("%Y%m%d").to_string(),
        }
    }
}

/// Product naming inside the NetCDF archives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductNaming {
    pub prefix: &'static str,
    pub product: &'static str,
    pub version: &'static str,
}

/// One archive era.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProviderEra {
    /// SDAC FITS files named `goSSYYMMDD.fits`.
    SdacTwoDigitYear,
    /// SDAC FITS files named `goSSYYYYMMDD.fits`.
    SdacFourDigitYear,
    /// NCEI reprocessed science data for GOES 8-15.
    NceiReprocessed,
    /// NGDC science data for the GOES-R series.
    GoesR,
}

impl ProviderEra {
    /// Every era, in chronological order of first coverage.
    pub const ALL: [ProviderEra; 4] = [
        ProviderEra::SdacTwoDigitYear,
        ProviderEra::SdacFourDigitYear,
        ProviderEra::NceiReprocessed,
        ProviderEra::GoesR,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ProviderEra::SdacTwoDigitYear => "sdac-fits-yy",
            ProviderEra::SdacFourDigitYear => "sdac-fits-yyyy",
            ProviderEra::NceiReprocessed => "ncei-reprocessed",
            ProviderEra::GoesR => "goes-r",
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            ProviderEra::SdacTwoDigitYear | ProviderEra::SdacFourDigitYear => Provider::Sdac,
            ProviderEra::NceiReprocessed | ProviderEra::GoesR => Provider::Noaa,
        }
    }

    pub fn window(&self) -> DateWindow {
        match self {
            ProviderEra::SdacTwoDigitYear => DateWindow::new((1980, 1, 1), (1999, 1, 16)),
            ProviderEra::SdacFourDigitYear => DateWindow::new((1999, 1, 14), (2020, 3, 3)),
            ProviderEra::NceiReprocessed => DateWindow::new((2001, 3, 1), (2020, 3, 3)),
            ProviderEra::GoesR => DateWindow::open((2017, 2, 7)),
        }
    }

    pub fn roster(&self) -> &'static [SatelliteWindow] {
        match self {
            ProviderEra::SdacTwoDigitYear | ProviderEra::SdacFourDigitYear => SDAC_ROSTER,
            ProviderEra::NceiReprocessed => NCEI_ROSTER,
            ProviderEra::GoesR => GOESR_ROSTER,
        }
    }

    /// Cadences published by this era. Empty for single-product archives.
    pub fn resolutions(&self) -> &'static [Resolution] {
        match self {
            ProviderEra::SdacTwoDigitYear | ProviderEra::SdacFourDigitYear => &[],
            ProviderEra::NceiReprocessed | ProviderEra::GoesR => &Resolution::ALL,
        }
    }

    pub fn offers(&self, resolution: Resolution) -> bool {
        self.resolutions().contains(&resolution)
    }

    pub fn date_encoding(&self) -> DateEncoding {
        match self {
            ProviderEra::SdacTwoDigitYear => DateEncoding::TwoDigitYear,
            _ => DateEncoding::FourDigitYear,
        }
    }

    /// Path below the base URL, with `{placeholders}` filled per file.
    pub fn path_template(&self) -> &'static str {
        match self {
            ProviderEra::SdacTwoDigitYear | ProviderEra::SdacFourDigitYear => {
                "{year}/go{sat02}{date}.fits"
            }
            ProviderEra::NceiReprocessed => {
                "goes{sat02}/{prefix}-l2-{product}_science/{year}/{month}/sci_{prefix}-l2-{product}_g{sat02}_d{date}_v{version}.nc"
            }
            ProviderEra::GoesR => {
                "goes{sat}/l2/data/{prefix}-l2-{product}_science/{year}/{month}/sci_{prefix}-l2-{product}_g{sat}_d{date}_v{version}.nc"
            }
        }
    }

    pub fn product_naming(&self, satellite: u8, resolution: Resolution) -> Option<ProductNaming> {
        match (self, resolution) {
            (ProviderEra::NceiReprocessed, Resolution::Flx1s) => Some(ProductNaming {
                prefix: "gxrs",
                product: "irrad",
                version: if satellite >= 13 { "0-1-0" } else { "0-0-0" },
            }),
            (ProviderEra::NceiReprocessed, Resolution::Avg1m) => Some(ProductNaming {
                prefix: "xrsf",
                product: "avg1m",
                version: "1-0-0",
            }),
            (ProviderEra::GoesR, r) => Some(ProductNaming {
                prefix: "xrsf",
                product: r.token(),
                version: "2-2-0",
            }),
            _ => None,
        }
    }

    /// Satellites with coverage on `date`, ascending, without duplicates.
    pub fn satellites_on(&self, date: NaiveDate) -> Vec<u8> {
        let mut sats: Vec<u8> = self
            .roster()
            .iter()
            .filter(|w| w.window.contains(date))
            .map(|w| w.satellite)
            .collect();
        sats.sort_unstable();
        sats.dedup();
        sats
    }

    /// Full URL of one daily file.
    pub fn file_url(
        &self,
        base_url: &str,
        satellite: u8,
        date: NaiveDate,
        resolution: Option<Resolution>,
    ) -> String {
        let mut path = self
            .path_template()
            .replace("{year}", &format!("{:04}", date.year()))
            .replace("{month}", &format!("{:02}", date.month()))
            .replace("{date}", &self.date_encoding().encode(date))
            .replace("{sat02}", &format!("{:02}", satellite))
            .replace("{sat}", &satellite.to_string());

        if let Some(naming) = resolution.and_then(|r| self.product_naming(satellite, r)) {
            path = path
                .replace("{prefix}", naming.prefix)
                .replace("{product}", naming.product)
                .replace("{version}", naming.version);
        }

        format!("{}/{}", base_url.trim_end_matches('/'), path)
    }
}

impl std::fmt::Display for ProviderEra {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Every satellite number appearing in any roster, ascending.
pub fn known_satellites() -> Vec<u8> {
    let mut sats: Vec<u8> = ProviderEra::ALL
        .iter()
        .flat_map(|e| e.roster().iter().map(|w| w.satellite))
        .collect();
    sats.sort_unstable();
    sats.dedup();
    sats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_window_contains_inclusive() {
        let w = DateWindow::new((1999, 1, 14), (2020, 3, 3));
        assert!(w.contains(date(1999, 1, 14)));
        assert!(w.contains(date(2020, 3, 3)));
        assert!(!w.contains(date(2020, 3, 4)));
        assert!(!w.contains(date(1999, 1, 13)));
    }

    #[test]
    fn test_open_window() {
        let w = DateWindow::open((2017, 2, 7));
        assert!(w.contains(date(2099, 1, 1)));
        assert!(w.overlaps(date(2017, 1, 1), date(2017, 2, 7)));
        assert!(!w.overlaps(date(2017, 1, 1), date(2017, 2, 6)));
    }

    #[test]
    fn test_sdac_two_digit_url() {
        let url = ProviderEra::SdacTwoDigitYear.file_url(
            "https://umbra.nascom.nasa.gov/goes/fits",
            7,
            date(1995, 6, 3),
            None,
        );
        assert_eq!(url, "https://umbra.nascom.nasa.gov/goes/fits/1995/go07950603.fits");
    }

    #[test]
    fn test_sdac_four_digit_url() {
        let url = ProviderEra::SdacFourDigitYear.file_url(
            "https://umbra.nascom.nasa.gov/goes/fits/",
            15,
            date(2013, 10, 28),
            None,
        );
        assert_eq!(url, "https://umbra.nascom.nasa.gov/goes/fits/2013/go1520131028.fits");
    }

    #[test]
    fn test_ncei_irrad_versions() {
        let base = "https://www.ncei.noaa.gov/data/goes-space-environment-monitor/access/science/xrs";
        let g10 = ProviderEra::NceiReprocessed.file_url(base, 10, date(2008, 6, 2), Some(Resolution::Flx1s));
        assert_eq!(
            g10,
            format!("{base}/goes10/gxrs-l2-irrad_science/2008/06/sci_gxrs-l2-irrad_g10_d20080602_v0-0-0.nc")
        );
        let g13 = ProviderEra::NceiReprocessed.file_url(base, 13, date(2013, 10, 28), Some(Resolution::Flx1s));
        assert!(g13.ends_with("sci_gxrs-l2-irrad_g13_d20131028_v0-1-0.nc"));
    }

    #[test]
    fn test_goesr_url() {
        let base = "https://data.ngdc.noaa.gov/platforms/solar-space-observing-satellites/goes";
        let url = ProviderEra::GoesR.file_url(base, 16, date(2020, 8, 2), Some(Resolution::Flx1s));
        assert_eq!(
            url,
            format!("{base}/goes16/l2/data/xrsf-l2-flx1s_science/2020/08/sci_xrsf-l2-flx1s_g16_d20200802_v2-2-0.nc")
        );
    }

    #[test]
    fn test_goes13_outage_covered_by_goes14() {
        let era = ProviderEra::NceiReprocessed;
        assert_eq!(era.satellites_on(date(2012, 10, 4)), vec![14, 15]);
        assert_eq!(era.satellites_on(date(2013, 10, 28)), vec![13, 15]);
    }

    #[test]
    fn test_parse_tokens_case_insensitive() {
        assert_eq!(Resolution::parse("FLX1S"), Some(Resolution::Flx1s));
        assert_eq!(Resolution::parse("ctime"), None);
        assert_eq!(Provider::parse("sdac"), Some(Provider::Sdac));
    }

    #[test]
    fn test_known_satellites() {
        let sats = known_satellites();
        assert_eq!(sats.first(), Some(&2));
        assert_eq!(sats.last(), Some(&19));
        assert!(!sats.contains(&3));
    }
}
