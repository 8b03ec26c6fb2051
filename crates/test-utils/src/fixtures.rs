//! Common test fixtures for helio-fetch tests.
//!
//! Reference queries pin down archive layout: file counts and the first and
//! last URLs each query must resolve to.

pub const SDAC_BASE: &str = "https://umbra.nascom.nasa.gov/goes/fits";
pub const NCEI_BASE: &str =
    "https://www.ncei.noaa.gov/data/goes-space-environment-monitor/access/science/xrs";
pub const GOESR_BASE: &str =
    "https://data.ngdc.noaa.gov/platforms/solar-space-observing-satellites/goes";

/// An XRS query with its known answer.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceQuery {
    pub name: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    pub satellite: Option<u8>,
    pub resolution: Option<&'static str>,
    pub provider: Option<&'static str>,
    pub expected_count: usize,
    /// Path below the archive base, if pinned.
    pub first_path: Option<(&'static str, &'static str)>,
    pub last_path: Option<(&'static str, &'static str)>,
}

const fn reference(name: &'static str, start: &'static str, end: &'static str, count: usize) -> ReferenceQuery {
    ReferenceQuery {
        name,
        start,
        end,
        satellite: None,
        resolution: None,
        provider: None,
        expected_count: count,
        first_path: None,
        last_path: None,
    }
}

impl ReferenceQuery {
    pub fn first_url(&self) -> Option<String> {
        self.first_path.map(|(base, path)| format!("{}/{}", base, path))
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_path.map(|(base, path)| format!("{}/{}", base, path))
    }
}

pub const REFERENCE_QUERIES: &[ReferenceQuery] = &[
    ReferenceQuery {
        first_path: Some((NCEI_BASE, "goes14/gxrs-l2-irrad_science/2012/10/sci_gxrs-l2-irrad_g14_d20121004_v0-1-0.nc")),
        last_path: Some((NCEI_BASE, "goes15/xrsf-l2-avg1m_science/2012/10/sci_xrsf-l2-avg1m_g15_d20121005_v1-0-0.nc")),
        ..reference("two_days_2012", "2012/10/4", "2012/10/5", 8)
    },
    ReferenceQuery {
        first_path: Some((SDAC_BASE, "1995/go07950603.fits")),
        last_path: Some((SDAC_BASE, "1995/go07950605.fits")),
        ..reference("sdac_two_digit_1995", "1995/06/03 1:00", "1995/06/05", 3)
    },
    ReferenceQuery {
        satellite: Some(10),
        first_path: Some((SDAC_BASE, "1999/go10990110.fits")),
        last_path: Some((SDAC_BASE, "1999/go1019990120.fits")),
        ..reference("sdac_naming_overlap_1999", "1999/01/10 00:10", "1999/01/20", 14)
    },
    ReferenceQuery {
        first_path: Some((NCEI_BASE, "goes10/gxrs-l2-irrad_science/2009/08/sci_gxrs-l2-irrad_g10_d20090830_v0-0-0.nc")),
        last_path: Some((NCEI_BASE, "goes10/xrsf-l2-avg1m_science/2009/09/sci_xrsf-l2-avg1m_g10_d20090902_v1-0-0.nc")),
        ..reference("provider_overlap_2009", "2009/08/30 00:10", "2009/09/02", 8)
    },
    ReferenceQuery {
        first_path: Some((NCEI_BASE, "goes10/gxrs-l2-irrad_science/2008/06/sci_gxrs-l2-irrad_g10_d20080602_v0-0-0.nc")),
        last_path: Some((NCEI_BASE, "goes10/xrsf-l2-avg1m_science/2008/06/sci_xrsf-l2-avg1m_g10_d20080604_v1-0-0.nc")),
        ..reference("ncei_2008", "2008/06/02 12:00", "2008/06/04", 6)
    },
    ReferenceQuery {
        first_path: Some((GOESR_BASE, "goes16/l2/data/xrsf-l2-flx1s_science/2020/08/sci_xrsf-l2-flx1s_g16_d20200802_v2-2-0.nc")),
        last_path: Some((GOESR_BASE, "goes17/l2/data/xrsf-l2-avg1m_science/2020/08/sci_xrsf-l2-avg1m_g17_d20200804_v2-2-0.nc")),
        ..reference("goesr_2020", "2020/08/02", "2020/08/04", 12)
    },
    ReferenceQuery {
        provider: Some("SDAC"),
        first_path: Some((SDAC_BASE, "2013/go1520131028.fits")),
        ..reference("sdac_only_2013", "2013/10/28", "2013/10/29", 2)
    },
    ReferenceQuery {
        first_path: Some((NCEI_BASE, "goes13/gxrs-l2-irrad_science/2013/10/sci_gxrs-l2-irrad_g13_d20131028_v0-1-0.nc")),
        ..reference("reprocessed_2013", "2013/10/28", "2013/10/29", 8)
    },
    reference("few_hours_2013", "2013-10-28 01:00", "2013-10-28 03:00", 4),
    ReferenceQuery {
        resolution: Some("flx1s"),
        ..reference("flx1s_2012", "2012/10/4 20:20", "2012/10/4 21:00", 2)
    },
    ReferenceQuery {
        resolution: Some("avg1m"),
        ..reference("avg1m_2012", "2012/10/4 20:20", "2012/10/4 21:00", 2)
    },
    ReferenceQuery {
        resolution: Some("flx1s"),
        ..reference("flx1s_2021", "2021/10/4 20:20", "2021/10/4 21:00", 2)
    },
    ReferenceQuery {
        satellite: Some(15),
        ..reference("goes15_2017", "2017/01/01 2:00", "2017/01/02 2:10", 4)
    },
    ReferenceQuery {
        satellite: Some(13),
        ..reference("goes13_2017", "2017/01/01", "2017/01/02 23:00", 4)
    },
    ReferenceQuery {
        satellite: Some(8),
        ..reference("goes8_1999", "1999/1/13", "1999/1/16", 7)
    },
    reference("half_day_2005", "2005/4/27", "2005/4/27 12:00", 4),
    reference("sdac_1983", "1983/06/17", "1983/06/18", 4),
];

/// Look up a reference query by name.
pub fn reference_query(name: &str) -> ReferenceQuery {
    match REFERENCE_QUERIES.iter().find(|q| q.name == name) {
        Some(q) => *q,
        None => panic!("no reference query named {:?}", name),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_names_unique() {
        for (i, q) in REFERENCE_QUERIES.iter().enumerate() {
            assert!(
                REFERENCE_QUERIES[i + 1..].iter().all(|other| other.name != q.name),
                "duplicate reference query {}",
                q.name
            );
        }
        assert_eq!(reference_query("two_days_2012").expected_count, 8);
    }
}
