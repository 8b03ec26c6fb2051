//! Local path templates for fetched files.
//!
//! Placeholders name response columns through [`path_format_key`]:
//! lower-cased, with anything not alphanumeric turned into `_`, so
//! `Start Time` is `{start_time}`. `{file}` is the last segment of the
//! row's URL.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};
use helio_common::{path_format_key, QueryResponseRow, Value};

/// Date format used when a time column lands in a path.
const PATH_DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    template: String,
}

impl PathTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if template.trim().is_empty() {
            bail!("Path template is empty");
        }
        if Path::new(&template).is_absolute() {
            bail!("Path template must be relative: {}", template);
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in the template, `{file}` excluded.
    pub fn placeholders(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut rest = self.template.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let name = &after[..close];
            if name != "file" {
                names.insert(name.to_string());
            }
            rest = &after[close + 1..];
        }
        names
    }

    /// Fail unless every placeholder is one of `keys`.
    pub fn check_keys(&self, keys: &BTreeSet<String>) -> Result<()> {
        let missing: Vec<String> = self.placeholders().difference(keys).cloned().collect();
        if !missing.is_empty() {
            bail!(
                "Path template {} uses placeholders not available for every result: {}",
                self.template,
                missing.join(", ")
            );
        }
        Ok(())
    }

    /// Expand the template for one row, below `root`.
    pub fn expand(&self, root: &Path, row: &QueryResponseRow) -> Result<PathBuf> {
        let url = row
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Row has no url column"))?;
        let file = url
            .rsplit('/')
            .next()
            .filter(|f| !f.is_empty())
            .ok_or_else(|| anyhow!("URL has no file name: {}", url))?;

        let mut path = self.template.replace("{file}", &sanitize(file));
        for (name, value) in row.cells() {
            let key = format!("{{{}}}", path_format_key(name));
            if path.contains(&key) {
                path = path.replace(&key, &sanitize(&render(value)));
            }
        }

        if let Some(start) = path.find('{') {
            let rest = &path[start..];
            let end = rest.find('}').map_or(rest.len(), |i| i + 1);
            bail!("Unknown placeholder {} in path template", &rest[..end]);
        }

        let relative = Path::new(&path);
        if relative
            .components()
            .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            bail!("Expanded path escapes the output directory: {}", path);
        }

        Ok(root.join(relative))
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Time(t) => t.format(PATH_DATE_FORMAT).to_string(),
        other => other.to_string(),
    }
}

// Column values never introduce directories.
fn sanitize(segment: &str) -> String {
    segment.replace(['/', '\\'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row() -> QueryResponseRow {
        QueryResponseRow::new()
            .with("Start Time", Utc.with_ymd_and_hms(2012, 10, 4, 0, 0, 0).unwrap())
            .with("Instrument", "XRS")
            .with("Provider", "NOAA")
            .with("SatelliteNumber", 15i64)
            .with(
                "url",
                "https://example.org/goes15/sci_xrsf-l2-avg1m_g15_d20121004_v1-0-0.nc",
            )
    }

    #[test]
    fn test_default_template() {
        let t = PathTemplate::new("{instrument}/{file}").unwrap();
        let path = t.expand(Path::new("/data"), &row()).unwrap();
        assert_eq!(
            path,
            PathBuf::from("/data/XRS/sci_xrsf-l2-avg1m_g15_d20121004_v1-0-0.nc")
        );
    }

    #[test]
    fn test_multi_word_and_time_columns() {
        let t = PathTemplate::new("{provider}/g{satellitenumber}/{start_time}/{file}").unwrap();
        let path = t.expand(Path::new("out"), &row()).unwrap();
        assert_eq!(
            path,
            PathBuf::from("out/NOAA/g15/20121004/sci_xrsf-l2-avg1m_g15_d20121004_v1-0-0.nc")
        );
    }

    #[test]
    fn test_punctuated_column_names() {
        let row = row().with("!excite!", "cat").with("01 wibble", "door");
        let t = PathTemplate::new("{_excite_}/{01_wibble}/{file}").unwrap();
        let path = t.expand(Path::new("out"), &row).unwrap();
        assert_eq!(
            path,
            PathBuf::from("out/cat/door/sci_xrsf-l2-avg1m_g15_d20121004_v1-0-0.nc")
        );
    }

    #[test]
    fn test_space_stripped_name_is_unknown() {
        let t = PathTemplate::new("{starttime}/{file}").unwrap();
        let err = t.expand(Path::new("out"), &row()).unwrap_err();
        assert!(err.to_string().contains("{starttime}"));
    }

    #[test]
    fn test_check_keys() {
        let t = PathTemplate::new("{provider}/{start_time}/{file}").unwrap();
        let names: Vec<String> = t.placeholders().into_iter().collect();
        assert_eq!(names, vec!["provider", "start_time"]);

        let keys: BTreeSet<String> = ["provider", "start_time", "url"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(t.check_keys(&keys).is_ok());

        let keys: BTreeSet<String> = ["provider".to_string()].into_iter().collect();
        let err = t.check_keys(&keys).unwrap_err();
        assert!(err.to_string().contains("start_time"));
    }

    #[test]
    fn test_unknown_placeholder() {
        let t = PathTemplate::new("{wavelength}/{file}").unwrap();
        let err = t.expand(Path::new("out"), &row()).unwrap_err();
        assert!(err.to_string().contains("{wavelength}"));
    }

    #[test]
    fn test_rejects_absolute_and_empty() {
        assert!(PathTemplate::new("/etc/{file}").is_err());
        assert!(PathTemplate::new("  ").is_err());
    }

    #[test]
    fn test_rejects_parent_dir() {
        let t = PathTemplate::new("../{file}").unwrap();
        assert!(t.expand(Path::new("out"), &row()).is_err());
    }

    #[test]
    fn test_row_without_url() {
        let t = PathTemplate::new("{file}").unwrap();
        let row = QueryResponseRow::new().with("Instrument", "XRS");
        assert!(t.expand(Path::new("out"), &row).is_err());
    }
}
