//! Tabular query responses.
//!
//! A [`QueryResponse`] is an ordered list of rows, each an ordered set of
//! named cells. Clients decide which columns they emit and may declare them
//! up front, so an empty response still knows its table layout.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::{HelioError, HelioResult};

/// Display format for time cells.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Placeholder name for a column in a download path template.
///
/// Lower-cased, with every character that is not ASCII alphanumeric
/// replaced by `_`: `Start Time` becomes `start_time`.
pub fn path_format_key(column: &str) -> String {
    column
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Time(DateTime<Utc>),
    Int(i64),
    Text(String),
}

impl Value {
    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Time(t) => Some(*t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Time(t) => write!(f, "{}", t.format(TIME_FORMAT)),
            Value::Int(i) => write!(f, "{}", i),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(t: DateTime<Utc>) -> Self {
        Value::Time(t)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Time(t) => serializer.serialize_str(&t.format(TIME_FORMAT).to_string()),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// One row of a response; cells keep insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponseRow {
    cells: Vec<(String, Value)>,
}

impl QueryResponseRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cell, replacing any existing cell with the same name in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(n, _)| *n == name) {
            Some(cell) => cell.1 = value,
            None => self.cells.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn colnames(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(n, _)| n.as_str())
    }

    pub fn cells(&self) -> &[(String, Value)] {
        &self.cells
    }
}

impl std::ops::Index<&str> for QueryResponseRow {
    type Output = Value;

    fn index(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(v) => v,
            None => panic!("no column named {:?} in row", name),
        }
    }
}

impl Serialize for QueryResponseRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (name, value) in &self.cells {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Rows returned by one client for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResponse {
    client: String,
    rows: Vec<QueryResponseRow>,
    #[serde(skip)]
    columns: Vec<String>,
    #[serde(skip)]
    hidden: Vec<String>,
}

impl QueryResponse {
    pub fn new(client: impl Into<String>, rows: Vec<QueryResponseRow>) -> Self {
        Self {
            client: client.into(),
            rows,
            columns: Vec::new(),
            hidden: Vec::new(),
        }
    }

    /// Declare the client's column layout, independent of the rows present.
    pub fn with_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = names.into_iter().map(Into::into).collect();
        self
    }

    /// Columns left out of [`QueryResponse::show`] unless named explicitly.
    pub fn with_hidden_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn client(&self) -> &str {
        &self.client
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[QueryResponseRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryResponseRow> {
        self.rows.iter()
    }

    pub fn get(&self, index: usize) -> HelioResult<&QueryResponseRow> {
        self.rows.get(index).ok_or(HelioError::RowOutOfRange {
            index,
            len: self.rows.len(),
        })
    }

    pub fn first(&self) -> Option<&QueryResponseRow> {
        self.rows.first()
    }

    pub fn last(&self) -> Option<&QueryResponseRow> {
        self.rows.last()
    }

    /// All column names, hidden ones included: declared columns first, then
    /// any other names the rows carry in first-seen order.
    pub fn colnames(&self) -> Vec<String> {
        let mut names = self.columns.clone();
        for row in &self.rows {
            for name in row.colnames() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// Values of one column, top to bottom.
    pub fn column(&self, name: &str) -> HelioResult<Vec<&Value>> {
        if !self.colnames().iter().any(|n| n == name) {
            return Err(HelioError::UnknownColumn(name.to_string()));
        }
        Ok(self.rows.iter().filter_map(|r| r.get(name)).collect())
    }

    /// Table view over a column subset.
    ///
    /// With no names, every non-hidden column is shown. Named columns appear
    /// in the order given; an unknown name is an error.
    pub fn show(&self, names: &[&str]) -> HelioResult<ResponseTable> {
        let all = self.colnames();
        let colnames: Vec<String> = if names.is_empty() {
            all.into_iter()
                .filter(|n| !self.hidden.contains(n))
                .collect()
        } else {
            for name in names {
                if !all.iter().any(|n| n == name) {
                    return Err(HelioError::UnknownColumn(name.to_string()));
                }
            }
            names.iter().map(|n| n.to_string()).collect()
        };

        let rows = self
            .rows
            .iter()
            .map(|row| {
                colnames
                    .iter()
                    .map(|c| row.get(c).cloned().unwrap_or_else(|| Value::Text(String::new())))
                    .collect()
            })
            .collect();

        Ok(ResponseTable { colnames, rows })
    }

    /// Placeholders a path template may use for rows of this response.
    pub fn path_format_keys(&self) -> BTreeSet<String> {
        self.colnames().iter().map(|n| path_format_key(n)).collect()
    }

    /// Same rows in reverse order.
    pub fn reversed(&self) -> Self {
        let mut out = self.clone();
        out.rows.reverse();
        out
    }
}

impl<'a> IntoIterator for &'a QueryResponse {
    type Item = &'a QueryResponseRow;
    type IntoIter = std::slice::Iter<'a, QueryResponseRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl std::fmt::Display for QueryResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{} Results from the {}:", self.rows.len(), self.client)?;
        match self.show(&[]) {
            Ok(table) => write!(f, "{}", table),
            Err(_) => Ok(()),
        }
    }
}

/// Materialised column subset of a [`QueryResponse`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseTable {
    colnames: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl ResponseTable {
    pub fn colnames(&self) -> &[String] {
        &self.colnames
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.colnames.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    pub fn cell(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.colnames.iter().position(|c| c == name)?;
        self.rows.get(row).map(|r| &r[idx])
    }
}

impl std::fmt::Display for ResponseTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| r.iter().map(|v| v.to_string()).collect())
            .collect();

        let widths: Vec<usize> = self
            .colnames
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rendered
                    .iter()
                    .map(|r| r[i].len())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header: Vec<String> = self
            .colnames
            .iter()
            .zip(&widths)
            .map(|(n, w)| format!("{:>w$}", n, w = w))
            .collect();
        writeln!(f, "{}", header.join(" "))?;

        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        writeln!(f, "{}", rule.join(" "))?;

        for row in rendered {
            let line: Vec<String> = row
                .iter()
                .zip(&widths)
                .map(|(v, w)| format!("{:>w$}", v, w = w))
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
