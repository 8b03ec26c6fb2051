//! Query attributes.
//!
//! A [`Query`] is a conjunction of attributes. Clients inspect the
//! attributes to decide whether they can serve the query and how to resolve
//! it. Queries joined with `|` form a [`QueryOr`], whose branches are
//! searched independently.

use serde::{Deserialize, Serialize};

use crate::time::TimeRange;

/// Kinds of attribute a query may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttrKind {
    Time,
    Instrument,
    SatelliteNumber,
    Resolution,
    Provider,
    Source,
    Physobs,
}

impl AttrKind {
    pub fn name(&self) -> &'static str {
        match self {
            AttrKind::Time => "Time",
            AttrKind::Instrument => "Instrument",
            AttrKind::SatelliteNumber => "SatelliteNumber",
            AttrKind::Resolution => "Resolution",
            AttrKind::Provider => "Provider",
            AttrKind::Source => "Source",
            AttrKind::Physobs => "Physobs",
        }
    }
}

impl std::fmt::Display for AttrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single query attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum Attr {
    Time(TimeRange),
    Instrument(String),
    SatelliteNumber(u8),
    /// Cadence token such as `flx1s` or `avg1m`; validated by the client.
    Resolution(String),
    Provider(String),
    Source(String),
    Physobs(String),
}

impl Attr {
    pub fn kind(&self) -> AttrKind {
        match self {
            Attr::Time(_) => AttrKind::Time,
            Attr::Instrument(_) => AttrKind::Instrument,
            Attr::SatelliteNumber(_) => AttrKind::SatelliteNumber,
            Attr::Resolution(_) => AttrKind::Resolution,
            Attr::Provider(_) => AttrKind::Provider,
            Attr::Source(_) => AttrKind::Source,
            Attr::Physobs(_) => AttrKind::Physobs,
        }
    }

    /// Value rendered the way registries list it.
    pub fn value_string(&self) -> String {
        match self {
            Attr::Time(tr) => tr.to_string(),
            Attr::SatelliteNumber(n) => n.to_string(),
            Attr::Instrument(s)
            | Attr::Resolution(s)
            | Attr::Provider(s)
            | Attr::Source(s)
            | Attr::Physobs(s) => s.clone(),
        }
    }
}

impl std::fmt::Display for Attr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind(), self.value_string())
    }
}

/// Conjunction of attributes, built fluently.
///
/// Adding an attribute of a kind already present replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    attrs: Vec<Attr>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attr: Attr) -> Self {
        self.attrs.retain(|a| a.kind() != attr.kind());
        self.attrs.push(attr);
        self
    }

    pub fn time(self, range: TimeRange) -> Self {
        self.with(Attr::Time(range))
    }

    pub fn instrument(self, name: impl Into<String>) -> Self {
        self.with(Attr::Instrument(name.into()))
    }

    pub fn satellite(self, number: u8) -> Self {
        self.with(Attr::SatelliteNumber(number))
    }

    pub fn resolution(self, token: impl Into<String>) -> Self {
        self.with(Attr::Resolution(token.into()))
    }

    pub fn provider(self, name: impl Into<String>) -> Self {
        self.with(Attr::Provider(name.into()))
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn get(&self, kind: AttrKind) -> Option<&Attr> {
        self.attrs.iter().find(|a| a.kind() == kind)
    }
}

impl From<Vec<Attr>> for Query {
    fn from(attrs: Vec<Attr>) -> Self {
        attrs.into_iter().fold(Query::new(), Query::with)
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.attrs.iter().map(|a| a.to_string()).collect();
        f.write_str(&parts.join(" & "))
    }
}

impl std::ops::BitOr for Query {
    type Output = QueryOr;

    fn bitor(self, rhs: Query) -> QueryOr {
        QueryOr::from(self).or(rhs)
    }
}

/// Disjunction of queries. Each branch yields its own response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOr {
    branches: Vec<Query>,
}

impl QueryOr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a branch. Duplicate branches are kept once.
    pub fn or(mut self, query: Query) -> Self {
        if !self.branches.contains(&query) {
            self.branches.push(query);
        }
        self
    }

    pub fn branches(&self) -> &[Query] {
        &self.branches
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}

impl From<Query> for QueryOr {
    fn from(query: Query) -> Self {
        QueryOr::new().or(query)
    }
}

impl FromIterator<Query> for QueryOr {
    fn from_iter<I: IntoIterator<Item = Query>>(iter: I) -> Self {
        iter.into_iter().fold(QueryOr::new(), QueryOr::or)
    }
}

impl std::ops::BitOr<Query> for QueryOr {
    type Output = QueryOr;

    fn bitor(self, rhs: Query) -> QueryOr {
        self.or(rhs)
    }
}

impl std::fmt::Display for QueryOr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.branches.iter().map(|q| format!("({})", q)).collect();
        f.write_str(&parts.join(" | "))
    }
}
