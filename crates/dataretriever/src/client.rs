//! The data client interface.

use helio_common::{Attr, AttrKind, QueryResponse};

use crate::error::ClientResult;

/// Values a client accepts for one attribute kind, with descriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredValues {
    pub kind: AttrKind,
    pub values: Vec<(String, String)>,
}

impl RegisteredValues {
    pub fn new<I, A, B>(kind: AttrKind, values: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            kind,
            values: values
                .into_iter()
                .map(|(v, d)| (v.into(), d.into()))
                .collect(),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        self.values.iter().any(|(v, _)| v.eq_ignore_ascii_case(value))
    }
}

/// A source of remote files that can answer attribute queries.
///
/// Resolution is synchronous and free of network access; fetching the
/// resolved URLs is left to the caller.
pub trait DataClient: Send + Sync {
    fn name(&self) -> &str;

    /// One-line summary shown in client listings.
    fn description(&self) -> &str;

    fn info_url(&self) -> &str;

    fn registered_values(&self) -> Vec<RegisteredValues>;

    /// Whether [`DataClient::search`] would serve these attributes.
    fn can_handle_query(&self, attrs: &[Attr]) -> bool;

    fn search(&self, attrs: &[Attr]) -> ClientResult<QueryResponse>;

    /// Multi-line summary: name, description, source and registered values.
    fn describe(&self) -> String {
        let mut out = format!(
            "{}\n\n{}\n\nSource: {}\n",
            self.name(),
            self.description(),
            self.info_url()
        );
        for registered in self.registered_values() {
            out.push_str(&format!("\n{}:\n", registered.kind));
            for (value, desc) in &registered.values {
                out.push_str(&format!("  {:<10} {}\n", value, desc));
            }
        }
        out
    }
}
