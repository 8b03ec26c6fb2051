//! Unified search across registered data clients.

use std::collections::BTreeSet;
use std::ops::{Bound, RangeBounds};

use helio_common::{Query, QueryOr, QueryResponse, QueryResponseRow};
use tracing::{debug, info, instrument};

use crate::client::DataClient;
use crate::error::{ClientError, ClientResult};
use crate::goes::{XrsClient, XrsClientConfig};

/// Registry of clients; a query goes to every client that can handle it.
#[derive(Default)]
pub struct Fido {
    clients: Vec<Box<dyn DataClient>>,
}

impl Fido {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in clients.
    pub fn with_default_clients(xrs: XrsClientConfig) -> Self {
        let mut fido = Self::new();
        fido.register(Box::new(XrsClient::new(xrs)));
        fido
    }

    pub fn register(&mut self, client: Box<dyn DataClient>) {
        debug!(client = client.name(), "Registered data client");
        self.clients.push(client);
    }

    pub fn clients(&self) -> impl Iterator<Item = &dyn DataClient> {
        self.clients.iter().map(|c| &**c)
    }

    /// Search every client that can handle the query.
    ///
    /// Fails with [`ClientError::NoClient`] when none can. A client that
    /// claims the query and then reports it cannot handle it is skipped;
    /// any other client error aborts the search.
    #[instrument(skip_all, fields(query = %query))]
    pub fn search(&self, query: &Query) -> ClientResult<UnifiedResponse> {
        let unified = UnifiedResponse::new(self.search_branch(query)?);
        info!(
            providers = unified.len(),
            files = unified.file_num(),
            "Unified search complete"
        );
        Ok(unified)
    }

    /// Search each branch of a disjunction on its own.
    ///
    /// Responses keep branch order, then registry order within a branch.
    /// Any branch no client can serve fails the whole search.
    #[instrument(skip_all, fields(query = %query))]
    pub fn search_any(&self, query: &QueryOr) -> ClientResult<UnifiedResponse> {
        if query.is_empty() {
            return Err(ClientError::NoClient(query.to_string()));
        }

        let mut responses = Vec::new();
        for branch in query.branches() {
            responses.extend(self.search_branch(branch)?);
        }

        let unified = UnifiedResponse::new(responses);
        info!(
            branches = query.len(),
            providers = unified.len(),
            files = unified.file_num(),
            "Unified search complete"
        );
        Ok(unified)
    }

    fn search_branch(&self, query: &Query) -> ClientResult<Vec<QueryResponse>> {
        let attrs = query.attrs();
        let candidates: Vec<&dyn DataClient> = self
            .clients()
            .filter(|c| c.can_handle_query(attrs))
            .collect();

        if candidates.is_empty() {
            return Err(ClientError::NoClient(query.to_string()));
        }

        let mut responses = Vec::with_capacity(candidates.len());
        for client in candidates {
            match client.search(attrs) {
                Ok(response) => responses.push(response),
                Err(e) if e.is_cannot_handle() => {
                    debug!(client = client.name(), error = %e, "Client declined query");
                }
                Err(e) => return Err(e),
            }
        }

        if responses.is_empty() {
            return Err(ClientError::NoClient(query.to_string()));
        }
        Ok(responses)
    }
}

/// Responses from every client that served a query, in registry order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifiedResponse {
    responses: Vec<QueryResponse>,
}

impl UnifiedResponse {
    pub fn new(responses: Vec<QueryResponse>) -> Self {
        Self { responses }
    }

    /// Number of client responses.
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Number of files across all responses.
    pub fn file_num(&self) -> usize {
        self.responses.iter().map(QueryResponse::len).sum()
    }

    pub fn get(&self, index: usize) -> Option<&QueryResponse> {
        self.responses.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryResponse> {
        self.responses.iter()
    }

    /// Every row of every response, in order.
    pub fn rows(&self) -> impl Iterator<Item = &QueryResponseRow> {
        self.responses.iter().flat_map(|r| r.iter())
    }

    /// Responses within `range`, clamped to the ones present.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> UnifiedResponse {
        let len = self.responses.len();
        let start = match range.start_bound() {
            Bound::Included(&i) => i,
            Bound::Excluded(&i) => i.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&i) => i.saturating_add(1),
            Bound::Excluded(&i) => i,
            Bound::Unbounded => len,
        }
        .clamp(start, len);
        UnifiedResponse::new(self.responses[start..end].to_vec())
    }

    /// Responses in reverse order; rows within each are untouched.
    pub fn reversed(&self) -> UnifiedResponse {
        UnifiedResponse::new(self.responses.iter().rev().cloned().collect())
    }

    /// Path template placeholders every response can fill.
    pub fn path_format_keys(&self) -> BTreeSet<String> {
        let mut responses = self.responses.iter();
        let Some(first) = responses.next() else {
            return BTreeSet::new();
        };
        responses.fold(first.path_format_keys(), |keys, response| {
            keys.intersection(&response.path_format_keys())
                .cloned()
                .collect()
        })
    }
}

impl<'a> IntoIterator for &'a UnifiedResponse {
    type Item = &'a QueryResponse;
    type IntoIter = std::slice::Iter<'a, QueryResponse>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.iter()
    }
}

impl std::fmt::Display for UnifiedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let plural = if self.responses.len() == 1 { "" } else { "s" };
        writeln!(f, "Results from {} Provider{}:", self.responses.len(), plural)?;
        for response in &self.responses {
            writeln!(f)?;
            write!(f, "{}", response)?;
        }
        Ok(())
    }
}
