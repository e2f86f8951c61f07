//! Scripted index-server connector.
//!
//! [`RecordingConnector`] hands out clients that record every call they
//! receive and answer queries from canned responses. Responses are keyed by
//! the comma-joined index list, with an optional fallback. A query with no
//! scripted response is treated as rejected by the server.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use quarry_core::Result;

use crate::client::{
    ClientCall, GroupFunction, IndexClient, IndexConnector, IndexMatch, IndexResponse, MatchMode,
    SortMode,
};

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<String, IndexResponse>,
    fallback: Option<IndexResponse>,
    calls: Vec<ClientCall>,
    connections: usize,
}

/// Connector whose clients record calls and replay scripted responses.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    script: Arc<Mutex<Script>>,
}

impl RecordingConnector {
    /// Connector with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer queries against `indexes` with `response`.
    pub fn respond(self, indexes: impl Into<String>, response: IndexResponse) -> Self {
        self.lock().responses.insert(indexes.into(), response);
        self
    }

    /// Answer queries against `indexes` with matches carrying these
    /// target-attribute values.
    pub fn respond_with_ids(
        self,
        indexes: impl Into<String>,
        target_attr: &str,
        ids: &[i64],
    ) -> Self {
        let matches = ids
            .iter()
            .map(|id| IndexMatch::with_attrs(serde_json::json!({ target_attr: id })))
            .collect();
        self.respond(indexes, IndexResponse::from_matches(matches))
    }

    /// Answer any otherwise unscripted query with `response`.
    pub fn fallback(self, response: IndexResponse) -> Self {
        self.lock().fallback = Some(response);
        self
    }

    /// Every call recorded so far, across all clients.
    pub fn calls(&self) -> Vec<ClientCall> {
        self.lock().calls.clone()
    }

    /// Only the recorded queries.
    pub fn queries(&self) -> Vec<ClientCall> {
        self.lock()
            .calls
            .iter()
            .filter(|call| matches!(call, ClientCall::Query { .. }))
            .cloned()
            .collect()
    }

    /// Number of clients handed out.
    pub fn connections(&self) -> usize {
        self.lock().connections
    }

    /// Forget recorded calls and connections.
    pub fn clear(&self) {
        let mut script = self.lock();
        script.calls.clear();
        script.connections = 0;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IndexConnector for RecordingConnector {
    fn client(&self) -> Result<Box<dyn IndexClient>> {
        self.lock().connections += 1;
        Ok(Box::new(RecordingClient {
            script: Arc::clone(&self.script),
        }))
    }
}

struct RecordingClient {
    script: Arc<Mutex<Script>>,
}

impl RecordingClient {
    fn record(&self, call: ClientCall) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .calls
            .push(call);
    }
}

impl IndexClient for RecordingClient {
    fn set_server(&mut self, host: &str, port: u16) {
        self.record(ClientCall::SetServer {
            host: host.to_string(),
            port,
        });
    }

    fn set_match_mode(&mut self, mode: MatchMode) {
        self.record(ClientCall::SetMatchMode(mode));
    }

    fn set_filter(&mut self, attribute: &str, values: &[i64], exclude: bool) {
        self.record(ClientCall::SetFilter {
            attribute: attribute.to_string(),
            values: values.to_vec(),
            exclude,
        });
    }

    fn set_filter_range(&mut self, attribute: &str, min: i64, max: i64, exclude: bool) {
        self.record(ClientCall::SetFilterRange {
            attribute: attribute.to_string(),
            min,
            max,
            exclude,
        });
    }

    fn set_filter_float_range(&mut self, attribute: &str, min: f64, max: f64, exclude: bool) {
        self.record(ClientCall::SetFilterFloatRange {
            attribute: attribute.to_string(),
            min,
            max,
            exclude,
        });
    }

    fn set_geo_anchor(&mut self, lat_attr: &str, lng_attr: &str, lat: f64, lng: f64) {
        self.record(ClientCall::SetGeoAnchor {
            lat_attr: lat_attr.to_string(),
            lng_attr: lng_attr.to_string(),
            lat,
            lng,
        });
    }

    fn set_group_by(&mut self, attribute: &str, function: GroupFunction, sort: &str) {
        self.record(ClientCall::SetGroupBy {
            attribute: attribute.to_string(),
            function,
            sort: sort.to_string(),
        });
    }

    fn set_sort_mode(&mut self, mode: SortMode, expr: &str) {
        self.record(ClientCall::SetSortMode {
            mode,
            expr: expr.to_string(),
        });
    }

    fn set_select(&mut self, select: &str) {
        self.record(ClientCall::SetSelect(select.to_string()));
    }

    fn set_limits(&mut self, offset: u32, limit: u32, max: u32, cutoff: u32) {
        self.record(ClientCall::SetLimits {
            offset,
            limit,
            max,
            cutoff,
        });
    }

    fn set_field_weights(&mut self, weights: &BTreeMap<String, u32>) {
        self.record(ClientCall::SetFieldWeights(weights.clone()));
    }

    fn set_index_weights(&mut self, weights: &BTreeMap<String, u32>) {
        self.record(ClientCall::SetIndexWeights(weights.clone()));
    }

    fn query(&mut self, term: &str, indexes: &str) -> Result<Option<IndexResponse>> {
        let mut script = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        script.calls.push(ClientCall::Query {
            term: term.to_string(),
            indexes: indexes.to_string(),
        });
        Ok(script
            .responses
            .get(indexes)
            .or(script.fallback.as_ref())
            .cloned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_response_by_index_list() {
        let connector =
            RecordingConnector::new().respond_with_ids("things_idx", "item_id", &[2, 1]);
        let mut client = connector.client().unwrap();
        let response = client.query("x", "things_idx").unwrap().unwrap();
        assert_eq!(response.matches.len(), 2);
        assert_eq!(response.matches[0].attrs["item_id"], 2);
    }

    #[test]
    fn test_unscripted_query_is_rejected() {
        let connector = RecordingConnector::new();
        let mut client = connector.client().unwrap();
        assert!(client.query("x", "missing_idx").unwrap().is_none());
    }

    #[test]
    fn test_fallback_response() {
        let connector = RecordingConnector::new().fallback(IndexResponse::default());
        let mut client = connector.client().unwrap();
        assert!(client.query("x", "anything").unwrap().is_some());
    }

    #[test]
    fn test_calls_are_shared_across_clients() {
        let connector = RecordingConnector::new();
        connector.client().unwrap().set_select("a");
        connector.client().unwrap().set_match_mode(MatchMode::Any);
        assert_eq!(connector.connections(), 2);
        assert_eq!(
            connector.calls(),
            vec![
                ClientCall::SetSelect("a".into()),
                ClientCall::SetMatchMode(MatchMode::Any)
            ]
        );

        connector.clear();
        assert!(connector.calls().is_empty());
        assert_eq!(connector.connections(), 0);
    }
}
