//! Fluent search builder and execution pipeline.
//!
//! A [`Search`] is assembled by chaining mutators, each consuming and
//! returning the builder. Nothing touches the network until a terminal call:
//!
//! 1. [`Search::query_plan`] turns the builder state into the exact client
//!    calls and queries to issue.
//! 2. [`Search::run`] opens a fresh index-server client, replays the calls,
//!    and for each table queries the index, extracts identifiers from the
//!    matches, and hydrates them through the storage adapter.
//! 3. [`Search::count`] does the same but stops at the index totals.
//!
//! Terminal calls borrow the builder, so calling one again re-executes.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use quarry_core::{AngleUnit, Error, LatLng, Result, ServerAddress, ToLatLng};
use quarry_storage::{HydrationRequest, NullAdapter, Record, Row, StorageAdapter};
use serde_json::Value;

use crate::client::{
    ClientCall, GroupFunction, IndexClient, IndexConnector, IndexResponse, MatchMode, SortMode,
};
use crate::config::{SearchConfiguration, push_unique};
use crate::filter::{FilterSpec, IntoFilterValues};
use crate::fragment::FragmentMode;
use crate::geo::GeoDistanceBuilder;
use crate::results::{MatchCount, ResultSet, collect_ids};

/// Default number of matches returned.
pub const DEFAULT_LIMIT: u32 = 20;

/// Default cap on matches the server keeps.
pub const DEFAULT_MAX_MATCHES: u32 = 1000;

/// Default group sort clause.
pub const DEFAULT_GROUP_SORT: &str = "@group DESC";

/// Attribute the index server exposes for anchor distance.
pub const GEODIST_ATTR: &str = "@geodist";

/// Indexes queried together for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryGroup {
    /// Table the matches hydrate from.
    pub table: Option<String>,
    /// Canonical index names.
    pub indexes: Vec<String>,
}

/// One index query of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedQuery {
    /// Table the matches hydrate from.
    pub table: Option<String>,
    /// Comma-joined index list.
    pub indexes: String,
}

/// Everything a terminal call will send, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Rewritten query term.
    pub term: String,
    /// Setter calls replayed on the client before querying.
    pub calls: Vec<ClientCall>,
    /// One query per table.
    pub queries: Vec<PlannedQuery>,
}

/// Per-search overrides applied on top of a configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchOverrides {
    /// Initial query term.
    pub term: Option<String>,
    /// Restrict to one table.
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct GroupSpec {
    attribute: String,
    function: GroupFunction,
    sort: String,
}

#[derive(Debug, Clone, PartialEq)]
struct SortSpec {
    mode: SortMode,
    expr: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Limits {
    offset: u32,
    limit: u32,
    max: u32,
    cutoff: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            max: DEFAULT_MAX_MATCHES,
            cutoff: 0,
        }
    }
}

/// A search under construction.
#[derive(Clone)]
pub struct Search {
    adapter: Option<Arc<dyn StorageAdapter>>,
    connector: Option<Arc<dyn IndexConnector>>,
    server: ServerAddress,
    declared: Vec<QueryGroup>,
    groups: Vec<QueryGroup>,
    index_suffix: String,
    term: String,
    fields: Vec<String>,
    match_mode: MatchMode,
    fragment_mode: FragmentMode,
    target_attr: String,
    latitude_attr: String,
    longitude_attr: String,
    key_prefix: String,
    anchor_units: AngleUnit,
    weights: BTreeMap<String, u32>,
    index_weights: BTreeMap<String, u32>,
    filters: Vec<FilterSpec>,
    anchor: Option<LatLng>,
    group_by: Option<GroupSpec>,
    sort: Option<SortSpec>,
    select: Vec<String>,
    limits: Limits,
    return_attributes: Vec<String>,
}

impl Search {
    /// Search seeded from `config`.
    pub fn new(config: &SearchConfiguration) -> Self {
        let declared: Vec<QueryGroup> = if config.tables().is_empty() {
            vec![QueryGroup {
                table: None,
                indexes: config.unassigned_indexes().to_vec(),
            }]
        } else {
            config
                .tables()
                .iter()
                .map(|t| QueryGroup {
                    table: Some(t.table.clone()),
                    indexes: t.indexes.clone(),
                })
                .collect()
        };
        Self {
            adapter: config.adapter().cloned(),
            connector: config.connector().cloned(),
            server: config.server().clone(),
            groups: declared.clone(),
            declared,
            index_suffix: config.index_suffix().to_string(),
            term: String::new(),
            fields: Vec::new(),
            match_mode: config.match_mode(),
            fragment_mode: config.fragment_mode(),
            target_attr: config.target_attr().to_string(),
            latitude_attr: config.latitude_attr().to_string(),
            longitude_attr: config.longitude_attr().to_string(),
            key_prefix: config.key_prefix().to_string(),
            anchor_units: config.anchor_units(),
            weights: config.weights().clone(),
            index_weights: config.index_weights().clone(),
            filters: Vec::new(),
            anchor: None,
            group_by: None,
            sort: None,
            select: Vec::new(),
            limits: Limits::default(),
            return_attributes: Vec::new(),
        }
    }

    /// Search seeded from `config` with per-search overrides.
    pub fn with_overrides(config: &SearchConfiguration, overrides: SearchOverrides) -> Self {
        let mut search = Self::new(config);
        if let Some(term) = overrides.term {
            search.term = term;
        }
        if let Some(table) = overrides.table {
            search = search.in_table(table);
        }
        search
    }

    /// Search seeded from a configuration built by `f`.
    pub fn configure<F>(f: F) -> Result<Self>
    where
        F: FnOnce(&mut SearchConfiguration) -> Result<()>,
    {
        Ok(Self::new(&SearchConfiguration::build(f)?))
    }

    // ------------------------------------------------------------------------
    // Term and scope
    // ------------------------------------------------------------------------

    /// Set the query term; several terms are joined with a space.
    pub fn for_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.term = terms
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(" ");
        self
    }

    /// The current (unrewritten) query term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Restrict the search to one table.
    ///
    /// The table keeps its declared indexes. An undeclared table is
    /// searched with every declared index.
    pub fn in_table(mut self, table: impl Into<String>) -> Self {
        let table = table.into();
        let indexes = match self
            .declared
            .iter()
            .find(|g| g.table.as_deref() == Some(table.as_str()))
        {
            Some(group) => group.indexes.clone(),
            None => {
                let mut all = Vec::new();
                for group in &self.declared {
                    for index in &group.indexes {
                        push_unique(&mut all, index.clone());
                    }
                }
                all
            }
        };
        self.groups = vec![QueryGroup {
            table: Some(table),
            indexes,
        }];
        self
    }

    /// Restrict matching to these fields. Forces [`MatchMode::Extended2`].
    pub fn in_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Set the match mode.
    pub fn using_match_mode(mut self, mode: MatchMode) -> Self {
        self.match_mode = mode;
        self
    }

    /// Replace the indexes to search.
    ///
    /// When several tables are in scope, the search collapses to the first
    /// one, searched with these indexes.
    pub fn using_indexes<I, S>(mut self, indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut canonical = Vec::new();
        for index in indexes {
            push_unique(
                &mut canonical,
                quarry_core::canonicalize_with(index.as_ref(), &self.index_suffix),
            );
        }
        let table = self.groups.first().and_then(|g| g.table.clone());
        if self.groups.len() > 1 {
            log::debug!(
                "explicit indexes collapse a {}-table search to {:?}",
                self.groups.len(),
                table
            );
        }
        self.groups = vec![QueryGroup {
            table,
            indexes: canonical,
        }];
        self
    }

    /// Search a single index.
    pub fn using_index(self, index: &str) -> Self {
        self.using_indexes([index])
    }

    /// Set the fragment matching scheme.
    pub fn using_fragment_matching(mut self, mode: FragmentMode) -> Self {
        self.fragment_mode = mode;
        self
    }

    // ------------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------------

    /// Keep matches whose attribute satisfies `values`.
    ///
    /// Integer collections filter by membership, integer ranges by integer
    /// range, float ranges by float range, and a bare number `n` by
    /// `[0, n]`. Anything else fails with [`Error::InvalidFilter`].
    pub fn filter(mut self, attribute: &str, values: impl IntoFilterValues) -> Result<Self> {
        self.filters.push(FilterSpec::new(attribute, values, false)?);
        Ok(self)
    }

    /// Drop matches whose attribute satisfies `values`.
    pub fn exclude(mut self, attribute: &str, values: impl IntoFilterValues) -> Result<Self> {
        self.filters.push(FilterSpec::new(attribute, values, true)?);
        Ok(self)
    }

    /// Staged filters, in order.
    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    // ------------------------------------------------------------------------
    // Grouping, sorting, selection, paging
    // ------------------------------------------------------------------------

    /// Group matches, ordering groups by `@group DESC`.
    pub fn group_by(self, attribute: &str, function: GroupFunction) -> Self {
        self.group_by_sorted(attribute, function, DEFAULT_GROUP_SORT)
    }

    /// Group matches with an explicit group sort clause.
    pub fn group_by_sorted(
        mut self,
        attribute: &str,
        function: GroupFunction,
        sort: impl Into<String>,
    ) -> Self {
        self.group_by = Some(GroupSpec {
            attribute: attribute.to_string(),
            function,
            sort: sort.into(),
        });
        self
    }

    /// Order matches.
    pub fn sort_by(mut self, mode: SortMode, expr: impl Into<String>) -> Self {
        self.sort = Some(SortSpec {
            mode,
            expr: expr.into(),
        });
        self
    }

    /// Order matches by an SQL-like clause such as `"price ASC, @id DESC"`.
    pub fn sort_by_clause(self, clause: impl Into<String>) -> Self {
        self.sort_by(SortMode::Extended, clause)
    }

    /// Add attributes to the server-side select list.
    pub fn select<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(attributes.into_iter().map(Into::into));
        self
    }

    /// Project hydrated records onto these attributes.
    pub fn returning<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for attribute in attributes {
            push_unique(&mut self.return_attributes, attribute.into());
        }
        self
    }

    /// Number of matches to return.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limits.limit = limit;
        self
    }

    /// Number of matches to skip.
    pub fn offset(mut self, offset: u32) -> Self {
        self.limits.offset = offset;
        self
    }

    /// Cap on matches the server keeps.
    pub fn max(mut self, max: u32) -> Self {
        self.limits.max = max;
        self
    }

    /// Stop after this many matches (0 means no cutoff).
    pub fn cutoff(mut self, cutoff: u32) -> Self {
        self.limits.cutoff = cutoff;
        self
    }

    // ------------------------------------------------------------------------
    // Weights
    // ------------------------------------------------------------------------

    /// Merge per-field weights into the current ones.
    pub fn weight<I, K>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: Into<String>,
    {
        self.weights
            .extend(weights.into_iter().map(|(field, w)| (field.into(), w)));
        self
    }

    /// Merge per-index weights (canonicalized) into the current ones.
    pub fn weight_index<I, K>(mut self, weights: I) -> Self
    where
        I: IntoIterator<Item = (K, u32)>,
        K: AsRef<str>,
    {
        for (index, w) in weights {
            let canonical = quarry_core::canonicalize_with(index.as_ref(), &self.index_suffix);
            self.index_weights.insert(canonical, w);
        }
        self
    }

    // ------------------------------------------------------------------------
    // Geo
    // ------------------------------------------------------------------------

    /// Set the point `@geodist` is measured from.
    pub fn anchor(mut self, point: impl ToLatLng) -> Result<Self> {
        self.anchor = Some(point.to_lat_lng()?);
        Ok(self)
    }

    /// Anchor at `point` and keep matches within `radius` meters.
    ///
    /// A bare number is an upper bound; a float range keeps an annulus.
    pub fn around(self, point: impl ToLatLng, radius: impl IntoFilterValues) -> Result<Self> {
        self.anchor(point)?.filter(GEODIST_ATTR, radius)
    }

    /// Start a distance filter: `within(5.0).kilometers().of(point)`.
    pub fn within(self, distance: f64) -> GeoDistanceBuilder {
        GeoDistanceBuilder::new(self, distance)
    }

    // ------------------------------------------------------------------------
    // Planning
    // ------------------------------------------------------------------------

    /// The client calls and queries a terminal call would issue.
    pub fn query_plan(&self) -> Result<QueryPlan> {
        let mut match_mode = self.match_mode;
        let mut term = self.term.clone();
        if !self.fields.is_empty() {
            match_mode = MatchMode::Extended2;
            let scope = format!("@({})", self.fields.join(","));
            term = if term.is_empty() {
                scope
            } else {
                format!("{scope} {term}")
            };
        }
        let term = self.fragment_mode.apply(&term);

        let mut calls = vec![
            ClientCall::SetServer {
                host: self.server.host.clone(),
                port: self.server.port,
            },
            ClientCall::SetMatchMode(match_mode),
            ClientCall::SetFieldWeights(self.weights.clone()),
            ClientCall::SetIndexWeights(self.index_weights.clone()),
        ];
        calls.extend(self.filters.iter().map(FilterSpec::to_call));
        if let Some(anchor) = &self.anchor {
            let (lat, lng) = anchor.in_units(self.anchor_units);
            calls.push(ClientCall::SetGeoAnchor {
                lat_attr: self.latitude_attr.clone(),
                lng_attr: self.longitude_attr.clone(),
                lat,
                lng,
            });
        }
        if let Some(group) = &self.group_by {
            calls.push(ClientCall::SetGroupBy {
                attribute: group.attribute.clone(),
                function: group.function,
                sort: group.sort.clone(),
            });
        }
        if let Some(sort) = &self.sort {
            calls.push(ClientCall::SetSortMode {
                mode: sort.mode,
                expr: sort.expr.clone(),
            });
        }
        if !self.select.is_empty() {
            calls.push(ClientCall::SetSelect(self.select.join(",")));
        }
        calls.push(ClientCall::SetLimits {
            offset: self.limits.offset,
            limit: self.limits.limit,
            max: self.limits.max,
            cutoff: self.limits.cutoff,
        });

        let mut queries = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            if group.indexes.is_empty() {
                return Err(Error::config(match &group.table {
                    Some(table) => format!("no indexes to search for table '{table}'"),
                    None => "no indexes to search".to_string(),
                }));
            }
            queries.push(PlannedQuery {
                table: group.table.clone(),
                indexes: group.indexes.join(", "),
            });
        }

        Ok(QueryPlan {
            term,
            calls,
            queries,
        })
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    /// Query the index server and hydrate the matches.
    ///
    /// A single query group yields [`ResultSet::Records`]; several yield
    /// [`ResultSet::Tables`]. With [`Search::returning`] the records are
    /// projected, which fails with [`Error::MultipleResultSets`] across
    /// several tables.
    pub fn run(&self) -> Result<ResultSet> {
        let plan = self.query_plan()?;
        if !self.return_attributes.is_empty() && plan.queries.len() > 1 {
            return Err(Error::MultipleResultSets {
                tables: plan
                    .queries
                    .iter()
                    .filter_map(|q| q.table.as_deref())
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let adapter: Arc<dyn StorageAdapter> = match &self.adapter {
            Some(adapter) => Arc::clone(adapter),
            None => Arc::new(NullAdapter),
        };
        let mut client = self.open_client(&plan)?;

        let mut hydrated = Vec::with_capacity(plan.queries.len());
        for query in &plan.queries {
            let response = execute(client.as_mut(), &plan.term, query)?;
            let ids = collect_ids(&response.matches, &self.target_attr);
            log::debug!(
                "{} matches on '{}' resolved to {} ids",
                response.matches.len(),
                query.indexes,
                ids.len()
            );
            let request = HydrationRequest::new(&ids)
                .with_table(query.table.as_deref())
                .with_key_prefix(&self.key_prefix)
                .with_columns(&self.return_attributes);
            let records = adapter.query(&request)?;
            hydrated.push((query.table.clone(), records));
        }

        if hydrated.len() == 1 {
            let records = hydrated.pop().map(|(_, records)| records).unwrap_or_default();
            return self.project(adapter.as_ref(), records);
        }
        Ok(ResultSet::Tables(
            hydrated
                .into_iter()
                .map(|(table, records)| (table.unwrap_or_default(), records))
                .collect(),
        ))
    }

    /// Total matches reported by the index server.
    pub fn count(&self) -> Result<MatchCount> {
        let plan = self.query_plan()?;
        let mut client = self.open_client(&plan)?;

        let mut totals = BTreeMap::new();
        for query in &plan.queries {
            let response = execute(client.as_mut(), &plan.term, query)?;
            totals.insert(query.table.clone().unwrap_or_default(), response.total);
        }
        if plan.queries.len() == 1 {
            return Ok(MatchCount::Total(totals.into_values().sum()));
        }
        Ok(MatchCount::ByTable(totals))
    }

    fn open_client(&self, plan: &QueryPlan) -> Result<Box<dyn IndexClient>> {
        let connector = self.connector.as_ref().ok_or(Error::ConnectorNotSet)?;
        let mut client = connector.client()?;
        for call in &plan.calls {
            call.apply(client.as_mut());
        }
        Ok(client)
    }

    fn project(&self, adapter: &dyn StorageAdapter, records: Vec<Record>) -> Result<ResultSet> {
        match self.return_attributes.as_slice() {
            [] => Ok(ResultSet::Records(records)),
            [attribute] => records
                .iter()
                .map(|record| adapter.get_attribute(record, attribute))
                .collect::<Result<Vec<Value>>>()
                .map(ResultSet::Values),
            attributes => records
                .iter()
                .map(|record| {
                    attributes
                        .iter()
                        .map(|a| Ok((a.clone(), adapter.get_attribute(record, a)?)))
                        .collect::<Result<Row>>()
                })
                .collect::<Result<Vec<Row>>>()
                .map(ResultSet::Rows),
        }
    }
}

fn execute(
    client: &mut dyn IndexClient,
    term: &str,
    query: &PlannedQuery,
) -> Result<IndexResponse> {
    log::debug!("querying '{}' for {:?}", query.indexes, term);
    client
        .query(term, &query.indexes)?
        .ok_or_else(|| Error::InvalidIndexQuery {
            indexes: query.indexes.clone(),
        })
}

impl fmt::Debug for Search {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Search")
            .field("term", &self.term)
            .field("groups", &self.groups)
            .field("match_mode", &self.match_mode)
            .field("fragment_mode", &self.fragment_mode)
            .field("filters", &self.filters)
            .field("anchor", &self.anchor)
            .field("return_attributes", &self.return_attributes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::recording::RecordingConnector;
    use quarry_core::Settings;
    use quarry_storage::{Datastore, MemoryKeyValue, MemoryTables};
    use serde_json::json;

    fn config_with(connector: &RecordingConnector) -> SearchConfiguration {
        let mut config = SearchConfiguration::from_settings(&Settings::default());
        config.set_connector(Arc::new(connector.clone()));
        config.index("things").unwrap();
        config
    }

    fn things_store() -> Arc<MemoryKeyValue> {
        let store = Arc::new(MemoryKeyValue::new());
        for (id, name) in [(1, "a"), (2, "b"), (3, "c"), (5, "e"), (7, "g")] {
            store.insert_json(format!("thing:{id}"), &json!({ "id": id, "name": name }));
        }
        store
    }

    fn key_value_config(
        connector: &RecordingConnector,
        store: Arc<MemoryKeyValue>,
    ) -> SearchConfiguration {
        let mut config = config_with(connector);
        config
            .set_adapter("key-value")
            .unwrap()
            .datastore(Datastore::KeyValue(store))
            .unwrap();
        config.set_key_prefix("thing:");
        config
    }

    // ========================================================================
    // Planning
    // ========================================================================

    #[test]
    fn test_plan_defaults() {
        let connector = RecordingConnector::new();
        let plan = Search::new(&config_with(&connector)).for_terms(["x"]).query_plan().unwrap();
        assert_eq!(plan.term, "x");
        assert_eq!(
            plan.queries,
            vec![PlannedQuery {
                table: None,
                indexes: "things_idx".into()
            }]
        );
        assert!(plan.calls.contains(&ClientCall::SetMatchMode(MatchMode::All)));
        assert!(plan.calls.contains(&ClientCall::SetLimits {
            offset: 0,
            limit: 20,
            max: 1000,
            cutoff: 0
        }));
        assert!(plan.calls.contains(&ClientCall::SetServer {
            host: "localhost".into(),
            port: 3312
        }));
    }

    #[test]
    fn test_for_terms_joins_with_space() {
        let connector = RecordingConnector::new();
        let search = Search::new(&config_with(&connector)).for_terms(["red", "fox"]);
        assert_eq!(search.term(), "red fox");
    }

    #[test]
    fn test_in_fields_scopes_term_and_forces_extended2() {
        let connector = RecordingConnector::new();
        let plan = Search::new(&config_with(&connector))
            .for_terms(["fox"])
            .using_match_mode(MatchMode::Any)
            .in_fields(["title", "body"])
            .query_plan()
            .unwrap();
        assert_eq!(plan.term, "@(title,body) fox");
        assert!(plan.calls.contains(&ClientCall::SetMatchMode(MatchMode::Extended2)));
    }

    #[test]
    fn test_fragment_matching_rewrites_term() {
        let connector = RecordingConnector::new();
        let plan = Search::new(&config_with(&connector))
            .for_terms(["red fox"])
            .using_fragment_matching(FragmentMode::Prefix)
            .query_plan()
            .unwrap();
        assert_eq!(plan.term, "red* fox*");
    }

    #[test]
    fn test_exact_term_passes_through_untouched() {
        let connector = RecordingConnector::new();
        let plan = Search::new(&config_with(&connector))
            .for_terms(["red fox "])
            .query_plan()
            .unwrap();
        assert_eq!(plan.term, "red fox ");
    }

    #[test]
    fn test_field_scope_without_term() {
        let connector = RecordingConnector::new();
        let plan = Search::new(&config_with(&connector))
            .in_fields(["title"])
            .query_plan()
            .unwrap();
        assert_eq!(plan.term, "@(title)");
    }

    #[test]
    fn test_using_indexes_canonicalizes() {
        let connector = RecordingConnector::new();
        let plan = Search::new(&config_with(&connector))
            .using_indexes(["venues", "events_idx"])
            .query_plan()
            .unwrap();
        assert_eq!(plan.queries[0].indexes, "venues_idx, events_idx");
    }

    #[test]
    fn test_using_indexes_collapses_to_primary_table() {
        let mut config = SearchConfiguration::from_settings(&Settings::default());
        config
            .index_for("venues", "venue")
            .unwrap()
            .index_for("events", "event")
            .unwrap();
        let plan = Search::new(&config).using_index("shared").query_plan().unwrap();
        assert_eq!(
            plan.queries,
            vec![PlannedQuery {
                table: Some("venues".into()),
                indexes: "shared_idx".into()
            }]
        );
    }

    #[test]
    fn test_in_table_undeclared_uses_all_indexes() {
        let mut config = SearchConfiguration::from_settings(&Settings::default());
        config.index_for("venues", "venue").unwrap();
        let plan = Search::new(&config).in_table("events").query_plan().unwrap();
        assert_eq!(plan.queries[0].table.as_deref(), Some("events"));
        assert_eq!(plan.queries[0].indexes, "venue_idx");
    }

    #[test]
    fn test_missing_indexes_is_a_config_error() {
        let config = SearchConfiguration::from_settings(&Settings::default());
        let err = Search::new(&config).query_plan().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_group_sort_select_limits() {
        let connector = RecordingConnector::new();
        let plan = Search::new(&config_with(&connector))
            .group_by("category", GroupFunction::Attr)
            .sort_by_clause("price ASC")
            .select(["id", "price"])
            .select(["@weight"])
            .limit(5)
            .offset(10)
            .max(500)
            .cutoff(50)
            .query_plan()
            .unwrap();
        assert!(plan.calls.contains(&ClientCall::SetGroupBy {
            attribute: "category".into(),
            function: GroupFunction::Attr,
            sort: "@group DESC".into()
        }));
        assert!(plan.calls.contains(&ClientCall::SetSortMode {
            mode: SortMode::Extended,
            expr: "price ASC".into()
        }));
        assert!(plan.calls.contains(&ClientCall::SetSelect("id,price,@weight".into())));
        assert!(plan.calls.contains(&ClientCall::SetLimits {
            offset: 10,
            limit: 5,
            max: 500,
            cutoff: 50
        }));
    }

    #[test]
    fn test_weights_merge() {
        let connector = RecordingConnector::new();
        let mut config = config_with(&connector);
        config.set_weight("title", 10).set_index_weight("things", 2);
        let plan = Search::new(&config)
            .weight([("body", 3), ("title", 5)])
            .weight_index([("extra", 4)])
            .query_plan()
            .unwrap();

        let mut fields = BTreeMap::new();
        fields.insert("body".to_string(), 3);
        fields.insert("title".to_string(), 5);
        assert!(plan.calls.contains(&ClientCall::SetFieldWeights(fields)));

        let mut indexes = BTreeMap::new();
        indexes.insert("extra_idx".to_string(), 4);
        indexes.insert("things_idx".to_string(), 2);
        assert!(plan.calls.contains(&ClientCall::SetIndexWeights(indexes)));
    }

    #[test]
    fn test_builder_is_isolated_from_config_changes() {
        let connector = RecordingConnector::new();
        let mut config = config_with(&connector);
        let search = Search::new(&config);
        config.index("others").unwrap().set_target_attr("doc_id");

        let plan = search.query_plan().unwrap();
        assert_eq!(plan.queries[0].indexes, "things_idx");
        assert_eq!(search.target_attr, "item_id");
    }

    #[test]
    fn test_anchor_respects_angle_units() {
        let connector = RecordingConnector::new();
        let mut config = config_with(&connector);
        config.set_anchor_units(AngleUnit::Radians);
        let plan = Search::new(&config).anchor((180.0, 90.0)).unwrap().query_plan().unwrap();
        let anchor = plan
            .calls
            .iter()
            .find_map(|c| match c {
                ClientCall::SetGeoAnchor { lat, lng, .. } => Some((*lat, *lng)),
                _ => None,
            })
            .unwrap();
        assert!((anchor.0 - std::f64::consts::PI).abs() < 1e-12);
        assert!((anchor.1 - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
    }

    #[test]
    fn test_around_stages_anchor_and_radius() {
        let connector = RecordingConnector::new();
        let plan = Search::new(&config_with(&connector))
            .around(&json!({"lat": 40.0, "lng": -73.0}), 500.0..=1500.0)
            .unwrap()
            .query_plan()
            .unwrap();
        assert!(plan.calls.contains(&ClientCall::SetGeoAnchor {
            lat_attr: "lat".into(),
            lng_attr: "lng".into(),
            lat: 40.0,
            lng: -73.0
        }));
        assert!(plan.calls.contains(&ClientCall::SetFilterFloatRange {
            attribute: "@geodist".into(),
            min: 500.0,
            max: 1500.0,
            exclude: false
        }));
    }

    #[test]
    fn test_invalid_filter_fails_builder() {
        let connector = RecordingConnector::new();
        let err = Search::new(&config_with(&connector))
            .filter("score", json!("high"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidFilter { .. }));
    }

    // ========================================================================
    // Execution
    // ========================================================================

    #[test]
    fn test_run_requires_connector() {
        let mut config = SearchConfiguration::from_settings(&Settings::default());
        config.index("things").unwrap();
        let err = Search::new(&config).run().unwrap_err();
        assert!(matches!(err, Error::ConnectorNotSet));
    }

    #[test]
    fn test_rejected_query() {
        let connector = RecordingConnector::new();
        let err = Search::new(&config_with(&connector)).run().unwrap_err();
        assert!(matches!(err, Error::InvalidIndexQuery { ref indexes } if indexes == "things_idx"));
    }

    #[test]
    fn test_run_dedupes_and_hydrates_once() {
        let connector =
            RecordingConnector::new().respond_with_ids("things_idx", "item_id", &[5, 3, 5, 7]);
        let store = things_store();
        let config = key_value_config(&connector, store.clone());

        let results = Search::new(&config).for_terms(["x"]).run().unwrap();
        let records = results.records().unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.attribute("id").unwrap()).collect();
        assert_eq!(ids, vec![json!(5), json!(3), json!(7)]);
        assert_eq!(
            store.requests(),
            vec![vec!["thing:5".to_string(), "thing:3".into(), "thing:7".into()]]
        );
    }

    #[test]
    fn test_run_replays_calls_then_queries() {
        let connector = RecordingConnector::new().respond_with_ids("things_idx", "item_id", &[1]);
        let config = key_value_config(&connector, things_store());
        let search = Search::new(&config)
            .for_terms(["x"])
            .filter("score", 1..=5)
            .unwrap();
        search.run().unwrap();

        let calls = connector.calls();
        assert_eq!(calls.len(), search.query_plan().unwrap().calls.len() + 1);
        assert_eq!(
            calls.last(),
            Some(&ClientCall::Query {
                term: "x".into(),
                indexes: "things_idx".into()
            })
        );
    }

    #[test]
    fn test_rerun_reexecutes_with_fresh_client() {
        let connector = RecordingConnector::new().respond_with_ids("things_idx", "item_id", &[1]);
        let config = key_value_config(&connector, things_store());
        let search = Search::new(&config);
        search.run().unwrap();
        search.run().unwrap();
        assert_eq!(connector.connections(), 2);
        assert_eq!(connector.queries().len(), 2);
    }

    #[test]
    fn test_run_without_adapter_is_empty() {
        let connector =
            RecordingConnector::new().respond_with_ids("things_idx", "item_id", &[1, 2]);
        let results = Search::new(&config_with(&connector)).run().unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_projection_single_and_multiple() {
        let connector =
            RecordingConnector::new().respond_with_ids("things_idx", "item_id", &[2, 1]);
        let config = key_value_config(&connector, things_store());

        let values = Search::new(&config).returning(["name"]).run().unwrap();
        assert_eq!(values, ResultSet::Values(vec![json!("b"), json!("a")]));

        let rows = Search::new(&config).returning(["id", "name"]).run().unwrap();
        let rows = rows.rows().unwrap();
        assert_eq!(rows[0]["id"], json!(2));
        assert_eq!(rows[1]["name"], json!("a"));
    }

    #[test]
    fn test_multiple_tables() {
        let connector = RecordingConnector::new()
            .respond_with_ids("venue_idx", "item_id", &[1])
            .respond_with_ids("event_idx", "item_id", &[2, 2]);
        let tables = MemoryTables::new();
        tables.insert("venues", json!({"id": 1, "name": "Hall"}));
        tables.insert("events", json!({"id": 2, "name": "Gig"}));

        let mut config = SearchConfiguration::from_settings(&Settings::default());
        config
            .set_connector(Arc::new(connector.clone()))
            .set_adapter("sequel")
            .unwrap()
            .datastore(Datastore::relational(tables))
            .unwrap()
            .index_for("venues", "venue")
            .unwrap()
            .index_for("events", "event")
            .unwrap();

        let results = Search::new(&config).run().unwrap();
        assert_eq!(results.table("venues").unwrap()[0].attribute("name").unwrap(), json!("Hall"));
        assert_eq!(results.table("events").unwrap().len(), 1);

        let err = Search::new(&config).returning(["name"]).run().unwrap_err();
        assert!(matches!(err, Error::MultipleResultSets { .. }));
        assert_eq!(connector.connections(), 1);

        let single = Search::new(&config).in_table("events").run().unwrap();
        assert_eq!(single.records().unwrap()[0].attribute("name").unwrap(), json!("Gig"));
    }

    #[test]
    fn test_count() {
        let connector = RecordingConnector::new().respond(
            "things_idx",
            IndexResponse {
                matches: vec![],
                total: 42,
                total_found: 420,
            },
        );
        let count = Search::new(&config_with(&connector)).count().unwrap();
        assert_eq!(count, MatchCount::Total(42));
    }

    #[test]
    fn test_configure_closure() {
        let search = Search::configure(|c| {
            c.index("things")?;
            c.set_target_attr("doc_id");
            Ok(())
        })
        .unwrap();
        assert_eq!(search.target_attr, "doc_id");
    }

    #[test]
    fn test_overrides() {
        let connector = RecordingConnector::new();
        let search = Search::with_overrides(
            &config_with(&connector),
            SearchOverrides {
                term: Some("initial".into()),
                table: Some("things".into()),
            },
        );
        assert_eq!(search.term(), "initial");
        let plan = search.query_plan().unwrap();
        assert_eq!(plan.queries[0].table.as_deref(), Some("things"));
    }
}
