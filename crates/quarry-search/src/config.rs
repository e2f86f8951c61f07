//! Search configuration.
//!
//! A [`SearchConfiguration`] holds the reusable defaults a [`Search`]
//! starts from: the storage adapter and its datastore, the tables and
//! indexes to search, weights, match and fragment modes, and the attribute
//! names used to read identifiers and coordinates out of matches.
//!
//! New configurations take their defaults from a [`Settings`] value, by
//! default the process-wide one. Searches built from a configuration copy
//! everything they need when they are created, so later changes to the
//! configuration never reach an existing search.
//!
//! [`Search`]: crate::Search

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use quarry_core::{
    AdapterKind, AngleUnit, Error, Result, ServerAddress, Settings, canonicalize_with, settings,
};
use quarry_storage::{Datastore, StorageAdapter, create_adapter};

use crate::client::{IndexConnector, MatchMode};
use crate::fragment::FragmentMode;

/// Whether a configuration may span several tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigurationMode {
    /// Any number of tables.
    #[default]
    Standalone,
    /// Bound to a single resource table.
    Resource,
}

/// Indexes registered for one table, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableIndexes {
    /// Table name.
    pub table: String,
    /// Canonical index names.
    pub indexes: Vec<String>,
}

/// Options for [`SearchConfiguration::set_table_with`].
#[derive(Debug, Clone, Default)]
pub struct TableOptions {
    /// Indexes to register for the table (canonicalized on insert).
    pub indexes: Vec<String>,
}

impl TableOptions {
    /// Options registering `indexes`.
    pub fn indexes<I, S>(indexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            indexes: indexes.into_iter().map(Into::into).collect(),
        }
    }
}

/// Reusable search defaults.
#[derive(Clone)]
pub struct SearchConfiguration {
    mode: ConfigurationMode,
    adapter_kind: Option<AdapterKind>,
    adapter: Option<Arc<dyn StorageAdapter>>,
    datastore: Option<Datastore>,
    connector: Option<Arc<dyn IndexConnector>>,
    tables: Vec<TableIndexes>,
    unassigned: Vec<String>,
    weights: BTreeMap<String, u32>,
    index_weights: BTreeMap<String, u32>,
    match_mode: MatchMode,
    fragment_mode: FragmentMode,
    target_attr: String,
    latitude_attr: String,
    longitude_attr: String,
    key_prefix: String,
    index_suffix: String,
    server: ServerAddress,
    anchor_units: AngleUnit,
}

impl SearchConfiguration {
    /// Configuration seeded from the process-wide settings.
    pub fn new() -> Self {
        Self::from_settings(&settings::current())
    }

    /// Configuration seeded from explicit settings.
    ///
    /// The settings' default adapter is instantiated but left unconnected.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut config = Self {
            mode: ConfigurationMode::Standalone,
            adapter_kind: None,
            adapter: None,
            datastore: None,
            connector: None,
            tables: Vec::new(),
            unassigned: Vec::new(),
            weights: BTreeMap::new(),
            index_weights: BTreeMap::new(),
            match_mode: MatchMode::default(),
            fragment_mode: FragmentMode::default(),
            target_attr: settings.target_attr.clone(),
            latitude_attr: "lat".to_string(),
            longitude_attr: "lng".to_string(),
            key_prefix: String::new(),
            index_suffix: settings.index_suffix.clone(),
            server: settings.server.clone(),
            anchor_units: settings.anchor_units,
        };
        if let Some(kind) = settings.default_adapter {
            config.use_adapter(kind);
        }
        config
    }

    /// Build a configuration with a closure over a fresh one.
    ///
    /// ```rust
    /// use quarry_search::SearchConfiguration;
    ///
    /// let config = SearchConfiguration::build(|c| {
    ///     c.set_adapter("key-value")?.index("things")?;
    ///     c.set_key_prefix("thing:");
    ///     Ok(())
    /// })
    /// .unwrap();
    /// assert_eq!(config.indexes(), vec!["things_idx".to_string()]);
    /// ```
    pub fn build<F>(f: F) -> Result<Self>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let mut config = Self::new();
        f(&mut config)?;
        Ok(config)
    }

    /// Configuration locked to a single resource table.
    pub fn for_resource(settings: &Settings, table: &str) -> Result<Self> {
        let mut config = Self::from_settings(settings);
        config.mode = ConfigurationMode::Resource;
        config.set_table(table)?;
        Ok(config)
    }

    /// Single- or multi-table mode.
    pub fn mode(&self) -> ConfigurationMode {
        self.mode
    }

    // ------------------------------------------------------------------------
    // Adapter and datastore
    // ------------------------------------------------------------------------

    /// The adapter shared by searches created from here.
    pub fn adapter(&self) -> Option<&Arc<dyn StorageAdapter>> {
        self.adapter.as_ref()
    }

    /// The registered adapter kind, if one was chosen by name.
    pub fn adapter_kind(&self) -> Option<AdapterKind> {
        self.adapter_kind
    }

    /// Choose an adapter by registered name.
    ///
    /// `"none"` clears both the adapter and the datastore.
    pub fn set_adapter(&mut self, name: &str) -> Result<&mut Self> {
        let kind: AdapterKind = name.parse()?;
        Ok(self.use_adapter(kind))
    }

    /// Choose an adapter by kind.
    pub fn use_adapter(&mut self, kind: AdapterKind) -> &mut Self {
        self.datastore = None;
        match create_adapter(kind) {
            Some(adapter) => {
                self.adapter_kind = Some(kind);
                self.adapter = Some(Arc::from(adapter));
            }
            None => {
                self.adapter_kind = None;
                self.adapter = None;
            }
        }
        log::debug!("search configuration adapter set to {kind}");
        self
    }

    /// Install an already connected adapter.
    pub fn with_storage(&mut self, adapter: Arc<dyn StorageAdapter>) -> &mut Self {
        self.adapter_kind = None;
        self.datastore = None;
        self.adapter = Some(adapter);
        self
    }

    /// Connect the chosen adapter to `datastore`.
    ///
    /// A fresh adapter is built and connected, so searches already holding
    /// the previous adapter are unaffected.
    pub fn datastore(&mut self, datastore: Datastore) -> Result<&mut Self> {
        let kind = self.adapter_kind.ok_or(Error::AdapterNotSet)?;
        let mut adapter = create_adapter(kind).ok_or(Error::AdapterNotSet)?;
        adapter.connect(datastore.clone())?;
        log::debug!(
            "{} adapter connected to a {} datastore",
            adapter.name(),
            datastore.kind_name()
        );
        self.adapter = Some(Arc::from(adapter));
        self.datastore = Some(datastore);
        Ok(self)
    }

    /// The connected datastore, if any.
    pub fn current_datastore(&self) -> Option<&Datastore> {
        self.datastore.as_ref()
    }

    // ------------------------------------------------------------------------
    // Index server
    // ------------------------------------------------------------------------

    /// Install the connector searches obtain index-server clients from.
    pub fn set_connector(&mut self, connector: Arc<dyn IndexConnector>) -> &mut Self {
        self.connector = Some(connector);
        self
    }

    /// The installed connector.
    pub fn connector(&self) -> Option<&Arc<dyn IndexConnector>> {
        self.connector.as_ref()
    }

    /// Index-server endpoint.
    pub fn server(&self) -> &ServerAddress {
        &self.server
    }

    /// Set the index-server endpoint.
    pub fn set_server(&mut self, host: impl Into<String>, port: u16) -> &mut Self {
        self.server = ServerAddress::new(host, port);
        self
    }

    // ------------------------------------------------------------------------
    // Tables and indexes
    // ------------------------------------------------------------------------

    /// The first registered table.
    pub fn table(&self) -> Option<&str> {
        self.tables.first().map(|t| t.table.as_str())
    }

    /// Registered tables, in declaration order.
    pub fn tables(&self) -> &[TableIndexes] {
        &self.tables
    }

    /// Register a table.
    pub fn set_table(&mut self, table: &str) -> Result<&mut Self> {
        self.set_table_with(table, TableOptions::default())
    }

    /// Register a table along with its indexes.
    ///
    /// Indexes declared before any table move to the first table.
    /// Registering a second table on a resource configuration fails with
    /// [`Error::TooManyTables`].
    pub fn set_table_with(&mut self, table: &str, options: TableOptions) -> Result<&mut Self> {
        let position = match self.tables.iter().position(|t| t.table == table) {
            Some(position) => position,
            None => {
                if self.mode == ConfigurationMode::Resource && !self.tables.is_empty() {
                    return Err(Error::TooManyTables {
                        table: table.to_string(),
                    });
                }
                let indexes = std::mem::take(&mut self.unassigned);
                self.tables.push(TableIndexes {
                    table: table.to_string(),
                    indexes,
                });
                self.tables.len() - 1
            }
        };
        for index in options.indexes {
            let canonical = self.canonical(&index);
            push_unique(&mut self.tables[position].indexes, canonical);
        }
        Ok(self)
    }

    /// Register an index for the sole table (or before any table exists).
    ///
    /// Fails with [`Error::AmbiguousIndex`] when several tables exist.
    pub fn index(&mut self, name: &str) -> Result<&mut Self> {
        let canonical = self.canonical(name);
        match self.tables.len() {
            0 => push_unique(&mut self.unassigned, canonical),
            1 => push_unique(&mut self.tables[0].indexes, canonical),
            _ => return Err(Error::AmbiguousIndex { index: canonical }),
        }
        Ok(self)
    }

    /// Register an index for a named table, registering the table if needed.
    pub fn index_for(&mut self, table: &str, name: &str) -> Result<&mut Self> {
        self.set_table_with(table, TableOptions::indexes([name]))
    }

    /// Every registered index, in declaration order.
    pub fn indexes(&self) -> Vec<String> {
        let mut all = self.unassigned.clone();
        for group in &self.tables {
            for index in &group.indexes {
                push_unique(&mut all, index.clone());
            }
        }
        all
    }

    /// Indexes registered for `table`.
    pub fn indexes_for(&self, table: &str) -> Option<&[String]> {
        self.tables
            .iter()
            .find(|t| t.table == table)
            .map(|t| t.indexes.as_slice())
    }

    pub(crate) fn unassigned_indexes(&self) -> &[String] {
        &self.unassigned
    }

    /// Canonicalize `name` with this configuration's suffix.
    pub fn canonical(&self, name: &str) -> String {
        canonicalize_with(name, &self.index_suffix)
    }

    /// Suffix used to canonicalize index names.
    pub fn index_suffix(&self) -> &str {
        &self.index_suffix
    }

    // ------------------------------------------------------------------------
    // Weights and modes
    // ------------------------------------------------------------------------

    /// Per-field weights.
    pub fn weights(&self) -> &BTreeMap<String, u32> {
        &self.weights
    }

    /// Set one field weight.
    pub fn set_weight(&mut self, field: impl Into<String>, weight: u32) -> &mut Self {
        self.weights.insert(field.into(), weight);
        self
    }

    /// Per-index weights, keyed by canonical index name.
    pub fn index_weights(&self) -> &BTreeMap<String, u32> {
        &self.index_weights
    }

    /// Set one index weight.
    pub fn set_index_weight(&mut self, index: &str, weight: u32) -> &mut Self {
        let canonical = self.canonical(index);
        self.index_weights.insert(canonical, weight);
        self
    }

    /// Default match mode.
    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Set the default match mode.
    pub fn set_match_mode(&mut self, mode: MatchMode) -> &mut Self {
        self.match_mode = mode;
        self
    }

    /// Default fragment matching scheme.
    pub fn fragment_mode(&self) -> FragmentMode {
        self.fragment_mode
    }

    /// Set the default fragment scheme.
    pub fn set_fragment_mode(&mut self, mode: FragmentMode) -> &mut Self {
        self.fragment_mode = mode;
        self
    }

    // ------------------------------------------------------------------------
    // Attribute names
    // ------------------------------------------------------------------------

    /// Match attribute carrying record identifiers.
    pub fn target_attr(&self) -> &str {
        &self.target_attr
    }

    /// Set the identifier attribute.
    pub fn set_target_attr(&mut self, attr: impl Into<String>) -> &mut Self {
        self.target_attr = attr.into();
        self
    }

    /// Latitude attribute used for geo anchors.
    pub fn latitude_attr(&self) -> &str {
        &self.latitude_attr
    }

    /// Set the latitude attribute.
    pub fn set_latitude_attr(&mut self, attr: impl Into<String>) -> &mut Self {
        self.latitude_attr = attr.into();
        self
    }

    /// Longitude attribute used for geo anchors.
    pub fn longitude_attr(&self) -> &str {
        &self.longitude_attr
    }

    /// Set the longitude attribute.
    pub fn set_longitude_attr(&mut self, attr: impl Into<String>) -> &mut Self {
        self.longitude_attr = attr.into();
        self
    }

    /// Prefix key-addressed stores prepend to identifiers.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Set the key prefix.
    pub fn set_key_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Angle convention for geo-anchor coordinates.
    pub fn anchor_units(&self) -> AngleUnit {
        self.anchor_units
    }

    /// Set the anchor angle convention.
    pub fn set_anchor_units(&mut self, units: AngleUnit) -> &mut Self {
        self.anchor_units = units;
        self
    }
}

impl Default for SearchConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SearchConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfiguration")
            .field("mode", &self.mode)
            .field("adapter", &self.adapter.as_ref().map(|a| a.name().to_string()))
            .field("datastore", &self.datastore)
            .field("tables", &self.tables)
            .field("indexes", &self.unassigned)
            .field("match_mode", &self.match_mode)
            .field("fragment_mode", &self.fragment_mode)
            .field("target_attr", &self.target_attr)
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

pub(crate) fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
