//! Bound search constructors.
//!
//! [`bind`] captures a configuration once and hands out searches seeded
//! from it. [`bind_resource`] does the same for a single table, the usual
//! shape when a domain type wants `Venue::search()`-style entry points:
//!
//! ```rust
//! use quarry_search::{bind_resource, SearchFactory};
//! use quarry_core::Settings;
//!
//! let venues: SearchFactory = bind_resource(&Settings::default(), "venues", |c| {
//!     c.set_adapter("sequel")?.index("venue")?;
//!     Ok(())
//! })
//! .unwrap();
//!
//! let plan = venues.search_for("hall").query_plan().unwrap();
//! assert_eq!(plan.queries[0].table.as_deref(), Some("venues"));
//! assert_eq!(plan.queries[0].indexes, "venue_idx");
//! ```

use std::sync::Arc;

use quarry_core::{Result, Settings};

use crate::config::SearchConfiguration;
use crate::search::{Search, SearchOverrides};

/// Hands out searches seeded from one shared configuration.
#[derive(Debug, Clone)]
pub struct SearchFactory {
    config: Arc<SearchConfiguration>,
}

impl SearchFactory {
    /// A fresh search.
    pub fn search(&self) -> Search {
        Search::new(&self.config)
    }

    /// A fresh search for `term`.
    pub fn search_for(&self, term: impl Into<String>) -> Search {
        Search::with_overrides(
            &self.config,
            SearchOverrides {
                term: Some(term.into()),
                table: None,
            },
        )
    }

    /// A fresh search restricted to `table`.
    pub fn search_in(&self, table: impl Into<String>) -> Search {
        Search::new(&self.config).in_table(table)
    }

    /// The bound configuration.
    pub fn configuration(&self) -> &SearchConfiguration {
        &self.config
    }
}

/// Bind `config` as the seed for future searches.
pub fn bind(config: SearchConfiguration) -> SearchFactory {
    SearchFactory {
        config: Arc::new(config),
    }
}

/// Bind a single-table configuration built by `f`.
pub fn bind_resource<F>(settings: &Settings, table: &str, f: F) -> Result<SearchFactory>
where
    F: FnOnce(&mut SearchConfiguration) -> Result<()>,
{
    let mut config = SearchConfiguration::for_resource(settings, table)?;
    f(&mut config)?;
    Ok(bind(config))
}
