//! Index-server client seam.
//!
//! Quarry does not speak the index server's wire protocol. It drives an
//! [`IndexClient`] through the protocol's setter calls and a final `query`,
//! and obtains clients from an [`IndexConnector`]. The protocol enums here
//! carry the server's numeric codes so real clients can forward them as-is.
//!
//! Every setter a search issues is first captured as a [`ClientCall`], which
//! makes the complete call sequence inspectable before any I/O happens.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use quarry_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Protocol enums
// ============================================================================

/// How the index server matches the query term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// All words must match.
    #[default]
    All,
    /// Any word may match.
    Any,
    /// The term must match as a phrase.
    Phrase,
    /// The term is a boolean expression.
    Boolean,
    /// The term uses the extended query syntax.
    Extended,
    /// Second-generation extended syntax (required for field scoping).
    Extended2,
    /// Full scan, ignoring the term.
    Fullscan,
}

impl MatchMode {
    /// Numeric protocol code.
    pub fn code(&self) -> u32 {
        match self {
            MatchMode::All => 0,
            MatchMode::Any => 1,
            MatchMode::Phrase => 2,
            MatchMode::Boolean => 3,
            MatchMode::Extended => 4,
            MatchMode::Fullscan => 5,
            MatchMode::Extended2 => 6,
        }
    }
}

impl FromStr for MatchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(MatchMode::All),
            "any" => Ok(MatchMode::Any),
            "phrase" => Ok(MatchMode::Phrase),
            "boolean" => Ok(MatchMode::Boolean),
            "extended" => Ok(MatchMode::Extended),
            "extended2" => Ok(MatchMode::Extended2),
            "fullscan" | "full" => Ok(MatchMode::Fullscan),
            _ => Err(Error::InvalidMatchMode {
                mode: s.to_string(),
            }),
        }
    }
}

/// How matches are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// By relevance.
    #[default]
    Relevance,
    /// By an attribute, descending.
    DateDesc,
    /// By an attribute, ascending.
    DateAsc,
    /// Recent time segments first, then relevance.
    TimeSegments,
    /// SQL-like sort clause.
    Extended,
    /// Arithmetic expression.
    Expression,
}

impl SortMode {
    /// Numeric protocol code.
    pub fn code(&self) -> u32 {
        match self {
            SortMode::Relevance => 0,
            SortMode::DateDesc => 1,
            SortMode::DateAsc => 2,
            SortMode::TimeSegments => 3,
            SortMode::Extended => 4,
            SortMode::Expression => 5,
        }
    }
}

impl FromStr for SortMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" => Ok(SortMode::Relevance),
            "date_desc" | "date" => Ok(SortMode::DateDesc),
            "date_asc" => Ok(SortMode::DateAsc),
            "time_segments" | "time" => Ok(SortMode::TimeSegments),
            "extended" => Ok(SortMode::Extended),
            "expression" | "expr" => Ok(SortMode::Expression),
            _ => Err(Error::InvalidSortMode {
                mode: s.to_string(),
            }),
        }
    }
}

/// How matches are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupFunction {
    /// By day of a timestamp attribute.
    Day,
    /// By week of a timestamp attribute.
    Week,
    /// By month of a timestamp attribute.
    Month,
    /// By year of a timestamp attribute.
    Year,
    /// By attribute value.
    Attr,
    /// By attribute pair.
    Pair,
}

impl GroupFunction {
    /// Numeric protocol code.
    pub fn code(&self) -> u32 {
        match self {
            GroupFunction::Day => 0,
            GroupFunction::Week => 1,
            GroupFunction::Month => 2,
            GroupFunction::Year => 3,
            GroupFunction::Attr => 4,
            GroupFunction::Pair => 5,
        }
    }
}

impl FromStr for GroupFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(GroupFunction::Day),
            "week" => Ok(GroupFunction::Week),
            "month" => Ok(GroupFunction::Month),
            "year" => Ok(GroupFunction::Year),
            "attr" => Ok(GroupFunction::Attr),
            "pair" | "attrpair" => Ok(GroupFunction::Pair),
            _ => Err(Error::InvalidGroupFunction {
                function: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Responses
// ============================================================================

/// One index-server hit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexMatch {
    /// Document id within the index.
    #[serde(default)]
    pub id: u64,

    /// Relevance weight.
    #[serde(default)]
    pub weight: u64,

    /// Attribute bag, including the target attribute.
    #[serde(default)]
    pub attrs: Map<String, Value>,
}

impl IndexMatch {
    /// Match carrying only attributes.
    pub fn with_attrs(attrs: Value) -> Self {
        Self {
            attrs: match attrs {
                Value::Object(map) => map,
                _ => Map::new(),
            },
            ..Default::default()
        }
    }
}

/// A successful index-server response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexResponse {
    /// Returned matches, in server order.
    #[serde(default)]
    pub matches: Vec<IndexMatch>,

    /// Number of matches retrievable (bounded by the max-matches limit).
    #[serde(default)]
    pub total: u64,

    /// Total number of matching documents.
    #[serde(default)]
    pub total_found: u64,
}

impl IndexResponse {
    /// Response over the given matches; totals equal the match count.
    pub fn from_matches(matches: Vec<IndexMatch>) -> Self {
        let total = matches.len() as u64;
        Self {
            matches,
            total,
            total_found: total,
        }
    }
}

// ============================================================================
// Client traits
// ============================================================================

/// The index-server client Quarry drives.
///
/// Setters only stage state for the next `query`; `query` is the single
/// round trip. A `None` response means the server rejected the query.
pub trait IndexClient: Send {
    /// Set the server endpoint.
    fn set_server(&mut self, host: &str, port: u16);
    /// Set the match mode.
    fn set_match_mode(&mut self, mode: MatchMode);
    /// Add a membership filter.
    fn set_filter(&mut self, attribute: &str, values: &[i64], exclude: bool);
    /// Add an integer range filter.
    fn set_filter_range(&mut self, attribute: &str, min: i64, max: i64, exclude: bool);
    /// Add a float range filter.
    fn set_filter_float_range(&mut self, attribute: &str, min: f64, max: f64, exclude: bool);
    /// Set the anchor `@geodist` is measured from.
    fn set_geo_anchor(&mut self, lat_attr: &str, lng_attr: &str, lat: f64, lng: f64);
    /// Group matches.
    fn set_group_by(&mut self, attribute: &str, function: GroupFunction, sort: &str);
    /// Order matches.
    fn set_sort_mode(&mut self, mode: SortMode, expr: &str);
    /// Set the comma-joined select list.
    fn set_select(&mut self, select: &str);
    /// Set paging limits.
    fn set_limits(&mut self, offset: u32, limit: u32, max: u32, cutoff: u32);
    /// Set per-field weights.
    fn set_field_weights(&mut self, weights: &BTreeMap<String, u32>);
    /// Set per-index weights.
    fn set_index_weights(&mut self, weights: &BTreeMap<String, u32>);
    /// Run the query against the comma-joined index list.
    fn query(&mut self, term: &str, indexes: &str) -> Result<Option<IndexResponse>>;
}

/// Produces fresh index-server clients, one per terminal call.
pub trait IndexConnector: fmt::Debug + Send + Sync {
    /// Open a client.
    fn client(&self) -> Result<Box<dyn IndexClient>>;
}

// ============================================================================
// ClientCall
// ============================================================================

/// One staged client setter, or a query.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    /// `set_server`
    SetServer {
        /// Host
        host: String,
        /// Port
        port: u16,
    },
    /// `set_match_mode`
    SetMatchMode(MatchMode),
    /// `set_filter`
    SetFilter {
        /// Attribute
        attribute: String,
        /// Accepted values
        values: Vec<i64>,
        /// Invert the filter
        exclude: bool,
    },
    /// `set_filter_range`
    SetFilterRange {
        /// Attribute
        attribute: String,
        /// Lower bound (inclusive)
        min: i64,
        /// Upper bound (inclusive)
        max: i64,
        /// Invert the filter
        exclude: bool,
    },
    /// `set_filter_float_range`
    SetFilterFloatRange {
        /// Attribute
        attribute: String,
        /// Lower bound (inclusive)
        min: f64,
        /// Upper bound (inclusive)
        max: f64,
        /// Invert the filter
        exclude: bool,
    },
    /// `set_geo_anchor`
    SetGeoAnchor {
        /// Latitude attribute
        lat_attr: String,
        /// Longitude attribute
        lng_attr: String,
        /// Anchor latitude
        lat: f64,
        /// Anchor longitude
        lng: f64,
    },
    /// `set_group_by`
    SetGroupBy {
        /// Attribute
        attribute: String,
        /// Grouping function
        function: GroupFunction,
        /// Group sort clause
        sort: String,
    },
    /// `set_sort_mode`
    SetSortMode {
        /// Mode
        mode: SortMode,
        /// Sort expression
        expr: String,
    },
    /// `set_select`
    SetSelect(String),
    /// `set_limits`
    SetLimits {
        /// Offset
        offset: u32,
        /// Limit
        limit: u32,
        /// Max matches
        max: u32,
        /// Cutoff
        cutoff: u32,
    },
    /// `set_field_weights`
    SetFieldWeights(BTreeMap<String, u32>),
    /// `set_index_weights`
    SetIndexWeights(BTreeMap<String, u32>),
    /// `query`
    Query {
        /// Query term
        term: String,
        /// Comma-joined index list
        indexes: String,
    },
}

impl ClientCall {
    /// Issue this call on `client`. Queries are not replayed.
    pub fn apply(&self, client: &mut dyn IndexClient) {
        match self {
            ClientCall::SetServer { host, port } => client.set_server(host, *port),
            ClientCall::SetMatchMode(mode) => client.set_match_mode(*mode),
            ClientCall::SetFilter {
                attribute,
                values,
                exclude,
            } => client.set_filter(attribute, values, *exclude),
            ClientCall::SetFilterRange {
                attribute,
                min,
                max,
                exclude,
            } => client.set_filter_range(attribute, *min, *max, *exclude),
            ClientCall::SetFilterFloatRange {
                attribute,
                min,
                max,
                exclude,
            } => client.set_filter_float_range(attribute, *min, *max, *exclude),
            ClientCall::SetGeoAnchor {
                lat_attr,
                lng_attr,
                lat,
                lng,
            } => client.set_geo_anchor(lat_attr, lng_attr, *lat, *lng),
            ClientCall::SetGroupBy {
                attribute,
                function,
                sort,
            } => client.set_group_by(attribute, *function, sort),
            ClientCall::SetSortMode { mode, expr } => client.set_sort_mode(*mode, expr),
            ClientCall::SetSelect(select) => client.set_select(select),
            ClientCall::SetLimits {
                offset,
                limit,
                max,
                cutoff,
            } => client.set_limits(*offset, *limit, *max, *cutoff),
            ClientCall::SetFieldWeights(weights) => client.set_field_weights(weights),
            ClientCall::SetIndexWeights(weights) => client.set_index_weights(weights),
            ClientCall::Query { .. } => {}
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_match_mode_codes() {
        assert_eq!(MatchMode::default(), MatchMode::All);
        assert_eq!(MatchMode::Extended2.code(), 6);
        assert_eq!(MatchMode::Fullscan.code(), 5);
    }

    #[test]
    fn test_match_mode_parse() {
        assert_eq!("full".parse::<MatchMode>().unwrap(), MatchMode::Fullscan);
        assert!(matches!(
            "fuzzy".parse::<MatchMode>(),
            Err(Error::InvalidMatchMode { .. })
        ));
    }

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!("date".parse::<SortMode>().unwrap(), SortMode::DateDesc);
        assert_eq!("expr".parse::<SortMode>().unwrap().code(), 5);
        assert!("sideways".parse::<SortMode>().is_err());
    }

    #[test]
    fn test_group_function_parse() {
        assert_eq!("attrpair".parse::<GroupFunction>().unwrap(), GroupFunction::Pair);
        assert!(matches!(
            "decade".parse::<GroupFunction>(),
            Err(Error::InvalidGroupFunction { .. })
        ));
    }

    #[test]
    fn test_response_deserialization_with_defaults() {
        let json = r#"{"matches": [{"attrs": {"item_id": 2}}], "total": 1}"#;
        let response: IndexResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total, 1);
        assert_eq!(response.total_found, 0);
        assert_eq!(response.matches[0].attrs["item_id"], 2);
    }

    #[test]
    fn test_from_matches_totals() {
        let response = IndexResponse::from_matches(vec![
            IndexMatch::with_attrs(serde_json::json!({"item_id": 1})),
            IndexMatch::with_attrs(serde_json::json!({"item_id": 2})),
        ]);
        assert_eq!(response.total, 2);
        assert_eq!(response.total_found, 2);
    }
}
