//! Attribute filters.
//!
//! A filter value is resolved into one of three index-server calls by its
//! shape: an integer collection becomes a membership filter, an integer
//! range an integer range filter, and a float range or bare number a float
//! range filter. A bare number `n` means `[0, n]`, which is how distance
//! limits on `@geodist` are expressed.

use std::ops::{Range, RangeInclusive};

use quarry_core::{Error, Result};
use serde_json::Value;

use crate::client::ClientCall;

/// A validated filter value.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValues {
    /// Attribute must equal one of these.
    Set(Vec<i64>),
    /// Attribute must fall in `[min, max]`.
    IntRange(i64, i64),
    /// Attribute must fall in `[min, max]`.
    FloatRange(f64, f64),
}

/// Which client call a filter dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// `set_filter`
    Set,
    /// `set_filter_range`
    IntRange,
    /// `set_filter_float_range`
    FloatRange,
}

impl FilterValues {
    /// The dispatch target.
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterValues::Set(_) => FilterKind::Set,
            FilterValues::IntRange(..) => FilterKind::IntRange,
            FilterValues::FloatRange(..) => FilterKind::FloatRange,
        }
    }

    fn validate(self, attribute: &str) -> Result<Self> {
        match &self {
            FilterValues::FloatRange(min, max) if !min.is_finite() || !max.is_finite() => Err(
                Error::invalid_filter(attribute, "range bounds must be finite numbers"),
            ),
            _ => Ok(self),
        }
    }

    /// Explicit ranges must run low to high; sets and bare limits are forwarded as given.
    fn validate_range(self, attribute: &str) -> Result<Self> {
        let inverted = match &self {
            FilterValues::IntRange(min, max) if min > max => Some(format!("{min}..={max}")),
            FilterValues::FloatRange(min, max) if min > max => Some(format!("{min}..={max}")),
            _ => None,
        };
        match inverted {
            Some(bounds) => Err(Error::invalid_filter(
                attribute,
                format!("inverted range {bounds}"),
            )),
            None => self.validate(attribute),
        }
    }
}

/// Values accepted by [`Search::filter`](crate::Search::filter).
pub trait IntoFilterValues {
    /// Resolve into validated filter values for `attribute`.
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues>;
}

impl IntoFilterValues for FilterValues {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        self.validate(attribute)
    }
}

impl IntoFilterValues for Vec<i64> {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        FilterValues::Set(self).validate(attribute)
    }
}

impl IntoFilterValues for &[i64] {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        self.to_vec().into_filter_values(attribute)
    }
}

impl<const N: usize> IntoFilterValues for [i64; N] {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        self.to_vec().into_filter_values(attribute)
    }
}

impl IntoFilterValues for RangeInclusive<i64> {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        FilterValues::IntRange(*self.start(), *self.end()).validate_range(attribute)
    }
}

impl IntoFilterValues for Range<i64> {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        if self.is_empty() {
            return Err(Error::invalid_filter(
                attribute,
                format!("empty range {}..{}", self.start, self.end),
            ));
        }
        FilterValues::IntRange(self.start, self.end - 1).validate_range(attribute)
    }
}

impl IntoFilterValues for RangeInclusive<f64> {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        FilterValues::FloatRange(*self.start(), *self.end()).validate_range(attribute)
    }
}

impl IntoFilterValues for f64 {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        FilterValues::FloatRange(0.0, self).validate(attribute)
    }
}

impl IntoFilterValues for i64 {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        (self as f64).into_filter_values(attribute)
    }
}

impl IntoFilterValues for i32 {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        f64::from(self).into_filter_values(attribute)
    }
}

impl IntoFilterValues for &Value {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        match self {
            Value::Number(n) => match n.as_f64() {
                Some(limit) => limit.into_filter_values(attribute),
                None => Err(Error::invalid_filter(attribute, format!("unusable number {n}"))),
            },
            Value::Array(items) => {
                let values = items
                    .iter()
                    .map(Value::as_i64)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| {
                        Error::invalid_filter(attribute, "collections must contain only integers")
                    })?;
                values.into_filter_values(attribute)
            }
            Value::Object(map) => {
                let bound = |names: [&str; 2]| names.iter().find_map(|name| map.get(*name));
                match (bound(["min", "from"]), bound(["max", "to"])) {
                    (Some(min), Some(max)) => range_from_json(attribute, min, max),
                    _ => Err(Error::invalid_filter(
                        attribute,
                        "range objects need min/max (or from/to)",
                    )),
                }
            }
            other => Err(Error::invalid_filter(
                attribute,
                format!("cannot filter on {other}"),
            )),
        }
    }
}

impl IntoFilterValues for Value {
    fn into_filter_values(self, attribute: &str) -> Result<FilterValues> {
        (&self).into_filter_values(attribute)
    }
}

fn range_from_json(attribute: &str, min: &Value, max: &Value) -> Result<FilterValues> {
    if let (Some(lo), Some(hi)) = (min.as_i64(), max.as_i64()) {
        return (lo..=hi).into_filter_values(attribute);
    }
    match (min.as_f64(), max.as_f64()) {
        (Some(lo), Some(hi)) => (lo..=hi).into_filter_values(attribute),
        _ => Err(Error::invalid_filter(attribute, "range bounds must be numbers")),
    }
}

/// A filter staged on a search.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    /// Filtered attribute.
    pub attribute: String,
    /// Validated values.
    pub values: FilterValues,
    /// Invert the filter.
    pub exclude: bool,
}

impl FilterSpec {
    /// Build a filter, validating `values`.
    pub fn new(
        attribute: impl Into<String>,
        values: impl IntoFilterValues,
        exclude: bool,
    ) -> Result<Self> {
        let attribute = attribute.into();
        let values = values.into_filter_values(&attribute)?;
        Ok(Self {
            attribute,
            values,
            exclude,
        })
    }

    /// The client call this filter issues.
    pub fn to_call(&self) -> ClientCall {
        let attribute = self.attribute.clone();
        let exclude = self.exclude;
        match &self.values {
            FilterValues::Set(values) => ClientCall::SetFilter {
                attribute,
                values: values.clone(),
                exclude,
            },
            FilterValues::IntRange(min, max) => ClientCall::SetFilterRange {
                attribute,
                min: *min,
                max: *max,
                exclude,
            },
            FilterValues::FloatRange(min, max) => ClientCall::SetFilterFloatRange {
                attribute,
                min: *min,
                max: *max,
                exclude,
            },
        }
    }
}
